use async_trait::async_trait;
use icefield_core::logging::debug;
use icefield_core::Context;

use super::{
    drop_task_sql, show_role_sql, show_task_parameters_sql, show_task_sql, Grants, Roles, Row,
    Session, SqlExecutor, Tasks,
};
use super::{AlterTaskRequest, CreateTaskRequest, GrantOwnershipRequest, GrantRequest, Grantee};
use super::{RevokeRequest, ShowGrantsRequest};
use crate::entry_types::{from_rows, GrantRow, ParameterRow, RoleRow, TaskRow};
use crate::error::{Error, Result};
use crate::identifier::{AccountObjectIdentifier, SchemaObjectIdentifier};

/// The facade, rendering typed requests to SQL and handing them to `E`.
///
/// Every dispatch first checks the context, so a cancelled operation stops
/// before its next statement.
pub struct SnowflakeClient<E> {
    executor: E,
}

impl<E: SqlExecutor> SnowflakeClient<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    async fn execute(&self, ctx: &Context, sql: String) -> Result<()> {
        ctx.ensure_active()?;
        debug!(%sql, "executing statement");
        self.executor.execute(&sql).await
    }

    async fn query(&self, ctx: &Context, sql: String) -> Result<Vec<Row>> {
        ctx.ensure_active()?;
        debug!(%sql, "running query");
        self.executor.query(&sql).await
    }
}

#[async_trait]
impl<E: SqlExecutor> Grants for SnowflakeClient<E> {
    async fn grant(&self, ctx: &Context, req: &GrantRequest) -> Result<()> {
        self.execute(ctx, req.to_string()).await
    }

    async fn revoke(&self, ctx: &Context, req: &RevokeRequest) -> Result<()> {
        self.execute(ctx, req.to_string()).await
    }

    async fn grant_ownership(&self, ctx: &Context, req: &GrantOwnershipRequest) -> Result<()> {
        self.execute(ctx, req.to_string()).await
    }

    async fn show_grants(&self, ctx: &Context, req: &ShowGrantsRequest) -> Result<Vec<GrantRow>> {
        from_rows(self.query(ctx, req.to_string()).await?)
    }
}

#[async_trait]
impl<E: SqlExecutor> Tasks for SnowflakeClient<E> {
    async fn create_task(&self, ctx: &Context, req: &CreateTaskRequest) -> Result<()> {
        self.execute(ctx, req.to_string()).await
    }

    async fn alter_task(&self, ctx: &Context, req: &AlterTaskRequest) -> Result<()> {
        self.execute(ctx, req.to_string()).await
    }

    async fn drop_task(&self, ctx: &Context, id: &SchemaObjectIdentifier) -> Result<()> {
        self.execute(ctx, drop_task_sql(id)).await
    }

    async fn show_task(&self, ctx: &Context, id: &SchemaObjectIdentifier) -> Result<TaskRow> {
        let rows: Vec<TaskRow> = from_rows(self.query(ctx, show_task_sql(id)).await?)?;
        rows.into_iter()
            .find(|t| t.name == id.name())
            .ok_or_else(|| Error::ObjectMissing(format!("task {id}")))
    }

    async fn show_task_parameters(
        &self,
        ctx: &Context,
        id: &SchemaObjectIdentifier,
    ) -> Result<Vec<ParameterRow>> {
        from_rows(self.query(ctx, show_task_parameters_sql(id)).await?)
    }
}

#[async_trait]
impl<E: SqlExecutor> Roles for SnowflakeClient<E> {
    async fn show_role(&self, ctx: &Context, role: &Grantee) -> Result<RoleRow> {
        let name = match role {
            Grantee::AccountRole(id) => id.name(),
            Grantee::DatabaseRole(id) => id.name(),
        };
        let rows: Vec<RoleRow> = from_rows(self.query(ctx, show_role_sql(role)).await?)?;
        rows.into_iter()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::ObjectMissing(format!("role {}", role.fully_qualified_name())))
    }
}

#[async_trait]
impl<E: SqlExecutor> Session for SnowflakeClient<E> {
    async fn current_role(&self, ctx: &Context) -> Result<AccountObjectIdentifier> {
        let rows = self.query(ctx, "SELECT CURRENT_ROLE()".to_owned()).await?;
        rows.into_iter()
            .next()
            .and_then(|row| row.into_values().flatten().next())
            .map(AccountObjectIdentifier::new)
            .ok_or_else(|| Error::Other {
                sql_state: String::new(),
                message: "the session has no current role".to_owned(),
            })
    }
}
