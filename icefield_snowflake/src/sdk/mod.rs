//! The narrow SQL facade the controllers talk to.
//!
//! Requests are typed values that render themselves to SQL. The facade traits
//! ([`Grants`], [`Tasks`], [`Roles`], [`Session`]) are implemented by
//! [`SnowflakeClient`] on top of any [`SqlExecutor`].

mod client;
mod grants;
mod tasks;

use std::collections::BTreeMap;

use async_trait::async_trait;
use icefield_core::Context;

pub use client::SnowflakeClient;
pub use grants::{
    BulkIn, BulkScope, GrantOn, GrantOwnershipRequest, GrantPrivileges, GrantRequest, Grantee,
    OutboundPrivileges, OwnershipGrantOn, RevokeRequest, SchemaGrantScope,
    SchemaObjectGrantScope, ShowGrantsRequest,
};
pub use tasks::{
    AlterTaskAction, AlterTaskRequest, CreateTaskRequest, ParameterValue, TaskAttribute,
    TaskSchedule, TaskSetting,
};
pub(crate) use grants::show_role_sql;
pub(crate) use tasks::{drop_task_sql, show_task_parameters_sql, show_task_sql};

use crate::entry_types::{GrantRow, ParameterRow, RoleRow, TaskRow};
use crate::error::Result;
use crate::identifier::{AccountObjectIdentifier, SchemaObjectIdentifier};

/// One result row, keyed by column name. NULL columns are `None`.
pub type Row = BTreeMap<String, Option<String>>;

/// Render a SQL string literal.
pub(crate) fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

/// Runs SQL text. The seam between transport and facade.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Run a statement, dropping any result.
    async fn execute(&self, sql: &str) -> Result<()>;
    /// Run a statement and collect every row.
    async fn query(&self, sql: &str) -> Result<Vec<Row>>;
}

/// Privilege grants.
#[async_trait]
pub trait Grants: Send + Sync {
    async fn grant(&self, ctx: &Context, req: &GrantRequest) -> Result<()>;
    async fn revoke(&self, ctx: &Context, req: &RevokeRequest) -> Result<()>;
    async fn grant_ownership(&self, ctx: &Context, req: &GrantOwnershipRequest) -> Result<()>;
    async fn show_grants(&self, ctx: &Context, req: &ShowGrantsRequest) -> Result<Vec<GrantRow>>;
}

/// Tasks.
#[async_trait]
pub trait Tasks: Send + Sync {
    async fn create_task(&self, ctx: &Context, req: &CreateTaskRequest) -> Result<()>;
    async fn alter_task(&self, ctx: &Context, req: &AlterTaskRequest) -> Result<()>;
    async fn drop_task(&self, ctx: &Context, id: &SchemaObjectIdentifier) -> Result<()>;
    /// Fails with `ObjectMissing` when there is no such task.
    async fn show_task(&self, ctx: &Context, id: &SchemaObjectIdentifier) -> Result<TaskRow>;
    async fn show_task_parameters(
        &self,
        ctx: &Context,
        id: &SchemaObjectIdentifier,
    ) -> Result<Vec<ParameterRow>>;
}

/// Role lookups.
#[async_trait]
pub trait Roles: Send + Sync {
    /// Fails with `ObjectMissing` when there is no such role.
    async fn show_role(&self, ctx: &Context, role: &Grantee) -> Result<RoleRow>;
}

/// Facts about the current session.
#[async_trait]
pub trait Session: Send + Sync {
    /// The role statements run as. Looked up on every call, never cached.
    async fn current_role(&self, ctx: &Context) -> Result<AccountObjectIdentifier>;
}

/// Everything the controllers need.
pub trait Client: Grants + Tasks + Roles + Session {}

impl<T: Grants + Tasks + Roles + Session> Client for T {}
