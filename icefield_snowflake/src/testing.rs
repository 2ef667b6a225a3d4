//! An in-memory Snowflake behind the facade traits.
//!
//! Keeps roles, databases, grants and tasks, records every statement it was
//! sent (queries are recorded separately) and rejects what Snowflake rejects:
//! altering a task while its graph runs, resuming a child, a schedule next to
//! a predecessor.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use icefield_core::Context;
use serde_json::json;

use crate::entry_types::{GrantRow, ParameterRow, RoleRow, TaskRow};
use crate::error::{Error, Result};
use crate::identifier::{AccountObjectIdentifier, SchemaObjectIdentifier};
use crate::object_type::ObjectType;
use crate::sdk::{
    drop_task_sql, show_role_sql, show_task_parameters_sql, show_task_sql, AlterTaskAction,
    AlterTaskRequest, BulkIn, CreateTaskRequest, GrantOn, GrantOwnershipRequest, GrantPrivileges,
    GrantRequest, Grantee, Grants, OwnershipGrantOn, ParameterValue, RevokeRequest, Roles,
    Session, ShowGrantsRequest, TaskAttribute, TaskSetting, Tasks,
};

const OWNERSHIP: &str = "OWNERSHIP";

#[derive(Debug, Clone)]
struct StoredGrant {
    /// The SHOW GRANTS statement listing this grant.
    listing: String,
    object_type: ObjectType,
    object_name: String,
    privilege: String,
    grantee: Grantee,
    grant_option: bool,
    granted_by: Option<String>,
    future: bool,
}

impl StoredGrant {
    fn row(&self) -> GrantRow {
        let object_type = self.object_type.as_str().replace(' ', "_");
        GrantRow {
            privilege: self.privilege.clone(),
            granted_on: (!self.future).then(|| object_type.clone()),
            grant_on: self.future.then(|| object_type.clone()),
            name: self.object_name.clone(),
            granted_to: self.grantee.granted_to().to_owned(),
            grantee_name: grantee_key(&self.grantee),
            grant_option: self.grant_option.to_string(),
            granted_by: self.granted_by.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct StoredTask {
    definition: CreateTaskRequest,
    /// Only meaningful for roots; children run whenever their root does.
    started: bool,
}

#[derive(Default)]
struct State {
    statements: Vec<String>,
    queries: Vec<String>,
    /// Statements and queries together, in dispatch order.
    log: Vec<String>,
    roles: BTreeSet<String>,
    databases: BTreeSet<String>,
    grants: Vec<StoredGrant>,
    tasks: BTreeMap<SchemaObjectIdentifier, StoredTask>,
    current_role: String,
    failures: Vec<(String, Error)>,
}

fn grantee_key(grantee: &Grantee) -> String {
    match grantee {
        Grantee::AccountRole(id) => id.name().to_owned(),
        Grantee::DatabaseRole(id) => format!("{}.{}", id.database(), id.name()),
    }
}

fn missing(what: impl std::fmt::Display) -> Error {
    Error::ObjectMissing(format!("{what} does not exist or not authorized."))
}

fn unquoted(s: impl std::fmt::Display) -> String {
    s.to_string().replace('"', "")
}

/// The database a privilege scope lives in, if it lives in one.
fn grant_database(on: &GrantOn) -> Option<String> {
    on.database().map(str::to_owned)
}

fn ownership_database(on: &OwnershipGrantOn) -> Option<String> {
    match on {
        OwnershipGrantOn::Object { object_type, name } => {
            let in_database = *object_type == ObjectType::Database
                || !matches!(name, crate::identifier::ObjectIdentifier::AccountObject(_));
            in_database.then(|| name.database().to_owned())
        }
        OwnershipGrantOn::All(bulk) | OwnershipGrantOn::Future(bulk) => Some(match &bulk.container {
            BulkIn::Database(db) => db.name().to_owned(),
            BulkIn::Schema(schema) => schema.database().to_owned(),
        }),
    }
}

fn listed_name(listing: &ShowGrantsRequest, object_type: ObjectType) -> String {
    match listing {
        ShowGrantsRequest::OnAccount => "ACCOUNT".to_owned(),
        ShowGrantsRequest::On { name, .. } => unquoted(name),
        ShowGrantsRequest::FutureIn(container) => {
            let container = match container {
                BulkIn::Database(db) => unquoted(db),
                BulkIn::Schema(schema) => unquoted(schema),
            };
            format!("{container}.<{}>", object_type.as_str().replace(' ', "_"))
        }
    }
}

/// Snowflake reports imported privileges as USAGE.
fn stored_privilege(privilege: &str) -> String {
    match privilege.to_uppercase().as_str() {
        "IMPORTED PRIVILEGES" => "USAGE".to_owned(),
        upper => upper.to_owned(),
    }
}

impl State {
    fn ensure_role(&self, grantee: &Grantee) -> Result<()> {
        if self.roles.contains(&grantee_key(grantee)) {
            Ok(())
        } else {
            Err(missing(format!("Role {}", grantee.fully_qualified_name())))
        }
    }

    fn ensure_database(&self, database: Option<String>) -> Result<()> {
        match database {
            Some(db) if !self.databases.contains(&db) => Err(missing(format!("Database '{db}'"))),
            _ => Ok(()),
        }
    }

    fn add_grant(
        &mut self,
        listing: &ShowGrantsRequest,
        object_type: ObjectType,
        privilege: &str,
        grantee: &Grantee,
        grant_option: bool,
        granted_by: Option<String>,
    ) {
        let listing_sql = listing.to_string();
        let privilege = stored_privilege(privilege);
        let existing = self.grants.iter_mut().find(|g| {
            g.listing == listing_sql
                && g.object_type == object_type
                && g.privilege == privilege
                && &g.grantee == grantee
        });
        match existing {
            Some(grant) => grant.grant_option |= grant_option,
            None => self.grants.push(StoredGrant {
                listing: listing_sql,
                object_type,
                object_name: listed_name(listing, object_type),
                privilege,
                grantee: grantee.clone(),
                grant_option,
                granted_by,
                future: listing.is_future(),
            }),
        }
    }

    fn grant(&mut self, req: &GrantRequest) -> Result<()> {
        self.ensure_role(&req.to)?;
        self.ensure_database(grant_database(&req.on))?;
        let listing = match req.on.show_request() {
            Some(listing) => listing,
            None => return Ok(()),
        };
        let privileges = match &req.privileges {
            GrantPrivileges::All => vec!["USAGE".to_owned(), "MONITOR".to_owned()],
            GrantPrivileges::Explicit(privileges) => privileges.clone(),
        };
        let granted_by = Some(self.current_role.clone());
        for privilege in &privileges {
            self.add_grant(
                &listing,
                req.on.expected_object_type(),
                privilege,
                &req.to,
                req.with_grant_option,
                granted_by.clone(),
            );
        }
        Ok(())
    }

    fn revoke(&mut self, req: &RevokeRequest) -> Result<()> {
        self.ensure_role(&req.from)?;
        self.ensure_database(grant_database(&req.on))?;
        let listing = match req.on.show_request() {
            Some(listing) => listing.to_string(),
            None => return Ok(()),
        };
        let object_type = req.on.expected_object_type();
        let revoked: Option<BTreeSet<String>> = match &req.privileges {
            GrantPrivileges::All => None,
            GrantPrivileges::Explicit(privileges) => {
                Some(privileges.iter().map(|p| stored_privilege(p)).collect())
            }
        };
        let matches = |g: &StoredGrant| {
            g.listing == listing
                && g.object_type == object_type
                && g.grantee == req.from
                && g.privilege != OWNERSHIP
                && revoked.as_ref().map_or(true, |r| r.contains(&g.privilege))
        };
        if req.grant_option_for {
            for grant in self.grants.iter_mut().filter(|g| matches(g)) {
                grant.grant_option = false;
            }
        } else {
            self.grants.retain(|g| !matches(g));
        }
        Ok(())
    }

    fn grant_ownership(&mut self, req: &GrantOwnershipRequest) -> Result<()> {
        self.ensure_role(&req.to)?;
        self.ensure_database(ownership_database(&req.on))?;
        let listing = match req.on.show_request() {
            Some(listing) => listing,
            None => return Ok(()),
        };
        let object_type = req.on.expected_object_type();
        let listing_sql = listing.to_string();
        self.grants.retain(|g| {
            !(g.listing == listing_sql && g.object_type == object_type && g.privilege == OWNERSHIP)
        });
        let granted_by = Some(self.current_role.clone());
        self.add_grant(&listing, object_type, OWNERSHIP, &req.to, false, granted_by);
        Ok(())
    }

    fn show_grants(&self, req: &ShowGrantsRequest) -> Result<Vec<GrantRow>> {
        let database = match req {
            ShowGrantsRequest::OnAccount => None,
            ShowGrantsRequest::On { object_type, name } => {
                ownership_database(&OwnershipGrantOn::Object {
                    object_type: *object_type,
                    name: name.clone(),
                })
            }
            ShowGrantsRequest::FutureIn(BulkIn::Database(db)) => Some(db.name().to_owned()),
            ShowGrantsRequest::FutureIn(BulkIn::Schema(schema)) => {
                Some(schema.database().to_owned())
            }
        };
        self.ensure_database(database)?;
        let listing = req.to_string();
        Ok(self
            .grants
            .iter()
            .filter(|g| g.listing == listing)
            .map(StoredGrant::row)
            .collect())
    }

    fn task(&self, id: &SchemaObjectIdentifier) -> Result<&StoredTask> {
        self.tasks
            .get(id)
            .ok_or_else(|| missing(format!("Task {id}")))
    }

    fn task_mut(&mut self, id: &SchemaObjectIdentifier) -> Result<&mut StoredTask> {
        self.tasks
            .get_mut(id)
            .ok_or_else(|| missing(format!("Task {id}")))
    }

    fn is_root(&self, id: &SchemaObjectIdentifier) -> bool {
        self.tasks.get(id).map_or(true, |t| {
            t.definition.after.is_empty() && t.definition.finalize.is_none()
        })
    }

    fn root_of(&self, id: &SchemaObjectIdentifier) -> SchemaObjectIdentifier {
        let mut current = id.clone();
        while let Some(task) = self.tasks.get(&current) {
            let next = task
                .definition
                .after
                .first()
                .or(task.definition.finalize.as_ref());
            match next {
                Some(next) => current = next.clone(),
                None => break,
            }
        }
        current
    }

    fn is_started(&self, id: &SchemaObjectIdentifier) -> bool {
        self.tasks
            .get(&self.root_of(id))
            .map_or(false, |root| root.started)
    }

    fn ensure_graph_suspended(&self, id: &SchemaObjectIdentifier) -> Result<()> {
        if self.is_started(id) {
            Err(Error::Invalid(format!(
                "Unable to update graph with root task {} since that root task is not suspended.",
                self.root_of(id)
            )))
        } else {
            Ok(())
        }
    }

    fn ensure_upstream(&self, id: &SchemaObjectIdentifier) -> Result<()> {
        self.task(id)?;
        self.ensure_graph_suspended(id)
    }

    fn ensure_finalizable(&self, root: &SchemaObjectIdentifier) -> Result<()> {
        self.ensure_upstream(root)?;
        if self.is_root(root) {
            Ok(())
        } else {
            Err(Error::Invalid(format!("Task {root} is not a root task.")))
        }
    }

    fn create_task(&mut self, req: &CreateTaskRequest) -> Result<()> {
        if self.tasks.contains_key(&req.id) {
            return Err(Error::Other {
                sql_state: "42710".to_owned(),
                message: format!("Task {} already exists.", req.id),
            });
        }
        if req.schedule.is_some() && (!req.after.is_empty() || req.finalize.is_some()) {
            return Err(Error::Invalid(format!(
                "Task {} has both schedule and predecessor.",
                req.id
            )));
        }
        for predecessor in &req.after {
            self.ensure_upstream(predecessor)?;
        }
        if let Some(root) = &req.finalize {
            self.ensure_finalizable(root)?;
        }
        self.tasks.insert(
            req.id.clone(),
            StoredTask {
                definition: req.clone(),
                started: false,
            },
        );
        Ok(())
    }

    fn alter_task(&mut self, req: &AlterTaskRequest) -> Result<()> {
        let id = &req.id;
        self.task(id)?;
        match &req.action {
            AlterTaskAction::Resume => {
                if !self.is_root(id) {
                    return Err(Error::Invalid(format!(
                        "Task {id} is not a root task and can't be resumed on its own."
                    )));
                }
                self.task_mut(id)?.started = true;
                return Ok(());
            }
            AlterTaskAction::Suspend => {
                self.task_mut(id)?.started = false;
                return Ok(());
            }
            _ => self.ensure_graph_suspended(id)?,
        }

        match &req.action {
            AlterTaskAction::AddAfter(ids) => {
                for predecessor in ids {
                    self.ensure_upstream(predecessor)?;
                }
            }
            AlterTaskAction::SetFinalize(root) => self.ensure_finalizable(root)?,
            _ => (),
        }

        let task = &mut self.task_mut(id)?.definition;
        match &req.action {
            AlterTaskAction::RemoveAfter(ids) => task.after.retain(|a| !ids.contains(a)),
            AlterTaskAction::AddAfter(ids) => {
                if task.schedule.is_some() {
                    return Err(Error::Invalid(format!(
                        "Task {id} has both schedule and predecessor."
                    )));
                }
                for predecessor in ids {
                    if !task.after.contains(predecessor) {
                        task.after.push(predecessor.clone());
                    }
                }
            }
            AlterTaskAction::Set(settings) => {
                for setting in settings {
                    apply_setting(task, setting)?;
                }
            }
            AlterTaskAction::Unset(attributes) => {
                for attribute in attributes {
                    unset_attribute(task, attribute);
                }
            }
            AlterTaskAction::SetFinalize(root) => {
                if task.schedule.is_some() {
                    return Err(Error::Invalid(format!(
                        "Task {id} has both schedule and finalize."
                    )));
                }
                task.finalize = Some(root.clone());
            }
            AlterTaskAction::UnsetFinalize => task.finalize = None,
            AlterTaskAction::ModifyAs(sql) => task.sql_statement = sql.clone(),
            AlterTaskAction::ModifyWhen(when) => task.when = Some(when.clone()),
            AlterTaskAction::RemoveWhen => task.when = None,
            AlterTaskAction::Resume | AlterTaskAction::Suspend => (),
        }
        // a task leaving or joining a graph comes out suspended
        if matches!(
            req.action,
            AlterTaskAction::RemoveAfter(_)
                | AlterTaskAction::AddAfter(_)
                | AlterTaskAction::SetFinalize(_)
                | AlterTaskAction::UnsetFinalize
        ) {
            self.task_mut(id)?.started = false;
        }
        Ok(())
    }

    fn drop_task(&mut self, id: &SchemaObjectIdentifier) -> Result<()> {
        self.task(id)?;
        if !self.is_root(id) {
            self.ensure_graph_suspended(id)?;
        }
        self.tasks.remove(id);
        Ok(())
    }

    fn show_task(&self, id: &SchemaObjectIdentifier) -> Result<TaskRow> {
        let task = &self.task(id)?.definition;
        let finalizer = self
            .tasks
            .values()
            .find(|t| t.definition.finalize.as_ref() == Some(id))
            .map(|t| t.definition.id.to_string());
        let relations = json!({
            "Predecessors": task.after.iter().map(|a| a.to_string()).collect::<Vec<_>>(),
            "FinalizerTask": finalizer,
            "FinalizedRootTask": task.finalize.as_ref().map(|f| f.to_string()),
        });
        Ok(TaskRow {
            name: id.name().to_owned(),
            database_name: id.database().to_owned(),
            schema_name: id.schema().to_owned(),
            owner: self.current_role.clone(),
            comment: task.comment.clone(),
            warehouse: task.warehouse.as_ref().map(|w| w.name().to_owned()),
            schedule: task.schedule.as_ref().map(|s| s.to_string()),
            predecessors: None,
            state: if self.is_started(id) { "started" } else { "suspended" }.to_owned(),
            definition: task.sql_statement.clone(),
            condition: task.when.clone(),
            allow_overlapping_execution: Some(
                task.allow_overlapping_execution.unwrap_or(false).to_string(),
            ),
            error_integration: task.error_integration.as_ref().map(|i| i.name().to_owned()),
            config: task.config.clone(),
            task_relations: Some(relations.to_string()),
        })
    }

    fn show_task_parameters(&self, id: &SchemaObjectIdentifier) -> Result<Vec<ParameterRow>> {
        let task = &self.task(id)?.definition;
        let mut rows: Vec<ParameterRow> = task
            .parameters
            .iter()
            .map(|(name, value)| ParameterRow {
                key: name.clone(),
                value: match value {
                    ParameterValue::Int(n) => n.to_string(),
                    ParameterValue::Bool(b) => b.to_string(),
                    ParameterValue::String(s) => s.clone(),
                },
                level: "TASK".to_owned(),
                ..Default::default()
            })
            .collect();
        if !task.parameters.iter().any(|(name, _)| name == "TIMEZONE") {
            rows.push(ParameterRow {
                key: "TIMEZONE".to_owned(),
                value: "America/Los_Angeles".to_owned(),
                default: "America/Los_Angeles".to_owned(),
                level: String::new(),
                kind: "STRING".to_owned(),
            });
        }
        Ok(rows)
    }
}

fn apply_setting(task: &mut CreateTaskRequest, setting: &TaskSetting) -> Result<()> {
    match setting {
        TaskSetting::Warehouse(w) => task.warehouse = Some(w.clone()),
        TaskSetting::Schedule(schedule) => {
            if !task.after.is_empty() || task.finalize.is_some() {
                return Err(Error::Invalid(format!(
                    "Task {} has both schedule and predecessor.",
                    task.id
                )));
            }
            task.schedule = Some(schedule.clone());
        }
        TaskSetting::Config(config) => task.config = Some(config.clone()),
        TaskSetting::AllowOverlappingExecution(allow) => {
            task.allow_overlapping_execution = Some(*allow)
        }
        TaskSetting::ErrorIntegration(i) => task.error_integration = Some(i.clone()),
        TaskSetting::Comment(comment) => task.comment = Some(comment.clone()),
        TaskSetting::Parameter(name, value) => {
            task.parameters.retain(|(n, _)| n != name);
            task.parameters.push((name.clone(), value.clone()));
        }
    }
    Ok(())
}

fn unset_attribute(task: &mut CreateTaskRequest, attribute: &TaskAttribute) {
    match attribute {
        TaskAttribute::Warehouse => task.warehouse = None,
        TaskAttribute::Schedule => task.schedule = None,
        TaskAttribute::Config => task.config = None,
        TaskAttribute::AllowOverlappingExecution => task.allow_overlapping_execution = None,
        TaskAttribute::ErrorIntegration => task.error_integration = None,
        TaskAttribute::Comment => task.comment = None,
        TaskAttribute::Parameter(name) => task.parameters.retain(|(n, _)| n != name),
    }
}

/// See the module docs.
pub(crate) struct FakeSnowflake {
    state: Mutex<State>,
}

impl FakeSnowflake {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                current_role: "ACCOUNTADMIN".to_owned(),
                ..Default::default()
            }),
        }
    }

    pub(crate) fn with_role(self, name: &str) -> Self {
        self.state.lock().unwrap().roles.insert(name.to_owned());
        self
    }

    pub(crate) fn with_database_role(self, database: &str, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .roles
            .insert(format!("{database}.{name}"));
        self
    }

    pub(crate) fn with_database(self, name: &str) -> Self {
        self.state.lock().unwrap().databases.insert(name.to_owned());
        self
    }

    pub(crate) fn with_current_role(self, name: &str) -> Self {
        self.state.lock().unwrap().current_role = name.to_owned();
        self
    }

    /// Add a task without going through any statement.
    pub(crate) fn with_task(self, definition: CreateTaskRequest, started: bool) -> Self {
        self.state.lock().unwrap().tasks.insert(
            definition.id.clone(),
            StoredTask {
                definition,
                started,
            },
        );
        self
    }

    /// Fail every statement containing `pattern` with `error`.
    pub(crate) fn failing_on(self, pattern: &str, error: Error) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .push((pattern.to_owned(), error));
        self
    }

    /// Record a grant made outside of the provider.
    pub(crate) fn seed_grant(
        &self,
        privilege: &str,
        on: GrantOn,
        to: &Grantee,
        with_grant_option: bool,
    ) {
        let mut state = self.state.lock().unwrap();
        let granted_by = Some(state.current_role.clone());
        let listing = on.show_request().expect("observable scope");
        state.add_grant(
            &listing,
            on.expected_object_type(),
            privilege,
            to,
            with_grant_option,
            granted_by,
        );
    }

    /// Record a grant Snowflake reports without a grantor.
    pub(crate) fn seed_grant_without_grantor(&self, privilege: &str, on: GrantOn, to: &Grantee) {
        let mut state = self.state.lock().unwrap();
        let listing = on.show_request().expect("observable scope");
        state.add_grant(&listing, on.expected_object_type(), privilege, to, false, None);
    }

    /// Forget a grant, as if revoked outside of the provider.
    pub(crate) fn forget_grants(&self, to: &Grantee) {
        self.state.lock().unwrap().grants.retain(|g| &g.grantee != to);
    }

    /// Statements sent, oldest first. Queries are not included.
    pub(crate) fn statements(&self) -> Vec<String> {
        self.state.lock().unwrap().statements.clone()
    }

    /// Queries sent, oldest first.
    pub(crate) fn queries(&self) -> Vec<String> {
        self.state.lock().unwrap().queries.clone()
    }

    /// Everything sent, statements and queries interleaved, oldest first.
    pub(crate) fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    pub(crate) fn clear_log(&self) {
        let mut state = self.state.lock().unwrap();
        state.statements.clear();
        state.queries.clear();
        state.log.clear();
    }

    /// Whether the task's graph is running.
    pub(crate) fn is_started(&self, id: &SchemaObjectIdentifier) -> bool {
        self.state.lock().unwrap().is_started(id)
    }

    fn execute(
        &self,
        ctx: &Context,
        sql: String,
        apply: impl FnOnce(&mut State) -> Result<()>,
    ) -> Result<()> {
        ctx.ensure_active()?;
        let mut state = self.state.lock().unwrap();
        let failure = state
            .failures
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, e)| e.clone());
        state.log.push(sql.clone());
        state.statements.push(sql);
        match failure {
            Some(e) => Err(e),
            None => apply(&mut state),
        }
    }

    fn query<T>(&self, ctx: &Context, sql: String, read: impl FnOnce(&State) -> Result<T>) -> Result<T> {
        ctx.ensure_active()?;
        let mut state = self.state.lock().unwrap();
        state.log.push(sql.clone());
        state.queries.push(sql);
        read(&state)
    }
}

#[async_trait]
impl Grants for FakeSnowflake {
    async fn grant(&self, ctx: &Context, req: &GrantRequest) -> Result<()> {
        self.execute(ctx, req.to_string(), |s| s.grant(req))
    }

    async fn revoke(&self, ctx: &Context, req: &RevokeRequest) -> Result<()> {
        self.execute(ctx, req.to_string(), |s| s.revoke(req))
    }

    async fn grant_ownership(&self, ctx: &Context, req: &GrantOwnershipRequest) -> Result<()> {
        self.execute(ctx, req.to_string(), |s| s.grant_ownership(req))
    }

    async fn show_grants(&self, ctx: &Context, req: &ShowGrantsRequest) -> Result<Vec<GrantRow>> {
        self.query(ctx, req.to_string(), |s| s.show_grants(req))
    }
}

#[async_trait]
impl Tasks for FakeSnowflake {
    async fn create_task(&self, ctx: &Context, req: &CreateTaskRequest) -> Result<()> {
        self.execute(ctx, req.to_string(), |s| s.create_task(req))
    }

    async fn alter_task(&self, ctx: &Context, req: &AlterTaskRequest) -> Result<()> {
        self.execute(ctx, req.to_string(), |s| s.alter_task(req))
    }

    async fn drop_task(&self, ctx: &Context, id: &SchemaObjectIdentifier) -> Result<()> {
        self.execute(ctx, drop_task_sql(id), |s| s.drop_task(id))
    }

    async fn show_task(&self, ctx: &Context, id: &SchemaObjectIdentifier) -> Result<TaskRow> {
        self.query(ctx, show_task_sql(id), |s| s.show_task(id))
    }

    async fn show_task_parameters(
        &self,
        ctx: &Context,
        id: &SchemaObjectIdentifier,
    ) -> Result<Vec<ParameterRow>> {
        self.query(ctx, show_task_parameters_sql(id), |s| s.show_task_parameters(id))
    }
}

#[async_trait]
impl Roles for FakeSnowflake {
    async fn show_role(&self, ctx: &Context, role: &Grantee) -> Result<RoleRow> {
        self.query(ctx, show_role_sql(role), |s| {
            s.ensure_role(role)?;
            Ok(RoleRow {
                name: match role {
                    Grantee::AccountRole(id) => id.name().to_owned(),
                    Grantee::DatabaseRole(id) => id.name().to_owned(),
                },
                owner: s.current_role.clone(),
                comment: None,
            })
        })
    }
}

#[async_trait]
impl Session for FakeSnowflake {
    async fn current_role(&self, ctx: &Context) -> Result<AccountObjectIdentifier> {
        self.query(ctx, "SELECT CURRENT_ROLE()".to_owned(), |s| {
            Ok(AccountObjectIdentifier::new(&s.current_role))
        })
    }
}
