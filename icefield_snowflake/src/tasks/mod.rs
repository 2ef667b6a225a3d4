//! Task lifecycle.
//!
//! Every change goes through [`dag::with_suspended_roots`] so no statement
//! alters a task while its graph runs. `enabled` is reconciled last, and only
//! on tasks that head their own graph; children run whenever their root does.

pub mod dag;
pub mod parameters;

use std::collections::BTreeMap;

use icefield_core::logging::debug;
use icefield_core::Context;

use crate::entry_types::TaskRow;
use crate::error::{ignore_missing, Error, Result};
use crate::identifier::{AccountObjectIdentifier, SchemaObjectIdentifier};
use crate::sdk::{
    AlterTaskAction, AlterTaskRequest, CreateTaskRequest, ParameterValue, TaskAttribute,
    TaskSchedule, TaskSetting, Tasks,
};

use dag::{find_root, find_roots, with_suspended_roots};

/// Where a task sits in its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskShape {
    /// Runs on its own schedule, or heads a graph.
    Standalone,
    /// Runs after its predecessors.
    Child,
    /// Runs once its root's graph completes.
    Finalizer,
}

/// The full desired (or observed) state of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescription {
    pub id: SchemaObjectIdentifier,
    pub sql_statement: String,
    pub enabled: bool,
    pub warehouse: Option<AccountObjectIdentifier>,
    pub schedule: Option<TaskSchedule>,
    pub config: Option<String>,
    pub allow_overlapping_execution: bool,
    pub error_integration: Option<AccountObjectIdentifier>,
    pub comment: Option<String>,
    pub when: Option<String>,
    pub after: Vec<SchemaObjectIdentifier>,
    pub finalize: Option<SchemaObjectIdentifier>,
    /// Keyed by SQL name.
    pub parameters: BTreeMap<String, ParameterValue>,
}

impl TaskDescription {
    /// A disabled standalone task running `sql_statement`.
    pub fn new(id: SchemaObjectIdentifier, sql_statement: impl Into<String>) -> Self {
        Self {
            id,
            sql_statement: sql_statement.into(),
            enabled: false,
            warehouse: None,
            schedule: None,
            config: None,
            allow_overlapping_execution: false,
            error_integration: None,
            comment: None,
            when: None,
            after: vec![],
            finalize: None,
            parameters: BTreeMap::new(),
        }
    }

    pub fn shape(&self) -> TaskShape {
        if self.finalize.is_some() {
            TaskShape::Finalizer
        } else if !self.after.is_empty() {
            TaskShape::Child
        } else {
            TaskShape::Standalone
        }
    }

    /// Whether `enabled` is reconciled on the task itself.
    pub fn is_root(&self) -> bool {
        self.shape() == TaskShape::Standalone
    }

    /// At most one of schedule, after and finalize; no self edges.
    pub fn validate(&self) -> Result<()> {
        let triggers = [
            self.schedule.is_some(),
            !self.after.is_empty(),
            self.finalize.is_some(),
        ];
        if triggers.iter().filter(|t| **t).count() > 1 {
            return Err(Error::Invalid(format!(
                "task {} may have only one of schedule, after and finalize",
                self.id
            )));
        }
        if self.after.contains(&self.id) || self.finalize.as_ref() == Some(&self.id) {
            return Err(Error::Invalid(format!("task {} can't depend on itself", self.id)));
        }
        Ok(())
    }

    fn create_request(&self) -> CreateTaskRequest {
        CreateTaskRequest {
            id: self.id.clone(),
            warehouse: self.warehouse.clone(),
            schedule: self.schedule.clone(),
            config: self.config.clone(),
            allow_overlapping_execution: self.allow_overlapping_execution.then_some(true),
            parameters: self
                .parameters
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            error_integration: self.error_integration.clone(),
            comment: self.comment.clone(),
            finalize: self.finalize.clone(),
            after: self.after.clone(),
            when: self.when.clone(),
            sql_statement: self.sql_statement.clone(),
        }
    }

    /// Predecessors plus the finalized root, the edges leading to roots.
    fn upstream(&self) -> Vec<SchemaObjectIdentifier> {
        self.after.iter().chain(&self.finalize).cloned().collect()
    }
}

/// What a read found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskObservation {
    Found(TaskDescription),
    Missing,
}

fn upstream_of(row: &TaskRow) -> Result<Vec<SchemaObjectIdentifier>> {
    let mut upstream = row.predecessors()?;
    upstream.extend(row.finalized_root()?);
    Ok(upstream)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "null")
        .map(str::to_owned)
}

async fn alter<C: Tasks + ?Sized>(
    client: &C,
    ctx: &Context,
    id: &SchemaObjectIdentifier,
    action: AlterTaskAction,
) -> Result<()> {
    client
        .alter_task(ctx, &AlterTaskRequest::new(id.clone(), action))
        .await
}

/// Create the task suspended, attaching it under suspended roots, then
/// resume it if it is an enabled root.
pub async fn create<C: Tasks + ?Sized>(
    client: &C,
    ctx: &Context,
    desc: &TaskDescription,
) -> Result<()> {
    desc.validate()?;
    if let Some(target) = &desc.finalize {
        let target_row = client.show_task(ctx, target).await?;
        if !target_row.is_root()? {
            return Err(Error::Invalid(format!(
                "task {} can only finalize a root task, {target} is not one",
                desc.id
            )));
        }
    }
    let roots = find_roots(client, ctx, &desc.upstream(), &desc.id).await?;
    let request = desc.create_request();
    with_suspended_roots(client, ctx, &roots, client.create_task(ctx, &request)).await?;

    if desc.enabled && desc.is_root() {
        alter(client, ctx, &desc.id, AlterTaskAction::Resume).await?;
    }
    Ok(())
}

/// Read the task and the parameters set on it.
pub async fn read<C: Tasks + ?Sized>(
    client: &C,
    ctx: &Context,
    id: &SchemaObjectIdentifier,
) -> Result<TaskObservation> {
    let row = match client.show_task(ctx, id).await {
        Ok(row) => row,
        Err(e) if e.is_object_missing() => return Ok(TaskObservation::Missing),
        Err(e) => return Err(e),
    };
    let parameters = client
        .show_task_parameters(ctx, id)
        .await?
        .iter()
        .filter(|p| p.is_set_on_task())
        .filter_map(|p| {
            let parameter = parameters::lookup(&p.key)?;
            Some((parameter.sql_name(), parameter.value_from_row(p)?))
        })
        .collect();

    Ok(TaskObservation::Found(TaskDescription {
        id: row.id(),
        sql_statement: row.definition.clone(),
        enabled: row.is_started(),
        warehouse: row.warehouse(),
        schedule: row.schedule()?,
        config: non_empty(&row.config),
        allow_overlapping_execution: row.allows_overlapping_execution(),
        error_integration: row.error_integration(),
        comment: non_empty(&row.comment),
        when: non_empty(&row.condition),
        after: row.predecessors()?,
        finalize: row.finalized_root()?,
        parameters,
    }))
}

fn missing_from(a: &[SchemaObjectIdentifier], b: &[SchemaObjectIdentifier]) -> Vec<SchemaObjectIdentifier> {
    a.iter().filter(|id| !b.contains(id)).cloned().collect()
}

/// The ALTER actions converging `old` to `new`, in the order Snowflake
/// accepts them: edges come off before a schedule goes on, and go on last.
pub fn alter_actions(old: &TaskDescription, new: &TaskDescription) -> Vec<AlterTaskAction> {
    let mut actions = vec![];

    let removed_after = missing_from(&old.after, &new.after);
    if !removed_after.is_empty() {
        actions.push(AlterTaskAction::RemoveAfter(removed_after));
    }
    if old.finalize.is_some() && old.finalize != new.finalize {
        actions.push(AlterTaskAction::UnsetFinalize);
    }
    if old.schedule != new.schedule {
        actions.push(match &new.schedule {
            Some(schedule) => AlterTaskAction::Set(vec![TaskSetting::Schedule(schedule.clone())]),
            None => AlterTaskAction::Unset(vec![TaskAttribute::Schedule]),
        });
    }

    let mut set = vec![];
    let mut unset = vec![];
    macro_rules! reconcile {
        ($field:ident, $setting:expr, $attribute:expr) => {
            if old.$field != new.$field {
                match &new.$field {
                    Some(value) => set.push($setting(value.clone())),
                    None => unset.push($attribute),
                }
            }
        };
    }
    reconcile!(warehouse, TaskSetting::Warehouse, TaskAttribute::Warehouse);
    reconcile!(config, TaskSetting::Config, TaskAttribute::Config);
    if old.allow_overlapping_execution != new.allow_overlapping_execution {
        if new.allow_overlapping_execution {
            set.push(TaskSetting::AllowOverlappingExecution(true));
        } else {
            unset.push(TaskAttribute::AllowOverlappingExecution);
        }
    }
    reconcile!(error_integration, TaskSetting::ErrorIntegration, TaskAttribute::ErrorIntegration);
    reconcile!(comment, TaskSetting::Comment, TaskAttribute::Comment);
    for (name, value) in &new.parameters {
        if old.parameters.get(name) != Some(value) {
            set.push(TaskSetting::Parameter(name.clone(), value.clone()));
        }
    }
    for name in old.parameters.keys() {
        if !new.parameters.contains_key(name) {
            unset.push(TaskAttribute::Parameter(name.clone()));
        }
    }
    if !set.is_empty() {
        actions.push(AlterTaskAction::Set(set));
    }
    if !unset.is_empty() {
        actions.push(AlterTaskAction::Unset(unset));
    }

    if old.when != new.when {
        actions.push(match &new.when {
            Some(when) => AlterTaskAction::ModifyWhen(when.clone()),
            None => AlterTaskAction::RemoveWhen,
        });
    }
    if old.sql_statement != new.sql_statement {
        actions.push(AlterTaskAction::ModifyAs(new.sql_statement.clone()));
    }
    if let Some(root) = &new.finalize {
        if old.finalize.as_ref() != Some(root) {
            actions.push(AlterTaskAction::SetFinalize(root.clone()));
        }
    }
    let added_after = missing_from(&new.after, &old.after);
    if !added_after.is_empty() {
        actions.push(AlterTaskAction::AddAfter(added_after));
    }
    actions
}

/// Converge the task from `old` to `new`.
///
/// The live task decides what must be suspended: the task itself when it is a
/// running root, and the roots of every graph it leaves or joins.
pub async fn update<C: Tasks + ?Sized>(
    client: &C,
    ctx: &Context,
    old: &TaskDescription,
    new: &TaskDescription,
) -> Result<()> {
    new.validate()?;
    if old.id != new.id {
        return Err(Error::Invalid(format!(
            "task {} can't be renamed to {} in place",
            old.id, new.id
        )));
    }
    let live = client.show_task(ctx, &new.id).await?;
    let actions = alter_actions(old, new);
    // a child has no state of its own, it runs whenever its root does
    let mut started = live.is_root()? && live.is_started();

    if !actions.is_empty() {
        if started {
            alter(client, ctx, &new.id, AlterTaskAction::Suspend).await?;
            started = false;
        }

        let mut roots = vec![];
        for upstream in upstream_of(&live)? {
            // a graph the task is leaving may already be gone
            match find_root(client, ctx, &upstream).await {
                Ok(root) => roots.push(root),
                Err(e) if e.is_object_missing() => debug!("old upstream task {upstream} is gone"),
                Err(e) => return Err(e),
            }
        }
        roots.extend(find_roots(client, ctx, &new.upstream(), &new.id).await?);
        let mut seen = vec![];
        roots.retain(|r| {
            let id = r.id();
            let keep = id != new.id && !seen.contains(&id);
            seen.push(id);
            keep
        });

        with_suspended_roots(client, ctx, &roots, async {
            for action in actions {
                alter(client, ctx, &new.id, action).await?;
            }
            Ok::<_, Error>(())
        })
        .await?;
    }

    if new.is_root() {
        if new.enabled && !started {
            alter(client, ctx, &new.id, AlterTaskAction::Resume).await?;
        } else if !new.enabled && started {
            alter(client, ctx, &new.id, AlterTaskAction::Suspend).await?;
        }
    }
    Ok(())
}

/// Drop the task. A task that is already gone is fine.
pub async fn delete<C: Tasks + ?Sized>(
    client: &C,
    ctx: &Context,
    id: &SchemaObjectIdentifier,
) -> Result<()> {
    let live = match client.show_task(ctx, id).await {
        Ok(live) => live,
        Err(e) if e.is_object_missing() => return Ok(()),
        Err(e) => return Err(e),
    };
    let roots = if live.is_root()? {
        vec![]
    } else {
        find_roots(client, ctx, &upstream_of(&live)?, id).await?
    };
    ignore_missing(with_suspended_roots(client, ctx, &roots, client.drop_task(ctx, id)).await)
}
