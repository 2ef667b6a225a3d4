//! Typed CREATE / ALTER / DROP / SHOW TASK requests.

use std::fmt;
use std::str::FromStr;

use derive_new::new;

use crate::error::{Error, Result};
use crate::identifier::{AccountObjectIdentifier, SchemaObjectIdentifier};

use super::string_literal;

/// When a standalone or root task runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskSchedule {
    /// Every N minutes.
    Minutes(u32),
    /// A cron expression followed by a time zone, e.g. `0 9 * * * UTC`.
    Cron(String),
}

impl FromStr for TaskSchedule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        const CRON_PREFIX: &str = "USING CRON ";
        if let Some(prefix) = trimmed
            .get(..CRON_PREFIX.len())
            .filter(|p| p.eq_ignore_ascii_case(CRON_PREFIX))
        {
            // time zones are case sensitive, keep the expression as written
            let expr = trimmed[prefix.len()..].trim();
            if expr.is_empty() {
                return Err(Error::Invalid(format!("empty cron expression in schedule {s:?}")));
            }
            return Ok(TaskSchedule::Cron(expr.to_owned()));
        }
        let upper = trimmed.to_uppercase();
        let mut words = upper.split_whitespace();
        match (words.next(), words.next(), words.next()) {
            (Some(n), Some("MINUTE" | "MINUTES" | "M"), None) => n
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .map(TaskSchedule::Minutes)
                .ok_or_else(|| Error::Invalid(format!("invalid minute count in schedule {s:?}"))),
            _ => Err(Error::Invalid(format!(
                "invalid schedule {s:?}, expected \"<num> MINUTES\" or \"USING CRON <expr> <time_zone>\""
            ))),
        }
    }
}

impl fmt::Display for TaskSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskSchedule::Minutes(1) => f.write_str("1 MINUTE"),
            TaskSchedule::Minutes(n) => write!(f, "{n} MINUTES"),
            TaskSchedule::Cron(expr) => write!(f, "USING CRON {expr}"),
        }
    }
}

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValue {
    Int(i64),
    Bool(bool),
    String(String),
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Int(n) => write!(f, "{n}"),
            ParameterValue::Bool(true) => f.write_str("TRUE"),
            ParameterValue::Bool(false) => f.write_str("FALSE"),
            ParameterValue::String(s) => f.write_str(&string_literal(s)),
        }
    }
}

/// One `name = value` pair of `ALTER TASK ... SET`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskSetting {
    Warehouse(AccountObjectIdentifier),
    Schedule(TaskSchedule),
    Config(String),
    AllowOverlappingExecution(bool),
    ErrorIntegration(AccountObjectIdentifier),
    Comment(String),
    /// A parameter by its SQL name.
    Parameter(String, ParameterValue),
}

impl fmt::Display for TaskSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskSetting::Warehouse(id) => write!(f, "WAREHOUSE = {id}"),
            TaskSetting::Schedule(schedule) => {
                write!(f, "SCHEDULE = {}", string_literal(&schedule.to_string()))
            }
            TaskSetting::Config(config) => write!(f, "CONFIG = $${config}$$"),
            TaskSetting::AllowOverlappingExecution(allow) => write!(
                f,
                "ALLOW_OVERLAPPING_EXECUTION = {}",
                ParameterValue::Bool(*allow)
            ),
            TaskSetting::ErrorIntegration(id) => write!(f, "ERROR_INTEGRATION = {id}"),
            TaskSetting::Comment(comment) => write!(f, "COMMENT = {}", string_literal(comment)),
            TaskSetting::Parameter(name, value) => write!(f, "{name} = {value}"),
        }
    }
}

/// One attribute of `ALTER TASK ... UNSET`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAttribute {
    Warehouse,
    Schedule,
    Config,
    AllowOverlappingExecution,
    ErrorIntegration,
    Comment,
    /// A parameter by its SQL name.
    Parameter(String),
}

impl fmt::Display for TaskAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskAttribute::Warehouse => f.write_str("WAREHOUSE"),
            TaskAttribute::Schedule => f.write_str("SCHEDULE"),
            TaskAttribute::Config => f.write_str("CONFIG"),
            TaskAttribute::AllowOverlappingExecution => f.write_str("ALLOW_OVERLAPPING_EXECUTION"),
            TaskAttribute::ErrorIntegration => f.write_str("ERROR_INTEGRATION"),
            TaskAttribute::Comment => f.write_str("COMMENT"),
            TaskAttribute::Parameter(name) => f.write_str(name),
        }
    }
}

fn join_ids(ids: &[SchemaObjectIdentifier]) -> String {
    ids.iter()
        .map(|id| id.fully_qualified_name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_display<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `CREATE TASK`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub id: SchemaObjectIdentifier,
    pub warehouse: Option<AccountObjectIdentifier>,
    pub schedule: Option<TaskSchedule>,
    pub config: Option<String>,
    pub allow_overlapping_execution: Option<bool>,
    /// `(SQL name, value)` pairs.
    pub parameters: Vec<(String, ParameterValue)>,
    pub error_integration: Option<AccountObjectIdentifier>,
    pub comment: Option<String>,
    pub finalize: Option<SchemaObjectIdentifier>,
    pub after: Vec<SchemaObjectIdentifier>,
    pub when: Option<String>,
    pub sql_statement: String,
}

impl CreateTaskRequest {
    /// A bare request running `sql_statement`.
    pub fn new(id: SchemaObjectIdentifier, sql_statement: impl Into<String>) -> Self {
        Self {
            id,
            warehouse: None,
            schedule: None,
            config: None,
            allow_overlapping_execution: None,
            parameters: vec![],
            error_integration: None,
            comment: None,
            finalize: None,
            after: vec![],
            when: None,
            sql_statement: sql_statement.into(),
        }
    }
}

impl fmt::Display for CreateTaskRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CREATE TASK {}", self.id)?;
        if let Some(warehouse) = &self.warehouse {
            write!(f, " {}", TaskSetting::Warehouse(warehouse.clone()))?;
        }
        if let Some(schedule) = &self.schedule {
            write!(f, " {}", TaskSetting::Schedule(schedule.clone()))?;
        }
        if let Some(config) = &self.config {
            write!(f, " {}", TaskSetting::Config(config.clone()))?;
        }
        if let Some(allow) = self.allow_overlapping_execution {
            write!(f, " {}", TaskSetting::AllowOverlappingExecution(allow))?;
        }
        for (name, value) in &self.parameters {
            write!(f, " {name} = {value}")?;
        }
        if let Some(integration) = &self.error_integration {
            write!(f, " {}", TaskSetting::ErrorIntegration(integration.clone()))?;
        }
        if let Some(comment) = &self.comment {
            write!(f, " {}", TaskSetting::Comment(comment.clone()))?;
        }
        if let Some(root) = &self.finalize {
            write!(f, " FINALIZE = {root}")?;
        }
        if !self.after.is_empty() {
            write!(f, " AFTER {}", join_ids(&self.after))?;
        }
        if let Some(when) = &self.when {
            write!(f, " WHEN {when}")?;
        }
        write!(f, " AS {}", self.sql_statement)
    }
}

/// What an `ALTER TASK` does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterTaskAction {
    Resume,
    Suspend,
    RemoveAfter(Vec<SchemaObjectIdentifier>),
    AddAfter(Vec<SchemaObjectIdentifier>),
    Set(Vec<TaskSetting>),
    Unset(Vec<TaskAttribute>),
    SetFinalize(SchemaObjectIdentifier),
    UnsetFinalize,
    ModifyAs(String),
    ModifyWhen(String),
    RemoveWhen,
}

impl fmt::Display for AlterTaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlterTaskAction::Resume => f.write_str("RESUME"),
            AlterTaskAction::Suspend => f.write_str("SUSPEND"),
            AlterTaskAction::RemoveAfter(ids) => write!(f, "REMOVE AFTER {}", join_ids(ids)),
            AlterTaskAction::AddAfter(ids) => write!(f, "ADD AFTER {}", join_ids(ids)),
            AlterTaskAction::Set(settings) => write!(f, "SET {}", join_display(settings)),
            AlterTaskAction::Unset(attributes) => write!(f, "UNSET {}", join_display(attributes)),
            AlterTaskAction::SetFinalize(root) => write!(f, "SET FINALIZE = {root}"),
            AlterTaskAction::UnsetFinalize => f.write_str("UNSET FINALIZE"),
            AlterTaskAction::ModifyAs(sql) => write!(f, "MODIFY AS {sql}"),
            AlterTaskAction::ModifyWhen(when) => write!(f, "MODIFY WHEN {when}"),
            AlterTaskAction::RemoveWhen => f.write_str("REMOVE WHEN"),
        }
    }
}

/// `ALTER TASK <id> <action>`
#[derive(new, Debug, Clone, PartialEq, Eq)]
pub struct AlterTaskRequest {
    pub id: SchemaObjectIdentifier,
    pub action: AlterTaskAction,
}

impl fmt::Display for AlterTaskRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ALTER TASK {} {}", self.id, self.action)
    }
}

pub(crate) fn drop_task_sql(id: &SchemaObjectIdentifier) -> String {
    format!("DROP TASK {id}")
}

/// `LIKE` is a pattern match, callers filter rows on the exact name.
pub(crate) fn show_task_sql(id: &SchemaObjectIdentifier) -> String {
    format!(
        "SHOW TASKS LIKE {} IN SCHEMA {}",
        string_literal(id.name()),
        id.schema_id()
    )
}

pub(crate) fn show_task_parameters_sql(id: &SchemaObjectIdentifier) -> String {
    format!("SHOW PARAMETERS IN TASK {id}")
}
