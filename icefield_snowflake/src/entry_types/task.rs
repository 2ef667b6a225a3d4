use serde::Deserialize;

use super::is_true;
use crate::error::{Error, Result};
use crate::identifier::{AccountObjectIdentifier, SchemaObjectIdentifier};
use crate::sdk::TaskSchedule;

/// A row of `SHOW TASKS`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TaskRow {
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub owner: String,
    pub comment: Option<String>,
    pub warehouse: Option<String>,
    pub schedule: Option<String>,
    /// JSON array of quoted fully qualified names.
    pub predecessors: Option<String>,
    /// `started` or `suspended`.
    pub state: String,
    pub definition: String,
    pub condition: Option<String>,
    pub allow_overlapping_execution: Option<String>,
    pub error_integration: Option<String>,
    pub config: Option<String>,
    /// JSON object with `Predecessors`, `FinalizerTask` and `FinalizedRootTask`.
    pub task_relations: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct TaskRelations {
    predecessors: Vec<String>,
    finalizer_task: Option<String>,
    finalized_root_task: Option<String>,
}

fn parse_task_id(raw: &str) -> Result<SchemaObjectIdentifier> {
    raw.parse()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty() && *v != "null")
}

impl TaskRow {
    /// The task's identifier.
    pub fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new(&self.database_name, &self.schema_name, &self.name)
    }

    /// Whether the task is running.
    pub fn is_started(&self) -> bool {
        self.state.eq_ignore_ascii_case("started")
    }

    fn relations(&self) -> Result<Option<TaskRelations>> {
        non_empty(&self.task_relations)
            .map(|raw| {
                serde_json::from_str(raw).map_err(|e| {
                    Error::Other {
                        sql_state: String::new(),
                        message: format!("invalid task_relations {raw:?}: {e}"),
                    }
                })
            })
            .transpose()
    }

    /// The immediate predecessors.
    pub fn predecessors(&self) -> Result<Vec<SchemaObjectIdentifier>> {
        let raw: Vec<String> = match self.relations()? {
            Some(relations) => relations.predecessors,
            None => match non_empty(&self.predecessors) {
                Some(raw) => serde_json::from_str(raw).map_err(|e| Error::Other {
                    sql_state: String::new(),
                    message: format!("invalid predecessors {raw:?}: {e}"),
                })?,
                None => vec![],
            },
        };
        raw.iter().map(|p| parse_task_id(p)).collect()
    }

    /// The finalizer attached to this root, if any.
    pub fn finalizer(&self) -> Result<Option<SchemaObjectIdentifier>> {
        self.relations()?
            .and_then(|r| r.finalizer_task)
            .map(|raw| parse_task_id(&raw))
            .transpose()
    }

    /// The root this task finalizes, if it is a finalizer.
    pub fn finalized_root(&self) -> Result<Option<SchemaObjectIdentifier>> {
        self.relations()?
            .and_then(|r| r.finalized_root_task)
            .map(|raw| parse_task_id(&raw))
            .transpose()
    }

    /// Whether the task heads its own graph: no predecessor and not a
    /// finalizer.
    pub fn is_root(&self) -> Result<bool> {
        Ok(self.predecessors()?.is_empty() && self.finalized_root()?.is_none())
    }

    pub fn schedule(&self) -> Result<Option<TaskSchedule>> {
        non_empty(&self.schedule)
            .map(str::parse::<TaskSchedule>)
            .transpose()
    }

    pub fn warehouse(&self) -> Option<AccountObjectIdentifier> {
        non_empty(&self.warehouse).map(|w| {
            w.parse()
                .unwrap_or_else(|_| AccountObjectIdentifier::new(w))
        })
    }

    pub fn error_integration(&self) -> Option<AccountObjectIdentifier> {
        non_empty(&self.error_integration).map(|i| {
            i.parse()
                .unwrap_or_else(|_| AccountObjectIdentifier::new(i))
        })
    }

    pub fn allows_overlapping_execution(&self) -> bool {
        self.allow_overlapping_execution
            .as_deref()
            .map_or(false, is_true)
    }
}
