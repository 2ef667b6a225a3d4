//! `snowflake_task`

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use async_trait::async_trait;
use icefield_core::logging::warn;
use icefield_core::{
    Attribute, AttributeMap, Context, Diagnostics, Resource, ResourceData, StateUpgrader,
};
use serde_json::Value;

use super::{get_bool, get_str, get_strings, keep_declared, parse_opt, require_str};
use crate::identifier::SchemaObjectIdentifier;
use crate::sdk::{Client, TaskSchedule};
use crate::tasks::parameters::{value_to_json, TASK_PARAMETERS};
use crate::tasks::{self, TaskDescription, TaskObservation};

const BASE_SCHEMA: &[Attribute] = &[
    Attribute::scalar("database").force_new(),
    Attribute::scalar("schema").force_new(),
    Attribute::scalar("name").force_new(),
    Attribute::scalar("fully_qualified_name").computed(),
    Attribute::scalar("sql_statement"),
    Attribute::scalar("enabled"),
    Attribute::scalar("warehouse"),
    Attribute::scalar("schedule"),
    Attribute::scalar("config"),
    Attribute::scalar("allow_overlapping_execution"),
    Attribute::scalar("error_integration"),
    Attribute::scalar("comment"),
    Attribute::scalar("when"),
    Attribute::string_set("after"),
    Attribute::scalar("finalize"),
];

pub struct TaskResource<C> {
    client: Arc<C>,
}

impl<C: Client> TaskResource<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

fn parameter_is_set(value: &Value) -> bool {
    !matches!(value, Value::Null) && value.as_str() != Some("")
}

fn description(map: &AttributeMap) -> Result<TaskDescription> {
    let id = SchemaObjectIdentifier::new(
        require_str(map, "database")?,
        require_str(map, "schema")?,
        require_str(map, "name")?,
    );
    let mut desc = TaskDescription::new(id, require_str(map, "sql_statement")?);
    desc.enabled = get_bool(map, "enabled");
    desc.warehouse = parse_opt(map, "warehouse")?;
    desc.schedule = parse_opt(map, "schedule")?;
    desc.config = get_str(map, "config").map(str::to_owned);
    desc.allow_overlapping_execution = get_bool(map, "allow_overlapping_execution");
    desc.error_integration = parse_opt(map, "error_integration")?;
    desc.comment = get_str(map, "comment").map(str::to_owned);
    desc.when = get_str(map, "when").map(str::to_owned);
    desc.after = get_strings(map, "after")
        .iter()
        .map(|a| {
            a.parse::<SchemaObjectIdentifier>()
                .with_context(|| format!("invalid predecessor {a:?}"))
        })
        .collect::<Result<_>>()?;
    desc.finalize = parse_opt(map, "finalize")?;
    for parameter in TASK_PARAMETERS {
        if let Some(value) = map.get(parameter.attribute).filter(|v| parameter_is_set(v)) {
            desc.parameters
                .insert(parameter.sql_name(), parameter.value_from_config(value)?);
        }
    }
    Ok(desc)
}

fn set_opt(d: &mut ResourceData, key: &str, value: Option<String>) -> Result<()> {
    match value {
        Some(value) => d.set(key, value),
        None => {
            d.unset(key);
            Ok(())
        }
    }
}

/// Persist what Snowflake reports, in the config's spelling wherever the two
/// mean the same.
fn write_state(d: &mut ResourceData, observed: &TaskDescription) -> Result<()> {
    let declared = d.state().clone();

    d.set("database", observed.id.database())?;
    d.set("schema", observed.id.schema())?;
    d.set("name", observed.id.name())?;
    d.set("fully_qualified_name", observed.id.fully_qualified_name())?;
    d.set("sql_statement", &observed.sql_statement)?;
    // a child runs whenever its root does, keep what was declared
    if observed.is_root() {
        d.set("enabled", observed.enabled)?;
    }
    set_opt(
        d,
        "warehouse",
        observed.warehouse.as_ref().map(|w| {
            keep_declared(&declared, "warehouse", w).unwrap_or_else(|| w.name().to_owned())
        }),
    )?;
    set_opt(
        d,
        "schedule",
        observed.schedule.as_ref().map(|s| {
            keep_declared::<TaskSchedule>(&declared, "schedule", s).unwrap_or_else(|| s.to_string())
        }),
    )?;
    set_opt(d, "config", observed.config.clone())?;
    d.set("allow_overlapping_execution", observed.allow_overlapping_execution)?;
    set_opt(
        d,
        "error_integration",
        observed.error_integration.as_ref().map(|i| {
            keep_declared(&declared, "error_integration", i).unwrap_or_else(|| i.name().to_owned())
        }),
    )?;
    set_opt(d, "comment", observed.comment.clone())?;
    set_opt(d, "when", observed.when.clone())?;

    let declared_after = get_strings(&declared, "after");
    let same_after = declared_after
        .iter()
        .map(|a| a.parse::<SchemaObjectIdentifier>())
        .collect::<Result<BTreeSet<_>, _>>()
        .map_or(false, |ids| ids == observed.after.iter().cloned().collect::<BTreeSet<_>>());
    if same_after {
        d.set("after", declared_after)?;
    } else if observed.after.is_empty() {
        d.unset("after");
    } else {
        let after: Vec<_> = observed.after.iter().map(|a| a.fully_qualified_name()).collect();
        d.set("after", after)?;
    }
    set_opt(
        d,
        "finalize",
        observed.finalize.as_ref().map(|f| {
            keep_declared(&declared, "finalize", f).unwrap_or_else(|| f.fully_qualified_name())
        }),
    )?;

    for parameter in TASK_PARAMETERS {
        match observed.parameters.get(&parameter.sql_name()) {
            Some(value) => {
                let same = declared
                    .get(parameter.attribute)
                    .filter(|v| parameter_is_set(v))
                    .filter(|v| parameter.value_from_config(v).as_ref() == Ok(value));
                match same {
                    Some(v) => d.set(parameter.attribute, v.clone())?,
                    None => d.set(parameter.attribute, value_to_json(value))?,
                }
            }
            None => d.unset(parameter.attribute),
        }
    }
    Ok(())
}

fn parse_id(d: &ResourceData) -> Result<SchemaObjectIdentifier> {
    d.id()
        .parse::<SchemaObjectIdentifier>()
        .with_context(|| format!("invalid task id {:?}", d.id()))
}

/// v0 ids were `database|schema|name`.
fn upgrade_v0(mut raw: AttributeMap) -> Result<AttributeMap> {
    let upgraded = match raw.get("id").and_then(Value::as_str) {
        Some(id) => match id.split('|').collect::<Vec<_>>()[..] {
            [database, schema, name] => {
                Some(SchemaObjectIdentifier::new(database, schema, name).fully_qualified_name())
            }
            [_] => None,
            _ => bail!("invalid task id {id:?}, expected <database>|<schema>|<name>"),
        },
        None => None,
    };
    if let Some(id) = upgraded {
        raw.insert("id".to_owned(), Value::String(id));
    }
    Ok(raw)
}

#[async_trait]
impl<C: Client + 'static> Resource for TaskResource<C> {
    fn type_name(&self) -> &'static str {
        "snowflake_task"
    }

    fn schema(&self) -> Vec<Attribute> {
        BASE_SCHEMA
            .iter()
            .copied()
            // a parameter set to false differs from its default
            .chain(TASK_PARAMETERS.iter().map(|p| Attribute::scalar(p.attribute).keep_false()))
            .collect()
    }

    fn schema_version(&self) -> u32 {
        1
    }

    fn state_upgraders(&self) -> Vec<StateUpgrader> {
        vec![StateUpgrader {
            version: 0,
            upgrade: upgrade_v0,
        }]
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics> {
        let desc = description(d.config())?;
        tasks::create(self.client.as_ref(), ctx, &desc)
            .await
            .with_context(|| format!("failed to create task {}", desc.id))?;
        d.set_id(desc.id.fully_qualified_name());
        d.commit_config();
        self.read(ctx, d).await
    }

    async fn read(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics> {
        let id = parse_id(d)?;
        let observation = tasks::read(self.client.as_ref(), ctx, &id)
            .await
            .with_context(|| format!("failed to read task {id}"))?;
        match observation {
            TaskObservation::Found(observed) => {
                write_state(d, &observed)?;
                Ok(Diagnostics::new())
            }
            TaskObservation::Missing => {
                warn!("task {id} is gone, removing it from state");
                d.clear_id();
                Ok(Diagnostics::warning(
                    "Task no longer exists, removing it from state",
                    format!("task {id} was not found"),
                ))
            }
        }
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics> {
        let old = description(d.state())?;
        let new = description(d.config())?;
        tasks::update(self.client.as_ref(), ctx, &old, &new)
            .await
            .with_context(|| format!("failed to update task {}", new.id))?;
        d.commit_config();
        self.read(ctx, d).await
    }

    async fn delete(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics> {
        let id = parse_id(d)?;
        tasks::delete(self.client.as_ref(), ctx, &id)
            .await
            .with_context(|| format!("failed to drop task {id}"))?;
        d.clear_id();
        Ok(Diagnostics::new())
    }

    async fn import(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics> {
        let id = parse_id(d)?;
        d.set("database", id.database())?;
        d.set("schema", id.schema())?;
        d.set("name", id.name())?;
        self.read(ctx, d).await
    }
}
