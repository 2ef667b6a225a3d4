//! The resources exposed to the host runtime.
//!
//! Each adaptor narrows the untyped attribute map into the typed values the
//! controllers work with, exactly once per call, and writes observations back
//! in the spelling the config uses so a converged resource plans no change.

mod grant_ownership;
mod grant_privileges;
mod task;

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use icefield_core::{AttributeMap, Resource};
use serde_json::Value;

use crate::sdk::Client;

pub use grant_ownership::GrantOwnershipResource;
pub use grant_privileges::GrantPrivilegesResource;
pub use task::TaskResource;

/// Every resource, sharing one client.
pub fn all<C: Client + 'static>(client: Arc<C>) -> Vec<Box<dyn Resource>> {
    vec![
        Box::new(GrantPrivilegesResource::to_account_role(client.clone())),
        Box::new(GrantPrivilegesResource::to_database_role(client.clone())),
        Box::new(GrantOwnershipResource::new(client.clone())),
        Box::new(TaskResource::new(client)),
    ]
}

/// A non-empty string attribute.
pub(crate) fn get_str<'a>(map: &'a AttributeMap, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

pub(crate) fn require_str<'a>(map: &'a AttributeMap, key: &str) -> Result<&'a str> {
    get_str(map, key).ok_or_else(|| anyhow!("attribute {key} is required"))
}

pub(crate) fn get_bool(map: &AttributeMap, key: &str) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Every non-empty string of a list or set attribute.
pub(crate) fn get_strings(map: &AttributeMap, key: &str) -> Vec<String> {
    map.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// A nested block with at least one field set.
pub(crate) fn get_block<'a>(map: &'a AttributeMap, key: &str) -> Option<&'a AttributeMap> {
    map.get(key)
        .and_then(Value::as_object)
        .filter(|block| block.values().any(is_set))
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => fields.values().any(is_set),
        _ => true,
    }
}

/// Parse an optional attribute.
pub(crate) fn parse_opt<T>(map: &AttributeMap, key: &str) -> Result<Option<T>>
where
    T: FromStr<Err = crate::Error>,
{
    get_str(map, key)
        .map(|s| s.parse().map_err(|e| anyhow!("attribute {key}: {e}")))
        .transpose()
}

/// Parse a required attribute.
pub(crate) fn parse_required<T>(map: &AttributeMap, key: &str) -> Result<T>
where
    T: FromStr<Err = crate::Error>,
{
    parse_opt(map, key)?.ok_or_else(|| anyhow!("attribute {key} is required"))
}

/// The single entry of `options` that is set. `what` names the group in
/// errors.
pub(crate) fn exactly_one<'a, T>(what: &str, options: Vec<(&'a str, Option<T>)>) -> Result<(&'a str, T)> {
    let names: Vec<_> = options.iter().map(|(name, _)| *name).collect();
    let mut set: Vec<_> = options
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect();
    match set.len() {
        1 => Ok(set.remove(0)),
        0 => bail!("{what}: exactly one of {} must be set", names.join(", ")),
        _ => bail!(
            "{what}: only one of {} may be set, got {}",
            names.join(", "),
            set.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(", ")
        ),
    }
}

/// The declared spelling of `key` if it means the same as `observed`.
///
/// Snowflake reports names quoted and keywords in its own case, while the
/// config may spell them differently.
pub(crate) fn keep_declared<T>(map: &AttributeMap, key: &str, observed: &T) -> Option<String>
where
    T: FromStr + PartialEq,
{
    get_str(map, key)
        .filter(|declared| declared.parse::<T>().map_or(false, |d| &d == observed))
        .map(str::to_owned)
}
