//! The contract between a resource and the declarative host runtime.
//!
//! The host runtime hands configuration over as an untyped attribute map and
//! persists whatever the resource writes back into its state map. Resources
//! narrow the map into typed values once, at the top of each CRUD call.

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::context::Context;
use crate::schema::Attribute;
use crate::upgrade::StateUpgrader;

/// Untyped attribute values, keyed by attribute name.
pub type AttributeMap = serde_json::Map<String, Value>;

/// The desired and persisted attributes of one resource instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    /// Primary key. Empty once the resource was found to be gone.
    id: String,
    /// Desired attributes from the declarative config.
    config: AttributeMap,
    /// Attributes as last persisted / observed.
    state: AttributeMap,
}

impl ResourceData {
    /// Data for a resource about to be created from `config`.
    pub fn new(config: AttributeMap) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Data for a resource that already exists in state.
    pub fn from_state(id: impl Into<String>, state: AttributeMap) -> Self {
        Self {
            id: id.into(),
            config: AttributeMap::new(),
            state,
        }
    }

    /// Data for an import: only the id is known.
    pub fn for_import(id: impl Into<String>) -> Self {
        Self::from_state(id, AttributeMap::new())
    }

    /// The primary key.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Store the primary key.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Mark the resource as gone. The host runtime drops it from state.
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    /// Whether [`ResourceData::clear_id`] was called (or no id was ever set).
    pub fn is_removed(&self) -> bool {
        self.id.is_empty()
    }

    /// The desired attributes.
    pub fn config(&self) -> &AttributeMap {
        &self.config
    }

    /// The persisted attributes.
    pub fn state(&self) -> &AttributeMap {
        &self.state
    }

    /// Replace the desired attributes, e.g. when the user edits the config.
    pub fn set_config(&mut self, config: AttributeMap) {
        self.config = config;
    }

    /// The desired value of `key`, falling back to the persisted one.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.config.get(key).or_else(|| self.state.get(key))
    }

    /// The persisted value of `key`.
    pub fn get_state(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// Persist `value` under `key`.
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value)
            .with_context(|| format!("failed to serialize attribute {key}"))?;
        self.state.insert(key.to_owned(), value);
        Ok(())
    }

    /// Persist every entry of `values`, leaving other attributes alone.
    pub fn set_all(&mut self, values: AttributeMap) {
        self.state.extend(values);
    }

    /// Remove `key` from the persisted attributes.
    pub fn unset(&mut self, key: &str) {
        self.state.remove(key);
    }

    /// Whether the desired value of `key` differs from the persisted one.
    pub fn has_change(&self, key: &str) -> bool {
        self.config.get(key) != self.state.get(key)
    }

    /// The (persisted, desired) pair of `key`.
    pub fn get_change(&self, key: &str) -> (Option<&Value>, Option<&Value>) {
        (self.state.get(key), self.config.get(key))
    }

    /// Adopt the desired attributes as the persisted ones. Called once the
    /// statements converging Snowflake to the config went through.
    pub fn commit_config(&mut self) {
        self.state = self.config.clone();
    }
}

/// A single non-fatal message returned to the host runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// One-line summary.
    pub summary: String,
    /// Longer explanation.
    pub detail: String,
}

/// Warnings collected during one CRUD call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    /// No warnings.
    pub fn new() -> Self {
        Self::default()
    }

    /// A single warning.
    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        let mut diags = Self::new();
        diags.push_warning(summary, detail);
        diags
    }

    /// Add a warning.
    pub fn push_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.warnings.push(Diagnostic {
            summary: summary.into(),
            detail: detail.into(),
        });
    }

    /// Append every warning of `other`.
    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    /// Whether there is nothing to report.
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// The collected warnings.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }
}

/// The quintuple every resource exposes to the host runtime.
///
/// Errors are fatal for the call; anything the user should merely know about
/// travels back in [`Diagnostics`].
#[async_trait]
pub trait Resource: Send + Sync {
    /// Name of the resource type, e.g. `snowflake_task`.
    fn type_name(&self) -> &'static str;

    /// Attribute schema used by the host runtime to plan changes.
    fn schema(&self) -> Vec<Attribute>;

    /// Current version of the persisted state layout.
    fn schema_version(&self) -> u32 {
        0
    }

    /// Upgraders for older state layouts, see [`crate::upgrade_state`].
    fn state_upgraders(&self) -> Vec<StateUpgrader> {
        vec![]
    }

    /// Create the resource from `d.config()` and set its id.
    async fn create(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics>;

    /// Refresh `d.state()` from Snowflake. Clears the id if the resource is gone.
    async fn read(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics>;

    /// Converge the resource from `d.state()` to `d.config()`.
    async fn update(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics>;

    /// Remove the resource.
    async fn delete(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics>;

    /// Rehydrate `d.state()` from nothing but `d.id()`.
    async fn import(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics>;
}
