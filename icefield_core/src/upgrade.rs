//! State upgraders
//!
//! When the persisted layout of a resource changes, the resource bumps its
//! schema version and registers an upgrader from the previous version. The
//! host runtime runs every upgrader between the persisted version and the
//! current one, in order.

use anyhow::{Context, Result};

use crate::resource::AttributeMap;

/// Rewrites a raw state map from one version to the next.
pub type UpgradeFn = fn(AttributeMap) -> Result<AttributeMap>;

/// An upgrader from `version` to `version + 1`.
#[derive(Clone, Copy)]
pub struct StateUpgrader {
    /// The version this upgrader reads.
    pub version: u32,
    /// The rewrite itself.
    pub upgrade: UpgradeFn,
}

impl std::fmt::Debug for StateUpgrader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateUpgrader")
            .field("version", &self.version)
            .finish()
    }
}

/// Run every upgrader whose version is at least `from_version`.
pub fn upgrade_state(
    upgraders: &[StateUpgrader],
    from_version: u32,
    raw: AttributeMap,
) -> Result<AttributeMap> {
    let mut upgraders: Vec<_> = upgraders
        .iter()
        .filter(|u| u.version >= from_version)
        .collect();
    upgraders.sort_by_key(|u| u.version);

    upgraders.into_iter().try_fold(raw, |raw, upgrader| {
        (upgrader.upgrade)(raw)
            .with_context(|| format!("upgrading state from version {}", upgrader.version))
    })
}
