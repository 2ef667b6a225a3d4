//!
//! Icefield Snowflake
//!
//! Grants, ownership and tasks as declarative resources. Requests are typed
//! values rendered to SQL and sent through the Snowflake SQL API; the
//! controllers in [`grants`] and [`tasks`] reconcile observed state against
//! the declared one and [`resources`] adapts them to the host runtime.

mod consts;
pub mod entry_types;
pub mod error;
pub mod grant_id;
pub mod grants;
pub mod identifier;
pub mod object_type;
pub mod resources;
pub mod rest;
pub mod sdk;
pub mod tasks;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use icefield_core::config::ProviderConfig;
use icefield_core::Resource;

pub use error::{Error, Result};
pub use resources::{GrantOwnershipResource, GrantPrivilegesResource, TaskResource};
pub use rest::SnowflakeRestClient;
pub use sdk::SnowflakeClient;

/// Every resource the provider serves, talking to the account `config`
/// points at.
pub fn provider(config: ProviderConfig) -> anyhow::Result<Vec<Box<dyn Resource>>> {
    let client = Arc::new(SnowflakeClient::new(SnowflakeRestClient::new(config)?));
    Ok(resources::all(client))
}
