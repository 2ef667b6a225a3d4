//! Rows returned by SHOW commands.
//!
//! Every column arrives as an optional string. Rows are turned into JSON
//! objects (dropping NULL columns) and deserialized with serde.

mod grant;
mod parameter;
mod role;
mod task;

pub use grant::GrantRow;
pub use parameter::ParameterRow;
pub use role::RoleRow;
pub use task::TaskRow;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::sdk::Row;

/// Deserialize one row into `T`.
pub(crate) fn from_row<T: DeserializeOwned>(row: Row) -> Result<T> {
    let object = row
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_lowercase(), Value::String(v))))
        .collect();
    serde_json::from_value(Value::Object(object)).map_err(|e| Error::Other {
        sql_state: String::new(),
        message: format!("unexpected row shape: {e}"),
    })
}

/// Deserialize every row.
pub(crate) fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>> {
    rows.into_iter().map(from_row).collect()
}

/// Snowflake spells booleans in SHOW output as `true` / `false`.
pub(crate) fn is_true(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}
