use serde::Deserialize;

/// A row of `SHOW ROLES` / `SHOW DATABASE ROLES`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RoleRow {
    /// The role name, unquoted.
    pub name: String,
    pub owner: String,
    pub comment: Option<String>,
}
