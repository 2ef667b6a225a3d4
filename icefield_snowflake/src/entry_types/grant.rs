use serde::Deserialize;

use super::is_true;

/// A row of `SHOW GRANTS ON ...` or `SHOW FUTURE GRANTS IN ...`.
///
/// Future grant rows name the object type `grant_on` (not `granted_on`),
/// the grantee kind `grant_to` and carry no grantor.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct GrantRow {
    pub privilege: String,
    pub granted_on: Option<String>,
    pub grant_on: Option<String>,
    /// The object name, as Snowflake prints it.
    pub name: String,
    #[serde(alias = "grant_to")]
    pub granted_to: String,
    pub grantee_name: String,
    pub grant_option: String,
    pub granted_by: Option<String>,
}

impl GrantRow {
    /// Whether the grantee may re-grant the privilege.
    pub fn with_grant_option(&self) -> bool {
        is_true(&self.grant_option)
    }

    /// The object type the row is about, reading the column that matches
    /// the kind of listing.
    pub fn object_type(&self, future: bool) -> &str {
        let column = if future { &self.grant_on } else { &self.granted_on };
        column.as_deref().unwrap_or_default()
    }

    /// Whether a grantor is recorded.
    pub fn has_grantor(&self) -> bool {
        self.granted_by.as_deref().map_or(false, |g| !g.is_empty())
    }
}
