use serde::Deserialize;

/// A row of `SHOW PARAMETERS IN TASK`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ParameterRow {
    pub key: String,
    pub value: String,
    pub default: String,
    /// Where the effective value comes from: `TASK`, `ACCOUNT`, `SESSION`
    /// or empty for the built-in default.
    pub level: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ParameterRow {
    /// Whether the value was set on the task itself.
    pub fn is_set_on_task(&self) -> bool {
        self.level.eq_ignore_ascii_case("TASK")
    }
}
