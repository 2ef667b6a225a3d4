//! The session and task parameters a task may carry.
//!
//! One table drives create, alter and read: each row names the parameter and
//! how its values are typed.

use serde_json::Value;

use crate::entry_types::ParameterRow;
use crate::error::{Error, Result};
use crate::sdk::ParameterValue;

/// How values of a parameter are typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Bool,
    String,
    /// A string limited to the listed spellings.
    Enum(&'static [&'static str]),
}

/// One row of the parameter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskParameter {
    /// The attribute name in resource config, e.g. `user_task_timeout_ms`.
    pub attribute: &'static str,
    pub kind: ParamKind,
}

macro_rules! task_parameters {
    ($($name:ident: $kind:expr),+ $(,)?) => {
        /// Every parameter a task accepts, sorted by attribute name.
        pub const TASK_PARAMETERS: &[TaskParameter] = &[
            $(TaskParameter { attribute: stringify!($name), kind: $kind }),+
        ];
    };
}

const BINARY_FORMATS: &[&str] = &["HEX", "BASE64", "UTF8"];
const GEO_FORMATS: &[&str] = &["GeoJSON", "WKT", "WKB", "EWKT", "EWKB"];
const LOG_LEVELS: &[&str] = &["TRACE", "DEBUG", "INFO", "WARN", "ERROR", "FATAL", "OFF"];
const WAREHOUSE_SIZES: &[&str] = &[
    "XSMALL", "SMALL", "MEDIUM", "LARGE", "XLARGE", "XXLARGE", "XXXLARGE", "X4LARGE", "X5LARGE",
    "X6LARGE",
];

task_parameters! {
    abort_detached_query: ParamKind::Bool,
    autocommit: ParamKind::Bool,
    binary_input_format: ParamKind::Enum(BINARY_FORMATS),
    binary_output_format: ParamKind::Enum(&["HEX", "BASE64"]),
    client_memory_limit: ParamKind::Int,
    client_metadata_request_use_connection_ctx: ParamKind::Bool,
    client_prefetch_threads: ParamKind::Int,
    client_result_chunk_size: ParamKind::Int,
    client_result_column_case_insensitive: ParamKind::Bool,
    client_session_keep_alive: ParamKind::Bool,
    client_session_keep_alive_heartbeat_frequency: ParamKind::Int,
    client_timestamp_type_mapping: ParamKind::Enum(&["TIMESTAMP_LTZ", "TIMESTAMP_NTZ"]),
    date_input_format: ParamKind::String,
    date_output_format: ParamKind::String,
    enable_unload_physical_type_optimization: ParamKind::Bool,
    error_on_nondeterministic_merge: ParamKind::Bool,
    error_on_nondeterministic_update: ParamKind::Bool,
    geography_output_format: ParamKind::Enum(GEO_FORMATS),
    geometry_output_format: ParamKind::Enum(GEO_FORMATS),
    jdbc_treat_timestamp_ntz_as_utc: ParamKind::Bool,
    jdbc_use_session_timezone: ParamKind::Bool,
    json_indent: ParamKind::Int,
    lock_timeout: ParamKind::Int,
    log_level: ParamKind::Enum(LOG_LEVELS),
    multi_statement_count: ParamKind::Int,
    noorder_sequence_as_default: ParamKind::Bool,
    odbc_treat_decimal_as_int: ParamKind::Bool,
    query_tag: ParamKind::String,
    quoted_identifiers_ignore_case: ParamKind::Bool,
    rows_per_resultset: ParamKind::Int,
    s3_stage_vpce_dns_name: ParamKind::String,
    search_path: ParamKind::String,
    statement_queued_timeout_in_seconds: ParamKind::Int,
    statement_timeout_in_seconds: ParamKind::Int,
    strict_json_output: ParamKind::Bool,
    suspend_task_after_num_failures: ParamKind::Int,
    task_auto_retry_attempts: ParamKind::Int,
    time_input_format: ParamKind::String,
    time_output_format: ParamKind::String,
    timestamp_day_is_always_24h: ParamKind::Bool,
    timestamp_input_format: ParamKind::String,
    timestamp_ltz_output_format: ParamKind::String,
    timestamp_ntz_output_format: ParamKind::String,
    timestamp_output_format: ParamKind::String,
    timestamp_type_mapping: ParamKind::Enum(&["TIMESTAMP_LTZ", "TIMESTAMP_NTZ", "TIMESTAMP_TZ"]),
    timestamp_tz_output_format: ParamKind::String,
    timezone: ParamKind::String,
    trace_level: ParamKind::Enum(&["ALWAYS", "ON_EVENT", "OFF"]),
    transaction_abort_on_error: ParamKind::Bool,
    transaction_default_isolation_level: ParamKind::Enum(&["READ COMMITTED"]),
    two_digit_century_start: ParamKind::Int,
    unsupported_ddl_action: ParamKind::Enum(&["IGNORE", "FAIL"]),
    use_cached_result: ParamKind::Bool,
    user_task_managed_initial_warehouse_size: ParamKind::Enum(WAREHOUSE_SIZES),
    user_task_minimum_trigger_interval_in_seconds: ParamKind::Int,
    user_task_timeout_ms: ParamKind::Int,
    week_of_year_policy: ParamKind::Int,
    week_start: ParamKind::Int,
}

/// Look a parameter up by SQL or attribute name.
pub fn lookup(name: &str) -> Option<&'static TaskParameter> {
    TASK_PARAMETERS
        .iter()
        .find(|p| p.attribute.eq_ignore_ascii_case(name))
}

fn enum_key(value: &str) -> String {
    value.to_uppercase().replace('-', "")
}

impl TaskParameter {
    /// The name statements use, e.g. `USER_TASK_TIMEOUT_MS`.
    pub fn sql_name(&self) -> String {
        self.attribute.to_uppercase()
    }

    fn invalid(&self, value: impl std::fmt::Display) -> Error {
        let expected = match self.kind {
            ParamKind::Int => "an integer".to_owned(),
            ParamKind::Bool => "a boolean".to_owned(),
            ParamKind::String => "a string".to_owned(),
            ParamKind::Enum(options) => format!("one of: {}", options.join(", ")),
        };
        Error::Invalid(format!(
            "invalid value {value} for parameter {}, expected {expected}",
            self.attribute
        ))
    }

    fn from_text(&self, text: &str) -> Option<ParameterValue> {
        match self.kind {
            ParamKind::Int => text.trim().parse().ok().map(ParameterValue::Int),
            ParamKind::Bool => match text.trim().to_lowercase().as_str() {
                "true" => Some(ParameterValue::Bool(true)),
                "false" => Some(ParameterValue::Bool(false)),
                _ => None,
            },
            ParamKind::String => Some(ParameterValue::String(text.to_owned())),
            ParamKind::Enum(options) => {
                let key = enum_key(text);
                options
                    .iter()
                    .find(|o| enum_key(o) == key)
                    .map(|o| ParameterValue::String((*o).to_owned()))
            }
        }
    }

    /// Narrow a config value. Enum values come back in canonical spelling.
    pub fn value_from_config(&self, value: &Value) -> Result<ParameterValue> {
        let parsed = match (self.kind, value) {
            (ParamKind::Int, Value::Number(n)) => n.as_i64().map(ParameterValue::Int),
            (ParamKind::Bool, Value::Bool(b)) => Some(ParameterValue::Bool(*b)),
            (_, Value::String(s)) => self.from_text(s),
            _ => None,
        };
        parsed.ok_or_else(|| self.invalid(value))
    }

    /// The value a `SHOW PARAMETERS` row reports, if it fits the type.
    pub fn value_from_row(&self, row: &ParameterRow) -> Option<ParameterValue> {
        self.from_text(&row.value)
    }
}

/// The config / state representation of a value.
pub fn value_to_json(value: &ParameterValue) -> Value {
    match value {
        ParameterValue::Int(n) => Value::from(*n),
        ParameterValue::Bool(b) => Value::Bool(*b),
        ParameterValue::String(s) => Value::String(s.clone()),
    }
}
