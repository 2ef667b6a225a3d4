//! Snowflake object types and the identifier shape each one uses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identifier::IdentifierKind;

macro_rules! object_types {
    ($($variant:ident => ($name:literal, $plural:literal, $kind:expr)),+ $(,)?) => {
        /// A Snowflake object type, as spelled in `GRANT ... ON <type>`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ObjectType {
            $(
                #[doc = $name]
                $variant,
            )+
        }

        impl ObjectType {
            /// Every known object type.
            pub const ALL: &'static [ObjectType] = &[$(ObjectType::$variant),+];

            /// The singular SQL spelling, e.g. `MATERIALIZED VIEW`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(ObjectType::$variant => $name,)+
                }
            }

            /// The plural SQL spelling used by bulk grants, e.g. `MATERIALIZED VIEWS`.
            pub fn plural(self) -> &'static str {
                match self {
                    $(ObjectType::$variant => $plural,)+
                }
            }

            fn kind(self) -> Option<IdentifierKind> {
                match self {
                    $(ObjectType::$variant => $kind,)+
                }
            }
        }
    };
}

use IdentifierKind::*;

object_types! {
    Account => ("ACCOUNT", "ACCOUNTS", None),
    User => ("USER", "USERS", Some(AccountObject)),
    Role => ("ROLE", "ROLES", Some(AccountObject)),
    ResourceMonitor => ("RESOURCE MONITOR", "RESOURCE MONITORS", Some(AccountObject)),
    Warehouse => ("WAREHOUSE", "WAREHOUSES", Some(AccountObject)),
    ComputePool => ("COMPUTE POOL", "COMPUTE POOLS", Some(AccountObject)),
    Database => ("DATABASE", "DATABASES", Some(AccountObject)),
    Integration => ("INTEGRATION", "INTEGRATIONS", Some(AccountObject)),
    FailoverGroup => ("FAILOVER GROUP", "FAILOVER GROUPS", Some(AccountObject)),
    ReplicationGroup => ("REPLICATION GROUP", "REPLICATION GROUPS", Some(AccountObject)),
    ExternalVolume => ("EXTERNAL VOLUME", "EXTERNAL VOLUMES", Some(AccountObject)),
    NetworkPolicy => ("NETWORK POLICY", "NETWORK POLICIES", Some(AccountObject)),
    Share => ("SHARE", "SHARES", Some(AccountObject)),
    Application => ("APPLICATION", "APPLICATIONS", Some(AccountObject)),
    Schema => ("SCHEMA", "SCHEMAS", Some(DatabaseObject)),
    DatabaseRole => ("DATABASE ROLE", "DATABASE ROLES", Some(DatabaseObject)),
    Table => ("TABLE", "TABLES", Some(SchemaObject)),
    DynamicTable => ("DYNAMIC TABLE", "DYNAMIC TABLES", Some(SchemaObject)),
    ExternalTable => ("EXTERNAL TABLE", "EXTERNAL TABLES", Some(SchemaObject)),
    EventTable => ("EVENT TABLE", "EVENT TABLES", Some(SchemaObject)),
    HybridTable => ("HYBRID TABLE", "HYBRID TABLES", Some(SchemaObject)),
    IcebergTable => ("ICEBERG TABLE", "ICEBERG TABLES", Some(SchemaObject)),
    View => ("VIEW", "VIEWS", Some(SchemaObject)),
    MaterializedView => ("MATERIALIZED VIEW", "MATERIALIZED VIEWS", Some(SchemaObject)),
    Stage => ("STAGE", "STAGES", Some(SchemaObject)),
    FileFormat => ("FILE FORMAT", "FILE FORMATS", Some(SchemaObject)),
    Sequence => ("SEQUENCE", "SEQUENCES", Some(SchemaObject)),
    Stream => ("STREAM", "STREAMS", Some(SchemaObject)),
    Pipe => ("PIPE", "PIPES", Some(SchemaObject)),
    Task => ("TASK", "TASKS", Some(SchemaObject)),
    Alert => ("ALERT", "ALERTS", Some(SchemaObject)),
    Secret => ("SECRET", "SECRETS", Some(SchemaObject)),
    Tag => ("TAG", "TAGS", Some(SchemaObject)),
    MaskingPolicy => ("MASKING POLICY", "MASKING POLICIES", Some(SchemaObject)),
    RowAccessPolicy => ("ROW ACCESS POLICY", "ROW ACCESS POLICIES", Some(SchemaObject)),
    PasswordPolicy => ("PASSWORD POLICY", "PASSWORD POLICIES", Some(SchemaObject)),
    SessionPolicy => ("SESSION POLICY", "SESSION POLICIES", Some(SchemaObject)),
    NetworkRule => ("NETWORK RULE", "NETWORK RULES", Some(SchemaObject)),
    Streamlit => ("STREAMLIT", "STREAMLITS", Some(SchemaObject)),
    Function => ("FUNCTION", "FUNCTIONS", Some(SchemaObjectWithArguments)),
    ExternalFunction => ("EXTERNAL FUNCTION", "EXTERNAL FUNCTIONS", Some(SchemaObjectWithArguments)),
    Procedure => ("PROCEDURE", "PROCEDURES", Some(SchemaObjectWithArguments)),
    Column => ("COLUMN", "COLUMNS", Some(TableColumn)),
    Model => ("MODEL", "MODELS", Some(SchemaObject)),
}

/// Upper-case and fold `_` to a space so `materialized_view` matches.
fn normalize(s: &str) -> String {
    s.trim().replace('_', " ").to_uppercase()
}

impl ObjectType {
    /// Look up a type by its plural spelling, e.g. `TABLES`.
    pub fn from_plural(s: &str) -> Result<Self> {
        let wanted = normalize(s);
        ObjectType::ALL
            .iter()
            .copied()
            .find(|t| t.plural() == wanted)
            .ok_or_else(|| {
                Error::InvalidGrantId(format!(
                    "invalid object type plural {s:?}, expected one of: {}",
                    ObjectType::ALL
                        .iter()
                        .map(|t| t.plural())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }

    /// The identifier shape a name of this type parses into.
    pub fn identifier_kind(self) -> Result<IdentifierKind> {
        self.kind().ok_or_else(|| {
            Error::UnsupportedScope(format!(
                "object type {self} has no known identifier shape; \
                 please open a feature request to have it supported"
            ))
        })
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = normalize(s);
        ObjectType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| {
                Error::InvalidGrantId(format!(
                    "invalid object type {s:?}, expected one of: {}",
                    ObjectType::ALL
                        .iter()
                        .map(|t| t.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

impl Serialize for ObjectType {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ObjectType {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
