//! Grant identifiers and their pipe-delimited string encoding.
//!
//! The encoded form is the primary key of every grant resource in persisted
//! state, so it is a compatibility contract: ids written by an older release
//! must keep parsing.
//!
//! ```text
//! ToAccountRole|"R"|true|false|CREATE DATABASE,CREATE ROLE|OnAccount
//! ToDatabaseRole|"D"."R"|false|false|ALL|OnSchemaObject|OnFuture|TABLES|InSchema|"D"."S"
//! ```

mod ownership;

use std::fmt;
use std::str::FromStr;

pub use ownership::GrantOwnershipId;

use crate::error::{Error, Result};
use crate::identifier::ObjectIdentifier;
use crate::object_type::ObjectType;
use crate::sdk::{
    BulkIn, BulkScope, GrantOn, GrantPrivileges, Grantee, SchemaGrantScope, SchemaObjectGrantScope,
};

pub(crate) const DELIMITER: char = '|';

const TO_ACCOUNT_ROLE: &str = "ToAccountRole";
const TO_DATABASE_ROLE: &str = "ToDatabaseRole";

/// The reserved spelling of "every privilege".
pub const ALL_PRIVILEGES: &str = "ALL";

/// Object types an account-object grant may target.
pub const ACCOUNT_OBJECT_GRANT_TYPES: &[ObjectType] = &[
    ObjectType::User,
    ObjectType::ResourceMonitor,
    ObjectType::Warehouse,
    ObjectType::ComputePool,
    ObjectType::Database,
    ObjectType::Integration,
    ObjectType::FailoverGroup,
    ObjectType::ReplicationGroup,
    ObjectType::ExternalVolume,
];

/// Split on the delimiter, ignoring delimiters inside double-quoted parts.
pub(crate) fn split_id(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '"' => quoted = !quoted,
            DELIMITER if !quoted => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => (),
        }
    }
    parts.push(&s[start..]);
    parts
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidGrantId(msg.into())
}

fn expect_parts(parts: &[&str], expected: usize, id: &str, scope_kind: &str) -> Result<()> {
    if parts.len() != expected {
        return Err(invalid(format!(
            "invalid number of parts {} in grant id {id}, expected {expected} for {scope_kind}",
            parts.len()
        )));
    }
    Ok(())
}

fn one_of<'a>(what: &str, value: &str, accepted: &[&'a str]) -> Result<&'a str> {
    accepted
        .iter()
        .copied()
        .find(|a| *a == value)
        .ok_or_else(|| {
            invalid(format!(
                "invalid {what} {value:?}, expected one of: {}",
                accepted.join(", ")
            ))
        })
}

fn parse_bool(what: &str, value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid(format!(
            "invalid {what} {value:?}, expected one of: true, false"
        ))),
    }
}

pub(crate) fn render_role(role: &Grantee) -> String {
    match role {
        Grantee::AccountRole(id) => format!("{TO_ACCOUNT_ROLE}{DELIMITER}{id}"),
        Grantee::DatabaseRole(id) => format!("{TO_DATABASE_ROLE}{DELIMITER}{id}"),
    }
}

pub(crate) fn parse_role(kind: &str, name: &str) -> Result<Grantee> {
    match one_of("role kind", kind, &[TO_ACCOUNT_ROLE, TO_DATABASE_ROLE])? {
        TO_ACCOUNT_ROLE => Ok(Grantee::AccountRole(name.parse()?)),
        _ => Ok(Grantee::DatabaseRole(name.parse()?)),
    }
}

pub(crate) fn render_bulk(bulk: &BulkScope) -> String {
    match &bulk.container {
        BulkIn::Database(db) => format!("{}|InDatabase|{db}", bulk.object_type.plural()),
        BulkIn::Schema(schema) => format!("{}|InSchema|{schema}", bulk.object_type.plural()),
    }
}

/// Parse `<plural>|<InDatabase|InSchema>|<fqn>`.
pub(crate) fn parse_bulk(parts: &[&str]) -> Result<BulkScope> {
    let object_type = ObjectType::from_plural(parts[0])?;
    let container = match one_of("bulk container", parts[1], &["InDatabase", "InSchema"])? {
        "InDatabase" => BulkIn::Database(parts[2].parse()?),
        _ => BulkIn::Schema(parts[2].parse()?),
    };
    Ok(BulkScope {
        object_type,
        container,
    })
}

/// Parse a single object name into the shape its type prescribes.
pub(crate) fn parse_object(object_type: ObjectType, name: &str) -> Result<ObjectIdentifier> {
    ObjectIdentifier::parse(object_type.identifier_kind()?, name)
}

/// Identity of a privilege grant to a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantId {
    pub role: Grantee,
    pub with_grant_option: bool,
    /// Re-issue the grant on every apply.
    pub always_apply: bool,
    pub privileges: GrantPrivileges,
    pub scope: GrantOn,
}

impl GrantId {
    /// Semantic checks the encoding alone can't express.
    pub fn validate(&self) -> Result<()> {
        if let GrantPrivileges::Explicit(privileges) = &self.privileges {
            if privileges.is_empty() {
                return Err(Error::Invalid(
                    "at least one privilege is required unless all privileges are granted"
                        .to_owned(),
                ));
            }
            for privilege in privileges {
                let upper = privilege.to_uppercase();
                if upper == "OWNERSHIP" {
                    return Err(Error::Invalid(
                        "OWNERSHIP can't be granted with other privileges, \
                         use the ownership grant instead"
                            .to_owned(),
                    ));
                }
                if upper == ALL_PRIVILEGES || upper == "ALL PRIVILEGES" {
                    return Err(Error::Invalid(format!(
                        "{privilege} is not a privilege, use all privileges instead"
                    )));
                }
            }
        }

        if let GrantOn::AccountObject { object_type, .. } = &self.scope {
            if !ACCOUNT_OBJECT_GRANT_TYPES.contains(object_type) {
                return Err(Error::Invalid(format!(
                    "privileges can't be granted on account object type {object_type}, expected one of: {}",
                    ACCOUNT_OBJECT_GRANT_TYPES
                        .iter()
                        .map(|t| t.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }
        }

        if let Grantee::DatabaseRole(role) = &self.role {
            match &self.scope {
                GrantOn::Account => {
                    return Err(Error::Invalid(
                        "a database role can't be granted privileges on the account".to_owned(),
                    ))
                }
                GrantOn::AccountObject { object_type, .. } if *object_type != ObjectType::Database => {
                    return Err(Error::Invalid(format!(
                        "a database role can only be granted privileges on its database, not on a {object_type}"
                    )))
                }
                _ => (),
            }
            if let Some(database) = self.scope.database() {
                if database != role.database() {
                    return Err(Error::Invalid(format!(
                        "database role {role} can only be granted privileges inside database {}",
                        role.database_id()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Same role and scope, so the two ids may be reconciled in place.
    pub fn same_target(&self, other: &GrantId) -> bool {
        self.role == other.role && self.scope == other.scope
    }
}

impl fmt::Display for GrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let privileges = match &self.privileges {
            GrantPrivileges::All => ALL_PRIVILEGES.to_owned(),
            GrantPrivileges::Explicit(privileges) => privileges.join(","),
        };
        write!(
            f,
            "{}|{}|{}|{privileges}|",
            render_role(&self.role),
            self.with_grant_option,
            self.always_apply
        )?;
        match &self.scope {
            GrantOn::Account => f.write_str("OnAccount"),
            GrantOn::AccountObject { object_type, name } => {
                write!(f, "OnAccountObject|{object_type}|{name}")
            }
            GrantOn::Schema(SchemaGrantScope::Schema(schema)) => {
                write!(f, "OnSchema|OnSchema|{schema}")
            }
            GrantOn::Schema(SchemaGrantScope::AllIn(db)) => {
                write!(f, "OnSchema|OnAllSchemasInDatabase|{db}")
            }
            GrantOn::Schema(SchemaGrantScope::FutureIn(db)) => {
                write!(f, "OnSchema|OnFutureSchemasInDatabase|{db}")
            }
            GrantOn::SchemaObject(SchemaObjectGrantScope::Object { object_type, name }) => {
                write!(f, "OnSchemaObject|OnObject|{object_type}|{name}")
            }
            GrantOn::SchemaObject(SchemaObjectGrantScope::All(bulk)) => {
                write!(f, "OnSchemaObject|OnAll|{}", render_bulk(bulk))
            }
            GrantOn::SchemaObject(SchemaObjectGrantScope::Future(bulk)) => {
                write!(f, "OnSchemaObject|OnFuture|{}", render_bulk(bulk))
            }
        }
    }
}

impl FromStr for GrantId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = split_id(s);
        if parts.len() < 6 {
            return Err(invalid(format!(
                "invalid number of parts {} in grant id {s}, expected at least 6 in a form \
                 \"<role_kind>|<role_name>|<with_grant_option>|<always_apply>|<privileges>|<scope_kind>|...\"",
                parts.len()
            )));
        }
        let role = parse_role(parts[0], parts[1])?;
        let with_grant_option = parse_bool("with grant option", parts[2])?;
        let always_apply = parse_bool("always apply", parts[3])?;
        // `ALL PRIVILEGES` and blanks after commas are read, but render as
        // `ALL` and `A,B`
        let privileges = match parts[4] {
            "ALL" | "ALL PRIVILEGES" => GrantPrivileges::All,
            list => GrantPrivileges::Explicit(
                list.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_owned)
                    .collect(),
            ),
        };

        let scope_kind = one_of(
            "scope kind",
            parts[5],
            &["OnAccount", "OnAccountObject", "OnSchema", "OnSchemaObject"],
        )?;
        let scope = match scope_kind {
            "OnAccount" => {
                expect_parts(&parts, 6, s, scope_kind)?;
                GrantOn::Account
            }
            "OnAccountObject" => {
                expect_parts(&parts, 8, s, scope_kind)?;
                GrantOn::AccountObject {
                    object_type: parts[6].parse()?,
                    name: parts[7].parse()?,
                }
            }
            "OnSchema" => {
                expect_parts(&parts, 8, s, scope_kind)?;
                let kind = one_of(
                    "schema grant kind",
                    parts[6],
                    &["OnSchema", "OnAllSchemasInDatabase", "OnFutureSchemasInDatabase"],
                )?;
                GrantOn::Schema(match kind {
                    "OnSchema" => SchemaGrantScope::Schema(parts[7].parse()?),
                    "OnAllSchemasInDatabase" => SchemaGrantScope::AllIn(parts[7].parse()?),
                    _ => SchemaGrantScope::FutureIn(parts[7].parse()?),
                })
            }
            _ => {
                if parts.len() < 7 {
                    return Err(invalid(format!("missing schema object grant kind in grant id {s}")));
                }
                let kind = one_of(
                    "schema object grant kind",
                    parts[6],
                    &["OnObject", "OnAll", "OnFuture"],
                )?;
                GrantOn::SchemaObject(match kind {
                    "OnObject" => {
                        expect_parts(&parts, 9, s, "OnSchemaObject|OnObject")?;
                        let object_type: ObjectType = parts[7].parse()?;
                        SchemaObjectGrantScope::Object {
                            object_type,
                            name: parse_object(object_type, parts[8])?,
                        }
                    }
                    "OnAll" => {
                        expect_parts(&parts, 10, s, "OnSchemaObject|OnAll")?;
                        SchemaObjectGrantScope::All(parse_bulk(&parts[7..])?)
                    }
                    _ => {
                        expect_parts(&parts, 10, s, "OnSchemaObject|OnFuture")?;
                        SchemaObjectGrantScope::Future(parse_bulk(&parts[7..])?)
                    }
                })
            }
        };

        Ok(GrantId {
            role,
            with_grant_option,
            always_apply,
            privileges,
            scope,
        })
    }
}

/// Rewrite a pre-role-kind id into the current encoding.
///
/// The oldest ids carried no role kind (every grant went to an account role)
/// and stored names unquoted.
pub fn upgrade_legacy_id(raw: &str) -> Result<String> {
    let parts = split_id(raw);
    let current = match parts.first().copied() {
        Some(TO_ACCOUNT_ROLE | TO_DATABASE_ROLE) => raw.to_owned(),
        _ => format!("{TO_ACCOUNT_ROLE}{DELIMITER}{raw}"),
    };
    Ok(current.parse::<GrantId>()?.to_string())
}
