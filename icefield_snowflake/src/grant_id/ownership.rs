use std::fmt;
use std::str::FromStr;

use super::{expect_parts, invalid, one_of, parse_bulk, parse_object, parse_role, render_bulk, render_role, split_id};
use crate::error::{Error, Result};
use crate::object_type::ObjectType;
use crate::sdk::{Grantee, OutboundPrivileges, OwnershipGrantOn};

/// Identity of an ownership transfer.
///
/// ```text
/// ToAccountRole|"R"|COPY|OnObject|DATABASE|"D"
/// ToDatabaseRole|"D"."DR"||OnFuture|TABLES|InSchema|"D"."S"
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantOwnershipId {
    pub role: Grantee,
    pub outbound_privileges: Option<OutboundPrivileges>,
    pub scope: OwnershipGrantOn,
}

impl GrantOwnershipId {
    /// Same scope and the same kind of role.
    pub fn same_target_kind(&self, other: &GrantOwnershipId) -> bool {
        self.scope == other.scope
            && std::mem::discriminant(&self.role) == std::mem::discriminant(&other.role)
    }
}

impl fmt::Display for GrantOwnershipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outbound = self
            .outbound_privileges
            .map(|o| o.as_str())
            .unwrap_or_default();
        write!(f, "{}|{outbound}|", render_role(&self.role))?;
        match &self.scope {
            OwnershipGrantOn::Object { object_type, name } => {
                write!(f, "OnObject|{object_type}|{name}")
            }
            OwnershipGrantOn::All(bulk) => write!(f, "OnAll|{}", render_bulk(bulk)),
            OwnershipGrantOn::Future(bulk) => write!(f, "OnFuture|{}", render_bulk(bulk)),
        }
    }
}

impl FromStr for GrantOwnershipId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = split_id(s);
        if parts.len() < 4 {
            return Err(invalid(format!(
                "invalid number of parts {} in grant ownership id {s}, expected at least 4 in a form \
                 \"<role_kind>|<role_name>|<outbound_privileges>|<scope_kind>|...\"",
                parts.len()
            )));
        }
        let role = parse_role(parts[0], parts[1])?;
        let outbound_privileges = match one_of("outbound privileges", parts[2], &["", "COPY", "REVOKE"])? {
            "COPY" => Some(OutboundPrivileges::Copy),
            "REVOKE" => Some(OutboundPrivileges::Revoke),
            _ => None,
        };
        let scope = match one_of("scope kind", parts[3], &["OnObject", "OnAll", "OnFuture"])? {
            "OnObject" => {
                expect_parts(&parts, 6, s, "OnObject")?;
                let object_type: ObjectType = parts[4].parse()?;
                OwnershipGrantOn::Object {
                    object_type,
                    name: parse_object(object_type, parts[5])?,
                }
            }
            "OnAll" => {
                expect_parts(&parts, 7, s, "OnAll")?;
                OwnershipGrantOn::All(parse_bulk(&parts[4..])?)
            }
            _ => {
                expect_parts(&parts, 7, s, "OnFuture")?;
                OwnershipGrantOn::Future(parse_bulk(&parts[4..])?)
            }
        };
        Ok(GrantOwnershipId {
            role,
            outbound_privileges,
            scope,
        })
    }
}
