//! Typed GRANT / REVOKE / SHOW GRANTS requests and their SQL rendering.

use std::fmt;

use crate::identifier::{AccountObjectIdentifier, DatabaseObjectIdentifier, ObjectIdentifier};
use crate::object_type::ObjectType;

/// The role a grant goes to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Grantee {
    /// An account-level role.
    AccountRole(AccountObjectIdentifier),
    /// A role scoped to one database.
    DatabaseRole(DatabaseObjectIdentifier),
}

impl Grantee {
    /// The `granted_to` value SHOW GRANTS reports for this kind of role.
    pub fn granted_to(&self) -> &'static str {
        match self {
            Grantee::AccountRole(_) => "ROLE",
            Grantee::DatabaseRole(_) => "DATABASE_ROLE",
        }
    }

    /// The quoted role name.
    pub fn fully_qualified_name(&self) -> String {
        match self {
            Grantee::AccountRole(id) => id.fully_qualified_name(),
            Grantee::DatabaseRole(id) => id.fully_qualified_name(),
        }
    }

    /// Whether a `grantee_name` reported by SHOW GRANTS refers to this role.
    ///
    /// Snowflake reports plain names unquoted, and database roles as
    /// `DB.ROLE`, so both forms are accepted.
    pub fn matches_name(&self, reported: &str) -> bool {
        match self {
            Grantee::AccountRole(id) => {
                reported == id.name()
                    || reported
                        .parse::<AccountObjectIdentifier>()
                        .map_or(false, |r| &r == id)
            }
            Grantee::DatabaseRole(id) => reported
                .parse::<DatabaseObjectIdentifier>()
                .map_or(false, |r| &r == id),
        }
    }
}

impl fmt::Display for Grantee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grantee::AccountRole(id) => write!(f, "ROLE {id}"),
            Grantee::DatabaseRole(id) => write!(f, "DATABASE ROLE {id}"),
        }
    }
}

/// Which privileges a statement carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantPrivileges {
    /// `ALL PRIVILEGES`
    All,
    /// An explicit list, in declared spelling.
    Explicit(Vec<String>),
}

impl fmt::Display for GrantPrivileges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantPrivileges::All => f.write_str("ALL PRIVILEGES"),
            GrantPrivileges::Explicit(privileges) => f.write_str(&privileges.join(", ")),
        }
    }
}

/// The container a bulk (all / future) grant ranges over.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BulkIn {
    /// Every schema of a database.
    Database(AccountObjectIdentifier),
    /// One schema.
    Schema(DatabaseObjectIdentifier),
}

impl fmt::Display for BulkIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BulkIn::Database(id) => write!(f, "IN DATABASE {id}"),
            BulkIn::Schema(id) => write!(f, "IN SCHEMA {id}"),
        }
    }
}

/// Objects of one type inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BulkScope {
    /// Rendered in plural form.
    pub object_type: ObjectType,
    /// Where the objects live.
    pub container: BulkIn,
}

impl fmt::Display for BulkScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.object_type.plural(), self.container)
    }
}

/// Grants on schemas.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaGrantScope {
    /// One schema.
    Schema(DatabaseObjectIdentifier),
    /// Every schema currently in the database.
    AllIn(AccountObjectIdentifier),
    /// Every schema created in the database from now on.
    FutureIn(AccountObjectIdentifier),
}

impl fmt::Display for SchemaGrantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaGrantScope::Schema(id) => write!(f, "SCHEMA {id}"),
            SchemaGrantScope::AllIn(db) => write!(f, "ALL SCHEMAS IN DATABASE {db}"),
            SchemaGrantScope::FutureIn(db) => write!(f, "FUTURE SCHEMAS IN DATABASE {db}"),
        }
    }
}

/// Grants on objects living inside a schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaObjectGrantScope {
    /// One object.
    Object {
        /// The singular type.
        object_type: ObjectType,
        /// The object name, shaped per the type.
        name: ObjectIdentifier,
    },
    /// Every object of a type currently in the container.
    All(BulkScope),
    /// Every object of a type created in the container from now on.
    Future(BulkScope),
}

impl fmt::Display for SchemaObjectGrantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaObjectGrantScope::Object { object_type, name } => {
                write!(f, "{object_type} {name}")
            }
            SchemaObjectGrantScope::All(bulk) => write!(f, "ALL {bulk}"),
            SchemaObjectGrantScope::Future(bulk) => write!(f, "FUTURE {bulk}"),
        }
    }
}

/// What a privilege grant is on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GrantOn {
    /// The account itself.
    Account,
    /// A warehouse, database, integration, ...
    AccountObject {
        /// The singular type.
        object_type: ObjectType,
        /// The object name.
        name: AccountObjectIdentifier,
    },
    /// Schemas.
    Schema(SchemaGrantScope),
    /// Objects inside schemas.
    SchemaObject(SchemaObjectGrantScope),
}

impl GrantOn {
    /// The SHOW GRANTS request observing this scope. `None` for the bulk
    /// "all in" scopes, which Snowflake can't report as one grant.
    pub fn show_request(&self) -> Option<ShowGrantsRequest> {
        match self {
            GrantOn::Account => Some(ShowGrantsRequest::OnAccount),
            GrantOn::AccountObject { object_type, name } => Some(ShowGrantsRequest::On {
                object_type: *object_type,
                name: name.clone().into(),
            }),
            GrantOn::Schema(SchemaGrantScope::Schema(schema)) => Some(ShowGrantsRequest::On {
                object_type: ObjectType::Schema,
                name: schema.clone().into(),
            }),
            GrantOn::Schema(SchemaGrantScope::AllIn(_)) => None,
            GrantOn::Schema(SchemaGrantScope::FutureIn(db)) => {
                Some(ShowGrantsRequest::FutureIn(BulkIn::Database(db.clone())))
            }
            GrantOn::SchemaObject(SchemaObjectGrantScope::Object { object_type, name }) => {
                Some(ShowGrantsRequest::On {
                    object_type: *object_type,
                    name: name.clone(),
                })
            }
            GrantOn::SchemaObject(SchemaObjectGrantScope::All(_)) => None,
            GrantOn::SchemaObject(SchemaObjectGrantScope::Future(bulk)) => {
                Some(ShowGrantsRequest::FutureIn(bulk.container.clone()))
            }
        }
    }

    /// The object type rows for this scope are reported under.
    pub fn expected_object_type(&self) -> ObjectType {
        match self {
            GrantOn::Account => ObjectType::Account,
            GrantOn::AccountObject { object_type, .. } => *object_type,
            GrantOn::Schema(_) => ObjectType::Schema,
            GrantOn::SchemaObject(SchemaObjectGrantScope::Object { object_type, .. }) => {
                *object_type
            }
            GrantOn::SchemaObject(
                SchemaObjectGrantScope::All(bulk) | SchemaObjectGrantScope::Future(bulk),
            ) => bulk.object_type,
        }
    }

    /// Whether this is a future grant.
    pub fn is_future(&self) -> bool {
        matches!(
            self,
            GrantOn::Schema(SchemaGrantScope::FutureIn(_))
                | GrantOn::SchemaObject(SchemaObjectGrantScope::Future(_))
        )
    }

    /// The database the grant targets, if any.
    pub fn database(&self) -> Option<&str> {
        match self {
            GrantOn::Account => None,
            GrantOn::AccountObject { object_type, name } => {
                (*object_type == ObjectType::Database).then(|| name.name())
            }
            GrantOn::Schema(SchemaGrantScope::Schema(id)) => Some(id.database()),
            GrantOn::Schema(SchemaGrantScope::AllIn(db) | SchemaGrantScope::FutureIn(db)) => {
                Some(db.name())
            }
            GrantOn::SchemaObject(SchemaObjectGrantScope::Object { name, .. }) => {
                Some(name.database())
            }
            GrantOn::SchemaObject(
                SchemaObjectGrantScope::All(bulk) | SchemaObjectGrantScope::Future(bulk),
            ) => Some(match &bulk.container {
                BulkIn::Database(db) => db.name(),
                BulkIn::Schema(schema) => schema.database(),
            }),
        }
    }
}

impl fmt::Display for GrantOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantOn::Account => f.write_str("ACCOUNT"),
            GrantOn::AccountObject { object_type, name } => write!(f, "{object_type} {name}"),
            GrantOn::Schema(scope) => write!(f, "{scope}"),
            GrantOn::SchemaObject(scope) => write!(f, "{scope}"),
        }
    }
}

/// What an ownership grant is on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OwnershipGrantOn {
    /// One object of any type.
    Object {
        /// The singular type.
        object_type: ObjectType,
        /// The object name, shaped per the type.
        name: ObjectIdentifier,
    },
    /// Every object of a type currently in the container.
    All(BulkScope),
    /// Every object of a type created in the container from now on.
    Future(BulkScope),
}

impl OwnershipGrantOn {
    /// The SHOW GRANTS request observing this scope. `None` for "all in".
    pub fn show_request(&self) -> Option<ShowGrantsRequest> {
        match self {
            OwnershipGrantOn::Object { object_type, name } => Some(ShowGrantsRequest::On {
                object_type: *object_type,
                name: name.clone(),
            }),
            OwnershipGrantOn::All(_) => None,
            OwnershipGrantOn::Future(bulk) => {
                Some(ShowGrantsRequest::FutureIn(bulk.container.clone()))
            }
        }
    }

    /// The object type rows for this scope are reported under.
    pub fn expected_object_type(&self) -> ObjectType {
        match self {
            OwnershipGrantOn::Object { object_type, .. } => *object_type,
            OwnershipGrantOn::All(bulk) | OwnershipGrantOn::Future(bulk) => bulk.object_type,
        }
    }

    /// Whether this is a future grant.
    pub fn is_future(&self) -> bool {
        matches!(self, OwnershipGrantOn::Future(_))
    }
}

impl fmt::Display for OwnershipGrantOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnershipGrantOn::Object { object_type, name } => write!(f, "{object_type} {name}"),
            OwnershipGrantOn::All(bulk) => write!(f, "ALL {bulk}"),
            OwnershipGrantOn::Future(bulk) => write!(f, "FUTURE {bulk}"),
        }
    }
}

/// What happens to the privileges the previous owner had granted to others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutboundPrivileges {
    /// Keep them.
    Copy,
    /// Drop them.
    Revoke,
}

impl OutboundPrivileges {
    /// `COPY` or `REVOKE`.
    pub fn as_str(self) -> &'static str {
        match self {
            OutboundPrivileges::Copy => "COPY",
            OutboundPrivileges::Revoke => "REVOKE",
        }
    }
}

impl fmt::Display for OutboundPrivileges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `GRANT <privileges> ON <scope> TO <role>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRequest {
    pub privileges: GrantPrivileges,
    pub on: GrantOn,
    pub to: Grantee,
    pub with_grant_option: bool,
}

impl fmt::Display for GrantRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GRANT {} ON {} TO {}", self.privileges, self.on, self.to)?;
        if self.with_grant_option {
            f.write_str(" WITH GRANT OPTION")?;
        }
        Ok(())
    }
}

/// `REVOKE [GRANT OPTION FOR] <privileges> ON <scope> FROM <role>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokeRequest {
    pub privileges: GrantPrivileges,
    pub on: GrantOn,
    pub from: Grantee,
    /// Only take away the right to re-grant, keep the privileges.
    pub grant_option_for: bool,
}

impl fmt::Display for RevokeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("REVOKE ")?;
        if self.grant_option_for {
            f.write_str("GRANT OPTION FOR ")?;
        }
        write!(f, "{} ON {} FROM {}", self.privileges, self.on, self.from)
    }
}

/// `GRANT OWNERSHIP ON <scope> TO <role> [COPY | REVOKE CURRENT GRANTS]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantOwnershipRequest {
    pub on: OwnershipGrantOn,
    pub to: Grantee,
    pub current_grants: Option<OutboundPrivileges>,
}

impl fmt::Display for GrantOwnershipRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GRANT OWNERSHIP ON {} TO {}", self.on, self.to)?;
        if let Some(outbound) = self.current_grants {
            write!(f, " {outbound} CURRENT GRANTS")?;
        }
        Ok(())
    }
}

/// A SHOW GRANTS filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowGrantsRequest {
    /// `SHOW GRANTS ON ACCOUNT`
    OnAccount,
    /// `SHOW GRANTS ON <type> <name>`
    On {
        object_type: ObjectType,
        name: ObjectIdentifier,
    },
    /// `SHOW FUTURE GRANTS IN <container>`
    FutureIn(BulkIn),
}

impl ShowGrantsRequest {
    /// Whether the rows describe future grants.
    pub fn is_future(&self) -> bool {
        matches!(self, ShowGrantsRequest::FutureIn(_))
    }
}

impl fmt::Display for ShowGrantsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShowGrantsRequest::OnAccount => f.write_str("SHOW GRANTS ON ACCOUNT"),
            ShowGrantsRequest::On { object_type, name } => {
                write!(f, "SHOW GRANTS ON {object_type} {name}")
            }
            ShowGrantsRequest::FutureIn(container) => {
                write!(f, "SHOW FUTURE GRANTS {container}")
            }
        }
    }
}

/// `SHOW ROLES LIKE ...` / `SHOW DATABASE ROLES LIKE ... IN DATABASE ...`
pub(crate) fn show_role_sql(role: &Grantee) -> String {
    match role {
        Grantee::AccountRole(id) => format!("SHOW ROLES LIKE {}", super::string_literal(id.name())),
        Grantee::DatabaseRole(id) => format!(
            "SHOW DATABASE ROLES LIKE {} IN DATABASE {}",
            super::string_literal(id.name()),
            id.database_id()
        ),
    }
}
