//! Typed Snowflake object identifiers.
//!
//! Parts are stored unquoted. Rendering always double-quotes every part, so
//! the rendered form is the canonical one and round-trips through parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The shape a name of a given object type parses into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    /// `"name"`
    AccountObject,
    /// `"db"."name"`
    DatabaseObject,
    /// `"db"."schema"."name"`
    SchemaObject,
    /// `"db"."schema"."name"(ARG_TYPE, ...)`
    SchemaObjectWithArguments,
    /// `"db"."schema"."table"."column"`
    TableColumn,
}

impl IdentifierKind {
    fn expected_parts(self) -> usize {
        match self {
            IdentifierKind::AccountObject => 1,
            IdentifierKind::DatabaseObject => 2,
            IdentifierKind::SchemaObject | IdentifierKind::SchemaObjectWithArguments => 3,
            IdentifierKind::TableColumn => 4,
        }
    }

    fn form(self) -> &'static str {
        match self {
            IdentifierKind::AccountObject => "<account_object_name>",
            IdentifierKind::DatabaseObject => "<database_name>.<database_object_name>",
            IdentifierKind::SchemaObject => "<database_name>.<schema_name>.<schema_object_name>",
            IdentifierKind::SchemaObjectWithArguments => {
                "<database_name>.<schema_name>.<schema_object_name>(<argument_type>, ...)"
            }
            IdentifierKind::TableColumn => {
                "<database_name>.<schema_name>.<table_name>.<table_column_name>"
            }
        }
    }
}

/// Quote one identifier part, doubling any embedded double quote.
pub(crate) fn quote(part: &str) -> String {
    format!("\"{}\"", part.replace('"', "\"\""))
}

/// Split a dotted identifier into unquoted parts.
///
/// Quoted parts may contain dots and doubled quotes. Unquoted parts are taken
/// verbatim and may not contain quotes.
fn split_parts(input: &str) -> Result<Vec<String>> {
    let invalid = |reason: &str| Error::InvalidIdentifier(format!("{reason} in identifier {input}"));
    let mut parts = Vec::new();
    let mut chars = input.trim().chars().peekable();

    loop {
        let mut part = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        part.push('"');
                    }
                    Some('"') => break,
                    Some(c) => part.push(c),
                    None => return Err(invalid("unterminated quote")),
                }
            }
            match chars.peek() {
                None | Some('.') => (),
                Some(_) => return Err(invalid("unexpected character after closing quote")),
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                if c == '"' {
                    return Err(invalid("unexpected quote"));
                }
                part.push(c);
                chars.next();
            }
        }
        if part.is_empty() {
            return Err(invalid("empty part"));
        }
        parts.push(part);
        // Every part ends at a dot or at the end of input.
        if chars.next().is_none() {
            break;
        }
    }
    Ok(parts)
}

fn parse_parts(input: &str, kind: IdentifierKind) -> Result<Vec<String>> {
    let parts = split_parts(input)?;
    if parts.len() != kind.expected_parts() {
        return Err(Error::InvalidIdentifier(format!(
            "invalid number of parts {} in identifier {}, expected {} in a form \"{}\"",
            parts.len(),
            input,
            kind.expected_parts(),
            kind.form()
        )));
    }
    Ok(parts)
}

/// A warehouse, role, database, integration, user, ...
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountObjectIdentifier {
    name: String,
}

impl AccountObjectIdentifier {
    /// Build from an unquoted name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The unquoted name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `"name"`
    pub fn fully_qualified_name(&self) -> String {
        quote(&self.name)
    }
}

/// A schema or database role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatabaseObjectIdentifier {
    database: String,
    name: String,
}

impl DatabaseObjectIdentifier {
    /// Build from unquoted parts.
    pub fn new(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            name: name.into(),
        }
    }

    /// The containing database.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// The unquoted object name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The containing database as an identifier.
    pub fn database_id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.database)
    }

    /// `"db"."name"`
    pub fn fully_qualified_name(&self) -> String {
        format!("{}.{}", quote(&self.database), quote(&self.name))
    }
}

/// A table, view, stage, task, ...
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaObjectIdentifier {
    database: String,
    schema: String,
    name: String,
}

impl SchemaObjectIdentifier {
    /// Build from unquoted parts.
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// The containing database.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// The containing schema.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// The unquoted object name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The containing schema as an identifier.
    pub fn schema_id(&self) -> DatabaseObjectIdentifier {
        DatabaseObjectIdentifier::new(&self.database, &self.schema)
    }

    /// `"db"."schema"."name"`
    pub fn fully_qualified_name(&self) -> String {
        format!(
            "{}.{}.{}",
            quote(&self.database),
            quote(&self.schema),
            quote(&self.name)
        )
    }
}

/// A function, procedure or external function. Overloads are told apart by
/// their argument types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaObjectIdentifierWithArguments {
    object: SchemaObjectIdentifier,
    arguments: Vec<String>,
}

impl SchemaObjectIdentifierWithArguments {
    /// Build from unquoted parts and argument data types.
    pub fn new(object: SchemaObjectIdentifier, arguments: Vec<String>) -> Self {
        Self { object, arguments }
    }

    /// The identifier without arguments.
    pub fn object(&self) -> &SchemaObjectIdentifier {
        &self.object
    }

    /// Argument data types, in declaration order.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// `"db"."schema"."name"(ARG, ARG)`
    pub fn fully_qualified_name(&self) -> String {
        format!(
            "{}({})",
            self.object.fully_qualified_name(),
            self.arguments.join(", ")
        )
    }
}

/// A single column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableColumnIdentifier {
    table: SchemaObjectIdentifier,
    column: String,
}

impl TableColumnIdentifier {
    /// Build from the table and an unquoted column name.
    pub fn new(table: SchemaObjectIdentifier, column: impl Into<String>) -> Self {
        Self {
            table,
            column: column.into(),
        }
    }

    /// The table the column belongs to.
    pub fn table(&self) -> &SchemaObjectIdentifier {
        &self.table
    }

    /// The unquoted column name.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// `"db"."schema"."table"."column"`
    pub fn fully_qualified_name(&self) -> String {
        format!("{}.{}", self.table.fully_qualified_name(), quote(&self.column))
    }
}

impl FromStr for AccountObjectIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = parse_parts(s, IdentifierKind::AccountObject)?;
        Ok(Self::new(parts.remove(0)))
    }
}

impl FromStr for DatabaseObjectIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = parse_parts(s, IdentifierKind::DatabaseObject)?;
        Ok(Self::new(&parts[0], &parts[1]))
    }
}

impl FromStr for SchemaObjectIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = parse_parts(s, IdentifierKind::SchemaObject)?;
        Ok(Self::new(&parts[0], &parts[1], &parts[2]))
    }
}

impl FromStr for SchemaObjectIdentifierWithArguments {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let kind = IdentifierKind::SchemaObjectWithArguments;
        let s = s.trim();
        let open = open_paren_outside_quotes(s)
            .filter(|_| s.ends_with(')'))
            .ok_or_else(|| {
                Error::InvalidIdentifier(format!(
                    "missing argument list in identifier {s}, expected a form \"{}\"",
                    kind.form()
                ))
            })?;
        let parts = parse_parts(&s[..open], kind)?;
        let arguments = s[open + 1..s.len() - 1]
            .split(',')
            .map(|a| a.trim().to_owned())
            .filter(|a| !a.is_empty())
            .collect();
        Ok(Self::new(
            SchemaObjectIdentifier::new(&parts[0], &parts[1], &parts[2]),
            arguments,
        ))
    }
}

fn open_paren_outside_quotes(s: &str) -> Option<usize> {
    let mut quoted = false;
    for (i, c) in s.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '(' if !quoted => return Some(i),
            _ => (),
        }
    }
    None
}

impl FromStr for TableColumnIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = parse_parts(s, IdentifierKind::TableColumn)?;
        Ok(Self::new(
            SchemaObjectIdentifier::new(&parts[0], &parts[1], &parts[2]),
            &parts[3],
        ))
    }
}

macro_rules! display_and_serde {
    ($($ty:ident),+) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.fully_qualified_name())
                }
            }

            impl Serialize for $ty {
                fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                    serializer.serialize_str(&self.fully_qualified_name())
                }
            }

            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                    let raw = String::deserialize(deserializer)?;
                    raw.parse().map_err(serde::de::Error::custom)
                }
            }
        )+
    };
}

display_and_serde!(
    AccountObjectIdentifier,
    DatabaseObjectIdentifier,
    SchemaObjectIdentifier,
    SchemaObjectIdentifierWithArguments,
    TableColumnIdentifier
);

/// An identifier of any shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectIdentifier {
    /// One part.
    AccountObject(AccountObjectIdentifier),
    /// Two parts.
    DatabaseObject(DatabaseObjectIdentifier),
    /// Three parts.
    SchemaObject(SchemaObjectIdentifier),
    /// Three parts and an argument list.
    SchemaObjectWithArguments(SchemaObjectIdentifierWithArguments),
    /// Four parts.
    TableColumn(TableColumnIdentifier),
}

impl ObjectIdentifier {
    /// Parse `s` into the shape `kind` prescribes.
    pub fn parse(kind: IdentifierKind, s: &str) -> Result<Self> {
        Ok(match kind {
            IdentifierKind::AccountObject => ObjectIdentifier::AccountObject(s.parse()?),
            IdentifierKind::DatabaseObject => ObjectIdentifier::DatabaseObject(s.parse()?),
            IdentifierKind::SchemaObject => ObjectIdentifier::SchemaObject(s.parse()?),
            IdentifierKind::SchemaObjectWithArguments => {
                ObjectIdentifier::SchemaObjectWithArguments(s.parse()?)
            }
            IdentifierKind::TableColumn => ObjectIdentifier::TableColumn(s.parse()?),
        })
    }

    /// The shape of this identifier.
    pub fn kind(&self) -> IdentifierKind {
        match self {
            ObjectIdentifier::AccountObject(_) => IdentifierKind::AccountObject,
            ObjectIdentifier::DatabaseObject(_) => IdentifierKind::DatabaseObject,
            ObjectIdentifier::SchemaObject(_) => IdentifierKind::SchemaObject,
            ObjectIdentifier::SchemaObjectWithArguments(_) => {
                IdentifierKind::SchemaObjectWithArguments
            }
            ObjectIdentifier::TableColumn(_) => IdentifierKind::TableColumn,
        }
    }

    /// The canonical quoted rendering.
    pub fn fully_qualified_name(&self) -> String {
        match self {
            ObjectIdentifier::AccountObject(id) => id.fully_qualified_name(),
            ObjectIdentifier::DatabaseObject(id) => id.fully_qualified_name(),
            ObjectIdentifier::SchemaObject(id) => id.fully_qualified_name(),
            ObjectIdentifier::SchemaObjectWithArguments(id) => id.fully_qualified_name(),
            ObjectIdentifier::TableColumn(id) => id.fully_qualified_name(),
        }
    }

    /// The database the object lives in. Account objects that are databases
    /// return their own name.
    pub fn database(&self) -> &str {
        match self {
            ObjectIdentifier::AccountObject(id) => id.name(),
            ObjectIdentifier::DatabaseObject(id) => id.database(),
            ObjectIdentifier::SchemaObject(id) => id.database(),
            ObjectIdentifier::SchemaObjectWithArguments(id) => id.object().database(),
            ObjectIdentifier::TableColumn(id) => id.table().database(),
        }
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fully_qualified_name())
    }
}

impl From<AccountObjectIdentifier> for ObjectIdentifier {
    fn from(id: AccountObjectIdentifier) -> Self {
        ObjectIdentifier::AccountObject(id)
    }
}

impl From<DatabaseObjectIdentifier> for ObjectIdentifier {
    fn from(id: DatabaseObjectIdentifier) -> Self {
        ObjectIdentifier::DatabaseObject(id)
    }
}

impl From<SchemaObjectIdentifier> for ObjectIdentifier {
    fn from(id: SchemaObjectIdentifier) -> Self {
        ObjectIdentifier::SchemaObject(id)
    }
}
