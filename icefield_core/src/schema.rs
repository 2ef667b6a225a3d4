//! Attribute schema and the field diff the host runtime plans with.

use std::collections::BTreeSet;
use std::fmt::Display;

use colored::Colorize;
use serde_json::Value;

use crate::resource::ResourceData;

/// How two values of an attribute are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// A string, number or bool.
    Scalar,
    /// A set of strings, compared case-insensitively and ignoring order.
    StringSet,
    /// An ordered list.
    List,
    /// A nested block.
    Object,
}

/// One row of a resource's attribute schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name.
    pub name: &'static str,
    /// Comparison semantics.
    pub kind: AttributeKind,
    /// A change can't be applied in place; the resource is recreated.
    pub force_new: bool,
    /// Only ever written by the resource; never part of the plan.
    pub computed: bool,
    /// `false` is a value of its own rather than the zero value, e.g. a
    /// session parameter whose default is `true`.
    pub keep_false: bool,
}

impl Attribute {
    const fn new(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            name,
            kind,
            force_new: false,
            computed: false,
            keep_false: false,
        }
    }

    /// A scalar attribute.
    pub const fn scalar(name: &'static str) -> Self {
        Self::new(name, AttributeKind::Scalar)
    }

    /// A string-set attribute.
    pub const fn string_set(name: &'static str) -> Self {
        Self::new(name, AttributeKind::StringSet)
    }

    /// A list attribute.
    pub const fn list(name: &'static str) -> Self {
        Self::new(name, AttributeKind::List)
    }

    /// A nested-block attribute.
    pub const fn object(name: &'static str) -> Self {
        Self::new(name, AttributeKind::Object)
    }

    /// Mark the attribute as forcing recreation.
    pub const fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Mark the attribute as computed.
    pub const fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Compare `false` as set. Only null, `""` and absence stay equal.
    pub const fn keep_false(mut self) -> Self {
        self.keep_false = true;
        self
    }
}

/// What the host runtime would do with a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Persisted state matches the config.
    NoOp,
    /// The resource doesn't exist (anymore) and will be created.
    Create,
    /// The listed attributes change in place.
    Update(Vec<String>),
    /// At least one of the listed attributes forces recreation.
    Replace(Vec<String>),
}

impl Plan {
    /// Whether applying the plan issues no statements.
    pub fn is_empty(&self) -> bool {
        matches!(self, Plan::NoOp)
    }
}

impl Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Plan::NoOp => write!(f, "no changes"),
            Plan::Create => write!(f, "{}", "+ create".green()),
            Plan::Update(attrs) => {
                for attr in attrs {
                    writeln!(f, "{}", format!("  ~ {attr}").yellow())?;
                }
                Ok(())
            }
            Plan::Replace(attrs) => {
                writeln!(f, "{}", "-/+ replace".red())?;
                for attr in attrs {
                    writeln!(f, "{}", format!("  ~ {attr}").yellow())?;
                }
                Ok(())
            }
        }
    }
}

/// Diff `d.config()` against `d.state()` the way the host runtime does.
pub fn plan(schema: &[Attribute], d: &ResourceData) -> Plan {
    if d.is_removed() {
        return Plan::Create;
    }

    let mut changed = vec![];
    let mut replace = false;
    for attr in schema.iter().filter(|a| !a.computed) {
        if !values_equal(attr, d.config().get(attr.name), d.state().get(attr.name)) {
            changed.push(attr.name.to_owned());
            replace |= attr.force_new;
        }
    }

    match (changed.is_empty(), replace) {
        (true, _) => Plan::NoOp,
        (false, true) => Plan::Replace(changed),
        (false, false) => Plan::Update(changed),
    }
}

fn values_equal(attr: &Attribute, desired: Option<&Value>, actual: Option<&Value>) -> bool {
    let zeroed = |v: &Value| match v {
        Value::Bool(false) if attr.keep_false => Some(Value::Bool(false)),
        other => normalize(other),
    };
    let desired = desired.and_then(zeroed);
    let actual = actual.and_then(zeroed);
    match (attr.kind, &desired, &actual) {
        (AttributeKind::StringSet, Some(Value::Array(a)), Some(Value::Array(b))) => {
            string_set(a) == string_set(b)
        }
        _ => desired == actual,
    }
}

fn string_set(values: &[Value]) -> BTreeSet<String> {
    values
        .iter()
        .map(|v| match v {
            Value::String(s) => s.to_uppercase(),
            other => other.to_string(),
        })
        .collect()
}

/// Zero values (null, false, "", [], {}) compare equal to an absent attribute.
fn normalize(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Array(items) => {
            let items: Vec<_> = items.iter().filter_map(normalize).collect();
            (!items.is_empty()).then_some(Value::Array(items))
        }
        Value::Object(fields) => {
            let fields: serde_json::Map<_, _> = fields
                .iter()
                .filter_map(|(k, v)| normalize(v).map(|v| (k.to_owned(), v)))
                .collect();
            (!fields.is_empty()).then_some(Value::Object(fields))
        }
        other => Some(other.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::resource::AttributeMap;

    const SCHEMA: &[Attribute] = &[
        Attribute::scalar("role").force_new(),
        Attribute::string_set("privileges"),
        Attribute::scalar("with_grant_option"),
        Attribute::object("on_schema").force_new(),
        Attribute::scalar("fully_qualified_name").computed(),
        Attribute::scalar("autocommit").keep_false(),
    ];

    fn map(v: Value) -> AttributeMap {
        v.as_object().cloned().unwrap_or_default()
    }

    fn data(config: Value, state: Value) -> ResourceData {
        let mut d = ResourceData::from_state("id", map(state));
        d.set_config(map(config));
        d
    }

    #[test]
    fn privileges_compare_as_case_insensitive_set() {
        let d = data(
            json!({"role": "R", "privileges": ["usage", "MONITOR"]}),
            json!({"role": "R", "privileges": ["MONITOR", "USAGE"]}),
        );
        assert_eq!(plan(SCHEMA, &d), Plan::NoOp);
    }

    #[test]
    fn zero_values_equal_absent_ones() {
        let d = data(
            json!({"role": "R", "with_grant_option": false, "on_schema": {"schema_name": "\"D\".\"S\"", "all_schemas_in_database": null}}),
            json!({"role": "R", "on_schema": {"schema_name": "\"D\".\"S\""}, "fully_qualified_name": "x"}),
        );
        assert_eq!(plan(SCHEMA, &d), Plan::NoOp);
    }

    #[test]
    fn false_is_kept_where_it_differs_from_the_default() {
        let d = data(
            json!({"role": "R"}),
            json!({"role": "R", "autocommit": false}),
        );
        assert_eq!(plan(SCHEMA, &d), Plan::Update(vec!["autocommit".to_owned()]));

        let d = data(
            json!({"role": "R", "autocommit": false}),
            json!({"role": "R", "autocommit": false}),
        );
        assert_eq!(plan(SCHEMA, &d), Plan::NoOp);

        let d = data(
            json!({"role": "R", "autocommit": null}),
            json!({"role": "R"}),
        );
        assert_eq!(plan(SCHEMA, &d), Plan::NoOp);
    }

    #[test]
    fn in_place_changes_update() {
        let d = data(
            json!({"role": "R", "privileges": ["USAGE", "MONITOR"]}),
            json!({"role": "R", "privileges": ["USAGE"]}),
        );
        assert_eq!(plan(SCHEMA, &d), Plan::Update(vec!["privileges".to_owned()]));
    }

    #[test]
    fn force_new_changes_replace() {
        let d = data(
            json!({"role": "R2", "privileges": ["USAGE"]}),
            json!({"role": "R", "privileges": ["USAGE"]}),
        );
        assert_eq!(plan(SCHEMA, &d), Plan::Replace(vec!["role".to_owned()]));
    }

    #[test]
    fn removed_resources_are_created() {
        let mut d = data(json!({"role": "R"}), json!({"role": "R"}));
        d.clear_id();
        assert_eq!(plan(SCHEMA, &d), Plan::Create);
    }
}
