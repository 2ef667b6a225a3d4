//! Privilege grants to account roles and database roles.
//!
//! Both resources share one implementation; they differ in the role
//! attribute and in the scopes a role of that kind may be granted on.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use icefield_core::logging::warn;
use icefield_core::{
    AttributeMap, Attribute, Context, Diagnostics, Resource, ResourceData, StateUpgrader,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{exactly_one, get_block, get_bool, get_str, get_strings, parse_opt, parse_required, require_str};
use crate::grant_id::{upgrade_legacy_id, GrantId};
use crate::grants::{self, GrantObservation};
use crate::identifier::{AccountObjectIdentifier, DatabaseObjectIdentifier, ObjectIdentifier};
use crate::object_type::ObjectType;
use crate::sdk::{
    BulkIn, BulkScope, Client, GrantOn, GrantPrivileges, Grantee, SchemaGrantScope,
    SchemaObjectGrantScope,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoleKind {
    Account,
    Database,
}

impl RoleKind {
    fn attribute(self) -> &'static str {
        match self {
            RoleKind::Account => "account_role_name",
            RoleKind::Database => "database_role_name",
        }
    }
}

/// The scope block a config declares.
enum DeclaredScope<'a> {
    Account,
    AccountObject(&'a AttributeMap),
    Database(&'a str),
    Schema(&'a AttributeMap),
    SchemaObject(&'a AttributeMap),
}

/// The objects an `on_schema_object` (or ownership `on`) block names.
pub(super) enum DeclaredObjects<'a> {
    Named(&'a str),
    All(&'a AttributeMap),
    Future(&'a AttributeMap),
}

/// `snowflake_grant_privileges_to_account_role` and
/// `snowflake_grant_privileges_to_database_role`.
pub struct GrantPrivilegesResource<C> {
    client: Arc<C>,
    kind: RoleKind,
}

impl<C: Client> GrantPrivilegesResource<C> {
    pub fn to_account_role(client: Arc<C>) -> Self {
        Self {
            client,
            kind: RoleKind::Account,
        }
    }

    pub fn to_database_role(client: Arc<C>) -> Self {
        Self {
            client,
            kind: RoleKind::Database,
        }
    }

    /// Narrow a config (or persisted state) into a grant id. Does not
    /// validate, persisted state may legitimately hold an empty list.
    fn grant_id(&self, map: &AttributeMap) -> Result<GrantId> {
        let role = match self.kind {
            RoleKind::Account => Grantee::AccountRole(parse_required(map, self.kind.attribute())?),
            RoleKind::Database => Grantee::DatabaseRole(parse_required(map, self.kind.attribute())?),
        };
        let privileges = if get_bool(map, "all_privileges") {
            GrantPrivileges::All
        } else {
            GrantPrivileges::Explicit(get_strings(map, "privileges"))
        };
        Ok(GrantId {
            role,
            with_grant_option: get_bool(map, "with_grant_option"),
            always_apply: get_bool(map, "always_apply"),
            privileges,
            scope: self.scope(map)?,
        })
    }

    fn scope(&self, map: &AttributeMap) -> Result<GrantOn> {
        let mut options = vec![];
        match self.kind {
            RoleKind::Account => {
                options.push((
                    "on_account",
                    get_bool(map, "on_account").then_some(DeclaredScope::Account),
                ));
                options.push((
                    "on_account_object",
                    get_block(map, "on_account_object").map(DeclaredScope::AccountObject),
                ));
            }
            RoleKind::Database => options.push((
                "on_database",
                get_str(map, "on_database").map(DeclaredScope::Database),
            )),
        }
        options.push(("on_schema", get_block(map, "on_schema").map(DeclaredScope::Schema)));
        options.push((
            "on_schema_object",
            get_block(map, "on_schema_object").map(DeclaredScope::SchemaObject),
        ));

        Ok(match exactly_one("grant scope", options)?.1 {
            DeclaredScope::Account => GrantOn::Account,
            DeclaredScope::AccountObject(block) => GrantOn::AccountObject {
                object_type: parse_required(block, "object_type")?,
                name: parse_required(block, "object_name")?,
            },
            DeclaredScope::Database(name) => GrantOn::AccountObject {
                object_type: ObjectType::Database,
                name: name
                    .parse::<AccountObjectIdentifier>()
                    .with_context(|| format!("invalid on_database {name:?}"))?,
            },
            DeclaredScope::Schema(block) => GrantOn::Schema(schema_scope(block)?),
            DeclaredScope::SchemaObject(block) => GrantOn::SchemaObject(schema_object_scope(block)?),
        })
    }

    /// The declarative fields an id stands for. Used on import.
    fn project(&self, id: &GrantId) -> AttributeMap {
        let mut m = AttributeMap::new();
        m.insert(
            self.kind.attribute().to_owned(),
            json!(id.role.fully_qualified_name()),
        );
        match &id.privileges {
            GrantPrivileges::All => m.insert("all_privileges".to_owned(), json!(true)),
            GrantPrivileges::Explicit(privileges) => m.insert("privileges".to_owned(), json!(privileges)),
        };
        m.insert("with_grant_option".to_owned(), json!(id.with_grant_option));
        m.insert("always_apply".to_owned(), json!(id.always_apply));

        let (key, value) = match &id.scope {
            GrantOn::Account => ("on_account", json!(true)),
            GrantOn::AccountObject { name, .. } if self.kind == RoleKind::Database => {
                ("on_database", json!(name.fully_qualified_name()))
            }
            GrantOn::AccountObject { object_type, name } => (
                "on_account_object",
                json!({
                    "object_type": object_type.as_str(),
                    "object_name": name.fully_qualified_name(),
                }),
            ),
            GrantOn::Schema(scope) => (
                "on_schema",
                match scope {
                    SchemaGrantScope::Schema(s) => json!({ "schema_name": s.fully_qualified_name() }),
                    SchemaGrantScope::AllIn(db) => {
                        json!({ "all_schemas_in_database": db.fully_qualified_name() })
                    }
                    SchemaGrantScope::FutureIn(db) => {
                        json!({ "future_schemas_in_database": db.fully_qualified_name() })
                    }
                },
            ),
            GrantOn::SchemaObject(scope) => (
                "on_schema_object",
                match scope {
                    SchemaObjectGrantScope::Object { object_type, name } => json!({
                        "object_type": object_type.as_str(),
                        "object_name": name.fully_qualified_name(),
                    }),
                    SchemaObjectGrantScope::All(bulk) => json!({ "all": project_bulk(bulk) }),
                    SchemaObjectGrantScope::Future(bulk) => json!({ "future": project_bulk(bulk) }),
                },
            ),
        };
        m.insert(key.to_owned(), value);
        m
    }

    fn parse_id(d: &ResourceData) -> Result<GrantId> {
        d.id()
            .parse::<GrantId>()
            .with_context(|| format!("invalid grant id {:?}", d.id()))
    }
}

fn schema_scope(block: &AttributeMap) -> Result<SchemaGrantScope> {
    let (kind, name) = exactly_one(
        "on_schema",
        vec![
            ("schema_name", get_str(block, "schema_name")),
            ("all_schemas_in_database", get_str(block, "all_schemas_in_database")),
            ("future_schemas_in_database", get_str(block, "future_schemas_in_database")),
        ],
    )?;
    let invalid = || format!("invalid {kind} {name:?}");
    Ok(match kind {
        "schema_name" => {
            SchemaGrantScope::Schema(name.parse::<DatabaseObjectIdentifier>().with_context(invalid)?)
        }
        "all_schemas_in_database" => {
            SchemaGrantScope::AllIn(name.parse::<AccountObjectIdentifier>().with_context(invalid)?)
        }
        _ => SchemaGrantScope::FutureIn(name.parse::<AccountObjectIdentifier>().with_context(invalid)?),
    })
}

pub(super) fn declared_objects<'a>(what: &str, block: &'a AttributeMap) -> Result<DeclaredObjects<'a>> {
    Ok(exactly_one(
        what,
        vec![
            ("object_name", get_str(block, "object_name").map(DeclaredObjects::Named)),
            ("all", get_block(block, "all").map(DeclaredObjects::All)),
            ("future", get_block(block, "future").map(DeclaredObjects::Future)),
        ],
    )?
    .1)
}

/// The object named by a block carrying `object_type` and `object_name`.
pub(super) fn named_object(block: &AttributeMap, name: &str) -> Result<(ObjectType, ObjectIdentifier)> {
    let object_type: ObjectType = parse_required(block, "object_type")?;
    let name = ObjectIdentifier::parse(object_type.identifier_kind()?, name)
        .with_context(|| format!("invalid {object_type} name {name:?}"))?;
    Ok((object_type, name))
}

fn schema_object_scope(block: &AttributeMap) -> Result<SchemaObjectGrantScope> {
    Ok(match declared_objects("on_schema_object", block)? {
        DeclaredObjects::Named(name) => {
            let (object_type, name) = named_object(block, name)?;
            SchemaObjectGrantScope::Object { object_type, name }
        }
        DeclaredObjects::All(bulk) => SchemaObjectGrantScope::All(bulk_scope(bulk)?),
        DeclaredObjects::Future(bulk) => SchemaObjectGrantScope::Future(bulk_scope(bulk)?),
    })
}

pub(super) fn bulk_scope(block: &AttributeMap) -> Result<BulkScope> {
    let object_type = ObjectType::from_plural(require_str(block, "object_type_plural")?)?;
    let container = exactly_one(
        "bulk grant",
        vec![
            ("in_database", parse_opt(block, "in_database")?.map(BulkIn::Database)),
            ("in_schema", parse_opt(block, "in_schema")?.map(BulkIn::Schema)),
        ],
    )?
    .1;
    Ok(BulkScope {
        object_type,
        container,
    })
}

pub(super) fn project_bulk(bulk: &BulkScope) -> Value {
    match &bulk.container {
        BulkIn::Database(db) => json!({
            "object_type_plural": bulk.object_type.plural(),
            "in_database": db.fully_qualified_name(),
        }),
        BulkIn::Schema(schema) => json!({
            "object_type_plural": bulk.object_type.plural(),
            "in_schema": schema.fully_qualified_name(),
        }),
    }
}

fn upgrade_v0(mut raw: AttributeMap) -> Result<AttributeMap> {
    if let Some(id) = raw.get("id").and_then(Value::as_str) {
        let upgraded = upgrade_legacy_id(id)?;
        raw.insert("id".to_owned(), Value::String(upgraded));
    }
    Ok(raw)
}

#[async_trait]
impl<C: Client + 'static> Resource for GrantPrivilegesResource<C> {
    fn type_name(&self) -> &'static str {
        match self.kind {
            RoleKind::Account => "snowflake_grant_privileges_to_account_role",
            RoleKind::Database => "snowflake_grant_privileges_to_database_role",
        }
    }

    fn schema(&self) -> Vec<Attribute> {
        let mut schema = vec![
            Attribute::scalar(self.kind.attribute()).force_new(),
            Attribute::string_set("privileges"),
            Attribute::scalar("all_privileges"),
            Attribute::scalar("with_grant_option"),
            Attribute::scalar("always_apply"),
            // never declared, so a persisted token always shows up as a change
            Attribute::scalar("always_apply_trigger"),
        ];
        match self.kind {
            RoleKind::Account => {
                schema.push(Attribute::scalar("on_account").force_new());
                schema.push(Attribute::object("on_account_object").force_new());
            }
            RoleKind::Database => schema.push(Attribute::scalar("on_database").force_new()),
        }
        schema.push(Attribute::object("on_schema").force_new());
        schema.push(Attribute::object("on_schema_object").force_new());
        schema
    }

    fn schema_version(&self) -> u32 {
        1
    }

    fn state_upgraders(&self) -> Vec<StateUpgrader> {
        vec![StateUpgrader {
            version: 0,
            upgrade: upgrade_v0,
        }]
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics> {
        let id = self.grant_id(d.config())?;
        id.validate()?;
        grants::create(self.client.as_ref(), ctx, &id)
            .await
            .with_context(|| format!("failed to create grant {id}"))?;
        d.set_id(id.to_string());
        d.commit_config();
        self.read(ctx, d).await
    }

    async fn read(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics> {
        let id = Self::parse_id(d)?;
        let observation = grants::read(self.client.as_ref(), ctx, &id)
            .await
            .with_context(|| format!("failed to read grant {id}"))?;
        match observation {
            GrantObservation::TargetMissing(reason) => {
                warn!("grant {id} is gone, removing it from state: {reason}");
                d.clear_id();
                return Ok(Diagnostics::warning(
                    "Grant target no longer exists, removing the grant from state",
                    reason,
                ));
            }
            GrantObservation::Unobservable => (),
            GrantObservation::Privileges(observed) => match id.privileges {
                GrantPrivileges::All => d.set("all_privileges", !observed.is_empty())?,
                GrantPrivileges::Explicit(_) => d.set("privileges", observed)?,
            },
        }
        if id.always_apply {
            d.set("always_apply_trigger", Uuid::new_v4().to_string())?;
        } else {
            d.unset("always_apply_trigger");
        }
        Ok(Diagnostics::new())
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics> {
        let old = self.grant_id(d.state())?;
        let new = self.grant_id(d.config())?;
        new.validate()?;
        grants::update(self.client.as_ref(), ctx, &old, &new)
            .await
            .with_context(|| format!("failed to update grant {old}"))?;
        d.set_id(new.to_string());
        d.commit_config();
        self.read(ctx, d).await
    }

    async fn delete(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics> {
        let id = Self::parse_id(d)?;
        grants::delete(self.client.as_ref(), ctx, &id)
            .await
            .with_context(|| format!("failed to revoke grant {id}"))?;
        d.clear_id();
        Ok(Diagnostics::new())
    }

    async fn import(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics> {
        let id = Self::parse_id(d)?;
        id.validate()?;
        d.set_all(self.project(&id));
        self.read(ctx, d).await
    }
}

#[cfg(test)]
mod tests {
    use icefield_core::{plan, upgrade_state, Plan};

    use super::*;
    use crate::testing::FakeSnowflake;

    fn config(v: Value) -> AttributeMap {
        v.as_object().cloned().unwrap_or_default()
    }

    fn role() -> Grantee {
        Grantee::AccountRole(AccountObjectIdentifier::new("R"))
    }

    fn on_database() -> GrantOn {
        GrantOn::AccountObject {
            object_type: ObjectType::Database,
            name: AccountObjectIdentifier::new("D"),
        }
    }

    fn usage_on_database() -> AttributeMap {
        config(json!({
            "account_role_name": "R",
            "privileges": ["USAGE"],
            "on_account_object": {"object_type": "DATABASE", "object_name": "D"},
        }))
    }

    #[tokio::test]
    async fn account_grant_round_trips_with_empty_plan() -> Result<()> {
        let fake = Arc::new(FakeSnowflake::new().with_role("R"));
        let resource = GrantPrivilegesResource::to_account_role(fake.clone());
        let ctx = Context::new();
        let mut d = ResourceData::new(config(json!({
            "account_role_name": "R",
            "privileges": ["CREATE DATABASE", "CREATE ROLE"],
            "with_grant_option": true,
            "on_account": true,
        })));

        let diags = resource.create(&ctx, &mut d).await?;
        assert!(diags.is_empty());
        assert_eq!(
            d.id(),
            r#"ToAccountRole|"R"|true|false|CREATE DATABASE,CREATE ROLE|OnAccount"#
        );
        assert_eq!(
            fake.statements(),
            [r#"GRANT CREATE DATABASE, CREATE ROLE ON ACCOUNT TO ROLE "R" WITH GRANT OPTION"#]
        );
        assert_eq!(plan(&resource.schema(), &d), Plan::NoOp);

        // reordering the list is not a change
        d.set_config(config(json!({
            "account_role_name": "R",
            "privileges": ["create role", "CREATE DATABASE"],
            "with_grant_option": true,
            "on_account": true,
        })));
        assert_eq!(plan(&resource.schema(), &d), Plan::NoOp);
        Ok(())
    }

    #[tokio::test]
    async fn imported_privileges_read_back_as_declared() -> Result<()> {
        let fake = Arc::new(FakeSnowflake::new().with_role("R").with_database("D"));
        let resource = GrantPrivilegesResource::to_account_role(fake.clone());
        let ctx = Context::new();
        let mut d = ResourceData::new(config(json!({
            "account_role_name": "R",
            "privileges": ["IMPORTED PRIVILEGES"],
            "on_account_object": {"object_type": "DATABASE", "object_name": "D"},
        })));

        resource.create(&ctx, &mut d).await?;
        assert_eq!(d.get_state("privileges"), Some(&json!(["IMPORTED PRIVILEGES"])));
        assert_eq!(plan(&resource.schema(), &d), Plan::NoOp);
        Ok(())
    }

    #[tokio::test]
    async fn drifted_grant_option_converges_in_one_update() -> Result<()> {
        let fake = Arc::new(FakeSnowflake::new().with_role("R").with_database("D"));
        let resource = GrantPrivilegesResource::to_account_role(fake.clone());
        let ctx = Context::new();
        let mut d = ResourceData::new(usage_on_database());
        resource.create(&ctx, &mut d).await?;

        // someone re-granted the privilege with the grant option
        fake.forget_grants(&role());
        fake.seed_grant("USAGE", on_database(), &role(), true);
        resource.read(&ctx, &mut d).await?;
        assert_eq!(
            plan(&resource.schema(), &d),
            Plan::Update(vec!["privileges".to_owned()])
        );

        fake.clear_log();
        resource.update(&ctx, &mut d).await?;
        assert_eq!(
            fake.statements(),
            [
                r#"REVOKE GRANT OPTION FOR USAGE ON DATABASE "D" FROM ROLE "R""#,
                r#"GRANT USAGE ON DATABASE "D" TO ROLE "R""#,
            ]
        );
        assert_eq!(plan(&resource.schema(), &d), Plan::NoOp);
        Ok(())
    }

    #[tokio::test]
    async fn all_privileges_are_tracked_as_a_flag() -> Result<()> {
        let fake = Arc::new(FakeSnowflake::new().with_role("R").with_database("D"));
        let resource = GrantPrivilegesResource::to_account_role(fake.clone());
        let ctx = Context::new();
        let mut d = ResourceData::new(config(json!({
            "account_role_name": "R",
            "all_privileges": true,
            "on_account_object": {"object_type": "DATABASE", "object_name": "D"},
        })));
        resource.create(&ctx, &mut d).await?;
        assert!(d.id().contains("|ALL|"));
        assert_eq!(plan(&resource.schema(), &d), Plan::NoOp);

        fake.forget_grants(&role());
        resource.read(&ctx, &mut d).await?;
        assert_eq!(
            plan(&resource.schema(), &d),
            Plan::Update(vec!["all_privileges".to_owned()])
        );
        Ok(())
    }

    #[tokio::test]
    async fn always_apply_never_converges() -> Result<()> {
        let fake = Arc::new(FakeSnowflake::new().with_role("R").with_database("D"));
        let resource = GrantPrivilegesResource::to_account_role(fake.clone());
        let ctx = Context::new();
        let mut cfg = usage_on_database();
        cfg.insert("always_apply".to_owned(), json!(true));
        let mut d = ResourceData::new(cfg);

        resource.create(&ctx, &mut d).await?;
        assert!(d.id().contains("|false|true|USAGE|"));
        assert_eq!(
            plan(&resource.schema(), &d),
            Plan::Update(vec!["always_apply_trigger".to_owned()])
        );

        fake.clear_log();
        resource.update(&ctx, &mut d).await?;
        assert_eq!(fake.statements(), [r#"GRANT USAGE ON DATABASE "D" TO ROLE "R""#]);
        assert!(!plan(&resource.schema(), &d).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn grant_to_a_missing_role_is_dropped_from_state() -> Result<()> {
        let fake = Arc::new(FakeSnowflake::new().with_database("D"));
        let resource = GrantPrivilegesResource::to_account_role(fake);
        let ctx = Context::new();
        let mut d = ResourceData::from_state(
            r#"ToAccountRole|"R"|false|false|USAGE|OnAccountObject|DATABASE|"D""#,
            usage_on_database(),
        );

        let diags = resource.read(&ctx, &mut d).await?;
        assert!(d.is_removed());
        assert_eq!(diags.warnings().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn import_produces_a_stable_plan() -> Result<()> {
        let fake = Arc::new(FakeSnowflake::new().with_role("R").with_database("D"));
        fake.seed_grant("USAGE", on_database(), &role(), false);
        let resource = GrantPrivilegesResource::to_account_role(fake);
        let ctx = Context::new();
        let mut d =
            ResourceData::for_import(r#"ToAccountRole|"R"|false|false|USAGE|OnAccountObject|DATABASE|"D""#);

        resource.import(&ctx, &mut d).await?;
        assert_eq!(
            d.get_state("on_account_object"),
            Some(&json!({"object_type": "DATABASE", "object_name": "\"D\""}))
        );
        d.set_config(config(json!({
            "account_role_name": "\"R\"",
            "privileges": ["USAGE"],
            "on_account_object": {"object_type": "DATABASE", "object_name": "\"D\""},
        })));
        assert_eq!(plan(&resource.schema(), &d), Plan::NoOp);
        Ok(())
    }

    #[tokio::test]
    async fn database_role_grants_on_their_database() -> Result<()> {
        let fake = Arc::new(
            FakeSnowflake::new()
                .with_database("D")
                .with_database_role("D", "DR"),
        );
        let resource = GrantPrivilegesResource::to_database_role(fake.clone());
        let ctx = Context::new();
        let mut d = ResourceData::new(config(json!({
            "database_role_name": "D.DR",
            "privileges": ["USAGE"],
            "on_database": "D",
        })));

        resource.create(&ctx, &mut d).await?;
        assert_eq!(
            d.id(),
            r#"ToDatabaseRole|"D"."DR"|false|false|USAGE|OnAccountObject|DATABASE|"D""#
        );
        assert_eq!(
            fake.statements(),
            [r#"GRANT USAGE ON DATABASE "D" TO DATABASE ROLE "D"."DR""#]
        );
        assert_eq!(plan(&resource.schema(), &d), Plan::NoOp);

        resource.delete(&ctx, &mut d).await?;
        assert!(d.is_removed());
        assert_eq!(
            fake.statements().last().map(String::as_str),
            Some(r#"REVOKE USAGE ON DATABASE "D" FROM DATABASE ROLE "D"."DR""#)
        );
        Ok(())
    }

    #[tokio::test]
    async fn future_grants_in_a_schema_are_narrowed() -> Result<()> {
        let fake = Arc::new(FakeSnowflake::new().with_role("R").with_database("D"));
        let resource = GrantPrivilegesResource::to_account_role(fake.clone());
        let ctx = Context::new();
        let mut d = ResourceData::new(config(json!({
            "account_role_name": "R",
            "privileges": ["SELECT"],
            "on_schema_object": {
                "future": {"object_type_plural": "TABLES", "in_schema": "D.S"},
            },
        })));

        resource.create(&ctx, &mut d).await?;
        assert_eq!(
            d.id(),
            r#"ToAccountRole|"R"|false|false|SELECT|OnSchemaObject|OnFuture|TABLES|InSchema|"D"."S""#
        );
        assert_eq!(
            fake.statements(),
            [r#"GRANT SELECT ON FUTURE TABLES IN SCHEMA "D"."S" TO ROLE "R""#]
        );
        Ok(())
    }

    #[tokio::test]
    async fn ambiguous_scope_is_rejected() {
        let fake = Arc::new(FakeSnowflake::new().with_role("R"));
        let resource = GrantPrivilegesResource::to_account_role(fake.clone());
        let mut d = ResourceData::new(config(json!({
            "account_role_name": "R",
            "privileges": ["USAGE"],
            "on_account": true,
            "on_schema": {"schema_name": "D.S"},
        })));

        let err = resource.create(&Context::new(), &mut d).await;
        assert!(
            matches!(&err, Err(e) if e.to_string().contains("only one of")),
            "{err:?}"
        );
        assert!(fake.statements().is_empty());
    }

    #[test]
    fn legacy_ids_are_upgraded() -> Result<()> {
        let resource = GrantPrivilegesResource::to_account_role(Arc::new(FakeSnowflake::new()));
        let raw = config(json!({"id": "R|false|false|USAGE|OnAccountObject|DATABASE|D"}));
        let upgraded = upgrade_state(&resource.state_upgraders(), 0, raw)?;
        assert_eq!(
            upgraded.get("id"),
            Some(&json!(r#"ToAccountRole|"R"|false|false|USAGE|OnAccountObject|DATABASE|"D""#))
        );
        Ok(())
    }

    #[test]
    fn id_projection_names_the_declared_scope() -> Result<()> {
        let resource = GrantPrivilegesResource::to_database_role(Arc::new(FakeSnowflake::new()));
        let id = GrantId {
            role: Grantee::DatabaseRole(DatabaseObjectIdentifier::new("D", "DR")),
            with_grant_option: false,
            always_apply: false,
            privileges: GrantPrivileges::All,
            scope: GrantOn::SchemaObject(SchemaObjectGrantScope::All(BulkScope {
                object_type: ObjectType::Table,
                container: BulkIn::Database(AccountObjectIdentifier::new("D")),
            })),
        };
        let projected = resource.project(&id);
        assert_eq!(resource.grant_id(&projected)?, id);
        Ok(())
    }
}
