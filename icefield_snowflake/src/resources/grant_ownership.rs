//! `snowflake_grant_ownership`

use std::sync::Arc;

use anyhow::{anyhow, bail, Context as _, Result};
use async_trait::async_trait;
use icefield_core::logging::warn;
use icefield_core::{Attribute, AttributeMap, Context, Diagnostics, Resource, ResourceData};
use serde_json::json;

use super::grant_privileges::{bulk_scope, declared_objects, named_object, project_bulk, DeclaredObjects};
use super::{exactly_one, get_block, get_str, parse_opt};
use crate::grant_id::GrantOwnershipId;
use crate::grants::ownership::{self, OwnershipObservation, OwnershipRelease};
use crate::sdk::{Client, Grantee, OutboundPrivileges, OwnershipGrantOn};

const SCHEMA: &[Attribute] = &[
    // a new account role takes ownership in place
    Attribute::scalar("account_role_name"),
    Attribute::scalar("database_role_name").force_new(),
    Attribute::scalar("outbound_privileges"),
    Attribute::object("on").force_new(),
];

pub struct GrantOwnershipResource<C> {
    client: Arc<C>,
}

impl<C: Client> GrantOwnershipResource<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

fn ownership_id(map: &AttributeMap) -> Result<GrantOwnershipId> {
    let role = exactly_one(
        "grant ownership role",
        vec![
            (
                "account_role_name",
                parse_opt(map, "account_role_name")?.map(Grantee::AccountRole),
            ),
            (
                "database_role_name",
                parse_opt(map, "database_role_name")?.map(Grantee::DatabaseRole),
            ),
        ],
    )?
    .1;
    let outbound_privileges = match get_str(map, "outbound_privileges")
        .map(str::to_uppercase)
        .as_deref()
    {
        None => None,
        Some("COPY") => Some(OutboundPrivileges::Copy),
        Some("REVOKE") => Some(OutboundPrivileges::Revoke),
        Some(other) => bail!("invalid outbound_privileges {other:?}, expected one of: COPY, REVOKE"),
    };
    let on = get_block(map, "on").ok_or_else(|| anyhow!("attribute on is required"))?;
    let scope = match declared_objects("on", on)? {
        DeclaredObjects::Named(name) => {
            let (object_type, name) = named_object(on, name)?;
            OwnershipGrantOn::Object { object_type, name }
        }
        DeclaredObjects::All(bulk) => OwnershipGrantOn::All(bulk_scope(bulk)?),
        DeclaredObjects::Future(bulk) => OwnershipGrantOn::Future(bulk_scope(bulk)?),
    };
    Ok(GrantOwnershipId {
        role,
        outbound_privileges,
        scope,
    })
}

fn project(id: &GrantOwnershipId) -> AttributeMap {
    let mut m = AttributeMap::new();
    let role_attribute = match &id.role {
        Grantee::AccountRole(_) => "account_role_name",
        Grantee::DatabaseRole(_) => "database_role_name",
    };
    m.insert(role_attribute.to_owned(), json!(id.role.fully_qualified_name()));
    if let Some(outbound) = id.outbound_privileges {
        m.insert("outbound_privileges".to_owned(), json!(outbound.as_str()));
    }
    let on = match &id.scope {
        OwnershipGrantOn::Object { object_type, name } => json!({
            "object_type": object_type.as_str(),
            "object_name": name.fully_qualified_name(),
        }),
        OwnershipGrantOn::All(bulk) => json!({ "all": project_bulk(bulk) }),
        OwnershipGrantOn::Future(bulk) => json!({ "future": project_bulk(bulk) }),
    };
    m.insert("on".to_owned(), on);
    m
}

fn parse_id(d: &ResourceData) -> Result<GrantOwnershipId> {
    d.id()
        .parse::<GrantOwnershipId>()
        .with_context(|| format!("invalid grant ownership id {:?}", d.id()))
}

#[async_trait]
impl<C: Client + 'static> Resource for GrantOwnershipResource<C> {
    fn type_name(&self) -> &'static str {
        "snowflake_grant_ownership"
    }

    fn schema(&self) -> Vec<Attribute> {
        SCHEMA.to_vec()
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics> {
        let id = ownership_id(d.config())?;
        ownership::create(self.client.as_ref(), ctx, &id)
            .await
            .with_context(|| format!("failed to transfer ownership {id}"))?;
        d.set_id(id.to_string());
        d.commit_config();
        self.read(ctx, d).await
    }

    async fn read(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics> {
        let id = parse_id(d)?;
        let reason = match ownership::read(self.client.as_ref(), ctx, &id)
            .await
            .with_context(|| format!("failed to read ownership {id}"))?
        {
            OwnershipObservation::Held | OwnershipObservation::Unobservable => {
                return Ok(Diagnostics::new())
            }
            OwnershipObservation::NotHeld => format!(
                "{} no longer owns {}",
                id.role.fully_qualified_name(),
                id.scope
            ),
            OwnershipObservation::TargetMissing(reason) => reason,
        };
        warn!("ownership {id} is gone, removing it from state: {reason}");
        d.clear_id();
        Ok(Diagnostics::warning(
            "Ownership grant no longer holds, removing it from state",
            reason,
        ))
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics> {
        let old = ownership_id(d.state())?;
        let new = ownership_id(d.config())?;
        ownership::update(self.client.as_ref(), ctx, &old, &new)
            .await
            .with_context(|| format!("failed to update ownership {old}"))?;
        d.set_id(new.to_string());
        d.commit_config();
        self.read(ctx, d).await
    }

    async fn delete(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics> {
        let id = parse_id(d)?;
        let released = ownership::delete(self.client.as_ref(), ctx, &id)
            .await
            .with_context(|| format!("failed to release ownership {id}"))?;
        d.clear_id();
        Ok(match released {
            OwnershipRelease::Returned(_) => Diagnostics::new(),
            OwnershipRelease::Skipped(reason) => {
                Diagnostics::warning("Future ownership left in place", reason)
            }
        })
    }

    async fn import(&self, ctx: &Context, d: &mut ResourceData) -> Result<Diagnostics> {
        let id = parse_id(d)?;
        d.set_all(project(&id));
        self.read(ctx, d).await
    }
}

#[cfg(test)]
mod tests {
    use icefield_core::{plan, Plan};
    use serde_json::Value;

    use super::*;
    use crate::testing::FakeSnowflake;

    fn config(v: Value) -> AttributeMap {
        v.as_object().cloned().unwrap_or_default()
    }

    fn database_owned_by(role: &str) -> AttributeMap {
        config(json!({
            "account_role_name": role,
            "outbound_privileges": "COPY",
            "on": {"object_type": "DATABASE", "object_name": "D"},
        }))
    }

    fn fake() -> Arc<FakeSnowflake> {
        Arc::new(
            FakeSnowflake::new()
                .with_role("R")
                .with_role("R2")
                .with_role("ADMIN")
                .with_database("D")
                .with_current_role("ADMIN"),
        )
    }

    #[tokio::test]
    async fn delete_hands_the_database_back_to_the_session_role() -> Result<()> {
        let fake = fake();
        let resource = GrantOwnershipResource::new(fake.clone());
        let ctx = Context::new();
        let mut d = ResourceData::new(database_owned_by("R"));

        resource.create(&ctx, &mut d).await?;
        assert_eq!(d.id(), r#"ToAccountRole|"R"|COPY|OnObject|DATABASE|"D""#);
        assert_eq!(plan(SCHEMA, &d), Plan::NoOp);

        fake.clear_log();
        let diags = resource.delete(&ctx, &mut d).await?;
        assert!(diags.is_empty());
        assert!(d.is_removed());
        assert_eq!(
            fake.statements(),
            [r#"GRANT OWNERSHIP ON DATABASE "D" TO ROLE "ADMIN" COPY CURRENT GRANTS"#]
        );
        Ok(())
    }

    #[tokio::test]
    async fn new_owner_is_an_in_place_update() -> Result<()> {
        let fake = fake();
        let resource = GrantOwnershipResource::new(fake.clone());
        let ctx = Context::new();
        let mut d = ResourceData::new(database_owned_by("R"));
        resource.create(&ctx, &mut d).await?;

        d.set_config(database_owned_by("R2"));
        assert_eq!(
            plan(SCHEMA, &d),
            Plan::Update(vec!["account_role_name".to_owned()])
        );
        fake.clear_log();
        resource.update(&ctx, &mut d).await?;
        assert_eq!(
            fake.statements(),
            [r#"GRANT OWNERSHIP ON DATABASE "D" TO ROLE "R2" COPY CURRENT GRANTS"#]
        );
        assert_eq!(d.id(), r#"ToAccountRole|"R2"|COPY|OnObject|DATABASE|"D""#);
        assert_eq!(plan(SCHEMA, &d), Plan::NoOp);
        Ok(())
    }

    #[tokio::test]
    async fn ownership_taken_elsewhere_is_dropped_from_state() -> Result<()> {
        let fake = fake();
        let resource = GrantOwnershipResource::new(fake.clone());
        let ctx = Context::new();
        let mut d = ResourceData::new(database_owned_by("R"));
        resource.create(&ctx, &mut d).await?;

        let mut other = ResourceData::new(database_owned_by("R2"));
        resource.create(&ctx, &mut other).await?;

        let diags = resource.read(&ctx, &mut d).await?;
        assert!(d.is_removed());
        assert_eq!(diags.warnings().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn future_ownership_is_left_in_place_on_delete() -> Result<()> {
        let fake = fake();
        let resource = GrantOwnershipResource::new(fake.clone());
        let ctx = Context::new();
        let mut d = ResourceData::new(config(json!({
            "account_role_name": "R",
            "on": {"future": {"object_type_plural": "TABLES", "in_database": "D"}},
        })));

        resource.create(&ctx, &mut d).await?;
        assert_eq!(
            fake.statements(),
            [r#"GRANT OWNERSHIP ON FUTURE TABLES IN DATABASE "D" TO ROLE "R""#]
        );
        fake.clear_log();
        let diags = resource.delete(&ctx, &mut d).await?;
        assert_eq!(diags.warnings().len(), 1);
        assert!(fake.statements().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn import_projects_the_id() -> Result<()> {
        let fake = fake();
        let resource = GrantOwnershipResource::new(fake.clone());
        let ctx = Context::new();
        resource
            .create(&ctx, &mut ResourceData::new(database_owned_by("R")))
            .await?;

        let mut d = ResourceData::for_import(r#"ToAccountRole|"R"|COPY|OnObject|DATABASE|"D""#);
        resource.import(&ctx, &mut d).await?;
        assert!(!d.is_removed());
        assert_eq!(d.get_state("outbound_privileges"), Some(&json!("COPY")));
        assert_eq!(ownership_id(d.state())?, parse_id(&d)?);
        Ok(())
    }

    #[test]
    fn unknown_outbound_option_is_rejected() {
        let mut cfg = database_owned_by("R");
        cfg.insert("outbound_privileges".to_owned(), json!("KEEP"));
        assert!(ownership_id(&cfg).is_err());
    }
}
