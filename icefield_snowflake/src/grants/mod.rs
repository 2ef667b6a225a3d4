//! Privilege grant reconciliation.
//!
//! Turns a desired [`GrantId`] into GRANT / REVOKE statements and reads back
//! which of the declared privileges Snowflake reports.

pub mod ownership;

use std::collections::BTreeSet;

use icefield_core::logging::{debug, info};
use icefield_core::Context;

use crate::consts::SNOWFLAKE_DATABASE;
use crate::entry_types::GrantRow;
use crate::error::{ignore_missing, Error, Result};
use crate::grant_id::GrantId;
use crate::object_type::ObjectType;
use crate::sdk::{GrantPrivileges, GrantRequest, Grants, Grantee, RevokeRequest, Roles};

const OWNERSHIP: &str = "OWNERSHIP";
const USAGE: &str = "USAGE";
const IMPORTED_PRIVILEGES: &str = "IMPORTED PRIVILEGES";

/// What a read found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantObservation {
    /// Privileges Snowflake reports, in declared spelling.
    Privileges(Vec<String>),
    /// The scope is a bulk "all in" grant Snowflake can't report.
    Unobservable,
    /// The role or the object is gone.
    TargetMissing(String),
}

/// Whether a reported object type names the expected one. Snowflake reports
/// applications in place of the databases they are installed as.
pub(crate) fn object_type_matches(reported: &str, expected: ObjectType) -> bool {
    let reported = reported.replace('_', " ");
    reported.eq_ignore_ascii_case(expected.as_str())
        || (expected == ObjectType::Database && reported.eq_ignore_ascii_case("APPLICATION"))
}

/// Rows that describe grants to `role` of the expected object type.
pub(crate) fn grants_to_role<'a>(
    rows: &'a [GrantRow],
    role: &'a Grantee,
    expected: ObjectType,
    future: bool,
) -> impl Iterator<Item = &'a GrantRow> + 'a {
    rows.iter()
        .filter(move |row| row.granted_to == role.granted_to())
        .filter(move |row| object_type_matches(row.object_type(future), expected))
        .filter(move |row| role.matches_name(&row.grantee_name))
}

fn upper_set(privileges: &[String]) -> BTreeSet<String> {
    privileges.iter().map(|p| p.to_uppercase()).collect()
}

/// Items of `a` not in `b`, compared case-insensitively, in `a`'s order.
fn difference(a: &[String], b: &[String]) -> Vec<String> {
    let b = upper_set(b);
    a.iter()
        .filter(|p| !b.contains(&p.to_uppercase()))
        .cloned()
        .collect()
}

/// Issue the GRANT described by `id`.
pub async fn create<C: Grants + ?Sized>(client: &C, ctx: &Context, id: &GrantId) -> Result<()> {
    grant(client, ctx, id, id.privileges.clone()).await
}

async fn grant<C: Grants + ?Sized>(
    client: &C,
    ctx: &Context,
    id: &GrantId,
    privileges: GrantPrivileges,
) -> Result<()> {
    client
        .grant(
            ctx,
            &GrantRequest {
                privileges,
                on: id.scope.clone(),
                to: id.role.clone(),
                with_grant_option: id.with_grant_option,
            },
        )
        .await
}

async fn revoke<C: Grants + ?Sized>(
    client: &C,
    ctx: &Context,
    id: &GrantId,
    privileges: GrantPrivileges,
    grant_option_for: bool,
) -> Result<()> {
    client
        .revoke(
            ctx,
            &RevokeRequest {
                privileges,
                on: id.scope.clone(),
                from: id.role.clone(),
                grant_option_for,
            },
        )
        .await
}

/// Read which of the privileges `id` declares are in place.
pub async fn read<C: Grants + Roles + ?Sized>(
    client: &C,
    ctx: &Context,
    id: &GrantId,
) -> Result<GrantObservation> {
    match client.show_role(ctx, &id.role).await {
        Ok(_) => (),
        Err(e) if e.is_object_missing() => {
            return Ok(GrantObservation::TargetMissing(format!(
                "role {} does not exist",
                id.role.fully_qualified_name()
            )))
        }
        Err(e) => return Err(e),
    }

    let request = match id.scope.show_request() {
        Some(request) => request,
        None => {
            info!(
                "grants on {} can't be read back from Snowflake, skipping the read",
                id.scope
            );
            return Ok(GrantObservation::Unobservable);
        }
    };
    let rows = match client.show_grants(ctx, &request).await {
        Ok(rows) => rows,
        Err(e) if e.is_object_missing() => {
            return Ok(GrantObservation::TargetMissing(format!(
                "{} does not exist",
                id.scope
            )))
        }
        Err(e) => return Err(e),
    };

    let future = request.is_future();
    let observed: Vec<&str> = grants_to_role(&rows, &id.role, id.scope.expected_object_type(), future)
        // future rows carry no grantor, neither do Snowflake's own database grants
        .filter(|row| future || row.has_grantor() || row.name == SNOWFLAKE_DATABASE)
        .filter(|row| row.with_grant_option() == id.with_grant_option)
        .map(|row| row.privilege.as_str())
        .collect();
    debug!("observed privileges {observed:?} for {id}");

    let observed_upper: BTreeSet<String> = observed.iter().map(|p| p.to_uppercase()).collect();
    let privileges = match &id.privileges {
        GrantPrivileges::All => observed
            .iter()
            .filter(|p| !p.eq_ignore_ascii_case(OWNERSHIP))
            .map(|p| p.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
        GrantPrivileges::Explicit(declared) => declared
            .iter()
            .filter(|p| {
                let upper = p.to_uppercase();
                observed_upper.contains(&upper)
                    || (upper == IMPORTED_PRIVILEGES && observed_upper.contains(USAGE))
            })
            .cloned()
            .collect(),
    };
    Ok(GrantObservation::Privileges(privileges))
}

/// Converge from `old` to `new`. Adds are issued before removes.
pub async fn update<C: Grants + ?Sized>(
    client: &C,
    ctx: &Context,
    old: &GrantId,
    new: &GrantId,
) -> Result<()> {
    if !old.same_target(new) {
        return Err(Error::Invalid(format!(
            "grant {old} can't be updated in place to {new}, the role or scope changed"
        )));
    }
    let grant_option_changed = old.with_grant_option != new.with_grant_option;
    let dropping_grant_option = old.with_grant_option && !new.with_grant_option;

    match (&old.privileges, &new.privileges) {
        (GrantPrivileges::Explicit(old_privileges), GrantPrivileges::All) => {
            if dropping_grant_option {
                let held = GrantPrivileges::Explicit(old_privileges.clone());
                revoke(client, ctx, new, held, true).await?;
            }
            grant(client, ctx, new, GrantPrivileges::All).await?;
        }
        (GrantPrivileges::All, GrantPrivileges::Explicit(new_privileges)) => {
            revoke(client, ctx, new, GrantPrivileges::All, false).await?;
            let wanted = GrantPrivileges::Explicit(new_privileges.clone());
            grant(client, ctx, new, wanted).await?;
        }
        (GrantPrivileges::All, GrantPrivileges::All) => {
            if grant_option_changed {
                if !new.with_grant_option {
                    revoke(client, ctx, new, GrantPrivileges::All, true).await?;
                }
                grant(client, ctx, new, GrantPrivileges::All).await?;
            }
        }
        (GrantPrivileges::Explicit(old_privileges), GrantPrivileges::Explicit(new_privileges)) => {
            let to_add = if grant_option_changed {
                new_privileges.clone()
            } else {
                difference(new_privileges, old_privileges)
            };
            let to_remove = difference(old_privileges, new_privileges);

            if !to_add.is_empty() {
                if !new.with_grant_option {
                    // a grantee may hold a stale grant option on what we add
                    let stale = GrantPrivileges::Explicit(to_add.clone());
                    revoke(client, ctx, new, stale, true).await?;
                }
                grant(client, ctx, new, GrantPrivileges::Explicit(to_add)).await?;
            }
            if !to_remove.is_empty() {
                revoke(client, ctx, new, GrantPrivileges::Explicit(to_remove), false).await?;
            }
        }
    }

    if new.always_apply {
        grant(client, ctx, new, new.privileges.clone()).await?;
    }
    Ok(())
}

/// Revoke everything `id` granted. A vanished role or object is fine.
pub async fn delete<C: Grants + ?Sized>(client: &C, ctx: &Context, id: &GrantId) -> Result<()> {
    ignore_missing(revoke(client, ctx, id, id.privileges.clone(), false).await)
}
