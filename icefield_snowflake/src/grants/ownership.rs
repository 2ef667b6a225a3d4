//! Ownership transfers.

use icefield_core::logging::{info, warn};
use icefield_core::Context;

use super::grants_to_role;
use crate::error::{ignore_missing, Error, Result};
use crate::grant_id::GrantOwnershipId;
use crate::sdk::{GrantOwnershipRequest, Grantee, Grants, Roles, Session};

const OWNERSHIP: &str = "OWNERSHIP";

/// What a read found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipObservation {
    /// The role owns the scope.
    Held,
    /// Someone else does.
    NotHeld,
    /// "All in" scopes can't be read back.
    Unobservable,
    /// The role or the object is gone.
    TargetMissing(String),
}

/// How a delete ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipRelease {
    /// Ownership went back to the session role.
    Returned(Grantee),
    /// Nothing was done. Carries the reason.
    Skipped(String),
}

async fn transfer<C: Grants + ?Sized>(
    client: &C,
    ctx: &Context,
    id: &GrantOwnershipId,
    to: Grantee,
) -> Result<()> {
    client
        .grant_ownership(
            ctx,
            &GrantOwnershipRequest {
                on: id.scope.clone(),
                to,
                current_grants: id.outbound_privileges,
            },
        )
        .await
}

/// Hand ownership of the scope to the role.
pub async fn create<C: Grants + ?Sized>(
    client: &C,
    ctx: &Context,
    id: &GrantOwnershipId,
) -> Result<()> {
    transfer(client, ctx, id, id.role.clone()).await
}

pub async fn read<C: Grants + Roles + ?Sized>(
    client: &C,
    ctx: &Context,
    id: &GrantOwnershipId,
) -> Result<OwnershipObservation> {
    match client.show_role(ctx, &id.role).await {
        Ok(_) => (),
        Err(e) if e.is_object_missing() => {
            return Ok(OwnershipObservation::TargetMissing(format!(
                "role {} does not exist",
                id.role.fully_qualified_name()
            )))
        }
        Err(e) => return Err(e),
    }
    let request = match id.scope.show_request() {
        Some(request) => request,
        None => {
            info!("ownership of {} can't be read back from Snowflake", id.scope);
            return Ok(OwnershipObservation::Unobservable);
        }
    };
    let rows = match client.show_grants(ctx, &request).await {
        Ok(rows) => rows,
        Err(e) if e.is_object_missing() => {
            return Ok(OwnershipObservation::TargetMissing(format!(
                "{} does not exist",
                id.scope
            )))
        }
        Err(e) => return Err(e),
    };

    let held = grants_to_role(
        &rows,
        &id.role,
        id.scope.expected_object_type(),
        request.is_future(),
    )
    .any(|row| row.privilege.eq_ignore_ascii_case(OWNERSHIP));
    Ok(if held {
        OwnershipObservation::Held
    } else {
        OwnershipObservation::NotHeld
    })
}

/// Move ownership to the new role. A change of the outbound option alone
/// issues nothing, it only matters at transfer time.
pub async fn update<C: Grants + ?Sized>(
    client: &C,
    ctx: &Context,
    old: &GrantOwnershipId,
    new: &GrantOwnershipId,
) -> Result<()> {
    if !old.same_target_kind(new) {
        return Err(Error::Invalid(format!(
            "ownership {old} can't be updated in place to {new}, the scope or role kind changed"
        )));
    }
    if old.role != new.role {
        transfer(client, ctx, new, new.role.clone()).await?;
    }
    Ok(())
}

/// Return ownership to the session's current role.
///
/// Future ownership grants can't be handed back to anyone meaningful, so they
/// are left in place.
pub async fn delete<C: Grants + Session + ?Sized>(
    client: &C,
    ctx: &Context,
    id: &GrantOwnershipId,
) -> Result<OwnershipRelease> {
    if id.scope.is_future() {
        let reason = format!(
            "future ownership on {} is left with {}, revoke it manually if needed",
            id.scope,
            id.role.fully_qualified_name()
        );
        warn!("{reason}");
        return Ok(OwnershipRelease::Skipped(reason));
    }
    let current = Grantee::AccountRole(client.current_role(ctx).await?);
    ignore_missing(transfer(client, ctx, id, current.clone()).await)?;
    Ok(OwnershipRelease::Returned(current))
}
