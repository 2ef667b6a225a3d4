//! Root discovery and the suspend / mutate / resume protocol.
//!
//! Snowflake rejects most changes to a task while its graph is running, so
//! every mutation of a non-root task runs between a SUSPEND and a RESUME of
//! the roots involved.

use std::future::Future;

use icefield_core::logging::{debug, warn};
use icefield_core::Context;

use crate::entry_types::TaskRow;
use crate::error::{Error, Result};
use crate::identifier::SchemaObjectIdentifier;
use crate::sdk::{AlterTaskAction, AlterTaskRequest, Tasks};

/// Walk predecessor (or finalized-root) edges from `id` up to the root.
///
/// Snowflake keeps graphs acyclic, so there is no cycle detection.
pub async fn find_root<C: Tasks + ?Sized>(
    client: &C,
    ctx: &Context,
    id: &SchemaObjectIdentifier,
) -> Result<TaskRow> {
    let mut task = client.show_task(ctx, id).await?;
    loop {
        let next = match task.predecessors()?.into_iter().next() {
            Some(predecessor) => predecessor,
            None => match task.finalized_root()? {
                Some(root) => root,
                None => return Ok(task),
            },
        };
        task = client.show_task(ctx, &next).await?;
    }
}

/// The distinct roots of every task in `ids`, skipping `exclude`.
pub async fn find_roots<C: Tasks + ?Sized>(
    client: &C,
    ctx: &Context,
    ids: &[SchemaObjectIdentifier],
    exclude: &SchemaObjectIdentifier,
) -> Result<Vec<TaskRow>> {
    let mut roots: Vec<TaskRow> = vec![];
    for id in ids {
        let root = find_root(client, ctx, id).await?;
        if &root.id() != exclude && !roots.iter().any(|r| r.id() == root.id()) {
            roots.push(root);
        }
    }
    Ok(roots)
}

async fn resume_all<C: Tasks + ?Sized>(
    client: &C,
    ctx: &Context,
    suspended: &[SchemaObjectIdentifier],
) -> Result<()> {
    let mut first_error: Option<Error> = None;
    for id in suspended.iter().rev() {
        let request = AlterTaskRequest::new(id.clone(), AlterTaskAction::Resume);
        if let Err(e) = client.alter_task(ctx, &request).await {
            warn!("failed to resume root task {id}, it is left suspended: {e}");
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// Run `mutation` with every started root in `roots` suspended.
///
/// Roots are resumed in reverse order once the mutation finishes, also when
/// it failed. The mutation's error wins over a resume error.
pub async fn with_suspended_roots<C, T, F>(
    client: &C,
    ctx: &Context,
    roots: &[TaskRow],
    mutation: F,
) -> Result<T>
where
    C: Tasks + ?Sized,
    F: Future<Output = Result<T>>,
{
    let mut suspended = vec![];
    for root in roots.iter().filter(|r| r.is_started()) {
        let id = root.id();
        debug!("suspending root task {id}");
        let request = AlterTaskRequest::new(id.clone(), AlterTaskAction::Suspend);
        if let Err(e) = client.alter_task(ctx, &request).await {
            // resume failures are logged by resume_all, keep the suspend error
            let _ = resume_all(client, ctx, &suspended).await;
            return Err(e);
        }
        suspended.push(id);
    }

    let result = mutation.await;
    let resumed = resume_all(client, ctx, &suspended).await;
    match (result, resumed) {
        (Err(e), _) => Err(e),
        (Ok(_), Err(e)) => Err(e),
        (Ok(value), Ok(())) => Ok(value),
    }
}
