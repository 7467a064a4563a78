//! Recursive subtree fetching.
//!
//! One "get children" round-trip per parent. All sibling subtree fetches are
//! started before any result is assembled, so the number of sequential
//! round-trips is bounded by tree depth, not node count. Assembly preserves
//! sibling order: A's whole subtree precedes B's.

use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::protocol::{RemoteNode, Transport};
use crate::tree::{check_cancel, SyncError};

/// Fetch every descendant of `parent`, depth-first in sibling order.
///
/// `parent` itself is not included in the result. Children of an `ignored`
/// node are never requested: the remote side does not expose them once the
/// parent is ignored, and asking anyway is a protocol violation.
///
/// The cancel token is checked before and after every round-trip; a
/// cancelled fetch returns [`SyncError::Aborted`] and yields nothing.
pub(crate) fn fetch_subtree<'a>(
    transport: &'a dyn Transport,
    cancel: &'a CancellationToken,
    parent: &'a RemoteNode,
) -> BoxFuture<'a, Result<Vec<Arc<RemoteNode>>, SyncError>> {
    async move {
        check_cancel(cancel)?;
        let children = transport.fetch_children(&parent.id).await?;
        check_cancel(cancel)?;
        let children: Vec<Arc<RemoteNode>> = children.into_iter().map(Arc::new).collect();

        // Start every child's subtree fetch before assembling anything.
        let subtrees = future::try_join_all(children.iter().map(|child| async move {
            if child.ignored {
                Ok(Vec::new())
            } else {
                fetch_subtree(transport, cancel, child).await
            }
        }))
        .await?;
        check_cancel(cancel)?;

        let mut out = Vec::with_capacity(children.len());
        for (child, descendants) in children.into_iter().zip(subtrees) {
            debug!(node = %child.id, role = %child.role, "fetched");
            out.push(child);
            out.extend(descendants);
        }
        Ok(out)
    }
    .boxed()
}
