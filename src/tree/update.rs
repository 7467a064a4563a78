//! Incremental reconciliation of remote patch batches into the mirror.
//!
//! Mutation is in place, not transactional: a fatal mid-pass error (a child
//! id that stays unresolved even after the supplemental fetch) can leave
//! some nodes of the batch applied and others not. The engine then reports
//! the error and keeps serving the mirror as-is; the next reconstruct
//! replaces it wholesale.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex};

use futures::future;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::protocol::{NodeId, RemoteNode, Transport};
use crate::tree::fetch::fetch_subtree;
use crate::tree::mirror::{Mirror, MirrorNode};
use crate::tree::{check_cancel, SyncError};

/// Apply one batch of updated remote nodes to the mirror.
///
/// Per node: replace (or insert) its mirror entry, remember its parent as
/// affected, and prune direct former children that the new child list no
/// longer names. Pruning is not recursive; deeper orphans either get their
/// own patch later or become unreachable and are never visited again.
///
/// Child ids that do not resolve after the batch trigger a supplemental
/// fetch rooted at their parent. Afterwards every patched node's child list
/// is re-linked and verified; a still-missing child is fatal for the pass.
///
/// The mirror lock is released across the supplemental fetch, so dangling
/// links may be observable within the pass. They are resolved or deleted
/// before the pass completes.
pub(crate) async fn apply_updates(
    transport: &dyn Transport,
    cancel: &CancellationToken,
    mirror: &Mutex<Mirror>,
    updates: &[Arc<RemoteNode>],
) -> Result<(), SyncError> {
    check_cancel(cancel)?;

    let mut affected_parents: BTreeSet<NodeId> = BTreeSet::new();
    let mut parents_lacking_children: Vec<Arc<RemoteNode>> = Vec::new();
    {
        let mut m = mirror.lock().unwrap();
        for node in updates {
            let existing = m.insert(MirrorNode::from_remote(Arc::clone(node)));
            if let Some(parent_id) = &node.parent_id {
                affected_parents.insert(parent_id.clone());
            }
            let Some(child_ids) = &node.child_ids else {
                continue;
            };
            let mut removed_children: Option<HashSet<NodeId>> =
                existing.map(|e| e.children.into_iter().collect());
            for child_id in child_ids {
                if let Some(removed) = &mut removed_children {
                    removed.remove(child_id);
                }
                if !m.contains(child_id) {
                    parents_lacking_children.push(Arc::clone(node));
                    break;
                }
            }
            if let Some(removed) = removed_children {
                for id in removed {
                    debug!(node = %id, "pruning orphaned child");
                    m.remove(&id);
                }
            }
        }
    }

    let mut fetched: Vec<Arc<RemoteNode>> = Vec::new();
    if !parents_lacking_children.is_empty() {
        debug!(
            parents = parents_lacking_children.len(),
            "supplemental fetch for unresolved children"
        );
        let subtrees = future::try_join_all(
            parents_lacking_children
                .iter()
                .map(|parent| fetch_subtree(transport, cancel, parent)),
        )
        .await?;
        for subtree in subtrees {
            fetched.extend(subtree);
        }
    }
    check_cancel(cancel)?;

    let mut m = mirror.lock().unwrap();
    for node in &fetched {
        m.insert(MirrorNode::from_remote(Arc::clone(node)));
    }
    for node in updates.iter().chain(fetched.iter()) {
        if !m.contains(&node.id) {
            // Deleted by a later patch in the same batch.
            continue;
        }
        let Some(child_ids) = &node.child_ids else {
            continue;
        };
        for child_id in child_ids {
            if !m.contains(child_id) {
                return Err(SyncError::ChildNotFound(child_id.clone()));
            }
        }
        if let Some(entry) = m.node_mut(&node.id) {
            entry.children = child_ids.clone();
        }
    }
    for parent_id in &affected_parents {
        let Some(parent) = m.node(parent_id) else {
            continue;
        };
        if let Some(missing) = parent.children.iter().find(|id| !m.contains(id)) {
            return Err(SyncError::ChildNotFound(missing.clone()));
        }
    }
    Ok(())
}
