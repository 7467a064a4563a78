//! Local mirror of the remote accessibility tree.
//!
//! The mirror is a flat id → node map plus a designated root. Node child
//! links are stored as ids and resolved against the map, so the map is the
//! single owner of every node; there are no reference cycles to manage.

use std::collections::HashMap;
use std::sync::Arc;

use crate::protocol::{NodeId, RemoteNode};

/// Local counterpart of one remote node.
#[derive(Debug, Clone)]
pub struct MirrorNode {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    pub role: String,
    /// Ids of child nodes, in remote order. Every id resolves in the owning
    /// [`Mirror`] except transiently inside a reconciliation pass.
    pub children: Vec<NodeId>,
    /// The remote snapshot this node was built from. Lookup only.
    pub raw: Arc<RemoteNode>,
}

impl MirrorNode {
    /// Build a node from a remote snapshot. Child links are established
    /// separately, once the surrounding batch is in the map.
    pub fn from_remote(raw: Arc<RemoteNode>) -> Self {
        MirrorNode {
            id: raw.id.clone(),
            parent_id: raw.parent_id.clone(),
            role: raw.role.clone(),
            children: Vec::new(),
            raw,
        }
    }
}

/// The mirror: id → node map plus the designated root.
#[derive(Debug, Clone, Default)]
pub struct Mirror {
    nodes: HashMap<NodeId, MirrorNode>,
    root: Option<NodeId>,
}

impl Mirror {
    pub fn new() -> Self {
        Mirror::default()
    }

    /// Build a mirror from a finite batch of remote snapshots.
    ///
    /// Two phases, like the incremental path: insert every node first, then
    /// resolve child links. A child id with no corresponding node in the
    /// batch is skipped (the remote side omits subtrees of ignored nodes).
    pub fn build(nodes: impl IntoIterator<Item = Arc<RemoteNode>>, root: NodeId) -> Self {
        let mut mirror = Mirror::new();
        let raws: Vec<Arc<RemoteNode>> = nodes.into_iter().collect();
        for raw in &raws {
            mirror.insert(MirrorNode::from_remote(Arc::clone(raw)));
        }
        for raw in &raws {
            let Some(child_ids) = &raw.child_ids else {
                continue;
            };
            let children: Vec<NodeId> = child_ids
                .iter()
                .filter(|id| mirror.nodes.contains_key(*id))
                .cloned()
                .collect();
            if let Some(node) = mirror.nodes.get_mut(&raw.id) {
                node.children = children;
            }
        }
        mirror.root = Some(root);
        mirror
    }

    pub fn node(&self, id: &NodeId) -> Option<&MirrorNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn root_id(&self) -> Option<&NodeId> {
        self.root.as_ref()
    }

    pub fn root_node(&self) -> Option<&MirrorNode> {
        self.root.as_ref().and_then(|id| self.nodes.get(id))
    }

    /// Resolved children of a node, in order. Ids that do not resolve are
    /// skipped; outside a reconciliation pass there are none.
    pub fn children_of<'a>(&'a self, node: &'a MirrorNode) -> impl Iterator<Item = &'a MirrorNode> {
        node.children.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn insert(&mut self, node: MirrorNode) -> Option<MirrorNode> {
        self.nodes.insert(node.id.clone(), node)
    }

    pub(crate) fn remove(&mut self, id: &NodeId) -> Option<MirrorNode> {
        self.nodes.remove(id)
    }

    pub(crate) fn node_mut(&mut self, id: &NodeId) -> Option<&mut MirrorNode> {
        self.nodes.get_mut(id)
    }

    pub(crate) fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }
}
