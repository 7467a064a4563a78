//! Shared fixtures for the tree unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::json;
use tokio::sync::Notify;

use crate::protocol::{NodeId, RemoteNode, Transport, TransportError, TreeEvent};

pub(crate) fn remote(
    id: &str,
    role: &str,
    parent: Option<&str>,
    children: Option<&[&str]>,
) -> Arc<RemoteNode> {
    let mut v = json!({ "id": id, "role": role });
    if let Some(p) = parent {
        v["parentId"] = json!(p);
    }
    if let Some(c) = children {
        v["childIds"] = json!(c);
    }
    Arc::new(serde_json::from_value(v).unwrap())
}

pub(crate) fn remote_ignored(
    id: &str,
    role: &str,
    parent: Option<&str>,
    children: Option<&[&str]>,
) -> Arc<RemoteNode> {
    let mut node = (*remote(id, role, parent, children)).clone();
    node.ignored = true;
    Arc::new(node)
}

/// Scripted transport: a fixed root, a fixed children table, and a call log.
pub(crate) struct StubTransport {
    root: RemoteNode,
    children: HashMap<NodeId, Vec<RemoteNode>>,
    /// Every parent id passed to `fetch_children`, in call order.
    pub calls: Mutex<Vec<NodeId>>,
    /// When set, `fetch_children` for this parent parks until notified.
    pub block_on: Option<(NodeId, Arc<Notify>)>,
    /// When set, `fetch_children` for this parent fails.
    pub fail_on: Option<NodeId>,
}

impl StubTransport {
    pub(crate) fn new(
        root: Arc<RemoteNode>,
        children: impl IntoIterator<Item = (Arc<RemoteNode>, Vec<Arc<RemoteNode>>)>,
    ) -> Self {
        StubTransport {
            root: (*root).clone(),
            children: children
                .into_iter()
                .map(|(parent, kids)| {
                    (
                        parent.id.clone(),
                        kids.into_iter().map(|k| (*k).clone()).collect(),
                    )
                })
                .collect(),
            calls: Mutex::new(Vec::new()),
            block_on: None,
            fail_on: None,
        }
    }

    pub(crate) fn calls(&self) -> Vec<NodeId> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn fetch_root(&self) -> Result<RemoteNode, TransportError> {
        Ok(self.root.clone())
    }

    async fn fetch_children(&self, parent: &NodeId) -> Result<Vec<RemoteNode>, TransportError> {
        self.calls.lock().unwrap().push(parent.clone());
        if let Some((blocked, notify)) = &self.block_on {
            if blocked == parent {
                notify.notified().await;
            }
        }
        if self.fail_on.as_ref() == Some(parent) {
            return Err(TransportError::Command(format!(
                "target navigated while fetching {parent}"
            )));
        }
        Ok(self.children.get(parent).cloned().unwrap_or_default())
    }

    fn subscribe(&self) -> BoxStream<'static, TreeEvent> {
        Box::pin(futures::stream::pending())
    }
}
