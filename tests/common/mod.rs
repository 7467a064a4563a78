//! Shared fixtures for the integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Notify;
use tokio_stream::wrappers::UnboundedReceiverStream;

use axterm::protocol::{NodeId, RemoteNode, Transport, TransportError, TreeEvent};

/// Initialize the global tracing subscriber once (honours `RUST_LOG`).
#[allow(dead_code)]
pub fn init_tracing_from_env() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stdout)
            .try_init();
    });
}

pub fn node(v: serde_json::Value) -> RemoteNode {
    serde_json::from_value(v).expect("valid node json")
}

/// A scripted remote page: a flat node list the transport serves from, plus
/// an event channel the test drives.
pub struct MockTransport {
    page: Mutex<Page>,
    events_tx: UnboundedSender<TreeEvent>,
    events_rx: Mutex<Option<UnboundedReceiver<TreeEvent>>>,
    /// When set, `fetch_children` for this parent parks until notified.
    pub gate: Mutex<Option<(NodeId, Arc<Notify>)>>,
    /// When set, the next `fetch_children` for this parent fails once.
    pub fail_children_once: Mutex<Option<NodeId>>,
}

struct Page {
    root: RemoteNode,
    children: HashMap<NodeId, Vec<RemoteNode>>,
}

impl Page {
    /// Index a flat node list by parent, keeping each parent's child order.
    fn from_nodes(nodes: Vec<RemoteNode>) -> Page {
        let root = nodes
            .iter()
            .find(|n| n.parent_id.is_none())
            .expect("page has a root")
            .clone();
        let by_id: HashMap<NodeId, RemoteNode> =
            nodes.into_iter().map(|n| (n.id.clone(), n)).collect();
        let mut children = HashMap::new();
        for parent in by_id.values() {
            let Some(child_ids) = &parent.child_ids else {
                continue;
            };
            let kids: Vec<RemoteNode> = child_ids
                .iter()
                .filter_map(|id| by_id.get(id).cloned())
                .collect();
            children.insert(parent.id.clone(), kids);
        }
        Page { root, children }
    }
}

impl MockTransport {
    pub fn new(nodes: Vec<RemoteNode>) -> Arc<MockTransport> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(MockTransport {
            page: Mutex::new(Page::from_nodes(nodes)),
            events_tx: tx,
            events_rx: Mutex::new(Some(rx)),
            gate: Mutex::new(None),
            fail_children_once: Mutex::new(None),
        })
    }

    /// Deliver an incremental patch batch.
    pub fn patch(&self, nodes: Vec<RemoteNode>) {
        // Patched nodes also update what fetches will see.
        {
            let mut page = self.page.lock().unwrap();
            for n in &nodes {
                if let Some(parent_id) = &n.parent_id {
                    if let Some(kids) = page.children.get_mut(parent_id) {
                        for kid in kids.iter_mut() {
                            if kid.id == n.id {
                                *kid = n.clone();
                            }
                        }
                    }
                }
            }
        }
        let _ = self.events_tx.send(TreeEvent::NodesUpdated(nodes));
    }

    /// Replace the page the transport serves, without any events.
    pub fn set_page(&self, nodes: Vec<RemoteNode>) {
        *self.page.lock().unwrap() = Page::from_nodes(nodes);
    }

    /// Simulate a navigation: signal the load, swap the page, signal
    /// completion.
    pub fn navigate(&self, nodes: Vec<RemoteNode>) {
        let _ = self.events_tx.send(TreeEvent::DocumentAboutToLoad);
        self.set_page(nodes);
        let _ = self.events_tx.send(TreeEvent::DocumentLoaded);
    }

    pub fn send(&self, event: TreeEvent) {
        let _ = self.events_tx.send(event);
    }

    pub fn block_children_of(&self, parent: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some((NodeId::from(parent), Arc::clone(&notify)));
        notify
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch_root(&self) -> Result<RemoteNode, TransportError> {
        Ok(self.page.lock().unwrap().root.clone())
    }

    async fn fetch_children(&self, parent: &NodeId) -> Result<Vec<RemoteNode>, TransportError> {
        let gate = self.gate.lock().unwrap().clone();
        if let Some((blocked, notify)) = gate {
            if &blocked == parent {
                notify.notified().await;
            }
        }
        let fail = {
            let mut pending = self.fail_children_once.lock().unwrap();
            if pending.as_ref() == Some(parent) {
                pending.take();
                true
            } else {
                false
            }
        };
        if fail {
            return Err(TransportError::Command(format!(
                "target navigated while fetching children of {parent}"
            )));
        }
        Ok(self
            .page
            .lock()
            .unwrap()
            .children
            .get(parent)
            .cloned()
            .unwrap_or_default())
    }

    fn subscribe(&self) -> BoxStream<'static, TreeEvent> {
        match self.events_rx.lock().unwrap().take() {
            Some(rx) => UnboundedReceiverStream::new(rx).boxed(),
            None => futures::stream::pending().boxed(),
        }
    }
}

/// A small but representative page: heading, paragraph with a link, list.
#[allow(dead_code)]
pub fn sample_page() -> Vec<RemoteNode> {
    vec![
        node(serde_json::json!({
            "id": "root", "role": "RootWebArea", "name": "Example",
            "childIds": ["h", "p", "l"]
        })),
        node(serde_json::json!({
            "id": "h", "role": "heading", "parentId": "root", "name": "Example",
            "childIds": ["ht"],
            "properties": [{"name": "level", "value": 1}]
        })),
        node(serde_json::json!({
            "id": "ht", "role": "StaticText", "parentId": "h", "name": "Example"
        })),
        node(serde_json::json!({
            "id": "p", "role": "paragraph", "parentId": "root", "childIds": ["pt", "a"]
        })),
        node(serde_json::json!({
            "id": "pt", "role": "StaticText", "parentId": "p", "name": "Read the"
        })),
        node(serde_json::json!({
            "id": "a", "role": "link", "parentId": "p", "name": "docs", "childIds": ["at"]
        })),
        node(serde_json::json!({
            "id": "at", "role": "StaticText", "parentId": "a", "name": "docs"
        })),
        node(serde_json::json!({
            "id": "l", "role": "list", "parentId": "root", "childIds": ["i1", "i2"]
        })),
        node(serde_json::json!({
            "id": "i1", "role": "listitem", "parentId": "l", "childIds": ["t1"]
        })),
        node(serde_json::json!({
            "id": "t1", "role": "StaticText", "parentId": "i1", "name": "one"
        })),
        node(serde_json::json!({
            "id": "i2", "role": "listitem", "parentId": "l", "childIds": ["t2"]
        })),
        node(serde_json::json!({
            "id": "t2", "role": "StaticText", "parentId": "i2", "name": "two"
        })),
    ]
}
