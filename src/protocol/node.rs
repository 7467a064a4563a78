use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a node in the remote accessibility tree.
///
/// Opaque to us; the remote side guarantees uniqueness within a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

/// A single named property attached to a remote node (e.g. `level`,
/// `focused`, `multiline`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeProperty {
    pub name: String,
    pub value: Value,
}

/// Snapshot of one node of the remote accessibility tree, as delivered by
/// the transport.
///
/// `child_ids` is `None` when the remote side did not report children at all
/// (distinct from an empty list). Children of an `ignored` node are never
/// reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteNode {
    pub id: NodeId,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    pub role: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ignored: bool,
    #[serde(default)]
    pub child_ids: Option<Vec<NodeId>>,
    #[serde(default)]
    pub properties: Vec<NodeProperty>,
}

impl RemoteNode {
    /// Look up a property value by name.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// Whether this node currently holds input focus.
    pub fn is_focused(&self) -> bool {
        self.property("focused")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Heading level, 0 when absent or malformed.
    pub fn heading_level(&self) -> i64 {
        self.property("level").and_then(Value::as_i64).unwrap_or(0)
    }

    /// Accessible name with surrounding whitespace removed, `None` when
    /// empty.
    pub fn trimmed_name(&self) -> Option<&str> {
        match self.name.as_deref().map(str::trim) {
            Some("") | None => None,
            Some(s) => Some(s),
        }
    }
}
