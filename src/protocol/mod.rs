//! Remote protocol interface.
//!
//! The core is a protocol *client*: it issues request/response commands and
//! consumes an ordered event stream, both abstracted behind [`Transport`].
//! The concrete wire format (DevTools protocol over a websocket, a pipe, a
//! test double) lives outside this crate.

pub mod node;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

pub use node::{NodeId, NodeProperty, RemoteNode};

/// Error returned by transport commands.
///
/// Commands routinely fail when the page navigates while a fetch is in
/// flight, so transport errors are recoverable by contract: callers respond
/// by scheduling a full reconstruct, never by tearing anything down.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// A command was rejected or failed on the remote side.
    #[error("command failed: {0}")]
    Command(String),
    /// The connection is gone.
    #[error("transport closed")]
    Closed,
}

/// Push events delivered by the transport, in connection order.
#[derive(Debug, Clone)]
pub enum TreeEvent {
    /// A batch of nodes changed on the remote side.
    NodesUpdated(Vec<RemoteNode>),
    /// The current document is about to be replaced (navigation started).
    DocumentAboutToLoad,
    /// A new document finished loading.
    DocumentLoaded,
}

/// Command/event access to the remote accessibility tree.
///
/// Implementations must deliver events in the order they occurred on the
/// connection; the sync engine relies on that ordering and never reorders.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the root node of the current document.
    async fn fetch_root(&self) -> Result<RemoteNode, TransportError>;

    /// Fetch the immediate children of `parent`.
    ///
    /// The remote side does not expose children of an `ignored` node; this
    /// must not be called for such nodes.
    async fn fetch_children(&self, parent: &NodeId) -> Result<Vec<RemoteNode>, TransportError>;

    /// Subscribe to the live event stream. The stream ends when the
    /// transport shuts down.
    fn subscribe(&self) -> BoxStream<'static, TreeEvent>;
}
