//! Mirror of the remote accessibility tree and the engine that keeps it
//! synchronized.
//!
//! ```text
//! transport events ──► sync state machine ──► mirror mutation
//!                                                  │
//!                                   "tree changed" notification
//!                                                  ▼
//!                        owning application (UI tree build + render)
//! ```
//!
//! The engine runs one event-loop task. At most one mirror operation (full
//! reconstruct or incremental reconcile) is in flight at any time; the state
//! machine in [`sync`] enforces the mutual exclusion, and cooperative
//! cancellation tokens keep a stale, slow reconstruct from clobbering the
//! mirror after a newer reload began.

pub mod mirror;
pub mod sync;

mod fetch;
#[cfg(test)]
pub(crate) mod testutil;
mod update;

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use futures::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{self, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::protocol::{NodeId, RemoteNode, Transport, TransportError, TreeEvent};

pub use mirror::{Mirror, MirrorNode};
pub use sync::SyncState;

use sync::{OpOutcome, SyncAction, SyncInput};

/// Role of the node that designates the document root.
pub const ROOT_ROLE: &str = "RootWebArea";

/// Delay before a reconstruct triggered by a recoverable protocol error.
/// Repeated failures within the window coalesce into one reconstruct.
pub const RECONSTRUCT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Errors of mirror operations.
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    /// The operation's cancel token fired. Not reported to anyone.
    #[error("aborted")]
    Aborted,
    /// The transport failed; recoverable by reconstructing.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A child id stayed unresolved after reconciliation and supplemental
    /// fetch. Fatal for the pass.
    #[error("child not found: {0}")]
    ChildNotFound(NodeId),
}

pub(crate) fn check_cancel(cancel: &CancellationToken) -> Result<(), SyncError> {
    if cancel.is_cancelled() {
        Err(SyncError::Aborted)
    } else {
        Ok(())
    }
}

/// Notifications delivered to the owning application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNotification {
    /// The mirror changed; rebuild the UI tree and repaint.
    Changed,
    /// An unrecoverable failure; the mirror is stale but consistent.
    Error(String),
}

struct Shared {
    transport: Arc<dyn Transport>,
    mirror: Mutex<Mirror>,
    notify: UnboundedSender<TreeNotification>,
}

/// The synchronized local accessibility tree.
pub struct AccessibilityTree {
    shared: Arc<Shared>,
    loop_cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    notifications: Option<UnboundedReceiver<TreeNotification>>,
}

impl AccessibilityTree {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        AccessibilityTree {
            shared: Arc::new(Shared {
                transport,
                mirror: Mutex::new(Mirror::new()),
                notify: tx,
            }),
            loop_cancel: CancellationToken::new(),
            task: None,
            notifications: Some(rx),
        }
    }

    /// Run the first full reconstruct, then start consuming mutation events.
    pub async fn initialize(&mut self) -> Result<(), SyncError> {
        let cancel = self.loop_cancel.child_token();
        run_reconstruct(Arc::clone(&self.shared), cancel).await?;
        let _ = self.shared.notify.send(TreeNotification::Changed);

        let shared = Arc::clone(&self.shared);
        let loop_cancel = self.loop_cancel.clone();
        self.task = Some(tokio::spawn(run_loop(shared, loop_cancel)));
        Ok(())
    }

    /// Cancel in-flight work and stop listening.
    pub async fn dispose(&mut self) {
        self.loop_cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn current_root(&self) -> Option<MirrorNode> {
        self.shared.mirror.lock().unwrap().root_node().cloned()
    }

    pub fn lookup(&self, id: &NodeId) -> Option<MirrorNode> {
        self.shared.mirror.lock().unwrap().node(id).cloned()
    }

    /// Immutable snapshot of the whole mirror, for the UI tree builder.
    /// Cheap: node snapshots are shared behind `Arc`.
    pub fn snapshot(&self) -> Mirror {
        self.shared.mirror.lock().unwrap().clone()
    }

    /// Take the notification receiver. Yields `Some` once.
    pub fn take_notifications(&mut self) -> Option<UnboundedReceiver<TreeNotification>> {
        self.notifications.take()
    }
}

impl Drop for AccessibilityTree {
    fn drop(&mut self) {
        self.loop_cancel.cancel();
    }
}

/// Full reconstruct: fetch the root and its whole subtree, build a fresh
/// mirror aside, swap it in at the end. Cancellation or failure at any
/// point leaves the previous mirror untouched.
async fn run_reconstruct(shared: Arc<Shared>, cancel: CancellationToken) -> Result<(), SyncError> {
    debug!("reconstruct");
    check_cancel(&cancel)?;
    let root = Arc::new(shared.transport.fetch_root().await?);
    check_cancel(&cancel)?;
    let descendants = fetch::fetch_subtree(shared.transport.as_ref(), &cancel, &root).await?;
    check_cancel(&cancel)?;

    let root_id = root.id.clone();
    let mut nodes = Vec::with_capacity(descendants.len() + 1);
    nodes.push(root);
    nodes.extend(descendants);
    let rebuilt = Mirror::build(nodes, root_id);
    *shared.mirror.lock().unwrap() = rebuilt;
    Ok(())
}

/// Incremental reconcile of one patch batch, then root recomputation when
/// the batch touched the root-role node.
async fn run_reconcile(
    shared: Arc<Shared>,
    cancel: CancellationToken,
    batch: Vec<Arc<RemoteNode>>,
) -> Result<(), SyncError> {
    update::apply_updates(
        shared.transport.as_ref(),
        &cancel,
        &shared.mirror,
        &batch,
    )
    .await?;
    if let Some(root) = batch.iter().find(|n| n.role == ROOT_ROLE) {
        let mut m = shared.mirror.lock().unwrap();
        if m.contains(&root.id) {
            m.set_root(Some(root.id.clone()));
        }
    }
    Ok(())
}

struct Inflight {
    cancel: CancellationToken,
    fut: BoxFuture<'static, Result<(), SyncError>>,
}

fn classify(result: &Result<(), SyncError>) -> (OpOutcome, Option<String>) {
    match result {
        Ok(()) => (OpOutcome::Success, None),
        Err(SyncError::Aborted) => {
            debug!("operation cancelled");
            (OpOutcome::Cancelled, None)
        }
        Err(err @ SyncError::Transport(_)) => {
            warn!(error = %err, "protocol error, scheduling reconstruct");
            (OpOutcome::Recoverable, None)
        }
        Err(err @ SyncError::ChildNotFound(_)) => (OpOutcome::Fatal, Some(err.to_string())),
    }
}

async fn run_loop(shared: Arc<Shared>, loop_cancel: CancellationToken) {
    let mut events = shared.transport.subscribe();
    let mut state = SyncState::Idle;
    let mut inflight: Option<Inflight> = None;
    let mut debounce: Option<Pin<Box<Sleep>>> = None;
    let mut queued: VecDeque<Vec<Arc<RemoteNode>>> = VecDeque::new();
    let mut pending_batch: Option<Vec<Arc<RemoteNode>>> = None;
    let mut last_error: Option<String> = None;

    loop {
        let input = tokio::select! {
            _ = loop_cancel.cancelled() => break,
            result = async { inflight.as_mut().unwrap().fut.as_mut().await },
                if inflight.is_some() =>
            {
                inflight = None;
                let (outcome, error) = classify(&result);
                last_error = error;
                SyncInput::OpFinished(outcome)
            }
            _ = async { debounce.as_mut().unwrap().as_mut().await }, if debounce.is_some() => {
                debounce = None;
                SyncInput::ReconstructRequested
            }
            event = events.next() => match event {
                None => break,
                Some(TreeEvent::NodesUpdated(nodes)) => {
                    pending_batch = Some(nodes.into_iter().map(Arc::new).collect());
                    SyncInput::PatchReceived
                }
                Some(TreeEvent::DocumentAboutToLoad) => {
                    // The reconstruct after loading resupplies everything.
                    queued.clear();
                    SyncInput::DocumentAboutToLoad
                }
                Some(TreeEvent::DocumentLoaded) => SyncInput::DocumentLoaded,
            },
        };

        let mut inputs = vec![input];
        while let Some(input) = inputs.pop() {
            let (next, actions) = sync::step(state, input);
            state = next;
            for action in actions {
                match action {
                    SyncAction::CancelInflight => {
                        if let Some(op) = inflight.take() {
                            op.cancel.cancel();
                        }
                    }
                    SyncAction::BeginReconstruct => {
                        debounce = None;
                        let cancel = loop_cancel.child_token();
                        inflight = Some(Inflight {
                            cancel: cancel.clone(),
                            fut: run_reconstruct(Arc::clone(&shared), cancel).boxed(),
                        });
                    }
                    SyncAction::BeginReconcile => {
                        let batch = pending_batch.take().unwrap_or_default();
                        let cancel = loop_cancel.child_token();
                        inflight = Some(Inflight {
                            cancel: cancel.clone(),
                            fut: run_reconcile(Arc::clone(&shared), cancel, batch).boxed(),
                        });
                    }
                    SyncAction::QueuePatch => {
                        if let Some(batch) = pending_batch.take() {
                            queued.push_back(batch);
                        }
                    }
                    SyncAction::DropPatch => {
                        debug!("dropping patch batch while document loads");
                        pending_batch = None;
                    }
                    SyncAction::ScheduleReconstruct => {
                        debounce = Some(Box::pin(time::sleep(RECONSTRUCT_DEBOUNCE)));
                    }
                    SyncAction::NotifyChanged => {
                        let _ = shared.notify.send(TreeNotification::Changed);
                    }
                    SyncAction::NotifyError => {
                        let message = last_error
                            .take()
                            .unwrap_or_else(|| "mirror inconsistent".to_string());
                        let _ = shared.notify.send(TreeNotification::Error(message));
                    }
                }
            }
            if state == SyncState::Idle && inflight.is_none() {
                if let Some(batch) = queued.pop_front() {
                    pending_batch = Some(batch);
                    inputs.push(SyncInput::PatchReceived);
                }
            }
        }
    }

    if let Some(op) = inflight.take() {
        op.cancel.cancel();
    }
}
