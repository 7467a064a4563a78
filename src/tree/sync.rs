//! Sync engine state machine.
//!
//! Pure transitions: `(state, input) -> (state, actions)`. The driver in
//! `tree::mod` owns the side effects (starting operations, cancelling the
//! in-flight token, timers, notifications), which keeps every transition
//! testable without a transport.

/// Engine state. At most one mirror operation is ever in flight; the
/// `Reconstructing` state doubles as the busy marker while a patch batch is
/// being reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Reconstructing,
    /// The remote document is being replaced; incremental updates are
    /// meaningless until it finishes loading.
    DocumentLoading,
}

/// How the in-flight operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpOutcome {
    Success,
    /// Cancelled via its token. Not an error; discarded silently.
    Cancelled,
    /// Transport/protocol failure (e.g. the page navigated mid-fetch).
    Recoverable,
    /// Mirror invariant violation; the mirror stays at its last consistent
    /// state.
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SyncInput {
    /// A full reconstruct was requested (initialization or debounce expiry).
    ReconstructRequested,
    /// An incremental patch batch arrived.
    PatchReceived,
    DocumentAboutToLoad,
    DocumentLoaded,
    OpFinished(OpOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SyncAction {
    /// Cancel the in-flight operation's token before anything else.
    CancelInflight,
    BeginReconstruct,
    /// Reconcile the patch batch that triggered this transition.
    BeginReconcile,
    /// Hold the patch batch until the engine is idle again.
    QueuePatch,
    /// Discard the patch batch.
    DropPatch,
    /// Arm the debounced-reconstruct timer.
    ScheduleReconstruct,
    NotifyChanged,
    NotifyError,
}

pub(crate) fn step(state: SyncState, input: SyncInput) -> (SyncState, Vec<SyncAction>) {
    use SyncAction::*;
    use SyncInput::*;
    use SyncState::*;

    match (state, input) {
        (Idle, ReconstructRequested) => (Reconstructing, vec![BeginReconstruct]),
        (Idle, PatchReceived) => (Reconstructing, vec![BeginReconcile]),
        (Idle, DocumentAboutToLoad) => (DocumentLoading, vec![]),
        // A load that finished without a preceding "about to load" still
        // means the document was replaced under us.
        (Idle, DocumentLoaded) => (Reconstructing, vec![BeginReconstruct]),
        (Idle, OpFinished(_)) => (Idle, vec![]),

        // Last writer wins; never two reconstructions at once.
        (Reconstructing, ReconstructRequested) => {
            (Reconstructing, vec![CancelInflight, BeginReconstruct])
        }
        (Reconstructing, PatchReceived) => (Reconstructing, vec![QueuePatch]),
        (Reconstructing, DocumentAboutToLoad) => (DocumentLoading, vec![CancelInflight]),
        (Reconstructing, DocumentLoaded) => {
            (Reconstructing, vec![CancelInflight, BeginReconstruct])
        }
        (Reconstructing, OpFinished(OpOutcome::Success)) => (Idle, vec![NotifyChanged]),
        (Reconstructing, OpFinished(OpOutcome::Cancelled)) => (Idle, vec![]),
        (Reconstructing, OpFinished(OpOutcome::Recoverable)) => (Idle, vec![ScheduleReconstruct]),
        (Reconstructing, OpFinished(OpOutcome::Fatal)) => (Idle, vec![NotifyError]),

        (DocumentLoading, PatchReceived) => (DocumentLoading, vec![DropPatch]),
        // A reload is imminent; the loaded event will reconstruct anyway.
        (DocumentLoading, ReconstructRequested) => (DocumentLoading, vec![]),
        (DocumentLoading, DocumentAboutToLoad) => (DocumentLoading, vec![]),
        (DocumentLoading, DocumentLoaded) => (Reconstructing, vec![BeginReconstruct]),
        // Completion of an operation that was cancelled when loading began.
        (DocumentLoading, OpFinished(_)) => (DocumentLoading, vec![]),
    }
}
