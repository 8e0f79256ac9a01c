//! Typed notifications emitted by the model.

use serde::{Deserialize, Serialize};

use crate::channel::JobId;

/// One notification from the model to its presentation layer.
///
/// Structural changes follow the two-phase reset discipline: between
/// [`ResetBegin`](ModelEvent::ResetBegin) and
/// [`ResetEnd`](ModelEvent::ResetEnd) no node data may be read. Child merges
/// and filter changes are announced with a single coarse
/// [`LayoutChanged`](ModelEvent::LayoutChanged) because the consumer may have
/// observed a zero child count before the listing completed, which makes
/// fine-grained insert notifications unreliable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelEvent {
    ResetBegin,
    ResetEnd,
    LayoutChanged,
    /// A stat or listing job failed. This can fire without direct user
    /// intervention, e.g. when expanding a non-readable directory, so it
    /// should be reported unobtrusively.
    OperationFailed(String),
    /// Terminal completion of a job. Success iff `error` is `None`.
    OperationFinished { job: JobId, error: Option<String> },
    ConnectionSuccess,
    /// Not recoverable: the model is empty once this has been emitted and
    /// must be rebuilt through a fresh channel.
    ConnectionError(String),
    TransferProgress { current: u64, total: u64 },
}
