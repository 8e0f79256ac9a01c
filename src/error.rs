use thiserror::Error;

/// Errors returned by the synchronous edge of the model API.
///
/// Failures of jobs already in flight are never returned this way; they
/// arrive as [`ModelEvent`](crate::events::ModelEvent) notifications.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No channel has been attached yet, or it was shut down.
    #[error("no sftp channel attached")]
    NotConnected,
    /// The root stat has not completed, so there is no tree to address.
    #[error("model has no root node")]
    NoRootNode,
    /// The index refers to a node that no longer exists.
    #[error("index does not refer to a live node")]
    StaleIndex,
}
