//! Boundary between the model and the transport/session layer.
//!
//! The model never talks to the network itself. The embedding application
//! attaches an [`SftpChannel`] implementation and routes that channel's
//! completion callbacks into
//! [`FileSystemModel`](crate::model::FileSystemModel)'s `handle_*` methods.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Identifier of one asynchronous job issued on the channel.
///
/// Unique among currently outstanding jobs; the channel may reuse an id once
/// the job's terminal completion has been delivered.
pub type JobId = u32;

/// What to do when a transfer target already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverwritePolicy {
    Overwrite,
    Append,
    Skip,
}

/// Capability set the model requires from the session layer.
///
/// Every method queues an asynchronous job and returns its id immediately;
/// none of them blocks. The implementation must, for every id it hands out,
/// eventually deliver exactly one terminal
/// [`handle_job_finished`](crate::model::FileSystemModel::handle_job_finished),
/// preceded for stat and listing jobs by one
/// [`handle_file_info`](crate::model::FileSystemModel::handle_file_info)
/// carrying the payload. Retries and timeouts are the channel's business; the
/// model only ever sees "completed with data" or "completed with error".
pub trait SftpChannel {
    /// Stats a single remote path.
    fn stat_file(&self, path: &str) -> JobId;

    /// Lists the entries of a remote directory.
    fn list_directory(&self, path: &str) -> JobId;

    /// Copies a remote file to a local destination.
    fn download_file(&self, path: &str, destination: &Path, overwrite: OverwritePolicy) -> JobId;

    /// Copies a local file to a remote destination path.
    fn upload_file(&self, source: &Path, destination: &str, overwrite: OverwritePolicy) -> JobId;

    /// Removes a remote file.
    fn remove_file(&self, path: &str) -> JobId;
}
