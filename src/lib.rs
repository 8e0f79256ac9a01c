//! Presents a remote file system, reached through an SFTP-style session, as a
//! lazily materialized tree. Directories are listed on first expansion only;
//! listing and stat requests run as asynchronous jobs on an injected
//! [`SftpChannel`] and their completions are correlated back to the owning
//! node by job id. Consumers address nodes through stable
//! [`TreeIndex`](model::TreeIndex) coordinates and observe structural changes
//! through a typed [`ModelEvent`](events::ModelEvent) stream.
//!
//! The engine performs no network I/O itself and never blocks: all tree
//! mutation is driven by completion callbacks delivered from a single logical
//! context. See [`FileSystemModel`](model::FileSystemModel) for the contract.

#[macro_use]
extern crate log;

pub mod channel;
mod error;
pub mod events;
pub mod filter;
mod info;
mod jobs;
pub mod model;

pub use channel::{JobId, OverwritePolicy, SftpChannel};
pub use error::Error;
pub use events::ModelEvent;
pub use filter::NameFilter;
pub use info::{FileInfo, FileType};
pub use model::{FileSystemModel, TreeIndex};
