use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a remote entry as reported by the session layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    Regular,
    Directory,
    Symlink,
    Other,
    #[default]
    Unknown,
}

impl FileType {
    /// Returns `true` if is a directory
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory)
    }
}

/// Immutable snapshot of one remote entry's metadata.
///
/// Produced only by the session layer; the model never fabricates one. The
/// `name` is a bare entry name without path separators. Timestamps are unix
/// seconds and may be absent, as on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub file_type: FileType,
    pub size: u64,
    pub permissions: Option<u32>,
    pub atime: Option<u32>,
    pub mtime: Option<u32>,
}

impl FileInfo {
    /// Snapshot with only a name and type, everything else empty.
    pub fn new<N: Into<String>>(name: N, file_type: FileType) -> Self {
        Self {
            name: name.into(),
            file_type,
            size: 0,
            permissions: None,
            atime: None,
            mtime: None,
        }
    }

    /// Returns the last modification time, if the server reported one.
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.mtime.and_then(|t| Utc.timestamp_opt(i64::from(t), 0).single())
    }

    /// Returns the last access time, if the server reported one.
    pub fn accessed(&self) -> Option<DateTime<Utc>> {
        self.atime.and_then(|t| Utc.timestamp_opt(i64::from(t), 0).single())
    }
}
