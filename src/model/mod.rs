//! The lazy tree engine.
//!
//! [`FileSystemModel`] owns the node arena and the job registry, drives lazy
//! directory expansion through an attached [`SftpChannel`], merges listing
//! results into sorted child lists and maps between [`TreeIndex`] coordinates
//! and nodes.
//!
//! The model is single-threaded by contract: every tree mutation happens from
//! the one logical context that delivers the channel's completion callbacks.
//! Only the transfer entry points ([`FileSystemModel::download_file`] and
//! friends) may be invoked from elsewhere, which is why their bookkeeping is
//! the sole piece behind a lock.

pub(crate) mod node;

use std::path::Path;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::channel::{JobId, OverwritePolicy, SftpChannel};
use crate::error::Error;
use crate::events::ModelEvent;
use crate::filter::NameFilter;
use crate::info::{FileInfo, FileType};
use crate::jobs::{JobKind, JobRegistry};
use node::{ListState, Node, NodeArena, NodeId, NodeKind};

/// Column carrying the entry name.
pub const NAME_COLUMN: usize = 0;
/// Column carrying the entry size in bytes.
pub const SIZE_COLUMN: usize = 1;

const COLUMN_COUNT: usize = 2;

/// Coordinate of one node: its row within the parent's sorted children plus
/// a column. Valid only relative to its parent coordinate and only until the
/// next reset or refresh of the addressed branch; the root occupies row 0 of
/// the sentinel top level (`parent == None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeIndex {
    row: usize,
    column: usize,
    node: NodeId,
}

impl TreeIndex {
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

/// Read-only lazy tree over a remote file system.
///
/// Construction gives an empty model rooted at `/`. The caller attaches a
/// channel, routes the channel's completions into the `handle_*` methods and
/// consumes notifications from [`subscribe`](Self::subscribe). Symbolic links
/// are not followed.
pub struct FileSystemModel {
    channel: Option<Box<dyn SftpChannel>>,
    root_directory: String,
    root: Option<NodeId>,
    arena: NodeArena,
    /// The single outstanding root stat, if any.
    stat_job: Option<JobId>,
    registry: JobRegistry,
    filter: NameFilter,
    events: Option<UnboundedSender<ModelEvent>>,
}

impl Default for FileSystemModel {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystemModel {
    pub fn new() -> Self {
        Self {
            channel: None,
            root_directory: "/".to_owned(),
            root: None,
            arena: NodeArena::default(),
            stat_job: None,
            registry: JobRegistry::default(),
            filter: NameFilter::default(),
            events: None,
        }
    }

    /// Installs the event sink, replacing any previous one.
    pub fn subscribe(&mut self) -> UnboundedReceiver<ModelEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    /// Injects the session layer. The caller keeps driving that channel's
    /// lifecycle and forwards its events here, starting with
    /// [`handle_channel_initialized`](Self::handle_channel_initialized).
    pub fn attach_channel(&mut self, channel: Box<dyn SftpChannel>) {
        self.channel = Some(channel);
    }

    pub fn root_directory(&self) -> &str {
        &self.root_directory
    }

    /// Resets the whole model and stats the new root path. Queuing the stat
    /// is silently skipped while no channel is attached.
    ///
    /// Observers must not read node data between the emitted
    /// [`ModelEvent::ResetBegin`] and [`ModelEvent::ResetEnd`].
    pub fn set_root_directory<P: Into<String>>(&mut self, path: P) {
        self.emit(ModelEvent::ResetBegin);
        self.drop_tree();
        self.root_directory = path.into();
        self.emit(ModelEvent::ResetEnd);
        self.stat_root_directory();
    }

    /// Drops the channel and every piece of model state.
    pub fn shutdown(&mut self) {
        self.channel = None;
        self.root = None;
        self.stat_job = None;
        self.arena.clear();
        self.registry.clear();
    }

    // --- coordinates ---------------------------------------------------

    pub fn column_count() -> usize {
        COLUMN_COUNT
    }

    pub fn header(column: usize) -> Option<&'static str> {
        match column {
            NAME_COLUMN => Some("File Name"),
            SIZE_COLUMN => Some("File Size"),
            _ => None,
        }
    }

    /// Coordinate of the child at `row` under `parent`, or of the root when
    /// `parent` is `None`.
    pub fn index(&self, row: usize, column: usize, parent: Option<TreeIndex>) -> Option<TreeIndex> {
        if column >= COLUMN_COUNT {
            return None;
        }
        let root = self.root?;
        match parent {
            None => (row == 0).then_some(TreeIndex { row, column, node: root }),
            Some(parent) => {
                let node = *self.arena.get(parent.node)?.children().get(row)?;
                Some(TreeIndex { row, column, node })
            }
        }
    }

    /// Coordinate of the parent directory; `None` for the root itself.
    pub fn parent_index(&self, child: TreeIndex) -> Option<TreeIndex> {
        let parent = self.arena.get(child.node)?.parent?;
        let row = self.arena.row_of(parent)?;
        Some(TreeIndex {
            row,
            column: 0,
            node: parent,
        })
    }

    /// Number of children under `parent` (top level holds just the root).
    ///
    /// Not purely observational: this is the sole trigger for lazy
    /// population. The first query on a never-listed directory issues one
    /// listing job and returns 0; the children arrive later through
    /// [`handle_file_info`](Self::handle_file_info). Queries while the
    /// listing runs issue nothing further.
    pub fn row_count(&mut self, parent: Option<TreeIndex>) -> usize {
        if self.root.is_none() {
            return 0;
        }
        let Some(parent) = parent else {
            return 1;
        };
        if parent.column != 0 {
            return 0;
        }
        let Some(node) = self.arena.get(parent.node) else {
            return 0;
        };
        let NodeKind::Dir {
            list_state,
            children,
        } = &node.kind
        else {
            return 0;
        };
        if *list_state != ListState::NotListed {
            return children.len();
        }

        let path = node.path.clone();
        if let Some(job) = self.issue_listing(&path) {
            self.registry.register_listing(job, parent.node);
            if let Some(node) = self.arena.get_mut(parent.node) {
                node.set_list_state(ListState::Listing);
            }
        }
        0
    }

    // --- per-index accessors -------------------------------------------

    pub fn file_info(&self, index: TreeIndex) -> Option<&FileInfo> {
        self.arena.get(index.node).map(|node| &node.info)
    }

    pub fn name(&self, index: TreeIndex) -> Option<&str> {
        self.file_info(index).map(|info| info.name.as_str())
    }

    pub fn size(&self, index: TreeIndex) -> Option<u64> {
        self.file_info(index).map(|info| info.size)
    }

    /// Absolute remote path of the addressed node, so callers need not walk
    /// the tree themselves.
    pub fn path_of(&self, index: TreeIndex) -> Option<&str> {
        self.arena.get(index.node).map(|node| node.path.as_str())
    }

    /// Display value for the index's column: name or formatted size.
    pub fn display(&self, index: TreeIndex) -> Option<String> {
        let info = self.file_info(index)?;
        match index.column {
            NAME_COLUMN => Some(info.name.clone()),
            SIZE_COLUMN => Some(info.size.to_string()),
            _ => None,
        }
    }

    /// Whether the addressed entry passes the active name filters and is
    /// therefore selectable. Filtered-out files stay visible in the tree.
    pub fn is_enabled(&self, index: TreeIndex) -> bool {
        self.arena
            .get(index.node)
            .is_some_and(|node| self.filter.matches(&node.info))
    }

    // --- mutation triggers ---------------------------------------------

    /// Replaces the active name filters. Tree shape is untouched; only the
    /// [`is_enabled`](Self::is_enabled) verdict changes.
    pub fn set_name_filters(&mut self, patterns: Vec<String>) {
        self.filter = NameFilter::new(patterns);
        self.emit(ModelEvent::LayoutChanged);
    }

    /// Discards the children of the addressed directory and lists it again.
    /// A file index resolves to its parent directory; `None` targets the
    /// root. Listings already in flight against the discarded branch are
    /// invalidated, not cancelled: their completions are dropped by id.
    pub fn refresh(&mut self, index: Option<TreeIndex>) {
        let Some(root) = self.root else {
            return;
        };
        let target = match index {
            None => root,
            Some(index) => match self.arena.get(index.node) {
                Some(node) if node.is_dir() => index.node,
                Some(node) => node.parent.unwrap_or(root),
                None => return,
            },
        };

        let mut destroyed = self.arena.remove_children(target);
        destroyed.insert(target);
        self.registry.mark_stale_for_nodes(&destroyed);

        let Some(node) = self.arena.get_mut(target) else {
            return;
        };
        node.set_list_state(ListState::NotListed);
        let path = node.path.clone();

        if let Some(job) = self.issue_listing(&path) {
            self.registry.register_listing(job, target);
            if let Some(node) = self.arena.get_mut(target) {
                node.set_list_state(ListState::Listing);
            }
        }
    }

    /// Queues a download of the addressed file to a local destination,
    /// overwriting an existing target. Returns the job id whose completion
    /// will arrive as [`ModelEvent::OperationFinished`].
    pub fn download_file(&self, index: TreeIndex, destination: &Path) -> Result<JobId, Error> {
        let channel = self.channel.as_ref().ok_or(Error::NotConnected)?;
        self.root.ok_or(Error::NoRootNode)?;
        let node = self.arena.get(index.node).ok_or(Error::StaleIndex)?;
        let job = channel.download_file(&node.path, destination, OverwritePolicy::Overwrite);
        self.registry.register_external(job);
        Ok(job)
    }

    /// Queues an upload of a local file to a remote destination path.
    pub fn upload_file(&self, source: &Path, destination: &str) -> Result<JobId, Error> {
        let channel = self.channel.as_ref().ok_or(Error::NotConnected)?;
        self.root.ok_or(Error::NoRootNode)?;
        let job = channel.upload_file(source, destination, OverwritePolicy::Overwrite);
        self.registry.register_external(job);
        Ok(job)
    }

    /// Queues removal of the addressed remote file.
    pub fn remove_file(&self, index: TreeIndex) -> Result<JobId, Error> {
        let channel = self.channel.as_ref().ok_or(Error::NotConnected)?;
        self.root.ok_or(Error::NoRootNode)?;
        let node = self.arena.get(index.node).ok_or(Error::StaleIndex)?;
        let job = channel.remove_file(&node.path);
        self.registry.register_external(job);
        Ok(job)
    }

    // --- completion callbacks ------------------------------------------

    /// Data completion of a stat or listing job.
    ///
    /// A root-stat match constructs the root node; a listing match merges
    /// child nodes into the owning directory in sorted order and announces
    /// one coarse [`ModelEvent::LayoutChanged`]. Completions whose id
    /// matches no live owner mutate nothing.
    pub fn handle_file_info(&mut self, job: JobId, file_info_list: Vec<FileInfo>) {
        if self.stat_job == Some(job) {
            self.build_root(file_info_list);
            return;
        }

        match self.registry.resolve(job) {
            JobKind::Listing(parent) => self.merge_listing(parent, file_info_list),
            JobKind::Stale => debug!("dropping results of invalidated job {job}"),
            JobKind::External => warn!("unexpected file info payload for transfer job {job}"),
            JobKind::Unknown => warn!("file info for unknown job {job} ignored"),
        }
    }

    /// Terminal completion that fires exactly once for every job. Success
    /// iff `error` is `None`.
    pub fn handle_job_finished(&mut self, job: JobId, error: Option<String>) {
        if self.stat_job == Some(job) {
            self.stat_job = None;
            if let Some(message) = &error {
                self.emit(ModelEvent::OperationFailed(format!(
                    "error getting 'stat' info about '{}': {message}",
                    self.root_directory
                )));
            }
            self.emit(ModelEvent::OperationFinished { job, error });
            return;
        }

        if let Some(owner) = self.registry.retire_listing(job) {
            let path = self.arena.get_mut(owner).map(|node| {
                debug_assert_eq!(node.list_state(), Some(ListState::Listing));
                node.set_list_state(ListState::Listed);
                node.path.clone()
            });
            if let (Some(message), Some(path)) = (&error, path) {
                self.emit(ModelEvent::OperationFailed(format!(
                    "error listing contents of directory '{path}': {message}"
                )));
            }
            self.emit(ModelEvent::OperationFinished { job, error });
            return;
        }

        if self.registry.retire_stale(job) {
            debug!("invalidated job {job} finished");
            return;
        }

        if self.registry.retire_external(job) {
            self.emit(ModelEvent::OperationFinished { job, error });
            return;
        }

        // Bookkeeping bug on one side of the boundary; nothing sane to do.
        error!("finished job {job} matches no outstanding request");
    }

    /// The session reached the connected state.
    pub fn handle_connection_established(&mut self) {
        self.emit(ModelEvent::ConnectionSuccess);
    }

    /// The channel is ready for requests; stats the configured root.
    pub fn handle_channel_initialized(&mut self) {
        self.stat_root_directory();
    }

    /// Session-level failure. Not recoverable: the model collapses to empty
    /// and must be rebuilt through a fresh channel.
    pub fn handle_connection_error(&mut self, message: &str) {
        self.fail_unrecoverable(message);
    }

    /// The channel could not be initialized. Same severity as a connection
    /// failure.
    pub fn handle_channel_init_failed(&mut self, message: &str) {
        self.fail_unrecoverable(message);
    }

    pub fn handle_transfer_progress(&mut self, current: u64, total: u64) {
        self.emit(ModelEvent::TransferProgress { current, total });
    }

    // --- internals ------------------------------------------------------

    fn emit(&self, event: ModelEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    fn issue_listing(&self, path: &str) -> Option<JobId> {
        self.channel
            .as_ref()
            .map(|channel| channel.list_directory(path))
    }

    fn stat_root_directory(&mut self) {
        if let Some(channel) = &self.channel {
            self.stat_job = Some(channel.stat_file(&self.root_directory));
        }
    }

    /// Tears down the node tree while the channel stays attached. Jobs still
    /// in flight are tombstoned so their completions resolve as stale.
    fn drop_tree(&mut self) {
        self.root = None;
        self.arena.clear();
        self.registry.mark_all_stale();
        if let Some(job) = self.stat_job.take() {
            self.registry.mark_stale(job);
        }
    }

    fn fail_unrecoverable(&mut self, message: &str) {
        self.emit(ModelEvent::ConnectionError(message.to_owned()));
        self.emit(ModelEvent::ResetBegin);
        self.shutdown();
        self.emit(ModelEvent::ResetEnd);
    }

    fn build_root(&mut self, file_info_list: Vec<FileInfo>) {
        if self.root.is_some() {
            debug!("duplicate root stat completion ignored");
            return;
        }
        let Some(mut info) = file_info_list.into_iter().next() else {
            warn!("root stat for '{}' carried no entry", self.root_directory);
            return;
        };

        info.name = root_display_name(&self.root_directory);
        let kind = match info.file_type {
            FileType::Directory => NodeKind::dir(),
            _ => NodeKind::File,
        };
        let root = self.arena.alloc(Node {
            path: self.root_directory.clone(),
            info,
            parent: None,
            kind,
        });
        self.root = Some(root);
        self.emit(ModelEvent::LayoutChanged);
    }

    fn merge_listing(&mut self, parent: NodeId, file_info_list: Vec<FileInfo>) {
        let Some(parent_path) = self.arena.get(parent).map(|node| node.path.clone()) else {
            return;
        };

        let mut inserted = false;
        for info in file_info_list {
            if info.name == "." || info.name == ".." {
                continue;
            }
            let kind = match info.file_type {
                FileType::Directory => NodeKind::dir(),
                _ => NodeKind::File,
            };
            let child = Node {
                path: join_path(&parent_path, &info.name),
                info,
                parent: Some(parent),
                kind,
            };
            inserted |= self.arena.insert_child_sorted(parent, child).is_some();
        }

        // A view may already have seen a zero child count for this branch,
        // so a coarse layout change is the only reliable announcement.
        if inserted {
            self.emit(ModelEvent::LayoutChanged);
        }
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

fn root_display_name(path: &str) -> String {
    if path == "/" {
        return path.to_owned();
    }
    let trimmed = path.trim_end_matches('/');
    trimmed
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(trimmed)
        .to_owned()
}
