//! Correlation of outstanding asynchronous jobs with their owners.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::channel::JobId;
use crate::model::node::NodeId;

/// Owner of a completed job, as resolved by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JobKind {
    /// A directory listing; the payload belongs to this node.
    Listing(NodeId),
    /// A caller-initiated download/upload/remove the model does not
    /// interpret beyond reporting its completion.
    External,
    /// Issued against state that has since been refreshed or reset. The
    /// completion is expected but its results must be dropped.
    Stale,
    Unknown,
}

/// Maps in-flight job ids to the tree node or external request owning them.
///
/// An id is registered when the job is issued and removed the instant its
/// terminal completion is processed. Ids are generated by the channel, never
/// here; the channel guarantees them unique among outstanding jobs.
///
/// Only the external set is shared: transfer requests may be issued from a
/// different calling context than the completion callbacks, so their
/// bookkeeping sits behind a mutex. Listings are touched exclusively from
/// the single callback-driven context.
#[derive(Debug, Default)]
pub(crate) struct JobRegistry {
    listings: HashMap<JobId, NodeId>,
    stale: HashSet<JobId>,
    external: Mutex<HashSet<JobId>>,
}

impl JobRegistry {
    pub fn register_listing(&mut self, job: JobId, node: NodeId) {
        let previous = self.listings.insert(job, node);
        debug_assert!(previous.is_none(), "job id {job} registered twice");
    }

    pub fn register_external(&self, job: JobId) {
        if let Ok(mut external) = self.external.lock() {
            external.insert(job);
        }
    }

    pub fn resolve(&self, job: JobId) -> JobKind {
        if let Some(node) = self.listings.get(&job) {
            return JobKind::Listing(*node);
        }
        if self.stale.contains(&job) {
            return JobKind::Stale;
        }
        let is_external = self
            .external
            .lock()
            .map(|external| external.contains(&job))
            .unwrap_or(false);
        if is_external {
            return JobKind::External;
        }
        JobKind::Unknown
    }

    /// Removes a live listing entry, returning its owner.
    pub fn retire_listing(&mut self, job: JobId) -> Option<NodeId> {
        self.listings.remove(&job)
    }

    pub fn retire_external(&self, job: JobId) -> bool {
        self.external
            .lock()
            .map(|mut external| external.remove(&job))
            .unwrap_or(false)
    }

    pub fn retire_stale(&mut self, job: JobId) -> bool {
        self.stale.remove(&job)
    }

    /// Tombstones one job: it is still outstanding on the channel, but its
    /// owner is gone and the eventual completion must be ignored.
    pub fn mark_stale(&mut self, job: JobId) {
        self.stale.insert(job);
    }

    /// Tombstones every listing owned by one of the given nodes. Called when
    /// a subtree is destroyed while its listings are still in flight.
    pub fn mark_stale_for_nodes(&mut self, nodes: &HashSet<NodeId>) {
        let stale_jobs: Vec<JobId> = self
            .listings
            .iter()
            .filter(|(_, node)| nodes.contains(node))
            .map(|(job, _)| *job)
            .collect();
        for job in stale_jobs {
            self.listings.remove(&job);
            self.stale.insert(job);
        }
    }

    /// Tombstones every live listing. Used on a model reset while the
    /// channel itself stays up.
    pub fn mark_all_stale(&mut self) {
        for (job, _) in self.listings.drain() {
            self.stale.insert(job);
        }
    }

    /// Full teardown. Only valid when the channel is gone too, since any
    /// still-outstanding job would afterwards resolve as [`JobKind::Unknown`].
    pub fn clear(&mut self) {
        self.listings.clear();
        self.stale.clear();
        if let Ok(mut external) = self.external.lock() {
            external.clear();
        }
    }
}
