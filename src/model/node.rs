//! Arena-backed node storage for the lazy tree.
//!
//! Nodes are addressed by stable [`NodeId`] handles instead of references, so
//! a child can point back at its parent without ownership cycles. Slots are
//! reused through a free list, and every slot carries a generation that is
//! bumped when its node is destroyed: a handle taken before a refresh or
//! reset can never alias whatever entry later lands in the recycled slot.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::info::FileInfo;

/// Stable handle of one node in the arena: a slot plus the generation the
/// slot had when the node was allocated. Valid only until the node is
/// destroyed; lookups with an outdated generation resolve to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId {
    slot: usize,
    generation: u32,
}

#[cfg(test)]
impl NodeId {
    /// Fabricates a first-generation handle for registry tests that need
    /// distinct ids without an arena.
    pub(crate) fn stub(slot: usize) -> Self {
        Self {
            slot,
            generation: 0,
        }
    }
}

/// Listing lifecycle of a directory node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum ListState {
    #[default]
    NotListed,
    Listing,
    Listed,
}

/// Tag distinguishing files from directories. Only directories carry listing
/// state and children, so "is this a directory" is a tag check.
#[derive(Debug)]
pub(crate) enum NodeKind {
    File,
    Dir {
        list_state: ListState,
        /// Sorted by case-insensitive name, ascending, at all times.
        children: Vec<NodeId>,
    },
}

impl NodeKind {
    pub fn dir() -> Self {
        Self::Dir {
            list_state: ListState::default(),
            children: Vec::new(),
        }
    }
}

/// One remote file system entry.
#[derive(Debug)]
pub(crate) struct Node {
    /// Absolute remote path, computed once at creation.
    pub path: String,
    pub info: FileInfo,
    /// Back-reference for coordinate derivation only; the parent owns the
    /// child through its `children` list, never the other way around.
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Dir { .. })
    }

    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Dir { children, .. } => children,
            NodeKind::File => &[],
        }
    }

    pub fn list_state(&self) -> Option<ListState> {
        match &self.kind {
            NodeKind::Dir { list_state, .. } => Some(*list_state),
            NodeKind::File => None,
        }
    }

    pub fn set_list_state(&mut self, state: ListState) {
        if let NodeKind::Dir { list_state, .. } = &mut self.kind {
            *list_state = state;
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    /// Incremented every time the slot's node is destroyed.
    generation: u32,
    node: Option<Node>,
}

#[derive(Debug, Default)]
pub(crate) struct NodeArena {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl NodeArena {
    pub fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot].node = Some(node);
                NodeId {
                    slot,
                    generation: self.slots[slot].generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    slot: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.slot)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.slot)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Destroys the node in one slot, bumping the generation so any handle
    /// still pointing there stops resolving.
    fn release(&mut self, id: NodeId) -> Option<Node> {
        let slot = self
            .slots
            .get_mut(id.slot)
            .filter(|slot| slot.generation == id.generation)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.slot);
        Some(node)
    }

    /// Row of a node within its parent's sorted children. The root, having
    /// no parent, sits at row 0.
    pub fn row_of(&self, id: NodeId) -> Option<usize> {
        let node = self.get(id)?;
        let Some(parent) = node.parent else {
            return Some(0);
        };
        self.get(parent)?.children().iter().position(|c| *c == id)
    }

    /// Inserts a child into the parent's sorted children, keeping
    /// case-insensitive ascending order. Returns `None` without allocating
    /// when the parent is not a directory or a child with the same name
    /// (under case-insensitive comparison) already exists; re-entrant
    /// listings must not create duplicate nodes.
    pub fn insert_child_sorted(&mut self, parent: NodeId, mut child: Node) -> Option<NodeId> {
        child.parent = Some(parent);
        let parent_node = self.get(parent)?;
        if !parent_node.is_dir() {
            return None;
        }

        let key = child.info.name.to_lowercase();
        let mut position = parent_node.children().len();
        for (row, sibling) in parent_node.children().iter().enumerate() {
            let sibling_key = self.get(*sibling)?.info.name.to_lowercase();
            match key.cmp(&sibling_key) {
                Ordering::Equal => return None,
                Ordering::Less => {
                    position = row;
                    break;
                }
                Ordering::Greater => {}
            }
        }

        let id = self.alloc(child);
        if let Some(NodeKind::Dir { children, .. }) =
            self.get_mut(parent).map(|node| &mut node.kind)
        {
            children.insert(position, id);
        }
        Some(id)
    }

    /// Destroys every descendant of a directory, leaving the directory
    /// itself in place with an empty child list. Returns the freed handles
    /// so jobs they owned can be invalidated.
    pub fn remove_children(&mut self, id: NodeId) -> HashSet<NodeId> {
        let detached = match self.get_mut(id).map(|node| &mut node.kind) {
            Some(NodeKind::Dir { children, .. }) => std::mem::take(children),
            _ => Vec::new(),
        };

        let mut freed = HashSet::new();
        let mut stack = detached;
        while let Some(current) = stack.pop() {
            if let Some(node) = self.release(current) {
                stack.extend(node.children());
                freed.insert(current);
            }
        }
        freed
    }

    /// Destroys every node. Slots and their generations survive, so handles
    /// taken before the clear keep failing to resolve even once new nodes
    /// reuse the slots.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index);
            }
        }
    }
}
