//! Arena storage for index-linked tree nodes.
//!
//! A [`NodeArena`] keeps three parallel arrays indexed by slot: the records, the node links, and
//! the rank parities. Slot 0 is the sentinel and never holds a record. Slots without a record are
//! threaded through a LIFO free list, so `free slots + live records == capacity` at all times.
//!
//! Growing the arena moves the arrays but never renumbers a slot, which is what keeps every
//! [`Handle`] valid across growth.

use core::{fmt, num::NonZeroU32};
use std::collections::TryReserveError;

use tracing::{debug, warn};

use crate::{
    balance::{self, RankTree, Violation},
    config::ArenaConfig,
    parity::ParityBits,
    status::{Error, Rejected},
    Dir,
};

/// A stable name for a record in an arena-backed container.
///
/// A handle stays valid until its record is removed, no matter how often the container grows.
/// Once the record is removed the slot may be reused, and the old handle then names the new
/// record.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Handle(NonZeroU32);

impl Handle {
    #[inline]
    pub(crate) fn from_slot(slot: u32) -> Option<Handle> {
        NonZeroU32::new(slot).map(Handle)
    }

    /// Names a slot known to hold a record.
    #[inline]
    pub(crate) fn live(slot: u32) -> Handle {
        match Handle::from_slot(slot) {
            Some(handle) => handle,
            None => unreachable!("the sentinel has no handle"),
        }
    }

    #[inline]
    pub(crate) fn slot(self) -> u32 {
        self.0.get()
    }

    /// Returns the raw slot index of this handle.
    #[inline]
    pub fn to_raw(self) -> u32 {
        self.0.get()
    }

    /// Rebuilds a handle from a raw slot index previously returned by [`Handle::to_raw`].
    ///
    /// Returns `None` for the reserved index 0. Containers check every handle they are given, so
    /// a made-up index is reported as an argument error rather than misread.
    #[inline]
    pub fn from_raw(raw: u32) -> Option<Handle> {
        Handle::from_slot(raw)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

/// Where a slot points upwards: its parent while linked, the next free slot while free.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Up {
    Parent(u32),
    NextFree(u32),
}

#[derive(Copy, Clone, Debug)]
struct Node {
    branch: [u32; 2],
    up: Up,
}

impl Node {
    const SENTINEL: Node = Node {
        branch: [0; 2],
        up: Up::Parent(0),
    };

    const fn free(next: u32) -> Node {
        Node {
            branch: [0; 2],
            up: Up::NextFree(next),
        }
    }
}

pub(crate) struct NodeArena<K, V> {
    records: Vec<Option<(K, V)>>,
    nodes: Vec<Node>,
    parity: ParityBits,
    root: u32,
    len: usize,
    free_head: u32,
    config: ArenaConfig,
}

impl<K, V> NodeArena<K, V> {
    /// Creates an arena with `config.initial_capacity` free slots.
    ///
    /// Construction is the one place an arena allocates regardless of its growth policy.
    pub(crate) fn new(config: ArenaConfig) -> Result<Self, Error> {
        let mut arena = NodeArena {
            records: vec![None],
            nodes: vec![Node::SENTINEL],
            parity: ParityBits::new(),
            root: 0,
            len: 0,
            free_head: 0,
            config,
        };

        let capacity = config.initial_capacity;
        if capacity > config.limit() {
            warn!(capacity, limit = config.limit(), "initial capacity exceeds limit");
            return Err(Error::Insert { capacity: 0 });
        }

        arena
            .parity
            .resize(1)
            .and_then(|()| arena.resize(capacity))
            .map_err(|error| {
                warn!(capacity, %error, "arena allocation failed");
                Error::Insert { capacity: 0 }
            })?;

        arena.parity.set(0, true);

        debug!(capacity, growth = ?config.growth, "created node arena");
        Ok(arena)
    }

    /// Returns the number of records.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Returns the number of slots, not counting the sentinel.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.nodes.len() - 1
    }

    #[inline]
    pub(crate) fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Returns `true` if `slot` holds a record that is linked into the tree.
    #[inline]
    pub(crate) fn is_live(&self, slot: u32) -> bool {
        slot != 0
            && self
                .nodes
                .get(slot as usize)
                .is_some_and(|node| matches!(node.up, Up::Parent(_)))
    }

    #[inline]
    pub(crate) fn record(&self, slot: u32) -> &(K, V) {
        match &self.records[slot as usize] {
            Some(record) => record,
            None => unreachable!("slot {slot} holds no record"),
        }
    }

    #[inline]
    pub(crate) fn record_mut(&mut self, slot: u32) -> &mut (K, V) {
        match &mut self.records[slot as usize] {
            Some(record) => record,
            None => unreachable!("slot {slot} holds no record"),
        }
    }

    #[inline]
    pub(crate) fn key(&self, slot: u32) -> &K {
        &self.record(slot).0
    }

    /// Stores a record in a free slot and links it below `parent`.
    ///
    /// `parent` and `order` must come from a search of this arena that has not been followed by a
    /// mutation. Without a free slot the record comes back untouched.
    pub(crate) fn insert(
        &mut self,
        parent: u32,
        order: core::cmp::Ordering,
        key: K,
        value: V,
    ) -> Result<u32, Rejected<K, V>> {
        let slot = match self.alloc_slot() {
            Ok(slot) => slot,
            Err(error) => return Err(Rejected { error, key, value }),
        };
        self.records[slot as usize] = Some((key, value));

        balance::insert(self, parent, order, slot);
        self.len += 1;

        Ok(slot)
    }

    /// Unlinks the record in `slot` and returns its slot to the free list.
    pub(crate) fn remove(&mut self, slot: u32) -> (K, V) {
        debug_assert!(self.is_live(slot));

        balance::remove(self, slot);
        self.len -= 1;

        let record = self.records[slot as usize].take();
        self.nodes[slot as usize] = Node::free(self.free_head);
        self.free_head = slot;

        match record {
            Some(record) => record,
            None => unreachable!("live slot {slot} held no record"),
        }
    }

    /// Makes sure `additional` more records fit without further allocation.
    pub(crate) fn reserve(&mut self, additional: usize) -> Result<(), Error> {
        let needed = self.len.saturating_add(additional);
        if needed <= self.capacity() {
            return Ok(());
        }

        let capacity = self.capacity();
        if needed > self.config.limit() {
            warn!(capacity, needed, "arena reservation exceeds capacity limit");
            return Err(Error::Insert { capacity });
        }

        self.resize(needed).map_err(|error| {
            warn!(capacity, needed, %error, "arena reservation failed");
            Error::Insert { capacity }
        })
    }

    /// Drops every record and frees every slot, keeping the capacity.
    pub(crate) fn clear(&mut self) {
        let total = self.nodes.len();

        for slot in 1..total {
            self.records[slot] = None;
            let next = if slot + 1 < total { slot as u32 + 1 } else { 0 };
            self.nodes[slot] = Node::free(next);
        }

        self.parity.clear();
        self.parity.set(0, true);
        self.root = 0;
        self.len = 0;
        self.free_head = if total > 1 { 1 } else { 0 };
    }

    /// Returns the number of slots on the free list, walking it.
    fn free_list_len(&self) -> Result<usize, Violation> {
        let mut count = 0;
        let mut slot = self.free_head;

        while slot != 0 {
            count += 1;
            if count > self.capacity() {
                return Err(Violation::FreeList {
                    reason: "free list is longer than the arena".to_owned(),
                });
            }

            let node = self.nodes.get(slot as usize).ok_or_else(|| Violation::FreeList {
                reason: format!("free slot {slot} is out of range"),
            })?;

            if self.records[slot as usize].is_some() {
                return Err(Violation::FreeList {
                    reason: format!("free slot {slot} still holds a record"),
                });
            }

            slot = match node.up {
                Up::NextFree(next) => next,
                Up::Parent(_) => {
                    return Err(Violation::FreeList {
                        reason: format!("slot {slot} is on the free list but linked"),
                    })
                }
            };
        }

        Ok(count)
    }

    /// Checks the tree invariants, the sentinel, and the free-list accounting.
    pub(crate) fn validate(
        &self,
        cmp: impl FnMut(&K, &K) -> core::cmp::Ordering,
    ) -> Result<(), Violation> {
        let mut cmp = cmp;

        let sentinel = self.nodes[0];
        if sentinel.branch != [0; 2] || sentinel.up != Up::Parent(0) || !self.parity.get(0) {
            return Err(Violation::FreeList {
                reason: "sentinel slot was modified".to_owned(),
            });
        }

        balance::validate(self, self.len, |a, b| cmp(self.key(a), self.key(b)))?;

        let free = self.free_list_len()?;
        if free + self.len != self.capacity() {
            return Err(Violation::FreeList {
                reason: format!(
                    "{free} free slots and {} records do not add up to capacity {}",
                    self.len,
                    self.capacity()
                ),
            });
        }

        Ok(())
    }

    fn alloc_slot(&mut self) -> Result<u32, Error> {
        if self.free_head == 0 {
            self.grow()?;
        }

        let slot = self.free_head;
        self.free_head = match self.nodes[slot as usize].up {
            Up::NextFree(next) => next,
            Up::Parent(_) => unreachable!("free list names linked slot {slot}"),
        };
        self.nodes[slot as usize].up = Up::Parent(0);

        Ok(slot)
    }

    fn grow(&mut self) -> Result<(), Error> {
        let capacity = self.capacity();

        let Some(new_capacity) = self.config.next_capacity(capacity) else {
            warn!(capacity, growth = ?self.config.growth, "arena is full");
            return Err(Error::Insert { capacity });
        };

        self.resize(new_capacity).map_err(|error| {
            warn!(capacity, new_capacity, %error, "arena growth failed");
            Error::Insert { capacity }
        })?;

        debug!(capacity, new_capacity, "grew node arena");
        Ok(())
    }

    // Extends all three arrays to `capacity` slots and pushes the new slots onto the free list,
    // lowest index first.
    fn resize(&mut self, capacity: usize) -> Result<(), TryReserveError> {
        let old_total = self.nodes.len();
        let new_total = capacity + 1;
        if new_total <= old_total {
            return Ok(());
        }

        let additional = new_total - old_total;
        self.records.try_reserve_exact(additional)?;
        self.nodes.try_reserve_exact(additional)?;
        self.parity.resize(new_total)?;

        for slot in old_total..new_total {
            let next = if slot + 1 < new_total {
                slot as u32 + 1
            } else {
                self.free_head
            };

            self.records.push(None);
            self.nodes.push(Node::free(next));
        }

        self.free_head = old_total as u32;
        Ok(())
    }
}

impl<K, V> RankTree for NodeArena<K, V> {
    type Node = u32;

    const NIL: u32 = 0;

    #[inline]
    fn root(&self) -> u32 {
        self.root
    }

    #[inline]
    fn set_root(&mut self, root: u32) {
        self.root = root;
    }

    #[inline]
    fn child(&self, node: u32, dir: Dir) -> u32 {
        self.nodes[node as usize].branch[dir as usize]
    }

    #[inline]
    fn set_child(&mut self, node: u32, dir: Dir, child: u32) {
        if node != 0 {
            self.nodes[node as usize].branch[dir as usize] = child;
        }
    }

    #[inline]
    fn parent(&self, node: u32) -> u32 {
        match self.nodes[node as usize].up {
            Up::Parent(parent) => parent,
            Up::NextFree(_) => unreachable!("free slot {node} has no parent"),
        }
    }

    #[inline]
    fn set_parent(&mut self, node: u32, parent: u32) {
        if node != 0 {
            self.nodes[node as usize].up = Up::Parent(parent);
        }
    }

    #[inline]
    fn parity(&self, node: u32) -> bool {
        self.parity.get(node as usize)
    }

    #[inline]
    fn set_parity(&mut self, node: u32, parity: bool) {
        if node != 0 {
            self.parity.set(node as usize, parity);
        }
    }
}
