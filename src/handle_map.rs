//! Ordered maps and sets over an index-linked node arena.

use core::{borrow::Borrow, cmp::Ordering, fmt, iter::FusedIterator, mem};

use tracing::error;

use crate::{
    arena::{Handle, NodeArena},
    balance::{self, Query, RankTree, Violation},
    compare::{Compare, NaturalOrder},
    config::ArenaConfig,
    status::{Error, Outcome, Rejected, Status},
    Dir,
};

/// An ordered map whose records live in a growable arena and are named by [`Handle`]s.
///
/// Every operation that inserts may need a new slot. When the arena is full and its
/// [`ArenaConfig`] forbids growth, or growth fails, the operation reports
/// [`Status::INSERT_ERROR`] and leaves the map unchanged.
///
/// ```
/// use wavl_engine::HandleMap;
///
/// let mut map = HandleMap::with_capacity(2);
/// let one = map.try_insert(1, "one").unwrap().unwrap();
///
/// for key in 2..100 {
///     assert!(map.try_insert(key, "many").is_vacant());
/// }
///
/// // The arena grew, but `one` still names the same record.
/// assert_eq!(map.get_by_handle(one), Some((&1, &"one")));
/// ```
pub struct HandleMap<K, V, C = NaturalOrder> {
    arena: NodeArena<K, V>,
    compare: C,
}

/// An ordered set whose keys live in a growable arena and are named by [`Handle`]s.
pub struct HandleSet<K, C = NaturalOrder> {
    map: HandleMap<K, (), C>,
}

/// A view into a single key of a [`HandleMap`], found by one search.
pub enum HandleEntry<'map, K, V> {
    Occupied(OccupiedHandle<'map, K, V>),
    Vacant(VacantHandle<'map, K, V>),
}

/// An entry whose key is present.
pub struct OccupiedHandle<'map, K, V> {
    arena: &'map mut NodeArena<K, V>,
    slot: u32,
}

/// An entry whose key is absent. It remembers where the key belongs, so inserting does not
/// search again.
pub struct VacantHandle<'map, K, V> {
    arena: &'map mut NodeArena<K, V>,
    key: K,
    parent: u32,
    order: Ordering,
}

/// An iterator over a run of records in a [`HandleMap`], in either direction.
///
/// The run ends when the iterator reaches its end record, which is compared by identity and not
/// yielded.
pub struct HandleRange<'map, K, V> {
    arena: &'map NodeArena<K, V>,
    next: u32,
    end: u32,
    dir: Dir,
}

fn new_arena<K, V>(config: ArenaConfig) -> NodeArena<K, V> {
    match NodeArena::new(config) {
        Ok(arena) => arena,
        Err(error) => panic!("failed to create arena: {error}"),
    }
}

// === impl HandleMap ===

impl<K, V> HandleMap<K, V> {
    /// Returns a new, empty map that allocates on first insertion.
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::new())
    }

    /// Returns a new map with room for `capacity` records.
    ///
    /// # Panics
    ///
    /// Panics if the initial slots cannot be allocated.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(ArenaConfig::new().initial_capacity(capacity))
    }

    /// Returns a new map configured by `config`.
    ///
    /// # Panics
    ///
    /// Panics if the initial slots cannot be allocated or exceed `config`'s capacity limit. Use
    /// [`HandleMap::try_with_config_and_compare`] to handle that case.
    pub fn with_config(config: ArenaConfig) -> Self {
        HandleMap {
            arena: new_arena(config),
            compare: NaturalOrder,
        }
    }
}

impl<K, V, C> HandleMap<K, V, C> {
    /// Returns a new, empty map ordered by `compare`.
    pub fn with_compare(compare: C) -> Self {
        HandleMap {
            arena: new_arena(ArenaConfig::new()),
            compare,
        }
    }

    /// Returns a new map configured by `config` and ordered by `compare`.
    ///
    /// # Panics
    ///
    /// Panics if the initial slots cannot be allocated.
    pub fn with_config_and_compare(config: ArenaConfig, compare: C) -> Self {
        HandleMap {
            arena: new_arena(config),
            compare,
        }
    }

    /// Returns a new map configured by `config` and ordered by `compare`, or an
    /// [`Error::Insert`] if the initial slots cannot be allocated.
    pub fn try_with_config_and_compare(config: ArenaConfig, compare: C) -> Result<Self, Error> {
        Ok(HandleMap {
            arena: NodeArena::new(config)?,
            compare,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of records the map can hold without growing.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Returns the number of unused slots.
    #[inline]
    pub fn free_slots(&self) -> usize {
        self.capacity() - self.len()
    }

    #[inline]
    pub fn config(&self) -> &ArenaConfig {
        self.arena.config()
    }

    /// Makes room for at least `additional` more records.
    ///
    /// Reserving ignores [`Growth::Fixed`](crate::Growth::Fixed), so a real-time map can be
    /// sized up front and then used without allocating. The configured capacity limit still
    /// applies.
    pub fn reserve(&mut self, additional: usize) -> Result<(), Error> {
        self.arena.reserve(additional)
    }

    /// Searches for `key` without taking a handle.
    fn find<Q>(&self, key: &Q) -> Query<u32>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let arena = &self.arena;
        let compare = &self.compare;
        balance::find(arena, |slot| compare.compare(key, arena.key(slot).borrow()))
    }

    fn live_slot(&self, handle: Handle) -> Option<u32> {
        let slot = handle.slot();
        self.arena.is_live(slot).then_some(slot)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.find(key).found().is_some()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let slot = self.find(key).found()?;
        let (k, v) = self.arena.record(slot);
        Some((k, v))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let slot = self.find(key).found()?;
        Some(&mut self.arena.record_mut(slot).1)
    }

    /// Returns the handle of the record for `key`.
    pub fn handle_of<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.find(key).found().map(Handle::live)
    }

    /// Removes the record for `key`.
    ///
    /// The outcome is `OCCUPIED` with the record if the key was present, and `VACANT` with no
    /// payload otherwise.
    pub fn remove<Q>(&mut self, key: &Q) -> Outcome<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        match self.find(key).found() {
            Some(slot) => Outcome::occupied(self.arena.remove(slot)),
            None => Outcome::empty(),
        }
    }

    /// Returns the records with keys from `begin` up to, but not including, the first key ordered
    /// after `end`.
    pub fn range<Q>(&self, begin: &Q, end: &Q) -> HandleRange<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.equal_range(begin, end, Dir::Right)
    }

    /// Returns the records with keys from `begin` down to, but not including, the first key
    /// ordered before `end`.
    ///
    /// ```
    /// use wavl_engine::HandleMap;
    ///
    /// let mut map = HandleMap::new();
    /// for key in (0..=120).step_by(5) {
    ///     let _ = map.insert(key, ());
    /// }
    ///
    /// let range = map.range_rev(&119, &84);
    /// assert_eq!(range.end().and_then(|h| map.get_by_handle(h)), Some((&80, &())));
    ///
    /// let keys: Vec<i32> = range.map(|(k, _)| *k).collect();
    /// assert_eq!(keys, [115, 110, 105, 100, 95, 90, 85]);
    /// ```
    pub fn range_rev<Q>(&self, begin: &Q, end: &Q) -> HandleRange<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.equal_range(begin, end, Dir::Left)
    }

    fn equal_range<Q>(&self, begin: &Q, end: &Q, dir: Dir) -> HandleRange<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let arena = &self.arena;
        let compare = &self.compare;
        let (next, end) = balance::equal_range(
            arena,
            |slot| compare.compare(begin, arena.key(slot).borrow()),
            |slot| compare.compare(end, arena.key(slot).borrow()),
            dir,
        );

        HandleRange {
            arena,
            next,
            end,
            dir,
        }
    }

    /// Inserts `value` under `key`, replacing and returning any previous value.
    ///
    /// The outcome is `OCCUPIED` with the old value if the key was present. A new key yields
    /// `VACANT` with no payload, or `INSERT_ERROR` if no slot could be obtained.
    pub fn insert(&mut self, key: K, value: V) -> Outcome<V>
    where
        C: Compare<K>,
    {
        match self.entry(key) {
            HandleEntry::Occupied(mut occupied) => Outcome::occupied(occupied.insert(value)),
            HandleEntry::Vacant(vacant) => match vacant.insert_entry(value) {
                Ok(_) => Outcome::empty(),
                Err(rejected) => rejected.into(),
            },
        }
    }

    /// Inserts `key` and `value` only if `key` is absent.
    ///
    /// Returns the handle of the record now stored under `key`: `OCCUPIED` if it was already
    /// there (the map is unchanged), `VACANT` if it was just inserted.
    pub fn try_insert(&mut self, key: K, value: V) -> Outcome<Handle>
    where
        C: Compare<K>,
    {
        match self.entry(key) {
            HandleEntry::Occupied(occupied) => Outcome::occupied(occupied.handle()),
            HandleEntry::Vacant(vacant) => match vacant.insert_entry(value) {
                Ok(inserted) => Outcome::vacant(inserted.handle()),
                Err(rejected) => rejected.into(),
            },
        }
    }

    /// Stores `value` under `key`, overwriting any previous value in place.
    ///
    /// Returns the handle of the record: `OCCUPIED` if the key was present, `VACANT` if it was
    /// inserted.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> Outcome<Handle>
    where
        C: Compare<K>,
    {
        match self.entry(key) {
            HandleEntry::Occupied(mut occupied) => {
                occupied.insert(value);
                Outcome::occupied(occupied.handle())
            }
            HandleEntry::Vacant(vacant) => match vacant.insert_entry(value) {
                Ok(inserted) => Outcome::vacant(inserted.handle()),
                Err(rejected) => rejected.into(),
            },
        }
    }

    /// Exchanges the whole stored record for `(key, value)`, returning the old record.
    ///
    /// Unlike [`HandleMap::insert`], the stored key is replaced too. A new key is inserted and
    /// yields `VACANT` with no payload.
    pub fn swap_entry(&mut self, key: K, value: V) -> Outcome<(K, V)>
    where
        C: Compare<K>,
    {
        let query = self.find(&key);
        match query.found() {
            Some(slot) => Outcome::occupied(mem::replace(self.arena.record_mut(slot), (key, value))),
            None => match self.arena.insert(query.node, query.order, key, value) {
                Ok(_) => Outcome::empty(),
                Err(rejected) => rejected.into(),
            },
        }
    }

    /// Searches for `key` once and returns an entry for mutating it.
    pub fn entry(&mut self, key: K) -> HandleEntry<'_, K, V>
    where
        C: Compare<K>,
    {
        let query = self.find(&key);
        match query.found() {
            Some(slot) => HandleEntry::Occupied(OccupiedHandle {
                arena: &mut self.arena,
                slot,
            }),
            None => HandleEntry::Vacant(VacantHandle {
                arena: &mut self.arena,
                key,
                parent: query.node,
                order: query.order,
            }),
        }
    }

    pub fn get_by_handle(&self, handle: Handle) -> Option<(&K, &V)> {
        let slot = self.live_slot(handle)?;
        let (k, v) = self.arena.record(slot);
        Some((k, v))
    }

    pub fn get_by_handle_mut(&mut self, handle: Handle) -> Option<(&K, &mut V)> {
        let slot = self.live_slot(handle)?;
        let (k, v) = self.arena.record_mut(slot);
        Some((&*k, v))
    }

    /// Removes the record named by `handle` without searching.
    ///
    /// A handle that does not name a live record yields `ARGUMENT_ERROR`.
    pub fn remove_by_handle(&mut self, handle: Handle) -> Outcome<(K, V)> {
        match self.live_slot(handle) {
            Some(slot) => Outcome::occupied(self.arena.remove(slot)),
            None => Error::Argument.into(),
        }
    }

    /// Returns the handle of the record after `handle` in key order.
    pub fn next_handle(&self, handle: Handle) -> Option<Handle> {
        let slot = self.live_slot(handle)?;
        Handle::from_slot(balance::next(&self.arena, slot, Dir::Right))
    }

    /// Returns the handle of the record before `handle` in key order.
    pub fn prev_handle(&self, handle: Handle) -> Option<Handle> {
        let slot = self.live_slot(handle)?;
        Handle::from_slot(balance::next(&self.arena, slot, Dir::Left))
    }

    fn end_slot(&self, dir: Dir) -> u32 {
        balance::extreme(&self.arena, self.arena.root(), dir)
    }

    pub fn first_handle(&self) -> Option<Handle> {
        Handle::from_slot(self.end_slot(Dir::Left))
    }

    pub fn last_handle(&self) -> Option<Handle> {
        Handle::from_slot(self.end_slot(Dir::Right))
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        self.first_handle().and_then(|h| self.get_by_handle(h))
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        self.last_handle().and_then(|h| self.get_by_handle(h))
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.first_handle().and_then(|h| self.remove_by_handle(h).unwrap())
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.last_handle().and_then(|h| self.remove_by_handle(h).unwrap())
    }

    /// Returns an iterator over the records in ascending key order.
    pub fn iter(&self) -> HandleRange<'_, K, V> {
        HandleRange {
            arena: &self.arena,
            next: self.end_slot(Dir::Left),
            end: <NodeArena<K, V> as RankTree>::NIL,
            dir: Dir::Right,
        }
    }

    /// Returns an iterator over the records in descending key order.
    pub fn iter_rev(&self) -> HandleRange<'_, K, V> {
        HandleRange {
            arena: &self.arena,
            next: self.end_slot(Dir::Right),
            end: <NodeArena<K, V> as RankTree>::NIL,
            dir: Dir::Left,
        }
    }

    /// Drops every record. The capacity is kept and every handle becomes invalid.
    pub fn clear(&mut self) {
        self.arena.clear();
    }

    /// Returns the number of records on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        balance::height(&self.arena)
    }

    fn check(&self) -> Result<(), Violation>
    where
        C: Compare<K>,
    {
        let compare = &self.compare;
        self.arena.validate(|a, b| compare.compare(a, b))
    }

    /// Checks every structural invariant: key order, parent links, the rank rule, the record
    /// count, the sentinel and the free list. Takes _O(n)_ time.
    pub fn validate(&self) -> bool
    where
        C: Compare<K>,
    {
        match self.check() {
            Ok(()) => true,
            Err(violation) => {
                error!(%violation, len = self.len(), "handle map failed validation");
                false
            }
        }
    }

    #[doc(hidden)]
    #[track_caller]
    pub fn assert_invariants(&self)
    where
        C: Compare<K>,
    {
        if let Err(violation) = self.check() {
            panic!("handle map invariant violated: {violation}");
        }
    }

    /// Writes a Graphviz rendering of the tree to `w`, labelling each record with its key.
    pub fn dotgraph<W: fmt::Write>(&self, name: &str, w: W) -> fmt::Result
    where
        K: fmt::Debug,
    {
        crate::debug::dotgraph(&self.arena, name, |slot| self.arena.key(slot), w)
    }
}

impl<K, V> Default for HandleMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for HandleMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'map, K, V, C> IntoIterator for &'map HandleMap<K, V, C> {
    type Item = (&'map K, &'map V);
    type IntoIter = HandleRange<'map, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// === impl HandleEntry ===

impl<'map, K, V> HandleEntry<'map, K, V> {
    pub fn status(&self) -> Status {
        match self {
            HandleEntry::Occupied(_) => Status::OCCUPIED,
            HandleEntry::Vacant(_) => Status::VACANT,
        }
    }

    pub fn key(&self) -> &K {
        match self {
            HandleEntry::Occupied(occupied) => occupied.key(),
            HandleEntry::Vacant(vacant) => vacant.key(),
        }
    }

    /// Returns the handle of the record, if the key is present.
    pub fn handle(&self) -> Option<Handle> {
        match self {
            HandleEntry::Occupied(occupied) => Some(occupied.handle()),
            HandleEntry::Vacant(_) => None,
        }
    }

    /// Calls `f` on the stored value if the key is present.
    pub fn and_modify(mut self, f: impl FnOnce(&mut V)) -> Self {
        if let HandleEntry::Occupied(occupied) = &mut self {
            f(occupied.get_mut());
        }

        self
    }

    pub fn or_insert(self, default: V) -> Result<&'map mut V, Rejected<K, V>> {
        self.or_insert_with(|| default)
    }

    /// Inserts the value made by `default` if the key is absent. `default` is only called then.
    pub fn or_insert_with(
        self,
        default: impl FnOnce() -> V,
    ) -> Result<&'map mut V, Rejected<K, V>> {
        match self {
            HandleEntry::Occupied(occupied) => Ok(occupied.into_mut()),
            HandleEntry::Vacant(vacant) => vacant.insert(default()),
        }
    }

    pub fn or_default(self) -> Result<&'map mut V, Rejected<K, V>>
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }

    /// Stores `value`, overwriting a present value or inserting a new record.
    pub fn insert_entry(self, value: V) -> Result<OccupiedHandle<'map, K, V>, Rejected<K, V>> {
        match self {
            HandleEntry::Occupied(mut occupied) => {
                occupied.insert(value);
                Ok(occupied)
            }
            HandleEntry::Vacant(vacant) => vacant.insert_entry(value),
        }
    }

    /// Removes the record if the key is present.
    pub fn remove_entry(self) -> Outcome<(K, V)> {
        match self {
            HandleEntry::Occupied(occupied) => Outcome::occupied(occupied.remove_entry()),
            HandleEntry::Vacant(_) => Outcome::empty(),
        }
    }
}

impl<'map, K, V> OccupiedHandle<'map, K, V> {
    pub fn handle(&self) -> Handle {
        Handle::live(self.slot)
    }

    pub fn key(&self) -> &K {
        self.arena.key(self.slot)
    }

    pub fn get(&self) -> &V {
        &self.arena.record(self.slot).1
    }

    pub fn get_mut(&mut self) -> &mut V {
        &mut self.arena.record_mut(self.slot).1
    }

    pub fn into_mut(self) -> &'map mut V {
        let OccupiedHandle { arena, slot } = self;
        &mut arena.record_mut(slot).1
    }

    /// Replaces the stored value, returning the old one.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }

    pub fn remove_entry(self) -> (K, V) {
        self.arena.remove(self.slot)
    }

    pub fn remove(self) -> V {
        self.remove_entry().1
    }
}

impl<'map, K, V> VacantHandle<'map, K, V> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the record where the search ended, without searching again.
    ///
    /// If the arena has no slot to spare, the key and value are returned with the error.
    pub fn insert_entry(self, value: V) -> Result<OccupiedHandle<'map, K, V>, Rejected<K, V>> {
        let VacantHandle {
            arena,
            key,
            parent,
            order,
        } = self;

        let slot = arena.insert(parent, order, key, value)?;
        Ok(OccupiedHandle { arena, slot })
    }

    pub fn insert(self, value: V) -> Result<&'map mut V, Rejected<K, V>> {
        self.insert_entry(value).map(OccupiedHandle::into_mut)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for HandleEntry<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleEntry::Occupied(occupied) => f
                .debug_struct("OccupiedHandle")
                .field("handle", &occupied.handle())
                .field("key", occupied.key())
                .field("value", occupied.get())
                .finish(),
            HandleEntry::Vacant(vacant) => f
                .debug_struct("VacantHandle")
                .field("key", vacant.key())
                .finish(),
        }
    }
}

// === impl HandleRange ===

impl<'map, K, V> HandleRange<'map, K, V> {
    /// Returns the handle of the next record to be yielded.
    pub fn begin(&self) -> Option<Handle> {
        if self.next == self.end {
            return None;
        }

        Handle::from_slot(self.next)
    }

    /// Returns the handle of the record that stops the iteration, or `None` if it runs to the end
    /// of the map.
    pub fn end(&self) -> Option<Handle> {
        Handle::from_slot(self.end)
    }
}

impl<'map, K, V> Iterator for HandleRange<'map, K, V> {
    type Item = (&'map K, &'map V);

    fn next(&mut self) -> Option<Self::Item> {
        // A begin key ordered after the end key never meets `end`; stop at the end of the map.
        if self.next == self.end || self.next == NodeArena::<K, V>::NIL {
            return None;
        }

        let slot = self.next;
        self.next = balance::next(self.arena, slot, self.dir);

        let (k, v) = self.arena.record(slot);
        Some((k, v))
    }
}

impl<K, V> FusedIterator for HandleRange<'_, K, V> {}

impl<K, V> Clone for HandleRange<'_, K, V> {
    fn clone(&self) -> Self {
        HandleRange { ..*self }
    }
}

// === impl HandleSet ===

fn set_key<'a, K>((key, ()): (&'a K, &'a ())) -> &'a K {
    key
}

impl<K> HandleSet<K> {
    pub fn new() -> Self {
        HandleSet {
            map: HandleMap::new(),
        }
    }

    pub fn with_config(config: ArenaConfig) -> Self {
        HandleSet {
            map: HandleMap::with_config(config),
        }
    }
}

impl<K, C> HandleSet<K, C> {
    pub fn with_compare(compare: C) -> Self {
        HandleSet {
            map: HandleMap::with_compare(compare),
        }
    }

    pub fn with_config_and_compare(config: ArenaConfig, compare: C) -> Self {
        HandleSet {
            map: HandleMap::with_config_and_compare(config, compare),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.map.capacity()
    }

    pub fn reserve(&mut self, additional: usize) -> Result<(), Error> {
        self.map.reserve(additional)
    }

    /// Adds `key` if it is absent, returning the handle of the stored key.
    pub fn insert(&mut self, key: K) -> Outcome<Handle>
    where
        C: Compare<K>,
    {
        self.map.try_insert(key, ())
    }

    /// Stores `key`, replacing and returning an equal key already in the set.
    pub fn replace(&mut self, key: K) -> Outcome<K>
    where
        C: Compare<K>,
    {
        self.map.swap_entry(key, ()).map(|(k, ())| k)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.map.contains_key(key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.map.get_key_value(key).map(|(k, ())| k)
    }

    pub fn handle_of<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.map.handle_of(key)
    }

    pub fn get_by_handle(&self, handle: Handle) -> Option<&K> {
        self.map.get_by_handle(handle).map(|(k, ())| k)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Outcome<K>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.map.remove(key).map(|(k, ())| k)
    }

    pub fn remove_by_handle(&mut self, handle: Handle) -> Outcome<K> {
        self.map.remove_by_handle(handle).map(|(k, ())| k)
    }

    pub fn first(&self) -> Option<&K> {
        self.map.first().map(|(k, ())| k)
    }

    pub fn last(&self) -> Option<&K> {
        self.map.last().map(|(k, ())| k)
    }

    pub fn pop_first(&mut self) -> Option<K> {
        self.map.pop_first().map(|(k, ())| k)
    }

    pub fn pop_last(&mut self) -> Option<K> {
        self.map.pop_last().map(|(k, ())| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        self.map.iter().map(set_key)
    }

    pub fn range<'a, Q>(&'a self, begin: &Q, end: &Q) -> impl Iterator<Item = &'a K> + 'a
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.map.range(begin, end).map(set_key)
    }

    pub fn range_rev<'a, Q>(&'a self, begin: &Q, end: &Q) -> impl Iterator<Item = &'a K> + 'a
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.map.range_rev(begin, end).map(set_key)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn height(&self) -> usize {
        self.map.height()
    }

    pub fn validate(&self) -> bool
    where
        C: Compare<K>,
    {
        self.map.validate()
    }

    #[doc(hidden)]
    #[track_caller]
    pub fn assert_invariants(&self)
    where
        C: Compare<K>,
    {
        self.map.assert_invariants();
    }
}

impl<K> Default for HandleSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, C> fmt::Debug for HandleSet<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Growth;

    fn check<K: Ord, V>(map: &HandleMap<K, V>) {
        map.assert_invariants();
        assert_eq!(map.free_slots() + map.len(), map.capacity());
    }

    #[test]
    fn handles_survive_growth() {
        let mut map = HandleMap::with_capacity(4);
        let handles: Vec<(u32, Handle)> = (0..300)
            .map(|i| (i * 7) % 300)
            .map(|key| {
                let outcome = map.try_insert(key, key * 2);
                assert!(outcome.is_vacant());
                (key, outcome.unwrap().unwrap())
            })
            .collect();

        assert!(map.capacity() >= 300);
        check(&map);

        for (key, handle) in handles {
            assert_eq!(map.get_by_handle(handle), Some((&key, &(key * 2))));
            assert_eq!(map.handle_of(&key), Some(handle));
        }
    }

    #[test]
    fn free_list_tracks_every_operation() {
        let mut map = HandleMap::with_capacity(8);

        for round in 0..4u32 {
            for key in 0..40 {
                let _ = map.insert(key, round);
                check(&map);
            }

            for key in (0..40).filter(|k| k % (round + 2) == 0) {
                assert!(map.remove(&key).is_occupied());
                check(&map);
            }
        }

        map.clear();
        check(&map);
        assert!(map.is_empty());
        assert_eq!(map.free_slots(), map.capacity());
    }

    #[test]
    fn stale_handles_are_argument_errors() {
        let mut map = HandleMap::new();
        let handle = map.try_insert("a", 1).unwrap().unwrap();
        let _ = map.try_insert("b", 2);

        let removed = map.remove_by_handle(handle);
        assert!(removed.is_occupied());
        assert_eq!(removed.unwrap(), Some(("a", 1)));

        let again = map.remove_by_handle(handle);
        assert_eq!(again.status(), Status::ARGUMENT_ERROR | Status::NO_UNWRAP);
        assert_eq!(again.unwrap(), None);
        assert_eq!(map.get_by_handle(handle), None);
        assert_eq!(map.next_handle(handle), None);

        let made_up = Handle::from_raw(9999).unwrap();
        assert!(map.remove_by_handle(made_up).status().is_argument_error());
        assert_eq!(map.len(), 1);
        check(&map);
    }

    #[test]
    fn fixed_arena_reports_insert_errors() {
        let config = ArenaConfig::new().initial_capacity(3).growth(Growth::Fixed);
        let mut map = HandleMap::with_config(config);

        for key in 0..3 {
            assert!(map.try_insert(key, ()).is_vacant());
        }

        let full = map.try_insert(3, ());
        assert!(full.is_insert_error());
        assert!(full.status().no_unwrap());
        assert_eq!(full.unwrap(), None);
        assert_eq!(map.len(), 3);

        // Present keys need no slot.
        assert!(map.try_insert(1, ()).is_occupied());
        assert!(map.insert_or_assign(2, ()).is_occupied());
        assert_eq!(
            map.entry(9).or_insert(()).map_err(Error::from),
            Err(Error::Insert { capacity: 3 })
        );

        map.reserve(1).unwrap();
        assert!(map.try_insert(3, ()).is_vacant());
        check(&map);
    }

    #[test]
    fn full_arena_hands_the_record_back() {
        let config = ArenaConfig::new().initial_capacity(1).growth(Growth::Fixed);
        let mut map = HandleMap::with_config(config);
        assert!(map.try_insert(1, String::from("one")).is_vacant());

        let HandleEntry::Vacant(vacant) = map.entry(2) else {
            panic!("key 2 should be absent");
        };
        let rejected = vacant
            .insert_entry(String::from("two"))
            .err()
            .expect("a full fixed arena should reject the record");
        assert_eq!(rejected.error, Error::Insert { capacity: 1 });
        assert_eq!(map.len(), 1);

        // The caller still owns the record and can retry once there is room.
        let (key, value) = rejected.into_record();
        map.reserve(1).unwrap();
        let handle = match map.entry(key) {
            HandleEntry::Vacant(vacant) => vacant.insert_entry(value).unwrap().handle(),
            HandleEntry::Occupied(_) => panic!("key 2 should still be absent"),
        };
        assert_eq!(map.get_by_handle(handle), Some((&2, &String::from("two"))));
        check(&map);
    }

    #[test]
    fn insert_verbs_leave_count_alone_on_hits() {
        let mut map = HandleMap::new();
        let first = map.try_insert(5, "five").unwrap().unwrap();

        let again = map.try_insert(5, "FIVE");
        assert!(again.is_occupied());
        assert_eq!(again.unwrap(), Some(first));
        assert_eq!(map.get(&5), Some(&"five"));
        assert_eq!(map.len(), 1);

        assert!(map.insert_or_assign(5, "FIVE").is_occupied());
        assert_eq!(map.get(&5), Some(&"FIVE"));
        assert_eq!(map.len(), 1);

        assert_eq!(map.insert(5, "5").unwrap(), Some("FIVE"));
        assert_eq!(map.swap_entry(5, "v").unwrap(), Some((5, "5")));
        assert!(map.insert(6, "six").unwrap().is_none());
        assert_eq!(map.len(), 2);
        check(&map);
    }

    #[test]
    fn entries_search_once() {
        let mut counts = HandleMap::new();
        for word in "the cat saw the dog and the bird".split(' ') {
            *counts.entry(word).or_insert(0).unwrap() += 1;
        }

        assert_eq!(counts.get("the"), Some(&3));
        assert_eq!(counts.get("cat"), Some(&1));

        let entry = counts.entry("the").and_modify(|n| *n *= 10);
        assert_eq!(entry.status(), Status::OCCUPIED);
        assert_eq!(entry.or_default().copied(), Ok(30));

        let vacant = counts.entry("fish").and_modify(|n| *n = 99);
        assert!(vacant.status().is_vacant());
        assert_eq!(vacant.handle(), None);
        assert!(vacant.remove_entry().status().no_unwrap());

        let removed = counts.entry("dog").remove_entry();
        assert_eq!(removed.unwrap(), Some(("dog", 1)));
        assert!(!counts.contains_key("dog"));
        check(&counts);
    }

    #[test]
    fn ends_and_neighbours() {
        let mut map = HandleMap::new();
        assert_eq!(map.first(), None);
        assert_eq!(map.pop_last(), None);

        for key in [30, 10, 20, 50, 40] {
            let _ = map.insert(key, ());
        }

        let first = map.first_handle().unwrap();
        let second = map.next_handle(first).unwrap();
        assert_eq!(map.get_by_handle(second), Some((&20, &())));
        assert_eq!(map.prev_handle(first), None);
        assert_eq!(map.last(), Some((&50, &())));

        assert_eq!(map.pop_first(), Some((10, ())));
        assert_eq!(map.pop_last(), Some((50, ())));

        let forward: Vec<_> = map.iter().map(|(k, _)| *k).collect();
        let backward: Vec<_> = map.iter_rev().map(|(k, _)| *k).collect();
        assert_eq!(forward, [20, 30, 40]);
        assert_eq!(backward, [40, 30, 20]);
        check(&map);
    }

    #[test]
    fn empty_range_starts_at_its_end() {
        let mut map = HandleMap::new();
        for key in (0..=120).step_by(5) {
            let _ = map.insert(key, ());
        }

        let range = map.range(&6, &7);
        assert_eq!(range.begin(), None);
        assert_eq!(range.end(), map.handle_of(&10));
        assert_eq!(range.count(), 0);

        let range = map.range(&121, &200);
        assert_eq!((range.begin(), range.end()), (None, None));

        let keys: Vec<_> = map.range(&6, &44).map(|(k, _)| *k).collect();
        assert_eq!(keys, [10, 15, 20, 25, 30, 35, 40]);
    }

    #[test]
    fn set_operations() {
        let mut set = HandleSet::new();
        for key in [3, 1, 4, 1, 5, 9, 2, 6] {
            let _ = set.insert(key);
        }

        assert_eq!(set.len(), 7);
        assert!(set.contains(&4));
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), [1, 2, 3, 4, 5, 6, 9]);
        assert_eq!(set.range(&2, &5).copied().collect::<Vec<_>>(), [2, 3, 4, 5]);

        let handle = set.handle_of(&9).unwrap();
        assert_eq!(set.remove_by_handle(handle).unwrap(), Some(9));
        assert_eq!(set.remove(&9).unwrap(), None);
        assert_eq!(set.replace(4).unwrap(), Some(4));
        assert_eq!(set.pop_first(), Some(1));
        assert_eq!(format!("{set:?}"), "{2, 3, 4, 5, 6}");
        set.assert_invariants();
    }
}
