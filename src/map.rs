use core::{borrow::Borrow, fmt, iter::FusedIterator, marker::PhantomPinned, mem, ptr::NonNull};

use cordyceps::Linked;

use crate::{
    compare::{Compare, NaturalOrder},
    entry::{Entry, OccupiedEntry, VacantEntry},
    iter::{Iter, Range},
    status::{Outcome, Status},
    Links, TreeNode, WavlTree,
};

/// An ordered map based on a [WAVL tree], owning its records in boxed nodes.
///
/// Every verb searches the tree once. Record storage comes from the global allocator, so the map
/// never reports [`Status::INSERT_ERROR`].
///
/// ```
/// use wavl_engine::WavlMap;
///
/// let mut map = WavlMap::new();
/// assert!(map.insert("b", 2).is_vacant());
/// assert_eq!(map.insert("b", 3).unwrap(), Some(2));
///
/// *map.entry("a").or_insert(0) += 1;
/// assert_eq!(map.iter().collect::<Vec<_>>(), [(&"a", &1), (&"b", &3)]);
/// ```
///
/// [WAVL tree]: https://en.wikipedia.org/wiki/WAVL_tree
pub struct WavlMap<K, V, C = NaturalOrder> {
    tree: WavlTree<MapNode<K, V>, C>,
}

struct MapNode<K, V> {
    links: Links<MapNode<K, V>>,
    key: K,
    value: V,
    _unpin: PhantomPinned,
}

impl<K, V> MapNode<K, V> {
    fn boxed(key: K, value: V) -> Box<Self> {
        Box::new(MapNode {
            links: Links::new(),
            key,
            value,
            _unpin: PhantomPinned,
        })
    }

    #[allow(clippy::boxed_local)]
    fn into_pair(self: Box<Self>) -> (K, V) {
        let MapNode { key, value, .. } = *self;
        (key, value)
    }
}

unsafe impl<K, V> Linked<Links<MapNode<K, V>>> for MapNode<K, V> {
    type Handle = Box<Self>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<MapNode<K, V>>> {
        let ptr = ptr.as_ptr();
        // SAFETY: `ptr` is non-null, so a field projection from it is too.
        unsafe { NonNull::new_unchecked(core::ptr::addr_of_mut!((*ptr).links)) }
    }
}

impl<K, V> TreeNode<Links<MapNode<K, V>>> for MapNode<K, V> {
    type Key = K;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

// Pinning is not structural for `key` or `value`; only the links must stay put.
fn value_mut<K, V>(node: core::pin::Pin<&mut MapNode<K, V>>) -> &mut V {
    unsafe { &mut node.get_unchecked_mut().value }
}

impl<K, V> WavlMap<K, V> {
    /// Creates a new, empty `WavlMap`.
    pub const fn new() -> Self {
        Self {
            tree: WavlTree::new(),
        }
    }
}

impl<K, V, C> WavlMap<K, V, C> {
    /// Creates a new, empty `WavlMap` ordered by `compare`.
    pub const fn with_compare(compare: C) -> Self {
        Self {
            tree: WavlTree::with_compare(compare),
        }
    }

    /// Returns `true` if the map contains no elements.
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the map.
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the map contains a value associated with `key`.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.contains_key(key)
    }

    /// Returns a reference to the value associated with `key`.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    #[inline]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree
            .get(key)
            .map(|node| node.get_ref())
            .map(|node| (&node.key, &node.value))
    }

    /// Returns a mutable reference to the value associated with `key`.
    #[inline]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.get_mut(key).map(value_mut)
    }

    /// Returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree
            .first()
            .map(|node| node.get_ref())
            .map(|node| (&node.key, &node.value))
    }

    /// Removes and returns the first key-value pair in the map.
    #[inline]
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.tree.pop_first().map(MapNode::into_pair)
    }

    /// Returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    #[inline]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree
            .last()
            .map(|node| node.get_ref())
            .map(|node| (&node.key, &node.value))
    }

    /// Removes and returns the last key-value pair in the map.
    #[inline]
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.tree.pop_last().map(MapNode::into_pair)
    }

    /// Removes the record associated with `key` from the map.
    ///
    /// The outcome is `OCCUPIED` with the record if the key was present, and `VACANT` with no
    /// payload otherwise.
    pub fn remove<Q>(&mut self, key: &Q) -> Outcome<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        match self.tree.remove(key) {
            Some(node) => Outcome::occupied(node.into_pair()),
            None => Outcome::empty(),
        }
    }

    /// Inserts `value` under `key`, replacing and returning any previous value.
    ///
    /// A new key yields `VACANT` with no payload.
    pub fn insert(&mut self, key: K, value: V) -> Outcome<V>
    where
        C: Compare<K>,
    {
        match self.entry(key) {
            MapEntry::Occupied(mut occupied) => Outcome::occupied(occupied.insert(value)),
            MapEntry::Vacant(vacant) => {
                vacant.insert(value);
                Outcome::empty()
            }
        }
    }

    /// Inserts `key` and `value` only if `key` is absent.
    ///
    /// Returns the value now stored under `key`: `OCCUPIED` if it was already there (the map is
    /// unchanged), `VACANT` if it was just inserted.
    pub fn try_insert(&mut self, key: K, value: V) -> Outcome<&mut V>
    where
        C: Compare<K>,
    {
        match self.entry(key) {
            MapEntry::Occupied(occupied) => Outcome::occupied(occupied.into_mut()),
            MapEntry::Vacant(vacant) => Outcome::vacant(vacant.insert(value)),
        }
    }

    /// Stores `value` under `key`, overwriting any previous value in place.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> Outcome<&mut V>
    where
        C: Compare<K>,
    {
        match self.entry(key) {
            MapEntry::Occupied(mut occupied) => {
                occupied.insert(value);
                Outcome::occupied(occupied.into_mut())
            }
            MapEntry::Vacant(vacant) => Outcome::vacant(vacant.insert(value)),
        }
    }

    /// Exchanges the whole stored record for `(key, value)`, returning the old record.
    ///
    /// The new record takes over the old node's place in the tree. A new key is inserted and
    /// yields `VACANT` with no payload.
    pub fn swap_entry(&mut self, key: K, value: V) -> Outcome<(K, V)>
    where
        C: Compare<K>,
    {
        match self.tree.insert(MapNode::boxed(key, value)) {
            Some(old) => Outcome::occupied(old.into_pair()),
            None => Outcome::empty(),
        }
    }

    /// Searches for `key` once and returns an entry for mutating it.
    pub fn entry(&mut self, key: K) -> MapEntry<'_, K, V, C>
    where
        C: Compare<K>,
    {
        match self.tree.entry(&key) {
            Entry::Occupied(entry) => MapEntry::Occupied(OccupiedMapEntry { entry }),
            Entry::Vacant(entry) => MapEntry::Vacant(VacantMapEntry { key, entry }),
        }
    }

    /// Returns an iterator over the records in ascending key order.
    pub fn iter(&self) -> MapIter<'_, K, V, C> {
        MapIter {
            inner: self.tree.iter(),
        }
    }

    /// Returns the records with keys from `begin` up to, but not including, the first key ordered
    /// after `end`.
    ///
    /// ```
    /// use wavl_engine::WavlMap;
    ///
    /// let mut map = WavlMap::new();
    /// for key in (0..=120).step_by(5) {
    ///     let _ = map.insert(key, ());
    /// }
    ///
    /// let range = map.range(&6, &44);
    /// assert_eq!(range.end(), Some((&45, &())));
    ///
    /// let keys: Vec<i32> = range.map(|(k, _)| *k).collect();
    /// assert_eq!(keys, [10, 15, 20, 25, 30, 35, 40]);
    /// ```
    pub fn range<Q>(&self, begin: &Q, end: &Q) -> MapRange<'_, K, V, C>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        MapRange {
            inner: self.tree.range(begin, end),
        }
    }

    /// Returns the records with keys from `begin` down to, but not including, the first key
    /// ordered before `end`.
    pub fn range_rev<Q>(&self, begin: &Q, end: &Q) -> MapRange<'_, K, V, C>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        MapRange {
            inner: self.tree.range_rev(begin, end),
        }
    }

    /// Clears the map, removing all elements.
    #[inline]
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    pub fn height(&self) -> usize {
        self.tree.height()
    }

    /// Checks every structural invariant of the underlying tree. Takes _O(n)_ time.
    pub fn validate(&self) -> bool
    where
        C: Compare<K>,
    {
        self.tree.validate()
    }

    #[doc(hidden)]
    #[track_caller]
    pub fn assert_invariants(&self)
    where
        C: Compare<K>,
    {
        self.tree.assert_invariants();
    }

    /// Writes a Graphviz rendering of the tree to `w`, labelling each record with its key.
    pub fn dotgraph<W: fmt::Write>(&self, name: &str, w: W) -> fmt::Result
    where
        K: fmt::Debug,
    {
        self.tree.dotgraph(name, w)
    }
}

impl<K, V, C: Default> Default for WavlMap<K, V, C> {
    fn default() -> Self {
        Self::with_compare(C::default())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for WavlMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C> Extend<(K, V)> for WavlMap<K, V, C>
where
    C: Compare<K>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            let _ = self.insert(key, value);
        }
    }
}

impl<K, V, C> FromIterator<(K, V)> for WavlMap<K, V, C>
where
    C: Compare<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<'map, K, V, C> IntoIterator for &'map WavlMap<K, V, C> {
    type Item = (&'map K, &'map V);
    type IntoIter = MapIter<'map, K, V, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// === entries ===

/// A view into a single key of a [`WavlMap`], found by one search.
pub enum MapEntry<'map, K, V, C = NaturalOrder> {
    Occupied(OccupiedMapEntry<'map, K, V, C>),
    Vacant(VacantMapEntry<'map, K, V, C>),
}

pub struct OccupiedMapEntry<'map, K, V, C = NaturalOrder> {
    entry: OccupiedEntry<'map, MapNode<K, V>, C>,
}

pub struct VacantMapEntry<'map, K, V, C = NaturalOrder> {
    key: K,
    entry: VacantEntry<'map, MapNode<K, V>, C>,
}

impl<'map, K, V, C> MapEntry<'map, K, V, C>
where
    C: Compare<K>,
{
    pub fn status(&self) -> Status {
        match self {
            MapEntry::Occupied(_) => Status::OCCUPIED,
            MapEntry::Vacant(_) => Status::VACANT,
        }
    }

    pub fn key(&self) -> &K {
        match self {
            MapEntry::Occupied(occupied) => occupied.key(),
            MapEntry::Vacant(vacant) => vacant.key(),
        }
    }

    /// Calls `f` on the stored value if the key is present.
    pub fn and_modify(mut self, f: impl FnOnce(&mut V)) -> Self {
        if let MapEntry::Occupied(occupied) = &mut self {
            f(occupied.get_mut());
        }

        self
    }

    pub fn or_insert(self, default: V) -> &'map mut V {
        self.or_insert_with(|| default)
    }

    /// Inserts the value made by `default` if the key is absent. `default` is only called then.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'map mut V {
        match self {
            MapEntry::Occupied(occupied) => occupied.into_mut(),
            MapEntry::Vacant(vacant) => vacant.insert(default()),
        }
    }

    pub fn or_default(self) -> &'map mut V
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }

    /// Stores `value`, overwriting a present value or inserting a new record.
    pub fn insert_entry(self, value: V) -> OccupiedMapEntry<'map, K, V, C> {
        match self {
            MapEntry::Occupied(mut occupied) => {
                occupied.insert(value);
                occupied
            }
            MapEntry::Vacant(vacant) => vacant.insert_entry(value),
        }
    }

    /// Removes the record if the key is present.
    pub fn remove_entry(self) -> Outcome<(K, V)> {
        match self {
            MapEntry::Occupied(occupied) => Outcome::occupied(occupied.remove_entry()),
            MapEntry::Vacant(_) => Outcome::empty(),
        }
    }
}

impl<'map, K, V, C> OccupiedMapEntry<'map, K, V, C> {
    pub fn key(&self) -> &K {
        &self.entry.get().get_ref().key
    }

    pub fn get(&self) -> &V {
        &self.entry.get().get_ref().value
    }

    pub fn get_mut(&mut self) -> &mut V {
        value_mut(self.entry.get_mut())
    }

    pub fn into_mut(self) -> &'map mut V {
        value_mut(self.entry.into_mut())
    }

    /// Replaces the stored value, returning the old one.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }

    pub fn remove_entry(self) -> (K, V) {
        self.entry.remove().into_pair()
    }

    pub fn remove(self) -> V {
        self.remove_entry().1
    }
}

impl<'map, K, V, C> VacantMapEntry<'map, K, V, C>
where
    C: Compare<K>,
{
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the record where the search ended, without searching again.
    pub fn insert(self, value: V) -> &'map mut V {
        self.insert_entry(value).into_mut()
    }

    pub fn insert_entry(self, value: V) -> OccupiedMapEntry<'map, K, V, C> {
        let VacantMapEntry { key, entry } = self;

        OccupiedMapEntry {
            entry: entry.insert_entry(MapNode::boxed(key, value)),
        }
    }
}

// === iterators ===

/// An iterator over the records of a [`WavlMap`] in ascending key order.
pub struct MapIter<'map, K, V, C = NaturalOrder> {
    inner: Iter<'map, MapNode<K, V>, C>,
}

impl<'map, K, V, C> Iterator for MapIter<'map, K, V, C> {
    type Item = (&'map K, &'map V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|node| (&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, C> DoubleEndedIterator for MapIter<'_, K, V, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|node| (&node.key, &node.value))
    }
}

impl<K, V, C> ExactSizeIterator for MapIter<'_, K, V, C> {}

impl<K, V, C> FusedIterator for MapIter<'_, K, V, C> {}

/// An iterator over a run of records of a [`WavlMap`], in either direction.
pub struct MapRange<'map, K, V, C = NaturalOrder> {
    inner: Range<'map, MapNode<K, V>, C>,
}

impl<'map, K, V, C> MapRange<'map, K, V, C> {
    /// Returns the record that stops the run, or `None` if it runs to the end of the map.
    pub fn end(&self) -> Option<(&'map K, &'map V)> {
        self.inner.end().map(|node| (&node.key, &node.value))
    }
}

impl<'map, K, V, C> Iterator for MapRange<'map, K, V, C> {
    type Item = (&'map K, &'map V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|node| (&node.key, &node.value))
    }
}

impl<K, V, C> FusedIterator for MapRange<'_, K, V, C> {}
