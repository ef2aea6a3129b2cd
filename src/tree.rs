use core::{
    borrow::Borrow, cell::UnsafeCell, cmp::Ordering, fmt, marker::PhantomPinned, mem, pin::Pin,
    ptr::NonNull,
};

use cordyceps::Linked;
use tracing::error;

use crate::{
    balance::{self, Query, RankTree, Violation},
    compare::{Compare, NaturalOrder},
    cursor::{Cursor, CursorMut},
    entry::{Entry, OccupiedEntry, VacantEntry},
    iter::{Iter, Range},
    Dir,
};

/// A record that can be linked into a [`WavlTree`].
pub trait TreeNode<L>: Linked<L> {
    type Key;

    fn key(&self) -> &Self::Key;
}

/// An intrusive weak AVL tree, or WAVL tree.
///
/// The tree never allocates. Records are handed over as [`Linked::Handle`]s and handed back the
/// same way when they are removed, so the handle type decides who owns the storage: a `Box` makes
/// the tree the owner, while a borrowed or raw handle leaves the storage with the caller, who must
/// keep it alive and in place while it is linked.
///
/// Keys are ordered by the comparator `C`, which defaults to the key's [`Ord`] implementation.
pub struct WavlTree<T, C = NaturalOrder>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    root: Link<T>,
    len: usize,
    compare: C,
}

/// The links a record embeds to take part in a [`WavlTree`].
pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[repr(C)]
struct LinksInner<T: ?Sized> {
    parent: Link<T>,
    children: [Link<T>; 2],
    // Parity of the node's rank. The missing node has rank -1, so its parity is `true`.
    parity: bool,
    _unpin: PhantomPinned,
}

pub(crate) type Link<T> = Option<NonNull<T>>;

// Every non-NIL node the engine sees is linked into the tree that lends it out, and the tree is
// borrowed for as long as the returned reference lives.
#[inline]
pub(crate) unsafe fn item<'a, T: ?Sized>(node: Link<T>) -> &'a T {
    match node {
        Some(node) => unsafe { node.as_ref() },
        None => unreachable!("the sentinel holds no item"),
    }
}

#[inline]
unsafe fn links<'a, T>(node: NonNull<T>) -> &'a Links<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    unsafe { T::links(node).as_ref() }
}

#[inline]
unsafe fn links_mut<'a, T>(node: NonNull<T>) -> &'a mut Links<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    unsafe { T::links(node).as_mut() }
}

impl<T> WavlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree.
    pub const fn new() -> WavlTree<T> {
        WavlTree::with_compare(NaturalOrder)
    }
}

impl<T, C> WavlTree<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree ordered by `compare`.
    pub const fn with_compare(compare: C) -> WavlTree<T, C> {
        WavlTree {
            root: None,
            len: 0,
            compare,
        }
    }

    /// Returns `true` if the tree contains no elements.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn compare(&self) -> &C {
        &self.compare
    }

    pub(crate) fn find<Q>(&self, key: &Q) -> Query<Link<T>>
    where
        T::Key: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let compare = &self.compare;
        balance::find(self, |node| {
            compare.compare(key, unsafe { item(node) }.key().borrow())
        })
    }

    pub(crate) fn get_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        // The linked store names nodes by `Link<T>`, so a match arrives doubly wrapped.
        self.find(key).found().flatten()
    }

    /// Returns a reference to the element corresponding to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    /// Returns a pinned mutable reference to the element corresponding to `key`.
    ///
    /// The element's links cannot be reached through the pin. Changing how its key compares to
    /// the other keys leaves the tree unordered, though never unsound.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<Pin<&mut T>>
    where
        T::Key: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let mut ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_mut())) }
    }

    /// Returns `true` if the tree contains an element for `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.get_raw(key).is_some()
    }

    pub(crate) fn first_raw(&self) -> Link<T> {
        balance::extreme(self, self.root, Dir::Left)
    }

    pub(crate) fn last_raw(&self) -> Link<T> {
        balance::extreme(self, self.root, Dir::Right)
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<Pin<&T>> {
        self.first_raw()
            .map(|first| unsafe { Pin::new_unchecked(first.as_ref()) })
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<Pin<&T>> {
        self.last_raw()
            .map(|last| unsafe { Pin::new_unchecked(last.as_ref()) })
    }

    /// Returns the element after `node` in traversal direction `dir`.
    pub(crate) fn step(&self, node: Link<T>, dir: Dir) -> Link<T> {
        balance::next(self, node, dir)
    }

    /// Searches for `key` once and returns an entry for mutating it.
    pub fn entry<Q>(&mut self, key: &Q) -> Entry<'_, T, C>
    where
        T::Key: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let query = self.find(key);

        match query.found().flatten() {
            Some(node) => Entry::Occupied(OccupiedEntry::new(self, node)),
            None => Entry::Vacant(VacantEntry::new(self, query.node, query.order)),
        }
    }

    /// Inserts an element into the tree.
    ///
    /// If an element with an equal key is already present, `item` takes its place and the
    /// displaced element is returned.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, item: T::Handle) -> Option<T::Handle>
    where
        C: Compare<T::Key>,
    {
        let ptr = T::into_ptr(item);
        let query = self.find(unsafe { ptr.as_ref() }.key());

        match query.found().flatten() {
            Some(old) => Some(unsafe { self.replace_at(old, ptr) }),
            None => {
                unsafe { self.insert_at(query.node, query.order, ptr) };
                None
            }
        }
    }

    /// Inserts an element into the tree unless an element with an equal key is present, in
    /// which case `item` is returned untouched.
    pub fn try_insert(&mut self, item: T::Handle) -> Result<Pin<&mut T>, T::Handle>
    where
        C: Compare<T::Key>,
    {
        let mut ptr = T::into_ptr(item);
        let query = self.find(unsafe { ptr.as_ref() }.key());

        if query.found().is_some() {
            return Err(unsafe { T::from_ptr(ptr) });
        }

        unsafe {
            self.insert_at(query.node, query.order, ptr);
            Ok(Pin::new_unchecked(ptr.as_mut()))
        }
    }

    // Links `ptr` where a search ended without a match.
    pub(crate) unsafe fn insert_at(&mut self, parent: Link<T>, order: Ordering, ptr: NonNull<T>) {
        balance::insert(self, parent, order, Some(ptr));
        self.len += 1;
    }

    // Puts `new` in `old`'s place, with `old`'s links and rank, and hands `old` back.
    pub(crate) unsafe fn replace_at(&mut self, old: NonNull<T>, new: NonNull<T>) -> T::Handle {
        let (old, new) = (Some(old), Some(new));

        let parent = self.parent(old);
        let left = self.child(old, Dir::Left);
        let right = self.child(old, Dir::Right);
        let parity = self.parity(old);

        match parent {
            Some(_) if self.child(parent, Dir::Left) == old => {
                self.set_child(parent, Dir::Left, new)
            }
            Some(_) => self.set_child(parent, Dir::Right, new),
            None => self.root = new,
        }

        self.set_parent(left, new);
        self.set_parent(right, new);

        self.set_parent(new, parent);
        self.set_child(new, Dir::Left, left);
        self.set_child(new, Dir::Right, right);
        self.set_parity(new, parity);

        match old {
            Some(old) => unsafe {
                links_mut(old).clear();
                T::from_ptr(old)
            },
            None => unreachable!(),
        }
    }

    /// Removes the element corresponding to `key`.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let node = self.get_raw(key)?;
        unsafe { Some(self.remove_at(node)) }
    }

    /// Removes an element from the tree.
    ///
    /// This operation completes in _O(log(n))_ time.
    ///
    /// # Safety
    ///
    /// `node` must be an element of this tree.
    pub unsafe fn remove_at(&mut self, node: NonNull<T>) -> T::Handle {
        balance::remove(self, Some(node));
        self.len -= 1;

        unsafe { T::from_ptr(node) }
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T::Handle> {
        let first = self.first_raw()?;
        unsafe { Some(self.remove_at(first)) }
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<T::Handle> {
        let last = self.last_raw()?;
        unsafe { Some(self.remove_at(last)) }
    }

    /// Clears the tree, removing all elements.
    ///
    /// Each element's handle is dropped. This takes _O(n)_ time and does no rebalancing.
    pub fn clear(&mut self) {
        let mut opt_cur = self.root;

        while opt_cur.is_some() {
            // Descend to the minimum node, which is the root or a left child.
            let cur = balance::extreme(self, opt_cur, Dir::Left);
            let parent = self.parent(cur);
            let right = self.child(cur, Dir::Right);

            // Elevate the node's right child (which may be missing).
            match parent {
                Some(_) => self.set_child(parent, Dir::Left, right),
                None => self.root = right,
            }
            self.set_parent(right, parent);

            if let Some(cur) = cur {
                unsafe {
                    links_mut(cur).clear();
                    drop(T::from_ptr(cur));
                }
            }
            self.len -= 1;

            // If the node had no right child, climb to the parent. If the node had no parent,
            // the tree is empty.
            opt_cur = right.or(parent);
        }

        debug_assert!(self.root.is_none());
        debug_assert_eq!(self.len(), 0);
    }

    /// Returns an iterator over the elements in ascending key order.
    pub fn iter(&self) -> Iter<'_, T, C> {
        Iter::new(self)
    }

    /// Returns the elements with keys from `begin` up to, but not including, the first key
    /// ordered after `end`.
    pub fn range<Q>(&self, begin: &Q, end: &Q) -> Range<'_, T, C>
    where
        T::Key: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.equal_range(begin, end, Dir::Right)
    }

    /// Returns the elements with keys from `begin` down to, but not including, the first key
    /// ordered before `end`.
    pub fn range_rev<Q>(&self, begin: &Q, end: &Q) -> Range<'_, T, C>
    where
        T::Key: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.equal_range(begin, end, Dir::Left)
    }

    fn equal_range<Q>(&self, begin: &Q, end: &Q, dir: Dir) -> Range<'_, T, C>
    where
        T::Key: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let compare = &self.compare;
        let (next, end) = balance::equal_range(
            self,
            |node| compare.compare(begin, unsafe { item(node) }.key().borrow()),
            |node| compare.compare(end, unsafe { item(node) }.key().borrow()),
            dir,
        );

        Range::new(self, next, end, dir)
    }

    /// Returns a cursor pointing to the minimum element of the tree.
    pub fn cursor_first(&self) -> Cursor<'_, T, C> {
        Cursor::new(self, self.first_raw())
    }

    /// Returns a cursor pointing to the maximum element of the tree.
    pub fn cursor_last(&self) -> Cursor<'_, T, C> {
        Cursor::new(self, self.last_raw())
    }

    /// Returns a cursor pointing to the element for `key`, or to the "ghost" non-element if there
    /// is none.
    pub fn cursor_at<Q>(&self, key: &Q) -> Cursor<'_, T, C>
    where
        T::Key: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        Cursor::new(self, self.get_raw(key))
    }

    /// Returns a mutable cursor pointing to the minimum element of the tree.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, T, C> {
        let first = self.first_raw();
        CursorMut::new(self, first)
    }

    /// Returns a mutable cursor pointing to the maximum element of the tree.
    pub fn cursor_last_mut(&mut self) -> CursorMut<'_, T, C> {
        let last = self.last_raw();
        CursorMut::new(self, last)
    }

    /// Returns the number of elements on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        balance::height(self)
    }

    fn check(&self) -> Result<(), Violation>
    where
        C: Compare<T::Key>,
    {
        let compare = &self.compare;
        balance::validate(self, self.len, |a, b| unsafe {
            compare.compare(item(a).key(), item(b).key())
        })
    }

    /// Checks key order, parent links, the rank rule and the element count. Takes _O(n)_ time.
    pub fn validate(&self) -> bool
    where
        C: Compare<T::Key>,
    {
        match self.check() {
            Ok(()) => true,
            Err(violation) => {
                error!(%violation, len = self.len, "tree failed validation");
                false
            }
        }
    }

    #[doc(hidden)]
    #[track_caller]
    pub fn assert_invariants(&self)
    where
        C: Compare<T::Key>,
    {
        if let Err(violation) = self.check() {
            panic!("tree invariant violated: {violation}");
        }
    }

    /// Writes a Graphviz rendering of the tree to `w`, labelling each element with its key.
    pub fn dotgraph<W: fmt::Write>(&self, name: &str, w: W) -> fmt::Result
    where
        T::Key: fmt::Debug,
    {
        crate::debug::dotgraph(self, name, |node| unsafe { item(node) }.key(), w)
    }
}

impl<T, C> RankTree for WavlTree<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    type Node = Link<T>;

    const NIL: Link<T> = None;

    #[inline]
    fn root(&self) -> Link<T> {
        self.root
    }

    #[inline]
    fn set_root(&mut self, root: Link<T>) {
        self.root = root;
    }

    #[inline]
    fn child(&self, node: Link<T>, dir: Dir) -> Link<T> {
        node.and_then(|node| unsafe { links(node) }.child(dir))
    }

    #[inline]
    fn set_child(&mut self, node: Link<T>, dir: Dir, child: Link<T>) {
        if let Some(node) = node {
            unsafe { links_mut(node) }.set_child(dir, child);
        }
    }

    #[inline]
    fn parent(&self, node: Link<T>) -> Link<T> {
        node.and_then(|node| unsafe { links(node) }.parent())
    }

    #[inline]
    fn set_parent(&mut self, node: Link<T>, parent: Link<T>) {
        if let Some(node) = node {
            unsafe { links_mut(node) }.set_parent(parent);
        }
    }

    #[inline]
    fn parity(&self, node: Link<T>) -> bool {
        match node {
            Some(node) => unsafe { links(node) }.parity(),
            None => true,
        }
    }

    #[inline]
    fn set_parity(&mut self, node: Link<T>, parity: bool) {
        if let Some(node) = node {
            unsafe { links_mut(node) }.set_parity(parity);
        }
    }
}

impl<T, C> Drop for WavlTree<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, C: Default> Default for WavlTree<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn default() -> Self {
        WavlTree::with_compare(C::default())
    }
}

impl<T, C> fmt::Debug for WavlTree<T, C>
where
    T: TreeNode<Links<T>> + fmt::Debug + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'tree, T, C> IntoIterator for &'tree WavlTree<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    type Item = &'tree T;
    type IntoIter = Iter<'tree, T, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// === impl Links ===

impl<T: ?Sized> Links<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                parity: false,
                _unpin: PhantomPinned,
            }),
        }
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    fn parity(&self) -> bool {
        unsafe { (*self.inner.get()).parity }
    }

    #[inline]
    fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    fn set_parity(&mut self, parity: bool) {
        self.inner.get_mut().parity = parity;
    }

    fn clear(&mut self) {
        let inner = self.inner.get_mut();
        inner.parent = None;
        inner.children = [None; 2];
        inner.parity = false;
    }
}

impl<T: ?Sized> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("parent", &self.parent())
            .field("left", &self.child(Dir::Left))
            .field("right", &self.child(Dir::Right))
            .field("parity", &self.parity())
            .finish()
    }
}

// Links are only touched through the tree that owns them.
unsafe impl<T: Send + ?Sized> Send for Links<T> {}
unsafe impl<T: Sync + ?Sized> Sync for Links<T> {}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::prelude::v1::*;

    use super::*;
    use crate::{compare::OrderBy, model::TestNode};

    fn node(key: u32) -> Box<TestNode> {
        TestNode::new(key)
    }

    // A node the caller keeps; the tree only borrows it through a raw handle.
    #[repr(C)]
    struct Borrowed {
        links: Links<Borrowed>,
        key: u32,
    }

    unsafe impl Linked<Links<Borrowed>> for Borrowed {
        type Handle = NonNull<Borrowed>;

        fn into_ptr(r: Self::Handle) -> NonNull<Self> {
            r
        }

        unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
            ptr
        }

        unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<Borrowed>> {
            ptr.cast()
        }
    }

    impl TreeNode<Links<Borrowed>> for Borrowed {
        type Key = u32;

        fn key(&self) -> &Self::Key {
            &self.key
        }
    }

    fn insert_find_all(keys: &[u32]) {
        let mut tree: WavlTree<TestNode> = WavlTree::new();

        for &key in keys {
            assert!(tree.insert(node(key)).is_none());
            tree.assert_invariants();
        }

        for key in keys {
            let node = tree.get_raw(key).expect("item not found");
            assert_eq!(unsafe { node.as_ref().key() }, key);
        }
    }

    #[test]
    fn zero_elems_find() {
        insert_find_all(&[]);
    }

    #[test]
    fn three_elems_find() {
        insert_find_all(&[0, 1, 2]);
        insert_find_all(&[0, 2, 1]);
        insert_find_all(&[1, 0, 2]);
        insert_find_all(&[1, 2, 0]);
        insert_find_all(&[2, 0, 1]);
        insert_find_all(&[2, 1, 0]);
    }

    #[test]
    fn insert_swaps_equal_keys() {
        let mut tree: WavlTree<TestNode> = WavlTree::new();
        for key in [4, 2, 6, 1, 3] {
            tree.insert(node(key));
        }

        let replacement = node(2);
        let replacement_addr: *const TestNode = &*replacement;

        let old = tree.insert(replacement).expect("key 2 was present");
        assert_eq!(old.key, 2);
        assert!(old.links.parent().is_none());
        assert_eq!(tree.len(), 5);
        tree.assert_invariants();

        let found: *const TestNode = &*tree.get(&2).unwrap();
        assert_eq!(found, replacement_addr);

        // The root can be swapped too.
        let root = unsafe { item(tree.root) }.key;
        assert!(tree.insert(node(root)).is_some());
        tree.assert_invariants();
    }

    #[test]
    fn try_insert_leaves_tree_alone_on_hit() {
        let mut tree: WavlTree<TestNode> = WavlTree::new();
        assert!(tree.try_insert(node(1)).is_ok());

        let rejected = tree.try_insert(node(1)).map(|_| ()).unwrap_err();
        assert_eq!(rejected.key, 1);
        assert_eq!(tree.len(), 1);
        tree.assert_invariants();
    }

    #[test]
    fn clear_drops_everything() {
        let mut tree: WavlTree<TestNode> = WavlTree::new();
        for key in 0..100 {
            tree.insert(node((key * 31) % 100));
        }

        tree.clear();
        assert!(tree.is_empty());
        assert!(tree.first().is_none());
        tree.assert_invariants();
    }

    #[test]
    fn borrowed_nodes_stay_with_the_caller() {
        let mut storage: Box<[Borrowed]> = (0..16)
            .map(|key| Borrowed {
                links: Links::new(),
                key: 15 - key,
            })
            .collect();
        let base = storage.as_mut_ptr();

        {
            let mut tree: WavlTree<Borrowed> = WavlTree::new();
            for i in 0..16 {
                let ptr = unsafe { NonNull::new_unchecked(base.add(i)) };
                assert!(tree.insert(ptr).is_none());
            }
            tree.assert_invariants();

            let removed = tree.remove(&7).unwrap();
            assert_eq!(removed, unsafe { NonNull::new_unchecked(base.add(8)) });
            assert_eq!(tree.len(), 15);
        }

        // Dropping the tree unlinked the nodes without freeing them.
        assert!(storage.iter().all(|node| node.links.parent().is_none()));
        assert_eq!(storage[0].key, 15);
    }

    #[test]
    fn custom_order() {
        let mut tree = WavlTree::with_compare(OrderBy(|a: &u32, b: &u32| b.cmp(a)));
        for key in [3, 9, 1, 7] {
            tree.insert(node(key));
        }

        let keys: Vec<u32> = tree.iter().map(|n: &TestNode| n.key).collect();
        assert_eq!(keys, [9, 7, 3, 1]);
        assert_eq!(tree.first().map(|n| n.key), Some(9));
        tree.assert_invariants();
    }

    #[test]
    fn validate_reports_damage() {
        let mut tree: WavlTree<TestNode> = WavlTree::new();
        for key in [2, 1, 3] {
            tree.insert(node(key));
        }
        assert!(tree.validate());

        let left = tree.child(tree.root, Dir::Left);
        let parity = tree.parity(left);
        tree.set_parity(left, !parity);
        assert!(!tree.validate());
        tree.set_parity(left, parity);
    }
}
