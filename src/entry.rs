use core::{cmp::Ordering, pin::Pin, ptr::NonNull};

use crate::{
    compare::{Compare, NaturalOrder},
    status::Status,
    tree::{item, Link},
    Links, TreeNode, WavlTree,
};

/// A view into a single entry in a [`WavlTree`], which may be either vacant or occupied.
///
/// An entry is the result of one search. Inserting through a vacant entry links the element where
/// that search ended, without walking the tree again.
pub enum Entry<'tree, T, C = NaturalOrder>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    Vacant(VacantEntry<'tree, T, C>),
    Occupied(OccupiedEntry<'tree, T, C>),
}

impl<'tree, T, C> Entry<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub fn status(&self) -> Status {
        match self {
            Entry::Vacant(_) => Status::VACANT,
            Entry::Occupied(_) => Status::OCCUPIED,
        }
    }

    /// Calls `f` on the element if the entry is occupied.
    pub fn and_modify(mut self, f: impl FnOnce(Pin<&mut T>)) -> Self {
        if let Entry::Occupied(occupied) = &mut self {
            f(occupied.get_mut());
        }

        self
    }

    /// Inserts `item` if the entry is vacant, otherwise drops it. Returns the element in the
    /// entry.
    pub fn or_insert(self, item: T::Handle) -> Pin<&'tree mut T>
    where
        C: Compare<T::Key>,
    {
        self.or_insert_with(|| item)
    }

    /// Inserts the element made by `f` if the entry is vacant. `f` is only called then.
    pub fn or_insert_with(self, f: impl FnOnce() -> T::Handle) -> Pin<&'tree mut T>
    where
        C: Compare<T::Key>,
    {
        match self {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => vacant.insert(f()),
        }
    }

    /// Stores `item` in the entry and returns the now occupied entry.
    ///
    /// An element already in the entry is replaced and its handle dropped; use
    /// [`OccupiedEntry::insert`] to keep it.
    pub fn insert_entry(self, item: T::Handle) -> OccupiedEntry<'tree, T, C>
    where
        C: Compare<T::Key>,
    {
        match self {
            Entry::Occupied(mut occupied) => {
                drop(occupied.insert(item));
                occupied
            }
            Entry::Vacant(vacant) => vacant.insert_entry(item),
        }
    }

    /// Removes the element if the entry is occupied.
    pub fn remove_entry(self) -> Option<T::Handle> {
        match self {
            Entry::Occupied(occupied) => Some(occupied.remove()),
            Entry::Vacant(_) => None,
        }
    }
}

pub struct VacantEntry<'tree, T, C = NaturalOrder>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    tree: &'tree mut WavlTree<T, C>,
    parent: Link<T>,
    order: Ordering,
}

impl<'tree, T, C> VacantEntry<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn new(tree: &'tree mut WavlTree<T, C>, parent: Link<T>, order: Ordering) -> Self {
        VacantEntry {
            tree,
            parent,
            order,
        }
    }

    /// Inserts `item` at the position of this entry.
    ///
    /// `item`'s key must be equal to the key used to retrieve this entry; any other key leaves
    /// the tree unordered.
    pub fn insert(self, item: T::Handle) -> Pin<&'tree mut T>
    where
        C: Compare<T::Key>,
    {
        self.insert_entry(item).into_mut()
    }

    pub fn insert_entry(self, item: T::Handle) -> OccupiedEntry<'tree, T, C>
    where
        C: Compare<T::Key>,
    {
        let ptr = T::into_ptr(item);

        if cfg!(debug_assertions) && self.parent.is_some() {
            let parent = unsafe { item_key(self.parent) };
            let key = unsafe { ptr.as_ref() }.key();
            assert_eq!(
                self.tree.compare().compare(key, parent),
                self.order,
                "item key does not belong at this entry"
            );
        }

        unsafe { self.tree.insert_at(self.parent, self.order, ptr) };

        OccupiedEntry {
            tree: self.tree,
            node: ptr,
        }
    }
}

unsafe fn item_key<'a, T>(node: Link<T>) -> &'a T::Key
where
    T: TreeNode<Links<T>> + ?Sized + 'a,
{
    unsafe { item(node) }.key()
}

pub struct OccupiedEntry<'tree, T, C = NaturalOrder>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    tree: &'tree mut WavlTree<T, C>,
    node: NonNull<T>,
}

impl<'tree, T, C> OccupiedEntry<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn new(tree: &'tree mut WavlTree<T, C>, node: NonNull<T>) -> Self {
        OccupiedEntry { tree, node }
    }

    /// Returns a reference to the item in the entry.
    pub fn get(&self) -> Pin<&T> {
        // SAFETY: `self.tree` is mutably borrowed for `'tree`, and `self.node` is guaranteed
        // pinned by contract with `Linked`.
        unsafe { Pin::new_unchecked(self.node.as_ref()) }
    }

    /// Returns a pinned mutable reference to the item in the entry.
    pub fn get_mut(&mut self) -> Pin<&mut T> {
        unsafe { Pin::new_unchecked(self.node.as_mut()) }
    }

    /// Converts the entry into a pinned mutable reference that lives as long as the tree borrow.
    pub fn into_mut(self) -> Pin<&'tree mut T> {
        let mut node = self.node;
        unsafe { Pin::new_unchecked(node.as_mut()) }
    }

    /// Puts `item` in the place of the element in the entry, returning the previous element.
    ///
    /// `item`'s key must be equal to the key of the existing element.
    pub fn insert(&mut self, item: T::Handle) -> T::Handle {
        let new = T::into_ptr(item);
        let old = self.node;

        // Point this entry at the new item.
        self.node = new;

        unsafe { self.tree.replace_at(old, new) }
    }

    /// Removes and returns the item pointed to by this entry.
    pub fn remove(self) -> T::Handle {
        unsafe { self.tree.remove_at(self.node) }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::prelude::v1::*;

    use super::*;
    use crate::model::TestNode;

    fn addr(node: &TestNode) -> *const TestNode {
        node
    }

    #[test]
    fn vacant_then_occupied() {
        let mut tree: WavlTree<TestNode> = WavlTree::new();
        for key in [20, 10, 30] {
            tree.insert(TestNode::new(key));
        }

        let entry = tree.entry(&25);
        assert!(entry.status().is_vacant());
        assert_eq!(entry.or_insert(TestNode::new(25)).key, 25);
        tree.assert_invariants();

        let Entry::Occupied(found) = tree.entry(&25) else {
            panic!("25 was just inserted");
        };
        assert_eq!(found.get().key, 25);
        assert_eq!(tree.len(), 4);
        assert!(tree.get_raw(&25).is_some());
    }

    #[test]
    fn occupied_insert_swaps_the_element() {
        let mut tree: WavlTree<TestNode> = WavlTree::new();
        for key in 0..8 {
            tree.insert(TestNode::new(key));
        }

        let first = tree.get(&5).map(|n| addr(n.get_ref()));
        let replacement = TestNode::new(5);
        let second = addr(&replacement);

        let Entry::Occupied(mut occupied) = tree.entry(&5) else {
            panic!("5 is in the tree");
        };
        let old = occupied.insert(replacement);
        assert_eq!(Some(addr(&old)), first);
        assert_eq!(addr(occupied.get().get_ref()), second);

        assert_eq!(tree.get(&5).map(|n| addr(n.get_ref())), Some(second));
        assert_eq!(tree.len(), 8);
        tree.assert_invariants();
    }

    #[test]
    fn occupied_remove_unlinks() {
        let mut tree: WavlTree<TestNode> = WavlTree::new();
        for key in [4, 2, 6, 1, 3, 5, 7] {
            tree.insert(TestNode::new(key));
        }

        let removed = tree.entry(&4).remove_entry();
        assert_eq!(removed.map(|n| n.key), Some(4));
        assert!(tree.entry(&4).remove_entry().is_none());
        assert!(tree.get_raw(&4).is_none());
        assert!(tree.iter().map(|n| n.key).eq([1, 2, 3, 5, 6, 7]));
        tree.assert_invariants();
    }

    #[test]
    fn insert_entry_on_either_side() {
        let mut tree: WavlTree<TestNode> = WavlTree::new();

        let entry = tree.entry(&9).insert_entry(TestNode::new(9));
        assert_eq!(entry.get().key, 9);

        let entry = tree.entry(&9).insert_entry(TestNode::new(9));
        assert_eq!(entry.get().key, 9);
        assert_eq!(tree.len(), 1);
        tree.assert_invariants();
    }
}
