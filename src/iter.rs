use core::iter::FusedIterator;

use crate::{
    compare::NaturalOrder,
    tree::{item, Link},
    Dir, Links, TreeNode, WavlTree,
};

/// An iterator over the elements of a [`WavlTree`] in ascending key order.
pub struct Iter<'tree, T, C = NaturalOrder>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    tree: &'tree WavlTree<T, C>,

    front: Link<T>,
    back: Link<T>,

    len: usize,
}

impl<'tree, T, C> Iter<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn new(tree: &'tree WavlTree<T, C>) -> Self {
        Iter {
            tree,

            front: tree.first_raw(),
            back: tree.last_raw(),
            len: tree.len(),
        }
    }
}

impl<'tree, T, C> Iterator for Iter<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let cur = self.front;
        self.front = self.tree.step(cur, Dir::Right);
        self.len -= 1;

        Some(unsafe { item(cur) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<T, C> DoubleEndedIterator for Iter<'_, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let cur = self.back;
        self.back = self.tree.step(cur, Dir::Left);
        self.len -= 1;

        Some(unsafe { item(cur) })
    }
}

impl<T, C> ExactSizeIterator for Iter<'_, T, C> where T: TreeNode<Links<T>> + ?Sized {}

impl<T, C> FusedIterator for Iter<'_, T, C> where T: TreeNode<Links<T>> + ?Sized {}

/// An iterator over a run of elements of a [`WavlTree`], in either direction.
///
/// The run stops at its end element, which is compared by identity and not yielded. An empty run
/// starts at its end element, which need not be the end of the tree.
pub struct Range<'tree, T, C = NaturalOrder>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    tree: &'tree WavlTree<T, C>,
    next: Link<T>,
    end: Link<T>,
    dir: Dir,
}

impl<'tree, T, C> Range<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn new(tree: &'tree WavlTree<T, C>, next: Link<T>, end: Link<T>, dir: Dir) -> Self {
        Range {
            tree,
            next,
            end,
            dir,
        }
    }

    /// Returns the element that stops the run, or `None` if it runs to the end of the tree.
    pub fn end(&self) -> Option<&'tree T> {
        self.end.map(|end| unsafe { end.as_ref() })
    }

    /// Returns `true` if no elements remain.
    ///
    /// A begin key ordered after the end key never meets the end element; such a run stops at the
    /// end of the tree.
    pub fn is_empty(&self) -> bool {
        self.next == self.end || self.next.is_none()
    }
}

impl<'tree, T, C> Iterator for Range<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_empty() {
            return None;
        }

        let cur = self.next;
        self.next = self.tree.step(cur, self.dir);

        Some(unsafe { item(cur) })
    }
}

impl<T, C> FusedIterator for Range<'_, T, C> where T: TreeNode<Links<T>> + ?Sized {}

#[cfg(test)]
mod tests {
    use crate::model::TestNode;

    use super::*;

    #[test]
    fn iterates_from_both_ends() {
        let mut tree: WavlTree<TestNode> = WavlTree::new();
        for key in [5, 3, 8, 1, 4, 7, 9] {
            tree.insert(TestNode::new(key));
        }

        let mut iter = tree.iter();
        assert_eq!(iter.len(), 7);
        assert_eq!(iter.next().map(|n| n.key), Some(1));
        assert_eq!(iter.next_back().map(|n| n.key), Some(9));

        let middle: Vec<u32> = iter.by_ref().map(|n| n.key).collect();
        assert_eq!(middle, [3, 4, 5, 7, 8]);
        assert!(iter.next().is_none());
        assert!(iter.next_back().is_none());

        let reversed: Vec<u32> = tree.iter().rev().map(|n| n.key).collect();
        assert_eq!(reversed, [9, 8, 7, 5, 4, 3, 1]);
    }

    #[test]
    fn range_stops_at_end_element() {
        let mut tree: WavlTree<TestNode> = WavlTree::new();
        for key in (0..=40).step_by(10) {
            tree.insert(TestNode::new(key));
        }

        let range = tree.range(&5, &25);
        assert_eq!(range.end().map(|n| n.key), Some(30));
        assert_eq!(range.map(|n| n.key).collect::<Vec<_>>(), [10, 20]);

        let empty = tree.range(&11, &12);
        assert!(empty.is_empty());
        assert_eq!(empty.end().map(|n| n.key), Some(20));

        let tail = tree.range_rev(&100, &15);
        assert_eq!(tail.end().map(|n| n.key), Some(10));
        assert_eq!(tail.map(|n| n.key).collect::<Vec<_>>(), [40, 30, 20]);

        assert_eq!(tree.range_rev(&100, &0).count(), 5);
    }
}
