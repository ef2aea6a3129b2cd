//! The rank-balance engine.
//!
//! Everything here is written once against [`RankTree`], which abstracts over how a node is named
//! (a pointer for intrusive trees, a slot index for arenas). The storage only has to provide links,
//! a root, and one parity bit per node; the sentinel `NIL` must report parity `true` (rank -1 is
//! odd) and must ignore writes.

use core::{cmp::Ordering, fmt};

use crate::Dir;

pub(crate) trait RankTree {
    type Node: Copy + Eq + fmt::Debug;

    /// The sentinel standing in for a missing child or parent.
    const NIL: Self::Node;

    fn root(&self) -> Self::Node;

    fn set_root(&mut self, root: Self::Node);

    fn child(&self, node: Self::Node, dir: Dir) -> Self::Node;

    fn set_child(&mut self, node: Self::Node, dir: Dir, child: Self::Node);

    fn parent(&self, node: Self::Node) -> Self::Node;

    fn set_parent(&mut self, node: Self::Node, parent: Self::Node);

    fn parity(&self, node: Self::Node) -> bool;

    fn set_parity(&mut self, node: Self::Node, parity: bool);
}

/// The outcome of one root-to-leaf search.
///
/// If `order` is `Equal`, `node` is the match. Otherwise `node` is the last node visited, and a new
/// node for the key belongs in its `Dir::toward(order)` child slot. `node` is `NIL` only when the
/// tree is empty.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Query<N> {
    pub(crate) node: N,
    pub(crate) order: Ordering,
}

impl<N: Copy> Query<N> {
    #[inline]
    pub(crate) fn found(&self) -> Option<N> {
        (self.order == Ordering::Equal).then_some(self.node)
    }
}

/// Searches for the node `order` considers equal.
///
/// `order(node)` compares the searched key against `node`'s key.
pub(crate) fn find<S>(tree: &S, mut order: impl FnMut(S::Node) -> Ordering) -> Query<S::Node>
where
    S: RankTree + ?Sized,
{
    let mut query = Query {
        node: S::NIL,
        order: Ordering::Less,
    };

    let mut seek = tree.root();
    while seek != S::NIL {
        query.node = seek;
        query.order = order(seek);

        if query.order == Ordering::Equal {
            break;
        }

        seek = tree.child(seek, Dir::toward(query.order));
    }

    query
}

/// Links `node` into the tree below `parent`, on the side given by `order`.
///
/// `parent` and `order` must come from a [`find`] that did not match; `parent` is `NIL` only for
/// the first node of an empty tree. `node`'s links are overwritten.
pub(crate) fn insert<S>(tree: &mut S, parent: S::Node, order: Ordering, node: S::Node)
where
    S: RankTree + ?Sized,
{
    tree.set_child(node, Dir::Left, S::NIL);
    tree.set_child(node, Dir::Right, S::NIL);
    tree.set_parent(node, S::NIL);
    tree.set_parity(node, false);

    if parent == S::NIL {
        debug_assert_eq!(tree.root(), S::NIL, "only an empty tree has no insertion parent");
        tree.set_root(node);
        return;
    }

    debug_assert_ne!(order, Ordering::Equal);

    // A leaf parent has rank 0, as does the new node, which violates the rank rule. A unary parent
    // has rank 1 and gains a 1-child.
    let rank_rule_break = is_leaf(tree, parent);

    tree.set_child(parent, Dir::toward(order), node);
    tree.set_parent(node, parent);

    if rank_rule_break {
        insert_fixup(tree, parent);
    }
}

// Rebalances after a new leaf made its former leaf parent `z` 0,1.
//
// Promotes `z` and climbs while the new parent is 0,1. Stops at the root, at a parent that is
// neither 0,1 nor 0,2, or fixes a 0,2 parent with one (double) rotation.
fn insert_fixup<S>(tree: &mut S, mut z: S::Node)
where
    S: RankTree + ?Sized,
{
    let mut x;
    loop {
        promote(tree, z);
        x = z;
        z = tree.parent(z);

        if z == S::NIL {
            return;
        }

        if !is_01_parent(tree, x, z, sibling(tree, z, x)) {
            break;
        }
    }

    if !is_02_parent(tree, x, z, sibling(tree, z, x)) {
        return;
    }

    debug_assert_ne!(x, S::NIL);
    debug_assert!(is_0_child(tree, z, x));

    let z_to_x = which_child(tree, z, x);
    let y = tree.child(x, !z_to_x);

    if y == S::NIL || is_2_child(tree, x, y) {
        rotate(tree, z, x, y, !z_to_x);
        demote(tree, z);
    } else {
        debug_assert!(is_1_child(tree, x, y));
        double_rotate(tree, z, x, y, z_to_x);
        promote(tree, y);
        demote(tree, x);
        demote(tree, z);
    }
}

/// Unlinks `node` from the tree and restores the rank rule.
///
/// `node`'s own links are reset; the caller decides what happens to its storage.
pub(crate) fn remove<S>(tree: &mut S, node: S::Node)
where
    S: RankTree + ?Sized,
{
    debug_assert_ne!(node, S::NIL);

    // `y` is the node spliced out of its position, `x` the subtree elevated into it, and `p` their
    // parent. If `node` has two children, `y` is its successor, which then takes `node`'s place
    // and rank.
    let left = tree.child(node, Dir::Left);
    let right = tree.child(node, Dir::Right);

    let (x, mut p, two_child) = if left == S::NIL || right == S::NIL {
        let y = node;
        let p = tree.parent(y);
        let x = if left == S::NIL { right } else { left };

        tree.set_parent(x, p);
        let two_child = p != S::NIL && is_2_child(tree, p, y);
        replace_child_or_set_root(tree, p, y, x);

        (x, p, two_child)
    } else {
        let y = extreme(tree, right, Dir::Left);
        let p = tree.parent(y);
        let x = tree.child(y, Dir::Right);

        tree.set_parent(x, p);
        let two_child = is_2_child(tree, p, y);
        replace_child(tree, p, y, x);
        transplant(tree, node, y);

        (x, if p == node { y } else { p }, two_child)
    };

    // `y` had at most one child, so `x` was a 1-child of `y`. `x` is now a 3-child if `y` was a
    // 2-child, and a 2-child otherwise. The latter is only a violation if `p` became a 2,2 leaf.
    if p != S::NIL {
        if two_child {
            rebalance_3_child(tree, p, x);
        } else if x == S::NIL && is_leaf(tree, p) {
            demote(tree, p);

            let leaf = p;
            p = tree.parent(leaf);

            if p != S::NIL && is_3_child(tree, p, leaf) {
                rebalance_3_child(tree, p, leaf);
            }
        }
    }

    tree.set_child(node, Dir::Left, S::NIL);
    tree.set_child(node, Dir::Right, S::NIL);
    tree.set_parent(node, S::NIL);
    tree.set_parity(node, false);
}

// Rebalances after `x` (possibly `NIL`) became a 3-child of `z`.
//
// Demotes up the tree while the sibling allows it, then finishes with at most one single or
// double rotation.
fn rebalance_3_child<S>(tree: &mut S, mut z: S::Node, mut x: S::Node)
where
    S: RankTree + ?Sized,
{
    debug_assert_ne!(z, S::NIL);

    loop {
        let y = sibling(tree, z, x);
        debug_assert_ne!(y, S::NIL, "a 3-child always has a sibling");

        if is_2_child(tree, z, y) {
            demote(tree, z);
        } else if is_22_parent(
            tree,
            tree.child(y, Dir::Left),
            y,
            tree.child(y, Dir::Right),
        ) {
            demote(tree, z);
            demote(tree, y);
        } else {
            // `z` is 1,3 and `y` is not 2,2.
            let z_to_x = which_child(tree, z, x);
            let v = tree.child(y, z_to_x);
            let w = tree.child(y, !z_to_x);

            if is_1_child(tree, y, w) {
                rotate(tree, z, y, v, z_to_x);
                promote(tree, y);
                demote(tree, z);

                // A leaf `z` drops by two in total.
                if is_leaf(tree, z) {
                    demote(tree, z);
                }
            } else {
                debug_assert!(is_1_child(tree, y, v));
                double_rotate(tree, z, y, v, !z_to_x);

                // `v` rises by two and `z` falls by two, which leaves their parities unchanged.
                demote(tree, y);

                // Rebalancing with promotion: promote a non-leaf 1,1 node among `z` and `y`.
                if !is_leaf(tree, z)
                    && is_11_parent(tree, tree.child(z, Dir::Left), z, tree.child(z, Dir::Right))
                {
                    promote(tree, z);
                } else if !is_leaf(tree, y)
                    && is_11_parent(tree, tree.child(y, Dir::Left), y, tree.child(y, Dir::Right))
                {
                    promote(tree, y);
                }
            }

            return;
        }

        x = z;
        z = tree.parent(z);

        if z == S::NIL || !is_3_child(tree, z, x) {
            return;
        }
    }
}

// Puts `replacement` in `remove`'s position, with `remove`'s children and rank.
fn transplant<S>(tree: &mut S, remove: S::Node, replacement: S::Node)
where
    S: RankTree + ?Sized,
{
    let parent = tree.parent(remove);
    tree.set_parent(replacement, parent);
    replace_child_or_set_root(tree, parent, remove, replacement);

    let left = tree.child(remove, Dir::Left);
    let right = tree.child(remove, Dir::Right);

    tree.set_parent(left, replacement);
    tree.set_parent(right, replacement);
    tree.set_child(replacement, Dir::Left, left);
    tree.set_child(replacement, Dir::Right, right);
    tree.set_parity(replacement, tree.parity(remove));
}

// Single rotation moving `x` above its parent `z`; `y` crosses from `x` to `z`.
//
// ```text
//       z            x
//     ╭─┴─╮        ╭─┴─╮
//     x   C   ->   A   z
//   ╭─┴─╮            ╭─┴─╮
//   A   y            y   C
// ```
//
// Drawn for `dir == Right`. Ranks are not updated.
fn rotate<S>(tree: &mut S, z: S::Node, x: S::Node, y: S::Node, dir: Dir)
where
    S: RankTree + ?Sized,
{
    let g = tree.parent(z);
    tree.set_parent(x, g);
    replace_child_or_set_root(tree, g, z, x);

    tree.set_child(x, dir, z);
    tree.set_parent(z, x);
    tree.set_child(z, !dir, y);
    tree.set_parent(y, z);
}

// Double rotation moving `y` above both its parent `x` and grandparent `z`.
//
// ```text
//       z              y
//     ╭─┴─╮          ╭─┴─╮
//     x   D          x   z
//   ╭─┴─╮     ->   ╭─┴─╮ ╭─┴─╮
//   A   y          A   B C   D
//     ╭─┴─╮
//     B   C
// ```
//
// Drawn for `dir == Left`, the side of `z` that holds `x`. Ranks are not updated.
fn double_rotate<S>(tree: &mut S, z: S::Node, x: S::Node, y: S::Node, dir: Dir)
where
    S: RankTree + ?Sized,
{
    let g = tree.parent(z);
    tree.set_parent(y, g);
    replace_child_or_set_root(tree, g, z, y);

    let inner = tree.child(y, dir);
    tree.set_child(x, !dir, inner);
    tree.set_parent(inner, x);
    tree.set_child(y, dir, x);
    tree.set_parent(x, y);

    let outer = tree.child(y, !dir);
    tree.set_child(z, dir, outer);
    tree.set_parent(outer, z);
    tree.set_child(y, !dir, z);
    tree.set_parent(z, y);
}

#[inline]
fn replace_child_or_set_root<S>(tree: &mut S, parent: S::Node, old: S::Node, new: S::Node)
where
    S: RankTree + ?Sized,
{
    if parent == S::NIL {
        tree.set_root(new);
    } else {
        replace_child(tree, parent, old, new);
    }
}

// Replaces the child link of `parent` pointing at `old` with `new`.
//
// `new`'s parent link is not updated.
#[inline]
fn replace_child<S>(tree: &mut S, parent: S::Node, old: S::Node, new: S::Node)
where
    S: RankTree + ?Sized,
{
    debug_assert!(
        tree.child(parent, Dir::Left) == old || tree.child(parent, Dir::Right) == old,
        "`old` must be a child of `parent`"
    );

    let dir = which_child(tree, parent, old);
    tree.set_child(parent, dir, new);
}

// `child` may be `NIL` if exactly one of `parent`'s children is missing.
#[inline]
fn which_child<S>(tree: &S, parent: S::Node, child: S::Node) -> Dir
where
    S: RankTree + ?Sized,
{
    if tree.child(parent, Dir::Right) == child {
        Dir::Right
    } else {
        Dir::Left
    }
}

#[inline]
fn sibling<S>(tree: &S, parent: S::Node, child: S::Node) -> S::Node
where
    S: RankTree + ?Sized,
{
    tree.child(parent, !which_child(tree, parent, child))
}

/// Returns the last node reached by walking from `node` in direction `dir`.
pub(crate) fn extreme<S>(tree: &S, mut node: S::Node, dir: Dir) -> S::Node
where
    S: RankTree + ?Sized,
{
    if node == S::NIL {
        return S::NIL;
    }

    loop {
        let next = tree.child(node, dir);
        if next == S::NIL {
            return node;
        }
        node = next;
    }
}

/// Returns the node following `node` in traversal direction `dir`, or `NIL` past the end.
pub(crate) fn next<S>(tree: &S, mut node: S::Node, dir: Dir) -> S::Node
where
    S: RankTree + ?Sized,
{
    if node == S::NIL {
        return S::NIL;
    }

    let child = tree.child(node, dir);
    if child != S::NIL {
        return extreme(tree, child, !dir);
    }

    // Climb until arriving from the side opposite the traversal.
    let mut parent = tree.parent(node);
    while parent != S::NIL && tree.child(parent, !dir) != node {
        node = parent;
        parent = tree.parent(node);
    }

    parent
}

/// Returns the `[begin, end)` bounds of the keys between two search keys in traversal order `dir`.
///
/// `begin` is the first node not ordered before the begin key, `end` the first node ordered after
/// the end key. When nothing lies between them both bounds name the same node, which may be a real
/// node rather than `NIL`.
pub(crate) fn equal_range<S>(
    tree: &S,
    begin: impl FnMut(S::Node) -> Ordering,
    end: impl FnMut(S::Node) -> Ordering,
    dir: Dir,
) -> (S::Node, S::Node)
where
    S: RankTree + ?Sized,
{
    if tree.root() == S::NIL {
        return (S::NIL, S::NIL);
    }

    let b = find(tree, begin);
    let b = if b.order == dir.order() {
        next(tree, b.node, dir)
    } else {
        b.node
    };

    let e = find(tree, end);
    let e = if e.order == (!dir).order() {
        e.node
    } else {
        next(tree, e.node, dir)
    };

    (b, e)
}

/// Returns the number of nodes on the longest root-to-leaf path.
pub(crate) fn height<S>(tree: &S) -> usize
where
    S: RankTree + ?Sized,
{
    fn height_at<S: RankTree + ?Sized>(tree: &S, node: S::Node) -> usize {
        if node == S::NIL {
            return 0;
        }

        let left = height_at(tree, tree.child(node, Dir::Left));
        let right = height_at(tree, tree.child(node, Dir::Right));
        1 + left.max(right)
    }

    height_at(tree, tree.root())
}

/// A broken tree invariant, as found by a validator.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("node {node} is out of order within its subtree bounds")]
    Order { node: String },

    #[error("node {node} does not link back to its parent {parent}")]
    ParentLink { node: String, parent: String },

    #[error("root {node} has a parent")]
    RootParent { node: String },

    #[error("the children of node {node} imply different ranks")]
    RankDifference { node: String },

    #[error("leaf {node} does not have rank 0")]
    LeafRank { node: String },

    #[error("counted {found} nodes but the tree records {expected}")]
    Count { expected: usize, found: usize },

    #[error("free list is corrupt: {reason}")]
    FreeList { reason: String },
}

fn name<N: fmt::Debug>(node: N) -> String {
    format!("{node:?}")
}

/// Checks search order, parent links, the rank rule and the node count.
///
/// `cmp(a, b)` compares the keys of two nodes. Ranks are rebuilt bottom-up from parities: each
/// child implies its parent's rank, and both children of a node must agree.
pub(crate) fn validate<S>(
    tree: &S,
    len: usize,
    mut cmp: impl FnMut(S::Node, S::Node) -> Ordering,
) -> Result<(), Violation>
where
    S: RankTree + ?Sized,
{
    let root = tree.root();
    if root != S::NIL && tree.parent(root) != S::NIL {
        return Err(Violation::RootParent { node: name(root) });
    }

    let mut count = 0;
    validate_at(tree, root, S::NIL, S::NIL, len, &mut cmp, &mut count)?;

    if count != len {
        return Err(Violation::Count {
            expected: len,
            found: count,
        });
    }

    Ok(())
}

// Returns the rank of `node`.
fn validate_at<S, F>(
    tree: &S,
    node: S::Node,
    low: S::Node,
    high: S::Node,
    len: usize,
    cmp: &mut F,
    count: &mut usize,
) -> Result<i64, Violation>
where
    S: RankTree + ?Sized,
    F: FnMut(S::Node, S::Node) -> Ordering,
{
    if node == S::NIL {
        return Ok(-1);
    }

    *count += 1;

    // More nodes than recorded means a cycle or a corrupt count; stop before recursing forever.
    if *count > len {
        return Err(Violation::Count {
            expected: len,
            found: *count,
        });
    }

    if (low != S::NIL && cmp(low, node) != Ordering::Less)
        || (high != S::NIL && cmp(node, high) != Ordering::Less)
    {
        return Err(Violation::Order { node: name(node) });
    }

    let mut implied = [0; 2];
    for dir in [Dir::Left, Dir::Right] {
        let child = tree.child(node, dir);

        if child != S::NIL && tree.parent(child) != node {
            return Err(Violation::ParentLink {
                node: name(child),
                parent: name(node),
            });
        }

        let (lo, hi) = match dir {
            Dir::Left => (low, node),
            Dir::Right => (node, high),
        };
        let child_rank = validate_at(tree, child, lo, hi, len, cmp, count)?;

        let difference = if tree.parity(node) == tree.parity(child) {
            2
        } else {
            1
        };
        implied[dir as usize] = child_rank + difference;
    }

    if implied[0] != implied[1] {
        return Err(Violation::RankDifference { node: name(node) });
    }

    if is_leaf(tree, node) && implied[0] != 0 {
        return Err(Violation::LeafRank { node: name(node) });
    }

    Ok(implied[0])
}

// Support methods ========================================================

// Rank changes only ever flip the parity bit. A change by two leaves it untouched, so double
// promotions and demotions need no code.

#[inline]
fn promote<S: RankTree + ?Sized>(tree: &mut S, node: S::Node) {
    let parity = tree.parity(node);
    tree.set_parity(node, !parity);
}

#[inline]
fn demote<S: RankTree + ?Sized>(tree: &mut S, node: S::Node) {
    let parity = tree.parity(node);
    tree.set_parity(node, !parity);
}

#[inline]
fn is_leaf<S: RankTree + ?Sized>(tree: &S, node: S::Node) -> bool {
    tree.child(node, Dir::Left) == S::NIL && tree.child(node, Dir::Right) == S::NIL
}

// The child predicates hold under the assumption that the rank difference is one of {0, 1} or one
// of {1, 2} or one of {2, 3}, whichever the caller is distinguishing.

#[inline]
fn is_0_child<S: RankTree + ?Sized>(tree: &S, parent: S::Node, x: S::Node) -> bool {
    tree.parity(parent) == tree.parity(x)
}

#[inline]
fn is_1_child<S: RankTree + ?Sized>(tree: &S, parent: S::Node, x: S::Node) -> bool {
    tree.parity(parent) != tree.parity(x)
}

#[inline]
fn is_2_child<S: RankTree + ?Sized>(tree: &S, parent: S::Node, x: S::Node) -> bool {
    tree.parity(parent) == tree.parity(x)
}

#[inline]
fn is_3_child<S: RankTree + ?Sized>(tree: &S, parent: S::Node, x: S::Node) -> bool {
    tree.parity(parent) != tree.parity(x)
}

// `x` is a 0-child and `y` a 1-child of `p`.
#[inline]
fn is_01_parent<S: RankTree + ?Sized>(tree: &S, x: S::Node, p: S::Node, y: S::Node) -> bool {
    let p = tree.parity(p);
    tree.parity(x) == p && tree.parity(y) != p
}

#[inline]
fn is_11_parent<S: RankTree + ?Sized>(tree: &S, x: S::Node, p: S::Node, y: S::Node) -> bool {
    let p = tree.parity(p);
    tree.parity(x) != p && tree.parity(y) != p
}

// `x` is a 0-child and `y` a 2-child of `p`.
#[inline]
fn is_02_parent<S: RankTree + ?Sized>(tree: &S, x: S::Node, p: S::Node, y: S::Node) -> bool {
    let p = tree.parity(p);
    tree.parity(x) == p && tree.parity(y) == p
}

#[inline]
fn is_22_parent<S: RankTree + ?Sized>(tree: &S, x: S::Node, p: S::Node, y: S::Node) -> bool {
    let p = tree.parity(p);
    tree.parity(x) == p && tree.parity(y) == p
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal store over plain vectors, with slot 0 as the sentinel.
    struct VecTree {
        root: usize,
        keys: Vec<u32>,
        links: Vec<[usize; 3]>,
        parity: Vec<bool>,
    }

    impl VecTree {
        fn new() -> Self {
            VecTree {
                root: 0,
                keys: vec![0],
                links: vec![[0; 3]],
                parity: vec![true],
            }
        }

        fn insert(&mut self, key: u32) -> bool {
            let keys = &self.keys;
            let query = find(self, |n| key.cmp(&keys[n]));
            if query.found().is_some() {
                return false;
            }

            let node = self.keys.len();
            self.keys.push(key);
            self.links.push([0; 3]);
            self.parity.push(false);
            insert(self, query.node, query.order, node);
            true
        }

        fn remove(&mut self, key: u32) -> bool {
            let keys = &self.keys;
            match find(self, |n| key.cmp(&keys[n])).found() {
                Some(node) => {
                    remove(self, node);
                    true
                }
                None => false,
            }
        }

        fn check(&self, len: usize) {
            validate(self, len, |a, b| self.keys[a].cmp(&self.keys[b])).unwrap();
        }

        fn in_order(&self) -> Vec<u32> {
            let mut out = Vec::new();
            let mut node = extreme(self, self.root, Dir::Left);
            while node != 0 {
                out.push(self.keys[node]);
                node = next(self, node, Dir::Right);
            }
            out
        }
    }

    impl RankTree for VecTree {
        type Node = usize;
        const NIL: usize = 0;

        fn root(&self) -> usize {
            self.root
        }

        fn set_root(&mut self, root: usize) {
            self.root = root;
        }

        fn child(&self, node: usize, dir: Dir) -> usize {
            self.links[node][dir as usize]
        }

        fn set_child(&mut self, node: usize, dir: Dir, child: usize) {
            if node != 0 {
                self.links[node][dir as usize] = child;
            }
        }

        fn parent(&self, node: usize) -> usize {
            self.links[node][2]
        }

        fn set_parent(&mut self, node: usize, parent: usize) {
            if node != 0 {
                self.links[node][2] = parent;
            }
        }

        fn parity(&self, node: usize) -> bool {
            self.parity[node]
        }

        fn set_parity(&mut self, node: usize, parity: bool) {
            if node != 0 {
                self.parity[node] = parity;
            }
        }
    }

    #[test]
    fn ascending_inserts_stay_balanced() {
        let mut tree = VecTree::new();

        for key in 0..1024 {
            assert!(tree.insert(key));
            tree.check(key as usize + 1);
        }

        // Insert-only WAVL trees are AVL trees.
        assert!(height(&tree) <= 15);
        assert_eq!(tree.in_order(), (0..1024).collect::<Vec<_>>());
    }

    #[test]
    fn removals_keep_rank_rule() {
        let mut tree = VecTree::new();
        let keys: Vec<u32> = (0..200).map(|i| (i * 37) % 200).collect();

        for &key in &keys {
            tree.insert(key);
        }

        for (removed, &key) in keys.iter().enumerate().filter(|(_, k)| *k % 3 != 0) {
            assert!(tree.remove(key), "{removed}: {key}");
        }

        let remaining: Vec<u32> = (0..200).filter(|k| k % 3 == 0).collect();
        tree.check(remaining.len());
        assert_eq!(tree.in_order(), remaining);
        assert!(!tree.remove(1));
    }

    #[test]
    fn equal_range_bounds() {
        let mut tree = VecTree::new();
        for key in (0..=120).step_by(5) {
            tree.insert(key);
        }

        let keys = &tree.keys;
        let (b, e) = equal_range(
            &tree,
            |n| 6.cmp(&keys[n]),
            |n| 44.cmp(&keys[n]),
            Dir::Right,
        );
        assert_eq!((keys[b], keys[e]), (10, 45));

        let (b, e) = equal_range(
            &tree,
            |n| 119.cmp(&keys[n]),
            |n| 84.cmp(&keys[n]),
            Dir::Left,
        );
        assert_eq!((keys[b], keys[e]), (115, 80));

        // Nothing between 6 and 7: both bounds name 10.
        let (b, e) = equal_range(
            &tree,
            |n| 6.cmp(&keys[n]),
            |n| 7.cmp(&keys[n]),
            Dir::Right,
        );
        assert_eq!(b, e);
        assert_eq!(keys[b], 10);

        let (b, e) = equal_range(
            &tree,
            |n| 121.cmp(&keys[n]),
            |n| 200.cmp(&keys[n]),
            Dir::Right,
        );
        assert_eq!((b, e), (0, 0));
    }

    #[test]
    fn validator_rejects_bad_parity() {
        let mut tree = VecTree::new();
        for key in [2, 1, 3] {
            tree.insert(key);
        }
        tree.check(3);

        // Make the left leaf rank 1.
        let leaf = tree.links[tree.root][0];
        tree.parity[leaf] = !tree.parity[leaf];
        assert!(validate(&tree, 3, |a, b| tree.keys[a].cmp(&tree.keys[b])).is_err());
    }

    #[test]
    fn validator_rejects_wrong_count() {
        let mut tree = VecTree::new();
        tree.insert(1);
        assert_eq!(
            validate(&tree, 2, |a, b| tree.keys[a].cmp(&tree.keys[b])),
            Err(Violation::Count {
                expected: 2,
                found: 1
            })
        );
    }
}
