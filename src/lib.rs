//! Weak AVL (WAVL) trees over two node storage strategies.
//!
//! - [`WavlTree`] links caller-provided records intrusively through [`Links`], keeping every record
//!   at a fixed address for as long as it is in the tree. [`WavlMap`] builds an owning map on top
//!   of it by boxing its records.
//! - [`HandleMap`] and [`HandleSet`] keep their nodes in an index-linked arena. Records are named
//!   by [`Handle`]s, which stay valid when the arena grows.
//!
//! Both strategies share one rebalancing engine, so every insertion and removal is _O(log(n))_
//! with at most two rotations, and no operation is amortized.
//!
//! Implementation based on the paper [Rank-Balanced Trees] by Haeupler, Sen and Tarjan.
//!
//! [Rank-Balanced Trees]: http://arks.princeton.edu/ark:/88435/pr1nz5z

// Conventions used in comments are from Haeupler, Sen and Tarjan:
// - The rank of a node `x` is denoted `r(x)`.
// - The parent of a node `x` is denoted `p(x)`.
// - The rank difference of a node `x` is given by `r(p(x)) - r(x)`.
// - A node `x` is an `i`-child if its rank difference is `i`.
// - A node is `i,j` if one of its children is an `i`-child and the other is a `j`-child.
// - A missing child has rank -1.
//
// The fundamental invariants of a WAVL tree are:
// 1. All rank differences are either 1 or 2.
// 2. All leaves have rank 0.
//
// Because of (1), a node only stores the parity of its rank. Comparing the parities of a node and
// its parent tells a 1-child (parities differ) from a 2-child (parities equal). While rebalancing,
// the same comparison tells a 0-child from a 1-child after a promotion, and a 2-child from a
// 3-child after a demotion; the engine always knows which of the two pairs is in play.

use core::{cmp::Ordering, ops::Not};

mod arena;
mod balance;
mod compare;
mod config;
mod cursor;
mod debug;
mod entry;
mod handle_map;
mod iter;
mod map;
mod parity;
mod status;
mod tree;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use crate::{
    arena::Handle,
    balance::Violation,
    compare::{Compare, NaturalOrder, OrderBy},
    config::{ArenaConfig, Growth},
    cursor::{Cursor, CursorMut},
    entry::{Entry, OccupiedEntry, VacantEntry},
    handle_map::{
        HandleEntry, HandleMap, HandleRange, HandleSet, OccupiedHandle, VacantHandle,
    },
    iter::{Iter, Range},
    map::{MapEntry, MapIter, MapRange, OccupiedMapEntry, VacantMapEntry, WavlMap},
    status::{Error, Outcome, Rejected, Status, StatusFlag},
    tree::{Links, TreeNode, WavlTree},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left = 0,
    Right = 1,
}

impl Dir {
    /// The direction a search for a key takes after comparing it against a node.
    #[inline]
    pub(crate) fn toward(order: Ordering) -> Dir {
        if order == Ordering::Greater {
            Dir::Right
        } else {
            Dir::Left
        }
    }

    /// The comparison result that sends a search in this direction.
    #[inline]
    pub(crate) fn order(self) -> Ordering {
        match self {
            Dir::Left => Ordering::Less,
            Dir::Right => Ordering::Greater,
        }
    }
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}
