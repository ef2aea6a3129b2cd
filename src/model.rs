//! Reference models for property tests and fuzzing.
//!
//! Each `run_*` function drives the crate's containers and a standard library model through the
//! same operations, asserting that they agree and that every tree stays valid after every step.

extern crate std;

use std::{
    collections::{BTreeMap, BTreeSet},
    prelude::v1::*,
    ptr::NonNull,
};

use arbitrary::Arbitrary;
use cordyceps::Linked;
use proptest::strategy::{Just, Strategy};

use crate::{Handle, HandleMap, Links, TreeNode, WavlMap, WavlTree};

/// A boxed intrusive element keyed by a `u32`.
#[derive(Debug)]
#[repr(C)]
pub struct TestNode {
    pub links: Links<TestNode>,
    pub key: u32,
}

impl TestNode {
    pub fn new(key: u32) -> Box<TestNode> {
        Box::new(TestNode {
            links: Links::new(),
            key,
        })
    }
}

unsafe impl Linked<Links<TestNode>> for TestNode {
    type Handle = Box<TestNode>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        NonNull::from(Box::leak(r))
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<TestNode>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

impl TreeNode<Links<TestNode>> for TestNode {
    type Key = u32;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

/// A key operand: either an index into the keys currently stored, or a free-standing key.
#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

impl ItemValue {
    fn resolve(self, keys: &BTreeSet<u32>) -> u32 {
        match self {
            ItemValue::Index(idx) if !keys.is_empty() => {
                keys.iter().nth(idx % keys.len()).copied().unwrap_or(0)
            }
            ItemValue::Index(idx) => idx as u32,
            ItemValue::Random(key) => key,
        }
    }
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue),
    TryInsert(ItemValue),
    Get(ItemValue),
    Remove(ItemValue),
    Range(ItemValue, ItemValue),
    RangeRev(ItemValue, ItemValue),
    First,
    PopFirst,
    Last,
    PopLast,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        value_strategy().prop_map(Op::Insert),
        value_strategy().prop_map(Op::TryInsert),
        value_strategy().prop_map(Op::Get),
        value_strategy().prop_map(Op::Remove),
        (value_strategy(), value_strategy()).prop_map(|(a, b)| Op::Range(a, b)),
        (value_strategy(), value_strategy()).prop_map(|(a, b)| Op::RangeRev(a, b)),
        Just(Op::First),
        Just(Op::PopFirst),
        Just(Op::Last),
        Just(Op::PopLast),
    ]
}

/// The three containers under test, stepped in lockstep with a `BTreeMap`.
///
/// Values are the index of the operation that stored them, so replaced values are observable.
struct Subjects {
    model: BTreeMap<u32, usize>,
    tree: WavlTree<TestNode>,
    map: WavlMap<u32, usize>,
    arena: HandleMap<u32, usize>,
    handles: BTreeMap<u32, Handle>,
}

impl Subjects {
    fn new() -> Self {
        Subjects {
            model: BTreeMap::new(),
            tree: WavlTree::new(),
            map: WavlMap::new(),
            arena: HandleMap::new(),
            handles: BTreeMap::new(),
        }
    }

    fn keys(&self) -> BTreeSet<u32> {
        self.model.keys().copied().collect()
    }

    fn apply(&mut self, op_id: usize, op: Op) {
        let keys = self.keys();
        let ctx = |what: &str| format!("op #{op_id} ({op:?}): {what}");

        match op {
            Op::Insert(item) => {
                let key = item.resolve(&keys);
                let expect = self.model.insert(key, op_id);

                let from_tree = self.tree.insert(TestNode::new(key)).map(|n| n.key);
                assert_eq!(from_tree, expect.map(|_| key), "{}", ctx("tree"));

                assert_eq!(self.map.insert(key, op_id).unwrap(), expect, "{}", ctx("map"));

                let outcome = self.arena.insert(key, op_id);
                assert_eq!(outcome.is_occupied(), expect.is_some(), "{}", ctx("arena"));
                assert_eq!(outcome.unwrap(), expect, "{}", ctx("arena"));

                if expect.is_none() {
                    let handle = self.arena.handle_of(&key);
                    self.handles.insert(key, handle.expect("inserted key has a handle"));
                }
            }

            Op::TryInsert(item) => {
                let key = item.resolve(&keys);
                let expect = self.model.get(&key).copied();
                self.model.entry(key).or_insert(op_id);

                let from_tree = self.tree.try_insert(TestNode::new(key)).is_err();
                assert_eq!(from_tree, expect.is_some(), "{}", ctx("tree"));

                let outcome = self.map.try_insert(key, op_id);
                assert_eq!(outcome.is_occupied(), expect.is_some(), "{}", ctx("map"));
                assert_eq!(
                    outcome.unwrap().copied(),
                    Some(expect.unwrap_or(op_id)),
                    "{}",
                    ctx("map")
                );

                let outcome = self.arena.try_insert(key, op_id);
                let handle = outcome.unwrap().expect("growable arena never fails");
                match self.handles.get(&key) {
                    Some(&known) => assert_eq!(handle, known, "{}", ctx("arena handle")),
                    None => {
                        self.handles.insert(key, handle);
                    }
                }
            }

            Op::Get(item) => {
                let key = item.resolve(&keys);
                let expect = self.model.get(&key);

                let from_tree = self.tree.get(&key).map(|n| n.key);
                assert_eq!(from_tree, expect.map(|_| key), "{}", ctx("tree"));
                assert_eq!(self.map.get(&key), expect, "{}", ctx("map"));
                assert_eq!(self.arena.get(&key), expect, "{}", ctx("arena"));
            }

            Op::Remove(item) => {
                let key = item.resolve(&keys);
                let expect = self.model.remove(&key).map(|v| (key, v));

                let from_tree = self.tree.remove(&key).map(|n| n.key);
                assert_eq!(from_tree, expect.map(|(k, _)| k), "{}", ctx("tree"));
                assert_eq!(self.map.remove(&key).unwrap(), expect, "{}", ctx("map"));

                let handle = self.handles.remove(&key);
                let outcome = match handle {
                    Some(handle) => self.arena.remove_by_handle(handle),
                    None => self.arena.remove(&key),
                };
                assert_eq!(outcome.unwrap(), expect, "{}", ctx("arena"));
            }

            Op::Range(a, b) | Op::RangeRev(a, b) => {
                let (a, b) = (a.resolve(&keys), b.resolve(&keys));
                let (lo, hi) = (a.min(b), a.max(b));
                let rev = matches!(op, Op::RangeRev(..));

                let mut expect: Vec<u32> = self.model.range(lo..=hi).map(|(k, _)| *k).collect();
                let (from_tree, from_map, from_arena): (Vec<u32>, Vec<u32>, Vec<u32>) = if rev {
                    expect.reverse();
                    (
                        self.tree.range_rev(&hi, &lo).map(|n| n.key).collect(),
                        self.map.range_rev(&hi, &lo).map(|(k, _)| *k).collect(),
                        self.arena.range_rev(&hi, &lo).map(|(k, _)| *k).collect(),
                    )
                } else {
                    (
                        self.tree.range(&lo, &hi).map(|n| n.key).collect(),
                        self.map.range(&lo, &hi).map(|(k, _)| *k).collect(),
                        self.arena.range(&lo, &hi).map(|(k, _)| *k).collect(),
                    )
                };

                assert_eq!(from_tree, expect, "{}", ctx("tree"));
                assert_eq!(from_map, expect, "{}", ctx("map"));
                assert_eq!(from_arena, expect, "{}", ctx("arena"));
            }

            Op::First => {
                let expect = self.model.first_key_value();

                assert_eq!(self.tree.first().map(|n| &n.get_ref().key), expect.map(|(k, _)| k));
                assert_eq!(self.map.first_key_value(), expect, "{}", ctx("map"));
                assert_eq!(self.arena.first(), expect, "{}", ctx("arena"));
            }

            Op::Last => {
                let expect = self.model.last_key_value();

                assert_eq!(self.tree.last().map(|n| &n.get_ref().key), expect.map(|(k, _)| k));
                assert_eq!(self.map.last_key_value(), expect, "{}", ctx("map"));
                assert_eq!(self.arena.last(), expect, "{}", ctx("arena"));
            }

            Op::PopFirst => {
                let expect = self.model.pop_first();

                let from_tree = self.tree.pop_first().map(|n| n.key);
                assert_eq!(from_tree, expect.map(|(k, _)| k), "{}", ctx("tree"));
                assert_eq!(self.map.pop_first(), expect, "{}", ctx("map"));
                assert_eq!(self.arena.pop_first(), expect, "{}", ctx("arena"));

                if let Some((key, _)) = expect {
                    self.handles.remove(&key);
                }
            }

            Op::PopLast => {
                let expect = self.model.pop_last();

                let from_tree = self.tree.pop_last().map(|n| n.key);
                assert_eq!(from_tree, expect.map(|(k, _)| k), "{}", ctx("tree"));
                assert_eq!(self.map.pop_last(), expect, "{}", ctx("map"));
                assert_eq!(self.arena.pop_last(), expect, "{}", ctx("arena"));

                if let Some((key, _)) = expect {
                    self.handles.remove(&key);
                }
            }
        }
    }

    fn check(&self) {
        self.tree.assert_invariants();
        self.map.assert_invariants();
        self.arena.assert_invariants();

        assert_eq!(self.tree.len(), self.model.len());
        assert_eq!(self.map.len(), self.model.len());
        assert_eq!(self.arena.len(), self.model.len());

        assert!(self.model.keys().eq(self.tree.iter().map(|n| &n.key)));
        assert!(self.model.iter().eq(self.map.iter()));
        assert!(self.model.iter().eq(self.arena.iter()));

        for (key, &handle) in &self.handles {
            assert_eq!(
                self.arena.get_by_handle(handle).map(|(k, _)| k),
                Some(key),
                "handle moved"
            );
        }
    }
}

/// Runs `ops` against every container and a `BTreeMap`, validating all trees after each step.
pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut subjects = Subjects::new();

    for (op_id, op) in ops.into_iter().enumerate() {
        subjects.apply(op_id, op);
        subjects.check();
    }
}

#[derive(Clone, Debug, Arbitrary)]
pub enum CursorOp {
    // Get is not an operation as it's executed on every loop iteration to check equivalence.
    MovePrev,
    MoveNext,
    PeekNext,
    PeekPrev,
    RemoveCurrent,
    RemoveCurrentMovePrev,
}

pub fn cursor_op_strategy() -> impl Strategy<Value = CursorOp> {
    proptest::prop_oneof![
        Just(CursorOp::MovePrev),
        Just(CursorOp::MoveNext),
        Just(CursorOp::PeekNext),
        Just(CursorOp::PeekPrev),
        Just(CursorOp::RemoveCurrent),
        Just(CursorOp::RemoveCurrentMovePrev),
    ]
}

#[derive(Clone, Debug)]
pub struct CursorEquivalenceInput {
    pub values: Vec<u32>,
    pub ops: Vec<CursorOp>,
}

impl<'a> arbitrary::Arbitrary<'a> for CursorEquivalenceInput {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let num_values = u8::arbitrary(u)? % 100;
        let num_ops = u16::arbitrary(u)? % 1000;

        let values = core::iter::repeat_with(|| u32::arbitrary(u).unwrap_or(0))
            .take(num_values.into())
            .collect();

        let ops = core::iter::repeat_with(|| CursorOp::arbitrary(u).unwrap_or(CursorOp::MoveNext))
            .take(num_ops.into())
            .collect();

        Ok(CursorEquivalenceInput { values, ops })
    }
}

/// A cursor over a sorted `Vec`, with `None` as the ghost position.
struct VecCursor {
    values: Vec<u32>,
    pos: Option<usize>,
}

impl VecCursor {
    fn prev(&self) -> Option<usize> {
        match self.pos {
            Some(i) => i.checked_sub(1),
            None => self.values.len().checked_sub(1),
        }
    }

    fn next(&self) -> Option<usize> {
        match self.pos {
            Some(i) => Some(i + 1).filter(|&i| i < self.values.len()),
            None => (!self.values.is_empty()).then_some(0),
        }
    }

    fn at(&self, pos: Option<usize>) -> Option<u32> {
        pos.map(|i| self.values[i])
    }

    fn remove(&mut self, move_prev: bool) -> Option<u32> {
        let i = self.pos?;
        let prev = self.prev();
        let removed = self.values.remove(i);

        self.pos = if move_prev {
            prev
        } else {
            Some(i).filter(|&i| i < self.values.len())
        };

        Some(removed)
    }
}

/// Drives a `CursorMut` and a cursor over a sorted `Vec` through `ops`.
pub fn run_cursor_equivalence(mut values: Vec<u32>, ops: Vec<CursorOp>) {
    values.sort_unstable();
    values.dedup();

    let mut tree: WavlTree<TestNode> = WavlTree::new();
    for &key in &values {
        tree.insert(TestNode::new(key));
    }

    let mut model = VecCursor { values, pos: None };
    model.pos = model.next();

    let mut cursor = tree.cursor_first_mut();
    assert_eq!(model.at(model.pos), cursor.get().map(|n| n.key));

    for op in ops {
        match op {
            CursorOp::MoveNext => {
                model.pos = model.next();
                cursor.move_next();
            }

            CursorOp::MovePrev => {
                model.pos = model.prev();
                cursor.move_prev();
            }

            CursorOp::PeekNext => {
                assert_eq!(model.at(model.next()), cursor.peek_next().map(|n| n.key));
            }

            CursorOp::PeekPrev => {
                assert_eq!(model.at(model.prev()), cursor.peek_prev().map(|n| n.key));
            }

            CursorOp::RemoveCurrent => {
                let removed = cursor.remove_current().map(|n| n.key);
                assert_eq!(model.remove(false), removed);
            }

            CursorOp::RemoveCurrentMovePrev => {
                let removed = cursor.remove_current_and_move_prev().map(|n| n.key);
                assert_eq!(model.remove(true), removed);
            }
        }

        assert_eq!(model.at(model.pos), cursor.get().map(|n| n.key));
    }

    drop(cursor);
    tree.assert_invariants();
    assert!(model.values.iter().eq(tree.iter().map(|n| &n.key)));
}
