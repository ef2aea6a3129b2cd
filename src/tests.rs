extern crate std;

use std::{ops::Range, prelude::v1::*};

use proptest::prelude::*;

use crate::model::{self, TestNode};

use super::*;

fn insert_find_all(keys: &[u32]) {
    let mut tree: WavlTree<TestNode> = WavlTree::new();
    let mut map = HandleMap::new();

    for &key in keys {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();

        assert!(map.insert(key, ()).is_vacant());
        map.assert_invariants();
    }

    for key in keys {
        let node = tree.get_raw(key).expect("item not found");
        assert_eq!(unsafe { node.as_ref().key() }, key);
        assert!(map.contains_key(key));
    }
}

// Visits every permutation of `0..n` in lexicographic order.
fn for_each_permutation(n: u32, mut f: impl FnMut(&[u32])) {
    let mut keys: Vec<u32> = (0..n).collect();

    loop {
        f(&keys);

        let Some(i) = keys.windows(2).rposition(|w| w[0] < w[1]) else {
            return;
        };
        let j = keys.iter().rposition(|&k| k > keys[i]).unwrap_or(i);
        keys.swap(i, j);
        keys[i + 1..].reverse();
    }
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn permutations_find() {
    for n in 2..=6 {
        for_each_permutation(n, insert_find_all);
    }
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree: WavlTree<TestNode> = WavlTree::new();
    let mut map = HandleMap::new();

    for &key in keys {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();

        let _ = map.insert(key, key);
    }

    for key in keys {
        let node = tree.get_raw(key).expect("item not found");
        unsafe { tree.remove_at(node) };
        tree.assert_invariants();

        assert_eq!(map.remove(key).unwrap(), Some((*key, *key)));
        map.assert_invariants();
    }

    for &key in keys {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();

        let _ = map.insert(key, key);
    }

    for key in keys.iter().rev() {
        let node = tree.get_raw(key).expect("item not found");
        unsafe { tree.remove_at(node) };
        tree.assert_invariants();

        assert_eq!(map.remove(key).unwrap(), Some((*key, *key)));
        map.assert_invariants();
    }

    assert!(tree.is_empty());
    assert!(map.is_empty());
    assert_eq!(map.free_slots(), map.capacity());
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn permutations_remove() {
    for n in 2..=6 {
        for_each_permutation(n, insert_remove_all);
    }
}

// Visits `0..50` in the order 3, 6, 9, ..., which covers every key once because 53 and 50 are
// coprime.
fn stride_keys() -> impl Iterator<Item = u32> {
    let mut index = 53 % 50;
    (0..50).map(move |_| {
        let key = index;
        index = (index + 53) % 50;
        key
    })
}

#[test]
fn stride_insert_then_remove() {
    let mut tree: WavlTree<TestNode> = WavlTree::new();
    let mut map = HandleMap::new();

    for key in stride_keys() {
        tree.insert(TestNode::new(key));
        assert!(tree.validate());

        assert!(map.try_insert(key, ()).is_vacant());
        assert!(map.validate());
    }

    assert_eq!(tree.len(), 50);
    assert_eq!(map.len(), 50);
    assert!(tree.iter().map(|n| n.key).eq(0..50));

    for key in stride_keys() {
        assert_eq!(tree.remove(&key).map(|n| n.key), Some(key));
        assert!(tree.validate());

        assert!(map.remove(&key).is_occupied());
        assert!(map.validate());
    }

    assert!(tree.is_empty());
    assert!(map.is_empty());
}

fn five_steps() -> impl Iterator<Item = i32> {
    (0..=120).step_by(5)
}

#[test]
fn ranges_on_both_storages() {
    let mut tree: WavlTree<TestNode> = WavlTree::new();
    let mut map = HandleMap::new();
    for key in five_steps() {
        tree.insert(TestNode::new(key as u32));
        let _ = map.insert(key, ());
    }

    // Forward: [10, 45) with 45 as the end marker.
    let range = tree.range(&6, &44);
    assert_eq!(range.end().map(|n| n.key), Some(45));
    assert_eq!(
        range.map(|n| n.key).collect::<Vec<_>>(),
        [10, 15, 20, 25, 30, 35, 40]
    );

    let range = map.range(&6, &44);
    assert_eq!(range.end().and_then(|h| map.get_by_handle(h)), Some((&45, &())));
    assert_eq!(range.begin().and_then(|h| map.get_by_handle(h)), Some((&10, &())));
    assert_eq!(range.count(), 7);

    // Reverse: [115, 80) with 80 as the end marker.
    let range = tree.range_rev(&119, &84);
    assert_eq!(range.end().map(|n| n.key), Some(80));
    assert_eq!(
        range.map(|n| n.key).collect::<Vec<_>>(),
        [115, 110, 105, 100, 95, 90, 85]
    );

    let range = map.range_rev(&119, &84);
    assert_eq!(range.end().and_then(|h| map.get_by_handle(h)), Some((&80, &())));
    assert_eq!(range.count(), 7);

    // Past the last key, both bounds are the end of the tree.
    let range = map.range(&121, &200);
    assert_eq!((range.begin(), range.end()), (None, None));
    assert!(tree.range(&121, &200).is_empty());

    // Between two keys, both bounds name the same real element.
    let range = map.range(&11, &14);
    assert_eq!(range.end(), map.handle_of(&15));
    assert_eq!(range.begin(), None);
    assert_eq!(range.count(), 0);
    assert_eq!(tree.range(&11, &14).end().map(|n| n.key), Some(15));
}

#[test]
fn inverted_ranges_stop_at_the_end() {
    let mut tree: WavlTree<TestNode> = WavlTree::new();
    let mut map = HandleMap::new();
    for key in five_steps() {
        tree.insert(TestNode::new(key as u32));
        let _ = map.insert(key, ());
    }

    assert_eq!(tree.range(&100, &20).map(|n| n.key).collect::<Vec<_>>(), [100, 105, 110, 115, 120]);
    assert_eq!(map.range(&100, &20).count(), 5);
    assert_eq!(map.range_rev(&20, &100).count(), 5);
}

#[test]
fn height_stays_logarithmic() {
    let mut tree: WavlTree<TestNode> = WavlTree::new();
    let mut map = HandleMap::new();

    for n in 1..=1024u32 {
        tree.insert(TestNode::new(n));
        let _ = map.insert(n, ());

        let bound = 2.0 * f64::from(n + 1).log2();
        assert!(tree.height() as f64 <= bound, "{n} nodes: height {}", tree.height());
        assert!(map.height() as f64 <= bound, "{n} nodes: height {}", map.height());
    }

    // Removals without insertions keep the bound too.
    for n in (1..=1024u32).step_by(2) {
        let _ = tree.remove(&n);
        let _ = map.remove(&n);
    }

    let bound = 2.0 * ((tree.len() + 1) as f64).log2();
    assert!(tree.height() as f64 <= bound);
    assert!(map.height() as f64 <= bound);
    tree.assert_invariants();
    map.assert_invariants();
}

#[test]
fn repeated_verbs_are_idempotent() {
    let mut map = HandleMap::new();
    let mut owned = WavlMap::new();

    let first = map.try_insert(7, 'a').unwrap();
    for value in ['b', 'c'] {
        let again = map.try_insert(7, value);
        assert!(again.is_occupied());
        assert_eq!(again.unwrap(), first);
        assert_eq!(map.get(&7), Some(&'a'));
    }

    for value in ['x', 'y'] {
        assert_eq!(map.insert_or_assign(7, value).unwrap(), first);
        assert_eq!(owned.insert_or_assign(7, value).unwrap().copied(), Some(value));
    }

    assert_eq!(map.len(), 1);
    assert_eq!(owned.len(), 1);
    assert_eq!(map.get(&7), Some(&'y'));
    assert_eq!(owned.get(&7), Some(&'y'));
}

#[test]
fn one_engine_two_shapes() {
    // The same insertion order yields the same shape in both storages.
    let mut tree: WavlTree<TestNode> = WavlTree::new();
    let mut map = HandleMap::new();
    for key in stride_keys() {
        tree.insert(TestNode::new(key));
        let _ = map.insert(key, ());
    }

    let mut from_tree = String::new();
    let mut from_map = String::new();
    tree.dotgraph("g", &mut from_tree).unwrap();
    map.dotgraph("g", &mut from_map).unwrap();

    let labels = |dot: &str| -> Vec<String> {
        dot.split("label=\"")
            .skip(1)
            .filter_map(|s| s.split('"').next())
            .map(String::from)
            .collect()
    };
    assert_eq!(labels(&from_tree), labels(&from_map));
    assert_eq!(tree.height(), map.height());
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn cursor_equivalence(
        values in proptest::collection::vec(0u32..500, 0..100),
        ops in proptest::collection::vec(model::cursor_op_strategy(), FUZZ_RANGE),
    ) {
        model::run_cursor_equivalence(values, ops);
    }
}
