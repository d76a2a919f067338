//! E2E Scenarios: trie ordered multimap.

use plinth::TrieOrderedMultimap;

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 1: duplicates under one key pop in insertion order.
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scenario_duplicate_key_fifo() {
    let mut map = TrieOrderedMultimap::<u32, &str>::new();
    map.add(1_000, "a").unwrap();
    map.add(1_000, "b").unwrap();
    map.add(1_000, "c").unwrap();
    assert_eq!(map.pop_front().unwrap(), (1_000, "a"));
    assert_eq!(map.pop_front().unwrap(), (1_000, "b"));
    assert_eq!(map.pop_front().unwrap(), (1_000, "c"));
    assert!(map.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 2: keys inserted out of order iterate in ascending order.
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scenario_ordered_iteration() {
    let mut map = TrieOrderedMultimap::<u32, char>::new();
    map.add(5, 'x').unwrap();
    map.add(1, 'y').unwrap();
    map.add(3, 'z').unwrap();
    let keys: Vec<u32> = map.iter().map(|(key, _)| key).collect();
    assert_eq!(keys, [1, 3, 5]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 3: a priority-queue workload — interleaved adds and pops always
// surface the current minimum, duplicates first-in-first-out.
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scenario_priority_queue_workload() {
    let mut map = TrieOrderedMultimap::<u64, u64>::new();
    let mut model: std::collections::BTreeMap<u64, std::collections::VecDeque<u64>> =
        std::collections::BTreeMap::new();
    let mut state = 0xfeed_f00d_u64;
    let mut lcg = move || {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        state >> 33
    };
    let mut stamp = 0u64;
    for _ in 0..2_000 {
        if lcg() % 3 != 0 {
            let key = lcg() % 50;
            stamp += 1;
            map.add(key, stamp).unwrap();
            model.entry(key).or_default().push_back(stamp);
        } else if let Ok((key, value)) = map.pop_front() {
            let entry = model.entry(key).or_default();
            assert_eq!(entry.pop_front(), Some(value), "wrong pop at key {key}");
            if entry.is_empty() {
                model.remove(&key);
            }
            let expected_min = model.keys().next().copied();
            assert_eq!(map.front().map(|(next_key, _)| next_key), expected_min);
        }
    }
    let drained: Vec<u64> = std::iter::from_fn(|| map.pop_front().ok().map(|(key, _)| key)).collect();
    let mut sorted = drained.clone();
    sorted.sort_unstable();
    assert_eq!(drained, sorted);
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 4: sparse 64-bit keys — deep branches are created and pruned
// without disturbing unrelated subtrees.
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scenario_sparse_wide_keys() {
    let mut map = TrieOrderedMultimap::<u64, usize>::new();
    let keys = [
        0u64,
        1,
        0xffff_ffff_ffff_ffff,
        0x8000_0000_0000_0000,
        0x0123_4567_89ab_cdef,
        0x0123_4567_89ab_cd00,
    ];
    for (index, &key) in keys.iter().enumerate() {
        map.add(key, index).unwrap();
    }
    let visited: Vec<u64> = map.iter().map(|(key, _)| key).collect();
    let mut sorted = keys.to_vec();
    sorted.sort_unstable();
    assert_eq!(visited, sorted);

    // Remove the two deep siblings; the rest must be untouched.
    let cursor = map.find(0x0123_4567_89ab_cdef).unwrap();
    map.remove(cursor).unwrap();
    let cursor = map.find(0x0123_4567_89ab_cd00).unwrap();
    map.remove(cursor).unwrap();
    assert_eq!(map.len(), 4);
    assert!(map.find(0x0123_4567_89ab_cdef).is_none());
    assert_eq!(map.front().map(|(key, _)| key), Some(0));
}
