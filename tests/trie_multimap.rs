//! Integration tests for the trie ordered multimap facade.

use plinth::{Error, TrieOrderedMultimap};

#[test]
fn iteration_is_in_ascending_key_order() {
    let mut map = TrieOrderedMultimap::<u32, u32>::new();
    let keys = [
        3_000_000u32,
        17,
        0,
        u32::MAX,
        42,
        65_536,
        41,
        0x0f0f_0f0f,
    ];
    for &key in &keys {
        map.add(key, key ^ 1).unwrap();
    }
    let visited: Vec<u32> = map.iter().map(|(key, _)| key).collect();
    let mut sorted = keys.to_vec();
    sorted.sort_unstable();
    assert_eq!(visited, sorted);
}

#[test]
fn duplicates_iterate_in_insertion_order() {
    let mut map = TrieOrderedMultimap::<u16, &str>::new();
    map.add(7, "first").unwrap();
    map.add(3, "other").unwrap();
    map.add(7, "second").unwrap();
    map.add(7, "third").unwrap();
    let visited: Vec<(u16, &str)> = map.iter().map(|(key, &value)| (key, value)).collect();
    assert_eq!(
        visited,
        [(3, "other"), (7, "first"), (7, "second"), (7, "third")]
    );
}

#[test]
fn front_is_the_minimum_regardless_of_key_width() {
    let mut narrow = TrieOrderedMultimap::<u8, u32>::new();
    narrow.add(200, 1).unwrap();
    narrow.add(3, 2).unwrap();
    assert_eq!(narrow.front(), Some((3, &2)));

    let mut wide = TrieOrderedMultimap::<u64, u32>::new();
    wide.add(u64::MAX - 1, 1).unwrap();
    wide.add(1 << 60, 2).unwrap();
    wide.add(5, 3).unwrap();
    assert_eq!(wide.front(), Some((5, &3)));
}

#[test]
fn pop_front_drains_ascending() {
    let mut map = TrieOrderedMultimap::<u32, u32>::new();
    let mut state = 12345u64;
    let mut keys = Vec::new();
    for _ in 0..200 {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        let key = (state >> 40) as u32;
        keys.push(key);
        map.add(key, key).unwrap();
    }
    keys.sort_unstable();
    let mut drained = Vec::new();
    while let Ok((key, _)) = map.pop_front() {
        drained.push(key);
    }
    assert_eq!(drained, keys);
    assert_eq!(map.pop_front(), Err(Error::BadKey));
}

#[test]
fn remove_by_cursor_preserves_the_rest() {
    let mut map = TrieOrderedMultimap::<u32, &str>::new();
    map.add(10, "a").unwrap();
    let cursor = map.add(10, "b").unwrap();
    map.add(10, "c").unwrap();
    map.remove(cursor).unwrap();
    let remaining: Vec<&str> = map.iter().map(|(_, &value)| value).collect();
    assert_eq!(remaining, ["a", "c"]);
}

#[test]
fn any_removal_invalidates_cursors() {
    let mut map = TrieOrderedMultimap::<u32, u32>::new();
    let first = map.add(1, 10).unwrap();
    let second = map.add(2, 20).unwrap();
    // Additions leave cursors valid.
    assert!(map.cursor_get(&first).is_ok());
    map.pop(second).unwrap();
    assert_eq!(map.cursor_get(&first), Err(Error::IteratorInvalidated));
}

#[test]
fn cursor_traverses_keys_and_duplicates() {
    let mut map = TrieOrderedMultimap::<u8, u8>::new();
    map.add(5, 1).unwrap();
    map.add(1, 2).unwrap();
    map.add(5, 3).unwrap();
    let mut cursor = map.find(1).unwrap();
    let mut visited = Vec::new();
    while !cursor.is_end() {
        let (key, &value) = map.cursor_get(&cursor).unwrap();
        visited.push((key, value));
        cursor = map.cursor_next(&cursor).unwrap();
    }
    assert_eq!(visited, [(1, 2), (5, 1), (5, 3)]);
}

#[test]
fn clear_then_reuse() {
    let mut map = TrieOrderedMultimap::<u16, String>::new();
    for key in 0..64u16 {
        map.add(key, key.to_string()).unwrap();
    }
    map.clear();
    assert!(map.is_empty());
    map.add(9, String::from("back")).unwrap();
    assert_eq!(map.front(), Some((9, &String::from("back"))));
}

#[test]
fn signed_keys_follow_bit_pattern_order() {
    // Negative keys widen to large unsigned values, so they sort after the
    // positive ones. Documented behavior of the scalar key cast.
    let mut map = TrieOrderedMultimap::<i32, ()>::new();
    map.add(-1, ()).unwrap();
    map.add(1, ()).unwrap();
    map.add(0, ()).unwrap();
    let visited: Vec<i32> = map.iter().map(|(key, _)| key).collect();
    assert_eq!(visited, [0, 1, -1]);
}
