//! Integration tests for the hopscotch hash map facade.

use plinth::{Error, HashMap};

#[test]
fn round_trip_distinct_keys() {
    let mut map = HashMap::new();
    for key in 0..1_000u64 {
        assert!(map.insert(key, key.wrapping_mul(0x9e37_79b9)).unwrap());
    }
    assert_eq!(map.len(), 1_000);
    for key in 0..1_000u64 {
        assert_eq!(map.get(&key), Some(&key.wrapping_mul(0x9e37_79b9)));
    }
}

#[test]
fn size_tracks_random_insert_assign_remove() {
    // Deterministic linear congruential sequence drives the operation mix.
    let mut state = 0x2545_f491_4f6c_dd1du64;
    let mut lcg = move || {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        state >> 33
    };
    let mut map = HashMap::new();
    let mut model = std::collections::BTreeMap::new();
    for _ in 0..5_000 {
        let key = lcg() % 256;
        match lcg() % 3 {
            0 | 1 => {
                let value = lcg();
                map.insert(key, value).unwrap();
                model.insert(key, value);
            }
            _ => {
                let removed = map.remove_if_found(&key);
                assert_eq!(removed, model.remove(&key).is_some());
            }
        }
        assert_eq!(map.len(), model.len());
    }
    for (key, value) in &model {
        assert_eq!(map.get(key), Some(value));
    }
}

#[test]
fn growth_preserves_contents() {
    let mut map = HashMap::new();
    let mut last_capacity = map.capacity();
    for key in 0..4_096u32 {
        map.insert(key, key ^ 0xdead_beef).unwrap();
        if map.capacity() != last_capacity {
            // The table just grew; everything inserted so far must survive.
            for probe in 0..=key {
                assert_eq!(map.get(&probe), Some(&(probe ^ 0xdead_beef)), "lost key {probe}");
            }
            last_capacity = map.capacity();
        }
    }
    assert!(map.capacity() >= 4_096);
}

#[test]
fn assign_overwrites_without_size_change() {
    let mut map = HashMap::new();
    map.insert("key", 1).unwrap();
    assert!(!map.insert("key", 2).unwrap());
    assert_eq!(map.len(), 1);
    assert_eq!(map.lookup(&"key"), Ok(&2));
}

#[test]
fn remove_demands_presence() {
    let mut map: HashMap<u32, u32> = HashMap::new();
    assert_eq!(map.remove(&1), Err(Error::BadKey));
    map.insert(1, 10).unwrap();
    assert_eq!(map.remove(&1), Ok(10));
    assert_eq!(map.lookup(&1), Err(Error::BadKey));
}

#[test]
fn clear_keeps_allocation_and_empties_the_map() {
    let mut map = HashMap::new();
    for key in 0..100u32 {
        map.insert(key, key).unwrap();
    }
    let capacity = map.capacity();
    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.capacity(), capacity);
    // The map stays usable after clearing.
    map.insert(7, 70).unwrap();
    assert_eq!(map.get(&7), Some(&70));
}

#[test]
fn cursor_invalidated_by_growth_and_by_removal() {
    let mut map = HashMap::new();
    map.insert(0u32, 0u32).unwrap();
    let cursor = map.cursor_first();
    assert!(map.cursor_get(&cursor).is_ok());

    // Force a reallocation by filling past the initial table.
    for key in 1..64u32 {
        map.insert(key, key).unwrap();
    }
    assert_eq!(map.cursor_get(&cursor), Err(Error::IteratorInvalidated));
    assert_eq!(
        map.cursor_next(&cursor).unwrap_err(),
        Error::IteratorInvalidated
    );

    // A removal with no reallocation also invalidates.
    let cursor = map.cursor_first();
    map.remove_if_found(&63);
    assert_eq!(map.cursor_get(&cursor), Err(Error::IteratorInvalidated));
}

#[test]
fn cursor_walks_every_pair() {
    let mut map = HashMap::new();
    for key in 0..50u32 {
        map.insert(key, key * 3).unwrap();
    }
    let mut seen = 0;
    let mut cursor = map.cursor_first();
    while !cursor.is_end() {
        let (&key, &value) = map.cursor_get(&cursor).unwrap();
        assert_eq!(value, key * 3);
        seen += 1;
        cursor = map.cursor_next(&cursor).unwrap();
    }
    assert_eq!(seen, 50);
}

#[test]
fn string_keys_work() {
    let mut map = HashMap::new();
    map.insert(String::from("alpha"), 1).unwrap();
    map.insert(String::from("beta"), 2).unwrap();
    assert_eq!(map.get(&String::from("alpha")), Some(&1));
    assert!(map.remove_if_found(&String::from("beta")));
    assert_eq!(map.len(), 1);
}
