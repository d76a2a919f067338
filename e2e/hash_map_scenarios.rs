//! E2E Scenarios: hopscotch hash map.
//!
//! Drives the map through the collision, displacement, growth, and zero-hash
//! situations that exercise every branch of the bucket-placement machinery,
//! checking the user-visible guarantees: nothing inserted is ever lost, and
//! the occupancy count stays exact.

use plinth::collections::hash_map::engine::{
    adjust_hash, HopscotchEngine, EMPTY_BUCKET_HASH, MOVE_KEY, MOVE_VALUE, NULL_INDEX,
    ZERO_HASH_SUBSTITUTE,
};
use plinth::{HashMap, TypeDesc};

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 1: collision displacement — sequential hashes force same-bucket
// neighborhoods in a small table; the map must widen or grow, never lose.
// ─────────────────────────────────────────────────────────────────────────────

unsafe fn u64_eq(a: *const u8, b: *const u8) -> bool {
    *a.cast::<u64>() == *b.cast::<u64>()
}

fn u64_desc() -> TypeDesc {
    TypeDesc::of::<u64>()
        .with_move_construct::<u64>()
        .with_destruct::<u64>()
}

unsafe fn engine_insert(engine: &mut HopscotchEngine, hash: usize, key: u64, value: u64) {
    let desc = u64_desc();
    let mut key = key;
    let mut value = value;
    engine
        .add_or_assign(
            &desc,
            &desc,
            u64_eq,
            (&mut key as *mut u64).cast(),
            adjust_hash(hash),
            (&mut value as *mut u64).cast(),
            MOVE_KEY | MOVE_VALUE,
        )
        .expect("insertion succeeds");
}

unsafe fn engine_lookup(engine: &HopscotchEngine, hash: usize, key: u64) -> Option<u64> {
    let desc = u64_desc();
    let bucket = engine.lookup(&desc, u64_eq, (&key as *const u64).cast(), adjust_hash(hash));
    if bucket == NULL_INDEX {
        return None;
    }
    Some(*engine.value_ptr(&desc, bucket).cast::<u64>())
}

#[test]
fn scenario_collision_displacement() {
    let mut engine = HopscotchEngine::new();
    let desc = u64_desc();
    unsafe {
        // Hashes 1..=16 in an initially 8-bucket table: every neighborhood
        // overlaps its successors, forcing displacement and growth.
        for hash in 1..=16usize {
            engine_insert(&mut engine, hash, hash as u64, hash as u64 * 100);
        }
        assert_eq!(engine.size(), 16);
        assert!(
            engine.capacity() > 8 || engine.neighborhood_size() > 8,
            "the table must have grown or the neighborhoods widened"
        );
        for hash in 1..=16usize {
            assert_eq!(
                engine_lookup(&engine, hash, hash as u64),
                Some(hash as u64 * 100),
                "hash {hash} lost during displacement"
            );
        }

        // The neighborhood invariant holds for every occupied bucket.
        for bucket in 0..engine.capacity() {
            let hash = engine.hash_at(bucket);
            if hash == EMPTY_BUCKET_HASH {
                continue;
            }
            let nh_begin = hash & (engine.capacity() - 1);
            let distance = (bucket + engine.capacity() - nh_begin) & (engine.capacity() - 1);
            assert!(distance < engine.neighborhood_size());
        }
        engine.destroy(&desc, &desc);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 2: a key whose natural hash is zero — the sentinel value of an
// empty bucket — still round-trips through the substitute hash.
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scenario_zero_hash_key() {
    let mut engine = HopscotchEngine::new();
    let desc = u64_desc();
    unsafe {
        engine_insert(&mut engine, 0, 77, 7_700);
        assert_eq!(engine_lookup(&engine, 0, 77), Some(7_700));

        // The stored hash is the substitute prime, never the sentinel.
        let bucket = engine.lookup(&desc, u64_eq, (&77u64 as *const u64).cast(), adjust_hash(0));
        assert_ne!(bucket, NULL_INDEX);
        assert_eq!(engine.hash_at(bucket), ZERO_HASH_SUBSTITUTE);

        // Overwriting through the same zero hash keeps one entry.
        engine_insert(&mut engine, 0, 77, 7_701);
        assert_eq!(engine.size(), 1);
        assert_eq!(engine_lookup(&engine, 0, 77), Some(7_701));
        engine.destroy(&desc, &desc);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario 3: sustained growth through the facade — every pair inserted
// before any reallocation must be retrievable after all of them.
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scenario_growth_preserves_everything() {
    let mut map = HashMap::new();
    for key in 0..10_000u64 {
        map.insert(key, !key).unwrap();
    }
    assert_eq!(map.len(), 10_000);
    for key in 0..10_000u64 {
        assert_eq!(map.get(&key), Some(&!key));
    }
    for key in (0..10_000u64).step_by(2) {
        assert!(map.remove_if_found(&key));
    }
    assert_eq!(map.len(), 5_000);
    for key in (1..10_000u64).step_by(2) {
        assert_eq!(map.get(&key), Some(&!key));
    }
}
