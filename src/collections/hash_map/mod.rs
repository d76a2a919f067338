//! Hopscotch hash map.
//!
//! [`HashMap`] is a generic facade over the type-erased
//! [`engine::HopscotchEngine`]: it builds a [`TypeDesc`] pair on the stack for
//! each call, so the probing, displacement, and growth machinery is compiled
//! once for all key/value types.
//!
//! Keys hash through XXH64; a key whose hash comes out as the empty-bucket
//! sentinel `0` is stored under a fixed substitute, so every hash value is
//! usable.
//!
//! Cursors ([`Cursor`]) are position + revision pairs: any mutation of the
//! map invalidates every outstanding cursor, and using one afterwards fails
//! with [`Error::IteratorInvalidated`] instead of reading a stale bucket.

pub mod engine;

use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::mem::ManuallyDrop;

use xxhash_rust::xxh64::Xxh64;

use crate::error::Error;
use crate::type_desc::TypeDesc;

use engine::{adjust_hash, HopscotchEngine, KeysEqFn, MOVE_KEY, MOVE_VALUE, NULL_INDEX};

unsafe fn keys_eq_impl<K: Eq>(a: *const u8, b: *const u8) -> bool {
    *a.cast::<K>() == *b.cast::<K>()
}

/// Hash a key with XXH64 (seed 0) and apply the zero substitution.
fn hash_key<K: Hash>(key: &K) -> usize {
    let mut hasher = Xxh64::new(0);
    key.hash(&mut hasher);
    adjust_hash(hasher.finish() as usize)
}

/// Open-addressed map with bounded probe distance.
pub struct HashMap<K, V> {
    engine: HopscotchEngine,
    phantom: PhantomData<(K, V)>,
}

// SAFETY: the engine owns its storage; the facade's borrows follow standard
// container rules for the erased K/V payloads.
unsafe impl<K: Send, V: Send> Send for HashMap<K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for HashMap<K, V> {}

impl<K: Hash + Eq, V> HashMap<K, V> {
    /// Creates an empty map; no memory is allocated until the first insert.
    pub fn new() -> Self {
        HashMap {
            engine: HopscotchEngine::new(),
            phantom: PhantomData,
        }
    }

    fn key_desc() -> TypeDesc {
        TypeDesc::of::<K>().with_move_construct::<K>().with_destruct::<K>()
    }

    fn value_desc() -> TypeDesc {
        TypeDesc::of::<V>().with_move_construct::<V>().with_destruct::<V>()
    }

    fn keys_eq() -> KeysEqFn {
        keys_eq_impl::<K>
    }

    /// Number of pairs in the map.
    #[inline]
    pub fn len(&self) -> usize {
        self.engine.size()
    }

    /// Returns `true` if the map holds no pairs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.engine.size() == 0
    }

    /// Total bucket count.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.engine.capacity()
    }

    /// Current maximum probe distance.
    #[inline]
    pub fn neighborhood_size(&self) -> usize {
        self.engine.neighborhood_size()
    }

    /// Inserts `value` under `key`, overwriting any existing value.
    ///
    /// Returns `true` if a new pair was inserted, `false` if an existing
    /// value was replaced.
    pub fn insert(&mut self, key: K, value: V) -> Result<bool, Error> {
        let hash = hash_key(&key);
        let mut key = ManuallyDrop::new(key);
        let mut value = ManuallyDrop::new(value);
        let result = unsafe {
            self.engine.add_or_assign(
                &Self::key_desc(),
                &Self::value_desc(),
                Self::keys_eq(),
                (&mut *key as *mut K).cast(),
                hash,
                (&mut *value as *mut V).cast(),
                MOVE_KEY | MOVE_VALUE,
            )
        };
        match result {
            Ok((_, added)) => {
                if !added {
                    // The existing key stays in place, so the engine never
                    // consumed the caller's copy.
                    unsafe {
                        ManuallyDrop::drop(&mut key);
                    }
                }
                Ok(added)
            }
            Err(e) => {
                // Nothing was constructed; give the arguments back to Drop.
                unsafe {
                    ManuallyDrop::drop(&mut key);
                    ManuallyDrop::drop(&mut value);
                }
                Err(e)
            }
        }
    }

    fn find_bucket(&self, key: &K) -> usize {
        unsafe {
            self.engine.lookup(
                &Self::key_desc(),
                Self::keys_eq(),
                (key as *const K).cast(),
                hash_key(key),
            )
        }
    }

    /// Returns a reference to the value for `key`, if present.
    pub fn get(&self, key: &K) -> Option<&V> {
        let bucket = self.find_bucket(key);
        if bucket == NULL_INDEX {
            return None;
        }
        Some(unsafe { &*self.engine.value_ptr(&Self::value_desc(), bucket).cast::<V>() })
    }

    /// Returns a mutable reference to the value for `key`, if present.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let bucket = self.find_bucket(key);
        if bucket == NULL_INDEX {
            return None;
        }
        Some(unsafe { &mut *self.engine.value_ptr(&Self::value_desc(), bucket).cast::<V>() })
    }

    /// Returns `true` if `key` is in the map.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find_bucket(key) != NULL_INDEX
    }

    /// Like [`Self::get`] but demands the key: absence is
    /// [`Error::BadKey`].
    pub fn lookup(&self, key: &K) -> Result<&V, Error> {
        self.get(key).ok_or(Error::BadKey)
    }

    /// Removes `key` and returns its value; absence is [`Error::BadKey`].
    pub fn remove(&mut self, key: &K) -> Result<V, Error> {
        let bucket = self.find_bucket(key);
        if bucket == NULL_INDEX {
            return Err(Error::BadKey);
        }
        let mut value = ManuallyDrop::new(core::mem::MaybeUninit::<V>::uninit());
        unsafe {
            self.engine.take_bucket(
                &Self::key_desc(),
                &Self::value_desc(),
                bucket,
                value.as_mut_ptr().cast(),
            )?;
            Ok(ManuallyDrop::into_inner(value).assume_init())
        }
    }

    /// Removes `key` if present, dropping the value. Returns whether a pair
    /// was removed.
    pub fn remove_if_found(&mut self, key: &K) -> bool {
        let bucket = self.find_bucket(key);
        if bucket == NULL_INDEX {
            return false;
        }
        unsafe {
            self.engine
                .empty_bucket(&Self::key_desc(), &Self::value_desc(), bucket)
                .expect("descriptors carry destruct");
        }
        true
    }

    /// Removes every pair, keeping the allocation.
    pub fn clear(&mut self) {
        unsafe {
            self.engine
                .clear(&Self::key_desc(), &Self::value_desc())
                .expect("descriptors carry destruct");
        }
    }

    /// Borrowing iterator over `(&K, &V)` in bucket order.
    ///
    /// Bucket order is stable until the next mutation but is not meaningful
    /// across differently grown maps.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            map: self,
            bucket: 0,
        }
    }

    /// Cursor at the first occupied bucket (an end cursor if the map is
    /// empty). The cursor records the current revision; any subsequent
    /// mutation invalidates it.
    pub fn cursor_first(&self) -> Cursor {
        Cursor {
            bucket: self.engine.next_occupied(0),
            rev: self.engine.revision(),
        }
    }

    fn validate_cursor(&self, cursor: &Cursor) -> Result<(), Error> {
        if cursor.bucket == NULL_INDEX || cursor.rev != self.engine.revision() {
            return Err(Error::IteratorInvalidated);
        }
        Ok(())
    }

    /// Advances a cursor to the next occupied bucket.
    pub fn cursor_next(&self, cursor: &Cursor) -> Result<Cursor, Error> {
        self.validate_cursor(cursor)?;
        Ok(Cursor {
            bucket: self.engine.next_occupied(cursor.bucket + 1),
            rev: cursor.rev,
        })
    }

    /// Reads the pair under a cursor.
    pub fn cursor_get(&self, cursor: &Cursor) -> Result<(&K, &V), Error> {
        self.validate_cursor(cursor)?;
        unsafe {
            Ok((
                &*self.engine.key_ptr(&Self::key_desc(), cursor.bucket).cast::<K>(),
                &*self.engine.value_ptr(&Self::value_desc(), cursor.bucket).cast::<V>(),
            ))
        }
    }
}

impl<K: Hash + Eq, V> Default for HashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for HashMap<K, V> {
    fn drop(&mut self) {
        let key_desc = TypeDesc::of::<K>().with_destruct::<K>();
        let value_desc = TypeDesc::of::<V>().with_destruct::<V>();
        unsafe {
            self.engine.destroy(&key_desc, &value_desc);
        }
    }
}

/// Detached position into a [`HashMap`], validated on every access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    bucket: usize,
    rev: usize,
}

impl Cursor {
    /// Returns `true` if the cursor is past the last pair.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.bucket == NULL_INDEX
    }
}

/// Borrowing iterator over a [`HashMap`].
pub struct Iter<'a, K, V> {
    map: &'a HashMap<K, V>,
    bucket: usize,
}

impl<'a, K: Hash + Eq, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let bucket = self.map.engine.next_occupied(self.bucket);
        if bucket == NULL_INDEX {
            return None;
        }
        self.bucket = bucket + 1;
        unsafe {
            Some((
                &*self
                    .map
                    .engine
                    .key_ptr(&HashMap::<K, V>::key_desc(), bucket)
                    .cast::<K>(),
                &*self
                    .map
                    .engine
                    .value_ptr(&HashMap::<K, V>::value_desc(), bucket)
                    .cast::<V>(),
            ))
        }
    }
}

impl<'a, K: Hash + Eq, V> IntoIterator for &'a HashMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_roundtrip() {
        let mut map = HashMap::new();
        assert!(map.insert("one", 1).unwrap());
        assert!(map.insert("two", 2).unwrap());
        assert!(!map.insert("one", 10).unwrap());
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&"one"), Some(&10));
        assert_eq!(map.get(&"two"), Some(&2));
        assert_eq!(map.get(&"three"), None);
    }

    #[test]
    fn remove_and_remove_if_found() {
        let mut map = HashMap::new();
        map.insert(1u32, String::from("a")).unwrap();
        assert_eq!(map.remove(&1), Ok(String::from("a")));
        assert_eq!(map.remove(&1), Err(Error::BadKey));
        map.insert(2u32, String::from("b")).unwrap();
        assert!(map.remove_if_found(&2));
        assert!(!map.remove_if_found(&2));
        assert!(map.is_empty());
    }

    #[test]
    fn lookup_reports_bad_key() {
        let mut map = HashMap::new();
        map.insert(5u8, 50u8).unwrap();
        assert_eq!(map.lookup(&5), Ok(&50));
        assert_eq!(map.lookup(&6), Err(Error::BadKey));
    }

    #[test]
    fn iter_visits_every_pair_once() {
        let mut map = HashMap::new();
        for i in 0..100u32 {
            map.insert(i, i * 2).unwrap();
        }
        let mut seen = vec![false; 100];
        for (&k, &v) in &map {
            assert_eq!(v, k * 2);
            assert!(!seen[k as usize]);
            seen[k as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn cursor_invalidated_by_mutation() {
        let mut map = HashMap::new();
        map.insert(1u32, 1u32).unwrap();
        let cursor = map.cursor_first();
        assert!(map.cursor_get(&cursor).is_ok());
        map.insert(2, 2).unwrap();
        assert_eq!(map.cursor_get(&cursor), Err(Error::IteratorInvalidated));
    }

    #[test]
    fn drop_releases_owned_values() {
        use std::rc::Rc;
        let witness = Rc::new(());
        {
            let mut map = HashMap::new();
            for i in 0..32u32 {
                map.insert(i, Rc::clone(&witness)).unwrap();
            }
            assert_eq!(Rc::strong_count(&witness), 33);
        }
        assert_eq!(Rc::strong_count(&witness), 1);
    }
}
