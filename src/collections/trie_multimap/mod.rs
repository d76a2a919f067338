//! Trie-backed ordered multimap.
//!
//! [`TrieOrderedMultimap`] maps scalar keys to any number of values:
//! insertion is O(1), extraction of the first pair is O(key-width), and
//! iteration visits keys in ascending order — values under the same key in
//! insertion order. The generic facade hides the type-erased
//! [`engine::TrieEngine`] behind ordinary `K`/`V` parameters.
//!
//! [`TrieCursor`]s are key + handle + revision triples: any removal
//! invalidates every outstanding cursor, and using one afterwards fails with
//! [`Error::IteratorInvalidated`].

pub mod engine;

use core::alloc::Layout;
use core::marker::PhantomData;
use core::mem::{ManuallyDrop, MaybeUninit};

use crate::error::Error;
use crate::type_desc::TypeDesc;

use engine::{Handle, TrieEngine, NIL};

mod sealed {
    pub trait Sealed {}
}

/// Scalar key types usable with [`TrieOrderedMultimap`].
///
/// Keys are ordered by their unsigned bit pattern, matching a plain integer
/// cast: for signed types, negative keys therefore sort after positive ones.
pub trait TrieKey: Copy + sealed::Sealed {
    /// Widens the key to the traversal integer.
    fn to_uint(self) -> u64;
    /// Narrows a traversal integer back to the key type.
    fn from_uint(raw: u64) -> Self;
}

macro_rules! impl_trie_key {
    ($($t:ty => $unsigned:ty),*) => {$(
        impl sealed::Sealed for $t {}
        impl TrieKey for $t {
            #[inline]
            fn to_uint(self) -> u64 {
                // Widen through the same-width unsigned type so signed keys
                // keep their bit pattern instead of sign-extending.
                self as $unsigned as u64
            }
            #[inline]
            fn from_uint(raw: u64) -> Self {
                raw as $t
            }
        }
    )*};
}

impl_trie_key!(
    u8 => u8, u16 => u16, u32 => u32, u64 => u64, usize => usize,
    i8 => u8, i16 => u16, i32 => u32, i64 => u64, isize => usize
);

/// Ordered multimap over a fixed-depth 4-bit trie.
pub struct TrieOrderedMultimap<K: TrieKey, V> {
    engine: TrieEngine,
    phantom: PhantomData<(K, V)>,
}

// SAFETY: the engine owns its arenas; borrows of V follow container rules.
unsafe impl<K: TrieKey + Send, V: Send> Send for TrieOrderedMultimap<K, V> {}
unsafe impl<K: TrieKey + Sync, V: Sync> Sync for TrieOrderedMultimap<K, V> {}

impl<K: TrieKey, V> TrieOrderedMultimap<K, V> {
    /// Creates an empty map; the key width is fixed by `K`.
    pub fn new() -> Self {
        TrieOrderedMultimap {
            engine: TrieEngine::new(core::mem::size_of::<K>(), Layout::new::<V>()),
            phantom: PhantomData,
        }
    }

    fn value_desc() -> TypeDesc {
        TypeDesc::of::<V>().with_move_construct::<V>().with_destruct::<V>()
    }

    /// Number of values across all keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.engine.len()
    }

    /// Returns `true` if the map holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.engine.is_empty()
    }

    /// Appends `value` under `key` and returns a cursor to the new pair.
    pub fn add(&mut self, key: K, value: V) -> Result<TrieCursor<K>, Error> {
        let mut value = ManuallyDrop::new(value);
        let result = unsafe {
            self.engine.add(
                &Self::value_desc(),
                key.to_uint(),
                (&mut *value as *mut V).cast(),
                true,
            )
        };
        match result {
            Ok(node) => Ok(TrieCursor {
                key,
                node,
                rev: self.engine.revision(),
            }),
            Err(e) => {
                unsafe {
                    ManuallyDrop::drop(&mut value);
                }
                Err(e)
            }
        }
    }

    /// Cursor to the first value stored under `key`, if any.
    pub fn find(&self, key: K) -> Option<TrieCursor<K>> {
        let node = self.engine.find(key.to_uint());
        if node == NIL {
            return None;
        }
        Some(TrieCursor {
            key,
            node,
            rev: self.engine.revision(),
        })
    }

    /// The smallest key and a reference to its first value.
    pub fn front(&self) -> Option<(K, &V)> {
        let (key, node) = self.engine.find_first_key()?;
        Some((K::from_uint(key), unsafe {
            &*self.engine.value_ptr(node).cast::<V>()
        }))
    }

    /// Removes and returns the pair [`Self::front`] refers to.
    ///
    /// An empty map reports [`Error::BadKey`].
    pub fn pop_front(&mut self) -> Result<(K, V), Error> {
        let (key, node) = self.engine.find_first_key().ok_or(Error::BadKey)?;
        let mut value = MaybeUninit::<V>::uninit();
        unsafe {
            self.engine.remove_value(
                &Self::value_desc(),
                key,
                node,
                Some(value.as_mut_ptr().cast()),
            )?;
            Ok((K::from_uint(key), value.assume_init()))
        }
    }

    fn validate_cursor(&self, cursor: &TrieCursor<K>) -> Result<(), Error> {
        if cursor.node == NIL || cursor.rev != self.engine.revision() {
            return Err(Error::IteratorInvalidated);
        }
        Ok(())
    }

    /// Reads the pair under a cursor.
    pub fn cursor_get(&self, cursor: &TrieCursor<K>) -> Result<(K, &V), Error> {
        self.validate_cursor(cursor)?;
        Ok((cursor.key, unsafe {
            &*self.engine.value_ptr(cursor.node).cast::<V>()
        }))
    }

    /// Advances a cursor: next value under the same key, then on to the
    /// first value of the next key. The returned cursor is an end cursor
    /// after the last pair.
    pub fn cursor_next(&self, cursor: &TrieCursor<K>) -> Result<TrieCursor<K>, Error> {
        self.validate_cursor(cursor)?;
        let next = self.engine.next_in_list(cursor.node);
        if next != NIL {
            return Ok(TrieCursor {
                key: cursor.key,
                node: next,
                rev: cursor.rev,
            });
        }
        match self.engine.find_next_key(cursor.key.to_uint()) {
            Some((key, node)) => Ok(TrieCursor {
                key: K::from_uint(key),
                node,
                rev: cursor.rev,
            }),
            None => Ok(TrieCursor {
                key: cursor.key,
                node: NIL,
                rev: cursor.rev,
            }),
        }
    }

    /// Removes and returns the pair under a cursor.
    pub fn pop(&mut self, cursor: TrieCursor<K>) -> Result<(K, V), Error> {
        self.validate_cursor(&cursor)?;
        let mut value = MaybeUninit::<V>::uninit();
        unsafe {
            self.engine.remove_value(
                &Self::value_desc(),
                cursor.key.to_uint(),
                cursor.node,
                Some(value.as_mut_ptr().cast()),
            )?;
            Ok((cursor.key, value.assume_init()))
        }
    }

    /// Removes the pair under a cursor, dropping the value.
    pub fn remove(&mut self, cursor: TrieCursor<K>) -> Result<(), Error> {
        self.validate_cursor(&cursor)?;
        unsafe {
            self.engine
                .remove_value(&Self::value_desc(), cursor.key.to_uint(), cursor.node, None)
        }
    }

    /// Removes every pair.
    pub fn clear(&mut self) {
        unsafe {
            self.engine
                .clear(&Self::value_desc())
                .expect("descriptor carries destruct");
        }
    }

    /// Ordered borrowing iterator over `(K, &V)`.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            map: self,
            state: self.engine.find_first_key(),
        }
    }
}

impl<K: TrieKey, V> Default for TrieOrderedMultimap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: TrieKey, V> Drop for TrieOrderedMultimap<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Detached position into a [`TrieOrderedMultimap`], validated on access.
#[derive(Clone, Copy, Debug)]
pub struct TrieCursor<K: TrieKey> {
    key: K,
    node: Handle,
    rev: usize,
}

impl<K: TrieKey> TrieCursor<K> {
    /// Returns `true` if the cursor is past the last pair.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.node == NIL
    }

    /// Key the cursor is at.
    #[inline]
    pub fn key(&self) -> K {
        self.key
    }
}

/// Ascending-order borrowing iterator over a [`TrieOrderedMultimap`].
pub struct Iter<'a, K: TrieKey, V> {
    map: &'a TrieOrderedMultimap<K, V>,
    state: Option<(u64, Handle)>,
}

impl<'a, K: TrieKey, V> Iterator for Iter<'a, K, V> {
    type Item = (K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (key, node) = self.state?;
        let value = unsafe { &*self.map.engine.value_ptr(node).cast::<V>() };
        let next_node = self.map.engine.next_in_list(node);
        self.state = if next_node != NIL {
            Some((key, next_node))
        } else {
            self.map.engine.find_next_key(key)
        };
        Some((K::from_uint(key), value))
    }
}

impl<'a, K: TrieKey, V> IntoIterator for &'a TrieOrderedMultimap<K, V> {
    type Item = (K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_find_front() {
        let mut map = TrieOrderedMultimap::<u32, &str>::new();
        map.add(5, "five").unwrap();
        map.add(1, "one").unwrap();
        map.add(3, "three").unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.front(), Some((1, &"one")));
        let cursor = map.find(3).unwrap();
        assert_eq!(map.cursor_get(&cursor).unwrap(), (3, &"three"));
        assert!(map.find(4).is_none());
    }

    #[test]
    fn pop_front_drains_in_order() {
        let mut map = TrieOrderedMultimap::<u16, u32>::new();
        for &k in &[40u16, 2, 9, 2, 300] {
            map.add(k, k as u32 * 10).unwrap();
        }
        let mut keys = Vec::new();
        while let Ok((k, _)) = map.pop_front() {
            keys.push(k);
        }
        assert_eq!(keys, [2, 2, 9, 40, 300]);
        assert!(map.is_empty());
        assert_eq!(map.pop_front(), Err(Error::BadKey));
    }

    #[test]
    fn iter_orders_keys_and_preserves_insertion_within_key() {
        let mut map = TrieOrderedMultimap::<u8, char>::new();
        map.add(7, 'a').unwrap();
        map.add(2, 'x').unwrap();
        map.add(7, 'b').unwrap();
        let collected: Vec<_> = map.iter().map(|(k, &v)| (k, v)).collect();
        assert_eq!(collected, [(2, 'x'), (7, 'a'), (7, 'b')]);
    }

    #[test]
    fn cursor_invalidated_by_removal() {
        let mut map = TrieOrderedMultimap::<u32, u32>::new();
        let cursor_a = map.add(1, 10).unwrap();
        let cursor_b = map.add(2, 20).unwrap();
        map.remove(cursor_a).unwrap();
        assert_eq!(map.cursor_get(&cursor_b), Err(Error::IteratorInvalidated));
    }

    #[test]
    fn pop_via_cursor_returns_value() {
        let mut map = TrieOrderedMultimap::<u32, String>::new();
        map.add(9, String::from("keep")).unwrap();
        let cursor = map.find(9).unwrap();
        assert_eq!(map.pop(cursor).unwrap(), (9, String::from("keep")));
        assert!(map.is_empty());
    }

    #[test]
    fn drop_releases_owned_values() {
        use std::rc::Rc;
        let witness = Rc::new(());
        {
            let mut map = TrieOrderedMultimap::<u64, Rc<()>>::new();
            for i in 0..10u64 {
                map.add(i * 1_000_003, Rc::clone(&witness)).unwrap();
            }
            assert_eq!(Rc::strong_count(&witness), 11);
        }
        assert_eq!(Rc::strong_count(&witness), 1);
    }
}
