//! Collection engines.
//!
//! Both maps share a design: a non-generic, type-erased engine does the real
//! work over raw storage, and a thin generic facade builds the type
//! descriptors each call needs.
//!
//! - [`hash_map`] — hopscotch hash table: bounded probe distance, adaptive
//!   neighborhoods, ×4 growth.
//! - [`trie_multimap`] — bitwise trie ordered multimap: O(1) insertion,
//!   ascending-key iteration, insertion-ordered duplicates.

pub mod hash_map;
pub mod trie_multimap;

pub use hash_map::{Cursor, HashMap};
pub use trie_multimap::{TrieCursor, TrieKey, TrieOrderedMultimap};
