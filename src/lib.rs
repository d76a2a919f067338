//! plinth — foundational collections, Unicode text, and formatted parsing.
//!
//! Three engines carry the weight of the crate:
//!
//! - [`collections::HashMap`] — a hopscotch hash table: open addressing with
//!   a bounded probe distance per key, adaptive neighborhood widening, and
//!   ×4 table growth.
//! - [`collections::TrieOrderedMultimap`] — a bitwise trie keyed 4 bits at a
//!   time, with per-key doubly-linked value lists: O(1) insertion, ordered
//!   iteration, O(key-width) access to the smallest key.
//! - [`text::Str`] — a variable-width (UTF-8) character sequence with a
//!   small-buffer optimization, non-owning literal views, codepoint
//!   iteration, C-string bridging, and transcoding to UTF-16/32.
//!
//! On top of the text engine, [`from_text`] parses typed values out of text
//! through per-type capture formats compiled into an NFA
//! ([`text::parsers`]).
//!
//! Both collection engines are non-generic underneath: they manage raw
//! storage and drive element lifecycles through a [`type_desc::TypeDesc`]
//! passed per call, so the probing and linking machinery is compiled once.
//! The generic facades hide this entirely.
//!
//! None of the structures are safe for concurrent mutation; concurrent
//! read-only access to a quiescent instance is fine.

pub mod collections;
pub mod error;
pub mod from_text;
pub mod mem;
pub mod text;
pub mod type_desc;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level re-exports for the most common entry points.
// ─────────────────────────────────────────────────────────────────────────────

/// Crate-wide error type.
pub use error::Error;

/// Hopscotch hash map.
pub use collections::HashMap;

/// Trie-backed ordered multimap.
pub use collections::TrieOrderedMultimap;

/// Scalar key trait for the trie multimap.
pub use collections::TrieKey;

/// Variable-width character string.
pub use text::Str;

/// Encoding tags for transcoding.
pub use text::Encoding;

/// Parses a typed value out of text via its capture format.
pub use from_text::{from_text, FromText};

/// Runtime type descriptor for the type-erased engine layer.
pub use type_desc::TypeDesc;
