//! Unicode text: codepoint traits, transcoding, the string engine, and the
//! format parsers.
//!
//! - [`utf8`] / [`utf16`] / [`utf32`] — per-encoding codepoint primitives.
//! - [`encoding`] — encoding tags and buffer transcoding.
//! - [`str_impl`] — the [`Str`] engine.
//! - [`parsers`] — the NFA state graph and the regex-based format compiler.

pub mod encoding;
pub mod parsers;
pub mod str_impl;
pub mod utf16;
pub mod utf32;
pub mod utf8;

pub use encoding::Encoding;
pub use str_impl::{CStrPtr, CpIter, Str, StrFlags, INLINE_CAP};
