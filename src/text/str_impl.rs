//! Variable-width character string.
//!
//! [`Str`] stores host code units (UTF-8) in one of three buffer shapes,
//! tracked by metadata bits:
//!
//! - a non-owning view into external storage (string literals, the shared
//!   empty string) — read-only; any mutation first clones into an owned
//!   buffer;
//! - an embedded small buffer of [`INLINE_CAP`] units (`INLINE`);
//! - a heap allocation (`DYNAMIC`) with amortized doubling growth.
//!
//! `NUL_TERM` records that `buffer[len]` is a zero unit, which lets
//! [`Str::c_str`] hand out an interior pointer without copying.
//!
//! All code-unit sequences in the buffer are well shaped; the surrogate
//! window U+DC80–U+DCFF may appear for round-tripped invalid input, and the
//! codepoint iterator renders it as U+FFFD.

use core::alloc::Layout;
use core::fmt::{self, Write as _};
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::ops::{Add, AddAssign};
use core::ptr;

use bitflags::bitflags;

use crate::error::Error;
use crate::mem;
use crate::text::encoding::{transcode, Encoding};
use crate::text::utf8;

bitflags! {
    /// Buffer metadata bits.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct StrFlags: u8 {
        /// The buffer is heap-allocated and writable.
        const DYNAMIC = 1;
        /// `buffer[len]` is a zero code unit.
        const NUL_TERM = 1 << 1;
        /// The contents live in the embedded small buffer.
        const INLINE = 1 << 2;
    }
}

/// Embedded small-buffer capacity, in code units.
pub const INLINE_CAP: usize = 16;

/// Smallest heap capacity handed to a freshly owned buffer; avoids a
/// reallocation storm from short append sequences.
const CAPACITY_MIN: usize = 64;

const GROWTH_FACTOR: usize = 2;

/// Shared terminator backing every empty `c_str`.
static NUL_UNIT: u8 = 0;

fn buf_layout(cap: usize) -> Layout {
    Layout::array::<u8>(cap).expect("string buffer layout")
}

fn alloc_buf(cap: usize) -> *mut u8 {
    mem::alloc_array(buf_layout(cap))
        .expect("string buffer allocation failed")
        .as_ptr()
}

/// Variable-width character sequence in the host encoding.
pub struct Str {
    ptr: *const u8,
    len: usize,
    cap: usize,
    flags: StrFlags,
    inline_buf: [u8; INLINE_CAP],
}

// SAFETY: views reference 'static storage, everything else is owned.
unsafe impl Send for Str {}
unsafe impl Sync for Str {}

impl Str {
    /// The empty string: a view of the shared static terminator.
    pub fn new() -> Str {
        Str {
            ptr: &NUL_UNIT,
            len: 0,
            cap: 0,
            flags: StrFlags::NUL_TERM,
            inline_buf: [0; INLINE_CAP],
        }
    }

    /// Non-owning view of a string literal. No allocation, not writable.
    pub fn from_static(s: &'static str) -> Str {
        if s.is_empty() {
            return Str::new();
        }
        Str {
            ptr: s.as_ptr(),
            len: s.len(),
            cap: 0,
            flags: StrFlags::empty(),
            inline_buf: [0; INLINE_CAP],
        }
    }

    /// Empty string backed by the embedded small buffer; stays
    /// allocation-free until it outgrows [`INLINE_CAP`] units.
    pub fn with_inline() -> Str {
        Str {
            ptr: ptr::null(),
            len: 0,
            cap: INLINE_CAP,
            flags: StrFlags::INLINE,
            inline_buf: [0; INLINE_CAP],
        }
    }

    #[inline]
    fn data(&self) -> *const u8 {
        if self.flags.contains(StrFlags::INLINE) {
            self.inline_buf.as_ptr()
        } else {
            self.ptr
        }
    }

    #[inline]
    fn data_mut(&mut self) -> *mut u8 {
        debug_assert!(self.is_writable());
        if self.flags.contains(StrFlags::INLINE) {
            self.inline_buf.as_mut_ptr()
        } else {
            self.ptr as *mut u8
        }
    }

    /// The code units as a byte slice.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { core::slice::from_raw_parts(self.data(), self.len) }
    }

    /// Pointer to the first code unit.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.data()
    }

    /// Length in code units.
    #[inline]
    pub fn len_units(&self) -> usize {
        self.len
    }

    /// Length in codepoints (walks the buffer).
    pub fn len_codepoints(&self) -> usize {
        utf8::count_codepoints(self.as_bytes())
    }

    /// Returns `true` if the string holds no code units.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Writable capacity in code units: the heap capacity, [`INLINE_CAP`]
    /// for inline strings, 0 for views.
    #[inline]
    pub fn capacity(&self) -> usize {
        if self.flags.contains(StrFlags::DYNAMIC) || self.flags.contains(StrFlags::INLINE) {
            self.cap
        } else {
            0
        }
    }

    /// Current metadata bits.
    #[inline]
    pub fn flags(&self) -> StrFlags {
        self.flags
    }

    #[inline]
    fn is_writable(&self) -> bool {
        self.flags.intersects(StrFlags::DYNAMIC | StrFlags::INLINE)
    }

    /// Clones a read-only view into an owned heap buffer. No-op for owned
    /// strings.
    fn prepare_for_writing(&mut self) {
        if self.is_writable() {
            return;
        }
        let new_cap = self.len.max(CAPACITY_MIN);
        let buf = alloc_buf(new_cap);
        unsafe {
            ptr::copy_nonoverlapping(self.ptr, buf, self.len);
        }
        self.ptr = buf;
        self.cap = new_cap;
        self.flags = StrFlags::DYNAMIC;
    }

    /// Makes the buffer writable with room for `required` units.
    fn ensure_capacity(&mut self, required: usize) {
        self.prepare_for_writing();
        if self.flags.contains(StrFlags::INLINE) {
            if required <= INLINE_CAP {
                return;
            }
            // Spill the embedded buffer to the heap.
            let new_cap = required.max(CAPACITY_MIN);
            let buf = alloc_buf(new_cap);
            unsafe {
                ptr::copy_nonoverlapping(self.inline_buf.as_ptr(), buf, self.len);
            }
            self.ptr = buf;
            self.cap = new_cap;
            self.flags.remove(StrFlags::INLINE);
            self.flags.insert(StrFlags::DYNAMIC);
            return;
        }
        if required <= self.cap {
            return;
        }
        let new_cap = required.max(self.cap * GROWTH_FACTOR);
        unsafe {
            let old = ptr::NonNull::new_unchecked(self.ptr as *mut u8);
            let buf = mem::realloc_array(old, buf_layout(self.cap), new_cap)
                .expect("string buffer reallocation failed");
            self.ptr = buf.as_ptr();
        }
        self.cap = new_cap;
    }

    /// Splices the buffer at the code-unit level: removes `remove_units`
    /// units at `cu_index` and inserts `insert` in their place.
    fn insert_remove(&mut self, cu_index: usize, insert: &[u8], remove_units: usize) {
        debug_assert!(cu_index + remove_units <= self.len);
        let new_len = self.len - remove_units + insert.len();
        self.ensure_capacity(new_len);
        unsafe {
            let base = self.data_mut();
            ptr::copy(
                base.add(cu_index + remove_units),
                base.add(cu_index + insert.len()),
                self.len - cu_index - remove_units,
            );
            ptr::copy_nonoverlapping(insert.as_ptr(), base.add(cu_index), insert.len());
        }
        self.len = new_len;
        self.flags.remove(StrFlags::NUL_TERM);
    }

    /// Appends raw code units.
    fn append_units(&mut self, units: &[u8]) {
        if units.is_empty() {
            return;
        }
        self.ensure_capacity(self.len + units.len());
        unsafe {
            ptr::copy_nonoverlapping(units.as_ptr(), self.data_mut().add(self.len), units.len());
        }
        self.len += units.len();
        self.flags.remove(StrFlags::NUL_TERM);
    }

    /// Appends one codepoint.
    pub fn push_cp(&mut self, cp: char) {
        let mut buf = [0u8; utf8::MAX_CP_LEN];
        let len = utf8::encode(cp as u32, &mut buf);
        self.append_units(&buf[..len]);
    }

    /// Appends another string.
    pub fn push_str(&mut self, other: &Str) {
        self.append_units(other.as_bytes());
    }

    /// Inserts another string at the front.
    pub fn prepend_str(&mut self, other: &Str) {
        self.insert_remove(0, other.as_bytes(), 0);
    }

    /// Replaces every occurrence of `search` with `replacement`.
    ///
    /// The two codepoints may encode to different widths, so this splices at
    /// the code-unit level and the byte length may change.
    pub fn replace(&mut self, search: char, replacement: char) {
        if search == replacement {
            return;
        }
        let mut rep = [0u8; utf8::MAX_CP_LEN];
        let rep_len = utf8::encode(replacement as u32, &mut rep);
        self.prepare_for_writing();
        let mut cu = 0;
        while cu < self.len {
            let (cp, seq_len) = match utf8::decode(&self.as_bytes()[cu..]) {
                Some(found) => found,
                None => break,
            };
            if cp == search as u32 {
                self.insert_remove(cu, &rep[..rep_len], seq_len);
                cu += rep_len;
            } else {
                cu += seq_len;
            }
        }
    }

    /// Replaces the codepoint at `cp_index` with `new_cp`.
    pub fn replace_cp_at(&mut self, cp_index: usize, new_cp: char) -> Result<(), Error> {
        let cu = self.cu_index_of_cp(cp_index, false)?;
        let seq_len = utf8::lead_to_seq_len(self.as_bytes()[cu]);
        let mut buf = [0u8; utf8::MAX_CP_LEN];
        let len = utf8::encode(new_cp as u32, &mut buf);
        self.insert_remove(cu, &buf[..len], seq_len);
        Ok(())
    }

    /// Maps a codepoint index to its code-unit index.
    fn cu_index_of_cp(&self, cp_index: usize, allow_end: bool) -> Result<usize, Error> {
        let bytes = self.as_bytes();
        let mut cu = 0;
        let mut remaining = cp_index;
        while remaining > 0 && cu < bytes.len() {
            cu += utf8::lead_to_seq_len(bytes[cu]);
            remaining -= 1;
        }
        if remaining > 0 || (cu == bytes.len() && !allow_end) {
            return Err(Error::OutOfRange);
        }
        Ok(cu)
    }

    /// The codepoint at `cp_index`; the surrogate window renders as U+FFFD.
    pub fn cp_at(&self, cp_index: usize) -> Result<char, Error> {
        let cu = self.cu_index_of_cp(cp_index, false)?;
        let (cp, _) = utf8::decode(&self.as_bytes()[cu..]).ok_or(Error::EncodingError)?;
        Ok(char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    /// Iterator over the codepoints.
    pub fn chars(&self) -> CpIter<'_> {
        CpIter { owner: self, cu: 0 }
    }

    /// First occurrence of `cp`, as a codepoint iterator at its position.
    pub fn find(&self, cp: char) -> Option<CpIter<'_>> {
        utf8::find_codepoint(self.as_bytes(), cp as u32).map(|cu| CpIter { owner: self, cu })
    }

    /// First occurrence of `needle`, as a codepoint iterator at its position.
    pub fn find_str(&self, needle: &Str) -> Option<CpIter<'_>> {
        utf8::find_subsequence(self.as_bytes(), needle.as_bytes())
            .map(|cu| CpIter { owner: self, cu })
    }

    /// Last occurrence of `cp`.
    pub fn find_last(&self, cp: char) -> Option<CpIter<'_>> {
        utf8::find_codepoint_last(self.as_bytes(), cp as u32).map(|cu| CpIter { owner: self, cu })
    }

    /// Last occurrence of `needle`.
    pub fn find_last_str(&self, needle: &Str) -> Option<CpIter<'_>> {
        utf8::find_subsequence_last(self.as_bytes(), needle.as_bytes())
            .map(|cu| CpIter { owner: self, cu })
    }

    /// Returns `true` if the string begins with `prefix`.
    pub fn starts_with(&self, prefix: &Str) -> bool {
        self.as_bytes().starts_with(prefix.as_bytes())
    }

    /// Returns `true` if the string ends with `suffix`.
    pub fn ends_with(&self, suffix: &Str) -> bool {
        self.as_bytes().ends_with(suffix.as_bytes())
    }

    /// The codepoints in `[cp_begin, cp_end)` as a new string.
    ///
    /// Slicing a view yields another view into the same external storage;
    /// slicing an owned string copies.
    pub fn substr(&self, cp_begin: usize, cp_end: usize) -> Result<Str, Error> {
        let begin = self.cu_index_of_cp(cp_begin, true)?;
        let end = self.cu_index_of_cp(cp_end, true)?;
        if end < begin {
            return Err(Error::OutOfRange);
        }
        if !self.is_writable() {
            return Ok(Str {
                ptr: unsafe { self.ptr.add(begin) },
                len: end - begin,
                cap: 0,
                flags: StrFlags::empty(),
                inline_buf: [0; INLINE_CAP],
            });
        }
        let mut owned = Str::new();
        owned.append_units(&self.as_bytes()[begin..end]);
        Ok(owned)
    }

    /// Pointer to a NUL-terminated copy of the contents, borrowing the
    /// internal buffer whenever possible.
    ///
    /// If the buffer is not already terminated, a terminator is appended in
    /// place (cloning a view into an owned buffer first). Empty strings
    /// borrow the shared static terminator.
    pub fn c_str(&mut self) -> CStrPtr<'_> {
        if self.flags.contains(StrFlags::NUL_TERM) {
            return CStrPtr::borrowed(self.data());
        }
        if self.len == 0 {
            return CStrPtr::borrowed(&NUL_UNIT);
        }
        self.ensure_capacity(self.len + 1);
        unsafe {
            *self.data_mut().add(self.len) = 0;
        }
        self.flags.insert(StrFlags::NUL_TERM);
        CStrPtr::borrowed(self.data())
    }

    /// Non-mutating variant of [`Self::c_str`]: when the buffer lacks a
    /// terminator, an owning temporary copy is returned instead, flagged so
    /// the caller can tell it must be freed (which its `Drop` does).
    pub fn c_str_ref(&self) -> CStrPtr<'_> {
        if self.flags.contains(StrFlags::NUL_TERM) {
            return CStrPtr::borrowed(self.data());
        }
        if self.len == 0 {
            return CStrPtr::borrowed(&NUL_UNIT);
        }
        let mut copy = Vec::with_capacity(self.len + 1);
        copy.extend_from_slice(self.as_bytes());
        copy.push(0);
        CStrPtr::owned(copy.into_boxed_slice())
    }

    /// Transcodes the contents into `enc`, optionally appending one zero
    /// code unit of that encoding.
    ///
    /// For the host encoding this is a plain copy. Surrogate-window
    /// codepoints pass through, so round-tripped invalid input survives.
    pub fn encode(&self, enc: Encoding, add_nul: bool) -> Vec<u8> {
        let mut bytes = transcode(Encoding::Host, self.as_bytes(), enc, false)
            .expect("host buffer is well shaped");
        if add_nul {
            bytes.extend(core::iter::repeat(0u8).take(enc.unit_size()));
        }
        bytes
    }

    /// Fills the string through `read_fn`, growing until the callback fits.
    ///
    /// The callback receives the whole writable buffer and returns how many
    /// units it wrote; returning the buffer size means "not enough room",
    /// upon which the buffer doubles and the callback runs again.
    pub fn set_from(&mut self, mut read_fn: impl FnMut(&mut [u8]) -> usize) {
        self.prepare_for_writing();
        /* Starting above CAPACITY_MIN skips a few predictable doublings for
        the common short-output case. */
        let mut units_max = CAPACITY_MIN;
        loop {
            units_max *= GROWTH_FACTOR;
            self.ensure_capacity(units_max);
            unsafe {
                // The callback sees initialized storage even where it has
                // not written yet.
                ptr::write_bytes(self.data_mut(), 0, units_max);
            }
            let written = {
                let buf =
                    unsafe { core::slice::from_raw_parts_mut(self.data_mut(), units_max) };
                read_fn(buf)
            };
            if written < units_max {
                self.len = written;
                self.flags.remove(StrFlags::NUL_TERM);
                break;
            }
        }
    }

    /// FNV-1a hash over the codepoints, with the word-size prime/basis pair.
    pub fn fnv_hash(&self) -> usize {
        #[cfg(target_pointer_width = "64")]
        const FNV_PRIME: usize = 0x0000_0100_0000_01b3;
        #[cfg(target_pointer_width = "64")]
        const FNV_BASIS: usize = 14_695_981_039_346_656_037;
        #[cfg(target_pointer_width = "32")]
        const FNV_PRIME: usize = 0x0100_0193;
        #[cfg(target_pointer_width = "32")]
        const FNV_BASIS: usize = 2_166_136_261;

        let mut hash = FNV_BASIS;
        let mut bytes = self.as_bytes();
        while let Some((cp, len)) = utf8::decode(bytes) {
            hash ^= cp as usize;
            hash = hash.wrapping_mul(FNV_PRIME);
            bytes = &bytes[len..];
        }
        hash
    }

    /// Lossy conversion to a standard `String` (surrogate window → U+FFFD).
    pub fn to_std_string(&self) -> String {
        self.chars().collect()
    }
}

impl Default for Str {
    fn default() -> Self {
        Str::new()
    }
}

impl Drop for Str {
    fn drop(&mut self) {
        if self.flags.contains(StrFlags::DYNAMIC) {
            unsafe {
                mem::free_array(
                    ptr::NonNull::new_unchecked(self.ptr as *mut u8),
                    buf_layout(self.cap),
                );
            }
        }
    }
}

impl Clone for Str {
    fn clone(&self) -> Self {
        if !self.flags.contains(StrFlags::DYNAMIC) {
            // Views and inline strings clone as plain field copies.
            return Str {
                ptr: self.ptr,
                len: self.len,
                cap: self.cap,
                flags: self.flags,
                inline_buf: self.inline_buf,
            };
        }
        let mut owned = Str::new();
        owned.append_units(self.as_bytes());
        owned
    }
}

impl From<&str> for Str {
    fn from(s: &str) -> Str {
        let mut owned = Str::new();
        owned.append_units(s.as_bytes());
        owned
    }
}

impl From<String> for Str {
    fn from(s: String) -> Str {
        let mut vec = core::mem::ManuallyDrop::new(s.into_bytes());
        if vec.capacity() == 0 {
            return Str::new();
        }
        Str {
            ptr: vec.as_mut_ptr(),
            len: vec.len(),
            cap: vec.capacity(),
            flags: StrFlags::DYNAMIC,
            inline_buf: [0; INLINE_CAP],
        }
    }
}

impl From<char> for Str {
    fn from(cp: char) -> Str {
        let mut s = Str::with_inline();
        s.push_cp(cp);
        s
    }
}

impl Add<&Str> for Str {
    type Output = Str;

    fn add(mut self, rhs: &Str) -> Str {
        self.push_str(rhs);
        self
    }
}

impl Add<&str> for Str {
    type Output = Str;

    fn add(mut self, rhs: &str) -> Str {
        self.append_units(rhs.as_bytes());
        self
    }
}

impl Add<char> for Str {
    type Output = Str;

    fn add(mut self, rhs: char) -> Str {
        self.push_cp(rhs);
        self
    }
}

impl AddAssign<&Str> for Str {
    fn add_assign(&mut self, rhs: &Str) {
        self.push_str(rhs);
    }
}

impl AddAssign<&str> for Str {
    fn add_assign(&mut self, rhs: &str) {
        self.append_units(rhs.as_bytes());
    }
}

impl AddAssign<char> for Str {
    fn add_assign(&mut self, rhs: char) {
        self.push_cp(rhs);
    }
}

impl PartialEq for Str {
    fn eq(&self, other: &Str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Str {}

impl PartialEq<str> for Str {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for Str {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialOrd for Str {
    fn partial_cmp(&self, other: &Str) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Str {
    fn cmp(&self, other: &Str) -> core::cmp::Ordering {
        // UTF-8 byte order equals codepoint order.
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl Hash for Str {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(self.as_bytes());
        state.write_u8(0xff);
    }
}

impl fmt::Display for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cp in self.chars() {
            f.write_char(cp)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_std_string())
    }
}

/// Codepoint iterator / position into a [`Str`].
///
/// Doubles as the return type of the find operations, where it marks the
/// match position.
#[derive(Clone, Copy)]
pub struct CpIter<'s> {
    owner: &'s Str,
    cu: usize,
}

impl<'s> CpIter<'s> {
    /// Code-unit index of the current position.
    #[inline]
    pub fn code_unit_index(&self) -> usize {
        self.cu
    }

    /// Codepoint index of the current position (walks from the front).
    pub fn codepoint_index(&self) -> usize {
        utf8::count_codepoints(&self.owner.as_bytes()[..self.cu])
    }
}

impl<'s> Iterator for CpIter<'s> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        if self.cu >= self.owner.len_units() {
            return None;
        }
        let (cp, len) = utf8::decode(&self.owner.as_bytes()[self.cu..])?;
        self.cu += len;
        Some(char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER))
    }
}

/// NUL-terminated pointer handed out by [`Str::c_str`] / [`Str::c_str_ref`].
///
/// Carries a deleter flag: a borrowed pointer aliases the string (or the
/// shared static terminator) and must not be freed; an owned pointer holds a
/// temporary copy released on drop.
pub struct CStrPtr<'a> {
    ptr: *const u8,
    owned: Option<Box<[u8]>>,
    marker: PhantomData<&'a u8>,
}

impl<'a> CStrPtr<'a> {
    fn borrowed(ptr: *const u8) -> CStrPtr<'a> {
        CStrPtr {
            ptr,
            owned: None,
            marker: PhantomData,
        }
    }

    fn owned(buf: Box<[u8]>) -> CStrPtr<'a> {
        CStrPtr {
            ptr: buf.as_ptr(),
            owned: Some(buf),
            marker: PhantomData,
        }
    }

    /// The NUL-terminated buffer pointer.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    /// Returns `true` if this pointer owns (and will free) its buffer.
    #[inline]
    pub fn is_owned(&self) -> bool {
        self.owned.is_some()
    }
}
