//! Type-erased hopscotch hash table engine.
//!
//! The engine knows nothing about key or value types: it stores both as raw
//! bytes in arrays parallel to the `hashes` array and receives a
//! [`TypeDesc`] per call for any operation that must construct, move, or
//! destroy an element. Generic code lives in the facade ([`super::HashMap`]).
//!
//! Layout: `total_buckets` (a power of two ≥ 8) buckets, each bucket `i`
//! described by `hashes[i]` plus one key slot and one value slot. Hash value
//! `0` marks an empty bucket; a key whose real hash is `0` is stored under
//! [`ZERO_HASH_SUBSTITUTE`]. Every occupied bucket lies within the
//! neighborhood of its hash: `neighborhood_index(h) ≤ i <
//! neighborhood_index(h) + neighborhood_size` in modular arithmetic.

use core::ptr::{self, NonNull};

use crate::error::Error;
use crate::mem;
use crate::type_desc::TypeDesc;

/// Index value meaning "no bucket".
pub const NULL_INDEX: usize = usize::MAX;
/// Signal: displacement failed and a larger table would fix it.
pub const NEED_LARGER_TABLE: usize = usize::MAX - 1;
/// Signal: displacement failed against colliding hashes; widen neighborhoods.
pub const NEED_LARGER_NEIGHBORHOODS: usize = usize::MAX - 2;
/// Smallest of the special index values.
pub const FIRST_SPECIAL_INDEX: usize = NEED_LARGER_NEIGHBORHOODS;

/// Hash value marking an empty bucket.
pub const EMPTY_BUCKET_HASH: usize = 0;
/// Stored in place of a real hash of 0 (largest prime below 2^16).
pub const ZERO_HASH_SUBSTITUTE: usize = 65_521;

/// Initial bucket count on first insertion.
pub const MIN_BUCKETS: usize = 8;
/// Table and neighborhood growth multiplier.
pub const GROWTH_FACTOR: usize = 4;

/// Neighborhood size the table converges to: one bucket per bit-octet of the
/// machine word.
pub const IDEAL_NEIGHBORHOOD_SIZE: usize = core::mem::size_of::<usize>();

/// Key equality callback over two erased key slots.
pub type KeysEqFn = unsafe fn(*const u8, *const u8) -> bool;

/// Selects move-construction for the key slot in [`HopscotchEngine::add_or_assign`].
pub const MOVE_KEY: u8 = 1;
/// Selects move-construction for the value slot.
pub const MOVE_VALUE: u8 = 2;

/// Applies the zero substitution to a raw hash value.
#[inline]
pub fn adjust_hash(hash: usize) -> usize {
    if hash == EMPTY_BUCKET_HASH {
        ZERO_HASH_SUBSTITUTE
    } else {
        hash
    }
}

/// Non-generic hopscotch hash table core.
pub struct HopscotchEngine {
    hashes: Option<NonNull<usize>>,
    keys: Option<NonNull<u8>>,
    values: Option<NonNull<u8>>,
    total_buckets: usize,
    used_buckets: usize,
    neighborhood_size: usize,
    rev: usize,
}

// SAFETY: the engine owns its allocations exclusively; erased payloads are
// only reachable through &mut calls carrying the owning facade's bounds.
unsafe impl Send for HopscotchEngine {}

impl HopscotchEngine {
    /// Creates an empty engine; no arrays are allocated until the first
    /// insertion.
    pub const fn new() -> Self {
        HopscotchEngine {
            hashes: None,
            keys: None,
            values: None,
            total_buckets: 0,
            used_buckets: 0,
            neighborhood_size: 0,
            rev: 0,
        }
    }

    /// Number of occupied buckets.
    #[inline]
    pub fn size(&self) -> usize {
        self.used_buckets
    }

    /// Total bucket count (0 before the first insertion).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.total_buckets
    }

    /// Current maximum probe distance.
    #[inline]
    pub fn neighborhood_size(&self) -> usize {
        self.neighborhood_size
    }

    /// Revision counter; cursors compare against this.
    #[inline]
    pub fn revision(&self) -> usize {
        self.rev
    }

    #[inline]
    fn hashes_slice(&self) -> &[usize] {
        match self.hashes {
            Some(p) => unsafe { core::slice::from_raw_parts(p.as_ptr(), self.total_buckets) },
            None => &[],
        }
    }

    #[inline]
    fn hashes_mut(&mut self) -> &mut [usize] {
        match self.hashes {
            Some(p) => unsafe { core::slice::from_raw_parts_mut(p.as_ptr(), self.total_buckets) },
            None => &mut [],
        }
    }

    /// Hash stored in `bucket` (0 = empty).
    #[inline]
    pub fn hash_at(&self, bucket: usize) -> usize {
        self.hashes_slice()[bucket]
    }

    /// Pointer to the key slot of `bucket`.
    ///
    /// # Safety
    /// The engine must be allocated and `bucket < capacity()`; `key_desc`
    /// must describe the same key type as every other call on this engine.
    #[inline]
    pub unsafe fn key_ptr(&self, key_desc: &TypeDesc, bucket: usize) -> *mut u8 {
        debug_assert!(bucket < self.total_buckets);
        self.keys.unwrap().as_ptr().add(key_desc.size() * bucket)
    }

    /// Pointer to the value slot of `bucket`.
    ///
    /// # Safety
    /// Same contract as [`Self::key_ptr`].
    #[inline]
    pub unsafe fn value_ptr(&self, value_desc: &TypeDesc, bucket: usize) -> *mut u8 {
        debug_assert!(bucket < self.total_buckets);
        self.values.unwrap().as_ptr().add(value_desc.size() * bucket)
    }

    /// First bucket of the neighborhood for `hash`.
    #[inline]
    fn neighborhood_index(&self, hash: usize) -> usize {
        hash & (self.total_buckets - 1)
    }

    /// `[begin, end)` (modular, possibly wrapping) neighborhood for `hash`.
    #[inline]
    fn neighborhood_range(&self, hash: usize) -> (usize, usize) {
        let begin = self.neighborhood_index(hash);
        let end = (begin + self.neighborhood_size) & (self.total_buckets - 1);
        (begin, end)
    }

    #[inline]
    fn wrap(&self, index: usize) -> usize {
        if index >= self.total_buckets {
            index - self.total_buckets
        } else {
            index
        }
    }

    /// Inserts a new key/value pair, or overwrites the value of an existing
    /// key. `move_flags` selects move- vs copy-construction per slot
    /// ([`MOVE_KEY`], [`MOVE_VALUE`]). `key_hash` must already be adjusted
    /// through [`adjust_hash`].
    ///
    /// Returns the bucket index and whether a new pair was inserted.
    ///
    /// # Safety
    /// `key` and `value` must point to live elements of the described types;
    /// slots selected for move-construction are dead after a successful call
    /// and must not be dropped by the caller.
    pub unsafe fn add_or_assign(
        &mut self,
        key_desc: &TypeDesc,
        value_desc: &TypeDesc,
        keys_eq: KeysEqFn,
        key: *mut u8,
        key_hash: usize,
        value: *mut u8,
        move_flags: u8,
    ) -> Result<(usize, bool), Error> {
        debug_assert_ne!(key_hash, EMPTY_BUCKET_HASH);
        if self.total_buckets == 0 {
            self.grow_table(key_desc, value_desc)?;
        }
        /* Repeatedly resize until a bucket can be claimed for the key. This
        typically loops at most once, but pathological collision patterns may
        take a few neighborhood enlargements. */
        let bucket = loop {
            let bucket =
                self.get_existing_or_empty_bucket_for_key(key_desc, value_desc, keys_eq, key, key_hash)?;
            if bucket < FIRST_SPECIAL_INDEX {
                break bucket;
            }
            if bucket == NEED_LARGER_NEIGHBORHOODS {
                self.grow_neighborhoods();
            } else {
                self.grow_table(key_desc, value_desc)?;
            }
        };

        let added = self.hashes_slice()[bucket] == EMPTY_BUCKET_HASH;
        if added {
            // Empty bucket: construct hash/key/value.
            self.set_bucket_key_value(key_desc, value_desc, bucket, Some(key), value, move_flags)?;
            self.hashes_mut()[bucket] = key_hash;
            self.used_buckets += 1;
        } else {
            // Existing key: release the old value, then construct the new one.
            value_desc.destruct(self.value_ptr(value_desc, bucket))?;
            self.set_bucket_key_value(key_desc, value_desc, bucket, None, value, move_flags)?;
        }
        self.rev += 1;
        Ok((bucket, added))
    }

    /// Finds the bucket holding `key`, or [`NULL_INDEX`]. `key_hash` must be
    /// adjusted through [`adjust_hash`].
    ///
    /// # Safety
    /// `key` must point to a live key; `key_desc` must match the engine's
    /// key type.
    pub unsafe fn lookup(
        &self,
        key_desc: &TypeDesc,
        keys_eq: KeysEqFn,
        key: *const u8,
        key_hash: usize,
    ) -> usize {
        if self.total_buckets == 0 {
            return NULL_INDEX;
        }
        let (nh_begin, nh_end) = self.neighborhood_range(key_hash);
        let hashes = self.hashes_slice();
        let mut i = nh_begin;
        loop {
            if hashes[i] == key_hash && keys_eq(self.key_ptr(key_desc, i), key) {
                return i;
            }
            i += 1;
            if i == self.total_buckets {
                i = 0;
            }
            if i == nh_end {
                break;
            }
        }
        NULL_INDEX
    }

    /// Destroys the pair in `bucket` and marks it empty.
    ///
    /// The revision is bumped even though no other bucket changes; a cursor
    /// to the removed pair must not remain dereferenceable.
    ///
    /// # Safety
    /// `bucket` must be occupied; descriptors must match the stored types.
    pub unsafe fn empty_bucket(
        &mut self,
        key_desc: &TypeDesc,
        value_desc: &TypeDesc,
        bucket: usize,
    ) -> Result<(), Error> {
        debug_assert!(self.hashes_slice()[bucket] != EMPTY_BUCKET_HASH);
        key_desc.destruct(self.key_ptr(key_desc, bucket))?;
        value_desc.destruct(self.value_ptr(value_desc, bucket))?;
        self.hashes_mut()[bucket] = EMPTY_BUCKET_HASH;
        self.used_buckets -= 1;
        self.rev += 1;
        Ok(())
    }

    /// Moves the value out of `bucket` into `value_out`, destroys the key,
    /// and marks the bucket empty. Like [`Self::empty_bucket`] but the value
    /// survives in the caller's storage.
    ///
    /// # Safety
    /// `bucket` must be occupied; `value_out` must be valid, aligned,
    /// uninitialized storage for one value.
    pub unsafe fn take_bucket(
        &mut self,
        key_desc: &TypeDesc,
        value_desc: &TypeDesc,
        bucket: usize,
        value_out: *mut u8,
    ) -> Result<(), Error> {
        debug_assert!(self.hashes_slice()[bucket] != EMPTY_BUCKET_HASH);
        value_desc.move_construct(value_out, self.value_ptr(value_desc, bucket))?;
        key_desc.destruct(self.key_ptr(key_desc, bucket))?;
        self.hashes_mut()[bucket] = EMPTY_BUCKET_HASH;
        self.used_buckets -= 1;
        self.rev += 1;
        Ok(())
    }

    /// Destroys every occupied bucket, keeping the allocation.
    ///
    /// # Safety
    /// Descriptors must match the stored types.
    pub unsafe fn clear(&mut self, key_desc: &TypeDesc, value_desc: &TypeDesc) -> Result<(), Error> {
        for bucket in 0..self.total_buckets {
            if self.hashes_slice()[bucket] != EMPTY_BUCKET_HASH {
                key_desc.destruct(self.key_ptr(key_desc, bucket))?;
                value_desc.destruct(self.value_ptr(value_desc, bucket))?;
                self.hashes_mut()[bucket] = EMPTY_BUCKET_HASH;
            }
        }
        self.used_buckets = 0;
        self.rev += 1;
        Ok(())
    }

    /// Destroys all contents and releases the arrays. The engine returns to
    /// its pristine, unallocated state.
    ///
    /// # Safety
    /// Descriptors must match the stored types.
    pub unsafe fn destroy(&mut self, key_desc: &TypeDesc, value_desc: &TypeDesc) {
        if self.total_buckets == 0 {
            return;
        }
        let _ = self.clear(key_desc, value_desc);
        self.free_arrays(key_desc, value_desc, self.hashes, self.keys, self.values, self.total_buckets);
        self.hashes = None;
        self.keys = None;
        self.values = None;
        self.total_buckets = 0;
        self.neighborhood_size = 0;
        self.rev += 1;
    }

    /// Index of the first occupied bucket at or after `from`, or
    /// [`NULL_INDEX`].
    pub fn next_occupied(&self, from: usize) -> usize {
        let hashes = self.hashes_slice();
        for bucket in from..self.total_buckets {
            if hashes[bucket] != EMPTY_BUCKET_HASH {
                return bucket;
            }
        }
        NULL_INDEX
    }

    /// Constructs key and/or value into `bucket`'s slots.
    ///
    /// A `None` key leaves the key slot untouched (value-overwrite path).
    unsafe fn set_bucket_key_value(
        &mut self,
        key_desc: &TypeDesc,
        value_desc: &TypeDesc,
        bucket: usize,
        key: Option<*mut u8>,
        value: *mut u8,
        move_flags: u8,
    ) -> Result<(), Error> {
        if let Some(key) = key {
            let dst = self.key_ptr(key_desc, bucket);
            if move_flags & MOVE_KEY != 0 {
                key_desc.move_construct(dst, key)?;
            } else {
                key_desc.copy_construct(dst, key)?;
            }
        }
        let dst = self.value_ptr(value_desc, bucket);
        if move_flags & MOVE_VALUE != 0 {
            value_desc.move_construct(dst, value)?;
        } else {
            value_desc.copy_construct(dst, value)?;
        }
        Ok(())
    }

    /// Scans `[nh_begin, nh_end)` (wrapping) for an empty bucket.
    fn find_empty_bucket(&self, nh_begin: usize, nh_end: usize) -> usize {
        let hashes = self.hashes_slice();
        /* The range may wrap, so only inequality tests are valid; the body
        must run at least once because begin == end when the neighborhood
        covers the whole table. */
        let mut i = nh_begin;
        loop {
            if hashes[i] == EMPTY_BUCKET_HASH {
                return i;
            }
            i += 1;
            if i == self.total_buckets {
                i = 0;
            }
            if i == nh_end {
                break;
            }
        }
        NULL_INDEX
    }

    /// Scans the neighborhood for the key or, failing that, an empty bucket.
    unsafe fn lookup_key_or_find_empty_bucket(
        &self,
        key_desc: &TypeDesc,
        keys_eq: KeysEqFn,
        key: *const u8,
        key_hash: usize,
        nh_begin: usize,
        nh_end: usize,
    ) -> usize {
        let hashes = self.hashes_slice();
        let mut i = nh_begin;
        loop {
            /* The double test on a hash match should be rare enough (exact
            key match or collision) that recomputing the key offset beats
            running a second cursor in parallel. */
            if hashes[i] == EMPTY_BUCKET_HASH
                || (hashes[i] == key_hash && keys_eq(self.key_ptr(key_desc, i), key))
            {
                return i;
            }
            i += 1;
            if i == self.total_buckets {
                i = 0;
            }
            if i == nh_end {
                break;
            }
        }
        NULL_INDEX
    }

    /// Finds a bucket whose occupant may legally move into `empty_bucket`.
    ///
    /// Scans the `neighborhood_size - 1` buckets to the left of the empty
    /// one. When the window would wrap, `total_buckets` is added to the empty
    /// index so that all index comparisons stay monotonic during the scan.
    fn find_bucket_movable_to_empty(&self, empty_bucket: usize) -> usize {
        let buckets_right_of_empty = self.neighborhood_size - 1;
        let empty_actual = empty_bucket;
        let empty_monotonic = if empty_bucket < buckets_right_of_empty {
            empty_bucket + self.total_buckets
        } else {
            empty_bucket
        };
        let hashes = self.hashes_slice();
        let mut idx = empty_monotonic - buckets_right_of_empty;
        // Track collisions (identical hashes) across the scanned window.
        let sample_hash = hashes[self.wrap(idx)];
        let mut collisions = 0usize;
        while self.wrap(idx) != empty_actual {
            let h = hashes[self.wrap(idx)];
            /* End of the original neighborhood for the key in this bucket; if
            the empty bucket is below that index, this bucket's contents can
            move there. Both sides may exceed total_buckets (see above), which
            keeps the comparison valid across the wrap. */
            let curr_nh_end = self.neighborhood_index(h) + self.neighborhood_size;
            if empty_monotonic < curr_nh_end {
                return self.wrap(idx);
            }
            if sample_hash == h {
                collisions += 1;
            }
            idx += 1;
        }
        // No movable bucket in the window.
        if collisions < buckets_right_of_empty {
            /* Resizing redistributes the scanned hashes into multiple
            neighborhoods, after which this algorithm will find a movable
            bucket. */
            NEED_LARGER_TABLE
        } else {
            NEED_LARGER_NEIGHBORHOODS
        }
    }

    /// Finds an empty bucket anywhere outside `[nh_begin, nh_end)`, then
    /// drags it into the neighborhood by displacing movable occupants.
    unsafe fn find_empty_bucket_outside_neighborhood(
        &mut self,
        key_desc: &TypeDesc,
        value_desc: &TypeDesc,
        nh_begin: usize,
        nh_end: usize,
    ) -> Result<usize, Error> {
        let mut empty_bucket = self.find_empty_bucket(nh_end, nh_begin);
        if empty_bucket == NULL_INDEX {
            return Ok(NULL_INDEX);
        }
        /* Loop while the empty bucket is still outside the key's
        neighborhood; the containment test must handle a wrapping range. */
        while if nh_begin < nh_end {
            empty_bucket >= nh_end || empty_bucket < nh_begin // |---[begin end)---|
        } else {
            empty_bucket >= nh_end && empty_bucket < nh_begin // | end)-----[begin |
        } {
            let movable_bucket = self.find_bucket_movable_to_empty(empty_bucket);
            if movable_bucket >= FIRST_SPECIAL_INDEX {
                // Nothing can move; the table or the neighborhoods must grow.
                return Ok(movable_bucket);
            }
            // Move the contents of movable_bucket into empty_bucket. The
            // payload move must not panic; there is no rollback from here.
            let key_src = self.key_ptr(key_desc, movable_bucket);
            let key_dst = self.key_ptr(key_desc, empty_bucket);
            key_desc.move_construct(key_dst, key_src)?;
            let value_src = self.value_ptr(value_desc, movable_bucket);
            let value_dst = self.value_ptr(value_desc, empty_bucket);
            value_desc.move_construct(value_dst, value_src)?;
            let moved_hash = self.hashes_slice()[movable_bucket];
            self.hashes_mut()[empty_bucket] = moved_hash;
            // The vacated bucket becomes the new empty one.
            self.hashes_mut()[movable_bucket] = EMPTY_BUCKET_HASH;
            empty_bucket = movable_bucket;
        }
        Ok(empty_bucket)
    }

    /// Returns an empty bucket usable for `key_hash`, displacing occupants if
    /// necessary. Used by table growth, where the key cannot already exist.
    unsafe fn get_empty_bucket_for_key(
        &mut self,
        key_desc: &TypeDesc,
        value_desc: &TypeDesc,
        key_hash: usize,
    ) -> Result<usize, Error> {
        let (nh_begin, nh_end) = self.neighborhood_range(key_hash);
        let bucket = self.find_empty_bucket(nh_begin, nh_end);
        if bucket != NULL_INDEX {
            return Ok(bucket);
        }
        self.find_empty_bucket_outside_neighborhood(key_desc, value_desc, nh_begin, nh_end)
    }

    /// Returns the bucket already holding `key`, or an empty bucket for it.
    unsafe fn get_existing_or_empty_bucket_for_key(
        &mut self,
        key_desc: &TypeDesc,
        value_desc: &TypeDesc,
        keys_eq: KeysEqFn,
        key: *const u8,
        key_hash: usize,
    ) -> Result<usize, Error> {
        let (nh_begin, nh_end) = self.neighborhood_range(key_hash);
        let bucket =
            self.lookup_key_or_find_empty_bucket(key_desc, keys_eq, key, key_hash, nh_begin, nh_end);
        if bucket != NULL_INDEX {
            return Ok(bucket);
        }
        self.find_empty_bucket_outside_neighborhood(key_desc, value_desc, nh_begin, nh_end)
    }

    /// Widens every neighborhood, bounded by the table size. No rehash is
    /// needed: a wider neighborhood is a superset of the old one.
    fn grow_neighborhoods(&mut self) {
        self.neighborhood_size = (self.neighborhood_size * GROWTH_FACTOR).min(self.total_buckets);
    }

    /// Allocates a table `GROWTH_FACTOR` times larger (or the initial
    /// [`MIN_BUCKETS`]) and reinserts every pair with move-construction.
    ///
    /// The engine state is only swapped once all three allocations have
    /// succeeded, so an allocation failure leaves the map untouched. A panic
    /// out of a payload move during reinsertion leaves the map in an
    /// unspecified state.
    unsafe fn grow_table(&mut self, key_desc: &TypeDesc, value_desc: &TypeDesc) -> Result<(), Error> {
        let new_total = if self.total_buckets == 0 {
            MIN_BUCKETS
        } else {
            self.total_buckets * GROWTH_FACTOR
        };
        let hashes_layout = core::alloc::Layout::array::<usize>(new_total).map_err(|_| Error::OutOfMemory)?;
        let keys_layout = key_desc.array_layout(new_total)?;
        let values_layout = value_desc.array_layout(new_total)?;

        let new_hashes = mem::alloc_array(hashes_layout)?.cast::<usize>();
        let new_keys = match mem::alloc_array(keys_layout) {
            Ok(p) => p,
            Err(e) => {
                mem::free_array(new_hashes.cast(), hashes_layout);
                return Err(e);
            }
        };
        let new_values = match mem::alloc_array(values_layout) {
            Ok(p) => p,
            Err(e) => {
                mem::free_array(new_hashes.cast(), hashes_layout);
                mem::free_array(new_keys, keys_layout);
                return Err(e);
            }
        };
        // All allocations succeeded; from here on the swap is committed.
        let old_hashes = self.hashes.replace(new_hashes);
        let old_keys = self.keys.replace(new_keys);
        let old_values = self.values.replace(new_values);
        let old_total = self.total_buckets;
        self.total_buckets = new_total;

        /* Recalculate the neighborhood size. When the current size already
        exceeds the ideal (a subpar hash function forced extra collisions and
        a prior enlargement), it is left alone: growing the table does not
        undo that fix. */
        if self.neighborhood_size < IDEAL_NEIGHBORHOOD_SIZE {
            self.neighborhood_size = IDEAL_NEIGHBORHOOD_SIZE.min(self.total_buckets);
        }

        ptr::write_bytes(new_hashes.as_ptr(), 0, new_total);

        if let (Some(old_hashes), Some(old_keys), Some(old_values)) = (old_hashes, old_keys, old_values) {
            let old_hashes_slice = core::slice::from_raw_parts(old_hashes.as_ptr(), old_total);
            for old_bucket in 0..old_total {
                let h = old_hashes_slice[old_bucket];
                if h == EMPTY_BUCKET_HASH {
                    continue;
                }
                let mut new_bucket = self.get_empty_bucket_for_key(key_desc, value_desc, h)?;
                /* A bucket that could be found before must be findable now
                that there are more buckets; if displacement still fails,
                widen the neighborhoods (bounded by the table size) and
                retry. */
                while new_bucket >= FIRST_SPECIAL_INDEX {
                    debug_assert!(
                        false,
                        "failed to find an empty bucket while growing the table"
                    );
                    self.grow_neighborhoods();
                    new_bucket = self.get_empty_bucket_for_key(key_desc, value_desc, h)?;
                }
                let old_key = old_keys.as_ptr().add(key_desc.size() * old_bucket);
                let old_value = old_values.as_ptr().add(value_desc.size() * old_bucket);
                key_desc.move_construct(self.key_ptr(key_desc, new_bucket), old_key)?;
                value_desc.move_construct(self.value_ptr(value_desc, new_bucket), old_value)?;
                self.hashes_mut()[new_bucket] = h;
            }
            self.free_arrays(
                key_desc,
                value_desc,
                Some(old_hashes),
                Some(old_keys),
                Some(old_values),
                old_total,
            );
        }
        Ok(())
    }

    unsafe fn free_arrays(
        &self,
        key_desc: &TypeDesc,
        value_desc: &TypeDesc,
        hashes: Option<NonNull<usize>>,
        keys: Option<NonNull<u8>>,
        values: Option<NonNull<u8>>,
        total: usize,
    ) {
        if let Some(p) = hashes {
            mem::free_array(p.cast(), core::alloc::Layout::array::<usize>(total).unwrap());
        }
        if let Some(p) = keys {
            if let Ok(l) = key_desc.array_layout(total) {
                mem::free_array(p, l);
            }
        }
        if let Some(p) = values {
            if let Ok(l) = value_desc.array_layout(total) {
                mem::free_array(p, l);
            }
        }
    }
}

impl Default for HopscotchEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn u64_eq(a: *const u8, b: *const u8) -> bool {
        *a.cast::<u64>() == *b.cast::<u64>()
    }

    fn descs() -> (TypeDesc, TypeDesc) {
        (
            TypeDesc::of::<u64>()
                .with_move_construct::<u64>()
                .with_copy_construct::<u64>()
                .with_destruct::<u64>(),
            TypeDesc::of::<u64>()
                .with_move_construct::<u64>()
                .with_copy_construct::<u64>()
                .with_destruct::<u64>(),
        )
    }

    unsafe fn add(engine: &mut HopscotchEngine, hash: usize, mut key: u64, mut value: u64) -> (usize, bool) {
        let (kd, vd) = descs();
        engine
            .add_or_assign(
                &kd,
                &vd,
                u64_eq,
                (&mut key as *mut u64).cast(),
                adjust_hash(hash),
                (&mut value as *mut u64).cast(),
                MOVE_KEY | MOVE_VALUE,
            )
            .unwrap()
    }

    #[test]
    fn neighborhood_invariant_holds_under_collisions() {
        let mut engine = HopscotchEngine::new();
        let (kd, vd) = descs();
        unsafe {
            // All keys share neighborhood index 1 in the initial 8-bucket table.
            for k in 0..16u64 {
                add(&mut engine, 1 + (k as usize) * 8_192, k, k * 10);
            }
            assert_eq!(engine.size(), 16);
            for bucket in 0..engine.capacity() {
                let h = engine.hash_at(bucket);
                if h == EMPTY_BUCKET_HASH {
                    continue;
                }
                let nh_begin = h & (engine.capacity() - 1);
                let distance = (bucket + engine.capacity() - nh_begin) & (engine.capacity() - 1);
                assert!(
                    distance < engine.neighborhood_size(),
                    "bucket {bucket} violates its neighborhood"
                );
            }
            engine.destroy(&kd, &vd);
        }
    }

    #[test]
    fn assign_does_not_change_size() {
        let mut engine = HopscotchEngine::new();
        let (kd, vd) = descs();
        unsafe {
            let (_, added) = add(&mut engine, 42, 7, 70);
            assert!(added);
            let (bucket, added) = add(&mut engine, 42, 7, 71);
            assert!(!added);
            assert_eq!(engine.size(), 1);
            assert_eq!(*engine.value_ptr(&vd, bucket).cast::<u64>(), 71);
            engine.destroy(&kd, &vd);
        }
    }

    #[test]
    fn zero_hash_is_substituted() {
        let mut engine = HopscotchEngine::new();
        let (kd, vd) = descs();
        unsafe {
            let (bucket, added) = add(&mut engine, 0, 9, 90);
            assert!(added);
            assert_eq!(engine.hash_at(bucket), ZERO_HASH_SUBSTITUTE);
            let key = 9u64;
            let found = engine.lookup(&kd, u64_eq, (&key as *const u64).cast(), adjust_hash(0));
            assert_eq!(found, bucket);
            engine.destroy(&kd, &vd);
        }
    }

    #[test]
    fn remove_marks_bucket_empty_and_bumps_revision() {
        let mut engine = HopscotchEngine::new();
        let (kd, vd) = descs();
        unsafe {
            let (bucket, _) = add(&mut engine, 5, 1, 10);
            let rev = engine.revision();
            engine.empty_bucket(&kd, &vd, bucket).unwrap();
            assert_eq!(engine.size(), 0);
            assert_eq!(engine.hash_at(bucket), EMPTY_BUCKET_HASH);
            assert!(engine.revision() > rev);
            engine.destroy(&kd, &vd);
        }
    }
}
