//! Bitwise trie multimap engine.
//!
//! Keys are consumed four bits at a time, most significant nibble first. A
//! K-byte key crosses `2K - 1` interior levels of 16-way nodes and lands on
//! an anchor node, whose per-nibble `first`/`last` handle pairs bound a
//! doubly-linked list of identically-keyed values. The `last` pointer makes
//! appending O(1) with no list walk.
//!
//! All three node kinds live in arenas addressed by 32-bit handles, so links
//! survive arena reallocation and no node ever holds a raw pointer. Value
//! payloads are type-erased: the payload layout is fixed when the engine is
//! built, and a [`TypeDesc`] arrives with each call that constructs, moves,
//! or destroys one.

use core::alloc::Layout;
use core::ptr::NonNull;

use crate::error::Error;
use crate::mem;
use crate::type_desc::TypeDesc;

/// Arena handle; [`NIL`] means "no node".
pub type Handle = u32;
/// The null handle.
pub const NIL: Handle = u32::MAX;

/// Interior node: one child handle per nibble.
#[derive(Clone)]
struct TreeNode {
    children: [Handle; 16],
}

impl TreeNode {
    fn new() -> Self {
        TreeNode { children: [NIL; 16] }
    }

    fn is_empty(&self) -> bool {
        self.children.iter().all(|&c| c == NIL)
    }
}

/// Leaf-level node: list head and tail per terminal nibble.
#[derive(Clone)]
struct AnchorNode {
    firsts: [Handle; 16],
    lasts: [Handle; 16],
}

impl AnchorNode {
    fn new() -> Self {
        AnchorNode {
            firsts: [NIL; 16],
            lasts: [NIL; 16],
        }
    }

    fn is_empty(&self) -> bool {
        self.firsts.iter().all(|&f| f == NIL)
    }
}

/// Links of one value node; `next` doubles as the free-list link.
#[repr(C)]
struct ListHdr {
    prev: Handle,
    next: Handle,
}

/// Arena of list nodes: `{ prev, next }` header followed by a type-erased
/// payload slot.
struct ListArena {
    storage: Option<NonNull<u8>>,
    slot_count: u32,
    free_head: Handle,
    slot_size: usize,
    value_offset: usize,
    align: usize,
}

impl ListArena {
    fn new(value_layout: Layout) -> Self {
        let (slot_layout, value_offset) = Layout::new::<ListHdr>()
            .extend(value_layout)
            .expect("list slot layout");
        let slot_layout = slot_layout.pad_to_align();
        ListArena {
            storage: None,
            slot_count: 0,
            free_head: NIL,
            slot_size: slot_layout.size(),
            value_offset,
            align: slot_layout.align(),
        }
    }

    fn storage_layout(&self, count: u32) -> Layout {
        // SAFETY: size/align derive from valid layouts.
        unsafe { Layout::from_size_align_unchecked(self.slot_size * count as usize, self.align) }
    }

    /// # Safety
    /// `handle` must be a live or free slot below `slot_count`.
    unsafe fn hdr(&self, handle: Handle) -> *mut ListHdr {
        debug_assert!(handle < self.slot_count);
        self.storage
            .unwrap()
            .as_ptr()
            .add(self.slot_size * handle as usize)
            .cast()
    }

    /// # Safety
    /// `handle` must be a live slot.
    unsafe fn value_ptr(&self, handle: Handle) -> *mut u8 {
        debug_assert!(handle < self.slot_count);
        self.storage
            .unwrap()
            .as_ptr()
            .add(self.slot_size * handle as usize + self.value_offset)
    }

    /// Pops a free slot, growing the arena if none is available. Growth
    /// relocates the arena bytes; handles stay valid, raw pointers do not.
    fn alloc_slot(&mut self) -> Result<Handle, Error> {
        if self.free_head == NIL {
            let old_count = self.slot_count;
            let new_count = if old_count == 0 { 8 } else { old_count * 2 };
            let new_layout = self.storage_layout(new_count);
            let new_storage = match self.storage {
                Some(p) => unsafe {
                    mem::realloc_array(p, self.storage_layout(old_count), new_layout.size())?
                },
                None => mem::alloc_array(new_layout)?,
            };
            self.storage = Some(new_storage);
            self.slot_count = new_count;
            // Chain the fresh slots into the free list, lowest handle first.
            for slot in (old_count..new_count).rev() {
                unsafe {
                    (*self.hdr(slot)).next = self.free_head;
                }
                self.free_head = slot;
            }
        }
        let handle = self.free_head;
        unsafe {
            self.free_head = (*self.hdr(handle)).next;
            (*self.hdr(handle)).prev = NIL;
            (*self.hdr(handle)).next = NIL;
        }
        Ok(handle)
    }

    fn free_slot(&mut self, handle: Handle) {
        unsafe {
            (*self.hdr(handle)).next = self.free_head;
        }
        self.free_head = handle;
    }

    /// Rechains every slot as free; payloads must already be destroyed.
    fn reset(&mut self) {
        self.free_head = NIL;
        for slot in (0..self.slot_count).rev() {
            unsafe {
                (*self.hdr(slot)).next = self.free_head;
            }
            self.free_head = slot;
        }
    }
}

impl Drop for ListArena {
    fn drop(&mut self) {
        if let Some(p) = self.storage.take() {
            let layout = self.storage_layout(self.slot_count);
            unsafe {
                mem::free_array(p, layout);
            }
        }
    }
}

/// Non-generic trie multimap core.
pub struct TrieEngine {
    tree_nodes: Vec<TreeNode>,
    tree_free: Vec<Handle>,
    anchors: Vec<AnchorNode>,
    anchor_free: Vec<Handle>,
    list: ListArena,
    root: Handle,
    key_size: usize,
    values_count: usize,
    rev: usize,
}

// SAFETY: the engine owns its arenas exclusively.
unsafe impl Send for TrieEngine {}

impl TrieEngine {
    /// Creates an empty engine for keys of `key_size` bytes (1..=8) and
    /// payloads of `value_layout`.
    pub fn new(key_size: usize, value_layout: Layout) -> Self {
        debug_assert!((1..=8).contains(&key_size));
        TrieEngine {
            tree_nodes: Vec::new(),
            tree_free: Vec::new(),
            anchors: Vec::new(),
            anchor_free: Vec::new(),
            list: ListArena::new(value_layout),
            root: NIL,
            key_size,
            values_count: 0,
            rev: 0,
        }
    }

    /// Number of values in the map.
    #[inline]
    pub fn len(&self) -> usize {
        self.values_count
    }

    /// Returns `true` if the map holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values_count == 0
    }

    /// Revision counter; bumped by any mutation that removes a node.
    #[inline]
    pub fn revision(&self) -> usize {
        self.rev
    }

    /// Total nibble levels for this key width.
    #[inline]
    fn levels(&self) -> usize {
        self.key_size * 2
    }

    /// Largest representable key for this key width.
    #[inline]
    fn max_key(&self) -> u64 {
        if self.key_size == 8 {
            u64::MAX
        } else {
            (1u64 << (self.key_size * 8)) - 1
        }
    }

    #[inline]
    fn nibble(&self, key: u64, level: usize) -> usize {
        ((key >> ((self.levels() - 1 - level) * 4)) & 0xf) as usize
    }

    fn alloc_tree_node(&mut self) -> Handle {
        if let Some(handle) = self.tree_free.pop() {
            self.tree_nodes[handle as usize] = TreeNode::new();
            handle
        } else {
            self.tree_nodes.push(TreeNode::new());
            (self.tree_nodes.len() - 1) as Handle
        }
    }

    fn alloc_anchor(&mut self) -> Handle {
        if let Some(handle) = self.anchor_free.pop() {
            self.anchors[handle as usize] = AnchorNode::new();
            handle
        } else {
            self.anchors.push(AnchorNode::new());
            (self.anchors.len() - 1) as Handle
        }
    }

    /// Walks the existing trie to the anchor for `key`, without creating
    /// nodes. Returns the anchor handle and the terminal nibble.
    fn walk_to_anchor(&self, key: u64) -> Option<(Handle, usize)> {
        if self.root == NIL {
            return None;
        }
        let levels = self.levels();
        let mut node = self.root;
        for level in 0..levels - 2 {
            let nib = self.nibble(key, level);
            node = self.tree_nodes[node as usize].children[nib];
            if node == NIL {
                return None;
            }
        }
        let anchor_nib = self.nibble(key, levels - 2);
        let anchor = self.tree_nodes[node as usize].children[anchor_nib];
        if anchor == NIL {
            return None;
        }
        Some((anchor, self.nibble(key, levels - 1)))
    }

    /// Appends `value` at the tail of the list for `key`, creating any
    /// missing trie nodes along the way. Returns the new list-node handle.
    ///
    /// # Safety
    /// `value` must point to a live element of the described type; on
    /// success with `move_value` the source slot is dead.
    pub unsafe fn add(
        &mut self,
        value_desc: &TypeDesc,
        key: u64,
        value: *mut u8,
        move_value: bool,
    ) -> Result<Handle, Error> {
        debug_assert!(key <= self.max_key());
        let levels = self.levels();
        if self.root == NIL {
            self.root = self.alloc_tree_node();
        }
        let mut node = self.root;
        for level in 0..levels - 2 {
            let nib = self.nibble(key, level);
            let mut child = self.tree_nodes[node as usize].children[nib];
            if child == NIL {
                child = self.alloc_tree_node();
                self.tree_nodes[node as usize].children[nib] = child;
            }
            node = child;
        }
        let anchor_nib = self.nibble(key, levels - 2);
        let mut anchor = self.tree_nodes[node as usize].children[anchor_nib];
        if anchor == NIL {
            anchor = self.alloc_anchor();
            self.tree_nodes[node as usize].children[anchor_nib] = anchor;
        }
        let last_nib = self.nibble(key, levels - 1);

        let new_node = self.list.alloc_slot()?;
        if move_value {
            value_desc.move_construct(self.list.value_ptr(new_node), value)?;
        } else {
            value_desc.copy_construct(self.list.value_ptr(new_node), value)?;
        }

        let anchor_node = &mut self.anchors[anchor as usize];
        let tail = anchor_node.lasts[last_nib];
        if tail == NIL {
            anchor_node.firsts[last_nib] = new_node;
        } else {
            (*self.list.hdr(tail)).next = new_node;
            (*self.list.hdr(new_node)).prev = tail;
        }
        self.anchors[anchor as usize].lasts[last_nib] = new_node;
        self.values_count += 1;
        Ok(new_node)
    }

    /// Head of the value list for `key`, or [`NIL`].
    pub fn find(&self, key: u64) -> Handle {
        match self.walk_to_anchor(key) {
            Some((anchor, last_nib)) => self.anchors[anchor as usize].firsts[last_nib],
            None => NIL,
        }
    }

    /// Handle of the node following `node` in its list, or [`NIL`].
    pub fn next_in_list(&self, node: Handle) -> Handle {
        unsafe { (*self.list.hdr(node)).next }
    }

    /// Pointer to the payload of `node`.
    ///
    /// # Safety
    /// `node` must be a live list node.
    pub unsafe fn value_ptr(&self, node: Handle) -> *mut u8 {
        self.list.value_ptr(node)
    }

    /// Smallest key in the map and the head of its list.
    pub fn find_first_key(&self) -> Option<(u64, Handle)> {
        if self.root == NIL {
            return None;
        }
        self.seek(self.root, 0, 0, 0, false)
    }

    /// Smallest key strictly greater than `key`, and the head of its list.
    pub fn find_next_key(&self, key: u64) -> Option<(u64, Handle)> {
        if self.root == NIL || key >= self.max_key() {
            return None;
        }
        self.seek(self.root, 0, 0, key + 1, true)
    }

    /// Finds the smallest present key ≥ `bound` under `handle`, a node at
    /// `level`; `tight` means every ancestor nibble equalled the bound's, so
    /// this level must start at the bound's nibble. `prefix` accumulates the
    /// nibbles chosen so far.
    fn seek(
        &self,
        handle: Handle,
        level: usize,
        prefix: u64,
        bound: u64,
        tight: bool,
    ) -> Option<(u64, Handle)> {
        let levels = self.levels();
        let start = if tight { self.nibble(bound, level) } else { 0 };
        if level == levels - 1 {
            let anchor = &self.anchors[handle as usize];
            for nib in start..16 {
                if anchor.firsts[nib] != NIL {
                    return Some(((prefix << 4) | nib as u64, anchor.firsts[nib]));
                }
            }
            return None;
        }
        let node = &self.tree_nodes[handle as usize];
        for nib in start..16 {
            let child = node.children[nib];
            if child == NIL {
                continue;
            }
            let sub_tight = tight && nib == self.nibble(bound, level);
            if let Some(found) =
                self.seek(child, level + 1, (prefix << 4) | nib as u64, bound, sub_tight)
            {
                return Some(found);
            }
        }
        None
    }

    /// Unlinks `node` from the list for `key`, destroys (or moves out) its
    /// payload, frees the node, and prunes any trie branch left empty.
    ///
    /// With `take_out` set, the payload is move-constructed into it instead
    /// of being destroyed.
    ///
    /// # Safety
    /// `node` must be a live list node reachable under `key`; `take_out`, if
    /// set, must be valid, aligned, uninitialized storage for one value.
    pub unsafe fn remove_value(
        &mut self,
        value_desc: &TypeDesc,
        key: u64,
        node: Handle,
        take_out: Option<*mut u8>,
    ) -> Result<(), Error> {
        let (anchor, last_nib) = self.walk_to_anchor(key).ok_or(Error::BadKey)?;

        let prev = (*self.list.hdr(node)).prev;
        let next = (*self.list.hdr(node)).next;
        if prev != NIL {
            (*self.list.hdr(prev)).next = next;
        }
        if next != NIL {
            (*self.list.hdr(next)).prev = prev;
        }
        {
            let anchor_node = &mut self.anchors[anchor as usize];
            if anchor_node.firsts[last_nib] == node {
                anchor_node.firsts[last_nib] = next;
            }
            if anchor_node.lasts[last_nib] == node {
                anchor_node.lasts[last_nib] = prev;
            }
        }

        match take_out {
            Some(out) => value_desc.move_construct(out, self.list.value_ptr(node))?,
            None => value_desc.destruct(self.list.value_ptr(node))?,
        }
        self.list.free_slot(node);
        self.values_count -= 1;
        self.rev += 1;

        if self.anchors[anchor as usize].firsts[last_nib] == NIL {
            self.prune_branch(key);
        }
        Ok(())
    }

    /// Frees the anchor and interior nodes on the path to `key` that no
    /// longer lead anywhere.
    fn prune_branch(&mut self, key: u64) {
        let levels = self.levels();
        // Rebuild the path; it is at most 15 tree nodes deep.
        let mut path = [NIL; 16];
        let mut node = self.root;
        for level in 0..levels - 2 {
            path[level] = node;
            node = self.tree_nodes[node as usize].children[self.nibble(key, level)];
        }
        path[levels - 2] = node;
        let anchor = self.tree_nodes[node as usize].children[self.nibble(key, levels - 2)];

        if !self.anchors[anchor as usize].is_empty() {
            return;
        }
        self.anchors[anchor as usize] = AnchorNode::new();
        self.anchor_free.push(anchor);
        let nibble = self.nibble(key, levels - 2);
        self.tree_nodes[node as usize].children[nibble] = NIL;

        for level in (0..levels - 1).rev() {
            let handle = path[level];
            if !self.tree_nodes[handle as usize].is_empty() {
                return;
            }
            self.tree_free.push(handle);
            if level == 0 {
                self.root = NIL;
            } else {
                let parent = path[level - 1];
                let nibble = self.nibble(key, level - 1);
                self.tree_nodes[parent as usize].children[nibble] = NIL;
            }
        }
    }

    /// Destroys every payload and frees every node.
    ///
    /// # Safety
    /// `value_desc` must match the stored payload type and carry destruct.
    pub unsafe fn clear(&mut self, value_desc: &TypeDesc) -> Result<(), Error> {
        if self.root != NIL {
            self.destruct_subtree(value_desc, self.root, 0)?;
        }
        self.tree_nodes.clear();
        self.tree_free.clear();
        self.anchors.clear();
        self.anchor_free.clear();
        self.list.reset();
        self.root = NIL;
        self.values_count = 0;
        self.rev += 1;
        Ok(())
    }

    unsafe fn destruct_subtree(
        &mut self,
        value_desc: &TypeDesc,
        handle: Handle,
        level: usize,
    ) -> Result<(), Error> {
        let levels = self.levels();
        if level == levels - 1 {
            for nib in 0..16 {
                let mut node = self.anchors[handle as usize].firsts[nib];
                while node != NIL {
                    let next = (*self.list.hdr(node)).next;
                    value_desc.destruct(self.list.value_ptr(node))?;
                    node = next;
                }
            }
            return Ok(());
        }
        for nib in 0..16 {
            let child = self.tree_nodes[handle as usize].children[nib];
            if child != NIL {
                self.destruct_subtree(value_desc, child, level + 1)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_desc() -> TypeDesc {
        TypeDesc::of::<u32>()
            .with_move_construct::<u32>()
            .with_destruct::<u32>()
    }

    unsafe fn add(engine: &mut TrieEngine, key: u64, mut value: u32) -> Handle {
        engine
            .add(&u32_desc(), key, (&mut value as *mut u32).cast(), true)
            .unwrap()
    }

    unsafe fn value_at(engine: &TrieEngine, node: Handle) -> u32 {
        *engine.value_ptr(node).cast::<u32>()
    }

    #[test]
    fn add_and_find_single_key() {
        let mut engine = TrieEngine::new(4, Layout::new::<u32>());
        unsafe {
            let node = add(&mut engine, 0x1234, 77);
            assert_eq!(engine.find(0x1234), node);
            assert_eq!(engine.find(0x1235), NIL);
            assert_eq!(value_at(&engine, node), 77);
            engine.clear(&u32_desc()).unwrap();
        }
    }

    #[test]
    fn duplicate_keys_preserve_insertion_order() {
        let mut engine = TrieEngine::new(2, Layout::new::<u32>());
        unsafe {
            add(&mut engine, 1000, 1);
            add(&mut engine, 1000, 2);
            add(&mut engine, 1000, 3);
            let mut node = engine.find(1000);
            let mut seen = Vec::new();
            while node != NIL {
                seen.push(value_at(&engine, node));
                node = engine.next_in_list(node);
            }
            assert_eq!(seen, [1, 2, 3]);
            engine.clear(&u32_desc()).unwrap();
        }
    }

    #[test]
    fn ordered_traversal_across_keys() {
        let mut engine = TrieEngine::new(2, Layout::new::<u32>());
        unsafe {
            for &key in &[5u64, 1, 3, 0x0f10, 2] {
                add(&mut engine, key, key as u32);
            }
            let mut keys = Vec::new();
            let mut cursor = engine.find_first_key();
            while let Some((key, _)) = cursor {
                keys.push(key);
                cursor = engine.find_next_key(key);
            }
            assert_eq!(keys, [1, 2, 3, 5, 0x0f10]);
            engine.clear(&u32_desc()).unwrap();
        }
    }

    #[test]
    fn remove_prunes_empty_branches() {
        let mut engine = TrieEngine::new(2, Layout::new::<u32>());
        unsafe {
            let a = add(&mut engine, 42, 1);
            let b = add(&mut engine, 42, 2);
            engine.remove_value(&u32_desc(), 42, a, None).unwrap();
            assert_eq!(engine.find(42), b);
            engine.remove_value(&u32_desc(), 42, b, None).unwrap();
            assert_eq!(engine.find(42), NIL);
            assert!(engine.is_empty());
            // The branch was pruned to the root.
            assert_eq!(engine.root, NIL);
        }
    }

    #[test]
    fn remove_middle_keeps_list_linked() {
        let mut engine = TrieEngine::new(1, Layout::new::<u32>());
        unsafe {
            let a = add(&mut engine, 9, 1);
            let b = add(&mut engine, 9, 2);
            let c = add(&mut engine, 9, 3);
            engine.remove_value(&u32_desc(), 9, b, None).unwrap();
            assert_eq!(engine.find(9), a);
            assert_eq!(engine.next_in_list(a), c);
            assert_eq!(engine.next_in_list(c), NIL);
            engine.clear(&u32_desc()).unwrap();
        }
    }
}
