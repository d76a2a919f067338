//! Runtime type descriptor for type-erased element storage.
//!
//! The collection engines are non-generic: they store elements as raw bytes
//! and receive a [`TypeDesc`] by reference on every call that needs to
//! construct, move, copy, or destroy one. Descriptors are stack values built
//! at each call site with only the operations that call requires; invoking an
//! absent operation fails with [`Error::UnsupportedOperation`].

use core::alloc::Layout;
use core::mem;
use core::ptr;

use crate::error::Error;

/// Size, alignment, and lifecycle function pointers for one erased type.
#[derive(Clone, Copy)]
pub struct TypeDesc {
    size: usize,
    align: usize,
    default_construct: Option<unsafe fn(*mut u8)>,
    move_construct: Option<unsafe fn(*mut u8, *mut u8)>,
    copy_construct: Option<unsafe fn(*mut u8, *const u8)>,
    destruct: Option<unsafe fn(*mut u8)>,
}

unsafe fn default_construct_impl<T: Default>(dst: *mut u8) {
    ptr::write(dst.cast::<T>(), T::default());
}

unsafe fn move_construct_impl<T>(dst: *mut u8, src: *mut u8) {
    // A move is a bitwise transfer; the source slot is dead afterwards and
    // must not be dropped by the caller.
    ptr::copy_nonoverlapping(src.cast::<T>(), dst.cast::<T>(), 1);
}

unsafe fn copy_construct_impl<T: Clone>(dst: *mut u8, src: *const u8) {
    ptr::write(dst.cast::<T>(), (*src.cast::<T>()).clone());
}

unsafe fn destruct_impl<T>(p: *mut u8) {
    ptr::drop_in_place(p.cast::<T>());
}

impl TypeDesc {
    /// Descriptor carrying only size and alignment.
    pub fn of<T>() -> Self {
        TypeDesc {
            size: mem::size_of::<T>(),
            align: mem::align_of::<T>(),
            default_construct: None,
            move_construct: None,
            copy_construct: None,
            destruct: None,
        }
    }

    /// Adds default-construct-in-place.
    pub fn with_default_construct<T: Default>(mut self) -> Self {
        debug_assert_eq!(self.size, mem::size_of::<T>());
        self.default_construct = Some(default_construct_impl::<T>);
        self
    }

    /// Adds move-construct-from.
    pub fn with_move_construct<T>(mut self) -> Self {
        debug_assert_eq!(self.size, mem::size_of::<T>());
        self.move_construct = Some(move_construct_impl::<T>);
        self
    }

    /// Adds copy-construct-from.
    pub fn with_copy_construct<T: Clone>(mut self) -> Self {
        debug_assert_eq!(self.size, mem::size_of::<T>());
        self.copy_construct = Some(copy_construct_impl::<T>);
        self
    }

    /// Adds destruct-in-place.
    pub fn with_destruct<T>(mut self) -> Self {
        debug_assert_eq!(self.size, mem::size_of::<T>());
        self.destruct = Some(destruct_impl::<T>);
        self
    }

    /// Element size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Element alignment in bytes.
    #[inline]
    pub fn align(&self) -> usize {
        self.align
    }

    /// Layout of a single element.
    #[inline]
    pub fn layout(&self) -> Layout {
        // SAFETY: size/align came from a real Rust type.
        unsafe { Layout::from_size_align_unchecked(self.size, self.align) }
    }

    /// Layout of `n` contiguous elements.
    pub fn array_layout(&self, n: usize) -> Result<Layout, Error> {
        Layout::array::<u8>(self.size.checked_mul(n).ok_or(Error::OutOfMemory)?)
            .map_err(|_| Error::OutOfMemory)
            .map(|l| l.align_to(self.align).unwrap_or(l))
    }

    /// Default-constructs an element at `dst`.
    ///
    /// # Safety
    /// `dst` must be valid, aligned storage for one element.
    pub unsafe fn default_construct(&self, dst: *mut u8) -> Result<(), Error> {
        let f = self.default_construct.ok_or(Error::UnsupportedOperation)?;
        f(dst);
        Ok(())
    }

    /// Move-constructs the element at `src` into `dst`, leaving `src` dead.
    ///
    /// # Safety
    /// `dst` must be valid, aligned, uninitialized storage; `src` must hold a
    /// live element that the caller will not drop afterwards.
    pub unsafe fn move_construct(&self, dst: *mut u8, src: *mut u8) -> Result<(), Error> {
        let f = self.move_construct.ok_or(Error::UnsupportedOperation)?;
        f(dst, src);
        Ok(())
    }

    /// Copy-constructs the element at `src` into `dst`.
    ///
    /// # Safety
    /// `dst` must be valid, aligned, uninitialized storage; `src` must hold a
    /// live element.
    pub unsafe fn copy_construct(&self, dst: *mut u8, src: *const u8) -> Result<(), Error> {
        let f = self.copy_construct.ok_or(Error::UnsupportedOperation)?;
        f(dst, src);
        Ok(())
    }

    /// Destroys the element at `p`.
    ///
    /// # Safety
    /// `p` must hold a live element.
    pub unsafe fn destruct(&self, p: *mut u8) -> Result<(), Error> {
        let f = self.destruct.ok_or(Error::UnsupportedOperation)?;
        f(p);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::alloc::Layout;
    use std::rc::Rc;

    #[test]
    fn move_and_destruct_roundtrip() {
        let desc = TypeDesc::of::<Rc<u32>>()
            .with_move_construct::<Rc<u32>>()
            .with_destruct::<Rc<u32>>();
        let value = Rc::new(7u32);
        let witness = Rc::clone(&value);
        assert_eq!(Rc::strong_count(&witness), 2);

        let layout = Layout::new::<Rc<u32>>();
        unsafe {
            let slot = std::alloc::alloc(layout);
            let mut src = core::mem::ManuallyDrop::new(value);
            desc.move_construct(slot, (&mut *src as *mut Rc<u32>).cast())
                .unwrap();
            // Still two strong refs: the move transferred, not cloned.
            assert_eq!(Rc::strong_count(&witness), 2);
            desc.destruct(slot).unwrap();
            assert_eq!(Rc::strong_count(&witness), 1);
            std::alloc::dealloc(slot, layout);
        }
    }

    #[test]
    fn missing_operation_is_reported() {
        let desc = TypeDesc::of::<u32>();
        let mut slot = 0u32;
        let r = unsafe { desc.destruct((&mut slot as *mut u32).cast()) };
        assert_eq!(r, Err(Error::UnsupportedOperation));
    }

    #[test]
    fn copy_construct_clones() {
        let desc = TypeDesc::of::<String>()
            .with_copy_construct::<String>()
            .with_destruct::<String>();
        let src = String::from("abc");
        let layout = Layout::new::<String>();
        unsafe {
            let slot = std::alloc::alloc(layout);
            desc.copy_construct(slot, (&src as *const String).cast()).unwrap();
            assert_eq!(*slot.cast::<String>(), "abc");
            desc.destruct(slot).unwrap();
            std::alloc::dealloc(slot, layout);
        }
        assert_eq!(src, "abc");
    }
}
