//! ABI-compatible virtual table and cursor records
//!
//! SQLite hands every virtual table callback a `*mut sqlite3_vtab` (or
//! `*mut sqlite3_vtab_cursor`). Implementations extend those structs by
//! embedding them as the first field of a larger struct, so a pointer to the
//! base can be cast back to the enclosing record. The records here carry one
//! extra field: an untyped reference to the Rust object that implements the
//! table or cursor.
//!
//! Neither record owns what its reference points to. Creating and destroying
//! the referenced object is up to whoever populates the record, which in this
//! crate is the dispatch glue in [`crate::vtab`].

use libsqlite3_sys as ffi;
use std::mem::{offset_of, size_of};
use std::os::raw::c_void;
use std::ptr;

/// Untyped, non-owning reference to an externally owned object
///
/// Dropping a `RawRef` never frees anything.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawRef(*mut c_void);

impl RawRef {
    /// A reference to nothing
    pub const fn null() -> Self {
        RawRef(ptr::null_mut())
    }

    pub const fn from_ptr(ptr: *mut c_void) -> Self {
        RawRef(ptr)
    }

    pub const fn as_ptr(self) -> *mut c_void {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }

    /// Leak `value` onto the heap and return a reference to it
    ///
    /// The allocation must eventually be reclaimed with [`RawRef::into_box`].
    pub fn from_box<T>(value: Box<T>) -> Self {
        RawRef(Box::into_raw(value) as *mut c_void)
    }

    /// Take back ownership of an object previously leaked by [`RawRef::from_box`]
    ///
    /// # Safety
    ///
    /// The reference must come from `RawRef::from_box::<T>` with the same `T`,
    /// and must not have been reclaimed already.
    pub unsafe fn into_box<T>(self) -> Box<T> {
        Box::from_raw(self.0 as *mut T)
    }

    /// # Safety
    ///
    /// The reference must be non-null and point to a live `T`.
    pub unsafe fn as_ref<'a, T>(self) -> &'a T {
        &*(self.0 as *const T)
    }

    /// # Safety
    ///
    /// The reference must be non-null, point to a live `T`, and no other
    /// reference to that `T` may be in use.
    pub unsafe fn as_mut<'a, T>(self) -> &'a mut T {
        &mut *(self.0 as *mut T)
    }
}

impl Default for RawRef {
    fn default() -> Self {
        RawRef::null()
    }
}

/// Virtual table record (`sqlite3_vtab` plus a module reference)
#[repr(C)]
pub struct VTabHandle {
    /// sqlite3 required fields (MUST be first field)
    pub base: ffi::sqlite3_vtab,
    /// Points at the module object implementing this table
    pub module_ref: RawRef,
}

/// Virtual table cursor record (`sqlite3_vtab_cursor` plus a cursor reference)
#[repr(C)]
pub struct VTabCursorHandle {
    /// sqlite3 required fields (MUST be first field)
    pub base: ffi::sqlite3_vtab_cursor,
    /// Points at the cursor object
    pub cursor_ref: RawRef,
}

const _: () = assert!(offset_of!(VTabHandle, base) == 0);
const _: () = assert!(offset_of!(VTabCursorHandle, base) == 0);
const _: () = assert!(offset_of!(VTabHandle, module_ref) >= size_of::<ffi::sqlite3_vtab>());
const _: () =
    assert!(offset_of!(VTabCursorHandle, cursor_ref) >= size_of::<ffi::sqlite3_vtab_cursor>());

impl VTabHandle {
    /// Build a record with a zeroed base, ready to be handed to SQLite
    pub fn new(module_ref: RawRef) -> Self {
        Self {
            // SAFETY: sqlite3_vtab is plain pointers and integers
            base: unsafe { std::mem::zeroed() },
            module_ref,
        }
    }

    /// Recover the enclosing record from the base pointer SQLite passes around
    ///
    /// # Safety
    ///
    /// `base` must point at the `base` field of a live `VTabHandle`.
    pub unsafe fn from_base<'a>(base: *mut ffi::sqlite3_vtab) -> &'a mut VTabHandle {
        &mut *(base as *mut VTabHandle)
    }

    pub fn as_base(&mut self) -> *mut ffi::sqlite3_vtab {
        &mut self.base
    }
}

impl VTabCursorHandle {
    pub fn new(cursor_ref: RawRef) -> Self {
        Self {
            // SAFETY: sqlite3_vtab_cursor is a single pointer
            base: unsafe { std::mem::zeroed() },
            cursor_ref,
        }
    }

    /// # Safety
    ///
    /// `base` must point at the `base` field of a live `VTabCursorHandle`.
    pub unsafe fn from_base<'a>(base: *mut ffi::sqlite3_vtab_cursor) -> &'a mut VTabCursorHandle {
        &mut *(base as *mut VTabCursorHandle)
    }

    pub fn as_base(&mut self) -> *mut ffi::sqlite3_vtab_cursor {
        &mut self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_at_offset_zero() {
        assert_eq!(offset_of!(VTabHandle, base), 0);
        assert_eq!(offset_of!(VTabCursorHandle, base), 0);

        let mut handle = VTabHandle::new(RawRef::null());
        let addr = &handle as *const VTabHandle as usize;
        assert_eq!(handle.as_base() as usize, addr);

        let mut cursor = VTabCursorHandle::new(RawRef::null());
        let addr = &cursor as *const VTabCursorHandle as usize;
        assert_eq!(cursor.as_base() as usize, addr);
    }

    #[test]
    fn test_size_covers_both_fields() {
        assert!(size_of::<VTabHandle>() >= size_of::<ffi::sqlite3_vtab>() + size_of::<RawRef>());
        assert!(
            size_of::<VTabCursorHandle>()
                >= size_of::<ffi::sqlite3_vtab_cursor>() + size_of::<RawRef>()
        );
        assert_eq!(size_of::<RawRef>(), size_of::<*mut c_void>());
    }

    #[test]
    fn test_from_base_recovers_reference() {
        let mut value = 42u64;
        let reference = RawRef::from_ptr(&mut value as *mut u64 as *mut c_void);

        let mut handle = VTabHandle::new(reference);
        let base = handle.as_base();
        let recovered = unsafe { VTabHandle::from_base(base) };
        assert_eq!(recovered.module_ref, reference);
        assert_eq!(unsafe { *recovered.module_ref.as_ref::<u64>() }, 42);
    }

    #[test]
    fn test_box_round_trip() {
        let reference = RawRef::from_box(Box::new(String::from("cursor")));
        assert!(!reference.is_null());

        let mut cursor = VTabCursorHandle::new(reference);
        let recovered = unsafe { VTabCursorHandle::from_base(cursor.as_base()) };
        unsafe { recovered.cursor_ref.as_mut::<String>().push_str("-1") };

        let owned = unsafe { recovered.cursor_ref.into_box::<String>() };
        assert_eq!(*owned, "cursor-1");
    }

    #[test]
    fn test_new_zeroes_base() {
        let handle = VTabHandle::new(RawRef::null());
        assert!(handle.base.pModule.is_null());
        assert!(handle.base.zErrMsg.is_null());
        assert_eq!(handle.base.nRef, 0);
        assert!(handle.module_ref.is_null());

        let cursor = VTabCursorHandle::new(RawRef::default());
        assert!(cursor.base.pVtab.is_null());
    }
}
