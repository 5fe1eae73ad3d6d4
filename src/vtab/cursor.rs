//! Cursor callbacks
//!
//! Every callback recovers the cursor object through the
//! [`VTabCursorHandle`] that `xOpen` allocated. Errors are reported on the
//! owning table's `zErrMsg`, which SQLite reads after the callback returns.

use super::module::{set_vtab_error, table_state};
use crate::bridge::VTabCursorHandle;
use crate::error::VTabError;
use crate::traits::{VirtualTableCursor, VirtualTableModule};
use crate::value::DatabaseValue;
use libsqlite3_sys as ffi;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use tracing::trace;

unsafe fn cursor_mut<'a, M: VirtualTableModule>(
    cursor: *mut ffi::sqlite3_vtab_cursor,
) -> &'a mut M::Cursor {
    VTabCursorHandle::from_base(cursor).cursor_ref.as_mut::<M::Cursor>()
}

unsafe fn report<M: VirtualTableModule>(
    cursor: *mut ffi::sqlite3_vtab_cursor,
    err: &VTabError,
) -> c_int {
    let vtab = (*cursor).pVtab;
    let log_errors = vtab.is_null() || table_state::<M>(vtab).log_errors;
    set_vtab_error(vtab, err, log_errors)
}

pub(super) unsafe extern "C" fn x_close<M: VirtualTableModule>(
    cursor: *mut ffi::sqlite3_vtab_cursor,
) -> c_int {
    let handle = Box::from_raw(cursor as *mut VTabCursorHandle);
    drop(handle.cursor_ref.into_box::<M::Cursor>());
    trace!("Closed cursor");
    ffi::SQLITE_OK
}

pub(super) unsafe extern "C" fn x_filter<M: VirtualTableModule>(
    cursor: *mut ffi::sqlite3_vtab_cursor,
    idx_num: c_int,
    idx_str: *const c_char,
    argc: c_int,
    argv: *mut *mut ffi::sqlite3_value,
) -> c_int {
    let idx_str = if idx_str.is_null() {
        None
    } else {
        match CStr::from_ptr(idx_str).to_str() {
            Ok(s) => Some(s),
            Err(e) => return report::<M>(cursor, &e.into()),
        }
    };
    let args = DatabaseValue::from_argv(argc, argv);

    match cursor_mut::<M>(cursor).filter(&args, idx_num, idx_str) {
        Ok(()) => ffi::SQLITE_OK,
        Err(err) => report::<M>(cursor, &err),
    }
}

pub(super) unsafe extern "C" fn x_next<M: VirtualTableModule>(
    cursor: *mut ffi::sqlite3_vtab_cursor,
) -> c_int {
    match cursor_mut::<M>(cursor).next() {
        Ok(()) => ffi::SQLITE_OK,
        Err(err) => report::<M>(cursor, &err),
    }
}

pub(super) unsafe extern "C" fn x_eof<M: VirtualTableModule>(
    cursor: *mut ffi::sqlite3_vtab_cursor,
) -> c_int {
    cursor_mut::<M>(cursor).eof() as c_int
}

pub(super) unsafe extern "C" fn x_column<M: VirtualTableModule>(
    cursor: *mut ffi::sqlite3_vtab_cursor,
    ctx: *mut ffi::sqlite3_context,
    i: c_int,
) -> c_int {
    match cursor_mut::<M>(cursor).column(i) {
        Ok(value) => {
            value.set_result(ctx);
            ffi::SQLITE_OK
        }
        Err(err) => report::<M>(cursor, &err),
    }
}

pub(super) unsafe extern "C" fn x_rowid<M: VirtualTableModule>(
    cursor: *mut ffi::sqlite3_vtab_cursor,
    p_rowid: *mut ffi::sqlite3_int64,
) -> c_int {
    match cursor_mut::<M>(cursor).rowid() {
        Ok(rowid) => {
            *p_rowid = rowid;
            ffi::SQLITE_OK
        }
        Err(err) => report::<M>(cursor, &err),
    }
}
