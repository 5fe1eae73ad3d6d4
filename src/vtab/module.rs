//! Module registration and table-level callbacks

use super::cursor;
use crate::bridge::{RawRef, VTabCursorHandle, VTabHandle};
use crate::config::{ModuleKind, ModuleOptions};
use crate::error::{Result, VTabError};
use crate::index::IndexInfo;
use crate::traits::{BestIndexResult, ModuleArguments, VirtualTableModule, VirtualTableOptions};
use libsqlite3_sys as ffi;
use rusqlite::Connection;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;
use tracing::{debug, info, trace, warn};

const ZERO_MODULE: ffi::sqlite3_module = unsafe { std::mem::zeroed() };

/// Client data of one registration, freed by SQLite through `drop_module_data`
struct ModuleData {
    module: ffi::sqlite3_module,
    name: String,
    options: ModuleOptions,
}

/// What a table's `module_ref` points at
pub(super) struct TableState<M> {
    pub(super) module: M,
    pub(super) table_name: String,
    pub(super) log_errors: bool,
}

/// Register `M` under `name` on `conn`
pub fn register_module<M: VirtualTableModule>(
    conn: &Connection,
    name: &str,
    options: ModuleOptions,
) -> Result<()> {
    unsafe { register_module_raw::<M>(conn.handle(), name, options) }
}

/// Register `M` under `name` on a raw connection handle
///
/// # Safety
///
/// `db` must be an open connection that outlives every table created from
/// this registration.
pub unsafe fn register_module_raw<M: VirtualTableModule>(
    db: *mut ffi::sqlite3,
    name: &str,
    options: ModuleOptions,
) -> Result<()> {
    let c_name = CString::new(name)?;
    let kind = options.kind;

    let data = Box::into_raw(Box::new(ModuleData {
        module: sqlite_module::<M>(kind),
        name: name.to_string(),
        options,
    }));

    let rc = ffi::sqlite3_create_module_v2(
        db,
        c_name.as_ptr(),
        ptr::addr_of!((*data).module),
        data as *mut c_void,
        Some(drop_module_data),
    );
    if rc != ffi::SQLITE_OK {
        // SQLITE_MISUSE comes from the API armor check, which returns before
        // the destructor is wired up. Every other failure has already run
        // drop_module_data.
        if rc == ffi::SQLITE_MISUSE {
            drop(Box::from_raw(data));
        }
        return Err(VTabError::RegistrationFailed(rc));
    }

    info!(module = name, ?kind, "Registered virtual table module");
    Ok(())
}

/// Remove the module registered under `name`
///
/// Tables already using the module keep it alive until they disconnect.
pub fn unregister_module(conn: &Connection, name: &str) -> Result<()> {
    unsafe { unregister_module_raw(conn.handle(), name) }
}

/// # Safety
///
/// `db` must be an open connection.
pub unsafe fn unregister_module_raw(db: *mut ffi::sqlite3, name: &str) -> Result<()> {
    let c_name = CString::new(name)?;
    let rc = ffi::sqlite3_create_module_v2(db, c_name.as_ptr(), ptr::null(), ptr::null_mut(), None);
    if rc != ffi::SQLITE_OK {
        return Err(VTabError::RegistrationFailed(rc));
    }

    info!(module = name, "Unregistered virtual table module");
    Ok(())
}

fn sqlite_module<M: VirtualTableModule>(kind: ModuleKind) -> ffi::sqlite3_module {
    let x_create: Option<
        unsafe extern "C" fn(
            *mut ffi::sqlite3,
            *mut c_void,
            c_int,
            *const *const c_char,
            *mut *mut ffi::sqlite3_vtab,
            *mut *mut c_char,
        ) -> c_int,
    > = match kind {
        ModuleKind::Default => Some(x_create::<M>),
        // Same function for both marks the module as eponymous
        ModuleKind::Eponymous => Some(x_connect::<M>),
        ModuleKind::EponymousOnly => None,
    };

    ffi::sqlite3_module {
        iVersion: 1,
        xCreate: x_create,
        xConnect: Some(x_connect::<M>),
        xBestIndex: Some(x_best_index::<M>),
        xDisconnect: Some(x_disconnect::<M>),
        xDestroy: Some(x_destroy::<M>),
        xOpen: Some(x_open::<M>),
        xClose: Some(cursor::x_close::<M>),
        xFilter: Some(cursor::x_filter::<M>),
        xNext: Some(cursor::x_next::<M>),
        xEof: Some(cursor::x_eof::<M>),
        xColumn: Some(cursor::x_column::<M>),
        xRowid: Some(cursor::x_rowid::<M>),
        ..ZERO_MODULE
    }
}

unsafe extern "C" fn drop_module_data(data: *mut c_void) {
    let data = Box::from_raw(data as *mut ModuleData);
    debug!(module = %data.name, "Released virtual table module");
}

/// Write `err` into the table's error slot and return its result code
pub(super) unsafe fn set_vtab_error(
    vtab: *mut ffi::sqlite3_vtab,
    err: &VTabError,
    log_errors: bool,
) -> c_int {
    if log_errors {
        warn!(error = %err, "Virtual table callback failed");
    }
    if !vtab.is_null() {
        ffi::sqlite3_free((*vtab).zErrMsg as *mut c_void);
        (*vtab).zErrMsg = sqlite_string(&err.to_string());
    }
    err.sqlite_code()
}

/// Copy `s` into memory SQLite is allowed to free
pub(super) unsafe fn sqlite_string(s: &str) -> *mut c_char {
    let s = CString::new(s.replace('\0', "")).unwrap_or_default();
    ffi::sqlite3_mprintf(c"%s".as_ptr(), s.as_ptr())
}

pub(super) unsafe fn table_state<'a, M>(vtab: *mut ffi::sqlite3_vtab) -> &'a mut TableState<M> {
    VTabHandle::from_base(vtab).module_ref.as_mut::<TableState<M>>()
}

unsafe fn parse_arguments(argc: c_int, argv: *const *const c_char) -> Result<ModuleArguments> {
    if argc < 3 || argv.is_null() {
        return Err(VTabError::InvalidArgument(format!(
            "expected at least 3 module arguments, got {}",
            argc
        )));
    }

    let mut all = Vec::with_capacity(argc as usize);
    for i in 0..argc as usize {
        let arg = *argv.add(i);
        if arg.is_null() {
            all.push(String::new());
        } else {
            all.push(CStr::from_ptr(arg).to_str()?.to_string());
        }
    }

    let arguments = all.split_off(3);
    let mut names = all.into_iter();
    Ok(ModuleArguments {
        module_name: names.next().unwrap_or_default(),
        schema_name: names.next().unwrap_or_default(),
        table_name: names.next().unwrap_or_default(),
        arguments,
    })
}

unsafe fn declare<M: VirtualTableModule>(db: *mut ffi::sqlite3, module: &M) -> Result<()> {
    let sql = CString::new(module.declaration())?;
    let rc = ffi::sqlite3_declare_vtab(db, sql.as_ptr());
    if rc != ffi::SQLITE_OK {
        return Err(sqlite_error(db, rc));
    }

    let VirtualTableOptions {
        constraint_support,
        innocuous,
        direct_only,
    } = module.options();
    if constraint_support {
        vtab_config(db, ffi::sqlite3_vtab_config(db, ffi::SQLITE_VTAB_CONSTRAINT_SUPPORT, 1 as c_int))?;
    }
    if innocuous {
        vtab_config(db, ffi::sqlite3_vtab_config(db, ffi::SQLITE_VTAB_INNOCUOUS))?;
    }
    if direct_only {
        vtab_config(db, ffi::sqlite3_vtab_config(db, ffi::SQLITE_VTAB_DIRECTONLY))?;
    }
    Ok(())
}

unsafe fn vtab_config(db: *mut ffi::sqlite3, rc: c_int) -> Result<()> {
    if rc == ffi::SQLITE_OK {
        Ok(())
    } else {
        Err(sqlite_error(db, rc))
    }
}

unsafe fn sqlite_error(db: *mut ffi::sqlite3, code: c_int) -> VTabError {
    let msg = ffi::sqlite3_errmsg(db);
    let message = if msg.is_null() {
        None
    } else {
        Some(CStr::from_ptr(msg).to_string_lossy().into_owned())
    };
    VTabError::Sqlite { code, message }
}

// Table callbacks

unsafe extern "C" fn x_create<M: VirtualTableModule>(
    db: *mut ffi::sqlite3,
    p_aux: *mut c_void,
    argc: c_int,
    argv: *const *const c_char,
    pp_vtab: *mut *mut ffi::sqlite3_vtab,
    pz_err: *mut *mut c_char,
) -> c_int {
    connect::<M>(db, p_aux, argc, argv, pp_vtab, pz_err, true)
}

unsafe extern "C" fn x_connect<M: VirtualTableModule>(
    db: *mut ffi::sqlite3,
    p_aux: *mut c_void,
    argc: c_int,
    argv: *const *const c_char,
    pp_vtab: *mut *mut ffi::sqlite3_vtab,
    pz_err: *mut *mut c_char,
) -> c_int {
    connect::<M>(db, p_aux, argc, argv, pp_vtab, pz_err, false)
}

unsafe fn connect<M: VirtualTableModule>(
    db: *mut ffi::sqlite3,
    p_aux: *mut c_void,
    argc: c_int,
    argv: *const *const c_char,
    pp_vtab: *mut *mut ffi::sqlite3_vtab,
    pz_err: *mut *mut c_char,
    create: bool,
) -> c_int {
    let log_errors = if p_aux.is_null() {
        true
    } else {
        (*(p_aux as *const ModuleData)).options.log_errors
    };

    let result = parse_arguments(argc, argv).and_then(|args| {
        let module = M::connect(&args, create)?;
        declare(db, &module)?;
        Ok((args, module))
    });

    let (args, module) = match result {
        Ok(r) => r,
        Err(err) => {
            if log_errors {
                warn!(error = %err, "Failed to connect virtual table");
            }
            if !pz_err.is_null() {
                *pz_err = sqlite_string(&err.to_string());
            }
            return err.sqlite_code();
        }
    };

    debug!(
        module = %args.module_name,
        table = %args.table_name,
        create,
        "Connected virtual table"
    );

    let state = TableState {
        module,
        table_name: args.table_name,
        log_errors,
    };
    let handle = Box::new(VTabHandle::new(RawRef::from_box(Box::new(state))));
    *pp_vtab = Box::into_raw(handle) as *mut ffi::sqlite3_vtab;
    ffi::SQLITE_OK
}

unsafe extern "C" fn x_best_index<M: VirtualTableModule>(
    vtab: *mut ffi::sqlite3_vtab,
    info: *mut ffi::sqlite3_index_info,
) -> c_int {
    let state = table_state::<M>(vtab);
    let mut info = IndexInfo::from_raw(info);
    match state.module.best_index(&mut info) {
        BestIndexResult::Ok => ffi::SQLITE_OK,
        BestIndexResult::Constraint => ffi::SQLITE_CONSTRAINT,
    }
}

unsafe extern "C" fn x_disconnect<M: VirtualTableModule>(vtab: *mut ffi::sqlite3_vtab) -> c_int {
    let handle = Box::from_raw(vtab as *mut VTabHandle);
    ffi::sqlite3_free(handle.base.zErrMsg as *mut c_void);

    let state = handle.module_ref.into_box::<TableState<M>>();
    debug!(table = %state.table_name, "Disconnected virtual table");
    ffi::SQLITE_OK
}

unsafe extern "C" fn x_destroy<M: VirtualTableModule>(vtab: *mut ffi::sqlite3_vtab) -> c_int {
    let state = table_state::<M>(vtab);
    if let Err(err) = state.module.destroy() {
        return set_vtab_error(vtab, &err, state.log_errors);
    }
    debug!(table = %state.table_name, "Destroyed virtual table");
    x_disconnect::<M>(vtab)
}

unsafe extern "C" fn x_open<M: VirtualTableModule>(
    vtab: *mut ffi::sqlite3_vtab,
    pp_cursor: *mut *mut ffi::sqlite3_vtab_cursor,
) -> c_int {
    let state = table_state::<M>(vtab);
    match state.module.open_cursor() {
        Ok(cursor) => {
            let handle = Box::new(VTabCursorHandle::new(RawRef::from_box(Box::new(cursor))));
            *pp_cursor = Box::into_raw(handle) as *mut ffi::sqlite3_vtab_cursor;
            trace!(table = %state.table_name, "Opened cursor");
            ffi::SQLITE_OK
        }
        Err(err) => set_vtab_error(vtab, &err, state.log_errors),
    }
}
