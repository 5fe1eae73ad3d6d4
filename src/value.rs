//! Values exchanged with SQLite inside virtual table callbacks

use libsqlite3_sys as ffi;
use std::os::raw::{c_uchar, c_void};
use std::slice;

/// A single SQLite value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DatabaseValue {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl DatabaseValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DatabaseValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DatabaseValue::Real(f) => Some(*f),
            DatabaseValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DatabaseValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            DatabaseValue::Blob(b) => Some(b),
            DatabaseValue::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Read a protected or unprotected `sqlite3_value`
    ///
    /// Text that is not valid UTF-8 is converted lossily.
    ///
    /// # Safety
    ///
    /// `value` must be a valid `sqlite3_value` pointer for the duration of the call.
    pub unsafe fn from_raw(value: *mut ffi::sqlite3_value) -> Self {
        match ffi::sqlite3_value_type(value) {
            ffi::SQLITE_INTEGER => DatabaseValue::Integer(ffi::sqlite3_value_int64(value)),
            ffi::SQLITE_FLOAT => DatabaseValue::Real(ffi::sqlite3_value_double(value)),
            ffi::SQLITE_TEXT => {
                let text = ffi::sqlite3_value_text(value);
                let len = ffi::sqlite3_value_bytes(value);
                if text.is_null() || len <= 0 {
                    DatabaseValue::Text(String::new())
                } else {
                    let bytes = slice::from_raw_parts(text, len as usize);
                    DatabaseValue::Text(String::from_utf8_lossy(bytes).into_owned())
                }
            }
            ffi::SQLITE_BLOB => {
                let blob = ffi::sqlite3_value_blob(value);
                let len = ffi::sqlite3_value_bytes(value);
                if blob.is_null() || len <= 0 {
                    DatabaseValue::Blob(Vec::new())
                } else {
                    DatabaseValue::Blob(slice::from_raw_parts(blob as *const u8, len as usize).to_vec())
                }
            }
            _ => DatabaseValue::Null,
        }
    }

    /// Convert an `argv` array from `xFilter`
    ///
    /// # Safety
    ///
    /// `argv` must point to `argc` valid `sqlite3_value` pointers, or be null
    /// when `argc` is zero.
    pub unsafe fn from_argv(argc: i32, argv: *mut *mut ffi::sqlite3_value) -> Vec<Self> {
        if argc <= 0 || argv.is_null() {
            return Vec::new();
        }
        slice::from_raw_parts(argv, argc as usize)
            .iter()
            .map(|&v| DatabaseValue::from_raw(v))
            .collect()
    }

    /// Store this value as the result of `ctx`
    ///
    /// Text and blobs are copied by SQLite (`SQLITE_TRANSIENT`).
    ///
    /// # Safety
    ///
    /// `ctx` must be the live `sqlite3_context` of an `xColumn` call.
    pub unsafe fn set_result(&self, ctx: *mut ffi::sqlite3_context) {
        match self {
            DatabaseValue::Null => ffi::sqlite3_result_null(ctx),
            DatabaseValue::Integer(i) => ffi::sqlite3_result_int64(ctx, *i),
            DatabaseValue::Real(f) => ffi::sqlite3_result_double(ctx, *f),
            DatabaseValue::Text(s) => ffi::sqlite3_result_text64(
                ctx,
                s.as_ptr() as *const _,
                s.len() as ffi::sqlite3_uint64,
                ffi::SQLITE_TRANSIENT(),
                ffi::SQLITE_UTF8 as c_uchar,
            ),
            DatabaseValue::Blob(b) => ffi::sqlite3_result_blob64(
                ctx,
                b.as_ptr() as *const c_void,
                b.len() as ffi::sqlite3_uint64,
                ffi::SQLITE_TRANSIENT(),
            ),
        }
    }
}

impl From<i64> for DatabaseValue {
    fn from(value: i64) -> Self {
        DatabaseValue::Integer(value)
    }
}

impl From<i32> for DatabaseValue {
    fn from(value: i32) -> Self {
        DatabaseValue::Integer(value as i64)
    }
}

impl From<bool> for DatabaseValue {
    fn from(value: bool) -> Self {
        DatabaseValue::Integer(value as i64)
    }
}

impl From<f64> for DatabaseValue {
    fn from(value: f64) -> Self {
        DatabaseValue::Real(value)
    }
}

impl From<String> for DatabaseValue {
    fn from(value: String) -> Self {
        DatabaseValue::Text(value)
    }
}

impl From<&str> for DatabaseValue {
    fn from(value: &str) -> Self {
        DatabaseValue::Text(value.to_string())
    }
}

impl From<Vec<u8>> for DatabaseValue {
    fn from(value: Vec<u8>) -> Self {
        DatabaseValue::Blob(value)
    }
}

impl<T: Into<DatabaseValue>> From<Option<T>> for DatabaseValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(DatabaseValue::Null, Into::into)
    }
}
