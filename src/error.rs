//! Error types for virtual table modules and their registration

use libsqlite3_sys as ffi;
use std::ffi::NulError;
use std::os::raw::c_int;
use std::str::Utf8Error;
use thiserror::Error;

/// Virtual table operation result type
pub type Result<T> = std::result::Result<T, VTabError>;

/// Errors raised by module implementations or by the dispatch glue
#[derive(Error, Debug)]
pub enum VTabError {
    /// Generic failure reported by a module or cursor
    #[error("{0}")]
    Module(String),

    /// The requested operation violates a constraint
    #[error("Constraint failed: {0}")]
    Constraint(String),

    /// Bad `CREATE VIRTUAL TABLE` argument or filter argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Column index out of range: {0}")]
    ColumnOutOfRange(i32),

    /// Error code (and message, if any) returned by SQLite itself
    #[error("SQLite error {code}: {}", message.as_deref().unwrap_or("unknown error"))]
    Sqlite { code: i32, message: Option<String> },

    #[error("Module registration failed: {0}")]
    RegistrationFailed(i32),

    #[error("Invalid name: {0}")]
    InvalidName(#[from] NulError),

    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] Utf8Error),

    #[error("Invalid module configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl VTabError {
    /// Convenience constructor for [`VTabError::Module`]
    pub fn module(message: impl Into<String>) -> Self {
        VTabError::Module(message.into())
    }

    /// The result code handed back to SQLite when this error escapes a callback
    pub fn sqlite_code(&self) -> c_int {
        match self {
            VTabError::Constraint(_) => ffi::SQLITE_CONSTRAINT,
            VTabError::ColumnOutOfRange(_) => ffi::SQLITE_RANGE,
            VTabError::Sqlite { code, .. } => *code,
            VTabError::RegistrationFailed(code) => *code,
            VTabError::Module(_)
            | VTabError::InvalidArgument(_)
            | VTabError::InvalidName(_)
            | VTabError::Utf8(_)
            | VTabError::Config(_) => ffi::SQLITE_ERROR,
        }
    }
}
