//! SQLite virtual table dispatch
//!
//! This module owns the `sqlite3_module` callbacks that connect SQLite to a
//! [`VirtualTableModule`](crate::VirtualTableModule). It is the code that
//! fills in the bridge records:
//!
//! - `xCreate`/`xConnect` box the module and attach it to a [`VTabHandle`]
//! - `xOpen` boxes a cursor and attaches it to a [`VTabCursorHandle`]
//! - `xClose`/`xDisconnect`/`xDestroy` take the boxes back and drop them
//!
//! [`VTabHandle`]: crate::bridge::VTabHandle
//! [`VTabCursorHandle`]: crate::bridge::VTabCursorHandle

mod cursor;
mod module;


pub use module::{register_module, register_module_raw, unregister_module, unregister_module_raw};
