//! Module registration options

use crate::error::Result;
use crate::traits::VirtualTableModule;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// How SQLite may instantiate a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleKind {
    /// Tables must be created with `CREATE VIRTUAL TABLE`
    #[default]
    Default,
    /// Also usable directly under the module name
    Eponymous,
    /// Only usable under the module name; `CREATE VIRTUAL TABLE` fails
    EponymousOnly,
}

/// Options for [`crate::register_module`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleOptions {
    pub kind: ModuleKind,
    /// Log callback errors with `tracing::warn!` before returning them to SQLite
    pub log_errors: bool,
}

impl Default for ModuleOptions {
    fn default() -> Self {
        Self {
            kind: ModuleKind::Default,
            log_errors: true,
        }
    }
}

impl ModuleOptions {
    /// Parse options from TOML, e.g. `kind = "eponymous-only"`
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

/// Builder for registering a module with non-default options
///
/// ```rust,no_run
/// # use pipeline_vtab::{ModuleBuilder, Result, VirtualTableModule};
/// # fn demo<M: VirtualTableModule>(conn: &rusqlite::Connection) -> Result<()> {
/// ModuleBuilder::new("series")
///     .eponymous_only()
///     .register::<M>(conn)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ModuleBuilder {
    name: String,
    options: ModuleOptions,
}

impl ModuleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: ModuleOptions::default(),
        }
    }

    pub fn options(mut self, options: ModuleOptions) -> Self {
        self.options = options;
        self
    }

    pub fn eponymous(mut self) -> Self {
        self.options.kind = ModuleKind::Eponymous;
        self
    }

    pub fn eponymous_only(mut self) -> Self {
        self.options.kind = ModuleKind::EponymousOnly;
        self
    }

    /// Don't log callback errors
    pub fn quiet(mut self) -> Self {
        self.options.log_errors = false;
        self
    }

    pub fn register<M: VirtualTableModule>(self, conn: &Connection) -> Result<()> {
        crate::vtab::register_module::<M>(conn, &self.name, self.options)
    }
}
