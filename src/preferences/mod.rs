//! Key/value preference stores, optionally scoped to a named suite
//! (a container shared between an app and its extensions).

mod file;
mod memory;
mod migrations;
mod sqlite;

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;

pub use file::{FilePreferenceProvider, FilePreferences};
pub use memory::{MemoryPreferenceProvider, MemoryPreferences};
pub use sqlite::{SqlitePreferenceProvider, SqlitePreferences};

/// Domain shared by every app on the device; never usable as a suite.
pub const GLOBAL_DOMAIN: &str = "NSGlobalDomain";

pub trait Preferences: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

pub trait PreferenceProvider: Send + Sync {
    /// The process-wide store.
    fn standard(&self) -> Arc<dyn Preferences>;

    /// The store scoped to suite `name`, or `None` if no such suite can exist.
    fn suite(&self, name: &str) -> Result<Option<Arc<dyn Preferences>>>;
}

/// Whether `name` can address a suite. Names end up in file names, so only
/// reverse-DNS style characters are accepted.
pub fn is_valid_suite_name(name: &str) -> bool {
    !name.is_empty()
        && name != GLOBAL_DOMAIN
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}
