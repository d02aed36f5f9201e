use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::{is_valid_suite_name, migrations::run_migrations, PreferenceProvider, Preferences};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Suite column value for the standard store; suite names are never empty.
const STANDARD_SUITE: &str = "";

type SharedConnection = Arc<Mutex<Connection>>;

/// One suite's rows in the shared preferences database.
pub struct SqlitePreferences {
    conn: SharedConnection,
    suite: String,
}

impl SqlitePreferences {
    fn with_conn<T>(&self, task: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| anyhow!("preferences database lock poisoned"))?;
        task(&guard)
    }
}

impl Preferences for SqlitePreferences {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> = self.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM preferences WHERE suite = ?1 AND key = ?2",
                params![self.suite, key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("failed to read preference '{key}'"))
        })?;

        raw.map(|text| {
            serde_json::from_str(&text)
                .with_context(|| format!("preference '{key}' holds invalid JSON"))
        })
        .transpose()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let text = serde_json::to_string(&value)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO preferences (suite, key, value, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(suite, key) DO UPDATE
                 SET value = excluded.value,
                     updated_at = excluded.updated_at",
                params![self.suite, key, text, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("failed to write preference '{key}'"))?;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM preferences WHERE suite = ?1 AND key = ?2",
                params![self.suite, key],
            )
            .with_context(|| format!("failed to delete preference '{key}'"))?;
            Ok(())
        })
    }
}

/// All suites in a single SQLite file, keyed by `(suite, key)`.
pub struct SqlitePreferenceProvider {
    conn: SharedConnection,
    db_path: PathBuf,
}

impl SqlitePreferenceProvider {
    pub fn open(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let mut conn = Connection::open(&db_path).context("failed to open SQLite database")?;
        if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
            log_warn!("Failed to enable WAL mode: {err}");
        }
        run_migrations(&mut conn).context("failed to run preferences migrations")?;

        log_info!("Preferences database ready at {}", db_path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn scoped(&self, suite: &str) -> Arc<dyn Preferences> {
        Arc::new(SqlitePreferences {
            conn: self.conn.clone(),
            suite: suite.to_string(),
        })
    }
}

impl PreferenceProvider for SqlitePreferenceProvider {
    fn standard(&self) -> Arc<dyn Preferences> {
        self.scoped(STANDARD_SUITE)
    }

    fn suite(&self, name: &str) -> Result<Option<Arc<dyn Preferences>>> {
        if !is_valid_suite_name(name) {
            return Ok(None);
        }
        Ok(Some(self.scoped(name)))
    }
}
