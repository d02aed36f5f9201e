use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, RwLock},
};

use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Value};

use super::{is_valid_suite_name, PreferenceProvider, Preferences};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

const STANDARD_FILE: &str = "standard.json";

/// Preferences kept in a single pretty-printed JSON object on disk.
///
/// The file is read once on open and rewritten in full on every change.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    data: RwLock<Map<String, Value>>,
}

impl FilePreferences {
    pub fn open(path: PathBuf) -> Result<Self> {
        let data = read_map(&path)?;
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pick up changes another process wrote to the same file.
    pub fn reload(&self) -> Result<()> {
        let fresh = read_map(&self.path)?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("preferences lock poisoned"))?;
        *guard = fresh;
        Ok(())
    }

    fn persist(&self, data: &Map<String, Value>) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write preferences to {}", self.path.display()))
    }
}

fn read_map(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read preferences from {}", path.display()))?;
    match serde_json::from_str(&contents) {
        Ok(map) => Ok(map),
        Err(err) => {
            log_warn!(
                "Ignoring unreadable preferences at {}: {}",
                path.display(),
                err
            );
            Ok(Map::new())
        }
    }
}

impl Preferences for FilePreferences {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let guard = self
            .data
            .read()
            .map_err(|_| anyhow!("preferences lock poisoned"))?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("preferences lock poisoned"))?;
        guard.insert(key.to_string(), value);
        self.persist(&guard)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("preferences lock poisoned"))?;
        if guard.remove(key).is_some() {
            self.persist(&guard)?;
        }
        Ok(())
    }
}

/// One JSON file per suite inside `dir`.
#[derive(Debug)]
pub struct FilePreferenceProvider {
    dir: PathBuf,
    standard: Arc<FilePreferences>,
    suites: Mutex<HashMap<String, Arc<FilePreferences>>>,
}

impl FilePreferenceProvider {
    pub fn open(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create preferences directory {}", dir.display()))?;
        let standard = Arc::new(FilePreferences::open(dir.join(STANDARD_FILE))?);

        Ok(Self {
            dir,
            standard,
            suites: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PreferenceProvider for FilePreferenceProvider {
    fn standard(&self) -> Arc<dyn Preferences> {
        self.standard.clone()
    }

    fn suite(&self, name: &str) -> Result<Option<Arc<dyn Preferences>>> {
        if !is_valid_suite_name(name) {
            return Ok(None);
        }

        let mut suites = self
            .suites
            .lock()
            .map_err(|_| anyhow!("suite registry lock poisoned"))?;
        if let Some(existing) = suites.get(name) {
            let existing: Arc<dyn Preferences> = existing.clone();
            return Ok(Some(existing));
        }

        let path = self.dir.join(format!("{name}.json"));
        let opened = Arc::new(FilePreferences::open(path)?);
        suites.insert(name.to_string(), opened.clone());
        let opened: Arc<dyn Preferences> = opened;
        Ok(Some(opened))
    }
}
