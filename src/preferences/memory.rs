use std::{
    collections::HashMap,
    sync::{Arc, Mutex, RwLock},
};

use anyhow::{anyhow, Result};
use serde_json::Value;

use super::{is_valid_suite_name, PreferenceProvider, Preferences};

/// Process-local store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Preferences for MemoryPreferences {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let guard = self
            .values
            .read()
            .map_err(|_| anyhow!("memory preferences lock poisoned"))?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut guard = self
            .values
            .write()
            .map_err(|_| anyhow!("memory preferences lock poisoned"))?;
        guard.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut guard = self
            .values
            .write()
            .map_err(|_| anyhow!("memory preferences lock poisoned"))?;
        guard.remove(key);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryPreferenceProvider {
    standard: Arc<MemoryPreferences>,
    suites: Mutex<HashMap<String, Arc<MemoryPreferences>>>,
}

impl MemoryPreferenceProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceProvider for MemoryPreferenceProvider {
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
            .map_err(|_| anyhow!("memory suite registry lock poisoned"))?;
        let suite: Arc<dyn Preferences> = suites
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryPreferences::new()))
            .clone();
        Ok(Some(suite))
    }
}
