//! Per-app-version launch counting.
//!
//! Counts live in one preference entry, `"versions"`, holding an object that
//! maps version strings to launch counts:
//! ```json
//! { "versions": { "1.0.0": 12, "1.0.1": 3 } }
//! ```
//! Increments are a plain read-modify-write. Two processes sharing a
//! container (an app and its extension) can lose each other's updates.

use std::{collections::BTreeMap, sync::Arc};

use anyhow::{Context, Result};

use crate::platform::PlatformAccessor;
use crate::preferences::{PreferenceProvider, Preferences};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

pub const VERSIONS_KEY: &str = "versions";

pub struct LaunchCounter {
    store: Arc<dyn Preferences>,
    platform: Arc<dyn PlatformAccessor>,
    shared_container: Option<String>,
}

impl LaunchCounter {
    /// Counter backed by `shared_container` when it names an available suite,
    /// otherwise by the provider's standard store.
    ///
    /// A container is unavailable when the provider rejects the name, fails
    /// to open it, or the name is the app's own bundle identifier.
    pub fn new(
        provider: &dyn PreferenceProvider,
        platform: Arc<dyn PlatformAccessor>,
        shared_container: Option<&str>,
    ) -> Self {
        let Some(name) = shared_container else {
            return Self::with_store(provider.standard(), platform);
        };

        let suite = if name == platform.app_identifier() {
            log_warn!("Shared container '{name}' is the app's own domain; using standard store");
            None
        } else {
            match provider.suite(name) {
                Ok(Some(store)) => Some(store),
                Ok(None) => {
                    log_warn!("Shared container '{name}' unavailable; using standard store");
                    None
                }
                Err(err) => {
                    log_warn!("Failed to open shared container '{name}': {err:#}; using standard store");
                    None
                }
            }
        };

        match suite {
            Some(store) => Self {
                store,
                platform,
                shared_container: Some(name.to_string()),
            },
            None => Self::with_store(provider.standard(), platform),
        }
    }

    pub fn with_store(store: Arc<dyn Preferences>, platform: Arc<dyn PlatformAccessor>) -> Self {
        Self {
            store,
            platform,
            shared_container: None,
        }
    }

    /// The container actually in use, `None` for the standard store.
    pub fn shared_container(&self) -> Option<&str> {
        self.shared_container.as_deref()
    }

    /// Launches recorded for the running app version, e.g. "1.0.1".
    pub fn current_version_count(&self) -> Result<u64> {
        let version = self.platform.app_version();
        Ok(self
            .load_counts()?
            .and_then(|counts| counts.get(&version).copied())
            .unwrap_or(0))
    }

    /// Launches recorded across every version.
    pub fn total_count(&self) -> Result<u64> {
        Ok(self
            .load_counts()?
            .map(|counts| counts.values().fold(0u64, |sum, n| sum.saturating_add(*n)))
            .unwrap_or(0))
    }

    pub fn version_counts(&self) -> Result<BTreeMap<String, u64>> {
        Ok(self.load_counts()?.unwrap_or_default())
    }

    /// Record one launch of the running version and return its new count.
    pub fn increment_current_version(&self) -> Result<u64> {
        let version = self.platform.app_version();
        let mut counts = self.load_counts()?.unwrap_or_default();

        let count = counts.entry(version.clone()).or_insert(0);
        *count = count.saturating_add(1);
        let updated = *count;

        let value = serde_json::to_value(&counts)?;
        self.store
            .set(VERSIONS_KEY, value)
            .with_context(|| format!("failed to store launch count for version {version}"))?;

        log_debug!("Launch {updated} recorded for version {version}");
        Ok(updated)
    }

    /// `None` when nothing is stored or the stored value is not a
    /// version -> count object.
    fn load_counts(&self) -> Result<Option<BTreeMap<String, u64>>> {
        let Some(value) = self
            .store
            .get(VERSIONS_KEY)
            .context("failed to read launch counts")?
        else {
            return Ok(None);
        };

        match serde_json::from_value(value) {
            Ok(counts) => Ok(Some(counts)),
            Err(err) => {
                log_warn!("Ignoring malformed launch counts: {err}");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::FakePlatform;
    use crate::preferences::{
        FilePreferenceProvider, MemoryPreferenceProvider, MemoryPreferences, SqlitePreferenceProvider,
    };
    use serde_json::json;

    fn counter(store: &Arc<MemoryPreferences>, version: &str) -> LaunchCounter {
        LaunchCounter::with_store(store.clone(), Arc::new(FakePlatform::with_version(version)))
    }

    #[test]
    fn empty_store_counts_zero() {
        let store = Arc::new(MemoryPreferences::new());
        let counter = counter(&store, "1.0.0");

        assert_eq!(counter.current_version_count().unwrap(), 0);
        assert_eq!(counter.total_count().unwrap(), 0);
        assert!(counter.version_counts().unwrap().is_empty());
    }

    #[test]
    fn n_increments_give_n() {
        let store = Arc::new(MemoryPreferences::new());
        let counter = counter(&store, "1.4.2");

        for expected in 1..=7 {
            assert_eq!(counter.increment_current_version().unwrap(), expected);
        }
        assert_eq!(counter.current_version_count().unwrap(), 7);
        assert_eq!(counter.total_count().unwrap(), 7);
    }

    #[test]
    fn versions_are_counted_separately() {
        let store = Arc::new(MemoryPreferences::new());
        let first = counter(&store, "2.0.0");
        first.increment_current_version().unwrap();
        assert_eq!(first.current_version_count().unwrap(), 1);
        assert_eq!(first.total_count().unwrap(), 1);

        let second = counter(&store, "2.0.1");
        second.increment_current_version().unwrap();
        assert_eq!(second.total_count().unwrap(), 2);
        assert_eq!(first.current_version_count().unwrap(), 1);
        assert_eq!(second.current_version_count().unwrap(), 1);
    }

    #[test]
    fn total_is_sum_of_versions() {
        let store = Arc::new(MemoryPreferences::new());
        for (version, launches) in [("1.0", 3), ("1.1", 5), ("2.0", 1)] {
            let counter = counter(&store, version);
            for _ in 0..launches {
                counter.increment_current_version().unwrap();
            }
        }

        let counter = counter(&store, "2.0");
        let counts = counter.version_counts().unwrap();
        assert_eq!(counts.values().sum::<u64>(), 9);
        assert_eq!(counter.total_count().unwrap(), 9);
        assert_eq!(store.get(VERSIONS_KEY).unwrap(), Some(json!({"1.0": 3, "1.1": 5, "2.0": 1})));
    }

    #[test]
    fn malformed_entry_reads_as_absent_and_is_replaced() {
        let store = Arc::new(MemoryPreferences::new());
        store.set(VERSIONS_KEY, json!(["not", "a", "map"])).unwrap();
        let counter = counter(&store, "1.0.0");

        assert_eq!(counter.current_version_count().unwrap(), 0);
        assert_eq!(counter.total_count().unwrap(), 0);
        assert_eq!(counter.increment_current_version().unwrap(), 1);
        assert_eq!(store.get(VERSIONS_KEY).unwrap(), Some(json!({"1.0.0": 1})));
    }

    #[test]
    fn negative_counts_are_malformed() {
        let store = Arc::new(MemoryPreferences::new());
        store.set(VERSIONS_KEY, json!({"1.0.0": -4})).unwrap();
        assert_eq!(counter(&store, "1.0.0").current_version_count().unwrap(), 0);
    }

    #[test]
    fn uses_shared_container_when_available() {
        let provider = MemoryPreferenceProvider::new();
        let platform: Arc<dyn PlatformAccessor> = Arc::new(FakePlatform::with_version("3.0"));

        let app = LaunchCounter::new(&provider, platform.clone(), Some("group.com.example"));
        assert_eq!(app.shared_container(), Some("group.com.example"));
        app.increment_current_version().unwrap();

        let extension =
            LaunchCounter::new(&provider, platform.clone(), Some("group.com.example"));
        assert_eq!(extension.current_version_count().unwrap(), 1);

        let standard = LaunchCounter::new(&provider, platform, None);
        assert_eq!(standard.shared_container(), None);
        assert_eq!(standard.total_count().unwrap(), 0);
    }

    #[test]
    fn unavailable_container_falls_back_to_standard() {
        let provider = MemoryPreferenceProvider::new();
        let platform: Arc<dyn PlatformAccessor> = Arc::new(FakePlatform::with_version("3.0"));

        let counter = LaunchCounter::new(&provider, platform.clone(), Some(""));
        assert_eq!(counter.shared_container(), None);
        counter.increment_current_version().unwrap();

        let standard = LaunchCounter::new(&provider, platform, None);
        assert_eq!(standard.current_version_count().unwrap(), 1);
    }

    #[test]
    fn persists_through_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.sqlite3");
        let platform: Arc<dyn PlatformAccessor> = Arc::new(FakePlatform::with_version("5.2.1"));

        {
            let provider = SqlitePreferenceProvider::open(path.clone()).unwrap();
            let counter =
                LaunchCounter::new(&provider, platform.clone(), Some("group.com.example"));
            counter.increment_current_version().unwrap();
            counter.increment_current_version().unwrap();
        }

        let provider = SqlitePreferenceProvider::open(path).unwrap();
        let counter = LaunchCounter::new(&provider, platform, Some("group.com.example"));
        assert_eq!(counter.current_version_count().unwrap(), 2);
    }

    #[test]
    fn unreadable_container_falls_back_to_standard() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("group.x.json")).unwrap();
        let provider = FilePreferenceProvider::open(dir.path().to_path_buf()).unwrap();
        let platform: Arc<dyn PlatformAccessor> = Arc::new(FakePlatform::with_version("4.0"));

        let counter = LaunchCounter::new(&provider, platform.clone(), Some("group.x"));
        assert_eq!(counter.shared_container(), None);
        assert_eq!(counter.increment_current_version().unwrap(), 1);

        let standard = LaunchCounter::new(&provider, platform, None);
        assert_eq!(standard.current_version_count().unwrap(), 1);
        assert!(dir.path().join("standard.json").is_file());
    }

    #[test]
    fn bundle_identifier_is_not_a_container() {
        let provider = MemoryPreferenceProvider::new();
        let platform: Arc<dyn PlatformAccessor> = Arc::new(FakePlatform::with_version("4.0"));
        let own_domain = platform.app_identifier();

        let counter = LaunchCounter::new(&provider, platform.clone(), Some(own_domain.as_str()));
        assert_eq!(counter.shared_container(), None);
        counter.increment_current_version().unwrap();

        let standard = LaunchCounter::new(&provider, platform.clone(), None);
        assert_eq!(standard.current_version_count().unwrap(), 1);

        let suite = provider.suite(&own_domain).unwrap().unwrap();
        assert_eq!(suite.get(VERSIONS_KEY).unwrap(), None);
    }
}
