use std::{fs, path::Path, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::NotificationSettings;
use crate::platform::{BundleInfo, DeviceIdiom, ScreenMetrics};
use crate::preferences::{
    FilePreferenceProvider, MemoryPreferenceProvider, PreferenceProvider, SqlitePreferenceProvider,
};

const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Values the host platform cannot discover on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceOverrides {
    pub display_name: Option<String>,
    pub model_name: Option<String>,
    pub model_identifier: Option<String>,
    pub idiom: DeviceIdiom,
    pub vendor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    #[default]
    Memory,
    File {
        dir: PathBuf,
    },
    Sqlite {
        path: PathBuf,
    },
}

impl StoreConfig {
    pub fn open_provider(&self) -> Result<Arc<dyn PreferenceProvider>> {
        let provider: Arc<dyn PreferenceProvider> = match self {
            StoreConfig::Memory => Arc::new(MemoryPreferenceProvider::new()),
            StoreConfig::File { dir } => Arc::new(FilePreferenceProvider::open(dir.clone())?),
            StoreConfig::Sqlite { path } => Arc::new(SqlitePreferenceProvider::open(path.clone())?),
        };
        Ok(provider)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LaunchCountConfig {
    /// App group shared with extensions; the standard store is used when unset.
    pub shared_container: Option<String>,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceInfoConfig {
    pub bundle: BundleInfo,
    /// Directory holding bundle resources such as the provisioning profile.
    pub bundle_dir: Option<PathBuf>,
    pub device: DeviceOverrides,
    pub screen: ScreenMetrics,
    pub timezone: Option<String>,
    pub notifications: NotificationSettings,
    pub launch_count: LaunchCountConfig,
}

impl DeviceInfoConfig {
    /// Read the JSON config at `path`. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log_info!("No config at {}; using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }
}
