pub mod config;
pub mod device_info;
pub mod ffi;
pub mod launch_count;
pub mod models;
pub mod notifications;
pub mod platform;
pub mod preferences;
pub mod provisioning;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};

pub use config::DeviceInfoConfig;
pub use device_info::{build_info_dictionary, formatted_token, DeviceInfoService, InfoRequest};
pub use launch_count::LaunchCounter;
pub use models::{InfoMap, InfoValue, NotificationSettings};
pub use notifications::{ConfiguredNotificationCenter, NotificationCenter};
pub use platform::{HostPlatform, PlatformAccessor};
pub use preferences::{PreferenceProvider, Preferences};
pub use utils::init_logging;

/// The device info service and launch counter wired to the host platform.
pub struct DeviceInfoKit {
    pub device_info: DeviceInfoService,
    pub launch_counter: LaunchCounter,
}

impl DeviceInfoKit {
    pub fn from_config(config: &DeviceInfoConfig) -> Result<Self> {
        let platform: Arc<dyn PlatformAccessor> = Arc::new(HostPlatform::new(config));
        let notifications: Arc<dyn NotificationCenter> = Arc::new(
            ConfiguredNotificationCenter::new(config.notifications.clone()),
        );

        let provider = config
            .launch_count
            .store
            .open_provider()
            .context("failed to open launch count store")?;
        let launch_counter = LaunchCounter::new(
            provider.as_ref(),
            platform.clone(),
            config.launch_count.shared_container.as_deref(),
        );

        Ok(Self {
            device_info: DeviceInfoService::new(platform, notifications),
            launch_counter,
        })
    }
}
