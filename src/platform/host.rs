use std::{
    env, fs,
    path::{Path, PathBuf},
};

use sysinfo::System;
use uuid::Uuid;

use super::{BundleInfo, DeviceIdiom, PlatformAccessor, ScreenMetrics, UNKNOWN};
use crate::config::DeviceInfoConfig;
use crate::provisioning::PROFILE_FILE_NAME;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Platform accessor for the machine the library runs on.
///
/// OS and host details come from `sysinfo`, language and timezone from the
/// POSIX environment. Anything a desktop cannot report (bundle metadata,
/// screen geometry, vendor id) comes from configuration.
#[derive(Debug, Clone)]
pub struct HostPlatform {
    os_name: String,
    os_version: String,
    bundle: BundleInfo,
    bundle_dir: Option<PathBuf>,
    display_name: String,
    model_name: String,
    model_identifier: String,
    idiom: DeviceIdiom,
    vendor_id: Option<Uuid>,
    languages: Vec<String>,
    locale: String,
    timezone: String,
    screen: ScreenMetrics,
}

impl HostPlatform {
    pub fn new(config: &DeviceInfoConfig) -> Self {
        let lookup = |name: &str| env::var(name).ok();
        let device = &config.device;

        let platform = Self {
            os_name: System::name().unwrap_or_else(|| UNKNOWN.to_string()),
            os_version: System::os_version().unwrap_or_else(|| UNKNOWN.to_string()),
            bundle: config.bundle.clone(),
            bundle_dir: config.bundle_dir.clone(),
            display_name: device
                .display_name
                .clone()
                .or_else(System::host_name)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            model_name: device
                .model_name
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            model_identifier: device
                .model_identifier
                .clone()
                .or_else(System::cpu_arch)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            idiom: device.idiom,
            vendor_id: device.vendor_id,
            languages: languages_from_env(lookup),
            locale: locale_from_env(lookup).unwrap_or_else(|| UNKNOWN.to_string()),
            timezone: config
                .timezone
                .clone()
                .or_else(|| timezone_from_env(lookup))
                .or_else(|| timezone_from_localtime(Path::new("/etc/localtime")))
                .unwrap_or_else(|| UNKNOWN.to_string()),
            screen: config.screen,
        };

        log_info!(
            "Host platform: {} {} ({}), timezone {}",
            platform.os_name,
            platform.os_version,
            platform.model_identifier,
            platform.timezone
        );
        platform
    }
}

impl PlatformAccessor for HostPlatform {
    fn os_name(&self) -> String {
        self.os_name.clone()
    }

    fn os_version(&self) -> String {
        self.os_version.clone()
    }

    fn bundle(&self) -> &BundleInfo {
        &self.bundle
    }

    fn device_display_name(&self) -> String {
        self.display_name.clone()
    }

    fn device_model_name(&self) -> String {
        self.model_name.clone()
    }

    fn device_idiom(&self) -> DeviceIdiom {
        self.idiom
    }

    fn device_model_identifier(&self) -> String {
        self.model_identifier.clone()
    }

    fn identifier_for_vendor(&self) -> Option<Uuid> {
        self.vendor_id
    }

    fn preferred_languages(&self) -> Vec<String> {
        self.languages.clone()
    }

    fn locale_identifier(&self) -> String {
        self.locale.clone()
    }

    fn timezone_identifier(&self) -> String {
        self.timezone.clone()
    }

    fn screen(&self) -> ScreenMetrics {
        self.screen
    }

    fn embedded_provisioning_profile(&self) -> Option<Vec<u8>> {
        let path = self.bundle_dir.as_ref()?.join(PROFILE_FILE_NAME);
        if !path.exists() {
            return None;
        }

        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                // Present but unreadable scans as "unknown", not "simulator".
                log_warn!("Failed to read {}: {}", path.display(), err);
                Some(Vec::new())
            }
        }
    }
}

/// `en_US.UTF-8@euro` -> `en_US`; `C` and `POSIX` carry no locale.
fn normalize_posix_locale(raw: &str) -> Option<String> {
    let base = raw.split(['.', '@']).next()?.trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.to_string())
}

fn locale_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|name| lookup(*name))
        .find_map(|value| normalize_posix_locale(&value))
}

/// Preferred languages as BCP 47 tags, e.g. `["nb-NO", "en-US"]`.
fn languages_from_env(lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
    let mut languages: Vec<String> = lookup("LANGUAGE")
        .map(|list| {
            list.split(':')
                .filter_map(normalize_posix_locale)
                .map(|tag| tag.replace('_', "-"))
                .collect()
        })
        .unwrap_or_default();

    if languages.is_empty() {
        languages.extend(locale_from_env(&lookup).map(|tag| tag.replace('_', "-")));
    }
    languages
}

fn timezone_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    let tz = lookup("TZ")?;
    let tz = tz.trim_start_matches(':').trim();
    if tz.is_empty() {
        None
    } else {
        Some(tz.to_string())
    }
}

/// Zone name from a `/etc/localtime -> .../zoneinfo/Europe/Oslo` symlink.
fn timezone_from_localtime(link: &Path) -> Option<String> {
    let target = fs::read_link(link).ok()?;
    let target = target.to_str()?;
    let (_, zone) = target.split_once("zoneinfo/")?;
    Some(zone.to_string())
}
