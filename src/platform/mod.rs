//! Read-only access to device, bundle and environment attributes.
//!
//! Implementors only forward raw platform values; the provided methods apply
//! the fallbacks the payload relies on.

mod host;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::provisioning;

pub use host::HostPlatform;

pub const UNKNOWN: &str = "Unknown";
pub const UNNAMED_APP: &str = "Unnamed App";

/// Bundle metadata of the running app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BundleInfo {
    /// e.g. "com.example.app"
    pub identifier: String,
    /// e.g. "Lister"
    pub name: Option<String>,
    /// e.g. "1.0.1"
    pub short_version: Option<String>,
    /// e.g. "142" or "1.0.1.142"
    pub build: Option<String>,
    /// Localizations the bundle ships, best match first.
    pub preferred_localizations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceIdiom {
    #[default]
    Unspecified,
    Phone,
    Pad,
    Tv,
    CarPlay,
}

impl DeviceIdiom {
    pub fn display_name(&self) -> &'static str {
        match self {
            DeviceIdiom::Unspecified => "Unspecified",
            DeviceIdiom::Phone => "iPhone",
            DeviceIdiom::Pad => "iPad",
            DeviceIdiom::Tv => "Apple TV",
            DeviceIdiom::CarPlay => "CarPlay",
        }
    }
}

/// Main screen geometry in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenMetrics {
    /// Pixels per point, e.g. 3.0
    pub scale: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for ScreenMetrics {
    fn default() -> Self {
        Self {
            scale: 1.0,
            width: 0.0,
            height: 0.0,
        }
    }
}

pub trait PlatformAccessor: Send + Sync {
    /// e.g. "iPhone OS"
    fn os_name(&self) -> String;
    /// e.g. "9.3"
    fn os_version(&self) -> String;
    fn bundle(&self) -> &BundleInfo;
    /// User-facing name of the device, e.g. "John's iPhone"
    fn device_display_name(&self) -> String;
    /// Marketing name of the model, e.g. "iPhone 6S Plus"
    fn device_model_name(&self) -> String;
    fn device_idiom(&self) -> DeviceIdiom;
    /// e.g. "iPhone8,2"
    fn device_model_identifier(&self) -> String;
    /// Identifier shared by all apps of one vendor on this device.
    fn identifier_for_vendor(&self) -> Option<Uuid>;
    /// e.g. ["en-US", "nb-NO"]
    fn preferred_languages(&self) -> Vec<String>;
    /// e.g. "en_US"
    fn locale_identifier(&self) -> String;
    /// e.g. "America/Denver"
    fn timezone_identifier(&self) -> String;
    fn screen(&self) -> ScreenMetrics;
    /// Raw bytes of the bundled provisioning profile, `None` when absent.
    fn embedded_provisioning_profile(&self) -> Option<Vec<u8>>;

    fn app_build_number(&self) -> String {
        self.bundle()
            .build
            .clone()
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    fn app_identifier(&self) -> String {
        self.bundle().identifier.clone()
    }

    fn app_name(&self) -> String {
        self.bundle()
            .name
            .clone()
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    fn app_version(&self) -> String {
        self.bundle()
            .short_version
            .clone()
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    /// e.g. "Lister 1.0.1.142"
    fn app_name_with_version(&self) -> String {
        match &self.bundle().name {
            Some(name) => format!("{} {}", name, self.app_build_number()),
            None => UNNAMED_APP.to_string(),
        }
    }

    /// "development", "production", "simulator" or "unknown".
    fn aps_environment(&self) -> String {
        provisioning::aps_environment(self.embedded_provisioning_profile().as_deref())
    }

    fn device_type(&self) -> String {
        self.device_idiom().display_name().to_string()
    }

    fn device_version(&self) -> String {
        self.device_model_identifier()
    }

    fn device_identifier(&self) -> String {
        match self.identifier_for_vendor() {
            Some(id) => id.hyphenated().to_string().to_uppercase(),
            None => UNKNOWN.to_string(),
        }
    }

    /// First preferred language of the user, e.g. "en-US"
    fn language(&self) -> String {
        self.preferred_languages()
            .into_iter()
            .next()
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    fn locale(&self) -> String {
        self.locale_identifier()
    }

    /// Localization the app is running in, e.g. "en"
    fn translation(&self) -> String {
        self.bundle()
            .preferred_localizations
            .first()
            .cloned()
            .unwrap_or_default()
    }

    fn screen_density(&self) -> f64 {
        self.screen().scale
    }

    fn screen_height(&self) -> f64 {
        self.screen().height
    }

    fn screen_width(&self) -> f64 {
        self.screen().width
    }

    fn timezone(&self) -> String {
        self.timezone_identifier()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Fixed-value platform for tests.
    #[derive(Debug, Clone)]
    pub struct FakePlatform {
        pub bundle: BundleInfo,
        pub idiom: DeviceIdiom,
        pub vendor_id: Option<Uuid>,
        pub languages: Vec<String>,
        pub profile: Option<Vec<u8>>,
    }

    impl Default for FakePlatform {
        fn default() -> Self {
            Self {
                bundle: BundleInfo {
                    identifier: "com.example.lister".into(),
                    name: Some("Lister".into()),
                    short_version: Some("1.0.1".into()),
                    build: Some("142".into()),
                    preferred_localizations: vec!["en".into()],
                },
                idiom: DeviceIdiom::Phone,
                vendor_id: Some(
                    Uuid::parse_str("6b3f1a52-9c1e-4a8e-b0d2-1f0c3e5a7d91").unwrap(),
                ),
                languages: vec!["en-US".into(), "nb-NO".into()],
                profile: None,
            }
        }
    }

    impl FakePlatform {
        pub fn with_version(version: &str) -> Self {
            let mut platform = Self::default();
            platform.bundle.short_version = Some(version.to_string());
            platform
        }
    }

    impl PlatformAccessor for FakePlatform {
        fn os_name(&self) -> String {
            "iOS".into()
        }

        fn os_version(&self) -> String {
            "17.4".into()
        }

        fn bundle(&self) -> &BundleInfo {
            &self.bundle
        }

        fn device_display_name(&self) -> String {
            "Kari's iPhone".into()
        }

        fn device_model_name(&self) -> String {
            "iPhone 6S Plus".into()
        }

        fn device_idiom(&self) -> DeviceIdiom {
            self.idiom
        }

        fn device_model_identifier(&self) -> String {
            "iPhone8,2".into()
        }

        fn identifier_for_vendor(&self) -> Option<Uuid> {
            self.vendor_id
        }

        fn preferred_languages(&self) -> Vec<String> {
            self.languages.clone()
        }

        fn locale_identifier(&self) -> String {
            "en_US".into()
        }

        fn timezone_identifier(&self) -> String {
            "America/Denver".into()
        }

        fn screen(&self) -> ScreenMetrics {
            ScreenMetrics {
                scale: 3.0,
                width: 414.0,
                height: 736.0,
            }
        }

        fn embedded_provisioning_profile(&self) -> Option<Vec<u8>> {
            self.profile.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakePlatform;
    use super::*;

    #[test]
    fn bundle_attributes_pass_through() {
        let platform = FakePlatform::default();
        assert_eq!(platform.app_name(), "Lister");
        assert_eq!(platform.app_version(), "1.0.1");
        assert_eq!(platform.app_build_number(), "142");
        assert_eq!(platform.app_identifier(), "com.example.lister");
        assert_eq!(platform.app_name_with_version(), "Lister 142");
        assert_eq!(platform.translation(), "en");
    }

    #[test]
    fn missing_bundle_values_fall_back() {
        let mut platform = FakePlatform::default();
        platform.bundle = BundleInfo {
            identifier: "com.example.bare".into(),
            ..BundleInfo::default()
        };

        assert_eq!(platform.app_name(), "Unknown");
        assert_eq!(platform.app_version(), "Unknown");
        assert_eq!(platform.app_build_number(), "Unknown");
        assert_eq!(platform.app_name_with_version(), "Unnamed App");
        assert_eq!(platform.translation(), "");
    }

    #[test]
    fn name_with_version_uses_unknown_build() {
        let mut platform = FakePlatform::default();
        platform.bundle.build = None;
        assert_eq!(platform.app_name_with_version(), "Lister Unknown");
    }

    #[test]
    fn device_attributes() {
        let mut platform = FakePlatform::default();
        assert_eq!(platform.device_type(), "iPhone");
        assert_eq!(platform.device_version(), "iPhone8,2");
        assert_eq!(
            platform.device_identifier(),
            "6B3F1A52-9C1E-4A8E-B0D2-1F0C3E5A7D91"
        );
        assert_eq!(platform.language(), "en-US");

        platform.idiom = DeviceIdiom::Tv;
        platform.vendor_id = None;
        platform.languages.clear();
        assert_eq!(platform.device_type(), "Apple TV");
        assert_eq!(platform.device_identifier(), "Unknown");
        assert_eq!(platform.language(), "Unknown");
    }

    #[test]
    fn aps_environment_is_simulator_without_profile() {
        let platform = FakePlatform::default();
        assert_eq!(platform.aps_environment(), "simulator");
    }

    #[test]
    fn aps_environment_reads_profile() {
        let mut platform = FakePlatform::default();
        platform.profile =
            Some(b"<key>aps-environment</key>\n\t\t<string>production</string>".to_vec());
        assert_eq!(platform.aps_environment(), "production");

        platform.profile = Some(b"garbage".to_vec());
        assert_eq!(platform.aps_environment(), "unknown");
    }
}
