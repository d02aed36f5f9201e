//! Notification authorization and per-channel settings as reported by the
//! platform notification service.

use serde::{Deserialize, Serialize};

use super::info::{info_map, InfoMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationSetting {
    #[default]
    NotSupported,
    Disabled,
    Enabled,
}

impl NotificationSetting {
    pub fn as_key(&self) -> &'static str {
        match self {
            NotificationSetting::NotSupported => "notSupported",
            NotificationSetting::Disabled => "disabled",
            NotificationSetting::Enabled => "enabled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthorizationStatus {
    #[default]
    NotDetermined,
    Denied,
    Authorized,
}

impl AuthorizationStatus {
    pub fn as_key(&self) -> &'static str {
        match self {
            AuthorizationStatus::NotDetermined => "notDetermined",
            AuthorizationStatus::Denied => "denied",
            AuthorizationStatus::Authorized => "authorized",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertStyle {
    #[default]
    None,
    Banner,
    Alert,
}

impl AlertStyle {
    pub fn as_key(&self) -> &'static str {
        match self {
            AlertStyle::None => "none",
            AlertStyle::Banner => "banner",
            AlertStyle::Alert => "alert",
        }
    }
}

/// Snapshot of the user's notification preferences for this app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationSettings {
    pub authorization_status: AuthorizationStatus,
    pub notification_center_setting: NotificationSetting,
    pub lock_screen_setting: NotificationSetting,
    pub car_play_setting: NotificationSetting,
    pub alert_setting: NotificationSetting,
    pub alert_style: AlertStyle,
    pub badge_setting: NotificationSetting,
    pub sound_setting: NotificationSetting,
}

impl NotificationSettings {
    /// The eight-key `notification_settings` object of the device payload.
    pub fn to_info_map(&self) -> InfoMap {
        info_map([
            ("authorization", self.authorization_status.as_key().into()),
            (
                "notificationCenter",
                self.notification_center_setting.as_key().into(),
            ),
            ("lockScreen", self.lock_screen_setting.as_key().into()),
            ("carPlay", self.car_play_setting.as_key().into()),
            ("alert", self.alert_setting.as_key().into()),
            ("alertStyle", self.alert_style.as_key().into()),
            ("badge", self.badge_setting.as_key().into()),
            ("sound", self.sound_setting.as_key().into()),
        ])
    }
}
