//! Assembly of the device info payload sent alongside push registrations.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::models::{info_map, InfoMap, InfoValue};
use crate::notifications::NotificationCenter;
use crate::platform::PlatformAccessor;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Optional inputs to the payload and how to render them when missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InfoRequest {
    /// Usually the output of [`formatted_token`].
    pub token: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Emit `null` for missing optional values instead of leaving them out.
    pub null_for_missing: bool,
}

impl InfoRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn null_for_missing(mut self, enabled: bool) -> Self {
        self.null_for_missing = enabled;
        self
    }
}

/// Uppercase hex rendering of the device token handed out by push
/// registration, two digits per byte and no separators.
pub fn formatted_token(device_token: &[u8]) -> String {
    hex::encode_upper(device_token)
}

/// Device info payload built from live platform reads.
///
/// Top-level keys: `name`, `location`, `locale`, `hardware`, `OS`, `app`
/// and `screen_metrics`.
pub fn build_info_dictionary(platform: &dyn PlatformAccessor, request: &InfoRequest) -> InfoMap {
    let mut location = info_map([("timezone", platform.timezone().into())]);
    insert_optional(
        &mut location,
        "lat",
        request.latitude.map(InfoValue::from),
        request.null_for_missing,
    );
    insert_optional(
        &mut location,
        "lng",
        request.longitude.map(InfoValue::from),
        request.null_for_missing,
    );

    let locale = info_map([
        ("translation", platform.translation().into()),
        ("language", platform.language().into()),
        ("identifier", platform.locale().into()),
    ]);

    let hardware = info_map([
        ("name", platform.device_model_name().into()),
        ("version", platform.device_version().into()),
        ("type", platform.device_type().into()),
        ("identifier", platform.device_identifier().into()),
    ]);

    let os = info_map([
        ("name", platform.os_name().into()),
        ("version", platform.os_version().into()),
    ]);

    let mut app = info_map([
        ("name", platform.app_name().into()),
        ("version", platform.app_version().into()),
        ("build", platform.app_build_number().into()),
        ("identifier", platform.app_identifier().into()),
        ("apsEnvironment", platform.aps_environment().into()),
    ]);
    insert_optional(
        &mut app,
        "token",
        request.token.clone().map(InfoValue::from),
        request.null_for_missing,
    );

    let screen_metrics = info_map([
        ("density", platform.screen_density().into()),
        ("h", platform.screen_height().into()),
        ("w", platform.screen_width().into()),
    ]);

    info_map([
        ("name", platform.device_display_name().into()),
        ("location", location.into()),
        ("locale", locale.into()),
        ("hardware", hardware.into()),
        ("OS", os.into()),
        ("app", app.into()),
        ("screen_metrics", screen_metrics.into()),
    ])
}

fn insert_optional(map: &mut InfoMap, key: &str, value: Option<InfoValue>, null_for_missing: bool) {
    match value {
        Some(value) => {
            map.insert(key.to_string(), value);
        }
        None if null_for_missing => {
            map.insert(key.to_string(), InfoValue::Null);
        }
        None => {}
    }
}

#[derive(Clone)]
pub struct DeviceInfoService {
    platform: Arc<dyn PlatformAccessor>,
    notifications: Arc<dyn NotificationCenter>,
}

impl DeviceInfoService {
    pub fn new(
        platform: Arc<dyn PlatformAccessor>,
        notifications: Arc<dyn NotificationCenter>,
    ) -> Self {
        Self {
            platform,
            notifications,
        }
    }

    pub fn platform(&self) -> &Arc<dyn PlatformAccessor> {
        &self.platform
    }

    pub fn info_dictionary(&self, request: &InfoRequest) -> InfoMap {
        build_info_dictionary(self.platform.as_ref(), request)
    }

    /// Payload plus a `notification_settings` object, handed to `completion`
    /// once the notification center answers. The completion runs on the
    /// notification center's thread, not necessarily the caller's.
    pub fn info_with_notification_settings<F>(&self, request: &InfoRequest, completion: F)
    where
        F: FnOnce(InfoMap) + Send + 'static,
    {
        let platform = self.platform.clone();
        let request = request.clone();

        self.notifications
            .get_notification_settings(Box::new(move |settings| {
                let mut info = build_info_dictionary(platform.as_ref(), &request);
                info.insert(
                    "notification_settings".to_string(),
                    settings.to_info_map().into(),
                );
                completion(info);
            }));
    }

    /// Awaitable form of [`Self::info_with_notification_settings`].
    pub async fn info_with_notification_settings_async(
        &self,
        request: &InfoRequest,
    ) -> Result<InfoMap> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.info_with_notification_settings(request, move |info| {
            if reply_tx.send(info).is_err() {
                log_warn!("Device info caller dropped before receiving notification settings");
            }
        });

        reply_rx
            .await
            .map_err(|_| anyhow!("notification center dropped the settings request"))
    }
}
