//! C ABI for the host app (Swift/Objective-C) linking the static library.
//!
//! Strings returned to the caller are heap-allocated and must be released
//! with [`deviceinfo_free_string`]. Launch-count calls return `-1` on error.

use std::ffi::{c_char, c_void, CStr, CString};
use std::sync::OnceLock;

use anyhow::{anyhow, Result};

use crate::config::DeviceInfoConfig;
use crate::device_info::{formatted_token, InfoRequest};
use crate::models::InfoMap;
use crate::utils::init_logging;
use crate::DeviceInfoKit;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

static KIT: OnceLock<DeviceInfoKit> = OnceLock::new();

pub type InfoCallback = extern "C" fn(info_json: *mut c_char, context: *mut c_void);

/// Caller-owned context pointer handed back untouched to the callback.
struct CallbackContext(*mut c_void);

// The pointer is opaque to us; the caller is responsible for its thread safety.
unsafe impl Send for CallbackContext {}

fn kit() -> Option<&'static DeviceInfoKit> {
    let kit = KIT.get();
    if kit.is_none() {
        log_error!("deviceinfo used before deviceinfo_init");
    }
    kit
}

unsafe fn c_ptr_to_string(ptr: *const c_char) -> Result<Option<String>> {
    if ptr.is_null() {
        return Ok(None);
    }

    let c_str = CStr::from_ptr(ptr);
    c_str
        .to_str()
        .map(|s| Some(s.to_owned()))
        .map_err(|e| anyhow!(e))
}

unsafe fn optional_f64(ptr: *const f64) -> Option<f64> {
    if ptr.is_null() {
        None
    } else {
        Some(*ptr)
    }
}

fn string_into_raw(value: String) -> *mut c_char {
    match CString::new(value) {
        Ok(c_string) => c_string.into_raw(),
        Err(err) => {
            log_warn!("Returned string contains null byte: {err}");
            std::ptr::null_mut()
        }
    }
}

fn info_into_raw(info: &InfoMap) -> *mut c_char {
    match serde_json::to_string(info) {
        Ok(json) => string_into_raw(json),
        Err(err) => {
            log_error!("Failed to serialize device info: {err}");
            std::ptr::null_mut()
        }
    }
}

unsafe fn request_from_raw(
    token: *const c_char,
    latitude: *const f64,
    longitude: *const f64,
    null_for_missing: bool,
) -> Result<InfoRequest> {
    Ok(InfoRequest {
        token: c_ptr_to_string(token)?,
        latitude: optional_f64(latitude),
        longitude: optional_f64(longitude),
        null_for_missing,
    })
}

fn count_to_i64(result: Result<u64>, action: &str) -> i64 {
    match result {
        Ok(count) => i64::try_from(count).unwrap_or(i64::MAX),
        Err(err) => {
            log_error!("Failed to {action}: {err:#}");
            -1
        }
    }
}

/// Load the JSON config at `config_path` (null for defaults) and set up the
/// library. Returns `true` once initialised, including on repeated calls.
///
/// # Safety
/// `config_path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn deviceinfo_init(config_path: *const c_char) -> bool {
    init_logging();

    if KIT.get().is_some() {
        return true;
    }

    let result = (|| -> Result<DeviceInfoKit> {
        let config = match c_ptr_to_string(config_path)? {
            Some(path) => DeviceInfoConfig::load(path)?,
            None => DeviceInfoConfig::default(),
        };
        DeviceInfoKit::from_config(&config)
    })();

    match result {
        Ok(kit) => {
            if KIT.set(kit).is_err() {
                log_warn!("deviceinfo_init raced with another initialisation");
            } else {
                log_info!("deviceinfo initialised");
            }
            true
        }
        Err(err) => {
            log_error!("deviceinfo_init failed: {err:#}");
            false
        }
    }
}

/// Uppercase hex of the push token bytes.
///
/// # Safety
/// `bytes` must point to `len` readable bytes, or be null with `len == 0`.
#[no_mangle]
pub unsafe extern "C" fn deviceinfo_formatted_token(bytes: *const u8, len: usize) -> *mut c_char {
    if bytes.is_null() {
        return string_into_raw(String::new());
    }
    let token = std::slice::from_raw_parts(bytes, len);
    string_into_raw(formatted_token(token))
}

/// Device info payload as JSON. Null pointers mark missing values.
///
/// # Safety
/// Pointer arguments must be null or valid for reads.
#[no_mangle]
pub unsafe extern "C" fn deviceinfo_info_json(
    token: *const c_char,
    latitude: *const f64,
    longitude: *const f64,
    null_for_missing: bool,
) -> *mut c_char {
    let Some(kit) = kit() else {
        return std::ptr::null_mut();
    };

    match request_from_raw(token, latitude, longitude, null_for_missing) {
        Ok(request) => info_into_raw(&kit.device_info.info_dictionary(&request)),
        Err(err) => {
            log_error!("Invalid device info request: {err}");
            std::ptr::null_mut()
        }
    }
}

/// Like [`deviceinfo_info_json`] with notification settings merged in.
/// `callback` fires once, on a background thread, and owns the string it
/// receives. Returns `false` if the request could not be issued.
///
/// # Safety
/// Pointer arguments must be null or valid for reads; `context` must stay
/// valid until the callback runs.
#[no_mangle]
pub unsafe extern "C" fn deviceinfo_info_with_notification_settings_json(
    token: *const c_char,
    latitude: *const f64,
    longitude: *const f64,
    null_for_missing: bool,
    callback: InfoCallback,
    context: *mut c_void,
) -> bool {
    let Some(kit) = kit() else {
        return false;
    };

    let request = match request_from_raw(token, latitude, longitude, null_for_missing) {
        Ok(request) => request,
        Err(err) => {
            log_error!("Invalid device info request: {err}");
            return false;
        }
    };

    let context = CallbackContext(context);
    kit.device_info
        .info_with_notification_settings(&request, move |info| {
            let context = context;
            callback(info_into_raw(&info), context.0);
        });
    true
}

#[no_mangle]
pub extern "C" fn deviceinfo_launch_count_increment() -> i64 {
    let Some(kit) = kit() else {
        return -1;
    };
    count_to_i64(
        kit.launch_counter.increment_current_version(),
        "increment launch count",
    )
}

#[no_mangle]
pub extern "C" fn deviceinfo_launch_count_current_version() -> i64 {
    let Some(kit) = kit() else {
        return -1;
    };
    count_to_i64(
        kit.launch_counter.current_version_count(),
        "read launch count",
    )
}

#[no_mangle]
pub extern "C" fn deviceinfo_launch_count_total() -> i64 {
    let Some(kit) = kit() else {
        return -1;
    };
    count_to_i64(kit.launch_counter.total_count(), "read total launch count")
}

/// Release a string returned by this library.
///
/// # Safety
/// `ptr` must come from this library and not have been freed already.
#[no_mangle]
pub unsafe extern "C" fn deviceinfo_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let value = CStr::from_ptr(ptr).to_str().unwrap().to_owned();
        deviceinfo_free_string(ptr);
        value
    }

    extern "C" fn forward_to_channel(info_json: *mut c_char, context: *mut c_void) {
        let sender = unsafe { Box::from_raw(context as *mut mpsc::Sender<String>) };
        let json = unsafe { take_string(info_json) };
        sender.send(json).unwrap();
    }

    #[test]
    fn formats_token_across_the_boundary() {
        let bytes = [0x1Au8, 0xB2, 0x03];
        let formatted = unsafe { take_string(deviceinfo_formatted_token(bytes.as_ptr(), bytes.len())) };
        assert_eq!(formatted, "1AB203");

        let empty = unsafe { take_string(deviceinfo_formatted_token(std::ptr::null(), 0)) };
        assert_eq!(empty, "");
    }

    // Single test for the global state so ordering between tests cannot matter.
    #[test]
    fn initialised_library_round_trip() {
        assert!(unsafe { deviceinfo_init(std::ptr::null()) });
        assert!(unsafe { deviceinfo_init(std::ptr::null()) });

        let token = CString::new("1AB203").unwrap();
        let latitude = 59.91;
        let json = unsafe {
            take_string(deviceinfo_info_json(
                token.as_ptr(),
                &latitude,
                std::ptr::null(),
                true,
            ))
        };
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["app"]["token"], "1AB203");
        assert_eq!(value["location"]["lat"], 59.91);
        assert!(value["location"]["lng"].is_null());

        let (tx, rx) = mpsc::channel::<String>();
        let context = Box::into_raw(Box::new(tx)) as *mut c_void;
        let issued = unsafe {
            deviceinfo_info_with_notification_settings_json(
                std::ptr::null(),
                std::ptr::null(),
                std::ptr::null(),
                false,
                forward_to_channel,
                context,
            )
        };
        assert!(issued);
        let json = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["notification_settings"]["authorization"], "notDetermined");
        assert!(value["app"].get("token").is_none());

        let before = deviceinfo_launch_count_total();
        assert!(before >= 0);
        assert_eq!(deviceinfo_launch_count_increment(), deviceinfo_launch_count_current_version());
        assert_eq!(deviceinfo_launch_count_total(), before + 1);
    }
}
