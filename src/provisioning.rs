//! Extraction of the push-notification environment from an embedded
//! provisioning profile.

/// Reported when no provisioning profile is bundled (simulator builds).
pub const SIMULATOR: &str = "simulator";
/// Reported when a profile exists but carries no readable entitlement.
pub const UNKNOWN: &str = "unknown";

/// File name of the profile inside the app bundle.
pub const PROFILE_FILE_NAME: &str = "embedded.mobileprovision";

const ENTRY_PREFIX: &[u8] = b"<key>aps-environment</key>\n\t\t<string>";
const ENTRY_SUFFIX: &[u8] = b"</string>";

/// Push environment designated by `profile`.
///
/// `None` means the profile is absent. The profile is a signed blob with a
/// plist embedded as text; the entitlement entry is found by scanning for the
/// fixed key/value layout the signing tools emit.
pub fn aps_environment(profile: Option<&[u8]>) -> String {
    match profile {
        None => SIMULATOR.to_string(),
        Some(bytes) => find_entry_value(bytes)
            .unwrap_or(UNKNOWN)
            .to_string(),
    }
}

fn find_entry_value(haystack: &[u8]) -> Option<&str> {
    let mut offset = 0;
    while let Some(found) = find(&haystack[offset..], ENTRY_PREFIX) {
        let value_start = offset + found + ENTRY_PREFIX.len();
        let rest = &haystack[value_start..];
        let value_len = rest.iter().position(|&b| b == b'<').unwrap_or(rest.len());

        if rest[value_len..].starts_with(ENTRY_SUFFIX) && rest[..value_len].is_ascii() {
            // ASCII is valid UTF-8.
            return std::str::from_utf8(&rest[..value_len]).ok();
        }
        offset = value_start;
    }
    None
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
