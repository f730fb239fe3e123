//! Issue key helpers.
//!
//! Remote keys have the form `<PROJECT>-<number>`. Issues created offline
//! carry a UUID placeholder key until the remote assigns a real one.

use uuid::Uuid;

/// Generate a fresh placeholder key.
#[must_use]
pub fn placeholder_key() -> String {
    Uuid::new_v4().to_string()
}

/// True when `key` is a placeholder rather than a remote key.
#[must_use]
pub fn is_placeholder_key(key: &str) -> bool {
    Uuid::parse_str(key).is_ok()
}

/// Display form of a key: placeholders are cut to their first group.
#[must_use]
pub fn short_key(key: &str) -> &str {
    if is_placeholder_key(key) {
        key.split('-').next().unwrap_or(key)
    } else {
        key
    }
}
