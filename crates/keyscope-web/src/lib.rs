#![forbid(unsafe_code)]

//! WASM frontend for keyscope.
//!
//! On `wasm32` this crate binds `keydown`/`keyup` on `document` in capture
//! phase, feeds a [`keyscope_core::Session`], and repaints the page regions
//! named by the returned [`keyscope_core::RenderRegions`]. The host page must
//! provide the elements listed in [`dom_ids`].
//!
//! JS surface (see `www/bootstrap.js`):
//! - `mount()`: mount if not mounted yet. Called automatically at start; the
//!   bootstrap script retries after `DOMContentLoaded` if that failed.
//! - `pushEncodedInput(json)`: dispatch a JSON-encoded key event.
//! - `snapshotJson()`: current session view as JSON.
//! - `resetSession()` / `clearSession()`.

use keyscope_core::SessionConfig;
use tracing::warn;

#[cfg(target_arch = "wasm32")]
mod app;

#[cfg(target_arch = "wasm32")]
pub use app::{clear_session, mount, push_encoded_input, reset_session, snapshot_json, start};

/// Element ids the page must provide.
pub mod dom_ids {
    pub const HELD_KEYS: &str = "held-keys";
    pub const NO_HELD_KEYS: &str = "no-held-keys";
    pub const EVENT_LOG: &str = "event-log";
    pub const PATTERN_SEQUENCE: &str = "pattern-sequence";
    pub const PATTERN_COUNTS: &str = "pattern-counts";
    pub const PAUSE_TOGGLE: &str = "toggle-pause";
    pub const CLEAR_BUTTON: &str = "clear-log";
}

/// `<body>` attribute carrying an optional JSON [`SessionConfig`].
pub const CONFIG_ATTRIBUTE: &str = "data-keyscope-config";

/// Resolve the session config from the body attribute value.
///
/// A missing attribute means defaults. A malformed or invalid value is
/// logged and also falls back to defaults; a bad config never blocks mount.
#[must_use]
pub fn session_config_from_attribute(raw: Option<&str>) -> SessionConfig {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return SessionConfig::default();
    };
    match SessionConfig::from_json_str(raw) {
        Ok(config) => config,
        Err(err) => {
            warn!(
                target: "keyscope_web::mount",
                error = %err,
                "ignoring invalid session config; using defaults"
            );
            SessionConfig::default()
        }
    }
}
