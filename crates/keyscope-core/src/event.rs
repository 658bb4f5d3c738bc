#![forbid(unsafe_code)]

//! Normalized key input and its JSON encoding.
//!
//! The web host produces one [`KeyEvent`] per DOM `keydown`/`keyup`:
//! - `key` is the logical label (`"a"`, `"A"`, `"Enter"`), layout dependent,
//! - `code` is the physical identifier (`"KeyA"`, `"Enter"`), layout stable,
//! - `timestamp` is the DOM high-resolution timestamp in milliseconds.
//!
//! The JSON form is small and stable so scripted hosts can push events
//! through the same path as live input.

use serde::{Deserialize, Serialize};

use crate::error::{KeyscopeError, Result};

/// Phase for key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPhase {
    Down,
    Up,
}

impl KeyPhase {
    /// Label used in the event log `type` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Down => "keydown",
            Self::Up => "keyup",
        }
    }
}

/// Normalized key input event.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub phase: KeyPhase,
    pub key: String,
    pub code: String,
    pub repeat: bool,
    pub timestamp: f64,
}

impl KeyEvent {
    /// A keydown. `repeat` is the host's auto-repeat flag.
    #[must_use]
    pub fn down(
        key: impl Into<String>,
        code: impl Into<String>,
        repeat: bool,
        timestamp: f64,
    ) -> Self {
        Self {
            phase: KeyPhase::Down,
            key: key.into(),
            code: code.into(),
            repeat,
            timestamp,
        }
    }

    /// A keyup. Releases never repeat.
    #[must_use]
    pub fn up(key: impl Into<String>, code: impl Into<String>, timestamp: f64) -> Self {
        Self {
            phase: KeyPhase::Up,
            key: key.into(),
            code: code.into(),
            repeat: false,
            timestamp,
        }
    }

    /// Label for the repeat pattern: the key when it is a single character,
    /// the physical code otherwise (`"Enter"` repeats show as `"Enter"`,
    /// arrow repeats as `"ArrowLeft"`).
    #[must_use]
    pub fn pattern_label(&self) -> &str {
        let mut chars = self.key.chars();
        match (chars.next(), chars.next()) {
            (Some(_), None) => &self.key,
            _ => &self.code,
        }
    }

    /// Encode this event as a stable JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&KeyEventJson::from(self))?)
    }

    /// Decode and validate a JSON-encoded event.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let json: KeyEventJson = serde_json::from_str(s)?;
        Self::try_from(json)
    }
}

/// Wire form of [`KeyEvent`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyEventJson {
    pub phase: KeyPhase,
    #[serde(default)]
    pub key: String,
    pub code: String,
    #[serde(default)]
    pub repeat: bool,
    pub ts: f64,
}

impl From<&KeyEvent> for KeyEventJson {
    fn from(value: &KeyEvent) -> Self {
        Self {
            phase: value.phase,
            key: value.key.clone(),
            code: value.code.clone(),
            repeat: value.repeat,
            ts: value.timestamp,
        }
    }
}

impl TryFrom<KeyEventJson> for KeyEvent {
    type Error = KeyscopeError;

    fn try_from(value: KeyEventJson) -> Result<Self> {
        if value.code.is_empty() {
            return Err(KeyscopeError::InvalidEvent(
                "code must not be empty".to_string(),
            ));
        }
        if !value.ts.is_finite() || value.ts < 0.0 {
            return Err(KeyscopeError::InvalidEvent(format!(
                "timestamp must be finite and non-negative, got {}",
                value.ts
            )));
        }
        Ok(Self {
            phase: value.phase,
            key: value.key,
            code: value.code,
            repeat: value.phase == KeyPhase::Down && value.repeat,
            timestamp: value.ts,
        })
    }
}
