#![forbid(unsafe_code)]

//! Set of currently held keys, keyed by physical code.

use std::collections::HashMap;

/// A key that is physically down.
#[derive(Debug, Clone, PartialEq)]
pub struct HeldKey {
    pub key: String,
    pub code: String,
    pub pressed_at: f64,
}

/// Held-key tracker. At most one entry per code.
#[derive(Debug, Default, Clone)]
pub struct HeldKeys {
    by_code: HashMap<String, HeldKey>,
}

impl HeldKeys {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press. Returns `true` only for the first press of `code`;
    /// auto-repeat keydowns leave the original entry (and its timestamp) alone.
    pub fn on_key_down(&mut self, code: &str, key: &str, pressed_at: f64) -> bool {
        if self.by_code.contains_key(code) {
            return false;
        }
        self.by_code.insert(
            code.to_string(),
            HeldKey {
                key: key.to_string(),
                code: code.to_string(),
                pressed_at,
            },
        );
        true
    }

    /// Record a release. Returns `true` if `code` was held.
    pub fn on_key_up(&mut self, code: &str) -> bool {
        self.by_code.remove(code).is_some()
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<&HeldKey> {
        self.by_code.get(code)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_code.clear();
    }

    /// Held keys in display order: oldest press first, ties broken by code.
    #[must_use]
    pub fn sorted(&self) -> Vec<&HeldKey> {
        let mut keys: Vec<&HeldKey> = self.by_code.values().collect();
        keys.sort_by(|a, b| {
            a.pressed_at
                .total_cmp(&b.pressed_at)
                .then_with(|| a.code.cmp(&b.code))
        });
        keys
    }
}
