#![forbid(unsafe_code)]

//! The session: one owner for the three stores plus the pause gate.
//!
//! The host calls [`Session::dispatch`] once per key event, in delivery
//! order, and repaints the [`RenderRegions`] it returns. While the gate is
//! [`CaptureGate::Paused`] events are dropped outright; nothing is queued for
//! later.
//!
//! [`Session::reset`] clears the stores and restarts the clock but leaves the
//! gate alone. [`Session::clear`] is the user-facing "clear" action: reset
//! plus unpause.

use bitflags::bitflags;
use tracing::{debug, trace};

use crate::config::SessionConfig;
use crate::error::{KeyscopeError, Result};
use crate::event::{KeyEvent, KeyPhase};
use crate::event_log::EventLog;
use crate::held::HeldKeys;
use crate::pattern::PatternTracker;
use crate::view::SessionSnapshot;

bitflags! {
    /// Display regions touched by an operation.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderRegions: u8 {
        const HELD    = 0b001;
        const LOG     = 0b010;
        const PATTERN = 0b100;
    }
}

/// Whether incoming key events are processed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureGate {
    #[default]
    Active,
    Paused,
}

#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    gate: CaptureGate,
    held: HeldKeys,
    log: EventLog,
    patterns: PatternTracker,
}

impl Session {
    /// Start a session whose clock origin is `origin` (host milliseconds).
    #[must_use]
    pub fn new(config: SessionConfig, origin: f64) -> Self {
        Self {
            config,
            gate: CaptureGate::Active,
            held: HeldKeys::new(),
            log: EventLog::new(config.log_capacity, origin),
            patterns: PatternTracker::new(config.pattern_capacity),
        }
    }

    /// Apply one key event. Returns the regions that changed; empty when
    /// the gate is paused.
    pub fn dispatch(&mut self, event: &KeyEvent) -> RenderRegions {
        if self.is_paused() {
            trace!(
                target: "keyscope_core::session",
                code = event.code.as_str(),
                phase = event.phase.as_str(),
                "dropped key event while paused"
            );
            return RenderRegions::empty();
        }

        let mut regions = RenderRegions::LOG;
        match event.phase {
            KeyPhase::Down => {
                if self
                    .held
                    .on_key_down(&event.code, &event.key, event.timestamp)
                {
                    regions |= RenderRegions::HELD;
                }
                self.append_log(event);
                if event.repeat {
                    let evicted = self.patterns.record_repeat(
                        &event.code,
                        &event.key,
                        event.pattern_label(),
                        event.timestamp,
                    );
                    if evicted {
                        trace!(
                            target: "keyscope_core::session",
                            capacity = self.patterns.capacity(),
                            "pattern ring evicted oldest entry"
                        );
                    }
                    regions |= RenderRegions::PATTERN;
                }
            }
            KeyPhase::Up => {
                self.append_log(event);
                if self.held.on_key_up(&event.code) {
                    regions |= RenderRegions::HELD;
                }
            }
        }

        trace!(
            target: "keyscope_core::session",
            code = event.code.as_str(),
            phase = event.phase.as_str(),
            repeat = event.repeat,
            regions = regions.bits(),
            "dispatched key event"
        );
        regions
    }

    /// Reject an event stamped before the clock origin. Live DOM events
    /// share the origin's clock and always pass; scripted input must use
    /// the same `performance.now()` timeline.
    pub fn check_timestamp(&self, event: &KeyEvent) -> Result<()> {
        let origin = self.log.origin();
        if event.timestamp < origin {
            return Err(KeyscopeError::InvalidEvent(format!(
                "timestamp {} precedes session origin {origin}",
                event.timestamp
            )));
        }
        Ok(())
    }

    fn append_log(&mut self, event: &KeyEvent) {
        let evicted = self.log.record_event(event);
        if evicted > 0 {
            trace!(
                target: "keyscope_core::session",
                evicted,
                capacity = self.log.capacity(),
                "event log evicted oldest records"
            );
        }
    }

    /// Clear every store and restart the clock at `now`. The gate is left
    /// as it is.
    pub fn reset(&mut self, now: f64) -> RenderRegions {
        self.held.clear();
        self.log.reset(now);
        self.patterns.reset();
        debug!(
            target: "keyscope_core::session",
            origin = now,
            paused = self.is_paused(),
            "session reset"
        );
        RenderRegions::all()
    }

    /// Reset and reopen the gate.
    pub fn clear(&mut self, now: f64) -> RenderRegions {
        let regions = self.reset(now);
        self.gate = CaptureGate::Active;
        debug!(target: "keyscope_core::session", "session cleared and resumed");
        regions
    }

    pub fn set_paused(&mut self, paused: bool) {
        let gate = if paused {
            CaptureGate::Paused
        } else {
            CaptureGate::Active
        };
        if gate != self.gate {
            debug!(target: "keyscope_core::session", ?gate, "capture gate changed");
            self.gate = gate;
        }
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.gate == CaptureGate::Paused
    }

    #[must_use]
    pub const fn gate(&self) -> CaptureGate {
        self.gate
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub const fn held(&self) -> &HeldKeys {
        &self.held
    }

    #[must_use]
    pub const fn log(&self) -> &EventLog {
        &self.log
    }

    #[must_use]
    pub const fn patterns(&self) -> &PatternTracker {
        &self.patterns
    }

    /// Render-ready projection of the whole session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(self)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default(), 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_repeat_release_scenario() {
        let mut session = Session::default();

        let regions = session.dispatch(&KeyEvent::down("a", "KeyA", false, 10.0));
        assert_eq!(regions, RenderRegions::HELD | RenderRegions::LOG);
        assert!(session.held().contains("KeyA"));
        assert_eq!(session.log().len(), 1);

        for ts in [500.0, 533.0, 566.0] {
            let regions = session.dispatch(&KeyEvent::down("a", "KeyA", true, ts));
            assert_eq!(regions, RenderRegions::LOG | RenderRegions::PATTERN);
        }
        assert_eq!(session.patterns().count_for("KeyA"), 3);
        assert_eq!(session.patterns().sequence(), "a → a → a");
        assert_eq!(session.held().len(), 1);

        let regions = session.dispatch(&KeyEvent::up("a", "KeyA", 600.0));
        assert_eq!(regions, RenderRegions::HELD | RenderRegions::LOG);
        assert!(session.held().is_empty());
        assert_eq!(session.log().len(), 5);
    }

    #[test]
    fn paused_session_ignores_everything() {
        let mut session = Session::default();
        session.set_paused(true);
        assert_eq!(
            session.dispatch(&KeyEvent::down("a", "KeyA", true, 1.0)),
            RenderRegions::empty()
        );
        assert_eq!(
            session.dispatch(&KeyEvent::up("a", "KeyA", 2.0)),
            RenderRegions::empty()
        );
        assert!(session.held().is_empty());
        assert!(session.log().is_empty());
        assert!(session.patterns().is_empty());
        assert_eq!(session.log().last_event_time(), None);
    }

    #[test]
    fn events_during_pause_are_not_replayed_on_resume() {
        let mut session = Session::default();
        session.set_paused(true);
        session.dispatch(&KeyEvent::down("a", "KeyA", false, 1.0));
        session.set_paused(false);
        assert!(session.log().is_empty());
        // Release of a key pressed while paused is logged but holds nothing.
        let regions = session.dispatch(&KeyEvent::up("a", "KeyA", 2.0));
        assert_eq!(regions, RenderRegions::LOG);
    }

    #[test]
    fn reset_keeps_pause_flag() {
        let mut session = Session::default();
        session.dispatch(&KeyEvent::down("a", "KeyA", true, 1.0));
        session.set_paused(true);
        assert_eq!(session.reset(100.0), RenderRegions::all());
        assert!(session.is_paused());
        assert!(session.held().is_empty());
        assert!(session.log().is_empty());
        assert_eq!(session.patterns().count_for("KeyA"), 0);
        assert_eq!(session.log().origin(), 100.0);
    }

    #[test]
    fn clear_resets_and_unpauses() {
        let mut session = Session::default();
        session.dispatch(&KeyEvent::down("a", "KeyA", false, 1.0));
        session.set_paused(true);
        session.clear(50.0);
        assert_eq!(session.gate(), CaptureGate::Active);
        assert!(session.held().is_empty());
        assert!(session.log().is_empty());
    }

    #[test]
    fn repeat_without_prior_press_still_holds_key() {
        let mut session = Session::default();
        let regions = session.dispatch(&KeyEvent::down("a", "KeyA", true, 1.0));
        assert_eq!(regions, RenderRegions::all());
        assert!(session.held().contains("KeyA"));
    }

    #[test]
    fn timestamps_before_origin_are_rejected() {
        let mut session = Session::new(SessionConfig::default(), 1_000.0);
        let early = KeyEvent::down("a", "KeyA", false, 12.5);
        assert!(matches!(
            session.check_timestamp(&early),
            Err(KeyscopeError::InvalidEvent(_))
        ));
        assert!(session.check_timestamp(&KeyEvent::up("a", "KeyA", 1_000.0)).is_ok());

        session.reset(2_000.0);
        let stale = KeyEvent::down("a", "KeyA", false, 1_500.0);
        assert!(session.check_timestamp(&stale).is_err());
        assert!(session.log().is_empty());
    }

    #[test]
    fn configured_capacities_are_honored() {
        let config = SessionConfig {
            log_capacity: 2,
            pattern_capacity: 1,
        };
        let mut session = Session::new(config, 0.0);
        for ts in 0..5 {
            session.dispatch(&KeyEvent::down("x", "KeyX", true, f64::from(ts)));
        }
        assert_eq!(session.log().len(), 2);
        assert_eq!(session.patterns().len(), 1);
        assert_eq!(session.patterns().count_for("KeyX"), 5);
    }
}
