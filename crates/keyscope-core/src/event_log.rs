#![forbid(unsafe_code)]

//! Newest-first, capacity-bounded event log.
//!
//! Each appended event becomes a [`LogRecord`] carrying its offset from the
//! session origin and its distance from the previous logged event. When the
//! log is full the oldest records fall off the tail.

use std::collections::VecDeque;

use crate::event::{KeyEvent, KeyPhase};

/// Delta column text for the first event after a reset.
pub const NO_DELTA: &str = "—";

/// One logged key event.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Milliseconds since the session origin.
    pub offset_ms: f64,
    /// Rounded milliseconds since the previous logged event; `None` for the
    /// first event after a reset.
    pub delta_ms: Option<i64>,
    pub phase: KeyPhase,
    pub key: String,
    pub code: String,
    pub repeat: bool,
}

impl LogRecord {
    /// Elapsed seconds with millisecond precision, e.g. `"1.234"`.
    #[must_use]
    pub fn elapsed_text(&self) -> String {
        format!("{:.3}", self.offset_ms / 1000.0)
    }

    /// `"<n> ms"`, or [`NO_DELTA`] for the first event.
    #[must_use]
    pub fn delta_text(&self) -> String {
        match self.delta_ms {
            Some(ms) => format!("{ms} ms"),
            None => NO_DELTA.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventLog {
    records: VecDeque<LogRecord>,
    capacity: usize,
    origin: f64,
    last_event_time: Option<f64>,
}

impl EventLog {
    /// Create an empty log. `capacity` is clamped to at least one row.
    #[must_use]
    pub fn new(capacity: usize, origin: f64) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            origin,
            last_event_time: None,
        }
    }

    /// Build a record for `event` against the current timing bookkeeping,
    /// append it, and advance the bookkeeping. Returns the number of records
    /// evicted from the tail.
    pub fn record_event(&mut self, event: &KeyEvent) -> usize {
        let record = LogRecord {
            offset_ms: event.timestamp - self.origin,
            delta_ms: self
                .last_event_time
                .map(|last| (event.timestamp - last).round() as i64),
            phase: event.phase,
            key: event.key.clone(),
            code: event.code.clone(),
            repeat: event.repeat,
        };
        self.last_event_time = Some(event.timestamp);
        self.append(record)
    }

    /// Insert at the head and trim the tail down to capacity.
    /// Returns the number of records evicted.
    pub fn append(&mut self, record: LogRecord) -> usize {
        self.records.push_front(record);
        let overflow = self.records.len().saturating_sub(self.capacity);
        self.records.truncate(self.capacity);
        overflow
    }

    /// Drop every record and restart timing from `origin`.
    pub fn reset(&mut self, origin: f64) {
        self.records.clear();
        self.last_event_time = None;
        self.origin = origin;
    }

    /// Records, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogRecord> + '_ {
        self.records.iter()
    }

    #[must_use]
    pub fn newest(&self) -> Option<&LogRecord> {
        self.records.front()
    }

    #[must_use]
    pub fn oldest(&self) -> Option<&LogRecord> {
        self.records.back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub const fn origin(&self) -> f64 {
        self.origin
    }

    #[must_use]
    pub const fn last_event_time(&self) -> Option<f64> {
        self.last_event_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_event_has_no_delta() {
        let mut log = EventLog::new(300, 1000.0);
        log.record_event(&KeyEvent::down("a", "KeyA", false, 1250.0));
        let rec = log.newest().expect("record");
        assert_eq!(rec.delta_ms, None);
        assert_eq!(rec.delta_text(), "—");
        assert_eq!(rec.elapsed_text(), "0.250");
    }

    #[test]
    fn delta_is_rounded_milliseconds() {
        let mut log = EventLog::new(300, 0.0);
        log.record_event(&KeyEvent::down("a", "KeyA", false, 100.0));
        log.record_event(&KeyEvent::up("a", "KeyA", 133.6));
        let rec = log.newest().expect("record");
        assert_eq!(rec.delta_ms, Some(34));
        assert_eq!(rec.delta_text(), "34 ms");
        assert_eq!(rec.elapsed_text(), "0.134");
        assert_eq!(rec.phase, KeyPhase::Up);
    }

    #[test]
    fn newest_first_ordering() {
        let mut log = EventLog::new(300, 0.0);
        log.record_event(&KeyEvent::down("a", "KeyA", false, 1.0));
        log.record_event(&KeyEvent::down("b", "KeyB", false, 2.0));
        let codes: Vec<&str> = log.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["KeyB", "KeyA"]);
    }

    #[test]
    fn append_past_capacity_evicts_exactly_one() {
        let mut log = EventLog::new(300, 0.0);
        for i in 0..300 {
            assert_eq!(log.record_event(&KeyEvent::down("a", "KeyA", true, i as f64)), 0);
        }
        assert_eq!(log.oldest().map(|r| r.offset_ms), Some(0.0));
        let evicted = log.record_event(&KeyEvent::up("a", "KeyA", 300.0));
        assert_eq!(evicted, 1);
        assert_eq!(log.len(), 300);
        assert_eq!(log.oldest().map(|r| r.offset_ms), Some(1.0));
        assert_eq!(log.newest().map(|r| r.offset_ms), Some(300.0));
    }

    #[test]
    fn reset_restarts_timing() {
        let mut log = EventLog::new(4, 0.0);
        log.record_event(&KeyEvent::down("a", "KeyA", false, 10.0));
        log.reset(500.0);
        assert!(log.is_empty());
        assert_eq!(log.last_event_time(), None);
        log.record_event(&KeyEvent::down("a", "KeyA", false, 750.0));
        let rec = log.newest().expect("record");
        assert_eq!(rec.delta_ms, None);
        assert_eq!(rec.elapsed_text(), "0.250");
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut log = EventLog::new(0, 0.0);
        log.record_event(&KeyEvent::down("a", "KeyA", false, 1.0));
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.len(), 1);
    }
}
