#![forbid(unsafe_code)]

//! Auto-repeat tracking: a FIFO ring of recent repeat labels and a running
//! repeat count per physical code.

use std::collections::{HashMap, VecDeque};

/// Separator used when the pattern ring is shown as one line.
pub const SEQUENCE_SEPARATOR: &str = " → ";

/// One repeated keydown in the pattern ring.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternEntry {
    pub label: String,
    pub timestamp: f64,
}

/// Repeat total for one physical code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatCount {
    pub code: String,
    /// Display key of the latest repeat for this code.
    pub key: String,
    pub count: u32,
}

#[derive(Debug, Clone)]
pub struct PatternTracker {
    ring: VecDeque<PatternEntry>,
    capacity: usize,
    counts: HashMap<String, RepeatCount>,
}

impl PatternTracker {
    /// Create an empty tracker. `capacity` is clamped to at least one entry.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: VecDeque::with_capacity(capacity),
            capacity,
            counts: HashMap::new(),
        }
    }

    /// Record one auto-repeat keydown. Returns `true` if the oldest ring
    /// entry was evicted to make room.
    pub fn record_repeat(&mut self, code: &str, key: &str, label: &str, timestamp: f64) -> bool {
        self.ring.push_back(PatternEntry {
            label: label.to_string(),
            timestamp,
        });
        let evicted = self.ring.len() > self.capacity;
        if evicted {
            self.ring.pop_front();
        }

        self.counts
            .entry(code.to_string())
            .and_modify(|entry| {
                entry.count = entry.count.saturating_add(1);
                if entry.key != key {
                    entry.key = key.to_string();
                }
            })
            .or_insert_with(|| RepeatCount {
                code: code.to_string(),
                key: key.to_string(),
                count: 1,
            });
        evicted
    }

    pub fn reset(&mut self) {
        self.ring.clear();
        self.counts.clear();
    }

    /// Ring entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &PatternEntry> + '_ {
        self.ring.iter()
    }

    /// Ring labels joined with [`SEQUENCE_SEPARATOR`]. Empty when no repeats
    /// have been seen.
    #[must_use]
    pub fn sequence(&self) -> String {
        let labels: Vec<&str> = self.ring.iter().map(|e| e.label.as_str()).collect();
        labels.join(SEQUENCE_SEPARATOR)
    }

    #[must_use]
    pub fn count_for(&self, code: &str) -> u32 {
        self.counts.get(code).map_or(0, |entry| entry.count)
    }

    /// Counts ordered by count descending, then code ascending.
    #[must_use]
    pub fn ranked(&self) -> Vec<&RepeatCount> {
        let mut ranked: Vec<&RepeatCount> = self.counts.values().collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.code.cmp(&b.code)));
        ranked
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
