#![forbid(unsafe_code)]

//! Core: session state for the keyscope keyboard visualizer.
//!
//! # Role in keyscope
//! `keyscope-core` owns everything that is not DOM glue. The web shim
//! (`keyscope-web`) turns browser `KeyboardEvent`s into [`KeyEvent`] values,
//! hands them to [`Session::dispatch`], and repaints whatever
//! [`RenderRegions`] comes back.
//!
//! # Primary responsibilities
//! - **KeyEvent**: normalized key input plus a stable JSON encoding.
//! - **HeldKeys**: the set of physically held codes.
//! - **EventLog**: newest-first, capacity-bounded log of rendered records.
//! - **PatternTracker**: auto-repeat ring buffer and per-code repeat counts.
//! - **Session**: the pause gate, dispatch, reset and clear.
//!
//! Everything here is synchronous and single threaded. Nothing allocates
//! beyond the configured capacities.

pub mod config;
pub mod error;
pub mod event;
pub mod event_log;
pub mod held;
pub mod pattern;
pub mod session;
pub mod view;

pub use config::SessionConfig;
pub use error::KeyscopeError;
pub use event::{KeyEvent, KeyPhase};
pub use event_log::{EventLog, LogRecord};
pub use held::{HeldKey, HeldKeys};
pub use pattern::{PatternEntry, PatternTracker, RepeatCount};
pub use session::{CaptureGate, RenderRegions, Session};
pub use view::{HeldKeyView, LogRowView, RepeatCountView, SessionSnapshot};
