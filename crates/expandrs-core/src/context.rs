// Expandrs Resolution Context
// Per-keystroke snapshot of "now" and the current page context

use chrono::{Local, NaiveDateTime};

/// Ephemeral context a rule evaluation runs against.
///
/// Constructed once per keystroke and never persisted. `now` is local wall
/// time so day-of-week and time-range rules follow the user's clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionContext {
    pub now: NaiveDateTime,
    pub hostname: String,
}

impl ResolutionContext {
    /// Build a context for an explicit instant. Used by tests and by
    /// callers that already captured the clock.
    pub fn new(now: NaiveDateTime, hostname: impl Into<String>) -> Self {
        Self {
            now,
            hostname: hostname.into(),
        }
    }

    /// Capture the current local time for the given hostname.
    pub fn capture(hostname: impl Into<String>) -> Self {
        Self::new(Local::now().naive_local(), hostname)
    }
}
