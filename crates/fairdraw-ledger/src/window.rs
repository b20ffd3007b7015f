//! Time-window guard for the entry phase.
//!
//! Entries are accepted while `start <= now <= end`. Everything that
//! happens after the sale (selection, claims, proceeds) requires
//! `now > end`. Callers pass `now` explicitly so every check is
//! reproducible.

use chrono::{DateTime, Utc};
use fairdraw_types::{DrawConfig, FairdrawError, Result};

/// Inclusive `[start, end]` entry window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl EntryWindow {
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn from_config(config: &DrawConfig) -> Self {
        Self::new(config.start, config.end)
    }

    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether entries are accepted at `now`.
    #[must_use]
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now <= self.end
    }

    /// Whether the window has closed for good at `now`.
    #[must_use]
    pub fn has_closed(&self, now: DateTime<Utc>) -> bool {
        now > self.end
    }

    /// Guard an entry attempt.
    pub fn check_open(&self, now: DateTime<Utc>) -> Result<()> {
        if self.is_open(now) {
            Ok(())
        } else {
            Err(FairdrawError::WindowNotOpen {
                now,
                start: self.start,
                end: self.end,
            })
        }
    }

    /// Guard a post-sale operation.
    pub fn check_closed(&self, now: DateTime<Utc>) -> Result<()> {
        if self.has_closed(now) {
            Ok(())
        } else {
            Err(FairdrawError::WindowStillOpen { end: self.end })
        }
    }
}
