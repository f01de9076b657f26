//! # Clock & Identity
//!
//! Time source for creation timestamps and the id sequence derived from it.
//!
//! Identifiers are epoch milliseconds at creation time. Two records created
//! within the same millisecond (or after a clock step backwards) still get
//! distinct ids because the sequence never issues a value at or below the
//! last one.

use crate::LarderError;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// A source of the current time.
pub trait Clock: Debug {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant. Used for reproducible ids and timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// A clock frozen at `millis` since the Unix epoch.
    ///
    /// Out-of-range values fall back to the epoch itself.
    #[must_use]
    pub fn at_millis(millis: i64) -> Self {
        Self(DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or(DateTime::<Utc>::UNIX_EPOCH))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Strictly increasing, timestamp-derived id allocator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdSequence {
    last: u64,
}

impl IdSequence {
    /// A sequence that will only issue ids greater than `last`.
    #[must_use]
    pub const fn starting_after(last: u64) -> Self {
        Self { last }
    }

    /// Issue the next id for an object created at `now`.
    ///
    /// # Errors
    ///
    /// Returns `LarderError::Validation` once `u64::MAX` has been issued or
    /// observed; an id is never handed out twice.
    pub fn next_id(&mut self, now: DateTime<Utc>) -> Result<u64, LarderError> {
        let floor = self
            .last
            .checked_add(1)
            .ok_or_else(|| LarderError::Validation("id space exhausted".to_string()))?;
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let id = millis.max(floor);
        self.last = id;
        Ok(id)
    }

    /// Record an externally assigned id so it is never issued again.
    pub fn observe(&mut self, id: u64) {
        self.last = self.last.max(id);
    }

    /// The most recently issued or observed id.
    #[must_use]
    pub const fn last(&self) -> u64 {
        self.last
    }
}
