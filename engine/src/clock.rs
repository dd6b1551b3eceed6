//! Temporary id allocation for optimistic creates.
//!
//! Placeholder records need ids that can never collide with server ids
//! (which are non-negative) or with each other while several creates are in
//! flight. The clock hands out strictly decreasing negative ids, seeded from
//! wall-clock milliseconds so ids from different sessions rarely overlap.

use crate::{DreamId, Timestamp};
use serde::{Deserialize, Serialize};

/// A monotonically decreasing source of negative ids.
///
/// Ordering rules:
/// 1. Every issued id is strictly below zero
/// 2. Every issued id is strictly below the previous one
/// 3. Observing a newer wall-clock time never moves the clock backwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempIdClock {
    /// Last issued id, or zero before the first tick.
    last: DreamId,
}

impl TempIdClock {
    /// Create a clock that has issued nothing yet.
    pub fn new() -> Self {
        Self { last: 0 }
    }

    /// Create a clock whose first id is derived from `now`.
    pub fn seeded(now: Timestamp) -> Self {
        Self {
            last: -now.max(0),
        }
    }

    /// Issue the next id.
    ///
    /// `now` is the caller's current time in milliseconds; the id is `-now`
    /// unless that would not be below the last issued id.
    pub fn tick(&mut self, now: Timestamp) -> DreamId {
        let candidate = -now.max(1);
        self.last = if candidate < self.last {
            candidate
        } else {
            self.last.saturating_sub(1)
        };
        self.last
    }

    /// Last issued id.
    pub fn last(&self) -> DreamId {
        self.last
    }
}

impl Default for TempIdClock {
    fn default() -> Self {
        Self::new()
    }
}
