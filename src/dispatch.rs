//! Command de-duplication and re-affirmation
//!
//! The charger reverts to its own default limit when a command is not
//! refreshed within its local TTL. Limits are therefore resent when they
//! change, and also when the last successful dispatch is older than the
//! re-affirmation interval, which is configured below that TTL.

use crate::phase::PhaseCurrents;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::{Duration, Instant};

/// Default re-affirmation interval (seconds). A record exactly this old is
/// already due.
pub const DEFAULT_REAFFIRM_INTERVAL_SECS: u64 = 180;

/// Default charger-side command TTL (seconds)
pub const DEFAULT_CHARGER_TTL_SECS: u64 = 300;

/// Last set of limits the charger accepted
#[derive(Debug, Clone)]
pub struct DispatchRecord {
    pub currents: PhaseCurrents,
    pub sent_at: Instant,
    pub sent_at_utc: DateTime<Utc>,
}

impl DispatchRecord {
    pub fn new(currents: PhaseCurrents, sent_at: Instant) -> Self {
        Self {
            currents,
            sent_at,
            sent_at_utc: Utc::now(),
        }
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.sent_at)
    }
}

/// Why a dispatch was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchReason {
    /// Nothing was sent yet (or the record was reset)
    Initial,
    /// At least one phase dropped, or rose by more than the change threshold
    Changed,
    /// Values are unchanged but the re-affirmation interval elapsed
    Reaffirm,
}

/// Outcome of the dispatch decision for one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum DispatchDecision {
    Sent {
        reason: DispatchReason,
        currents: PhaseCurrents,
    },
    Skipped,
}

#[derive(Debug, Clone, Copy)]
pub struct DispatchPolicy {
    reaffirm_interval: Duration,
    min_change_amps: f64,
}

impl DispatchPolicy {
    pub fn new(reaffirm_interval: Duration, min_change_amps: f64) -> Self {
        Self {
            reaffirm_interval,
            min_change_amps: min_change_amps.max(0.0),
        }
    }

    pub fn reaffirm_interval(&self) -> Duration {
        self.reaffirm_interval
    }

    /// Decide whether `candidate` must be sent given the last accepted record.
    ///
    /// Unchanged limits are resent once the record's age reaches the
    /// re-affirmation interval, the boundary tick included.
    pub fn decide(
        &self,
        candidate: &PhaseCurrents,
        last: Option<&DispatchRecord>,
        now: Instant,
    ) -> Option<DispatchReason> {
        let Some(last) = last else {
            return Some(DispatchReason::Initial);
        };
        if self.changed(candidate, &last.currents) {
            return Some(DispatchReason::Changed);
        }
        if last.age(now) >= self.reaffirm_interval {
            return Some(DispatchReason::Reaffirm);
        }
        None
    }

    /// Any decrease counts, so the charger is never left above the headroom.
    /// Increases only count past `min_change_amps`.
    fn changed(&self, candidate: &PhaseCurrents, last: &PhaseCurrents) -> bool {
        if candidate.len() != last.len() {
            return true;
        }
        candidate.iter().any(|(phase, amps)| match last.get(phase) {
            Some(prev) => *amps < *prev || amps - prev > self.min_change_amps,
            None => true,
        })
    }
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_REAFFIRM_INTERVAL_SECS), 0.1)
    }
}
