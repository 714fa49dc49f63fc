//! Simulation time model.
//!
//! Time is a monotonically increasing `Tick` counter; one tick covers
//! `update_interval_secs` of simulated (and, when running live, wall-clock)
//! time.  Using an integer tick as the canonical unit keeps elapsed-time
//! arithmetic exact and makes scenario hooks deterministic.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[derive(Serialize, Deserialize)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── TickClock ─────────────────────────────────────────────────────────────────

/// Tracks the current tick and maps tick counts to elapsed seconds.
///
/// Cheap to copy; holds no heap data.
#[derive(Clone, Debug)]
pub struct TickClock {
    /// Seconds of simulated time covered by one tick.
    pub update_interval_secs: f64,
    /// The current tick — advanced once per simulator iteration.
    pub current_tick: Tick,
}

impl TickClock {
    pub fn new(update_interval_secs: f64) -> Self {
        Self {
            update_interval_secs,
            current_tick: Tick::ZERO,
        }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Elapsed simulated seconds since tick 0.
    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        self.current_tick.0 as f64 * self.update_interval_secs
    }
}

impl fmt::Display for TickClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (+{:.0}s)", self.current_tick, self.elapsed_secs())
    }
}
