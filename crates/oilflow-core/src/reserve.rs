//! Strategic crude reserve with a regulatory floor.

use crate::fixed::{Fixed64, Ticks, non_negative};
use crate::query::ReserveSnapshot;

/// Reserve traffic within a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReserveStats {
    pub tick: Ticks,
    pub requested: Fixed64,
    pub granted: Fixed64,
    pub added: Fixed64,
    pub returned: Fixed64,
}

/// A capacity-bounded buffer. `level` stays within `[0, capacity]`; it only
/// changes through [`Reserve::send`] and [`Reserve::request`].
#[derive(Debug, Clone)]
pub struct Reserve {
    name: String,
    capacity: Fixed64,
    floor: Fixed64,
    level: Fixed64,
    epsilon: Fixed64,
    stats: ReserveStats,
}

impl Reserve {
    /// A fresh reserve starts full.
    pub fn new(name: impl Into<String>, capacity: Fixed64, floor: Fixed64, epsilon: Fixed64) -> Self {
        Self {
            name: name.into(),
            capacity,
            floor,
            level: capacity,
            epsilon,
            stats: ReserveStats::default(),
        }
    }

    /// Start from `level` instead, clamped to `[0, capacity]`.
    pub fn with_level(mut self, level: Fixed64) -> Self {
        self.level = level.clamp(Fixed64::ZERO, self.capacity);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Fixed64 {
        self.level
    }

    pub fn capacity(&self) -> Fixed64 {
        self.capacity
    }

    pub fn floor(&self) -> Fixed64 {
        self.floor
    }

    /// Store up to the free capacity and return the overflow.
    #[must_use = "overflow returned by the reserve must be routed or counted as lost"]
    pub fn send(&mut self, amount: Fixed64, tick: Ticks) -> Fixed64 {
        self.roll_stats(tick);
        let amount = non_negative(amount);
        let stored = amount.min(self.capacity - self.level);
        let overflow = amount - stored;
        self.level += stored;
        self.stats.added += stored;
        self.stats.returned += overflow;
        overflow
    }

    /// Withdraw up to `amount`. Requests at or below epsilon are ignored.
    /// Never grants more than the current level.
    pub fn request(&mut self, amount: Fixed64, tick: Ticks) -> Fixed64 {
        self.roll_stats(tick);
        if amount <= self.epsilon {
            return Fixed64::ZERO;
        }
        let granted = amount.min(self.level);
        self.level -= granted;
        self.stats.requested += amount;
        self.stats.granted += granted;
        granted
    }

    /// Amount needed to reach the regulatory floor.
    pub fn missing(&self) -> Fixed64 {
        non_negative(self.floor - self.level)
    }

    /// Free capacity.
    pub fn headroom(&self) -> Fixed64 {
        self.capacity - self.level
    }

    /// Stats of the last tick that saw traffic.
    pub fn stats(&self) -> ReserveStats {
        self.stats
    }

    fn roll_stats(&mut self, tick: Ticks) {
        if self.stats.tick != tick {
            self.stats = ReserveStats {
                tick,
                ..ReserveStats::default()
            };
        }
    }

    pub fn snapshot(&self) -> ReserveSnapshot {
        ReserveSnapshot {
            name: self.name.clone(),
            level: self.level,
            capacity: self.capacity,
            floor: self.floor,
            missing: self.missing(),
            stats: self.stats,
        }
    }
}
