//! Capacity- and storage-bounded slot planning.
//!
//! A [`SpillbackPlanner`] keeps a backlog of amounts committed to future
//! ticks. Offering an amount fills the first slot up to the per-tick
//! capacity, then spills the excess one tick later, and so on for at most
//! `delay + 1` slots. Whatever still does not fit is reported as lost.
//!
//! Two invariants hold after every call:
//!
//! - every slot holds at most `capacity_per_tick`;
//! - every window of `delay + 1` consecutive slots holds at most
//!   `storage_bound`.

use crate::fixed::{Fixed64, Ticks, non_negative};
use std::collections::BTreeMap;

/// Result of offering an amount to the planner.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Placement {
    /// Amounts added per slot, in slot order.
    pub placed: Vec<(Ticks, Fixed64)>,
    /// Part of the offer that fit nowhere in the window.
    pub lost: Fixed64,
}

impl Placement {
    pub fn placed_total(&self) -> Fixed64 {
        self.placed.iter().map(|&(_, amount)| amount).sum()
    }
}

#[derive(Debug, Clone)]
pub struct SpillbackPlanner {
    capacity_per_tick: Fixed64,
    delay: Ticks,
    storage_bound: Fixed64,
    backlog: BTreeMap<Ticks, Fixed64>,
}

impl SpillbackPlanner {
    pub fn new(capacity_per_tick: Fixed64, delay: Ticks, storage_bound: Fixed64) -> Self {
        Self {
            capacity_per_tick,
            delay,
            storage_bound,
            backlog: BTreeMap::new(),
        }
    }

    pub fn capacity_per_tick(&self) -> Fixed64 {
        self.capacity_per_tick
    }

    pub fn delay(&self) -> Ticks {
        self.delay
    }

    pub fn storage_bound(&self) -> Fixed64 {
        self.storage_bound
    }

    /// Place `amount` starting at `first_slot`, spilling over at most
    /// `delay + 1` consecutive slots.
    pub fn plan(&mut self, amount: Fixed64, first_slot: Ticks) -> Placement {
        self.plan_within(amount, first_slot, self.delay + 1)
    }

    /// Place `amount` starting at `first_slot`, spilling over at most `slots`
    /// consecutive slots.
    pub fn plan_within(&mut self, amount: Fixed64, first_slot: Ticks, slots: Ticks) -> Placement {
        let mut remaining = non_negative(amount);
        let mut placement = Placement::default();

        for slot in first_slot..first_slot + slots {
            if remaining == Fixed64::ZERO {
                break;
            }
            let room = self.room_at(slot);
            let take = remaining.min(room);
            if take > Fixed64::ZERO {
                *self.backlog.entry(slot).or_insert(Fixed64::ZERO) += take;
                placement.placed.push((slot, take));
                remaining -= take;
            }
        }

        placement.lost = remaining;
        placement
    }

    /// How much more `slot` can take without breaking either bound.
    pub fn room_at(&self, slot: Ticks) -> Fixed64 {
        let by_capacity = non_negative(self.capacity_per_tick - self.queued(slot));
        by_capacity.min(self.storage_headroom(slot))
    }

    /// Smallest free storage over all windows of `delay + 1` slots that
    /// contain `slot`.
    fn storage_headroom(&self, slot: Ticks) -> Fixed64 {
        let fullest = (slot.saturating_sub(self.delay)..=slot)
            .map(|start| self.window_sum(start))
            .max()
            .unwrap_or(Fixed64::ZERO);
        non_negative(self.storage_bound - fullest)
    }

    /// Total backlog over `[start, start + delay]`.
    pub fn window_sum(&self, start: Ticks) -> Fixed64 {
        self.backlog
            .range(start..=start + self.delay)
            .map(|(_, &amount)| amount)
            .sum()
    }

    /// Largest sum over any `delay + 1` window currently in the backlog.
    pub fn max_window_sum(&self) -> Fixed64 {
        self.backlog
            .keys()
            .map(|&slot| self.window_sum(slot))
            .max()
            .unwrap_or(Fixed64::ZERO)
    }

    /// Remove and return the amount queued for `slot`. A second call for the
    /// same slot returns zero.
    pub fn take(&mut self, slot: Ticks) -> Fixed64 {
        self.backlog.remove(&slot).unwrap_or(Fixed64::ZERO)
    }

    pub fn queued(&self, slot: Ticks) -> Fixed64 {
        self.backlog.get(&slot).copied().unwrap_or(Fixed64::ZERO)
    }

    /// Everything committed but not yet taken.
    pub fn total(&self) -> Fixed64 {
        self.backlog.values().copied().sum()
    }

    /// Backlog entries in slot order.
    pub fn backlog(&self) -> impl Iterator<Item = (Ticks, Fixed64)> + '_ {
        self.backlog.iter().map(|(&slot, &amount)| (slot, amount))
    }

    /// Backlog entries from `from` onwards.
    pub fn backlog_from(&self, from: Ticks) -> Vec<(Ticks, Fixed64)> {
        self.backlog
            .range(from..)
            .map(|(&slot, &amount)| (slot, amount))
            .collect()
    }
}
