//! Delay- and capacity-bounded transport links.
//!
//! A [`TransportLink`] carries crude from one stage to the next. Oil sent at
//! tick `t` is planned into the slot `t + delay` and spilled into later slots
//! when that slot is full (see [`SpillbackPlanner`]). Each slot is delivered
//! exactly once, by a `Deliver` entry on the agenda, to the link's
//! [`Endpoint`].
//!
//! The link guarantees one delivery per sent tick, even when the slot is
//! empty. Supply routes send every tick, so the dispatcher sees a steady
//! cadence of two deliveries per tick.

use crate::event::{FlowEvent, LossCause};
use crate::fixed::{Fixed64, Ticks, non_negative};
use crate::id::{FacilityId, LinkId, Side};
use crate::planner::SpillbackPlanner;
use crate::query::LinkSnapshot;
use crate::scheduler::{Action, Scheduler};
use log::{debug, warn};
use std::collections::BTreeSet;

/// Where a link's deliveries go. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// The central dispatcher's intake.
    Dispatcher,
    /// A refinery's processing intake.
    Refinery(Side),
}

#[derive(Debug, Clone)]
pub struct TransportLink {
    id: LinkId,
    name: String,
    planner: SpillbackPlanner,
    endpoint: Endpoint,
    broken: bool,
    /// Slots that already have a `Deliver` entry on the agenda.
    scheduled: BTreeSet<Ticks>,
    received: Fixed64,
    delivered: Fixed64,
    lost: Fixed64,
}

impl TransportLink {
    pub fn new(
        id: LinkId,
        name: impl Into<String>,
        capacity_per_tick: Fixed64,
        delay: Ticks,
        storage_bound: Fixed64,
        endpoint: Endpoint,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            planner: SpillbackPlanner::new(capacity_per_tick, delay, storage_bound),
            endpoint,
            broken: false,
            scheduled: BTreeSet::new(),
            received: Fixed64::ZERO,
            delivered: Fixed64::ZERO,
            lost: Fixed64::ZERO,
        }
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn delay(&self) -> Ticks {
        self.planner.delay()
    }

    pub fn capacity(&self) -> Fixed64 {
        self.planner.capacity_per_tick()
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Takes effect for the next `send`. Oil already in the backlog is still
    /// delivered.
    pub fn set_broken(&mut self, broken: bool) {
        self.broken = broken;
    }

    /// Offer `amount` for delivery at `now + delay`. Returns the part that
    /// was lost, either because the link is broken or because the window is
    /// saturated.
    pub fn send(&mut self, amount: Fixed64, sched: &mut Scheduler) -> Fixed64 {
        let now = sched.now();
        let amount = non_negative(amount);
        let arrival = now + self.planner.delay();
        self.received += amount;

        let (lost, cause) = if self.broken {
            (amount, LossCause::Broken)
        } else {
            let placement = self.planner.plan(amount, arrival);
            for &(slot, _) in &placement.placed {
                self.ensure_delivery(slot, sched);
            }
            (placement.lost, LossCause::Saturated)
        };
        self.ensure_delivery(arrival, sched);

        if lost > Fixed64::ZERO {
            warn!("[Link:{}] lost {} ({:?}) at tick {}", self.name, lost, cause, now);
            self.lost += lost;
            sched.emit(FlowEvent::OilLost {
                facility: FacilityId::from(self.id),
                amount: lost,
                cause,
                tick: now,
            });
        }
        lost
    }

    /// Pre-fill the slots `[now, now + delay)` with `amount` each, as if the
    /// link had been running before the simulation started. Returns the part
    /// that did not fit.
    pub fn prime(&mut self, amount: Fixed64, sched: &mut Scheduler) -> Fixed64 {
        let now = sched.now();
        let amount = non_negative(amount);
        let mut lost = Fixed64::ZERO;
        for slot in now..now + self.planner.delay() {
            self.received += amount;
            lost += self.planner.plan_within(amount, slot, 1).lost;
            self.ensure_delivery(slot, sched);
        }
        if lost > Fixed64::ZERO {
            warn!("[Link:{}] priming lost {}", self.name, lost);
            self.lost += lost;
            sched.emit(FlowEvent::OilLost {
                facility: FacilityId::from(self.id),
                amount: lost,
                cause: LossCause::Saturated,
                tick: now,
            });
        }
        lost
    }

    fn ensure_delivery(&mut self, slot: Ticks, sched: &mut Scheduler) {
        if self.scheduled.insert(slot) {
            sched.schedule_at(slot, Action::Deliver { link: self.id });
        }
    }

    /// Clear the slot for the current tick and return what it held, together
    /// with where it goes.
    pub fn deliver(&mut self, sched: &mut Scheduler) -> (Endpoint, Fixed64) {
        let now = sched.now();
        self.scheduled.remove(&now);
        let amount = self.planner.take(now);
        self.delivered += amount;
        debug!("[Link:{}] delivered {} at tick {}", self.name, amount, now);
        sched.emit(FlowEvent::Delivered {
            link: self.id,
            amount,
            tick: now,
        });
        (self.endpoint, amount)
    }

    /// Oil accepted but not yet delivered.
    pub fn in_transit(&self) -> Fixed64 {
        self.planner.total()
    }

    pub fn received(&self) -> Fixed64 {
        self.received
    }

    pub fn delivered(&self) -> Fixed64 {
        self.delivered
    }

    pub fn lost(&self) -> Fixed64 {
        self.lost
    }

    pub fn planner(&self) -> &SpillbackPlanner {
        &self.planner
    }

    pub fn snapshot(&self, now: Ticks, production: Option<Fixed64>) -> LinkSnapshot {
        LinkSnapshot {
            id: self.id,
            name: self.name.clone(),
            broken: self.broken,
            capacity: self.planner.capacity_per_tick(),
            delay: self.planner.delay(),
            production,
            backlog: self.planner.backlog_from(now),
            in_transit: self.in_transit(),
            delivered: self.delivered,
            lost: self.lost,
        }
    }
}
