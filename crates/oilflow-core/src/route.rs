//! Crude supply routes.
//!
//! A [`SupplyRoute`] pairs a source, which emits its production target every
//! tick, with the [`TransportLink`] that carries the oil to the dispatcher.
//! Only the dispatcher changes the production target.

use crate::event::FlowEvent;
use crate::fixed::{Fixed64, non_negative};
use crate::id::{LinkId, Side};
use crate::query::LinkSnapshot;
use crate::scheduler::Scheduler;
use crate::transport::{Endpoint, TransportLink};
use log::debug;

#[derive(Debug, Clone)]
pub struct SupplyRoute {
    side: Side,
    production: Fixed64,
    max_production: Fixed64,
    link: TransportLink,
    produced: Fixed64,
}

impl SupplyRoute {
    /// The link's per-tick capacity is the route's maximum production.
    pub fn new(
        side: Side,
        name: impl Into<String>,
        max_production: Fixed64,
        initial_production: Fixed64,
        delay: u64,
        storage_bound: Fixed64,
    ) -> Self {
        Self {
            side,
            production: initial_production.clamp(Fixed64::ZERO, max_production),
            max_production,
            link: TransportLink::new(
                LinkId::Route(side),
                name,
                max_production,
                delay,
                storage_bound,
                Endpoint::Dispatcher,
            ),
            produced: Fixed64::ZERO,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn name(&self) -> &str {
        self.link.name()
    }

    pub fn production(&self) -> Fixed64 {
        self.production
    }

    pub fn max_production(&self) -> Fixed64 {
        self.max_production
    }

    /// Set the production target, clamped to `[0, max_production]`.
    pub fn set_production(&mut self, target: Fixed64) {
        self.production = non_negative(target).min(self.max_production);
    }

    pub fn link(&self) -> &TransportLink {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut TransportLink {
        &mut self.link
    }

    pub fn is_broken(&self) -> bool {
        self.link.is_broken()
    }

    /// Fill the link as if the route had been producing at its current target
    /// before tick 0. Primed oil counts as produced.
    pub fn prime(&mut self, sched: &mut Scheduler) {
        let slots = Fixed64::from_num(self.link.delay());
        self.produced += self.production * slots;
        let _ = self.link.prime(self.production, sched);
    }

    /// Emit this tick's production into the link.
    pub fn produce(&mut self, sched: &mut Scheduler) {
        let amount = self.production;
        self.produced += amount;
        debug!("[Route:{}] produced {} at tick {}", self.name(), amount, sched.now());
        sched.emit(FlowEvent::Produced {
            route: self.side,
            amount,
            tick: sched.now(),
        });
        let _ = self.link.send(amount, sched);
    }

    /// Everything this route has put into the network.
    pub fn produced(&self) -> Fixed64 {
        self.produced
    }

    pub fn snapshot(&self, now: u64) -> LinkSnapshot {
        self.link.snapshot(now, Some(self.production))
    }
}
