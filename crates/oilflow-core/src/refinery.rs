//! Refineries: delayed, capacity-bounded crude processing.
//!
//! Crude entering a refinery is planned into processing slots keyed on the
//! processing tick, starting with the current one. When a slot's tick comes a
//! `Process` entry moves it into distillation, and a `Distill` entry fires
//! `processing_delay` ticks later to convert it into [`Products`].

use crate::event::{FlowEvent, LossCause};
use crate::fixed::{Fixed64, Ticks, non_negative};
use crate::id::{FacilityId, Side};
use crate::planner::SpillbackPlanner;
use crate::products::{Products, Yields};
use crate::query::RefinerySnapshot;
use crate::scheduler::{Action, Scheduler};
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
pub struct Refinery {
    side: Side,
    name: String,
    planner: SpillbackPlanner,
    yields: Yields,
    broken: bool,
    /// Slots that already have a `Process` entry on the agenda.
    scheduled: BTreeSet<Ticks>,
    /// Crude taken from the backlog, keyed by the tick it distills at.
    in_distillation: BTreeMap<Ticks, Fixed64>,
    received: Fixed64,
    lost: Fixed64,
    distilled: Fixed64,
    products: Products,
    refining_loss: Fixed64,
}

impl Refinery {
    pub fn new(
        side: Side,
        name: impl Into<String>,
        max_throughput: Fixed64,
        processing_delay: Ticks,
        storage_bound: Fixed64,
        yields: Yields,
    ) -> Self {
        Self {
            side,
            name: name.into(),
            planner: SpillbackPlanner::new(max_throughput, processing_delay, storage_bound),
            yields,
            broken: false,
            scheduled: BTreeSet::new(),
            in_distillation: BTreeMap::new(),
            received: Fixed64::ZERO,
            lost: Fixed64::ZERO,
            distilled: Fixed64::ZERO,
            products: Products::ZERO,
            refining_loss: Fixed64::ZERO,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_throughput(&self) -> Fixed64 {
        self.planner.capacity_per_tick()
    }

    pub fn processing_delay(&self) -> Ticks {
        self.planner.delay()
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Takes effect for the next `enter`. Scheduled distillations still run.
    pub fn set_broken(&mut self, broken: bool) {
        self.broken = broken;
    }

    /// Accept crude for processing. Returns the part that was lost.
    pub fn enter(&mut self, amount: Fixed64, sched: &mut Scheduler) -> Fixed64 {
        let now = sched.now();
        let amount = non_negative(amount);
        if amount == Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        self.received += amount;

        let (lost, cause) = if self.broken {
            (amount, LossCause::Broken)
        } else {
            let placement = self.planner.plan(amount, now);
            for &(slot, _) in &placement.placed {
                if self.scheduled.insert(slot) {
                    sched.schedule_at(slot, Action::Process { refinery: self.side });
                }
            }
            (placement.lost, LossCause::Saturated)
        };

        if lost > Fixed64::ZERO {
            warn!("[Refinery:{}] lost {} ({:?}) at tick {}", self.name, lost, cause, now);
            self.lost += lost;
            sched.emit(FlowEvent::OilLost {
                facility: FacilityId::Refinery(self.side),
                amount: lost,
                cause,
                tick: now,
            });
        }
        lost
    }

    /// Move the current tick's processing slot into distillation.
    pub fn process(&mut self, sched: &mut Scheduler) {
        let now = sched.now();
        self.scheduled.remove(&now);
        let amount = self.planner.take(now);
        if amount == Fixed64::ZERO {
            return;
        }
        let delay = self.planner.delay();
        debug!("[Refinery:{}] processing {} at tick {}", self.name, amount, now);
        *self.in_distillation.entry(now + delay).or_insert(Fixed64::ZERO) += amount;
        sched.schedule_at(
            now + delay,
            Action::Distill {
                refinery: self.side,
                amount,
            },
        );
    }

    /// Convert `amount` of crude into products.
    pub fn distill(&mut self, amount: Fixed64, sched: &mut Scheduler) -> Products {
        let now = sched.now();
        if let Some(pending) = self.in_distillation.get_mut(&now) {
            *pending -= amount;
            if *pending <= Fixed64::ZERO {
                self.in_distillation.remove(&now);
            }
        }
        let (products, loss) = self.yields.distill(amount);
        self.distilled += amount;
        self.products += products;
        self.refining_loss += loss;
        debug!(
            "[Refinery:{}] distilled {} into {:?} at tick {}",
            self.name, amount, products, now
        );
        sched.emit(FlowEvent::Distilled {
            refinery: self.side,
            crude: amount,
            products,
            tick: now,
        });
        products
    }

    /// Crude accepted but not yet distilled.
    pub fn in_flight(&self) -> Fixed64 {
        self.planner.total() + self.in_distillation.values().copied().sum::<Fixed64>()
    }

    pub fn received(&self) -> Fixed64 {
        self.received
    }

    pub fn lost(&self) -> Fixed64 {
        self.lost
    }

    /// Crude that has completed distillation.
    pub fn distilled(&self) -> Fixed64 {
        self.distilled
    }

    pub fn products(&self) -> Products {
        self.products
    }

    pub fn refining_loss(&self) -> Fixed64 {
        self.refining_loss
    }

    pub fn planner(&self) -> &SpillbackPlanner {
        &self.planner
    }

    pub fn snapshot(&self, now: Ticks) -> RefinerySnapshot {
        RefinerySnapshot {
            side: self.side,
            name: self.name.clone(),
            broken: self.broken,
            max_throughput: self.max_throughput(),
            processing_delay: self.processing_delay(),
            backlog: self.planner.backlog_from(now),
            in_distillation: self
                .in_distillation
                .iter()
                .map(|(&tick, &amount)| (tick, amount))
                .collect(),
            distilled: self.distilled,
            products: self.products,
            lost: self.lost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::f64_to_fixed64 as fixed;

    fn yields() -> Yields {
        Yields::new(fixed(0.19), fixed(0.42), fixed(0.13))
    }

    fn refinery(delay: Ticks) -> Refinery {
        Refinery::new(Side::First, "Kralupy", fixed(9.04), delay, fixed(100.0), yields())
    }

    /// Run every due agenda entry for this refinery, collecting products.
    fn drain(refinery: &mut Refinery, sched: &mut Scheduler) -> Products {
        let mut out = Products::ZERO;
        while let Some(action) = sched.pop_due() {
            match action {
                Action::Process { .. } => refinery.process(sched),
                Action::Distill { amount, .. } => out += refinery.distill(amount, sched),
                Action::Deliver { .. } => unreachable!(),
            }
        }
        out
    }

    #[test]
    fn zero_delay_distills_same_tick() {
        let mut sched = Scheduler::new(64);
        let mut refinery = refinery(0);
        assert_eq!(refinery.enter(fixed(5.0), &mut sched), Fixed64::ZERO);
        let products = drain(&mut refinery, &mut sched);
        assert_eq!(refinery.distilled(), fixed(5.0));
        assert_eq!(products, refinery.products());
        assert_eq!(products.total() + refinery.refining_loss(), fixed(5.0));
        assert_eq!(refinery.in_flight(), Fixed64::ZERO);
    }

    #[test]
    fn processing_delay_defers_distillation() {
        let mut sched = Scheduler::new(64);
        let mut refinery = refinery(2);
        let _ = refinery.enter(fixed(5.0), &mut sched);
        assert_eq!(drain(&mut refinery, &mut sched), Products::ZERO);
        assert_eq!(refinery.in_flight(), fixed(5.0));

        sched.advance_clock();
        assert_eq!(drain(&mut refinery, &mut sched), Products::ZERO);
        sched.advance_clock();
        let products = drain(&mut refinery, &mut sched);
        assert!(products.total() > Fixed64::ZERO);
        assert_eq!(refinery.in_flight(), Fixed64::ZERO);
    }

    #[test]
    fn excess_spills_to_next_processing_tick() {
        let mut sched = Scheduler::new(64);
        let mut refinery = refinery(1);
        assert_eq!(refinery.enter(fixed(12.0), &mut sched), Fixed64::ZERO);
        assert_eq!(refinery.planner().queued(0), fixed(9.04));
        assert_eq!(refinery.planner().queued(1), fixed(12.0) - fixed(9.04));
    }

    #[test]
    fn broken_refinery_loses_input_but_finishes_scheduled_work() {
        let mut sched = Scheduler::new(64);
        let mut refinery = refinery(1);
        let _ = refinery.enter(fixed(4.0), &mut sched);
        drain(&mut refinery, &mut sched);
        refinery.set_broken(true);
        assert_eq!(refinery.enter(fixed(3.0), &mut sched), fixed(3.0));
        assert_eq!(refinery.lost(), fixed(3.0));

        sched.advance_clock();
        drain(&mut refinery, &mut sched);
        assert_eq!(refinery.distilled(), fixed(4.0));
    }

    #[test]
    fn snapshot_reports_distillation_queue() {
        let mut sched = Scheduler::new(64);
        let mut refinery = refinery(2);
        let _ = refinery.enter(fixed(5.0), &mut sched);
        drain(&mut refinery, &mut sched);
        let snap = refinery.snapshot(0);
        assert_eq!(snap.in_distillation, vec![(2, fixed(5.0))]);
        assert!(snap.backlog.is_empty());
    }
}
