//! The central dispatcher.
//!
//! The dispatcher owns the two supply routes, the two refineries, the
//! internal hop and the reserve. Each tick it receives one delivery per
//! supply route. The second delivery triggers dispatch:
//!
//! 1. Recompute input and output ratios from the broken flags (failover).
//! 2. Compare the oil received with the crude-equivalent of product demand.
//!    A shortfall is drawn from the reserve. A surplus tops the reserve up
//!    towards its regulatory floor.
//! 3. Split the oil between the refineries by output ratio, clamping each
//!    share to the refinery's throughput. Whatever is clamped off, plus any
//!    rounding residue, is overflow and goes to the reserve. What the reserve
//!    cannot take is lost.
//! 4. Compute the total crude need for the next tick and set the production
//!    targets of both routes from it.

use crate::config::SimConfig;
use crate::event::{FlowEvent, LossCause};
use crate::fixed::{Fixed64, Ticks, f64_to_fixed64, non_negative};
use crate::id::{FacilityId, LinkId, Pair, Side};
use crate::products::{Products, Yields};
use crate::query::DispatcherSnapshot;
use crate::refinery::Refinery;
use crate::reserve::Reserve;
use crate::route::SupplyRoute;
use crate::scheduler::Scheduler;
use crate::transport::{Endpoint, TransportLink};
use log::{debug, warn};

// ---------------------------------------------------------------------------
// Ratios and targets
// ---------------------------------------------------------------------------

/// Routing ratios after failover: nominal when both peers are up, 0/1 when
/// exactly one is broken, 0/0 when both are.
pub fn failover_ratios(nominal: Pair<Fixed64>, broken: Pair<bool>) -> Pair<Fixed64> {
    match (broken.first, broken.second) {
        (false, false) => nominal,
        (true, false) => Pair::new(Fixed64::ZERO, Fixed64::ONE),
        (false, true) => Pair::new(Fixed64::ONE, Fixed64::ZERO),
        (true, true) => Pair::splat(Fixed64::ZERO),
    }
}

/// Split `need` by `ratios`, clamp each share to its maximum and shift the
/// excess to the peer when the peer has a non-zero ratio.
pub fn balance_targets(need: Fixed64, ratios: Pair<Fixed64>, maxes: Pair<Fixed64>) -> Pair<Fixed64> {
    let need = non_negative(need);
    let raw = Pair::new(need * ratios.first, need * ratios.second);
    let clamped = Pair::new(raw.first.min(maxes.first), raw.second.min(maxes.second));
    let mut targets = clamped;
    for side in Side::BOTH {
        let peer = side.peer();
        let excess = raw[side] - clamped[side];
        if excess > Fixed64::ZERO && ratios[peer] > Fixed64::ZERO {
            targets[peer] = (targets[peer] + excess).min(maxes[peer]);
        }
    }
    targets
}

// ---------------------------------------------------------------------------
// Counters and outcomes
// ---------------------------------------------------------------------------

/// Cumulative dispatcher totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchCounters {
    /// Oil delivered by the supply routes.
    pub received: Fixed64,
    /// Oil drawn from the reserve to cover shortfalls.
    pub drawn: Fixed64,
    /// Surplus pushed to the reserve towards its floor.
    pub stored: Fixed64,
    /// Oil sent on to each refinery.
    pub routed: Pair<Fixed64>,
    /// Oil that could not be routed to a refinery.
    pub overflow: Fixed64,
    /// Overflow the reserve absorbed.
    pub overflow_stored: Fixed64,
    /// Overflow the reserve could not absorb.
    pub lost: Fixed64,
    pub dispatches: u64,
    /// Ticks that did not see exactly two deliveries.
    pub irregular_ticks: u64,
}

/// What a single dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub tick: Ticks,
    /// Oil received from the supply routes.
    pub intake: Fixed64,
    /// Crude-equivalent of the product demand.
    pub demand_oil: Fixed64,
    pub drawn: Fixed64,
    pub stored: Fixed64,
    pub routed: Pair<Fixed64>,
    pub overflow: Fixed64,
    pub lost: Fixed64,
    /// Crude requested from the routes for the next tick.
    pub total_need: Fixed64,
    pub targets: Pair<Fixed64>,
    pub input_ratios: Pair<Fixed64>,
    pub output_ratios: Pair<Fixed64>,
}

/// The dispatcher's view of a finished tick.
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeSummary {
    pub deliveries: u32,
    pub outcomes: Vec<DispatchOutcome>,
}

impl IntakeSummary {
    pub fn is_irregular(&self) -> bool {
        self.deliveries != 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intake {
    AwaitingFirst,
    AwaitingSecond { first: Fixed64 },
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Dispatcher {
    routes: Pair<SupplyRoute>,
    refineries: Pair<Refinery>,
    hop: TransportLink,
    hop_target: Side,
    reserve: Reserve,
    yields: Yields,
    epsilon: Fixed64,
    nominal_input: Pair<Fixed64>,
    nominal_output: Pair<Fixed64>,
    input_ratios: Pair<Fixed64>,
    output_ratios: Pair<Fixed64>,
    intake: Intake,
    deliveries_this_tick: u32,
    outcomes_this_tick: Vec<DispatchOutcome>,
    counters: DispatchCounters,
    last_outcome: Option<DispatchOutcome>,
}

impl Dispatcher {
    /// Build the network described by `config`. The configuration is assumed
    /// to be validated.
    pub fn from_config(config: &SimConfig) -> Self {
        let storage_bound = f64_to_fixed64(config.storage_bound);
        let yields = config.yields.to_yields();

        let routes = Pair::new(Side::First, Side::Second).map(|side| {
            let route = &config.routes[side];
            SupplyRoute::new(
                side,
                route.name.clone(),
                f64_to_fixed64(route.max_production),
                f64_to_fixed64(route.initial_production),
                u64::from(route.delay),
                storage_bound,
            )
        });
        let refineries = Pair::new(Side::First, Side::Second).map(|side| {
            let refinery = &config.refineries[side];
            Refinery::new(
                side,
                refinery.name.clone(),
                f64_to_fixed64(refinery.max_throughput),
                u64::from(refinery.processing_delay),
                storage_bound,
                yields,
            )
        });
        let hop = TransportLink::new(
            LinkId::Hop,
            config.hop.name.clone(),
            f64_to_fixed64(config.hop.capacity),
            u64::from(config.hop.delay),
            storage_bound,
            Endpoint::Refinery(config.hop.target),
        );

        let epsilon = config.epsilon_fixed();
        let mut reserve = Reserve::new(
            config.reserve.name.clone(),
            f64_to_fixed64(config.reserve.capacity),
            f64_to_fixed64(config.reserve.regulatory_floor),
            epsilon,
        );
        if let Some(level) = config.reserve.initial_level {
            reserve = reserve.with_level(f64_to_fixed64(level));
        }

        let nominal_input = Pair::new(
            f64_to_fixed64(config.routes.first.nominal_ratio),
            f64_to_fixed64(config.routes.second.nominal_ratio),
        );
        let nominal_output = Pair::new(
            f64_to_fixed64(config.refineries.first.nominal_ratio),
            f64_to_fixed64(config.refineries.second.nominal_ratio),
        );

        Self {
            routes,
            refineries,
            hop,
            hop_target: config.hop.target,
            reserve,
            yields,
            epsilon,
            nominal_input,
            nominal_output,
            input_ratios: nominal_input,
            output_ratios: nominal_output,
            intake: Intake::AwaitingFirst,
            deliveries_this_tick: 0,
            outcomes_this_tick: Vec::new(),
            counters: DispatchCounters::default(),
            last_outcome: None,
        }
    }

    // -- Accessors --

    pub fn route(&self, side: Side) -> &SupplyRoute {
        &self.routes[side]
    }

    pub fn route_mut(&mut self, side: Side) -> &mut SupplyRoute {
        &mut self.routes[side]
    }

    pub fn refinery(&self, side: Side) -> &Refinery {
        &self.refineries[side]
    }

    pub fn refinery_mut(&mut self, side: Side) -> &mut Refinery {
        &mut self.refineries[side]
    }

    pub fn hop(&self) -> &TransportLink {
        &self.hop
    }

    pub fn hop_target(&self) -> Side {
        self.hop_target
    }

    pub fn reserve(&self) -> &Reserve {
        &self.reserve
    }

    pub fn reserve_mut(&mut self) -> &mut Reserve {
        &mut self.reserve
    }

    pub fn yields(&self) -> &Yields {
        &self.yields
    }

    pub fn link(&self, id: LinkId) -> &TransportLink {
        match id {
            LinkId::Route(side) => self.routes[side].link(),
            LinkId::Hop => &self.hop,
        }
    }

    pub fn link_mut(&mut self, id: LinkId) -> &mut TransportLink {
        match id {
            LinkId::Route(side) => self.routes[side].link_mut(),
            LinkId::Hop => &mut self.hop,
        }
    }

    pub fn input_ratios(&self) -> Pair<Fixed64> {
        self.input_ratios
    }

    pub fn output_ratios(&self) -> Pair<Fixed64> {
        self.output_ratios
    }

    pub fn counters(&self) -> DispatchCounters {
        self.counters
    }

    pub fn last_outcome(&self) -> Option<DispatchOutcome> {
        self.last_outcome
    }

    /// Whether the facility is currently marked broken. Only routes and
    /// refineries can break.
    pub fn is_broken(&self, facility: FacilityId) -> bool {
        match facility {
            FacilityId::Route(side) => self.routes[side].is_broken(),
            FacilityId::Refinery(side) => self.refineries[side].is_broken(),
            FacilityId::Hop | FacilityId::Reserve => false,
        }
    }

    /// Combined throughput of the refineries that are not broken.
    pub fn healthy_throughput(&self) -> Fixed64 {
        self.refineries
            .iter()
            .filter(|(_, refinery)| !refinery.is_broken())
            .map(|(_, refinery)| refinery.max_throughput())
            .sum()
    }

    /// Oil held by the dispatcher, links and refineries.
    pub fn in_flight(&self) -> Fixed64 {
        let pending = match self.intake {
            Intake::AwaitingFirst => Fixed64::ZERO,
            Intake::AwaitingSecond { first } => first,
        };
        pending
            + self.routes.first.link().in_transit()
            + self.routes.second.link().in_transit()
            + self.hop.in_transit()
            + self.refineries.first.in_flight()
            + self.refineries.second.in_flight()
    }

    // -- Start-up --

    /// Pre-fill both supply links with their initial production.
    pub fn prime(&mut self, sched: &mut Scheduler) {
        for side in Side::BOTH {
            self.routes[side].prime(sched);
        }
    }

    // -- Intake --

    /// Receive one supply-route delivery. The second call in a tick runs
    /// dispatch and returns its outcome.
    pub fn enter(
        &mut self,
        amount: Fixed64,
        demand: &Products,
        sched: &mut Scheduler,
    ) -> Option<DispatchOutcome> {
        let amount = non_negative(amount);
        self.deliveries_this_tick += 1;
        self.counters.received += amount;
        match self.intake {
            Intake::AwaitingFirst => {
                self.intake = Intake::AwaitingSecond { first: amount };
                None
            }
            Intake::AwaitingSecond { first } => {
                self.intake = Intake::AwaitingFirst;
                Some(self.dispatch(first + amount, demand, sched))
            }
        }
    }

    /// End-of-tick bookkeeping. A delivery still waiting for its partner is
    /// dispatched alone, and a tick without exactly two deliveries is counted
    /// as irregular.
    pub fn close_tick(&mut self, demand: &Products, sched: &mut Scheduler) -> IntakeSummary {
        if let Intake::AwaitingSecond { first } = self.intake {
            self.intake = Intake::AwaitingFirst;
            let _ = self.dispatch(first, demand, sched);
        }

        let summary = IntakeSummary {
            deliveries: std::mem::take(&mut self.deliveries_this_tick),
            outcomes: std::mem::take(&mut self.outcomes_this_tick),
        };
        if summary.is_irregular() {
            self.counters.irregular_ticks += 1;
            warn!(
                "[Dispatcher] {} deliveries at tick {} (expected 2)",
                summary.deliveries,
                sched.now()
            );
            sched.emit(FlowEvent::IrregularIntake {
                deliveries: summary.deliveries,
                tick: sched.now(),
            });
        }
        summary
    }

    // -- Dispatch --

    fn dispatch(&mut self, oil: Fixed64, demand: &Products, sched: &mut Scheduler) -> DispatchOutcome {
        let now = sched.now();
        self.input_ratios = failover_ratios(
            self.nominal_input,
            Pair::new(self.routes.first.is_broken(), self.routes.second.is_broken()),
        );
        self.output_ratios = failover_ratios(
            self.nominal_output,
            Pair::new(self.refineries.first.is_broken(), self.refineries.second.is_broken()),
        );

        let intake = oil;
        let demand_oil = self.yields.crude_equivalent(demand);
        let healthy = self.healthy_throughput();
        let mut oil = oil;
        let mut drawn = Fixed64::ZERO;
        let mut stored = Fixed64::ZERO;

        if oil < demand_oil - self.epsilon {
            let requested = non_negative(demand_oil.min(healthy) - oil);
            drawn = self.reserve.request(requested, now);
            oil += drawn;
            if drawn > Fixed64::ZERO {
                sched.emit(FlowEvent::ReserveDrawn {
                    requested,
                    granted: drawn,
                    tick: now,
                });
            }
        } else {
            let push = self.reserve.missing().min(non_negative(oil - demand_oil));
            let returned = self.reserve.send(push, now);
            stored = push - returned;
            oil -= stored;
            if stored > Fixed64::ZERO {
                sched.emit(FlowEvent::ReserveFilled {
                    amount: stored,
                    tick: now,
                });
            }
        }

        let (routed, overflow) = self.split(oil);
        for side in Side::BOTH {
            if side == self.hop_target {
                let _ = self.hop.send(routed[side], sched);
            } else {
                let _ = self.refineries[side].enter(routed[side], sched);
            }
        }

        let lost = self.reserve.send(overflow, now);
        let overflow_stored = overflow - lost;
        if overflow_stored > Fixed64::ZERO {
            sched.emit(FlowEvent::ReserveFilled {
                amount: overflow_stored,
                tick: now,
            });
        }
        if lost > Fixed64::ZERO {
            warn!("[Dispatcher] reserve full, lost {} at tick {}", lost, now);
            sched.emit(FlowEvent::OilLost {
                facility: FacilityId::Reserve,
                amount: lost,
                cause: LossCause::ReserveFull,
                tick: now,
            });
        }

        let total_need = demand_oil.min(healthy) + self.reserve.missing();
        let maxes = Pair::new(
            self.routes.first.max_production(),
            self.routes.second.max_production(),
        );
        let targets = balance_targets(total_need, self.input_ratios, maxes);
        for side in Side::BOTH {
            self.routes[side].set_production(targets[side]);
        }
        sched.emit(FlowEvent::TargetsSet { targets, tick: now });
        sched.emit(FlowEvent::Dispatched {
            oil: intake,
            demand_oil,
            routed,
            tick: now,
        });
        debug!(
            "[Dispatcher] tick {}: intake {} demand {} drawn {} stored {} routed {}/{} overflow {} need {}",
            now, intake, demand_oil, drawn, stored, routed.first, routed.second, overflow, total_need
        );

        self.counters.drawn += drawn;
        self.counters.stored += stored;
        self.counters.routed.first += routed.first;
        self.counters.routed.second += routed.second;
        self.counters.overflow += overflow;
        self.counters.overflow_stored += overflow_stored;
        self.counters.lost += lost;
        self.counters.dispatches += 1;

        let outcome = DispatchOutcome {
            tick: now,
            intake,
            demand_oil,
            drawn,
            stored,
            routed,
            overflow,
            lost,
            total_need,
            targets,
            input_ratios: self.input_ratios,
            output_ratios: self.output_ratios,
        };
        self.outcomes_this_tick.push(outcome);
        self.last_outcome = Some(outcome);
        outcome
    }

    /// Split `oil` by output ratio. Returns the per-refinery shares and the
    /// overflow: the clamped-off parts plus the rounding residue.
    fn split(&self, oil: Fixed64) -> (Pair<Fixed64>, Fixed64) {
        let ratios = self.output_ratios;
        let first = oil * ratios.first;
        let mut second = oil * ratios.second;
        if first + second > oil {
            second = non_negative(oil - first);
        }
        let mut overflow = oil - first - second;
        let mut routed = Pair::new(first, second);
        for side in Side::BOTH {
            let max = self.refineries[side].max_throughput();
            if routed[side] > max {
                overflow += routed[side] - max;
                routed[side] = max;
            }
        }
        (routed, overflow)
    }

    pub fn snapshot(&self) -> DispatcherSnapshot {
        DispatcherSnapshot {
            input_ratios: self.input_ratios,
            output_ratios: self.output_ratios,
            counters: self.counters,
            last_outcome: self.last_outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::f64_to_fixed64 as fixed;

    fn setup() -> (Dispatcher, Scheduler) {
        (Dispatcher::from_config(&SimConfig::default()), Scheduler::new(256))
    }

    fn full_demand() -> Products {
        Products::new(fixed(4.38), fixed(12.96), fixed(1.21))
    }

    fn dispatch(d: &mut Dispatcher, sched: &mut Scheduler, a: f64, b: f64, demand: &Products) -> DispatchOutcome {
        assert!(d.enter(fixed(a), demand, sched).is_none());
        d.enter(fixed(b), demand, sched).unwrap()
    }

    #[test]
    fn failover_ratios_follow_broken_flags() {
        let nominal = Pair::new(fixed(0.4), fixed(0.6));
        assert_eq!(failover_ratios(nominal, Pair::new(false, false)), nominal);
        assert_eq!(
            failover_ratios(nominal, Pair::new(true, false)),
            Pair::new(Fixed64::ZERO, Fixed64::ONE)
        );
        assert_eq!(
            failover_ratios(nominal, Pair::new(false, true)),
            Pair::new(Fixed64::ONE, Fixed64::ZERO)
        );
        assert_eq!(
            failover_ratios(nominal, Pair::new(true, true)),
            Pair::splat(Fixed64::ZERO)
        );
    }

    #[test]
    fn balance_shifts_excess_to_peer() {
        let targets = balance_targets(
            fixed(40.0),
            Pair::new(fixed(0.75), fixed(0.25)),
            Pair::new(fixed(24.66), fixed(27.4)),
        );
        assert_eq!(targets.first, fixed(24.66));
        assert_eq!(targets.second, fixed(10.0) + (fixed(30.0) - fixed(24.66)));
    }

    #[test]
    fn balance_never_shifts_to_zero_ratio_peer() {
        let targets = balance_targets(
            fixed(40.0),
            Pair::new(Fixed64::ONE, Fixed64::ZERO),
            Pair::new(fixed(24.66), fixed(27.4)),
        );
        assert_eq!(targets, Pair::new(fixed(24.66), Fixed64::ZERO));
    }

    #[test]
    fn balance_clamps_both_when_need_exceeds_total() {
        let targets = balance_targets(
            fixed(100.0),
            Pair::new(fixed(0.5), fixed(0.5)),
            Pair::new(fixed(24.66), fixed(27.4)),
        );
        assert_eq!(targets, Pair::new(fixed(24.66), fixed(27.4)));
    }

    #[test]
    fn first_delivery_only_records() {
        let (mut d, mut sched) = setup();
        assert!(d.enter(fixed(10.0), &full_demand(), &mut sched).is_none());
        assert_eq!(d.in_flight(), fixed(10.0));
        assert_eq!(d.counters().dispatches, 0);
    }

    #[test]
    fn shortfall_draws_from_reserve_up_to_healthy_throughput() {
        let (mut d, mut sched) = setup();
        let before = d.reserve().level();
        let outcome = dispatch(&mut d, &mut sched, 5.0, 5.0, &full_demand());

        let healthy = fixed(9.04) + fixed(14.79);
        assert_eq!(outcome.drawn, healthy - fixed(10.0));
        assert_eq!(d.reserve().level(), before - outcome.drawn);
        assert_eq!(
            outcome.routed.first + outcome.routed.second + outcome.overflow,
            healthy
        );
    }

    #[test]
    fn surplus_tops_up_reserve_to_floor() {
        let (mut d, mut sched) = setup();
        let reserve = d.reserve().clone().with_level(fixed(850.0));
        *d.reserve_mut() = reserve;
        let outcome = dispatch(&mut d, &mut sched, 10.0, 10.0, &Products::ZERO);
        assert_eq!(outcome.stored, fixed(20.0));
        assert_eq!(outcome.routed, Pair::splat(Fixed64::ZERO));
        assert_eq!(d.reserve().level(), fixed(870.0));
        // Next tick asks for the rest of the deficit.
        assert_eq!(outcome.total_need, fixed(30.0));
    }

    #[test]
    fn both_refineries_broken_with_full_reserve_loses_everything() {
        let (mut d, mut sched) = setup();
        d.refinery_mut(Side::First).set_broken(true);
        d.refinery_mut(Side::Second).set_broken(true);
        let outcome = dispatch(&mut d, &mut sched, 12.0, 8.0, &full_demand());
        assert_eq!(outcome.output_ratios, Pair::splat(Fixed64::ZERO));
        assert_eq!(outcome.drawn, Fixed64::ZERO);
        assert_eq!(outcome.overflow, fixed(20.0));
        assert_eq!(outcome.lost, fixed(20.0));
        assert_eq!(d.counters().lost, fixed(20.0));
    }

    #[test]
    fn both_refineries_broken_overflow_goes_to_reserve() {
        let (mut d, mut sched) = setup();
        let reserve = d.reserve().clone().with_level(fixed(1000.0));
        *d.reserve_mut() = reserve;
        d.refinery_mut(Side::First).set_broken(true);
        d.refinery_mut(Side::Second).set_broken(true);
        let outcome = dispatch(&mut d, &mut sched, 12.0, 8.0, &full_demand());
        assert_eq!(outcome.overflow, fixed(20.0));
        assert_eq!(outcome.lost, Fixed64::ZERO);
        assert_eq!(d.reserve().level(), fixed(1020.0));
    }

    #[test]
    fn broken_refinery_fails_over_to_peer() {
        let (mut d, mut sched) = setup();
        d.refinery_mut(Side::First).set_broken(true);
        let outcome = dispatch(&mut d, &mut sched, 4.0, 4.0, &Products::ZERO);
        assert_eq!(outcome.output_ratios, Pair::new(Fixed64::ZERO, Fixed64::ONE));
        assert_eq!(outcome.routed, Pair::new(Fixed64::ZERO, fixed(8.0)));
        // The second refinery is fed through the hop.
        assert_eq!(d.hop().in_transit(), fixed(8.0));
    }

    #[test]
    fn broken_route_moves_target_to_peer() {
        let (mut d, mut sched) = setup();
        d.route_mut(Side::Second).link_mut().set_broken(true);
        let outcome = dispatch(&mut d, &mut sched, 10.0, 10.0, &full_demand());
        assert_eq!(outcome.input_ratios, Pair::new(Fixed64::ONE, Fixed64::ZERO));
        assert_eq!(d.route(Side::Second).production(), Fixed64::ZERO);
        assert_eq!(d.route(Side::First).production(), fixed(24.66).min(outcome.total_need));
    }

    #[test]
    fn split_is_clamped_and_conserved() {
        let (mut d, mut sched) = setup();
        let outcome = dispatch(&mut d, &mut sched, 20.0, 20.0, &Products::ZERO);
        assert_eq!(outcome.routed.first, fixed(9.04));
        assert_eq!(outcome.routed.second, fixed(14.79));
        assert_eq!(
            outcome.routed.first + outcome.routed.second + outcome.overflow + outcome.stored,
            fixed(40.0)
        );
    }

    #[test]
    fn close_tick_flushes_lone_delivery() {
        let (mut d, mut sched) = setup();
        assert!(d.enter(fixed(6.0), &Products::ZERO, &mut sched).is_none());
        let summary = d.close_tick(&Products::ZERO, &mut sched);
        assert_eq!(summary.deliveries, 1);
        assert!(summary.is_irregular());
        assert_eq!(summary.outcomes.len(), 1);
        assert_eq!(summary.outcomes[0].intake, fixed(6.0));
        assert_eq!(d.counters().irregular_ticks, 1);
        assert_eq!(d.in_flight(), d.hop().in_transit() + d.refinery(Side::First).in_flight());
    }

    #[test]
    fn regular_tick_is_not_flagged() {
        let (mut d, mut sched) = setup();
        let _ = dispatch(&mut d, &mut sched, 6.0, 6.0, &Products::ZERO);
        let summary = d.close_tick(&Products::ZERO, &mut sched);
        assert!(!summary.is_irregular());
        assert_eq!(summary.outcomes.len(), 1);
        assert_eq!(d.counters().irregular_ticks, 0);
    }
}
