//! The simulation engine: owns the network and runs the tick pipeline.
//!
//! # Tick pipeline
//!
//! Each tick runs these phases in order:
//!
//! 1. **Console** -- the console holds the permit. Queued and interactive
//!    operator commands are applied. Advancing releases the permit.
//! 2. **Sources** -- each supply route emits its production target.
//! 3. **Agenda** -- every entry due this tick runs, in `(tick, sequence)`
//!    order, each under the permit: deliveries, processing, distillation.
//! 4. **Close** -- the dispatcher settles the tick's intake and any work it
//!    scheduled for the same tick is drained.
//! 5. **Resolve** -- products are compared with demand and a [`TickReport`]
//!    is produced.
//! 6. **Bookkeeping** -- the clock advances.

use crate::command_queue::{Command, CommandQueue};
use crate::config::{MAX_QUANTITY, SimConfig};
use crate::dispatcher::Dispatcher;
use crate::error::SimError;
use crate::event::{EventLog, FlowEvent};
use crate::fixed::{Fixed64, Ticks};
use crate::hash::StateHash;
use crate::id::{Commodity, FacilityId, LinkId, Pair, Side};
use crate::products::Products;
use crate::query::{FacilityQuery, FacilitySnapshot, Status, SystemSnapshot};
use crate::report::{FlowLedger, TickReport, days_of_cover, resolve_residual};
use crate::scheduler::{Action, PermitHolder, Scheduler};
use crate::transport::Endpoint;
use log::{debug, info, warn};

// ---------------------------------------------------------------------------
// Command outcome
// ---------------------------------------------------------------------------

/// What executing a [`Command`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// State was changed.
    Applied,
    /// Answer to a status query.
    Status(Status),
    /// A tick ran.
    Advanced(Box<TickReport>),
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    sched: Scheduler,
    dispatcher: Dispatcher,
    demand: Products,
    import: Products,
    epsilon: Fixed64,
    commands: CommandQueue,
    names: Vec<(String, FacilityId)>,
    reserve_initial: Fixed64,
    last_report: Option<TickReport>,
}

impl Simulation {
    /// Validate `config`, build the network and prime the supply links.
    pub fn new(config: &SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let mut sched = Scheduler::new(config.event_capacity);
        let mut dispatcher = Dispatcher::from_config(config);
        dispatcher.prime(&mut sched);
        let reserve_initial = dispatcher.reserve().level();

        info!(
            "[Simulation] built network: routes {}/{}, refineries {}/{}, reserve {}",
            config.routes.first.name,
            config.routes.second.name,
            config.refineries.first.name,
            config.refineries.second.name,
            config.reserve.name
        );

        Ok(Self {
            config: config.clone(),
            sched,
            dispatcher,
            demand: config.demand.to_products(),
            import: config.import.to_products(),
            epsilon: config.epsilon_fixed(),
            commands: CommandQueue::with_max_history(config.command_history),
            names: config.facility_names(),
            reserve_initial,
            last_report: None,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The tick the next `step` will run.
    pub fn tick(&self) -> Ticks {
        self.sched.now()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.sched
    }

    pub fn events(&self) -> &EventLog {
        self.sched.events()
    }

    pub fn clear_events(&mut self) {
        self.sched.events_mut().clear();
    }

    pub fn demand(&self) -> Products {
        self.demand
    }

    pub fn import(&self) -> Products {
        self.import
    }

    /// Demand not covered by imports; what the refineries must produce.
    pub fn production_demand(&self) -> Products {
        self.demand.excess_over(&self.import)
    }

    pub fn commands(&self) -> &CommandQueue {
        &self.commands
    }

    pub fn last_report(&self) -> Option<&TickReport> {
        self.last_report.as_ref()
    }

    /// Resolve a facility by name or alias, ignoring case.
    pub fn facility_by_name(&self, name: &str) -> Option<FacilityId> {
        let name = name.to_lowercase();
        self.names
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|&(_, id)| id)
    }

    pub fn is_broken(&self, facility: FacilityId) -> bool {
        self.dispatcher.is_broken(facility)
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Queue a command for the console phase of the next `step`. Commands
    /// are checked now, so a queued command never fails later.
    pub fn submit(&mut self, command: Command) -> Result<(), SimError> {
        if command == Command::AdvanceTick {
            return Err(SimError::AdvanceFromConsole);
        }
        check(&command)?;
        self.commands.push(command);
        Ok(())
    }

    /// Open the console for the current tick. The session holds the permit
    /// until it advances or is dropped.
    pub fn console(&mut self) -> Result<ConsoleSession<'_>, SimError> {
        self.sched.acquire_permit(PermitHolder::Console)?;
        Ok(ConsoleSession {
            sim: self,
            open: true,
        })
    }

    /// Run a command to completion: a console edit or query, or a tick.
    pub fn execute(&mut self, command: Command) -> Result<CommandOutcome, SimError> {
        if command == Command::AdvanceTick {
            return Ok(CommandOutcome::Advanced(Box::new(self.step()?)));
        }
        let mut console = self.console()?;
        let outcome = console.apply(&command)?;
        Ok(outcome)
    }

    /// Apply queued commands, then run one tick.
    pub fn step(&mut self) -> Result<TickReport, SimError> {
        let queued = self.commands.drain();
        let mut console = self.console()?;
        for command in &queued {
            let _ = console.apply(command)?;
        }
        console.advance()
    }

    /// Run `ticks` ticks back to back.
    pub fn run(&mut self, ticks: u64) -> Result<Vec<TickReport>, SimError> {
        (0..ticks).map(|_| self.step()).collect()
    }

    fn apply(&mut self, command: &Command) -> Result<CommandOutcome, SimError> {
        check(command)?;
        let now = self.sched.now();
        match *command {
            Command::AdvanceTick => return Err(SimError::AdvanceFromConsole),
            Command::SetDemand { commodity, value } => {
                info!("[Console] demand for {} set to {} at tick {}", commodity, value, now);
                self.demand.set(commodity, value);
                self.sched.emit(FlowEvent::DemandChanged {
                    commodity,
                    value,
                    tick: now,
                });
            }
            Command::SetImport { commodity, value } => {
                info!("[Console] import of {} set to {} at tick {}", commodity, value, now);
                self.import.set(commodity, value);
                self.sched.emit(FlowEvent::ImportChanged {
                    commodity,
                    value,
                    tick: now,
                });
            }
            Command::SetBroken { facility, broken } => self.set_broken(facility, broken),
            Command::SetBrokenAll(broken) => {
                for facility in FacilityId::BREAKABLE {
                    self.set_broken(facility, broken);
                }
            }
            Command::QueryStatus(query) => return Ok(CommandOutcome::Status(self.status(query))),
        }
        if command.is_mutation() {
            self.commands.record(now, command);
        }
        Ok(CommandOutcome::Applied)
    }

    fn set_broken(&mut self, facility: FacilityId, broken: bool) {
        let now = self.sched.now();
        match facility {
            FacilityId::Route(side) => self.dispatcher.route_mut(side).link_mut().set_broken(broken),
            FacilityId::Refinery(side) => self.dispatcher.refinery_mut(side).set_broken(broken),
            FacilityId::Hop | FacilityId::Reserve => return,
        }
        info!(
            "[Console] {} marked {} at tick {}",
            self.config.name_of(facility),
            if broken { "broken" } else { "fixed" },
            now
        );
        self.sched.emit(FlowEvent::BrokenChanged {
            facility,
            broken,
            tick: now,
        });
    }

    // -----------------------------------------------------------------------
    // Tick pipeline
    // -----------------------------------------------------------------------

    fn run_tick(&mut self) -> Result<TickReport, SimError> {
        let now = self.sched.now();
        let demand = self.production_demand();
        debug!("=== Tick {} ===", now);

        for side in Side::BOTH {
            self.sched.acquire_permit(PermitHolder::Agenda)?;
            self.dispatcher.route_mut(side).produce(&mut self.sched);
            self.sched.release_permit(PermitHolder::Agenda)?;
        }

        let mut products = self.drain_agenda(&demand)?;
        let intake = self.dispatcher.close_tick(&demand, &mut self.sched);
        products += self.drain_agenda(&demand)?;

        let crude_need = self.dispatcher.yields().crude_equivalent(&demand);
        let surplus_import = self.import.excess_over(&self.demand);
        let unsatisfiable = crude_need > self.dispatcher.healthy_throughput();
        if unsatisfiable {
            warn!(
                "[Simulation] crude need {} exceeds healthy refinery throughput at tick {}",
                crude_need, now
            );
        }

        let report = TickReport {
            tick: now,
            products,
            production_demand: demand,
            surplus_import,
            residual: resolve_residual(&products, &demand, &surplus_import, self.epsilon),
            crude_need,
            unsatisfiable,
            days_of_cover: days_of_cover(self.dispatcher.reserve().level(), crude_need),
            deliveries: intake.deliveries,
            outcomes: intake.outcomes,
            ledger: self.ledger(),
        };
        debug_assert!(report.ledger.is_balanced(), "ledger out of balance: {:?}", report.ledger);

        self.sched.advance_clock();
        self.last_report = Some(report.clone());
        Ok(report)
    }

    /// Run every agenda entry due now, including same-tick follow-ups.
    /// Returns the products distilled.
    fn drain_agenda(&mut self, demand: &Products) -> Result<Products, SimError> {
        let mut products = Products::ZERO;
        while let Some(action) = self.sched.pop_due() {
            self.sched.acquire_permit(PermitHolder::Agenda)?;
            match action {
                Action::Deliver { link } => {
                    let (endpoint, amount) = self.dispatcher.link_mut(link).deliver(&mut self.sched);
                    match endpoint {
                        Endpoint::Dispatcher => {
                            let _ = self.dispatcher.enter(amount, demand, &mut self.sched);
                        }
                        Endpoint::Refinery(side) => {
                            let _ = self.dispatcher.refinery_mut(side).enter(amount, &mut self.sched);
                        }
                    }
                }
                Action::Process { refinery } => {
                    self.dispatcher.refinery_mut(refinery).process(&mut self.sched);
                }
                Action::Distill { refinery, amount } => {
                    products += self
                        .dispatcher
                        .refinery_mut(refinery)
                        .distill(amount, &mut self.sched);
                }
            }
            self.sched.release_permit(PermitHolder::Agenda)?;
        }
        Ok(products)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Read-only status. Never changes state.
    pub fn status(&self, query: FacilityQuery) -> Status {
        match query {
            FacilityQuery::All => Status::All(Box::new(self.snapshot())),
            FacilityQuery::One(facility) => Status::One(self.facility_snapshot(facility)),
        }
    }

    pub fn facility_snapshot(&self, facility: FacilityId) -> FacilitySnapshot {
        let now = self.sched.now();
        match facility {
            FacilityId::Route(side) => FacilitySnapshot::Link(self.dispatcher.route(side).snapshot(now)),
            FacilityId::Refinery(side) => {
                FacilitySnapshot::Refinery(self.dispatcher.refinery(side).snapshot(now))
            }
            FacilityId::Hop => FacilitySnapshot::Link(self.dispatcher.hop().snapshot(now, None)),
            FacilityId::Reserve => FacilitySnapshot::Reserve(self.dispatcher.reserve().snapshot()),
        }
    }

    pub fn snapshot(&self) -> SystemSnapshot {
        let now = self.sched.now();
        let d = &self.dispatcher;
        SystemSnapshot {
            tick: now,
            routes: Pair::new(d.route(Side::First).snapshot(now), d.route(Side::Second).snapshot(now)),
            hop: d.hop().snapshot(now, None),
            refineries: Pair::new(
                d.refinery(Side::First).snapshot(now),
                d.refinery(Side::Second).snapshot(now),
            ),
            reserve: d.reserve().snapshot(),
            dispatcher: d.snapshot(),
            demand: self.demand,
            import: self.import,
            ledger: self.ledger(),
            last_report: self.last_report.clone(),
        }
    }

    /// Where all crude currently is.
    pub fn ledger(&self) -> FlowLedger {
        let d = &self.dispatcher;
        let refineries = [d.refinery(Side::First), d.refinery(Side::Second)];
        FlowLedger {
            produced: d.route(Side::First).produced() + d.route(Side::Second).produced(),
            reserve_initial: self.reserve_initial,
            reserve_level: d.reserve().level(),
            in_flight: d.in_flight(),
            distilled: refineries.iter().map(|r| r.distilled()).sum(),
            products: refineries
                .iter()
                .fold(Products::ZERO, |acc, r| acc + r.products()),
            refining_loss: refineries.iter().map(|r| r.refining_loss()).sum(),
            lost_in_transit: d.link(LinkId::Route(Side::First)).lost()
                + d.link(LinkId::Route(Side::Second)).lost()
                + d.hop().lost(),
            lost_at_refineries: refineries.iter().map(|r| r.lost()).sum(),
            lost_to_overflow: d.counters().lost,
        }
    }

    /// Deterministic hash of the flow state.
    pub fn state_hash(&self) -> u64 {
        let d = &self.dispatcher;
        let mut h = StateHash::new();
        h.write_u64(self.sched.now());
        for side in Side::BOTH {
            let route = d.route(side);
            h.write_fixed(route.production());
            h.write_bool(route.is_broken());
            h.write_backlog(route.link().planner().backlog());

            let refinery = d.refinery(side);
            h.write_bool(refinery.is_broken());
            h.write_backlog(refinery.planner().backlog());
            h.write_fixed(refinery.in_flight());
        }
        h.write_backlog(d.hop().planner().backlog());
        h.write_fixed(d.reserve().level());
        h.write_fixed(d.in_flight());
        h.write_products(&self.demand);
        h.write_products(&self.import);
        h.finish()
    }
}

/// Reject commands the engine cannot act on.
fn check(command: &Command) -> Result<(), SimError> {
    match *command {
        Command::SetDemand { commodity, value } | Command::SetImport { commodity, value }
            if value < Fixed64::ZERO =>
        {
            Err(SimError::NegativeValue { commodity, value })
        }
        Command::SetDemand { commodity, value } | Command::SetImport { commodity, value }
            if value > Fixed64::from_num(MAX_QUANTITY) =>
        {
            Err(SimError::ValueOutOfRange {
                commodity,
                value: value.to_num(),
            })
        }
        Command::SetBroken { facility, .. } if !facility.is_breakable() => {
            Err(SimError::NotBreakable(facility))
        }
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Console session
// ---------------------------------------------------------------------------

/// Interactive access to the simulation for one tick.
///
/// The session holds the console permit from creation until [`advance`] or
/// drop, so every edit made through it lands before the tick's automatic
/// flow.
///
/// [`advance`]: ConsoleSession::advance
#[derive(Debug)]
pub struct ConsoleSession<'a> {
    sim: &'a mut Simulation,
    open: bool,
}

impl ConsoleSession<'_> {
    pub fn tick(&self) -> Ticks {
        self.sim.tick()
    }

    /// Apply an edit or answer a query. `AdvanceTick` is rejected; use
    /// [`ConsoleSession::advance`].
    pub fn apply(&mut self, command: &Command) -> Result<CommandOutcome, SimError> {
        self.sim.apply(command)
    }

    pub fn set_demand(&mut self, commodity: Commodity, value: Fixed64) -> Result<(), SimError> {
        self.apply(&Command::SetDemand { commodity, value }).map(|_| ())
    }

    pub fn set_import(&mut self, commodity: Commodity, value: Fixed64) -> Result<(), SimError> {
        self.apply(&Command::SetImport { commodity, value }).map(|_| ())
    }

    pub fn set_broken(&mut self, facility: FacilityId, broken: bool) -> Result<(), SimError> {
        self.apply(&Command::SetBroken { facility, broken }).map(|_| ())
    }

    pub fn status(&self, query: FacilityQuery) -> Status {
        self.sim.status(query)
    }

    /// Release the permit and run the tick.
    pub fn advance(mut self) -> Result<TickReport, SimError> {
        self.open = false;
        self.sim.sched.release_permit(PermitHolder::Console)?;
        self.sim.run_tick()
    }
}

impl Drop for ConsoleSession<'_> {
    fn drop(&mut self) {
        if self.open {
            let _ = self.sim.sched.release_permit(PermitHolder::Console);
        }
    }
}
