//! Oilflow Core -- a tick-based simulator of a crude-oil supply network.
//!
//! Two supply routes feed a central dispatcher, which routes crude to two
//! refineries and a strategic reserve and sets the routes' production targets
//! for the next day. Refineries distill crude into gasoline, naphtha and
//! asphalt, which are compared with product demand every tick.
//!
//! # Tick pipeline
//!
//! Each call to [`engine::Simulation::step`] runs one day:
//!
//! 1. **Console** -- operator commands apply under the console permit.
//! 2. **Sources** -- supply routes emit their production targets.
//! 3. **Agenda** -- due deliveries, processing and distillation run in order.
//! 4. **Close** -- the dispatcher settles the day's intake.
//! 5. **Resolve** -- products are compared with demand into a
//!    [`report::TickReport`].
//! 6. **Bookkeeping** -- the clock advances.
//!
//! # Conservation
//!
//! All quantities are [`fixed::Fixed64`]. Oil leaves the network only by
//! distillation or by an explicitly counted loss, and the
//! [`report::FlowLedger`] balances to the last bit at every tick boundary.
//!
//! # Key Types
//!
//! - [`engine::Simulation`] -- owns the network and runs the pipeline.
//! - [`engine::ConsoleSession`] -- operator access holding the console permit.
//! - [`dispatcher::Dispatcher`] -- routing, failover and production targets.
//! - [`transport::TransportLink`] -- delay- and capacity-bounded pipes.
//! - [`planner::SpillbackPlanner`] -- the slot planner shared by links and
//!   refineries.
//! - [`reserve::Reserve`] -- strategic reserve with a regulatory floor.
//! - [`scheduler::Scheduler`] -- clock, agenda and permit.
//! - [`config::SimConfig`] -- construction parameters.

pub mod command_queue;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod event;
pub mod fixed;
pub mod hash;
pub mod id;
pub mod planner;
pub mod products;
pub mod query;
pub mod refinery;
pub mod report;
pub mod reserve;
pub mod route;
pub mod scheduler;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
