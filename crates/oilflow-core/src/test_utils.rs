//! Shared test helpers for unit and integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so integration
//! tests and downstream crates can use them via the `test-utils` feature.

use crate::config::SimConfig;
use crate::engine::Simulation;
use crate::fixed::Fixed64;
use crate::report::{FlowLedger, TickReport};

// ===========================================================================
// Fixed-point helpers
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Whether `a` is within `tolerance` of `b`.
pub fn approx_eq(a: Fixed64, b: Fixed64, tolerance: f64) -> bool {
    (a - b).abs() <= fixed(tolerance)
}

// ===========================================================================
// Configurations
// ===========================================================================

/// The calibrated network with default demand and import.
pub fn default_config() -> SimConfig {
    SimConfig::default()
}

/// The calibrated network with no imports, so production demand equals
/// demand.
pub fn config_without_import() -> SimConfig {
    let mut config = SimConfig::default();
    config.import.gasoline = 0.0;
    config.import.naphtha = 0.0;
    config.import.asphalt = 0.0;
    config
}

/// A small network with round numbers: routes of 10 per tick, refineries of
/// 8, no delays beyond one tick on the pipes.
pub fn small_config() -> SimConfig {
    let mut config = SimConfig::default();
    for route in [&mut config.routes.first, &mut config.routes.second] {
        route.max_production = 10.0;
        route.initial_production = 5.0;
        route.delay = 1;
        route.nominal_ratio = 0.5;
    }
    for refinery in [&mut config.refineries.first, &mut config.refineries.second] {
        refinery.max_throughput = 8.0;
        refinery.nominal_ratio = 0.5;
    }
    config.reserve.capacity = 100.0;
    config.reserve.regulatory_floor = 50.0;
    config
}

// ===========================================================================
// Simulation helpers
// ===========================================================================

pub fn build(config: &SimConfig) -> Simulation {
    match Simulation::new(config) {
        Ok(sim) => sim,
        Err(err) => panic!("test configuration rejected: {err}"),
    }
}

pub fn run_ticks(sim: &mut Simulation, ticks: u64) -> Vec<TickReport> {
    match sim.run(ticks) {
        Ok(reports) => reports,
        Err(err) => panic!("simulation failed: {err}"),
    }
}

/// Panic with the full ledger when crude was created or destroyed.
pub fn assert_conserved(ledger: &FlowLedger) {
    assert!(
        ledger.is_balanced(),
        "conservation violated (imbalance {}): {:?}",
        ledger.imbalance(),
        ledger
    );
}
