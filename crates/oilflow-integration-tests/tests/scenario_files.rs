//! Cross-crate tests: scenarios loaded from data files and played on the
//! engine.
//!
//! Scenario directories live under `data/` next to this crate's manifest.
//! Each holds a `network` file and a `script` file in any supported format.

use std::path::{Path, PathBuf};

use oilflow_core::engine::Simulation;
use oilflow_core::fixed::Fixed64;
use oilflow_core::id::*;
use oilflow_core::report::TickReport;
use oilflow_core::test_utils::*;
use oilflow_data::loader::{DataLoadError, load_config};
use oilflow_data::{Scenario, load_scenario};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn data_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

fn load(name: &str) -> Scenario {
    match load_scenario(&data_dir(name)) {
        Ok(scenario) => scenario,
        Err(err) => panic!("scenario {name} failed to load: {err}"),
    }
}

fn play(scenario: &Scenario) -> (Simulation, Vec<TickReport>) {
    let mut sim = build(&scenario.config);
    let reports = scenario.script.run(&mut sim).expect("script plays");
    (sim, reports)
}

// ===========================================================================
// Pipeline outage
// ===========================================================================
//
// Druzba is out from tick 5 to tick 15 while naphtha demand rises at tick 8.
// IKL takes over the whole need and the reserve covers the gaps while the
// pipes refill.

#[test]
fn pipeline_outage_is_absorbed() {
    init_logging();
    let scenario = load("pipeline_outage");
    assert_eq!(scenario.script.ticks(), 30);

    let (sim, reports) = play(&scenario);
    assert_eq!(reports.len(), 30);
    for report in &reports {
        assert_conserved(&report.ledger);
        assert!(!report.is_irregular());
    }

    // While Druzba is down all need goes to IKL.
    let outage = &reports[10].outcomes[0];
    assert_eq!(outage.input_ratios, Pair::new(Fixed64::ZERO, Fixed64::ONE));
    assert_eq!(outage.targets.first, Fixed64::ZERO);

    // Oil produced into the broken pipe is gone.
    assert!(sim.ledger().lost_in_transit > Fixed64::ZERO);
    assert!(!sim.is_broken(FacilityId::Route(Side::First)));
    assert_eq!(sim.demand().naphtha, fixed(14.0));

    let reserve = sim.dispatcher().reserve();
    assert!(reserve.level() >= reserve.floor());
    assert!(reports.last().expect("30 reports").shortages().is_empty());
}

// ===========================================================================
// Low reserve
// ===========================================================================
//
// The reserve starts far below its floor and there are no imports, so the
// routes run flat out and the surplus refills the reserve. Demand exceeds
// what the refineries can process the whole time.

#[test]
fn low_reserve_is_refilled() {
    init_logging();
    let scenario = load("low_reserve");
    assert_eq!(scenario.config.reserve.initial_level, Some(400.0));

    let (sim, reports) = play(&scenario);
    assert_eq!(reports.len(), 25);
    for report in &reports {
        assert_conserved(&report.ledger);
        assert!(report.unsatisfiable, "tick {} should be unsatisfiable", report.tick);
    }

    let first = &reports[0].outcomes[0];
    assert_eq!(first.targets, Pair::new(fixed(24.66), fixed(27.4)));

    assert!(sim.dispatcher().reserve().level() > fixed(400.0));
    assert!(sim.dispatcher().counters().stored > Fixed64::ZERO);
    assert_eq!(sim.import().gasoline, fixed(1.5));
    assert!(FacilityId::BREAKABLE.iter().all(|&f| !sim.is_broken(f)));
}

// ===========================================================================
// Defaults through every format
// ===========================================================================

fn temp_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "oilflow_integration_{suffix}_{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn empty_network_files_give_the_default_network() {
    let dir = temp_dir("defaults");
    let files = [("network.ron", "()"), ("network.toml", ""), ("network.json", "{}")];

    let mut reference = build(&default_config());
    run_ticks(&mut reference, 15);

    for (name, content) in files {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config, default_config(), "{name}");

        let mut sim = build(&config);
        run_ticks(&mut sim, 15);
        assert_eq!(sim.state_hash(), reference.state_hash(), "{name}");
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_network_file_is_rejected_before_building() {
    let dir = temp_dir("invalid");
    let path = dir.join("network.toml");
    std::fs::write(
        &path,
        r#"
[reserve]
name = "Nelahozeves"
capacity = 100.0
regulatory_floor = 200.0
"#,
    )
    .unwrap();

    let result = load_config(&path);
    assert!(matches!(result, Err(DataLoadError::Invalid { .. })));

    let _ = std::fs::remove_dir_all(&dir);
}
