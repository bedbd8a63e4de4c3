//! Reads network configurations and operator scripts from data files.
//!
//! Provides format detection (RON/JSON/TOML), file discovery in a scenario
//! directory, and resolution of script names against the network.

use crate::schema::{ScriptAction, ScriptData, ScriptEntryData};
use crate::script::Script;
use log::info;
use oilflow_core::command_queue::Command;
use oilflow_core::config::{MAX_QUANTITY, SimConfig};
use oilflow_core::error::SimError;
use oilflow_core::fixed::{Fixed64, f64_to_fixed64};
use oilflow_core::id::{Commodity, FacilityId};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Failure to read a network or script file.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A scenario directory lacks a mandatory file.
    #[error("no {file}.ron, {file}.toml or {file}.json in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// Only `.ron`, `.toml` and `.json` are read.
    #[error("{file}: not a .ron, .toml or .json file")]
    UnsupportedFormat { file: PathBuf },

    /// The same base name exists in more than one format.
    #[error("ambiguous data files: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("cannot parse {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A script names a facility or commodity that does not exist.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// The file parsed but describes something the engine rejects.
    #[error("invalid data in {file}: {source}")]
    Invalid { file: PathBuf, source: SimError },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Pick the format from the file extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Base name of the network configuration in a scenario directory.
pub const NETWORK_FILE: &str = "network";
/// Base name of the optional operator script in a scenario directory.
pub const SCRIPT_FILE: &str = "script";

/// Scan a directory for a data file with the given base name (without
/// extension). Returns `Ok(None)` if no file is found, or
/// `Err(ConflictingFormats)` if more than one format exists.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// [`find_data_file`] for files a scenario cannot do without.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its format.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let parse_error = |detail: String| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(e.to_string())),
    }
}

// ===========================================================================
// Network configuration
// ===========================================================================

/// Load and validate a network configuration. Fields missing from the file
/// keep their default values.
pub fn load_config(path: &Path) -> Result<SimConfig, DataLoadError> {
    let config: SimConfig = deserialize_file(path)?;
    config.validate().map_err(|source| DataLoadError::Invalid {
        file: path.to_path_buf(),
        source,
    })?;
    info!("[Loader] loaded network from {}", path.display());
    Ok(config)
}

// ===========================================================================
// Scripts
// ===========================================================================

/// Load an operator script, resolving names against `config`.
pub fn load_script(path: &Path, config: &SimConfig) -> Result<Script, DataLoadError> {
    let data: ScriptData = deserialize_file(path)?;
    resolve_script(data, config, path)
}

/// Turn parsed script entries into engine commands.
pub fn resolve_script(
    data: ScriptData,
    config: &SimConfig,
    file: &Path,
) -> Result<Script, DataLoadError> {
    let names = config.facility_names();
    let mut commands = Vec::with_capacity(data.commands.len());
    for entry in &data.commands {
        commands.push((entry.at, resolve_entry(entry, &names, file)?));
    }
    let ticks = data
        .ticks
        .unwrap_or_else(|| data.commands.iter().map(|e| e.at + 1).max().unwrap_or(0));
    Ok(Script::new(ticks, commands))
}

fn resolve_entry(
    entry: &ScriptEntryData,
    names: &[(String, FacilityId)],
    file: &Path,
) -> Result<Command, DataLoadError> {
    let command = match entry.action {
        ScriptAction::Break | ScriptAction::Fix => {
            let name = required(entry.facility.as_deref(), "facility", entry, file)?;
            let facility = resolve_facility(names, name, file)?;
            if !facility.is_breakable() {
                return Err(DataLoadError::Invalid {
                    file: file.to_path_buf(),
                    source: SimError::NotBreakable(facility),
                });
            }
            Command::SetBroken {
                facility,
                broken: entry.action == ScriptAction::Break,
            }
        }
        ScriptAction::BreakAll => Command::SetBrokenAll(true),
        ScriptAction::FixAll => Command::SetBrokenAll(false),
        ScriptAction::SetDemand | ScriptAction::SetImport => {
            let name = required(entry.commodity.as_deref(), "commodity", entry, file)?;
            let commodity = resolve_commodity(name, file)?;
            let value = required(entry.value, "value", entry, file)?;
            if !value.is_finite() || value.abs() > MAX_QUANTITY {
                return Err(DataLoadError::Invalid {
                    file: file.to_path_buf(),
                    source: SimError::ValueOutOfRange { commodity, value },
                });
            }
            let value = f64_to_fixed64(value);
            if value < Fixed64::ZERO {
                return Err(DataLoadError::Invalid {
                    file: file.to_path_buf(),
                    source: SimError::NegativeValue { commodity, value },
                });
            }
            if entry.action == ScriptAction::SetDemand {
                Command::SetDemand { commodity, value }
            } else {
                Command::SetImport { commodity, value }
            }
        }
    };
    Ok(command)
}

fn required<T>(
    value: Option<T>,
    field: &str,
    entry: &ScriptEntryData,
    file: &Path,
) -> Result<T, DataLoadError> {
    value.ok_or_else(|| DataLoadError::Parse {
        file: file.to_path_buf(),
        detail: format!("{:?} at tick {} needs '{field}'", entry.action, entry.at),
    })
}

/// Look up a facility by name or alias, ignoring case.
pub fn resolve_facility(
    names: &[(String, FacilityId)],
    name: &str,
    file: &Path,
) -> Result<FacilityId, DataLoadError> {
    let wanted = name.to_lowercase();
    names
        .iter()
        .find(|(candidate, _)| *candidate == wanted)
        .map(|&(_, id)| id)
        .ok_or_else(|| DataLoadError::UnresolvedRef {
            file: file.to_path_buf(),
            name: name.to_string(),
            expected_kind: "facility",
        })
}

pub fn resolve_commodity(name: &str, file: &Path) -> Result<Commodity, DataLoadError> {
    name.parse().map_err(|_| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind: "commodity",
    })
}

// ===========================================================================
// Scenario directories
// ===========================================================================

/// A network plus the script to play on it.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub config: SimConfig,
    pub script: Script,
}

/// Load `network.{ron,toml,json}` (required) and `script.{ron,toml,json}`
/// (optional) from `dir`.
pub fn load_scenario(dir: &Path) -> Result<Scenario, DataLoadError> {
    let network = require_data_file(dir, NETWORK_FILE)?;
    let config = load_config(&network)?;
    let script = match find_data_file(dir, SCRIPT_FILE)? {
        Some(path) => load_script(&path, &config)?,
        None => Script::default(),
    };
    Ok(Scenario { config, script })
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use oilflow_core::id::Side;
    use std::fs;

    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "oilflow_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    // -----------------------------------------------------------------------
    // detect_format / find_data_file
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("network.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("network.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("network.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_format_unsupported() {
        for name in ["network.yaml", "network"] {
            assert!(matches!(
                detect_format(Path::new(name)),
                Err(DataLoadError::UnsupportedFormat { .. })
            ));
        }
    }

    #[test]
    fn find_data_file_found_and_missing() {
        let dir = make_test_dir("find");
        assert_eq!(find_data_file(&dir, "network").unwrap(), None);

        fs::write(dir.join("network.toml"), "").unwrap();
        assert_eq!(
            find_data_file(&dir, "network").unwrap(),
            Some(dir.join("network.toml"))
        );

        cleanup(&dir);
    }

    #[test]
    fn find_data_file_conflict() {
        let dir = make_test_dir("conflict");
        fs::write(dir.join("network.ron"), "()").unwrap();
        fs::write(dir.join("network.json"), "{}").unwrap();

        assert!(matches!(
            find_data_file(&dir, "network"),
            Err(DataLoadError::ConflictingFormats { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn require_data_file_missing() {
        let dir = make_test_dir("require_missing");
        assert!(matches!(
            require_data_file(&dir, "network"),
            Err(DataLoadError::MissingRequired { ref file, .. }) if file == "network"
        ));
        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // load_config
    // -----------------------------------------------------------------------

    #[test]
    fn load_config_toml_overrides_defaults() {
        let dir = make_test_dir("config_toml");
        let path = dir.join("network.toml");
        fs::write(
            &path,
            r#"
storage_bound = 80.0

[demand]
gasoline = 5.0
naphtha = 10.0
asphalt = 1.0

[reserve]
name = "Nelahozeves"
capacity = 1000.0
regulatory_floor = 700.0
initial_level = 650.0
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.storage_bound, 80.0);
        assert_eq!(config.demand.naphtha, 10.0);
        assert_eq!(config.reserve.initial_level, Some(650.0));
        assert_eq!(config.routes, SimConfig::default().routes);

        cleanup(&dir);
    }

    #[test]
    fn load_config_ron() {
        let dir = make_test_dir("config_ron");
        let path = dir.join("network.ron");
        fs::write(&path, "(epsilon: 0.01, event_capacity: 128)").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.epsilon, 0.01);
        assert_eq!(config.event_capacity, 128);

        cleanup(&dir);
    }

    #[test]
    fn load_config_json_hop_target() {
        let dir = make_test_dir("config_json");
        let path = dir.join("network.json");
        fs::write(
            &path,
            r#"{"hop": {"name": "Centre_Kralupy", "capacity": 15.0, "delay": 2, "target": "First"}}"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.hop.target, Side::First);
        assert_eq!(config.hop.delay, 2);
        assert!(config.hop.aliases.is_empty());

        cleanup(&dir);
    }

    #[test]
    fn load_config_rejects_invalid_values() {
        let dir = make_test_dir("config_invalid");
        let path = dir.join("network.json");
        fs::write(&path, r#"{"storage_bound": -5.0}"#).unwrap();

        assert!(matches!(
            load_config(&path),
            Err(DataLoadError::Invalid {
                source: SimError::InvalidConfig { .. },
                ..
            })
        ));

        cleanup(&dir);
    }

    #[test]
    fn load_config_parse_error() {
        let dir = make_test_dir("config_parse");
        let path = dir.join("network.ron");
        fs::write(&path, "this is not valid RON {{{").unwrap();

        assert!(matches!(load_config(&path), Err(DataLoadError::Parse { .. })));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // Scripts
    // -----------------------------------------------------------------------

    fn entry(at: u64, action: ScriptAction) -> ScriptEntryData {
        ScriptEntryData {
            at,
            action,
            facility: None,
            commodity: None,
            value: None,
        }
    }

    #[test]
    fn resolve_script_by_name_and_alias() {
        let config = SimConfig::default();
        let data = ScriptData {
            ticks: None,
            commands: vec![
                ScriptEntryData {
                    facility: Some("KRALUPY".into()),
                    ..entry(4, ScriptAction::Break)
                },
                ScriptEntryData {
                    facility: Some("i".into()),
                    ..entry(2, ScriptAction::Fix)
                },
                ScriptEntryData {
                    commodity: Some("nafta".into()),
                    value: Some(14.0),
                    ..entry(6, ScriptAction::SetDemand)
                },
            ],
        };

        let script = resolve_script(data, &config, Path::new("script.toml")).unwrap();
        assert_eq!(script.ticks(), 7);
        assert_eq!(
            script.commands()[0],
            (
                2,
                Command::SetBroken {
                    facility: FacilityId::Route(Side::Second),
                    broken: false
                }
            )
        );
        assert_eq!(
            script.commands()[1].1,
            Command::SetBroken {
                facility: FacilityId::Refinery(Side::First),
                broken: true
            }
        );
        assert_eq!(
            script.commands()[2].1,
            Command::SetDemand {
                commodity: Commodity::Naphtha,
                value: f64_to_fixed64(14.0)
            }
        );
    }

    #[test]
    fn resolve_script_unknown_facility() {
        let data = ScriptData {
            ticks: Some(3),
            commands: vec![ScriptEntryData {
                facility: Some("Schwechat".into()),
                ..entry(0, ScriptAction::Break)
            }],
        };
        let result = resolve_script(data, &SimConfig::default(), Path::new("script.ron"));
        assert!(matches!(
            result,
            Err(DataLoadError::UnresolvedRef { ref name, expected_kind: "facility", .. }) if name == "Schwechat"
        ));
    }

    #[test]
    fn resolve_script_rejects_reserve_break() {
        let data = ScriptData {
            ticks: None,
            commands: vec![ScriptEntryData {
                facility: Some("ctr".into()),
                ..entry(0, ScriptAction::Break)
            }],
        };
        let result = resolve_script(data, &SimConfig::default(), Path::new("script.ron"));
        assert!(matches!(
            result,
            Err(DataLoadError::Invalid {
                source: SimError::NotBreakable(FacilityId::Reserve),
                ..
            })
        ));
    }

    #[test]
    fn resolve_script_missing_field() {
        let data = ScriptData {
            ticks: None,
            commands: vec![entry(1, ScriptAction::SetImport)],
        };
        let result = resolve_script(data, &SimConfig::default(), Path::new("script.ron"));
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));
    }

    #[test]
    fn resolve_script_negative_value() {
        let data = ScriptData {
            ticks: None,
            commands: vec![ScriptEntryData {
                commodity: Some("asphalt".into()),
                value: Some(-1.0),
                ..entry(1, ScriptAction::SetImport)
            }],
        };
        let result = resolve_script(data, &SimConfig::default(), Path::new("script.ron"));
        assert!(matches!(
            result,
            Err(DataLoadError::Invalid {
                source: SimError::NegativeValue { .. },
                ..
            })
        ));
    }

    #[test]
    fn resolve_script_value_out_of_range() {
        for value in [1.0e12, -1.0e12, f64::INFINITY, f64::NAN] {
            let data = ScriptData {
                ticks: None,
                commands: vec![ScriptEntryData {
                    commodity: Some("gasoline".into()),
                    value: Some(value),
                    ..entry(0, ScriptAction::SetDemand)
                }],
            };
            let result = resolve_script(data, &SimConfig::default(), Path::new("script.ron"));
            assert!(
                matches!(
                    result,
                    Err(DataLoadError::Invalid {
                        source: SimError::ValueOutOfRange {
                            commodity: Commodity::Gasoline,
                            ..
                        },
                        ..
                    })
                ),
                "{value}"
            );
        }
    }

    #[test]
    fn load_script_rejects_huge_value() {
        let dir = make_test_dir("script_huge");
        let path = dir.join("script.json");
        fs::write(
            &path,
            r#"{"commands":[{"at":0,"action":"set_demand","commodity":"gasoline","value":1e12}]}"#,
        )
        .unwrap();

        let result = load_script(&path, &SimConfig::default());
        assert!(matches!(result, Err(DataLoadError::Invalid { .. })));

        cleanup(&dir);
    }

    #[test]
    fn load_scenario_with_script() {
        let dir = make_test_dir("scenario");
        fs::write(dir.join("network.json"), "{}").unwrap();
        fs::write(
            dir.join("script.toml"),
            r#"
ticks = 10

[[commands]]
at = 3
action = "break_all"

[[commands]]
at = 5
action = "fix"
facility = "druzba"
"#,
        )
        .unwrap();

        let scenario = load_scenario(&dir).unwrap();
        assert_eq!(scenario.config, SimConfig::default());
        assert_eq!(scenario.script.ticks(), 10);
        assert_eq!(scenario.script.commands().len(), 2);
        assert_eq!(scenario.script.commands_at(3).next(), Some(&Command::SetBrokenAll(true)));

        cleanup(&dir);
    }

    #[test]
    fn load_scenario_without_script() {
        let dir = make_test_dir("scenario_no_script");
        fs::write(dir.join("network.ron"), "()").unwrap();

        let scenario = load_scenario(&dir).unwrap();
        assert_eq!(scenario.script, Script::default());

        cleanup(&dir);
    }

    #[test]
    fn error_display_messages() {
        let e = DataLoadError::MissingRequired {
            file: "network".to_string(),
            dir: PathBuf::from("/data"),
        };
        assert!(format!("{e}").contains("network"));
        assert!(format!("{e}").contains("/data"));

        let e = DataLoadError::Invalid {
            file: PathBuf::from("network.toml"),
            source: SimError::NotBreakable(FacilityId::Hop),
        };
        let msg = format!("{e}");
        assert!(msg.contains("network.toml"));
        assert!(msg.contains("Hop"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let data_err: DataLoadError = io_err.into();
        assert!(matches!(data_err, DataLoadError::Io(_)));
    }
}
