//! Serde data file structs for operator scripts.
//!
//! A script lists operator commands by the tick they apply at. Facilities and
//! commodities are referred to by name; the loader resolves them against the
//! network configuration.

use serde::Deserialize;

/// What a scripted entry does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptAction {
    Break,
    Fix,
    BreakAll,
    FixAll,
    SetDemand,
    SetImport,
}

/// One scripted command. Which optional fields are required depends on the
/// action: `facility` for break/fix, `commodity` and `value` for demand and
/// import changes.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptEntryData {
    pub at: u64,
    pub action: ScriptAction,
    #[serde(default)]
    pub facility: Option<String>,
    #[serde(default)]
    pub commodity: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

/// A whole script file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptData {
    /// Ticks to run. Defaults to one past the last scripted entry.
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default)]
    pub commands: Vec<ScriptEntryData>,
}
