//! Static construction parameters for the supply network.
//!
//! Configuration values are plain `f64` so they read naturally in data files;
//! they are converted to [`Fixed64`] once, when the simulation is built.
//! [`SimConfig::default`] describes the Czech crude network the model was
//! calibrated on: two pipelines (Druzba, IKL), two refineries (Kralupy,
//! Litvinov) and the Nelahozeves strategic reserve.

use crate::error::SimError;
use crate::fixed::{Fixed64, f64_to_fixed64};
use crate::id::{Pair, Side};
use crate::products::{Products, Yields};
use serde::{Deserialize, Serialize};

/// A crude supply route: a source with a production target feeding a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Maximum production per tick; also the link's per-tick capacity.
    pub max_production: f64,
    /// Production before the dispatcher sets the first target.
    pub initial_production: f64,
    /// Ticks between production and arrival at the dispatcher.
    pub delay: u32,
    /// Share of total crude need requested from this route when both are up.
    pub nominal_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefineryConfig {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Maximum crude processed in a single tick.
    pub max_throughput: f64,
    /// Ticks between processing and product output.
    pub processing_delay: u32,
    /// Share of dispatched crude routed here when both refineries are up.
    pub nominal_ratio: f64,
}

/// The internal link between the dispatcher and one refinery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HopConfig {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub capacity: f64,
    pub delay: u32,
    /// The refinery this hop feeds. The other refinery is fed directly.
    pub target: Side,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReserveConfig {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub capacity: f64,
    pub regulatory_floor: f64,
    /// Starting level; a full reserve when absent.
    #[serde(default)]
    pub initial_level: Option<f64>,
}

/// Gasoline / naphtha / asphalt triple in configuration units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasketConfig {
    pub gasoline: f64,
    pub naphtha: f64,
    pub asphalt: f64,
}

impl BasketConfig {
    pub fn to_products(self) -> Products {
        Products::new(
            f64_to_fixed64(self.gasoline),
            f64_to_fixed64(self.naphtha),
            f64_to_fixed64(self.asphalt),
        )
    }

    pub fn to_yields(self) -> Yields {
        Yields::new(
            f64_to_fixed64(self.gasoline),
            f64_to_fixed64(self.naphtha),
            f64_to_fixed64(self.asphalt),
        )
    }

    fn values(&self) -> [(&'static str, f64); 3] {
        [
            ("gasoline", self.gasoline),
            ("naphtha", self.naphtha),
            ("asphalt", self.asphalt),
        ]
    }
}

/// Complete description of the network. Missing fields in data files fall
/// back to [`SimConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub routes: Pair<RouteConfig>,
    pub refineries: Pair<RefineryConfig>,
    pub hop: HopConfig,
    pub reserve: ReserveConfig,
    /// Total amount a link or refinery may hold across any delay window.
    pub storage_bound: f64,
    pub yields: BasketConfig,
    /// Tolerance below which amounts are treated as numeric noise.
    pub epsilon: f64,
    pub demand: BasketConfig,
    pub import: BasketConfig,
    /// Capacity of the in-memory flow event log.
    pub event_capacity: usize,
    /// Executed operator commands kept for inspection. 0 disables history.
    pub command_history: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        let aliases = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            routes: Pair::new(
                RouteConfig {
                    name: "Druzba".into(),
                    aliases: aliases(&["druzhba", "d"]),
                    max_production: 24.66,
                    initial_production: 10.55,
                    delay: 3,
                    nominal_ratio: 0.515136718,
                },
                RouteConfig {
                    name: "IKL".into(),
                    aliases: aliases(&["i"]),
                    max_production: 27.4,
                    initial_production: 9.93,
                    delay: 2,
                    nominal_ratio: 0.484863281,
                },
            ),
            refineries: Pair::new(
                RefineryConfig {
                    name: "Kralupy".into(),
                    aliases: aliases(&["k"]),
                    max_throughput: 9.04,
                    processing_delay: 0,
                    nominal_ratio: 0.379353755,
                },
                RefineryConfig {
                    name: "Litvinov".into(),
                    aliases: aliases(&["l"]),
                    max_throughput: 14.79,
                    processing_delay: 0,
                    nominal_ratio: 0.620646244,
                },
            ),
            hop: HopConfig {
                name: "Centre_Litvinov".into(),
                aliases: aliases(&["hop"]),
                capacity: 20.0,
                delay: 1,
                target: Side::Second,
            },
            reserve: ReserveConfig {
                name: "Nelahozeves".into(),
                aliases: aliases(&["ctr"]),
                capacity: 1293.5,
                regulatory_floor: 900.0,
                initial_level: None,
            },
            storage_bound: 100.0,
            yields: BasketConfig {
                gasoline: 0.19,
                naphtha: 0.42,
                asphalt: 0.13,
            },
            epsilon: 1.0e-3,
            demand: BasketConfig {
                gasoline: 4.38,
                naphtha: 12.96,
                asphalt: 1.21,
            },
            import: BasketConfig {
                gasoline: 1.09,
                naphtha: 5.45,
                asphalt: 0.29,
            },
            event_capacity: 4096,
            command_history: 256,
        }
    }
}

/// Ratio pairs may fall short of one by rounding in published figures, but
/// never exceed it by more than this.
const RATIO_SUM_SLACK: f64 = 1.0e-6;

/// Largest magnitude accepted for any quantity, well inside Q32.32 range.
pub const MAX_QUANTITY: f64 = 1.0e6;

impl SimConfig {
    /// Check every parameter the engine relies on.
    pub fn validate(&self) -> Result<(), SimError> {
        for (side, route) in self.routes.iter() {
            let field = |name: &str| format!("routes.{side:?}.{name}").to_lowercase();
            positive(&field("max_production"), route.max_production)?;
            non_negative(&field("initial_production"), route.initial_production)?;
            if route.initial_production > route.max_production {
                return Err(SimError::invalid(
                    field("initial_production"),
                    "exceeds max_production",
                ));
            }
            unit_interval(&field("nominal_ratio"), route.nominal_ratio)?;
        }
        ratio_pair("routes", self.routes.first.nominal_ratio, self.routes.second.nominal_ratio)?;

        for (side, refinery) in self.refineries.iter() {
            let field = |name: &str| format!("refineries.{side:?}.{name}").to_lowercase();
            positive(&field("max_throughput"), refinery.max_throughput)?;
            unit_interval(&field("nominal_ratio"), refinery.nominal_ratio)?;
        }
        ratio_pair(
            "refineries",
            self.refineries.first.nominal_ratio,
            self.refineries.second.nominal_ratio,
        )?;

        positive("hop.capacity", self.hop.capacity)?;
        positive("reserve.capacity", self.reserve.capacity)?;
        non_negative("reserve.regulatory_floor", self.reserve.regulatory_floor)?;
        if self.reserve.regulatory_floor > self.reserve.capacity {
            return Err(SimError::invalid(
                "reserve.regulatory_floor",
                "exceeds reserve capacity",
            ));
        }
        if let Some(level) = self.reserve.initial_level {
            non_negative("reserve.initial_level", level)?;
            if level > self.reserve.capacity {
                return Err(SimError::invalid(
                    "reserve.initial_level",
                    "exceeds reserve capacity",
                ));
            }
        }

        positive("storage_bound", self.storage_bound)?;
        positive("epsilon", self.epsilon)?;

        let mut yield_sum = 0.0;
        for (name, value) in self.yields.values() {
            positive(&format!("yields.{name}"), value)?;
            yield_sum += value;
        }
        if yield_sum > 1.0 {
            return Err(SimError::invalid("yields", "fractions sum above 1"));
        }

        for (name, value) in self.demand.values() {
            non_negative(&format!("demand.{name}"), value)?;
        }
        for (name, value) in self.import.values() {
            non_negative(&format!("import.{name}"), value)?;
        }
        Ok(())
    }

    pub fn epsilon_fixed(&self) -> Fixed64 {
        f64_to_fixed64(self.epsilon)
    }

    /// Look up the configured display name of a facility.
    pub fn name_of(&self, facility: crate::id::FacilityId) -> &str {
        use crate::id::FacilityId;
        match facility {
            FacilityId::Route(side) => &self.routes[side].name,
            FacilityId::Refinery(side) => &self.refineries[side].name,
            FacilityId::Hop => &self.hop.name,
            FacilityId::Reserve => &self.reserve.name,
        }
    }

    /// Names and aliases of every facility, lowercased.
    pub fn facility_names(&self) -> Vec<(String, crate::id::FacilityId)> {
        use crate::id::FacilityId;
        let mut names = Vec::new();
        let mut push = |name: &str, aliases: &[String], id: FacilityId| {
            names.push((name.to_lowercase(), id));
            names.extend(aliases.iter().map(|a| (a.to_lowercase(), id)));
        };
        for side in Side::BOTH {
            push(&self.routes[side].name, &self.routes[side].aliases, FacilityId::Route(side));
            push(
                &self.refineries[side].name,
                &self.refineries[side].aliases,
                FacilityId::Refinery(side),
            );
        }
        push(&self.hop.name, &self.hop.aliases, FacilityId::Hop);
        push(&self.reserve.name, &self.reserve.aliases, FacilityId::Reserve);
        names
    }
}

fn finite(field: &str, value: f64) -> Result<(), SimError> {
    if !value.is_finite() || value.abs() > MAX_QUANTITY {
        return Err(SimError::invalid(field, format!("{value} is out of range")));
    }
    Ok(())
}

fn positive(field: &str, value: f64) -> Result<(), SimError> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(SimError::invalid(field, "must be positive"));
    }
    Ok(())
}

fn non_negative(field: &str, value: f64) -> Result<(), SimError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(SimError::invalid(field, "must not be negative"));
    }
    Ok(())
}

fn unit_interval(field: &str, value: f64) -> Result<(), SimError> {
    non_negative(field, value)?;
    if value > 1.0 {
        return Err(SimError::invalid(field, "must be at most 1"));
    }
    Ok(())
}

fn ratio_pair(field: &str, a: f64, b: f64) -> Result<(), SimError> {
    if a + b > 1.0 + RATIO_SUM_SLACK {
        return Err(SimError::invalid(
            format!("{field}.nominal_ratio"),
            format!("ratios sum to {} (above 1)", a + b),
        ));
    }
    Ok(())
}
