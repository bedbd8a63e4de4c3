//! Read-only query API for inspecting simulation state.
//!
//! Provides snapshot types for the reporting layer. All types are owned
//! copies -- no references into internal engine storage -- and building
//! them never mutates the simulation.

use crate::dispatcher::{DispatchCounters, DispatchOutcome};
use crate::fixed::{Fixed64, Ticks};
use crate::id::{FacilityId, LinkId, Pair, Side};
use crate::products::Products;
use crate::report::{FlowLedger, TickReport};
use crate::reserve::ReserveStats;

// ---------------------------------------------------------------------------
// Facility snapshots
// ---------------------------------------------------------------------------

/// A transport link: a supply route's pipe or the internal hop.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSnapshot {
    pub id: LinkId,
    pub name: String,
    pub broken: bool,
    /// Maximum amount delivered per tick.
    pub capacity: Fixed64,
    pub delay: Ticks,
    /// Current production target. `None` for the internal hop.
    pub production: Option<Fixed64>,
    /// Amounts committed to arrive, by arrival tick, from now onwards.
    pub backlog: Vec<(Ticks, Fixed64)>,
    pub in_transit: Fixed64,
    pub delivered: Fixed64,
    pub lost: Fixed64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefinerySnapshot {
    pub side: Side,
    pub name: String,
    pub broken: bool,
    pub max_throughput: Fixed64,
    pub processing_delay: Ticks,
    /// Crude waiting to be processed, by processing tick.
    pub backlog: Vec<(Ticks, Fixed64)>,
    /// Crude being distilled, by the tick it comes out.
    pub in_distillation: Vec<(Ticks, Fixed64)>,
    pub distilled: Fixed64,
    pub products: Products,
    pub lost: Fixed64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReserveSnapshot {
    pub name: String,
    pub level: Fixed64,
    pub capacity: Fixed64,
    pub floor: Fixed64,
    /// Deficit to the regulatory floor.
    pub missing: Fixed64,
    pub stats: ReserveStats,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatcherSnapshot {
    pub input_ratios: Pair<Fixed64>,
    pub output_ratios: Pair<Fixed64>,
    pub counters: DispatchCounters,
    pub last_outcome: Option<DispatchOutcome>,
}

// ---------------------------------------------------------------------------
// Aggregate views
// ---------------------------------------------------------------------------

/// Everything the reporting layer shows on a full status query.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSnapshot {
    pub tick: Ticks,
    pub routes: Pair<LinkSnapshot>,
    pub hop: LinkSnapshot,
    pub refineries: Pair<RefinerySnapshot>,
    pub reserve: ReserveSnapshot,
    pub dispatcher: DispatcherSnapshot,
    pub demand: Products,
    pub import: Products,
    pub ledger: FlowLedger,
    pub last_report: Option<TickReport>,
}

/// Which facilities a status query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacilityQuery {
    All,
    One(FacilityId),
}

/// A single facility's status.
#[derive(Debug, Clone, PartialEq)]
pub enum FacilitySnapshot {
    Link(LinkSnapshot),
    Refinery(RefinerySnapshot),
    Reserve(ReserveSnapshot),
}

/// Answer to a [`FacilityQuery`].
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    All(Box<SystemSnapshot>),
    One(FacilitySnapshot),
}
