//! Per-tick reports and the conservation ledger.

use crate::dispatcher::DispatchOutcome;
use crate::fixed::{Fixed64, Ticks, within};
use crate::id::Commodity;
use crate::products::Products;

// ---------------------------------------------------------------------------
// Conservation ledger
// ---------------------------------------------------------------------------

/// Where every unit of crude that entered the network currently is.
///
/// Quantities are exact fixed-point sums, so [`FlowLedger::imbalance`] is
/// zero at every tick boundary, not merely small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowLedger {
    /// Crude emitted by the supply routes, including priming.
    pub produced: Fixed64,
    pub reserve_initial: Fixed64,
    pub reserve_level: Fixed64,
    /// Crude held by links, refineries and the dispatcher.
    pub in_flight: Fixed64,
    /// Crude that completed distillation.
    pub distilled: Fixed64,
    /// Products obtained so far.
    pub products: Products,
    pub refining_loss: Fixed64,
    /// Lost in transport links: broken or saturated.
    pub lost_in_transit: Fixed64,
    /// Offered to broken or saturated refineries.
    pub lost_at_refineries: Fixed64,
    /// Overflow the reserve could not absorb.
    pub lost_to_overflow: Fixed64,
}

impl FlowLedger {
    pub fn lost(&self) -> Fixed64 {
        self.lost_in_transit + self.lost_at_refineries + self.lost_to_overflow
    }

    /// `inputs - outputs`; zero when nothing was created or destroyed.
    pub fn imbalance(&self) -> Fixed64 {
        let inputs = self.produced + self.reserve_initial;
        let outputs = self.distilled + self.lost() + self.in_flight + self.reserve_level;
        inputs - outputs
    }

    pub fn is_balanced(&self) -> bool {
        self.imbalance() == Fixed64::ZERO
    }
}

// ---------------------------------------------------------------------------
// Daily demand resolution
// ---------------------------------------------------------------------------

/// The outcome of one simulated day.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: Ticks,
    /// Products distilled during the tick.
    pub products: Products,
    /// Demand left after imports: `max(0, demand - import)`.
    pub production_demand: Products,
    /// Imports beyond demand: `max(0, import - demand)`.
    pub surplus_import: Products,
    /// Product balance against production demand. Negative entries are unmet
    /// demand.
    pub residual: Products,
    /// Crude needed to meet the production demand.
    pub crude_need: Fixed64,
    /// The crude need exceeds what the healthy refineries can process.
    pub unsatisfiable: bool,
    /// Reserve level divided by the crude need. `None` when nothing is needed.
    pub days_of_cover: Option<Fixed64>,
    /// Supply-route deliveries seen by the dispatcher.
    pub deliveries: u32,
    pub outcomes: Vec<DispatchOutcome>,
    pub ledger: FlowLedger,
}

impl TickReport {
    pub fn is_irregular(&self) -> bool {
        self.deliveries != 2
    }

    /// Commodities with unmet demand.
    pub fn shortages(&self) -> Vec<Commodity> {
        Commodity::ALL
            .into_iter()
            .filter(|&c| self.residual.get(c) < Fixed64::ZERO)
            .collect()
    }
}

/// `products - production_demand + surplus_import`, with products that land
/// within `epsilon` of demand snapped to it so noise does not show up as a
/// residual.
pub fn resolve_residual(
    products: &Products,
    production_demand: &Products,
    surplus_import: &Products,
    epsilon: Fixed64,
) -> Products {
    let mut residual = Products::ZERO;
    for commodity in Commodity::ALL {
        let made = products.get(commodity);
        let wanted = production_demand.get(commodity);
        let made = if within(made, wanted, epsilon) { wanted } else { made };
        residual.set(commodity, made - wanted + surplus_import.get(commodity));
    }
    residual
}

pub fn days_of_cover(level: Fixed64, crude_need: Fixed64) -> Option<Fixed64> {
    if crude_need <= Fixed64::ZERO {
        return None;
    }
    level.checked_div(crude_need)
}
