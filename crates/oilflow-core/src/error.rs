use crate::fixed::Fixed64;
use crate::id::{Commodity, FacilityId};
use crate::scheduler::PermitHolder;

/// Errors surfaced by the engine's public API.
///
/// The flow algorithm itself never fails: it clamps, zeroes and counts losses.
/// These errors cover construction, the console permit contract, and operator
/// commands that name something the engine cannot act on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("console permit is held by {holder:?}")]
    PermitHeld { holder: PermitHolder },

    #[error("{holder:?} released a permit it does not hold")]
    PermitNotHeld { holder: PermitHolder },

    #[error("facility {0:?} cannot be broken or fixed")]
    NotBreakable(FacilityId),

    #[error("negative value {value} for {commodity}")]
    NegativeValue { commodity: Commodity, value: Fixed64 },

    #[error("value {value} for {commodity} is out of range")]
    ValueOutOfRange { commodity: Commodity, value: f64 },

    #[error("advancing the clock must go through ConsoleSession::advance")]
    AdvanceFromConsole,
}

impl SimError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SimError::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
