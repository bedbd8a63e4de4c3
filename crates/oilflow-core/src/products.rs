//! Product bundles and the crude-to-product conversion.
//!
//! [`Products`] is the 3-tuple used for refinery output, demand and import.
//! [`Yields`] holds the fixed distillation fractions and converts in both
//! directions: crude into products, and product demand back into the crude
//! needed to meet it.

use crate::fixed::{Fixed64, non_negative};
use crate::id::Commodity;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub};

/// Amounts of gasoline, naphtha and asphalt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Products {
    pub gasoline: Fixed64,
    pub naphtha: Fixed64,
    pub asphalt: Fixed64,
}

impl Products {
    pub const ZERO: Products = Products {
        gasoline: Fixed64::ZERO,
        naphtha: Fixed64::ZERO,
        asphalt: Fixed64::ZERO,
    };

    pub fn new(gasoline: Fixed64, naphtha: Fixed64, asphalt: Fixed64) -> Self {
        Self {
            gasoline,
            naphtha,
            asphalt,
        }
    }

    pub fn get(&self, commodity: Commodity) -> Fixed64 {
        match commodity {
            Commodity::Gasoline => self.gasoline,
            Commodity::Naphtha => self.naphtha,
            Commodity::Asphalt => self.asphalt,
        }
    }

    pub fn set(&mut self, commodity: Commodity, value: Fixed64) {
        match commodity {
            Commodity::Gasoline => self.gasoline = value,
            Commodity::Naphtha => self.naphtha = value,
            Commodity::Asphalt => self.asphalt = value,
        }
    }

    /// Apply `f` to every commodity.
    pub fn map(self, mut f: impl FnMut(Fixed64) -> Fixed64) -> Products {
        Products {
            gasoline: f(self.gasoline),
            naphtha: f(self.naphtha),
            asphalt: f(self.asphalt),
        }
    }

    /// Per-commodity `max(0, self - other)`.
    pub fn excess_over(&self, other: &Products) -> Products {
        Products {
            gasoline: non_negative(self.gasoline - other.gasoline),
            naphtha: non_negative(self.naphtha - other.naphtha),
            asphalt: non_negative(self.asphalt - other.asphalt),
        }
    }

    pub fn total(&self) -> Fixed64 {
        self.gasoline + self.naphtha + self.asphalt
    }
}

impl Add for Products {
    type Output = Products;

    fn add(self, rhs: Products) -> Products {
        Products {
            gasoline: self.gasoline + rhs.gasoline,
            naphtha: self.naphtha + rhs.naphtha,
            asphalt: self.asphalt + rhs.asphalt,
        }
    }
}

impl AddAssign for Products {
    fn add_assign(&mut self, rhs: Products) {
        *self = *self + rhs;
    }
}

impl Sub for Products {
    type Output = Products;

    fn sub(self, rhs: Products) -> Products {
        Products {
            gasoline: self.gasoline - rhs.gasoline,
            naphtha: self.naphtha - rhs.naphtha,
            asphalt: self.asphalt - rhs.asphalt,
        }
    }
}

/// Fraction of each product recovered from one unit of crude.
///
/// The fractions sum to less than one; the remainder is refining loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Yields {
    pub gasoline: Fixed64,
    pub naphtha: Fixed64,
    pub asphalt: Fixed64,
}

impl Yields {
    pub fn new(gasoline: Fixed64, naphtha: Fixed64, asphalt: Fixed64) -> Self {
        Self {
            gasoline,
            naphtha,
            asphalt,
        }
    }

    pub fn get(&self, commodity: Commodity) -> Fixed64 {
        match commodity {
            Commodity::Gasoline => self.gasoline,
            Commodity::Naphtha => self.naphtha,
            Commodity::Asphalt => self.asphalt,
        }
    }

    /// Split `crude` into products. Returns the products and the refining loss;
    /// the two always add back up to `crude` exactly.
    pub fn distill(&self, crude: Fixed64) -> (Products, Fixed64) {
        let products = Products {
            gasoline: crude * self.gasoline,
            naphtha: crude * self.naphtha,
            asphalt: crude * self.asphalt,
        };
        let loss = crude - products.total();
        (products, loss)
    }

    /// The crude input needed to meet the most demanding of the three product
    /// demands. Commodities with a zero fraction are skipped; a need beyond
    /// the fixed-point range saturates.
    pub fn crude_equivalent(&self, demand: &Products) -> Fixed64 {
        Commodity::ALL
            .iter()
            .filter(|&&c| self.get(c) != Fixed64::ZERO)
            .map(|&c| demand.get(c).saturating_div(self.get(c)))
            .fold(Fixed64::ZERO, |acc, need| acc.max(need))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::f64_to_fixed64 as fixed;

    fn standard_yields() -> Yields {
        Yields::new(fixed(0.19), fixed(0.42), fixed(0.13))
    }

    #[test]
    fn distill_conserves_crude() {
        let (products, loss) = standard_yields().distill(fixed(23.83));
        assert_eq!(products.total() + loss, fixed(23.83));
        assert!(loss > Fixed64::ZERO);
    }

    #[test]
    fn distill_fractions() {
        let (products, _) = standard_yields().distill(fixed(100.0));
        assert!((products.gasoline - fixed(19.0)).abs() < fixed(1e-6));
        assert!((products.naphtha - fixed(42.0)).abs() < fixed(1e-6));
        assert!((products.asphalt - fixed(13.0)).abs() < fixed(1e-6));
    }

    #[test]
    fn crude_equivalent_picks_binding_commodity() {
        let demand = Products::new(fixed(4.38), fixed(12.96), fixed(1.21));
        let need = standard_yields().crude_equivalent(&demand);
        assert!((need - fixed(30.857)).abs() < fixed(1e-3));
    }

    #[test]
    fn crude_equivalent_of_nothing_is_zero() {
        assert_eq!(standard_yields().crude_equivalent(&Products::ZERO), Fixed64::ZERO);
    }

    #[test]
    fn crude_equivalent_saturates_on_huge_demand() {
        let demand = Products::new(fixed(1.0e9), fixed(12.96), Fixed64::ZERO);
        assert_eq!(standard_yields().crude_equivalent(&demand), Fixed64::MAX);
    }

    #[test]
    fn crude_equivalent_skips_zero_fraction() {
        let yields = Yields::new(fixed(0.5), Fixed64::ZERO, fixed(0.25));
        let demand = Products::new(fixed(2.0), fixed(100.0), fixed(1.0));
        assert_eq!(yields.crude_equivalent(&demand), fixed(4.0));
    }

    #[test]
    fn excess_over_clamps_each_commodity() {
        let a = Products::new(fixed(5.0), fixed(1.0), fixed(0.0));
        let b = Products::new(fixed(2.0), fixed(3.0), fixed(0.0));
        assert_eq!(a.excess_over(&b), Products::new(fixed(3.0), Fixed64::ZERO, Fixed64::ZERO));
    }

    #[test]
    fn set_and_get() {
        let mut p = Products::ZERO;
        p.set(Commodity::Naphtha, fixed(7.0));
        assert_eq!(p.get(Commodity::Naphtha), fixed(7.0));
        assert_eq!(p.total(), fixed(7.0));
    }
}
