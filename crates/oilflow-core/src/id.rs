use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// One of the two parallel peers of a pair (two supply routes, two refineries).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::First, Side::Second];

    /// The other member of the pair.
    pub fn peer(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }
}

/// A value for each side of a two-peer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pair<T> {
    pub first: T,
    pub second: T,
}

impl<T> Pair<T> {
    pub fn new(first: T, second: T) -> Self {
        Self { first, second }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Pair<U> {
        Pair {
            first: f(self.first),
            second: f(self.second),
        }
    }

    pub fn as_ref(&self) -> Pair<&T> {
        Pair {
            first: &self.first,
            second: &self.second,
        }
    }

    /// Iterate `(side, value)` in side order.
    pub fn iter(&self) -> impl Iterator<Item = (Side, &T)> {
        [(Side::First, &self.first), (Side::Second, &self.second)].into_iter()
    }
}

impl<T: Clone> Pair<T> {
    pub fn splat(value: T) -> Self {
        Self {
            first: value.clone(),
            second: value,
        }
    }
}

impl<T> Index<Side> for Pair<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        match side {
            Side::First => &self.first,
            Side::Second => &self.second,
        }
    }
}

impl<T> IndexMut<Side> for Pair<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::First => &mut self.first,
            Side::Second => &mut self.second,
        }
    }
}

/// Identifies a transport link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LinkId {
    /// The link carrying a supply route's production to the dispatcher.
    Route(Side),
    /// The internal hop from the dispatcher to one refinery.
    Hop,
}

/// Identifies any facility an operator can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FacilityId {
    Route(Side),
    Refinery(Side),
    Hop,
    Reserve,
}

impl FacilityId {
    pub const ALL: [FacilityId; 6] = [
        FacilityId::Route(Side::First),
        FacilityId::Route(Side::Second),
        FacilityId::Refinery(Side::First),
        FacilityId::Refinery(Side::Second),
        FacilityId::Hop,
        FacilityId::Reserve,
    ];

    /// Facilities the operator may mark broken or fixed.
    pub const BREAKABLE: [FacilityId; 4] = [
        FacilityId::Route(Side::First),
        FacilityId::Route(Side::Second),
        FacilityId::Refinery(Side::First),
        FacilityId::Refinery(Side::Second),
    ];

    pub fn is_breakable(self) -> bool {
        matches!(self, FacilityId::Route(_) | FacilityId::Refinery(_))
    }
}

impl From<LinkId> for FacilityId {
    fn from(link: LinkId) -> Self {
        match link {
            LinkId::Route(side) => FacilityId::Route(side),
            LinkId::Hop => FacilityId::Hop,
        }
    }
}

/// The three refined products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Commodity {
    Gasoline,
    Naphtha,
    Asphalt,
}

impl Commodity {
    pub const ALL: [Commodity; 3] = [Commodity::Gasoline, Commodity::Naphtha, Commodity::Asphalt];
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Commodity::Gasoline => "gasoline",
            Commodity::Naphtha => "naphtha",
            Commodity::Asphalt => "asphalt",
        };
        f.write_str(name)
    }
}

/// Returned when a commodity name matches none of the known aliases.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown commodity '{0}'")]
pub struct UnknownCommodity(pub String);

impl FromStr for Commodity {
    type Err = UnknownCommodity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gasoline" | "benzin" | "natural" | "b" | "g" => Ok(Commodity::Gasoline),
            "naphtha" | "naphta" | "nafta" | "diesel" | "n" | "d" => Ok(Commodity::Naphtha),
            "asphalt" | "asfalt" | "a" => Ok(Commodity::Asphalt),
            _ => Err(UnknownCommodity(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_peer_roundtrip() {
        assert_eq!(Side::First.peer(), Side::Second);
        assert_eq!(Side::Second.peer().peer(), Side::Second);
    }

    #[test]
    fn pair_indexing() {
        let mut pair = Pair::new(1, 2);
        assert_eq!(pair[Side::First], 1);
        pair[Side::Second] = 5;
        assert_eq!(pair.second, 5);
    }

    #[test]
    fn only_routes_and_refineries_break() {
        assert!(FacilityId::Route(Side::First).is_breakable());
        assert!(FacilityId::Refinery(Side::Second).is_breakable());
        assert!(!FacilityId::Hop.is_breakable());
        assert!(!FacilityId::Reserve.is_breakable());
        assert!(FacilityId::BREAKABLE.iter().all(|f| f.is_breakable()));
    }

    #[test]
    fn commodity_aliases() {
        assert_eq!("Benzin".parse::<Commodity>().unwrap(), Commodity::Gasoline);
        assert_eq!("diesel".parse::<Commodity>().unwrap(), Commodity::Naphtha);
        assert_eq!("a".parse::<Commodity>().unwrap(), Commodity::Asphalt);
        assert!("kerosene".parse::<Commodity>().is_err());
    }
}
