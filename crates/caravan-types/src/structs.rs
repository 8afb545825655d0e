//! Core entity structs for the Caravan world.
//!
//! Covers the static world (`City`, `Road`, `Resource`, `Facility`) and the
//! unit of propagated knowledge, [`ResourceRecord`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::names::{CityName, FacilityId, ResourceName};

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// A city in the world graph. Identity is its name alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    /// Unique city name.
    pub name: CityName,
}

impl City {
    /// Create a city with the given name.
    pub fn new(name: impl Into<CityName>) -> Self {
        Self { name: name.into() }
    }
}

/// A directed road leaving a city.
///
/// The source city is implied by where the road is stored in the world
/// graph. `distance` is informational: knowledge always travels exactly one
/// road per turn regardless of length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Road {
    /// The city this road leads to.
    pub neighbor: CityName,
    /// Road length, as recorded at setup.
    pub distance: u32,
}

/// A tradeable resource with an optional global price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique resource name.
    pub name: ResourceName,
    /// Global price, copied into every record about this resource.
    pub price: Option<Decimal>,
}

impl Resource {
    /// Create a resource without a price.
    pub fn new(name: impl Into<ResourceName>) -> Self {
        Self {
            name: name.into(),
            price: None,
        }
    }

    /// Attach a global price.
    #[must_use]
    pub const fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }
}

// ---------------------------------------------------------------------------
// Facilities
// ---------------------------------------------------------------------------

/// Direction of a facility's resource flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FlowKind {
    /// The facility produces the resource.
    Produces,
    /// The facility consumes the resource.
    Consumes,
}

impl FlowKind {
    /// The relation label used in graph documents (`PRODUCES` / `CONSUMES`).
    pub const fn relation(self) -> &'static str {
        match self {
            Self::Produces => "PRODUCES",
            Self::Consumes => "CONSUMES",
        }
    }

    /// Parse a relation label back into a kind.
    pub fn from_relation(label: &str) -> Option<Self> {
        match label {
            "PRODUCES" => Some(Self::Produces),
            "CONSUMES" => Some(Self::Consumes),
            _ => None,
        }
    }
}

/// The single PRODUCES or CONSUMES relation of a facility.
///
/// Its `rate` may differ from the facility's nominal rate and is the one
/// that propagates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFlow {
    /// The resource produced or consumed.
    pub resource: ResourceName,
    /// Whether the facility produces or consumes it.
    pub kind: FlowKind,
    /// Authoritative flow rate.
    pub rate: Decimal,
}

/// A production or consumption facility owned by one city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    /// Unique facility identifier (e.g. `F1`).
    pub id: FacilityId,
    /// Human-readable type label (e.g. `Lumber Mill`).
    pub label: String,
    /// Nominal rate of the facility.
    pub rate: Decimal,
    /// The facility's resource relation.
    pub flow: ResourceFlow,
}

/// A facility flow resolved against the resource catalog.
///
/// This is what seeding consumes: resource, direction, rate and the
/// resource's global price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityFlow {
    /// The resource produced or consumed.
    pub resource: ResourceName,
    /// Whether the resource is produced or consumed.
    pub kind: FlowKind,
    /// The relation's rate.
    pub rate: Decimal,
    /// The resource's global price, if any.
    pub price: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Propagated knowledge
// ---------------------------------------------------------------------------

/// One piece of knowledge about a resource flow at an origin city.
///
/// There is deliberately no produces/consumes field: once a flow is
/// seeded into a ledger both directions travel identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// The resource this record describes.
    pub resource: ResourceName,
    /// The city where the flow originates.
    pub origin_city: CityName,
    /// Flow rate at the origin.
    pub rate: Decimal,
    /// Resource price carried along unchanged.
    pub price: Option<Decimal>,
    /// Roads travelled from the origin.
    pub hops: u32,
    /// Turn at which the record was deposited at its current holder.
    pub turn: u64,
}

impl ResourceRecord {
    /// Build a hop-0 record for a flow at its origin city.
    pub fn seeded(origin_city: CityName, flow: &FacilityFlow, turn: u64) -> Self {
        Self {
            resource: flow.resource.clone(),
            origin_city,
            rate: flow.rate,
            price: flow.price,
            hops: 0,
            turn,
        }
    }

    /// The copy of this record that arrives one road further on at `turn`.
    #[must_use]
    pub fn hopped(&self, turn: u64) -> Self {
        Self {
            hops: self.hops.saturating_add(1),
            turn,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn wood_flow() -> FacilityFlow {
        FacilityFlow {
            resource: ResourceName::new("Wood"),
            kind: FlowKind::Produces,
            rate: dec!(10),
            price: Some(dec!(2.5)),
        }
    }

    #[test]
    fn seeded_record_starts_at_hop_zero() {
        let record = ResourceRecord::seeded(CityName::new("City1"), &wood_flow(), 3);
        assert_eq!(record.hops, 0);
        assert_eq!(record.turn, 3);
        assert_eq!(record.rate, dec!(10));
        assert_eq!(record.price, Some(dec!(2.5)));
        assert_eq!(record.origin_city, "City1");
    }

    #[test]
    fn hopped_record_keeps_payload() {
        let record = ResourceRecord::seeded(CityName::new("City1"), &wood_flow(), 1);
        let next = record.hopped(2);
        assert_eq!(next.hops, 1);
        assert_eq!(next.turn, 2);
        assert_eq!(next.rate, record.rate);
        assert_eq!(next.price, record.price);
        assert_eq!(next.origin_city, record.origin_city);
    }

    #[test]
    fn hops_saturate() {
        let mut record = ResourceRecord::seeded(CityName::new("City1"), &wood_flow(), 1);
        record.hops = u32::MAX;
        assert_eq!(record.hopped(2).hops, u32::MAX);
    }

    #[test]
    fn flow_kind_relation_labels() {
        assert_eq!(FlowKind::Produces.relation(), "PRODUCES");
        assert_eq!(FlowKind::from_relation("CONSUMES"), Some(FlowKind::Consumes));
        assert_eq!(FlowKind::from_relation("ROAD"), None);
    }
}
