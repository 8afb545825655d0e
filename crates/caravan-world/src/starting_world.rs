//! Default starting world for the Caravan engine.
//!
//! Five cities connected in a one-way chain `City1 -> City2 -> ... -> City5`,
//! three resources (Wood, Food, Iron) and four facilities:
//!
//! | City  | Facility         | Flow              |
//! |-------|------------------|-------------------|
//! | City1 | F1 Lumber Mill   | produces Wood, 10 |
//! | City2 | F2 Farm          | produces Food, 8  |
//! | City2 | F3 Mine          | produces Iron, 6  |
//! | City5 | F4 Carpenter     | consumes Wood, 5  |
//!
//! Road distances are drawn uniformly from `1..=10` using a seeded RNG, so
//! the same seed always yields the same world.

use caravan_types::{
    City, CityName, Facility, FacilityId, FlowKind, Resource, ResourceFlow, ResourceName,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::catalog::FacilityCatalog;
use crate::error::WorldError;
use crate::world_graph::WorldGraph;

/// Number of cities in the starting chain.
pub const STARTING_CITY_COUNT: u32 = 5;

/// Resources registered in the starting world.
pub const STARTING_RESOURCES: [&str; 3] = ["Wood", "Food", "Iron"];

/// Name of the `n`-th starting city (1-based).
pub fn city_name(n: u32) -> CityName {
    CityName::new(format!("City{n}"))
}

/// Helper to build a [`Facility`] whose flow rate equals its nominal rate.
fn facility(id: &str, label: &str, resource: &str, kind: FlowKind, rate: i64) -> Facility {
    let rate = Decimal::from(rate);
    Facility {
        id: FacilityId::new(id),
        label: label.to_owned(),
        rate,
        flow: ResourceFlow {
            resource: ResourceName::new(resource),
            kind,
            rate,
        },
    }
}

/// Create the default starting world and its facility catalog.
///
/// # Errors
///
/// Returns [`WorldError`] if construction fails (should not happen with
/// valid hard-coded data).
pub fn create_starting_world(seed: u64) -> Result<(WorldGraph, FacilityCatalog), WorldError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut world = WorldGraph::new();

    for n in 1..=STARTING_CITY_COUNT {
        world.add_city(City::new(city_name(n)))?;
    }
    for n in 1..STARTING_CITY_COUNT {
        let distance = rng.random_range(1..=10);
        world.add_road(&city_name(n), &city_name(n.saturating_add(1)), distance)?;
    }

    let mut catalog = FacilityCatalog::new();
    for resource in STARTING_RESOURCES {
        catalog.register_resource(Resource::new(resource))?;
    }

    catalog.add_facility(
        city_name(1),
        facility("F1", "Lumber Mill", "Wood", FlowKind::Produces, 10),
    )?;
    catalog.add_facility(
        city_name(2),
        facility("F2", "Farm", "Food", FlowKind::Produces, 8),
    )?;
    catalog.add_facility(
        city_name(2),
        facility("F3", "Mine", "Iron", FlowKind::Produces, 6),
    )?;
    catalog.add_facility(
        city_name(5),
        facility("F4", "Carpenter", "Wood", FlowKind::Consumes, 5),
    )?;

    tracing::debug!(
        seed,
        cities = world.city_count(),
        roads = world.road_count(),
        facilities = catalog.facility_count(),
        "Starting world created"
    );

    Ok((world, catalog))
}
