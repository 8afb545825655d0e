//! Facility catalog: which city produces or consumes what, at which rate.
//!
//! The catalog owns the registered [`Resource`] definitions (and their
//! optional global prices) and the facility roster of every city. It is
//! set up before the first turn and read-only afterwards; seeding pulls
//! [`FacilityFlow`]s from it every turn.

use std::collections::{BTreeMap, BTreeSet};

use caravan_types::{CityName, Facility, FacilityFlow, FacilityId, Resource, ResourceName};

use crate::error::WorldError;
use crate::world_graph::WorldGraph;

/// Per-city facility rosters plus the resource definitions they refer to.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FacilityCatalog {
    /// Registered resources indexed by name.
    resources: BTreeMap<ResourceName, Resource>,
    /// Facilities per owning city, in insertion order.
    facilities: BTreeMap<CityName, Vec<Facility>>,
    /// Every facility identifier in use.
    facility_ids: BTreeSet<FacilityId>,
}

impl FacilityCatalog {
    /// Create an empty catalog.
    pub const fn new() -> Self {
        Self {
            resources: BTreeMap::new(),
            facilities: BTreeMap::new(),
            facility_ids: BTreeSet::new(),
        }
    }

    /// Register a resource definition.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateResource`] if the name is taken.
    pub fn register_resource(&mut self, resource: Resource) -> Result<(), WorldError> {
        if self.resources.contains_key(&resource.name) {
            return Err(WorldError::DuplicateResource(resource.name));
        }
        self.resources.insert(resource.name.clone(), resource);
        Ok(())
    }

    /// Look up a registered resource.
    pub fn resource(&self, name: &ResourceName) -> Option<&Resource> {
        self.resources.get(name)
    }

    /// Iterate over all registered resources in name order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Attach a facility to `city`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownResource`] if the facility's flow names
    /// an unregistered resource, or [`WorldError::DuplicateFacility`] if the
    /// identifier is already in use.
    pub fn add_facility(&mut self, city: CityName, facility: Facility) -> Result<(), WorldError> {
        if !self.resources.contains_key(&facility.flow.resource) {
            return Err(WorldError::UnknownResource {
                facility: facility.id,
                resource: facility.flow.resource,
            });
        }
        if !self.facility_ids.insert(facility.id.clone()) {
            return Err(WorldError::DuplicateFacility(facility.id));
        }
        self.facilities.entry(city).or_default().push(facility);
        Ok(())
    }

    /// Return the facilities owned by `city`, in insertion order.
    pub fn facilities_of(&self, city: &CityName) -> &[Facility] {
        self.facilities.get(city).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate over `(city, facilities)` for every city with a roster.
    pub fn rosters(&self) -> impl Iterator<Item = (&CityName, &[Facility])> {
        self.facilities
            .iter()
            .map(|(city, facilities)| (city, facilities.as_slice()))
    }

    /// Return the total number of facilities.
    pub fn facility_count(&self) -> usize {
        self.facility_ids.len()
    }

    /// Resolve the flows of `city`'s facilities against the resource prices.
    pub fn flows_of(&self, city: &CityName) -> Vec<FacilityFlow> {
        self.facilities_of(city)
            .iter()
            .map(|facility| FacilityFlow {
                resource: facility.flow.resource.clone(),
                kind: facility.flow.kind,
                rate: facility.flow.rate,
                price: self
                    .resources
                    .get(&facility.flow.resource)
                    .and_then(|resource| resource.price),
            })
            .collect()
    }

    /// Check that every city owning facilities exists in `world`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CityNotFound`] for the first unknown city.
    pub fn validate_against(&self, world: &WorldGraph) -> Result<(), WorldError> {
        for city in self.facilities.keys() {
            if !world.contains(city) {
                return Err(WorldError::CityNotFound(city.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use caravan_types::{City, FlowKind, ResourceFlow};
    use rust_decimal_macros::dec;

    use super::*;

    fn facility(id: &str, resource: &str, kind: FlowKind, rate: rust_decimal::Decimal) -> Facility {
        Facility {
            id: FacilityId::new(id),
            label: format!("Facility {id}"),
            rate,
            flow: ResourceFlow {
                resource: ResourceName::new(resource),
                kind,
                rate,
            },
        }
    }

    fn make_catalog() -> FacilityCatalog {
        let mut catalog = FacilityCatalog::new();
        catalog
            .register_resource(Resource::new("Wood").with_price(dec!(3)))
            .unwrap();
        catalog.register_resource(Resource::new("Iron")).unwrap();
        catalog
            .add_facility(
                CityName::new("City1"),
                facility("F1", "Wood", FlowKind::Produces, dec!(10)),
            )
            .unwrap();
        catalog
            .add_facility(
                CityName::new("City1"),
                facility("F2", "Iron", FlowKind::Consumes, dec!(4)),
            )
            .unwrap();
        catalog
    }

    #[test]
    fn flows_carry_resource_price() {
        let catalog = make_catalog();
        let flows = catalog.flows_of(&CityName::new("City1"));
        assert_eq!(flows.len(), 2);

        let wood = flows.iter().find(|f| f.resource == ResourceName::new("Wood"));
        assert_eq!(wood.map(|f| f.price), Some(Some(dec!(3))));
        assert_eq!(wood.map(|f| f.kind), Some(FlowKind::Produces));

        let iron = flows.iter().find(|f| f.resource == ResourceName::new("Iron"));
        assert_eq!(iron.map(|f| f.price), Some(None));
    }

    #[test]
    fn relation_rate_is_authoritative() {
        let mut catalog = make_catalog();
        let mut mill = facility("F9", "Wood", FlowKind::Produces, dec!(12));
        mill.rate = dec!(99);
        catalog.add_facility(CityName::new("City2"), mill).unwrap();

        let flows = catalog.flows_of(&CityName::new("City2"));
        assert_eq!(flows.first().map(|f| f.rate), Some(dec!(12)));
    }

    #[test]
    fn unknown_resource_rejected() {
        let mut catalog = make_catalog();
        let result = catalog.add_facility(
            CityName::new("City1"),
            facility("F3", "Gold", FlowKind::Produces, dec!(1)),
        );
        assert!(matches!(result, Err(WorldError::UnknownResource { .. })));
    }

    #[test]
    fn duplicate_facility_and_resource_rejected() {
        let mut catalog = make_catalog();
        let result = catalog.add_facility(
            CityName::new("City2"),
            facility("F1", "Wood", FlowKind::Produces, dec!(1)),
        );
        assert!(matches!(result, Err(WorldError::DuplicateFacility(_))));
        assert!(matches!(
            catalog.register_resource(Resource::new("Wood")),
            Err(WorldError::DuplicateResource(_))
        ));
        assert_eq!(catalog.facility_count(), 2);
    }

    #[test]
    fn city_without_facilities_has_no_flows() {
        let catalog = make_catalog();
        assert!(catalog.facilities_of(&CityName::new("City5")).is_empty());
        assert!(catalog.flows_of(&CityName::new("City5")).is_empty());
    }

    #[test]
    fn validate_against_world() {
        let catalog = make_catalog();
        let mut world = WorldGraph::new();
        world.add_city(City::new("City2")).unwrap();
        assert!(matches!(
            catalog.validate_against(&world),
            Err(WorldError::CityNotFound(_))
        ));

        world.add_city(City::new("City1")).unwrap();
        assert!(catalog.validate_against(&world).is_ok());
    }
}
