//! World graph: cities as nodes, roads as directed edges.
//!
//! The [`WorldGraph`] is the static backbone of propagation. It is built once
//! at setup and only read afterwards. Any directed graph is accepted,
//! including sink cities with no outgoing roads, parallel roads and
//! self-loops.
//!
//! Internally, an adjacency map indexes outbound roads per city:
//! `BTreeMap<CityName, Vec<Road>>`. A reverse adjacency map indexes the
//! cities each city can be reached from.

use std::collections::BTreeMap;

use caravan_types::{City, CityName, Road};

use crate::error::WorldError;

/// The world graph holding all cities and roads.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WorldGraph {
    /// All cities indexed by name.
    cities: BTreeMap<CityName, City>,
    /// Outbound adjacency: city -> roads departing from it, in insertion order.
    outbound: BTreeMap<CityName, Vec<Road>>,
    /// Inbound adjacency: city -> cities with a road arriving at it.
    inbound: BTreeMap<CityName, Vec<CityName>>,
}

impl WorldGraph {
    /// Create an empty world graph.
    pub const fn new() -> Self {
        Self {
            cities: BTreeMap::new(),
            outbound: BTreeMap::new(),
            inbound: BTreeMap::new(),
        }
    }

    // -------------------------------------------------------------------
    // City operations
    // -------------------------------------------------------------------

    /// Add a city to the world graph.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateCity`] if a city with the same name
    /// already exists.
    pub fn add_city(&mut self, city: City) -> Result<(), WorldError> {
        if self.cities.contains_key(&city.name) {
            return Err(WorldError::DuplicateCity(city.name));
        }
        let name = city.name.clone();
        self.outbound.entry(name.clone()).or_default();
        self.inbound.entry(name.clone()).or_default();
        self.cities.insert(name, city);
        Ok(())
    }

    /// Whether a city with this name exists.
    pub fn contains(&self, city: &CityName) -> bool {
        self.cities.contains_key(city)
    }

    /// Get a city by name.
    pub fn get_city(&self, city: &CityName) -> Option<&City> {
        self.cities.get(city)
    }

    /// Return the number of cities in the graph.
    pub fn city_count(&self) -> usize {
        self.cities.len()
    }

    /// Iterate over all cities in name order.
    pub fn cities(&self) -> impl Iterator<Item = &City> {
        self.cities.values()
    }

    /// Return all city names in name order.
    pub fn city_names(&self) -> Vec<CityName> {
        self.cities.keys().cloned().collect()
    }

    // -------------------------------------------------------------------
    // Road operations
    // -------------------------------------------------------------------

    /// Add a directed road from `from` to `to`.
    ///
    /// Both endpoints must already exist. Parallel roads and self-loops are
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DanglingRoad`] if either endpoint is missing.
    pub fn add_road(
        &mut self,
        from: &CityName,
        to: &CityName,
        distance: u32,
    ) -> Result<(), WorldError> {
        if !self.cities.contains_key(from) || !self.cities.contains_key(to) {
            return Err(WorldError::DanglingRoad {
                from: from.clone(),
                to: to.clone(),
            });
        }

        self.outbound.entry(from.clone()).or_default().push(Road {
            neighbor: to.clone(),
            distance,
        });
        self.inbound.entry(to.clone()).or_default().push(from.clone());
        Ok(())
    }

    /// Return the roads leaving `city`, in insertion order.
    ///
    /// Unknown cities and sinks both yield an empty slice.
    pub fn outgoing_roads(&self, city: &CityName) -> &[Road] {
        self.outbound.get(city).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Return the cities with a road arriving at `city`.
    pub fn predecessors(&self, city: &CityName) -> &[CityName] {
        self.inbound.get(city).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Return the total number of roads in the graph.
    pub fn road_count(&self) -> usize {
        self.outbound.values().map(Vec::len).sum()
    }

    /// Iterate over every road as `(source, road)`.
    pub fn roads(&self) -> impl Iterator<Item = (&CityName, &Road)> {
        self.outbound
            .iter()
            .flat_map(|(from, roads)| roads.iter().map(move |road| (from, road)))
    }

    /// Cities with zero out-degree. They still seed, but never forward.
    pub fn sinks(&self) -> Vec<CityName> {
        self.cities
            .keys()
            .filter(|name| self.outgoing_roads(name).is_empty())
            .cloned()
            .collect()
    }

    // -------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------

    /// Check that the world can be propagated over.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NoCities`] if the graph is empty.
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.cities.is_empty() {
            return Err(WorldError::NoCities);
        }
        Ok(())
    }
}
