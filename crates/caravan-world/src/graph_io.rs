//! Generic node/edge documents for importing and exporting the world.
//!
//! A [`GraphDocument`] is a storage-agnostic property graph: nodes carry an
//! id, labels and a property map; edges carry source, target, a relation
//! type and a property map. The world maps onto it as follows:
//!
//! | Element  | Shape                                                       |
//! |----------|-------------------------------------------------------------|
//! | City     | node `City {name}`                                          |
//! | Resource | node `Resource {name, price?}`                              |
//! | Facility | node `Facility {id, type, rate}`                            |
//! | Road     | edge `City -[ROAD {distance}]-> City`                       |
//! | Roster   | edge `City -[HAS_FACILITY]-> Facility`                      |
//! | Flow     | edge `Facility -[PRODUCES\|CONSUMES {rate}]-> Resource`      |
//!
//! Nodes and edges with other labels or types are ignored on import, so a
//! document may carry unrelated data alongside the world.

use std::collections::BTreeMap;

use caravan_types::{
    City, CityName, Facility, FacilityId, FlowKind, Resource, ResourceFlow, ResourceName,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::FacilityCatalog;
use crate::error::WorldError;
use crate::world_graph::WorldGraph;

/// Node label for cities.
pub const CITY_LABEL: &str = "City";
/// Node label for resources.
pub const RESOURCE_LABEL: &str = "Resource";
/// Node label for facilities.
pub const FACILITY_LABEL: &str = "Facility";
/// Edge type for roads.
pub const ROAD_TYPE: &str = "ROAD";
/// Edge type linking a city to a facility it owns.
pub const HAS_FACILITY_TYPE: &str = "HAS_FACILITY";

/// A node in a [`GraphDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Document-unique node identifier.
    pub id: String,
    /// Node labels (e.g. `City`).
    #[serde(default)]
    pub labels: Vec<String>,
    /// Node properties.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl GraphNode {
    /// Whether the node carries `label`.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// A directed edge in a [`GraphDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Relation type (e.g. `ROAD`).
    #[serde(rename = "type")]
    pub rel_type: String,
    /// Edge properties.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// A generic property graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// All nodes.
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    /// All edges.
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl GraphDocument {
    /// Parse a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDocument`] if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, WorldError> {
        serde_json::from_str(json).map_err(|e| WorldError::InvalidDocument(e.to_string()))
    }

    /// Render the document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDocument`] if serialization fails.
    pub fn to_json(&self) -> Result<String, WorldError> {
        serde_json::to_string_pretty(self).map_err(|e| WorldError::InvalidDocument(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

fn city_node_id(name: &CityName) -> String {
    format!("city:{name}")
}

fn resource_node_id(name: &ResourceName) -> String {
    format!("resource:{name}")
}

fn facility_node_id(id: &FacilityId) -> String {
    format!("facility:{id}")
}

fn decimal_value(value: Decimal) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn properties<const N: usize>(pairs: [(&str, Value); N]) -> Map<String, Value> {
    pairs
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
}

/// Export the world and its facilities into a [`GraphDocument`].
pub fn export_world(world: &WorldGraph, catalog: &FacilityCatalog) -> GraphDocument {
    let mut doc = GraphDocument::default();

    for city in world.cities() {
        doc.nodes.push(GraphNode {
            id: city_node_id(&city.name),
            labels: vec![CITY_LABEL.to_owned()],
            properties: properties([("name", Value::from(city.name.as_str()))]),
        });
    }

    for resource in catalog.resources() {
        doc.nodes.push(GraphNode {
            id: resource_node_id(&resource.name),
            labels: vec![RESOURCE_LABEL.to_owned()],
            properties: properties([
                ("name", Value::from(resource.name.as_str())),
                ("price", resource.price.map_or(Value::Null, decimal_value)),
            ]),
        });
    }

    for (from, road) in world.roads() {
        doc.edges.push(GraphEdge {
            source: city_node_id(from),
            target: city_node_id(&road.neighbor),
            rel_type: ROAD_TYPE.to_owned(),
            properties: properties([("distance", Value::from(road.distance))]),
        });
    }

    for (city, facilities) in catalog.rosters() {
        for facility in facilities {
            let node_id = facility_node_id(&facility.id);
            doc.nodes.push(GraphNode {
                id: node_id.clone(),
                labels: vec![FACILITY_LABEL.to_owned()],
                properties: properties([
                    ("id", Value::from(facility.id.as_str())),
                    ("type", Value::from(facility.label.as_str())),
                    ("rate", decimal_value(facility.rate)),
                ]),
            });
            doc.edges.push(GraphEdge {
                source: city_node_id(city),
                target: node_id.clone(),
                rel_type: HAS_FACILITY_TYPE.to_owned(),
                properties: Map::new(),
            });
            doc.edges.push(GraphEdge {
                source: node_id,
                target: resource_node_id(&facility.flow.resource),
                rel_type: facility.flow.kind.relation().to_owned(),
                properties: properties([("rate", decimal_value(facility.flow.rate))]),
            });
        }
    }

    doc
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

fn invalid(message: impl Into<String>) -> WorldError {
    WorldError::InvalidDocument(message.into())
}

fn prop_str<'a>(props: &'a Map<String, Value>, key: &str, owner: &str) -> Result<&'a str, WorldError> {
    props
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(format!("{owner} is missing string property `{key}`")))
}

fn prop_decimal(props: &Map<String, Value>, key: &str) -> Result<Option<Decimal>, WorldError> {
    match props.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| invalid(format!("property `{key}` is not a number: {e}"))),
    }
}

/// A facility assembled from its node and its edges.
struct PendingFacility {
    owner: Option<CityName>,
    id: FacilityId,
    label: String,
    rate: Decimal,
    flow: Option<ResourceFlow>,
}

/// Rebuild the world and its facilities from a [`GraphDocument`].
///
/// # Errors
///
/// Returns [`WorldError::InvalidDocument`] for missing properties, edges
/// between unknown nodes, or facilities without exactly one owner and one
/// flow. Construction errors of the world itself (duplicate cities, unknown
/// resources) are returned as-is.
pub fn import_world(doc: &GraphDocument) -> Result<(WorldGraph, FacilityCatalog), WorldError> {
    let mut world = WorldGraph::new();
    let mut catalog = FacilityCatalog::new();

    let mut cities: BTreeMap<&str, CityName> = BTreeMap::new();
    let mut resources: BTreeMap<&str, ResourceName> = BTreeMap::new();
    let mut facilities: BTreeMap<&str, PendingFacility> = BTreeMap::new();

    for node in &doc.nodes {
        if node.has_label(CITY_LABEL) {
            let name = CityName::new(prop_str(&node.properties, "name", &node.id)?);
            world.add_city(City::new(name.clone()))?;
            cities.insert(node.id.as_str(), name);
        } else if node.has_label(RESOURCE_LABEL) {
            let name = ResourceName::new(prop_str(&node.properties, "name", &node.id)?);
            let mut resource = Resource::new(name.clone());
            resource.price = prop_decimal(&node.properties, "price")?;
            catalog.register_resource(resource)?;
            resources.insert(node.id.as_str(), name);
        } else if node.has_label(FACILITY_LABEL) {
            let id = FacilityId::new(prop_str(&node.properties, "id", &node.id)?);
            let label = node
                .properties
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            let rate = prop_decimal(&node.properties, "rate")?.unwrap_or_default();
            facilities.insert(
                node.id.as_str(),
                PendingFacility {
                    owner: None,
                    id,
                    label,
                    rate,
                    flow: None,
                },
            );
        } else {
            tracing::debug!(node = node.id.as_str(), labels = ?node.labels, "Ignoring node");
        }
    }

    for edge in &doc.edges {
        let rel = edge.rel_type.as_str();
        if rel == ROAD_TYPE {
            let (Some(from), Some(to)) = (cities.get(edge.source.as_str()), cities.get(edge.target.as_str()))
            else {
                return Err(invalid(format!(
                    "ROAD {} -> {} does not connect two cities",
                    edge.source, edge.target
                )));
            };
            let distance = edge
                .properties
                .get("distance")
                .and_then(Value::as_u64)
                .and_then(|d| u32::try_from(d).ok())
                .ok_or_else(|| invalid(format!("ROAD {} -> {} has no distance", edge.source, edge.target)))?;
            world.add_road(from, to, distance)?;
        } else if rel == HAS_FACILITY_TYPE {
            let (Some(city), Some(pending)) = (
                cities.get(edge.source.as_str()),
                facilities.get_mut(edge.target.as_str()),
            ) else {
                return Err(invalid(format!(
                    "HAS_FACILITY {} -> {} does not link a city to a facility",
                    edge.source, edge.target
                )));
            };
            if pending.owner.replace(city.clone()).is_some() {
                return Err(invalid(format!("facility {} has more than one owner", pending.id)));
            }
        } else if let Some(kind) = FlowKind::from_relation(rel) {
            let (Some(pending), Some(resource)) = (
                facilities.get_mut(edge.source.as_str()),
                resources.get(edge.target.as_str()),
            ) else {
                return Err(invalid(format!(
                    "{rel} {} -> {} does not link a facility to a resource",
                    edge.source, edge.target
                )));
            };
            let rate = prop_decimal(&edge.properties, "rate")?.unwrap_or(pending.rate);
            let flow = ResourceFlow {
                resource: resource.clone(),
                kind,
                rate,
            };
            if pending.flow.replace(flow).is_some() {
                return Err(invalid(format!("facility {} has more than one flow", pending.id)));
            }
        } else {
            tracing::debug!(rel, "Ignoring edge");
        }
    }

    for pending in facilities.into_values() {
        let Some(owner) = pending.owner else {
            return Err(invalid(format!("facility {} has no owning city", pending.id)));
        };
        let Some(flow) = pending.flow else {
            return Err(invalid(format!("facility {} has no resource flow", pending.id)));
        };
        catalog.add_facility(
            owner,
            Facility {
                id: pending.id,
                label: pending.label,
                rate: pending.rate,
                flow,
            },
        )?;
    }

    Ok((world, catalog))
}
