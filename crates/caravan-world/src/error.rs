//! Error types for the `caravan-world` crate.
//!
//! Every variant is a configuration problem: malformed or missing topology
//! or facility data discovered while the world is being set up. None of
//! them can occur once propagation has started.

use caravan_types::{CityName, FacilityId, ResourceName};

/// Errors that can occur while building or validating the world.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The world has no cities at all.
    #[error("world has no cities")]
    NoCities,

    /// A city was not found in the world graph.
    #[error("city not found: {0}")]
    CityNotFound(CityName),

    /// A road references an endpoint that is not in the world graph.
    #[error("road {from} -> {to} has a dangling endpoint")]
    DanglingRoad {
        /// Source city of the road.
        from: CityName,
        /// Destination city of the road.
        to: CityName,
    },

    /// A duplicate city was inserted where uniqueness is required.
    #[error("duplicate city: {0}")]
    DuplicateCity(CityName),

    /// A duplicate resource was registered.
    #[error("duplicate resource: {0}")]
    DuplicateResource(ResourceName),

    /// A facility references a resource that was never registered.
    #[error("facility {facility} references unknown resource {resource}")]
    UnknownResource {
        /// The offending facility.
        facility: FacilityId,
        /// The unregistered resource.
        resource: ResourceName,
    },

    /// A duplicate facility identifier was inserted.
    #[error("duplicate facility: {0}")]
    DuplicateFacility(FacilityId),

    /// A graph document could not be turned into a world.
    #[error("invalid graph document: {0}")]
    InvalidDocument(String),
}
