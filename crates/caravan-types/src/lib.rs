//! Shared type definitions for the Caravan resource propagation engine.
//!
//! Every crate in the workspace speaks in these types: the world graph,
//! the facility catalog, the per-city ledgers and the stores.
//!
//! # Modules
//!
//! - [`names`] -- Type-safe name wrappers for cities, resources and facilities
//! - [`structs`] -- World entities and the propagated [`ResourceRecord`]

pub mod names;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use names::{CityName, FacilityId, ResourceName};
pub use structs::{
    City, Facility, FacilityFlow, FlowKind, Resource, ResourceFlow, ResourceRecord, Road,
};
