//! World graph, facility catalog, and graph documents for Caravan.
//!
//! This crate models the static world that knowledge propagates over:
//! cities as a directed graph, roads as edges, and the production and
//! consumption facilities each city owns.
//!
//! # Modules
//!
//! - [`catalog`] -- [`FacilityCatalog`]: resources, per-city facility rosters,
//!   and flow resolution for seeding.
//! - [`error`] -- Error types for world construction and validation.
//! - [`graph_io`] -- Export to and import from a generic node/edge
//!   [`GraphDocument`].
//! - [`starting_world`] -- Default five-city chain with its facilities.
//! - [`world_graph`] -- [`WorldGraph`]: cities as nodes, roads as edges.
//!
//! [`GraphDocument`]: graph_io::GraphDocument

pub mod catalog;
pub mod error;
pub mod graph_io;
pub mod starting_world;
pub mod world_graph;

// Re-export primary types at crate root.
pub use catalog::FacilityCatalog;
pub use error::WorldError;
pub use graph_io::{GraphDocument, GraphEdge, GraphNode, export_world, import_world};
pub use starting_world::create_starting_world;
pub use world_graph::WorldGraph;
