//! `PostgreSQL` storage for Caravan.
//!
//! Ledgers are the only state that survives a turn. This crate persists
//! them per city and per turn, with one transaction per committed turn,
//! and stores world graph documents in a generic node/edge schema.
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool
//! - [`ledger_store`] -- [`PostgresLedgerStore`], the persistent
//!   [`LedgerStore`](caravan_ledger::LedgerStore)
//! - [`graph_store`] -- Graph document export and import
//! - [`error`] -- Shared error types

pub mod error;
pub mod graph_store;
pub mod ledger_store;
pub mod postgres;

// Re-export primary types for convenience.
pub use error::DbError;
pub use graph_store::{GraphEdgeRow, GraphNodeRow, GraphStore};
pub use ledger_store::{CityLedgerRow, PostgresLedgerStore};
pub use postgres::PostgresPool;
