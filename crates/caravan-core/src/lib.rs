//! Turn engine, driver loop, and configuration for Caravan.
//!
//! This crate owns the three-phase turn that moves resource knowledge along
//! roads: Seeding, Propagating, and Sanitizing. Each turn reads the previous
//! turn's ledgers from a [`LedgerStore`], computes every new ledger in
//! memory, and commits them in one call.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `caravan-config.yaml` into
//!   strongly-typed structs.
//! - [`engine`] -- [`PropagationEngine`] and the per-turn state machine.
//! - [`runner`] -- [`run_turns`] driver loop with a [`TurnCallback`].
//! - [`turn`] -- The three phases as pure functions.
//!
//! [`LedgerStore`]: caravan_ledger::LedgerStore
//! [`run_turns`]: runner::run_turns
//! [`TurnCallback`]: runner::TurnCallback

pub mod config;
pub mod engine;
pub mod runner;
pub mod turn;

pub use engine::{PropagationEngine, PropagationError, PropagationOptions, TurnPhase, TurnSummary};
pub use turn::Ledgers;
