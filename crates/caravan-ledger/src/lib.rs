//! Per-city resource ledgers for the Caravan propagation engine.
//!
//! Every city holds one [`ResourceLedger`] per turn: what it knows about
//! resource flows elsewhere in the world, how many hops away each origin
//! is, and when the knowledge arrived. This crate owns the ledger value and
//! its three primitives, the stored wire shape, and the storage boundary.
//!
//! # Modules
//!
//! - [`ledger`] -- [`ResourceLedger`]: `seed`, `merge_incoming`, `purge_self`.
//! - [`codec`] -- JSON encoding with per-record shape validation.
//! - [`store`] -- [`LedgerStore`] trait and the in-memory implementation.
//! - [`error`] -- Storage and data-shape errors.
//!
//! # Usage
//!
//! ```
//! use caravan_ledger::ResourceLedger;
//! use caravan_types::{CityName, FacilityFlow, FlowKind, ResourceName};
//! use rust_decimal::Decimal;
//!
//! let city1 = CityName::new("City1");
//! let flows = [FacilityFlow {
//!     resource: ResourceName::new("Wood"),
//!     kind: FlowKind::Produces,
//!     rate: Decimal::new(10, 0),
//!     price: None,
//! }];
//!
//! // City2 hears about City1's wood one hop later.
//! let seeded = ResourceLedger::seed(&city1, &flows, 1);
//! let mut city2 = ResourceLedger::new();
//! city2.merge_incoming(seeded.records().map(|r| r.hopped(1)));
//! city2.purge_self(&CityName::new("City2"));
//!
//! let wood = city2.get(&ResourceName::new("Wood"), &city1);
//! assert_eq!(wood.map(|r| r.hops), Some(1));
//! ```

pub mod codec;
pub mod error;
pub mod ledger;
pub mod store;

// Re-export primary types at crate root.
pub use codec::DecodedLedger;
pub use error::{DataShapeError, MalformedRecord, StoreError};
pub use ledger::ResourceLedger;
pub use store::{LedgerBlobs, LedgerStore, MemoryLedgerStore};
