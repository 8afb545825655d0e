//! The ledger store boundary.
//!
//! The propagation engine never mutates a store mid-turn. It batch-reads
//! every ledger of the previous turn with [`LedgerStore::load_turn`],
//! computes the whole turn in memory, then hands every finalized ledger to
//! [`LedgerStore::commit_turn`] in one call. Implementations must apply a
//! commit atomically: either every city's ledger for the turn becomes
//! visible, or none does.
//!
//! Ledgers cross this boundary in their JSON wire shape (see
//! [`codec`](crate::codec)), one blob per city.

use std::collections::BTreeMap;
use std::future::Future;

use caravan_types::CityName;
use serde_json::Value;

use crate::codec::{self, DecodedLedger};
use crate::error::StoreError;

/// Stored ledgers of one turn: city -> JSON ledger blob.
pub type LedgerBlobs = BTreeMap<CityName, Value>;

/// Persistent storage for per-city, per-turn ledgers.
pub trait LedgerStore: Send + Sync {
    /// Read every ledger committed for `turn`.
    ///
    /// Returns `None` if the turn was never committed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn load_turn(
        &self,
        turn: u64,
    ) -> impl Future<Output = Result<Option<LedgerBlobs>, StoreError>> + Send;

    /// Atomically store every ledger of `turn`, replacing any earlier
    /// commit of the same turn.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails; nothing of the turn may
    /// be visible afterwards.
    fn commit_turn(
        &mut self,
        turn: u64,
        ledgers: LedgerBlobs,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// The most recent committed turn, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn latest_turn(&self) -> impl Future<Output = Result<Option<u64>, StoreError>> + Send;
}

/// In-memory [`LedgerStore`] for tests and single-process runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    /// turn -> city -> ledger blob.
    turns: BTreeMap<u64, LedgerBlobs>,
}

impl MemoryLedgerStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            turns: BTreeMap::new(),
        }
    }

    /// Every committed turn, in order.
    pub fn turns(&self) -> Vec<u64> {
        self.turns.keys().copied().collect()
    }

    /// Raw stored blob of one city for one turn.
    pub fn raw(&self, city: &CityName, turn: u64) -> Option<&Value> {
        self.turns.get(&turn).and_then(|ledgers| ledgers.get(city))
    }

    /// Overwrite the stored blob of one city for one turn.
    ///
    /// This bypasses the atomic commit path and exists to simulate foreign
    /// writers or corrupted storage.
    pub fn put_raw(&mut self, city: CityName, turn: u64, blob: Value) {
        self.turns.entry(turn).or_default().insert(city, blob);
    }

    /// Decode the stored ledger of one city for one turn.
    pub fn decoded(&self, city: &CityName, turn: u64) -> Option<DecodedLedger> {
        self.raw(city, turn).map(codec::decode)
    }
}

impl LedgerStore for MemoryLedgerStore {
    async fn load_turn(&self, turn: u64) -> Result<Option<LedgerBlobs>, StoreError> {
        Ok(self.turns.get(&turn).cloned())
    }

    async fn commit_turn(&mut self, turn: u64, ledgers: LedgerBlobs) -> Result<(), StoreError> {
        tracing::debug!(turn, cities = ledgers.len(), "Committed turn to memory store");
        self.turns.insert(turn, ledgers);
        Ok(())
    }

    async fn latest_turn(&self) -> Result<Option<u64>, StoreError> {
        Ok(self.turns.keys().next_back().copied())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn blobs(pairs: &[(&str, Value)]) -> LedgerBlobs {
        pairs
            .iter()
            .map(|(city, blob)| (CityName::new(*city), blob.clone()))
            .collect()
    }

    #[tokio::test]
    async fn empty_store_has_no_turns() {
        let store = MemoryLedgerStore::new();
        assert!(matches!(store.load_turn(1).await, Ok(None)));
        assert!(matches!(store.latest_turn().await, Ok(None)));
    }

    #[tokio::test]
    async fn commit_then_load() {
        let mut store = MemoryLedgerStore::new();
        let turn_one = blobs(&[("City1", json!({})), ("City2", json!({"Wood": {}}))]);
        store.commit_turn(1, turn_one.clone()).await.unwrap();

        let loaded = store.load_turn(1).await.unwrap();
        assert_eq!(loaded, Some(turn_one));
        assert!(matches!(store.latest_turn().await, Ok(Some(1))));
    }

    #[tokio::test]
    async fn recommit_replaces_whole_turn() {
        let mut store = MemoryLedgerStore::new();
        store
            .commit_turn(1, blobs(&[("City1", json!({})), ("City2", json!({}))]))
            .await
            .unwrap();
        store.commit_turn(1, blobs(&[("City1", json!({}))])).await.unwrap();

        let loaded = store.load_turn(1).await.unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(store.raw(&CityName::new("City2"), 1).is_none());
    }

    #[test]
    fn put_raw_is_visible_to_decoded() {
        let mut store = MemoryLedgerStore::new();
        store.put_raw(
            CityName::new("City1"),
            3,
            json!({"Wood": {"City2": {"rate": "4", "hops": 1, "turn": 3}}}),
        );
        let decoded = store.decoded(&CityName::new("City1"), 3).unwrap();
        assert_eq!(decoded.ledger.len(), 1);
        assert_eq!(store.turns(), vec![3]);
    }
}
