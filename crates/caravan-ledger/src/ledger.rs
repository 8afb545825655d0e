//! The per-city resource ledger.
//!
//! A [`ResourceLedger`] is the knowledge one city holds for one turn:
//! resource name -> origin city -> [`ResourceRecord`]. There is at most one
//! record per `(resource, origin)` pair.
//!
//! # Lifecycle
//!
//! 1. **Seed** -- [`ResourceLedger::seed`] builds the hop-0 records of a
//!    city's own facilities.
//! 2. **Hop-in** -- [`ResourceLedger::merge_incoming`] deposits records
//!    forwarded by neighbours. Conflicting keys are overwritten, never summed.
//! 3. **Sanitize** -- [`ResourceLedger::purge_self`] strips every record that
//!    originates at the holding city.
//!
//! All operations are total: rates are not validated here.

use std::collections::BTreeMap;

use caravan_types::{CityName, FacilityFlow, ResourceName, ResourceRecord};

/// Knowledge held by one city for one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLedger {
    /// resource -> origin city -> record.
    entries: BTreeMap<ResourceName, BTreeMap<CityName, ResourceRecord>>,
}

impl ResourceLedger {
    /// Create an empty ledger.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Build the hop-0 ledger of `city` from its facility flows.
    ///
    /// Produces and consumes flows are recorded identically. When several
    /// flows name the same resource, the last one wins.
    pub fn seed(city: &CityName, flows: &[FacilityFlow], turn: u64) -> Self {
        let mut ledger = Self::new();
        ledger.merge_incoming(
            flows
                .iter()
                .map(|flow| ResourceRecord::seeded(city.clone(), flow, turn)),
        );
        ledger
    }

    /// Deposit `incoming` records, in order.
    ///
    /// A record replaces any existing record with the same
    /// `(resource, origin_city)` key, including one deposited earlier in the
    /// same batch. Records not named by the batch are carried over untouched.
    ///
    /// Returns the number of records deposited.
    pub fn merge_incoming<I>(&mut self, incoming: I) -> usize
    where
        I: IntoIterator<Item = ResourceRecord>,
    {
        let mut deposited: usize = 0;
        for record in incoming {
            self.entries
                .entry(record.resource.clone())
                .or_default()
                .insert(record.origin_city.clone(), record);
            deposited = deposited.saturating_add(1);
        }
        deposited
    }

    /// Remove every record whose origin is `city`.
    ///
    /// Resources left without any record are dropped. Returns the number of
    /// records removed.
    pub fn purge_self(&mut self, city: &CityName) -> usize {
        let mut removed: usize = 0;
        self.entries.retain(|_, origins| {
            if origins.remove(city).is_some() {
                removed = removed.saturating_add(1);
            }
            !origins.is_empty()
        });
        removed
    }

    /// Look up the record for a `(resource, origin)` pair.
    pub fn get(&self, resource: &ResourceName, origin: &CityName) -> Option<&ResourceRecord> {
        self.entries.get(resource).and_then(|origins| origins.get(origin))
    }

    /// All records about `resource`, keyed by origin.
    pub fn resource(&self, resource: &ResourceName) -> Option<&BTreeMap<CityName, ResourceRecord>> {
        self.entries.get(resource)
    }

    /// Iterate over the resources this ledger knows about.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceName> {
        self.entries.keys()
    }

    /// Iterate over every record in `(resource, origin)` order.
    pub fn records(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.entries.values().flat_map(BTreeMap::values)
    }

    /// Whether any record originates at `city`.
    pub fn contains_origin(&self, city: &CityName) -> bool {
        self.entries.values().any(|origins| origins.contains_key(city))
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Whether the ledger holds no records.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ResourceRecord> for ResourceLedger {
    fn from_iter<I: IntoIterator<Item = ResourceRecord>>(iter: I) -> Self {
        let mut ledger = Self::new();
        ledger.merge_incoming(iter);
        ledger
    }
}
