//! The three phases of a propagation turn, as pure functions.
//!
//! Per turn `T`:
//!
//! 1. **Seeding** -- [`seed_all`] rebuilds every city's hop-0 records from
//!    its facilities. Nothing from earlier turns is consulted.
//!
//! 2. **Propagating** -- [`outgoing_views`] combines each city's finalized
//!    `T-1` ledger with its fresh seed; [`propagate`] forwards every record
//!    of that view one road further, skipping records whose origin is the
//!    recipient, and merges them into the recipients' `T` ledgers.
//!
//! 3. **Sanitizing** -- [`sanitize`] strips every self-originated record.
//!
//! Propagation reads only the views built before the phase starts, so
//! knowledge moves exactly one road per turn.
//!
//! Deposits are batched per target city and each batch is merged by a
//! single writer. Within a batch, source cities appear in ascending name
//! order and each source's records in `(resource, origin)` order. Merging is
//! last-write-wins, so when two sources forward the same key to the same
//! target, the source with the greatest name wins. This makes the outcome
//! independent of map iteration order.

use std::collections::BTreeMap;

use caravan_ledger::ResourceLedger;
use caravan_types::{CityName, ResourceRecord};
use caravan_world::{FacilityCatalog, WorldGraph};
use tracing::debug;

/// Ledgers of every city for one turn.
pub type Ledgers = BTreeMap<CityName, ResourceLedger>;

/// Phase 1: Seeding.
///
/// Returns one ledger per city, empty for cities without facilities.
pub fn seed_all(world: &WorldGraph, catalog: &FacilityCatalog, turn: u64) -> Ledgers {
    world
        .cities()
        .map(|city| {
            let flows = catalog.flows_of(&city.name);
            (city.name.clone(), ResourceLedger::seed(&city.name, &flows, turn))
        })
        .collect()
}

/// Build the ledger each city forwards from this turn: its finalized
/// previous ledger plus its freshly seeded hop-0 records.
///
/// The two never share a key, because a finalized ledger holds no
/// self-originated records.
pub fn outgoing_views(previous: &Ledgers, seeded: &Ledgers) -> Ledgers {
    seeded
        .iter()
        .map(|(city, seed)| {
            let mut view = previous.get(city).cloned().unwrap_or_default();
            view.merge_incoming(seed.records().cloned());
            (city.clone(), view)
        })
        .collect()
}

/// The records `view` sends down one road to `recipient` at `turn`.
///
/// Records originating at the recipient are never sent back to it. This is
/// a check against the immediate recipient only, not against the path a
/// record has travelled. With `max_hops` set, records that would arrive
/// with more hops than the ceiling are dropped.
pub fn forward_records(
    view: &ResourceLedger,
    recipient: &CityName,
    turn: u64,
    max_hops: Option<u32>,
) -> Vec<ResourceRecord> {
    view.records()
        .filter(|record| record.origin_city != *recipient)
        .map(|record| record.hopped(turn))
        .filter(|record| max_hops.is_none_or(|ceiling| record.hops <= ceiling))
        .collect()
}

/// Phase 2: Propagating.
///
/// Forwards every view along every outgoing road and merges the deposits
/// into `next`. Returns the number of records deposited.
pub fn propagate(
    world: &WorldGraph,
    views: &Ledgers,
    next: &mut Ledgers,
    turn: u64,
    max_hops: Option<u32>,
) -> usize {
    // target -> deposits in application order.
    let mut batches: BTreeMap<&CityName, Vec<ResourceRecord>> = BTreeMap::new();

    for (source, view) in views {
        if view.is_empty() {
            continue;
        }
        for road in world.outgoing_roads(source) {
            let outgoing = forward_records(view, &road.neighbor, turn, max_hops);
            debug!(
                turn,
                source = %source,
                target = %road.neighbor,
                records = outgoing.len(),
                "Forwarding along road"
            );
            batches.entry(&road.neighbor).or_default().extend(outgoing);
        }
    }

    let mut deposited: usize = 0;
    for (target, batch) in batches {
        let ledger = next.entry(target.clone()).or_default();
        deposited = deposited.saturating_add(ledger.merge_incoming(batch));
    }
    deposited
}

/// Phase 3: Sanitizing.
///
/// Strips self-originated records from every ledger. Returns the number of
/// records removed.
pub fn sanitize(ledgers: &mut Ledgers) -> usize {
    ledgers
        .iter_mut()
        .map(|(city, ledger)| ledger.purge_self(city))
        .fold(0_usize, usize::saturating_add)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use caravan_types::{City, ResourceName};
    use caravan_world::starting_world::{city_name, create_starting_world};
    use rust_decimal_macros::dec;

    use super::*;

    fn wood() -> ResourceName {
        ResourceName::new("Wood")
    }

    /// Run `turns` turns over the starting world without a store.
    fn run_chain(turns: u64) -> Ledgers {
        let (world, catalog) = create_starting_world(1).unwrap();
        let mut finalized = Ledgers::new();
        for turn in 1..=turns {
            let seeded = seed_all(&world, &catalog, turn);
            let views = outgoing_views(&finalized, &seeded);
            let mut next = seeded;
            propagate(&world, &views, &mut next, turn, None);
            sanitize(&mut next);
            finalized = next;
        }
        finalized
    }

    #[test]
    fn seeding_covers_every_city() {
        let (world, catalog) = create_starting_world(1).unwrap();
        let seeded = seed_all(&world, &catalog, 1);
        assert_eq!(seeded.len(), 5);
        assert_eq!(seeded.get(&city_name(2)).map(ResourceLedger::len), Some(2));
        assert_eq!(seeded.get(&city_name(3)).map(ResourceLedger::len), Some(0));
    }

    #[test]
    fn knowledge_moves_one_hop_per_turn() {
        let turn_one = run_chain(1);
        let city2 = turn_one.get(&city_name(2));
        let wood_at_2 = city2.and_then(|l| l.get(&wood(), &city_name(1)));
        assert_eq!(wood_at_2.map(|r| r.hops), Some(1));
        assert_eq!(wood_at_2.map(|r| r.rate), Some(dec!(10)));

        let city3 = turn_one.get(&city_name(3));
        assert!(city3.is_some_and(|l| l.resource(&wood()).is_none()));

        let turn_two = run_chain(2);
        let wood_at_3 = turn_two
            .get(&city_name(3))
            .and_then(|l| l.get(&wood(), &city_name(1)));
        assert_eq!(wood_at_3.map(|r| r.hops), Some(2));
        assert_eq!(wood_at_3.map(|r| r.turn), Some(2));
    }

    #[test]
    fn forward_skips_recipient_origin() {
        let view: ResourceLedger = [
            ResourceRecord {
                resource: wood(),
                origin_city: CityName::new("A"),
                rate: dec!(1),
                price: None,
                hops: 0,
                turn: 1,
            },
            ResourceRecord {
                resource: wood(),
                origin_city: CityName::new("B"),
                rate: dec!(2),
                price: None,
                hops: 1,
                turn: 1,
            },
        ]
        .into_iter()
        .collect();

        let to_b = forward_records(&view, &CityName::new("B"), 2, None);
        assert_eq!(to_b.len(), 1);
        assert_eq!(to_b.first().map(|r| r.origin_city.as_str()), Some("A"));
        assert_eq!(to_b.first().map(|r| r.hops), Some(1));

        let capped = forward_records(&view, &CityName::new("C"), 2, Some(1));
        assert_eq!(capped.len(), 1);
        assert_eq!(capped.first().map(|r| r.origin_city.as_str()), Some("A"));
    }

    #[test]
    fn colliding_deposits_resolve_to_greatest_source_name() {
        let mut world = WorldGraph::new();
        for name in ["Origin", "North", "South", "Hub"] {
            world.add_city(City::new(name)).unwrap();
        }
        world.add_road(&CityName::new("North"), &CityName::new("Hub"), 1).unwrap();
        world.add_road(&CityName::new("South"), &CityName::new("Hub"), 1).unwrap();

        let rumour = |rate, hops| ResourceRecord {
            resource: wood(),
            origin_city: CityName::new("Origin"),
            rate,
            price: None,
            hops,
            turn: 1,
        };
        let mut views = Ledgers::new();
        views.insert(CityName::new("North"), [rumour(dec!(4), 1)].into_iter().collect());
        views.insert(CityName::new("South"), [rumour(dec!(9), 3)].into_iter().collect());

        let mut next = Ledgers::new();
        let deposited = propagate(&world, &views, &mut next, 2, None);
        assert_eq!(deposited, 2);

        let at_hub = next
            .get(&CityName::new("Hub"))
            .and_then(|l| l.get(&wood(), &CityName::new("Origin")));
        // "South" sorts after "North", so its deposit is applied last.
        assert_eq!(at_hub.map(|r| r.rate), Some(dec!(9)));
        assert_eq!(at_hub.map(|r| r.hops), Some(4));
    }

    #[test]
    fn sanitize_reports_purged_records() {
        let mut ledgers = Ledgers::new();
        let own = ResourceRecord {
            resource: wood(),
            origin_city: CityName::new("A"),
            rate: dec!(1),
            price: None,
            hops: 2,
            turn: 1,
        };
        ledgers.insert(CityName::new("A"), [own].into_iter().collect());
        assert_eq!(sanitize(&mut ledgers), 1);
        assert!(ledgers.get(&CityName::new("A")).is_some_and(ResourceLedger::is_empty));
    }
}
