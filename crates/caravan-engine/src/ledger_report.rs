//! Turn callback that reports every city's merged ledger.

use caravan_core::TurnSummary;
use caravan_core::runner::TurnCallback;
use tracing::{debug, info};

/// Logs each city's finalized ledger after a turn commits.
#[derive(Debug, Default)]
pub struct LedgerReport {
    turns_seen: u64,
}

impl LedgerReport {
    /// Create a new report callback.
    pub const fn new() -> Self {
        Self { turns_seen: 0 }
    }

    /// Number of turns reported so far.
    pub const fn turns_seen(&self) -> u64 {
        self.turns_seen
    }
}

impl TurnCallback for LedgerReport {
    fn on_turn(&mut self, summary: &TurnSummary) {
        self.turns_seen = self.turns_seen.saturating_add(1);

        for (city, ledger) in &summary.ledgers {
            info!(turn = summary.turn, city = %city, records = ledger.len(), "Merged ledger");
            for record in ledger.records() {
                debug!(
                    turn = summary.turn,
                    city = %city,
                    resource = %record.resource,
                    origin = %record.origin_city,
                    rate = %record.rate,
                    price = ?record.price,
                    hops = record.hops,
                    "Ledger record"
                );
            }
        }

        info!(
            turn = summary.turn,
            cities = summary.cities,
            records = summary.records,
            malformed = summary.malformed.len(),
            "Turn complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use caravan_core::Ledgers;
    use caravan_ledger::ResourceLedger;
    use caravan_types::{CityName, ResourceName, ResourceRecord};
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn counts_reported_turns() {
        let mut ledgers = Ledgers::new();
        let record = ResourceRecord {
            resource: ResourceName::new("Wood"),
            origin_city: CityName::new("City1"),
            rate: dec!(10),
            price: None,
            hops: 1,
            turn: 1,
        };
        ledgers.insert(CityName::new("City2"), [record].into_iter().collect::<ResourceLedger>());
        let summary = TurnSummary {
            turn: 1,
            cities: 1,
            records: 1,
            forwarded: 1,
            purged: 0,
            malformed: Vec::new(),
            ledgers,
        };

        let mut report = LedgerReport::new();
        report.on_turn(&summary);
        report.on_turn(&summary);
        assert_eq!(report.turns_seen(), 2);
    }
}
