//! JSON wire encoding of a [`ResourceLedger`].
//!
//! A stored ledger is one JSON object per city and turn:
//!
//! ```json
//! { "Wood": { "City1": { "rate": "10", "price": null, "hops": 1, "turn": 1 } } }
//! ```
//!
//! `rate`, `hops` and `turn` are required, `price` is optional. Rates and
//! prices are written as decimal strings and read back from strings or
//! numbers.
//!
//! Decoding never fails as a whole. Each record is parsed on its own;
//! entries that do not fit the shape are skipped and returned alongside the
//! ledger so the caller can report them.

use caravan_types::{CityName, ResourceName, ResourceRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DataShapeError;
use crate::ledger::ResourceLedger;

/// The stored shape of one record. Resource and origin are the map keys.
#[derive(Debug, Serialize, Deserialize)]
struct WireRecord {
    rate: Decimal,
    #[serde(default)]
    price: Option<Decimal>,
    hops: u32,
    turn: u64,
}

/// Result of decoding a stored ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedLedger {
    /// Every well-formed record.
    pub ledger: ResourceLedger,
    /// Every entry that was skipped.
    pub malformed: Vec<DataShapeError>,
}

/// Encode a ledger into its stored JSON shape.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if a record cannot be serialized.
pub fn encode(ledger: &ResourceLedger) -> Result<Value, serde_json::Error> {
    let mut root = Map::new();
    for resource in ledger.resources() {
        let mut origins = Map::new();
        for (origin, record) in ledger.resource(resource).into_iter().flatten() {
            let wire = WireRecord {
                rate: record.rate,
                price: record.price,
                hops: record.hops,
                turn: record.turn,
            };
            origins.insert(origin.to_string(), serde_json::to_value(wire)?);
        }
        root.insert(resource.to_string(), Value::Object(origins));
    }
    Ok(Value::Object(root))
}

/// Decode a stored ledger, skipping malformed entries.
pub fn decode(value: &Value) -> DecodedLedger {
    let mut decoded = DecodedLedger::default();

    let Some(root) = value.as_object() else {
        decoded.malformed.push(DataShapeError::LedgerNotAnObject);
        return decoded;
    };

    for (resource, bucket) in root {
        let Some(origins) = bucket.as_object() else {
            decoded.malformed.push(DataShapeError::ResourceNotAnObject {
                resource: resource.clone(),
            });
            continue;
        };

        for (origin, raw) in origins {
            match serde_json::from_value::<WireRecord>(raw.clone()) {
                Ok(wire) => {
                    decoded.ledger.merge_incoming([ResourceRecord {
                        resource: ResourceName::new(resource.as_str()),
                        origin_city: CityName::new(origin.as_str()),
                        rate: wire.rate,
                        price: wire.price,
                        hops: wire.hops,
                        turn: wire.turn,
                    }]);
                }
                Err(e) => decoded.malformed.push(DataShapeError::InvalidRecord {
                    resource: resource.clone(),
                    origin: origin.clone(),
                    reason: e.to_string(),
                }),
            }
        }
    }

    decoded
}
