//! The propagation engine: one turn at a time, committed atomically.
//!
//! [`PropagationEngine::run_turn`] drives the turn state machine
//! `Idle -> Seeding -> Propagating -> Sanitizing -> Idle`:
//!
//! 1. **Load** -- batch-read the previous turn's ledgers from the store and
//!    decode them record by record. Malformed records are skipped and
//!    reported in the [`TurnSummary`].
//! 2. **Seeding**, **Propagating**, **Sanitizing** -- the pure phases from
//!    [`turn`](crate::turn), computed entirely in memory.
//! 3. **Commit** -- every finalized ledger is handed to the store in a single
//!    call.
//!
//! Nothing is written before the commit, so a turn that fails or is
//! cancelled part-way leaves the store exactly as it was.

use std::collections::BTreeMap;

use caravan_ledger::{
    LedgerBlobs, LedgerStore, MalformedRecord, ResourceLedger, StoreError, codec,
};
use caravan_types::CityName;
use caravan_world::{FacilityCatalog, WorldError, WorldGraph};
use tracing::{debug, info, warn};

use crate::turn::{self, Ledgers};

/// Errors that can occur while constructing the engine or running a turn.
#[derive(Debug, thiserror::Error)]
pub enum PropagationError {
    /// World topology or facility data is malformed.
    #[error("configuration error: {source}")]
    Configuration {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The ledger store failed; the turn was not committed.
    #[error("storage error: {source}")]
    Storage {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// The requested turn cannot run yet because its predecessor was never
    /// committed.
    #[error("turn {turn} cannot run: latest committed turn is {latest:?}")]
    TurnOutOfOrder {
        /// The turn that was requested.
        turn: u64,
        /// The most recent committed turn, if any.
        latest: Option<u64>,
    },
}

/// Where the engine is in the per-turn state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// Between turns.
    Idle,
    /// Rebuilding hop-0 records from facilities.
    Seeding,
    /// Forwarding knowledge along roads.
    Propagating,
    /// Stripping self-originated records.
    Sanitizing,
}

/// Tunables for propagation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationOptions {
    /// Drop records that would arrive with more hops than this. `None`
    /// forwards without limit.
    pub max_hops: Option<u32>,
}

/// Summary of a single turn's execution.
#[derive(Debug, Clone)]
pub struct TurnSummary {
    /// The turn that was executed.
    pub turn: u64,
    /// Number of cities with a ledger.
    pub cities: usize,
    /// Total records across all finalized ledgers.
    pub records: usize,
    /// Records deposited during propagation.
    pub forwarded: usize,
    /// Self-originated records removed during sanitizing.
    pub purged: usize,
    /// Stored records of the previous turn that could not be read.
    pub malformed: Vec<MalformedRecord>,
    /// The finalized ledgers, as committed.
    pub ledgers: Ledgers,
}

/// Drives ledgers forward turn by turn over a fixed world.
#[derive(Debug)]
pub struct PropagationEngine<S> {
    world: WorldGraph,
    catalog: FacilityCatalog,
    store: S,
    options: PropagationOptions,
    phase: TurnPhase,
}

impl<S: LedgerStore> PropagationEngine<S> {
    /// Create an engine over a validated world.
    ///
    /// # Errors
    ///
    /// Returns [`PropagationError::Configuration`] if the world has no
    /// cities or the catalog names a city the world does not contain.
    pub fn new(
        world: WorldGraph,
        catalog: FacilityCatalog,
        store: S,
        options: PropagationOptions,
    ) -> Result<Self, PropagationError> {
        world.validate()?;
        catalog.validate_against(&world)?;

        info!(
            cities = world.city_count(),
            roads = world.road_count(),
            facilities = catalog.facility_count(),
            sinks = world.sinks().len(),
            max_hops = ?options.max_hops,
            "Propagation engine ready"
        );

        Ok(Self {
            world,
            catalog,
            store,
            options,
            phase: TurnPhase::Idle,
        })
    }

    /// The current phase. Always [`TurnPhase::Idle`] between turns.
    pub const fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// The world being propagated over.
    pub const fn world(&self) -> &WorldGraph {
        &self.world
    }

    /// The facility catalog seeding reads from.
    pub const fn catalog(&self) -> &FacilityCatalog {
        &self.catalog
    }

    /// The propagation options.
    pub const fn options(&self) -> PropagationOptions {
        self.options
    }

    /// The ledger store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consume the engine and return its store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Read and decode the committed ledgers of `turn`.
    ///
    /// Returns `None` if the turn was never committed.
    ///
    /// # Errors
    ///
    /// Returns [`PropagationError::Storage`] if the store cannot be read.
    pub async fn committed_ledgers(
        &self,
        turn: u64,
    ) -> Result<Option<(Ledgers, Vec<MalformedRecord>)>, PropagationError> {
        let Some(blobs) = self.store.load_turn(turn).await? else {
            return Ok(None);
        };
        Ok(Some(decode_turn(&blobs)))
    }

    /// Execute one complete turn and commit it.
    ///
    /// Turn numbers start at 1. Turn `T > 1` requires turn `T-1` to be
    /// committed; re-running an already committed turn replaces it.
    ///
    /// # Errors
    ///
    /// Returns [`PropagationError::TurnOutOfOrder`] if the previous turn is
    /// missing, or [`PropagationError::Storage`] if the store fails. In both
    /// cases nothing of the turn is committed.
    pub async fn run_turn(&mut self, turn: u64) -> Result<TurnSummary, PropagationError> {
        let result = self.execute_turn(turn).await;
        self.phase = TurnPhase::Idle;
        result
    }

    async fn execute_turn(&mut self, turn: u64) -> Result<TurnSummary, PropagationError> {
        // --- Load ---
        let (previous, malformed) = self.load_previous(turn).await?;
        for bad in &malformed {
            warn!(turn, city = %bad.city, error = %bad.error, "Skipping malformed ledger record");
        }

        // --- Phase 1: Seeding ---
        self.phase = TurnPhase::Seeding;
        let seeded = turn::seed_all(&self.world, &self.catalog, turn);
        debug!(turn, cities = seeded.len(), "Seeding complete");

        // --- Phase 2: Propagating ---
        self.phase = TurnPhase::Propagating;
        let views = turn::outgoing_views(&previous, &seeded);
        let mut next = seeded;
        let forwarded = turn::propagate(&self.world, &views, &mut next, turn, self.options.max_hops);
        debug!(turn, forwarded, "Propagation complete");

        // --- Phase 3: Sanitizing ---
        self.phase = TurnPhase::Sanitizing;
        let purged = turn::sanitize(&mut next);
        debug!(turn, purged, "Sanitizing complete");

        // --- Commit ---
        let blobs = encode_turn(&next)?;
        self.store.commit_turn(turn, blobs).await?;

        let records: usize = next.values().map(ResourceLedger::len).sum();
        info!(
            turn,
            cities = next.len(),
            records,
            forwarded,
            purged,
            malformed = malformed.len(),
            "Turn committed"
        );

        Ok(TurnSummary {
            turn,
            cities: next.len(),
            records,
            forwarded,
            purged,
            malformed,
            ledgers: next,
        })
    }

    /// Load the finalized ledgers the turn forwards from.
    async fn load_previous(
        &self,
        turn: u64,
    ) -> Result<(Ledgers, Vec<MalformedRecord>), PropagationError> {
        let Some(previous_turn) = turn.checked_sub(1) else {
            return self.out_of_order(turn).await;
        };
        if previous_turn == 0 {
            return Ok((Ledgers::new(), Vec::new()));
        }
        match self.store.load_turn(previous_turn).await? {
            Some(blobs) => Ok(decode_turn(&blobs)),
            None => self.out_of_order(turn).await,
        }
    }

    /// Reject `turn`, reporting the latest committed turn.
    async fn out_of_order<T>(&self, turn: u64) -> Result<T, PropagationError> {
        let latest = self.store.latest_turn().await?;
        Err(PropagationError::TurnOutOfOrder { turn, latest })
    }
}

/// Decode every stored ledger of a turn, collecting malformed records.
fn decode_turn(blobs: &LedgerBlobs) -> (Ledgers, Vec<MalformedRecord>) {
    let mut ledgers = Ledgers::new();
    let mut malformed = Vec::new();
    for (city, blob) in blobs {
        let decoded = codec::decode(blob);
        malformed.extend(decoded.malformed.into_iter().map(|error| MalformedRecord {
            city: city.clone(),
            error,
        }));
        ledgers.insert(city.clone(), decoded.ledger);
    }
    (ledgers, malformed)
}

/// Encode every finalized ledger of a turn for the store.
fn encode_turn(ledgers: &Ledgers) -> Result<LedgerBlobs, StoreError> {
    ledgers
        .iter()
        .map(|(city, ledger)| Ok((city.clone(), codec::encode(ledger)?)))
        .collect::<Result<BTreeMap<CityName, _>, StoreError>>()
}
