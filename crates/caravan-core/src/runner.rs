//! Driver loop over consecutive turns.
//!
//! [`run_turns`] runs turns `1..=N` through a [`PropagationEngine`],
//! notifying a [`TurnCallback`] after each commit. It stops at the first
//! failing turn; turns committed before it stay committed.

use caravan_ledger::LedgerStore;
use tracing::{info, warn};

use crate::engine::{PropagationEngine, PropagationError, TurnSummary};

/// Errors that can occur during a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A turn failed and was not committed.
    #[error("turn {turn} failed: {source}")]
    Turn {
        /// The turn that failed.
        turn: u64,
        /// The underlying propagation error.
        source: PropagationError,
    },
}

/// Result of a run.
#[derive(Debug)]
pub struct RunResult {
    /// Number of turns committed.
    pub turns_completed: u64,
    /// Summary of the last committed turn, if any.
    pub final_summary: Option<TurnSummary>,
    /// Malformed stored records skipped across the whole run.
    pub malformed_total: usize,
}

/// Callback invoked after each turn commits.
pub trait TurnCallback: Send {
    /// Called after a turn completes successfully.
    fn on_turn(&mut self, summary: &TurnSummary);
}

/// A no-op turn callback.
pub struct NoOpCallback;

impl TurnCallback for NoOpCallback {
    fn on_turn(&mut self, _summary: &TurnSummary) {}
}

/// Run turns `1..=turns` in order.
///
/// A zero-turn run performs no store reads or writes.
///
/// # Errors
///
/// Returns [`RunnerError::Turn`] for the first turn that fails.
pub async fn run_turns<S: LedgerStore>(
    engine: &mut PropagationEngine<S>,
    turns: u64,
    callback: &mut dyn TurnCallback,
) -> Result<RunResult, RunnerError> {
    let mut result = RunResult {
        turns_completed: 0,
        final_summary: None,
        malformed_total: 0,
    };

    info!(turns, "Run starting");

    for turn in 1..=turns {
        let summary = engine
            .run_turn(turn)
            .await
            .map_err(|source| RunnerError::Turn { turn, source })?;

        callback.on_turn(&summary);

        result.turns_completed = result.turns_completed.saturating_add(1);
        result.malformed_total = result.malformed_total.saturating_add(summary.malformed.len());
        result.final_summary = Some(summary);
    }

    Ok(result)
}

/// Log the outcome of a run.
pub fn log_run_end(result: &RunResult) {
    info!(
        turns_completed = result.turns_completed,
        malformed_total = result.malformed_total,
        final_turn = result.final_summary.as_ref().map(|s| s.turn),
        final_records = result.final_summary.as_ref().map(|s| s.records),
        "Run ended"
    );

    if result.final_summary.is_none() {
        warn!("Run ended with no turns executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use caravan_ledger::MemoryLedgerStore;
    use caravan_world::create_starting_world;

    use super::*;
    use crate::engine::PropagationOptions;

    fn make_engine() -> PropagationEngine<MemoryLedgerStore> {
        let (world, catalog) = create_starting_world(3).unwrap();
        PropagationEngine::new(
            world,
            catalog,
            MemoryLedgerStore::new(),
            PropagationOptions::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn runs_requested_turns() {
        let mut engine = make_engine();
        let result = run_turns(&mut engine, 3, &mut NoOpCallback).await.unwrap();
        assert_eq!(result.turns_completed, 3);
        assert_eq!(result.final_summary.unwrap().turn, 3);
        assert_eq!(result.malformed_total, 0);
        assert_eq!(engine.store().turns(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn zero_turns_touch_nothing() {
        let mut engine = make_engine();
        let result = run_turns(&mut engine, 0, &mut NoOpCallback).await.unwrap();
        assert_eq!(result.turns_completed, 0);
        assert!(result.final_summary.is_none());
        assert!(engine.store().turns().is_empty());
    }

    #[tokio::test]
    async fn callback_sees_every_turn() {
        struct Collect {
            turns: Vec<u64>,
        }
        impl TurnCallback for Collect {
            fn on_turn(&mut self, summary: &TurnSummary) {
                self.turns.push(summary.turn);
            }
        }

        let mut engine = make_engine();
        let mut cb = Collect { turns: Vec::new() };
        run_turns(&mut engine, 4, &mut cb).await.unwrap();
        assert_eq!(cb.turns, vec![1, 2, 3, 4]);
    }
}
