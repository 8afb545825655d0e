//! Turn driver binary for the Caravan propagation engine.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `caravan-config.yaml` (or the path given as
//!    the first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Build the starting world, or import a graph document
//! 4. Optionally export the world's graph document
//! 5. Pick the ledger store: `PostgreSQL` when a URL is configured,
//!    in-memory otherwise
//! 6. Run the configured number of turns
//! 7. Log the result

mod error;
mod ledger_report;

use std::path::{Path, PathBuf};

use caravan_core::PropagationEngine;
use caravan_core::config::{LogFormat, LoggingConfig, SimulationConfig, WorldConfig};
use caravan_core::runner::{self, RunResult};
use caravan_db::{GraphStore, PostgresLedgerStore, PostgresPool};
use caravan_ledger::{LedgerStore, MemoryLedgerStore};
use caravan_world::{
    FacilityCatalog, GraphDocument, WorldGraph, create_starting_world, export_world, import_world,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::ledger_report::LedgerReport;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "caravan-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or a turn fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = SimulationConfig::load_or_default(&config_path)?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        config = %config_path.display(),
        seed = config.world.seed,
        turns = config.propagation.turns,
        max_hops = ?config.propagation.max_hops,
        postgres = config.infrastructure.postgres_url.is_some(),
        "caravan-engine starting"
    );

    // 3. Build or import the world.
    let (world, catalog) = load_world(&config.world)?;
    info!(
        cities = world.city_count(),
        roads = world.road_count(),
        facilities = catalog.facility_count(),
        "World loaded"
    );

    // 4. Export the graph document.
    let document = export_world(&world, &catalog);
    if let Some(path) = &config.world.export_file {
        write_document(path, &document)?;
        info!(path = %path.display(), nodes = document.nodes.len(), "Graph document written");
    }

    // 5-6. Run against the configured store.
    let result = if let Some(pool) = PostgresPool::open(&config.infrastructure).await? {
        pool.run_migrations().await?;
        GraphStore::new(pool.pool()).export(&document).await?;

        let store = PostgresLedgerStore::new(pool.pool().clone());
        let result = run(world, catalog, store, &config).await;
        pool.close().await;
        result?
    } else {
        info!("No database configured, using in-memory ledger store");
        run(world, catalog, MemoryLedgerStore::new(), &config).await?
    };

    // 7. Log results.
    runner::log_run_end(&result);
    info!(turns_completed = result.turns_completed, "caravan-engine shutdown complete");

    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}

/// Build the starting world, or import the configured graph document.
fn load_world(config: &WorldConfig) -> Result<(WorldGraph, FacilityCatalog), EngineError> {
    let Some(path) = &config.graph_file else {
        return Ok(create_starting_world(config.seed)?);
    };
    let json = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let document = GraphDocument::from_json(&json)?;
    info!(path = %path.display(), nodes = document.nodes.len(), "Importing graph document");
    Ok(import_world(&document)?)
}

fn write_document(path: &Path, document: &GraphDocument) -> Result<(), EngineError> {
    let json = document.to_json()?;
    std::fs::write(path, json).map_err(|source| EngineError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Run the configured turns over any ledger store.
async fn run<S: LedgerStore>(
    world: WorldGraph,
    catalog: FacilityCatalog,
    store: S,
    config: &SimulationConfig,
) -> Result<RunResult, EngineError> {
    let mut engine = PropagationEngine::new(world, catalog, store, config.propagation.options())?;
    let mut report = LedgerReport::new();
    let result = runner::run_turns(&mut engine, config.propagation.turns, &mut report).await?;
    Ok(result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use caravan_core::config::PropagationConfig;
    use caravan_types::CityName;

    use super::*;

    #[test]
    fn starting_world_is_default_source() {
        let (world, _) = load_world(&WorldConfig::default()).unwrap();
        assert_eq!(world.city_count(), 5);
    }

    #[test]
    fn missing_graph_file_is_an_io_error() {
        let config = WorldConfig {
            graph_file: Some(PathBuf::from("no/such/graph.json")),
            ..WorldConfig::default()
        };
        assert!(matches!(load_world(&config), Err(EngineError::Io { .. })));
    }

    #[test]
    fn exported_document_round_trips_through_a_file() {
        let (world, catalog) = create_starting_world(5).unwrap();
        let path = std::env::temp_dir().join(format!("caravan-graph-{}.json", std::process::id()));
        write_document(&path, &export_world(&world, &catalog)).unwrap();

        let config = WorldConfig {
            graph_file: Some(path.clone()),
            ..WorldConfig::default()
        };
        let loaded = load_world(&config);
        std::fs::remove_file(&path).unwrap();

        let (imported, _) = loaded.unwrap();
        assert_eq!(imported.city_count(), world.city_count());
        assert!(imported.contains(&CityName::new("City3")));
    }

    #[tokio::test]
    async fn memory_run_uses_configured_turns() {
        let (world, catalog) = create_starting_world(5).unwrap();
        let config = SimulationConfig {
            propagation: PropagationConfig {
                turns: 3,
                max_hops: None,
            },
            ..SimulationConfig::default()
        };
        let result = run(world, catalog, MemoryLedgerStore::new(), &config)
            .await
            .unwrap();
        assert_eq!(result.turns_completed, 3);
    }
}
