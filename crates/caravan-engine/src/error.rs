//! Error types for the Caravan engine binary.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: caravan_core::config::ConfigError,
    },

    /// World construction, import, or export failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: caravan_world::WorldError,
    },

    /// The engine rejected the world.
    #[error("propagation error: {source}")]
    Propagation {
        /// The underlying propagation error.
        #[from]
        source: caravan_core::PropagationError,
    },

    /// A turn failed during the run.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: caravan_core::runner::RunnerError,
    },

    /// Connecting to or migrating the database failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        #[from]
        source: caravan_db::DbError,
    },

    /// Reading or writing a graph file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file involved.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
