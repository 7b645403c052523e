use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a normalization run.
///
/// Row-level problems (malformed list fields, unresolved junction tuples)
/// never surface here; they are recorded in the run's
/// [`NormalizeReport`](crate::pipeline::processing::report::NormalizeReport).
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Source file not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("{table} source is missing required column '{column}'")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    #[error("Table '{0}' appears twice in the output bundle")]
    DuplicateTable(String),

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, NormalizeError>;
