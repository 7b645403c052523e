use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::BEST_MOVIES;
use crate::error::{NormalizeError, Result};

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Environment variable overriding `sink.database_path`
pub const DATABASE_ENV: &str = "MOVIE_NORMALIZER_DB";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub sink: SinkConfig,
    pub normalize: NormalizeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub titles_path: PathBuf,
    pub credits_path: PathBuf,
    /// Extra tables copied into the output as-is, keyed by table name
    pub passthrough: BTreeMap<String, PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        let mut passthrough = BTreeMap::new();
        passthrough.insert(BEST_MOVIES.to_string(), PathBuf::from("data/best_movies.csv"));
        Self {
            titles_path: PathBuf::from("data/titles.csv"),
            credits_path: PathBuf::from("data/credits.csv"),
            passthrough,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Sqlite,
    Ndjson,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub kind: SinkKind,
    pub database_path: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::Sqlite,
            database_path: PathBuf::from("data/movies.db"),
            output_dir: PathBuf::from("data/normalized"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub enforce_movie_refs: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            enforce_movie_refs: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file: "movie_normalizer.log".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            NormalizeError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Load an explicitly requested file, or `config.toml` when it exists,
    /// or fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply environment overrides. `.env` is expected to be loaded already.
    pub fn apply_env(&mut self) {
        if let Ok(db) = std::env::var(DATABASE_ENV) {
            if !db.trim().is_empty() {
                self.sink.database_path = PathBuf::from(db);
            }
        }
    }
}
