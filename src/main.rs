use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use movie_normalizer::app::constraints_use_case::{ConstraintOutcome, ConstraintsUseCase};
use movie_normalizer::app::normalize_use_case::{NormalizeUseCase, RunSummary};
use movie_normalizer::app::ports::TableSink;
use movie_normalizer::app::query_use_case::QueryUseCase;
use movie_normalizer::app::recommend_use_case::RecommendUseCase;
use movie_normalizer::config::{Config, SinkKind};
use movie_normalizer::logging::init_logging;
use movie_normalizer::pipeline::ingestion::CsvSource;
use movie_normalizer::pipeline::processing::{NormalizeOptions, Normalizer};
use movie_normalizer::pipeline::storage::{NdjsonSink, SqliteSink};

#[derive(Parser)]
#[command(name = "movie_normalizer")]
#[command(about = "Normalizes movie title and credit CSVs into relational tables")]
#[command(version = "0.1.0")]
struct Cli {
    /// Config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Default)]
struct SourceArgs {
    /// Titles CSV
    #[arg(long)]
    titles: Option<PathBuf>,
    /// Credits CSV
    #[arg(long)]
    credits: Option<PathBuf>,
    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, normalize, write every table and apply constraints
    Run {
        #[command(flatten)]
        source: SourceArgs,
        /// Output sink
        #[arg(long, value_enum)]
        sink: Option<SinkKind>,
        /// SQLite database path
        #[arg(long)]
        database: Option<PathBuf>,
        /// NDJSON output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Load and normalize only, printing the summary
    Normalize {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Record a random recommendation from the curated list
    Recommend {
        /// SQLite database path
        #[arg(long)]
        database: Option<PathBuf>,
    },
    /// Execute one SQL statement against the database
    Query {
        /// The statement to run
        sql: String,
        /// SQLite database path
        #[arg(long)]
        database: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load_or_default(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply_env();

    let _guard = init_logging(&config.logging);
    movie_normalizer::metrics::describe();

    match cli.command {
        Commands::Run {
            source,
            sink,
            database,
            output_dir,
        } => {
            apply_source_args(&mut config, &source);
            if let Some(kind) = sink {
                config.sink.kind = kind;
            }
            if let Some(database) = database {
                config.sink.database_path = database;
            }
            if let Some(dir) = output_dir {
                config.sink.output_dir = dir;
            }
            run(&config, source.json)
        }
        Commands::Normalize { source } => {
            apply_source_args(&mut config, &source);
            println!("🔎 Normalizing without writing...");
            let summary = use_case(&config).dry_run()?;
            print_summary(&summary, source.json)
        }
        Commands::Recommend { database } => {
            let path = database.unwrap_or_else(|| config.sink.database_path.clone());
            let sink = SqliteSink::open(&path)?;
            let recommender = RecommendUseCase::new(sink.connection());
            match recommender.recommend(&mut rand::thread_rng(), Utc::now())? {
                Some(rec) => println!(
                    "🎬 Recommendation #{}: {} ({})",
                    rec.recommendation_id,
                    rec.title,
                    rec.datestamp.to_rfc3339()
                ),
                None => println!("⚠️  No titles available to recommend"),
            }
            Ok(())
        }
        Commands::Query { sql, database } => {
            let path = database.unwrap_or_else(|| config.sink.database_path.clone());
            let sink = SqliteSink::open(&path)?;
            match QueryUseCase::new(sink.connection()).execute(&sql) {
                Ok(outcome) => println!("{}", outcome),
                Err(e) => {
                    error!("Query failed: {}", e);
                    println!("❌ An error occurred while executing the query.");
                }
            }
            Ok(())
        }
    }
}

fn apply_source_args(config: &mut Config, args: &SourceArgs) {
    if let Some(titles) = &args.titles {
        config.source.titles_path = titles.clone();
    }
    if let Some(credits) = &args.credits {
        config.source.credits_path = credits.clone();
    }
}

fn use_case(config: &Config) -> NormalizeUseCase {
    NormalizeUseCase::new(
        Box::new(CsvSource::from_config(&config.source)),
        Normalizer::new(NormalizeOptions {
            enforce_movie_refs: config.normalize.enforce_movie_refs,
        }),
    )
}

fn run(config: &Config, json: bool) -> Result<()> {
    println!("🚀 Running normalization pipeline...");
    let use_case = use_case(config);

    match config.sink.kind {
        SinkKind::Sqlite => {
            let mut sink = SqliteSink::open(&config.sink.database_path)?;
            let summary = use_case.run(&mut sink)?;
            print_summary(&summary, json)?;

            println!("\n🔨 Applying constraints...");
            let results = ConstraintsUseCase::new(sink.connection()).apply();
            let failed = results
                .iter()
                .filter(|r| !matches!(r.outcome, ConstraintOutcome::Applied | ConstraintOutcome::Clean))
                .count();
            if failed == 0 {
                println!("✅ All {} constraints hold", results.len());
            } else {
                println!("⚠️  {} of {} constraints failed, see the log", failed, results.len());
            }
            info!(database = %config.sink.database_path.display(), "SQLite run finished");
        }
        SinkKind::Ndjson => {
            let mut sink = NdjsonSink::new(&config.sink.output_dir)?;
            let summary = use_case.run(&mut sink)?;
            print_summary(&summary, json)?;
            info!(dir = %sink.output_dir().display(), sink = sink.sink_name(), "NDJSON run finished");
        }
    }

    println!("✅ Pipeline completed successfully!");
    Ok(())
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!("\n{}", summary);
    }
    Ok(())
}
