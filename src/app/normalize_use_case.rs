use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, info_span};

use crate::app::ports::{RawSource, TableSink};
use crate::domain::TableBundle;
use crate::pipeline::processing::{NormalizeReport, NormalizedCatalog, Normalizer};

/// Row count of one output table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub rows: usize,
}

/// What one run produced and what it recovered from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub tables: Vec<TableSummary>,
    pub issues_by_kind: BTreeMap<String, usize>,
    pub duplicates_removed: BTreeMap<String, usize>,
    pub dropped_rows: usize,
    /// Sink the bundle was written to; `None` for a dry run
    pub sink: Option<String>,
}

impl RunSummary {
    pub fn new(bundle: &TableBundle, report: &NormalizeReport, sink: Option<&str>) -> Self {
        Self {
            tables: bundle
                .iter()
                .map(|t| TableSummary {
                    name: t.name.clone(),
                    rows: t.len(),
                })
                .collect(),
            issues_by_kind: report.counts_by_kind(),
            duplicates_removed: report.duplicates_removed().clone(),
            dropped_rows: report.dropped_rows(),
            sink: sink.map(str::to_string),
        }
    }

    pub fn rows_in(&self, table: &str) -> Option<usize> {
        self.tables.iter().find(|t| t.name == table).map(|t| t.rows)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "📊 Tables:")?;
        for table in &self.tables {
            writeln!(f, "   {:<18} {:>8} rows", table.name, table.rows)?;
        }
        writeln!(f, "   Dropped rows: {}", self.dropped_rows)?;
        if !self.issues_by_kind.is_empty() {
            writeln!(f, "⚠️  Issues:")?;
            for (kind, count) in &self.issues_by_kind {
                writeln!(f, "   - {}: {}", kind, count)?;
            }
        }
        if !self.duplicates_removed.is_empty() {
            writeln!(f, "🧹 Duplicates removed:")?;
            for (table, count) in &self.duplicates_removed {
                writeln!(f, "   - {}: {}", table, count)?;
            }
        }
        match &self.sink {
            Some(sink) => write!(f, "💾 Written to {} sink", sink),
            None => write!(f, "💾 Dry run, nothing written"),
        }
    }
}

/// Use case for turning the raw sources into the normalized table bundle
pub struct NormalizeUseCase {
    source: Box<dyn RawSource>,
    normalizer: Normalizer,
}

impl NormalizeUseCase {
    pub fn new(source: Box<dyn RawSource>, normalizer: Normalizer) -> Self {
        Self { source, normalizer }
    }

    /// Load and normalize without touching any sink
    pub fn normalize(&self) -> Result<NormalizedCatalog> {
        let dataset = self.source.load().context("Failed to load raw sources")?;
        Ok(self.normalizer.normalize(dataset))
    }

    /// Load, normalize and assemble, then report without writing
    pub fn dry_run(&self) -> Result<RunSummary> {
        let catalog = self.normalize()?;
        let bundle = catalog.to_bundle().context("Failed to assemble output tables")?;
        Ok(RunSummary::new(&bundle, catalog.report(), None))
    }

    /// Full run: the bundle is handed to the sink only once every stage
    /// has succeeded.
    pub fn run(&self, sink: &mut dyn TableSink) -> Result<RunSummary> {
        let catalog = self.normalize()?;
        let bundle = catalog.to_bundle().context("Failed to assemble output tables")?;

        {
            let _span = info_span!("write_bundle", sink = sink.sink_name()).entered();
            sink.write_bundle(&bundle)
                .with_context(|| format!("Failed to write tables to {} sink", sink.sink_name()))?;
        }

        info!(tables = bundle.len(), sink = sink.sink_name(), "Run complete");
        Ok(RunSummary::new(&bundle, catalog.report(), Some(sink.sink_name())))
    }
}
