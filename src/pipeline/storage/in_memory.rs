use std::collections::BTreeMap;
use tracing::debug;

use crate::app::ports::TableSink;
use crate::domain::TableData;
use crate::error::Result;

/// In-memory sink for development/testing
#[derive(Debug, Default)]
pub struct InMemorySink {
    tables: BTreeMap<String, TableData>,
    writes: usize,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&TableData> {
        self.tables.get(name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Number of `write_table` calls, including replacements
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl TableSink for InMemorySink {
    fn sink_name(&self) -> &'static str {
        "memory"
    }

    fn write_table(&mut self, table: &TableData) -> Result<()> {
        self.tables.insert(table.name.clone(), table.clone());
        self.writes += 1;
        debug!("Stored table: {} with {} rows", table.name, table.len());
        Ok(())
    }
}
