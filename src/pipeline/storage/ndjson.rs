use serde_json::{Map, Value as JsonValue};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::app::ports::TableSink;
use crate::domain::{TableData, Value};
use crate::error::Result;

/// Writes each table to `<output_dir>/<table>.ndjson`, one JSON object per
/// row. Files are truncated so a rerun replaces the previous output.
pub struct NdjsonSink {
    output_dir: PathBuf,
}

impl NdjsonSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        info!(dir = %output_dir.display(), "Writing NDJSON tables");
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.output_dir.join(format!("{}.ndjson", table))
    }
}

impl TableSink for NdjsonSink {
    fn sink_name(&self) -> &'static str {
        "ndjson"
    }

    fn write_table(&mut self, table: &TableData) -> Result<()> {
        let path = self.table_path(&table.name);
        let mut writer = BufWriter::new(
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)?,
        );

        for row in &table.rows {
            let object: Map<String, JsonValue> = table
                .columns
                .iter()
                .zip(row)
                .map(|(column, value)| (column.name.clone(), to_json(value)))
                .collect();
            serde_json::to_writer(&mut writer, &object)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        crate::metrics::sink::table_written(self.sink_name(), table.len());
        debug!(table = %table.name, rows = table.len(), path = %path.display(), "Wrote NDJSON table");
        Ok(())
    }
}

fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Integer(i) => JsonValue::from(*i),
        // Non-finite reals have no JSON form and become null
        Value::Real(r) => serde_json::Number::from_f64(*r).map_or(JsonValue::Null, JsonValue::Number),
        Value::Text(s) => JsonValue::String(s.clone()),
    }
}
