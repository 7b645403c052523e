use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, Transaction};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::app::ports::TableSink;
use crate::domain::{TableBundle, TableData, Value};
use crate::error::Result;

/// Writes each table into a SQLite database, replacing it if present
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "Opened SQLite database");
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }
}

impl TableSink for SqliteSink {
    fn sink_name(&self) -> &'static str {
        "sqlite"
    }

    fn write_table(&mut self, table: &TableData) -> Result<()> {
        let tx = self.conn.transaction()?;
        replace_table(&tx, table)?;
        tx.commit()?;
        crate::metrics::sink::table_written(self.sink_name(), table.len());
        Ok(())
    }

    /// Every table of the bundle is replaced in one transaction, so a
    /// failing table leaves the previous database untouched.
    fn write_bundle(&mut self, bundle: &TableBundle) -> Result<()> {
        let tx = self.conn.transaction()?;
        for table in bundle.iter() {
            replace_table(&tx, table)?;
        }
        tx.commit()?;

        for table in bundle.iter() {
            crate::metrics::sink::table_written(self.sink_name(), table.len());
        }
        info!(tables = bundle.len(), "Committed bundle to SQLite");
        Ok(())
    }
}

/// Drop, create and fill one table inside an open transaction
fn replace_table(tx: &Transaction<'_>, table: &TableData) -> Result<()> {
    let name = quote_ident(&table.name);
    tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", name))?;

    if table.columns.is_empty() {
        // SQLite cannot hold a table without columns
        warn!(table = %table.name, "Table has no columns, not created");
        return Ok(());
    }

    let column_defs: Vec<String> = table
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.kind.sql_type()))
        .collect();
    tx.execute_batch(&format!("CREATE TABLE {} ({});", name, column_defs.join(", ")))?;

    let column_names: Vec<String> = table.columns.iter().map(|c| quote_ident(&c.name)).collect();
    let placeholders: Vec<String> = (1..=table.columns.len()).map(|i| format!("?{}", i)).collect();
    let mut stmt = tx.prepare(&format!(
        "INSERT INTO {} ({}) VALUES ({})",
        name,
        column_names.join(", "),
        placeholders.join(", ")
    ))?;
    for row in &table.rows {
        stmt.execute(params_from_iter(row.iter()))?;
    }

    debug!(table = %table.name, rows = table.len(), "Wrote table to SQLite");
    Ok(())
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*r)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

/// Quote an identifier for use in generated SQL
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
