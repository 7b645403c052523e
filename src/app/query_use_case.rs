use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::fmt;
use tracing::{debug, error};

use crate::domain::Value;
use crate::error::Result;

/// Result of one ad-hoc statement
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    Affected(usize),
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutcome::Affected(n) => write!(f, "Query executed successfully - Rows affected: {}", n),
            QueryOutcome::Rows { rows, .. } if rows.is_empty() => write!(f, "No data found."),
            QueryOutcome::Rows { columns, rows } => {
                let cells: Vec<Vec<String>> = rows
                    .iter()
                    .map(|row| row.iter().map(ToString::to_string).collect())
                    .collect();
                let widths: Vec<usize> = columns
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        cells
                            .iter()
                            .filter_map(|row| row.get(i))
                            .map(|cell| cell.chars().count())
                            .chain(std::iter::once(name.chars().count()))
                            .max()
                            .unwrap_or(0)
                    })
                    .collect();

                let line = |values: &[String]| -> String {
                    values
                        .iter()
                        .zip(&widths)
                        .map(|(v, w)| format!("{:<width$}", v, width = *w))
                        .collect::<Vec<_>>()
                        .join(" | ")
                };

                writeln!(f, "{}", line(columns.as_slice()))?;
                let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
                write!(f, "{}", rule.join("-+-"))?;
                for row in &cells {
                    write!(f, "\n{}", line(row.as_slice()))?;
                }
                Ok(())
            }
        }
    }
}

/// Runs one SQL statement against the database
pub struct QueryUseCase<'a> {
    conn: &'a Connection,
}

impl<'a> QueryUseCase<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Statements starting with `select` (any case) return rows; anything
    /// else reports the number of rows changed.
    pub fn execute(&self, sql: &str) -> Result<QueryOutcome> {
        debug!(sql, "Executing query");
        let outcome: Result<QueryOutcome> = if is_select(sql) {
            self.select(sql)
        } else {
            self.conn
                .execute(sql, [])
                .map(QueryOutcome::Affected)
                .map_err(Into::into)
        };
        if let Err(e) = &outcome {
            error!(sql, "Query failed: {}", e);
        }
        outcome
    }

    fn select(&self, sql: &str) -> Result<QueryOutcome> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(from_sql_ref(row.get_ref(i)?));
            }
            rows.push(values);
        }

        Ok(QueryOutcome::Rows { columns, rows })
    }
}

fn is_select(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .map_or(false, |head| head.eq_ignore_ascii_case("select"))
}

fn from_sql_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Text(format!("<{} bytes>", b.len())),
    }
}
