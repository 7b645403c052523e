use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{NormalizeError, Result};

/// A single cell handed to a storage sink
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    /// Non-finite reals (the `NaN` blanks of the source CSVs) become null
    pub fn real(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Value::Real(v),
            _ => Value::Null,
        }
    }

    pub fn integer(value: Option<i64>) -> Self {
        value.map_or(Value::Null, Value::Integer)
    }

    pub fn text(value: Option<&str>) -> Self {
        value.map_or(Value::Null, |s| Value::Text(s.to_string()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

// Reals compare by bit pattern so that Value can key a HashSet during dedup.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Integer(i) => i.hash(state),
            Value::Real(f) => f.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

/// Declared storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Real,
    Text,
    Timestamp,
}

impl ColumnKind {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Real => "REAL",
            ColumnKind::Text => "TEXT",
            ColumnKind::Timestamp => "TIMESTAMP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

/// A typed row that knows its own column layout.
///
/// `values()` must yield one cell per entry of `columns()`, in the same order.
pub trait Record {
    fn columns() -> Vec<Column>;
    fn values(&self) -> Vec<Value>;
}

/// Ordered, named container of typed rows.
///
/// Tables are built once from a finished row vector and never mutated
/// afterwards; every run produces fresh tables.
#[derive(Debug, Clone, PartialEq)]
pub struct Table<R> {
    name: &'static str,
    rows: Vec<R>,
}

impl<R: Record> Table<R> {
    pub fn new(name: &'static str, rows: Vec<R>) -> Self {
        Self { name, rows }
    }

    pub fn empty(name: &'static str) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }

    pub fn get(&self, index: usize) -> Option<&R> {
        self.rows.get(index)
    }

    /// Erase the row type for a storage sink
    pub fn to_data(&self) -> TableData {
        TableData {
            name: self.name.to_string(),
            columns: R::columns(),
            rows: self.rows.iter().map(Record::values).collect(),
        }
    }
}

/// Untyped view of one table: what a storage sink consumes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableData {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl TableData {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// All cells of one column, in row order
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|row| row.get(idx)).collect())
    }
}

/// The named set of tables produced by one run, in output order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableBundle {
    tables: Vec<TableData>,
}

impl TableBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table; a second table with the same name is rejected
    pub fn insert(&mut self, table: TableData) -> Result<()> {
        if self.get(&table.name).is_some() {
            return Err(NormalizeError::DuplicateTable(table.name));
        }
        self.tables.push(table);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TableData> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TableData> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_nan_reals_become_null() {
        assert_eq!(Value::real(Some(f64::NAN)), Value::Null);
        assert_eq!(Value::real(None), Value::Null);
        assert_eq!(Value::real(Some(7.5)), Value::Real(7.5));
    }

    #[test]
    fn test_values_hash_consistently() {
        let mut seen = HashSet::new();
        assert!(seen.insert(vec![Value::Real(1.0), Value::from("a")]));
        assert!(!seen.insert(vec![Value::Real(1.0), Value::from("a")]));
        // Same digits, different type
        assert!(seen.insert(vec![Value::Integer(1), Value::from("a")]));
    }

    #[test]
    fn test_bundle_rejects_duplicate_names() {
        let mut bundle = TableBundle::new();
        bundle
            .insert(TableData::new("movies", vec![Column::new("id", ColumnKind::Text)]))
            .unwrap();
        let err = bundle
            .insert(TableData::new("movies", Vec::new()))
            .unwrap_err();
        assert!(matches!(err, NormalizeError::DuplicateTable(name) if name == "movies"));
        assert_eq!(bundle.len(), 1);
    }

    #[test]
    fn test_column_values() {
        let mut table = TableData::new(
            "t",
            vec![
                Column::new("a", ColumnKind::Integer),
                Column::new("b", ColumnKind::Text),
            ],
        );
        table.rows.push(vec![Value::Integer(1), Value::from("x")]);
        table.rows.push(vec![Value::Integer(2), Value::Null]);

        let b = table.column_values("b").unwrap();
        assert_eq!(b, vec![&Value::from("x"), &Value::Null]);
        assert!(table.column_values("missing").is_none());
    }
}
