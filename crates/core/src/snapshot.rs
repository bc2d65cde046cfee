#![forbid(unsafe_code)]

use crate::ids::QualifiedTable;
use crate::value::SqlValue;
use serde_json::{Map, Value};

/// One row: `schema.table.column -> value` in declared column order, plus
/// the raw primary-key value used to address the row on write.
#[derive(Clone, Debug, PartialEq)]
pub struct RowSnapshot {
    key: SqlValue,
    values: Vec<(String, Value)>,
}

impl RowSnapshot {
    pub fn new(key: SqlValue, values: Vec<(String, Value)>) -> Self {
        Self { key, values }
    }

    pub fn key(&self) -> &SqlValue {
        &self.key
    }

    pub fn values(&self) -> &[(String, Value)] {
        &self.values
    }

    pub fn get(&self, qualified_column: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(qualified_column))
            .map(|(_, value)| value)
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (name, value) in &self.values {
            map.insert(name.clone(), value.clone());
        }
        Value::Object(map)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableRows {
    pub table: QualifiedTable,
    pub rows: Vec<RowSnapshot>,
}

/// Rows reachable from a starting identifier, grouped per table in read
/// order. The starting table comes first and its first row is the starting
/// row; each table appears once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelatedRowSet {
    tables: Vec<TableRows>,
}

/// The related row set as re-read after a commit.
pub type ConfirmedSnapshot = RelatedRowSet;

impl RelatedRowSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds rows for `table`. Rows for a table already in the set are
    /// appended after its existing rows, skipping primary keys it holds.
    pub fn push(&mut self, table: QualifiedTable, rows: Vec<RowSnapshot>) {
        match self.tables.iter_mut().find(|t| t.table == table) {
            Some(entry) => {
                for row in rows {
                    if !entry.rows.iter().any(|r| r.key == row.key) {
                        entry.rows.push(row);
                    }
                }
            }
            None => self.tables.push(TableRows { table, rows }),
        }
    }

    pub fn tables(&self) -> &[TableRows] {
        &self.tables
    }

    pub fn contains(&self, table: &QualifiedTable) -> bool {
        self.rows(table).is_some()
    }

    pub fn rows(&self, table: &QualifiedTable) -> Option<&[RowSnapshot]> {
        self.tables
            .iter()
            .find(|t| &t.table == table)
            .map(|t| t.rows.as_slice())
    }

    pub fn start_row(&self) -> Option<&RowSnapshot> {
        self.tables.first().and_then(|t| t.rows.first())
    }

    /// Looks up a value by its fully qualified column key in single-row
    /// tables. Multi-row tables have no single current value.
    pub fn single_value(&self, qualified_column: &str) -> Option<&Value> {
        self.tables
            .iter()
            .filter(|t| t.rows.len() == 1)
            .find_map(|t| t.rows[0].get(qualified_column))
    }

    /// `{ "schema.table": [ {column: value}, ... ], ... }`
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for entry in &self.tables {
            map.insert(
                entry.table.to_string(),
                Value::Array(entry.rows.iter().map(RowSnapshot::to_json).collect()),
            );
        }
        Value::Object(map)
    }

    /// Every `(column, value)` pair across all rows, in read order.
    pub fn flatten(&self) -> Vec<(&str, &Value)> {
        self.tables
            .iter()
            .flat_map(|t| t.rows.iter())
            .flat_map(|row| row.values.iter().map(|(k, v)| (k.as_str(), v)))
            .collect()
    }
}
