//! Core data models for the question-to-SQL pipeline.
//!
//! This module defines the structures that flow between pipeline stages:
//! the schema snapshot handed to the SQL generator, the result set produced
//! by the executor, and the small enums that identify engines and stages.
//! All models are designed to be serializable and maintain security
//! guarantees (no credential material is ever part of a model).

use std::collections::BTreeMap;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{QueryPilotError, Result};

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseType {
    PostgreSQL,
    SQLite,
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseType::PostgreSQL => write!(f, "PostgreSQL"),
            DatabaseType::SQLite => write!(f, "SQLite"),
        }
    }
}

/// Pipeline stage that produced a result or rejected a request.
///
/// Used in error output so a caller can tell which credential gate fired
/// without parsing message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    /// Schema inspection stage.
    Inspect,
    /// SQL generation stage.
    Generate,
    /// Safety validation stage.
    Validate,
    /// Statement execution stage.
    Execute,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStage::Inspect => write!(f, "inspection"),
            PipelineStage::Generate => write!(f, "generation"),
            PipelineStage::Validate => write!(f, "validation"),
            PipelineStage::Execute => write!(f, "execution"),
        }
    }
}

/// Snapshot of the queryable schema: table name to column name to the
/// engine's declared column type.
///
/// Tables and columns are kept in sorted order so two snapshots of the same
/// database always render identically. The rendered JSON form is what the
/// SQL generator receives as grounding context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaSnapshot {
    tables: BTreeMap<String, BTreeMap<String, String>>,
}

impl SchemaSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column to a table, creating the table entry if needed.
    pub fn add_column(
        &mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        data_type: impl Into<String>,
    ) {
        self.tables
            .entry(table.into())
            .or_default()
            .insert(column.into(), data_type.into());
    }

    /// True when no tables were discovered.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Number of tables in the snapshot.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Table names in sorted order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Columns of a table, if the table exists.
    pub fn columns(&self, table: &str) -> Option<&BTreeMap<String, String>> {
        self.tables.get(table)
    }

    /// Renders the snapshot as a JSON document mapping tables to their
    /// columns and types.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| QueryPilotError::Serialization {
            context: "schema snapshot".to_string(),
            source: e,
        })
    }
}

/// Result of a successfully executed SELECT statement.
///
/// Columns are kept in cursor order and every row is serialized as an
/// object whose keys follow that order, so the JSON output reads the way
/// the statement's projection was written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Column names in cursor order.
    pub columns: Vec<String>,
    /// Row values, one `Vec` per row, aligned with `columns`.
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl ResultSet {
    /// Creates an empty result set with the given column ordering.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row. The caller is responsible for keeping the value
    /// count aligned with the column count.
    pub fn push_row(&mut self, row: Vec<serde_json::Value>) {
        self.rows.push(row);
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Renders the result set as a JSON array of row objects.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| QueryPilotError::Serialization {
            context: "result set".to_string(),
            source: e,
        })
    }
}

// Hand-rolled so row objects stream their keys in cursor order instead of
// whatever order a map type would impose.
impl Serialize for ResultSet {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&RowObject {
                columns: &self.columns,
                values: row,
            })?;
        }
        seq.end()
    }
}

struct RowObject<'a> {
    columns: &'a [String],
    values: &'a [serde_json::Value],
}

impl Serialize for RowObject<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.values.iter()) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_database_type_display() {
        assert_eq!(DatabaseType::PostgreSQL.to_string(), "PostgreSQL");
        assert_eq!(DatabaseType::SQLite.to_string(), "SQLite");
    }

    #[test]
    fn test_pipeline_stage_display() {
        assert_eq!(PipelineStage::Validate.to_string(), "validation");
        assert_eq!(PipelineStage::Execute.to_string(), "execution");
    }

    #[test]
    fn test_schema_snapshot_sorted_rendering() {
        let mut snapshot = SchemaSnapshot::new();
        snapshot.add_column("users", "name", "text");
        snapshot.add_column("users", "id", "integer");
        snapshot.add_column("accounts", "id", "integer");

        let json = snapshot.to_json().unwrap();
        let accounts_at = json.find("accounts").unwrap();
        let users_at = json.find("users").unwrap();
        assert!(accounts_at < users_at);

        let id_at = json.find("\"id\"").unwrap();
        let name_at = json.find("\"name\"").unwrap();
        assert!(id_at < name_at);
    }

    #[test]
    fn test_schema_snapshot_accessors() {
        let mut snapshot = SchemaSnapshot::new();
        assert!(snapshot.is_empty());

        snapshot.add_column("users", "id", "integer");
        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.table_count(), 1);
        assert_eq!(
            snapshot.columns("users").unwrap().get("id").unwrap(),
            "integer"
        );
        assert!(snapshot.columns("missing").is_none());
    }

    #[test]
    fn test_result_set_preserves_cursor_column_order() {
        let mut results = ResultSet::new(vec!["zeta".to_string(), "alpha".to_string()]);
        results.push_row(vec![json!(1), json!("first")]);

        let rendered = results.to_json().unwrap();
        let zeta_at = rendered.find("zeta").unwrap();
        let alpha_at = rendered.find("alpha").unwrap();
        assert!(zeta_at < alpha_at, "cursor order must survive serialization");
    }

    #[test]
    fn test_result_set_rows_as_objects() {
        let mut results = ResultSet::new(vec!["id".to_string(), "name".to_string()]);
        results.push_row(vec![json!(1), json!("ada")]);
        results.push_row(vec![json!(2), json!(null)]);

        let value: serde_json::Value =
            serde_json::from_str(&results.to_json().unwrap()).unwrap();
        assert_eq!(value[0]["id"], json!(1));
        assert_eq!(value[0]["name"], json!("ada"));
        assert_eq!(value[1]["name"], json!(null));
        assert_eq!(results.row_count(), 2);
    }

    #[test]
    fn test_empty_result_set_renders_empty_array() {
        let results = ResultSet::new(vec!["id".to_string()]);
        let value: serde_json::Value =
            serde_json::from_str(&results.to_json().unwrap()).unwrap();
        assert_eq!(value, json!([]));
    }
}
