#![forbid(unsafe_code)]

use crate::error::ConfigError;
use crate::graph::Direction;
use crate::value::ColumnType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level configuration file (YAML; JSON is accepted as well).
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    pub schema: SchemaDescription,
    #[serde(default)]
    pub interpreter: InterpreterConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Main database file. Relative paths resolve against the config file.
    pub path: Option<PathBuf>,
    /// Schema name -> database file, attached after open.
    #[serde(default)]
    pub attach: BTreeMap<String, PathBuf>,
}

/// Tables, columns, foreign keys and per-root traversal policy.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDescription {
    pub tables: Vec<TableDescription>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDescription>,
    #[serde(default)]
    pub roots: Vec<RootDescription>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TableDescription {
    pub name: String,
    pub primary_key: String,
    pub columns: Vec<ColumnDescription>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub nullable: bool,
    /// Extra labels the interpretation step may use for this column.
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// `from: schema.table.column`, `to: schema.table.column`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ForeignKeyDescription {
    pub from: String,
    pub to: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RootDescription {
    pub table: String,
    pub depth: usize,
    pub direction: Direction,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InterpreterConfig {
    pub kind: Option<String>,
    pub model: Option<String>,
    pub claude_bin: Option<String>,
    pub api_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
database:
  path: app.db
  attach:
    library: library.db
schema:
  tables:
    - name: library.members
      primary_key: id
      columns:
        - { name: id, type: integer }
        - { name: name, type: text }
    - name: library.transactions
      primary_key: id
      columns:
        - { name: id, type: integer }
        - { name: member_id, type: integer }
        - { name: return_date, type: date, nullable: true, aliases: ["returned on"] }
  foreign_keys:
    - { from: library.transactions.member_id, to: library.members.id }
  roots:
    - { table: library.transactions, depth: 1, direction: both }
interpreter:
  kind: openai
  model: gpt-4
"#;

    #[test]
    fn parses_full_config() {
        let config = Config::from_yaml_str(SAMPLE).expect("parse config");
        assert_eq!(config.database.path, Some(PathBuf::from("app.db")));
        assert_eq!(
            config.database.attach.get("library"),
            Some(&PathBuf::from("library.db"))
        );
        assert_eq!(config.schema.tables.len(), 2);
        let return_date = &config.schema.tables[1].columns[2];
        assert_eq!(return_date.column_type, ColumnType::Date);
        assert!(return_date.nullable);
        assert_eq!(return_date.aliases, vec!["returned on".to_string()]);
        assert_eq!(config.schema.roots[0].direction, Direction::Both);
        assert_eq!(config.interpreter.kind.as_deref(), Some("openai"));
    }

    #[test]
    fn rejects_unknown_keys() {
        let text = SAMPLE.replace("primary_key: id\n      columns:\n        - { name: id, type: integer }\n        - { name: name, type: text }",
            "primary_key: id\n      owner: root\n      columns:\n        - { name: id, type: integer }");
        let err = Config::from_yaml_str(&text).expect_err("unknown key must fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn accepts_json() {
        let text = r#"{"schema": {"tables": [{"name": "t", "primary_key": "id",
            "columns": [{"name": "id", "type": "integer"}]}]}}"#;
        let config = Config::from_yaml_str(text).expect("json is yaml");
        assert_eq!(config.schema.tables[0].name, "t");
        assert!(config.database.path.is_none());
    }
}
