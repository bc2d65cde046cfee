#![forbid(unsafe_code)]

use super::label::normalize_label;
use super::{Column, ForeignKey, RelationshipGraph, Table, TraversalPolicy};
use crate::config::{SchemaDescription, TableDescription};
use crate::error::ConfigError;
use crate::ids::{Ident, QualifiedTable};
use std::collections::{BTreeMap, BTreeSet};

impl RelationshipGraph {
    /// Builds the immutable graph. Any dangling reference, collision or
    /// self-referencing foreign key is a `ConfigError`; a graph that builds
    /// is internally consistent.
    pub fn build(description: &SchemaDescription) -> Result<Self, ConfigError> {
        let mut tables = Vec::with_capacity(description.tables.len());
        let mut index = BTreeMap::new();

        for desc in &description.tables {
            let table = build_table(desc)?;
            let key = table.name.key();
            if index.contains_key(&key) {
                return Err(ConfigError::DuplicateTable(table.name.to_string()));
            }
            index.insert(key, tables.len());
            tables.push(table);
        }

        let lookup = |name: &QualifiedTable| -> Result<&Table, ConfigError> {
            index
                .get(&name.key())
                .map(|i| &tables[*i])
                .ok_or_else(|| ConfigError::UnknownTable(name.to_string()))
        };

        let mut edges = Vec::with_capacity(description.foreign_keys.len());
        for desc in &description.foreign_keys {
            let (source_name, source_column) = split_column_ref(&desc.from)?;
            let (target_name, target_column) = split_column_ref(&desc.to)?;
            let source = lookup(&source_name)?;
            let target = lookup(&target_name)?;
            if source.name == target.name {
                return Err(ConfigError::SelfReference(desc.from.trim().to_string()));
            }
            let source_column = declared_column(source, &source_column)?;
            let target_column = declared_column(target, &target_column)?;
            edges.push(ForeignKey {
                source: source.name.clone(),
                source_column: source_column.name.clone(),
                target: target.name.clone(),
                target_column: target_column.name.clone(),
            });
        }

        let mut roots = BTreeMap::new();
        for desc in &description.roots {
            let name = parse_table_name(&desc.table)?;
            let table = lookup(&name)?;
            let key = table.name.key();
            if roots.contains_key(&key) {
                return Err(ConfigError::DuplicateRoot(table.name.to_string()));
            }
            roots.insert(
                key,
                TraversalPolicy {
                    depth: desc.depth,
                    direction: desc.direction,
                },
            );
        }

        Ok(Self {
            tables,
            index,
            edges,
            roots,
        })
    }
}

fn build_table(desc: &TableDescription) -> Result<Table, ConfigError> {
    let name = parse_table_name(&desc.name)?;
    if desc.columns.is_empty() {
        return Err(ConfigError::EmptyTable(name.to_string()));
    }

    let mut columns: Vec<Column> = Vec::with_capacity(desc.columns.len());
    let mut seen_names = BTreeSet::new();
    for column in &desc.columns {
        let ident = parse_ident(&column.name)?;
        if !seen_names.insert(normalize_label(ident.as_str())) {
            return Err(ConfigError::DuplicateColumn {
                table: name.to_string(),
                column: column.name.clone(),
            });
        }
        columns.push(Column {
            name: ident,
            column_type: column.column_type,
            nullable: column.nullable,
            aliases: Vec::new(),
        });
    }

    // Aliases are checked once every column name is known.
    let mut seen_labels = seen_names;
    for (position, column) in desc.columns.iter().enumerate() {
        let own = normalize_label(columns[position].name.as_str());
        for alias in &column.aliases {
            let label = normalize_label(alias);
            if label.is_empty() || label == own || columns[position].aliases.contains(&label) {
                continue;
            }
            if !seen_labels.insert(label.clone()) {
                return Err(ConfigError::DuplicateAlias {
                    table: name.to_string(),
                    label: alias.clone(),
                });
            }
            columns[position].aliases.push(label);
        }
    }

    let primary_key = columns
        .iter()
        .position(|c| c.name.eq_ignore_case(desc.primary_key.trim()))
        .ok_or_else(|| ConfigError::UnknownPrimaryKey {
            table: name.to_string(),
            column: desc.primary_key.clone(),
        })?;

    Ok(Table {
        name,
        primary_key,
        columns,
    })
}

fn declared_column<'a>(table: &'a Table, column: &Ident) -> Result<&'a Column, ConfigError> {
    table
        .column(column.as_str())
        .ok_or_else(|| ConfigError::UnknownColumn {
            table: table.name.to_string(),
            column: column.to_string(),
        })
}

fn parse_ident(value: &str) -> Result<Ident, ConfigError> {
    let value = value.trim();
    Ident::try_new(value).map_err(|reason| ConfigError::InvalidIdentifier {
        value: value.to_string(),
        reason,
    })
}

fn parse_table_name(value: &str) -> Result<QualifiedTable, ConfigError> {
    QualifiedTable::parse(value).map_err(|reason| ConfigError::InvalidIdentifier {
        value: value.trim().to_string(),
        reason,
    })
}

fn split_column_ref(value: &str) -> Result<(QualifiedTable, Ident), ConfigError> {
    let Some((table, column)) = value.trim().rsplit_once('.') else {
        return Err(ConfigError::InvalidReference(value.to_string()));
    };
    Ok((parse_table_name(table)?, parse_ident(column)?))
}
