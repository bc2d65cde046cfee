#![forbid(unsafe_code)]

use std::fmt;

const MAX_IDENT_LEN: usize = 128;

/// A SQL identifier (schema, table or column name).
///
/// Identifiers are only produced while the relationship graph is built, so
/// every name that ends up interpolated into a statement has been checked
/// against `[A-Za-z_][A-Za-z0-9_]*`. Values never travel through this type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(String);

impl Ident {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn try_new(value: &str) -> Result<Self, IdentError> {
        validate_identifier(value)?;
        Ok(Self(value.to_string()))
    }

    /// Double-quoted form for statement text.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }

    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentError {
    Empty,
    TooLong,
    InvalidFirstChar,
    InvalidChar { ch: char, index: usize },
}

impl IdentError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "identifier must not be empty",
            Self::TooLong => "identifier is too long",
            Self::InvalidFirstChar => "identifier must start with a letter or '_'",
            Self::InvalidChar { .. } => "identifier may only contain [A-Za-z0-9_]",
        }
    }
}

impl fmt::Display for IdentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChar { ch, index } => {
                write!(f, "{} (found {ch:?} at {index})", self.message())
            }
            other => f.write_str(other.message()),
        }
    }
}

impl std::error::Error for IdentError {}

pub fn validate_identifier(value: &str) -> Result<(), IdentError> {
    if value.is_empty() {
        return Err(IdentError::Empty);
    }
    if value.len() > MAX_IDENT_LEN {
        return Err(IdentError::TooLong);
    }
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return Err(IdentError::Empty);
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(IdentError::InvalidFirstChar);
    }
    for (index, ch) in value.chars().enumerate().skip(1) {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            continue;
        }
        return Err(IdentError::InvalidChar { ch, index });
    }
    Ok(())
}

/// `schema.table`, or a bare `table` living in SQLite's `main` schema.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedTable {
    schema: Option<Ident>,
    table: Ident,
}

impl QualifiedTable {
    pub(crate) fn parse(value: &str) -> Result<Self, IdentError> {
        let value = value.trim();
        match value.split_once('.') {
            Some((schema, table)) => Ok(Self {
                schema: Some(Ident::try_new(schema)?),
                table: Ident::try_new(table)?,
            }),
            None => Ok(Self {
                schema: None,
                table: Ident::try_new(value)?,
            }),
        }
    }

    pub fn schema(&self) -> Option<&Ident> {
        self.schema.as_ref()
    }

    pub fn table(&self) -> &Ident {
        &self.table
    }

    /// Case-insensitive lookup key.
    pub fn key(&self) -> String {
        self.to_string().to_ascii_lowercase()
    }

    pub fn sql(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema.quoted(), self.table.quoted()),
            None => self.table.quoted(),
        }
    }

    /// Snapshot key for one of this table's columns.
    pub fn column_key(&self, column: &Ident) -> String {
        format!("{self}.{column}")
    }

    /// Matches either the full `schema.table` form or the bare table name.
    pub fn matches(&self, name: &str) -> bool {
        let name = name.trim();
        name.eq_ignore_ascii_case(&self.to_string()) || self.table.eq_ignore_case(name)
    }
}

impl fmt::Display for QualifiedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.table),
            None => write!(f, "{}", self.table),
        }
    }
}
