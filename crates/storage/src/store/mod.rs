#![forbid(unsafe_code)]

mod apply;
mod bind;
mod error;
mod read;
mod session;

pub use error::StoreError;
pub use session::{MessageOutcome, QueryReport, UpdateReport};

use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tc_core::DatabaseConfig;
use tc_core::ids::validate_identifier;
use tracing::{debug, instrument};

const IN_MEMORY: &str = ":memory:";

/// One SQLite connection plus the schemas attached to it. The database
/// schema itself is never created or migrated here.
#[derive(Debug)]
pub struct RelationalStore {
    conn: Connection,
}

impl RelationalStore {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Opens the configured main database and attaches every configured
    /// schema. Relative paths are taken from `base_dir`.
    pub fn open_configured(config: &DatabaseConfig, base_dir: &Path) -> Result<Self, StoreError> {
        let store = match &config.path {
            Some(path) => Self::open(resolve_path(base_dir, path))?,
            None => Self::open_in_memory()?,
        };
        for (schema, path) in &config.attach {
            store.attach(schema, resolve_path(base_dir, path))?;
        }
        Ok(store)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    #[instrument(skip_all, fields(schema = %schema))]
    pub fn attach(&self, schema: &str, path: impl AsRef<Path>) -> Result<(), StoreError> {
        validate_identifier(schema)
            .map_err(|_| StoreError::InvalidInput("invalid schema name"))?;
        let path = path.as_ref().to_string_lossy().into_owned();
        self.conn
            .execute("ATTACH DATABASE ?1 AS ?2", params![path, schema])?;
        debug!("attached {schema} from {path}");
        Ok(())
    }
}

fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_relative() && path != Path::new(IN_MEMORY) {
        base_dir.join(path)
    } else {
        path.to_path_buf()
    }
}
