//! Persistent storage for the compat flag.
//!
//! The durable state is a single named row in a SQLite `flags` table. The
//! row key is explicit (`name = 'compat'`) so the table can hold other
//! record types without ambiguity. Writing it is the only durable side
//! effect in the whole system.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};

use crate::config::Config;
use crate::engine::{CompatStore, WriteStatus};
use crate::errors::GateError;
use crate::release::ReleaseVersion;

/// Key of the compat record in the flags table.
pub const COMPAT_FLAG: &str = "compat";

/// A flag row as stored.
#[derive(Debug, Clone)]
pub struct FlagRecord {
    pub value: String,
    pub updated_at: String,
}

/// Connection to the flags database.
pub struct CompatDb {
    conn: Connection,
}

impl CompatDb {
    /// Open (or create) the database at the given path and run migrations.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open flags database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// In-memory database for testing.
    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory flags database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS flags (
                    name TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                ",
            )
            .context("Failed to run flags migration")?;
        Ok(())
    }

    pub fn read_flag(&self, name: &str) -> Result<Option<FlagRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value, updated_at FROM flags WHERE name = ?1")
            .context("Failed to prepare flag query")?;
        let mut rows = stmt
            .query_map(params![name], |row| {
                Ok(FlagRecord {
                    value: row.get(0)?,
                    updated_at: row.get(1)?,
                })
            })
            .context("Failed to query flag")?;
        rows.next().transpose().context("Failed to read flag row")
    }

    /// Upsert a flag value. The single-row update is atomic; it is the only
    /// concurrency-safety mechanism across separate gate runs.
    pub fn write_flag(&self, name: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO flags (name, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![name, value, Utc::now().to_rfc3339()],
            )
            .context("Failed to upsert flag")?;
        Ok(())
    }
}

/// The engine-facing store: wraps an optional database connection plus the
/// write-suppression setting, so "not configured" and "dry run" are
/// ordinary results rather than error-channel overloads.
pub struct FlagStore {
    db: Option<CompatDb>,
    suppress_writes: bool,
}

impl FlagStore {
    /// Open the store described by the configuration. An absent connection
    /// string yields an unconfigured store; a present-but-broken one is a
    /// `StoreUnavailable` error.
    pub fn from_config(config: &Config) -> Result<Self, GateError> {
        let db = match &config.store_path {
            Some(path) => Some(CompatDb::open(path).map_err(GateError::StoreUnavailable)?),
            None => None,
        };
        Ok(Self {
            db,
            suppress_writes: config.suppress_writes,
        })
    }

    /// A store with persistence disabled entirely.
    pub fn disabled() -> Self {
        Self {
            db: None,
            suppress_writes: false,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.db.is_some()
    }

    /// Full record including timestamp, for status display.
    pub fn read_record(&self) -> Result<Option<FlagRecord>, GateError> {
        match &self.db {
            Some(db) => db
                .read_flag(COMPAT_FLAG)
                .map_err(GateError::StoreUnavailable),
            None => Ok(None),
        }
    }
}

impl CompatStore for FlagStore {
    fn read_compat(&self) -> Result<Option<ReleaseVersion>, GateError> {
        Ok(self
            .read_record()?
            .map(|record| ReleaseVersion::new(record.value)))
    }

    fn write_compat(&self, version: &ReleaseVersion) -> Result<WriteStatus, GateError> {
        let Some(db) = &self.db else {
            return Ok(WriteStatus::Unconfigured);
        };
        if self.suppress_writes {
            return Ok(WriteStatus::Suppressed);
        }
        db.write_flag(COMPAT_FLAG, version.as_str())
            .map_err(GateError::StoreUnavailable)?;
        Ok(WriteStatus::Persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_db(suppress_writes: bool) -> FlagStore {
        FlagStore {
            db: Some(CompatDb::open_in_memory().unwrap()),
            suppress_writes,
        }
    }

    #[test]
    fn test_read_missing_flag_is_none_not_error() {
        let store = store_with_db(false);
        assert!(store.read_compat().unwrap().is_none());
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let store = store_with_db(false);
        let status = store.write_compat(&ReleaseVersion::new("13.0.0")).unwrap();
        assert_eq!(status, WriteStatus::Persisted);
        assert_eq!(
            store.read_compat().unwrap(),
            Some(ReleaseVersion::new("13.0.0"))
        );
    }

    #[test]
    fn test_upsert_advances_row_in_place() {
        let store = store_with_db(false);
        store.write_compat(&ReleaseVersion::new("12.9.0")).unwrap();
        store.write_compat(&ReleaseVersion::new("13.0.0")).unwrap();
        assert_eq!(
            store.read_compat().unwrap(),
            Some(ReleaseVersion::new("13.0.0"))
        );

        // Still a single row under the named key
        let record = store.read_record().unwrap().unwrap();
        assert_eq!(record.value, "13.0.0");
    }

    #[test]
    fn test_record_carries_timestamp() {
        let store = store_with_db(false);
        store.write_compat(&ReleaseVersion::new("13.0.0")).unwrap();
        let record = store.read_record().unwrap().unwrap();
        // RFC 3339 timestamps parse back
        assert!(chrono::DateTime::parse_from_rfc3339(&record.updated_at).is_ok());
    }

    #[test]
    fn test_suppressed_write_leaves_store_untouched() {
        let store = store_with_db(true);
        let status = store.write_compat(&ReleaseVersion::new("13.0.0")).unwrap();
        assert_eq!(status, WriteStatus::Suppressed);
        assert!(store.read_compat().unwrap().is_none());
    }

    #[test]
    fn test_suppressed_write_does_not_clobber_existing() {
        let mut store = store_with_db(false);
        store.write_compat(&ReleaseVersion::new("12.9.0")).unwrap();
        store.suppress_writes = true;
        store.write_compat(&ReleaseVersion::new("13.0.0")).unwrap();
        assert_eq!(
            store.read_compat().unwrap(),
            Some(ReleaseVersion::new("12.9.0"))
        );
    }

    #[test]
    fn test_unconfigured_store_reads_empty_writes_noop() {
        let store = FlagStore::disabled();
        assert!(!store.is_configured());
        assert!(store.read_compat().unwrap().is_none());
        let status = store.write_compat(&ReleaseVersion::new("13.0.0")).unwrap();
        assert_eq!(status, WriteStatus::Unconfigured);
    }

    #[test]
    fn test_open_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.db");
        let path_str = path.to_str().unwrap();

        {
            let db = CompatDb::open(path_str).unwrap();
            db.write_flag(COMPAT_FLAG, "13.0.0").unwrap();
        }
        {
            let db = CompatDb::open(path_str).unwrap();
            let record = db.read_flag(COMPAT_FLAG).unwrap().unwrap();
            assert_eq!(record.value, "13.0.0");
        }
    }

    #[test]
    fn test_open_bad_path_is_store_unavailable() {
        let config = Config {
            project_dir: std::env::temp_dir(),
            verbose: false,
            store_path: Some("/nonexistent-dir/definitely/flags.db".to_string()),
            suppress_writes: false,
            github_token: None,
            upstream: crate::config::UpstreamConfig::default(),
            commands: crate::config::CommandsConfig::default(),
        };
        let result = FlagStore::from_config(&config);
        assert!(matches!(result, Err(GateError::StoreUnavailable(_))));
    }

    #[test]
    fn test_flags_table_can_hold_other_records() {
        let db = CompatDb::open_in_memory().unwrap();
        db.write_flag(COMPAT_FLAG, "13.0.0").unwrap();
        db.write_flag("maintenance", "true").unwrap();
        assert_eq!(db.read_flag(COMPAT_FLAG).unwrap().unwrap().value, "13.0.0");
        assert_eq!(db.read_flag("maintenance").unwrap().unwrap().value, "true");
    }
}
