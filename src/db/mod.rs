// src/db/mod.rs

//! Snapshot database access
//!
//! Connections, transactions and the staged-then-published snapshot file.
//! A snapshot is written into a temporary file next to its final location
//! and renamed into place only once every phase has committed, so readers
//! never observe a partially built database.

pub mod models;
pub mod paths;
pub mod schema;
pub mod search;

use crate::error::{Error, Result};
use rusqlite::{Connection, OpenFlags, Transaction};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Open a read-write connection
pub fn open(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    Ok(conn)
}

/// Open an existing snapshot without write access
///
/// Fails if the file was not written with the current schema.
pub fn open_read_only(db_path: &Path) -> Result<Connection> {
    if !db_path.exists() {
        return Err(Error::NotFoundError(format!(
            "Snapshot {} does not exist",
            db_path.display()
        )));
    }

    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    schema::check_version(&conn)?;
    Ok(conn)
}

/// Open the published snapshot for `version` in `dir`
pub fn open_snapshot(dir: &Path, version: &str) -> Result<Connection> {
    paths::validate_version_name(version)?;
    open_read_only(&paths::snapshot_path(dir, version))
}

/// Run `f` inside a transaction, committing only if it succeeds
pub fn transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&Transaction) -> Result<T>,
{
    let tx = conn.transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

/// A snapshot being built in a staging file
pub struct SnapshotFile {
    staging: NamedTempFile,
    target: PathBuf,
}

impl SnapshotFile {
    /// Create an empty staging file for `version` inside `dir`
    pub fn create(dir: &Path, version: &str) -> Result<Self> {
        paths::validate_version_name(version)?;
        std::fs::create_dir_all(dir).map_err(|e| {
            Error::IoError(format!("Failed to create {}: {e}", dir.display()))
        })?;

        let staging = tempfile::Builder::new()
            .prefix(&paths::staging_prefix(version))
            .suffix(".tmp")
            .tempfile_in(dir)?;
        debug!("Staging snapshot in {}", staging.path().display());

        Ok(Self {
            staging,
            target: paths::snapshot_path(dir, version),
        })
    }

    /// Path of the staging file
    pub fn path(&self) -> &Path {
        self.staging.path()
    }

    /// Final path the snapshot is published to
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Open the staging file and create the schema
    pub fn connect(&self) -> Result<Connection> {
        let conn = open(self.staging.path())?;
        schema::create_schema(&conn)?;
        Ok(conn)
    }

    /// Atomically replace the previous snapshot with this one
    ///
    /// Every connection to the staging file must be closed first.
    pub fn publish(self) -> Result<PathBuf> {
        let target = self.target;
        let file = self.staging.persist(&target).map_err(|e| {
            Error::IoError(format!("Failed to publish {}: {}", target.display(), e.error))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o644))?;
        }
        #[cfg(not(unix))]
        drop(file);

        info!("Published snapshot {}", target.display());
        Ok(target)
    }
}
