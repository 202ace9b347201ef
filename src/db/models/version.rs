// src/db/models/version.rs

//! VersionEntry model - one package on one architecture

use crate::error::Result;
use crate::repository::PackageRecord;
use rusqlite::{Connection, Row, params};

/// Version of a package on one architecture
///
/// A null `version` means the package's repository is built for this
/// architecture but the package is absent from its index. `rank` is the
/// position of `version` among the package's distinct versions across the
/// whole snapshot, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    pub id: Option<i64>,
    pub package_id: i64,
    pub arch: String,
    pub version: Option<String>,
    pub rank: Option<i64>,
    pub size: Option<i64>,
    pub revision: Option<String>,
    pub created: Option<i64>,
}

impl VersionEntry {
    /// Row for a package observed in one architecture's index
    pub fn observed(package_id: i64, record: &PackageRecord) -> Self {
        Self {
            id: None,
            package_id,
            arch: record.arch.clone(),
            version: Some(record.version.clone()),
            rank: None,
            size: record.size,
            revision: record.revision.clone(),
            created: Some(record.build_time),
        }
    }

    /// Row marking a package as not built on `arch`
    pub fn placeholder(package_id: i64, arch: &str) -> Self {
        Self {
            id: None,
            package_id,
            arch: arch.to_string(),
            version: None,
            rank: None,
            size: None,
            revision: None,
            created: None,
        }
    }

    pub fn with_rank(mut self, rank: Option<i64>) -> Self {
        self.rank = rank;
        self
    }

    /// Insert this version into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO versions (package, arch, version, vrank, size, revision, created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &self.package_id,
                &self.arch,
                &self.version,
                &self.rank,
                &self.size,
                &self.revision,
                &self.created,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// All architectures' versions of a package, ordered by architecture
    pub fn find_by_package(conn: &Connection, package_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, package, arch, version, vrank, size, revision, created
             FROM versions WHERE package = ?1 ORDER BY arch",
        )?;

        let versions = stmt
            .query_map([package_id], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(versions)
    }

    /// Number of version rows in the snapshot
    pub fn count(conn: &Connection) -> Result<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM versions", [], |row| row.get(0))?;
        Ok(count)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            package_id: row.get(1)?,
            arch: row.get(2)?,
            version: row.get(3)?,
            rank: row.get(4)?,
            size: row.get(5)?,
            revision: row.get(6)?,
            created: row.get(7)?,
        })
    }
}
