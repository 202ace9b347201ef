// src/db/schema.rs

//! Snapshot schema
//!
//! A snapshot is rebuilt from scratch on every run, so the schema is created
//! in one step. The recorded version lets readers refuse a snapshot written
//! by an incompatible build.

use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Create every table of an empty snapshot and record [`SCHEMA_VERSION`]
///
/// - packages: one row per package name, sub-packages point at their origin
/// - versions: one row per (package, architecture), null version when absent
/// - deps / archdeps / missingdeps: resolved and unresolved dependency edges
/// - bugs / merges and their link tables: external tracker items
pub fn create_schema(conn: &Connection) -> Result<()> {
    debug!("Creating schema version {}", SCHEMA_VERSION);

    conn.execute_batch(
        "
        CREATE TABLE schema_version (
            version INTEGER NOT NULL
        );

        CREATE TABLE packages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            repo TEXT NOT NULL,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            url TEXT,
            license TEXT,
            origin INTEGER REFERENCES packages(id),
            maintainer TEXT,
            startdir TEXT NOT NULL,
            revision TEXT,
            size INTEGER,
            updated INTEGER
        );

        CREATE INDEX idx_packages_origin ON packages(origin);
        CREATE INDEX idx_packages_updated ON packages(updated);

        CREATE TABLE versions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            package INTEGER NOT NULL REFERENCES packages(id),
            arch TEXT NOT NULL,
            version TEXT,
            vrank INTEGER,
            size INTEGER,
            revision TEXT,
            created INTEGER,
            UNIQUE(package, arch)
        );

        -- rdep depends on dep on every architecture that builds rdep
        CREATE TABLE deps (
            rdep INTEGER NOT NULL REFERENCES packages(id),
            dep INTEGER NOT NULL REFERENCES packages(id),
            PRIMARY KEY (rdep, dep)
        );

        CREATE INDEX idx_deps_dep ON deps(dep);

        CREATE TABLE archdeps (
            arch TEXT NOT NULL,
            rdep INTEGER NOT NULL REFERENCES packages(id),
            dep INTEGER NOT NULL REFERENCES packages(id),
            PRIMARY KEY (arch, rdep, dep)
        );

        CREATE INDEX idx_archdeps_rdep ON archdeps(rdep);
        CREATE INDEX idx_archdeps_dep ON archdeps(dep);

        CREATE TABLE missingdeps (
            package INTEGER NOT NULL REFERENCES packages(id),
            arch TEXT NOT NULL,
            spec TEXT NOT NULL,
            PRIMARY KEY (package, arch, spec)
        );

        CREATE TABLE bugs (
            id INTEGER PRIMARY KEY,
            summary TEXT NOT NULL,
            tags TEXT NOT NULL,
            updated INTEGER NOT NULL
        );

        CREATE TABLE buglinks (
            bug INTEGER NOT NULL REFERENCES bugs(id),
            package INTEGER NOT NULL REFERENCES packages(id),
            PRIMARY KEY (bug, package)
        );

        CREATE INDEX idx_buglinks_package ON buglinks(package);

        CREATE TABLE merges (
            id INTEGER PRIMARY KEY,
            summary TEXT NOT NULL,
            tags TEXT NOT NULL,
            updated INTEGER NOT NULL
        );

        CREATE TABLE mergelinks (
            merge INTEGER NOT NULL REFERENCES merges(id),
            package INTEGER NOT NULL REFERENCES packages(id),
            PRIMARY KEY (merge, package)
        );

        CREATE INDEX idx_mergelinks_package ON mergelinks(package);
        ",
    )?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [SCHEMA_VERSION],
    )?;

    Ok(())
}

/// Schema version recorded in a database, `None` if it has none
pub fn schema_version(conn: &Connection) -> Result<Option<i32>> {
    let has_table: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
        [],
        |row| row.get(0),
    )?;
    if !has_table {
        return Ok(None);
    }

    let version = conn
        .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
        .optional()?;
    Ok(version)
}

/// Fail unless the database is a snapshot with the current schema
pub fn check_version(conn: &Connection) -> Result<()> {
    match schema_version(conn)? {
        Some(SCHEMA_VERSION) => Ok(()),
        Some(found) => Err(Error::InitError(format!(
            "Snapshot schema version {found} is not supported (expected {SCHEMA_VERSION})"
        ))),
        None => Err(Error::InitError(
            "Not a snapshot: no schema version recorded".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_schema_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();

        assert_eq!(schema_version(&conn).unwrap(), Some(SCHEMA_VERSION));
        check_version(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();

        for table in [
            "archdeps",
            "buglinks",
            "bugs",
            "deps",
            "mergelinks",
            "merges",
            "missingdeps",
            "packages",
            "schema_version",
            "versions",
        ] {
            assert!(tables.iter().any(|t| t == table), "missing table {table}");
        }
    }

    #[test]
    fn test_check_version_rejects_foreign_databases() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), None);
        assert!(matches!(check_version(&conn), Err(Error::InitError(_))));

        conn.execute_batch(
            "CREATE TABLE schema_version (version INTEGER NOT NULL);
             INSERT INTO schema_version (version) VALUES (99);",
        )
        .unwrap();
        assert_eq!(schema_version(&conn).unwrap(), Some(99));
        assert!(matches!(check_version(&conn), Err(Error::InitError(_))));
    }
}
