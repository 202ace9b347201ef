// src/db/models/dependency.rs

//! Dependency edges between packages and unresolved dependency specs

use crate::error::Result;
use rusqlite::{Connection, Row, params};

/// Which end of an edge a lookup starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Packages this package depends on
    Forward,
    /// Packages that depend on this package
    Reverse,
}

impl Direction {
    /// (column joined to packages, column matched against the package id)
    fn columns(self) -> (&'static str, &'static str) {
        match self {
            Direction::Forward => ("dep", "rdep"),
            Direction::Reverse => ("rdep", "dep"),
        }
    }
}

/// Resolved edge from `dependent` to `dependency`
///
/// `arch` is `None` for an edge common to every architecture that builds
/// the dependent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyEdge {
    pub arch: Option<String>,
    pub dependent: i64,
    pub dependency: i64,
}

impl DependencyEdge {
    pub fn common(dependent: i64, dependency: i64) -> Self {
        Self {
            arch: None,
            dependent,
            dependency,
        }
    }

    pub fn arch_specific(arch: &str, dependent: i64, dependency: i64) -> Self {
        Self {
            arch: Some(arch.to_string()),
            dependent,
            dependency,
        }
    }

    /// Insert into `deps` or `archdeps` depending on `arch`
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        match &self.arch {
            None => conn.execute(
                "INSERT INTO deps (rdep, dep) VALUES (?1, ?2)",
                params![self.dependent, self.dependency],
            )?,
            Some(arch) => conn.execute(
                "INSERT INTO archdeps (arch, rdep, dep) VALUES (?1, ?2, ?3)",
                params![arch, self.dependent, self.dependency],
            )?,
        };
        Ok(())
    }

    /// Common edges followed by architecture-specific ones
    pub fn find_by_package(
        conn: &Connection,
        package_id: i64,
        direction: Direction,
    ) -> Result<Vec<RelatedPackage>> {
        let (join, filter) = direction.columns();

        let mut stmt = conn.prepare(&format!(
            "SELECT NULL, packages.id, packages.name FROM deps
             INNER JOIN packages ON packages.id = deps.{join}
             WHERE deps.{filter} = ?1
             UNION ALL
             SELECT archdeps.arch, packages.id, packages.name FROM archdeps
             INNER JOIN packages ON packages.id = archdeps.{join}
             WHERE archdeps.{filter} = ?1
             ORDER BY 1, 3"
        ))?;

        let related = stmt
            .query_map([package_id], RelatedPackage::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(related)
    }

    /// Number of common and architecture-specific edges
    pub fn count(conn: &Connection) -> Result<(i64, i64)> {
        let common = conn.query_row("SELECT COUNT(*) FROM deps", [], |row| row.get(0))?;
        let arch = conn.query_row("SELECT COUNT(*) FROM archdeps", [], |row| row.get(0))?;
        Ok((common, arch))
    }
}

/// The package at the other end of a dependency edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedPackage {
    pub arch: Option<String>,
    pub package_id: i64,
    pub name: String,
}

impl RelatedPackage {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            arch: row.get(0)?,
            package_id: row.get(1)?,
            name: row.get(2)?,
        })
    }
}

/// A dependency spec that matched no package on one architecture
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MissingDependency {
    pub package_id: i64,
    pub arch: String,
    pub spec: String,
}

impl MissingDependency {
    pub fn new(package_id: i64, arch: &str, spec: &str) -> Self {
        Self {
            package_id,
            arch: arch.to_string(),
            spec: spec.to_string(),
        }
    }

    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT OR IGNORE INTO missingdeps (package, arch, spec) VALUES (?1, ?2, ?3)",
            params![self.package_id, &self.arch, &self.spec],
        )?;
        Ok(())
    }

    pub fn find_by_package(conn: &Connection, package_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT package, arch, spec FROM missingdeps WHERE package = ?1 ORDER BY arch, spec",
        )?;

        let missing = stmt
            .query_map([package_id], |row| {
                Ok(Self {
                    package_id: row.get(0)?,
                    arch: row.get(1)?,
                    spec: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(missing)
    }

    pub fn count(conn: &Connection) -> Result<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM missingdeps", [], |row| row.get(0))?;
        Ok(count)
    }
}
