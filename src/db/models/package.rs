// src/db/models/package.rs

//! Package model - main packages and their sub-packages

use super::page::{Page, Paginated};
use crate::error::Result;
use crate::repository::PackageRecord;
use rusqlite::{Connection, OptionalExtension, Row, params};

const COLUMNS: &str =
    "id, repo, name, description, url, license, origin, maintainer, startdir, revision, size, updated";

/// Marker shown in maintainer lists for packages with no maintainer
pub const UNMAINTAINED: &str = "None";

/// A package in the snapshot
///
/// `origin` is null for a main package and holds the id of the main package
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub id: Option<i64>,
    pub repo: String,
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub license: Option<String>,
    pub origin: Option<i64>,
    pub maintainer: Option<String>,
    /// Directory in the source tree the package is built from
    pub startdir: String,
    pub revision: Option<String>,
    pub size: Option<i64>,
    /// Build time of the newest build
    pub updated: Option<i64>,
}

impl Package {
    /// Build a package row from its winning index record
    pub fn from_record(record: &PackageRecord, startdir: &str, origin: Option<i64>) -> Self {
        Self {
            id: None,
            repo: record.repo.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            url: record.url.clone(),
            license: record.license.clone(),
            origin,
            maintainer: record.maintainer.clone(),
            startdir: startdir.to_string(),
            revision: record.revision.clone(),
            size: record.size,
            updated: Some(record.build_time),
        }
    }

    pub fn is_main(&self) -> bool {
        self.origin.is_none()
    }

    /// Maintainer display name (the part before the e-mail address)
    pub fn maintainer_name(&self) -> Option<&str> {
        self.maintainer.as_deref().map(display_name)
    }

    /// Insert this package into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO packages (repo, name, description, url, license, origin, maintainer, startdir, revision, size, updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                &self.repo,
                &self.name,
                &self.description,
                &self.url,
                &self.license,
                &self.origin,
                &self.maintainer,
                &self.startdir,
                &self.revision,
                &self.size,
                &self.updated,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find a package by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM packages WHERE id = ?1"))?;
        let pkg = stmt.query_row([id], Self::from_row).optional()?;
        Ok(pkg)
    }

    /// Find a package by name
    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM packages WHERE name = ?1"))?;
        let pkg = stmt.query_row([name], Self::from_row).optional()?;
        Ok(pkg)
    }

    /// Main package this package was built from, `None` for main packages
    pub fn origin_package(&self, conn: &Connection) -> Result<Option<Self>> {
        match self.origin {
            Some(origin) => Self::find_by_id(conn, origin),
            None => Ok(None),
        }
    }

    /// Sub-packages built alongside this main package
    pub fn subpackages(&self, conn: &Connection) -> Result<Vec<Self>> {
        let Some(id) = self.id.filter(|_| self.is_main()) else {
            return Ok(Vec::new());
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM packages WHERE origin = ?1 ORDER BY name"
        ))?;
        let pkgs = stmt
            .query_map([id], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(pkgs)
    }

    /// Main packages, most recently updated first
    pub fn list_main(conn: &Connection, page: Page) -> Result<Paginated<Self>> {
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM packages WHERE origin IS NULL",
            [],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM packages WHERE origin IS NULL
             ORDER BY updated DESC, name LIMIT ?1 OFFSET ?2"
        ))?;
        let items = stmt
            .query_map(params![page.limit(), page.offset()], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Paginated { items, total, page })
    }

    /// Distinct maintainer display names, sorted
    ///
    /// [`UNMAINTAINED`] comes first when any package has no maintainer.
    pub fn maintainers(conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn.prepare("SELECT DISTINCT maintainer FROM packages")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, Option<String>>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let unmaintained = rows.iter().any(Option::is_none);
        let mut names: Vec<String> = rows
            .iter()
            .flatten()
            .map(|m| display_name(m).to_string())
            .collect();
        names.sort();
        names.dedup();

        if unmaintained {
            names.insert(0, UNMAINTAINED.to_string());
        }
        Ok(names)
    }

    /// Number of packages in the snapshot
    pub fn count(conn: &Connection) -> Result<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM packages", [], |row| row.get(0))?;
        Ok(count)
    }

    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            repo: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            url: row.get(4)?,
            license: row.get(5)?,
            origin: row.get(6)?,
            maintainer: row.get(7)?,
            startdir: row.get(8)?,
            revision: row.get(9)?,
            size: row.get(10)?,
            updated: row.get(11)?,
        })
    }
}

/// Strip the ` <address>` part of a maintainer string
fn display_name(maintainer: &str) -> &str {
    maintainer
        .split_once(" <")
        .map_or(maintainer, |(name, _)| name)
}

/// Column list for callers selecting whole package rows
pub(crate) fn columns(table: &str) -> String {
    COLUMNS
        .split(", ")
        .map(|col| format!("{table}.{col}"))
        .collect::<Vec<_>>()
        .join(", ")
}
