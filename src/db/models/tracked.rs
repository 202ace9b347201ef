// src/db/models/tracked.rs

//! TrackedItem model - bugs and merge requests linked to packages

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::fmt;

/// Kind of external tracker an item comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackerKind {
    Bug,
    Merge,
}

impl TrackerKind {
    fn table(self) -> &'static str {
        match self {
            TrackerKind::Bug => "bugs",
            TrackerKind::Merge => "merges",
        }
    }

    fn link_table(self) -> &'static str {
        match self {
            TrackerKind::Bug => "buglinks",
            TrackerKind::Merge => "mergelinks",
        }
    }

    fn link_column(self) -> &'static str {
        match self {
            TrackerKind::Bug => "bug",
            TrackerKind::Merge => "merge",
        }
    }
}

impl fmt::Display for TrackerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerKind::Bug => write!(f, "Bug"),
            TrackerKind::Merge => write!(f, "MR"),
        }
    }
}

/// A bug or merge request, keyed by its id in the external system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedItem {
    pub kind: TrackerKind,
    pub id: i64,
    pub summary: String,
    pub tags: Vec<String>,
    /// Last update as a Unix timestamp
    pub updated: i64,
}

impl TrackedItem {
    pub fn new(kind: TrackerKind, id: i64, summary: &str, tags: Vec<String>, updated: i64) -> Self {
        Self {
            kind,
            id,
            summary: summary.to_string(),
            tags,
            updated,
        }
    }

    /// Insert this item; ids come from the tracker and are not regenerated
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            &format!(
                "INSERT INTO {} (id, summary, tags, updated) VALUES (?1, ?2, ?3, ?4)",
                self.kind.table()
            ),
            params![self.id, &self.summary, self.tags.join(","), self.updated],
        )?;
        Ok(())
    }

    /// Link this item to a package, ignoring duplicate links
    pub fn link(&self, conn: &Connection, package_id: i64) -> Result<()> {
        conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} ({}, package) VALUES (?1, ?2)",
                self.kind.link_table(),
                self.kind.link_column()
            ),
            params![self.id, package_id],
        )?;
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, kind: TrackerKind, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT id, summary, tags, updated FROM {} WHERE id = ?1",
            kind.table()
        ))?;
        let item = stmt
            .query_row([id], |row| Self::from_row(kind, row))
            .optional()?;
        Ok(item)
    }

    /// Items of `kind` linked to a package, most recently updated first
    pub fn find_by_package(
        conn: &Connection,
        kind: TrackerKind,
        package_id: i64,
    ) -> Result<Vec<Self>> {
        let table = kind.table();
        let links = kind.link_table();
        let column = kind.link_column();

        let mut stmt = conn.prepare(&format!(
            "SELECT {table}.id, {table}.summary, {table}.tags, {table}.updated
             FROM {links} INNER JOIN {table} ON {table}.id = {links}.{column}
             WHERE {links}.package = ?1
             ORDER BY {table}.updated DESC, {table}.id"
        ))?;

        let items = stmt
            .query_map([package_id], |row| Self::from_row(kind, row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(items)
    }

    /// Ids of the packages an item is linked to
    pub fn linked_packages(&self, conn: &Connection) -> Result<Vec<i64>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT package FROM {} WHERE {} = ?1 ORDER BY package",
            self.kind.link_table(),
            self.kind.link_column()
        ))?;

        let ids = stmt
            .query_map([self.id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;

        Ok(ids)
    }

    /// (items, links) stored for `kind`
    pub fn count(conn: &Connection, kind: TrackerKind) -> Result<(i64, i64)> {
        let items = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.table()),
            [],
            |row| row.get(0),
        )?;
        let links = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.link_table()),
            [],
            |row| row.get(0),
        )?;
        Ok((items, links))
    }

    fn from_row(kind: TrackerKind, row: &Row) -> rusqlite::Result<Self> {
        let tags: String = row.get(2)?;
        Ok(Self {
            kind,
            id: row.get(0)?,
            summary: row.get(1)?,
            tags: tags
                .split(',')
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            updated: row.get(3)?,
        })
    }
}
