// src/db/search.rs

//! Package search over a finished snapshot
//!
//! Text filters are SQLite GLOB patterns matched as substrings, so `*`, `?`
//! and `[...]` keep their GLOB meaning inside a filter.

use super::models::{Package, Page, Paginated, UNMAINTAINED, package_columns};
use crate::error::Result;
use rusqlite::Connection;
use rusqlite::types::Value;
use std::str::FromStr;
use tracing::debug;

/// Result ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Name,
    /// Most recently updated first
    Updated,
}

impl SortKey {
    fn order_by(self) -> &'static str {
        match self {
            SortKey::Name => "packages.name",
            SortKey::Updated => "packages.updated DESC, packages.name",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortKey::Name),
            "updated" => Ok(SortKey::Updated),
            _ => Err(format!("Invalid sort key: {s}")),
        }
    }
}

/// Maintainer filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaintainerFilter {
    /// Maintainer display name, without the address
    Named(String),
    Unmaintained,
}

impl MaintainerFilter {
    /// Parse a name as listed by [`Package::maintainers`]
    pub fn parse(name: &str) -> Self {
        if name == UNMAINTAINED {
            MaintainerFilter::Unmaintained
        } else {
            MaintainerFilter::Named(name.to_string())
        }
    }
}

/// Search filters; every set filter must match
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub repo: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub license: Option<String>,
    /// Match text filters case-sensitively
    pub case_sensitive: bool,
    pub maintainer: Option<MaintainerFilter>,
    /// Include sub-packages in the results
    pub subpackages: bool,
    /// Only packages with architecture-specific dependencies
    pub arch_deps: bool,
    /// Only packages that are architecture-specific dependencies of others
    pub arch_rdeps: bool,
    /// Only packages with unresolved dependencies
    pub missing_deps: bool,
    pub bugs: bool,
    pub merges: bool,
    /// Only packages missing from, or behind on, some architecture
    pub outdated: bool,
    pub sort: SortKey,
}

impl SearchQuery {
    fn text_filters(&self) -> [(&'static str, Option<&str>); 5] {
        [
            ("repo", self.repo.as_deref()),
            ("name", self.name.as_deref()),
            ("description", self.description.as_deref()),
            ("url", self.url.as_deref()),
            ("license", self.license.as_deref()),
        ]
    }

    /// WHERE clause and its positional parameters
    fn build_where(&self) -> (String, Vec<Value>) {
        let mut constraints = Vec::new();
        let mut params = Vec::new();

        for (column, filter) in self.text_filters() {
            let Some(filter) = filter.filter(|f| !f.is_empty()) else {
                continue;
            };
            params.push(Value::Text(if self.case_sensitive {
                format!("*{filter}*")
            } else {
                format!("*{}*", filter.to_uppercase())
            }));
            constraints.push(if self.case_sensitive {
                format!("packages.{column} GLOB ?{}", params.len())
            } else {
                format!("UPPER(packages.{column}) GLOB ?{}", params.len())
            });
        }

        match &self.maintainer {
            Some(MaintainerFilter::Unmaintained) => {
                constraints.push("packages.maintainer IS NULL".to_string());
            }
            Some(MaintainerFilter::Named(name)) => {
                params.push(Value::Text(name.clone()));
                let exact = params.len();
                params.push(Value::Text(format!("{name} <*")));
                constraints.push(format!(
                    "(packages.maintainer = ?{exact} OR packages.maintainer GLOB ?{})",
                    params.len()
                ));
            }
            None => {}
        }

        if !self.subpackages {
            constraints.push("packages.origin IS NULL".to_string());
        }

        let toggles = [
            (self.arch_deps, "SELECT 1 FROM archdeps WHERE archdeps.rdep = packages.id"),
            (self.arch_rdeps, "SELECT 1 FROM archdeps WHERE archdeps.dep = packages.id"),
            (self.missing_deps, "SELECT 1 FROM missingdeps WHERE missingdeps.package = packages.id"),
            (self.bugs, "SELECT 1 FROM buglinks WHERE buglinks.package = packages.id"),
            (self.merges, "SELECT 1 FROM mergelinks WHERE mergelinks.package = packages.id"),
            (
                self.outdated,
                "SELECT 1 FROM versions WHERE versions.package = packages.id
                 AND (versions.version IS NULL OR versions.vrank > 0)",
            ),
        ];
        for (enabled, subquery) in toggles {
            if enabled {
                constraints.push(format!("EXISTS ({subquery})"));
            }
        }

        let clause = if constraints.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", constraints.join(" AND "))
        };
        (clause, params)
    }
}

/// Run a search and return one page of matching packages
pub fn search(conn: &Connection, query: &SearchQuery, page: Page) -> Result<Paginated<Package>> {
    let (clause, mut params) = query.build_where();
    debug!("Search filter:{}", clause);

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM packages{clause}"),
        rusqlite::params_from_iter(params.iter()),
        |row| row.get(0),
    )?;

    params.push(Value::Integer(page.limit()));
    let limit = params.len();
    params.push(Value::Integer(page.offset()));
    let offset = params.len();

    let sql = format!(
        "SELECT {} FROM packages{clause} ORDER BY {} LIMIT ?{limit} OFFSET ?{offset}",
        package_columns("packages"),
        query.sort.order_by(),
    );
    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), Package::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Paginated { items, total, page })
}
