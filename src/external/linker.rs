// src/external/linker.rs

//! Link tracker items to packages
//!
//! Bug fields carry `repo/package` or bare `package` tokens, merge requests
//! touch `repo/package/APKBUILD` paths. Both are resolved by exact package
//! name first, then through the start directory of a main package.

use super::{BugReport, MergeRequest};
use crate::db::models::{TrackedItem, TrackerKind};
use crate::error::Result;
use crate::snapshot::graph::PackageIds;
use rusqlite::Connection;
use std::collections::BTreeSet;
use tracing::{error, info, warn};

/// Build manifest marking a package directory
const MANIFEST: &str = "APKBUILD";

/// Counts gathered while linking one kind of tracker item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Items persisted
    pub items: usize,
    /// Link rows written
    pub links: usize,
    /// References that matched no package
    pub unresolved: usize,
    /// Tokens with an invalid shape
    pub malformed: usize,
}

/// Package named by one bug field token
///
/// Returns `None` for tokens with more than one `/`.
pub fn parse_bug_token(token: &str) -> Option<&str> {
    match token.split_once('/') {
        None => Some(token),
        Some((_, package)) if !package.contains('/') => Some(package),
        Some(_) => None,
    }
}

/// `(repo, package)` directories whose manifest a merge request touches
pub fn changed_startdirs(merge: &MergeRequest) -> BTreeSet<(String, String)> {
    let mut dirs = BTreeSet::new();
    for change in &merge.changes {
        for path in [&change.old_path, &change.new_path] {
            let parts: Vec<&str> = path.splitn(3, '/').collect();
            if let [repo, package, MANIFEST] = parts.as_slice() {
                dirs.insert((repo.to_string(), package.to_string()));
            }
        }
    }
    dirs
}

/// Resolve a package name, falling back to the main package built in `startdir`
fn resolve(ids: &PackageIds, label: &str, package: &str, startdir: &str) -> Option<i64> {
    if let Some(id) = ids.id(package) {
        return Some(id);
    }

    let main = ids.main_for_startdir(startdir)?;
    info!("{}: {:?} -> {:?}", label, startdir, main);
    ids.id(main)
}

/// Persist bugs naming at least one known package, with their links
pub fn link_bugs(conn: &Connection, bugs: &[BugReport], ids: &PackageIds) -> Result<LinkStats> {
    info!("Building bug tables...");
    let mut stats = LinkStats::default();

    for bug in bugs {
        let field = bug.packages.trim();
        if field.is_empty() {
            continue;
        }

        let label = format!("Bug #{}", bug.id);
        let mut packages = BTreeSet::new();

        for token in field.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let Some(package) = parse_bug_token(token) else {
                error!("{}: invalid package reference {:?}", label, token);
                stats.malformed += 1;
                continue;
            };

            match resolve(ids, &label, package, token) {
                Some(id) => {
                    packages.insert(id);
                }
                None => {
                    warn!("{}: unknown package {:?}", label, token);
                    stats.unresolved += 1;
                }
            }
        }

        if packages.is_empty() {
            continue;
        }

        let item = TrackedItem::new(
            TrackerKind::Bug,
            bug.id,
            &bug.summary,
            bug.keywords.clone(),
            bug.updated,
        );
        item.insert(conn)?;
        for id in &packages {
            item.link(conn, *id)?;
        }
        stats.items += 1;
        stats.links += packages.len();
    }

    Ok(stats)
}

/// Persist merge requests touching at least one known package, with their links
pub fn link_merges(
    conn: &Connection,
    merges: &[MergeRequest],
    ids: &PackageIds,
) -> Result<LinkStats> {
    info!("Building merge request tables...");
    let mut stats = LinkStats::default();

    for merge in merges {
        let label = format!("MR #{}", merge.iid);
        let mut packages = BTreeSet::new();

        for (repo, package) in changed_startdirs(merge) {
            let startdir = format!("{repo}/{package}");
            match resolve(ids, &label, &package, &startdir) {
                Some(id) => {
                    packages.insert(id);
                }
                None => {
                    warn!("{}: new or unknown package {:?}", label, startdir);
                    stats.unresolved += 1;
                }
            }
        }

        if packages.is_empty() {
            continue;
        }

        let item = TrackedItem::new(
            TrackerKind::Merge,
            merge.iid,
            &merge.title,
            merge.labels.clone(),
            merge.updated,
        );
        item.insert(conn)?;
        for id in &packages {
            item.link(conn, *id)?;
        }
        stats.items += 1;
        stats.links += packages.len();
    }

    Ok(stats)
}
