// src/snapshot/mod.rs

//! Snapshot builder
//!
//! One build reads every configured index for a repository version, keeps
//! the newest record per name (globally and per architecture), writes the
//! package graph and tracker links into a staging database and publishes it
//! over the previous snapshot. Nothing is shared between versions.
//!
//! Each phase commits in its own transaction, but readers only ever see the
//! published file, so a failure in any phase leaves the previous snapshot
//! in place.

pub mod graph;
pub mod provider;
pub mod selector;

pub use graph::{DependencyCounts, PackageIds};
pub use provider::ProviderMap;
pub use selector::{NewestMap, SharedRecord};

use crate::config::VersionConfig;
use crate::db::{self, SnapshotFile};
use crate::error::Result;
use crate::external::{IssueTracker, LinkStats, MergeRequestSource, link_bugs, link_merges};
use crate::repository::{IndexReader, IndexSource, PackageRecord, ScanStats};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::info;

/// Winners accumulated while reading the indices
#[derive(Debug, Default)]
pub struct IndexAccumulator {
    /// Newest record per name over all architectures
    pub global: NewestMap,
    /// Newest record per name, per architecture
    pub per_arch: BTreeMap<String, NewestMap>,
    /// Best provider per name and alias over every observed record
    pub providers: ProviderMap,
}

impl IndexAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a record to the winner maps and register what it provides
    ///
    /// Providers are registered for every record, not only the global
    /// winners, so an alias that only an older per-architecture winner
    /// still provides keeps resolving on that architecture.
    pub fn observe(&mut self, record: PackageRecord) {
        let record = Rc::new(record);
        self.global.offer(&record);
        self.per_arch
            .entry(record.arch.clone())
            .or_default()
            .offer(&record);
        self.providers.register(&record);
    }
}

/// What one build wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub version: String,
    pub path: PathBuf,
    pub scan: ScanStats,
    pub packages: usize,
    pub subpackages: usize,
    pub versions: usize,
    pub dependencies: DependencyCounts,
    pub bugs: Option<LinkStats>,
    pub merges: Option<LinkStats>,
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} packages ({} sub-packages) from {} indices, {} versions, \
             {} dependencies ({} architecture-specific, {} missing)",
            self.version,
            self.packages,
            self.subpackages,
            self.scan.indices,
            self.versions,
            self.dependencies.common + self.dependencies.arch_specific,
            self.dependencies.arch_specific,
            self.dependencies.missing,
        )?;
        if let Some(bugs) = &self.bugs {
            write!(f, ", {} bugs ({} links)", bugs.items, bugs.links)?;
        }
        if let Some(merges) = &self.merges {
            write!(f, ", {} merge requests ({} links)", merges.items, merges.links)?;
        }
        Ok(())
    }
}

/// Builds and publishes the snapshot of one repository version
pub struct SnapshotBuilder<'a> {
    config: &'a VersionConfig,
    source: &'a dyn IndexSource,
    issues: Option<&'a dyn IssueTracker>,
    merges: Option<&'a dyn MergeRequestSource>,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(config: &'a VersionConfig, source: &'a dyn IndexSource) -> Self {
        Self {
            config,
            source,
            issues: None,
            merges: None,
        }
    }

    /// Link bugs from `tracker`
    pub fn with_issue_tracker(mut self, tracker: &'a dyn IssueTracker) -> Self {
        self.issues = Some(tracker);
        self
    }

    /// Link merge requests from `source`
    pub fn with_merge_requests(mut self, source: &'a dyn MergeRequestSource) -> Self {
        self.merges = Some(source);
        self
    }

    /// Read every index for the version
    pub fn scan(&self) -> Result<(IndexAccumulator, ScanStats)> {
        let mut acc = IndexAccumulator::new();
        let stats = IndexReader::new(self.source, &self.config.ignore)
            .scan(&self.config.repos, |record| acc.observe(record))?;
        Ok((acc, stats))
    }

    /// Build the snapshot and publish it as `<output_dir>/<version>.sqlite`
    pub fn build(&self, output_dir: &Path) -> Result<BuildSummary> {
        let version = self.config.name.as_str();
        info!("Building {} database...", version);

        let (acc, scan) = self.scan()?;

        let snapshot = SnapshotFile::create(output_dir, version)?;
        let mut conn = snapshot.connect()?;

        let ids = db::transaction(&mut conn, |tx| {
            graph::populate_packages(tx, &acc.global, &self.config.startdirs)
        })?;
        let versions = db::transaction(&mut conn, |tx| {
            graph::populate_versions(tx, &acc.global, &acc.per_arch, &self.config.repos, &ids)
        })?;
        let dependencies = db::transaction(&mut conn, |tx| {
            graph::populate_dependencies(tx, &acc.per_arch, &acc.providers, &ids)
        })?;

        let bugs = match self.issues {
            Some(tracker) => {
                let reports = tracker.open_bugs()?;
                Some(db::transaction(&mut conn, |tx| link_bugs(tx, &reports, &ids))?)
            }
            None => None,
        };
        let merges = match self.merges {
            Some(source) => {
                let requests = source.open_merge_requests()?;
                Some(db::transaction(&mut conn, |tx| link_merges(tx, &requests, &ids))?)
            }
            None => None,
        };

        drop(conn);
        let path = snapshot.publish()?;

        let summary = BuildSummary {
            version: version.to_string(),
            path,
            scan,
            packages: ids.len(),
            subpackages: ids.subpackage_count(),
            versions,
            dependencies,
            bugs,
            merges,
        };
        info!("{}", summary);
        Ok(summary)
    }
}
