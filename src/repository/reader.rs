// src/repository/reader.rs

//! Index reader
//!
//! Walks every configured (repository, architecture) pair, loads its index
//! and hands each record to the caller, dropping ignored names and every
//! sub-package of an ignored origin. Any failure to load one index aborts
//! the whole read.

use super::apkindex::parse_index_archive;
use super::client::RepositoryClient;
use super::metadata::PackageRecord;
use crate::config::Repositories;
use crate::error::{Error, Result};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Something that can produce the records of one (repository, architecture) index
pub trait IndexSource {
    fn load(&self, repo: &str, arch: &str) -> Result<Vec<PackageRecord>>;
}

/// Substitute `{version}`, `{repo}` and `{arch}` in an index URL template
pub fn expand_template(template: &str, version: &str, repo: &str, arch: &str) -> String {
    template
        .replace("{version}", version)
        .replace("{repo}", repo)
        .replace("{arch}", arch)
}

/// Loads `APKINDEX.tar.gz` archives over HTTP (or from `file://` URLs)
pub struct HttpIndexSource {
    client: RepositoryClient,
    template: String,
    version: String,
}

impl HttpIndexSource {
    pub fn new(template: &str, version: &str) -> Result<Self> {
        Ok(Self {
            client: RepositoryClient::new()?,
            template: template.to_string(),
            version: version.to_string(),
        })
    }

    /// URL of the index for one (repository, architecture) pair
    pub fn index_url(&self, repo: &str, arch: &str) -> String {
        expand_template(&self.template, &self.version, repo, arch)
    }
}

impl IndexSource for HttpIndexSource {
    fn load(&self, repo: &str, arch: &str) -> Result<Vec<PackageRecord>> {
        let url = self.index_url(repo, arch);
        debug!("Fetching index {}", url);
        let data = self.client.download_to_bytes(&url)?;
        parse_index_archive(&data, repo, arch)
    }
}

/// Counters for one pass over all indices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub indices: usize,
    pub records: usize,
    pub ignored: usize,
}

/// Reads every configured index, filtering ignored packages
pub struct IndexReader<'a> {
    source: &'a dyn IndexSource,
    ignore: &'a BTreeSet<String>,
}

impl<'a> IndexReader<'a> {
    pub fn new(source: &'a dyn IndexSource, ignore: &'a BTreeSet<String>) -> Self {
        Self { source, ignore }
    }

    /// Load each (repository, architecture) pair in order and pass every
    /// kept record to `visit`
    pub fn scan<F>(&self, repos: &Repositories, mut visit: F) -> Result<ScanStats>
    where
        F: FnMut(PackageRecord),
    {
        let mut stats = ScanStats::default();

        for (repo, arches) in repos.iter() {
            for arch in arches {
                info!("Parsing {}/{}...", repo, arch);

                let records = self.source.load(repo, arch).map_err(|e| {
                    if e.is_index_fetch() {
                        e
                    } else {
                        Error::index_fetch(repo, arch, e)
                    }
                })?;
                stats.indices += 1;

                for record in records {
                    if self.ignore.contains(&record.name) {
                        info!("Ignoring {:?}", record.name);
                        stats.ignored += 1;
                        continue;
                    }
                    if self.ignore.contains(&record.origin) {
                        info!(
                            "Pruning {:?} from ignored origin {:?}",
                            record.name, record.origin
                        );
                        stats.ignored += 1;
                        continue;
                    }

                    stats.records += 1;
                    visit(record);
                }
            }
        }

        Ok(stats)
    }
}
