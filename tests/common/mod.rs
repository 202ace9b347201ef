// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::GzEncoder;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vitrine::external::{BugReport, IssueTracker, MergeRequest, MergeRequestSource};
use vitrine::config::Repositories;
use vitrine::{Error, HttpIndexSource, Result, VersionConfig};

/// A local mirror of `APKINDEX.tar.gz` files served through `file://` URLs
///
/// Keep the mirror alive for as long as its template is used.
pub struct Mirror {
    root: TempDir,
}

impl Mirror {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    /// Index URL template pointing into this mirror
    pub fn template(&self) -> String {
        format!(
            "file://{}/{{version}}/{{repo}}/{{arch}}/APKINDEX.tar.gz",
            self.root.path().display()
        )
    }

    /// Write the index for one (version, repo, arch) from APKINDEX text
    pub fn publish(&self, version: &str, repo: &str, arch: &str, index: &str) {
        let dir = self.root.path().join(version).join(repo).join(arch);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("APKINDEX.tar.gz"), index_archive(index)).unwrap();
    }

    pub fn source(&self, version: &str) -> HttpIndexSource {
        HttpIndexSource::new(&self.template(), version).unwrap()
    }
}

/// A signed-style index archive: signature member followed by the index member
pub fn index_archive(index: &str) -> Vec<u8> {
    let mut data = gzip_tar(&[(".SIGN.RSA.test.rsa.pub", b"signature".as_slice())]);
    data.extend(gzip_tar(&[
        ("DESCRIPTION", b"test".as_slice()),
        ("APKINDEX", index.as_bytes()),
    ]));
    data
}

fn gzip_tar(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    let tar_bytes = builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar_bytes).unwrap();
    encoder.finish().unwrap()
}

/// One APKINDEX record
pub fn record(name: &str, version: &str, build_time: i64, extra: &[&str]) -> String {
    let mut text = format!("P:{name}\nV:{version}\nt:{build_time}\n");
    for line in extra {
        text.push_str(line);
        text.push('\n');
    }
    text
}

/// Join records into APKINDEX text
pub fn index(records: &[String]) -> String {
    records.join("\n")
}

/// Version settings with no trackers
pub fn version_config(name: &str, template: &str, repos: &[(&str, &[&str])]) -> VersionConfig {
    VersionConfig {
        name: name.to_string(),
        index: template.to_string(),
        repos: repos
            .iter()
            .map(|(repo, arches)| {
                (
                    repo.to_string(),
                    arches.iter().map(|a| a.to_string()).collect(),
                )
            })
            .collect::<Repositories>(),
        ignore: BTreeSet::new(),
        startdirs: BTreeMap::new(),
        pagination: 25,
        bugzilla: None,
        gitlab: None,
    }
}

/// Output directory for snapshots
pub fn output_dir() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshots");
    (dir, path)
}

/// Files in `dir`, sorted
pub fn list_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Issue tracker returning a fixed list
pub struct StaticBugs(pub Vec<BugReport>);

impl IssueTracker for StaticBugs {
    fn open_bugs(&self) -> Result<Vec<BugReport>> {
        Ok(self.0.clone())
    }
}

/// Merge request source returning a fixed list
pub struct StaticMerges(pub Vec<MergeRequest>);

impl MergeRequestSource for StaticMerges {
    fn open_merge_requests(&self) -> Result<Vec<MergeRequest>> {
        Ok(self.0.clone())
    }
}

/// Issue tracker that is always down
pub struct UnreachableTracker;

impl IssueTracker for UnreachableTracker {
    fn open_bugs(&self) -> Result<Vec<BugReport>> {
        Err(Error::external("Bugzilla", "connection refused"))
    }
}

pub fn bug(id: i64, field: &str) -> BugReport {
    BugReport {
        id,
        summary: format!("Bug {id}"),
        keywords: Vec::new(),
        packages: field.to_string(),
        updated: 1_600_000_000,
    }
}
