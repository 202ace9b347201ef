// src/repository/apkindex.rs

//! APKINDEX parser
//!
//! An `APKINDEX.tar.gz` is a signature tarball and an index tarball, each
//! gzipped separately and concatenated. The index tarball holds a text file
//! named `APKINDEX` made of blank-line separated records of `K:value` lines.

use super::metadata::PackageRecord;
use crate::error::{Error, Result};
use flate2::read::MultiGzDecoder;
use std::io::Read;
use tar::Archive;
use tracing::debug;

/// Name of the index file inside the archive
const INDEX_ENTRY: &str = "APKINDEX";

/// Extract and parse the `APKINDEX` file from a downloaded archive
pub fn parse_index_archive(data: &[u8], repo: &str, arch: &str) -> Result<Vec<PackageRecord>> {
    let mut archive = Archive::new(MultiGzDecoder::new(data));
    // The signature tarball may still carry its end-of-archive blocks
    archive.set_ignore_zeros(true);

    let entries = archive
        .entries()
        .map_err(|e| Error::ParseError(format!("Failed to read index archive: {e}")))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| Error::ParseError(format!("Failed to read archive entry: {e}")))?;

        let path = entry
            .path()
            .map_err(|e| Error::ParseError(format!("Failed to get entry path: {e}")))?
            .to_string_lossy()
            .to_string();

        if path != INDEX_ENTRY {
            debug!("Skipping archive entry {}", path);
            continue;
        }

        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|e| Error::ParseError(format!("Failed to read {INDEX_ENTRY}: {e}")))?;

        return parse_index_text(&content, repo, arch);
    }

    Err(Error::ParseError(format!(
        "No {INDEX_ENTRY} entry in index archive"
    )))
}

/// Parse the text of an `APKINDEX` file
pub fn parse_index_text(content: &str, repo: &str, arch: &str) -> Result<Vec<PackageRecord>> {
    let mut records = Vec::new();
    let mut current = RawRecord::default();

    for (idx, line) in content.lines().enumerate() {
        let lineno = idx + 1;

        if line.trim().is_empty() {
            if let Some(record) = current.finish(repo, arch, lineno)? {
                records.push(record);
            }
            current = RawRecord::default();
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            return Err(Error::ParseError(format!(
                "Malformed index line {lineno}: {line:?}"
            )));
        };

        current.set(key, value, lineno)?;
    }

    if let Some(record) = current.finish(repo, arch, content.lines().count())? {
        records.push(record);
    }

    debug!("Parsed {} records from {}/{}", records.len(), repo, arch);
    Ok(records)
}

/// Fields collected for one record before validation
#[derive(Default)]
struct RawRecord {
    seen: bool,
    name: Option<String>,
    version: Option<String>,
    origin: Option<String>,
    license: Option<String>,
    description: Option<String>,
    url: Option<String>,
    maintainer: Option<String>,
    installed_size: Option<i64>,
    file_size: Option<i64>,
    build_time: Option<i64>,
    commit: Option<String>,
    depends: Vec<String>,
    provides: Vec<String>,
}

impl RawRecord {
    fn set(&mut self, key: &str, value: &str, lineno: usize) -> Result<()> {
        self.seen = true;
        let text = || Some(value.to_string());

        match key {
            "P" => self.name = text(),
            "V" => self.version = text(),
            "o" => self.origin = text(),
            "L" => self.license = text(),
            "T" => self.description = text(),
            "U" => self.url = text(),
            "m" => self.maintainer = text(),
            "c" => self.commit = text(),
            "I" => self.installed_size = Some(parse_number(key, value, lineno)?),
            "S" => self.file_size = Some(parse_number(key, value, lineno)?),
            "t" => self.build_time = Some(parse_number(key, value, lineno)?),
            "D" => self.depends = split_list(value),
            "p" => self.provides = split_list(value),
            _ => {} // Checksums, install_if, provider_priority, ...
        }

        Ok(())
    }

    fn finish(self, repo: &str, arch: &str, lineno: usize) -> Result<Option<PackageRecord>> {
        if !self.seen {
            return Ok(None);
        }

        let name = self.name.ok_or_else(|| {
            Error::ParseError(format!("Record ending at line {lineno} has no name (P:)"))
        })?;
        let version = self.version.ok_or_else(|| {
            Error::ParseError(format!("Package '{name}' has no version (V:)"))
        })?;

        let origin = self
            .origin
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| name.clone());

        Ok(Some(PackageRecord {
            repo: repo.to_string(),
            arch: arch.to_string(),
            name,
            origin,
            version,
            build_time: self.build_time.unwrap_or(0),
            size: self.installed_size.or(self.file_size),
            revision: self.commit,
            maintainer: self.maintainer,
            license: self.license,
            url: self.url,
            description: self.description,
            depends: self.depends,
            provides: self.provides,
        }))
    }
}

fn parse_number(key: &str, value: &str, lineno: usize) -> Result<i64> {
    value.trim().parse().map_err(|e| {
        Error::ParseError(format!("Invalid {key}: value {value:?} on line {lineno}: {e}"))
    })
}

fn split_list(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}
