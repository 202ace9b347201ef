// src/config.rs
//! Configuration file parsing for snapshot builds
//!
//! Supports TOML configuration files with the following sections:
//! - [default] - Settings shared by every repository version
//! - [versions.*] - Per-version overrides of any [default] key
//!
//! Keys inside either section: `index`, `repos`, `ignore`, `startdirs`,
//! `pagination`, `[bugzilla]` and `[gitlab]`. A key set for a version
//! replaces the default value as a whole.

use anyhow::{Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use crate::db::models::DEFAULT_PAGE_SIZE;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/vitrine/config.toml";

/// Bug statuses queried when none are configured
pub const DEFAULT_BUG_STATUSES: [&str; 3] = ["UNCONFIRMED", "CONFIRMED", "IN_PROGRESS"];

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
pub struct SiteConfig {
    /// Settings shared by all versions
    #[serde(default)]
    pub default: VersionSection,

    /// Per-version overrides
    #[serde(default)]
    pub versions: BTreeMap<String, VersionSection>,
}

/// One `[default]` or `[versions.<name>]` section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct VersionSection {
    /// Index URL template with `{version}`, `{repo}` and `{arch}`
    pub index: Option<String>,

    /// Repository name to architectures, in fetch order
    pub repos: Option<Repositories>,

    /// Package or origin names to leave out entirely
    pub ignore: Option<Vec<String>>,

    /// Non-standard start directory to the main package built there
    pub startdirs: Option<BTreeMap<String, String>>,

    /// Page size for read commands
    pub pagination: Option<u32>,

    pub bugzilla: Option<BugzillaConfig>,

    pub gitlab: Option<GitLabConfig>,
}

/// Repository name to architectures, kept in configuration order
///
/// Indices are read in this order, so on a full tie between two
/// repositories the one listed first keeps the package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Repositories(Vec<(String, Vec<String>)>);

impl Repositories {
    /// Architectures configured for `repo`
    pub fn get(&self, repo: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(name, _)| name == repo)
            .map(|(_, arches)| arches.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(repo, arches)| (repo.as_str(), arches.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for Repositories {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for Repositories {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RepositoriesVisitor;

        impl<'de> Visitor<'de> for RepositoriesVisitor {
            type Value = Repositories;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a table of repository names to architecture lists")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut repos = Vec::new();
                while let Some((repo, arches)) = map.next_entry::<String, Vec<String>>()? {
                    repos.push((repo, arches));
                }
                Ok(Repositories(repos))
            }
        }

        deserializer.deserialize_map(RepositoriesVisitor)
    }
}

/// Issue tracker settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BugzillaConfig {
    /// REST API base, e.g. `https://bugs.example.org/rest`
    pub api: String,
    pub product: String,
    pub component: String,
    /// Bug field holding `repo/package` references
    pub field: String,
    #[serde(default = "default_statuses")]
    pub status: Vec<String>,
}

fn default_statuses() -> Vec<String> {
    DEFAULT_BUG_STATUSES.iter().map(|s| s.to_string()).collect()
}

/// Merge request settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitLabConfig {
    /// Project API base, e.g. `https://gitlab.example.org/api/v4/projects/1`
    pub api: String,
    /// Target branch of the merge requests to link
    pub branch: String,
    /// Personal access token sent as PRIVATE-TOKEN
    #[serde(default)]
    pub token: Option<String>,
}

/// Fully resolved settings for one repository version
#[derive(Debug, Clone)]
pub struct VersionConfig {
    pub name: String,
    pub index: String,
    pub repos: Repositories,
    pub ignore: BTreeSet<String>,
    pub startdirs: BTreeMap<String, String>,
    pub pagination: u32,
    pub bugzilla: Option<BugzillaConfig>,
    pub gitlab: Option<GitLabConfig>,
}

impl SiteConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Resolve and validate the settings for one version
    pub fn version(&self, name: &str) -> Result<VersionConfig> {
        let section = self
            .versions
            .get(name)
            .with_context(|| format!("No [versions.{name}] section in configuration"))?;
        let default = &self.default;

        let index = section
            .index
            .clone()
            .or_else(|| default.index.clone())
            .filter(|index| !index.trim().is_empty())
            .with_context(|| format!("versions.{name}: index is not set"))?;

        let repos = section
            .repos
            .clone()
            .or_else(|| default.repos.clone())
            .filter(|repos| !repos.is_empty())
            .with_context(|| format!("versions.{name}: repos is not set"))?;

        if let Some((repo, _)) = repos.iter().find(|(_, arches)| arches.is_empty()) {
            anyhow::bail!("versions.{name}: repository {repo} has no architectures");
        }

        let pagination = section
            .pagination
            .or(default.pagination)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        if pagination == 0 {
            anyhow::bail!("versions.{name}: pagination must be at least 1");
        }

        Ok(VersionConfig {
            name: name.to_string(),
            index,
            repos,
            ignore: section
                .ignore
                .clone()
                .or_else(|| default.ignore.clone())
                .unwrap_or_default()
                .into_iter()
                .collect(),
            startdirs: section
                .startdirs
                .clone()
                .or_else(|| default.startdirs.clone())
                .unwrap_or_default(),
            pagination,
            bugzilla: section.bugzilla.clone().or_else(|| default.bugzilla.clone()),
            gitlab: section.gitlab.clone().or_else(|| default.gitlab.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[default]
index = "https://dl.example.org/{version}/{repo}/{arch}/APKINDEX.tar.gz"
ignore = ["junk"]

[default.repos]
main = ["x86_64", "aarch64"]
community = ["x86_64"]

[default.startdirs]
"community/py-foo" = "py3-foo"

[default.bugzilla]
api = "https://bugs.example.org/rest"
product = "Distribution"
component = "Packages"
field = "cf_package"

[versions.edge]
pagination = 50

[versions.edge.gitlab]
api = "https://gitlab.example.org/api/v4/projects/1"
branch = "master"

[versions."v3.12"]
ignore = []

[versions."v3.12".repos]
main = ["x86_64"]
"#;

    #[test]
    fn test_defaults_apply_to_versions() {
        let config = SiteConfig::parse(SAMPLE).unwrap();
        let edge = config.version("edge").unwrap();

        assert_eq!(edge.name, "edge");
        assert_eq!(edge.repos.len(), 2);
        assert_eq!(edge.repos.get("main").unwrap(), ["x86_64", "aarch64"]);
        assert!(edge.ignore.contains("junk"));
        assert_eq!(edge.startdirs["community/py-foo"], "py3-foo");
        assert_eq!(edge.pagination, 50);

        let bugzilla = edge.bugzilla.unwrap();
        assert_eq!(bugzilla.field, "cf_package");
        assert_eq!(bugzilla.status, vec!["UNCONFIRMED", "CONFIRMED", "IN_PROGRESS"]);

        let gitlab = edge.gitlab.unwrap();
        assert_eq!(gitlab.branch, "master");
        assert_eq!(gitlab.token, None);
    }

    #[test]
    fn test_version_overrides_replace_keys() {
        let config = SiteConfig::parse(SAMPLE).unwrap();
        let stable = config.version("v3.12").unwrap();

        assert_eq!(stable.repos.len(), 1);
        assert!(stable.ignore.is_empty());
        assert_eq!(stable.pagination, DEFAULT_PAGE_SIZE);
        assert!(stable.gitlab.is_none());
    }

    #[test]
    fn test_repositories_keep_configured_order() {
        let config = SiteConfig::parse(SAMPLE).unwrap();
        let edge = config.version("edge").unwrap();
        let order: Vec<_> = edge.repos.iter().map(|(repo, _)| repo).collect();
        assert_eq!(order, vec!["main", "community"]);

        let config = SiteConfig::parse(
            r#"
[versions.edge]
index = "file:///srv/{version}/{repo}/{arch}/APKINDEX.tar.gz"
[versions.edge.repos]
testing = ["x86_64"]
community = ["x86_64"]
main = ["x86_64"]
"#,
        )
        .unwrap();
        let edge = config.version("edge").unwrap();
        let order: Vec<_> = edge.repos.iter().map(|(repo, _)| repo).collect();
        assert_eq!(order, vec!["testing", "community", "main"]);
    }

    #[test]
    fn test_unknown_version_is_an_error() {
        let config = SiteConfig::parse(SAMPLE).unwrap();
        assert!(config.version("v2.0").is_err());
    }

    #[test]
    fn test_validation() {
        let config = SiteConfig::parse(
            r#"
[versions.edge]
index = "file:///srv/{version}/{repo}/{arch}/APKINDEX.tar.gz"
[versions.edge.repos]
main = []
"#,
        )
        .unwrap();
        assert!(config.version("edge").is_err());

        let config = SiteConfig::parse("[versions.edge]\n").unwrap();
        assert!(config.version("edge").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(SiteConfig::load(Path::new("/nonexistent/vitrine.toml")).is_err());
    }
}
