// src/commands/build.rs
//! Snapshot build command

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;
use vitrine::config::{SiteConfig, VersionConfig};
use vitrine::external::{BugzillaClient, GitLabClient, IssueTracker, MergeRequestSource};
use vitrine::{BuildSummary, HttpIndexSource, SnapshotBuilder};

/// Build one snapshot per version, in order, stopping at the first failure
pub fn cmd_build(config_path: &Path, versions: &[String], output_dir: &Path) -> Result<()> {
    let site = SiteConfig::load(config_path)?;

    for version in versions {
        let config = site.version(version)?;
        let summary = build_version(&config, output_dir)
            .with_context(|| format!("Failed to build {version} database"))?;
        println!("{}", summary);
    }

    Ok(())
}

fn build_version(config: &VersionConfig, output_dir: &Path) -> Result<BuildSummary> {
    let source = HttpIndexSource::new(&config.index, &config.name)?;

    let bugzilla = config.bugzilla.clone().map(BugzillaClient::new).transpose()?;
    let gitlab = config.gitlab.clone().map(GitLabClient::new).transpose()?;

    let mut builder = SnapshotBuilder::new(config, &source);
    if let Some(client) = &bugzilla {
        builder = builder.with_issue_tracker(client as &dyn IssueTracker);
    } else {
        info!("No issue tracker configured for {}", config.name);
    }
    if let Some(client) = &gitlab {
        builder = builder.with_merge_requests(client as &dyn MergeRequestSource);
    }

    Ok(builder.build(output_dir)?)
}
