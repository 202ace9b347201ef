// src/cli.rs
//! CLI definitions for vitrine
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use vitrine::config::DEFAULT_CONFIG_PATH;

#[derive(Parser)]
#[command(name = "vitrine")]
#[command(author = "Vitrine Contributors")]
#[command(version)]
#[command(about = "Aggregate APK repository indices into per-version snapshots", long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build and publish the snapshot of one or more repository versions
    Build {
        /// Repository versions to build, e.g. edge or v3.12
        #[arg(required = true, value_name = "VERSION")]
        versions: Vec<String>,

        /// Directory receiving the finished databases
        #[arg(short, long, default_value = ".")]
        output_directory: String,
    },

    /// List main packages, most recently updated first
    List {
        #[command(flatten)]
        db: SnapshotArgs,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show one package with its versions, dependencies and linked items
    Show {
        /// Package name
        name: String,

        #[command(flatten)]
        db: SnapshotArgs,
    },

    /// Search packages
    Search {
        #[command(flatten)]
        filters: SearchArgs,

        #[command(flatten)]
        db: SnapshotArgs,

        #[command(flatten)]
        page: PageArgs,
    },

    /// List maintainer names
    Maintainers {
        #[command(flatten)]
        db: SnapshotArgs,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Snapshot to read
#[derive(Args)]
pub struct SnapshotArgs {
    /// Path to a published snapshot database
    #[arg(short, long = "db", value_name = "PATH")]
    pub db_path: String,
}

/// Paging for listing commands
#[derive(Args)]
pub struct PageArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Packages per page; defaults to the configured pagination
    #[arg(long)]
    pub per_page: Option<u32>,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Repository substring
    #[arg(long)]
    pub repo: Option<String>,

    /// Name substring
    #[arg(long)]
    pub name: Option<String>,

    /// Description substring
    #[arg(long)]
    pub description: Option<String>,

    /// URL substring
    #[arg(long)]
    pub url: Option<String>,

    /// License substring
    #[arg(long)]
    pub license: Option<String>,

    /// Match text filters case-sensitively
    #[arg(long)]
    pub case_sensitive: bool,

    /// Maintainer name, or "None" for unmaintained packages
    #[arg(long)]
    pub maintainer: Option<String>,

    /// Include sub-packages
    #[arg(long)]
    pub subpackages: bool,

    /// Only packages with architecture-specific dependencies
    #[arg(long)]
    pub arch_deps: bool,

    /// Only packages with architecture-specific reverse dependencies
    #[arg(long)]
    pub arch_rdeps: bool,

    /// Only packages with missing dependencies
    #[arg(long)]
    pub missing_deps: bool,

    /// Only packages with linked bugs
    #[arg(long)]
    pub bugs: bool,

    /// Only packages with linked merge requests
    #[arg(long)]
    pub merges: bool,

    /// Only packages missing from an architecture or older there
    #[arg(long)]
    pub outdated: bool,

    /// Sort order: name or updated
    #[arg(long, default_value = "name")]
    pub sort: String,
}
