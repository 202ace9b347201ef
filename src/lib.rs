// src/lib.rs

//! Vitrine package tracker
//!
//! Aggregates the APK indices of a repository version into one SQLite
//! snapshot: packages and sub-packages, per-architecture versions ranked
//! newest first, resolved dependency edges and links to open bugs and merge
//! requests.
//!
//! # Architecture
//!
//! - `repository`: index download, APKINDEX parsing and ignore filtering
//! - `snapshot`: newest-build selection, provider resolution and the graph
//!   builder that writes the snapshot
//! - `external`: Bugzilla and GitLab clients plus the linker
//! - `db`: schema, models, the read-path query API and atomic publishing

pub mod config;
pub mod db;
mod error;
pub mod external;
pub mod repository;
pub mod snapshot;
pub mod version;

pub use config::{SiteConfig, VersionConfig};
pub use error::{Error, Result};
pub use repository::{HttpIndexSource, IndexSource, PackageRecord};
pub use snapshot::{BuildSummary, SnapshotBuilder};
pub use version::VersionOrdering;
