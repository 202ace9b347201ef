// src/repository/mod.rs

//! Repository index access
//!
//! This module provides functionality for:
//! - Downloading APK indices with retry support
//! - Parsing `APKINDEX.tar.gz` archives into package records
//! - Walking every configured (repository, architecture) pair

mod apkindex;
mod client;
mod metadata;
mod reader;

pub use apkindex::{parse_index_archive, parse_index_text};
pub use client::{JsonResponse, RepositoryClient};
pub use metadata::PackageRecord;
pub use reader::{HttpIndexSource, IndexReader, IndexSource, ScanStats, expand_template};
