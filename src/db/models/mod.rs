// src/db/models/mod.rs

//! Data models for snapshot database entities
//!
//! This module defines Rust structs that correspond to database tables
//! and provides methods for inserting and reading records. Every model has
//! its own typed query functions.

mod dependency;
mod package;
mod page;
mod tracked;
mod version;

pub use dependency::{DependencyEdge, Direction, MissingDependency, RelatedPackage};
pub use package::{Package, UNMAINTAINED};
pub use page::{DEFAULT_PAGE_SIZE, Page, Paginated};
pub use tracked::{TrackedItem, TrackerKind};
pub use version::VersionEntry;

pub(crate) use package::columns as package_columns;
