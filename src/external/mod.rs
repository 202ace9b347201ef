// src/external/mod.rs

//! External trackers
//!
//! Bugs from a Bugzilla instance and open merge requests from a GitLab
//! project are fetched through the traits below and linked to packages by
//! [`linker`]. The HTTP implementations live in [`bugzilla`] and [`gitlab`].

pub mod bugzilla;
pub mod gitlab;
pub mod linker;

pub use bugzilla::BugzillaClient;
pub use gitlab::GitLabClient;
pub use linker::{LinkStats, link_bugs, link_merges};

use crate::error::{Error, Result};
use chrono::DateTime;

/// A bug as read from the issue tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BugReport {
    pub id: i64,
    pub summary: String,
    pub keywords: Vec<String>,
    /// Raw value of the field naming the affected packages
    pub packages: String,
    /// Last change as a Unix timestamp
    pub updated: i64,
}

/// One file touched by a merge request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub old_path: String,
    pub new_path: String,
}

/// An open merge request with its changed files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    pub iid: i64,
    pub title: String,
    pub labels: Vec<String>,
    /// Last update as a Unix timestamp
    pub updated: i64,
    pub changes: Vec<FileChange>,
}

/// Source of open bugs
pub trait IssueTracker {
    fn open_bugs(&self) -> Result<Vec<BugReport>>;
}

/// Source of open merge requests
pub trait MergeRequestSource {
    fn open_merge_requests(&self) -> Result<Vec<MergeRequest>>;
}

/// Parse an RFC 3339 UTC timestamp such as `2020-06-01T12:30:00Z` or
/// `2020-06-01T12:30:00.123Z`
pub fn parse_timestamp(value: &str) -> Result<i64> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.timestamp())
        .map_err(|e| Error::ParseError(format!("Invalid timestamp {value:?}: {e}")))
}
