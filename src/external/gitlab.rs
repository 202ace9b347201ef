// src/external/gitlab.rs

//! GitLab merge request client

use super::{FileChange, MergeRequest, MergeRequestSource, parse_timestamp};
use crate::config::GitLabConfig;
use crate::error::{Error, Result};
use crate::repository::RepositoryClient;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

const SERVICE: &str = "GitLab";

/// Merge requests fetched per page
const PER_PAGE: &str = "100";

/// Response header naming the next page, empty on the last one
const NEXT_PAGE_HEADER: &str = "x-next-page";

#[derive(Debug, Deserialize)]
struct RawMergeRequest {
    iid: i64,
    title: String,
    #[serde(default)]
    labels: Vec<String>,
    updated_at: String,
}

#[derive(Debug, Deserialize)]
struct RawChanges {
    changes: Vec<RawChange>,
}

#[derive(Debug, Deserialize)]
struct RawChange {
    old_path: String,
    new_path: String,
}

/// Fetches open merge requests targeting one branch
pub struct GitLabClient {
    client: RepositoryClient,
    config: GitLabConfig,
}

impl GitLabClient {
    pub fn new(config: GitLabConfig) -> Result<Self> {
        Ok(Self {
            client: RepositoryClient::new()?,
            config,
        })
    }

    fn base(&self) -> &str {
        self.config.api.trim_end_matches('/')
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        match &self.config.token {
            Some(token) => vec![("PRIVATE-TOKEN", token.as_str())],
            None => Vec::new(),
        }
    }

    /// Listing URL for one page of open merge requests
    pub fn list_url(&self, page: &str) -> Result<Url> {
        Url::parse_with_params(
            &format!("{}/merge_requests", self.base()),
            &[
                ("state", "opened"),
                ("target_branch", self.config.branch.as_str()),
                ("per_page", PER_PAGE),
                ("page", page),
            ],
        )
        .map_err(|e| Error::external(SERVICE, e))
    }

    /// Changes URL for one merge request
    pub fn changes_url(&self, iid: i64) -> String {
        format!("{}/merge_requests/{iid}/changes", self.base())
    }

    fn list_open(&self) -> Result<Vec<RawMergeRequest>> {
        let mut merges = Vec::new();
        let mut page = "1".to_string();

        loop {
            let url = self.list_url(&page)?;
            let response = self
                .client
                .get_json::<Vec<RawMergeRequest>>(url.as_str(), &self.headers())?;
            merges.extend(response.body);

            let next = response
                .headers
                .get(NEXT_PAGE_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .unwrap_or_default();
            if next.is_empty() {
                break;
            }
            page = next.to_string();
        }

        Ok(merges)
    }

    fn changes(&self, iid: i64) -> Result<Vec<FileChange>> {
        let response = self
            .client
            .get_json::<RawChanges>(&self.changes_url(iid), &self.headers())?;

        Ok(response
            .body
            .changes
            .into_iter()
            .map(|change| FileChange {
                old_path: change.old_path,
                new_path: change.new_path,
            })
            .collect())
    }

    fn fetch(&self) -> Result<Vec<MergeRequest>> {
        let raw = self.list_open()?;
        debug!("Fetched {} open merge requests", raw.len());

        raw.into_iter()
            .map(|merge| {
                Ok(MergeRequest {
                    iid: merge.iid,
                    changes: self.changes(merge.iid)?,
                    updated: parse_timestamp(&merge.updated_at)?,
                    title: merge.title,
                    labels: merge.labels,
                })
            })
            .collect()
    }
}

impl MergeRequestSource for GitLabClient {
    fn open_merge_requests(&self) -> Result<Vec<MergeRequest>> {
        info!("Fetching merge requests from {}", self.config.api);
        self.fetch().map_err(|e| Error::external(SERVICE, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(token: Option<&str>) -> GitLabClient {
        GitLabClient::new(GitLabConfig {
            api: "https://gitlab.example.org/api/v4/projects/7/".to_string(),
            branch: "3.12-stable".to_string(),
            token: token.map(str::to_string),
        })
        .unwrap()
    }

    #[test]
    fn test_urls() {
        let client = client(None);
        let url = client.list_url("2").unwrap();
        assert_eq!(url.path(), "/api/v4/projects/7/merge_requests");
        assert_eq!(
            url.query(),
            Some("state=opened&target_branch=3.12-stable&per_page=100&page=2")
        );
        assert_eq!(
            client.changes_url(15),
            "https://gitlab.example.org/api/v4/projects/7/merge_requests/15/changes"
        );
    }

    #[test]
    fn test_token_header() {
        assert!(client(None).headers().is_empty());
        assert_eq!(
            client(Some("secret")).headers(),
            vec![("PRIVATE-TOKEN", "secret")]
        );
    }

    #[test]
    fn test_decode_changes() {
        let changes: RawChanges = serde_json::from_str(
            r#"{"iid": 3, "changes": [
                {"old_path": "main/foo/APKBUILD", "new_path": "main/foo/APKBUILD", "diff": ""}
            ]}"#,
        )
        .unwrap();
        assert_eq!(changes.changes.len(), 1);
        assert_eq!(changes.changes[0].new_path, "main/foo/APKBUILD");
    }
}
