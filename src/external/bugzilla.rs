// src/external/bugzilla.rs

//! Bugzilla REST client

use super::{BugReport, IssueTracker, parse_timestamp};
use crate::config::BugzillaConfig;
use crate::error::{Error, Result};
use crate::repository::RepositoryClient;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};
use url::Url;

const SERVICE: &str = "Bugzilla";

#[derive(Debug, Deserialize)]
struct BugList {
    bugs: Vec<RawBug>,
}

#[derive(Debug, Deserialize)]
struct RawBug {
    id: i64,
    summary: String,
    #[serde(default)]
    keywords: Vec<String>,
    last_change_time: String,
    /// Remaining fields, including the configured package field
    #[serde(flatten)]
    fields: HashMap<String, Value>,
}

/// Fetches open bugs for one product and component
pub struct BugzillaClient {
    client: RepositoryClient,
    config: BugzillaConfig,
}

impl BugzillaClient {
    pub fn new(config: BugzillaConfig) -> Result<Self> {
        Ok(Self {
            client: RepositoryClient::new()?,
            config,
        })
    }

    /// Search URL for the configured product, component and statuses
    pub fn query_url(&self) -> Result<Url> {
        let include_fields = [
            "id",
            "status",
            "summary",
            "keywords",
            self.config.field.as_str(),
            "last_change_time",
        ]
        .join(",");

        let mut params = vec![
            ("product", self.config.product.as_str()),
            ("component", self.config.component.as_str()),
            ("include_fields", include_fields.as_str()),
        ];
        for status in &self.config.status {
            params.push(("status", status.as_str()));
        }

        let base = format!("{}/bug", self.config.api.trim_end_matches('/'));
        Url::parse_with_params(&base, &params).map_err(|e| Error::external(SERVICE, e))
    }

    fn convert(&self, bug: RawBug) -> Result<BugReport> {
        let packages = match bug.fields.get(&self.config.field) {
            Some(Value::String(value)) => value.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        Ok(BugReport {
            id: bug.id,
            summary: bug.summary,
            keywords: bug.keywords,
            packages,
            updated: parse_timestamp(&bug.last_change_time)?,
        })
    }
}

impl IssueTracker for BugzillaClient {
    fn open_bugs(&self) -> Result<Vec<BugReport>> {
        let url = self.query_url()?;
        info!("Fetching bugs from {}", self.config.api);

        let response = self
            .client
            .get_json::<BugList>(url.as_str(), &[])
            .map_err(|e| Error::external(SERVICE, e))?;

        let bugs = response
            .body
            .bugs
            .into_iter()
            .map(|bug| self.convert(bug))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| Error::external(SERVICE, e))?;

        debug!("Fetched {} bugs", bugs.len());
        Ok(bugs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> BugzillaClient {
        BugzillaClient::new(BugzillaConfig {
            api: "https://bugs.example.org/rest/".to_string(),
            product: "Distribution".to_string(),
            component: "Packages".to_string(),
            field: "cf_package".to_string(),
            status: vec!["CONFIRMED".to_string(), "IN_PROGRESS".to_string()],
        })
        .unwrap()
    }

    #[test]
    fn test_query_url() {
        let url = client().query_url().unwrap();
        assert_eq!(url.path(), "/rest/bug");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("product".to_string(), "Distribution".to_string())));
        assert!(pairs.contains(&(
            "include_fields".to_string(),
            "id,status,summary,keywords,cf_package,last_change_time".to_string()
        )));
        let statuses: Vec<_> = pairs.iter().filter(|(k, _)| k == "status").collect();
        assert_eq!(statuses.len(), 2);
    }

    #[test]
    fn test_convert_reads_configured_field() {
        let list: BugList = serde_json::from_str(
            r#"{"bugs": [
                {"id": 42, "summary": "foo crashes", "keywords": ["easy"],
                 "status": "CONFIRMED", "cf_package": "main/foo, main/bar",
                 "last_change_time": "2020-09-13T12:26:40Z"},
                {"id": 43, "summary": "no field", "last_change_time": "2020-09-13T12:26:40Z"}
            ]}"#,
        )
        .unwrap();

        let client = client();
        let mut bugs = list.bugs.into_iter().map(|b| client.convert(b).unwrap());

        let first = bugs.next().unwrap();
        assert_eq!(first.id, 42);
        assert_eq!(first.packages, "main/foo, main/bar");
        assert_eq!(first.keywords, vec!["easy"]);
        assert_eq!(first.updated, 1_600_000_000);

        let second = bugs.next().unwrap();
        assert_eq!(second.packages, "");
        assert!(second.keywords.is_empty());
    }
}
