// Historical URL archive collaborator

use crate::error::{Result, ScanError};
use futures::future::BoxFuture;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub const WAYBACK_CDX_ENDPOINT: &str = "http://web.archive.org/cdx/search/cdx";

/// A source of previously seen URLs for a domain.
///
/// Implementations never fail outward: an unreachable or broken archive
/// yields an empty list.
pub trait ArchiveSource: Send + Sync {
    fn fetch_urls<'a>(&'a self, domain: &'a str) -> BoxFuture<'a, Vec<String>>;
}

/// Wayback Machine CDX API client.
pub struct WaybackArchive {
    client: Client,
    endpoint: String,
}

impl WaybackArchive {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        Self::with_endpoint(WAYBACK_CDX_ENDPOINT, timeout_secs)
    }

    pub fn with_endpoint(endpoint: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("trawler/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    async fn query(&self, domain: &str) -> Result<Vec<String>> {
        let pattern = format!("*.{}/*", domain);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("url", pattern.as_str()),
                ("output", "json"),
                ("collapse", "urlkey"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ScanError::Status {
                url: self.endpoint.clone(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        parse_cdx(&body)
    }
}

impl ArchiveSource for WaybackArchive {
    fn fetch_urls<'a>(&'a self, domain: &'a str) -> BoxFuture<'a, Vec<String>> {
        Box::pin(async move {
            match self.query(domain).await {
                Ok(urls) => urls,
                Err(e) => {
                    debug!("Archive lookup for {} failed: {}", domain, e);
                    Vec::new()
                }
            }
        })
    }
}

/// Original URLs from a CDX `output=json` body. The first row is the
/// column header; the original URL is the third column.
pub fn parse_cdx(body: &str) -> Result<Vec<String>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let rows: Vec<Vec<String>> =
        serde_json::from_str(body).map_err(|e| ScanError::ParseError(e.to_string()))?;
    Ok(rows
        .into_iter()
        .skip(1)
        .filter_map(|row| row.into_iter().nth(2))
        .collect())
}
