// robots.txt as a source of paths, not as a crawl policy

use crate::error::{Result, ScanError};
use regex::Regex;
use reqwest::{Client, StatusCode};
use std::sync::LazyLock;
use tracing::debug;

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:dis)?allow\s*:\s*(.*)$").expect("robots directive is a valid regex")
});

/// Paths named by `Allow:` and `Disallow:` lines, in file order.
pub fn parse_robots(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| {
            let line = line.split('#').next().unwrap_or_default();
            let caps = DIRECTIVE.captures(line)?;
            let path = caps.get(1)?.as_str().trim();
            (!path.is_empty()).then(|| path.to_string())
        })
        .collect()
}

/// Fetch `root/robots.txt`. Anything but a 200 is reported as
/// [`ScanError::Status`] so the caller can drop the source quietly.
pub async fn fetch_robots(client: &Client, root: &str) -> Result<Vec<String>> {
    let url = format!("{}/robots.txt", root.trim_end_matches('/'));
    debug!("Fetching {}", url);

    let response = client.get(&url).send().await?;
    if response.status() != StatusCode::OK {
        return Err(ScanError::Status {
            url,
            status: response.status().as_u16(),
        });
    }

    let body = response.text().await?;
    Ok(parse_robots(&body))
}
