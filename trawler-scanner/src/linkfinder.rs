// Heuristic endpoint extraction from JavaScript bodies.
//
// This is a pattern scan, not a parser: anything quoted that looks like a
// URL, a relative path or a file with a web-ish extension is returned.
// Expect noise.

use crate::error::{Result, ScanError};
use regex::Regex;
use reqwest::{Client, StatusCode};
use std::sync::LazyLock;
use tracing::debug;

static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?:"|')("#,
        // absolute or scheme-relative URLs
        r#"(?:(?:[a-zA-Z]{1,10}://|//)[^"'/]{1,}\.[a-zA-Z]{2,}[^"']{0,})"#,
        // root, parent or current relative paths
        r#"|(?:(?:/|\.\./|\./)[^"'><,;| *()(%$^/\\\[\]][^"'><,;|()]{1,})"#,
        // dir/file.ext and dir/endpoint.action with optional query or path
        r#"|(?:[a-zA-Z0-9_\-/]{1,}/[a-zA-Z0-9_\-/]{1,}\.(?:[a-zA-Z]{1,4}|action)(?:[\?|/][^"|']{0,}|))"#,
        // bare filenames with common web extensions
        r#"|(?:[a-zA-Z0-9_\-]{1,}\.(?:php|asp|aspx|jsp|json|action|html|js|txt|xml)(?:\?[^"|']{0,}|))"#,
        r#")(?:"|')"#,
    ))
    .expect("link pattern is a valid constant regex")
});

/// Every non-overlapping candidate in `script`, quotes stripped, in order
/// of appearance. Duplicates are kept.
pub fn extract_links(script: &str) -> impl Iterator<Item = &str> + '_ {
    LINK_PATTERN
        .captures_iter(script)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// Body of a script file, only when it is served with a 200.
pub async fn fetch_script(client: &Client, url: &str) -> Result<String> {
    debug!("Fetching script {}", url);
    let response = client.get(url).send().await?;
    if response.status() != StatusCode::OK {
        return Err(ScanError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }
    Ok(response.text().await?)
}
