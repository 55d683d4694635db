// sitemap.xml fetching, including nested sitemap indexes

use crate::error::{Result, ScanError};
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use std::sync::LazyLock;
use tracing::debug;

/// Index-of-index chains deeper than this are not followed.
pub const MAX_INDEX_NESTING: usize = 5;

static INDEX_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("sitemapindex").expect("valid selector"));
static INDEX_LOC_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("sitemapindex sitemap loc").expect("valid selector"));
static URL_LOC_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("url loc").expect("valid selector"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<urlset>`: page locations
    UrlSet(Vec<String>),
    /// `<sitemapindex>`: locations of further sitemaps
    Index(Vec<String>),
}

/// Classify a sitemap body and collect its `<loc>` values.
///
/// html5ever treats the sitemap vocabulary as unknown elements, which keeps
/// the tree intact and lets plain CSS selectors walk it.
pub fn parse_sitemap(body: &str) -> SitemapDocument {
    let document = Html::parse_document(body);
    let locs = |selector: &Selector| -> Vec<String> {
        document
            .select(selector)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|loc| !loc.is_empty())
            .collect()
    };

    if document.select(&INDEX_SELECTOR).next().is_some() {
        SitemapDocument::Index(locs(&INDEX_LOC_SELECTOR))
    } else {
        SitemapDocument::UrlSet(locs(&URL_LOC_SELECTOR))
    }
}

async fn fetch_document(client: &Client, url: &str) -> Result<SitemapDocument> {
    debug!("Fetching sitemap {}", url);
    let response = client.get(url).send().await?;
    if response.status() != StatusCode::OK {
        return Err(ScanError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }
    let body = response.text().await?;
    Ok(parse_sitemap(&body))
}

/// Leaf page locations reachable from the sitemap at `url`.
///
/// Failure to fetch the top-level sitemap is an error; a broken child of an
/// index is skipped and its siblings are still collected.
pub async fn fetch_sitemap(client: &Client, url: &str) -> Result<Vec<String>> {
    let mut entries = Vec::new();
    let mut seen: HashSet<String> = HashSet::from([url.to_string()]);
    let mut queue: VecDeque<(String, usize)> = VecDeque::new();

    match fetch_document(client, url).await? {
        SitemapDocument::UrlSet(locs) => return Ok(locs),
        SitemapDocument::Index(children) => {
            queue.extend(children.into_iter().map(|child| (child, 1)));
        }
    }

    while let Some((child, level)) = queue.pop_front() {
        if level > MAX_INDEX_NESTING || !seen.insert(child.clone()) {
            continue;
        }
        match fetch_document(client, &child).await {
            Ok(SitemapDocument::UrlSet(locs)) => entries.extend(locs),
            Ok(SitemapDocument::Index(children)) => {
                queue.extend(children.into_iter().map(|c| (c, level + 1)));
            }
            Err(e) => debug!("Skipping child sitemap {}: {}", child, e),
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    const URLSET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc><priority>1.0</priority></url>
  <url>
    <loc>
      https://example.com/about?a=1&amp;b=2
    </loc>
  </url>
</urlset>"#;

    #[test]
    fn test_parse_urlset() {
        assert_eq!(
            parse_sitemap(URLSET),
            SitemapDocument::UrlSet(vec![
                "https://example.com/".to_string(),
                "https://example.com/about?a=1&b=2".to_string(),
            ])
        );
    }

    #[test]
    fn test_parse_index() {
        let body = r#"<?xml version="1.0"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.com/a.xml</loc></sitemap>
  <sitemap><loc>https://example.com/b.xml</loc><lastmod>2024-01-01</lastmod></sitemap>
</sitemapindex>"#;
        assert_eq!(
            parse_sitemap(body),
            SitemapDocument::Index(vec![
                "https://example.com/a.xml".to_string(),
                "https://example.com/b.xml".to_string(),
            ])
        );
    }

    #[test]
    fn test_parse_garbage_is_empty_urlset() {
        assert_eq!(
            parse_sitemap("not a sitemap"),
            SitemapDocument::UrlSet(Vec::new())
        );
    }

    #[tokio::test]
    async fn test_fetch_nested_index() {
        let mock_server = MockServer::start().await;
        let uri = mock_server.uri();

        let index = format!(
            "<sitemapindex><sitemap><loc>{uri}/nested.xml</loc></sitemap>\
             <sitemap><loc>{uri}/missing.xml</loc></sitemap></sitemapindex>"
        );
        let nested = format!(
            "<sitemapindex><sitemap><loc>{uri}/pages.xml</loc></sitemap>\
             <sitemap><loc>{uri}/sitemap.xml</loc></sitemap></sitemapindex>"
        );
        let pages = format!("<urlset><url><loc>{uri}/page1</loc></url></urlset>");

        for (route, body) in [
            ("/sitemap.xml", index),
            ("/nested.xml", nested),
            ("/pages.xml", pages),
        ] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(200).set_body_string(body))
                .mount(&mock_server)
                .await;
        }

        let entries = fetch_sitemap(&Client::new(), &format!("{uri}/sitemap.xml"))
            .await
            .unwrap();
        assert_eq!(entries, vec![format!("{uri}/page1")]);
    }

    #[tokio::test]
    async fn test_fetch_missing_sitemap_is_error() {
        let mock_server = MockServer::start().await;
        let result = fetch_sitemap(&Client::new(), &format!("{}/sitemap.xml", mock_server.uri())).await;
        assert!(matches!(result, Err(ScanError::Status { status: 404, .. })));
    }
}
