// The four source aggregators of a job

use crate::error::{JobError, Result};
use crate::model::{Category, Discovery, Finding, Source};
use crate::pipeline::Pipeline;
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tracing::debug;
use trawler_scanner::{
    ArchiveSource, CrawlEngine, ElementObserver, PageElement, extract_links, fetch_robots,
    fetch_script, fetch_sitemap, host_with_port,
};
use url::Url;

/// How one aggregator ended. A recovered fetch or parse failure is kept as
/// text; it never fails the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatorOutcome {
    pub source: Source,
    pub emitted: usize,
    pub error: Option<String>,
}

impl AggregatorOutcome {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            emitted: 0,
            error: None,
        }
    }

    fn failed(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

/// Everything the aggregators of one job share.
pub struct JobContext {
    pub pipeline: Arc<Pipeline>,
    pub client: Client,
    pub engine: Arc<CrawlEngine>,
    pub observer: Arc<LiveCrawlObserver>,
    pub archive: Option<Arc<dyn ArchiveSource>>,
}

impl JobContext {
    fn report(&self, category: Category, candidate: impl Into<String>) -> Result<bool> {
        Ok(self
            .pipeline
            .report(Discovery::new(category, candidate))?
            .is_some())
    }

    /// Hand in-scope seeds to the crawl frontier when depth allows.
    async fn reseed(&self, seeds: Vec<String>) {
        let config = self.pipeline.config();
        if !config.reseeds() || seeds.is_empty() {
            return;
        }

        let filter = self.pipeline.filter();
        let seeds: Vec<String> = seeds
            .into_iter()
            .filter(|seed| Url::parse(seed).is_ok_and(|url| filter.in_scope(&url)))
            .collect();
        debug!("Re-seeding {} URL(s) for {}", seeds.len(), filter.domain());

        stream::iter(seeds)
            .for_each_concurrent(config.workers.max(1), |seed| async move {
                if let Err(e) = self.engine.visit(&seed).await {
                    debug!("Seed {} failed: {}", seed, e);
                }
            })
            .await;
    }
}

pub async fn run_robots(ctx: Arc<JobContext>) -> Result<AggregatorOutcome> {
    let mut outcome = AggregatorOutcome::new(Source::Robots);
    let root = ctx.pipeline.filter().root_url();

    let paths = match fetch_robots(&ctx.client, &root).await {
        Ok(paths) => paths,
        Err(e) => {
            debug!("robots.txt unavailable for {}: {}", root, e);
            return Ok(outcome.failed(e));
        }
    };

    let mut seeds = Vec::with_capacity(paths.len());
    for path in paths {
        let absolute = if path.starts_with('/') {
            format!("{}{}", root, path)
        } else {
            format!("{}/{}", root, path)
        };
        if ctx.report(Category::Robots, absolute.as_str())? {
            outcome.emitted += 1;
        }
        seeds.push(absolute);
    }

    ctx.reseed(seeds).await;
    Ok(outcome)
}

pub async fn run_sitemap(ctx: Arc<JobContext>) -> Result<AggregatorOutcome> {
    let mut outcome = AggregatorOutcome::new(Source::Sitemap);
    let sitemap_url = format!("{}/sitemap.xml", ctx.pipeline.filter().root_url());

    let entries = match fetch_sitemap(&ctx.client, &sitemap_url).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!("sitemap unavailable at {}: {}", sitemap_url, e);
            return Ok(outcome.failed(e));
        }
    };

    for entry in &entries {
        if ctx.report(Category::Sitemap, entry.as_str())? {
            outcome.emitted += 1;
        }
    }

    ctx.reseed(entries).await;
    Ok(outcome)
}

/// Archive entries are reported through the normal pipeline. A host is
/// only offered as a subdomain when it literally contains the target
/// domain, since archives return unrelated hosts too.
pub async fn run_archive(ctx: Arc<JobContext>) -> Result<AggregatorOutcome> {
    let mut outcome = AggregatorOutcome::new(Source::Archive);
    let Some(archive) = ctx.archive.clone() else {
        return Ok(outcome);
    };
    let domain = ctx.pipeline.filter().domain().to_string();

    let urls = archive.fetch_urls(&domain).await;
    debug!("Archive returned {} URL(s) for {}", urls.len(), domain);

    for archived in &urls {
        if ctx.report(Category::Archive, archived.as_str())? {
            outcome.emitted += 1;
        }
        let Ok(parsed) = Url::parse(archived) else {
            continue;
        };
        if let Some(host) = host_with_port(&parsed)
            && host.contains(&domain)
            && ctx.report(Category::Subdomain, host)?
        {
            outcome.emitted += 1;
        }
    }

    ctx.reseed(urls).await;
    Ok(outcome)
}

/// Drives the crawl engine from the domain root. Elements are handled by
/// [`LiveCrawlObserver`], which also sees pages reached through re-seeding.
pub async fn run_live_crawl(ctx: Arc<JobContext>) -> Result<AggregatorOutcome> {
    let outcome = AggregatorOutcome::new(Source::LiveCrawl);
    let root = ctx.pipeline.filter().root_url();

    match ctx.engine.visit(&root).await {
        Ok(pages) => {
            debug!("Live crawl of {} fetched {} page(s)", root, pages);
            Ok(outcome)
        }
        Err(e) => {
            debug!("Live crawl of {} failed: {}", root, e);
            Ok(outcome.failed(e))
        }
    }
}

/// Turns crawl engine elements into discoveries.
///
/// The engine gives observers no error channel, so a fatal sink failure is
/// forwarded to the job coordinator over `fatal`.
pub struct LiveCrawlObserver {
    pipeline: Arc<Pipeline>,
    script_client: Client,
    emitted: AtomicUsize,
    fatal: mpsc::UnboundedSender<JobError>,
}

impl LiveCrawlObserver {
    pub fn new(
        pipeline: Arc<Pipeline>,
        script_client: Client,
        fatal: mpsc::UnboundedSender<JobError>,
    ) -> Self {
        Self {
            pipeline,
            script_client,
            emitted: AtomicUsize::new(0),
            fatal,
        }
    }

    pub fn emitted(&self) -> usize {
        self.emitted.load(Ordering::Relaxed)
    }

    fn report(&self, category: Category, candidate: impl Into<String>) -> Result<Option<Finding>> {
        let finding = self.pipeline.report(Discovery::new(category, candidate))?;
        if finding.is_some() {
            self.emitted.fetch_add(1, Ordering::Relaxed);
        }
        Ok(finding)
    }

    async fn handle(&self, element: PageElement) -> Result<()> {
        match element {
            PageElement::Link { url, .. } => {
                self.report(Category::Url, url.as_str())?;
                if let Some(host) = host_with_port(&url) {
                    self.report(Category::Subdomain, host)?;
                }
            }
            PageElement::Script { url, .. } => {
                if self.report(Category::JsFile, url.as_str())?.is_some()
                    && self.pipeline.config().extracts_script_links()
                {
                    self.scan_script(&url).await?;
                }
            }
            PageElement::Form { url, .. } => {
                self.report(Category::Form, url.as_str())?;
            }
        }
        Ok(())
    }

    async fn scan_script(&self, url: &Url) -> Result<()> {
        let body = match fetch_script(&self.script_client, url.as_str()).await {
            Ok(body) => body,
            Err(e) => {
                debug!("Script {} not scanned: {}", url, e);
                return Ok(());
            }
        };
        for candidate in extract_links(&body) {
            self.report(Category::LinkFinder, resolve_candidate(url, candidate))?;
        }
        Ok(())
    }
}

/// Paths relative to the script (`config.json`, `../lib/util.js`,
/// `api/v2/users`) resolve against the script URL. Absolute, scheme-relative
/// and root-relative candidates are left for the scope filter.
fn resolve_candidate(script: &Url, candidate: &str) -> String {
    if candidate.starts_with('/') || candidate.contains("://") {
        return candidate.to_string();
    }
    script
        .join(candidate)
        .map(String::from)
        .unwrap_or_else(|_| candidate.to_string())
}

impl ElementObserver for LiveCrawlObserver {
    fn observe<'a>(&'a self, element: PageElement) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if let Err(e) = self.handle(element).await {
                // receiver gone means the job is already shutting down
                let _ = self.fatal.send(e);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script() -> Url {
        Url::parse("http://example.com/static/js/app.js").unwrap()
    }

    #[test]
    fn test_relative_candidates_resolve_against_script() {
        assert_eq!(
            resolve_candidate(&script(), "config.json"),
            "http://example.com/static/js/config.json"
        );
        assert_eq!(
            resolve_candidate(&script(), "../lib/util.js"),
            "http://example.com/static/lib/util.js"
        );
        assert_eq!(
            resolve_candidate(&script(), "./x/y.js"),
            "http://example.com/static/js/x/y.js"
        );
        assert_eq!(
            resolve_candidate(&script(), "user/login.action?next=1"),
            "http://example.com/static/js/user/login.action?next=1"
        );
    }

    #[test]
    fn test_absolute_and_rooted_candidates_are_untouched() {
        assert_eq!(resolve_candidate(&script(), "/api/v1/users"), "/api/v1/users");
        assert_eq!(
            resolve_candidate(&script(), "https://cdn.example.com/lib.js"),
            "https://cdn.example.com/lib.js"
        );
        assert_eq!(
            resolve_candidate(&script(), "//cdn.example.com/lib.js"),
            "//cdn.example.com/lib.js"
        );
    }
}
