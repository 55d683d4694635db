use crate::error::Result;
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

pub type FollowCallback = Arc<dyn Fn(&Url) -> bool + Send + Sync>;

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));
static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script[src]").expect("valid selector"));
static FORM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("form[action]").expect("valid selector"));
static BASE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("base[href]").expect("valid selector"));

/// An element of interest found on a fetched page. URLs are absolute and
/// carry no fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageElement {
    Link { page: Url, url: Url },
    Script { page: Url, url: Url },
    Form { page: Url, url: Url },
}

impl PageElement {
    pub fn url(&self) -> &Url {
        match self {
            PageElement::Link { url, .. }
            | PageElement::Script { url, .. }
            | PageElement::Form { url, .. } => url,
        }
    }

    pub fn page(&self) -> &Url {
        match self {
            PageElement::Link { page, .. }
            | PageElement::Script { page, .. }
            | PageElement::Form { page, .. } => page,
        }
    }
}

/// Receives every element the engine finds, from whichever seed led to it.
pub trait ElementObserver: Send + Sync {
    fn observe<'a>(&'a self, element: PageElement) -> BoxFuture<'a, ()>;
}

/// Depth-limited crawler with a shared frontier.
///
/// `visit` may be called concurrently from any number of tasks; the visited
/// set guarantees each URL is fetched at most once for the engine's lifetime.
pub struct CrawlEngine {
    client: Client,
    visited: Mutex<HashSet<String>>,
    max_depth: usize,
    workers: usize,
    follow: Option<FollowCallback>,
    observer: Option<Arc<dyn ElementObserver>>,
    pages_fetched: AtomicUsize,
}

impl CrawlEngine {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            visited: Mutex::new(HashSet::new()),
            max_depth: 1,
            workers: 10,
            follow: None,
            observer: None,
            pages_fetched: AtomicUsize::new(0),
        }
    }

    /// Depth 1 fetches only the seed page. 0 removes the limit.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Decides which discovered links are enqueued. Without one, every
    /// http(s) link is followed.
    pub fn with_follow_callback(mut self, callback: FollowCallback) -> Self {
        self.follow = Some(callback);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ElementObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched.load(Ordering::Relaxed)
    }

    pub async fn visited_count(&self) -> usize {
        self.visited.lock().await.len()
    }

    /// Crawl from `seed`, breadth first. Returns the number of pages
    /// fetched by this call; 0 when the seed was already visited.
    pub async fn visit(&self, seed: &str) -> Result<usize> {
        let mut seed = Url::parse(seed)?;
        seed.set_fragment(None);

        if !self.claim(&seed).await {
            debug!("Seed {} already visited", seed);
            return Ok(0);
        }
        info!("Visiting {} (max depth {})", seed, self.max_depth);

        let mut level = vec![seed];
        let mut depth = 1;
        let mut fetched = 0;

        while !level.is_empty() {
            let pages: Vec<(Url, Result<Vec<PageElement>>)> = stream::iter(level)
                .map(|url| async move {
                    let elements = self.fetch_elements(&url).await;
                    (url, elements)
                })
                .buffer_unordered(self.workers)
                .collect()
                .await;

            let mut next = Vec::new();
            for (url, result) in pages {
                let elements = match result {
                    Ok(elements) => elements,
                    Err(e) => {
                        debug!("Fetch failed for {}: {}", url, e);
                        continue;
                    }
                };
                fetched += 1;

                for element in elements {
                    if let PageElement::Link { url: link, .. } = &element
                        && self.within_depth(depth + 1)
                        && self.should_follow(link)
                        && self.claim(link).await
                    {
                        next.push(link.clone());
                    }
                    if let Some(observer) = &self.observer {
                        observer.observe(element).await;
                    }
                }
            }

            level = next;
            depth += 1;
        }

        Ok(fetched)
    }

    fn within_depth(&self, depth: usize) -> bool {
        self.max_depth == 0 || depth <= self.max_depth
    }

    fn should_follow(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }
        match &self.follow {
            Some(callback) => callback(url),
            None => true,
        }
    }

    /// Check and mark as visited in one step.
    async fn claim(&self, url: &Url) -> bool {
        self.visited.lock().await.insert(url.to_string())
    }

    async fn fetch_elements(&self, url: &Url) -> Result<Vec<PageElement>> {
        debug!("Fetching {}", url);
        let response = self.client.get(url.as_str()).send().await?;
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);

        let page = response.url().clone();
        let is_html = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false);
        if !is_html {
            return Ok(Vec::new());
        }

        let body = response.text().await?;
        Ok(extract_elements(&body, &page))
    }
}

/// Links, scripts and form actions of an HTML document, resolved against
/// the page URL (or its `<base href>`), in document order per kind.
pub fn extract_elements(html: &str, page: &Url) -> Vec<PageElement> {
    let document = Html::parse_document(html);

    let base = document
        .select(&BASE_SELECTOR)
        .next()
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| page.join(href).ok())
        .unwrap_or_else(|| page.clone());

    let mut elements = Vec::new();
    let mut collect = |selector: &Selector, attr: &str, make: fn(Url, Url) -> PageElement| {
        for element in document.select(selector) {
            if let Some(value) = element.value().attr(attr)
                && let Some(url) = resolve_url(&base, value)
            {
                elements.push(make(page.clone(), url));
            }
        }
    };

    collect(&LINK_SELECTOR, "href", |page, url| PageElement::Link { page, url });
    collect(&SCRIPT_SELECTOR, "src", |page, url| PageElement::Script { page, url });
    collect(&FORM_SELECTOR, "action", |page, url| PageElement::Form { page, url });

    elements
}

fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    // Skip empty, javascript:, mailto:, tel:, etc.
    if href.is_empty()
        || href.starts_with('#')
        || ["javascript:", "mailto:", "tel:", "data:"]
            .iter()
            .any(|prefix| {
                href.get(..prefix.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
            })
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    url.set_fragment(None);
    Some(url)
}
