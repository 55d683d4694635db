use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of thing a discovery is. Each category has its own dedup
/// registry and its own output tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Url,
    Subdomain,
    #[serde(rename = "javascript")]
    JsFile,
    Form,
    Robots,
    Sitemap,
    #[serde(rename = "wayback")]
    Archive,
    LinkFinder,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Url,
        Category::Subdomain,
        Category::JsFile,
        Category::Form,
        Category::Robots,
        Category::Sitemap,
        Category::Archive,
        Category::LinkFinder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Url => "url",
            Category::Subdomain => "subdomain",
            Category::JsFile => "javascript",
            Category::Form => "form",
            Category::Robots => "robots",
            Category::Sitemap => "sitemap",
            Category::Archive => "wayback",
            Category::LinkFinder => "linkfinder",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The evidence source an aggregator turns into discoveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Robots,
    Sitemap,
    Archive,
    LiveCrawl,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Robots => "robots",
            Source::Sitemap => "sitemap",
            Source::Archive => "archive",
            Source::LiveCrawl => "crawl",
        }
    }
}

/// A raw candidate produced by an aggregator, before scope and dedup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub category: Category,
    pub candidate: String,
}

impl Discovery {
    pub fn new(category: Category, candidate: impl Into<String>) -> Self {
        Self {
            category,
            candidate: candidate.into(),
        }
    }
}

/// A discovery that passed every check and was handed to the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub category: Category,
    pub url: String,
    pub domain: String,
}
