pub mod archive;
pub mod client;
pub mod crawler;
pub mod error;
pub mod linkfinder;
pub mod robots;
pub mod scope;
pub mod sitemap;

pub use archive::{ArchiveSource, WaybackArchive};
pub use client::{HttpOptions, build_client};
pub use crawler::{CrawlEngine, ElementObserver, FollowCallback, PageElement};
pub use error::ScanError;
pub use linkfinder::{extract_links, fetch_script};
pub use robots::{fetch_robots, parse_robots};
pub use scope::{Scheme, ScopeFilter, ScopePolicy, host_with_port};
pub use sitemap::{SitemapDocument, fetch_sitemap, parse_sitemap};
