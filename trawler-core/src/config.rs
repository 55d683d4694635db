use crate::model::Category;
use std::collections::HashSet;
use std::path::PathBuf;
use trawler_scanner::{HttpOptions, Scheme, ScopePolicy};

/// Categories the user asked to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySet(HashSet<Category>);

impl CategorySet {
    pub fn all() -> Self {
        Self(Category::ALL.into_iter().collect())
    }

    pub fn only(categories: impl IntoIterator<Item = Category>) -> Self {
        Self(categories.into_iter().collect())
    }

    /// No explicit selection means everything. Extracted script links ride
    /// along with JavaScript files.
    pub fn from_selection(selected: &[Category]) -> Self {
        if selected.is_empty() {
            return Self::all();
        }
        let mut set: HashSet<Category> = selected.iter().copied().collect();
        if set.contains(&Category::JsFile) {
            set.insert(Category::LinkFinder);
        }
        Self(set)
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains(&category)
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::all()
    }
}

/// How accepted discoveries are presented.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    /// No colours, no tags: one URL per line
    pub plain: bool,
    /// One JSON object per line, overrides `plain`
    pub json: bool,
    /// Save a raw HTTP request per discovery into this directory
    pub outdir: Option<PathBuf>,
}

/// Immutable settings shared by every job of a run.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub depth: usize,
    pub scope: ScopePolicy,
    pub scheme: Scheme,
    pub cookie: Option<String>,
    pub auth: Option<String>,
    pub categories: CategorySet,
    pub use_archive: bool,
    pub run_linkfinder: bool,
    pub timeout_secs: u64,
    pub workers: usize,
    pub output: OutputOptions,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            depth: 1,
            scope: ScopePolicy::Subs,
            scheme: Scheme::Http,
            cookie: None,
            auth: None,
            categories: CategorySet::all(),
            use_archive: false,
            run_linkfinder: false,
            timeout_secs: 10,
            workers: 10,
            output: OutputOptions::default(),
        }
    }
}

impl JobConfig {
    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            timeout_secs: self.timeout_secs,
            cookie: self.cookie.clone(),
            authorization: self.auth.clone(),
            accept_invalid_certs: false,
        }
    }

    /// Slower sources feed the crawl frontier only when the crawl goes
    /// past the first page.
    pub fn reseeds(&self) -> bool {
        self.depth > 1
    }

    pub fn extracts_script_links(&self) -> bool {
        self.run_linkfinder && self.categories.contains(Category::LinkFinder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_selection_is_everything() {
        let set = CategorySet::from_selection(&[]);
        for category in Category::ALL {
            assert!(set.contains(category));
        }
    }

    #[test]
    fn test_selection_narrows_and_js_implies_linkfinder() {
        let set = CategorySet::from_selection(&[Category::JsFile, Category::Robots]);
        assert!(set.contains(Category::JsFile));
        assert!(set.contains(Category::LinkFinder));
        assert!(set.contains(Category::Robots));
        assert!(!set.contains(Category::Url));
        assert!(!set.contains(Category::Subdomain));
    }

    #[test]
    fn test_reseed_and_linkfinder_switches() {
        let mut config = JobConfig::default();
        assert!(!config.reseeds());
        assert!(!config.extracts_script_links());
        config.depth = 2;
        config.run_linkfinder = true;
        assert!(config.reseeds());
        assert!(config.extracts_script_links());
        config.categories = CategorySet::only([Category::Url]);
        assert!(!config.extracts_script_links());
    }
}
