// Tests for the per-job discovery pipeline

use std::sync::{Arc, Mutex};
use trawler_core::{
    Category, CategorySet, Discovery, Finding, JobConfig, JobError, OutputSink, Pipeline,
};
use trawler_scanner::ScopePolicy;

#[derive(Default)]
struct MemorySink {
    findings: Mutex<Vec<Finding>>,
}

impl MemorySink {
    fn urls(&self) -> Vec<String> {
        self.findings
            .lock()
            .unwrap()
            .iter()
            .map(|f| f.url.clone())
            .collect()
    }
}

impl OutputSink for MemorySink {
    fn emit(&self, finding: &Finding) -> Result<(), JobError> {
        self.findings.lock().unwrap().push(finding.clone());
        Ok(())
    }
}

struct BrokenSink;

impl OutputSink for BrokenSink {
    fn emit(&self, _finding: &Finding) -> Result<(), JobError> {
        Err(JobError::Output {
            path: "stdout".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"),
        })
    }
}

fn pipeline(config: JobConfig) -> (Pipeline, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::default());
    let pipeline = Pipeline::new("example.com", Arc::new(config), sink.clone());
    (pipeline, sink)
}

#[test]
fn test_accepted_discovery_reaches_sink() {
    let (pipeline, sink) = pipeline(JobConfig::default());
    let finding = pipeline
        .report(Discovery::new(Category::Url, "http://example.com/login"))
        .unwrap()
        .expect("in scope");

    assert_eq!(finding.category, Category::Url);
    assert_eq!(finding.url, "http://example.com/login");
    assert_eq!(finding.domain, "example.com");
    assert_eq!(sink.urls(), vec!["http://example.com/login"]);
}

#[test]
fn test_duplicates_are_emitted_once() {
    let (pipeline, sink) = pipeline(JobConfig::default());
    for _ in 0..3 {
        pipeline
            .report(Discovery::new(Category::Url, "http://example.com/a"))
            .unwrap();
    }
    // same URL, different category
    pipeline
        .report(Discovery::new(Category::Sitemap, "http://example.com/a"))
        .unwrap();

    assert_eq!(sink.urls().len(), 2);
    assert_eq!(pipeline.registries().get(Category::Url).len(), 1);
    assert_eq!(pipeline.registries().get(Category::Sitemap).len(), 1);
}

#[test]
fn test_out_of_scope_is_dropped_without_claim() {
    let config = JobConfig {
        scope: ScopePolicy::Strict,
        ..JobConfig::default()
    };
    let (pipeline, sink) = pipeline(config);

    let dropped = pipeline
        .report(Discovery::new(Category::Url, "http://api.example.com/x"))
        .unwrap();
    assert!(dropped.is_none());
    assert!(sink.urls().is_empty());
    assert!(pipeline.registries().get(Category::Url).is_empty());
}

#[test]
fn test_unselected_category_is_dropped() {
    let config = JobConfig {
        categories: CategorySet::only([Category::Robots]),
        ..JobConfig::default()
    };
    let (pipeline, sink) = pipeline(config);

    assert!(
        pipeline
            .report(Discovery::new(Category::Url, "http://example.com/a"))
            .unwrap()
            .is_none()
    );
    assert!(
        pipeline
            .report(Discovery::new(Category::Robots, "http://example.com/a"))
            .unwrap()
            .is_some()
    );
    assert_eq!(sink.urls(), vec!["http://example.com/a"]);
}

#[test]
fn test_bare_host_keeps_its_shape() {
    let (pipeline, sink) = pipeline(JobConfig::default());
    pipeline
        .report(Discovery::new(Category::Subdomain, "api.example.com"))
        .unwrap();
    pipeline
        .report(Discovery::new(Category::Subdomain, "api.example.org"))
        .unwrap();
    assert_eq!(sink.urls(), vec!["api.example.com"]);
}

#[test]
fn test_relative_path_resolves_against_root() {
    let (pipeline, sink) = pipeline(JobConfig::default());
    pipeline
        .report(Discovery::new(Category::LinkFinder, "/api/v1/users"))
        .unwrap();
    assert_eq!(sink.urls(), vec!["http://example.com/api/v1/users"]);
}

#[test]
fn test_sink_failure_is_an_error() {
    let pipeline = Pipeline::new(
        "example.com",
        Arc::new(JobConfig::default()),
        Arc::new(BrokenSink),
    );
    let result = pipeline.report(Discovery::new(Category::Url, "http://example.com/"));
    assert!(matches!(result, Err(JobError::Output { .. })));
}
