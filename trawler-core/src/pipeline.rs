use crate::config::JobConfig;
use crate::error::Result;
use crate::model::{Discovery, Finding};
use crate::output::OutputSink;
use crate::registry::Registries;
use std::sync::Arc;
use tracing::debug;
use trawler_scanner::ScopeFilter;

/// The per-job path every discovery takes: category check, scope filter,
/// dedup claim, sink. Shared by reference among the job's aggregators.
pub struct Pipeline {
    config: Arc<JobConfig>,
    filter: ScopeFilter,
    registries: Registries,
    sink: Arc<dyn OutputSink>,
}

impl Pipeline {
    pub fn new(domain: &str, config: Arc<JobConfig>, sink: Arc<dyn OutputSink>) -> Self {
        let filter = ScopeFilter::new(domain, config.scope, config.scheme);
        Self {
            config,
            filter,
            registries: Registries::new(),
            sink,
        }
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn filter(&self) -> &ScopeFilter {
        &self.filter
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    /// `Ok(None)` when the discovery was dropped at any step. Only a sink
    /// failure is an error.
    pub fn report(&self, discovery: Discovery) -> Result<Option<Finding>> {
        let Discovery {
            category,
            candidate,
        } = discovery;

        if !self.config.categories.contains(category) {
            return Ok(None);
        }
        let Some(url) = self.filter.accepts(&candidate) else {
            debug!("Out of scope [{}] {}", category, candidate);
            return Ok(None);
        };
        if !self.registries.try_claim(category, &url) {
            return Ok(None);
        }

        let finding = Finding {
            category,
            url,
            domain: self.filter.domain().to_string(),
        };
        self.sink.emit(&finding)?;
        Ok(Some(finding))
    }
}
