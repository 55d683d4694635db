// Job coordinator: one target domain, four concurrent aggregators

use crate::config::JobConfig;
use crate::error::{JobError, Result};
use crate::model::{Category, Source};
use crate::output::OutputSink;
use crate::pipeline::Pipeline;
use crate::sources::{
    AggregatorOutcome, JobContext, LiveCrawlObserver, run_archive, run_live_crawl, run_robots,
    run_sitemap,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{info, warn};
use trawler_scanner::{ArchiveSource, CrawlEngine, WaybackArchive, build_client};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobState {
    Created,
    Running,
    Draining,
    Done,
}

/// Summary of a finished job.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub domain: String,
    pub state: JobState,
    pub counts: BTreeMap<Category, usize>,
    pub outcomes: Vec<AggregatorOutcome>,
    pub pages_crawled: usize,
}

impl JobReport {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn outcome(&self, source: Source) -> Option<&AggregatorOutcome> {
        self.outcomes.iter().find(|o| o.source == source)
    }
}

pub struct Job {
    domain: String,
    config: Arc<JobConfig>,
    sink: Arc<dyn OutputSink>,
    archive: Option<Arc<dyn ArchiveSource>>,
    state: JobState,
}

impl Job {
    /// An empty domain is a configuration error, not a job.
    pub fn new(domain: &str, config: Arc<JobConfig>, sink: Arc<dyn OutputSink>) -> Result<Self> {
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(JobError::MissingDomain);
        }
        Ok(Self {
            domain: domain.to_ascii_lowercase(),
            config,
            sink,
            archive: None,
            state: JobState::Created,
        })
    }

    /// Use this archive instead of the Wayback Machine. Only consulted when
    /// the configuration enables archive lookups.
    pub fn with_archive(mut self, archive: Arc<dyn ArchiveSource>) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    fn transition(&mut self, state: JobState) {
        info!("[{}] {:?} -> {:?}", self.domain, self.state, state);
        self.state = state;
    }

    fn build_context(&self, fatal: mpsc::UnboundedSender<JobError>) -> Result<JobContext> {
        let pipeline = Arc::new(Pipeline::new(&self.domain, self.config.clone(), self.sink.clone()));
        let http = self.config.http_options();
        let client = build_client(&http)?;
        let script_client = build_client(&http.insecure())?;

        let observer = Arc::new(LiveCrawlObserver::new(pipeline.clone(), script_client, fatal));
        let filter = pipeline.filter().clone();
        let engine = CrawlEngine::new(client.clone())
            .with_max_depth(self.config.depth)
            .with_workers(self.config.workers)
            .with_follow_callback(Arc::new(move |url: &Url| filter.in_scope(url)))
            .with_observer(observer.clone());

        let archive = if self.config.use_archive {
            match &self.archive {
                Some(archive) => Some(archive.clone()),
                None => Some(Arc::new(WaybackArchive::new(self.config.timeout_secs)?)
                    as Arc<dyn ArchiveSource>),
            }
        } else {
            None
        };

        Ok(JobContext {
            pipeline,
            client,
            engine: Arc::new(engine),
            observer,
            archive,
        })
    }

    /// Run every aggregator to completion.
    ///
    /// A failing source only ends that source. A fatal error (output
    /// destination unusable) aborts the remaining aggregators and is
    /// returned.
    pub async fn run(mut self) -> Result<JobReport> {
        let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel();
        let ctx = Arc::new(self.build_context(fatal_tx)?);

        self.transition(JobState::Running);
        let mut aggregators = JoinSet::new();
        let mut pending = vec![Source::Robots, Source::Sitemap, Source::LiveCrawl];
        if ctx.archive.is_some() {
            pending.push(Source::Archive);
        }
        for source in &pending {
            let ctx = ctx.clone();
            let source = *source;
            aggregators.spawn(async move {
                let outcome = match source {
                    Source::Robots => run_robots(ctx).await,
                    Source::Sitemap => run_sitemap(ctx).await,
                    Source::Archive => run_archive(ctx).await,
                    Source::LiveCrawl => run_live_crawl(ctx).await,
                };
                (source, outcome)
            });
        }

        self.transition(JobState::Draining);
        let mut outcomes = Vec::with_capacity(pending.len());
        loop {
            tokio::select! {
                Some(e) = fatal_rx.recv() => return Err(e),
                joined = aggregators.join_next() => match joined {
                    None => break,
                    Some(Ok((source, result))) => {
                        pending.retain(|s| *s != source);
                        outcomes.push(result?);
                    }
                    Some(Err(e)) => warn!("[{}] aggregator task failed: {}", self.domain, e),
                },
            }
        }
        if let Ok(e) = fatal_rx.try_recv() {
            return Err(e);
        }
        // tasks that panicked never reported back
        outcomes.extend(pending.into_iter().map(|source| AggregatorOutcome {
            source,
            emitted: 0,
            error: Some("aggregator task failed".to_string()),
        }));

        if let Some(live) = outcomes.iter_mut().find(|o| o.source == Source::LiveCrawl) {
            live.emitted = ctx.observer.emitted();
        }

        self.transition(JobState::Done);
        Ok(JobReport {
            domain: self.domain.clone(),
            state: self.state,
            counts: ctx.pipeline.registries().counts(),
            outcomes,
            pages_crawled: ctx.engine.pages_fetched(),
        })
    }
}
