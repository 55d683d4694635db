// Multi-domain driver: one job task per input domain

use crate::config::JobConfig;
use crate::error::Result;
use crate::job::{Job, JobReport};
use crate::output::OutputSink;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::info;
use trawler_scanner::ArchiveSource;

pub struct Driver {
    config: Arc<JobConfig>,
    sink: Arc<dyn OutputSink>,
    archive: Option<Arc<dyn ArchiveSource>>,
}

impl Driver {
    pub fn new(config: Arc<JobConfig>, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            config,
            sink,
            archive: None,
        }
    }

    pub fn with_archive(mut self, archive: Arc<dyn ArchiveSource>) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Start a job per domain and wait for all of them. Reports come back
    /// in completion order.
    ///
    /// The first fatal error (an empty domain, an unusable output
    /// destination) is returned straight away; dropping the join set aborts
    /// every job still running.
    pub async fn run<I>(&self, domains: I) -> Result<Vec<JobReport>>
    where
        I: IntoIterator<Item = String>,
    {
        let mut jobs = JoinSet::new();
        for domain in domains {
            let mut job = Job::new(&domain, self.config.clone(), self.sink.clone())?;
            if let Some(archive) = &self.archive {
                job = job.with_archive(archive.clone());
            }
            info!("Starting job for {}", job.domain());
            jobs.spawn(job.run());
        }

        let mut reports = Vec::with_capacity(jobs.len());
        while let Some(joined) = jobs.join_next().await {
            reports.push(joined??);
        }
        Ok(reports)
    }
}
