// Output sink: console reporting and raw request dumps

use crate::config::JobConfig;
use crate::error::{JobError, Result};
use crate::model::{Category, Finding};
use colored::{ColoredString, Colorize};
use indicatif::ProgressBar;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use trawler_scanner::scope::host_with_port;
use url::Url;
use uuid::Uuid;

/// Where accepted findings go. Implementations must tolerate concurrent
/// calls from every aggregator of every job.
///
/// `emit` is synchronous and may block on stdout or on file writes; it is
/// called straight from the aggregator tasks.
pub trait OutputSink: Send + Sync {
    fn emit(&self, finding: &Finding) -> Result<()>;
}

fn tag(category: Category) -> ColoredString {
    let label = format!("[{}]", category.as_str());
    match category {
        Category::Url => label.yellow(),
        Category::Subdomain => label.bright_blue(),
        Category::JsFile => label.green(),
        Category::Form => label.magenta(),
        Category::Robots => label.red(),
        Category::Sitemap => label.cyan(),
        Category::Archive => label.bright_yellow(),
        Category::LinkFinder => label.bright_green(),
    }
}

/// Prints findings to stdout and, when configured, saves a raw request per
/// finding.
pub struct ConsoleSink {
    plain: bool,
    json: bool,
    dumper: Option<RequestDumper>,
    progress: Option<ProgressBar>,
    emitted: AtomicUsize,
}

impl ConsoleSink {
    pub fn new(config: &JobConfig) -> Result<Self> {
        let dumper = match &config.output.outdir {
            Some(dir) => Some(RequestDumper::new(
                dir,
                config.cookie.clone(),
                config.auth.clone(),
            )?),
            None => None,
        };
        Ok(Self {
            plain: config.output.plain,
            json: config.output.json,
            dumper,
            progress: None,
            emitted: AtomicUsize::new(0),
        })
    }

    /// Results are printed through the spinner so the two never interleave.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn emitted(&self) -> usize {
        self.emitted.load(Ordering::Relaxed)
    }

    pub fn render(&self, finding: &Finding) -> String {
        if self.json {
            // a struct of strings and a unit enum always serializes
            serde_json::to_string(finding).unwrap_or_default()
        } else if self.plain {
            finding.url.clone()
        } else {
            format!("{} {}", tag(finding.category), finding.url)
        }
    }

    fn print_line(line: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", line).map_err(|source| JobError::Output {
            path: "stdout".to_string(),
            source,
        })
    }
}

impl OutputSink for ConsoleSink {
    fn emit(&self, finding: &Finding) -> Result<()> {
        let line = self.render(finding);
        match &self.progress {
            Some(pb) => pb.suspend(|| Self::print_line(&line))?,
            None => Self::print_line(&line)?,
        }

        let count = self.emitted.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(pb) = &self.progress {
            pb.set_message(format!("{} discoveries", count));
        }

        if let Some(dumper) = &self.dumper {
            dumper.save(&finding.url)?;
        }
        Ok(())
    }
}

/// Writes one `trawler_<uuid>.req` file per absolute http(s) finding.
#[derive(Debug, Clone)]
pub struct RequestDumper {
    dir: PathBuf,
    cookie: Option<String>,
    auth: Option<String>,
}

impl RequestDumper {
    pub fn new(dir: &Path, cookie: Option<String>, auth: Option<String>) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|source| JobError::Output {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            cookie,
            auth,
        })
    }

    /// Request line and headers for a GET of `url`, no body. `None` for
    /// anything that is not an absolute http(s) URL.
    pub fn raw_request(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return None;
        }
        let host = host_with_port(&parsed)?;

        let mut target = parsed.path().to_string();
        if let Some(query) = parsed.query() {
            target.push('?');
            target.push_str(query);
        }

        let mut raw = format!("GET {} HTTP/1.1\r\nHost: {}\r\n", target, host);
        if let Some(cookie) = self.cookie.as_deref().filter(|c| !c.is_empty()) {
            raw.push_str(&format!("Cookie: {}\r\n", cookie));
        }
        if let Some(auth) = self.auth.as_deref().filter(|a| !a.is_empty()) {
            raw.push_str(&format!("Authorization: {}\r\n", auth));
        }
        raw.push_str("\r\n");
        Some(raw)
    }

    /// Returns the written path, or `None` when the URL is not dumpable.
    pub fn save(&self, url: &str) -> Result<Option<PathBuf>> {
        let Some(raw) = self.raw_request(url) else {
            return Ok(None);
        };
        let path = self.dir.join(format!("trawler_{}.req", Uuid::new_v4()));
        fs::write(&path, raw).map_err(|source| JobError::Output {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Some(path))
    }
}
