use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use trawler_core::{
    Category, CategorySet, ConsoleSink, Driver, JobConfig, JobError, JobReport, OutputOptions,
};
use trawler_scanner::{Scheme, ScopePolicy, host_with_port};
use url::Url;

// Helpers for domain input

/// Domains from `--domain`, else from `--list`, else from stdin.
pub fn load_domains_from_source(
    domain: Option<&String>,
    list: Option<&PathBuf>,
) -> Result<Vec<String>> {
    if let Some(domain) = domain {
        Ok(vec![parse_domain_line(domain)])
    } else if let Some(path) = list {
        load_domains_from_file(path)
    } else {
        load_domains_from_reader(io::stdin().lock())
    }
}

/// Load one domain per line from a file
pub fn load_domains_from_file(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to read domain list {}", path.display()))?;
    load_domains_from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to read domain list {}", path.display()))
}

/// Every line is a domain, blank ones included: an empty domain is
/// rejected later when its job is created.
pub fn load_domains_from_reader<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let domains = reader
        .lines()
        .map(|line| line.map(|l| parse_domain_line(&l)))
        .collect::<io::Result<Vec<String>>>()?;

    if domains.is_empty() {
        return Err(anyhow!(JobError::MissingDomain));
    }
    Ok(domains)
}

/// Lower-case and trim a domain. Full URLs are reduced to `host[:port]`
/// so the scheme flag decides how the domain is reached.
pub fn parse_domain_line(line: &str) -> String {
    let line = line.trim().to_ascii_lowercase();
    if line.contains("://")
        && let Ok(url) = Url::parse(&line)
        && let Some(host) = host_with_port(&url)
    {
        return host;
    }
    line
}

/// Categories named by individual flags. Empty when none was given.
pub fn selected_categories(args: &ArgMatches) -> Vec<Category> {
    [
        ("urls", Category::Url),
        ("subs", Category::Subdomain),
        ("js", Category::JsFile),
        ("forms", Category::Form),
        ("robots", Category::Robots),
        ("sitemap", Category::Sitemap),
        ("wayback", Category::Archive),
    ]
    .into_iter()
    .filter(|(flag, _)| args.get_flag(flag))
    .map(|(_, category)| category)
    .collect()
}

/// Turn parsed flags into the configuration every job shares.
pub fn build_config(args: &ArgMatches) -> Result<JobConfig> {
    let scope = args
        .get_one::<String>("scope")
        .map(|s| s.parse::<ScopePolicy>())
        .transpose()?
        .unwrap_or_default();
    let scheme = args
        .get_one::<String>("scheme")
        .map(|s| s.parse::<Scheme>())
        .transpose()?
        .unwrap_or_default();

    let outdir = args
        .get_one::<String>("outdir")
        .map(|dir| PathBuf::from(shellexpand::tilde(dir).as_ref()));

    let defaults = JobConfig::default();
    Ok(JobConfig {
        depth: args.get_one::<usize>("depth").copied().unwrap_or(defaults.depth),
        scope,
        scheme,
        cookie: args.get_one::<String>("cookie").cloned(),
        auth: args.get_one::<String>("auth").cloned(),
        categories: CategorySet::from_selection(&selected_categories(args)),
        use_archive: args.get_flag("usewayback"),
        run_linkfinder: args.get_flag("linkfinder"),
        timeout_secs: args
            .get_one::<u64>("timeout")
            .copied()
            .unwrap_or(defaults.timeout_secs),
        workers: args
            .get_one::<usize>("workers")
            .copied()
            .unwrap_or(defaults.workers)
            .max(1),
        output: OutputOptions {
            plain: args.get_flag("plain"),
            json: args.get_flag("json"),
            outdir,
        },
    })
}

/// Banner, spinner and summary are only shown to a human reader.
pub fn is_interactive(config: &JobConfig) -> bool {
    !config.output.plain && !config.output.json
}

fn create_spinner(domains: usize) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Trawling {} domain(s)", domains));
    spinner
}

fn print_summary(reports: &[JobReport]) {
    for report in reports {
        eprintln!(
            "{} {} {} discoveries, {} pages crawled",
            "✓".green().bold(),
            report.domain.bright_white(),
            report.total(),
            report.pages_crawled
        );
        for (category, count) in &report.counts {
            eprintln!("    {} {}: {}", "→".blue(), category, count);
        }
        for outcome in &report.outcomes {
            if let Some(error) = &outcome.error {
                eprintln!("    {} {}: {}", "ℹ".yellow(), outcome.source.as_str(), error);
            }
        }
    }
}

pub async fn handle_run(args: &ArgMatches) -> Result<()> {
    let config = build_config(args)?;
    let domains = load_domains_from_source(
        args.get_one::<String>("domain"),
        args.get_one::<PathBuf>("list"),
    )?;
    let interactive = is_interactive(&config);

    let mut sink = ConsoleSink::new(&config)?;
    let spinner = interactive.then(|| create_spinner(domains.len()));
    if let Some(pb) = &spinner {
        sink = sink.with_progress(pb.clone());
    }
    let sink = Arc::new(sink);

    let driver = Driver::new(Arc::new(config), sink.clone());
    let reports = match driver.run(domains).await {
        Ok(reports) => reports,
        Err(e) => {
            if let Some(pb) = &spinner {
                pb.abandon();
            }
            return Err(e.into());
        }
    };

    if let Some(pb) = spinner {
        pb.finish_with_message(format!(
            "Done: {} discoveries across {} domain(s)",
            sink.emitted(),
            reports.len()
        ));
        print_summary(&reports);
    }
    Ok(())
}
