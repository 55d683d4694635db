pub mod config;
pub mod driver;
pub mod error;
pub mod job;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod registry;
pub mod sources;

pub use config::{CategorySet, JobConfig, OutputOptions};
pub use driver::Driver;
pub use error::JobError;
pub use job::{Job, JobReport, JobState};
pub use model::{Category, Discovery, Finding, Source};
pub use output::{ConsoleSink, OutputSink, RequestDumper};
pub use pipeline::Pipeline;
pub use registry::{DedupRegistry, Registries};
pub use sources::AggregatorOutcome;

pub fn print_banner() {
    let banner = r#"
  ______                     __
 /_  __/________ __      __/ /__  _____
  / / / ___/ __ `/ | /| / / / _ \/ ___/
 / / / /  / /_/ /| |/ |/ / /  __/ /
/_/ /_/   \__,_/ |__/|__/_/\___/_/
"#;
    eprintln!("{}", banner);
    eprintln!("  v{}  robots + sitemap + wayback + crawl\n", env!("CARGO_PKG_VERSION"));
}
