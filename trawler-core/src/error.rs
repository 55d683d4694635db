use thiserror::Error;
use trawler_scanner::ScanError;

/// Errors that end the whole run. Per-source failures never become one of
/// these; they are logged and recorded on the aggregator outcome instead.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("You must set a domain, e.g. --domain example.com")]
    MissingDomain,

    #[error("Failed to write output to {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ScanError),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, JobError>;
