mod logging;
mod run;

pub use logging::init_run_logging;
pub use run::{RunConfig, RunContext, RunPaths, SeedReport, start_run, write_accounts, write_report};

use thiserror::Error;

/// Errors raised while writing run artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("logging error: {0}")]
    Logging(String),
}

pub type ArtifactResult<T> = std::result::Result<T, ArtifactError>;
