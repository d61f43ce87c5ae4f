use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use lmseed_core::GenerationCounts;
use lmseed_generate::GenerationReport;
use lmseed_load::{ClearReport, LoadReport, SetupReport};

use crate::accounts::SampleAccount;
use crate::config::RedactedConnection;

use super::{ArtifactError, ArtifactResult};

/// Identity of a run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub run_dir: PathBuf,
}

/// JSON config written to each run directory.
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    pub run_id: String,
    pub started_at: String,
    pub command: String,
    pub engine: String,
    pub seed: Option<u64>,
    pub batch_size: Option<usize>,
    pub counts: Option<GenerationCounts>,
    pub scripts: Vec<PathBuf>,
    pub clear: bool,
    pub skip_schema: bool,
    pub dry_run: bool,
    pub connection: Option<RedactedConnection>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub logs_path: PathBuf,
    pub report_path: PathBuf,
    pub accounts_path: PathBuf,
}

/// Everything a run did, persisted as `seed_report.json`.
#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub run_id: String,
    pub clear: Option<ClearReport>,
    pub setup: Option<SetupReport>,
    pub generation: Option<GenerationReport>,
    pub load: Option<LoadReport>,
    pub elapsed_ms: u64,
}

impl SeedReport {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            clear: None,
            setup: None,
            generation: None,
            load: None,
            elapsed_ms: 0,
        }
    }
}

/// Creates `<run_dir>/<timestamp>__run_<id>/` with its config and an empty
/// log file.
pub fn start_run(ctx: &RunContext, config: &RunConfig) -> ArtifactResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = ctx.run_dir.join(format!("{timestamp}__run_{}", ctx.run_id));

    create_dir_all(&root)?;

    let logs_path = root.join("logs.ndjson");
    write_json(&root.join("config.json"), config)?;
    OpenOptions::new().create(true).append(true).open(&logs_path)?;

    Ok(RunPaths {
        report_path: root.join("seed_report.json"),
        accounts_path: root.join("sample_accounts.json"),
        logs_path,
        root,
    })
}

pub fn write_report(paths: &RunPaths, report: &SeedReport) -> ArtifactResult<()> {
    write_json(&paths.report_path, report)
}

pub fn write_accounts(paths: &RunPaths, accounts: &[SampleAccount]) -> ArtifactResult<()> {
    write_json(&paths.accounts_path, &accounts)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> ArtifactResult<()> {
    let file = OpenOptions::new().create(true).truncate(true).write(true).open(path)?;
    serde_json::to_writer_pretty(file, value).map_err(ArtifactError::from)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn config(run_id: &str) -> RunConfig {
        RunConfig {
            run_id: run_id.to_string(),
            started_at: "2025-06-01T09:30:00+00:00".to_string(),
            command: "seed".to_string(),
            engine: "memory".to_string(),
            seed: Some(7),
            batch_size: Some(50),
            counts: Some(GenerationCounts::default()),
            scripts: Vec::new(),
            clear: false,
            skip_schema: true,
            dry_run: true,
            connection: None,
        }
    }

    #[test]
    fn run_directory_holds_config_and_log() {
        let run_dir = std::env::temp_dir().join(format!("lmseed-runs-{}", uuid::Uuid::new_v4()));
        let ctx = RunContext {
            run_id: "abc".to_string(),
            started_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap(),
            run_dir: run_dir.clone(),
        };

        let paths = start_run(&ctx, &config("abc")).expect("run started");

        assert_eq!(paths.root, run_dir.join("2025-06-01T09-30-00Z__run_abc"));
        assert!(paths.logs_path.is_file());
        let written = std::fs::read_to_string(paths.root.join("config.json")).expect("config written");
        let value: serde_json::Value = serde_json::from_str(&written).expect("json");
        assert_eq!(value["seed"], 7);
        assert_eq!(value["counts"]["learners"], 50);

        write_report(&paths, &SeedReport::new("abc")).expect("report written");
        assert!(paths.report_path.is_file());
    }
}
