//! Setup-Script Executor.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use lmseed_core::Severity;

use crate::store::{StoreError, TargetStore};

/// Filename marker of scripts that must run outside a transaction.
pub const SEQUENTIAL_MARKER: &str = "concurrently";

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("setup script not found: {0}")]
    MissingScript(PathBuf),
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no setup statement succeeded")]
    NothingSucceeded,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SetupError {
    pub fn severity(&self) -> Severity {
        match self {
            SetupError::MissingScript(_) | SetupError::Read { .. } => Severity::Fatal,
            SetupError::NothingSucceeded => Severity::Phase,
            SetupError::Store(err) => err.severity(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptMode {
    /// The whole script runs in one transaction.
    Atomic,
    /// Each statement runs on its own with auto-commit.
    Sequential,
}

impl ScriptMode {
    pub fn for_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name.contains(SEQUENTIAL_MARKER) {
            ScriptMode::Sequential
        } else {
            ScriptMode::Atomic
        }
    }
}

/// Splits a script into statements.
///
/// Blank lines and `--` comment lines are dropped; a statement ends on a
/// line ending with `;`. Trailing text without a terminator is kept as a
/// last statement.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }
        block.push(line);
        if trimmed.ends_with(';') {
            statements.push(block.join("\n"));
            block.clear();
        }
    }
    if !block.is_empty() {
        statements.push(block.join("\n"));
    }
    statements
}

#[derive(Debug, Clone, Serialize)]
pub struct ScriptOutcome {
    pub path: PathBuf,
    pub mode: ScriptMode,
    pub statements: usize,
    pub succeeded: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScriptOutcome {
    pub fn is_success(&self) -> bool {
        self.succeeded > 0
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SetupReport {
    pub scripts: Vec<ScriptOutcome>,
}

impl SetupReport {
    pub fn succeeded(&self) -> usize {
        self.scripts.iter().map(|script| script.succeeded).sum()
    }
}

/// Runs one script in the mode its filename selects.
///
/// A failed atomic script or statement is reported in the outcome; only
/// fatal store errors are returned.
pub async fn execute_script_file<S>(store: &mut S, path: &Path, sql: &str) -> Result<ScriptOutcome, SetupError>
where
    S: TargetStore + ?Sized,
{
    let mode = ScriptMode::for_path(path);
    info!(path = %path.display(), ?mode, "executing setup script");
    let mut outcome = ScriptOutcome {
        path: path.to_path_buf(),
        mode,
        statements: 0,
        succeeded: 0,
        failed: 0,
        error: None,
    };

    match mode {
        ScriptMode::Atomic => {
            outcome.statements = 1;
            match store.execute_script(sql).await {
                Ok(()) => outcome.succeeded = 1,
                Err(err) if err.severity() == Severity::Fatal => return Err(err.into()),
                Err(err) => {
                    error!(path = %path.display(), error = %err, "script rolled back");
                    outcome.failed = 1;
                    outcome.error = Some(err.to_string());
                }
            }
        }
        ScriptMode::Sequential => {
            let statements = split_statements(sql);
            outcome.statements = statements.len();
            for (index, statement) in statements.iter().enumerate() {
                match store.execute_statement(statement).await {
                    Ok(()) => {
                        info!(statement = index + 1, total = statements.len(), "statement applied");
                        outcome.succeeded += 1;
                    }
                    Err(err) if err.severity() == Severity::Fatal => return Err(err.into()),
                    Err(err) => {
                        warn!(statement = index + 1, error = %err, "statement failed");
                        outcome.failed += 1;
                    }
                }
            }
        }
    }
    Ok(outcome)
}

/// Runs every setup script in order.
///
/// All files are checked before anything executes, so a missing script
/// aborts without touching the store.
pub async fn run_setup<S>(store: &mut S, scripts: &[PathBuf]) -> Result<SetupReport, SetupError>
where
    S: TargetStore + ?Sized,
{
    if let Some(missing) = scripts.iter().find(|path| !path.is_file()) {
        return Err(SetupError::MissingScript(missing.clone()));
    }

    let mut report = SetupReport::default();
    for path in scripts {
        let sql = fs::read_to_string(path).map_err(|source| SetupError::Read {
            path: path.clone(),
            source,
        })?;
        let outcome = execute_script_file(store, path, &sql).await?;
        report.scripts.push(outcome);
    }

    if !scripts.is_empty() && report.succeeded() == 0 {
        return Err(SetupError::NothingSucceeded);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_comments_and_blank_lines() {
        let sql = "-- indexes\n\ncreate index concurrently a on t (x);\n  -- note\ncreate index concurrently b\n  on t (y);\n";
        let statements = split_statements(sql);
        assert_eq!(
            statements,
            vec![
                "create index concurrently a on t (x);".to_string(),
                "create index concurrently b\n  on t (y);".to_string(),
            ]
        );
    }

    #[test]
    fn keeps_unterminated_tail() {
        assert_eq!(split_statements("select 1;\nselect 2"), vec!["select 1;", "select 2"]);
    }

    #[test]
    fn mode_follows_filename() {
        assert_eq!(
            ScriptMode::for_path(Path::new("sql/create_indexes_CONCURRENTLY.sql")),
            ScriptMode::Sequential
        );
        assert_eq!(ScriptMode::for_path(Path::new("sql/schema.sql")), ScriptMode::Atomic);
    }

    #[test]
    fn missing_script_is_fatal() {
        assert_eq!(SetupError::MissingScript("x.sql".into()).severity(), Severity::Fatal);
        assert_eq!(SetupError::NothingSucceeded.severity(), Severity::Phase);
    }
}
