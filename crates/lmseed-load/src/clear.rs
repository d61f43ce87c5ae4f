use serde::Serialize;
use tracing::{info, warn};

use lmseed_core::{EntityKind, Severity};

use crate::loader::TableAliases;
use crate::store::{StoreError, TargetStore};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClearReport {
    pub truncated: Vec<String>,
    pub failed: Vec<String>,
}

/// Without the privilege to switch replication role, truncation still
/// proceeds, relying on `CASCADE`.
async fn toggle_integrity<S>(store: &mut S, enabled: bool) -> Result<(), StoreError>
where
    S: TargetStore + ?Sized,
{
    match store.set_referential_integrity(enabled).await {
        Ok(()) => Ok(()),
        Err(err) if err.severity() == Severity::Fatal => Err(err),
        Err(err) => {
            warn!(enabled, error = %err, "cannot switch referential integrity");
            Ok(())
        }
    }
}

/// Empties every seeded table, dependents first, with foreign-key
/// enforcement suspended for the session.
///
/// A table that cannot be truncated is reported and skipped.
pub async fn clear_all<S>(store: &mut S, aliases: &TableAliases) -> Result<ClearReport, StoreError>
where
    S: TargetStore + ?Sized,
{
    toggle_integrity(store, false).await?;
    let mut report = ClearReport::default();
    for kind in EntityKind::LOAD_ORDER.iter().rev() {
        let table = aliases.resolve(*kind).to_string();
        match store.truncate(&table).await {
            Ok(()) => report.truncated.push(table),
            Err(err) if err.severity() == Severity::Fatal => return Err(err),
            Err(err) => {
                warn!(table = %table, error = %err, "truncate failed");
                report.failed.push(table);
            }
        }
    }
    toggle_integrity(store, true).await?;
    info!(
        truncated = report.truncated.len(),
        failed = report.failed.len(),
        "database cleared"
    );
    Ok(report)
}
