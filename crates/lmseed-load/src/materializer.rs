//! Reconcile-Profile: the load-time half of identity materialization.
//!
//! Inserting an identity may make the auth trigger provision a partial
//! profile with the same id, possibly later. Each profile is therefore
//! checked against the store one at a time and either overwrites the
//! provisioned row or is inserted.

use serde::Serialize;
use tracing::{debug, warn};

use lmseed_core::{KEY_COLUMN, RecordRow, RecordSet, Severity, SqlValue};

use crate::report::TableLoad;
use crate::store::{StoreError, TargetStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    Inserted,
    Updated,
}

/// Writes one full profile row, updating every non-key column when the row
/// already exists.
pub async fn reconcile_profile<S>(
    store: &mut S,
    table: &str,
    columns: &[&str],
    row: &RecordRow,
) -> Result<ReconcileOutcome, StoreError>
where
    S: TargetStore + ?Sized,
{
    if store.row_exists(table, KEY_COLUMN, row.id).await? {
        let (update_columns, update_values): (Vec<&str>, Vec<SqlValue>) = columns
            .iter()
            .zip(&row.values)
            .filter(|(column, _)| **column != KEY_COLUMN)
            .map(|(column, value)| (*column, value.clone()))
            .unzip();
        let touched = store
            .update_row(table, KEY_COLUMN, row.id, &update_columns, &update_values)
            .await?;
        if touched == 0 {
            return Err(StoreError::write(table, format!("profile {} disappeared before update", row.id)));
        }
        return Ok(ReconcileOutcome::Updated);
    }

    store
        .insert_rows(table, columns, std::slice::from_ref(&row.values))
        .await?;
    Ok(ReconcileOutcome::Inserted)
}

/// Reconciles every profile of `set`. A failing profile is counted and
/// skipped; only fatal store errors abort.
pub async fn reconcile_profiles<S>(store: &mut S, table: &str, set: &RecordSet) -> Result<TableLoad, StoreError>
where
    S: TargetStore + ?Sized,
{
    let mut load = TableLoad::new(set.kind, table, set.len());
    for row in &set.rows {
        match reconcile_profile(store, table, set.columns, row).await {
            Ok(outcome) => {
                debug!(table, id = %row.id, ?outcome, "profile reconciled");
                load.loaded += 1;
                match outcome {
                    ReconcileOutcome::Inserted => load.inserted += 1,
                    ReconcileOutcome::Updated => load.updated += 1,
                }
            }
            Err(err) if err.severity() == Severity::Fatal => return Err(err),
            Err(err) => {
                warn!(table, id = %row.id, error = %err, "profile skipped");
                load.failed += 1;
            }
        }
    }
    Ok(load)
}
