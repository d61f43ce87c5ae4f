use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{debug, info, warn};

use lmseed_core::{EntityKind, EntityRegistry, RecordSet, Severity, SqlValue};

use crate::materializer::reconcile_profiles;
use crate::report::{LoadReport, TableLoad};
use crate::store::{StoreError, TargetStore};

pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Physical table of the identity records in Supabase-style schemas.
pub const AUTH_USERS_TABLE: &str = "auth.users";

/// Maps entity kinds to physical table names that differ from
/// [`EntityKind::table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableAliases {
    aliases: BTreeMap<EntityKind, String>,
}

impl Default for TableAliases {
    fn default() -> Self {
        Self::empty().with(EntityKind::Identity, AUTH_USERS_TABLE)
    }
}

impl TableAliases {
    pub fn empty() -> Self {
        Self {
            aliases: BTreeMap::new(),
        }
    }

    pub fn with(mut self, kind: EntityKind, table: impl Into<String>) -> Self {
        self.aliases.insert(kind, table.into());
        self
    }

    pub fn resolve(&self, kind: EntityKind) -> &str {
        self.aliases
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.table())
    }
}

/// Writes record sets in fixed-size batches, retrying a failed batch one
/// record at a time.
pub struct BatchLoader<'s, S: TargetStore + ?Sized> {
    store: &'s mut S,
    batch_size: usize,
    aliases: TableAliases,
}

impl<'s, S: TargetStore + ?Sized> BatchLoader<'s, S> {
    pub fn new(store: &'s mut S, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
            aliases: TableAliases::default(),
        }
    }

    pub fn with_aliases(mut self, aliases: TableAliases) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn aliases(&self) -> &TableAliases {
        &self.aliases
    }

    /// Persists `set` and reports how many rows made it.
    ///
    /// Record-level failures are counted, not returned; the error path is
    /// reserved for fatal store errors. A batch the store rejects for its
    /// shape or table name is counted as failed without per-row retries.
    pub async fn load(&mut self, set: &RecordSet) -> Result<TableLoad, StoreError> {
        let table = self.aliases.resolve(set.kind).to_string();
        if set.kind.is_trigger_materialized() {
            return reconcile_profiles(&mut *self.store, &table, set).await;
        }

        let mut load = TableLoad::new(set.kind, &table, set.len());
        for (index, batch) in set.rows.chunks(self.batch_size).enumerate() {
            let rows: Vec<Vec<SqlValue>> = batch.iter().map(|row| row.values.clone()).collect();
            match self.store.insert_rows(&table, set.columns, &rows).await {
                Ok(_) => {
                    debug!(table = %table, batch = index, rows = rows.len(), "batch inserted");
                    load.loaded += rows.len();
                }
                Err(err) if err.severity() == Severity::Fatal => return Err(err),
                Err(err) if err.severity() == Severity::Phase => {
                    warn!(table = %table, batch = index, error = %err, "batch rejected as a whole");
                    load.failed += rows.len();
                }
                Err(err) => {
                    warn!(table = %table, batch = index, error = %err, "batch failed, inserting rows one by one");
                    for (record, values) in batch.iter().zip(&rows) {
                        match self
                            .store
                            .insert_rows(&table, set.columns, std::slice::from_ref(values))
                            .await
                        {
                            Ok(_) => load.loaded += 1,
                            Err(err) if err.severity() == Severity::Fatal => return Err(err),
                            Err(err) => {
                                warn!(table = %table, id = %record.id, error = %err, "record skipped");
                                load.failed += 1;
                            }
                        }
                    }
                }
            }
        }
        Ok(load)
    }

    /// Loads every collection of `registry` in dependency order.
    pub async fn load_registry(&mut self, registry: &EntityRegistry) -> Result<LoadReport, StoreError> {
        let started = Instant::now();
        let mut report = LoadReport::default();
        for kind in EntityKind::LOAD_ORDER {
            let set = registry.record_set(kind);
            let load = self.load(&set).await?;
            if load.attempted > 0 {
                info!(
                    table = %load.table,
                    loaded = load.loaded,
                    failed = load.failed,
                    "table loaded"
                );
            }
            report.tables.push(load);
        }
        report.elapsed_ms = started.elapsed().as_millis() as u64;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use lmseed_core::RecordRow;
    use uuid::Uuid;

    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn identities_are_aliased_by_default() {
        let aliases = TableAliases::default();
        assert_eq!(aliases.resolve(EntityKind::Identity), "auth.users");
        assert_eq!(aliases.resolve(EntityKind::Course), "courses");
    }

    #[test]
    fn custom_alias_overrides_default() {
        let aliases = TableAliases::default().with(EntityKind::Review, "public.course_reviews");
        assert_eq!(aliases.resolve(EntityKind::Review), "public.course_reviews");
        assert_eq!(TableAliases::empty().resolve(EntityKind::Identity), "auth_users");
    }

    #[tokio::test]
    async fn malformed_batch_is_not_retried_per_row() {
        let rows = (0..3)
            .map(|_| {
                let id = Uuid::new_v4();
                RecordRow {
                    id,
                    values: vec![SqlValue::Uuid(Some(id))],
                }
            })
            .collect();
        let set = RecordSet {
            kind: EntityKind::Category,
            columns: &["id", "name"],
            rows,
        };
        let mut store = MemoryStore::new();
        // One call only: a per-row retry would run into the dropped session.
        store.drop_connection_after(1);

        let load = BatchLoader::new(&mut store, 10).load(&set).await.expect("no fatal error");

        assert_eq!(load.loaded, 0);
        assert_eq!(load.failed, 3);
        assert_eq!(store.row_count("course_categories"), 0);
    }
}
