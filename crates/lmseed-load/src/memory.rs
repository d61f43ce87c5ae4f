//! In-memory target store used for dry runs and tests.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use lmseed_core::{EntityKind, KEY_COLUMN, SqlValue};

use crate::loader::TableAliases;
use crate::store::{StoreError, TargetStore, quote_identifier};

/// A stored row, keyed by column name.
pub type StoredRow = BTreeMap<String, SqlValue>;

#[derive(Debug, Default)]
struct Table {
    rows: Vec<StoredRow>,
    index: HashMap<Uuid, usize>,
}

impl Table {
    fn push(&mut self, row: StoredRow) {
        if let Some(id) = row.get(KEY_COLUMN).and_then(SqlValue::as_uuid) {
            self.index.insert(id, self.rows.len());
        }
        self.rows.push(row);
    }
}

/// Emulates the auth trigger that provisions a partial profile row for
/// every new identity.
#[derive(Debug, Clone)]
struct ProfileTrigger {
    identity_table: String,
    profile_table: String,
}

/// A column whose non-null values must be keys of `target`.
#[derive(Debug, Clone)]
struct ForeignKey {
    column: String,
    target: String,
}

/// Store that keeps every table in memory.
///
/// Batches are atomic, the `id` column is a primary key, and individual
/// rows or statements can be made to fail on purpose.
#[derive(Debug)]
pub struct MemoryStore {
    tables: BTreeMap<String, Table>,
    rejected_ids: HashSet<(String, Uuid)>,
    rejected_statements: Vec<String>,
    foreign_keys: HashMap<String, Vec<ForeignKey>>,
    trigger: Option<ProfileTrigger>,
    unreachable: bool,
    /// Calls left before the session drops.
    remaining_calls: Option<usize>,
    connected: bool,
    referential_integrity: bool,
    statements: Vec<String>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
            rejected_ids: HashSet::new(),
            rejected_statements: Vec::new(),
            foreign_keys: HashMap::new(),
            trigger: None,
            unreachable: false,
            remaining_calls: None,
            connected: false,
            referential_integrity: true,
            statements: Vec::new(),
        }
    }

    /// A store whose connection attempts always fail.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::new()
        }
    }

    /// Inserting into `identity_table` also creates a partial row in
    /// `profile_table` with the same id.
    pub fn with_profile_trigger(mut self, identity_table: &str, profile_table: &str) -> Self {
        self.trigger = Some(ProfileTrigger {
            identity_table: identity_table.to_string(),
            profile_table: profile_table.to_string(),
        });
        self
    }

    /// Enforces every foreign key of [`EntityKind::references`], with table
    /// names resolved through `aliases`.
    pub fn with_foreign_keys(mut self, aliases: &TableAliases) -> Self {
        for kind in EntityKind::LOAD_ORDER {
            for (column, target) in kind.references() {
                self.enforce_foreign_key(aliases.resolve(kind), column, aliases.resolve(*target));
            }
        }
        self
    }

    /// Inserts into `table` fail when `column` names a key missing from
    /// `target`, unless referential integrity is switched off.
    pub fn enforce_foreign_key(&mut self, table: &str, column: &str, target: &str) {
        self.foreign_keys.entry(table.to_string()).or_default().push(ForeignKey {
            column: column.to_string(),
            target: target.to_string(),
        });
    }

    /// The next `calls` operations succeed; every later one fails as if the
    /// session had been lost.
    pub fn drop_connection_after(&mut self, calls: usize) {
        self.remaining_calls = Some(calls);
    }

    /// Any write of the row `id` into `table` fails like a constraint violation.
    pub fn reject_id(&mut self, table: &str, id: Uuid) {
        self.rejected_ids.insert((table.to_string(), id));
    }

    /// Any statement or script containing `fragment` fails.
    pub fn reject_statement(&mut self, fragment: &str) {
        self.rejected_statements.push(fragment.to_string());
    }

    pub fn rows(&self, table: &str) -> &[StoredRow] {
        self.tables.get(table).map(|t| t.rows.as_slice()).unwrap_or(&[])
    }

    pub fn row(&self, table: &str, id: Uuid) -> Option<&StoredRow> {
        let table = self.tables.get(table)?;
        table.index.get(&id).map(|&position| &table.rows[position])
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.rows(table).len()
    }

    /// Statements and scripts that ran successfully, in order.
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn referential_integrity(&self) -> bool {
        self.referential_integrity
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn ensure_reachable(&mut self) -> Result<(), StoreError> {
        match self.remaining_calls.as_mut() {
            Some(0) => self.unreachable = true,
            Some(left) => *left -= 1,
            None => {}
        }
        if self.unreachable {
            return Err(StoreError::Connection("memory store marked unreachable".to_string()));
        }
        Ok(())
    }

    fn check_statement(&mut self, sql: &str) -> Result<(), StoreError> {
        self.ensure_reachable()?;
        match self.rejected_statements.iter().find(|fragment| sql.contains(fragment.as_str())) {
            Some(fragment) => Err(StoreError::Statement(format!("rejected statement matching {fragment:?}"))),
            None => Ok(()),
        }
    }

    fn run_statement(&mut self, sql: &str) -> Result<(), StoreError> {
        self.check_statement(sql)?;
        self.statements.push(sql.to_string());
        Ok(())
    }

    fn check_references(&self, table: &str, row: &StoredRow) -> Result<(), StoreError> {
        if !self.referential_integrity {
            return Ok(());
        }
        for key in self.foreign_keys.get(table).into_iter().flatten() {
            let Some(target_id) = row.get(&key.column).and_then(SqlValue::as_uuid) else {
                continue;
            };
            if self.row(&key.target, target_id).is_none() {
                return Err(StoreError::write(
                    table,
                    format!("{}={target_id} is not present in {}", key.column, key.target),
                ));
            }
        }
        Ok(())
    }

    fn check_row(&self, table: &str, row: &StoredRow, batch: &HashSet<Uuid>) -> Result<(), StoreError> {
        self.check_references(table, row)?;
        let Some(id) = row.get(KEY_COLUMN).and_then(SqlValue::as_uuid) else {
            return Ok(());
        };
        if self.rejected_ids.contains(&(table.to_string(), id)) {
            return Err(StoreError::write(table, format!("row {id} violates a constraint")));
        }
        let exists = self.tables.get(table).is_some_and(|t| t.index.contains_key(&id));
        if exists || batch.contains(&id) {
            return Err(StoreError::write(table, format!("duplicate key {KEY_COLUMN}={id}")));
        }
        Ok(())
    }

    fn provision_profile(&mut self, identity: &StoredRow) {
        let Some(trigger) = self.trigger.clone() else {
            return;
        };
        let Some(id) = identity.get(KEY_COLUMN).and_then(SqlValue::as_uuid) else {
            return;
        };
        if self.tables.get(&trigger.profile_table).is_some_and(|t| t.index.contains_key(&id)) {
            return;
        }
        let metadata = identity.get("raw_user_meta_data").and_then(SqlValue::as_json);
        let field = |name: &str| {
            SqlValue::Text(
                metadata
                    .and_then(|meta| meta.get(name))
                    .and_then(|value| value.as_str())
                    .map(str::to_string),
            )
        };
        let mut profile = StoredRow::new();
        profile.insert(KEY_COLUMN.to_string(), SqlValue::Uuid(Some(id)));
        profile.insert(
            "email".to_string(),
            identity.get("email").cloned().unwrap_or(SqlValue::Text(None)),
        );
        profile.insert("user_type".to_string(), field("user_type"));
        profile.insert("first_name".to_string(), field("first_name"));
        profile.insert("last_name".to_string(), field("last_name"));
        debug!(%id, table = %trigger.profile_table, "trigger provisioned partial profile");
        self.tables.entry(trigger.profile_table).or_default().push(profile);
    }
}

#[async_trait]
impl TargetStore for MemoryStore {
    fn engine(&self) -> &'static str {
        "memory"
    }

    async fn connect(&mut self) -> Result<(), StoreError> {
        self.ensure_reachable()?;
        self.connected = true;
        Ok(())
    }

    async fn insert_rows(
        &mut self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<SqlValue>],
    ) -> Result<u64, StoreError> {
        self.ensure_reachable()?;
        quote_identifier(table)?;
        let mut pending = Vec::with_capacity(rows.len());
        let mut batch_ids = HashSet::new();
        for values in rows {
            if values.len() != columns.len() {
                return Err(StoreError::Shape {
                    expected: columns.len(),
                    found: values.len(),
                });
            }
            let row: StoredRow = columns
                .iter()
                .map(|column| column.to_string())
                .zip(values.iter().cloned())
                .collect();
            self.check_row(table, &row, &batch_ids)?;
            let id = row.get(KEY_COLUMN).and_then(SqlValue::as_uuid);
            batch_ids.extend(id);
            pending.push(row);
        }

        let fires_trigger = self
            .trigger
            .as_ref()
            .is_some_and(|trigger| trigger.identity_table == table);
        let inserted = pending.len() as u64;
        for row in pending {
            if fires_trigger {
                self.provision_profile(&row);
            }
            self.tables.entry(table.to_string()).or_default().push(row);
        }
        Ok(inserted)
    }

    async fn row_exists(&mut self, table: &str, key_column: &str, id: Uuid) -> Result<bool, StoreError> {
        self.ensure_reachable()?;
        quote_identifier(key_column)?;
        Ok(self.row(table, id).is_some())
    }

    async fn update_row(
        &mut self,
        table: &str,
        key_column: &str,
        id: Uuid,
        columns: &[&str],
        values: &[SqlValue],
    ) -> Result<u64, StoreError> {
        self.ensure_reachable()?;
        quote_identifier(key_column)?;
        if columns.len() != values.len() {
            return Err(StoreError::Shape {
                expected: columns.len(),
                found: values.len(),
            });
        }
        if self.rejected_ids.contains(&(table.to_string(), id)) {
            return Err(StoreError::write(table, format!("row {id} violates a constraint")));
        }
        let Some(stored) = self.tables.get_mut(table) else {
            return Ok(0);
        };
        let Some(&position) = stored.index.get(&id) else {
            return Ok(0);
        };
        let row = &mut stored.rows[position];
        for (column, value) in columns.iter().zip(values) {
            row.insert(column.to_string(), value.clone());
        }
        Ok(1)
    }

    async fn execute_script(&mut self, sql: &str) -> Result<(), StoreError> {
        self.run_statement(sql)
    }

    async fn execute_statement(&mut self, sql: &str) -> Result<(), StoreError> {
        self.run_statement(sql)
    }

    async fn set_referential_integrity(&mut self, enabled: bool) -> Result<(), StoreError> {
        let role = if enabled { "default" } else { "replica" };
        self.run_statement(&format!("set session_replication_role = {role}"))?;
        self.referential_integrity = enabled;
        Ok(())
    }

    async fn truncate(&mut self, table: &str) -> Result<(), StoreError> {
        let sql = format!("truncate table {} cascade", quote_identifier(table)?);
        self.run_statement(&sql).map_err(|err| match err {
            StoreError::Statement(message) => StoreError::write(table, message),
            other => other,
        })?;
        self.tables.remove(table);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.connected = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn identity_row(id: Uuid) -> Vec<SqlValue> {
        vec![
            SqlValue::Uuid(Some(id)),
            SqlValue::Text(Some("ana@example.com".to_string())),
            SqlValue::Json(Some(json!({"user_type": "student", "first_name": "Ana", "last_name": "Lima"}))),
        ]
    }

    const IDENTITY_COLUMNS: &[&str] = &["id", "email", "raw_user_meta_data"];

    #[tokio::test]
    async fn batches_are_atomic() {
        let mut store = MemoryStore::new();
        let bad = Uuid::new_v4();
        store.reject_id("courses", bad);
        let rows = vec![
            vec![SqlValue::Uuid(Some(Uuid::new_v4()))],
            vec![SqlValue::Uuid(Some(bad))],
        ];
        let err = store.insert_rows("courses", &["id"], &rows).await.unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert_eq!(store.row_count("courses"), 0);
    }

    #[tokio::test]
    async fn duplicate_keys_are_rejected() {
        let mut store = MemoryStore::new();
        let id = Uuid::new_v4();
        let rows = vec![vec![SqlValue::Uuid(Some(id))]];
        store.insert_rows("courses", &["id"], &rows).await.expect("first insert");
        assert!(store.insert_rows("courses", &["id"], &rows).await.is_err());
        assert_eq!(store.row_count("courses"), 1);
    }

    #[tokio::test]
    async fn trigger_provisions_partial_profile() {
        let mut store = MemoryStore::new().with_profile_trigger("auth.users", "user_profiles");
        let id = Uuid::new_v4();
        store
            .insert_rows("auth.users", IDENTITY_COLUMNS, &[identity_row(id)])
            .await
            .expect("identity insert");
        let profile = store.row("user_profiles", id).expect("partial profile");
        assert_eq!(profile["first_name"].as_str(), Some("Ana"));
        assert_eq!(profile["user_type"].as_str(), Some("student"));
        assert!(!profile.contains_key("phone"));
    }

    #[tokio::test]
    async fn unreachable_store_refuses_to_connect() {
        let mut store = MemoryStore::unreachable();
        let err = store.connect().await.unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)));
    }

    #[tokio::test]
    async fn missing_parent_rows_are_rejected() {
        let mut store = MemoryStore::new();
        store.enforce_foreign_key("chapters", "course_id", "courses");
        let course = Uuid::new_v4();
        let chapter = vec![SqlValue::Uuid(Some(Uuid::new_v4())), SqlValue::Uuid(Some(course))];

        let err = store
            .insert_rows("chapters", &["id", "course_id"], &[chapter.clone()])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));

        store
            .insert_rows("courses", &["id"], &[vec![SqlValue::Uuid(Some(course))]])
            .await
            .expect("course insert");
        store
            .insert_rows("chapters", &["id", "course_id"], &[chapter])
            .await
            .expect("chapter insert");
        let orphan = vec![SqlValue::Uuid(Some(Uuid::new_v4())), SqlValue::Uuid(None)];
        store
            .insert_rows("chapters", &["id", "course_id"], &[orphan])
            .await
            .expect("null reference is allowed");
    }

    #[tokio::test]
    async fn replica_role_skips_reference_checks() {
        let mut store = MemoryStore::new();
        store.enforce_foreign_key("chapters", "course_id", "courses");
        store.set_referential_integrity(false).await.expect("replica role");
        let chapter = vec![SqlValue::Uuid(Some(Uuid::new_v4())), SqlValue::Uuid(Some(Uuid::new_v4()))];
        store
            .insert_rows("chapters", &["id", "course_id"], &[chapter])
            .await
            .expect("unchecked insert");
    }

    #[tokio::test]
    async fn dropped_session_fails_every_later_call() {
        let mut store = MemoryStore::new();
        store.connect().await.expect("connect");
        store.drop_connection_after(1);
        store.execute_statement("select 1").await.expect("still connected");
        let err = store.truncate("courses").await.unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)));
        let err = store.row_exists("courses", "id", Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)));
    }

    #[tokio::test]
    async fn rejected_statements_are_not_recorded() {
        let mut store = MemoryStore::new();
        store.reject_statement("bogus");
        assert!(store.execute_statement("create index bogus_idx on x (y)").await.is_err());
        store.execute_statement("select 1").await.expect("plain statement");
        assert_eq!(store.statements(), ["select 1".to_string()]);
    }
}
