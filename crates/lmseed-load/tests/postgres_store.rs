use std::env;

use anyhow::{Context, Result};
use serde_json::json;
use uuid::Uuid;

use lmseed_core::{EntityKind, RecordRow, RecordSet, SqlValue};
use lmseed_load::{BatchLoader, PgStore, ReconcileOutcome, TableAliases, TargetStore, reconcile_profile};

const SCHEMA: &str = "
drop table if exists lmseed_it_items;
drop type if exists lmseed_it_status;
create type lmseed_it_status as enum ('draft', 'published');
create table lmseed_it_items (
    id uuid primary key,
    name text not null,
    status lmseed_it_status,
    rating double precision check (rating between 0 and 5),
    tags text[],
    owners uuid[],
    details jsonb
);
";

const COLUMNS: &[&str] = &["id", "name", "status", "rating", "tags", "owners", "details"];

fn database_url() -> Result<String> {
    env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .context("set TEST_DATABASE_URL or DATABASE_URL for integration tests")
}

fn item(rating: f64) -> RecordRow {
    let id = Uuid::new_v4();
    RecordRow {
        id,
        values: vec![
            SqlValue::Uuid(Some(id)),
            SqlValue::Text(Some(format!("item {rating}"))),
            SqlValue::Text(Some("published".to_string())),
            SqlValue::Float(Some(rating)),
            SqlValue::TextArray(Some(vec!["a".to_string(), "b".to_string()])),
            SqlValue::UuidArray(None),
            SqlValue::Json(Some(json!({"rating": rating}))),
        ],
    }
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn loads_typed_rows_into_enum_columns_and_isolates_constraint_failures() -> Result<()> {
    let mut store = PgStore::from_url(&database_url()?)?;
    store.connect().await?;
    store.execute_script(SCHEMA).await?;

    let set = RecordSet {
        kind: EntityKind::Review,
        columns: COLUMNS,
        rows: vec![item(4.5), item(9.0), item(3.0)],
    };
    let aliases = TableAliases::empty().with(EntityKind::Review, "lmseed_it_items");
    let load = BatchLoader::new(&mut store, 10)
        .with_aliases(aliases)
        .load(&set)
        .await?;
    assert_eq!(load.loaded, 2);
    assert_eq!(load.failed, 1);

    let mut updated = set.rows[0].clone();
    updated.values[1] = SqlValue::Text(Some("renamed".to_string()));
    updated.values[2] = SqlValue::Text(Some("draft".to_string()));
    let outcome = reconcile_profile(&mut store, "lmseed_it_items", COLUMNS, &updated).await?;
    assert_eq!(outcome, ReconcileOutcome::Updated);

    store.truncate("lmseed_it_items").await?;
    assert!(!store.row_exists("lmseed_it_items", "id", updated.id).await?);
    store.close().await?;
    Ok(())
}
