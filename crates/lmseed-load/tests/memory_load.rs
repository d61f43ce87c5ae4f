use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use lmseed_core::{EntityKind, GenerationCounts, RecordRow, RecordSet, Severity, SqlValue};
use lmseed_generate::{GeneratedDataset, GenerationPipeline};
use lmseed_load::{
    BatchLoader, MemoryStore, ReconcileOutcome, ScriptMode, SetupError, StoreError, TableAliases, TargetStore,
    clear_all, reconcile_profile, run_setup,
};

const CATEGORY_COLUMNS: &[&str] = &["id", "name"];
const PROFILE_COLUMNS: &[&str] = &["id", "email", "first_name", "phone"];

fn category_set(ids: &[Uuid]) -> RecordSet {
    RecordSet {
        kind: EntityKind::Category,
        columns: CATEGORY_COLUMNS,
        rows: ids
            .iter()
            .enumerate()
            .map(|(index, id)| RecordRow {
                id: *id,
                values: vec![SqlValue::Uuid(Some(*id)), SqlValue::Text(Some(format!("category {index}")))],
            })
            .collect(),
    }
}

fn profile_row(id: Uuid, phone: &str) -> RecordRow {
    RecordRow {
        id,
        values: vec![
            SqlValue::Uuid(Some(id)),
            SqlValue::Text(Some("ana@example.com".to_string())),
            SqlValue::Text(Some("Ana".to_string())),
            SqlValue::Text(Some(phone.to_string())),
        ],
    }
}

fn small_dataset(seed: u64) -> Result<GeneratedDataset> {
    let counts = GenerationCounts {
        organizations: 2,
        instructors: 4,
        learners: 10,
        courses: 3,
        chapters_per_course: 2,
        lessons_per_chapter: 2,
        assessments_per_course: 1,
        assignments_per_course: 1,
        live_sessions: 2,
        enrollment_fraction: 0.5,
        review_fraction: 0.3,
    };
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap();
    Ok(GenerationPipeline::new(counts, seed, now)?.run())
}

fn scratch_dir() -> Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("lmseed-load-{}", Uuid::new_v4()));
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir)
}

#[tokio::test]
async fn failing_record_does_not_sink_its_batch() -> Result<()> {
    let ids: Vec<Uuid> = (0..7).map(|_| Uuid::new_v4()).collect();
    let mut store = MemoryStore::new();
    store.reject_id("course_categories", ids[4]);

    let load = BatchLoader::new(&mut store, 3).load(&category_set(&ids)).await?;

    assert_eq!(load.attempted, 7);
    assert_eq!(load.loaded, 6);
    assert_eq!(load.failed, 1);
    assert_eq!(store.row_count("course_categories"), 6);
    assert!(store.row("course_categories", ids[4]).is_none());
    assert!(store.row("course_categories", ids[3]).is_some());
    Ok(())
}

#[tokio::test]
async fn reconciling_a_profile_twice_keeps_one_row() -> Result<()> {
    let mut store = MemoryStore::new();
    let id = Uuid::new_v4();

    let first = reconcile_profile(&mut store, "user_profiles", PROFILE_COLUMNS, &profile_row(id, "+919800000001")).await?;
    let second = reconcile_profile(&mut store, "user_profiles", PROFILE_COLUMNS, &profile_row(id, "+919800000002")).await?;

    assert_eq!(first, ReconcileOutcome::Inserted);
    assert_eq!(second, ReconcileOutcome::Updated);
    assert_eq!(store.row_count("user_profiles"), 1);
    let row = store.row("user_profiles", id).context("profile row")?;
    assert_eq!(row["phone"].as_str(), Some("+919800000002"));
    Ok(())
}

#[tokio::test]
async fn trigger_provisioned_profile_is_completed_in_place() -> Result<()> {
    let mut store = MemoryStore::new().with_profile_trigger("auth.users", "user_profiles");
    let id = Uuid::new_v4();
    store
        .insert_rows(
            "auth.users",
            &["id", "email", "raw_user_meta_data"],
            &[vec![
                SqlValue::Uuid(Some(id)),
                SqlValue::Text(Some("ana@example.com".to_string())),
                SqlValue::Json(Some(json!({"user_type": "student", "first_name": "Ana", "last_name": "Lima"}))),
            ]],
        )
        .await?;
    assert!(store.row("user_profiles", id).context("provisioned")?.get("phone").is_none());

    let outcome = reconcile_profile(&mut store, "user_profiles", PROFILE_COLUMNS, &profile_row(id, "+919811111111")).await?;

    assert_eq!(outcome, ReconcileOutcome::Updated);
    assert_eq!(store.row_count("user_profiles"), 1);
    let row = store.row("user_profiles", id).context("profile row")?;
    assert_eq!(row["phone"].as_str(), Some("+919811111111"));
    assert_eq!(row["last_name"].as_str(), Some("Lima"));
    Ok(())
}

#[tokio::test]
async fn sequential_script_continues_past_bad_statement() -> Result<()> {
    let dir = scratch_dir()?;
    let path = dir.join("create_indexes_concurrently.sql");
    fs::write(
        &path,
        "-- lesson lookups\n\
         create index concurrently if not exists idx_a on lessons (course_id);\n\
         create index concurrently if not exists idx_b on lessons (chapter_id);\n\
         create index concurrently if not exists idx_bogus on nowhere (x);\n\
         \n\
         create index concurrently if not exists idx_c on chapters (course_id);\n\
         create index concurrently if not exists idx_d\n  on reviews (course_id);\n\
         create index concurrently if not exists idx_e on payments (student_id);\n",
    )?;
    let mut store = MemoryStore::new();
    store.reject_statement("idx_bogus");

    let report = run_setup(&mut store, &[path]).await?;

    let outcome = &report.scripts[0];
    assert_eq!(outcome.mode, ScriptMode::Sequential);
    assert_eq!(outcome.statements, 6);
    assert_eq!(outcome.succeeded, 5);
    assert_eq!(outcome.failed, 1);
    assert_eq!(store.statements().len(), 5);
    assert!(store.statements()[4].contains("idx_e"));
    Ok(())
}

#[tokio::test]
async fn failed_atomic_script_does_not_stop_the_next_one() -> Result<()> {
    let dir = scratch_dir()?;
    let schema = dir.join("schema.sql");
    let indexes = dir.join("indexes_concurrently.sql");
    fs::write(&schema, "create table a (id uuid);\ncreate table broken (;\n")?;
    fs::write(&indexes, "create index concurrently idx_a on a (id);\n")?;
    let mut store = MemoryStore::new();
    store.reject_statement("broken");

    let report = run_setup(&mut store, &[schema, indexes]).await?;

    assert_eq!(report.scripts[0].mode, ScriptMode::Atomic);
    assert!(!report.scripts[0].is_success());
    assert!(report.scripts[0].error.is_some());
    assert!(report.scripts[1].is_success());
    assert_eq!(store.statements().len(), 1);
    Ok(())
}

#[tokio::test]
async fn missing_script_aborts_before_executing_anything() -> Result<()> {
    let dir = scratch_dir()?;
    let present = dir.join("schema.sql");
    fs::write(&present, "select 1;")?;
    let mut store = MemoryStore::new();

    let err = run_setup(&mut store, &[present, dir.join("absent.sql")]).await.unwrap_err();

    assert!(matches!(err, SetupError::MissingScript(_)));
    assert!(store.statements().is_empty());
    Ok(())
}

#[tokio::test]
async fn generated_dataset_loads_completely_into_memory() -> Result<()> {
    let dataset = small_dataset(17)?;
    let registry = &dataset.registry;

    let mut store = MemoryStore::new()
        .with_profile_trigger("auth.users", "user_profiles")
        .with_foreign_keys(&TableAliases::default());
    let report = BatchLoader::new(&mut store, 5).load_registry(registry).await?;

    assert_eq!(report.tables.len(), EntityKind::LOAD_ORDER.len());
    assert_eq!(report.total_failed(), 0);
    assert_eq!(report.total_loaded(), registry.total());
    for load in &report.tables {
        assert!(load.is_complete(), "{}", load.table);
        assert_eq!(store.row_count(&load.table), registry.count(load.kind), "{}", load.table);
    }

    let profiles = report.table(EntityKind::Profile).context("profile load")?;
    assert_eq!(profiles.updated, registry.count(EntityKind::Profile));
    assert_eq!(profiles.inserted, 0);
    assert_eq!(store.row_count("auth.users"), registry.count(EntityKind::Identity));
    Ok(())
}

#[tokio::test]
async fn clear_truncates_dependents_first_and_restores_integrity() -> Result<()> {
    let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
    let mut store = MemoryStore::new();
    BatchLoader::new(&mut store, 50).load(&category_set(&ids)).await?;
    store.reject_statement("\"reviews\"");

    let report = clear_all(&mut store, &TableAliases::default()).await?;

    assert_eq!(store.row_count("course_categories"), 0);
    assert_eq!(report.failed, vec!["reviews".to_string()]);
    assert_eq!(report.truncated.len(), EntityKind::LOAD_ORDER.len() - 1);
    assert_eq!(report.truncated.first().map(String::as_str), Some("notifications"));
    assert_eq!(report.truncated.last().map(String::as_str), Some("auth.users"));
    assert!(store.referential_integrity());
    assert_eq!(
        store.statements().first().map(String::as_str),
        Some("set session_replication_role = replica")
    );
    Ok(())
}

#[tokio::test]
async fn unreachable_store_is_fatal_for_the_loader() {
    let mut store = MemoryStore::unreachable();
    let ids = [Uuid::new_v4()];
    let err = BatchLoader::new(&mut store, 10)
        .load(&category_set(&ids))
        .await
        .unwrap_err();
    assert_eq!(err.severity(), Severity::Fatal);
}

#[tokio::test]
async fn references_to_unloaded_parents_are_rejected() -> Result<()> {
    let dataset = small_dataset(17)?;
    let courses = dataset.registry.record_set(EntityKind::Course);
    assert!(!courses.is_empty());
    let mut store = MemoryStore::new().with_foreign_keys(&TableAliases::default());

    let load = BatchLoader::new(&mut store, 5).load(&courses).await?;

    assert_eq!(load.loaded, 0);
    assert_eq!(load.failed, dataset.registry.count(EntityKind::Course));
    Ok(())
}

#[tokio::test]
async fn lost_session_stops_the_load_instead_of_retrying_rows() -> Result<()> {
    let ids: Vec<Uuid> = (0..7).map(|_| Uuid::new_v4()).collect();
    let mut store = MemoryStore::new();
    store.drop_connection_after(1);

    let err = BatchLoader::new(&mut store, 3)
        .load(&category_set(&ids))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Connection(_)));
    assert_eq!(store.row_count("course_categories"), 3);
    Ok(())
}

#[tokio::test]
async fn lost_session_stops_the_clear() -> Result<()> {
    let mut store = MemoryStore::new();
    // Replica switch and two truncates go through.
    store.drop_connection_after(3);

    let err = clear_all(&mut store, &TableAliases::default()).await.unwrap_err();

    assert_eq!(err.severity(), Severity::Fatal);
    assert_eq!(store.statements().len(), 3);
    Ok(())
}

#[tokio::test]
async fn lost_session_stops_sequential_scripts() -> Result<()> {
    let dir = scratch_dir()?;
    let path = dir.join("create_indexes_concurrently.sql");
    fs::write(
        &path,
        "create index concurrently idx_a on lessons (course_id);
         create index concurrently idx_b on lessons (chapter_id);
         create index concurrently idx_c on chapters (course_id);
",
    )?;
    let mut store = MemoryStore::new();
    store.drop_connection_after(1);

    let err = run_setup(&mut store, &[path]).await.unwrap_err();

    assert_eq!(err.severity(), Severity::Fatal);
    assert_eq!(store.statements().len(), 1);
    Ok(())
}
