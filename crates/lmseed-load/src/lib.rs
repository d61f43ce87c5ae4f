//! Persistence of a generated dataset.
//!
//! Everything writes through [`TargetStore`]: the batch loader with its
//! per-record fallback, profile reconciliation, setup scripts and the
//! bulk clear.

pub mod clear;
pub mod loader;
pub mod materializer;
pub mod memory;
pub mod postgres;
pub mod report;
pub mod scripts;
pub mod store;

pub use clear::{ClearReport, clear_all};
pub use loader::{AUTH_USERS_TABLE, BatchLoader, DEFAULT_BATCH_SIZE, TableAliases};
pub use materializer::{ReconcileOutcome, reconcile_profile, reconcile_profiles};
pub use memory::{MemoryStore, StoredRow};
pub use postgres::PgStore;
pub use report::{LoadReport, TableLoad};
pub use scripts::{ScriptMode, ScriptOutcome, SetupError, SetupReport, run_setup, split_statements};
pub use store::{StoreError, TargetStore, quote_identifier};
