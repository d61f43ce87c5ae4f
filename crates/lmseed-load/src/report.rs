use serde::Serialize;

use lmseed_core::EntityKind;

/// Per-table outcome of a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableLoad {
    pub kind: EntityKind,
    /// Physical table name, after aliasing.
    pub table: String,
    pub attempted: usize,
    pub loaded: usize,
    pub failed: usize,
    /// Reconciled profiles only: rows written by insert.
    pub inserted: usize,
    /// Reconciled profiles only: trigger-provisioned rows overwritten.
    pub updated: usize,
}

impl TableLoad {
    pub fn new(kind: EntityKind, table: impl Into<String>, attempted: usize) -> Self {
        Self {
            kind,
            table: table.into(),
            attempted,
            loaded: 0,
            failed: 0,
            inserted: 0,
            updated: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed == 0 && self.loaded == self.attempted
    }
}

/// Outcome of loading a whole registry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub tables: Vec<TableLoad>,
    pub elapsed_ms: u64,
}

impl LoadReport {
    pub fn table(&self, kind: EntityKind) -> Option<&TableLoad> {
        self.tables.iter().find(|load| load.kind == kind)
    }

    pub fn total_loaded(&self) -> usize {
        self.tables.iter().map(|load| load.loaded).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.tables.iter().map(|load| load.failed).sum()
    }
}
