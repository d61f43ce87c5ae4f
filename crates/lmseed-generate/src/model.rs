use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use lmseed_core::EntityKind;

use crate::pipeline::Phase;

/// Outcome of a single phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhaseStatus {
    Completed,
    /// A prerequisite collection was empty; nothing was generated.
    Skipped { reason: String },
    /// The phase stopped early; entities stored before the failure are kept.
    Failed { error: String },
}

/// Summary of one phase.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseReport {
    pub phase: Phase,
    #[serde(flatten)]
    pub status: PhaseStatus,
    pub produced: BTreeMap<EntityKind, usize>,
    pub duration_ms: u64,
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub seed: u64,
    pub generated_at: DateTime<Utc>,
    pub phases: Vec<PhaseReport>,
    pub totals: BTreeMap<EntityKind, usize>,
    pub total_records: usize,
}

impl GenerationReport {
    pub fn new(seed: u64, generated_at: DateTime<Utc>) -> Self {
        Self {
            seed,
            generated_at,
            phases: Vec::new(),
            totals: BTreeMap::new(),
            total_records: 0,
        }
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|report| report.phase == phase)
    }

    pub fn failed_phases(&self) -> impl Iterator<Item = &PhaseReport> {
        self.phases
            .iter()
            .filter(|report| matches!(report.status, PhaseStatus::Failed { .. }))
    }
}
