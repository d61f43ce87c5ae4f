use thiserror::Error;

use lmseed_core::{CountsError, EntityKind, RegistryError, Severity};

use crate::pipeline::Phase;

/// Errors emitted by the generation pipeline.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{phase} requires at least one {}", join_kinds(.missing))]
    InsufficientPrerequisites { phase: Phase, missing: Vec<EntityKind> },
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("invalid counts: {0}")]
    InvalidCounts(#[from] CountsError),
}

impl GenerationError {
    pub fn severity(&self) -> Severity {
        match self {
            GenerationError::InsufficientPrerequisites { .. } => Severity::Phase,
            GenerationError::Registry(err) => err.severity(),
            GenerationError::InvalidCounts(err) => err.severity(),
        }
    }
}

fn join_kinds(kinds: &[EntityKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
