use thiserror::Error;
use uuid::Uuid;

use crate::kind::EntityKind;

/// How far a failure is allowed to propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Only the current record is lost; the caller continues.
    Record,
    /// The current phase returns a partial or empty result; the pipeline continues.
    Phase,
    /// The whole run aborts.
    Fatal,
}

/// A cross-field invariant rejected an entity at construction time.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{kind} {id}: {message}")]
pub struct InvariantViolation {
    pub kind: EntityKind,
    pub id: Uuid,
    pub message: String,
}

impl InvariantViolation {
    pub fn new(kind: EntityKind, id: Uuid, message: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            message: message.into(),
        }
    }
}

/// Errors raised by the entity registry.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: EntityKind, id: Uuid },
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: Uuid },
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl RegistryError {
    pub fn severity(&self) -> Severity {
        match self {
            RegistryError::DuplicateId { .. } => Severity::Record,
            RegistryError::NotFound { .. } | RegistryError::Invariant(_) => Severity::Phase,
        }
    }
}
