//! Core contracts for the lmseed workspace.
//!
//! This crate defines the typed entity records of the learning-platform
//! schema, the SQL value model they are persisted with, and the in-memory
//! registry that resolves foreign keys while a dataset is being generated.

#[macro_use]
mod record;

pub mod counts;
pub mod entities;
pub mod error;
pub mod kind;
pub mod registry;
pub mod validation;
pub mod value;

pub use counts::{CountsError, GenerationCounts};
pub use error::{InvariantViolation, RegistryError, Severity};
pub use kind::EntityKind;
pub use record::{Record, RecordRow, RecordSet};
pub use registry::{Collection, EntityRegistry, Registered};
pub use value::{SqlValue, ToSqlValue};

/// Column that carries the primary key of every seeded table.
pub const KEY_COLUMN: &str = "id";
