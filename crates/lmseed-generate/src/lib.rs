//! Dependency-ordered generation of the learning-platform dataset.
//!
//! Phases run in a fixed order against an explicit [`GenerationContext`];
//! each reads its foreign keys from the registry and pushes its entities
//! back. Nothing here touches a database.

pub mod context;
pub mod errors;
pub mod faker;
pub mod identity;
pub mod model;
pub mod phases;
pub mod pipeline;
pub mod synth;

pub use context::GenerationContext;
pub use errors::GenerationError;
pub use model::{GenerationReport, PhaseReport, PhaseStatus};
pub use pipeline::{GeneratedDataset, GenerationPipeline, Phase};
