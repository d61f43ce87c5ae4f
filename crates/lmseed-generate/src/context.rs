use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::warn;
use uuid::Uuid;

use lmseed_core::{EntityKind, EntityRegistry, GenerationCounts, Registered, RegistryError};

use crate::errors::GenerationError;
use crate::faker::Faker;
use crate::pipeline::Phase;
use crate::synth::{Timeline, new_id};

/// Explicit state threaded through every phase of one run.
pub struct GenerationContext {
    pub registry: EntityRegistry,
    pub rng: ChaCha8Rng,
    pub timeline: Timeline,
    pub counts: GenerationCounts,
    emails: HashSet<String>,
}

impl GenerationContext {
    pub fn new(counts: GenerationCounts, seed: u64, now: DateTime<Utc>) -> Self {
        Self {
            registry: EntityRegistry::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            timeline: Timeline::new(now),
            counts,
            emails: HashSet::new(),
        }
    }

    pub fn new_id(&mut self) -> Uuid {
        new_id(&mut self.rng)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.timeline.now()
    }

    /// Stores an entity and returns its id.
    ///
    /// A duplicate id is logged and resolved to the entity already stored.
    pub fn insert<T: Registered>(&mut self, entity: T) -> Result<Uuid, GenerationError> {
        match self.registry.put(entity) {
            Ok(stored) => Ok(stored.id()),
            Err(RegistryError::DuplicateId { kind, id }) => {
                warn!(%kind, %id, "duplicate id, keeping the existing entity");
                Ok(id)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Fails with `InsufficientPrerequisites` when any of `kinds` is still empty.
    pub fn require(&self, phase: Phase, kinds: &[EntityKind]) -> Result<(), GenerationError> {
        let missing: Vec<EntityKind> = kinds
            .iter()
            .copied()
            .filter(|kind| self.registry.count(*kind) == 0)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(GenerationError::InsufficientPrerequisites { phase, missing })
        }
    }

    /// Email address not yet handed out in this run.
    pub fn unique_email(&mut self) -> String {
        let email = Faker::email(&mut self.rng);
        if self.emails.insert(email.clone()) {
            return email;
        }
        let (local, domain) = email.split_once('@').unwrap_or((email.as_str(), "example.com"));
        let mut suffix = self.emails.len();
        loop {
            let candidate = format!("{local}{suffix}@{domain}");
            if self.emails.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }

    pub fn into_registry(self) -> EntityRegistry {
        self.registry
    }
}
