use std::collections::HashMap;

use uuid::Uuid;

use crate::entities::*;
use crate::error::RegistryError;
use crate::kind::EntityKind;
use crate::record::{Record, RecordSet};

/// Insertion-ordered entities of one kind, indexed by id.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<T>,
    index: HashMap<Uuid, usize>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Record> Collection<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.index.get(&id).map(|position| &self.items[*position])
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut T> {
        match self.index.get(&id) {
            Some(position) => self.items.get_mut(*position),
            None => None,
        }
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> Vec<Uuid> {
        self.items.iter().map(Record::id).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    fn push(&mut self, entity: T) -> Result<&T, RegistryError> {
        let id = entity.id();
        if self.index.contains_key(&id) {
            return Err(RegistryError::DuplicateId { kind: T::KIND, id });
        }
        self.index.insert(id, self.items.len());
        self.items.push(entity);
        Ok(&self.items[self.items.len() - 1])
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Entity types stored in the [`EntityRegistry`].
pub trait Registered: Record + Sized {
    fn collection(registry: &EntityRegistry) -> &Collection<Self>;
    fn collection_mut(registry: &mut EntityRegistry) -> &mut Collection<Self>;
}

macro_rules! registry {
    ($( $field:ident : $ty:ident ),* $(,)?) => {
        /// In-memory store of every entity generated during one run.
        ///
        /// It is the only source of foreign keys while generating: a phase
        /// reads parent ids from here and pushes its own entities back.
        #[derive(Debug, Clone, Default)]
        pub struct EntityRegistry {
            $( $field: Collection<$ty>, )*
        }

        $(
        impl Registered for $ty {
            fn collection(registry: &EntityRegistry) -> &Collection<Self> {
                &registry.$field
            }

            fn collection_mut(registry: &mut EntityRegistry) -> &mut Collection<Self> {
                &mut registry.$field
            }
        }
        )*

        impl EntityRegistry {
            /// Rows of one kind, in insertion order.
            pub fn record_set(&self, kind: EntityKind) -> RecordSet {
                match kind {
                    $( EntityKind::$ty => RecordSet::from_records(self.$field.iter()), )*
                }
            }

            /// Number of entities stored for `kind`.
            pub fn count(&self, kind: EntityKind) -> usize {
                match kind {
                    $( EntityKind::$ty => self.$field.len(), )*
                }
            }
        }
    };
}

registry! {
    identities: Identity,
    profiles: Profile,
    categories: Category,
    organizations: Organization,
    instructors: Instructor,
    learners: Learner,
    courses: Course,
    chapters: Chapter,
    lessons: Lesson,
    assessments: Assessment,
    assessment_questions: AssessmentQuestion,
    assignments: Assignment,
    live_sessions: LiveSession,
    course_instructor_links: CourseInstructorLink,
    enrollments: Enrollment,
    lesson_progress: LessonProgress,
    live_session_enrollments: LiveSessionEnrollment,
    reviews: Review,
    payments: Payment,
    assessment_results: AssessmentResult,
    assignment_submissions: AssignmentSubmission,
    notifications: Notification,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and stores a finalized entity.
    ///
    /// A duplicate id leaves the stored entity untouched and returns
    /// [`RegistryError::DuplicateId`]; callers fetch the existing one with
    /// [`EntityRegistry::get`].
    pub fn put<T: Registered>(&mut self, entity: T) -> Result<&T, RegistryError> {
        entity.validate()?;
        T::collection_mut(self).push(entity)
    }

    pub fn get<T: Registered>(&self, id: Uuid) -> Result<&T, RegistryError> {
        T::collection(self)
            .get(id)
            .ok_or(RegistryError::NotFound { kind: T::KIND, id })
    }

    /// Mutable access for the few repairs the generator performs on stored entities.
    pub fn get_mut<T: Registered>(&mut self, id: Uuid) -> Result<&mut T, RegistryError> {
        T::collection_mut(self)
            .get_mut(id)
            .ok_or(RegistryError::NotFound { kind: T::KIND, id })
    }

    pub fn contains<T: Registered>(&self, id: Uuid) -> bool {
        T::collection(self).contains(id)
    }

    pub fn get_all_ids<T: Registered>(&self) -> Vec<Uuid> {
        T::collection(self).ids()
    }

    pub fn all<T: Registered>(&self) -> &Collection<T> {
        T::collection(self)
    }

    /// Every kind's rows in load order.
    pub fn record_sets(&self) -> Vec<RecordSet> {
        EntityKind::LOAD_ORDER
            .iter()
            .map(|kind| self.record_set(*kind))
            .collect()
    }

    pub fn total(&self) -> usize {
        EntityKind::LOAD_ORDER.iter().map(|kind| self.count(*kind)).sum()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn category(name: &str) -> Category {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            slug: name.to_lowercase(),
            is_active: true,
            sort_order: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn ids_keep_insertion_order() {
        let mut registry = EntityRegistry::new();
        let first = category("first");
        let second = category("second");
        let expected = vec![first.id, second.id];
        registry.put(first).unwrap();
        registry.put(second).unwrap();
        assert_eq!(registry.get_all_ids::<Category>(), expected);
    }

    #[test]
    fn duplicate_id_keeps_the_original() {
        let mut registry = EntityRegistry::new();
        let original = category("original");
        let mut clash = category("clash");
        clash.id = original.id;
        registry.put(original.clone()).unwrap();

        let err = registry.put(clash).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId { kind: EntityKind::Category, .. }));
        assert_eq!(registry.get::<Category>(original.id).unwrap().name, "original");
        assert_eq!(registry.count(EntityKind::Category), 1);
    }

    #[test]
    fn missing_id_is_not_found() {
        let registry = EntityRegistry::new();
        let err = registry.get::<Category>(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
    }

    #[test]
    fn record_sets_follow_load_order() {
        let registry = EntityRegistry::new();
        let kinds: Vec<EntityKind> = registry.record_sets().iter().map(|set| set.kind).collect();
        assert_eq!(kinds, EntityKind::LOAD_ORDER.to_vec());
    }
}
