//! One module per group of related phases.

pub mod assessments;
pub mod catalog;
pub mod enrollment;
pub mod live;
pub mod notifications;
pub mod people;

use std::collections::{HashMap, HashSet};

use tracing::debug;
use uuid::Uuid;

use lmseed_core::EntityKind;
use lmseed_core::entities::{Course, Instructor, LiveSession};

use crate::context::GenerationContext;
use crate::errors::GenerationError;
use crate::pipeline::Phase;
use crate::synth::pick;

/// Picks an instructor for `center_id`, preferring one already employed there.
///
/// Without a local instructor one is borrowed from another organization and
/// moved to `center_id`. Instructors not yet teaching a course or live
/// session are borrowed first so earlier references keep their organization.
/// Once every instructor teaches somewhere, a borrowed instructor's earlier
/// courses and sessions keep pointing at them while their organization
/// changes; the references stay valid but may cross organizations.
pub(crate) fn instructor_for(
    ctx: &mut GenerationContext,
    phase: Phase,
    center_id: Uuid,
) -> Result<Uuid, GenerationError> {
    let local: Vec<Uuid> = ctx
        .registry
        .all::<Instructor>()
        .iter()
        .filter(|instructor| instructor.coaching_center_id == center_id)
        .map(|instructor| instructor.id)
        .collect();
    if !local.is_empty() {
        return Ok(*pick(&mut ctx.rng, &local));
    }

    let everyone = ctx.registry.get_all_ids::<Instructor>();
    if everyone.is_empty() {
        return Err(GenerationError::InsufficientPrerequisites {
            phase,
            missing: vec![EntityKind::Instructor],
        });
    }
    let teaching: HashSet<Uuid> = ctx
        .registry
        .all::<Course>()
        .iter()
        .map(|course| course.primary_teacher_id)
        .chain(ctx.registry.all::<LiveSession>().iter().map(|session| session.primary_teacher_id))
        .collect();
    let idle: Vec<Uuid> = everyone.iter().copied().filter(|id| !teaching.contains(id)).collect();
    let chosen = if idle.is_empty() {
        *pick(&mut ctx.rng, &everyone)
    } else {
        *pick(&mut ctx.rng, &idle)
    };
    let instructor = ctx.registry.get_mut::<Instructor>(chosen)?;
    debug!(
        instructor = %chosen,
        from = %instructor.coaching_center_id,
        to = %center_id,
        "reassigning instructor to organization"
    );
    instructor.coaching_center_id = center_id;
    Ok(chosen)
}

/// Groups child ids by a parent key, keeping insertion order within a group.
pub(crate) fn group_by<'a, T: 'a>(
    items: impl IntoIterator<Item = &'a T>,
    key: impl Fn(&T) -> Uuid,
    id: impl Fn(&T) -> Uuid,
) -> HashMap<Uuid, Vec<Uuid>> {
    let mut groups: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for item in items {
        groups.entry(key(item)).or_default().push(id(item));
    }
    groups
}
