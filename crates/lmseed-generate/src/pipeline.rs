use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use lmseed_core::{EntityKind, EntityRegistry, GenerationCounts};

use crate::context::GenerationContext;
use crate::errors::GenerationError;
use crate::model::{GenerationReport, PhaseReport, PhaseStatus};
use crate::phases;

/// One step of the dependency-ordered generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Organizations,
    Instructors,
    Learners,
    Categories,
    Courses,
    ChaptersAndLessons,
    Assessments,
    Assignments,
    LiveSessions,
    CourseInstructorLinks,
    Enrollments,
    LessonProgress,
    LiveSessionEnrollments,
    Reviews,
    Payments,
    AssessmentResults,
    AssignmentSubmissions,
    Notifications,
}

impl Phase {
    /// Every phase only reads kinds produced by phases before it.
    pub const ORDER: [Phase; 18] = [
        Phase::Organizations,
        Phase::Instructors,
        Phase::Learners,
        Phase::Categories,
        Phase::Courses,
        Phase::ChaptersAndLessons,
        Phase::Assessments,
        Phase::Assignments,
        Phase::LiveSessions,
        Phase::CourseInstructorLinks,
        Phase::Enrollments,
        Phase::LessonProgress,
        Phase::LiveSessionEnrollments,
        Phase::Reviews,
        Phase::Payments,
        Phase::AssessmentResults,
        Phase::AssignmentSubmissions,
        Phase::Notifications,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Organizations => "organizations",
            Phase::Instructors => "instructors",
            Phase::Learners => "learners",
            Phase::Categories => "categories",
            Phase::Courses => "courses",
            Phase::ChaptersAndLessons => "chapters_and_lessons",
            Phase::Assessments => "assessments",
            Phase::Assignments => "assignments",
            Phase::LiveSessions => "live_sessions",
            Phase::CourseInstructorLinks => "course_instructor_links",
            Phase::Enrollments => "enrollments",
            Phase::LessonProgress => "lesson_progress",
            Phase::LiveSessionEnrollments => "live_session_enrollments",
            Phase::Reviews => "reviews",
            Phase::Payments => "payments",
            Phase::AssessmentResults => "assessment_results",
            Phase::AssignmentSubmissions => "assignment_submissions",
            Phase::Notifications => "notifications",
        }
    }

    fn run(self, ctx: &mut GenerationContext) -> Result<(), GenerationError> {
        match self {
            Phase::Organizations => phases::people::organizations(ctx),
            Phase::Instructors => phases::people::instructors(ctx),
            Phase::Learners => phases::people::learners(ctx),
            Phase::Categories => phases::catalog::categories(ctx),
            Phase::Courses => phases::catalog::courses(ctx),
            Phase::ChaptersAndLessons => phases::catalog::chapters_and_lessons(ctx),
            Phase::Assessments => phases::assessments::assessments(ctx),
            Phase::Assignments => phases::assessments::assignments(ctx),
            Phase::LiveSessions => phases::live::live_sessions(ctx),
            Phase::CourseInstructorLinks => phases::catalog::course_instructor_links(ctx),
            Phase::Enrollments => phases::enrollment::enrollments(ctx),
            Phase::LessonProgress => phases::enrollment::lesson_progress(ctx),
            Phase::LiveSessionEnrollments => phases::live::live_session_enrollments(ctx),
            Phase::Reviews => phases::enrollment::reviews(ctx),
            Phase::Payments => phases::enrollment::payments(ctx),
            Phase::AssessmentResults => phases::assessments::assessment_results(ctx),
            Phase::AssignmentSubmissions => phases::assessments::assignment_submissions(ctx),
            Phase::Notifications => phases::notifications::notifications(ctx),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a run produced, ready for loading.
pub struct GeneratedDataset {
    pub registry: EntityRegistry,
    pub report: GenerationReport,
}

/// Runs every phase in [`Phase::ORDER`] against a fresh registry.
#[derive(Debug, Clone)]
pub struct GenerationPipeline {
    counts: GenerationCounts,
    seed: u64,
    now: DateTime<Utc>,
}

impl GenerationPipeline {
    pub fn new(counts: GenerationCounts, seed: u64, now: DateTime<Utc>) -> Result<Self, GenerationError> {
        counts.validate()?;
        Ok(Self { counts, seed, now })
    }

    /// No phase failure escapes: each is logged, recorded in the report,
    /// and the next phase runs against whatever the registry holds.
    pub fn run(&self) -> GeneratedDataset {
        let mut ctx = GenerationContext::new(self.counts.clone(), self.seed, self.now);
        let mut report = GenerationReport::new(self.seed, self.now);
        info!(seed = self.seed, counts = ?self.counts, "generating dataset");

        for phase in Phase::ORDER {
            report.phases.push(run_phase(&mut ctx, phase));
        }

        let registry = ctx.into_registry();
        report.totals = EntityKind::LOAD_ORDER
            .iter()
            .map(|kind| (*kind, registry.count(*kind)))
            .collect();
        report.total_records = registry.total();
        info!(total_records = report.total_records, "dataset generated");

        GeneratedDataset { registry, report }
    }
}

fn run_phase(ctx: &mut GenerationContext, phase: Phase) -> PhaseReport {
    let before = snapshot(&ctx.registry);
    let started = Instant::now();
    info!(%phase, "phase started");

    let status = match phase.run(ctx) {
        Ok(()) => PhaseStatus::Completed,
        Err(err @ GenerationError::InsufficientPrerequisites { .. }) => {
            warn!(%phase, error = %err, "phase skipped");
            PhaseStatus::Skipped {
                reason: err.to_string(),
            }
        }
        Err(err) => {
            error!(%phase, error = %err, severity = ?err.severity(), "phase failed");
            PhaseStatus::Failed {
                error: err.to_string(),
            }
        }
    };

    let after = snapshot(&ctx.registry);
    let produced: BTreeMap<EntityKind, usize> = after
        .into_iter()
        .filter_map(|(kind, count)| {
            let delta = count - before.get(&kind).copied().unwrap_or(0);
            (delta > 0).then_some((kind, delta))
        })
        .collect();
    for (kind, count) in &produced {
        info!(%phase, %kind, count, "generated");
    }

    PhaseReport {
        phase,
        status,
        produced,
        duration_ms: started.elapsed().as_millis() as u64,
    }
}

fn snapshot(registry: &EntityRegistry) -> BTreeMap<EntityKind, usize> {
    EntityKind::LOAD_ORDER
        .iter()
        .map(|kind| (*kind, registry.count(*kind)))
        .collect()
}
