use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use lmseed_core::entities::{
    Assessment, AssessmentResult, Assignment, AssignmentSubmission, Course, CourseInstructorLink, Enrollment,
    Identity, Instructor, Learner, Lesson, LessonProgress, LiveSession, Organization, Payment, PaymentStatus, Profile, Review,
};
use lmseed_core::{EntityKind, EntityRegistry, GenerationCounts};
use lmseed_generate::{GeneratedDataset, GenerationError, GenerationPipeline, Phase, PhaseStatus};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap()
}

fn small_counts() -> GenerationCounts {
    GenerationCounts {
        organizations: 2,
        instructors: 4,
        learners: 10,
        courses: 3,
        chapters_per_course: 2,
        lessons_per_chapter: 2,
        assessments_per_course: 2,
        assignments_per_course: 1,
        live_sessions: 2,
        enrollment_fraction: 0.5,
        review_fraction: 0.3,
    }
}

fn generate(counts: GenerationCounts, seed: u64) -> GeneratedDataset {
    GenerationPipeline::new(counts, seed, now())
        .expect("valid counts")
        .run()
}

fn enrolled_pairs(registry: &EntityRegistry) -> HashSet<(Uuid, Uuid)> {
    registry
        .all::<Enrollment>()
        .iter()
        .map(|enrollment| (enrollment.student_id, enrollment.course_id))
        .collect()
}

#[test]
fn small_run_completes_every_phase() {
    let dataset = generate(small_counts(), 7);
    for report in &dataset.report.phases {
        assert_eq!(report.status, PhaseStatus::Completed, "phase {}", report.phase);
    }
    assert_eq!(dataset.report.phases.len(), Phase::ORDER.len());
    assert_eq!(dataset.report.total_records, dataset.registry.total());
}

#[test]
fn enrollment_total_matches_fraction() {
    let dataset = generate(small_counts(), 7);
    let registry = &dataset.registry;
    assert_eq!(registry.count(EntityKind::Enrollment), 15);

    let pairs = enrolled_pairs(registry);
    assert_eq!(pairs.len(), 15, "one enrollment per (learner, course)");
    for (student_id, course_id) in &pairs {
        assert!(registry.contains::<Learner>(*student_id));
        assert!(registry.contains::<Course>(*course_id));
    }
    for learner in registry.all::<Learner>() {
        assert!(pairs.iter().any(|(student_id, _)| *student_id == learner.id));
    }
}

#[test]
fn people_share_ids_with_identities() {
    let dataset = generate(small_counts(), 11);
    let registry = &dataset.registry;
    assert_eq!(registry.count(EntityKind::Profile), 2 + 4 + 10);
    assert_eq!(registry.count(EntityKind::Identity), registry.count(EntityKind::Profile));
    for profile in registry.all::<Profile>() {
        let identity = registry.get::<Identity>(profile.id).expect("identity for profile");
        assert_eq!(identity.email, profile.email);
    }
    let emails: HashSet<&str> = registry.all::<Profile>().iter().map(|p| p.email.as_str()).collect();
    assert_eq!(emails.len(), registry.count(EntityKind::Profile));

    for organization in registry.all::<Organization>() {
        assert!(registry.contains::<Profile>(organization.user_id));
    }
    for instructor in registry.all::<Instructor>() {
        assert!(registry.contains::<Organization>(instructor.coaching_center_id));
    }
}

#[test]
fn courses_reference_local_instructors() {
    let counts = GenerationCounts {
        live_sessions: 0,
        ..small_counts()
    };
    let dataset = generate(counts, 5);
    let registry = &dataset.registry;
    for course in registry.all::<Course>() {
        let teacher = registry.get::<Instructor>(course.primary_teacher_id).expect("primary teacher");
        assert_eq!(teacher.coaching_center_id, course.coaching_center_id);
        if let Some(original) = course.original_price {
            assert!(course.price <= original);
        }
        let primaries = registry
            .all::<CourseInstructorLink>()
            .iter()
            .filter(|link| link.course_id == course.id && link.is_primary)
            .count();
        assert_eq!(primaries, 1);
    }
    let lessons = registry.count(EntityKind::Lesson);
    assert_eq!(lessons, 3 * 2 * 2);
}

#[test]
fn borrowed_instructors_leave_no_dangling_references() {
    let counts = GenerationCounts {
        organizations: 5,
        instructors: 2,
        courses: 6,
        live_sessions: 4,
        ..small_counts()
    };
    for seed in 0..20 {
        let dataset = generate(counts.clone(), seed);
        let registry = &dataset.registry;
        assert_eq!(registry.count(EntityKind::Course), 6, "seed {seed}");
        assert_eq!(registry.count(EntityKind::LiveSession), 4, "seed {seed}");

        for instructor in registry.all::<Instructor>() {
            assert!(registry.contains::<Organization>(instructor.coaching_center_id));
        }
        for course in registry.all::<Course>() {
            assert!(registry.contains::<Instructor>(course.primary_teacher_id), "seed {seed}");
            assert!(registry.contains::<Organization>(course.coaching_center_id));
        }
        for session in registry.all::<LiveSession>() {
            assert!(registry.contains::<Instructor>(session.primary_teacher_id), "seed {seed}");
            assert!(registry.contains::<Organization>(session.coaching_center_id));
        }
        for link in registry.all::<CourseInstructorLink>() {
            assert!(registry.contains::<Instructor>(link.teacher_id));
            assert!(registry.contains::<Course>(link.course_id));
        }
    }
}

#[test]
fn derived_records_never_orphan_enrollments() {
    let dataset = generate(small_counts(), 23);
    let registry = &dataset.registry;
    let pairs = enrolled_pairs(registry);

    for progress in registry.all::<LessonProgress>() {
        assert!(pairs.contains(&(progress.student_id, progress.course_id)));
        let lesson = registry.get::<Lesson>(progress.lesson_id).expect("lesson");
        assert_eq!(lesson.course_id, progress.course_id);
        assert!(progress.watch_time_seconds <= progress.total_video_duration_seconds.max(30));
        assert_eq!(progress.is_completed, progress.overall_progress_percentage >= 80.0);
    }
    for result in registry.all::<AssessmentResult>() {
        let assessment = registry.get::<Assessment>(result.test_id).expect("assessment");
        assert!(pairs.contains(&(result.student_id, assessment.course_id)));
        assert_eq!(
            result.questions_attempted,
            result.correct_answers + result.incorrect_answers + result.skipped_questions
        );
        assert!(result.score <= f64::from(result.total_marks));
    }
    for submission in registry.all::<AssignmentSubmission>() {
        let assignment = registry.get::<Assignment>(submission.assignment_id).expect("assignment");
        assert!(pairs.contains(&(submission.student_id, assignment.course_id)));
    }
    for review in registry.all::<Review>() {
        let course_id = review.course_id.expect("course review");
        assert!(pairs.contains(&(review.student_id, course_id)));
    }
    let paid: HashSet<(Uuid, Uuid)> = registry
        .all::<Enrollment>()
        .iter()
        .filter(|enrollment| enrollment.payment_status == PaymentStatus::Paid)
        .map(|enrollment| (enrollment.student_id, enrollment.course_id))
        .collect();
    assert_eq!(registry.count(EntityKind::Payment), paid.len());
    for payment in registry.all::<Payment>() {
        let course_id = payment.course_id.expect("course payment");
        assert!(paid.contains(&(payment.student_id, course_id)));
        assert!(payment.discount_amount <= payment.subtotal);
    }
}

#[test]
fn missing_organizations_skip_dependent_phases() {
    let counts = GenerationCounts {
        organizations: 0,
        ..small_counts()
    };
    let dataset = generate(counts, 3);
    let report = &dataset.report;

    let status = |phase| report.phase(phase).map(|r| r.status.clone()).expect("phase reported");
    assert!(matches!(status(Phase::Instructors), PhaseStatus::Skipped { .. }));
    assert!(matches!(status(Phase::Courses), PhaseStatus::Skipped { .. }));
    assert_eq!(status(Phase::Learners), PhaseStatus::Completed);
    assert_eq!(report.failed_phases().count(), 0);

    let registry = &dataset.registry;
    assert_eq!(registry.count(EntityKind::Instructor), 0);
    assert_eq!(registry.count(EntityKind::Course), 0);
    assert_eq!(registry.count(EntityKind::Enrollment), 0);
    assert_eq!(registry.count(EntityKind::Learner), 10);
}

#[test]
fn same_seed_reproduces_dataset() {
    let first = generate(small_counts(), 99);
    let second = generate(small_counts(), 99);
    assert_eq!(first.report.totals, second.report.totals);
    assert_eq!(
        first.registry.get_all_ids::<Enrollment>(),
        second.registry.get_all_ids::<Enrollment>()
    );
    let emails = |dataset: &GeneratedDataset| -> Vec<String> {
        dataset.registry.all::<Profile>().iter().map(|p| p.email.clone()).collect()
    };
    assert_eq!(emails(&first), emails(&second));

    let other = generate(small_counts(), 100);
    assert_ne!(
        first.registry.get_all_ids::<Profile>(),
        other.registry.get_all_ids::<Profile>()
    );
}

#[test]
fn fractions_outside_unit_interval_are_rejected() {
    let counts = GenerationCounts {
        review_fraction: 1.5,
        ..small_counts()
    };
    let err = GenerationPipeline::new(counts, 1, now()).unwrap_err();
    assert!(matches!(err, GenerationError::InvalidCounts(_)));
}
