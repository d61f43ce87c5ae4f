//! Cross-field invariants checked when an entity enters the registry.

use crate::entities::{
    Assessment, AssessmentResult, Assignment, Course, CourseInstructorLink, Enrollment, InstructorRole,
    Lesson, LessonProgress, LiveSession, Payment, Review,
};
use crate::error::InvariantViolation;
use crate::record::Record;

/// Progress at or above this percentage counts as completed.
pub const COMPLETION_THRESHOLD: f64 = 80.0;

/// Lower bound on watch time, also used as the cap for very short videos.
pub const WATCH_TIME_FLOOR_SECONDS: i32 = 30;

// Monetary and percentage fields are rounded to 2 decimals before comparison.
const TOLERANCE: f64 = 1e-6;

fn violation<R: Record>(record: &R, message: impl Into<String>) -> InvariantViolation {
    InvariantViolation::new(R::KIND, record.id(), message)
}

fn ensure<R: Record>(record: &R, condition: bool, message: impl FnOnce() -> String) -> Result<(), InvariantViolation> {
    if condition {
        Ok(())
    } else {
        Err(violation(record, message()))
    }
}

fn is_percentage(value: f64) -> bool {
    (0.0..=100.0).contains(&value)
}

pub fn check_course(course: &Course) -> Result<(), InvariantViolation> {
    ensure(course, course.price >= 0.0, || format!("negative price {}", course.price))?;
    if let Some(original) = course.original_price {
        ensure(course, course.price <= original + TOLERANCE, || {
            format!("price {} exceeds original price {original}", course.price)
        })?;
    }
    Ok(())
}

pub fn check_lesson(lesson: &Lesson) -> Result<(), InvariantViolation> {
    ensure(lesson, lesson.average_watch_time >= 0, || {
        format!("negative average watch time {}", lesson.average_watch_time)
    })?;
    if let Some(duration) = lesson.video_duration {
        ensure(lesson, lesson.average_watch_time <= duration, || {
            format!(
                "average watch time {} exceeds video duration {duration}",
                lesson.average_watch_time
            )
        })?;
    }
    Ok(())
}

pub fn check_course_instructor_link(link: &CourseInstructorLink) -> Result<(), InvariantViolation> {
    let primary_role = link.role == InstructorRole::PrimaryInstructor;
    ensure(link, link.is_primary == primary_role, || {
        format!("is_primary={} does not match role {}", link.is_primary, link.role.as_str())
    })
}

pub fn check_assessment(assessment: &Assessment) -> Result<(), InvariantViolation> {
    ensure(assessment, assessment.total_questions > 0, || {
        "assessment has no questions".to_string()
    })?;
    ensure(assessment, assessment.total_marks % assessment.total_questions == 0, || {
        format!(
            "total marks {} is not a whole multiple of {} questions",
            assessment.total_marks, assessment.total_questions
        )
    })?;
    ensure(
        assessment,
        assessment.passing_marks >= 0.0 && assessment.passing_marks <= f64::from(assessment.total_marks),
        || {
            format!(
                "passing marks {} outside [0, {}]",
                assessment.passing_marks, assessment.total_marks
            )
        },
    )
}

pub fn check_assignment(assignment: &Assignment) -> Result<(), InvariantViolation> {
    ensure(
        assignment,
        assignment.passing_marks >= 0.0 && assignment.passing_marks <= assignment.total_marks + TOLERANCE,
        || {
            format!(
                "passing marks {} outside [0, {}]",
                assignment.passing_marks, assignment.total_marks
            )
        },
    )
}

pub fn check_assessment_result(result: &AssessmentResult) -> Result<(), InvariantViolation> {
    let answered = result.correct_answers + result.incorrect_answers + result.skipped_questions;
    ensure(result, result.questions_attempted == answered, || {
        format!(
            "attempted {} != correct {} + incorrect {} + skipped {}",
            result.questions_attempted,
            result.correct_answers,
            result.incorrect_answers,
            result.skipped_questions
        )
    })?;
    ensure(result, answered == result.total_questions, || {
        format!("answered {answered} != total questions {}", result.total_questions)
    })?;
    ensure(
        result,
        result.score >= 0.0 && result.score <= f64::from(result.total_marks) + TOLERANCE,
        || format!("score {} outside [0, {}]", result.score, result.total_marks),
    )
}

pub fn check_lesson_progress(progress: &LessonProgress) -> Result<(), InvariantViolation> {
    let cap = progress.total_video_duration_seconds.max(WATCH_TIME_FLOOR_SECONDS);
    ensure(
        progress,
        progress.watch_time_seconds >= 0 && progress.watch_time_seconds <= cap,
        || format!("watch time {} outside [0, {cap}]", progress.watch_time_seconds),
    )?;
    ensure(
        progress,
        progress.last_video_position_seconds <= progress.watch_time_seconds,
        || {
            format!(
                "video position {} beyond watch time {}",
                progress.last_video_position_seconds, progress.watch_time_seconds
            )
        },
    )?;
    for value in [
        progress.video_completion_percentage,
        progress.reading_progress_percentage,
        progress.overall_progress_percentage,
    ] {
        ensure(progress, is_percentage(value), || format!("percentage {value} outside [0, 100]"))?;
    }
    let completed = progress.overall_progress_percentage >= COMPLETION_THRESHOLD;
    ensure(progress, progress.is_completed == completed, || {
        format!(
            "is_completed={} with overall progress {}",
            progress.is_completed, progress.overall_progress_percentage
        )
    })
}

pub fn check_enrollment(enrollment: &Enrollment) -> Result<(), InvariantViolation> {
    ensure(enrollment, is_percentage(enrollment.progress_percentage), || {
        format!("progress {} outside [0, 100]", enrollment.progress_percentage)
    })?;
    let completed = enrollment.progress_percentage >= COMPLETION_THRESHOLD;
    ensure(enrollment, enrollment.completed_at.is_some() == completed, || {
        format!(
            "completion timestamp does not match progress {}",
            enrollment.progress_percentage
        )
    })
}

pub fn check_live_session(session: &LiveSession) -> Result<(), InvariantViolation> {
    ensure(session, session.scheduled_end > session.scheduled_start, || {
        "session ends before it starts".to_string()
    })
}

pub fn check_review(review: &Review) -> Result<(), InvariantViolation> {
    for rating in [
        review.overall_rating,
        review.content_rating,
        review.instructor_rating,
        review.value_rating,
        review.difficulty_rating,
    ] {
        ensure(review, (1.0..=5.0).contains(&rating), || format!("rating {rating} outside [1, 5]"))?;
    }
    ensure(review, is_percentage(review.completed_percentage), || {
        format!("completed percentage {} outside [0, 100]", review.completed_percentage)
    })
}

pub fn check_payment(payment: &Payment) -> Result<(), InvariantViolation> {
    for (name, amount) in [
        ("subtotal", payment.subtotal),
        ("discount", payment.discount_amount),
        ("tax", payment.tax_amount),
        ("processing fee", payment.processing_fee),
        ("total", payment.total_amount),
    ] {
        ensure(payment, amount >= 0.0, || format!("negative {name} {amount}"))?;
    }
    ensure(payment, payment.discount_amount <= payment.subtotal + TOLERANCE, || {
        format!(
            "discount {} exceeds subtotal {}",
            payment.discount_amount, payment.subtotal
        )
    })
}
