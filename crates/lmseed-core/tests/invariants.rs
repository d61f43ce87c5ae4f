use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use lmseed_core::entities::{AssessmentResult, Course, LessonProgress};
use lmseed_core::{EntityKind, EntityRegistry, RegistryError, Severity};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

fn course(price: f64, original_price: Option<f64>) -> Course {
    let now = now();
    Course {
        id: Uuid::new_v4(),
        coaching_center_id: Uuid::new_v4(),
        category_id: None,
        primary_teacher_id: Uuid::new_v4(),
        title: "Physics Fundamentals - Complete Course".to_string(),
        slug: "physics-fundamentals-complete-course-001".to_string(),
        description: String::new(),
        short_description: String::new(),
        thumbnail_url: String::new(),
        trailer_video_url: String::new(),
        course_content_overview: String::new(),
        what_you_learn: Vec::new(),
        course_includes: json!({}),
        target_audience: Vec::new(),
        prerequisites: Vec::new(),
        learning_outcomes: Vec::new(),
        level: "beginner".to_string(),
        language: "en".to_string(),
        tags: Vec::new(),
        price,
        original_price,
        currency: "INR".to_string(),
        duration_hours: 40.0,
        total_lessons: 0,
        total_chapters: 0,
        total_assignments: 0,
        total_quizzes: 0,
        max_enrollments: None,
        enrollment_start_date: now,
        enrollment_deadline: now,
        course_start_date: now,
        course_end_date: None,
        is_published: true,
        is_featured: false,
        is_archived: false,
        publish_date: None,
        enrollment_count: 0,
        completed_count: 0,
        rating: 4.5,
        total_reviews: 0,
        completion_rate: 80.0,
        view_count: 0,
        created_at: now,
        updated_at: now,
        last_updated: now,
        published_at: None,
    }
}

fn result(correct: i32, incorrect: i32, skipped: i32, total: i32) -> AssessmentResult {
    let now = now();
    AssessmentResult {
        id: Uuid::new_v4(),
        test_id: Uuid::new_v4(),
        student_id: Uuid::new_v4(),
        attempt_number: 1,
        started_at: now,
        completed_at: now,
        submitted_at: now,
        total_questions: total,
        questions_attempted: correct + incorrect + skipped,
        correct_answers: correct,
        incorrect_answers: incorrect,
        skipped_questions: skipped,
        score: f64::from(correct),
        total_marks: total,
        passed: false,
        grade: "B".to_string(),
        time_taken_minutes: 45,
        time_limit_minutes: 60,
        extra_time_used: 0,
        answers: json!({}),
        question_wise_analysis: json!({}),
        is_submitted: true,
        is_flagged: false,
        flag_reason: None,
        is_proctored: false,
        proctoring_data: json!({}),
        rank_in_test: None,
        percentile: 70.0,
        created_at: now,
        updated_at: now,
    }
}

fn progress(watch_time: i32, duration: i32, overall: f64, is_completed: bool) -> LessonProgress {
    let now = now();
    LessonProgress {
        id: Uuid::new_v4(),
        student_id: Uuid::new_v4(),
        lesson_id: Uuid::new_v4(),
        course_id: Uuid::new_v4(),
        started_at: now,
        completed_at: None,
        last_accessed_at: now,
        watch_time_seconds: watch_time,
        total_video_duration_seconds: duration,
        last_video_position_seconds: 0,
        video_completion_percentage: overall,
        reading_progress_percentage: overall,
        reading_time_seconds: 120,
        overall_progress_percentage: overall,
        is_completed,
        completion_criteria_met: is_completed,
        total_visits: 1,
        total_time_spent_seconds: watch_time + 60,
        engagement_score: 0.8,
        student_notes: None,
        bookmarks: json!([]),
        is_bookmarked: false,
        focus_time_seconds: watch_time,
        distraction_count: 0,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn discounted_course_is_accepted() {
    let mut registry = EntityRegistry::new();
    registry.put(course(1499.5, Some(1999.0))).expect("valid course");
    assert_eq!(registry.count(EntityKind::Course), 1);
}

#[test]
fn price_above_original_price_is_rejected() {
    let mut registry = EntityRegistry::new();
    let err = registry.put(course(2500.0, Some(1999.0))).unwrap_err();
    assert!(matches!(err, RegistryError::Invariant(ref v) if v.kind == EntityKind::Course));
    assert_eq!(err.severity(), Severity::Phase);
    assert_eq!(registry.count(EntityKind::Course), 0);
}

#[test]
fn result_counts_must_cover_every_question() {
    let mut registry = EntityRegistry::new();
    registry.put(result(6, 3, 1, 10)).expect("complete result");
    assert!(registry.put(result(6, 3, 0, 10)).is_err());
}

#[test]
fn watch_time_is_capped_by_duration_with_floor() {
    let mut registry = EntityRegistry::new();
    registry.put(progress(300, 300, 50.0, false)).expect("full watch");
    registry.put(progress(30, 10, 50.0, false)).expect("floor applies to short videos");
    assert!(registry.put(progress(301, 300, 50.0, false)).is_err());
}

#[test]
fn completion_flag_tracks_threshold() {
    let mut registry = EntityRegistry::new();
    registry.put(progress(100, 600, 80.0, true)).expect("completed at threshold");
    assert!(registry.put(progress(100, 600, 79.99, true)).is_err());
    assert!(registry.put(progress(100, 600, 95.0, false)).is_err());
}
