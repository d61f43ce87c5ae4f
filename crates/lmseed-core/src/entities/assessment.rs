use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

entity! {
    /// A test attached to a course.
    ///
    /// Every question of a test carries the same marks, so `total_marks` is
    /// always a multiple of `total_questions`.
    pub struct Assessment as Assessment checked by crate::validation::check_assessment {
        pub id: Uuid,
        pub course_id: Uuid,
        pub chapter_id: Option<Uuid>,
        pub lesson_id: Option<Uuid>,
        pub coaching_center_id: Uuid,
        pub teacher_id: Uuid,
        pub title: String,
        pub description: String,
        pub instructions: String,
        pub test_type: String,
        pub difficulty_level: String,
        pub total_questions: i32,
        pub total_marks: i32,
        pub passing_marks: f64,
        pub negative_marking: bool,
        pub negative_marks_per_question: f64,
        pub time_limit_minutes: i32,
        pub extra_time_minutes: i32,
        pub attempts_allowed: i32,
        pub time_between_attempts_hours: i32,
        pub show_results_immediately: bool,
        pub show_correct_answers: bool,
        pub show_explanations: bool,
        pub randomize_questions: bool,
        pub randomize_options: bool,
        pub available_from: DateTime<Utc>,
        pub available_until: DateTime<Utc>,
        pub is_published: bool,
        pub is_proctored: bool,
        pub attempt_count: i32,
        pub average_score: f64,
        pub pass_rate: f64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

entity! {
    pub struct AssessmentQuestion as AssessmentQuestion {
        pub id: Uuid,
        pub test_id: Uuid,
        pub question_text: String,
        pub question_type: String,
        pub options: Value,
        pub correct_answers: Value,
        pub explanation: String,
        pub hints: Vec<String>,
        pub marks: i32,
        pub negative_marks: f64,
        pub difficulty_level: String,
        pub topic: String,
        pub subtopic: String,
        pub tags: Vec<String>,
        pub question_order: i32,
        pub time_limit_seconds: Option<i32>,
        pub attempt_count: i32,
        pub correct_count: i32,
        pub difficulty_score: f64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

entity! {
    pub struct Assignment as Assignment checked by crate::validation::check_assignment {
        pub id: Uuid,
        pub course_id: Uuid,
        pub chapter_id: Option<Uuid>,
        pub teacher_id: Uuid,
        pub title: String,
        pub description: String,
        pub instructions: String,
        pub assignment_type: String,
        pub submission_format: String,
        pub total_marks: f64,
        pub passing_marks: f64,
        pub grading_rubric: Value,
        pub assigned_date: DateTime<Utc>,
        pub due_date: DateTime<Utc>,
        pub late_submission_deadline: DateTime<Utc>,
        pub allow_late_submission: bool,
        pub late_penalty_percentage: f64,
        pub is_group_assignment: bool,
        pub max_group_size: i32,
        pub allow_resubmission: bool,
        pub max_file_size_mb: i32,
        pub allowed_file_types: Vec<String>,
        pub resources: Value,
        pub reference_materials: Value,
        pub sample_submissions: Value,
        pub is_published: bool,
        pub is_archived: bool,
        pub submission_count: i32,
        pub on_time_submissions: i32,
        pub average_grade: f64,
        pub plagiarism_check_enabled: bool,
        pub auto_grade_enabled: bool,
        pub ai_feedback_enabled: bool,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

entity! {
    /// One learner's attempt at an assessment.
    pub struct AssessmentResult as AssessmentResult
        checked by crate::validation::check_assessment_result
    {
        pub id: Uuid,
        pub test_id: Uuid,
        pub student_id: Uuid,
        pub attempt_number: i32,
        pub started_at: DateTime<Utc>,
        pub completed_at: DateTime<Utc>,
        pub submitted_at: DateTime<Utc>,
        pub total_questions: i32,
        pub questions_attempted: i32,
        pub correct_answers: i32,
        pub incorrect_answers: i32,
        pub skipped_questions: i32,
        pub score: f64,
        pub total_marks: i32,
        pub passed: bool,
        pub grade: String,
        pub time_taken_minutes: i32,
        pub time_limit_minutes: i32,
        pub extra_time_used: i32,
        pub answers: Value,
        pub question_wise_analysis: Value,
        pub is_submitted: bool,
        pub is_flagged: bool,
        pub flag_reason: Option<String>,
        pub is_proctored: bool,
        pub proctoring_data: Value,
        pub rank_in_test: Option<i32>,
        pub percentile: f64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

entity! {
    pub struct AssignmentSubmission as AssignmentSubmission {
        pub id: Uuid,
        pub assignment_id: Uuid,
        pub student_id: Uuid,
        pub submission_text: Option<String>,
        pub submission_files: Value,
        pub submission_urls: Value,
        pub attempt_number: i32,
        pub submitted_at: DateTime<Utc>,
        pub is_late: bool,
        pub grade: Option<f64>,
        pub feedback: Option<String>,
        pub detailed_feedback: Value,
        pub graded_at: Option<DateTime<Utc>>,
        pub graded_by: Option<Uuid>,
        pub submission_status: String,
        pub plagiarism_score: Option<f64>,
        pub plagiarism_report: Value,
        pub word_count: i32,
        pub total_file_size_mb: f64,
        pub file_count: i32,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
        pub metadata: Value,
    }
}
