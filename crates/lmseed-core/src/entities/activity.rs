use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::value::{SqlValue, ToSqlValue};

/// Payment state of an enrollment. Only `Paid` enrollments produce a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Free,
    Pending,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Free => "free",
            PaymentStatus::Pending => "pending",
        }
    }
}

impl ToSqlValue for PaymentStatus {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Text(Some(self.as_str().to_string()))
    }
}

entity! {
    pub struct LiveSession as LiveSession checked by crate::validation::check_live_session {
        pub id: Uuid,
        pub coaching_center_id: Uuid,
        pub course_id: Option<Uuid>,
        pub chapter_id: Option<Uuid>,
        pub primary_teacher_id: Uuid,
        pub title: String,
        pub description: String,
        pub agenda: String,
        pub learning_objectives: Vec<String>,
        pub scheduled_start: DateTime<Utc>,
        pub scheduled_end: DateTime<Utc>,
        pub actual_start: Option<DateTime<Utc>>,
        pub actual_end: Option<DateTime<Utc>>,
        pub timezone: String,
        pub max_participants: i32,
        pub current_participants: i32,
        pub auto_record: bool,
        pub allow_chat: bool,
        pub allow_qa: bool,
        pub allow_screen_sharing: bool,
        pub require_approval: bool,
        pub meeting_platform: String,
        pub meeting_url: String,
        pub meeting_id: String,
        pub meeting_password: String,
        pub dial_in_numbers: Value,
        pub price: f64,
        pub currency: String,
        pub thumbnail_url: String,
        pub presentation_url: Option<String>,
        pub resources: Value,
        pub status: String,
        pub cancellation_reason: Option<String>,
        pub recording_url: Option<String>,
        pub recording_duration_minutes: Option<i32>,
        pub recording_size_mb: Option<f64>,
        pub recording_available_until: Option<DateTime<Utc>>,
        pub total_registered: i32,
        pub total_attended: i32,
        pub average_attendance_duration_minutes: f64,
        pub engagement_score: f64,
        pub average_rating: f64,
        pub total_feedback_count: i32,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

entity! {
    pub struct LiveSessionEnrollment as LiveSessionEnrollment {
        pub id: Uuid,
        pub student_id: Uuid,
        pub live_class_id: Uuid,
        pub enrolled_at: DateTime<Utc>,
        pub enrollment_source: String,
        pub joined_at: Option<DateTime<Utc>>,
        pub left_at: Option<DateTime<Utc>>,
        pub attendance_duration_minutes: i32,
        pub attended: bool,
        pub attendance_percentage: f64,
        pub questions_asked: i32,
        pub chat_messages_sent: i32,
        pub polls_participated: i32,
        pub engagement_score: f64,
        pub connection_quality: Option<String>,
        pub device_type: Option<String>,
        pub browser_info: Option<String>,
        pub session_rating: Option<i32>,
        pub feedback_text: Option<String>,
        pub feedback_submitted_at: Option<DateTime<Utc>>,
        pub status: String,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

entity! {
    /// A learner's enrollment in a course; unique per (learner, course).
    ///
    /// Progress counters are sampled independently of the course structure.
    pub struct Enrollment as Enrollment checked by crate::validation::check_enrollment {
        pub id: Uuid,
        pub student_id: Uuid,
        pub course_id: Uuid,
        pub enrolled_at: DateTime<Utc>,
        pub enrollment_method: String,
        pub payment_status: PaymentStatus,
        pub progress_percentage: f64,
        pub lessons_completed: i32,
        pub total_lessons_in_course: i32,
        pub chapters_completed: i32,
        pub total_chapters_in_course: i32,
        pub total_time_spent_minutes: i32,
        pub average_session_duration_minutes: f64,
        pub total_sessions: i32,
        pub completed_at: Option<DateTime<Utc>>,
        pub completion_percentage_required: f64,
        pub last_accessed_at: DateTime<Utc>,
        pub access_expires_at: Option<DateTime<Utc>>,
        pub is_active: bool,
        pub current_chapter_id: Option<Uuid>,
        pub current_lesson_id: Option<Uuid>,
        pub bookmarked_lessons: Vec<Uuid>,
        pub notes: Option<String>,
        pub certificate_issued: bool,
        pub certificate_issued_at: Option<DateTime<Utc>>,
        pub certificate_id: Option<String>,
        pub course_rating: Option<i32>,
        pub course_review: Option<String>,
        pub reviewed_at: Option<DateTime<Utc>>,
        pub average_quiz_score: f64,
        pub assignments_submitted: i32,
        pub assignments_graded: i32,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

entity! {
    pub struct LessonProgress as LessonProgress checked by crate::validation::check_lesson_progress {
        pub id: Uuid,
        pub student_id: Uuid,
        pub lesson_id: Uuid,
        pub course_id: Uuid,
        pub started_at: DateTime<Utc>,
        pub completed_at: Option<DateTime<Utc>>,
        pub last_accessed_at: DateTime<Utc>,
        pub watch_time_seconds: i32,
        pub total_video_duration_seconds: i32,
        pub last_video_position_seconds: i32,
        pub video_completion_percentage: f64,
        pub reading_progress_percentage: f64,
        pub reading_time_seconds: i32,
        pub overall_progress_percentage: f64,
        pub is_completed: bool,
        pub completion_criteria_met: bool,
        pub total_visits: i32,
        pub total_time_spent_seconds: i32,
        pub engagement_score: f64,
        pub student_notes: Option<String>,
        pub bookmarks: Value,
        pub is_bookmarked: bool,
        pub focus_time_seconds: i32,
        pub distraction_count: i32,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

entity! {
    pub struct Review as Review checked by crate::validation::check_review {
        pub id: Uuid,
        pub student_id: Uuid,
        pub course_id: Option<Uuid>,
        pub teacher_id: Option<Uuid>,
        pub live_class_id: Option<Uuid>,
        pub coaching_center_id: Option<Uuid>,
        pub review_type: String,
        pub overall_rating: f64,
        pub content_rating: f64,
        pub instructor_rating: f64,
        pub value_rating: f64,
        pub difficulty_rating: f64,
        pub title: String,
        pub review_text: String,
        pub pros: String,
        pub cons: String,
        pub is_verified_purchase: bool,
        pub completed_percentage: f64,
        pub is_published: bool,
        pub is_featured: bool,
        pub moderation_status: String,
        pub moderation_reason: Option<String>,
        pub moderated_by: Option<Uuid>,
        pub moderated_at: Option<DateTime<Utc>>,
        pub helpful_votes: i32,
        pub not_helpful_votes: i32,
        pub helpfulness_score: f64,
        pub report_count: i32,
        pub last_reported_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

entity! {
    pub struct Payment as Payment checked by crate::validation::check_payment {
        pub id: Uuid,
        pub student_id: Uuid,
        pub course_id: Option<Uuid>,
        pub live_class_id: Option<Uuid>,
        pub items: Value,
        pub payment_type: String,
        pub subtotal: f64,
        pub discount_amount: f64,
        pub tax_amount: f64,
        pub processing_fee: f64,
        pub total_amount: f64,
        pub currency: String,
        pub payment_method_id: Option<Uuid>,
        pub payment_gateway: String,
        pub gateway_transaction_id: String,
        pub internal_transaction_id: String,
        pub status: String,
        pub failure_reason: Option<String>,
        pub initiated_at: DateTime<Utc>,
        pub processed_at: DateTime<Utc>,
        pub completed_at: DateTime<Utc>,
        pub refund_amount: f64,
        pub refund_reason: Option<String>,
        pub refunded_at: Option<DateTime<Utc>>,
        pub refunded_by: Option<Uuid>,
        pub coupon_code: Option<String>,
        pub discount_type: Option<String>,
        pub discount_value: f64,
        pub invoice_number: String,
        pub invoice_url: String,
        pub customer_details: Value,
        pub gateway_response: Value,
        pub metadata: Value,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

entity! {
    pub struct Notification as Notification {
        pub id: Uuid,
        pub user_id: Uuid,
        pub title: String,
        pub message: String,
        pub notification_type: String,
        pub reference_id: Option<Uuid>,
        pub reference_type: Option<String>,
        pub channels: Vec<String>,
        pub delivery_status: Value,
        pub priority: String,
        pub is_read: bool,
        pub read_at: Option<DateTime<Utc>>,
        pub scheduled_at: DateTime<Utc>,
        pub sent_at: DateTime<Utc>,
        pub expires_at: Option<DateTime<Utc>>,
        pub category: String,
        pub action_url: Option<String>,
        pub action_label: Option<String>,
        pub metadata: Value,
        pub template_id: Option<Uuid>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}
