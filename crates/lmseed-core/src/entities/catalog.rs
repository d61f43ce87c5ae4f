use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::value::{SqlValue, ToSqlValue};

/// Role of an instructor on a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructorRole {
    PrimaryInstructor,
    CoInstructor,
}

impl InstructorRole {
    pub fn as_str(self) -> &'static str {
        match self {
            InstructorRole::PrimaryInstructor => "primary_instructor",
            InstructorRole::CoInstructor => "co_instructor",
        }
    }
}

impl ToSqlValue for InstructorRole {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Text(Some(self.as_str().to_string()))
    }
}

entity! {
    pub struct Category as Category {
        pub id: Uuid,
        pub name: String,
        pub description: String,
        pub slug: String,
        pub is_active: bool,
        pub sort_order: i32,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

entity! {
    /// A course offered by an organization.
    ///
    /// `total_lessons` and `total_chapters` are informational and are not
    /// kept in sync with the generated children.
    pub struct Course as Course checked by crate::validation::check_course {
        pub id: Uuid,
        pub coaching_center_id: Uuid,
        pub category_id: Option<Uuid>,
        pub primary_teacher_id: Uuid,
        pub title: String,
        pub slug: String,
        pub description: String,
        pub short_description: String,
        pub thumbnail_url: String,
        pub trailer_video_url: String,
        pub course_content_overview: String,
        pub what_you_learn: Vec<String>,
        pub course_includes: Value,
        pub target_audience: Vec<String>,
        pub prerequisites: Vec<String>,
        pub learning_outcomes: Vec<String>,
        pub level: String,
        pub language: String,
        pub tags: Vec<String>,
        pub price: f64,
        pub original_price: Option<f64>,
        pub currency: String,
        pub duration_hours: f64,
        pub total_lessons: i32,
        pub total_chapters: i32,
        pub total_assignments: i32,
        pub total_quizzes: i32,
        pub max_enrollments: Option<i32>,
        pub enrollment_start_date: DateTime<Utc>,
        pub enrollment_deadline: DateTime<Utc>,
        pub course_start_date: DateTime<Utc>,
        pub course_end_date: Option<DateTime<Utc>>,
        pub is_published: bool,
        pub is_featured: bool,
        pub is_archived: bool,
        pub publish_date: Option<DateTime<Utc>>,
        pub enrollment_count: i32,
        pub completed_count: i32,
        pub rating: f64,
        pub total_reviews: i32,
        pub completion_rate: f64,
        pub view_count: i32,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
        pub last_updated: DateTime<Utc>,
        pub published_at: Option<DateTime<Utc>>,
    }
}

entity! {
    pub struct Chapter as Chapter {
        pub id: Uuid,
        pub course_id: Uuid,
        pub title: String,
        pub description: String,
        pub chapter_number: i32,
        pub duration_minutes: i32,
        pub total_lessons: i32,
        pub learning_objectives: Vec<String>,
        pub is_published: bool,
        pub is_free: bool,
        pub sort_order: i32,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

entity! {
    /// A lesson inside a chapter. `video_duration` is set only for video lessons.
    pub struct Lesson as Lesson checked by crate::validation::check_lesson {
        pub id: Uuid,
        pub chapter_id: Uuid,
        pub course_id: Uuid,
        pub title: String,
        pub description: String,
        pub lesson_number: i32,
        pub lesson_type: String,
        pub content_url: Option<String>,
        pub video_duration: Option<i32>,
        pub transcript: Option<String>,
        pub notes: String,
        pub attachments: Value,
        pub resources: Value,
        pub is_published: bool,
        pub is_free: bool,
        pub is_downloadable: bool,
        pub requires_completion: bool,
        pub view_count: i32,
        pub completion_count: i32,
        pub completion_rate: f64,
        pub average_watch_time: i32,
        pub sort_order: i32,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

entity! {
    /// Join between a course and one of its instructors.
    pub struct CourseInstructorLink as CourseInstructorLink
        checked by crate::validation::check_course_instructor_link
    {
        pub id: Uuid,
        pub course_id: Uuid,
        pub teacher_id: Uuid,
        pub role: InstructorRole,
        pub is_primary: bool,
        pub permissions: Value,
        pub joined_at: DateTime<Utc>,
        pub created_at: DateTime<Utc>,
    }
}
