use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::value::{SqlValue, ToSqlValue};

/// Role tag carried by identities and profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Student,
    Teacher,
    CoachingCenter,
    Admin,
}

impl UserType {
    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Student => "student",
            UserType::Teacher => "teacher",
            UserType::CoachingCenter => "coaching_center",
            UserType::Admin => "admin",
        }
    }
}

impl ToSqlValue for UserType {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Text(Some(self.as_str().to_string()))
    }
}

entity! {
    /// Authentication-side record of a person.
    ///
    /// `raw_user_meta_data` carries the role tag and display name the auth
    /// trigger copies into a partial profile.
    pub struct Identity as Identity {
        pub id: Uuid,
        pub email: String,
        pub encrypted_password: String,
        pub email_confirmed_at: DateTime<Utc>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
        pub role: String,
        pub aud: String,
        pub raw_user_meta_data: Value,
    }
}

entity! {
    /// Business-side record sharing its id with an [`Identity`].
    pub struct Profile as Profile {
        pub id: Uuid,
        pub user_type: UserType,
        pub first_name: String,
        pub last_name: String,
        pub email: String,
        pub phone: String,
        pub avatar_url: String,
        pub date_of_birth: NaiveDate,
        pub gender: String,
        pub address: Value,
        pub is_active: bool,
        pub email_verified: bool,
        pub phone_verified: bool,
        pub onboarding_completed: bool,
        pub preferences: Value,
        pub last_seen: DateTime<Utc>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

impl Profile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

entity! {
    pub struct Organization as Organization {
        pub id: Uuid,
        pub user_id: Uuid,
        pub center_name: String,
        pub center_code: String,
        pub description: String,
        pub website_url: String,
        pub logo_url: String,
        pub contact_email: String,
        pub contact_phone: String,
        pub address: Value,
        pub registration_number: String,
        pub tax_id: String,
        pub approval_status: String,
        pub approved_by: Option<Uuid>,
        pub approved_at: Option<DateTime<Utc>>,
        pub rejection_reason: Option<String>,
        pub subscription_plan: String,
        pub max_faculty_limit: i32,
        pub max_courses_limit: i32,
        pub max_students_limit: i32,
        pub is_active: bool,
        pub total_courses: i32,
        pub total_students: i32,
        pub total_teachers: i32,
        pub rating: f64,
        pub total_reviews: i32,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

entity! {
    /// A teacher employed by one organization.
    ///
    /// `coaching_center_id` may be repaired after creation when a course or
    /// live session falls back to an instructor from another organization.
    pub struct Instructor as Instructor {
        pub id: Uuid,
        pub user_id: Uuid,
        pub coaching_center_id: Uuid,
        pub employee_id: String,
        pub title: String,
        pub specializations: Vec<String>,
        pub qualifications: Value,
        pub experience_years: i32,
        pub bio: String,
        pub hourly_rate: f64,
        pub rating: f64,
        pub total_reviews: i32,
        pub total_courses: i32,
        pub total_students_taught: i32,
        pub is_verified: bool,
        pub can_create_courses: bool,
        pub can_conduct_live_classes: bool,
        pub can_grade_assignments: bool,
        pub status: String,
        pub joined_at: DateTime<Utc>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

entity! {
    /// A student. `student_id` is the human-readable enrolment code, not a key.
    pub struct Learner as Learner {
        pub id: Uuid,
        pub user_id: Uuid,
        pub student_id: String,
        pub grade_level: String,
        pub education_board: String,
        pub primary_interest: String,
        pub secondary_interests: Vec<String>,
        pub state: String,
        pub city: String,
        pub pincode: String,
        pub preferred_language: String,
        pub other_languages: Vec<String>,
        pub school_name: String,
        pub institution_type: String,
        pub parent_name: String,
        pub parent_phone: String,
        pub parent_email: String,
        pub guardian_relationship: String,
        pub learning_goals: Vec<String>,
        pub preferred_learning_style: String,
        pub competitive_exams: Vec<String>,
        pub target_exam_year: i32,
        pub timezone: String,
        pub total_courses_enrolled: i32,
        pub total_courses_completed: i32,
        pub total_hours_learned: f64,
        pub current_streak_days: i32,
        pub longest_streak_days: i32,
        pub total_points: i32,
        pub level: i32,
        pub badges: Value,
        pub achievements: Value,
        pub daily_study_goal_minutes: i32,
        pub preferred_study_time: String,
        pub is_active: bool,
        pub is_verified: bool,
        pub verification_method: Option<String>,
        pub subscription_status: String,
        pub subscription_expires_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
        pub last_login_date: NaiveDate,
        pub last_streak_update_date: NaiveDate,
        pub profile_completed_at: DateTime<Utc>,
    }
}
