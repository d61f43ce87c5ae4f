//! Sample login accounts exported after a successful seed.

use serde::Serialize;
use uuid::Uuid;

use lmseed_core::EntityRegistry;
use lmseed_core::entities::{Instructor, Learner, Organization, Profile, UserType};

const ORGANIZATION_SAMPLES: usize = 3;
const INSTRUCTOR_SAMPLES: usize = 5;
const LEARNER_SAMPLES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleAccount {
    pub role: String,
    pub user_type: UserType,
    pub display_name: String,
    pub email: String,
    /// Absent for the admin, which is provisioned by hand.
    pub user_id: Option<Uuid>,
    pub password: String,
    /// Center name, teacher title or student code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// The admin account plus the first few organizations, instructors and
/// learners of `registry`.
pub fn sample_accounts(registry: &EntityRegistry, password: &str) -> Vec<SampleAccount> {
    let mut accounts = vec![SampleAccount {
        role: "Admin".to_string(),
        user_type: UserType::Admin,
        display_name: "System Administrator".to_string(),
        email: "admin@lms.com".to_string(),
        user_id: None,
        password: password.to_string(),
        detail: None,
    }];

    let mut push = |role: &str, user_id: Uuid, detail: String| {
        if let Ok(profile) = registry.get::<Profile>(user_id) {
            accounts.push(SampleAccount {
                role: role.to_string(),
                user_type: profile.user_type,
                display_name: profile.display_name(),
                email: profile.email.clone(),
                user_id: Some(user_id),
                password: password.to_string(),
                detail: Some(detail),
            });
        }
    };

    for organization in registry.all::<Organization>().iter().take(ORGANIZATION_SAMPLES) {
        push("Coaching Center", organization.user_id, organization.center_name.clone());
    }
    for instructor in registry.all::<Instructor>().iter().take(INSTRUCTOR_SAMPLES) {
        push("Teacher", instructor.user_id, instructor.title.clone());
    }
    for learner in registry.all::<Learner>().iter().take(LEARNER_SAMPLES) {
        push("Student", learner.user_id, learner.student_id.clone());
    }
    accounts
}
