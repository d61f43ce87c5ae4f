//! Typed entity records, one struct per seeded table.
//!
//! Field names double as column names, so a field rename is a schema change.

mod activity;
mod assessment;
mod catalog;
mod people;

pub use activity::{
    Enrollment, LessonProgress, LiveSession, LiveSessionEnrollment, Notification, Payment,
    PaymentStatus, Review,
};
pub use assessment::{Assessment, AssessmentQuestion, AssessmentResult, Assignment, AssignmentSubmission};
pub use catalog::{Category, Chapter, Course, CourseInstructorLink, InstructorRole, Lesson};
pub use people::{Identity, Instructor, Learner, Organization, Profile, UserType};
