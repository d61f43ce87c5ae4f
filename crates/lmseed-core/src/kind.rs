use std::fmt;

use serde::Serialize;

/// Every entity type the seeder produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Identity,
    Profile,
    Category,
    Organization,
    Instructor,
    Learner,
    Course,
    Chapter,
    Lesson,
    Assessment,
    AssessmentQuestion,
    Assignment,
    LiveSession,
    CourseInstructorLink,
    Enrollment,
    LessonProgress,
    LiveSessionEnrollment,
    Review,
    Payment,
    AssessmentResult,
    AssignmentSubmission,
    Notification,
}

impl EntityKind {
    /// Persistence order: every table appears after the tables it references.
    pub const LOAD_ORDER: [EntityKind; 22] = [
        EntityKind::Identity,
        EntityKind::Profile,
        EntityKind::Category,
        EntityKind::Organization,
        EntityKind::Instructor,
        EntityKind::Learner,
        EntityKind::Course,
        EntityKind::Chapter,
        EntityKind::Lesson,
        EntityKind::Assessment,
        EntityKind::AssessmentQuestion,
        EntityKind::Assignment,
        EntityKind::LiveSession,
        EntityKind::CourseInstructorLink,
        EntityKind::Enrollment,
        EntityKind::LessonProgress,
        EntityKind::LiveSessionEnrollment,
        EntityKind::Review,
        EntityKind::Payment,
        EntityKind::AssessmentResult,
        EntityKind::AssignmentSubmission,
        EntityKind::Notification,
    ];

    /// Logical table name, before any store-specific alias is applied.
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Identity => "auth_users",
            EntityKind::Profile => "user_profiles",
            EntityKind::Category => "course_categories",
            EntityKind::Organization => "coaching_centers",
            EntityKind::Instructor => "teachers",
            EntityKind::Learner => "students",
            EntityKind::Course => "courses",
            EntityKind::Chapter => "chapters",
            EntityKind::Lesson => "lessons",
            EntityKind::Assessment => "tests",
            EntityKind::AssessmentQuestion => "test_questions",
            EntityKind::Assignment => "assignments",
            EntityKind::LiveSession => "live_classes",
            EntityKind::CourseInstructorLink => "course_teachers",
            EntityKind::Enrollment => "course_enrollments",
            EntityKind::LessonProgress => "lesson_progress",
            EntityKind::LiveSessionEnrollment => "live_class_enrollments",
            EntityKind::Review => "reviews",
            EntityKind::Payment => "payments",
            EntityKind::AssessmentResult => "test_results",
            EntityKind::AssignmentSubmission => "assignment_submissions",
            EntityKind::Notification => "notifications",
        }
    }

    /// Profiles are reconciled against rows an external trigger may have created.
    pub fn is_trigger_materialized(self) -> bool {
        matches!(self, EntityKind::Profile)
    }

    /// Foreign-key columns of this table and the kind each one points at.
    ///
    /// Audit columns (`approved_by`, `graded_by`, ...) and polymorphic
    /// references are not listed.
    pub fn references(self) -> &'static [(&'static str, EntityKind)] {
        use EntityKind::*;
        match self {
            Identity | Category => &[],
            Profile => &[("id", Identity)],
            Organization | Learner | Notification => &[("user_id", Profile)],
            Instructor => &[("user_id", Profile), ("coaching_center_id", Organization)],
            Course => &[
                ("coaching_center_id", Organization),
                ("category_id", Category),
                ("primary_teacher_id", Instructor),
            ],
            Chapter => &[("course_id", Course)],
            Lesson => &[("chapter_id", Chapter), ("course_id", Course)],
            Assessment => &[
                ("course_id", Course),
                ("chapter_id", Chapter),
                ("lesson_id", Lesson),
                ("coaching_center_id", Organization),
                ("teacher_id", Instructor),
            ],
            AssessmentQuestion => &[("test_id", Assessment)],
            Assignment => &[("course_id", Course), ("chapter_id", Chapter), ("teacher_id", Instructor)],
            LiveSession => &[
                ("coaching_center_id", Organization),
                ("course_id", Course),
                ("chapter_id", Chapter),
                ("primary_teacher_id", Instructor),
            ],
            CourseInstructorLink => &[("course_id", Course), ("teacher_id", Instructor)],
            Enrollment => &[
                ("student_id", Learner),
                ("course_id", Course),
                ("current_chapter_id", Chapter),
                ("current_lesson_id", Lesson),
            ],
            LessonProgress => &[("student_id", Learner), ("lesson_id", Lesson), ("course_id", Course)],
            LiveSessionEnrollment => &[("student_id", Learner), ("live_class_id", LiveSession)],
            Review => &[
                ("student_id", Learner),
                ("course_id", Course),
                ("teacher_id", Instructor),
                ("live_class_id", LiveSession),
                ("coaching_center_id", Organization),
            ],
            Payment => &[("student_id", Learner), ("course_id", Course), ("live_class_id", LiveSession)],
            AssessmentResult => &[("test_id", Assessment), ("student_id", Learner)],
            AssignmentSubmission => &[("assignment_id", Assignment), ("student_id", Learner)],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Identity => "identity",
            EntityKind::Profile => "profile",
            EntityKind::Category => "category",
            EntityKind::Organization => "organization",
            EntityKind::Instructor => "instructor",
            EntityKind::Learner => "learner",
            EntityKind::Course => "course",
            EntityKind::Chapter => "chapter",
            EntityKind::Lesson => "lesson",
            EntityKind::Assessment => "assessment",
            EntityKind::AssessmentQuestion => "assessment_question",
            EntityKind::Assignment => "assignment",
            EntityKind::LiveSession => "live_session",
            EntityKind::CourseInstructorLink => "course_instructor_link",
            EntityKind::Enrollment => "enrollment",
            EntityKind::LessonProgress => "lesson_progress",
            EntityKind::LiveSessionEnrollment => "live_session_enrollment",
            EntityKind::Review => "review",
            EntityKind::Payment => "payment",
            EntityKind::AssessmentResult => "assessment_result",
            EntityKind::AssignmentSubmission => "assignment_submission",
            EntityKind::Notification => "notification",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn load_order_lists_every_table_once() {
        let tables: BTreeSet<&str> = EntityKind::LOAD_ORDER.iter().map(|k| k.table()).collect();
        assert_eq!(tables.len(), EntityKind::LOAD_ORDER.len());
    }

    #[test]
    fn identities_load_before_profiles() {
        let position = |kind| EntityKind::LOAD_ORDER.iter().position(|k| *k == kind);
        assert!(position(EntityKind::Identity) < position(EntityKind::Profile));
        assert!(position(EntityKind::Enrollment) < position(EntityKind::LessonProgress));
    }

    #[test]
    fn referenced_tables_load_first() {
        let position = |kind| EntityKind::LOAD_ORDER.iter().position(|k| *k == kind);
        for kind in EntityKind::LOAD_ORDER {
            for (column, target) in kind.references() {
                assert!(position(*target) < position(kind), "{kind}.{column} -> {target}");
            }
        }
    }
}
