use rand::Rng;
use rand::seq::IndexedRandom;
use serde_json::json;

use lmseed_core::EntityKind;
use lmseed_core::entities::{Instructor, Learner, Organization, UserType};

use crate::context::GenerationContext;
use crate::errors::GenerationError;
use crate::faker::Faker;
use crate::identity::create_person;
use crate::pipeline::Phase;
use crate::synth::{
    chance, coin, int, maybe, money, phone, pick, pick_string, round2, uniform, weighted_string,
};

const SPECIALIZATIONS: &[&str] = &[
    "Mathematics",
    "Physics",
    "Chemistry",
    "Biology",
    "English",
    "Hindi",
    "Computer Science",
    "History",
    "Geography",
    "Economics",
    "Accountancy",
    "Business Studies",
    "Psychology",
    "Sociology",
    "Political Science",
];

const GRADE_LEVELS: &[&str] = &[
    "class_10",
    "class_11_science",
    "class_11_commerce",
    "class_12_science",
    "class_12_commerce",
    "ug_1st_year",
    "ug_2nd_year",
    "btech_1st_year",
    "btech_2nd_year",
    "working_professional",
];

const COMPETITIVE_EXAMS: &[&str] = &["JEE Main", "JEE Advanced", "NEET", "UPSC", "SSC", "Banking", "CAT", "GATE"];

const INTERESTS: &[&str] = &["Science", "Commerce", "Arts", "Technology", "Medicine", "Engineering"];

const LANGUAGES: &[&str] = &["en", "hi", "ta", "te", "bn"];

pub fn organizations(ctx: &mut GenerationContext) -> Result<(), GenerationError> {
    let timeline = ctx.timeline;
    let now = timeline.now();
    let year = timeline.current_year();

    for index in 0..ctx.counts.organizations {
        let owner = create_person(ctx, UserType::CoachingCenter)?;
        let id = ctx.new_id();
        let center_code = format!("CC{year}{:03}", index + 1);
        let rng = &mut ctx.rng;

        let organization = Organization {
            id,
            user_id: owner.id,
            center_name: format!("{} Coaching Center", Faker::company(rng)),
            description: Faker::text(rng, 500),
            website_url: Faker::url(rng),
            logo_url: format!("https://api.dicebear.com/7.x/initials/svg?seed={center_code}"),
            center_code,
            contact_email: owner.email.clone(),
            contact_phone: owner.phone.clone(),
            address: owner.address.clone(),
            registration_number: format!("REG-{year}-{:04}", index + 1),
            tax_id: format!("GST{}", rng.random_range(10_000_000_000u64..=99_999_999_999)),
            approval_status: weighted_string(rng, &[("approved", 8), ("pending", 1), ("rejected", 1)]),
            approved_by: None,
            approved_at: maybe(rng, |rng| timeline.days(rng, -90, 0)),
            rejection_reason: maybe(rng, |rng| Faker::text(rng, 100)),
            subscription_plan: weighted_string(rng, &[("basic", 5), ("premium", 3), ("enterprise", 2)]),
            max_faculty_limit: *pick(rng, &[10, 25, 50, 100]),
            max_courses_limit: *pick(rng, &[50, 100, 250, 500]),
            max_students_limit: *pick(rng, &[1000, 2500, 5000, 10000]),
            is_active: true,
            total_courses: 0,
            total_students: 0,
            total_teachers: 0,
            rating: money(rng, 3.5, 5.0),
            total_reviews: int(rng, 5, 100),
            created_at: now,
            updated_at: now,
        };
        ctx.insert(organization)?;
    }
    Ok(())
}

pub fn instructors(ctx: &mut GenerationContext) -> Result<(), GenerationError> {
    ctx.require(Phase::Instructors, &[EntityKind::Organization])?;
    let center_ids = ctx.registry.get_all_ids::<Organization>();
    let timeline = ctx.timeline;
    let now = timeline.now();
    let year = timeline.current_year();

    for index in 0..ctx.counts.instructors {
        let person = create_person(ctx, UserType::Teacher)?;
        let id = ctx.new_id();
        let rng = &mut ctx.rng;
        let specialization_count = int(rng, 1, 3) as usize;

        let instructor = Instructor {
            id,
            user_id: person.id,
            coaching_center_id: *pick(rng, &center_ids),
            employee_id: format!("EMP{year}{:06}", index + 1),
            title: pick_string(rng, &["Mr.", "Ms.", "Dr.", "Prof."]),
            specializations: SPECIALIZATIONS
                .choose_multiple(rng, specialization_count)
                .map(|s| s.to_string())
                .collect(),
            qualifications: json!([{
                "degree": pick_string(rng, &["B.Ed", "M.Ed", "B.Sc", "M.Sc", "B.A", "M.A", "PhD"]),
                "institution": format!("{} University", Faker::company(rng)),
                "year": int(rng, 2000, 2020),
                "grade": pick_string(rng, &["First Class", "Second Class", "Distinction"]),
            }]),
            experience_years: int(rng, 2, 20),
            bio: Faker::text(rng, 500),
            hourly_rate: money(rng, 500.0, 2000.0),
            rating: money(rng, 3.8, 5.0),
            total_reviews: int(rng, 10, 50),
            total_courses: int(rng, 1, 10),
            total_students_taught: int(rng, 50, 500),
            is_verified: chance(rng, 0.7),
            can_create_courses: true,
            can_conduct_live_classes: true,
            can_grade_assignments: true,
            status: "active".to_string(),
            joined_at: timeline.days(rng, -730, 0),
            created_at: now,
            updated_at: now,
        };
        ctx.insert(instructor)?;
    }
    Ok(())
}

pub fn learners(ctx: &mut GenerationContext) -> Result<(), GenerationError> {
    let timeline = ctx.timeline;
    let now = timeline.now();
    let year = timeline.current_year();

    for index in 0..ctx.counts.learners {
        let person = create_person(ctx, UserType::Student)?;
        let id = ctx.new_id();
        let rng = &mut ctx.rng;
        let current_streak = int(rng, 0, 30);
        let location = &person.address;
        let text_field = |key: &str| {
            location
                .get(key)
                .and_then(|value| value.as_str())
                .unwrap_or_default()
                .to_string()
        };
        let interests = int(rng, 1, 3) as usize;
        let other_languages = int(rng, 1, 2) as usize;
        let exams = int(rng, 1, 3) as usize;

        let learner = Learner {
            id,
            user_id: person.id,
            student_id: format!("STU{year}{:06}", index + 1),
            grade_level: pick_string(rng, GRADE_LEVELS),
            education_board: pick_string(rng, &["cbse", "icse", "state_board", "igcse", "ib", "nios", "other"]),
            primary_interest: pick_string(rng, INTERESTS),
            secondary_interests: INTERESTS
                .choose_multiple(rng, interests)
                .map(|s| s.to_string())
                .collect(),
            state: text_field("state"),
            city: text_field("city"),
            pincode: text_field("pincode"),
            preferred_language: pick_string(rng, LANGUAGES),
            other_languages: LANGUAGES
                .choose_multiple(rng, other_languages)
                .map(|s| s.to_string())
                .collect(),
            school_name: format!(
                "{} {}",
                Faker::company(rng),
                pick(rng, &["School", "High School", "Senior Secondary School"])
            ),
            institution_type: pick_string(rng, &["school", "college", "university", "coaching_center", "self_study"]),
            parent_name: Faker::full_name(rng),
            parent_phone: phone(rng),
            parent_email: Faker::email(rng),
            guardian_relationship: pick_string(rng, &["parent", "guardian", "sibling", "relative", "self"]),
            learning_goals: vec![
                "Crack competitive exams".to_string(),
                "Improve board exam scores".to_string(),
                "Build strong fundamentals".to_string(),
            ],
            preferred_learning_style: pick_string(
                rng,
                &["visual", "auditory", "kinesthetic", "reading_writing", "mixed"],
            ),
            competitive_exams: COMPETITIVE_EXAMS
                .choose_multiple(rng, exams)
                .map(|s| s.to_string())
                .collect(),
            target_exam_year: int(rng, year, year + 3),
            timezone: "Asia/Kolkata".to_string(),
            total_courses_enrolled: 0,
            total_courses_completed: 0,
            total_hours_learned: round2(uniform(rng, 0.0, 500.0)),
            current_streak_days: current_streak,
            longest_streak_days: int(rng, current_streak, current_streak.max(60)),
            total_points: int(rng, 0, 5000),
            level: int(rng, 1, 20),
            badges: json!([{
                "name": pick_string(rng, &["Quick Learner", "Consistent Student", "High Scorer", "Active Participant"]),
                "earned_at": timeline.days(rng, -180, 0).to_rfc3339(),
                "description": "Achievement badge",
            }]),
            achievements: json!({
                "streak_milestones": [7, 14, 30],
                "course_completions": int(rng, 0, 5),
                "perfect_scores": int(rng, 0, 3),
                "certificates_earned": int(rng, 0, 2),
            }),
            daily_study_goal_minutes: *pick(rng, &[30, 60, 90, 120, 180]),
            preferred_study_time: pick_string(
                rng,
                &["early_morning", "morning", "afternoon", "evening", "night", "flexible"],
            ),
            is_active: true,
            is_verified: coin(rng),
            verification_method: maybe(rng, |rng| pick_string(rng, &["email", "phone", "document"])),
            subscription_status: weighted_string(rng, &[("free", 7), ("premium", 3)]),
            subscription_expires_at: maybe(rng, |rng| timeline.days(rng, 30, 365)),
            created_at: now,
            updated_at: now,
            last_login_date: timeline.date(rng, -30, 0),
            last_streak_update_date: timeline.date(rng, -7, 0),
            profile_completed_at: timeline.days(rng, -90, 0),
        };
        ctx.insert(learner)?;
    }
    Ok(())
}
