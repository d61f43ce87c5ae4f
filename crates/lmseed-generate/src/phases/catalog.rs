use serde_json::json;
use uuid::Uuid;

use lmseed_core::EntityKind;
use lmseed_core::entities::{
    Category, Chapter, Course, CourseInstructorLink, Instructor, InstructorRole, Lesson, Organization,
};

use crate::context::GenerationContext;
use crate::errors::GenerationError;
use crate::faker::{Faker, slug};
use crate::phases::{group_by, instructor_for};
use crate::pipeline::Phase;
use crate::synth::{
    SAMPLE_PDF_URL, SAMPLE_VIDEO_URLS, chance, coin, discounted_price, int, maybe, money, pick, pick_string,
    round1, uniform,
};

const CATEGORIES: &[(&str, &str)] = &[
    ("JEE Preparation", "Joint Entrance Examination preparation courses"),
    ("NEET Preparation", "Medical entrance exam preparation"),
    ("Class 10 CBSE", "CBSE Class 10 board preparation"),
    ("Class 12 Science", "Class 12 Science stream courses"),
    ("Competitive Exams", "Various competitive exam preparations"),
    ("Skill Development", "Professional skill development courses"),
    ("Language Learning", "Language proficiency courses"),
];

const SUBJECTS: &[&str] = &[
    "Advanced Mathematics",
    "Physics Fundamentals",
    "Chemistry Mastery",
    "Biology Essentials",
    "Computer Science",
    "English Literature",
    "Data Science",
    "Machine Learning",
    "Web Development",
    "Digital Marketing",
];

const LESSON_TYPES: &[&str] = &["video", "text", "quiz", "assignment", "interactive", "document"];

pub fn categories(ctx: &mut GenerationContext) -> Result<(), GenerationError> {
    let now = ctx.now();
    for (position, (name, description)) in CATEGORIES.iter().enumerate() {
        let category = Category {
            id: ctx.new_id(),
            name: name.to_string(),
            description: description.to_string(),
            slug: slug(name),
            is_active: true,
            sort_order: position as i32 + 1,
            created_at: now,
            updated_at: now,
        };
        ctx.insert(category)?;
    }
    Ok(())
}

pub fn courses(ctx: &mut GenerationContext) -> Result<(), GenerationError> {
    ctx.require(Phase::Courses, &[EntityKind::Organization, EntityKind::Instructor])?;
    let center_ids = ctx.registry.get_all_ids::<Organization>();
    let category_ids = ctx.registry.get_all_ids::<Category>();
    let timeline = ctx.timeline;
    let now = timeline.now();

    for index in 0..ctx.counts.courses {
        let id = ctx.new_id();
        let center_id = *pick(&mut ctx.rng, &center_ids);
        let teacher_id = instructor_for(ctx, Phase::Courses, center_id)?;
        let rng = &mut ctx.rng;

        let subject = *pick(rng, SUBJECTS);
        let topic = subject.to_lowercase();
        let title = format!("{subject} - Complete Course");
        let original_price = money(rng, 1999.0, 12999.0);
        let (price, original_price) = discounted_price(rng, original_price);

        let course = Course {
            id,
            coaching_center_id: center_id,
            category_id: if category_ids.is_empty() {
                None
            } else {
                Some(*pick(rng, &category_ids))
            },
            primary_teacher_id: teacher_id,
            slug: format!("{}-{:03}", slug(&title), index + 1),
            title,
            description: format!(
                "Comprehensive {topic} course designed to build strong fundamentals and advanced concepts. \
                 Perfect for students preparing for competitive exams and academic excellence."
            ),
            short_description: format!("Master {topic} with expert guidance and practical examples."),
            thumbnail_url: format!("https://picsum.photos/400/300?random={}", int(rng, 1, 1000)),
            trailer_video_url: pick_string(rng, SAMPLE_VIDEO_URLS),
            course_content_overview: format!(
                "This course covers all essential topics in {topic} with hands-on exercises and real-world applications."
            ),
            what_you_learn: vec![
                format!("Core concepts of {topic}"),
                "Problem-solving techniques".to_string(),
                "Practical applications".to_string(),
                "Exam preparation strategies".to_string(),
            ],
            course_includes: json!({
                "video_hours": int(rng, 15, 80),
                "articles": int(rng, 10, 50),
                "exercises": int(rng, 20, 100),
                "quizzes": int(rng, 5, 20),
                "assignments": int(rng, 3, 15),
                "certificate": true,
                "lifetime_access": coin(rng),
                "mobile_access": true,
                "downloadable_resources": coin(rng),
            }),
            target_audience: vec![
                "Students preparing for competitive exams".to_string(),
                "Graduates seeking to strengthen their knowledge".to_string(),
                "Professionals looking to upgrade skills".to_string(),
            ],
            prerequisites: vec![
                "Basic understanding of the subject".to_string(),
                "High school level mathematics".to_string(),
            ],
            learning_outcomes: vec![
                format!("Master fundamental concepts of {topic}"),
                "Solve complex problems with confidence".to_string(),
                "Apply knowledge to real-world scenarios".to_string(),
            ],
            level: pick_string(rng, &["beginner", "intermediate", "advanced", "expert"]),
            language: "en".to_string(),
            tags: ["comprehensive", "hands-on", "practical", "exam-focused"]
                .iter()
                .map(|tag| tag.to_string())
                .collect(),
            price,
            original_price,
            currency: "INR".to_string(),
            duration_hours: round1(uniform(rng, 25.0, 120.0)),
            total_lessons: 0,
            total_chapters: 0,
            total_assignments: 0,
            total_quizzes: 0,
            max_enrollments: *pick(rng, &[None, Some(50), Some(100), Some(200), Some(500)]),
            enrollment_start_date: timeline.days(rng, -30, 30),
            enrollment_deadline: timeline.days(rng, 31, 120),
            course_start_date: timeline.days(rng, 1, 60),
            course_end_date: maybe(rng, |rng| timeline.days(rng, 180, 365)),
            is_published: chance(rng, 0.8),
            is_featured: chance(rng, 0.3),
            is_archived: false,
            publish_date: maybe(rng, |rng| timeline.days(rng, -60, 0)),
            enrollment_count: int(rng, 10, 200),
            completed_count: int(rng, 5, 100),
            rating: money(rng, 3.8, 5.0),
            total_reviews: int(rng, 8, 80),
            completion_rate: money(rng, 70.0, 95.0),
            view_count: int(rng, 500, 10_000),
            created_at: now,
            updated_at: now,
            last_updated: now,
            published_at: maybe(rng, |rng| timeline.days(rng, -45, 0)),
        };
        ctx.insert(course)?;
    }
    Ok(())
}

pub fn chapters_and_lessons(ctx: &mut GenerationContext) -> Result<(), GenerationError> {
    ctx.require(Phase::ChaptersAndLessons, &[EntityKind::Course])?;
    let course_ids = ctx.registry.get_all_ids::<Course>();
    let chapters_per_course = ctx.counts.chapters_per_course as i32;
    let lessons_per_chapter = ctx.counts.lessons_per_chapter as i32;
    let now = ctx.now();

    for course_id in course_ids {
        for chapter_number in 1..=chapters_per_course {
            let chapter_id = ctx.new_id();
            let rng = &mut ctx.rng;
            let objectives = int(rng, 3, 5) as usize;
            let chapter = Chapter {
                id: chapter_id,
                course_id,
                title: format!("Chapter {chapter_number}: {}", Faker::catch_phrase(rng)),
                description: Faker::text(rng, 300),
                chapter_number,
                duration_minutes: int(rng, 180, 480),
                total_lessons: lessons_per_chapter,
                learning_objectives: Faker::sentences(rng, objectives),
                is_published: true,
                is_free: chapter_number == 1,
                sort_order: chapter_number,
                created_at: now,
                updated_at: now,
            };
            ctx.insert(chapter)?;

            for lesson_number in 1..=lessons_per_chapter {
                let lesson_id = ctx.new_id();
                let lesson = lesson(ctx, course_id, chapter_id, lesson_id, chapter_number, lesson_number);
                ctx.insert(lesson)?;
            }
        }
    }
    Ok(())
}

fn lesson(
    ctx: &mut GenerationContext,
    course_id: Uuid,
    chapter_id: Uuid,
    lesson_id: Uuid,
    chapter_number: i32,
    lesson_number: i32,
) -> Lesson {
    let now = ctx.now();
    let rng = &mut ctx.rng;
    let lesson_type = *pick(rng, LESSON_TYPES);
    let is_video = lesson_type == "video";
    let video_duration = is_video.then(|| int(rng, 300, 2400));
    let content_url = match lesson_type {
        "video" => Some(pick_string(rng, SAMPLE_VIDEO_URLS)),
        "document" => Some(SAMPLE_PDF_URL.to_string()),
        "interactive" => Some(format!("https://interactive-content.com/lesson-{lesson_id}")),
        _ => None,
    };
    let average_watch_time = match video_duration {
        Some(duration) => int(rng, 180, duration.min(1800)),
        None => 0,
    };

    Lesson {
        id: lesson_id,
        chapter_id,
        course_id,
        title: format!("Lesson {lesson_number}: {}", Faker::catch_phrase(rng)),
        description: Faker::text(rng, 250),
        lesson_number,
        lesson_type: lesson_type.to_string(),
        content_url,
        video_duration,
        transcript: if is_video { Some(Faker::text(rng, 1000)) } else { None },
        notes: Faker::text(rng, 500),
        attachments: json!([{
            "name": format!("Resource_{lesson_number}.pdf"),
            "url": SAMPLE_PDF_URL,
            "size": int(rng, 100, 5000),
            "type": "pdf",
        }]),
        resources: json!([
            {"title": "Additional Reading", "url": SAMPLE_PDF_URL, "type": "external_link"},
            {"title": "Practice Exercise", "url": SAMPLE_PDF_URL, "type": "exercise"},
        ]),
        is_published: true,
        is_free: lesson_number <= 2 && chapter_number == 1,
        is_downloadable: coin(rng),
        requires_completion: coin(rng),
        view_count: int(rng, 50, 1000),
        completion_count: int(rng, 20, 500),
        completion_rate: money(rng, 75.0, 98.0),
        average_watch_time,
        sort_order: lesson_number,
        created_at: now,
        updated_at: now,
    }
}

pub fn course_instructor_links(ctx: &mut GenerationContext) -> Result<(), GenerationError> {
    ctx.require(Phase::CourseInstructorLinks, &[EntityKind::Course])?;
    let courses: Vec<_> = ctx
        .registry
        .all::<Course>()
        .iter()
        .map(|course| (course.id, course.coaching_center_id, course.primary_teacher_id, course.created_at))
        .collect();
    let by_center = group_by(
        ctx.registry.all::<Instructor>(),
        |instructor| instructor.coaching_center_id,
        |instructor| instructor.id,
    );
    let timeline = ctx.timeline;

    for (course_id, center_id, primary_id, created_at) in courses {
        let primary = CourseInstructorLink {
            id: ctx.new_id(),
            course_id,
            teacher_id: primary_id,
            role: InstructorRole::PrimaryInstructor,
            is_primary: true,
            permissions: json!({
                "can_edit_content": true,
                "can_grade": true,
                "can_manage_students": true,
                "can_conduct_live_classes": true,
            }),
            joined_at: created_at,
            created_at,
        };
        ctx.insert(primary)?;

        if !coin(&mut ctx.rng) {
            continue;
        }
        let colleagues: Vec<Uuid> = by_center
            .get(&center_id)
            .map(|ids| ids.iter().copied().filter(|id| *id != primary_id).collect())
            .unwrap_or_default();
        if colleagues.is_empty() {
            continue;
        }
        let co_instructor = CourseInstructorLink {
            id: ctx.new_id(),
            course_id,
            teacher_id: *pick(&mut ctx.rng, &colleagues),
            role: InstructorRole::CoInstructor,
            is_primary: false,
            permissions: json!({
                "can_edit_content": false,
                "can_grade": true,
                "can_manage_students": false,
                "can_conduct_live_classes": true,
            }),
            joined_at: timeline.since(&mut ctx.rng, created_at),
            created_at: timeline.now(),
        };
        ctx.insert(co_instructor)?;
    }
    Ok(())
}
