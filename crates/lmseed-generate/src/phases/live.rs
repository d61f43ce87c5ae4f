use chrono::TimeDelta;
use rand::seq::IndexedRandom;
use serde_json::json;

use lmseed_core::EntityKind;
use lmseed_core::entities::{Course, Learner, LiveSession, LiveSessionEnrollment, Organization};

use crate::context::GenerationContext;
use crate::errors::GenerationError;
use crate::faker::Faker;
use crate::phases::{group_by, instructor_for};
use crate::pipeline::Phase;
use crate::synth::{
    SAMPLE_PDF_URL, SAMPLE_VIDEO_URLS, coin, int, maybe, money, percentage, pick, pick_string, weighted_string,
};

const PLATFORMS: &[&str] = &["zoom", "meet", "teams", "jitsi"];

/// Sessions draw between this many learners and [`MAX_ATTENDEES`].
const MIN_ATTENDEES: usize = 10;
const MAX_ATTENDEES: usize = 50;

pub fn live_sessions(ctx: &mut GenerationContext) -> Result<(), GenerationError> {
    ctx.require(Phase::LiveSessions, &[EntityKind::Organization, EntityKind::Instructor])?;
    let center_ids = ctx.registry.get_all_ids::<Organization>();
    let courses_by_center = group_by(
        ctx.registry.all::<Course>(),
        |course| course.coaching_center_id,
        |course| course.id,
    );
    let timeline = ctx.timeline;
    let now = timeline.now();

    for index in 0..ctx.counts.live_sessions {
        let id = ctx.new_id();
        let center_id = *pick(&mut ctx.rng, &center_ids);
        let teacher_id = instructor_for(ctx, Phase::LiveSessions, center_id)?;
        let rng = &mut ctx.rng;

        let course_id = match courses_by_center.get(&center_id) {
            Some(courses) if coin(rng) => Some(*pick(rng, courses)),
            _ => None,
        };
        let scheduled_start = timeline.days(rng, 1, 30);
        let scheduled_end = scheduled_start + TimeDelta::hours(i64::from(int(rng, 1, 3)));
        let objectives = int(rng, 3, 5) as usize;

        let session = LiveSession {
            id,
            coaching_center_id: center_id,
            course_id,
            chapter_id: None,
            primary_teacher_id: teacher_id,
            title: format!("Live Class: {}", Faker::catch_phrase(rng)),
            description: Faker::text(rng, 500),
            agenda: Faker::text(rng, 300),
            learning_objectives: Faker::sentences(rng, objectives),
            scheduled_start,
            scheduled_end,
            actual_start: None,
            actual_end: None,
            timezone: "Asia/Kolkata".to_string(),
            max_participants: int(rng, 50, 200),
            current_participants: 0,
            auto_record: coin(rng),
            allow_chat: true,
            allow_qa: true,
            allow_screen_sharing: coin(rng),
            require_approval: coin(rng),
            meeting_platform: pick_string(rng, PLATFORMS),
            meeting_url: Faker::url(rng),
            meeting_id: int(rng, 100_000_000, 999_999_999).to_string(),
            meeting_password: int(rng, 100_000, 999_999).to_string(),
            dial_in_numbers: json!(["+91-80-XXXX-XXXX", "+91-22-XXXX-XXXX"]),
            price: money(rng, 0.0, 500.0),
            currency: "INR".to_string(),
            thumbnail_url: format!("https://picsum.photos/400/300?random={index}"),
            presentation_url: maybe(rng, |rng| pick_string(rng, SAMPLE_VIDEO_URLS)),
            resources: json!([{"title": "Class Notes", "url": SAMPLE_PDF_URL, "type": "pdf"}]),
            status: weighted_string(rng, &[("scheduled", 6), ("completed", 3), ("cancelled", 1)]),
            cancellation_reason: maybe(rng, Faker::sentence),
            recording_url: maybe(rng, |rng| pick_string(rng, SAMPLE_VIDEO_URLS)),
            recording_duration_minutes: maybe(rng, |rng| int(rng, 60, 180)),
            recording_size_mb: maybe(rng, |rng| money(rng, 100.0, 1000.0)),
            recording_available_until: maybe(rng, |rng| timeline.days(rng, 60, 365)),
            total_registered: int(rng, 20, 150),
            total_attended: int(rng, 15, 120),
            average_attendance_duration_minutes: money(rng, 45.0, 120.0),
            engagement_score: money(rng, 0.6, 1.0),
            average_rating: money(rng, 4.0, 5.0),
            total_feedback_count: int(rng, 5, 50),
            created_at: now,
            updated_at: now,
        };
        ctx.insert(session)?;
    }
    Ok(())
}

pub fn live_session_enrollments(ctx: &mut GenerationContext) -> Result<(), GenerationError> {
    ctx.require(Phase::LiveSessionEnrollments, &[EntityKind::LiveSession, EntityKind::Learner])?;
    let learner_ids = ctx.registry.get_all_ids::<Learner>();
    let sessions: Vec<_> = ctx
        .registry
        .all::<LiveSession>()
        .iter()
        .map(|session| (session.id, session.scheduled_start, session.scheduled_end))
        .collect();
    let timeline = ctx.timeline;
    let now = timeline.now();

    for (session_id, start, end) in sessions {
        let attendees = if learner_ids.len() < MIN_ATTENDEES {
            learner_ids.len()
        } else {
            int(
                &mut ctx.rng,
                MIN_ATTENDEES as i32,
                learner_ids.len().min(MAX_ATTENDEES) as i32,
            ) as usize
        };
        let chosen: Vec<_> = learner_ids
            .choose_multiple(&mut ctx.rng, attendees)
            .copied()
            .collect();

        for student_id in chosen {
            let id = ctx.new_id();
            let rng = &mut ctx.rng;
            let attended = coin(rng);
            let rated = attended && coin(rng);
            let gave_feedback = attended && coin(rng);

            let enrollment = LiveSessionEnrollment {
                id,
                student_id,
                live_class_id: session_id,
                enrolled_at: timeline.days(rng, -30, 0),
                enrollment_source: pick_string(rng, &["direct", "course", "invitation"]),
                joined_at: attended.then(|| start + TimeDelta::minutes(i64::from(int(rng, -5, 15)))),
                left_at: attended.then(|| end - TimeDelta::minutes(i64::from(int(rng, 0, 30)))),
                attendance_duration_minutes: if attended { int(rng, 30, 120) } else { 0 },
                attended,
                attendance_percentage: if attended { percentage(rng, 70.0, 100.0) } else { 0.0 },
                questions_asked: if attended { int(rng, 0, 5) } else { 0 },
                chat_messages_sent: if attended { int(rng, 0, 10) } else { 0 },
                polls_participated: if attended { int(rng, 0, 3) } else { 0 },
                engagement_score: if attended { money(rng, 0.6, 1.0) } else { 0.0 },
                connection_quality: attended.then(|| pick_string(rng, &["poor", "fair", "good", "excellent"])),
                device_type: attended.then(|| pick_string(rng, &["desktop", "mobile", "tablet"])),
                browser_info: attended
                    .then(|| pick_string(rng, &["Chrome 91", "Firefox 89", "Safari 14", "Edge 91"])),
                session_rating: rated.then(|| int(rng, 4, 5)),
                feedback_text: gave_feedback.then(|| Faker::text(rng, 200)),
                feedback_submitted_at: gave_feedback.then_some(end),
                status: if attended {
                    "attended".to_string()
                } else {
                    pick_string(rng, &["missed", "cancelled"])
                },
                created_at: now,
                updated_at: now,
            };
            ctx.insert(enrollment)?;
        }
    }
    Ok(())
}
