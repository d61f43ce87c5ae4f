use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use lmseed_core::EntityKind;
use lmseed_core::entities::{
    Chapter, Course, Enrollment, Learner, Lesson, LessonProgress, Payment, PaymentStatus, Review,
};
use lmseed_core::validation::{COMPLETION_THRESHOLD, WATCH_TIME_FLOOR_SECONDS};

use crate::context::GenerationContext;
use crate::errors::GenerationError;
use crate::faker::Faker;
use crate::phases::group_by;
use crate::pipeline::Phase;
use crate::synth::{
    SAMPLE_PDF_URL, chance, coin, int, maybe, money, new_id, percentage, phone, pick, pick_string, round1,
    round2, uniform, weighted_string,
};

/// Video length assumed for lessons without one.
const DEFAULT_LESSON_SECONDS: i32 = 600;
const TAX_RATE: f64 = 0.18;
const PROCESSING_FEE_RATE: f64 = 0.025;
const MAX_DISCOUNT_RATE: f64 = 0.2;

/// Number of enrollments for `learners` learners and `courses` courses.
///
/// `round(courses * learners * fraction)`, raised so every learner gets at
/// least one course and capped at one enrollment per pair.
pub fn enrollment_total(learners: usize, courses: usize, fraction: f64) -> usize {
    let pairs = learners * courses;
    let target = (pairs as f64 * fraction).round() as usize;
    target.clamp(learners.min(pairs), pairs)
}

/// Splits `total` enrollments across `learners` as evenly as possible.
fn per_learner_quotas<R: Rng + ?Sized>(rng: &mut R, learners: &[Uuid], total: usize) -> Vec<(Uuid, usize)> {
    if learners.is_empty() {
        return Vec::new();
    }
    let base = total / learners.len();
    let mut extra = total % learners.len();
    let mut order: Vec<Uuid> = learners.to_vec();
    order.shuffle(rng);
    let mut bonus: HashMap<Uuid, usize> = HashMap::new();
    for id in order {
        if extra == 0 {
            break;
        }
        bonus.insert(id, 1);
        extra -= 1;
    }
    learners
        .iter()
        .map(|id| (*id, base + bonus.get(id).copied().unwrap_or(0)))
        .collect()
}

pub fn enrollments(ctx: &mut GenerationContext) -> Result<(), GenerationError> {
    ctx.require(Phase::Enrollments, &[EntityKind::Learner, EntityKind::Course])?;
    let learner_ids = ctx.registry.get_all_ids::<Learner>();
    let course_ids = ctx.registry.get_all_ids::<Course>();
    let lessons_per_course = count_by_course(ctx.registry.all::<Lesson>().iter().map(|lesson| lesson.course_id));
    let chapters_per_course = count_by_course(ctx.registry.all::<Chapter>().iter().map(|chapter| chapter.course_id));
    let timeline = ctx.timeline;
    let now = timeline.now();

    let total = enrollment_total(learner_ids.len(), course_ids.len(), ctx.counts.enrollment_fraction);
    debug!(total, learners = learner_ids.len(), courses = course_ids.len(), "enrollment quota");

    for (student_id, quota) in per_learner_quotas(&mut ctx.rng, &learner_ids, total) {
        let chosen: Vec<Uuid> = course_ids.choose_multiple(&mut ctx.rng, quota).copied().collect();
        for course_id in chosen {
            let id = ctx.new_id();
            let total_lessons = lessons_per_course.get(&course_id).copied().unwrap_or(0);
            let total_chapters = chapters_per_course.get(&course_id).copied().unwrap_or(0);
            let rng = &mut ctx.rng;

            let enrolled_at = timeline.days(rng, -90, 0);
            let progress = percentage(rng, 0.0, 100.0);
            let completed = progress >= COMPLETION_THRESHOLD;
            let certified = completed && coin(rng);
            let lessons_completed = (f64::from(total_lessons) * progress / 100.0).floor() as i32;
            let chapters_completed = (f64::from(total_chapters) * progress / 100.0).floor() as i32;
            let rated = coin(rng);

            let enrollment = Enrollment {
                id,
                student_id,
                course_id,
                enrolled_at,
                enrollment_method: pick_string(rng, &["direct", "invitation", "api"]),
                payment_status: *pick(rng, &[PaymentStatus::Paid, PaymentStatus::Free, PaymentStatus::Pending]),
                progress_percentage: progress,
                lessons_completed,
                total_lessons_in_course: total_lessons,
                chapters_completed,
                total_chapters_in_course: total_chapters,
                total_time_spent_minutes: int(rng, 60, 1200),
                average_session_duration_minutes: money(rng, 15.0, 90.0),
                total_sessions: int(rng, 1, 50),
                completed_at: completed.then(|| timeline.since(rng, enrolled_at)),
                completion_percentage_required: COMPLETION_THRESHOLD,
                last_accessed_at: timeline.since(rng, enrolled_at.max(now - TimeDelta::days(7))),
                access_expires_at: maybe(rng, |rng| timeline.days(rng, 30, 365)),
                is_active: true,
                current_chapter_id: None,
                current_lesson_id: None,
                bookmarked_lessons: Vec::new(),
                notes: maybe(rng, |rng| Faker::text(rng, 300)),
                certificate_issued: certified,
                certificate_issued_at: certified.then(|| timeline.since(rng, enrolled_at)),
                certificate_id: certified.then(|| format!("CERT-{}", new_id(rng).simple())),
                course_rating: rated.then(|| int(rng, 1, 5)),
                course_review: rated.then(|| Faker::text(rng, 200)),
                reviewed_at: rated.then(|| timeline.since(rng, enrolled_at)),
                average_quiz_score: money(rng, 60.0, 95.0),
                assignments_submitted: int(rng, 0, 5),
                assignments_graded: int(rng, 0, 5),
                created_at: enrolled_at,
                updated_at: now,
            };
            ctx.insert(enrollment)?;
        }
    }
    Ok(())
}

fn count_by_course(course_ids: impl Iterator<Item = Uuid>) -> HashMap<Uuid, i32> {
    let mut counts = HashMap::new();
    for course_id in course_ids {
        *counts.entry(course_id).or_insert(0) += 1;
    }
    counts
}

/// Enrollment fields the derived phases read.
pub(crate) struct EnrollmentRef {
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
    pub progress: f64,
    pub paid: bool,
}

pub(crate) fn enrollment_refs(ctx: &GenerationContext) -> Vec<EnrollmentRef> {
    ctx.registry
        .all::<Enrollment>()
        .iter()
        .map(|enrollment| EnrollmentRef {
            student_id: enrollment.student_id,
            course_id: enrollment.course_id,
            enrolled_at: enrollment.enrolled_at,
            progress: enrollment.progress_percentage,
            paid: enrollment.payment_status == PaymentStatus::Paid,
        })
        .collect()
}

pub fn lesson_progress(ctx: &mut GenerationContext) -> Result<(), GenerationError> {
    ctx.require(Phase::LessonProgress, &[EntityKind::Enrollment, EntityKind::Lesson])?;
    let by_course = group_by(ctx.registry.all::<Lesson>(), |lesson| lesson.course_id, |lesson| lesson.id);
    let timeline = ctx.timeline;
    let now = timeline.now();

    for enrollment in enrollment_refs(ctx) {
        let Some(lesson_ids) = by_course.get(&enrollment.course_id) else {
            continue;
        };
        let share = uniform(&mut ctx.rng, 0.3, 0.8);
        let amount = (lesson_ids.len() as f64 * share) as usize;
        let tracked: Vec<Uuid> = lesson_ids.choose_multiple(&mut ctx.rng, amount).copied().collect();

        for lesson_id in tracked {
            let duration = ctx
                .registry
                .get::<Lesson>(lesson_id)?
                .video_duration
                .unwrap_or(DEFAULT_LESSON_SECONDS);
            let id = ctx.new_id();
            let rng = &mut ctx.rng;

            let watch_time = int(rng, WATCH_TIME_FLOOR_SECONDS, duration.max(WATCH_TIME_FLOOR_SECONDS));
            let completion = percentage(rng, 0.0, 100.0);
            let completed = completion >= COMPLETION_THRESHOLD;
            let started_at = timeline.since(rng, enrollment.enrolled_at);
            let bookmarks: Vec<i32> = (0..int(rng, 0, 3)).map(|_| int(rng, 30, 300)).collect();

            let progress = LessonProgress {
                id,
                student_id: enrollment.student_id,
                lesson_id,
                course_id: enrollment.course_id,
                started_at,
                completed_at: completed.then(|| timeline.since(rng, started_at)),
                last_accessed_at: timeline.since(rng, started_at),
                watch_time_seconds: watch_time,
                total_video_duration_seconds: duration,
                last_video_position_seconds: int(rng, 0, watch_time),
                video_completion_percentage: completion,
                reading_progress_percentage: completion,
                reading_time_seconds: int(rng, 60, 1800),
                overall_progress_percentage: completion,
                is_completed: completed,
                completion_criteria_met: completed,
                total_visits: int(rng, 1, 5),
                total_time_spent_seconds: watch_time + int(rng, 60, 300),
                engagement_score: money(rng, 0.5, 1.0),
                student_notes: maybe(rng, |rng| Faker::text(rng, 200)),
                bookmarks: json!(bookmarks),
                is_bookmarked: coin(rng),
                focus_time_seconds: int(rng, (f64::from(watch_time) * 0.7) as i32, watch_time),
                distraction_count: int(rng, 0, 5),
                created_at: now,
                updated_at: now,
            };
            ctx.insert(progress)?;
        }
    }
    Ok(())
}

pub fn reviews(ctx: &mut GenerationContext) -> Result<(), GenerationError> {
    ctx.require(Phase::Reviews, &[EntityKind::Enrollment])?;
    let timeline = ctx.timeline;
    let now = timeline.now();
    let fraction = ctx.counts.review_fraction;

    for enrollment in enrollment_refs(ctx) {
        if !chance(&mut ctx.rng, fraction) {
            continue;
        }
        let id = ctx.new_id();
        let rng = &mut ctx.rng;
        let review = Review {
            id,
            student_id: enrollment.student_id,
            course_id: Some(enrollment.course_id),
            teacher_id: None,
            live_class_id: None,
            coaching_center_id: None,
            review_type: "course".to_string(),
            overall_rating: round1(uniform(rng, 3.5, 5.0)),
            content_rating: round1(uniform(rng, 3.0, 5.0)),
            instructor_rating: round1(uniform(rng, 3.0, 5.0)),
            value_rating: round1(uniform(rng, 3.0, 5.0)),
            difficulty_rating: round1(uniform(rng, 2.0, 4.0)),
            title: Faker::catch_phrase(rng),
            review_text: Faker::text(rng, 400),
            pros: Faker::text(rng, 200),
            cons: Faker::text(rng, 200),
            is_verified_purchase: true,
            completed_percentage: enrollment.progress,
            is_published: true,
            is_featured: coin(rng),
            moderation_status: "approved".to_string(),
            moderation_reason: None,
            moderated_by: None,
            moderated_at: None,
            helpful_votes: int(rng, 0, 20),
            not_helpful_votes: int(rng, 0, 5),
            helpfulness_score: money(rng, 0.7, 1.0),
            report_count: 0,
            last_reported_at: None,
            created_at: timeline.since(rng, enrollment.enrolled_at),
            updated_at: now,
        };
        ctx.insert(review)?;
    }
    Ok(())
}

/// One payment per paid enrollment; `total = subtotal - discount + tax`.
pub fn payments(ctx: &mut GenerationContext) -> Result<(), GenerationError> {
    ctx.require(Phase::Payments, &[EntityKind::Enrollment])?;
    let timeline = ctx.timeline;
    let now = timeline.now();
    let year = timeline.current_year();

    for enrollment in enrollment_refs(ctx).into_iter().filter(|enrollment| enrollment.paid) {
        let course = ctx.registry.get::<Course>(enrollment.course_id)?;
        let (price, title) = (course.price, course.title.clone());
        let id = ctx.new_id();
        let rng = &mut ctx.rng;

        let discount = money(rng, 0.0, price * MAX_DISCOUNT_RATE);
        let tax = round2(price * TAX_RATE);
        let status = weighted_string(rng, &[("completed", 8), ("failed", 1), ("refunded", 1)]);
        let total = round2(price - discount + tax);
        let refunded = status == "refunded";
        let processed_at = enrollment.enrolled_at + TimeDelta::minutes(i64::from(int(rng, 1, 10)));

        let payment = Payment {
            id,
            student_id: enrollment.student_id,
            course_id: Some(enrollment.course_id),
            live_class_id: None,
            items: json!([{
                "type": "course",
                "id": enrollment.course_id,
                "name": title,
                "price": price,
            }]),
            payment_type: "course".to_string(),
            subtotal: price,
            discount_amount: discount,
            tax_amount: tax,
            processing_fee: round2(price * PROCESSING_FEE_RATE),
            total_amount: total,
            currency: "INR".to_string(),
            payment_method_id: None,
            payment_gateway: pick_string(rng, &["razorpay", "stripe", "paypal"]),
            gateway_transaction_id: format!("txn_{}", rng.random_range(1_000_000_000u64..=9_999_999_999)),
            internal_transaction_id: format!("int_{}", int(rng, 1_000_000, 9_999_999)),
            failure_reason: (status == "failed").then(|| Faker::sentence(rng)),
            initiated_at: enrollment.enrolled_at,
            processed_at,
            completed_at: processed_at + TimeDelta::minutes(i64::from(int(rng, 1, 5))),
            refund_amount: if refunded { total } else { 0.0 },
            refund_reason: refunded.then(|| Faker::sentence(rng)),
            refunded_at: refunded.then(|| timeline.since(rng, processed_at)),
            refunded_by: None,
            coupon_code: maybe(rng, |rng| format!("SAVE{}", int(rng, 10, 50))),
            discount_type: maybe(rng, |rng| pick_string(rng, &["percentage", "fixed"])),
            discount_value: maybe(rng, |rng| money(rng, 5.0, 25.0)).unwrap_or(0.0),
            invoice_number: format!("INV-{year}-{}", int(rng, 100_000, 999_999)),
            invoice_url: SAMPLE_PDF_URL.to_string(),
            customer_details: json!({
                "name": Faker::full_name(rng),
                "email": Faker::email(rng),
                "phone": phone(rng),
            }),
            gateway_response: json!({
                "transaction_id": format!("gw_{}", rng.random_range(1_000_000_000u64..=9_999_999_999)),
                "status": if status == "failed" { "failure" } else { "success" },
            }),
            metadata: json!({
                "device": pick_string(rng, &["mobile", "desktop", "tablet"]),
                "platform": pick_string(rng, &["web", "android", "ios"]),
            }),
            status,
            created_at: enrollment.enrolled_at,
            updated_at: now,
        };
        ctx.insert(payment)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn total_is_exact_product() {
        assert_eq!(enrollment_total(10, 3, 0.5), 15);
        assert_eq!(enrollment_total(50, 20, 0.4), 400);
    }

    #[test]
    fn every_learner_gets_one_course() {
        assert_eq!(enrollment_total(10, 3, 0.0), 10);
        assert_eq!(enrollment_total(10, 3, 1.0), 30);
        assert_eq!(enrollment_total(10, 0, 0.5), 0);
    }

    #[test]
    fn quotas_sum_to_total_and_stay_balanced() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let learners: Vec<Uuid> = (0..7).map(|_| new_id(&mut rng)).collect();
        let quotas = per_learner_quotas(&mut rng, &learners, 17);
        assert_eq!(quotas.iter().map(|(_, quota)| quota).sum::<usize>(), 17);
        assert!(quotas.iter().all(|(_, quota)| (2..=3).contains(quota)));
        assert_eq!(quotas.iter().map(|(id, _)| *id).collect::<Vec<_>>(), learners);
    }
}
