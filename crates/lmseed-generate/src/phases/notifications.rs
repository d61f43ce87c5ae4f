use serde_json::json;

use lmseed_core::EntityKind;
use lmseed_core::entities::{Notification, Profile};

use crate::context::GenerationContext;
use crate::errors::GenerationError;
use crate::faker::Faker;
use crate::pipeline::Phase;
use crate::synth::{coin, int, maybe, new_id, pick_string};

const NOTIFICATION_TYPES: &[&str] = &[
    "course_enrollment",
    "lesson_completed",
    "assignment_due",
    "live_class_reminder",
    "achievement_unlocked",
    "payment_success",
];

/// Three to ten notifications for every profile.
pub fn notifications(ctx: &mut GenerationContext) -> Result<(), GenerationError> {
    ctx.require(Phase::Notifications, &[EntityKind::Profile])?;
    let user_ids = ctx.registry.get_all_ids::<Profile>();
    let timeline = ctx.timeline;
    let now = timeline.now();

    for user_id in user_ids {
        let amount = int(&mut ctx.rng, 3, 10);
        for _ in 0..amount {
            let id = ctx.new_id();
            let rng = &mut ctx.rng;
            let is_read = coin(rng);

            let notification = Notification {
                id,
                user_id,
                title: Faker::catch_phrase(rng),
                message: Faker::text(rng, 200),
                notification_type: pick_string(rng, NOTIFICATION_TYPES),
                reference_id: maybe(rng, new_id),
                reference_type: maybe(rng, |rng| pick_string(rng, &["course", "lesson", "assignment"])),
                channels: vec!["in_app".to_string(), "email".to_string()],
                delivery_status: json!({"in_app": "delivered", "email": "sent"}),
                priority: pick_string(rng, &["low", "medium", "high"]),
                is_read,
                read_at: is_read.then(|| timeline.days(rng, -7, 0)),
                scheduled_at: now,
                sent_at: now,
                expires_at: maybe(rng, |rng| timeline.days(rng, 7, 30)),
                category: pick_string(rng, &["academic", "financial", "technical", "general"]),
                action_url: maybe(rng, Faker::url),
                action_label: maybe(rng, |_| "View Details".to_string()),
                metadata: json!({"source": "system", "batch_id": new_id(rng)}),
                template_id: None,
                created_at: now,
                updated_at: now,
            };
            ctx.insert(notification)?;
        }
    }
    Ok(())
}
