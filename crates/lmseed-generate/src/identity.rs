//! Create-Identity: the generation half of the identity/profile pair.
//!
//! Every person gets an [`Identity`] whose metadata lets the auth trigger
//! provision a partial profile, plus the authoritative [`Profile`] sharing
//! its id. The loader later reconciles that profile against whatever the
//! trigger created.

use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use lmseed_core::entities::{Identity, Profile, UserType};

use crate::context::GenerationContext;
use crate::errors::GenerationError;
use crate::faker::Faker;
use crate::synth::{address, coin, phone, pick_string};

/// Placeholder bcrypt hash; real credentials are provisioned downstream.
pub const PLACEHOLDER_PASSWORD_HASH: &str = "$2a$10$example.hash.for.testing.purposes.only";

const AUTH_ROLE: &str = "authenticated";

/// Creates an identity and its profile under a fresh user id.
pub fn create_person(ctx: &mut GenerationContext, user_type: UserType) -> Result<Profile, GenerationError> {
    let user_id = ctx.new_id();
    create_person_with_id(ctx, user_id, user_type)
}

/// Creates an identity and its profile under `user_id`.
///
/// An id that already has a profile is not re-created; the stored profile
/// is returned instead.
pub fn create_person_with_id(
    ctx: &mut GenerationContext,
    user_id: Uuid,
    user_type: UserType,
) -> Result<Profile, GenerationError> {
    if let Ok(existing) = ctx.registry.get::<Profile>(user_id) {
        warn!(%user_id, "user id already exists, skipping duplicate");
        return Ok(existing.clone());
    }

    let now = ctx.now();
    let first_name = Faker::first_name(&mut ctx.rng);
    let last_name = Faker::last_name(&mut ctx.rng);
    let email = ctx.unique_email();

    let identity = Identity {
        id: user_id,
        email: email.clone(),
        encrypted_password: PLACEHOLDER_PASSWORD_HASH.to_string(),
        email_confirmed_at: now,
        created_at: now,
        updated_at: now,
        role: AUTH_ROLE.to_string(),
        aud: AUTH_ROLE.to_string(),
        raw_user_meta_data: json!({
            "user_type": user_type.as_str(),
            "first_name": first_name,
            "last_name": last_name,
        }),
    };
    ctx.insert(identity)?;

    let rng = &mut ctx.rng;
    let profile = Profile {
        id: user_id,
        user_type,
        first_name,
        last_name,
        email,
        phone: phone(rng),
        avatar_url: format!("https://api.dicebear.com/7.x/avataaars/svg?seed={user_id}"),
        date_of_birth: ctx.timeline.date_of_birth(rng, 18, 60),
        gender: pick_string(rng, &["male", "female", "other"]),
        address: address(rng),
        is_active: true,
        email_verified: coin(rng),
        phone_verified: coin(rng),
        onboarding_completed: true,
        preferences: json!({
            "theme": pick_string(rng, &["light", "dark", "auto"]),
            "notifications": {"email": true, "push": true, "sms": coin(rng)},
        }),
        last_seen: ctx.timeline.days(rng, -7, 0),
        created_at: now,
        updated_at: now,
    };
    ctx.insert(profile.clone())?;
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use lmseed_core::{EntityKind, GenerationCounts};

    use super::*;

    fn context() -> GenerationContext {
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap();
        GenerationContext::new(GenerationCounts::default(), 3, now)
    }

    #[test]
    fn identity_and_profile_share_the_id() {
        let mut ctx = context();
        let profile = create_person(&mut ctx, UserType::Teacher).unwrap();
        let identity = ctx.registry.get::<Identity>(profile.id).unwrap();
        assert_eq!(identity.email, profile.email);
        assert_eq!(identity.raw_user_meta_data["user_type"], "teacher");
        assert_eq!(identity.raw_user_meta_data["first_name"], profile.first_name.as_str());
    }

    #[test]
    fn existing_user_id_is_not_recreated() {
        let mut ctx = context();
        let first = create_person(&mut ctx, UserType::Student).unwrap();
        let again = create_person_with_id(&mut ctx, first.id, UserType::Student).unwrap();
        assert_eq!(first, again);
        assert_eq!(ctx.registry.count(EntityKind::Identity), 1);
        assert_eq!(ctx.registry.count(EntityKind::Profile), 1);
    }

    #[test]
    fn emails_are_unique() {
        let mut ctx = context();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            assert!(seen.insert(ctx.unique_email()));
        }
    }
}
