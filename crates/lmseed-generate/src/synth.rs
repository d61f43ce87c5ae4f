//! Field synthesis helpers shared by every phase.
//!
//! All functions are pure apart from the RNG they are handed, so a run is
//! reproducible from its seed and its pinned clock.

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};
use rand::Rng;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::faker::Faker;

pub const INDIAN_STATES: &[&str] = &[
    "Andhra Pradesh",
    "Bihar",
    "Delhi",
    "Gujarat",
    "Haryana",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Tamil Nadu",
    "Telangana",
    "Uttar Pradesh",
    "West Bengal",
];

pub const SAMPLE_PDF_URL: &str = "https://www.aeee.in/wp-content/uploads/2020/08/Sample-pdf.pdf";

pub const SAMPLE_VIDEO_URLS: &[&str] = &[
    "http://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4",
    "http://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ElephantsDream.mp4",
    "http://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerBlazes.mp4",
    "http://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerEscapes.mp4",
    "http://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerFun.mp4",
    "http://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerJoyrides.mp4",
    "http://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerMeltdowns.mp4",
    "http://commondatastorage.googleapis.com/gtv-videos-bucket/sample/Sintel.mp4",
    "http://commondatastorage.googleapis.com/gtv-videos-bucket/sample/SubaruOutbackOnStreetAndDirt.mp4",
    "http://commondatastorage.googleapis.com/gtv-videos-bucket/sample/TearsOfSteel.mp4",
    "http://commondatastorage.googleapis.com/gtv-videos-bucket/sample/VolkswagenGTIReview.mp4",
    "http://commondatastorage.googleapis.com/gtv-videos-bucket/sample/WeAreGoingOnBullrun.mp4",
    "http://commondatastorage.googleapis.com/gtv-videos-bucket/sample/WhatCarCanYouGetForAGrand.mp4",
];

/// UUID v4 drawn from the run's RNG.
pub fn new_id<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    uuid::Builder::from_random_bytes(rng.random()).into_uuid()
}

/// Uniform choice from a non-empty constant list.
pub fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.random_range(0..items.len())]
}

pub fn pick_string<R: Rng + ?Sized>(rng: &mut R, items: &[&str]) -> String {
    (*pick(rng, items)).to_string()
}

/// Weighted choice; weights need not sum to anything in particular.
pub fn weighted<'a, R: Rng + ?Sized>(rng: &mut R, choices: &[(&'a str, u32)]) -> &'a str {
    let total: u32 = choices.iter().map(|(_, weight)| weight).sum();
    let mut roll = rng.random_range(0..total.max(1));
    for (value, weight) in choices {
        if roll < *weight {
            return *value;
        }
        roll -= weight;
    }
    choices[choices.len() - 1].0
}

pub fn weighted_string<R: Rng + ?Sized>(rng: &mut R, choices: &[(&str, u32)]) -> String {
    weighted(rng, choices).to_string()
}

/// True with probability `p`, clamped to [0, 1].
pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
    rng.random_bool(p)
}

pub fn coin<R: Rng + ?Sized>(rng: &mut R) -> bool {
    rng.random_bool(0.5)
}

/// `Some(value)` half of the time.
pub fn maybe<T, R: Rng + ?Sized>(rng: &mut R, value: impl FnOnce(&mut R) -> T) -> Option<T> {
    if coin(rng) { Some(value(rng)) } else { None }
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn clamp_percentage(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

pub fn uniform<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    if high <= low {
        low
    } else {
        rng.random_range(low..=high)
    }
}

/// Monetary amount rounded to 2 decimals.
pub fn money<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    round2(uniform(rng, low, high))
}

pub fn percentage<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    clamp_percentage(round2(uniform(rng, low, high)))
}

pub fn int<R: Rng + ?Sized>(rng: &mut R, low: i32, high: i32) -> i32 {
    if high <= low {
        low
    } else {
        rng.random_range(low..=high)
    }
}

/// Returns `(price, original_price)`.
///
/// Half the time the price is discounted to 60-90% of the original, which
/// is then kept; otherwise there is no original price. The price never
/// exceeds the original.
pub fn discounted_price<R: Rng + ?Sized>(rng: &mut R, original: f64) -> (f64, Option<f64>) {
    if coin(rng) {
        let price = round2(original * uniform(rng, 0.6, 0.9)).min(original);
        (price, Some(original))
    } else {
        (original, None)
    }
}

/// Indian mobile number: `+91`, a leading 6-9, nine more digits.
pub fn phone<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut number = String::with_capacity(13);
    number.push_str("+91");
    number.push(char::from(b'0' + rng.random_range(6..=9u8)));
    for _ in 0..9 {
        number.push(char::from(b'0' + rng.random_range(0..=9u8)));
    }
    number
}

pub fn pincode<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.random_range(110_000..=855_999u32).to_string()
}

/// Postal address object stored in JSON columns.
pub fn address<R: Rng + ?Sized>(rng: &mut R) -> Value {
    json!({
        "street": Faker::street_address(rng),
        "city": Faker::city(rng),
        "state": pick_string(rng, INDIAN_STATES),
        "pincode": pincode(rng),
        "country": "India",
    })
}

/// Cuts `text` to at most `max_chars` characters on a word boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    match cut.rfind(' ') {
        Some(space) if space > 0 => cut[..space].trim_end_matches([',', ';', ' ']).to_string(),
        _ => cut,
    }
}

/// Pinned clock for a run; every timestamp is derived from `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeline {
    now: DateTime<Utc>,
}

impl Timeline {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn current_year(&self) -> i32 {
        self.now.year()
    }

    /// Uniform instant in `[start, end]`; `start` when the range is empty.
    pub fn between<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DateTime<Utc> {
        let span = (end - start).num_seconds();
        if span <= 0 {
            return start;
        }
        start + TimeDelta::seconds(rng.random_range(0..=span))
    }

    /// Uniform instant between `now + from_days` and `now + to_days`.
    pub fn days<R: Rng + ?Sized>(&self, rng: &mut R, from_days: i64, to_days: i64) -> DateTime<Utc> {
        self.between(
            rng,
            self.now + TimeDelta::days(from_days),
            self.now + TimeDelta::days(to_days),
        )
    }

    /// Uniform instant between `start` and now.
    pub fn since<R: Rng + ?Sized>(&self, rng: &mut R, start: DateTime<Utc>) -> DateTime<Utc> {
        self.between(rng, start, self.now)
    }

    pub fn date<R: Rng + ?Sized>(&self, rng: &mut R, from_days: i64, to_days: i64) -> NaiveDate {
        self.days(rng, from_days, to_days).date_naive()
    }

    pub fn date_of_birth<R: Rng + ?Sized>(&self, rng: &mut R, min_age: i64, max_age: i64) -> NaiveDate {
        self.date(rng, -max_age * 365, -min_age * 365)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(11)
    }

    #[test]
    fn discounted_price_never_exceeds_original() {
        let mut rng = rng();
        for _ in 0..500 {
            let original = money(&mut rng, 1999.0, 12999.0);
            let (price, kept) = discounted_price(&mut rng, original);
            match kept {
                Some(original) => assert!(price <= original),
                None => assert_eq!(price, original),
            }
        }
    }

    #[test]
    fn phone_numbers_are_indian_mobiles() {
        let mut rng = rng();
        for _ in 0..50 {
            let number = phone(&mut rng);
            assert_eq!(number.len(), 13);
            assert!(number.starts_with("+91"));
            assert!(matches!(number.as_bytes()[3], b'6'..=b'9'));
        }
    }

    #[test]
    fn weighted_follows_weights() {
        let mut rng = rng();
        let choices = [("approved", 8), ("pending", 1), ("rejected", 1)];
        let approved = (0..2000)
            .filter(|_| weighted(&mut rng, &choices) == "approved")
            .count();
        assert!((1400..=1800).contains(&approved), "approved={approved}");
    }

    #[test]
    fn zero_weight_is_never_picked() {
        let mut rng = rng();
        let choices = [("never", 0), ("always", 3)];
        assert!((0..200).all(|_| weighted(&mut rng, &choices) == "always"));
    }

    #[test]
    fn rounding_and_clamping() {
        assert_eq!(round2(12.345_67), 12.35);
        assert_eq!(round1(4.26), 4.3);
        assert_eq!(clamp_percentage(120.0), 100.0);
        assert_eq!(clamp_percentage(-3.0), 0.0);
    }

    #[test]
    fn timeline_stays_in_range() {
        let mut rng = rng();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let timeline = Timeline::new(now);
        for _ in 0..100 {
            let past = timeline.days(&mut rng, -90, 0);
            assert!(past <= now && past >= now - TimeDelta::days(90));
            assert!(timeline.since(&mut rng, past) >= past);
        }
        assert_eq!(timeline.between(&mut rng, now, now - TimeDelta::days(1)), now);
    }

    #[test]
    fn truncation_keeps_whole_words() {
        assert_eq!(truncate_chars("alpha beta gamma", 12), "alpha beta");
        assert_eq!(truncate_chars("short", 12), "short");
    }

    #[test]
    fn ids_are_reproducible() {
        assert_eq!(new_id(&mut rng()), new_id(&mut rng()));
        assert_eq!(new_id(&mut rng()).get_version_num(), 4);
    }
}
