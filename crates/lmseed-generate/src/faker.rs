//! Thin adapter over `fake` so every phase draws text from the run's RNG.

use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, StreetName, StreetSuffix};
use fake::faker::company::en::{CatchPhrase, CompanyName};
use fake::faker::internet::en::{DomainSuffix, FreeEmailProvider};
use fake::faker::lorem::en::{Paragraph, Sentence, Word};
use fake::faker::name::en::{FirstName, LastName, Name};
use rand::Rng;

use crate::synth::truncate_chars;

pub struct Faker;

impl Faker {
    pub fn first_name<R: Rng + ?Sized>(rng: &mut R) -> String {
        FirstName().fake_with_rng(rng)
    }

    pub fn last_name<R: Rng + ?Sized>(rng: &mut R) -> String {
        LastName().fake_with_rng(rng)
    }

    pub fn full_name<R: Rng + ?Sized>(rng: &mut R) -> String {
        Name().fake_with_rng(rng)
    }

    pub fn company<R: Rng + ?Sized>(rng: &mut R) -> String {
        CompanyName().fake_with_rng(rng)
    }

    pub fn catch_phrase<R: Rng + ?Sized>(rng: &mut R) -> String {
        CatchPhrase().fake_with_rng(rng)
    }

    pub fn word<R: Rng + ?Sized>(rng: &mut R) -> String {
        Word().fake_with_rng(rng)
    }

    pub fn words<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<String> {
        (0..count).map(|_| Self::word(rng)).collect()
    }

    pub fn sentence<R: Rng + ?Sized>(rng: &mut R) -> String {
        Sentence(4..10).fake_with_rng(rng)
    }

    pub fn sentences<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<String> {
        (0..count).map(|_| Self::sentence(rng)).collect()
    }

    /// Prose of at most `max_chars` characters.
    pub fn text<R: Rng + ?Sized>(rng: &mut R, max_chars: usize) -> String {
        let sentences = (max_chars / 60).clamp(1, 12);
        let paragraph: String = Paragraph(sentences..sentences + 2).fake_with_rng(rng);
        truncate_chars(&paragraph, max_chars)
    }

    pub fn street_address<R: Rng + ?Sized>(rng: &mut R) -> String {
        let number: String = BuildingNumber().fake_with_rng(rng);
        let street: String = StreetName().fake_with_rng(rng);
        let suffix: String = StreetSuffix().fake_with_rng(rng);
        format!("{number} {street} {suffix}")
    }

    pub fn city<R: Rng + ?Sized>(rng: &mut R) -> String {
        CityName().fake_with_rng(rng)
    }

    pub fn email_provider<R: Rng + ?Sized>(rng: &mut R) -> String {
        FreeEmailProvider().fake_with_rng(rng)
    }

    pub fn email<R: Rng + ?Sized>(rng: &mut R) -> String {
        let first = Self::first_name(rng);
        let last = Self::last_name(rng);
        let provider = Self::email_provider(rng);
        format!("{}.{}@{provider}", slug(&first), slug(&last))
    }

    pub fn url<R: Rng + ?Sized>(rng: &mut R) -> String {
        let word = Self::word(rng);
        let suffix: String = DomainSuffix().fake_with_rng(rng);
        format!("https://www.{}.{suffix}/", slug(&word))
    }
}

/// Lowercase ASCII alphanumerics joined by `-`.
pub fn slug(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn text_respects_max_chars() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for max in [20, 100, 500] {
            assert!(Faker::text(&mut rng, max).chars().count() <= max);
        }
    }

    #[test]
    fn same_seed_same_names() {
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        assert_eq!(Faker::full_name(&mut a), Faker::full_name(&mut b));
    }

    #[test]
    fn slug_drops_punctuation() {
        assert_eq!(slug("Physics Fundamentals, Part 1."), "physics-fundamentals-part-1");
    }
}
