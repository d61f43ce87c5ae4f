use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Severity;

/// How many entities of each kind a run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationCounts {
    pub organizations: usize,
    pub instructors: usize,
    pub learners: usize,
    pub courses: usize,
    pub chapters_per_course: usize,
    pub lessons_per_chapter: usize,
    pub assessments_per_course: usize,
    pub assignments_per_course: usize,
    pub live_sessions: usize,
    /// Share of all (learner, course) pairs that become enrollments.
    pub enrollment_fraction: f64,
    /// Chance that an enrollment produces a course review.
    pub review_fraction: f64,
}

impl Default for GenerationCounts {
    fn default() -> Self {
        Self {
            organizations: 5,
            instructors: 15,
            learners: 50,
            courses: 20,
            chapters_per_course: 6,
            lessons_per_chapter: 4,
            assessments_per_course: 3,
            assignments_per_course: 2,
            live_sessions: 10,
            enrollment_fraction: 0.4,
            review_fraction: 0.3,
        }
    }
}

/// Rejected generation counts.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CountsError {
    #[error("{field} must be within [0, 1], got {value}")]
    FractionOutOfRange { field: &'static str, value: f64 },
}

impl CountsError {
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}

impl GenerationCounts {
    pub fn validate(&self) -> Result<(), CountsError> {
        for (field, value) in [
            ("enrollment_fraction", self.enrollment_fraction),
            ("review_fraction", self.review_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CountsError::FractionOutOfRange { field, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GenerationCounts::default().validate().is_ok());
    }

    #[test]
    fn fraction_above_one_is_rejected() {
        let counts = GenerationCounts {
            review_fraction: 1.5,
            ..GenerationCounts::default()
        };
        assert_eq!(
            counts.validate(),
            Err(CountsError::FractionOutOfRange {
                field: "review_fraction",
                value: 1.5
            })
        );
    }

    #[test]
    fn nan_fraction_is_rejected() {
        let counts = GenerationCounts {
            enrollment_fraction: f64::NAN,
            ..GenerationCounts::default()
        };
        assert!(counts.validate().is_err());
    }
}
