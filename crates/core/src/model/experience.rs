use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::SessionValidationError;

/// Seniority band a session is targeted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExperienceLevel {
    Fresher,
    Junior,
    Mid,
    Senior,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 4] = [
        ExperienceLevel::Fresher,
        ExperienceLevel::Junior,
        ExperienceLevel::Mid,
        ExperienceLevel::Senior,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExperienceLevel::Fresher => "Fresher",
            ExperienceLevel::Junior => "Junior",
            ExperienceLevel::Mid => "Mid",
            ExperienceLevel::Senior => "Senior",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = SessionValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(SessionValidationError::MissingExperienceLevel);
        }
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| SessionValidationError::InvalidExperienceLevel(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels_case_insensitively() {
        assert_eq!("mid".parse::<ExperienceLevel>().unwrap(), ExperienceLevel::Mid);
        assert_eq!(" Senior ".parse::<ExperienceLevel>().unwrap(), ExperienceLevel::Senior);
        assert_eq!("FRESHER".parse::<ExperienceLevel>().unwrap(), ExperienceLevel::Fresher);
    }

    #[test]
    fn rejects_values_outside_the_enum() {
        let err = "Principal".parse::<ExperienceLevel>().unwrap_err();
        assert_eq!(
            err,
            SessionValidationError::InvalidExperienceLevel("Principal".into())
        );
    }

    #[test]
    fn blank_is_reported_as_missing() {
        let err = "  ".parse::<ExperienceLevel>().unwrap_err();
        assert_eq!(err, SessionValidationError::MissingExperienceLevel);
    }
}
