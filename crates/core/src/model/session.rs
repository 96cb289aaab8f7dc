use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::{ExperienceLevel, QuestionId, SessionId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionValidationError {
    #[error("role is required")]
    EmptyRole,

    #[error("experience level is required")]
    MissingExperienceLevel,

    #[error("experience level must be one of Fresher, Junior, Mid, Senior (got {0:?})")]
    InvalidExperienceLevel(String),

    #[error("at least one topic to focus on is required")]
    MissingTopics,
}

//
// ─── SESSION TYPES ─────────────────────────────────────────────────────────────
//

/// Raw caller input for a new session, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDraft {
    pub role: String,
    pub experience_level: String,
    pub topics: Vec<String>,
    pub description: Option<String>,
}

impl SessionDraft {
    /// Validate the draft for the given owner.
    ///
    /// Role and topics are trimmed; blank topics are dropped.
    ///
    /// # Errors
    ///
    /// Returns `SessionValidationError` if the role is blank, the experience
    /// level is missing or outside the fixed set, or no topic remains.
    pub fn validate(
        self,
        owner: UserId,
        now: DateTime<Utc>,
    ) -> Result<ValidatedSession, SessionValidationError> {
        let role = self.role.trim();
        if role.is_empty() {
            return Err(SessionValidationError::EmptyRole);
        }

        let experience_level: ExperienceLevel = self.experience_level.parse()?;

        let topics: Vec<String> = self
            .topics
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect();
        if topics.is_empty() {
            return Err(SessionValidationError::MissingTopics);
        }

        Ok(ValidatedSession {
            owner,
            role: role.to_owned(),
            experience_level,
            topics,
            description: self.description.unwrap_or_default(),
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSession {
    pub owner: UserId,
    pub role: String,
    pub experience_level: ExperienceLevel,
    pub topics: Vec<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl ValidatedSession {
    /// Attach a store-assigned identity. The question list starts empty.
    #[must_use]
    pub fn assign_id(self, id: SessionId) -> Session {
        Session {
            id,
            owner: self.owner,
            role: self.role,
            experience_level: self.experience_level,
            topics: self.topics,
            description: self.description,
            questions: Vec::new(),
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// An interview-prep scope owned by one user.
///
/// `questions` is the ordered reference list; insertion order is kept here and
/// only the detail view re-sorts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    id: SessionId,
    #[serde(rename = "user")]
    owner: UserId,
    role: String,
    experience_level: ExperienceLevel,
    #[serde(rename = "topicsToFocusOn")]
    topics: Vec<String>,
    description: String,
    questions: Vec<QuestionId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Session {
    /// Rehydrate a session from persisted storage.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        id: SessionId,
        owner: UserId,
        role: String,
        experience_level: ExperienceLevel,
        topics: Vec<String>,
        description: String,
        questions: Vec<QuestionId>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner,
            role,
            experience_level,
            topics,
            description,
            questions,
            created_at,
            updated_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    #[must_use]
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner == user
    }

    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    #[must_use]
    pub fn experience_level(&self) -> ExperienceLevel {
        self.experience_level
    }

    #[must_use]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn question_ids(&self) -> &[QuestionId] {
        &self.questions
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Append new question ids after the existing ones.
    pub fn append_questions(&mut self, ids: impl IntoIterator<Item = QuestionId>, now: DateTime<Utc>) {
        self.questions.extend(ids);
        self.updated_at = now;
    }

    /// Replace the whole reference list.
    pub fn replace_questions(&mut self, ids: Vec<QuestionId>, now: DateTime<Utc>) {
        self.questions = ids;
        self.updated_at = now;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
