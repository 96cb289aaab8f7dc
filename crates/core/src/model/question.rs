use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::{QuestionId, SessionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionValidationError {
    #[error("question text cannot be empty")]
    EmptyQuestion,
}

/// A question/answer pair as supplied by a caller or the AI gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionDraft {
    pub question: String,
    pub answer: String,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// # Errors
    ///
    /// Returns `QuestionValidationError::EmptyQuestion` if the question text is blank.
    pub fn validate(self) -> Result<ValidatedQuestion, QuestionValidationError> {
        if self.question.trim().is_empty() {
            return Err(QuestionValidationError::EmptyQuestion);
        }
        Ok(ValidatedQuestion {
            question: self.question,
            answer: self.answer,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    pub question: String,
    pub answer: String,
}

/// A single question/answer pair owned by exactly one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    id: QuestionId,
    session: SessionId,
    question: String,
    answer: String,
    is_pinned: bool,
    note: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Question {
    /// A freshly created question: unpinned, empty note.
    #[must_use]
    pub fn new(
        id: QuestionId,
        session: SessionId,
        content: ValidatedQuestion,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            session,
            question: content.question,
            answer: content.answer,
            is_pinned: false,
            note: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rehydrate a question from persisted storage.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        id: QuestionId,
        session: SessionId,
        question: String,
        answer: String,
        is_pinned: bool,
        note: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            session,
            question,
            answer,
            is_pinned,
            note,
            created_at,
            updated_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.is_pinned
    }

    #[must_use]
    pub fn note(&self) -> &str {
        &self.note
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Flip the pinned flag. Two toggles restore the original value.
    pub fn toggle_pin(&mut self, now: DateTime<Utc>) {
        self.is_pinned = !self.is_pinned;
        self.updated_at = now;
    }

    /// Replace the note verbatim; `None` clears it.
    pub fn set_note(&mut self, note: Option<String>, now: DateTime<Utc>) {
        self.note = note.unwrap_or_default();
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn build() -> Question {
        let content = QuestionDraft::new("What is indexing?", "...").validate().unwrap();
        Question::new(QuestionId::generate(), SessionId::generate(), content, fixed_now())
    }

    #[test]
    fn blank_question_is_rejected() {
        let err = QuestionDraft::new("  ", "answer").validate().unwrap_err();
        assert_eq!(err, QuestionValidationError::EmptyQuestion);
    }

    #[test]
    fn empty_answer_is_allowed() {
        assert!(QuestionDraft::new("Why?", "").validate().is_ok());
    }

    #[test]
    fn new_question_is_unpinned_with_empty_note() {
        let q = build();
        assert!(!q.is_pinned());
        assert_eq!(q.note(), "");
        assert_eq!(q.created_at(), q.updated_at());
    }

    #[test]
    fn double_toggle_restores_pin_state() {
        let mut q = build();
        q.toggle_pin(fixed_now());
        assert!(q.is_pinned());
        q.toggle_pin(fixed_now());
        assert!(!q.is_pinned());
    }

    #[test]
    fn note_is_kept_verbatim_and_cleared_when_absent() {
        let mut q = build();
        q.set_note(Some("  remember B-trees \n".into()), fixed_now());
        assert_eq!(q.note(), "  remember B-trees \n");
        q.set_note(None, fixed_now());
        assert_eq!(q.note(), "");
    }
}
