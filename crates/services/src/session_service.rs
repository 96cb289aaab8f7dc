use std::sync::Arc;

use prep_core::model::{
    Question, QuestionDraft, QuestionId, Session, SessionDraft, SessionId, UserId,
    ValidatedQuestion,
};
use storage::repository::{
    NewQuestionRecord, NewSessionRecord, QuestionRepository, SessionRepository, StorageError,
};
use tracing::{debug, info, warn};

use crate::Clock;
use crate::error::SessionServiceError;
use crate::session_view::SessionDetail;

/// Keeps sessions and their question lists consistent across both stores.
///
/// Every operation that touches a session's question list runs through here,
/// so the list only ever references questions whose `session_id` points back
/// at the same session.
#[derive(Clone)]
pub struct SessionService {
    clock: Clock,
    sessions: Arc<dyn SessionRepository>,
    questions: Arc<dyn QuestionRepository>,
}

impl SessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        sessions: Arc<dyn SessionRepository>,
        questions: Arc<dyn QuestionRepository>,
    ) -> Self {
        Self {
            clock,
            sessions,
            questions,
        }
    }

    /// Create a session for `owner`, optionally seeding it with questions.
    ///
    /// The session row is written first. If the question batch then fails the
    /// session stays behind with an empty list and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::InvalidSession` or `InvalidQuestion` before
    /// anything is written.
    /// Returns `SessionServiceError::Storage` if persistence fails.
    pub async fn create_session(
        &self,
        owner: &UserId,
        draft: SessionDraft,
        initial: Vec<QuestionDraft>,
    ) -> Result<SessionDetail, SessionServiceError> {
        let now = self.clock.now();
        let validated = draft.validate(owner.clone(), now)?;
        let contents = validate_all(initial)?;

        let mut session = self
            .sessions
            .insert_session(NewSessionRecord::from_validated(validated))
            .await?;
        info!(session_id = %session.id(), owner = %owner, "session created");

        if contents.is_empty() {
            return Ok(SessionDetail::new(session, Vec::new()));
        }

        let id = session.id();
        let created = self
            .questions
            .insert_questions(id, records(contents, now))
            .await
            .map_err(|e| {
                warn!(session_id = %id, error = %e, "initial questions failed; session left empty");
                session_missing(id)(e)
            })?;

        session.replace_questions(created.iter().map(Question::id).collect(), now);
        self.sessions
            .save_session(&session)
            .await
            .map_err(session_missing(id))?;

        Ok(SessionDetail::new(session, created))
    }

    /// Append a batch of questions to an existing session, in input order.
    ///
    /// An empty batch is a no-op that still requires the session to exist.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::SessionNotFound` if the session is gone.
    /// Returns `SessionServiceError::InvalidQuestion` if any entry is invalid.
    /// Returns `SessionServiceError::Storage` if persistence fails.
    pub async fn append_questions(
        &self,
        session_id: SessionId,
        drafts: Vec<QuestionDraft>,
    ) -> Result<Vec<Question>, SessionServiceError> {
        let contents = validate_all(drafts)?;
        let mut session = self.load_session(session_id).await?;
        if contents.is_empty() {
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        let created = self
            .questions
            .insert_questions(session_id, records(contents, now))
            .await
            .map_err(session_missing(session_id))?;

        session.append_questions(created.iter().map(Question::id), now);
        self.sessions
            .save_session(&session)
            .await
            .map_err(session_missing(session_id))?;

        debug!(session_id = %session_id, added = created.len(), "questions appended");
        Ok(created)
    }

    /// Flip a question's pinned flag.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::QuestionNotFound` if the question is gone.
    /// Returns `SessionServiceError::Storage` if persistence fails.
    pub async fn toggle_pin(&self, question_id: QuestionId) -> Result<Question, SessionServiceError> {
        let mut question = self.load_question(question_id).await?;
        let now = self.clock.now();
        question.toggle_pin(now);
        self.questions
            .set_pinned(question_id, question.is_pinned(), now)
            .await
            .map_err(question_missing(question_id))?;
        Ok(question)
    }

    /// Replace a question's note. `None` clears it.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::QuestionNotFound` if the question is gone.
    /// Returns `SessionServiceError::Storage` if persistence fails.
    pub async fn set_note(
        &self,
        question_id: QuestionId,
        note: Option<String>,
    ) -> Result<Question, SessionServiceError> {
        let mut question = self.load_question(question_id).await?;
        let now = self.clock.now();
        question.set_note(note, now);
        self.questions
            .set_note(question_id, question.note().to_owned(), now)
            .await
            .map_err(question_missing(question_id))?;
        Ok(question)
    }

    /// Delete a session and every question that belongs to it.
    ///
    /// Questions go first, so a failure between the two steps leaves a session
    /// with an empty list and never a question without its session.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::SessionNotFound` if the session is gone.
    /// Returns `SessionServiceError::Forbidden` if `requester` is not the owner.
    /// Returns `SessionServiceError::Storage` if persistence fails.
    pub async fn delete_session(
        &self,
        session_id: SessionId,
        requester: &UserId,
    ) -> Result<(), SessionServiceError> {
        let session = self.load_session(session_id).await?;
        if !session.is_owned_by(requester) {
            warn!(session_id = %session_id, requester = %requester, "delete refused for non-owner");
            return Err(SessionServiceError::Forbidden);
        }

        let removed = self
            .questions
            .delete_questions_for_session(session_id)
            .await?;
        self.sessions
            .delete_session(session_id)
            .await
            .map_err(session_missing(session_id))?;

        info!(session_id = %session_id, questions = removed, "session deleted");
        Ok(())
    }

    /// Fetch a session with its questions resolved and sorted for display.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::SessionNotFound` if the session is gone.
    /// Returns `SessionServiceError::Storage` if repository access fails.
    pub async fn session_detail(
        &self,
        session_id: SessionId,
    ) -> Result<SessionDetail, SessionServiceError> {
        let session = self.load_session(session_id).await?;
        self.resolve(session).await
    }

    /// All sessions owned by `owner`, newest first, each with resolved questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::Storage` if repository access fails.
    pub async fn list_sessions(
        &self,
        owner: &UserId,
    ) -> Result<Vec<SessionDetail>, SessionServiceError> {
        let sessions = self.sessions.list_sessions_for_owner(owner).await?;
        let mut details = Vec::with_capacity(sessions.len());
        for session in sessions {
            details.push(self.resolve(session).await?);
        }
        Ok(details)
    }

    /// Fetch a bare session record.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::SessionNotFound` if the session is gone.
    /// Returns `SessionServiceError::Storage` if repository access fails.
    pub async fn get_session(&self, session_id: SessionId) -> Result<Session, SessionServiceError> {
        self.load_session(session_id).await
    }

    /// Fetch a single question.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::QuestionNotFound` if the question is gone.
    /// Returns `SessionServiceError::Storage` if repository access fails.
    pub async fn get_question(
        &self,
        question_id: QuestionId,
    ) -> Result<Question, SessionServiceError> {
        self.load_question(question_id).await
    }

    async fn resolve(&self, session: Session) -> Result<SessionDetail, SessionServiceError> {
        let questions = self.questions.get_questions(session.question_ids()).await?;
        Ok(SessionDetail::new(session, questions))
    }

    async fn load_session(&self, id: SessionId) -> Result<Session, SessionServiceError> {
        self.sessions
            .get_session(id)
            .await?
            .ok_or(SessionServiceError::SessionNotFound(id))
    }

    async fn load_question(&self, id: QuestionId) -> Result<Question, SessionServiceError> {
        self.questions
            .get_question(id)
            .await?
            .ok_or(SessionServiceError::QuestionNotFound(id))
    }
}

fn validate_all(drafts: Vec<QuestionDraft>) -> Result<Vec<ValidatedQuestion>, SessionServiceError> {
    drafts
        .into_iter()
        .map(|draft| draft.validate().map_err(SessionServiceError::from))
        .collect()
}

fn records(
    contents: Vec<ValidatedQuestion>,
    now: chrono::DateTime<chrono::Utc>,
) -> Vec<NewQuestionRecord> {
    contents
        .into_iter()
        .map(|content| NewQuestionRecord::from_validated(content, now))
        .collect()
}

fn session_missing(id: SessionId) -> impl FnOnce(StorageError) -> SessionServiceError {
    move |e| match e {
        StorageError::NotFound => SessionServiceError::SessionNotFound(id),
        other => SessionServiceError::Storage(other),
    }
}

fn question_missing(id: QuestionId) -> impl FnOnce(StorageError) -> SessionServiceError {
    move |e| match e {
        StorageError::NotFound => SessionServiceError::QuestionNotFound(id),
        other => SessionServiceError::Storage(other),
    }
}
