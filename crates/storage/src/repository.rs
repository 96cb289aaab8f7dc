use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prep_core::model::{
    ExperienceLevel, Question, QuestionId, Session, SessionId, UserId, ValidatedQuestion,
    ValidatedSession,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Insert shape for a session; the store assigns the identity.
#[derive(Debug, Clone)]
pub struct NewSessionRecord {
    pub owner: UserId,
    pub role: String,
    pub experience_level: ExperienceLevel,
    pub topics: Vec<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl NewSessionRecord {
    #[must_use]
    pub fn from_validated(session: ValidatedSession) -> Self {
        Self {
            owner: session.owner,
            role: session.role,
            experience_level: session.experience_level,
            topics: session.topics,
            description: session.description,
            created_at: session.created_at,
        }
    }
}

/// Insert shape for one question of a batch.
#[derive(Debug, Clone)]
pub struct NewQuestionRecord {
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl NewQuestionRecord {
    #[must_use]
    pub fn from_validated(question: ValidatedQuestion, created_at: DateTime<Utc>) -> Self {
        Self {
            question: question.question,
            answer: question.answer,
            created_at,
        }
    }
}

/// Repository contract for sessions and their ordered question lists.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a session with an empty question list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn insert_session(&self, record: NewSessionRecord) -> Result<Session, StorageError>;

    /// Fetch a session by ID, including its question list in stored order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing session is `Ok(None)`.
    async fn get_session(&self, id: SessionId) -> Result<Option<Session>, StorageError>;

    /// All sessions owned by `owner`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_sessions_for_owner(&self, owner: &UserId) -> Result<Vec<Session>, StorageError>;

    /// Persist mutable session state, replacing the stored question list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session does not exist, or
    /// `StorageError::Conflict` if the list references an unknown question.
    async fn save_session(&self, session: &Session) -> Result<(), StorageError>;

    /// Remove a session. Its questions must already be gone.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or `StorageError::Conflict`
    /// if questions still reference the session.
    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError>;
}

/// Repository contract for questions.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Bulk-create questions for a session, preserving input order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session does not exist, or other
    /// storage errors. No question of the batch is stored on error.
    async fn insert_questions(
        &self,
        session_id: SessionId,
        records: Vec<NewQuestionRecord>,
    ) -> Result<Vec<Question>, StorageError>;

    /// Fetch a question by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing question is `Ok(None)`.
    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError>;

    /// Resolve IDs in the given order, skipping any that no longer exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_questions(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question does not exist.
    async fn set_pinned(
        &self,
        id: QuestionId,
        pinned: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question does not exist.
    async fn set_note(
        &self,
        id: QuestionId,
        note: String,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Delete every question owned by the session and return how many went.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_questions_for_session(&self, session_id: SessionId)
    -> Result<u64, StorageError>;
}

#[derive(Debug, Clone)]
struct Stored<T> {
    seq: u64,
    value: T,
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Enforces the same referential rules as the SQLite schema: questions need a
/// live session, and a session cannot be deleted while questions point at it.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    sessions: Arc<Mutex<HashMap<SessionId, Stored<Session>>>>,
    questions: Arc<Mutex<HashMap<QuestionId, Stored<Question>>>>,
    seq: Arc<AtomicU64>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            questions: Arc::new(Mutex::new(HashMap::new())),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn insert_session(&self, record: NewSessionRecord) -> Result<Session, StorageError> {
        let session = Session::from_persisted(
            SessionId::generate(),
            record.owner,
            record.role,
            record.experience_level,
            record.topics,
            record.description,
            Vec::new(),
            record.created_at,
            record.created_at,
        );
        let seq = self.next_seq();
        let mut guard = self.sessions.lock().map_err(poisoned)?;
        guard.insert(
            session.id(),
            Stored {
                seq,
                value: session.clone(),
            },
        );
        Ok(session)
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<Session>, StorageError> {
        let guard = self.sessions.lock().map_err(poisoned)?;
        Ok(guard.get(&id).map(|s| s.value.clone()))
    }

    async fn list_sessions_for_owner(&self, owner: &UserId) -> Result<Vec<Session>, StorageError> {
        let guard = self.sessions.lock().map_err(poisoned)?;
        let mut owned: Vec<&Stored<Session>> = guard
            .values()
            .filter(|s| s.value.is_owned_by(owner))
            .collect();
        owned.sort_by(|a, b| {
            b.value
                .created_at()
                .cmp(&a.value.created_at())
                .then(b.seq.cmp(&a.seq))
        });
        Ok(owned.into_iter().map(|s| s.value.clone()).collect())
    }

    async fn save_session(&self, session: &Session) -> Result<(), StorageError> {
        {
            let questions = self.questions.lock().map_err(poisoned)?;
            if session
                .question_ids()
                .iter()
                .any(|id| !questions.contains_key(id))
            {
                return Err(StorageError::Conflict);
            }
        }
        let mut guard = self.sessions.lock().map_err(poisoned)?;
        let stored = guard.get_mut(&session.id()).ok_or(StorageError::NotFound)?;
        stored.value = session.clone();
        Ok(())
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError> {
        {
            let questions = self.questions.lock().map_err(poisoned)?;
            if questions.values().any(|q| q.value.session_id() == id) {
                return Err(StorageError::Conflict);
            }
        }
        let mut guard = self.sessions.lock().map_err(poisoned)?;
        guard.remove(&id).map(|_| ()).ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn insert_questions(
        &self,
        session_id: SessionId,
        records: Vec<NewQuestionRecord>,
    ) -> Result<Vec<Question>, StorageError> {
        if !self.sessions.lock().map_err(poisoned)?.contains_key(&session_id) {
            return Err(StorageError::NotFound);
        }

        let created: Vec<Question> = records
            .into_iter()
            .map(|r| {
                Question::from_persisted(
                    QuestionId::generate(),
                    session_id,
                    r.question,
                    r.answer,
                    false,
                    String::new(),
                    r.created_at,
                    r.created_at,
                )
            })
            .collect();

        let mut guard = self.questions.lock().map_err(poisoned)?;
        for q in &created {
            let seq = self.next_seq();
            guard.insert(
                q.id(),
                Stored {
                    seq,
                    value: q.clone(),
                },
            );
        }
        Ok(created)
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard.get(&id).map(|q| q.value.clone()))
    }

    async fn get_questions(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(ids
            .iter()
            .filter_map(|id| guard.get(id).map(|q| q.value.clone()))
            .collect())
    }

    async fn set_pinned(
        &self,
        id: QuestionId,
        pinned: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        let stored = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        if stored.value.is_pinned() != pinned {
            stored.value.toggle_pin(updated_at);
        }
        Ok(())
    }

    async fn set_note(
        &self,
        id: QuestionId,
        note: String,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        let stored = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        stored.value.set_note(Some(note), updated_at);
        Ok(())
    }

    async fn delete_questions_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<u64, StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        let before = guard.len();
        guard.retain(|_, q| q.value.session_id() != session_id);
        Ok((before - guard.len()) as u64)
    }
}

/// Aggregates session and question repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
    pub questions: Arc<dyn QuestionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let sessions: Arc<dyn SessionRepository> = Arc::new(repo.clone());
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo);
        Self {
            sessions,
            questions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use prep_core::time::fixed_now;

    fn owner(name: &str) -> UserId {
        UserId::new(name).unwrap()
    }

    fn session_record(owner: UserId, created_at: DateTime<Utc>) -> NewSessionRecord {
        NewSessionRecord {
            owner,
            role: "Backend Engineer".into(),
            experience_level: ExperienceLevel::Mid,
            topics: vec!["Node".into(), "SQL".into()],
            description: String::new(),
            created_at,
        }
    }

    fn question_record(text: &str) -> NewQuestionRecord {
        NewQuestionRecord {
            question: text.into(),
            answer: "...".into(),
            created_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn bulk_insert_preserves_order_and_back_reference() {
        let repo = InMemoryRepository::new();
        let session = repo
            .insert_session(session_record(owner("u1"), fixed_now()))
            .await
            .unwrap();

        let created = repo
            .insert_questions(
                session.id(),
                vec![question_record("a"), question_record("b"), question_record("c")],
            )
            .await
            .unwrap();

        let texts: Vec<&str> = created.iter().map(Question::question).collect();
        assert_eq!(texts, ["a", "b", "c"]);
        assert!(created.iter().all(|q| q.session_id() == session.id()));

        let ids: Vec<QuestionId> = created.iter().map(Question::id).collect();
        let resolved = repo.get_questions(&ids).await.unwrap();
        assert_eq!(resolved, created);
    }

    #[tokio::test]
    async fn questions_require_a_live_session() {
        let repo = InMemoryRepository::new();
        let err = repo
            .insert_questions(SessionId::generate(), vec![question_record("orphan")])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn session_delete_is_refused_while_questions_remain() {
        let repo = InMemoryRepository::new();
        let session = repo
            .insert_session(session_record(owner("u1"), fixed_now()))
            .await
            .unwrap();
        repo.insert_questions(session.id(), vec![question_record("a")])
            .await
            .unwrap();

        let err = repo.delete_session(session.id()).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        assert_eq!(
            repo.delete_questions_for_session(session.id()).await.unwrap(),
            1
        );
        repo.delete_session(session.id()).await.unwrap();
        assert!(repo.get_session(session.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_for_owner_is_newest_first_and_scoped() {
        let repo = InMemoryRepository::new();
        let older = repo
            .insert_session(session_record(owner("u1"), fixed_now()))
            .await
            .unwrap();
        let newer = repo
            .insert_session(session_record(owner("u1"), fixed_now() + Duration::minutes(1)))
            .await
            .unwrap();
        repo.insert_session(session_record(owner("u2"), fixed_now()))
            .await
            .unwrap();

        let listed = repo.list_sessions_for_owner(&owner("u1")).await.unwrap();
        let ids: Vec<SessionId> = listed.iter().map(Session::id).collect();
        assert_eq!(ids, [newer.id(), older.id()]);
    }

    #[tokio::test]
    async fn save_rejects_unknown_question_references() {
        let repo = InMemoryRepository::new();
        let mut session = repo
            .insert_session(session_record(owner("u1"), fixed_now()))
            .await
            .unwrap();
        session.append_questions([QuestionId::generate()], fixed_now());

        let err = repo.save_session(&session).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn pin_and_note_updates_hit_missing_questions_as_not_found() {
        let repo = InMemoryRepository::new();
        let missing = QuestionId::generate();
        assert!(matches!(
            repo.set_pinned(missing, true, fixed_now()).await.unwrap_err(),
            StorageError::NotFound
        ));
        assert!(matches!(
            repo.set_note(missing, "x".into(), fixed_now()).await.unwrap_err(),
            StorageError::NotFound
        ));
    }
}
