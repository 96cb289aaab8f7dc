use prep_core::model::{QuestionId, Session, SessionId, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    db, map_session_row, question_id_from_str, ser, session_id_from_str, topics_to_json,
};
use crate::repository::{NewSessionRecord, SessionRepository, StorageError};

impl SqliteRepository {
    async fn question_ids_for(&self, id: SessionId) -> Result<Vec<QuestionId>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT question_id FROM session_questions
            WHERE session_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter()
            .map(|row| question_id_from_str(&row.try_get::<String, _>("question_id").map_err(ser)?))
            .collect()
    }
}

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn insert_session(&self, record: NewSessionRecord) -> Result<Session, StorageError> {
        let id = SessionId::generate();
        let topics = topics_to_json(&record.topics)?;

        sqlx::query(
            r"
            INSERT INTO sessions (id, owner_id, role, experience_level, topics, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ",
        )
        .bind(id.to_string())
        .bind(record.owner.as_str())
        .bind(&record.role)
        .bind(record.experience_level.as_str())
        .bind(topics)
        .bind(&record.description)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(db)?;

        Ok(Session::from_persisted(
            id,
            record.owner,
            record.role,
            record.experience_level,
            record.topics,
            record.description,
            Vec::new(),
            record.created_at,
            record.created_at,
        ))
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<Session>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, owner_id, role, experience_level, topics, description, created_at, updated_at
            FROM sessions WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;

        match row {
            Some(row) => {
                let questions = self.question_ids_for(id).await?;
                map_session_row(&row, questions).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn list_sessions_for_owner(&self, owner: &UserId) -> Result<Vec<Session>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, owner_id, role, experience_level, topics, description, created_at, updated_at
            FROM sessions
            WHERE owner_id = ?1
            ORDER BY created_at DESC, rowid DESC
            ",
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in rows {
            let id = session_id_from_str(&row.try_get::<String, _>("id").map_err(ser)?)?;
            let questions = self.question_ids_for(id).await?;
            sessions.push(map_session_row(&row, questions)?);
        }
        Ok(sessions)
    }

    async fn save_session(&self, session: &Session) -> Result<(), StorageError> {
        let id = session.id().to_string();
        let mut tx = self.pool.begin().await.map_err(db)?;

        let res = sqlx::query(
            r"
            UPDATE sessions SET
                role = ?2,
                experience_level = ?3,
                topics = ?4,
                description = ?5,
                updated_at = ?6
            WHERE id = ?1
            ",
        )
        .bind(&id)
        .bind(session.role())
        .bind(session.experience_level().as_str())
        .bind(topics_to_json(session.topics())?)
        .bind(session.description())
        .bind(session.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(db)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        sqlx::query("DELETE FROM session_questions WHERE session_id = ?1")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(db)?;

        for (position, question_id) in session.question_ids().iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;
            sqlx::query(
                r"
                INSERT INTO session_questions (session_id, position, question_id)
                VALUES (?1, ?2, ?3)
                ",
            )
            .bind(&id)
            .bind(position)
            .bind(question_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        }

        tx.commit().await.map_err(db)?;
        Ok(())
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
