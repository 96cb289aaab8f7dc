use std::collections::HashMap;

use chrono::{DateTime, Utc};
use prep_core::model::{Question, QuestionId, SessionId};

use super::SqliteRepository;
use super::mapping::{db, map_question_row};
use crate::repository::{NewQuestionRecord, QuestionRepository, StorageError};

const QUESTION_COLUMNS: &str =
    "id, session_id, question, answer, is_pinned, note, created_at, updated_at";

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn insert_questions(
        &self,
        session_id: SessionId,
        records: Vec<NewQuestionRecord>,
    ) -> Result<Vec<Question>, StorageError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let session = session_id.to_string();
        let mut tx = self.pool.begin().await.map_err(db)?;

        let exists = sqlx::query("SELECT 1 FROM sessions WHERE id = ?1")
            .bind(&session)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db)?;
        if exists.is_none() {
            return Err(StorageError::NotFound);
        }

        let mut created = Vec::with_capacity(records.len());
        for record in records {
            let id = QuestionId::generate();
            sqlx::query(
                r"
                INSERT INTO questions (id, session_id, question, answer, is_pinned, note, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, 0, '', ?5, ?5)
                ",
            )
            .bind(id.to_string())
            .bind(&session)
            .bind(&record.question)
            .bind(&record.answer)
            .bind(record.created_at)
            .execute(&mut *tx)
            .await
            .map_err(db)?;

            created.push(Question::from_persisted(
                id,
                session_id,
                record.question,
                record.answer,
                false,
                String::new(),
                record.created_at,
                record.created_at,
            ));
        }

        tx.commit().await.map_err(db)?;
        Ok(created)
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;

        row.as_ref().map(map_question_row).transpose()
    }

    async fn get_questions(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id IN (");
        for i in 0..ids.len() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
            sql.push_str(&(i + 1).to_string());
        }
        sql.push(')');

        let mut q = sqlx::query(&sql);
        for id in ids {
            q = q.bind(id.to_string());
        }

        let rows = q.fetch_all(&self.pool).await.map_err(db)?;

        let mut by_id: HashMap<QuestionId, Question> = HashMap::with_capacity(rows.len());
        for row in rows {
            let question = map_question_row(&row)?;
            by_id.insert(question.id(), question);
        }

        // missing ids are skipped; duplicates resolve once
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn set_pinned(
        &self,
        id: QuestionId,
        pinned: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE questions SET is_pinned = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id.to_string())
            .bind(i64::from(pinned))
            .bind(updated_at)
            .execute(&self.pool)
            .await
            .map_err(db)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn set_note(
        &self,
        id: QuestionId,
        note: String,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE questions SET note = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id.to_string())
            .bind(note)
            .bind(updated_at)
            .execute(&self.pool)
            .await
            .map_err(db)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_questions_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<u64, StorageError> {
        let res = sqlx::query("DELETE FROM questions WHERE session_id = ?1")
            .bind(session_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(res.rows_affected())
    }
}
