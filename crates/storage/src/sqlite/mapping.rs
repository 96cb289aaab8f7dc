use prep_core::model::{ExperienceLevel, Question, QuestionId, Session, SessionId, UserId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Primary result code shared by every `SQLITE_CONSTRAINT_*` extended code.
const SQLITE_CONSTRAINT: i64 = 19;

/// Maps driver errors, surfacing constraint violations as `Conflict`.
///
/// `ON DELETE RESTRICT` reports `SQLITE_CONSTRAINT_TRIGGER` (1811) rather than
/// `SQLITE_CONSTRAINT_FOREIGNKEY`, so the primary code is checked directly.
pub(crate) fn db(e: sqlx::Error) -> StorageError {
    if let Some(db_err) = e.as_database_error() {
        let code = db_err.code().and_then(|c| c.parse::<i64>().ok());
        if is_constraint_code(code)
            || db_err.is_foreign_key_violation()
            || db_err.is_unique_violation()
        {
            return StorageError::Conflict;
        }
    }
    StorageError::Connection(e.to_string())
}

fn is_constraint_code(code: Option<i64>) -> bool {
    code.is_some_and(|c| c & 0xff == SQLITE_CONSTRAINT)
}

fn parse_uuid(field: &'static str, raw: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(raw).map_err(|_| StorageError::Serialization(format!("invalid {field}: {raw}")))
}

pub(crate) fn session_id_from_str(raw: &str) -> Result<SessionId, StorageError> {
    parse_uuid("session_id", raw).map(SessionId::from_uuid)
}

pub(crate) fn question_id_from_str(raw: &str) -> Result<QuestionId, StorageError> {
    parse_uuid("question_id", raw).map(QuestionId::from_uuid)
}

pub(crate) fn topics_to_json(topics: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(topics).map_err(ser)
}

fn topics_from_json(raw: &str) -> Result<Vec<String>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_session_row(
    row: &SqliteRow,
    questions: Vec<QuestionId>,
) -> Result<Session, StorageError> {
    let id = session_id_from_str(&row.try_get::<String, _>("id").map_err(ser)?)?;
    let owner = UserId::new(row.try_get::<String, _>("owner_id").map_err(ser)?).map_err(ser)?;
    let experience_level: ExperienceLevel = row
        .try_get::<String, _>("experience_level")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let topics = topics_from_json(&row.try_get::<String, _>("topics").map_err(ser)?)?;

    Ok(Session::from_persisted(
        id,
        owner,
        row.try_get("role").map_err(ser)?,
        experience_level,
        topics,
        row.try_get("description").map_err(ser)?,
        questions,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    ))
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let pinned: i64 = row.try_get("is_pinned").map_err(ser)?;
    Ok(Question::from_persisted(
        question_id_from_str(&row.try_get::<String, _>("id").map_err(ser)?)?,
        session_id_from_str(&row.try_get::<String, _>("session_id").map_err(ser)?)?,
        row.try_get("question").map_err(ser)?,
        row.try_get("answer").map_err(ser)?,
        pinned != 0,
        row.try_get("note").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extended_constraint_codes_count_as_constraints() {
        assert!(is_constraint_code(Some(19)));
        assert!(is_constraint_code(Some(787)));
        assert!(is_constraint_code(Some(1811)));
        assert!(is_constraint_code(Some(2067)));
        assert!(!is_constraint_code(Some(5)));
        assert!(!is_constraint_code(Some(517)));
        assert!(!is_constraint_code(None));
    }
}
