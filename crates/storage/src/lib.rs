#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, NewQuestionRecord, NewSessionRecord, QuestionRepository,
    SessionRepository, Storage, StorageError,
};
