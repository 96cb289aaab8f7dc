mod experience;
mod ids;
mod question;
mod session;

pub use experience::ExperienceLevel;
pub use ids::{ParseIdError, QuestionId, SessionId, UserId};

pub use question::{Question, QuestionDraft, QuestionValidationError, ValidatedQuestion};
pub use session::{Session, SessionDraft, SessionValidationError, ValidatedSession};
