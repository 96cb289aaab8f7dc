use std::cmp::Ordering;
use std::collections::HashMap;

use prep_core::model::{Question, QuestionId, Session};

/// A session with its question list resolved for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDetail {
    pub session: Session,
    pub questions: Vec<Question>,
}

impl SessionDetail {
    /// Pair a session with its resolved questions, sorted for display.
    #[must_use]
    pub fn new(session: Session, mut questions: Vec<Question>) -> Self {
        sort_for_display(&session, &mut questions);
        Self { session, questions }
    }
}

/// Pinned questions first, then newest `created_at` first.
///
/// Batch members share a timestamp, so ties fall back to the position in the
/// session's reference list: later position means created later.
pub fn sort_for_display(session: &Session, questions: &mut [Question]) {
    let positions: HashMap<QuestionId, usize> = session
        .question_ids()
        .iter()
        .enumerate()
        .map(|(pos, id)| (*id, pos))
        .collect();

    questions.sort_by(|a, b| display_order(a, b, &positions));
}

fn display_order(a: &Question, b: &Question, positions: &HashMap<QuestionId, usize>) -> Ordering {
    b.is_pinned()
        .cmp(&a.is_pinned())
        .then_with(|| b.created_at().cmp(&a.created_at()))
        .then_with(|| positions.get(&b.id()).cmp(&positions.get(&a.id())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use prep_core::model::{QuestionDraft, SessionDraft, SessionId, UserId};
    use prep_core::time::fixed_now;

    fn session_with(questions: &[&Question]) -> Session {
        let mut session = SessionDraft {
            role: "SRE".into(),
            experience_level: "Senior".into(),
            topics: vec!["Linux".into()],
            description: None,
        }
        .validate(UserId::new("u1").unwrap(), fixed_now())
        .unwrap()
        .assign_id(SessionId::generate());
        session.replace_questions(questions.iter().map(|q| q.id()).collect(), fixed_now());
        session
    }

    fn question(text: &str, offset_secs: i64, pinned: bool) -> Question {
        let mut q = Question::new(
            QuestionId::generate(),
            SessionId::generate(),
            QuestionDraft::new(text, "").validate().unwrap(),
            fixed_now() + Duration::seconds(offset_secs),
        );
        if pinned {
            q.toggle_pin(fixed_now());
        }
        q
    }

    fn texts(detail: &SessionDetail) -> Vec<&str> {
        detail.questions.iter().map(Question::question).collect()
    }

    #[test]
    fn pinned_precede_unpinned_then_newest_first() {
        let old_pinned = question("old pinned", 0, true);
        let old = question("old", 1, false);
        let new_pinned = question("new pinned", 10, true);
        let new = question("new", 11, false);
        let session = session_with(&[&old_pinned, &old, &new_pinned, &new]);

        let detail = SessionDetail::new(session, vec![old, new, old_pinned, new_pinned]);
        assert_eq!(texts(&detail), ["new pinned", "old pinned", "new", "old"]);
    }

    #[test]
    fn same_timestamp_falls_back_to_list_position() {
        let a = question("a", 0, false);
        let b = question("b", 0, false);
        let c = question("c", 0, false);
        let session = session_with(&[&a, &b, &c]);

        let detail = SessionDetail::new(session, vec![a, b, c]);
        assert_eq!(texts(&detail), ["c", "b", "a"]);
    }
}
