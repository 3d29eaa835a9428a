use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

use quiz_core::model::{
    AttemptId, Question, QuizId, Score, SessionLabel, SessionPolicy, SessionSummary,
};

use super::progress::SessionProgress;
use super::view::{FeedbackView, NoteEntry, SessionSnapshot};
use crate::error::SessionError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory quiz-taking session over a fixed, ordered question list.
///
/// Holds the current position, the answers, per-question notes and feedback
/// flags, and the completion state. Every mutating operation either applies
/// fully and returns a fresh [`SessionSnapshot`], or fails and leaves the
/// session untouched.
///
/// Invariant: `current_index() < len()` at all times.
pub struct QuizSession {
    quiz_id: QuizId,
    label: SessionLabel,
    policy: SessionPolicy,
    questions: Vec<Question>,
    current: usize,
    answers: BTreeMap<usize, String>,
    notes: BTreeMap<usize, String>,
    feedback: BTreeMap<usize, bool>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    attempt_id: Option<AttemptId>,
}

impl QuizSession {
    /// Create a session positioned on the first question.
    ///
    /// `started_at` should come from the services layer clock to keep time deterministic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoQuestions` if `questions` is empty.
    pub fn new(
        quiz_id: QuizId,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::NoQuestions);
        }

        Ok(Self {
            label: SessionLabel::for_quiz(&quiz_id),
            quiz_id,
            policy: SessionPolicy::default(),
            questions,
            current: 0,
            answers: BTreeMap::new(),
            notes: BTreeMap::new(),
            feedback: BTreeMap::new(),
            started_at,
            completed_at: None,
            attempt_id: None,
        })
    }

    #[must_use]
    pub fn with_policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: SessionLabel) -> Self {
        self.label = label;
        self
    }

    #[must_use]
    pub fn quiz_id(&self) -> &QuizId {
        &self.quiz_id
    }

    #[must_use]
    pub fn label(&self) -> &SessionLabel {
        &self.label
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Number of questions. Never zero.
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    #[must_use]
    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    #[must_use]
    pub fn note(&self, index: usize) -> Option<&str> {
        self.notes.get(&index).map(String::as_str)
    }

    #[must_use]
    pub fn is_feedback_visible(&self, index: usize) -> bool {
        self.feedback.get(&index).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<usize, String> {
        &self.answers
    }

    #[must_use]
    pub fn notes(&self) -> &BTreeMap<usize, String> {
        &self.notes
    }

    #[must_use]
    pub fn feedback_flags(&self) -> &BTreeMap<usize, bool> {
        &self.feedback
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn attempt_id(&self) -> Option<AttemptId> {
        self.attempt_id
    }

    /// Indices without an answer, ascending.
    #[must_use]
    pub fn unanswered(&self) -> Vec<usize> {
        (0..self.questions.len())
            .filter(|index| !self.answers.contains_key(index))
            .collect()
    }

    /// Whether `next` would currently succeed.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.current + 1 < self.questions.len() && self.next_allowed_by_policy()
    }

    fn next_allowed_by_policy(&self) -> bool {
        !self.policy.requires_answer_to_advance() || self.answers.contains_key(&self.current)
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(self)
    }

    //
    // ─── OPERATIONS ────────────────────────────────────────────────────────────
    //

    /// Record `choice` for the current question and show its feedback.
    ///
    /// A previous answer for the same question is overwritten.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session is finished, and
    /// `SessionError::InvalidChoice` when the policy validates choices and
    /// `choice` is not one of the current question's choices.
    pub fn select_answer(
        &mut self,
        choice: impl Into<String>,
    ) -> Result<SessionSnapshot, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        let choice = choice.into();
        if self.policy.validates_choices() && !self.current_question().has_choice(&choice) {
            return Err(SessionError::InvalidChoice {
                index: self.current,
                choice,
            });
        }

        self.answers.insert(self.current, choice);
        self.feedback.insert(self.current, true);
        Ok(self.snapshot())
    }

    /// Move to `index` and hide any feedback previously shown there.
    ///
    /// Allowed after completion for reviewing answers and notes.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::OutOfRange` if `index >= len()`.
    pub fn go_to(&mut self, index: usize) -> Result<SessionSnapshot, SessionError> {
        if index >= self.questions.len() {
            return Err(SessionError::OutOfRange {
                index: i64::try_from(index).unwrap_or(i64::MAX),
                len: self.questions.len(),
            });
        }

        self.current = index;
        self.feedback.insert(index, false);
        Ok(self.snapshot())
    }

    /// Move to the following question. No wraparound.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::OutOfRange` on the last question, or
    /// `SessionError::AnswerRequired` when the policy gates on an unanswered
    /// current question.
    pub fn next(&mut self) -> Result<SessionSnapshot, SessionError> {
        if !self.next_allowed_by_policy() {
            return Err(SessionError::AnswerRequired {
                index: self.current,
            });
        }
        self.go_to(self.current.saturating_add(1))
    }

    /// Move to the preceding question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::OutOfRange` on the first question.
    pub fn previous(&mut self) -> Result<SessionSnapshot, SessionError> {
        let Some(index) = self.current.checked_sub(1) else {
            return Err(SessionError::OutOfRange {
                index: -1,
                len: self.questions.len(),
            });
        };
        self.go_to(index)
    }

    /// Store a note for the current question; an empty string clears it.
    ///
    /// Notes stay editable after completion.
    pub fn set_note(&mut self, text: impl Into<String>) -> SessionSnapshot {
        self.notes.insert(self.current, text.into());
        self.snapshot()
    }

    /// Complete the session. Scoring is final from here on.
    ///
    /// A `completed_at` earlier than the start (a clock stepping backwards) is
    /// clamped to the start time so the summary stays recordable.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if already finished, or
    /// `SessionError::IncompleteAnswers` listing every unanswered index.
    pub fn finish(&mut self, completed_at: DateTime<Utc>) -> Result<SessionSnapshot, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        let missing = self.unanswered();
        if !missing.is_empty() {
            return Err(SessionError::IncompleteAnswers { missing });
        }

        self.completed_at = Some(completed_at.max(self.started_at));
        Ok(self.snapshot())
    }

    /// Return to the creation-time state with the same questions.
    pub fn restart(&mut self, started_at: DateTime<Utc>) -> SessionSnapshot {
        self.current = 0;
        self.answers.clear();
        self.notes.clear();
        self.feedback.clear();
        self.started_at = started_at;
        self.completed_at = None;
        self.attempt_id = None;
        self.snapshot()
    }

    //
    // ─── DERIVED VALUES ────────────────────────────────────────────────────────
    //

    /// Number of answers equal to their question's correct choice.
    #[must_use]
    pub fn correct_count(&self) -> u32 {
        let count = self
            .answers
            .iter()
            .filter(|(index, answer)| {
                self.questions
                    .get(**index)
                    .is_some_and(|question| question.is_correct(answer))
            })
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn score(&self) -> Score {
        Score::new(
            self.correct_count(),
            u32::try_from(self.questions.len()).unwrap_or(u32::MAX),
        )
    }

    /// `(current + 1) / len`, the position through the quiz.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        (self.current + 1) as f64 / self.questions.len() as f64
    }

    #[must_use]
    pub fn progress_details(&self) -> SessionProgress {
        let answered = self.answers.len();
        SessionProgress {
            position: self.current + 1,
            total: self.questions.len(),
            answered,
            unanswered: self.questions.len() - answered,
            notes: self.notes.values().filter(|n| !n.is_empty()).count(),
            ratio: self.progress(),
            is_complete: self.is_complete(),
        }
    }

    /// Feedback for the current question, if it is visible and answered.
    #[must_use]
    pub fn current_feedback(&self) -> Option<FeedbackView> {
        if !self.is_feedback_visible(self.current) {
            return None;
        }
        let selected = self.answer(self.current)?;
        let question = self.current_question();
        Some(FeedbackView {
            is_correct: question.is_correct(selected),
            selected: selected.to_owned(),
            correct_answer: question.correct_answer().to_owned(),
            explanation: question.explanation().map(str::to_owned),
        })
    }

    /// Non-empty notes in question order.
    #[must_use]
    pub fn notes_summary(&self) -> Vec<NoteEntry> {
        self.notes
            .iter()
            .filter(|(_, text)| !text.is_empty())
            .map(|(index, text)| NoteEntry {
                number: index + 1,
                text: text.clone(),
            })
            .collect()
    }

    pub(crate) fn build_summary(&self) -> Result<SessionSummary, SessionError> {
        let completed_at = self.completed_at.ok_or(SessionError::NotCompleted)?;
        let score = self.score();
        Ok(SessionSummary::new(
            self.quiz_id.clone(),
            self.label.clone(),
            self.started_at,
            completed_at,
            score.correct(),
            score.total(),
        )?)
    }

    pub(crate) fn set_attempt_id(&mut self, id: AttemptId) {
        self.attempt_id = Some(id);
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("quiz_id", &self.quiz_id)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .field("notes_len", &self.notes.len())
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .field("attempt_id", &self.attempt_id)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{QuestionDraft, QuestionId};
    use quiz_core::time::fixed_now;

    fn build_question(id: u64, correct: &str) -> Question {
        QuestionDraft::new(format!("Question {id}"), ["A", "B", "C", "D"], correct)
            .with_explanation(format!("Because {correct}."))
            .validate(QuestionId::new(id))
            .unwrap()
    }

    fn build_session(correct: &[&str]) -> QuizSession {
        let questions = correct
            .iter()
            .enumerate()
            .map(|(i, c)| build_question(i as u64 + 1, c))
            .collect();
        QuizSession::new(QuizId::new("quiz_test").unwrap(), questions, fixed_now()).unwrap()
    }

    fn answer_all(session: &mut QuizSession, answers: &[&str]) {
        for (index, answer) in answers.iter().enumerate() {
            session.go_to(index).unwrap();
            session.select_answer(*answer).unwrap();
        }
    }

    #[test]
    fn empty_session_returns_error() {
        let err = QuizSession::new(QuizId::new("q").unwrap(), Vec::new(), fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::NoQuestions));
    }

    #[test]
    fn new_session_starts_at_first_question() {
        let session = build_session(&["A", "B", "C"]);
        assert_eq!(session.current_index(), 0);
        assert!(session.answers().is_empty());
        assert!(!session.is_complete());
        assert_eq!(session.label().title, "Quiz quiz_test");
    }

    #[test]
    fn two_question_scenario_scores_fifty_percent() {
        let mut session = build_session(&["A", "B"]);
        session.select_answer("A").unwrap();
        session.next().unwrap();
        session.select_answer("C").unwrap();
        let snapshot = session.finish(fixed_now()).unwrap();

        assert!(snapshot.completed);
        assert_eq!(session.score().correct(), 1);
        assert_eq!(session.score().percentage(), 50);
        let result = snapshot.result.unwrap();
        assert_eq!((result.correct, result.total, result.percentage), (1, 2, 50));
    }

    #[test]
    fn go_to_out_of_range_leaves_state_unchanged() {
        let mut session = build_session(&["A", "B", "C"]);
        session.select_answer("B").unwrap();
        session.set_note("tricky");
        let before = session.snapshot();

        let err = session.go_to(5).unwrap_err();
        assert!(matches!(err, SessionError::OutOfRange { index: 5, len: 3 }));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn next_and_previous_stop_at_the_edges() {
        let mut session = build_session(&["A", "B"]);
        assert!(matches!(
            session.previous(),
            Err(SessionError::OutOfRange { index: -1, len: 2 })
        ));
        assert_eq!(session.current_index(), 0);

        session.next().unwrap();
        assert!(matches!(
            session.next(),
            Err(SessionError::OutOfRange { index: 2, len: 2 })
        ));
        assert_eq!(session.current_index(), 1);

        session.previous().unwrap();
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn jumping_ahead_is_not_gated_by_default() {
        let mut session = build_session(&["A", "B", "C", "D"]);
        session.go_to(3).unwrap();
        assert_eq!(session.current_index(), 3);
        session.next().unwrap_err();
        session.go_to(0).unwrap();
        session.next().unwrap();
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn gated_policy_requires_answer_before_next() {
        let mut session = build_session(&["A", "B", "C"])
            .with_policy(SessionPolicy::default().with_answer_required_to_advance(true));

        assert!(!session.can_advance());
        assert!(matches!(
            session.next(),
            Err(SessionError::AnswerRequired { index: 0 })
        ));
        assert_eq!(session.current_index(), 0);

        session.select_answer("D").unwrap();
        assert!(session.can_advance());
        session.next().unwrap();

        // goTo is never gated
        session.go_to(2).unwrap();
        assert_eq!(session.current_index(), 2);
    }

    #[test]
    fn selecting_shows_feedback_and_navigation_hides_it() {
        let mut session = build_session(&["A", "B"]);
        assert!(session.current_feedback().is_none());

        let snapshot = session.select_answer("C").unwrap();
        assert!(session.is_feedback_visible(0));
        let feedback = snapshot.feedback.unwrap();
        assert!(!feedback.is_correct);
        assert_eq!(feedback.selected, "C");
        assert_eq!(feedback.correct_answer, "A");
        assert_eq!(feedback.explanation.as_deref(), Some("Because A."));

        session.next().unwrap();
        session.previous().unwrap();
        assert!(!session.is_feedback_visible(0));
        assert_eq!(session.feedback_flags().get(&0), Some(&false));
        assert!(session.current_feedback().is_none());
        // answer survives navigation
        assert_eq!(session.answer(0), Some("C"));

        session.select_answer("A").unwrap();
        assert!(session.is_feedback_visible(0));
        assert!(session.current_feedback().unwrap().is_correct);
    }

    #[test]
    fn go_to_clears_feedback_even_on_current_question() {
        let mut session = build_session(&["A", "B"]);
        session.select_answer("A").unwrap();
        session.go_to(0).unwrap();
        assert!(!session.is_feedback_visible(0));
    }

    #[test]
    fn reselecting_overwrites_the_answer() {
        let mut session = build_session(&["A"]);
        session.select_answer("B").unwrap();
        session.select_answer("A").unwrap();
        assert_eq!(session.answer(0), Some("A"));
        assert_eq!(session.answers().len(), 1);
        assert_eq!(session.correct_count(), 1);
    }

    #[test]
    fn strict_policy_rejects_unknown_choice_without_mutation() {
        let mut session = build_session(&["A", "B"]);
        let before = session.snapshot();
        let err = session.select_answer("Z").unwrap_err();
        assert!(matches!(err, SessionError::InvalidChoice { index: 0, .. }));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn permissive_policy_accepts_any_answer() {
        let mut session = build_session(&["A", "B"]).with_policy(SessionPolicy::permissive());
        session.select_answer("anything").unwrap();
        assert_eq!(session.answer(0), Some("anything"));
        assert_eq!(session.correct_count(), 0);
    }

    #[test]
    fn finish_lists_exactly_the_missing_indices() {
        let mut session = build_session(&["A", "B", "C", "D", "A"]);
        for index in [0, 1, 2, 4] {
            session.go_to(index).unwrap();
            session.select_answer("A").unwrap();
        }
        let before = session.snapshot();
        assert!(!before.can_finish);

        match session.finish(fixed_now()).unwrap_err() {
            SessionError::IncompleteAnswers { missing } => assert_eq!(missing, vec![3]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!session.is_complete());
        assert_eq!(session.snapshot(), before);

        session.go_to(3).unwrap();
        session.select_answer("D").unwrap();
        assert!(session.snapshot().can_finish);
        session.finish(fixed_now()).unwrap();
        assert_eq!(session.score().correct(), 3);
    }

    #[test]
    fn completed_session_rejects_answers_but_allows_review_and_notes() {
        let mut session = build_session(&["A", "B"]);
        answer_all(&mut session, &["A", "B"]);
        let done_at = fixed_now() + Duration::minutes(3);
        session.finish(done_at).unwrap();

        assert!(matches!(
            session.select_answer("C"),
            Err(SessionError::Completed)
        ));
        assert!(matches!(
            session.finish(fixed_now()),
            Err(SessionError::Completed)
        ));
        assert_eq!(session.completed_at(), Some(done_at));

        session.go_to(0).unwrap();
        session.next().unwrap();
        let snapshot = session.set_note("review later");
        assert!(snapshot.completed);
        assert_eq!(session.score().percentage(), 100);
        assert_eq!(snapshot.result.unwrap().notes[0].number, 2);
    }

    #[test]
    fn score_ignores_navigation_and_notes() {
        let mut session = build_session(&["A", "B", "C"]);
        let mut last = session.score().correct();
        for (index, answer) in ["A", "B", "C"].iter().enumerate() {
            session.go_to(index).unwrap();
            session.select_answer(*answer).unwrap();
            let now = session.score().correct();
            assert!(now >= last);
            last = now;

            session.set_note(format!("note {index}"));
            session.go_to(0).unwrap();
            assert_eq!(session.score().correct(), last);
        }
        assert_eq!(last, 3);
    }

    #[test]
    fn restart_clears_everything_but_questions() {
        let mut session = build_session(&["A", "B", "C"]);
        answer_all(&mut session, &["A", "C", "C"]);
        session.set_note("n");
        session.finish(fixed_now()).unwrap();
        let score_before = session.score();

        let later = fixed_now() + Duration::hours(1);
        let snapshot = session.restart(later);
        assert_eq!(snapshot.index, 0);
        assert!(snapshot.answers.is_empty());
        assert!(snapshot.notes.is_empty());
        assert!(snapshot.feedback_visible.is_empty());
        assert!(!snapshot.completed);
        assert_eq!(session.len(), 3);
        assert_eq!(session.started_at(), later);

        answer_all(&mut session, &["A", "C", "C"]);
        assert_eq!(session.score(), score_before);
    }

    #[test]
    fn progress_tracks_position_not_answers() {
        let mut session = build_session(&["A", "B", "C", "D"]);
        assert!((session.progress() - 0.25).abs() < f64::EPSILON);
        session.go_to(3).unwrap();
        assert!((session.progress() - 1.0).abs() < f64::EPSILON);
        assert_eq!(session.progress_details().answered, 0);
        assert_eq!(session.progress_details().percent(), 100);
    }

    #[test]
    fn notes_summary_skips_empty_notes_and_is_ordered() {
        let mut session = build_session(&["A", "B", "C"]);
        session.go_to(2).unwrap();
        session.set_note("last");
        session.go_to(0).unwrap();
        session.set_note("first");
        session.go_to(1).unwrap();
        session.set_note("");

        let notes = session.notes_summary();
        assert_eq!(
            notes,
            vec![
                NoteEntry {
                    number: 1,
                    text: "first".into()
                },
                NoteEntry {
                    number: 3,
                    text: "last".into()
                },
            ]
        );
        assert_eq!(session.note(1), Some(""));
        assert_eq!(session.progress_details().notes, 2);
    }

    #[test]
    fn summary_requires_completion() {
        let mut session = build_session(&["A"]);
        assert!(matches!(
            session.build_summary(),
            Err(SessionError::NotCompleted)
        ));
        session.select_answer("A").unwrap();
        session.finish(fixed_now() + Duration::seconds(30)).unwrap();
        let summary = session.build_summary().unwrap();
        assert_eq!(summary.score().percentage(), 100);
    }

    #[test]
    fn completion_before_start_is_clamped_to_start() {
        let mut session = build_session(&["A", "B"]);
        answer_all(&mut session, &["A", "B"]);
        session.finish(fixed_now() - Duration::seconds(1)).unwrap();

        assert_eq!(session.completed_at(), Some(fixed_now()));
        let summary = session.build_summary().unwrap();
        assert_eq!(summary.started_at(), summary.completed_at());
        assert_eq!(summary.score().correct(), 2);
    }

    #[test]
    fn snapshot_serializes_for_front_ends() {
        let mut session = build_session(&["A", "B"]);
        let json = session.select_answer("B").unwrap().to_json().unwrap();
        assert!(json.contains("\"quiz_id\":\"quiz_test\""));
        assert!(json.contains("\"answers\":{\"0\":\"B\"}"));
    }
}
