use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{QuizConfig, QuizId, Score};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("correct answers ({correct}) exceed question count ({total})")]
    CountMismatch { correct: u32, total: u32 },

    #[error("a session summary needs at least one question")]
    Empty,
}

//
// ─── POLICY ────────────────────────────────────────────────────────────────────
//

/// Rules applied by a quiz session on top of its fixed invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPolicy {
    validate_choices: bool,
    require_answer_to_advance: bool,
}

impl Default for SessionPolicy {
    /// Strict choices, free navigation.
    fn default() -> Self {
        Self {
            validate_choices: true,
            require_answer_to_advance: false,
        }
    }
}

impl SessionPolicy {
    /// Accept any answer string, the way a plain form binding would.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            validate_choices: false,
            require_answer_to_advance: false,
        }
    }

    #[must_use]
    pub fn with_choice_validation(mut self, enabled: bool) -> Self {
        self.validate_choices = enabled;
        self
    }

    /// Require an answer on the current question before `next` moves on.
    #[must_use]
    pub fn with_answer_required_to_advance(mut self, enabled: bool) -> Self {
        self.require_answer_to_advance = enabled;
        self
    }

    #[must_use]
    pub fn validates_choices(&self) -> bool {
        self.validate_choices
    }

    #[must_use]
    pub fn requires_answer_to_advance(&self) -> bool {
        self.require_answer_to_advance
    }
}

//
// ─── LABEL ─────────────────────────────────────────────────────────────────────
//

/// Human-facing title and subject shown for a session and its history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLabel {
    pub title: String,
    pub subject: String,
}

impl SessionLabel {
    #[must_use]
    pub fn new(title: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subject: subject.into(),
        }
    }

    /// Fallback label for quizzes entered by identifier only.
    #[must_use]
    pub fn for_quiz(quiz_id: &QuizId) -> Self {
        Self::new(format!("Quiz {quiz_id}"), "General")
    }

    #[must_use]
    pub fn from_config(config: &QuizConfig) -> Self {
        Self::new(config.details().name(), config.details().subject())
    }
}

//
// ─── SUMMARY ───────────────────────────────────────────────────────────────────
//

/// Aggregate result of a completed quiz session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    quiz_id: QuizId,
    label: SessionLabel,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    score: Score,
}

impl SessionSummary {
    /// Build a summary for a finished session.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if `completed_at` is before `started_at`,
    /// `SessionSummaryError::Empty` for a zero-length quiz and
    /// `SessionSummaryError::CountMismatch` if `correct` exceeds `total`.
    pub fn new(
        quiz_id: QuizId,
        label: SessionLabel,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        correct: u32,
        total: u32,
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }
        if total == 0 {
            return Err(SessionSummaryError::Empty);
        }
        if correct > total {
            return Err(SessionSummaryError::CountMismatch { correct, total });
        }

        Ok(Self {
            quiz_id,
            label,
            started_at,
            completed_at,
            score: Score::new(correct, total),
        })
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
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn quiz() -> QuizId {
        QuizId::new("quiz_1").unwrap()
    }

    #[test]
    fn default_policy_is_strict_without_gating() {
        let policy = SessionPolicy::default();
        assert!(policy.validates_choices());
        assert!(!policy.requires_answer_to_advance());

        let gated = SessionPolicy::permissive().with_answer_required_to_advance(true);
        assert!(!gated.validates_choices());
        assert!(gated.requires_answer_to_advance());
    }

    #[test]
    fn summary_scores_answers() {
        let now = fixed_now();
        let summary = SessionSummary::new(
            quiz(),
            SessionLabel::for_quiz(&quiz()),
            now,
            now + Duration::minutes(4),
            3,
            5,
        )
        .unwrap();

        assert_eq!(summary.score().percentage(), 60);
        assert_eq!(summary.label().title, "Quiz quiz_1");
        assert_eq!(summary.label().subject, "General");
    }

    #[test]
    fn summary_rejects_inconsistent_input() {
        let now = fixed_now();
        let label = SessionLabel::new("T", "S");
        assert_eq!(
            SessionSummary::new(quiz(), label.clone(), now, now - Duration::seconds(1), 1, 2)
                .unwrap_err(),
            SessionSummaryError::InvalidTimeRange
        );
        assert_eq!(
            SessionSummary::new(quiz(), label.clone(), now, now, 0, 0).unwrap_err(),
            SessionSummaryError::Empty
        );
        assert_eq!(
            SessionSummary::new(quiz(), label, now, now, 3, 2).unwrap_err(),
            SessionSummaryError::CountMismatch {
                correct: 3,
                total: 2
            }
        );
    }
}
