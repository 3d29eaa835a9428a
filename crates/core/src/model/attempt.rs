use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::{AttemptId, QuizId, ScoreBand, SessionLabel, SessionSummary};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt title cannot be empty")]
    EmptyTitle,

    #[error("attempt needs at least one question")]
    NoQuestions,

    #[error("score must be between 0 and 100, got {0}")]
    InvalidScore(u8),

    #[error("unfinished attempts cannot carry a score")]
    ScoredUnfinished,

    #[error("unknown attempt status: {0}")]
    UnknownStatus(String),
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttemptStatus {
    Finished,
    Unfinished,
}

impl AttemptStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Finished => "Finished",
            Self::Unfinished => "Unfinished",
        }
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttemptStatus {
    type Err = AttemptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "finished" => Ok(Self::Finished),
            "unfinished" => Ok(Self::Unfinished),
            _ => Err(AttemptError::UnknownStatus(s.to_string())),
        }
    }
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// An attempt that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttempt {
    quiz_id: QuizId,
    label: SessionLabel,
    taken_at: DateTime<Utc>,
    status: AttemptStatus,
    score: u8,
    total_questions: u32,
}

impl NewAttempt {
    /// A finished attempt carrying the summary's percentage score.
    #[must_use]
    pub fn finished(summary: &SessionSummary) -> Self {
        Self {
            quiz_id: summary.quiz_id().clone(),
            label: summary.label().clone(),
            taken_at: summary.completed_at(),
            status: AttemptStatus::Finished,
            score: summary.score().percentage(),
            total_questions: summary.score().total(),
        }
    }

    /// An abandoned attempt. Unfinished attempts always score 0.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` if the label title is blank or there are no questions.
    pub fn unfinished(
        quiz_id: QuizId,
        label: SessionLabel,
        taken_at: DateTime<Utc>,
        total_questions: u32,
    ) -> Result<Self, AttemptError> {
        let attempt = Self {
            quiz_id,
            label,
            taken_at,
            status: AttemptStatus::Unfinished,
            score: 0,
            total_questions,
        };
        attempt.check()?;
        Ok(attempt)
    }

    fn check(&self) -> Result<(), AttemptError> {
        if self.label.title.trim().is_empty() {
            return Err(AttemptError::EmptyTitle);
        }
        if self.total_questions == 0 {
            return Err(AttemptError::NoQuestions);
        }
        if self.score > 100 {
            return Err(AttemptError::InvalidScore(self.score));
        }
        if self.status == AttemptStatus::Unfinished && self.score != 0 {
            return Err(AttemptError::ScoredUnfinished);
        }
        Ok(())
    }

    #[must_use]
    pub fn quiz_id(&self) -> &QuizId {
        &self.quiz_id
    }

    #[must_use]
    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    /// Attach the storage identifier.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` if the attempt is inconsistent.
    pub fn assign_id(self, id: AttemptId) -> Result<QuizAttempt, AttemptError> {
        self.check()?;
        Ok(QuizAttempt {
            id,
            quiz_id: self.quiz_id,
            title: self.label.title,
            subject: self.label.subject,
            taken_at: self.taken_at,
            status: self.status,
            score: self.score,
            total_questions: self.total_questions,
        })
    }
}

/// One row of the quiz history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizAttempt {
    id: AttemptId,
    quiz_id: QuizId,
    title: String,
    subject: String,
    taken_at: DateTime<Utc>,
    status: AttemptStatus,
    score: u8,
    total_questions: u32,
}

impl QuizAttempt {
    /// Rehydrate an attempt from stored fields.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` if the stored fields are inconsistent.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: AttemptId,
        quiz_id: QuizId,
        title: impl Into<String>,
        subject: impl Into<String>,
        taken_at: DateTime<Utc>,
        status: AttemptStatus,
        score: u8,
        total_questions: u32,
    ) -> Result<Self, AttemptError> {
        NewAttempt {
            quiz_id,
            label: SessionLabel::new(title, subject),
            taken_at,
            status,
            score,
            total_questions,
        }
        .assign_id(id)
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn quiz_id(&self) -> &QuizId {
        &self.quiz_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    #[must_use]
    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    /// Score band, only meaningful for finished attempts.
    #[must_use]
    pub fn band(&self) -> Option<ScoreBand> {
        match self.status {
            AttemptStatus::Finished => Some(ScoreBand::for_percentage(self.score)),
            AttemptStatus::Unfinished => None,
        }
    }

    /// Case-insensitive match on title or subject.
    #[must_use]
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        needle.is_empty()
            || self.title.to_lowercase().contains(&needle)
            || self.subject.to_lowercase().contains(&needle)
    }
}
