use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuizId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizConfigError {
    #[error("time limit must be > 0 minutes")]
    InvalidTimeLimit,

    #[error("subject cannot be empty")]
    EmptySubject,

    #[error("at least one chapter must be selected")]
    NoChapters,

    #[error("quiz name cannot be empty")]
    EmptyName,

    #[error("question count must be > 0")]
    InvalidQuestionCount,

    #[error("unknown exam mode: {0}")]
    UnknownExamMode(String),
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Default time limit applied when timing is switched on.
pub const DEFAULT_TIME_LIMIT_MINUTES: u32 = 30;

/// Default number of questions for a new quiz.
pub const DEFAULT_QUESTION_COUNT: u32 = 10;

/// Timing configuration of a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeSettings {
    time_limit_minutes: Option<u32>,
}

impl TimeSettings {
    #[must_use]
    pub fn untimed() -> Self {
        Self {
            time_limit_minutes: None,
        }
    }

    /// Timed quiz with the given limit.
    ///
    /// # Errors
    ///
    /// Returns `QuizConfigError::InvalidTimeLimit` for a zero limit.
    pub fn timed(minutes: u32) -> Result<Self, QuizConfigError> {
        if minutes == 0 {
            return Err(QuizConfigError::InvalidTimeLimit);
        }
        Ok(Self {
            time_limit_minutes: Some(minutes),
        })
    }

    /// Toggle timing. Switching on keeps an existing limit or falls back to
    /// the default; switching off drops the limit.
    #[must_use]
    pub fn with_timed(self, timed: bool) -> Self {
        if timed {
            Self {
                time_limit_minutes: Some(
                    self.time_limit_minutes.unwrap_or(DEFAULT_TIME_LIMIT_MINUTES),
                ),
            }
        } else {
            Self::untimed()
        }
    }

    #[must_use]
    pub fn is_timed(&self) -> bool {
        self.time_limit_minutes.is_some()
    }

    #[must_use]
    pub fn time_limit_minutes(&self) -> Option<u32> {
        self.time_limit_minutes
    }
}

/// Which pool of questions a quiz draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamMode {
    /// Previously attempted and solved questions.
    Solved,
    /// Questions never seen before.
    New,
    /// Questions saved for later practice.
    Bookmarked,
    /// A mix of every pool.
    #[default]
    All,
}

impl ExamMode {
    pub const ALL: [ExamMode; 4] = [Self::Solved, Self::New, Self::Bookmarked, Self::All];

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Solved => "Previously Solved",
            Self::New => "New Questions",
            Self::Bookmarked => "Bookmarked",
            Self::All => "Mixed Questions",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Solved => "solved",
            Self::New => "new",
            Self::Bookmarked => "bookmarked",
            Self::All => "all",
        }
    }
}

impl fmt::Display for ExamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExamMode {
    type Err = QuizConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| QuizConfigError::UnknownExamMode(s.to_string()))
    }
}

//
// ─── DETAILS ───────────────────────────────────────────────────────────────────
//

/// Editable quiz details as collected by the creation wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDetailsDraft {
    pub subject: String,
    pub chapters: Vec<String>,
    pub name: String,
    pub question_count: u32,
}

impl Default for QuizDetailsDraft {
    fn default() -> Self {
        Self {
            subject: String::new(),
            chapters: Vec::new(),
            name: String::new(),
            question_count: DEFAULT_QUESTION_COUNT,
        }
    }
}

impl QuizDetailsDraft {
    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns the first `QuizConfigError` found, checked in form order.
    pub fn validate(&self) -> Result<QuizDetails, QuizConfigError> {
        let subject = self.subject.trim();
        if subject.is_empty() {
            return Err(QuizConfigError::EmptySubject);
        }
        let chapters: Vec<String> = self
            .chapters
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if chapters.is_empty() {
            return Err(QuizConfigError::NoChapters);
        }
        let name = self.name.trim();
        if name.is_empty() {
            return Err(QuizConfigError::EmptyName);
        }
        if self.question_count == 0 {
            return Err(QuizConfigError::InvalidQuestionCount);
        }

        Ok(QuizDetails {
            subject: subject.to_string(),
            chapters,
            name: name.to_string(),
            question_count: self.question_count,
        })
    }
}

/// Validated quiz details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDetails {
    subject: String,
    chapters: Vec<String>,
    name: String,
    question_count: u32,
}

impl QuizDetails {
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn chapters(&self) -> &[String] {
        &self.chapters
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// A generated quiz: identifier plus everything the wizard collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizConfig {
    id: QuizId,
    time: TimeSettings,
    exam_mode: ExamMode,
    details: QuizDetails,
}

impl QuizConfig {
    #[must_use]
    pub fn new(id: QuizId, time: TimeSettings, exam_mode: ExamMode, details: QuizDetails) -> Self {
        Self {
            id,
            time,
            exam_mode,
            details,
        }
    }

    #[must_use]
    pub fn id(&self) -> &QuizId {
        &self.id
    }

    #[must_use]
    pub fn time(&self) -> TimeSettings {
        self.time
    }

    #[must_use]
    pub fn exam_mode(&self) -> ExamMode {
        self.exam_mode
    }

    #[must_use]
    pub fn details(&self) -> &QuizDetails {
        &self.details
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> QuizDetailsDraft {
        QuizDetailsDraft {
            subject: " Mathematics ".into(),
            chapters: vec!["Algebra".into(), "  ".into()],
            name: "Midterm prep".into(),
            question_count: 5,
        }
    }

    #[test]
    fn toggling_timing_defaults_to_thirty_minutes() {
        let on = TimeSettings::untimed().with_timed(true);
        assert_eq!(on.time_limit_minutes(), Some(DEFAULT_TIME_LIMIT_MINUTES));

        let custom = TimeSettings::timed(45).unwrap().with_timed(true);
        assert_eq!(custom.time_limit_minutes(), Some(45));

        let off = custom.with_timed(false);
        assert!(!off.is_timed());
        assert_eq!(off.time_limit_minutes(), None);
    }

    #[test]
    fn zero_time_limit_is_rejected() {
        assert_eq!(
            TimeSettings::timed(0).unwrap_err(),
            QuizConfigError::InvalidTimeLimit
        );
    }

    #[test]
    fn exam_mode_parses_case_insensitively() {
        assert_eq!("Bookmarked".parse::<ExamMode>().unwrap(), ExamMode::Bookmarked);
        assert_eq!(ExamMode::default(), ExamMode::All);
        assert!(matches!(
            "random".parse::<ExamMode>(),
            Err(QuizConfigError::UnknownExamMode(_))
        ));
    }

    #[test]
    fn details_are_normalized() {
        let validated = details().validate().unwrap();
        assert_eq!(validated.subject(), "Mathematics");
        assert_eq!(validated.chapters(), ["Algebra"]);
        assert_eq!(validated.question_count(), 5);
    }

    #[test]
    fn details_errors_follow_form_order() {
        let mut d = details();
        d.subject.clear();
        d.name.clear();
        assert_eq!(d.validate().unwrap_err(), QuizConfigError::EmptySubject);

        let mut d = details();
        d.chapters = vec![" ".into()];
        assert_eq!(d.validate().unwrap_err(), QuizConfigError::NoChapters);

        let mut d = details();
        d.name = "\t".into();
        assert_eq!(d.validate().unwrap_err(), QuizConfigError::EmptyName);

        let mut d = details();
        d.question_count = 0;
        assert_eq!(
            d.validate().unwrap_err(),
            QuizConfigError::InvalidQuestionCount
        );
    }

    #[test]
    fn default_details_start_at_ten_questions() {
        let d = QuizDetailsDraft::default();
        assert_eq!(d.question_count, DEFAULT_QUESTION_COUNT);
        assert!(d.validate().is_err());
    }
}
