//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{AttemptError, ParseIdError, QuizConfigError, SessionSummaryError};
use storage::repository::StorageError;

use crate::wizard::WizardStep;

/// Errors emitted by the quiz session and its workflow.
///
/// Every controller error leaves the session exactly as it was.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    NoQuestions,
    #[error("question index {index} is out of range for {len} questions")]
    OutOfRange { index: i64, len: usize },
    #[error("cannot finish: unanswered questions {missing:?}")]
    IncompleteAnswers { missing: Vec<usize> },
    #[error("{choice:?} is not a choice of question {index}")]
    InvalidChoice { index: usize, choice: String },
    #[error("question {index} must be answered before moving on")]
    AnswerRequired { index: usize },
    #[error("session already completed")]
    Completed,
    #[error("session is not completed yet")]
    NotCompleted,
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the quiz-creation wizard.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WizardError {
    #[error("step {step:?} is incomplete: {source}")]
    StepInvalid {
        step: WizardStep,
        #[source]
        source: QuizConfigError,
    },
    #[error("already at the first step")]
    AtFirstStep,
    #[error("already at the last step")]
    AtLastStep,
    #[error("quiz can only be generated from the preview step, currently at {step:?}")]
    NotReady { step: WizardStep },
    #[error(transparent)]
    Config(#[from] QuizConfigError),
    #[error(transparent)]
    Id(#[from] ParseIdError),
}

/// Errors emitted by `HistoryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryError {
    #[error("page {page} is out of range (1..={total_pages})")]
    PageOutOfRange { page: u32, total_pages: u32 },
    #[error(transparent)]
    Storage(#[from] StorageError),
}
