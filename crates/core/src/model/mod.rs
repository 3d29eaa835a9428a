mod attempt;
mod ids;
mod question;
mod quiz;
mod score;
mod session;

pub use ids::{AttemptId, ParseIdError, QuestionId, QuizId};

pub use attempt::{AttemptError, AttemptStatus, NewAttempt, QuizAttempt};
pub use question::{Question, QuestionDraft, QuestionError, validate_all};
pub use quiz::{
    DEFAULT_QUESTION_COUNT, DEFAULT_TIME_LIMIT_MINUTES, ExamMode, QuizConfig, QuizConfigError,
    QuizDetails, QuizDetailsDraft, TimeSettings,
};
pub use score::{Score, ScoreBand};
pub use session::{SessionLabel, SessionPolicy, SessionSummary, SessionSummaryError};
