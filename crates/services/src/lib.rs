#![forbid(unsafe_code)]

pub mod error;
pub mod history;
pub mod sessions;
pub mod wizard;

pub use quiz_core::Clock;

pub use error::{HistoryError, SessionError, WizardError};
pub use history::{HistoryOverview, HistoryPage, HistoryQuery, HistoryService, HistoryTab};
pub use sessions::{QuizSession, SessionLoopService, SessionOutcome, SessionSnapshot};
pub use wizard::{QuizWizard, WizardStep};
