use async_trait::async_trait;
use quiz_core::model::{
    AttemptId, AttemptStatus, NewAttempt, Question, QuestionError, QuizAttempt, QuizId,
};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid question record {index} for quiz {quiz}: {source}")]
    InvalidRecord {
        quiz: String,
        index: usize,
        #[source]
        source: QuestionError,
    },

    #[error("invalid stored record: {0}")]
    InvalidPersistedState(String),
}

/// Question source contract: an ordered, validated question list per quiz.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Fetch the questions for a quiz, in presentation order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz is unknown, or other storage errors.
    async fn questions_for(&self, quiz_id: &QuizId) -> Result<Vec<Question>, StorageError>;

    /// Replace the question list of a quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the questions cannot be stored.
    async fn put_questions(
        &self,
        quiz_id: QuizId,
        questions: Vec<Question>,
    ) -> Result<(), StorageError>;
}

/// History of quiz attempts.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Store a new attempt and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt is inconsistent or cannot be stored.
    async fn append_attempt(&self, attempt: NewAttempt) -> Result<AttemptId, StorageError>;

    /// Fetch an attempt by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn get_attempt(&self, id: AttemptId) -> Result<QuizAttempt, StorageError>;

    /// List attempts, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_attempts(&self, limit: u32) -> Result<Vec<QuizAttempt>, StorageError>;
}

/// Simple in-memory repository implementation for the mock data layer and tests.
///
/// Quizzes without their own question list fall back to the default bank when
/// one is configured.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<HashMap<QuizId, Vec<Question>>>>,
    default_bank: Option<Arc<Vec<Question>>>,
    attempts: Arc<Mutex<Vec<QuizAttempt>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `questions` for any quiz id that has no list of its own.
    #[must_use]
    pub fn with_default_bank(mut self, questions: Vec<Question>) -> Self {
        self.default_bank = Some(Arc::new(questions));
        self
    }

    /// Seed stored quiz lists.
    #[must_use]
    pub fn with_quizzes(self, quizzes: impl IntoIterator<Item = (QuizId, Vec<Question>)>) -> Self {
        if let Ok(mut guard) = self.questions.lock() {
            guard.extend(quizzes);
        }
        self
    }

    /// Seed existing history rows.
    #[must_use]
    pub fn with_attempts(self, attempts: impl IntoIterator<Item = QuizAttempt>) -> Self {
        if let Ok(mut guard) = self.attempts.lock() {
            guard.extend(attempts);
        }
        self
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn questions_for(&self, quiz_id: &QuizId) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if let Some(questions) = guard.get(quiz_id) {
            return Ok(questions.clone());
        }
        self.default_bank
            .as_ref()
            .map(|bank| bank.as_ref().clone())
            .ok_or(StorageError::NotFound)
    }

    async fn put_questions(
        &self,
        quiz_id: QuizId,
        questions: Vec<Question>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(quiz_id, questions);
        Ok(())
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, attempt: NewAttempt) -> Result<AttemptId, StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let next = guard.iter().map(|a| a.id().value()).max().unwrap_or(0) + 1;
        let id = AttemptId::new(next);
        let stored = attempt
            .assign_id(id)
            .map_err(|e| StorageError::InvalidPersistedState(e.to_string()))?;
        guard.push(stored);
        Ok(id)
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<QuizAttempt, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|a| a.id() == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_attempts(&self, limit: u32) -> Result<Vec<QuizAttempt>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows = guard.clone();
        rows.sort_by_key(|a| Reverse((a.taken_at(), a.id())));
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Count attempts per status, e.g. for tab badges.
#[must_use]
pub fn count_by_status(attempts: &[QuizAttempt], status: AttemptStatus) -> usize {
    attempts.iter().filter(|a| a.status() == status).count()
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_repository(repo: InMemoryRepository) -> Self {
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Self {
            questions,
            attempts,
        }
    }
}
