//! Boundary shapes for question banks loaded from JSON.
//!
//! Records are loosely typed on purpose; they become `Question`s only after
//! validation, so malformed input is rejected here and never reaches a session.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use quiz_core::model::{Question, QuestionDraft, QuestionId, QuizId};

use crate::repository::{InMemoryRepository, StorageError};

/// Persisted shape for a question, matching the `question` / `choices` /
/// `correctAnswer` / `explanation` layout of the mock data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(alias = "prompt")]
    pub question: String,
    pub choices: Vec<String>,
    #[serde(rename = "correctAnswer", alias = "correct_answer")]
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuestionRecord {
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        Self {
            question: question.prompt().to_owned(),
            choices: question.choices().to_vec(),
            correct_answer: question.correct_answer().to_owned(),
            explanation: question.explanation().map(str::to_owned),
        }
    }

    fn into_draft(self) -> QuestionDraft {
        QuestionDraft {
            prompt: self.question,
            choices: self.choices,
            correct_answer: self.correct_answer,
            explanation: self.explanation,
        }
    }
}

/// Validate records for one quiz, numbering questions by position.
///
/// # Errors
///
/// Returns `StorageError::InvalidRecord` naming the first bad record.
pub fn into_questions(quiz: &str, records: Vec<QuestionRecord>) -> Result<Vec<Question>, StorageError> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            record
                .into_draft()
                .validate(QuestionId::from_position(index))
                .map_err(|source| StorageError::InvalidRecord {
                    quiz: quiz.to_string(),
                    index,
                    source,
                })
        })
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BankFile {
    Default(Vec<QuestionRecord>),
    ByQuiz(BTreeMap<String, Vec<QuestionRecord>>),
}

/// Validated question bank: a default list and/or per-quiz lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    default: Option<Vec<Question>>,
    quizzes: BTreeMap<QuizId, Vec<Question>>,
}

/// Key in a bank file whose list becomes the default bank.
pub const DEFAULT_BANK_KEY: &str = "default";

impl QuestionBank {
    #[must_use]
    pub fn with_default(questions: Vec<Question>) -> Self {
        Self {
            default: Some(questions),
            quizzes: BTreeMap::new(),
        }
    }

    /// Parse a bank from JSON.
    ///
    /// A top-level array becomes the default bank. A top-level object maps quiz
    /// ids to lists; the `"default"` key, if present, becomes the default bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for malformed JSON,
    /// `StorageError::InvalidRecord` for invalid questions and
    /// `StorageError::InvalidPersistedState` for blank quiz ids.
    pub fn from_json_str(raw: &str) -> Result<Self, StorageError> {
        let file: BankFile =
            serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))?;

        match file {
            BankFile::Default(records) => {
                Ok(Self::with_default(into_questions(DEFAULT_BANK_KEY, records)?))
            }
            BankFile::ByQuiz(map) => {
                let mut bank = Self::default();
                for (key, records) in map {
                    let questions = into_questions(&key, records)?;
                    if key == DEFAULT_BANK_KEY {
                        bank.default = Some(questions);
                        continue;
                    }
                    let quiz_id = QuizId::new(key)
                        .map_err(|e| StorageError::InvalidPersistedState(e.to_string()))?;
                    bank.quizzes.insert(quiz_id, questions);
                }
                Ok(bank)
            }
        }
    }

    /// Read and parse a bank file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the file cannot be read, or the
    /// parse errors of [`QuestionBank::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StorageError::Connection(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// Serialize as a JSON object keyed by quiz id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn to_json_pretty(&self) -> Result<String, StorageError> {
        let mut map: BTreeMap<String, Vec<QuestionRecord>> = self
            .quizzes
            .iter()
            .map(|(id, questions)| {
                (
                    id.to_string(),
                    questions.iter().map(QuestionRecord::from_question).collect(),
                )
            })
            .collect();
        if let Some(default) = &self.default {
            map.insert(
                DEFAULT_BANK_KEY.to_string(),
                default.iter().map(QuestionRecord::from_question).collect(),
            );
        }
        serde_json::to_string_pretty(&map).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    #[must_use]
    pub fn default_questions(&self) -> Option<&[Question]> {
        self.default.as_deref()
    }

    #[must_use]
    pub fn quiz(&self, id: &QuizId) -> Option<&[Question]> {
        self.quizzes.get(id).map(Vec::as_slice)
    }

    #[must_use]
    pub fn quiz_count(&self) -> usize {
        self.quizzes.len()
    }

    /// Move the bank into an in-memory repository.
    #[must_use]
    pub fn into_repository(self) -> InMemoryRepository {
        let repo = InMemoryRepository::new().with_quizzes(self.quizzes);
        match self.default {
            Some(default) => repo.with_default_bank(default),
            None => repo,
        }
    }
}
