#![forbid(unsafe_code)]

pub mod records;
pub mod repository;
pub mod sample;

pub use records::{QuestionBank, QuestionRecord};
pub use repository::{AttemptRepository, InMemoryRepository, QuestionRepository, Storage, StorageError};
