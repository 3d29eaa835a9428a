//! Bundled mock data: a five-question math bank and a short quiz history.

use chrono::{NaiveDate, TimeZone, Utc};
use quiz_core::model::{AttemptId, AttemptStatus, Question, QuestionDraft, QuizAttempt, QuizId};

use crate::records::QuestionBank;
use crate::repository::{InMemoryRepository, StorageError};

fn sample_drafts() -> Vec<QuestionDraft> {
    vec![
        QuestionDraft::new(
            "What is the formula for calculating the area of a circle?",
            ["A = πr²", "A = 2πr", "A = πd", "A = 2πd²"],
            "A = πr²",
        )
        .with_explanation(
            "The area of a circle is calculated using the formula A = πr², where r is the radius.",
        ),
        QuestionDraft::new(
            "Which of the following is a quadratic equation?",
            ["2x + 3 = 7", "x² + 5x + 6 = 0", "3x - 2 = 10", "4x + 1 = 9"],
            "x² + 5x + 6 = 0",
        )
        .with_explanation("A quadratic equation has the form ax² + bx + c = 0, where a ≠ 0."),
        QuestionDraft::new("What is the value of sin(90°)?", ["0", "1", "-1", "Undefined"], "1")
            .with_explanation(
                "The sine of 90 degrees equals 1, as it represents the maximum value of the sine function.",
            ),
        QuestionDraft::new(
            "In a right triangle, if one angle is 30°, what is the other acute angle?",
            ["45°", "60°", "90°", "120°"],
            "60°",
        )
        .with_explanation(
            "In a right triangle, the sum of the two acute angles is 90°. So if one is 30°, the other is 60°.",
        ),
        QuestionDraft::new("What is the derivative of x³?", ["x²", "2x²", "3x²", "3x"], "3x²")
            .with_explanation("The derivative of x³ is 3x², using the power rule: d/dx(xⁿ) = nxⁿ⁻¹."),
    ]
}

/// The bundled five-question math quiz.
///
/// # Errors
///
/// Returns `StorageError::InvalidRecord` if a bundled question fails validation.
pub fn sample_questions() -> Result<Vec<Question>, StorageError> {
    quiz_core::model::validate_all(sample_drafts()).map_err(|(index, source)| {
        StorageError::InvalidRecord {
            quiz: "sample".to_string(),
            index,
            source,
        }
    })
}

/// Bank serving the sample questions for every quiz id.
///
/// # Errors
///
/// See [`sample_questions`].
pub fn sample_bank() -> Result<QuestionBank, StorageError> {
    Ok(QuestionBank::with_default(sample_questions()?))
}

type HistoryRow = (u64, &'static str, &'static str, (i32, u32, u32), u8, u32, AttemptStatus);

const SAMPLE_HISTORY: [HistoryRow; 5] = [
    (1, "Calculus Midterm", "Mathematics", (2023, 10, 15), 85, 20, AttemptStatus::Finished),
    (2, "Organic Chemistry Basics", "Chemistry", (2023, 10, 18), 0, 15, AttemptStatus::Unfinished),
    (3, "World History: WWII", "History", (2023, 10, 20), 92, 25, AttemptStatus::Finished),
    (4, "Physics: Mechanics", "Physics", (2023, 10, 22), 78, 10, AttemptStatus::Finished),
    (5, "English Literature", "English", (2023, 10, 25), 0, 30, AttemptStatus::Unfinished),
];

/// The bundled quiz history.
///
/// # Errors
///
/// Returns `StorageError::InvalidPersistedState` if a bundled row is inconsistent.
pub fn sample_history() -> Result<Vec<QuizAttempt>, StorageError> {
    SAMPLE_HISTORY
        .iter()
        .map(|&(id, title, subject, (y, m, d), score, total, status)| {
            let bad = |what: String| StorageError::InvalidPersistedState(what);
            let taken_at = NaiveDate::from_ymd_opt(y, m, d)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| Utc.from_utc_datetime(&naive))
                .ok_or_else(|| bad(format!("invalid date for attempt {id}")))?;
            let quiz_id = QuizId::new(id.to_string()).map_err(|e| bad(e.to_string()))?;
            QuizAttempt::from_persisted(
                AttemptId::new(id),
                quiz_id,
                title,
                subject,
                taken_at,
                status,
                score,
                total,
            )
            .map_err(|e| bad(e.to_string()))
        })
        .collect()
}

/// In-memory repository preloaded with the sample bank and history.
///
/// # Errors
///
/// See [`sample_questions`] and [`sample_history`].
pub fn sample_repository() -> Result<InMemoryRepository, StorageError> {
    Ok(sample_bank()?.into_repository().with_attempts(sample_history()?))
}
