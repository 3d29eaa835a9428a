use serde::Serialize;
use std::collections::BTreeMap;

use quiz_core::model::{QuestionId, QuizId, Score};

use super::progress::SessionProgress;
use super::service::QuizSession;

/// Presentation-agnostic snapshot of a session.
///
/// Everything a front end needs to re-render is here; nothing is pre-formatted
/// beyond the 1-based question numbers the notes summary is labelled with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub quiz_id: QuizId,
    pub title: String,
    pub subject: String,
    pub index: usize,
    pub total: usize,
    pub question: QuestionView,
    pub answers: BTreeMap<usize, String>,
    pub notes: BTreeMap<usize, String>,
    pub feedback_visible: BTreeMap<usize, bool>,
    pub feedback: Option<FeedbackView>,
    pub completed: bool,
    pub score: Score,
    pub percentage: u8,
    pub progress: SessionProgress,
    pub can_go_previous: bool,
    pub can_go_next: bool,
    pub can_finish: bool,
    pub result: Option<ResultView>,
}

/// The current question as shown to the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub id: QuestionId,
    pub number: usize,
    pub prompt: String,
    pub choices: Vec<String>,
    pub selected: Option<String>,
    pub note: Option<String>,
}

/// Immediate correctness feedback for an answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackView {
    pub is_correct: bool,
    pub selected: String,
    pub correct_answer: String,
    pub explanation: Option<String>,
}

/// A note labelled with its 1-based question number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteEntry {
    pub number: usize,
    pub text: String,
}

/// Final result shown once the session is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultView {
    pub total: u32,
    pub correct: u32,
    pub percentage: u8,
    pub notes: Vec<NoteEntry>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn capture(session: &QuizSession) -> Self {
        let index = session.current_index();
        let question = session.current_question();
        let score = session.score();
        let completed = session.is_complete();

        Self {
            quiz_id: session.quiz_id().clone(),
            title: session.label().title.clone(),
            subject: session.label().subject.clone(),
            index,
            total: session.len(),
            question: QuestionView {
                id: question.id(),
                number: index + 1,
                prompt: question.prompt().to_owned(),
                choices: question.choices().to_vec(),
                selected: session.answer(index).map(str::to_owned),
                note: session.note(index).map(str::to_owned),
            },
            answers: session.answers().clone(),
            notes: session.notes().clone(),
            feedback_visible: session.feedback_flags().clone(),
            feedback: session.current_feedback(),
            completed,
            score,
            percentage: score.percentage(),
            progress: session.progress_details(),
            can_go_previous: index > 0,
            can_go_next: session.can_advance(),
            can_finish: !completed && session.unanswered().is_empty(),
            result: completed.then(|| ResultView {
                total: score.total(),
                correct: score.correct(),
                percentage: score.percentage(),
                notes: session.notes_summary(),
            }),
        }
    }

    /// JSON rendering for front ends that consume snapshots over a text channel.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if encoding fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
