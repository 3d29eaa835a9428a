use std::sync::Arc;

use quiz_core::model::{
    AttemptId, NewAttempt, QuizConfig, QuizId, Score, SessionLabel, SessionPolicy,
};
use storage::repository::{AttemptRepository, QuestionRepository};

use super::service::QuizSession;
use super::view::SessionSnapshot;
use crate::Clock;
use crate::error::SessionError;

/// Result of finishing a session through the workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub snapshot: SessionSnapshot,
    pub score: Score,
    pub attempt_id: AttemptId,
}

/// Orchestrates session start, completion and history recording.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    attempts: Arc<dyn AttemptRepository>,
    policy: SessionPolicy,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            clock,
            questions,
            attempts,
            policy: SessionPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Start a new session for a quiz identifier.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the question source fails, or
    /// `SessionError::NoQuestions` if it returns an empty list.
    pub async fn start_session(&self, quiz_id: &QuizId) -> Result<QuizSession, SessionError> {
        let questions = self.questions.questions_for(quiz_id).await?;
        let session = QuizSession::new(quiz_id.clone(), questions, self.clock.now())?
            .with_policy(self.policy);
        tracing::info!(quiz_id = %quiz_id, questions = session.len(), "quiz session started");
        Ok(session)
    }

    /// Start a session for a quiz generated by the creation wizard.
    ///
    /// The question list is capped at the configured question count.
    ///
    /// # Errors
    ///
    /// Same as [`SessionLoopService::start_session`].
    pub async fn start_from_config(&self, config: &QuizConfig) -> Result<QuizSession, SessionError> {
        let mut questions = self.questions.questions_for(config.id()).await?;
        let limit = usize::try_from(config.details().question_count()).unwrap_or(usize::MAX);
        if questions.len() > limit {
            tracing::debug!(
                quiz_id = %config.id(),
                available = questions.len(),
                limit,
                "capping question list"
            );
            questions.truncate(limit);
        }
        let session = QuizSession::new(config.id().clone(), questions, self.clock.now())?
            .with_policy(self.policy)
            .with_label(SessionLabel::from_config(config));
        tracing::info!(
            quiz_id = %config.id(),
            questions = session.len(),
            mode = %config.exam_mode(),
            "quiz session started from config"
        );
        Ok(session)
    }

    /// Finish the session and append it to the history.
    ///
    /// If the session is already completed but its history entry was never
    /// stored (e.g. a transient storage failure), only the recording is retried.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IncompleteAnswers` if questions are unanswered,
    /// `SessionError::Completed` if the session was already finished and
    /// recorded, or `SessionError::Storage` if persistence fails.
    pub async fn finish(&self, session: &mut QuizSession) -> Result<SessionOutcome, SessionError> {
        if !session.is_complete() {
            session.finish(self.clock.now())?;
        } else if session.attempt_id().is_some() {
            return Err(SessionError::Completed);
        }
        let attempt_id = self.record_completion(session).await?;

        Ok(SessionOutcome {
            snapshot: session.snapshot(),
            score: session.score(),
            attempt_id,
        })
    }

    /// Store the history entry of a completed session. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotCompleted` for an in-progress session, or
    /// `SessionError::Storage` if persistence fails.
    pub async fn record_completion(&self, session: &mut QuizSession) -> Result<AttemptId, SessionError> {
        if let Some(id) = session.attempt_id() {
            return Ok(id);
        }
        let summary = session.build_summary()?;
        let id = match self.attempts.append_attempt(NewAttempt::finished(&summary)).await {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(quiz_id = %session.quiz_id(), error = %err, "failed to record finished quiz");
                return Err(err.into());
            }
        };
        session.set_attempt_id(id);
        tracing::info!(
            quiz_id = %session.quiz_id(),
            attempt_id = %id,
            correct = summary.score().correct(),
            total = summary.score().total(),
            percentage = summary.score().percentage(),
            "quiz completed"
        );
        Ok(id)
    }

    /// Discard a session, recording it as unfinished if it was still in progress.
    ///
    /// Returns `None` for completed sessions, whose history entry already exists
    /// or can be stored with [`SessionLoopService::record_completion`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if persistence fails.
    pub async fn abandon(&self, session: QuizSession) -> Result<Option<AttemptId>, SessionError> {
        if session.is_complete() {
            return Ok(None);
        }
        let attempt = NewAttempt::unfinished(
            session.quiz_id().clone(),
            session.label().clone(),
            self.clock.now(),
            u32::try_from(session.len()).unwrap_or(u32::MAX),
        )?;
        let id = self.attempts.append_attempt(attempt).await?;
        tracing::info!(quiz_id = %session.quiz_id(), attempt_id = %id, "quiz abandoned");
        Ok(Some(id))
    }

    /// Reset a session to its initial state, stamped with the current time.
    pub fn restart(&self, session: &mut QuizSession) -> SessionSnapshot {
        tracing::debug!(quiz_id = %session.quiz_id(), "quiz session restarted");
        session.restart(self.clock.now())
    }
}
