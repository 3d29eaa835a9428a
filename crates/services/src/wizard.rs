//! Multi-step quiz creation: settings, exam mode, details, preview.

use rand::Rng;
use serde::Serialize;

use quiz_core::model::{
    ExamMode, QuizConfig, QuizConfigError, QuizDetailsDraft, QuizId, TimeSettings,
};

use crate::Clock;
use crate::error::WizardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WizardStep {
    Settings,
    ExamMode,
    Details,
    Preview,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [Self::Settings, Self::ExamMode, Self::Details, Self::Preview];

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Settings => 0,
            Self::ExamMode => 1,
            Self::Details => 2,
            Self::Preview => 3,
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Settings => "Quiz Settings",
            Self::ExamMode => "Exam Mode",
            Self::Details => "Quiz Details",
            Self::Preview => "Preview & Generate",
        }
    }

    fn following(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    fn preceding(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }
}

/// Wizard state. Each step edits one part of the quiz; `next` only moves on
/// from a valid step and `generate` only runs from the preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizWizard {
    step: WizardStep,
    time: TimeSettings,
    exam_mode: ExamMode,
    details: QuizDetailsDraft,
}

impl Default for QuizWizard {
    fn default() -> Self {
        Self {
            step: WizardStep::Settings,
            time: TimeSettings::untimed(),
            exam_mode: ExamMode::default(),
            details: QuizDetailsDraft::default(),
        }
    }
}

impl QuizWizard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn step(&self) -> WizardStep {
        self.step
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
    pub fn details(&self) -> &QuizDetailsDraft {
        &self.details
    }

    pub fn set_timed(&mut self, timed: bool) {
        self.time = self.time.with_timed(timed);
    }

    /// Set the time limit, switching timing on.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::Config` for a zero limit; the previous setting is kept.
    pub fn set_time_limit(&mut self, minutes: u32) -> Result<(), WizardError> {
        self.time = TimeSettings::timed(minutes)?;
        Ok(())
    }

    pub fn set_exam_mode(&mut self, mode: ExamMode) {
        self.exam_mode = mode;
    }

    pub fn set_details(&mut self, details: QuizDetailsDraft) {
        self.details = details;
    }

    /// Check a step's inputs. Settings, exam mode and preview are always valid.
    ///
    /// # Errors
    ///
    /// Returns the first `QuizConfigError` of the details form.
    pub fn validate_step(&self, step: WizardStep) -> Result<(), QuizConfigError> {
        match step {
            WizardStep::Settings | WizardStep::ExamMode | WizardStep::Preview => Ok(()),
            WizardStep::Details => self.details.validate().map(|_| ()),
        }
    }

    /// Advance one step.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::StepInvalid` if the current step is incomplete and
    /// `WizardError::AtLastStep` on the preview.
    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        let following = self.step.following().ok_or(WizardError::AtLastStep)?;
        self.validate_step(self.step)
            .map_err(|source| WizardError::StepInvalid {
                step: self.step,
                source,
            })?;
        self.step = following;
        Ok(following)
    }

    /// Go back one step. Inputs are kept.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::AtFirstStep` on the first step.
    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        let preceding = self.step.preceding().ok_or(WizardError::AtFirstStep)?;
        self.step = preceding;
        Ok(preceding)
    }

    /// Build the quiz with a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::NotReady` outside the preview step and
    /// `WizardError::StepInvalid` if the details no longer validate.
    pub fn generate(&self, clock: &Clock, rng: &mut impl Rng) -> Result<QuizConfig, WizardError> {
        if self.step != WizardStep::Preview {
            return Err(WizardError::NotReady { step: self.step });
        }
        let details = self
            .details
            .validate()
            .map_err(|source| WizardError::StepInvalid {
                step: WizardStep::Details,
                source,
            })?;
        let id = generate_quiz_id(clock, rng)?;
        tracing::info!(quiz_id = %id, mode = %self.exam_mode, name = details.name(), "quiz generated");
        Ok(QuizConfig::new(id, self.time, self.exam_mode, details))
    }
}

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize] as char);
        value /= 36;
    }
    digits.iter().rev().collect()
}

/// `quiz_<base36 millis>_<6 random base36 chars>`.
///
/// # Errors
///
/// Returns `WizardError::Id` if the token is rejected, which cannot happen for
/// the generated shape.
pub fn generate_quiz_id(clock: &Clock, rng: &mut impl Rng) -> Result<QuizId, WizardError> {
    let suffix: String = (0..6)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    Ok(QuizId::new(format!(
        "quiz_{}_{suffix}",
        to_base36(clock.now_millis())
    ))?)
}
