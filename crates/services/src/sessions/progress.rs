use serde::Serialize;

/// Aggregated view of session progress, useful for the progress header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionProgress {
    /// 1-based number of the current question.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    pub unanswered: usize,
    pub notes: usize,
    /// `position / total`; independent of how many questions are answered.
    pub ratio: f64,
    pub is_complete: bool,
}

impl SessionProgress {
    /// Ratio as a whole percentage for progress bars.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percent(&self) -> u8 {
        (self.ratio * 100.0).round().clamp(0.0, 100.0) as u8
    }
}
