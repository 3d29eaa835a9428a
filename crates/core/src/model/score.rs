use serde::Serialize;

/// Number of correct answers out of a quiz length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Score {
    correct: u32,
    total: u32,
}

/// Display band used to colour a percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreBand {
    /// 80% and above.
    Good,
    /// 60% up to 79%.
    Fair,
    /// Below 60%.
    Poor,
}

impl Score {
    /// Builds a score, clamping `correct` to `total`.
    #[must_use]
    pub fn new(correct: u32, total: u32) -> Self {
        Self {
            correct: correct.min(total),
            total,
        }
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Percentage rounded half-up: `round(100 * correct / total)`.
    ///
    /// Uses integer arithmetic so `.5` always rounds up (1 of 8 is 13%).
    /// An empty quiz scores 0.
    #[must_use]
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let correct = u64::from(self.correct);
        let total = u64::from(self.total);
        let rounded = (200 * correct + total) / (2 * total);
        u8::try_from(rounded).unwrap_or(100)
    }

    #[must_use]
    pub fn band(&self) -> ScoreBand {
        ScoreBand::for_percentage(self.percentage())
    }
}

impl ScoreBand {
    #[must_use]
    pub fn for_percentage(percentage: u8) -> Self {
        match percentage {
            80.. => Self::Good,
            60..=79 => Self::Fair,
            _ => Self::Poor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_of_two_is_fifty() {
        assert_eq!(Score::new(1, 2).percentage(), 50);
    }

    #[test]
    fn half_rounds_up() {
        // 12.5 and 62.5 sit exactly on the boundary.
        assert_eq!(Score::new(1, 8).percentage(), 13);
        assert_eq!(Score::new(5, 8).percentage(), 63);
    }

    #[test]
    fn below_half_rounds_down() {
        // 33.33..
        assert_eq!(Score::new(1, 3).percentage(), 33);
        // 66.66..
        assert_eq!(Score::new(2, 3).percentage(), 67);
    }

    #[test]
    fn empty_and_full_scores() {
        assert_eq!(Score::new(0, 0).percentage(), 0);
        assert_eq!(Score::new(5, 5).percentage(), 100);
        assert_eq!(Score::new(9, 5).correct(), 5);
    }

    #[test]
    fn bands_follow_history_colours() {
        assert_eq!(ScoreBand::for_percentage(92), ScoreBand::Good);
        assert_eq!(ScoreBand::for_percentage(80), ScoreBand::Good);
        assert_eq!(ScoreBand::for_percentage(78), ScoreBand::Fair);
        assert_eq!(ScoreBand::for_percentage(60), ScoreBand::Fair);
        assert_eq!(ScoreBand::for_percentage(59), ScoreBand::Poor);
        assert_eq!(Score::new(0, 4).band(), ScoreBand::Poor);
    }
}
