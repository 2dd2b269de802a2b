use crate::error::QuizError;
use serde::{Deserialize, Serialize};

/// Tuning knobs for the progressive option count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyConfig {
    /// Fewest answer options ever offered
    pub min_options: usize,
    /// Most answer options ever offered
    pub max_options: usize,
    /// Consecutive correct answers required per extra option
    pub streak_per_level: usize,
    /// Accumulated wrong answers that remove an option
    pub wrongs_to_decrease: usize,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            min_options: 3,
            max_options: 6,
            streak_per_level: 5,
            wrongs_to_decrease: 2,
        }
    }
}

impl DifficultyConfig {
    pub fn validate(&self) -> Result<(), QuizError> {
        if self.min_options == 0 {
            return Err(QuizError::InvalidDifficulty(
                "min_options must be at least 1".into(),
            ));
        }
        if self.min_options > self.max_options {
            return Err(QuizError::InvalidDifficulty(format!(
                "min_options ({}) exceeds max_options ({})",
                self.min_options, self.max_options
            )));
        }
        if self.streak_per_level == 0 || self.wrongs_to_decrease == 0 {
            return Err(QuizError::InvalidDifficulty(
                "streak_per_level and wrongs_to_decrease must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Adjusts how many answer options are offered based on recent accuracy.
///
/// A sustained correct streak widens the choice set one option at a time;
/// accumulated wrong answers shrink it back. The option count never leaves
/// `[min_options, max_options]`.
#[derive(Debug, Clone)]
pub struct DifficultyController {
    config: DifficultyConfig,
    option_count: usize,
    correct_streak: usize,
    wrong_count: usize,
}

impl DifficultyController {
    pub fn new(config: DifficultyConfig) -> Result<Self, QuizError> {
        config.validate()?;
        Ok(Self {
            option_count: config.min_options,
            config,
            correct_streak: 0,
            wrong_count: 0,
        })
    }

    /// Record a correct answer. Every `streak_per_level`-th consecutive
    /// correct answer adds an option, up to `max_options`. A single correct
    /// answer also clears accumulated wrong pressure.
    pub fn record_correct(&mut self) {
        self.correct_streak += 1;
        self.wrong_count = 0;

        if self.correct_streak % self.config.streak_per_level == 0
            && self.option_count < self.config.max_options
        {
            self.option_count += 1;
        }
    }

    /// Record a wrong answer. The correct streak resets; once
    /// `wrongs_to_decrease` wrong answers accumulate, one option is removed,
    /// down to `min_options`.
    pub fn record_wrong(&mut self) {
        self.wrong_count += 1;
        self.correct_streak = 0;

        if self.wrong_count >= self.config.wrongs_to_decrease {
            if self.option_count > self.config.min_options {
                self.option_count -= 1;
            }
            self.wrong_count = 0;
        }
    }

    pub fn option_count(&self) -> usize {
        self.option_count
    }

    pub fn correct_streak(&self) -> usize {
        self.correct_streak
    }

    pub fn config(&self) -> &DifficultyConfig {
        &self.config
    }

    /// Start over at the easiest level, e.g. for a fresh session.
    pub fn reset(&mut self) {
        self.option_count = self.config.min_options;
        self.correct_streak = 0;
        self.wrong_count = 0;
    }
}
