use rand::Rng;

/// Consecutive correct answers before direction flips become possible
const STREAK_THRESHOLD: u32 = 3;
/// Chance of flipping direction once past the threshold
const FLIP_CHANCE: f64 = 0.3;

/// Decides whether the next question quizzes forward (glyph shown, reading
/// picked) or reverse (reading shown, glyph picked).
///
/// Direction changes are gated on demonstrated mastery: only a run of
/// correct answers opens a randomized chance to flip. A wrong answer resets
/// the run but never changes the active direction, so the question the
/// learner just missed is not silently rerolled.
#[derive(Debug, Clone, Default)]
pub struct ReverseModeController {
    is_reverse: bool,
    consecutive_correct: u32,
}

impl ReverseModeController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called after a correct answer. Flips the direction at most once,
    /// and only past the consecutive-correct threshold.
    pub fn decide_next_mode(&mut self) {
        self.consecutive_correct += 1;

        if self.consecutive_correct >= STREAK_THRESHOLD
            && rand::thread_rng().gen_bool(FLIP_CHANCE)
        {
            self.is_reverse = !self.is_reverse;
            self.consecutive_correct = 0;
        }
    }

    /// Called after a wrong answer. Resets the mastery run; the current
    /// direction is deliberately left alone.
    pub fn record_wrong_answer(&mut self) {
        self.consecutive_correct = 0;
    }

    pub fn is_reverse(&self) -> bool {
        self.is_reverse
    }

    pub fn consecutive_correct(&self) -> u32 {
        self.consecutive_correct
    }
}
