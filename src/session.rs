use crate::achievements::{notify_deferred, AchievementSink, StatsSnapshot};
use crate::progress::{AllTimeStats, MasteryCount, ProgressStore};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-character answer tally for the running session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharacterScore {
    pub correct: u32,
    pub wrong: u32,
}

impl CharacterScore {
    /// Fraction of correct answers, or `None` before the first answer.
    /// Never a fabricated number for the empty case.
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.correct + self.wrong;
        if total == 0 {
            None
        } else {
            Some(self.correct as f64 / total as f64)
        }
    }
}

/// Accumulates session performance and folds it into the durable all-time
/// record on save.
///
/// Session fields reset between rounds; `all_time` is the only thing that
/// outlives the process, and only `save_session` may grow it.
pub struct StatsAggregator {
    num_correct_answers: u32,
    num_wrong_answers: u32,
    current_streak: u32,
    score: u32,
    character_history: Vec<String>,
    character_scores: HashMap<String, CharacterScore>,
    correct_answer_times: Vec<f64>,
    all_time: AllTimeStats,
    store: Box<dyn ProgressStore>,
    achievements: Option<Arc<dyn AchievementSink>>,
}

impl std::fmt::Debug for StatsAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsAggregator")
            .field("num_correct_answers", &self.num_correct_answers)
            .field("num_wrong_answers", &self.num_wrong_answers)
            .field("current_streak", &self.current_streak)
            .field("score", &self.score)
            .field("all_time", &self.all_time)
            .finish_non_exhaustive()
    }
}

impl StatsAggregator {
    pub fn new(
        store: Box<dyn ProgressStore>,
        achievements: Option<Arc<dyn AchievementSink>>,
    ) -> Self {
        let all_time = store.load();
        Self {
            num_correct_answers: 0,
            num_wrong_answers: 0,
            current_streak: 0,
            score: 0,
            character_history: Vec::new(),
            character_scores: HashMap::new(),
            correct_answer_times: Vec::new(),
            all_time,
            store,
            achievements,
        }
    }

    pub fn increment_correct_answers(&mut self) {
        self.num_correct_answers += 1;
        self.current_streak += 1;
        self.score += 1;
    }

    pub fn increment_wrong_answers(&mut self) {
        self.num_wrong_answers += 1;
        self.current_streak = 0;
        self.score = self.score.saturating_sub(1);
    }

    /// Bump one side of a character's session tally.
    pub fn increment_character_score(&mut self, character: &str, was_correct: bool) {
        let entry = self
            .character_scores
            .entry(character.to_string())
            .or_default();
        if was_correct {
            entry.correct += 1;
        } else {
            entry.wrong += 1;
        }
    }

    pub fn add_character_to_history(&mut self, character: &str) {
        self.character_history.push(character.to_string());
    }

    pub fn add_correct_answer_time(&mut self, seconds: f64) {
        self.correct_answer_times.push(seconds);
    }

    /// Commit the session into the all-time record and persist it.
    ///
    /// Mastery counts accumulate per character; `best_streak` is
    /// `max(best_streak, num_correct_answers)` — the session's correct
    /// answer count, not a true consecutive run. A failed write is logged
    /// and the in-memory state stands; the session itself is never
    /// interrupted. The achievement collaborator is notified on a detached
    /// thread after a short delay.
    pub fn save_session(&mut self) -> StatsSnapshot {
        for (character, score) in &self.character_scores {
            let mastery = self
                .all_time
                .character_mastery
                .entry(character.clone())
                .or_insert_with(MasteryCount::default);
            mastery.correct += score.correct as u64;
            mastery.incorrect += score.wrong as u64;
        }

        self.all_time.total_sessions += 1;
        self.all_time.total_correct += self.num_correct_answers as u64;
        self.all_time.total_incorrect += self.num_wrong_answers as u64;
        self.all_time.best_streak = self
            .all_time
            .best_streak
            .max(self.num_correct_answers as u64);

        if let Err(err) = self.store.save(&self.all_time) {
            tracing::warn!(%err, "failed to persist all-time stats; session continues");
        }

        let snapshot = self.snapshot();
        if let Some(sink) = &self.achievements {
            notify_deferred(sink.clone(), snapshot.clone());
        }
        snapshot
    }

    /// Clear every session-scoped field, leaving the all-time record alone.
    pub fn reset_stats(&mut self) {
        self.num_correct_answers = 0;
        self.num_wrong_answers = 0;
        self.current_streak = 0;
        self.score = 0;
        self.character_history.clear();
        self.character_scores.clear();
        self.correct_answer_times.clear();
    }

    /// Destructive, explicit user action: zero the all-time record.
    pub fn clear_all_progress(&mut self) {
        self.all_time = AllTimeStats::default();
        if let Err(err) = self.store.save(&self.all_time) {
            tracing::warn!(%err, "failed to persist cleared stats");
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            all_time: self.all_time.clone(),
            session_correct: self.num_correct_answers,
            session_wrong: self.num_wrong_answers,
            current_streak: self.current_streak,
        }
    }

    pub fn num_correct_answers(&self) -> u32 {
        self.num_correct_answers
    }

    pub fn num_wrong_answers(&self) -> u32 {
        self.num_wrong_answers
    }

    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn character_history(&self) -> &[String] {
        &self.character_history
    }

    pub fn character_score(&self, character: &str) -> CharacterScore {
        self.character_scores
            .get(character)
            .copied()
            .unwrap_or_default()
    }

    pub fn character_scores(&self) -> &HashMap<String, CharacterScore> {
        &self.character_scores
    }

    pub fn correct_answer_times(&self) -> &[f64] {
        &self.correct_answer_times
    }

    pub fn all_time(&self) -> &AllTimeStats {
        &self.all_time
    }

    /// Session accuracy, undefined until something was answered.
    pub fn session_accuracy(&self) -> Option<f64> {
        let total = self.num_correct_answers + self.num_wrong_answers;
        if total == 0 {
            None
        } else {
            Some(self.num_correct_answers as f64 / total as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemoryProgressStore;

    fn aggregator() -> StatsAggregator {
        StatsAggregator::new(Box::new(MemoryProgressStore::default()), None)
    }

    #[test]
    fn test_streak_and_score_tracking() {
        let mut stats = aggregator();

        stats.increment_correct_answers();
        stats.increment_correct_answers();
        assert_eq!(stats.current_streak(), 2);
        assert_eq!(stats.score(), 2);

        stats.increment_wrong_answers();
        assert_eq!(stats.current_streak(), 0);
        assert_eq!(stats.score(), 1);
    }

    #[test]
    fn test_score_floors_at_zero() {
        let mut stats = aggregator();
        stats.increment_wrong_answers();
        stats.increment_wrong_answers();
        assert_eq!(stats.score(), 0);
    }

    #[test]
    fn test_character_score_accuracy() {
        let mut stats = aggregator();

        stats.increment_character_score("あ", true);
        stats.increment_character_score("あ", false);

        let score = stats.character_score("あ");
        assert_eq!(score.correct, 1);
        assert_eq!(score.wrong, 1);
        assert_eq!(score.accuracy(), Some(0.5));
    }

    #[test]
    fn test_unanswered_accuracy_is_undefined() {
        let stats = aggregator();
        assert_eq!(stats.character_score("あ").accuracy(), None);
        assert_eq!(stats.session_accuracy(), None);
    }

    #[test]
    fn test_history_is_append_only_ordered() {
        let mut stats = aggregator();
        stats.add_character_to_history("あ");
        stats.add_character_to_history("い");
        stats.add_character_to_history("あ");

        assert_eq!(stats.character_history(), &["あ", "い", "あ"]);
    }

    #[test]
    fn test_save_session_accumulates() {
        let mut stats = aggregator();

        stats.increment_correct_answers();
        stats.increment_character_score("あ", true);
        stats.save_session();

        stats.reset_stats();
        stats.increment_correct_answers();
        stats.increment_wrong_answers();
        stats.increment_character_score("あ", true);
        stats.increment_character_score("あ", false);
        stats.save_session();

        let all_time = stats.all_time();
        assert_eq!(all_time.total_sessions, 2);
        assert_eq!(all_time.total_correct, 2);
        assert_eq!(all_time.total_incorrect, 1);

        let mastery = &all_time.character_mastery["あ"];
        assert_eq!(mastery.correct, 2);
        assert_eq!(mastery.incorrect, 1);
    }

    #[test]
    fn test_double_save_counts_two_sessions() {
        let mut stats = aggregator();
        stats.save_session();
        stats.save_session();
        assert_eq!(stats.all_time().total_sessions, 2);
    }

    #[test]
    fn test_best_streak_keeps_observed_semantics() {
        // Historical behavior: best_streak tracks the session's correct
        // answer count, not a true consecutive run.
        let mut stats = aggregator();

        stats.increment_correct_answers();
        stats.increment_wrong_answers();
        stats.increment_correct_answers();
        stats.save_session();

        assert_eq!(stats.all_time().best_streak, 2);
    }

    #[test]
    fn test_reset_stats_leaves_all_time_alone() {
        let mut stats = aggregator();
        stats.increment_correct_answers();
        stats.save_session();

        stats.reset_stats();
        assert_eq!(stats.num_correct_answers(), 0);
        assert_eq!(stats.score(), 0);
        assert!(stats.character_history().is_empty());
        assert_eq!(stats.all_time().total_sessions, 1);
    }

    #[test]
    fn test_clear_then_save_counts_from_one() {
        let mut stats = aggregator();

        stats.increment_correct_answers();
        stats.increment_character_score("あ", true);
        stats.save_session();
        stats.reset_stats();

        stats.clear_all_progress();
        assert_eq!(stats.all_time(), &AllTimeStats::default());

        stats.increment_correct_answers();
        stats.increment_character_score("い", true);
        stats.save_session();

        let all_time = stats.all_time();
        assert_eq!(all_time.total_sessions, 1);
        assert_eq!(all_time.total_correct, 1);
        assert_eq!(all_time.character_mastery.len(), 1);
        assert_eq!(all_time.character_mastery["い"].correct, 1);
    }

    #[test]
    fn test_persistence_failure_keeps_memory_state() {
        struct FailingStore;
        impl ProgressStore for FailingStore {
            fn load(&self) -> AllTimeStats {
                AllTimeStats::default()
            }
            fn save(&self, _stats: &AllTimeStats) -> std::io::Result<()> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
            }
        }

        let mut stats = StatsAggregator::new(Box::new(FailingStore), None);
        stats.increment_correct_answers();
        stats.save_session();

        // In-memory totals survive the failed write
        assert_eq!(stats.all_time().total_sessions, 1);
        assert_eq!(stats.all_time().total_correct, 1);
    }

    #[test]
    fn test_saved_progress_reloads() {
        let store = std::sync::Arc::new(MemoryProgressStore::default());

        struct SharedStore(std::sync::Arc<MemoryProgressStore>);
        impl ProgressStore for SharedStore {
            fn load(&self) -> AllTimeStats {
                self.0.load()
            }
            fn save(&self, stats: &AllTimeStats) -> std::io::Result<()> {
                self.0.save(stats)
            }
        }

        let mut stats = StatsAggregator::new(Box::new(SharedStore(store.clone())), None);
        stats.increment_correct_answers();
        stats.save_session();
        drop(stats);

        let reloaded = StatsAggregator::new(Box::new(SharedStore(store)), None);
        assert_eq!(reloaded.all_time().total_sessions, 1);
    }
}
