use crate::achievements::{AchievementSink, StatsSnapshot};
use crate::config::Config;
use crate::engine::{
    AdaptiveSelector, DifficultyController, Outcome, ReverseModeController,
};
use crate::error::QuizError;
use crate::kana::Deck;
use crate::progress::ProgressStore;
use crate::question::{Direction, Question};
use crate::session::StatsAggregator;
use crate::session_log::{SessionLog, SessionRecord};
use crate::stats::{time_diff_ms, AnswerDb, AnswerStat};
use crate::util::{mean, std_dev};
use chrono::Local;
use std::sync::Arc;
use std::time::SystemTime;

/// Outcome line shown under the prompt after each answer
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub outcome: Outcome,
    pub text: String,
}

/// Everything the summary screen needs once a session is saved
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub answered: u32,
    pub correct: u32,
    pub wrong: u32,
    pub accuracy: Option<f64>,
    pub score: u32,
    pub avg_answer_secs: Option<f64>,
    pub answer_secs_std_dev: Option<f64>,
    pub snapshot: StatsSnapshot,
}

/// A running quiz session.
///
/// Owns the four adaptive components and applies every answer to them in a
/// fixed order: selector weight, stats, difficulty, reverse mode. The
/// surrounding UI only renders snapshots and forwards selections.
#[derive(Debug)]
pub struct Quiz {
    deck: Deck,
    selector: AdaptiveSelector,
    difficulty: DifficultyController,
    reverse: ReverseModeController,
    stats: StatsAggregator,
    smart_reverse: bool,
    current: Question,
    wrong_picks: Vec<String>,
    feedback: Option<Feedback>,
    question_started: SystemTime,
    answer_db: Option<AnswerDb>,
    session_log: Option<SessionLog>,
}

impl Quiz {
    /// Start a session over `deck`. Fails fast on an empty deck or invalid
    /// difficulty bounds. No filesystem side effects; attach the durable
    /// logs separately.
    pub fn new(
        deck: Deck,
        config: &Config,
        store: Box<dyn ProgressStore>,
        achievements: Option<Arc<dyn AchievementSink>>,
    ) -> Result<Self, QuizError> {
        if deck.is_empty() {
            return Err(QuizError::EmptyPool);
        }

        let difficulty = DifficultyController::new(config.difficulty)?;
        let mut selector = AdaptiveSelector::new();
        let stats = StatsAggregator::new(store, achievements);

        let first = selector.select_weighted(&deck.pool(), None)?;
        selector.mark_seen(&first);
        let current = Question::build(&deck, &first, Direction::Forward, difficulty.option_count());

        Ok(Self {
            deck,
            selector,
            difficulty,
            reverse: ReverseModeController::new(),
            stats,
            smart_reverse: config.smart_reverse,
            current,
            wrong_picks: Vec::new(),
            feedback: None,
            question_started: SystemTime::now(),
            answer_db: None,
            session_log: None,
        })
    }

    pub fn attach_answer_db(&mut self, db: AnswerDb) {
        self.answer_db = Some(db);
    }

    pub fn attach_session_log(&mut self, log: SessionLog) {
        self.session_log = Some(log);
    }

    /// Apply one answer selection. A correct answer advances to the next
    /// question; a wrong one disables the picked option and waits for a
    /// retry.
    pub fn submit(&mut self, selected: &str) -> Outcome {
        let was_correct = self.current.is_correct(selected, &self.deck);
        let kana = self.current.kana.clone();
        let now = SystemTime::now();
        let elapsed_ms = time_diff_ms(self.question_started, now);

        self.record_answer(&kana, was_correct, elapsed_ms);

        // Fixed component order: selector weight, stats, difficulty, reverse
        self.selector.update_weight(&kana, was_correct);

        if was_correct {
            self.stats.add_correct_answer_time(elapsed_ms as f64 / 1000.0);
            self.stats.add_character_to_history(&kana);
            self.stats.increment_character_score(&kana, true);
            self.stats.increment_correct_answers();

            self.difficulty.record_correct();

            if self.smart_reverse {
                self.reverse.decide_next_mode();
            }

            self.feedback = Some(Feedback {
                outcome: Outcome::Correct,
                text: format!("{} = {}", self.current.prompt, self.current.answer),
            });
            self.advance(&kana);
            Outcome::Correct
        } else {
            self.stats.increment_character_score(&kana, false);
            self.stats.increment_wrong_answers();

            self.difficulty.record_wrong();
            self.reverse.record_wrong_answer();

            self.feedback = Some(Feedback {
                outcome: Outcome::Wrong,
                text: format!("{} ≠ {}", self.current.prompt, selected),
            });
            self.wrong_picks.push(selected.to_string());
            Outcome::Wrong
        }
    }

    fn advance(&mut self, answered: &str) {
        // The pool is non-empty by construction, so selection cannot fail
        // here; keep the session alive regardless.
        let next = match self.selector.select_weighted(&self.deck.pool(), Some(answered)) {
            Ok(next) => next,
            Err(err) => {
                tracing::warn!(%err, "selection failed mid-session");
                return;
            }
        };
        self.selector.mark_seen(&next);

        let direction = if self.reverse.is_reverse() {
            Direction::Reverse
        } else {
            Direction::Forward
        };
        self.current = Question::build(&self.deck, &next, direction, self.difficulty.option_count());
        self.wrong_picks.clear();
        self.question_started = SystemTime::now();
    }

    fn record_answer(&self, kana: &str, was_correct: bool, elapsed_ms: u64) {
        if let Some(ref db) = self.answer_db {
            let stat = AnswerStat {
                kana: kana.to_string(),
                romaji: self.deck.reading(kana).unwrap_or_default().to_string(),
                was_correct,
                reverse: self.current.direction == Direction::Reverse,
                response_ms: elapsed_ms,
                timestamp: Local::now(),
            };
            let _ = db.record_answer(&stat);
        }
    }

    /// Save the session and produce the summary for the results screen.
    pub fn finish(&mut self) -> SessionSummary {
        let times = self.stats.correct_answer_times().to_vec();
        let correct = self.stats.num_correct_answers();
        let wrong = self.stats.num_wrong_answers();
        let accuracy = self.stats.session_accuracy();
        let score = self.stats.score();

        let snapshot = self.stats.save_session();

        if let Some(ref log) = self.session_log {
            let record = SessionRecord {
                date: Local::now(),
                deck: self.deck.name.clone(),
                answered: correct + wrong,
                correct,
                wrong,
                accuracy: accuracy.map_or(0.0, |a| a * 100.0),
                score,
            };
            if let Err(err) = log.append(&record) {
                tracing::warn!(%err, "failed to append session log");
            }
        }

        SessionSummary {
            answered: correct + wrong,
            correct,
            wrong,
            accuracy,
            score,
            avg_answer_secs: mean(&times),
            answer_secs_std_dev: std_dev(&times),
            snapshot,
        }
    }

    /// Begin a fresh round over the same deck, keeping the learner's
    /// adaptive weights but clearing session counters and difficulty.
    pub fn restart(&mut self) -> Result<(), QuizError> {
        self.stats.reset_stats();
        self.difficulty.reset();
        self.reverse = ReverseModeController::new();
        self.feedback = None;

        let first = self.selector.select_weighted(&self.deck.pool(), None)?;
        self.selector.mark_seen(&first);
        self.current = Question::build(
            &self.deck,
            &first,
            Direction::Forward,
            self.difficulty.option_count(),
        );
        self.wrong_picks.clear();
        self.question_started = SystemTime::now();
        Ok(())
    }

    pub fn current(&self) -> &Question {
        &self.current
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn wrong_picks(&self) -> &[String] {
        &self.wrong_picks
    }

    pub fn option_count(&self) -> usize {
        self.difficulty.option_count()
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse.is_reverse()
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut StatsAggregator {
        &mut self.stats
    }

    pub fn selector(&self) -> &AdaptiveSelector {
        &self.selector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kana::KanaSet;
    use crate::progress::MemoryProgressStore;

    fn quiz() -> Quiz {
        let deck = Deck::build(KanaSet::Hiragana, None).unwrap();
        Quiz::new(
            deck,
            &Config::default(),
            Box::new(MemoryProgressStore::default()),
            None,
        )
        .unwrap()
    }

    fn quiz_forward_only() -> Quiz {
        let deck = Deck::build(KanaSet::Hiragana, None).unwrap();
        let config = Config {
            smart_reverse: false,
            ..Config::default()
        };
        Quiz::new(
            deck,
            &config,
            Box::new(MemoryProgressStore::default()),
            None,
        )
        .unwrap()
    }

    fn answer_correctly(quiz: &mut Quiz) {
        let answer = quiz.current().answer.clone();
        assert_eq!(quiz.submit(&answer), Outcome::Correct);
    }

    fn answer_wrongly(quiz: &mut Quiz) {
        let wrong = quiz
            .current()
            .options
            .iter()
            .find(|o| !quiz.current().is_correct(o.as_str(), quiz.deck()))
            .cloned()
            .expect("question should carry at least one wrong option");
        assert_eq!(quiz.submit(&wrong), Outcome::Wrong);
    }

    #[test]
    fn test_empty_deck_is_rejected() {
        let empty = Deck::from_pairs("empty", Vec::new());
        let result = Quiz::new(
            empty,
            &Config::default(),
            Box::new(MemoryProgressStore::default()),
            None,
        );
        assert_matches::assert_matches!(result, Err(QuizError::EmptyPool));
    }

    #[test]
    fn test_first_question_is_forward() {
        let q = quiz();
        assert_eq!(q.current().direction, Direction::Forward);
        assert!(!q.is_reverse());
    }

    #[test]
    fn test_correct_answer_advances() {
        let mut q = quiz_forward_only();
        let before = q.current().kana.clone();

        answer_correctly(&mut q);

        assert_ne!(q.current().kana, before, "just-answered glyph must not repeat");
        assert_eq!(q.stats().num_correct_answers(), 1);
        assert_eq!(q.stats().current_streak(), 1);
        assert_eq!(q.stats().character_history(), &[before]);
        assert!(q.wrong_picks().is_empty());
    }

    #[test]
    fn test_wrong_answer_stays_on_question() {
        let mut q = quiz_forward_only();
        let before = q.current().kana.clone();

        answer_wrongly(&mut q);

        assert_eq!(q.current().kana, before, "wrong answer keeps the question");
        assert_eq!(q.stats().num_wrong_answers(), 1);
        assert_eq!(q.wrong_picks().len(), 1);
        assert!(q.stats().character_history().is_empty());
    }

    #[test]
    fn test_feedback_texture() {
        let mut q = quiz_forward_only();
        let prompt = q.current().prompt.clone();
        let answer = q.current().answer.clone();

        answer_correctly(&mut q);
        let feedback = q.feedback().unwrap();
        assert_eq!(feedback.outcome, Outcome::Correct);
        assert_eq!(feedback.text, format!("{prompt} = {answer}"));
    }

    #[test]
    fn test_option_count_grows_with_streak() {
        let mut q = quiz_forward_only();
        assert_eq!(q.option_count(), 3);

        for _ in 0..5 {
            answer_correctly(&mut q);
        }
        assert_eq!(q.option_count(), 4);
        assert_eq!(q.current().options.len(), 4);
    }

    #[test]
    fn test_wrong_answers_shrink_options_later() {
        let mut q = quiz_forward_only();
        for _ in 0..5 {
            answer_correctly(&mut q);
        }
        assert_eq!(q.option_count(), 4);

        answer_wrongly(&mut q);
        answer_wrongly(&mut q);
        assert_eq!(q.option_count(), 3);
    }

    #[test]
    fn test_forward_only_never_reverses() {
        let mut q = quiz_forward_only();
        for _ in 0..50 {
            answer_correctly(&mut q);
        }
        assert!(!q.is_reverse());
        assert_eq!(q.current().direction, Direction::Forward);
    }

    #[test]
    fn test_wrong_answer_raises_weight() {
        let mut q = quiz_forward_only();
        let kana = q.current().kana.clone();

        answer_wrongly(&mut q);
        assert!(q.selector().weight(&kana) > 1.0);
    }

    #[test]
    fn test_finish_produces_summary_and_saves() {
        let mut q = quiz_forward_only();
        answer_correctly(&mut q);
        answer_correctly(&mut q);
        answer_wrongly(&mut q);

        let summary = q.finish();
        assert_eq!(summary.answered, 3);
        assert_eq!(summary.correct, 2);
        assert_eq!(summary.wrong, 1);
        assert_eq!(summary.accuracy, Some(2.0 / 3.0));
        assert_eq!(summary.snapshot.all_time.total_sessions, 1);
        assert!(summary.avg_answer_secs.is_some());
    }

    #[test]
    fn test_restart_clears_session_keeps_weights() {
        let mut q = quiz_forward_only();
        let kana = q.current().kana.clone();
        answer_wrongly(&mut q);
        answer_correctly(&mut q);
        let weight = q.selector().weight(&kana);

        q.finish();
        q.restart().unwrap();

        assert_eq!(q.stats().num_correct_answers(), 0);
        assert_eq!(q.option_count(), 3);
        assert!(q.feedback().is_none());
        // Adaptive memory survives the round boundary
        assert_eq!(q.selector().weight(&kana), weight);
    }

    #[test]
    fn test_answer_db_receives_rows() {
        let mut q = quiz_forward_only();
        q.attach_answer_db(AnswerDb::open_in_memory().unwrap());

        answer_correctly(&mut q);
        answer_wrongly(&mut q);

        // Reach through the attachment for verification
        let db = q.answer_db.as_ref().unwrap();
        assert_eq!(db.total_answers().unwrap(), 2);
    }
}
