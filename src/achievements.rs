use crate::progress::AllTimeStats;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Delay between a session commit and the achievement check, letting the
/// save settle before the snapshot is inspected
pub const NOTIFY_DELAY: Duration = Duration::from_millis(100);

/// Read-only view of the aggregator handed to the achievement evaluator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSnapshot {
    pub all_time: AllTimeStats,
    pub session_correct: u32,
    pub session_wrong: u32,
    pub current_streak: u32,
}

/// External collaborator notified after each saved session.
///
/// Whatever it does with the snapshot (badges, celebrations) is outside the
/// engine's responsibility; the engine only guarantees a best-effort,
/// non-blocking delivery.
pub trait AchievementSink: Send + Sync {
    fn check_achievements(&self, snapshot: &StatsSnapshot);
}

/// Fire-and-forget delivery on a detached thread after [`NOTIFY_DELAY`].
pub fn notify_deferred(sink: Arc<dyn AchievementSink>, snapshot: StatsSnapshot) {
    std::thread::spawn(move || {
        std::thread::sleep(NOTIFY_DELAY);
        sink.check_achievements(&snapshot);
    });
}

/// A single unlockable milestone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
}

/// Threshold-based achievement evaluator.
///
/// Idempotent: each achievement unlocks once; re-checking an already
/// unlocked milestone is a no-op.
#[derive(Debug, Default)]
pub struct AchievementLadder {
    unlocked: Mutex<Vec<Achievement>>,
}

const LADDER: &[(&str, &str, fn(&StatsSnapshot) -> bool)] = &[
    ("first-session", "First session saved", |s| {
        s.all_time.total_sessions >= 1
    }),
    ("correct-100", "100 correct answers", |s| {
        s.all_time.total_correct >= 100
    }),
    ("correct-1000", "1000 correct answers", |s| {
        s.all_time.total_correct >= 1000
    }),
    ("streak-25", "Best run of 25", |s| s.all_time.best_streak >= 25),
    ("sessions-10", "10 sessions", |s| {
        s.all_time.total_sessions >= 10
    }),
    ("coverage-46", "46 characters practiced", |s| {
        s.all_time.character_mastery.len() >= 46
    }),
];

impl AchievementLadder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate the ladder against a snapshot, returning newly unlocked
    /// achievements.
    pub fn evaluate(&self, snapshot: &StatsSnapshot) -> Vec<Achievement> {
        let mut unlocked = self.unlocked.lock().expect("achievement state poisoned");
        let mut fresh = Vec::new();

        for &(id, title, earned) in LADDER {
            if earned(snapshot) && !unlocked.iter().any(|a| a.id == id) {
                let achievement = Achievement { id, title };
                unlocked.push(achievement.clone());
                fresh.push(achievement);
            }
        }

        fresh
    }

    pub fn unlocked(&self) -> Vec<Achievement> {
        self.unlocked
            .lock()
            .expect("achievement state poisoned")
            .clone()
    }
}

impl AchievementSink for AchievementLadder {
    fn check_achievements(&self, snapshot: &StatsSnapshot) {
        let fresh = self.evaluate(snapshot);
        for achievement in &fresh {
            tracing::info!(id = achievement.id, "achievement unlocked");
        }
    }
}
