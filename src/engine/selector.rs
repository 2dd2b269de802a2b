use crate::error::QuizError;
use rand::Rng;
use std::collections::HashMap;

/// Starting weight for characters that have never been answered
pub const DEFAULT_WEIGHT: f64 = 1.0;
/// Floor for mastered characters; they stay selectable, just rare
pub const MIN_WEIGHT: f64 = 0.1;
/// Ceiling for struggling characters
pub const MAX_WEIGHT: f64 = 5.0;
/// Multiplier applied on a correct answer
const CORRECT_DECAY: f64 = 0.8;
/// Multiplier applied on a wrong answer
const WRONG_GROWTH: f64 = 1.5;

/// Per-character selection weight and exposure count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterWeight {
    pub weight: f64,
    pub seen_count: u32,
}

impl Default for CharacterWeight {
    fn default() -> Self {
        Self {
            weight: DEFAULT_WEIGHT,
            seen_count: 0,
        }
    }
}

/// Weighted character selection that adapts to answer history.
///
/// Characters the learner gets wrong grow in weight and come back sooner;
/// characters answered correctly decay toward a small floor. Weights live
/// for the lifetime of the selector and are never persisted.
#[derive(Debug, Default)]
pub struct AdaptiveSelector {
    weights: HashMap<String, CharacterWeight>,
}

impl AdaptiveSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a character from `pool`, with probability proportional to each
    /// candidate's current weight. When `exclude` is given and the pool has
    /// more than one member, the excluded character is never returned, so a
    /// just-answered question cannot repeat immediately.
    pub fn select_weighted(
        &self,
        pool: &[String],
        exclude: Option<&str>,
    ) -> Result<String, QuizError> {
        if pool.is_empty() {
            return Err(QuizError::EmptyPool);
        }

        let candidates: Vec<&String> = if pool.len() > 1 {
            pool.iter().filter(|c| Some(c.as_str()) != exclude).collect()
        } else {
            pool.iter().collect()
        };

        let total: f64 = candidates.iter().map(|c| self.weight(c.as_str())).sum();

        let mut rng = rand::thread_rng();
        let mut remaining = rng.gen_range(0.0..total);
        for candidate in &candidates {
            remaining -= self.weight(candidate.as_str());
            if remaining <= 0.0 {
                return Ok((*candidate).clone());
            }
        }

        // Floating point residue can leave `remaining` marginally positive
        // after the loop; the last candidate is the correct pick then.
        Ok(candidates[candidates.len() - 1].clone())
    }

    /// Record that a character was shown to the learner.
    pub fn mark_seen(&mut self, character: &str) {
        let entry = self
            .weights
            .entry(character.to_string())
            .or_default();
        entry.seen_count += 1;
    }

    /// Adjust a character's weight after an answer. Correct answers decay
    /// the weight toward [`MIN_WEIGHT`]; wrong answers grow it toward
    /// [`MAX_WEIGHT`].
    pub fn update_weight(&mut self, character: &str, was_correct: bool) {
        let entry = self
            .weights
            .entry(character.to_string())
            .or_default();

        if was_correct {
            entry.weight = (entry.weight * CORRECT_DECAY).max(MIN_WEIGHT);
        } else {
            entry.weight = (entry.weight * WRONG_GROWTH).min(MAX_WEIGHT);
        }

        tracing::debug!(character, was_correct, weight = entry.weight, "weight updated");
    }

    /// Current weight of a character (unseen characters weigh [`DEFAULT_WEIGHT`]).
    pub fn weight(&self, character: &str) -> f64 {
        self.weights
            .get(character)
            .map_or(DEFAULT_WEIGHT, |w| w.weight)
    }

    /// How many times a character has been shown.
    pub fn seen_count(&self, character: &str) -> u32 {
        self.weights.get(character).map_or(0, |w| w.seen_count)
    }

    /// Characters the learner struggles with most, heaviest first.
    pub fn needs_focus(&self, count: usize) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> = self
            .weights
            .iter()
            .filter(|(_, w)| w.weight > DEFAULT_WEIGHT)
            .map(|(c, w)| (c.clone(), w.weight))
            .collect();

        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        entries.truncate(count);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn pool(chars: &[&str]) -> Vec<String> {
        chars.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_empty_pool_is_an_error() {
        let selector = AdaptiveSelector::new();
        let result = selector.select_weighted(&[], None);
        assert_matches!(result, Err(QuizError::EmptyPool));
    }

    #[test]
    fn test_single_member_pool_ignores_exclude() {
        let selector = AdaptiveSelector::new();
        let p = pool(&["あ"]);

        let picked = selector.select_weighted(&p, Some("あ")).unwrap();
        assert_eq!(picked, "あ");
    }

    #[test]
    fn test_exclude_never_returned() {
        let selector = AdaptiveSelector::new();
        let p = pool(&["あ", "い", "う"]);

        for _ in 0..1000 {
            let picked = selector.select_weighted(&p, Some("い")).unwrap();
            assert_ne!(picked, "い");
        }
    }

    #[test]
    fn test_uniform_weights_give_roughly_uniform_draws() {
        let selector = AdaptiveSelector::new();
        let p = pool(&["あ", "い", "う"]);

        let mut counts: HashMap<String, u32> = HashMap::new();
        let trials = 10_000;
        for _ in 0..trials {
            let picked = selector.select_weighted(&p, None).unwrap();
            *counts.entry(picked).or_insert(0) += 1;
        }

        for c in ["あ", "い", "う"] {
            let share = counts[c] as f64 / trials as f64;
            assert!(
                (share - 1.0 / 3.0).abs() < 0.03,
                "expected ~33% for {c}, got {:.1}%",
                share * 100.0
            );
        }
    }

    #[test]
    fn test_wrong_answers_raise_selection_probability() {
        let mut selector = AdaptiveSelector::new();
        let p = pool(&["あ", "い"]);

        for _ in 0..3 {
            selector.update_weight("あ", false);
        }

        let mut hard_count = 0;
        let trials = 5_000;
        for _ in 0..trials {
            if selector.select_weighted(&p, None).unwrap() == "あ" {
                hard_count += 1;
            }
        }

        // weight(あ) is capped well above weight(い) = 1.0; expect a clear majority
        assert!(
            hard_count > trials * 6 / 10,
            "struggling character should dominate selection (got {hard_count}/{trials})"
        );
    }

    #[test]
    fn test_weight_monotone_and_bounded() {
        let mut selector = AdaptiveSelector::new();

        let mut last = selector.weight("あ");
        for _ in 0..20 {
            selector.update_weight("あ", false);
            let w = selector.weight("あ");
            assert!(w >= last);
            assert!(w <= MAX_WEIGHT);
            last = w;
        }

        for _ in 0..40 {
            selector.update_weight("あ", true);
            let w = selector.weight("あ");
            assert!(w <= last);
            assert!(w >= MIN_WEIGHT);
            last = w;
        }
    }

    #[test]
    fn test_mastered_characters_stay_selectable() {
        let mut selector = AdaptiveSelector::new();
        for _ in 0..100 {
            selector.update_weight("あ", true);
        }
        assert!(selector.weight("あ") >= MIN_WEIGHT);

        let picked = selector.select_weighted(&pool(&["あ"]), None).unwrap();
        assert_eq!(picked, "あ");
    }

    #[test]
    fn test_mark_seen_counts_and_leaves_weight_alone() {
        let mut selector = AdaptiveSelector::new();

        selector.mark_seen("か");
        selector.mark_seen("か");

        assert_eq!(selector.seen_count("か"), 2);
        assert_eq!(selector.weight("か"), DEFAULT_WEIGHT);
        assert_eq!(selector.seen_count("さ"), 0);
    }

    #[test]
    fn test_needs_focus_orders_heaviest_first() {
        let mut selector = AdaptiveSelector::new();

        selector.update_weight("あ", false);
        selector.update_weight("い", false);
        selector.update_weight("い", false);
        selector.update_weight("う", true);

        let focus = selector.needs_focus(5);
        assert_eq!(focus.len(), 2);
        assert_eq!(focus[0].0, "い");
        assert_eq!(focus[1].0, "あ");
    }
}
