use crate::kana::Deck;
use rand::seq::SliceRandom;

/// Quiz direction for a single question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Glyph shown, reading picked
    Forward,
    /// Reading shown, glyph picked
    Reverse,
}

/// A fully assembled multiple-choice question
#[derive(Debug, Clone)]
pub struct Question {
    /// The glyph being quizzed (the canonical item identifier)
    pub kana: String,
    /// What the learner is shown
    pub prompt: String,
    /// Shuffled answer options, correct one included
    pub options: Vec<String>,
    /// The correct display value among `options`
    pub answer: String,
    pub direction: Direction,
}

impl Question {
    /// Assemble a question for `kana` with up to `option_count` choices.
    ///
    /// Distractors are drawn from the rest of the deck, deduplicated on
    /// display value and never colliding with the correct one, so two
    /// buttons can't both be right (or look identical). When the deck has
    /// fewer distinct displays than requested, the option list shrinks to
    /// what exists. Options are shuffled with a uniform Fisher-Yates pass.
    pub fn build(deck: &Deck, kana: &str, direction: Direction, option_count: usize) -> Self {
        let reading = deck.reading(kana).unwrap_or_default().to_string();

        let (prompt, answer) = match direction {
            Direction::Forward => (kana.to_string(), reading.clone()),
            Direction::Reverse => (reading.clone(), kana.to_string()),
        };

        let mut distractors: Vec<String> = Vec::new();
        for pair in deck.pairs() {
            let display = match direction {
                Direction::Forward => pair.romaji.clone(),
                Direction::Reverse => pair.kana.clone(),
            };
            // In reverse mode a glyph sharing the prompt's reading would be
            // a second correct button; skip those along with duplicates.
            let collides = match direction {
                Direction::Forward => display == answer,
                Direction::Reverse => pair.romaji == reading,
            };
            if !collides && !distractors.contains(&display) {
                distractors.push(display);
            }
        }

        let mut rng = rand::thread_rng();
        let wanted = option_count.saturating_sub(1).min(distractors.len());
        let mut options: Vec<String> = distractors
            .choose_multiple(&mut rng, wanted)
            .cloned()
            .collect();
        options.push(answer.clone());
        options.shuffle(&mut rng);

        Self {
            kana: kana.to_string(),
            prompt,
            options,
            answer,
            direction,
        }
    }

    /// Whether a selected option answers this question correctly.
    ///
    /// Judged on the displayed value: in reverse mode any glyph with the
    /// prompted reading counts, which makes じ/ぢ and ず/づ mutually
    /// acceptable.
    pub fn is_correct(&self, selected: &str, deck: &Deck) -> bool {
        match self.direction {
            Direction::Forward => selected == self.answer,
            Direction::Reverse => deck.reading(selected) == deck.reading(&self.kana),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kana::KanaSet;
    use std::collections::HashSet;

    fn deck() -> Deck {
        Deck::build(KanaSet::Hiragana, None).unwrap()
    }

    fn small_deck() -> Deck {
        let groups = vec!["a".to_string()];
        Deck::build(KanaSet::Hiragana, Some(&groups)).unwrap()
    }

    #[test]
    fn test_forward_question_shape() {
        let d = deck();
        let q = Question::build(&d, "か", Direction::Forward, 4);

        assert_eq!(q.prompt, "か");
        assert_eq!(q.answer, "ka");
        assert_eq!(q.options.len(), 4);
        assert!(q.options.contains(&"ka".to_string()));
    }

    #[test]
    fn test_reverse_question_shape() {
        let d = deck();
        let q = Question::build(&d, "か", Direction::Reverse, 4);

        assert_eq!(q.prompt, "ka");
        assert_eq!(q.answer, "か");
        assert_eq!(q.options.len(), 4);
        assert!(q.options.contains(&"か".to_string()));
    }

    #[test]
    fn test_options_are_distinct() {
        let d = deck();
        for _ in 0..100 {
            let q = Question::build(&d, "し", Direction::Forward, 6);
            let unique: HashSet<&String> = q.options.iter().collect();
            assert_eq!(unique.len(), q.options.len(), "duplicate option in {:?}", q.options);
        }
    }

    #[test]
    fn test_exactly_one_correct_option_forward() {
        let d = deck();
        for _ in 0..100 {
            let q = Question::build(&d, "じ", Direction::Forward, 6);
            let hits = q.options.iter().filter(|o| *o == &q.answer).count();
            assert_eq!(hits, 1);
        }
    }

    #[test]
    fn test_reverse_distractors_never_share_the_reading() {
        // "ji" is the reading of both じ and ぢ; neither may appear as a
        // distractor when the other is the target.
        let d = deck();
        for _ in 0..100 {
            let q = Question::build(&d, "じ", Direction::Reverse, 6);
            let correct: Vec<&String> = q
                .options
                .iter()
                .filter(|o| d.reading(o) == Some("ji"))
                .collect();
            assert_eq!(correct.len(), 1, "ambiguous options {:?}", q.options);
        }
    }

    #[test]
    fn test_small_deck_degrades_gracefully() {
        let d = small_deck();
        let q = Question::build(&d, "あ", Direction::Forward, 6);

        // Five readings exist in the a-row; all of them fit
        assert_eq!(q.options.len(), 5);
        assert!(q.options.contains(&"a".to_string()));
    }

    #[test]
    fn test_option_count_one_still_offers_the_answer() {
        let d = deck();
        let q = Question::build(&d, "あ", Direction::Forward, 1);
        assert_eq!(q.options, vec!["a".to_string()]);
    }

    #[test]
    fn test_shuffle_varies_answer_position() {
        let d = deck();
        let mut positions = HashSet::new();
        for _ in 0..200 {
            let q = Question::build(&d, "か", Direction::Forward, 4);
            let pos = q.options.iter().position(|o| o == &q.answer).unwrap();
            positions.insert(pos);
        }
        // A uniform shuffle should land the answer in every slot over 200 builds
        assert_eq!(positions.len(), 4, "answer stuck in positions {positions:?}");
    }

    #[test]
    fn test_is_correct_forward() {
        let d = deck();
        let q = Question::build(&d, "か", Direction::Forward, 4);

        assert!(q.is_correct("ka", &d));
        assert!(!q.is_correct("ki", &d));
    }

    #[test]
    fn test_is_correct_reverse_accepts_shared_readings() {
        let d = deck();
        let q = Question::build(&d, "じ", Direction::Reverse, 4);

        assert!(q.is_correct("じ", &d));
        assert!(q.is_correct("ぢ", &d));
        assert!(!q.is_correct("か", &d));
    }
}
