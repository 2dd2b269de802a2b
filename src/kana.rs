use crate::error::QuizError;
use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use serde::Deserialize;
use serde_json::from_str;

static DATA_DIR: Dir = include_dir!("src/data");

/// Which kana table(s) to quiz from
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum KanaSet {
    Hiragana,
    Katakana,
    Both,
}

/// One gojūon row (or voiced variant row) of a kana table
#[derive(Deserialize, Clone, Debug)]
pub struct KanaGroup {
    pub name: String,
    pub kana: Vec<String>,
    pub romaji: Vec<String>,
}

#[derive(Deserialize, Clone, Debug)]
struct KanaTable {
    name: String,
    groups: Vec<KanaGroup>,
}

/// A quizzable glyph paired with its reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KanaPair {
    pub kana: String,
    pub romaji: String,
}

/// The active pool of quizzable characters, assembled from the selected
/// set and group filter.
///
/// Glyphs are the canonical item identifiers; readings are display values.
/// Several glyphs may share a reading (じ/ぢ, ず/づ), which answer checking
/// has to account for.
#[derive(Debug, Clone)]
pub struct Deck {
    pub name: String,
    pairs: Vec<KanaPair>,
}

impl Deck {
    /// Build a deck from a kana set, optionally restricted to named groups.
    /// Unknown group names are a caller error.
    pub fn build(set: KanaSet, groups: Option<&[String]>) -> Result<Self, QuizError> {
        let tables: Vec<KanaTable> = match set {
            KanaSet::Hiragana => vec![load_table("hiragana.json")],
            KanaSet::Katakana => vec![load_table("katakana.json")],
            KanaSet::Both => vec![load_table("hiragana.json"), load_table("katakana.json")],
        };

        if let Some(wanted) = groups {
            let known = &tables[0];
            for name in wanted {
                if !known.groups.iter().any(|g| &g.name == name) {
                    return Err(QuizError::UnknownGroup(name.clone()));
                }
            }
        }

        let mut pairs = Vec::new();
        for table in &tables {
            for group in &table.groups {
                let selected = match groups {
                    Some(wanted) => wanted.iter().any(|name| name == &group.name),
                    None => true,
                };
                if !selected {
                    continue;
                }
                for (kana, romaji) in group.kana.iter().zip(group.romaji.iter()) {
                    pairs.push(KanaPair {
                        kana: kana.clone(),
                        romaji: romaji.clone(),
                    });
                }
            }
        }

        Ok(Self {
            name: set.to_string().to_lowercase(),
            pairs,
        })
    }

    /// Assemble a deck from explicit pairs, e.g. a custom study list.
    pub fn from_pairs(name: impl Into<String>, pairs: Vec<KanaPair>) -> Self {
        Self {
            name: name.into(),
            pairs,
        }
    }

    /// The selection pool: every glyph in the deck.
    pub fn pool(&self) -> Vec<String> {
        self.pairs.iter().map(|p| p.kana.clone()).collect()
    }

    /// Reading for a glyph, if the glyph is in this deck.
    pub fn reading(&self, kana: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|p| p.kana == kana)
            .map(|p| p.romaji.as_str())
    }

    pub fn pairs(&self) -> &[KanaPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Names of all groups in the given set, in table order.
pub fn group_names(set: KanaSet) -> Vec<String> {
    let table = match set {
        KanaSet::Katakana => load_table("katakana.json"),
        _ => load_table("hiragana.json"),
    };
    table.groups.into_iter().map(|g| g.name).collect()
}

fn load_table(file_name: &str) -> KanaTable {
    let file = DATA_DIR.get_file(file_name).expect("Kana table not found");

    let file_as_str = file
        .contents_utf8()
        .expect("Unable to interpret kana table as a string");

    let table: KanaTable = from_str(file_as_str).expect("Unable to deserialize kana table json");

    for group in &table.groups {
        assert_eq!(
            group.kana.len(),
            group.romaji.len(),
            "kana/romaji mismatch in group {} of {}",
            group.name,
            table.name
        );
    }

    table
}
