//! Shared test fixtures.

use std::collections::HashMap;

use crate::{Subword, SubwordTokenizer};

pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;
pub const CLS_ID: u32 = 2;
pub const SEP_ID: u32 = 3;

/// Deterministic lookup tokenizer for tests.
///
/// Known words map to fixed piece sequences; anything else becomes a
/// single unknown piece. Piece ids are assigned from 4 upward in the
/// order pieces first appear.
pub struct FixtureTokenizer {
    pieces: HashMap<String, Vec<Subword>>,
}

impl FixtureTokenizer {
    pub fn new(entries: &[(&str, Vec<&str>)]) -> Self {
        let mut ids: HashMap<String, u32> = HashMap::new();
        let mut next = 4u32;
        let mut pieces = HashMap::new();
        for (word, parts) in entries {
            let subwords = parts
                .iter()
                .map(|p| {
                    let id = *ids.entry((*p).to_string()).or_insert_with(|| {
                        let id = next;
                        next += 1;
                        id
                    });
                    Subword {
                        piece: (*p).to_string(),
                        id,
                    }
                })
                .collect();
            pieces.insert((*word).to_string(), subwords);
        }
        Self { pieces }
    }
}

impl SubwordTokenizer for FixtureTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Subword> {
        text.split_whitespace()
            .flat_map(|word| {
                self.pieces.get(word).cloned().unwrap_or_else(|| {
                    vec![Subword {
                        piece: word.to_string(),
                        id: UNK_ID,
                    }]
                })
            })
            .collect()
    }

    fn pad_id(&self) -> u32 {
        PAD_ID
    }

    fn start_id(&self) -> u32 {
        CLS_ID
    }

    fn end_id(&self) -> u32 {
        SEP_ID
    }

    fn unknown_id(&self) -> u32 {
        UNK_ID
    }
}
