//! Phrase vocabulary extracted from the label map.

use std::collections::HashMap;

use crate::label_map::LabelMap;

/// The fixed set of insertable phrases.
///
/// Phrases come from tag labels of the form `"BASE|phrase"`. Ids are
/// assigned in sorted phrase order starting at 1, so two runs over the
/// same label map always agree; 0 is reserved as the no-insertion value
/// in feature records. The vocabulary is immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct PhraseVocabulary {
    ids: HashMap<String, u32>,
    max_phrase_tokens: usize,
}

impl PhraseVocabulary {
    /// Collect the distinct insertable phrases from a label map.
    pub fn from_label_map(label_map: &LabelMap) -> Self {
        let mut phrases: Vec<&str> = Vec::new();
        for tag in label_map.tags() {
            if let Some((_, phrase)) = tag.split_once('|') {
                if !phrase.is_empty() {
                    phrases.push(phrase);
                }
            }
        }
        phrases.sort_unstable();
        phrases.dedup();

        let mut ids = HashMap::new();
        let mut max_phrase_tokens = 0;
        for (idx, phrase) in phrases.iter().enumerate() {
            ids.insert((*phrase).to_string(), idx as u32 + 1);
            max_phrase_tokens = max_phrase_tokens.max(phrase.split_whitespace().count());
        }
        Self {
            ids,
            max_phrase_tokens,
        }
    }

    /// Insertion id of `phrase`, or `None` if it is not insertable.
    pub fn phrase_to_id(&self, phrase: &str) -> Option<u32> {
        self.ids.get(phrase).copied()
    }

    /// Whether `phrase` is insertable.
    pub fn contains(&self, phrase: &str) -> bool {
        self.ids.contains_key(phrase)
    }

    /// Number of distinct phrases.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Length, in whitespace tokens, of the longest phrase.
    pub fn max_phrase_tokens(&self) -> usize {
        self.max_phrase_tokens
    }
}
