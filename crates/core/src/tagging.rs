//! Tags, editing tasks, and tag realization.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use self::BaseOperation::{Delete, Keep};

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").unwrap());

/// Split raw text into word-level tokens on whitespace.
pub fn get_token_list(text: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// The non-insertion edit applied to a source token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseOperation {
    /// Emit the token unchanged.
    Keep,
    /// Drop the token.
    Delete,
    /// Emit the token and mark the boundary of a two-segment reordering.
    Swap,
}

impl BaseOperation {
    /// Label-map spelling of the operation.
    pub fn as_str(self) -> &'static str {
        match self {
            BaseOperation::Keep => "KEEP",
            BaseOperation::Delete => "DELETE",
            BaseOperation::Swap => "SWAP",
        }
    }
}

/// An edit directive attached to exactly one source token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// The base edit operation.
    pub base: BaseOperation,
    /// Text inserted immediately before the tagged token's surface form,
    /// drawn from the phrase vocabulary. `None` means no insertion.
    pub added_phrase: Option<String>,
}

impl Tag {
    /// A tag with no insertion.
    pub fn new(base: BaseOperation) -> Self {
        Self {
            base,
            added_phrase: None,
        }
    }

    /// A tag carrying an inserted phrase.
    pub fn with_phrase(base: BaseOperation, phrase: impl Into<String>) -> Self {
        Self {
            base,
            added_phrase: Some(phrase.into()),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.added_phrase {
            Some(phrase) => write!(f, "{}|{}", self.base.as_str(), phrase),
            None => write!(f, "{}", self.base.as_str()),
        }
    }
}

/// Result of a conversion attempt: one tag per source token plus a
/// feasibility flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedExample {
    /// One tag per source token.
    pub tags: Vec<Tag>,
    /// Whether applying the tags reproduces the target exactly.
    pub is_feasible: bool,
}

/// Alternating KEEP/DELETE placeholder tags over `len` tokens.
///
/// Used for pairs that cannot be converted, so evaluation sets keep one
/// record per input; the pattern is deliberately unlikely to be predicted
/// by chance and is never a learning target.
pub fn fallback_tags(len: usize) -> Vec<Tag> {
    (0..len)
        .map(|i| Tag::new(if i % 2 == 0 { Keep } else { Delete }))
        .collect()
}

/// Word-tokenized source texts for one example.
///
/// The first source is the text being edited; any further sources count
/// as extra context. Tags cover the flattened token sequence.
#[derive(Debug, Clone)]
pub struct EditingTask {
    sources: Vec<Vec<String>>,
}

impl EditingTask {
    /// Word-tokenize each source text.
    pub fn new(source_texts: &[String]) -> Self {
        Self {
            sources: source_texts.iter().map(|s| get_token_list(s)).collect(),
        }
    }

    /// The word tokens of each source, in order.
    pub fn sources(&self) -> &[Vec<String>] {
        &self.sources
    }

    /// Number of source texts.
    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }

    /// Total number of source tokens across all sources.
    pub fn num_tokens(&self) -> usize {
        self.sources.iter().map(Vec::len).sum()
    }

    /// Token count of the first source segment.
    pub fn first_segment_len(&self) -> usize {
        self.sources.first().map_or(0, Vec::len)
    }

    /// Apply a tag sequence to the source tokens.
    ///
    /// Added phrases are spliced immediately before the tagged token's
    /// surface form; `Keep` and `Swap` emit the token, `Delete` drops it.
    /// A `Swap` tag additionally marks the end of the first of two blocks
    /// that are emitted in swapped order.
    pub fn realize_output(&self, tags: &[Tag]) -> Vec<String> {
        let tokens: Vec<&String> = self.sources.iter().flatten().collect();
        let n = tokens.len().min(tags.len());

        let boundary = tags[..n].iter().position(|t| t.base == BaseOperation::Swap);
        let indices: Vec<usize> = match boundary {
            Some(b) => ((b + 1)..n).chain(0..=b).collect(),
            None => (0..n).collect(),
        };

        let mut out = Vec::new();
        for idx in indices {
            let tag = &tags[idx];
            if let Some(phrase) = &tag.added_phrase {
                out.extend(get_token_list(phrase));
            }
            if tag.base != BaseOperation::Delete {
                out.push(tokens[idx].clone());
            }
        }
        out
    }
}
