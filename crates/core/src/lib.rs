//! Core conversion logic for LaserTagger-style preprocessing.
//!
//! This crate turns raw (source, target) text pairs into model-ready
//! feature records: a tag per source token (keep / delete / swap, plus an
//! optional inserted phrase from a fixed vocabulary) and fixed-width
//! arrays aligned to the subword tokenization of the source.

/// A single subword piece produced by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subword {
    /// Surface form of the piece (e.g. `"##ing"`).
    pub piece: String,
    /// Vocabulary id of the piece.
    pub id: u32,
}

/// Trait for subword tokenization.
///
/// Implementors wrap a concrete vocabulary (e.g. a BERT WordPiece vocab)
/// and expose the special ids the feature builder needs. Tokenization
/// must be deterministic.
pub trait SubwordTokenizer {
    /// Split `text` into subword pieces with their vocabulary ids.
    fn tokenize(&self, text: &str) -> Vec<Subword>;

    /// Id used for padding positions.
    fn pad_id(&self) -> u32;

    /// Sequence-start id (`[CLS]`), also the decoder start marker.
    fn start_id(&self) -> u32;

    /// Sequence-end id (`[SEP]`), also the decoder end marker.
    fn end_id(&self) -> u32;

    /// Id for out-of-vocabulary pieces (`[UNK]`).
    fn unknown_id(&self) -> u32;
}

// Blanket implementation for references to tokenizers
impl<T: SubwordTokenizer + ?Sized> SubwordTokenizer for &T {
    fn tokenize(&self, text: &str) -> Vec<Subword> {
        (*self).tokenize(text)
    }

    fn pad_id(&self) -> u32 {
        (*self).pad_id()
    }

    fn start_id(&self) -> u32 {
        (*self).start_id()
    }

    fn end_id(&self) -> u32 {
        (*self).end_id()
    }

    fn unknown_id(&self) -> u32 {
        (*self).unknown_id()
    }
}

mod align;
mod builder;
mod converter;
mod errors;
mod label_map;
mod phrase_vocab;
pub mod pipeline;
mod reader;
mod tagging;

#[cfg(test)]
pub(crate) mod testutil;

pub use align::longest_common_subsequence;
pub use builder::{BuildOutcome, BuilderConfig, ExampleBuilder, FeatureRecord, TaskKind};
pub use converter::TaggingConverter;
pub use errors::{PrepError, PrepResult};
pub use label_map::{read_label_map, LabelMap};
pub use phrase_vocab::PhraseVocabulary;
pub use pipeline::{
    convert_pairs, convert_pairs_parallel, count_file_path, write_jsonl_output, OutputRecord,
    PipelineResult,
};
pub use reader::{yield_sources_and_targets, InputFormat, RawPair};
pub use tagging::{
    fallback_tags, get_token_list, BaseOperation, EditingTask, Tag, TaggedExample,
};

/// Default truncation bound for the input subword sequence.
pub const MAX_SEQ_LENGTH: usize = 128;

/// Default truncation bound for decoder phrase sequences.
pub const MAX_TGT_LENGTH: usize = 36;
