//! Example builder: tokenization, tag alignment, and fixed-width features.

use serde::Serialize;

use crate::converter::TaggingConverter;
use crate::label_map::LabelMap;
use crate::tagging::{get_token_list, BaseOperation, EditingTask};
use crate::{Subword, SubwordTokenizer, MAX_SEQ_LENGTH, MAX_TGT_LENGTH};

/// Immutable builder configuration.
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Truncation bound for the input subword sequence.
    pub max_seq_length: usize,
    /// Truncation bound for decoder phrase sequences.
    pub max_tgt_length: usize,
    /// Lowercase raw text before tokenization.
    pub do_lower_case: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_seq_length: MAX_SEQ_LENGTH,
            max_tgt_length: MAX_TGT_LENGTH,
            do_lower_case: false,
        }
    }
}

/// Fixed-schema feature record consumed by model training.
///
/// All flat arrays have length `max_seq_length`; `dec_inputs` and
/// `dec_targets` have one `max_tgt_length`-wide row per input position,
/// all-pad wherever `add_mask` is 0.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FeatureRecord {
    pub input_ids: Vec<u32>,
    pub input_mask: Vec<u8>,
    pub segment_ids: Vec<u8>,
    pub labels: Vec<u32>,
    pub labels_mask: Vec<u8>,
    pub add_mask: Vec<u8>,
    pub add_index: Vec<u32>,
    pub dec_inputs: Vec<Vec<u32>>,
    pub dec_targets: Vec<Vec<u32>>,
    pub nums_add: usize,
}

/// Which sub-task an example exercises. Driver bookkeeping only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Pure tagging, no phrase generation.
    Tagging,
    /// At least one inserted phrase routes through the decoder.
    TaggingWithGeneration,
}

/// Outcome of building one example.
#[derive(Debug, Clone)]
pub enum BuildOutcome {
    /// The pair produced no record; the caller skips it.
    Skipped,
    /// A complete feature record.
    Built {
        record: FeatureRecord,
        is_feasible: bool,
        task: TaskKind,
    },
}

/// Combines the converter and the subword tokenizer into feature records.
pub struct ExampleBuilder<T> {
    label_map: LabelMap,
    converter: TaggingConverter,
    config: BuilderConfig,
    tokenizer: T,
}

impl<T: SubwordTokenizer> ExampleBuilder<T> {
    pub fn new(
        label_map: LabelMap,
        converter: TaggingConverter,
        config: BuilderConfig,
        tokenizer: T,
    ) -> Self {
        Self {
            label_map,
            converter,
            config,
            tokenizer,
        }
    }

    /// Pad id of the underlying tokenizer.
    pub fn pad_id(&self) -> u32 {
        self.tokenizer.pad_id()
    }

    /// Build one feature record from raw source texts and a target text.
    ///
    /// Returns `Skipped` when the pair is infeasible and
    /// `emit_for_infeasible` is false; with the flag set, infeasible
    /// pairs are built from the fallback tag pattern instead.
    pub fn build_example(
        &self,
        sources: &[String],
        target: &str,
        emit_for_infeasible: bool,
    ) -> BuildOutcome {
        let sources: Vec<String> = sources.iter().map(|s| self.normalize(s)).collect();
        let target = self.normalize(target);

        let task = EditingTask::new(&sources);
        let target_tokens = get_token_list(&target);
        let tagged = self.converter.compute_tags(&task, &target_tokens);
        if !tagged.is_feasible && !emit_for_infeasible {
            return BuildOutcome::Skipped;
        }
        let tags = tagged.tags;

        let max_seq = self.config.max_seq_length;
        let pad = self.tokenizer.pad_id();

        let mut input_ids = vec![self.tokenizer.start_id()];
        let mut segment_ids = vec![0u8];
        let mut labels = vec![0u32];
        let mut labels_mask = vec![0u8];
        let mut add_mask = vec![0u8];
        let mut add_index = vec![0u32];
        // (input position, phrase) of each surviving insertion
        let mut insertions: Vec<(usize, String)> = Vec::new();

        let mut word_idx = 0;
        'words: for (seg, source_words) in task.sources().iter().enumerate() {
            for word in source_words {
                let tag = &tags[word_idx];
                word_idx += 1;
                let base_id = self.label_map.id_for(tag.base.as_str()).unwrap_or(0);

                let mut pieces = self.tokenizer.tokenize(word);
                if pieces.is_empty() {
                    // An unknown word still occupies one labeled position.
                    pieces = vec![Subword {
                        piece: word.clone(),
                        id: self.tokenizer.unknown_id(),
                    }];
                }
                for (k, piece) in pieces.iter().enumerate() {
                    // Trailing truncation, leaving room for the end marker.
                    if input_ids.len() + 1 >= max_seq {
                        break 'words;
                    }
                    input_ids.push(piece.id);
                    segment_ids.push(seg as u8);
                    labels.push(base_id);
                    labels_mask.push(1);
                    // The insertion is emitted once per word, on its first piece.
                    let phrase = if k == 0 { tag.added_phrase.as_deref() } else { None };
                    match phrase {
                        Some(phrase) => {
                            add_mask.push(1);
                            add_index.push(
                                self.converter
                                    .phrase_vocabulary()
                                    .phrase_to_id(phrase)
                                    .unwrap_or(0),
                            );
                            insertions.push((input_ids.len() - 1, phrase.to_string()));
                        }
                        None => {
                            add_mask.push(0);
                            add_index.push(0);
                        }
                    }
                }
            }
        }

        input_ids.push(self.tokenizer.end_id());
        segment_ids.push(*segment_ids.last().unwrap_or(&0));
        labels.push(0);
        labels_mask.push(0);
        add_mask.push(0);
        add_index.push(0);

        let real_len = input_ids.len().min(max_seq);
        let mut input_mask = vec![1u8; real_len];

        pad_to(&mut input_ids, max_seq, pad);
        pad_to(&mut input_mask, max_seq, 0);
        pad_to(&mut segment_ids, max_seq, 0);
        pad_to(&mut labels, max_seq, 0);
        pad_to(&mut labels_mask, max_seq, 0);
        pad_to(&mut add_mask, max_seq, 0);
        pad_to(&mut add_index, max_seq, 0);

        let max_tgt = self.config.max_tgt_length;
        let mut dec_inputs = vec![vec![pad; max_tgt]; max_seq];
        let mut dec_targets = vec![vec![pad; max_tgt]; max_seq];
        let nums_add = insertions.len();
        for (pos, phrase) in insertions {
            let phrase_ids: Vec<u32> = self
                .tokenizer
                .tokenize(&phrase)
                .iter()
                .map(|s| s.id)
                .collect();
            let mut dec_input = vec![self.tokenizer.start_id()];
            dec_input.extend(&phrase_ids);
            let mut dec_target = phrase_ids;
            dec_target.push(self.tokenizer.end_id());
            pad_to(&mut dec_input, max_tgt, pad);
            pad_to(&mut dec_target, max_tgt, pad);
            dec_inputs[pos] = dec_input;
            dec_targets[pos] = dec_target;
        }

        let task_kind = if nums_add > 0 {
            TaskKind::TaggingWithGeneration
        } else {
            TaskKind::Tagging
        };

        BuildOutcome::Built {
            record: FeatureRecord {
                input_ids,
                input_mask,
                segment_ids,
                labels,
                labels_mask,
                add_mask,
                add_index,
                dec_inputs,
                dec_targets,
                nums_add,
            },
            is_feasible: tagged.is_feasible,
            task: task_kind,
        }
    }

    fn normalize(&self, text: &str) -> String {
        if self.config.do_lower_case {
            text.to_lowercase()
        } else {
            text.to_string()
        }
    }
}

/// Truncate or pad `v` to exactly `len` elements.
fn pad_to<V: Clone>(v: &mut Vec<V>, len: usize, fill: V) {
    v.truncate(len);
    v.resize(len, fill);
}
