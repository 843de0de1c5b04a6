//! Tagging converter: tag sequences that rewrite a source into a target.

use crate::align::longest_common_subsequence;
use crate::phrase_vocab::PhraseVocabulary;
use crate::tagging::{fallback_tags, BaseOperation, EditingTask, Tag, TaggedExample};

/// Computes, for a (source, target) token pair, the tag sequence that
/// reproduces the target, or reports infeasibility.
///
/// Tie-break policy: fewest edits first, then prefer KEEP over DELETE,
/// then prefer not using SWAP. Conversion never fails hard; unconvertible
/// pairs come back with fallback tags and `is_feasible == false`.
#[derive(Debug, Clone)]
pub struct TaggingConverter {
    phrase_vocabulary: PhraseVocabulary,
    enable_swap_tag: bool,
}

impl TaggingConverter {
    pub fn new(phrase_vocabulary: PhraseVocabulary, enable_swap_tag: bool) -> Self {
        Self {
            phrase_vocabulary,
            enable_swap_tag,
        }
    }

    /// The vocabulary of insertable phrases.
    pub fn phrase_vocabulary(&self) -> &PhraseVocabulary {
        &self.phrase_vocabulary
    }

    /// Compute one tag per source token such that realizing the tags
    /// reproduces `target_tokens` exactly.
    pub fn compute_tags(&self, task: &EditingTask, target_tokens: &[String]) -> TaggedExample {
        let target: Vec<&str> = target_tokens.iter().map(String::as_str).collect();

        let verified = |tags: Vec<Tag>| -> Option<Vec<Tag>> {
            (task.realize_output(&tags).as_slice() == target_tokens).then_some(tags)
        };

        let source: Vec<&str> = task
            .sources()
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();
        let in_order = self.tag_in_order(&source, &target).and_then(&verified);

        let swapped = if self.enable_swap_tag && task.num_sources() == 2 {
            self.tag_swapped(task, &target).and_then(&verified)
        } else {
            None
        };

        let chosen = match (in_order, swapped) {
            // SWAP only wins when it strictly reduces the edit count.
            (Some(a), Some(b)) => Some(if edit_count(&b) < edit_count(&a) { b } else { a }),
            (a, b) => a.or(b),
        };

        match chosen {
            Some(tags) => TaggedExample {
                tags,
                is_feasible: true,
            },
            None => TaggedExample {
                tags: fallback_tags(task.num_tokens()),
                is_feasible: false,
            },
        }
    }

    /// In-order tagging: aligned source tokens are kept, the rest are
    /// deleted, and each gap of unmatched target tokens must form exactly
    /// one vocabulary phrase.
    fn tag_in_order(&self, source: &[&str], target: &[&str]) -> Option<Vec<Tag>> {
        let mut tags = vec![Tag::new(BaseOperation::Delete); source.len()];
        let matches = longest_common_subsequence(source, target);
        for &(si, _) in &matches {
            tags[si].base = BaseOperation::Keep;
        }

        // Unmatched target tokens between consecutive matches are spliced
        // in before the next kept source token.
        let mut gap_start = 0;
        for &(si, ti) in &matches {
            if ti > gap_start {
                let phrase = target[gap_start..ti].join(" ");
                if !self.phrase_vocabulary.contains(&phrase) {
                    return None;
                }
                tags[si].added_phrase = Some(phrase);
            }
            gap_start = ti + 1;
        }

        // A trailing gap has no kept token to anchor on; it rides on the
        // first deleted token after the last keep, which realizes to the
        // phrase alone.
        if gap_start < target.len() {
            let phrase = target[gap_start..].join(" ");
            if !self.phrase_vocabulary.contains(&phrase) {
                return None;
            }
            let anchor = match matches.last() {
                Some(&(si, _)) => ((si + 1)..source.len())
                    .find(|&i| tags[i].base == BaseOperation::Delete)?,
                None if source.is_empty() => return None,
                None => 0,
            };
            tags[anchor].added_phrase = Some(phrase);
        }

        Some(tags)
    }

    /// Tagging with the two source segments' blocks in swapped order,
    /// mapped back to original token positions with the SWAP tag on the
    /// last token of the first segment.
    fn tag_swapped(&self, task: &EditingTask, target: &[&str]) -> Option<Vec<Tag>> {
        let sources = task.sources();
        let first_len = task.first_segment_len();
        let second_len = sources[1].len();

        let swapped: Vec<&str> = sources[1]
            .iter()
            .chain(sources[0].iter())
            .map(String::as_str)
            .collect();
        let tags = self.tag_in_order(&swapped, target)?;

        let mut reordered = Vec::with_capacity(tags.len());
        reordered.extend_from_slice(&tags[second_len..]);
        reordered.extend_from_slice(&tags[..second_len]);

        // The boundary token must survive the edit for the swap marker to
        // be realizable.
        let boundary = first_len.checked_sub(1)?;
        if reordered[boundary].base != BaseOperation::Keep {
            return None;
        }
        reordered[boundary].base = BaseOperation::Swap;
        Some(reordered)
    }
}

/// Deletions plus insertions in a tag sequence.
fn edit_count(tags: &[Tag]) -> usize {
    let deletions = tags
        .iter()
        .filter(|t| t.base == BaseOperation::Delete)
        .count();
    let insertions = tags.iter().filter(|t| t.added_phrase.is_some()).count();
    deletions + insertions
}
