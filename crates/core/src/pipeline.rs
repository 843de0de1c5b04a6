//! Driver: convert raw pairs into feature records and write JSONL output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::Serialize;

use crate::builder::{BuildOutcome, ExampleBuilder, FeatureRecord};
use crate::errors::PrepResult;
use crate::reader::RawPair;
use crate::SubwordTokenizer;

const LOG_EVERY: usize = 10_000;

/// One output line: the feature record plus the per-row decoder lengths
/// derived from `dec_inputs`.
#[derive(Debug, Serialize)]
pub struct OutputRecord {
    #[serde(flatten)]
    pub features: FeatureRecord,
    pub answer_len: Vec<usize>,
}

impl OutputRecord {
    /// Wrap a feature record, counting the non-pad ids of each decoder row.
    pub fn new(features: FeatureRecord, pad_id: u32) -> Self {
        let answer_len = features
            .dec_inputs
            .iter()
            .map(|row| row.iter().filter(|&&id| id != pad_id).count())
            .collect();
        Self {
            features,
            answer_len,
        }
    }
}

/// End-of-run accounting.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PipelineResult {
    pub total_pairs: usize,
    pub converted: usize,
    pub skipped: usize,
}

/// Convert pairs one at a time, preserving input order.
///
/// The builder is called exactly once per pair; skipped (infeasible)
/// pairs leave no record behind.
pub fn convert_pairs<T, I>(
    pairs: I,
    builder: &ExampleBuilder<T>,
    emit_for_infeasible: bool,
) -> PrepResult<(Vec<OutputRecord>, PipelineResult)>
where
    T: SubwordTokenizer,
    I: IntoIterator<Item = PrepResult<RawPair>>,
{
    let pad_id = builder.pad_id();
    let mut records = Vec::new();
    let mut total = 0;
    for (i, pair) in pairs.into_iter().enumerate() {
        let pair = pair?;
        total += 1;
        if i % LOG_EVERY == 0 {
            log::info!("{} examples processed, {} converted.", i, records.len());
        }
        match builder.build_example(&pair.sources, &pair.target, emit_for_infeasible) {
            BuildOutcome::Built { record, .. } => {
                records.push(OutputRecord::new(record, pad_id))
            }
            BuildOutcome::Skipped => {}
        }
    }
    let converted = records.len();
    Ok((
        records,
        PipelineResult {
            total_pairs: total,
            converted,
            skipped: total - converted,
        },
    ))
}

/// Convert pairs across rayon workers.
///
/// Each pair's conversion is a pure function of its own inputs plus the
/// shared immutable builder, so the output collection still matches the
/// input order.
pub fn convert_pairs_parallel<T>(
    pairs: Vec<RawPair>,
    builder: &ExampleBuilder<T>,
    emit_for_infeasible: bool,
) -> (Vec<OutputRecord>, PipelineResult)
where
    T: SubwordTokenizer + Sync,
{
    let pad_id = builder.pad_id();
    let total = pairs.len();
    let processed = AtomicUsize::new(0);

    let records: Vec<OutputRecord> = pairs
        .into_par_iter()
        .filter_map(|pair| {
            let count = processed.fetch_add(1, Ordering::Relaxed) + 1;
            if count % LOG_EVERY == 0 {
                log::info!("{}/{} examples processed...", count, total);
            }
            match builder.build_example(&pair.sources, &pair.target, emit_for_infeasible) {
                BuildOutcome::Built { record, .. } => Some(OutputRecord::new(record, pad_id)),
                BuildOutcome::Skipped => None,
            }
        })
        .collect();

    let converted = records.len();
    (
        records,
        PipelineResult {
            total_pairs: total,
            converted,
            skipped: total - converted,
        },
    )
}

/// Path of the sidecar file holding the converted-example count.
pub fn count_file_path(output_path: &Path) -> PathBuf {
    let mut os = output_path.as_os_str().to_owned();
    os.push(".num_examples.txt");
    PathBuf::from(os)
}

/// Write one JSON object per record, then the converted-count sidecar.
///
/// The count is used downstream to size the number of training steps.
pub fn write_jsonl_output(records: &[OutputRecord], output_path: &Path) -> PrepResult<()> {
    let mut out = BufWriter::new(File::create(output_path)?);
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    std::fs::write(count_file_path(output_path), records.len().to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::builder::BuilderConfig;
    use crate::converter::TaggingConverter;
    use crate::label_map::LabelMap;
    use crate::phrase_vocab::PhraseVocabulary;
    use crate::testutil::FixtureTokenizer;

    fn test_builder() -> ExampleBuilder<FixtureTokenizer> {
        let label_map = LabelMap::from_entries(vec![
            ("KEEP".to_string(), 1),
            ("DELETE".to_string(), 2),
            ("SWAP".to_string(), 3),
            ("KEEP|the".to_string(), 4),
        ]);
        let converter =
            TaggingConverter::new(PhraseVocabulary::from_label_map(&label_map), true);
        let tokenizer = FixtureTokenizer::new(&[
            ("the", vec!["the"]),
            ("cat", vec!["cat"]),
            ("sat", vec!["sat"]),
            ("dog", vec!["dog"]),
            ("ran", vec!["ran"]),
        ]);
        let config = BuilderConfig {
            max_seq_length: 12,
            max_tgt_length: 4,
            do_lower_case: false,
        };
        ExampleBuilder::new(label_map, converter, config, tokenizer)
    }

    fn pair(source: &str, target: &str) -> RawPair {
        RawPair {
            sources: vec![source.to_string()],
            target: target.to_string(),
        }
    }

    fn test_pairs() -> Vec<RawPair> {
        vec![
            pair("cat sat", "the cat sat"),
            pair("dog ran", "cat dog ran"), // infeasible: "cat" is not insertable
            pair("the dog ran", "the dog ran"),
        ]
    }

    #[test]
    fn test_convert_pairs_counts_and_order() {
        let builder = test_builder();
        let pairs = test_pairs().into_iter().map(Ok);
        let (records, result) = convert_pairs(pairs, &builder, false).unwrap();

        assert_eq!(result.total_pairs, 3);
        assert_eq!(result.converted, 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(records.len(), 2);
        // First record is the insertion pair, second the identity pair.
        assert_eq!(records[0].features.nums_add, 1);
        assert_eq!(records[1].features.nums_add, 0);
    }

    #[test]
    fn test_emit_for_infeasible_keeps_every_pair() {
        let builder = test_builder();
        let pairs = test_pairs().into_iter().map(Ok);
        let (records, result) = convert_pairs(pairs, &builder, true).unwrap();
        assert_eq!(result.converted, 3);
        assert_eq!(result.skipped, 0);
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let builder = test_builder();
        let (sequential, seq_result) =
            convert_pairs(test_pairs().into_iter().map(Ok), &builder, false).unwrap();
        let (parallel, par_result) = convert_pairs_parallel(test_pairs(), &builder, false);

        assert_eq!(seq_result, par_result);
        assert_eq!(sequential.len(), parallel.len());
        for (a, b) in sequential.iter().zip(&parallel) {
            assert_eq!(a.features, b.features);
            assert_eq!(a.answer_len, b.answer_len);
        }
    }

    #[test]
    fn test_answer_len_counts_decoder_tokens() {
        let builder = test_builder();
        let (records, _) =
            convert_pairs(test_pairs().into_iter().map(Ok), &builder, false).unwrap();
        let record = &records[0];
        // The insertion position carries CLS + "the"; everything else is empty.
        let live: Vec<usize> = record
            .answer_len
            .iter()
            .copied()
            .filter(|&n| n > 0)
            .collect();
        assert_eq!(live, vec![2]);
    }

    #[test]
    fn test_write_jsonl_output() {
        let temp = TempDir::new().unwrap();
        let out_path = temp.path().join("features.jsonl");

        let builder = test_builder();
        let (records, _) =
            convert_pairs(test_pairs().into_iter().map(Ok), &builder, false).unwrap();
        write_jsonl_output(&records, &out_path).unwrap();

        let written = std::fs::read_to_string(&out_path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        for field in [
            "input_ids",
            "input_mask",
            "segment_ids",
            "labels",
            "labels_mask",
            "add_mask",
            "add_index",
            "dec_inputs",
            "dec_targets",
            "nums_add",
            "answer_len",
        ] {
            assert!(first.get(field).is_some(), "missing field {}", field);
        }

        let count = std::fs::read_to_string(count_file_path(&out_path)).unwrap();
        assert_eq!(count, "2");
    }
}
