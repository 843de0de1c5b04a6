//! Raw-pair readers for the supported dataset formats.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;

use crate::errors::{PrepError, PrepResult};

/// Input dataset format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Plain TSV: `source <TAB> target`, one pair per line.
    Wikisplit,
    /// Tab-delimited CSV with a header, DiscoFuse column layout.
    Discofuse,
}

/// One raw example: one or more source texts plus the target text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPair {
    pub sources: Vec<String>,
    pub target: String,
}

#[derive(Debug, Deserialize)]
struct DiscofuseRow {
    coherent_first_sentence: String,
    coherent_second_sentence: String,
    incoherent_first_sentence: String,
    incoherent_second_sentence: String,
}

/// Lazily yield the (sources, target) pairs of an input file.
///
/// The sequence is finite and restartable by calling again with the same
/// arguments. Structurally invalid lines surface as errors in the
/// stream.
pub fn yield_sources_and_targets(
    path: &Path,
    format: InputFormat,
) -> PrepResult<Box<dyn Iterator<Item = PrepResult<RawPair>>>> {
    match format {
        InputFormat::Wikisplit => {
            let reader = BufReader::new(File::open(path)?);
            let iter = reader
                .lines()
                .enumerate()
                .filter_map(|(idx, line)| match line {
                    Ok(line) => {
                        if line.trim().is_empty() {
                            return None;
                        }
                        match line.split_once('\t') {
                            Some((source, target)) => Some(Ok(RawPair {
                                sources: vec![source.to_string()],
                                target: target.to_string(),
                            })),
                            None => Some(Err(PrepError::BadRecord {
                                line: idx + 1,
                                reason: "expected source<TAB>target".to_string(),
                            })),
                        }
                    }
                    Err(e) => Some(Err(e.into())),
                });
            Ok(Box::new(iter))
        }
        InputFormat::Discofuse => {
            let reader = csv::ReaderBuilder::new()
                .delimiter(b'\t')
                .from_path(path)?;
            let iter = reader.into_deserialize::<DiscofuseRow>().map(|row| {
                let row = row?;
                let mut target = row.coherent_first_sentence;
                if !row.coherent_second_sentence.is_empty() {
                    target.push(' ');
                    target.push_str(&row.coherent_second_sentence);
                }
                Ok(RawPair {
                    sources: vec![
                        row.incoherent_first_sentence,
                        row.incoherent_second_sentence,
                    ],
                    target,
                })
            });
            Ok(Box::new(iter))
        }
    }
}
