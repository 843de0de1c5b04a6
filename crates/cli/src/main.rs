//! CLI tool for converting text-pair datasets into LaserTagger training
//! features.
//!
//! Reads (source, target) pairs from a WikiSplit or DiscoFuse file,
//! converts each pair into a tag sequence plus fixed-width feature
//! arrays, and writes one JSON record per converted example. It uses the
//! HuggingFace tokenizers Rust library for WordPiece tokenization.

use std::path::{Path, PathBuf};

use clap::Parser;
use stderrlog::Timestamp;
use tokenizers::models::wordpiece::WordPiece;
use tokenizers::normalizers::BertNormalizer;
use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
use tokenizers::Tokenizer as HfTokenizer;

use lasertagger_prep_core::{
    convert_pairs, convert_pairs_parallel, count_file_path, read_label_map,
    write_jsonl_output, yield_sources_and_targets, BuilderConfig, ExampleBuilder,
    InputFormat, PhraseVocabulary, PrepResult, RawPair, Subword, SubwordTokenizer,
    TaggingConverter, MAX_SEQ_LENGTH, MAX_TGT_LENGTH,
};

/// Convert a (source, target) pair dataset into LaserTagger features.
#[derive(Parser, Debug)]
#[command(name = "lasertagger-prep")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input file containing examples to be converted
    #[arg(long)]
    input_file: PathBuf,

    /// Format which indicates how to parse the input file
    #[arg(long, value_enum)]
    input_format: InputFormatArg,

    /// Path to the resulting JSONL feature file
    #[arg(long)]
    output_file: PathBuf,

    /// Path to the label map file: either a JSON object mapping each tag
    /// to an id, or a text file with one tag per line
    #[arg(long)]
    label_map_file: PathBuf,

    /// Path to the BERT vocabulary file
    #[arg(long)]
    vocab_file: PathBuf,

    /// Maximum sequence length
    #[arg(long, default_value_t = MAX_SEQ_LENGTH)]
    max_seq_length: usize,

    /// Maximum decoder sequence length
    #[arg(long, default_value_t = MAX_TGT_LENGTH)]
    max_tgt_length: usize,

    /// Lower case the input text; should be set for uncased models
    #[arg(long)]
    do_lower_case: bool,

    /// Whether to enable the SWAP tag
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    enable_swap_tag: bool,

    /// Also output records for pairs that cannot be converted, tagged
    /// with the KEEP-DELETE-KEEP-... pattern; useful when preprocessing
    /// a development set so eval scores stay comparable
    #[arg(long)]
    output_arbitrary_targets_for_infeasible_examples: bool,

    /// Convert pairs on a single thread instead of in parallel
    #[arg(long)]
    sequential: bool,

    #[command(flatten)]
    log_args: LogArgs,
}

/// Input format flag value.
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum InputFormatArg {
    Wikisplit,
    Discofuse,
}

impl From<InputFormatArg> for InputFormat {
    fn from(value: InputFormatArg) -> Self {
        match value {
            InputFormatArg::Wikisplit => InputFormat::Wikisplit,
            InputFormatArg::Discofuse => InputFormat::Discofuse,
        }
    }
}

/// Logging setup arg group.
#[derive(clap::Args, Debug)]
struct LogArgs {
    /// Silence log messages.
    #[clap(short, long)]
    quiet: bool,

    /// Turn debugging information on (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Enable timestamped logging.
    #[clap(long)]
    ts: bool,
}

impl LogArgs {
    fn setup_logging(&self, default: u8) -> Result<(), Box<dyn std::error::Error>> {
        let level = if self.verbose > 0 {
            self.verbose
        } else {
            default
        };

        let log_level = match level {
            0 => stderrlog::LogLevelNum::Off,
            1 => stderrlog::LogLevelNum::Error,
            2 => stderrlog::LogLevelNum::Warn,
            3 => stderrlog::LogLevelNum::Info,
            4 => stderrlog::LogLevelNum::Debug,
            _ => stderrlog::LogLevelNum::Trace,
        };

        stderrlog::new()
            .quiet(self.quiet)
            .verbosity(log_level)
            .timestamp(if self.ts {
                Timestamp::Second
            } else {
                Timestamp::Off
            })
            .init()?;

        Ok(())
    }
}

/// WordPiece tokenizer backed by the HuggingFace `tokenizers` library.
///
/// The library is Rust-native and `Send + Sync`, which enables parallel
/// conversion across pairs.
struct WordPieceTokenizer {
    inner: HfTokenizer,
    pad_id: u32,
    start_id: u32,
    end_id: u32,
    unknown_id: u32,
}

impl WordPieceTokenizer {
    /// Load a WordPiece tokenizer from a BERT vocabulary file.
    fn load(vocab_file: &Path, do_lower_case: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let vocab = vocab_file
            .to_str()
            .ok_or("vocab file path is not valid UTF-8")?;
        let model = WordPiece::from_file(vocab)
            .unk_token("[UNK]".to_string())
            .build()
            .map_err(|e| e as Box<dyn std::error::Error>)?;

        let mut inner = HfTokenizer::new(model);
        inner.with_normalizer(Some(BertNormalizer::new(true, true, None, do_lower_case)));
        inner.with_pre_tokenizer(Some(BertPreTokenizer));

        let special = |token: &str| -> Result<u32, Box<dyn std::error::Error>> {
            inner
                .token_to_id(token)
                .ok_or_else(|| format!("vocab file is missing the {} token", token).into())
        };
        let pad_id = special("[PAD]")?;
        let start_id = special("[CLS]")?;
        let end_id = special("[SEP]")?;
        let unknown_id = special("[UNK]")?;

        Ok(Self {
            inner,
            pad_id,
            start_id,
            end_id,
            unknown_id,
        })
    }
}

impl SubwordTokenizer for WordPieceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Subword> {
        let encoding = self
            .inner
            .encode(text, false)
            .expect("Failed to encode text with tokenizer");
        encoding
            .get_tokens()
            .iter()
            .zip(encoding.get_ids())
            .map(|(piece, &id)| Subword {
                piece: piece.clone(),
                id,
            })
            .collect()
    }

    fn pad_id(&self) -> u32 {
        self.pad_id
    }

    fn start_id(&self) -> u32 {
        self.start_id
    }

    fn end_id(&self) -> u32 {
        self.end_id
    }

    fn unknown_id(&self) -> u32 {
        self.unknown_id
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    args.log_args.setup_logging(3)?;

    log::info!("Loading label map from {:?}...", args.label_map_file);
    let label_map = read_label_map(&args.label_map_file)?;
    let phrase_vocabulary = PhraseVocabulary::from_label_map(&label_map);
    log::info!(
        "{} tag labels, {} insertable phrases (longest: {} tokens).",
        label_map.len(),
        phrase_vocabulary.len(),
        phrase_vocabulary.max_phrase_tokens()
    );

    let converter = TaggingConverter::new(phrase_vocabulary, args.enable_swap_tag);

    log::info!("Loading tokenizer from {:?}...", args.vocab_file);
    let tokenizer = WordPieceTokenizer::load(&args.vocab_file, args.do_lower_case)?;

    let config = BuilderConfig {
        max_seq_length: args.max_seq_length,
        max_tgt_length: args.max_tgt_length,
        do_lower_case: args.do_lower_case,
    };
    let builder = ExampleBuilder::new(label_map, converter, config, tokenizer);

    let format = args.input_format.into();
    let emit = args.output_arbitrary_targets_for_infeasible_examples;

    log::info!("Converting pairs from {:?}...", args.input_file);
    let (records, result) = if args.sequential {
        let pairs = yield_sources_and_targets(&args.input_file, format)?;
        convert_pairs(pairs, &builder, emit)?
    } else {
        let pairs: Vec<RawPair> = yield_sources_and_targets(&args.input_file, format)?
            .collect::<PrepResult<_>>()?;
        convert_pairs_parallel(pairs, &builder, emit)
    };

    write_jsonl_output(&records, &args.output_file)?;

    println!("\n[summary]");
    println!("  Pairs read: {}", result.total_pairs);
    println!("  Converted: {}", result.converted);
    println!("  Skipped (infeasible): {}", result.skipped);
    println!("  Output: {:?}", args.output_file);
    println!("  Count file: {:?}", count_file_path(&args.output_file));

    Ok(())
}
