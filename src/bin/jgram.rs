use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use jgram::{
    ChunkSource, EqualityKind, FactorPass, Inducer, InducerConfig, MergePass, Mode, Synonyms,
};
use log::info;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Convert natural language examples to a JSGF grammar",
    long_about = None
)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// One rule per utterance, no merging or factoring; the grammar
    /// generates exactly the source corpus
    Clone(CloneArgs),
    /// Exact-key merging plus expression factoring; corpus-faithful
    Compress(TuneArgs),
    /// Fuzzy single-slot merging; may generate strings not in the corpus
    Interpolate(FuzzyArgs),
    /// Fuzzy merging plus user-synonym expansion
    Extrapolate(ExtrapolateArgs),
    /// Fully custom pass selection
    Custom(CustomArgs),
}

#[derive(Args, Debug)]
struct IoArgs {
    /// Corpus file with one utterance per line (.txt or .csv)
    input: PathBuf,

    /// jsgf file to write the grammar to; prints to stdout when omitted
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Format the output grammar with a single public main rule
    #[arg(short = 'm', long)]
    main: bool,

    /// Disable per-pass logging and the progress spinner
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct CloneArgs {
    #[command(flatten)]
    io: IoArgs,
}

#[derive(Args, Debug)]
struct TuneArgs {
    #[command(flatten)]
    io: IoArgs,

    /// Transitional probability below which token sequences are split
    #[arg(short = 'p', long, value_name = "PROB", default_value_t = 0.1)]
    prob: f64,

    /// Occurrence count above which an expression group is factored out
    #[arg(short = 'f', long, value_name = "COUNT", default_value_t = 1)]
    factor: usize,
}

#[derive(Args, Debug)]
struct FuzzyArgs {
    #[command(flatten)]
    tune: TuneArgs,

    /// Equality predicate for the single-slot merge passes
    #[arg(long, value_enum, default_value_t = EqualityArg::Literal)]
    equality: EqualityArg,

    /// Similarity cutoff for the threshold-based predicates
    #[arg(long, value_name = "RATIO", default_value_t = 0.8)]
    similarity_cutoff: f64,
}

#[derive(Args, Debug)]
struct ExtrapolateArgs {
    #[command(flatten)]
    fuzzy: FuzzyArgs,

    /// JSON file mapping canonical phrases to alternative phrasings
    #[arg(short = 's', long, value_name = "PATH")]
    synonyms: PathBuf,
}

#[derive(Args, Debug)]
struct CustomArgs {
    #[command(flatten)]
    fuzzy: FuzzyArgs,

    /// Merge passes to run, in order (repeat flag)
    #[arg(long = "merge", value_enum, value_name = "PASS")]
    merge_passes: Vec<MergePassArg>,

    /// Factor passes to run, in order (repeat flag)
    #[arg(long = "factor-pass", value_enum, value_name = "PASS")]
    factor_passes: Vec<FactorPassArg>,

    /// What drives the transition model during chunking
    #[arg(long, value_enum, default_value_t = ChunkSourceArg::Tokens)]
    chunk_source: ChunkSourceArg,

    /// JSON synonym file, required when a synonym pass is selected
    #[arg(short = 's', long, value_name = "PATH")]
    synonyms: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum EqualityArg {
    Literal,
    CharLevenshtein,
    TokenLevenshtein,
    TfidfCosine,
    PosTag,
    ConstituencyTag,
}

impl fmt::Display for EqualityArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EqualityArg::Literal => "literal",
            EqualityArg::CharLevenshtein => "char-levenshtein",
            EqualityArg::TokenLevenshtein => "token-levenshtein",
            EqualityArg::TfidfCosine => "tfidf-cosine",
            EqualityArg::PosTag => "pos-tag",
            EqualityArg::ConstituencyTag => "constituency-tag",
        };
        f.write_str(label)
    }
}

impl From<EqualityArg> for EqualityKind {
    fn from(value: EqualityArg) -> Self {
        match value {
            EqualityArg::Literal => Self::Literal,
            EqualityArg::CharLevenshtein => Self::CharLevenshtein,
            EqualityArg::TokenLevenshtein => Self::TokenLevenshtein,
            EqualityArg::TfidfCosine => Self::TfidfCosine,
            EqualityArg::PosTag => Self::PosTag,
            EqualityArg::ConstituencyTag => Self::ConstituencyTag,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MergePassArg {
    Pre,
    Root,
    Suf,
    PreRoot,
    PreSuf,
    RootSuf,
    Trivial,
}

impl From<MergePassArg> for MergePass {
    fn from(value: MergePassArg) -> Self {
        match value {
            MergePassArg::Pre => Self::Pre,
            MergePassArg::Root => Self::Root,
            MergePassArg::Suf => Self::Suf,
            MergePassArg::PreRoot => Self::PreRoot,
            MergePassArg::PreSuf => Self::PreSuf,
            MergePassArg::RootSuf => Self::RootSuf,
            MergePassArg::Trivial => Self::Trivial,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FactorPassArg {
    Expression,
    Constituency,
    Synonym,
}

impl From<FactorPassArg> for FactorPass {
    fn from(value: FactorPassArg) -> Self {
        match value {
            FactorPassArg::Expression => Self::Expression,
            FactorPassArg::Constituency => Self::Constituency,
            FactorPassArg::Synonym => Self::Synonym,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ChunkSourceArg {
    Tokens,
    PosTags,
    ConstituencyTags,
}

impl fmt::Display for ChunkSourceArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChunkSourceArg::Tokens => "tokens",
            ChunkSourceArg::PosTags => "pos-tags",
            ChunkSourceArg::ConstituencyTags => "constituency-tags",
        };
        f.write_str(label)
    }
}

impl From<ChunkSourceArg> for ChunkSource {
    fn from(value: ChunkSourceArg) -> Self {
        match value {
            ChunkSourceArg::Tokens => Self::Tokens,
            ChunkSourceArg::PosTags => Self::PosTags,
            ChunkSourceArg::ConstituencyTags => Self::ConstituencyTags,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Clone(args) => {
            let cfg = InducerConfig::builder()
                .mode(Mode::Clone)
                .show_progress(!args.io.no_progress)
                .emit_main(args.io.main)
                .build()?;
            run(cfg, &args.io, None)
        }
        Commands::Compress(args) => {
            let cfg = InducerConfig::builder()
                .mode(Mode::Compress)
                .chunk_threshold(args.prob)
                .factor_cutoff(args.factor)
                .show_progress(!args.io.no_progress)
                .emit_main(args.io.main)
                .build()?;
            run(cfg, &args.io, None)
        }
        Commands::Interpolate(args) => {
            let cfg = InducerConfig::builder()
                .mode(Mode::Interpolate)
                .chunk_threshold(args.tune.prob)
                .factor_cutoff(args.tune.factor)
                .equality(args.equality.into())
                .similarity_cutoff(args.similarity_cutoff)
                .show_progress(!args.tune.io.no_progress)
                .emit_main(args.tune.io.main)
                .build()?;
            run(cfg, &args.tune.io, None)
        }
        Commands::Extrapolate(args) => {
            let cfg = InducerConfig::builder()
                .mode(Mode::Extrapolate)
                .chunk_threshold(args.fuzzy.tune.prob)
                .factor_cutoff(args.fuzzy.tune.factor)
                .equality(args.fuzzy.equality.into())
                .similarity_cutoff(args.fuzzy.similarity_cutoff)
                .show_progress(!args.fuzzy.tune.io.no_progress)
                .emit_main(args.fuzzy.tune.io.main)
                .build()?;
            run(cfg, &args.fuzzy.tune.io, Some(args.synonyms.as_path()))
        }
        Commands::Custom(args) => {
            if args
                .factor_passes
                .iter()
                .any(|pass| matches!(pass, FactorPassArg::Synonym))
                && args.synonyms.is_none()
            {
                bail!("the synonym factor pass requires --synonyms");
            }
            let cfg = InducerConfig::builder()
                .mode(Mode::Custom)
                .chunk_source(args.chunk_source.into())
                .chunk_threshold(args.fuzzy.tune.prob)
                .factor_cutoff(args.fuzzy.tune.factor)
                .equality(args.fuzzy.equality.into())
                .similarity_cutoff(args.fuzzy.similarity_cutoff)
                .merge_passes(args.merge_passes.iter().copied().map(MergePass::from))
                .factor_passes(args.factor_passes.iter().copied().map(FactorPass::from))
                .show_progress(!args.fuzzy.tune.io.no_progress)
                .emit_main(args.fuzzy.tune.io.main)
                .build()?;
            run(cfg, &args.fuzzy.tune.io, args.synonyms.as_deref())
        }
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    use log::LevelFilter;

    let level = if quiet > 0 {
        match quiet {
            1 => LevelFilter::Warn,
            _ => LevelFilter::Error,
        }
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    builder.filter_level(level);
    let _ = builder.try_init();
}

/// Checks that the corpus path exists and carries a txt/csv extension.
fn validate_input(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("input file {} does not exist", path.display());
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("txt" | "csv") => Ok(()),
        _ => bail!(
            "input file {} extension is not one of .txt, .csv",
            path.display()
        ),
    }
}

/// Checks that the output directory exists and the extension is .jsgf.
fn validate_output(path: &Path) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    if !parent.as_os_str().is_empty() && !parent.is_dir() {
        bail!("output directory {} does not exist", parent.display());
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("jsgf") => Ok(()),
        _ => bail!("output file {} extension is not .jsgf", path.display()),
    }
}

fn run(cfg: InducerConfig, io: &IoArgs, synonyms_path: Option<&Path>) -> Result<()> {
    validate_input(&io.input)?;
    if let Some(output) = &io.output {
        validate_output(output)?;
    }

    let synonyms = match synonyms_path {
        Some(path) => jgram::corpus::load_synonyms(path)
            .with_context(|| format!("failed to load synonyms from {}", path.display()))?,
        None => Synonyms::new(),
    };

    let spinner = if io.no_progress || io.output.is_none() {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} inducing grammar... {elapsed}")
            .expect("valid spinner template");
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    };

    let inducer = Inducer::new(cfg.clone());
    let artifacts = inducer
        .induce_from_path(&io.input, &synonyms)
        .with_context(|| format!("failed to induce grammar from {}", io.input.display()))?;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let stats = &artifacts.stats;
    info!(
        "induced {} rules from {} utterances ({} distinct chunks) in {:.2?}",
        stats.final_rules, stats.utterances, stats.distinct_chunks, stats.total_duration
    );

    match &io.output {
        Some(path) => {
            artifacts
                .grammar
                .write_to(path, &cfg, io.main)
                .with_context(|| format!("failed to write grammar to {}", path.display()))?;
            println!(
                "✅ wrote grammar with {} rules to {}",
                stats.final_rules,
                path.display()
            );
        }
        None => print!("{}", artifacts.grammar.render(&cfg, io.main)),
    }

    Ok(())
}
