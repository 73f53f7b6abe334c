//! Grammar induction library and CLI.
//!
//! The crate exposes both a library API and a `jgram` command line
//! interface for inducing compact JSGF-style grammars from a corpus of
//! example utterances.  Typical usage loads a corpus, runs an induction
//! mode, and persists the resulting `.jsgf` grammar.
//!
//! ```no_run
//! use jgram::{InducerConfig, Inducer, Mode, Synonyms};
//!
//! # fn main() -> jgram::Result<()> {
//! let cfg = InducerConfig::builder()
//!     .mode(Mode::Compress)
//!     .chunk_threshold(0.1)
//!     .factor_cutoff(1)
//!     .show_progress(false)
//!     .build()?;
//! let inducer = Inducer::new(cfg.clone());
//! let artifacts = inducer.induce_from_path("examples.txt", &Synonyms::new())?;
//! artifacts.grammar.write_to("examples.jsgf", &cfg, false)?;
//! # Ok(())
//! # }
//! ```
//!
//! The CLI is enabled by default through the `cli` feature.  Users
//! targeting the library portion only can disable default features to
//! avoid the CLI dependencies: `jgram = { version = "...", default-features = false }`.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown,
    clippy::multiple_crate_versions
)]

pub mod chunk;
pub mod config;
pub mod corpus;
pub mod error;
pub mod factor;
pub mod grammar;
pub mod merge;
pub mod metrics;
pub mod pipeline;
pub mod rule;
pub mod similarity;
pub mod tag;
pub mod tokenize;

pub use config::{ChunkSource, EqualityKind, FactorPass, InducerBuilder, InducerConfig, MergePass, Mode};
pub use corpus::{Synonyms, Utterance};
pub use error::{JgramError, Result};
pub use grammar::Grammar;
pub use metrics::{InductionStats, PassMetrics};
pub use pipeline::{Inducer, InducerArtifacts};
pub use rule::Rule;
