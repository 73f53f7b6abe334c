//! High-level façade wiring the induction pipeline together.
//!
//! Passes are strictly sequential: transition model, chunker, triplet
//! decomposition, merge passes, id assignment, factor passes, emission.
//! Each pass consumes the current rule sequence and produces a new one;
//! nothing here suspends or runs concurrently, so identical input always
//! yields byte-identical output.

use std::path::Path;
use std::time::Instant;

use log::info;

use crate::chunk::{
    collect_chunks, collect_transitions, transition_chunk, ConstituencySplit, PosSplit,
    TokenSplit, TransitionSplit, Transitions,
};
use crate::config::{ChunkSource, EqualityKind, FactorPass, InducerConfig, MergePass};
use crate::corpus::{decompose, load_utterances, Synonyms, Utterance};
use crate::error::Result;
use crate::factor::{constituency_factor, expression_factor, synonym_factor};
use crate::grammar::Grammar;
use crate::merge::{
    char_levenshtein_threshold, constituency_tag_equal, literal_equal, merge, merge_trivial,
    pos_tag_equal, tfidf_cosine_threshold, token_levenshtein_threshold, EqualityFn, MergeKey,
};
use crate::metrics::{InductionStats, PassMetrics};
use crate::rule::{assign_ids, Rule};
use crate::similarity::{collect_idf, collect_vocab};
use crate::tag::{LexiconTagger, SyntacticTagger};
use crate::tokenize::WordTokenizer;

/// High-level façade configuring and executing induction runs.
#[derive(Debug, Clone, Default)]
pub struct Inducer {
    cfg: InducerConfig,
    tokenizer: WordTokenizer,
    tagger: LexiconTagger,
}

/// Artifacts returned after an induction run completes.
#[must_use]
#[derive(Debug, Clone)]
pub struct InducerArtifacts {
    /// The induced grammar.
    pub grammar: Grammar,
    /// Metrics captured during the run.
    pub stats: InductionStats,
}

impl Inducer {
    /// Creates a new inducer for the supplied configuration.
    #[must_use]
    pub fn new(cfg: InducerConfig) -> Self {
        Self {
            cfg,
            tokenizer: WordTokenizer::new(),
            tagger: LexiconTagger::new(),
        }
    }

    /// Returns an immutable reference to the underlying configuration.
    #[must_use]
    pub fn config(&self) -> &InducerConfig {
        &self.cfg
    }

    /// Induces a grammar from the corpus file at `path`.
    pub fn induce_from_path<P: AsRef<Path>>(
        &self,
        path: P,
        synonyms: &Synonyms,
    ) -> Result<InducerArtifacts> {
        let utterances = load_utterances(path, &self.tokenizer)?;
        self.induce(utterances, synonyms)
    }

    /// Induces a grammar from normalized, deduplicated utterances.
    pub fn induce(
        &self,
        mut utterances: Vec<Utterance>,
        synonyms: &Synonyms,
    ) -> Result<InducerArtifacts> {
        self.cfg.validate()?;
        let start = Instant::now();
        let mut stats = InductionStats {
            utterances: utterances.len(),
            ..InductionStats::default()
        };

        let transitions = self.collect(&utterances);
        self.chunk_all(&mut utterances, &transitions);
        let vocabulary = collect_chunks(&utterances);
        stats.distinct_chunks = vocabulary.len();

        let mut rules: Vec<Rule> = utterances
            .iter()
            .map(|utterance| decompose(utterance, &vocabulary))
            .collect();
        if self.cfg.show_progress {
            info!(
                "decomposed {} utterances over {} chunks into {} rules",
                stats.utterances,
                stats.distinct_chunks,
                rules.len()
            );
        }

        let similarity_vocab = collect_vocab(&utterances, &self.tokenizer);
        let similarity_idf = collect_idf(&utterances, &self.tokenizer);
        let fuzzy: EqualityFn<'_> = match self.cfg.equality {
            EqualityKind::Literal => literal_equal(),
            EqualityKind::CharLevenshtein => {
                char_levenshtein_threshold(self.cfg.similarity_cutoff)
            }
            EqualityKind::TokenLevenshtein => {
                token_levenshtein_threshold(self.cfg.similarity_cutoff)
            }
            EqualityKind::TfidfCosine => tfidf_cosine_threshold(
                self.cfg.similarity_cutoff,
                &similarity_vocab,
                &similarity_idf,
                self.tokenizer,
            ),
            EqualityKind::PosTag => pos_tag_equal(&self.tagger),
            EqualityKind::ConstituencyTag => constituency_tag_equal(&self.tagger),
        };
        let exact: EqualityFn<'_> = literal_equal();

        let (merge_passes, factor_passes) = self.cfg.plan();
        for pass in merge_passes {
            rules = self.timed(&mut stats, merge_label(pass), rules, |rules| {
                Ok(match pass {
                    MergePass::Pre => merge(rules, MergeKey::Pre, &fuzzy),
                    MergePass::Root => merge(rules, MergeKey::Root, &fuzzy),
                    MergePass::Suf => merge(rules, MergeKey::Suf, &fuzzy),
                    MergePass::PreRoot => merge(rules, MergeKey::PreRoot, &exact),
                    MergePass::PreSuf => merge(rules, MergeKey::PreSuf, &exact),
                    MergePass::RootSuf => merge(rules, MergeKey::RootSuf, &exact),
                    MergePass::Trivial => merge_trivial(rules),
                })
            })?;
        }

        rules = assign_ids(rules);

        for pass in factor_passes {
            rules = self.timed(&mut stats, factor_label(pass), rules, |rules| {
                Ok(match pass {
                    FactorPass::Expression => expression_factor(rules, self.cfg.factor_cutoff),
                    FactorPass::Constituency => {
                        constituency_factor(rules, &self.tagger, self.cfg.factor_cutoff)
                    }
                    FactorPass::Synonym => synonym_factor(rules, synonyms, &self.tokenizer),
                })
            })?;
        }

        stats.final_rules = rules.len();
        stats.total_duration = start.elapsed();
        if self.cfg.show_progress {
            info!(
                "induction complete: {} rules in {:.2?}",
                stats.final_rules, stats.total_duration
            );
        }

        Ok(InducerArtifacts {
            grammar: Grammar::new(rules),
            stats,
        })
    }

    fn collect(&self, utterances: &[Utterance]) -> Transitions {
        match self.cfg.chunk_source {
            ChunkSource::Tokens => {
                collect_transitions(utterances, &TokenSplit(self.tokenizer))
            }
            ChunkSource::PosTags => collect_transitions(utterances, &PosSplit(&self.tagger)),
            ChunkSource::ConstituencyTags => {
                collect_transitions(utterances, &ConstituencySplit(&self.tagger))
            }
        }
    }

    fn chunk_all(&self, utterances: &mut [Utterance], transitions: &Transitions) {
        for utterance in utterances.iter_mut() {
            let (tags, tokens) = match self.cfg.chunk_source {
                ChunkSource::Tokens => TokenSplit(self.tokenizer).split(&utterance.text),
                ChunkSource::PosTags => self.tagger.pos(&utterance.text),
                ChunkSource::ConstituencyTags => self.tagger.constituency(&utterance.text),
            };
            utterance.chunks =
                transition_chunk(&tokens, &tags, transitions, self.cfg.chunk_threshold);
        }
    }

    fn timed<F>(
        &self,
        stats: &mut InductionStats,
        label: &str,
        rules: Vec<Rule>,
        pass: F,
    ) -> Result<Vec<Rule>>
    where
        F: FnOnce(Vec<Rule>) -> Result<Vec<Rule>>,
    {
        let before = rules.len();
        let pass_start = Instant::now();
        let rules = pass(rules)?;
        let elapsed = pass_start.elapsed();
        if self.cfg.show_progress {
            info!(
                "pass {label:<18} rules {before:>5} -> {:>5} in {elapsed:.2?}",
                rules.len()
            );
        }
        stats.passes.push(PassMetrics {
            pass: label.to_string(),
            rules_before: before,
            rules_after: rules.len(),
            elapsed,
        });
        Ok(rules)
    }
}

fn merge_label(pass: MergePass) -> &'static str {
    match pass {
        MergePass::Pre => "merge:pre",
        MergePass::Root => "merge:root",
        MergePass::Suf => "merge:suf",
        MergePass::PreRoot => "merge:pre-root",
        MergePass::PreSuf => "merge:pre-suf",
        MergePass::RootSuf => "merge:root-suf",
        MergePass::Trivial => "merge:trivial",
    }
}

fn factor_label(pass: FactorPass) -> &'static str {
    match pass {
        FactorPass::Expression => "factor:expression",
        FactorPass::Constituency => "factor:constituency",
        FactorPass::Synonym => "factor:synonym",
    }
}
