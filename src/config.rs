//! Configuration builders controlling grammar induction.

use serde::{Deserialize, Serialize};

use crate::error::{JgramError, Result};

/// Pipeline mode selecting which merge and factor passes run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One rule per utterance; generates exactly the source corpus.
    Clone,
    /// Exact-key merging plus expression factoring; corpus-faithful.
    Compress,
    /// Adds single-slot merging under the equality predicate; may
    /// generate strings outside the corpus.
    Interpolate,
    /// Interpolation plus user-synonym factoring.
    Extrapolate,
    /// Caller-selected merge and factor passes.
    Custom,
}

/// Which slot content drives the transition model and chunker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChunkSource {
    /// Surface tokens drive the transition probabilities.
    Tokens,
    /// Part-of-speech tags drive the transition probabilities.
    PosTags,
    /// Constituency tags over collapsed spans drive the probabilities.
    ConstituencyTags,
}

/// Equality predicate plugged into the single-slot merge passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EqualityKind {
    /// Exact structural equality.
    Literal,
    /// Character-level Levenshtein ratio above the similarity cutoff.
    CharLevenshtein,
    /// Token-level Levenshtein ratio above the similarity cutoff.
    TokenLevenshtein,
    /// TF-IDF cosine similarity above the similarity cutoff.
    TfidfCosine,
    /// Equal part-of-speech tag signatures.
    PosTag,
    /// Equal constituency tag signatures.
    ConstituencyTag,
}

/// One merge pass in a custom pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePass {
    /// Merge rules sharing `pre`.
    Pre,
    /// Merge rules sharing `root`.
    Root,
    /// Merge rules sharing `suf`.
    Suf,
    /// Merge rules sharing `pre` and `root`.
    PreRoot,
    /// Merge rules sharing `pre` and `suf`.
    PreSuf,
    /// Merge rules sharing `root` and `suf`.
    RootSuf,
    /// Collapse leftover trivial rules into one fallback rule.
    Trivial,
}

/// One factor pass in a custom pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FactorPass {
    /// Frequency factoring by literal slot content.
    Expression,
    /// Frequency factoring by constituency tag signature.
    Constituency,
    /// User-synonym factoring, ignoring frequency.
    Synonym,
}

/// Configuration for one induction run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InducerConfig {
    /// Pipeline mode.
    pub mode: Mode,
    /// What drives the transition model.
    pub chunk_source: ChunkSource,
    /// Transition probability below which token sequences split; higher
    /// values produce more, smaller chunks.
    pub chunk_threshold: f64,
    /// Occurrence count above which slot content is factored out.
    pub factor_cutoff: usize,
    /// Equality predicate for the single-slot merge passes.
    pub equality: EqualityKind,
    /// Similarity cutoff consumed by the threshold-based predicates.
    pub similarity_cutoff: f64,
    /// Merge passes for [`Mode::Custom`]; ignored otherwise.
    pub merge_passes: Vec<MergePass>,
    /// Factor passes for [`Mode::Custom`]; ignored otherwise.
    pub factor_passes: Vec<FactorPass>,
    /// Emit a single public `<main>` rule aggregating all public rules.
    pub emit_main: bool,
    /// Enables per-pass logging through the `log` facade.
    pub show_progress: bool,
}

impl Default for InducerConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Compress,
            chunk_source: ChunkSource::Tokens,
            chunk_threshold: 0.1,
            factor_cutoff: 1,
            equality: EqualityKind::Literal,
            similarity_cutoff: 0.8,
            merge_passes: Vec::new(),
            factor_passes: Vec::new(),
            emit_main: false,
            show_progress: true,
        }
    }
}

impl InducerConfig {
    /// Returns a builder initialised with [`InducerConfig::default`].
    #[must_use]
    pub fn builder() -> InducerBuilder {
        InducerBuilder::default()
    }

    /// Validates the invariants required for induction.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.chunk_threshold) {
            return Err(JgramError::InvalidConfig(format!(
                "chunk_threshold ({}) must lie in [0, 1]",
                self.chunk_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.similarity_cutoff) {
            return Err(JgramError::InvalidConfig(format!(
                "similarity_cutoff ({}) must lie in [0, 1]",
                self.similarity_cutoff
            )));
        }
        if self.mode != Mode::Custom
            && (!self.merge_passes.is_empty() || !self.factor_passes.is_empty())
        {
            return Err(JgramError::InvalidConfig(
                "explicit pass lists require custom mode".into(),
            ));
        }
        Ok(())
    }

    /// Resolves the merge and factor pass sequences for the mode.
    #[must_use]
    pub fn plan(&self) -> (Vec<MergePass>, Vec<FactorPass>) {
        match self.mode {
            Mode::Clone => (Vec::new(), Vec::new()),
            Mode::Compress => (
                vec![
                    MergePass::PreRoot,
                    MergePass::PreSuf,
                    MergePass::RootSuf,
                    MergePass::Trivial,
                ],
                vec![FactorPass::Expression],
            ),
            Mode::Interpolate => (
                vec![
                    MergePass::PreRoot,
                    MergePass::PreSuf,
                    MergePass::RootSuf,
                    MergePass::Pre,
                    MergePass::Root,
                    MergePass::Suf,
                    MergePass::Trivial,
                ],
                vec![FactorPass::Expression],
            ),
            Mode::Extrapolate => (
                vec![
                    MergePass::PreRoot,
                    MergePass::PreSuf,
                    MergePass::RootSuf,
                    MergePass::Pre,
                    MergePass::Root,
                    MergePass::Suf,
                    MergePass::Trivial,
                ],
                vec![FactorPass::Expression, FactorPass::Synonym],
            ),
            Mode::Custom => (self.merge_passes.clone(), self.factor_passes.clone()),
        }
    }
}

/// Builder for [`InducerConfig`].
#[derive(Debug, Default, Clone)]
pub struct InducerBuilder {
    cfg: InducerConfig,
}

impl InducerBuilder {
    /// Creates a builder with [`InducerConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pipeline mode.
    #[must_use]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.cfg.mode = mode;
        self
    }

    /// Sets what drives the transition model.
    #[must_use]
    pub fn chunk_source(mut self, source: ChunkSource) -> Self {
        self.cfg.chunk_source = source;
        self
    }

    /// Sets the chunking probability threshold.
    #[must_use]
    pub fn chunk_threshold(mut self, threshold: f64) -> Self {
        self.cfg.chunk_threshold = threshold;
        self
    }

    /// Sets the factoring occurrence cutoff.
    #[must_use]
    pub fn factor_cutoff(mut self, cutoff: usize) -> Self {
        self.cfg.factor_cutoff = cutoff;
        self
    }

    /// Selects the equality predicate for single-slot merges.
    #[must_use]
    pub fn equality(mut self, equality: EqualityKind) -> Self {
        self.cfg.equality = equality;
        self
    }

    /// Sets the similarity cutoff for threshold-based predicates.
    #[must_use]
    pub fn similarity_cutoff(mut self, cutoff: f64) -> Self {
        self.cfg.similarity_cutoff = cutoff;
        self
    }

    /// Supplies explicit merge passes (custom mode).
    #[must_use]
    pub fn merge_passes<I>(mut self, passes: I) -> Self
    where
        I: IntoIterator<Item = MergePass>,
    {
        self.cfg.merge_passes = passes.into_iter().collect();
        self
    }

    /// Supplies explicit factor passes (custom mode).
    #[must_use]
    pub fn factor_passes<I>(mut self, passes: I) -> Self
    where
        I: IntoIterator<Item = FactorPass>,
    {
        self.cfg.factor_passes = passes.into_iter().collect();
        self
    }

    /// Enables the single public `<main>` rule output format.
    #[must_use]
    pub fn emit_main(mut self, enabled: bool) -> Self {
        self.cfg.emit_main = enabled;
        self
    }

    /// Enables or disables per-pass logging.
    #[must_use]
    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.cfg.show_progress = enabled;
        self
    }

    /// Finalises the builder, returning a validated [`InducerConfig`].
    pub fn build(self) -> Result<InducerConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_validated_defaults() {
        let cfg = InducerConfig::builder().build().expect("valid config");
        assert_eq!(cfg.mode, Mode::Compress);
        assert!((cfg.chunk_threshold - 0.1).abs() < f64::EPSILON);
        assert_eq!(cfg.factor_cutoff, 1);
    }

    #[test]
    fn validate_rejects_out_of_range_threshold() {
        let err = InducerConfig::builder()
            .chunk_threshold(1.5)
            .build()
            .expect_err("threshold out of range");
        assert!(matches!(
            err,
            JgramError::InvalidConfig(message) if message.contains("chunk_threshold")
        ));
    }

    #[test]
    fn validate_rejects_pass_lists_outside_custom_mode() {
        let err = InducerConfig::builder()
            .mode(Mode::Compress)
            .merge_passes([MergePass::Pre])
            .build()
            .expect_err("pass lists need custom mode");
        assert!(matches!(err, JgramError::InvalidConfig(_)));
    }

    #[test]
    fn custom_mode_plan_uses_explicit_passes() {
        let cfg = InducerConfig::builder()
            .mode(Mode::Custom)
            .merge_passes([MergePass::Root, MergePass::Trivial])
            .factor_passes([FactorPass::Synonym])
            .build()
            .expect("valid config");
        let (merges, factors) = cfg.plan();
        assert_eq!(merges, vec![MergePass::Root, MergePass::Trivial]);
        assert_eq!(factors, vec![FactorPass::Synonym]);
    }

    #[test]
    fn interpolate_plan_adds_single_slot_passes() {
        let cfg = InducerConfig::builder()
            .mode(Mode::Interpolate)
            .build()
            .expect("valid config");
        let (merges, _) = cfg.plan();
        assert!(merges.contains(&MergePass::Pre));
        assert!(merges.contains(&MergePass::Root));
        assert!(merges.contains(&MergePass::Suf));
        assert_eq!(merges.last(), Some(&MergePass::Trivial));
    }
}
