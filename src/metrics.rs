//! Metrics describing an induction run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Snapshot captured for one merge or factor pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PassMetrics {
    /// Pass label, e.g. `merge:pre-root` or `factor:expression`.
    pub pass: String,
    /// Rule count entering the pass.
    pub rules_before: usize,
    /// Rule count leaving the pass.
    pub rules_after: usize,
    /// Execution time for the pass.
    pub elapsed: Duration,
}

/// Aggregate metrics produced by one induction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InductionStats {
    /// Deduplicated utterances consumed.
    pub utterances: usize,
    /// Distinct chunks in the ranked vocabulary.
    pub distinct_chunks: usize,
    /// Per-pass snapshots in execution order.
    pub passes: Vec<PassMetrics>,
    /// Rules in the final grammar.
    pub final_rules: usize,
    /// Total duration of the run.
    pub total_duration: Duration,
}
