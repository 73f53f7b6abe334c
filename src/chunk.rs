//! Transition model and probability-driven chunking.

use rustc_hash::FxHashMap;

use crate::corpus::Utterance;
use crate::tag::SyntacticTagger;
use crate::tokenize::WordTokenizer;

/// Bigram transition probabilities between adjacent tokens or tags.
///
/// For every source present, outgoing probabilities sum to 1 (or the
/// mapping is empty when the source had no outgoing mass). Absent entries
/// read as probability 0.
pub type Transitions = FxHashMap<String, FxHashMap<String, f64>>;

/// Looks up one transition probability, treating absence as 0.
#[must_use]
pub fn transition_probability(transitions: &Transitions, from: &str, to: &str) -> f64 {
    transitions
        .get(from)
        .and_then(|targets| targets.get(to))
        .copied()
        .unwrap_or(0.0)
}

/// Splits an utterance into the parallel (tags, tokens) sequences that
/// drive transition collection and chunking.
pub trait TransitionSplit {
    /// Returns the tag sequence paired 1:1 with the surface token sequence.
    fn split(&self, text: &str) -> (Vec<String>, Vec<String>);
}

/// Drives transitions by surface tokens: tags are the tokens themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSplit(
    /// Tokenizer producing the surface tokens.
    pub WordTokenizer,
);

impl TransitionSplit for TokenSplit {
    fn split(&self, text: &str) -> (Vec<String>, Vec<String>) {
        let tokens = self.0.tokenize(text);
        (tokens.clone(), tokens)
    }
}

/// Drives transitions by part-of-speech tags.
#[derive(Debug, Clone, Copy)]
pub struct PosSplit<'a, T: SyntacticTagger>(
    /// Tagger supplying the POS tag sequence.
    pub &'a T,
);

impl<T: SyntacticTagger> TransitionSplit for PosSplit<'_, T> {
    fn split(&self, text: &str) -> (Vec<String>, Vec<String>) {
        self.0.pos(text)
    }
}

/// Drives transitions by constituency tags over collapsed surface spans.
#[derive(Debug, Clone, Copy)]
pub struct ConstituencySplit<'a, T: SyntacticTagger>(
    /// Tagger supplying the constituency bracketing.
    pub &'a T,
);

impl<T: SyntacticTagger> TransitionSplit for ConstituencySplit<'_, T> {
    fn split(&self, text: &str) -> (Vec<String>, Vec<String>) {
        self.0.constituency(text)
    }
}

/// Counts bigram co-occurrences across the corpus and normalizes each
/// source's counts into probabilities summing to 1.
///
/// A single-element sequence pairs with the empty-string sentinel so that
/// one-token utterances still contribute mass.
pub fn collect_transitions<S: TransitionSplit>(
    utterances: &[Utterance],
    split: &S,
) -> Transitions {
    let mut counts: Transitions = FxHashMap::default();
    for utterance in utterances {
        let (tags, _) = split.split(&utterance.text);
        match tags.len() {
            0 => {}
            1 => {
                *counts
                    .entry(tags[0].clone())
                    .or_default()
                    .entry(String::new())
                    .or_insert(0.0) += 1.0;
            }
            _ => {
                for pair in tags.windows(2) {
                    *counts
                        .entry(pair[0].clone())
                        .or_default()
                        .entry(pair[1].clone())
                        .or_insert(0.0) += 1.0;
                }
            }
        }
    }
    for targets in counts.values_mut() {
        let total: f64 = targets.values().sum();
        if total == 0.0 {
            targets.clear();
            continue;
        }
        for value in targets.values_mut() {
            *value /= total;
        }
    }
    counts
}

/// Segments a token sequence by transition probability.
///
/// `tags` drives the probability lookups while `tokens` supplies the
/// surface content; the two are 1:1 aligned (identical for token-driven
/// chunking). Walking left to right, the current buffer is flushed before
/// token `i` whenever the probability between positions `i` and `i + 1` is
/// strictly below `p`; the final token is always appended to the open
/// buffer. Empty flushes are discarded, so empty input or all-empty tokens
/// yield an empty chunk list. Higher `p` produces more, smaller chunks;
/// at `p = 0` the whole sequence is one chunk.
#[must_use]
pub fn transition_chunk(
    tokens: &[String],
    tags: &[String],
    transitions: &Transitions,
    p: f64,
) -> Vec<String> {
    let mut out = Vec::new();
    if tokens.is_empty() {
        return out;
    }

    let boundaries = tags.len().saturating_sub(1).min(tokens.len() - 1);
    let probs: Vec<f64> = (0..boundaries)
        .map(|i| transition_probability(transitions, &tags[i], &tags[i + 1]))
        .collect();

    let mut buf = String::new();
    let flush = |buf: &mut String, out: &mut Vec<String>| {
        let chunk = buf.trim().to_string();
        if !chunk.is_empty() {
            out.push(chunk);
        }
        buf.clear();
    };

    for (i, &prob) in probs.iter().enumerate() {
        if prob < p {
            flush(&mut buf, &mut out);
        }
        buf.push_str(&tokens[i]);
        buf.push(' ');
    }
    buf.push_str(&tokens[probs.len()]);
    flush(&mut buf, &mut out);

    out
}

/// Aggregates every utterance's chunks into the ranked, deduplicated
/// chunk vocabulary.
///
/// Ordering: token count descending, corpus-wide occurrence count
/// descending, then lexicographic ascending, making the ranking a total
/// order and the output reproducible.
#[must_use]
pub fn collect_chunks(utterances: &[Utterance]) -> Vec<String> {
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    for utterance in utterances {
        for chunk in &utterance.chunks {
            *counts.entry(chunk.as_str()).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|(a, count_a), (b, count_b)| {
        let tokens_a = a.split(' ').count();
        let tokens_b = b.split(' ').count();
        tokens_b
            .cmp(&tokens_a)
            .then_with(|| count_b.cmp(count_a))
            .then_with(|| a.cmp(b))
    });
    ranked.into_iter().map(|(chunk, _)| chunk.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn fixed_transitions() -> Transitions {
        let rows: &[(&str, &[(&str, f64)])] = &[
            ("a", &[]),
            (
                "b",
                &[("a", 0.1), ("b", 0.6), ("c", 0.2), ("d", 0.7), ("e", 0.3), ("f", 0.8)],
            ),
            (
                "c",
                &[("a", 0.2), ("b", 0.7), ("c", 0.3), ("d", 0.8), ("e", 0.4), ("f", 0.9)],
            ),
            (
                "d",
                &[("a", 0.3), ("b", 0.8), ("c", 0.4), ("d", 0.9), ("e", 0.5), ("f", 0.1)],
            ),
            (
                "e",
                &[("a", 0.4), ("b", 0.9), ("c", 0.5), ("d", 0.1), ("e", 0.6), ("f", 0.2)],
            ),
            (
                "f",
                &[("a", 0.5), ("b", 0.1), ("c", 0.6), ("d", 0.2), ("e", 0.7), ("f", 0.3)],
            ),
        ];
        let mut out = Transitions::default();
        for (from, targets) in rows {
            let mut row = FxHashMap::default();
            for (to, prob) in *targets {
                row.insert((*to).to_string(), *prob);
            }
            out.insert((*from).to_string(), row);
        }
        out
    }

    #[test]
    fn collect_transitions_normalizes_per_source() {
        let utterances = vec![
            Utterance::new("abc abc"),
            Utterance::new("d e e f"),
            Utterance::new("g ."),
            Utterance::new(". h"),
            Utterance::new("h ,"),
        ];
        let transitions = collect_transitions(&utterances, &TokenSplit(WordTokenizer::new()));

        assert_eq!(transition_probability(&transitions, "abc", "abc"), 1.0);
        assert_eq!(transition_probability(&transitions, "d", "e"), 1.0);
        assert_eq!(transition_probability(&transitions, "e", "e"), 0.5);
        assert_eq!(transition_probability(&transitions, "e", "f"), 0.5);
        assert_eq!(transition_probability(&transitions, "g", "."), 1.0);
        assert_eq!(transition_probability(&transitions, ".", "h"), 1.0);
        assert_eq!(transition_probability(&transitions, "h", ","), 1.0);
        assert_eq!(transition_probability(&transitions, "missing", "x"), 0.0);

        for targets in transitions.values() {
            let total: f64 = targets.values().sum();
            assert!(targets.is_empty() || (total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn collect_transitions_single_token_pairs_with_sentinel() {
        let utterances = vec![Utterance::new("."), Utterance::new(",")];
        let transitions = collect_transitions(&utterances, &TokenSplit(WordTokenizer::new()));
        assert_eq!(transition_probability(&transitions, ".", ""), 1.0);
        assert_eq!(transition_probability(&transitions, ",", ""), 1.0);
    }

    #[test]
    fn collect_transitions_empty_corpus() {
        let transitions = collect_transitions(&[], &TokenSplit(WordTokenizer::new()));
        assert!(transitions.is_empty());
    }

    #[test]
    fn transition_chunk_empty_inputs() {
        let transitions = fixed_transitions();
        for p in [0.0, 0.5, 1.0] {
            assert!(transition_chunk(&[], &[], &transitions, p).is_empty());
            let blanks = strings(&["", "", "", "", "", ""]);
            assert!(transition_chunk(&blanks, &blanks, &transitions, p).is_empty());
        }
    }

    #[test]
    fn transition_chunk_threshold_sweep() {
        let transitions = fixed_transitions();
        let tokens = strings(&["a", "b", "c", "d", "e", "f"]);

        assert_eq!(
            transition_chunk(&tokens, &tokens, &transitions, 0.0),
            strings(&["a b c d e f"])
        );
        assert_eq!(
            transition_chunk(&tokens, &tokens, &transitions, 0.5),
            strings(&["a", "b c d", "e f"])
        );
        assert_eq!(
            transition_chunk(&tokens, &tokens, &transitions, 1.0),
            strings(&["a", "b", "c", "d", "e f"])
        );
    }

    #[test]
    fn transition_chunk_unknown_tokens_read_as_zero() {
        let transitions = fixed_transitions();
        let tokens = strings(&["a", "f", "f", "d", "d", "h"]);

        assert_eq!(
            transition_chunk(&tokens, &tokens, &transitions, 0.0),
            strings(&["a f f d d h"])
        );
        assert_eq!(
            transition_chunk(&tokens, &tokens, &transitions, 0.5),
            strings(&["a", "f", "f d", "d h"])
        );
        assert_eq!(
            transition_chunk(&tokens, &tokens, &transitions, 1.0),
            strings(&["a", "f", "f", "d", "d h"])
        );
    }

    #[test]
    fn collect_chunks_ranking_is_total() {
        let mut utterances = vec![
            Utterance::new("one"),
            Utterance::new("two"),
            Utterance::new("three"),
        ];
        utterances[0].chunks = strings(&["b b", "z"]);
        utterances[1].chunks = strings(&["a a", "z"]);
        utterances[2].chunks = strings(&["a a", "m"]);

        // Longer chunks first, then more frequent, then lexicographic.
        assert_eq!(
            collect_chunks(&utterances),
            strings(&["a a", "b b", "z", "m"])
        );
    }

    #[test]
    fn collect_chunks_dedups() {
        let mut utterance = Utterance::new("x");
        utterance.chunks = strings(&["same", "same"]);
        assert_eq!(collect_chunks(&[utterance]), strings(&["same"]));
    }
}
