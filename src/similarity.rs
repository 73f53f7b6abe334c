//! Similarity metrics used as pluggable equality predicates.
//!
//! Levenshtein ratios operate directly on characters or tokens. The
//! TF-IDF path embeds text against a fixed corpus vocabulary; those
//! operations are the only fallible ones in the core, and callers treat a
//! failure as "not equivalent" rather than propagating it.

use rustc_hash::FxHashMap;

use crate::corpus::Utterance;
use crate::error::{JgramError, Result};
use crate::tokenize::WordTokenizer;

fn levenshtein<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, item_a) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, item_b) in b.iter().enumerate() {
            curr[j + 1] = if item_a == item_b {
                prev[j]
            } else {
                1 + curr[j].min(prev[j + 1]).min(prev[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Character-level Levenshtein similarity ratio in [0, 1].
///
/// 1 for identical strings, 0 when either side is empty; otherwise
/// `1 - distance / len(longer)`.
#[must_use]
pub fn char_levenshtein(s1: &str, s2: &str) -> f64 {
    let (shorter, longer) = if s1.chars().count() > s2.chars().count() {
        (s2, s1)
    } else {
        (s1, s2)
    };
    if shorter == longer {
        return 1.0;
    }
    if shorter.is_empty() || longer.is_empty() {
        return 0.0;
    }
    let a: Vec<char> = shorter.chars().collect();
    let b: Vec<char> = longer.chars().collect();
    1.0 - levenshtein(&a, &b) as f64 / b.len() as f64
}

/// Token-level Levenshtein similarity ratio in [0, 1].
#[must_use]
pub fn token_levenshtein(s1: &[String], s2: &[String]) -> f64 {
    let (shorter, longer) = if s1.len() > s2.len() { (s2, s1) } else { (s1, s2) };
    if shorter == longer {
        return 1.0;
    }
    if shorter.is_empty() || longer.is_empty() {
        return 0.0;
    }
    1.0 - levenshtein(shorter, longer) as f64 / longer.len() as f64
}

/// Collects the sorted, deduplicated lowercase token vocabulary of the corpus.
#[must_use]
pub fn collect_vocab(utterances: &[Utterance], tokenizer: &WordTokenizer) -> Vec<String> {
    let mut vocab: Vec<String> = utterances
        .iter()
        .flat_map(|utterance| tokenizer.tokenize(&utterance.text.to_lowercase()))
        .collect();
    vocab.sort();
    vocab.dedup();
    vocab
}

/// Collects inverse document frequencies: `ln(corpus_size / df + 1)`.
#[must_use]
pub fn collect_idf(utterances: &[Utterance], tokenizer: &WordTokenizer) -> FxHashMap<String, f64> {
    let mut document_frequency: FxHashMap<String, f64> = FxHashMap::default();
    for utterance in utterances {
        let mut tokens = tokenizer.tokenize(&utterance.text.to_lowercase());
        tokens.sort();
        tokens.dedup();
        for token in tokens {
            *document_frequency.entry(token).or_insert(0.0) += 1.0;
        }
    }
    let corpus_size = utterances.len() as f64;
    for value in document_frequency.values_mut() {
        *value = (corpus_size / *value + 1.0).ln();
    }
    document_frequency
}

/// Embeds text as token counts over a fixed sorted vocabulary.
///
/// Fails on an empty vocabulary or a token outside it; equality predicates
/// must treat either failure as "not equivalent".
pub fn count_embed(text: &str, vocab: &[String], tokenizer: &WordTokenizer) -> Result<Vec<f64>> {
    if vocab.is_empty() {
        return Err(JgramError::EmptyVocabulary);
    }
    let mut embedding = vec![0.0; vocab.len()];
    for token in tokenizer.tokenize(&text.to_lowercase()) {
        match vocab.binary_search(&token) {
            Ok(index) => embedding[index] += 1.0,
            Err(_) => return Err(JgramError::UnknownToken(token)),
        }
    }
    Ok(embedding)
}

/// Reweights a count embedding in place by term frequency times IDF.
#[must_use]
pub fn tfidf_transform(
    mut embedding: Vec<f64>,
    vocab: &[String],
    idf: &FxHashMap<String, f64>,
) -> Vec<f64> {
    let total: f64 = embedding.iter().sum();
    if total == 0.0 {
        return embedding;
    }
    for (index, value) in embedding.iter_mut().enumerate() {
        if *value == 0.0 {
            continue;
        }
        let tf = *value / total;
        let weight = tf * idf.get(&vocab[index]).copied().unwrap_or(0.0);
        *value *= weight;
    }
    embedding
}

/// Cosine similarity between two equal-length vectors.
///
/// Identical vectors compare as 1; a zero-norm operand yields 0; a length
/// mismatch is an error.
pub fn cosine_similarity(v1: &[f64], v2: &[f64]) -> Result<f64> {
    if v1.len() != v2.len() {
        return Err(JgramError::VectorLengthMismatch {
            left: v1.len(),
            right: v2.len(),
        });
    }
    if v1 == v2 {
        return Ok(1.0);
    }
    let norm1 = v1.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm2 = v2.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm1 == 0.0 || norm2 == 0.0 {
        return Ok(0.0);
    }
    let dot: f64 = v1.iter().zip(v2).map(|(x, y)| x * y).sum();
    Ok(dot / (norm1 * norm2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn char_levenshtein_ratios() {
        assert_eq!(char_levenshtein("same", "same"), 1.0);
        assert_eq!(char_levenshtein("", "abc"), 0.0);
        assert_eq!(char_levenshtein("abc", ""), 0.0);
        // one substitution over four characters
        assert!((char_levenshtein("kitt", "mitt") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn token_levenshtein_ratios() {
        let a = strings(&["show", "me", "the", "bill"]);
        let b = strings(&["show", "me", "my", "bill"]);
        assert!((token_levenshtein(&a, &b) - 0.75).abs() < 1e-9);
        assert_eq!(token_levenshtein(&a, &a), 1.0);
        assert_eq!(token_levenshtein(&[], &a), 0.0);
    }

    #[test]
    fn count_embed_counts_tokens() {
        let tokenizer = WordTokenizer::new();
        let vocab = strings(&["a", "b", "c"]);
        let embedding = count_embed("a b a", &vocab, &tokenizer).expect("embed");
        assert_eq!(embedding, vec![2.0, 1.0, 0.0]);
    }

    #[test]
    fn count_embed_failures() {
        let tokenizer = WordTokenizer::new();
        let err = count_embed("a", &[], &tokenizer).expect_err("empty vocab");
        assert!(matches!(err, JgramError::EmptyVocabulary));

        let vocab = strings(&["a"]);
        let err = count_embed("a z", &vocab, &tokenizer).expect_err("unknown token");
        assert!(matches!(err, JgramError::UnknownToken(token) if token == "z"));
    }

    #[test]
    fn cosine_similarity_edges() {
        let err = cosine_similarity(&[1.0], &[1.0, 2.0]).expect_err("length mismatch");
        assert!(matches!(err, JgramError::VectorLengthMismatch { left: 1, right: 2 }));

        assert_eq!(cosine_similarity(&[0.5, 0.5], &[0.5, 0.5]).unwrap(), 1.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).unwrap(), 0.0);
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(sim.abs() < 1e-9);
    }

    #[test]
    fn idf_rewards_rare_tokens() {
        let utterances = vec![
            Utterance::new("a b"),
            Utterance::new("a c"),
        ];
        let idf = collect_idf(&utterances, &WordTokenizer::new());
        assert!(idf["b"] > idf["a"]);
        assert!((idf["a"] - (2.0_f64 / 2.0 + 1.0).ln()).abs() < 1e-9);
    }

    #[test]
    fn vocab_is_sorted_and_unique() {
        let utterances = vec![Utterance::new("B a b A")];
        assert_eq!(
            collect_vocab(&utterances, &WordTokenizer::new()),
            strings(&["a", "b"])
        );
    }
}
