//! Corpus loading, normalization, and triplet decomposition.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{JgramError, Result};
use crate::rule::Rule;
use crate::tokenize::WordTokenizer;

/// One normalized, deduplicated input utterance with its chunk sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Utterance {
    /// Normalized utterance text.
    pub text: String,
    /// Chunks computed for this utterance by the transition chunker.
    pub chunks: Vec<String>,
}

impl Utterance {
    /// Creates an utterance with an empty chunk sequence.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            chunks: Vec::new(),
        }
    }
}

/// Mapping from a canonical phrase to its user-declared alternatives.
///
/// A `BTreeMap` keeps key iteration sorted, which synonym factoring relies
/// on for reproducible output.
pub type Synonyms = BTreeMap<String, Vec<String>>;

/// Reads utterances from a line-oriented source.
///
/// Lines are trimmed, blank lines dropped, and each survivor normalized
/// through the tokenizer. The result is sorted lexicographically and
/// deduplicated by exact normalized text.
pub fn read_utterances<R: BufRead>(reader: R, tokenizer: &WordTokenizer) -> Result<Vec<Utterance>> {
    let mut texts = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|err| JgramError::io(err, None))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        texts.push(tokenizer.normalize(trimmed));
    }
    texts.sort();
    texts.dedup();
    Ok(texts.into_iter().map(Utterance::new).collect())
}

/// Loads and normalizes the corpus file at `path`.
pub fn load_utterances<P: AsRef<Path>>(
    path: P,
    tokenizer: &WordTokenizer,
) -> Result<Vec<Utterance>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| JgramError::io(err, Some(path.to_path_buf())))?;
    read_utterances(BufReader::new(file), tokenizer)
}

/// Loads a synonym table from a JSON object of `{"canonical": ["alt", ...]}`.
pub fn load_synonyms<P: AsRef<Path>>(path: P) -> Result<Synonyms> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| JgramError::io(err, Some(path.to_path_buf())))?;
    let synonyms: Synonyms = serde_json::from_reader(BufReader::new(file))?;
    Ok(synonyms)
}

/// Decomposes one utterance around its highest-ranked matching chunk.
///
/// The vocabulary is scanned in rank order for the first entry present in
/// this utterance's own chunk set. Without a match the whole text becomes
/// the root. Otherwise the text splits on the first literal occurrence of
/// the chunk, both sides trimmed.
#[must_use]
pub fn decompose(utterance: &Utterance, vocabulary: &[String]) -> Rule {
    let anchor = vocabulary
        .iter()
        .find(|entry| utterance.chunks.iter().any(|chunk| chunk == *entry));
    let Some(anchor) = anchor else {
        return Rule::from_triplet("", &utterance.text, "");
    };
    match utterance.text.split_once(anchor.as_str()) {
        Some((pre, suf)) => Rule::from_triplet(pre.trim(), anchor, suf.trim()),
        None => Rule::from_triplet("", &utterance.text, ""),
    }
}
