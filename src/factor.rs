//! Factoring: extracting recurring or user-declared sub-phrases into
//! shared nonterminal rules.
//!
//! Three strategies share one shape — count (or enumerate), rank, then
//! synthesize a private rule and rewrite references to it. They differ in
//! what is counted (literal slot content, constituency signatures, or
//! nothing at all for user synonyms) and in how rewriting matches
//! (whole-slot equality vs token-subsequence replacement).

use log::debug;
use rustc_hash::FxHashMap;

use crate::corpus::Synonyms;
use crate::rule::Rule;
use crate::tag::SyntacticTagger;
use crate::tokenize::WordTokenizer;

/// Ranks counting-map keys: count descending, lexicographic ascending.
/// Empty keys and keys already wrapped as nonterminal references are
/// dropped before ranking.
fn ranked_candidates(counts: FxHashMap<String, usize>) -> Vec<(String, usize)> {
    let mut candidates: Vec<(String, usize)> = counts
        .into_iter()
        .filter(|(key, _)| !key.is_empty() && !key.starts_with('<') && !key.ends_with('>'))
        .collect();
    candidates.sort_by(|(a, count_a), (b, count_b)| {
        count_b.cmp(count_a).then_with(|| a.cmp(b))
    });
    candidates
}

fn slots_mut(rule: &mut Rule) -> [&mut Vec<String>; 3] {
    [&mut rule.pre, &mut rule.root, &mut rule.suf]
}

/// Extracts slot contents that recur more than `cutoff` times into
/// private rules, rewriting matching slots into `<name>` references.
///
/// The counting key is the sorted, pipe-joined slot content; a slot whose
/// key equals a winning candidate is replaced wholesale by a single
/// reference to the synthesized rule. Synthesized rules take the id
/// `rules.len() + 1` at the moment of creation, which feeds the
/// disambiguating suffix of their derived name.
#[must_use]
pub fn expression_factor(rules: Vec<Rule>, cutoff: usize) -> Vec<Rule> {
    let mut rules: Vec<Rule> = rules.into_iter().map(|rule| rule.sorted()).collect();

    let mut counts: FxHashMap<String, usize> = FxHashMap::default();
    for rule in &rules {
        *counts.entry(rule.pre.join("|")).or_insert(0) += 1;
        *counts.entry(rule.root.join("|")).or_insert(0) += 1;
        *counts.entry(rule.suf.join("|")).or_insert(0) += 1;
    }

    for (candidate, count) in ranked_candidates(counts) {
        if count <= cutoff {
            continue;
        }
        let extracted = Rule {
            pre: Vec::new(),
            root: vec![candidate.clone()],
            suf: Vec::new(),
            public: false,
            id: rules.len() + 1,
        };
        let reference = format!("<{}>", extracted.name());
        debug!("expression factor: extracted {candidate:?} as {reference}");
        for rule in &mut rules {
            for slot in slots_mut(rule) {
                if slot.join("|") == candidate {
                    *slot = vec![reference.clone()];
                }
            }
        }
        rules.push(extracted);
    }
    rules
}

/// Extracts slots whose constituency-tag signature recurs more than
/// `cutoff` times.
///
/// The synthesized rule's root holds the sorted distinct surface forms
/// observed under the winning signature, and rewriting matches by
/// recomputing each slot's signature rather than its literal text.
#[must_use]
pub fn constituency_factor<T: SyntacticTagger>(
    rules: Vec<Rule>,
    tagger: &T,
    cutoff: usize,
) -> Vec<Rule> {
    let mut rules: Vec<Rule> = rules.into_iter().map(|rule| rule.sorted()).collect();

    let signature_of = |text: &str| tagger.constituency(text).0.join("-");

    let mut counts: FxHashMap<String, usize> = FxHashMap::default();
    let mut surfaces: FxHashMap<String, Vec<String>> = FxHashMap::default();
    for rule in &rules {
        for slot in [&rule.pre, &rule.root, &rule.suf] {
            for value in slot.iter() {
                let (tags, tokens) = tagger.constituency(value);
                let signature = tags.join("-");
                *counts.entry(signature.clone()).or_insert(0) += 1;
                surfaces.entry(signature).or_default().push(tokens.join(" "));
            }
        }
    }

    for (signature, count) in ranked_candidates(counts) {
        if count <= cutoff {
            continue;
        }
        let mut forms = surfaces.get(&signature).cloned().unwrap_or_default();
        forms.sort();
        forms.dedup();
        let extracted = Rule {
            pre: Vec::new(),
            root: forms,
            suf: Vec::new(),
            public: false,
            id: rules.len() + 1,
        };
        let reference = format!("<{}>", extracted.name());
        debug!("constituency factor: extracted signature {signature:?} as {reference}");

        let skip_rewrite = extracted.root.is_empty() || extracted.root == [String::new()];
        if !skip_rewrite {
            for rule in &mut rules {
                for slot in slots_mut(rule) {
                    if signature_of(&slot.join(" ")) == signature {
                        *slot = vec![reference.clone()];
                    }
                }
            }
        }
        rules.push(extracted);
    }
    rules
}

/// Finds the first occurrence of `needle` as a contiguous subsequence.
fn find_subsequence(haystack: &[String], needle: &[String]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).find(|&at| haystack[at..at + needle.len()] == *needle)
}

/// Extracts every synonym-table entry into a private rule and rewrites
/// canonical-phrase occurrences, ignoring frequency.
///
/// The synthesized root is the sorted union of the canonical phrase and
/// its alternatives. Rewriting is substring-level: the first
/// token-subsequence occurrence of the tokenized canonical phrase inside
/// a slot value is replaced with the `<name>` reference, repeating until
/// that value holds no further occurrence (each replacement removes one
/// occurrence, so the loop terminates).
#[must_use]
pub fn synonym_factor(
    rules: Vec<Rule>,
    synonyms: &Synonyms,
    tokenizer: &WordTokenizer,
) -> Vec<Rule> {
    let mut rules: Vec<Rule> = rules.into_iter().map(|rule| rule.sorted()).collect();

    for (canonical, alternatives) in synonyms {
        let mut forms = alternatives.clone();
        forms.push(canonical.clone());
        forms.sort();
        forms.dedup();
        let extracted = Rule {
            pre: Vec::new(),
            root: forms,
            suf: Vec::new(),
            public: false,
            id: rules.len() + 1,
        };
        let reference = format!("<{}>", extracted.name());
        debug!("synonym factor: extracted {canonical:?} as {reference}");

        let canonical_tokens = tokenizer.tokenize(canonical);
        if !canonical_tokens.is_empty() {
            for rule in &mut rules {
                let haystack = format!(
                    "{} {} {}",
                    rule.pre.join(" "),
                    rule.root.join(" "),
                    rule.suf.join(" ")
                );
                if !haystack.contains(canonical.as_str()) {
                    continue;
                }
                for slot in slots_mut(rule) {
                    for value in slot.iter_mut() {
                        loop {
                            let tokens = tokenizer.tokenize(value);
                            let Some(at) = find_subsequence(&tokens, &canonical_tokens) else {
                                break;
                            };
                            let mut rewritten = tokens[..at].to_vec();
                            rewritten.push(reference.clone());
                            rewritten.extend_from_slice(&tokens[at + canonical_tokens.len()..]);
                            *value = rewritten.join(" ");
                        }
                    }
                }
            }
        }
        rules.push(extracted);
    }
    rules
}
