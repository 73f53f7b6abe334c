//! Rule merging: the generic sort-and-coalesce operator and its equality
//! predicates.
//!
//! One operator parameterized by [`MergeKey`] replaces the six structural
//! merge variants: the key slot(s) decide adjacency and equality, the
//! remaining free slots are unioned. [`merge_trivial`] is the separate
//! collapse that sweeps leftover single-alternative rules into one
//! fallback disjunction.

use std::cmp::Ordering;

use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::rule::{canonical_cmp, Rule};
use crate::similarity::{
    char_levenshtein, cosine_similarity, count_embed, tfidf_transform, token_levenshtein,
};
use crate::tag::SyntacticTagger;
use crate::tokenize::WordTokenizer;

/// Pluggable slot equality used to decide whether two rules merge.
pub type EqualityFn<'a> = Box<dyn Fn(&[String], &[String]) -> bool + 'a>;

/// Which slot(s) form the merge key; the remaining slots are unioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeKey {
    /// Key on `pre`; union `root` and `suf`.
    Pre,
    /// Key on `root`; union `pre` and `suf`.
    Root,
    /// Key on `suf`; union `pre` and `root`.
    Suf,
    /// Key on `pre` and `root`; union `suf`.
    PreRoot,
    /// Key on `pre` and `suf`; union `root`.
    PreSuf,
    /// Key on `root` and `suf`; union `pre`.
    RootSuf,
}

impl MergeKey {
    /// Sort ordering that brings mergeable rules adjacent: key slots
    /// first, remaining slots as deterministic tiebreak.
    fn ordering(self, a: &Rule, b: &Rule) -> Ordering {
        let by = |slots: [(&Vec<String>, &Vec<String>); 3]| {
            slots
                .iter()
                .map(|(x, y)| x.cmp(y))
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        };
        match self {
            Self::Pre | Self::PreRoot => by([(&a.pre, &b.pre), (&a.root, &b.root), (&a.suf, &b.suf)]),
            Self::Root | Self::RootSuf => {
                by([(&a.root, &b.root), (&a.suf, &b.suf), (&a.pre, &b.pre)])
            }
            Self::Suf => by([(&a.suf, &b.suf), (&a.pre, &b.pre), (&a.root, &b.root)]),
            Self::PreSuf => by([(&a.pre, &b.pre), (&a.suf, &b.suf), (&a.root, &b.root)]),
        }
    }

    /// Applies the equality predicate to the key slot(s) of both rules.
    fn matches(self, a: &Rule, b: &Rule, eq: &EqualityFn<'_>) -> bool {
        match self {
            Self::Pre => eq(&a.pre, &b.pre),
            Self::Root => eq(&a.root, &b.root),
            Self::Suf => eq(&a.suf, &b.suf),
            Self::PreRoot => eq(&a.pre, &b.pre) && eq(&a.root, &b.root),
            Self::PreSuf => eq(&a.pre, &b.pre) && eq(&a.suf, &b.suf),
            Self::RootSuf => eq(&a.root, &b.root) && eq(&a.suf, &b.suf),
        }
    }

    /// Folds `other` into `target`: key slots keep `target`'s content,
    /// free slots take the sorted, deduplicated union.
    fn combine(self, target: &mut Rule, other: Rule) {
        match self {
            Self::Pre => {
                union(&mut target.root, other.root);
                union(&mut target.suf, other.suf);
            }
            Self::Root => {
                union(&mut target.pre, other.pre);
                union(&mut target.suf, other.suf);
            }
            Self::Suf => {
                union(&mut target.pre, other.pre);
                union(&mut target.root, other.root);
            }
            Self::PreRoot => union(&mut target.suf, other.suf),
            Self::PreSuf => union(&mut target.root, other.root),
            Self::RootSuf => union(&mut target.pre, other.pre),
        }
        target.public = true;
        target.id = 0;
    }
}

fn union(slot: &mut Vec<String>, other: Vec<String>) {
    slot.extend(other);
    slot.sort();
    slot.dedup();
}

/// Structural slot equality.
#[must_use]
pub fn literal_equal<'a>() -> EqualityFn<'a> {
    Box::new(|a, b| a == b)
}

/// Character-level Levenshtein similarity at or above `threshold`.
#[must_use]
pub fn char_levenshtein_threshold<'a>(threshold: f64) -> EqualityFn<'a> {
    Box::new(move |a, b| char_levenshtein(&a.join(" "), &b.join(" ")) >= threshold)
}

/// Token-level Levenshtein similarity at or above `threshold`.
///
/// Slot alternatives are flattened to one token sequence before comparing,
/// so multi-word alternatives weigh by their tokens.
#[must_use]
pub fn token_levenshtein_threshold<'a>(threshold: f64) -> EqualityFn<'a> {
    let flatten = |slot: &[String]| -> Vec<String> {
        slot.join(" ").split(' ').map(ToString::to_string).collect()
    };
    Box::new(move |a, b| token_levenshtein(&flatten(a), &flatten(b)) >= threshold)
}

/// TF-IDF cosine similarity at or above `threshold`.
///
/// Embedding failures (empty vocabulary, out-of-vocabulary token, vector
/// length mismatch) are logged and answered as "not equivalent".
#[must_use]
pub fn tfidf_cosine_threshold<'a>(
    threshold: f64,
    vocab: &'a [String],
    idf: &'a FxHashMap<String, f64>,
    tokenizer: WordTokenizer,
) -> EqualityFn<'a> {
    Box::new(move |a, b| {
        let embed = |slot: &[String]| {
            count_embed(&slot.join(" "), vocab, &tokenizer)
                .map(|counts| tfidf_transform(counts, vocab, idf))
        };
        let (v1, v2) = match (embed(a), embed(b)) {
            (Ok(v1), Ok(v2)) => (v1, v2),
            (Err(err), _) | (_, Err(err)) => {
                warn!("tfidf embedding failed, treating as not equivalent: {err}");
                return false;
            }
        };
        match cosine_similarity(&v1, &v2) {
            Ok(similarity) => similarity >= threshold,
            Err(err) => {
                warn!("cosine similarity failed, treating as not equivalent: {err}");
                false
            }
        }
    })
}

/// Equality of POS tag signatures over the joined slot text.
#[must_use]
pub fn pos_tag_equal<'a, T: SyntacticTagger>(tagger: &'a T) -> EqualityFn<'a> {
    Box::new(move |a, b| {
        let signature = |slot: &[String]| tagger.pos(&slot.join(" ")).0.join("-");
        signature(a) == signature(b)
    })
}

/// Equality of constituency tag signatures over the joined slot text.
#[must_use]
pub fn constituency_tag_equal<'a, T: SyntacticTagger>(tagger: &'a T) -> EqualityFn<'a> {
    Box::new(move |a, b| {
        let signature = |slot: &[String]| tagger.constituency(&slot.join(" ")).0.join("-");
        signature(a) == signature(b)
    })
}

/// Merges rules whose key slot(s) compare equal under `eq`.
///
/// Slots are canonically intra-sorted, the sequence is sorted so
/// mergeable rules sit adjacent, and a single accumulator pass folds each
/// run of key-equal rules into one rule. Never increases the rule count.
#[must_use]
pub fn merge(rules: Vec<Rule>, key: MergeKey, eq: &EqualityFn<'_>) -> Vec<Rule> {
    let mut rules: Vec<Rule> = rules.into_iter().map(|rule| rule.sorted()).collect();
    rules.sort_by(|a, b| key.ordering(a, b));

    let mut out: Vec<Rule> = Vec::with_capacity(rules.len());
    for rule in rules {
        if out
            .last()
            .is_some_and(|previous| key.matches(previous, &rule, eq))
        {
            let previous = out.last_mut().expect("non-empty accumulator");
            debug!("merge {key:?}: folding {rule:?} into {previous:?}");
            key.combine(previous, rule);
        } else {
            out.push(rule);
        }
    }
    out
}

/// Collapses trivial rules (at most one alternative per slot) into one
/// public fallback rule.
///
/// Each non-empty trivial rule contributes its space-joined
/// `pre root suf` concatenation; the distinct concatenations become the
/// `root` of a single rule with empty `pre`/`suf`. Non-trivial rules pass
/// through untouched, in canonical order.
#[must_use]
pub fn merge_trivial(rules: Vec<Rule>) -> Vec<Rule> {
    let mut rules: Vec<Rule> = rules.into_iter().map(|rule| rule.sorted()).collect();
    rules.sort_by(canonical_cmp);

    let mut out = Vec::with_capacity(rules.len());
    let mut collapsed: Vec<String> = Vec::new();
    for rule in rules {
        if !rule.is_trivial() {
            out.push(rule);
            continue;
        }
        if rule.is_empty() {
            continue;
        }
        let joined = format!(
            "{} {} {}",
            rule.pre.join(" "),
            rule.root.join(" "),
            rule.suf.join(" ")
        );
        let joined = joined.trim().to_string();
        debug!("merge trivial: sweeping {rule:?} into fallback rule");
        if !collapsed.contains(&joined) {
            collapsed.push(joined);
        }
    }
    if !collapsed.is_empty() {
        out.push(Rule {
            pre: Vec::new(),
            root: collapsed,
            suf: Vec::new(),
            public: true,
            id: 0,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pre: &[&str], root: &[&str], suf: &[&str]) -> Rule {
        Rule {
            pre: pre.iter().map(ToString::to_string).collect(),
            root: root.iter().map(ToString::to_string).collect(),
            suf: suf.iter().map(ToString::to_string).collect(),
            public: true,
            id: 0,
        }
    }

    fn elementary(texts: &[&str]) -> Vec<Rule> {
        texts.iter().map(|t| rule(&[""], &[t], &[""])).collect()
    }

    #[test]
    fn merge_on_pre_unions_free_slots() {
        let rules = elementary(&["b text", "a text", "c text"]);
        let eq = literal_equal();
        let merged = merge(rules, MergeKey::Pre, &eq);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].pre, vec![""]);
        assert_eq!(merged[0].root, vec!["a text", "b text", "c text"]);
        assert_eq!(merged[0].suf, vec![""]);
        assert!(merged[0].public);
    }

    #[test]
    fn merge_on_root_keeps_distinct_roots_apart() {
        let rules = elementary(&["one", "two"]);
        let eq = literal_equal();
        let merged = merge(rules, MergeKey::Root, &eq);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merge_on_root_unions_pre_and_suf() {
        let rules = vec![
            rule(&["open"], &["the door"], &["now"]),
            rule(&["close"], &["the door"], &["please"]),
        ];
        let eq = literal_equal();
        let merged = merge(rules, MergeKey::Root, &eq);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].pre, vec!["close", "open"]);
        assert_eq!(merged[0].root, vec!["the door"]);
        assert_eq!(merged[0].suf, vec!["now", "please"]);
    }

    #[test]
    fn merge_pair_key_requires_both_slots_equal() {
        let rules = vec![
            rule(&["a"], &["x"], &["1"]),
            rule(&["a"], &["x"], &["2"]),
            rule(&["a"], &["y"], &["3"]),
        ];
        let eq = literal_equal();
        let merged = merge(rules, MergeKey::PreRoot, &eq);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].suf, vec!["1", "2"]);
        assert_eq!(merged[1].root, vec!["y"]);
    }

    #[test]
    fn merge_never_increases_rule_count_and_supersets_free_slots() {
        let rules = vec![
            rule(&["p"], &["r1"], &["s1"]),
            rule(&["p"], &["r2"], &["s2"]),
            rule(&["q"], &["r3"], &["s3"]),
        ];
        let before = rules.len();
        let eq = literal_equal();
        let merged = merge(rules, MergeKey::Pre, &eq);
        assert!(merged.len() <= before);
        let combined = &merged[0];
        for expected in ["r1", "r2"] {
            assert!(combined.root.iter().any(|r| r == expected));
        }
        for expected in ["s1", "s2"] {
            assert!(combined.suf.iter().any(|s| s == expected));
        }
    }

    #[test]
    fn merge_is_idempotent_once_coalesced() {
        let rules = elementary(&["a", "b"]);
        let eq = literal_equal();
        let once = merge(rules, MergeKey::Pre, &eq);
        let twice = merge(once.clone(), MergeKey::Pre, &eq);
        assert_eq!(once, twice);
    }

    #[test]
    fn merge_with_fuzzy_equality_folds_similar_keys() {
        let rules = vec![
            rule(&[""], &["show me the bill"], &["please"]),
            rule(&[""], &["show me the bills"], &["now"]),
        ];
        let eq = char_levenshtein_threshold(0.9);
        let merged = merge(rules, MergeKey::Root, &eq);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].suf, vec!["now", "please"]);
    }

    #[test]
    fn merge_trivial_sweeps_all_trivial_rules() {
        let rules = vec![
            rule(&[""], &["I don't understand you"], &[""]),
            rule(&[""], &["you arent helping"], &[""]),
            rule(&["a", "b"], &["kept"], &["x"]),
        ];
        let merged = merge_trivial(rules);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].root, vec!["kept"]);
        let fallback = &merged[1];
        assert!(fallback.pre.is_empty());
        assert!(fallback.suf.is_empty());
        assert_eq!(
            fallback.root,
            vec!["I don't understand you", "you arent helping"]
        );
        assert!(fallback.public);
    }

    #[test]
    fn merge_trivial_joins_all_three_slots() {
        let rules = vec![rule(&["turn"], &["the lights"], &["off"])];
        let merged = merge_trivial(rules);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].root, vec!["turn the lights off"]);
    }

    #[test]
    fn merge_trivial_drops_empty_rules_and_dedups() {
        let rules = vec![
            rule(&[""], &[""], &[""]),
            rule(&[""], &["same"], &[""]),
            rule(&[""], &["same"], &[""]),
        ];
        let merged = merge_trivial(rules);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].root, vec!["same"]);
    }

    #[test]
    fn merge_trivial_without_trivial_rules_is_identity() {
        let rules = vec![rule(&["a", "b"], &["r"], &["s", "t"])];
        let merged = merge_trivial(rules.clone());
        assert_eq!(merged, rules);
    }

    #[test]
    fn tfidf_equality_treats_embedding_failure_as_not_equivalent() {
        let vocab: Vec<String> = vec!["known".to_string()];
        let idf = FxHashMap::default();
        let eq = tfidf_cosine_threshold(0.5, &vocab, &idf, WordTokenizer::new());
        let known = vec!["known".to_string()];
        let unknown = vec!["unknown".to_string()];
        assert!(!eq(&known, &unknown));
    }
}
