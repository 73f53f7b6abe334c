//! Syntactic tagging: part-of-speech and shallow constituency bracketing.
//!
//! The tagger is a seam: merge equality predicates, syntactic factoring,
//! and tag-driven chunking only depend on the [`SyntacticTagger`] trait.
//! [`LexiconTagger`] is the built-in deterministic implementation — a
//! closed-class lexicon plus suffix heuristics for POS, and an ordered
//! Penn-style bracketing table collapsed to fixpoint for constituency.

use rustc_hash::FxHashMap;

use crate::tokenize::WordTokenizer;

/// Assigns POS tags and shallow constituency structure to text.
pub trait SyntacticTagger {
    /// Tags the text, returning (tag sequence, token sequence), 1:1 aligned.
    fn pos(&self, text: &str) -> (Vec<String>, Vec<String>);

    /// Brackets the POS sequence into constituents, returning
    /// (tag sequence, surface sequence) where each collapsed constituent
    /// covers one space-joined surface span.
    fn constituency(&self, text: &str) -> (Vec<String>, Vec<String>);
}

/// One bracketing rule: a contiguous tag pattern collapsed to a single tag.
#[derive(Debug, Clone)]
struct BracketingRule {
    pattern: &'static [&'static str],
    tag: &'static str,
}

/// (collapsed tag, tag pattern) pairs, Penn treebank style.
const BRACKETING_RULES: &[(&str, &[&str])] = &[
    ("ADJP", &["NP", "JJ"]),
    ("ADJP", &["JJ", "JJ"]),
    ("ADJP", &["RB", "JJ"]),
    ("ADJP", &["RB", "VBN"]),
    ("ADJP", &["RB", "JJR"]),
    ("ADJP", &["JJ", "PP"]),
    ("ADJP", &["CD", "NN"]),
    ("ADJP", &["QP", "NN"]),
    ("ADJP", &["ADJP", "PP"]),
    ("ADJP", &["RBR", "JJ"]),
    ("ADJP", &["RBS", "JJ"]),
    ("ADJP", &["JJ", "CC", "JJ"]),
    ("ADJP", &["NNP", ",", "JJ"]),
    ("ADJP", &["CD", "CD", "NN"]),
    ("ADVP", &["RB", "PP"]),
    ("ADVP", &["RB", "NP"]),
    ("ADVP", &["RB", "RB"]),
    ("ADVP", &["IN", "JJS"]),
    ("CONJP", &["IN", "IN"]),
    ("CONJP", &["RB", "RB", "IN"]),
    ("CONJP", &["CC", "RB"]),
    ("CONJP", &["RB", "IN"]),
    ("CONJP", &["RB", "TO", "VB"]),
    ("NP", &["NNP", "NNP"]),
    ("NP", &["CD", "NNS"]),
    ("NP", &["DT", "NN"]),
    ("NP", &["DT", "JJ", "NN"]),
    ("NP", &["NP", "PP"]),
    ("NP", &["JJ", "NN"]),
    ("NP", &["NN", "NNS"]),
    ("NP", &["DT", "NN", "NN"]),
    ("NP", &["DT", "NNS"]),
    ("NP", &["NP", "SBAR"]),
    ("NP", &["NNP", "NNP", "NNP"]),
    ("NP", &["NP", "CC", "NP"]),
    ("NP", &["JJ", "NNS"]),
    ("NP", &["NP", "VP"]),
    ("NP", &["CD", "NN"]),
    ("PP", &["IN", "NP"]),
    ("PP", &["TO", "NP"]),
    ("PRN", &[":", "NP"]),
    ("PRN", &[":", "PP", ":"]),
    ("PRN", &[",", "PP", ","]),
    ("PRN", &[":", "NP", ":"]),
    ("PRN", &[",", "S", ","]),
    ("PRN", &[",", "ADVP", ","]),
    ("PRN", &[":", "SBAR", ":"]),
    ("PRN", &[":", "S", ":"]),
    ("QP", &["RBR", "IN", "CD"]),
    ("QP", &["CD", "CD"]),
    ("QP", &["IN", "CD"]),
    ("QP", &["$", "CD", "CD"]),
    ("QP", &["IN", "$", "CD", "CD"]),
    ("QP", &["IN", "CD", "CD"]),
    ("QP", &["RB", "$", "CD", "CD"]),
    ("QP", &["RB", "CD"]),
    ("QP", &["JJR", "IN", "CD"]),
    ("QP", &["CD", "TO", "CD"]),
    ("QP", &["JJR", "IN", "$", "CD", "CD"]),
    ("QP", &["CD", "NN", "TO", "CD", "NN"]),
    ("QP", &["#", "CD", "CD"]),
    ("VP", &["MD", "VP"]),
    ("VP", &["VBD", "VP"]),
    ("VP", &["TO", "VP"]),
    ("VP", &["VB", "NP"]),
    ("VP", &["VBZ", "VP"]),
    ("VP", &["VBN", "NP"]),
    ("VP", &["VBD", "SBAR"]),
    ("VP", &["VBZ", "NP"]),
    ("VP", &["VBG", "NP"]),
    ("VP", &["VBP", "VP"]),
    ("VP", &["VBD", "NP"]),
    ("VP", &["VBP", "NP"]),
    ("VP", &["VBD", "S"]),
    ("VP", &["VP", "CC", "VP"]),
    ("VP", &["VBZ", "S"]),
    ("VP", &["VBN", "NP", "PP"]),
    ("VP", &["VB", "VP"]),
    ("VP", &["VBZ", "SBAR"]),
    ("VP", &["VB", "S"]),
];

/// Closed-class word list: (lowercase token, tag).
const LEXICON: &[(&str, &str)] = &[
    ("the", "DT"),
    ("a", "DT"),
    ("an", "DT"),
    ("this", "DT"),
    ("that", "DT"),
    ("these", "DT"),
    ("those", "DT"),
    ("some", "DT"),
    ("any", "DT"),
    ("i", "PRP"),
    ("you", "PRP"),
    ("he", "PRP"),
    ("she", "PRP"),
    ("it", "PRP"),
    ("we", "PRP"),
    ("they", "PRP"),
    ("me", "PRP"),
    ("him", "PRP"),
    ("her", "PRP"),
    ("us", "PRP"),
    ("them", "PRP"),
    ("my", "PRP$"),
    ("your", "PRP$"),
    ("his", "PRP$"),
    ("its", "PRP$"),
    ("our", "PRP$"),
    ("their", "PRP$"),
    ("can", "MD"),
    ("could", "MD"),
    ("will", "MD"),
    ("would", "MD"),
    ("shall", "MD"),
    ("should", "MD"),
    ("may", "MD"),
    ("might", "MD"),
    ("must", "MD"),
    ("of", "IN"),
    ("in", "IN"),
    ("on", "IN"),
    ("at", "IN"),
    ("by", "IN"),
    ("with", "IN"),
    ("from", "IN"),
    ("about", "IN"),
    ("into", "IN"),
    ("over", "IN"),
    ("under", "IN"),
    ("for", "IN"),
    ("when", "WRB"),
    ("if", "IN"),
    ("to", "TO"),
    ("and", "CC"),
    ("or", "CC"),
    ("but", "CC"),
    ("nor", "CC"),
    ("how", "WRB"),
    ("where", "WRB"),
    ("why", "WRB"),
    ("what", "WP"),
    ("who", "WP"),
    ("whom", "WP"),
    ("which", "WDT"),
    ("there", "EX"),
    ("not", "RB"),
    ("very", "RB"),
    ("really", "RB"),
    ("just", "RB"),
    ("too", "RB"),
    ("also", "RB"),
    ("always", "RB"),
    ("never", "RB"),
    ("now", "RB"),
    ("here", "RB"),
    ("please", "UH"),
    ("hello", "UH"),
    ("hi", "UH"),
    ("be", "VB"),
    ("been", "VBN"),
    ("being", "VBG"),
    ("is", "VBZ"),
    ("are", "VBP"),
    ("am", "VBP"),
    ("was", "VBD"),
    ("were", "VBD"),
    ("do", "VBP"),
    ("does", "VBZ"),
    ("did", "VBD"),
    ("have", "VBP"),
    ("has", "VBZ"),
    ("had", "VBD"),
];

/// Deterministic lexicon-and-heuristics tagger.
#[derive(Debug, Clone)]
pub struct LexiconTagger {
    tokenizer: WordTokenizer,
    lexicon: FxHashMap<&'static str, &'static str>,
    rules: Vec<BracketingRule>,
}

impl Default for LexiconTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconTagger {
    /// Builds the tagger with its embedded lexicon and bracketing table.
    ///
    /// Bracketing rules are ordered shortest pattern first (stable within
    /// equal lengths) so smaller constituents collapse before larger ones.
    #[must_use]
    pub fn new() -> Self {
        let lexicon = LEXICON.iter().copied().collect();
        let mut rules: Vec<BracketingRule> = BRACKETING_RULES
            .iter()
            .map(|(tag, pattern)| BracketingRule { pattern, tag })
            .collect();
        rules.sort_by_key(|rule| rule.pattern.len());
        Self {
            tokenizer: WordTokenizer::new(),
            lexicon,
            rules,
        }
    }

    fn tag_token(&self, token: &str) -> String {
        let lower = token.to_lowercase();
        if let Some(tag) = self.lexicon.get(lower.as_str()) {
            return (*tag).to_string();
        }
        if let Some(tag) = punctuation_tag(token) {
            return tag.to_string();
        }
        if token.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
            && token.chars().any(|c| c.is_ascii_digit())
        {
            return "CD".to_string();
        }
        if token.chars().next().is_some_and(char::is_uppercase) {
            return "NNP".to_string();
        }
        suffix_tag(&lower).to_string()
    }

    /// Finds the first collapsible (rule, position) in the tag sequence.
    fn first_match(&self, tags: &[String]) -> Option<(usize, usize)> {
        for (rule_index, rule) in self.rules.iter().enumerate() {
            let width = rule.pattern.len();
            if width > tags.len() {
                continue;
            }
            for at in 0..=tags.len() - width {
                if tags[at..at + width]
                    .iter()
                    .zip(rule.pattern)
                    .all(|(tag, pattern)| tag == pattern)
                {
                    return Some((rule_index, at));
                }
            }
        }
        None
    }
}

fn punctuation_tag(token: &str) -> Option<&'static str> {
    match token {
        "." | "?" | "!" => Some("."),
        "," => Some(","),
        ":" | ";" => Some(":"),
        _ => None,
    }
}

fn suffix_tag(lower: &str) -> &'static str {
    if lower.ends_with("ly") {
        "RB"
    } else if lower.ends_with("ing") && lower.len() > 4 {
        "VBG"
    } else if lower.ends_with("ed") && lower.len() > 3 {
        "VBD"
    } else if lower.ends_with("est") && lower.len() > 4 {
        "JJS"
    } else if lower.ends_with("ous")
        || lower.ends_with("ful")
        || lower.ends_with("ive")
        || lower.ends_with("able")
    {
        "JJ"
    } else if lower.ends_with('s') && !lower.ends_with("ss") && lower.len() > 3 {
        "NNS"
    } else {
        "NN"
    }
}

impl SyntacticTagger for LexiconTagger {
    fn pos(&self, text: &str) -> (Vec<String>, Vec<String>) {
        let tokens = self.tokenizer.tokenize(text);
        let tags = tokens.iter().map(|token| self.tag_token(token)).collect();
        (tags, tokens)
    }

    fn constituency(&self, text: &str) -> (Vec<String>, Vec<String>) {
        let (mut tags, mut surfaces) = self.pos(text);
        while let Some((rule_index, at)) = self.first_match(&tags) {
            let rule = &self.rules[rule_index];
            let width = rule.pattern.len();
            let span = surfaces[at..at + width].join(" ");
            tags.splice(at..at + width, [rule.tag.to_string()]);
            surfaces.splice(at..at + width, [span]);
        }
        (tags, surfaces)
    }
}
