//! Grammar rules: the pre/root/suf slot structure, naming, and rendering.

use std::cmp::Ordering;

use crate::tokenize::BOUNDARY_CHARS;

/// Number of characters a rule name is truncated to before the id suffix.
const NAME_PREFIX_LEN: usize = 20;

/// One rule within the output grammar.
///
/// Each slot holds an ordered list of alternative expressions. `public`
/// rules are externally referenceable; private rules only exist to be
/// referenced by `<name>` tokens inside other rules. The numeric id is 0
/// until [`assign_ids`] runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rule {
    /// Alternatives preceding the root.
    pub pre: Vec<String>,
    /// Alternatives for the anchor chunk of the utterance.
    pub root: Vec<String>,
    /// Alternatives following the root.
    pub suf: Vec<String>,
    /// Whether the rule is externally referenceable.
    pub public: bool,
    /// Identifier assigned once from the canonical sort position.
    pub id: usize,
}

impl Rule {
    /// Builds an elementary rule from one decomposed utterance triplet.
    #[must_use]
    pub fn from_triplet(pre: &str, root: &str, suf: &str) -> Self {
        Self {
            pre: vec![pre.to_string()],
            root: vec![root.to_string()],
            suf: vec![suf.to_string()],
            public: true,
            id: 0,
        }
    }

    /// Returns `true` when the rule carries no renderable content.
    ///
    /// A rule is empty when all slots are empty, or when the slots hold at
    /// most three elements in total and every element is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let total = self.pre.len() + self.root.len() + self.suf.len();
        if total == 0 {
            return true;
        }
        if total <= 3 {
            return self
                .pre
                .iter()
                .chain(&self.root)
                .chain(&self.suf)
                .all(String::is_empty);
        }
        false
    }

    /// Returns `true` when no slot holds more than one alternative.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.pre.len() <= 1 && self.root.len() <= 1 && self.suf.len() <= 1
    }

    /// Returns a copy with every slot intra-sorted for canonical comparison.
    #[must_use]
    pub fn sorted(&self) -> Self {
        let mut out = self.clone();
        out.pre.sort();
        out.root.sort();
        out.suf.sort();
        out
    }

    /// Derives the rule name from its root content and assigned id.
    ///
    /// Root alternatives are joined with underscores, spaces become
    /// underscores, angle brackets are stripped, and the result is cut to a
    /// 20-character prefix. Once a non-zero id has been assigned it is
    /// appended as a disambiguating suffix.
    #[must_use]
    pub fn name(&self) -> String {
        let joined = self.root.join("_").replace(' ', "_").replace(['<', '>'], "");
        let prefix: String = joined.chars().take(NAME_PREFIX_LEN).collect();
        if self.id != 0 {
            format!("{prefix}_{}", self.id)
        } else {
            prefix
        }
    }

    /// Renders the rule as one JSGF line under the given name.
    ///
    /// Each non-empty slot renders as `(alt|alt)`, or `[alt|alt]` when the
    /// alternative set contains the empty string (making the group
    /// optional). Spaces preceding boundary punctuation are removed. Empty
    /// rules render as the empty string.
    #[must_use]
    pub fn render(&self, name: &str) -> String {
        if self.is_empty() {
            return String::new();
        }

        let slots = [
            format_alternatives(&self.pre),
            format_alternatives(&self.root),
            format_alternatives(&self.suf),
        ];

        let mut out = String::new();
        if self.public {
            out.push_str("public ");
        }
        out.push('<');
        out.push_str(name);
        out.push_str("> =");
        for slot in &slots {
            if slot.is_empty() {
                continue;
            }
            out.push(' ');
            out.push_str(slot);
        }
        out.push(';');
        out
    }
}

/// Removes spaces in front of boundary punctuation for rendering.
fn join_boundaries(s: &str) -> String {
    let mut out = s.to_string();
    for c in BOUNDARY_CHARS {
        out = out.replace(&format!(" {c}"), &c.to_string());
    }
    out
}

/// Renders one slot's alternative set, `(...)` or optional `[...]`.
fn format_alternatives(alternatives: &[String]) -> String {
    let mut alts = alternatives.to_vec();
    alts.sort();
    for alt in &mut alts {
        *alt = join_boundaries(alt);
    }
    let optional = match alts.iter().position(String::is_empty) {
        Some(at) => {
            alts.remove(at);
            true
        }
        None => false,
    };
    if alts.is_empty() {
        return String::new();
    }
    if optional {
        format!("[{}]", alts.join("|"))
    } else {
        format!("({})", alts.join("|"))
    }
}

/// Canonical rule ordering: by `pre`, then `root`, then `suf`.
#[must_use]
pub fn canonical_cmp(a: &Rule, b: &Rule) -> Ordering {
    a.pre
        .cmp(&b.pre)
        .then_with(|| a.root.cmp(&b.root))
        .then_with(|| a.suf.cmp(&b.suf))
}

/// Sorts the rules canonically and numbers them from 0.
///
/// This is the single point where identifiers are assigned; merge passes
/// must already have run, since any later merge would invalidate the ids.
#[must_use]
pub fn assign_ids(mut rules: Vec<Rule>) -> Vec<Rule> {
    rules.sort_by(canonical_cmp);
    for (id, rule) in rules.iter_mut().enumerate() {
        rule.id = id;
    }
    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pre: &[&str], root: &[&str], suf: &[&str], public: bool) -> Rule {
        Rule {
            pre: pre.iter().map(ToString::to_string).collect(),
            root: root.iter().map(ToString::to_string).collect(),
            suf: suf.iter().map(ToString::to_string).collect(),
            public,
            id: 0,
        }
    }

    #[test]
    fn is_empty_table() {
        assert!(rule(&[], &[], &[], false).is_empty());
        assert!(rule(&[""], &[], &[], false).is_empty());
        assert!(rule(&[], &[""], &[], false).is_empty());
        assert!(rule(&[""], &[""], &[""], false).is_empty());
        assert!(!rule(&["a"], &["1", "2"], &["c"], false).is_empty());
        assert!(!rule(&["", "", "", ""], &[], &[], false).is_empty());
    }

    #[test]
    fn render_table() {
        assert_eq!(rule(&[], &[], &[], true).render(""), "");
        assert_eq!(rule(&[""], &[""], &[""], true).render(""), "");
        assert_eq!(
            rule(&["", "", "", ""], &["", "", "", ""], &["", "", "", ""], true).render(""),
            "public <> = [||] [||] [||];"
        );
        assert_eq!(
            rule(&["a", "b", "c", ""], &["a", "b", "c", "d"], &[], false).render("1"),
            "<1> = [a|b|c] (a|b|c|d);"
        );
        assert_eq!(
            rule(&[], &["a", "b", "c", ""], &["a", "b", "c", "d"], true).render("2"),
            "public <2> = [a|b|c] (a|b|c|d);"
        );
    }

    #[test]
    fn render_joins_boundary_punctuation() {
        let r = rule(&[""], &["can you show me my invoices ?"], &[""], true);
        assert_eq!(
            r.render("n"),
            "public <n> = (can you show me my invoices?);"
        );
    }

    #[test]
    fn name_table() {
        assert_eq!(rule(&[], &[], &[], false).name(), "");
        assert_eq!(
            rule(&["", "", "", ""], &["", "", "", ""], &["", "", "", ""], false).name(),
            "___"
        );
        assert_eq!(
            rule(&["a", "b", "c", ""], &["a", "b", "c", "d"], &[], false).name(),
            "a_b_c_d"
        );
        assert_eq!(
            rule(&[], &["a", "b", "c", ""], &["a", "b", "c", "d"], false).name(),
            "a_b_c_"
        );
    }

    #[test]
    fn name_truncates_and_suffixes_id() {
        let mut r = rule(&[], &["I don't have an online account"], &[], false);
        assert_eq!(r.name(), "I_don't_have_an_onli");
        r.id = 12;
        assert_eq!(r.name(), "I_don't_have_an_onli_12");
    }

    #[test]
    fn name_strips_nonterminal_brackets() {
        let r = rule(&[], &["<inner_ref>"], &[], false);
        assert_eq!(r.name(), "inner_ref");
    }

    #[test]
    fn assign_ids_sorts_canonically() {
        let rules = vec![
            rule(&[""], &["b"], &[""], true),
            rule(&[""], &["a"], &[""], true),
            rule(&["x"], &["a"], &[""], true),
        ];
        let rules = assign_ids(rules);
        assert_eq!(rules[0].root, vec!["a"]);
        assert_eq!(rules[0].id, 0);
        assert_eq!(rules[1].root, vec!["b"]);
        assert_eq!(rules[1].id, 1);
        assert_eq!(rules[2].pre, vec!["x"]);
        assert_eq!(rules[2].id, 2);
    }
}
