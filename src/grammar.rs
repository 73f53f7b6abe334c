//! Serialization of the final rule set as a JSGF-like grammar.

use std::fs;
use std::path::Path;

use crate::config::InducerConfig;
use crate::error::{JgramError, Result};
use crate::rule::Rule;

/// The final ordered collection of rules plus its textual serialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grammar {
    /// Rules in post-induction order.
    pub rules: Vec<Rule>,
}

impl Grammar {
    /// Wraps a finished rule set.
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Grammar headers: format declaration plus a comment echoing the
    /// configuration that produced this grammar.
    #[must_use]
    pub fn front_matter(&self, config: &InducerConfig) -> String {
        let echo = serde_json::to_string(config).unwrap_or_else(|_| "{}".to_string());
        let mut out = String::new();
        out.push_str("#JSGF V1.0 ISO8859-1 en;\n");
        out.push_str("#created using jgram\n");
        out.push_str("#cfg: ");
        out.push_str(&echo);
        out.push_str("\n\n");
        out.push_str("grammar main;\n\n");
        out
    }

    /// Grammar body with public rules first, then private rules, each
    /// group ordered by rendered text for reproducibility. Empty rules
    /// are omitted.
    #[must_use]
    pub fn body(&self) -> String {
        let mut rules = self.rules.clone();
        rules.sort_by(|a, b| a.render("").cmp(&b.render("")));

        let mut out = String::new();
        for rule in rules.iter().filter(|r| r.public && !r.is_empty()) {
            out.push_str(&rule.render(&rule.name()));
            out.push('\n');
        }
        out.push('\n');
        for rule in rules.iter().filter(|r| !r.public && !r.is_empty()) {
            out.push_str(&rule.render(&rule.name()));
            out.push('\n');
        }
        out.trim().to_string()
    }

    /// Grammar body aggregated under one public `<main>` rule; every
    /// other rule renders as private.
    #[must_use]
    pub fn body_main(&self) -> String {
        let mut rules = self.rules.clone();
        rules.sort_by(|a, b| a.render("").cmp(&b.render("")));

        let mut main = Rule {
            public: true,
            ..Rule::default()
        };
        for rule in rules.iter().filter(|r| r.public && !r.is_empty()) {
            main.root.push(format!("<{}>", rule.name()));
        }

        let mut out = String::new();
        out.push_str(&main.render("main"));
        out.push_str("\n\n");
        for rule in rules.iter_mut().filter(|r| !r.is_empty()) {
            rule.public = false;
            out.push_str(&rule.render(&rule.name()));
            out.push('\n');
        }
        out.trim().to_string()
    }

    /// Renders the complete grammar text.
    #[must_use]
    pub fn render(&self, config: &InducerConfig, main: bool) -> String {
        let body = if main { self.body_main() } else { self.body() };
        let mut out = self.front_matter(config);
        out.push_str(&body);
        out.push('\n');
        out
    }

    /// Writes the rendered grammar to `path`.
    pub fn write_to<P: AsRef<Path>>(
        &self,
        path: P,
        config: &InducerConfig,
        main: bool,
    ) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render(config, main))
            .map_err(|err| JgramError::io(err, Some(path.to_path_buf())))
    }
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
    fn body_groups_public_before_private() {
        let grammar = Grammar::new(vec![
            rule(&[], &["internal"], &[], false),
            rule(&[""], &["visible"], &[""], true),
        ]);
        let body = grammar.body();
        let public_at = body.find("public <visible>").expect("public rule present");
        let private_at = body.find("<internal>").expect("private rule present");
        assert!(public_at < private_at);
    }

    #[test]
    fn body_omits_empty_rules() {
        let grammar = Grammar::new(vec![
            rule(&[""], &[""], &[""], true),
            rule(&[""], &["kept"], &[""], true),
        ]);
        let body = grammar.body();
        assert_eq!(body, "public <kept> = (kept);");
    }

    #[test]
    fn body_main_aggregates_public_rules() {
        let grammar = Grammar::new(vec![
            rule(&[""], &["alpha"], &[""], true),
            rule(&[""], &["beta"], &[""], true),
            rule(&[], &["internal"], &[], false),
        ]);
        let body = grammar.body_main();
        assert!(body.starts_with("public <main> = (<alpha>|<beta>);"));
        // every non-main rule is rendered private
        assert!(body.contains("\n<alpha> = (alpha);"));
        assert!(body.contains("\n<beta> = (beta);"));
        assert!(body.contains("\n<internal> = (internal);"));
        assert_eq!(body.matches("public ").count(), 1);
    }

    #[test]
    fn render_prepends_front_matter() {
        let config = InducerConfig::default();
        let grammar = Grammar::new(vec![rule(&[""], &["hello"], &[""], true)]);
        let text = grammar.render(&config, false);
        assert!(text.starts_with("#JSGF V1.0 ISO8859-1 en;\n"));
        assert!(text.contains("#cfg: {"));
        assert!(text.contains("grammar main;\n\n"));
        assert!(text.contains("public <hello> = (hello);"));
    }
}
