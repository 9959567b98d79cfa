//! Clause splitting: sentence boundaries, commas, and connector words.

use std::sync::LazyLock;

use regex::Regex;

use super::types::Span;

/// Sentence punctuation followed by whitespace, hard separators, or a comma
/// followed by whitespace (so `1,000` and `a.b@c.com` survive).
static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[.!?]+(?:\s+|$)|[;\n]+|,\s+").expect("separator regex is valid")
});

/// Connectors that open a new clause. Alternation order matters: the regex
/// engine takes the first alternative that matches at a position.
static CONNECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:and then|then|only when|only if|whenever|when|unless|if)\b")
        .expect("connector regex is valid")
});

/// A contiguous piece of the input that describes one entity or directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub text: String,
    pub span: Span,
}

impl Clause {
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Clause {
            text: text.into(),
            span,
        }
    }

    /// Lowercased alphanumeric words of the clause.
    pub fn words(&self) -> Vec<String> {
        self.text
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect()
    }
}

/// Split raw input into clauses, preserving byte spans into `raw`.
pub fn split_clauses(raw: &str) -> Vec<Clause> {
    let mut clauses = Vec::new();
    let mut segment_start = 0;

    for sep in SEPARATOR.find_iter(raw) {
        split_segment(raw, segment_start, sep.start(), &mut clauses);
        segment_start = sep.end();
    }
    split_segment(raw, segment_start, raw.len(), &mut clauses);

    clauses
}

fn split_segment(raw: &str, start: usize, end: usize, out: &mut Vec<Clause>) {
    let segment = &raw[start..end];
    let mut clause_start = start;

    for m in CONNECTOR.find_iter(segment) {
        let at = start + m.start();
        push_clause(raw, clause_start, at, out);
        // `then` only separates; every other connector belongs to the clause it opens.
        clause_start = if is_pure_separator(m.as_str()) {
            start + m.end()
        } else {
            at
        };
    }
    push_clause(raw, clause_start, end, out);
}

fn is_pure_separator(connector: &str) -> bool {
    let lower = connector.to_lowercase();
    lower == "then" || lower == "and then"
}

fn push_clause(raw: &str, start: usize, end: usize, out: &mut Vec<Clause>) {
    if start >= end {
        return;
    }
    let slice = &raw[start..end];
    let leading = slice.len() - slice.trim_start().len();
    let text = slice
        .trim()
        .trim_end_matches(|c: char| matches!(c, ',' | ':' | '.' | '!' | '?'))
        .trim_end();
    if !text.chars().any(char::is_alphanumeric) {
        return;
    }
    let clause_start = start + leading;
    out.push(Clause::new(text, Span::new(clause_start, clause_start + text.len())));
}
