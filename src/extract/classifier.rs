//! Clause classification.
//!
//! [`Classifier`] is the seam between clause splitting and everything
//! downstream: the graph builder, validator and compiler only ever see the
//! resulting `(EntityKind, confidence)` pairs, so the keyword table below can
//! be replaced by any other strategy.

use serde::{Deserialize, Serialize};

use super::clause::Clause;
use super::types::EntityKind;

/// Confidence for a clause opened by a condition connector.
const CONDITION_LEAD_CONFIDENCE: f32 = 0.95;
/// Confidence for a clause opened by trigger vocabulary.
const TRIGGER_LEAD_CONFIDENCE: f32 = 0.9;
/// Confidence for a clause opened by an imperative verb.
const ACTION_LEAD_CONFIDENCE: f32 = 0.9;
/// Confidence when nothing in the table matches; the clause defaults to an Action.
const FALLBACK_CONFIDENCE: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub kind: EntityKind,
    pub confidence: f32,
}

impl Classification {
    pub fn new(kind: EntityKind, confidence: f32) -> Self {
        Classification {
            kind,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

pub trait Classifier: Send + Sync {
    fn classify(&self, clause: &Clause) -> Classification;
}

/// Vocabulary used by [`KeywordClassifier`]. Entries may be multi-word phrases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct KeywordTable {
    /// Phrases that open a trigger clause ("when", "every").
    pub trigger_leads: Vec<String>,
    /// Phrases that open a condition clause ("if", "unless").
    pub condition_leads: Vec<String>,
    /// Imperative verbs that open an action clause.
    pub action_verbs: Vec<String>,
    /// Event vocabulary anywhere in a clause.
    pub trigger_words: Vec<String>,
    /// Comparison vocabulary anywhere in a clause.
    pub condition_words: Vec<String>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        fn owned(words: &[&str]) -> Vec<String> {
            words.iter().map(|w| w.to_string()).collect()
        }

        KeywordTable {
            trigger_leads: owned(&[
                "when", "whenever", "every", "each", "on", "once", "after", "as soon as",
            ]),
            condition_leads: owned(&["only when", "only if", "if", "unless", "provided"]),
            action_verbs: owned(&[
                "send", "create", "notify", "post", "add", "update", "delete", "remove",
                "email", "message", "save", "upload", "forward", "reply", "assign", "log",
                "record", "copy", "move", "alert", "call", "text", "share", "publish",
                "archive", "generate", "run", "invite", "tag", "mark", "append", "write",
                "sync", "export", "ping", "remind", "open", "close", "charge", "refund",
            ]),
            trigger_words: owned(&[
                "arrives", "arrived", "received", "submitted", "created", "updated",
                "signs", "signed", "new", "incoming", "daily", "hourly", "weekly",
                "monthly", "scheduled",
            ]),
            condition_words: owned(&[
                "over", "under", "above", "below", "greater", "less", "equals", "exceeds",
                "contains", "matches", "only", "least", "most",
            ]),
        }
    }
}

impl KeywordTable {
    fn starts_with_any(phrases: &[String], words: &[String]) -> bool {
        phrases.iter().any(|phrase| {
            let parts: Vec<&str> = phrase.split_whitespace().collect();
            !parts.is_empty()
                && parts.len() <= words.len()
                && parts
                    .iter()
                    .zip(words)
                    .all(|(p, w)| p.eq_ignore_ascii_case(w))
        })
    }

    fn count_hits(vocabulary: &[String], words: &[String]) -> usize {
        words
            .iter()
            .filter(|w| vocabulary.iter().any(|v| v.eq_ignore_ascii_case(w)))
            .count()
    }
}

/// Rule-based classifier over a [`KeywordTable`].
///
/// Leading phrases decide with high confidence. Otherwise vocabulary hits are
/// counted anywhere in the clause, and the confidence reflects how clearly
/// one kind dominates.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier {
    table: KeywordTable,
}

impl KeywordClassifier {
    pub fn new(table: KeywordTable) -> Self {
        KeywordClassifier { table }
    }

    pub fn table(&self) -> &KeywordTable {
        &self.table
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, clause: &Clause) -> Classification {
        let words = clause.words();
        let table = &self.table;

        if KeywordTable::starts_with_any(&table.condition_leads, &words) {
            return Classification::new(EntityKind::Condition, CONDITION_LEAD_CONFIDENCE);
        }
        if KeywordTable::starts_with_any(&table.trigger_leads, &words) {
            return Classification::new(EntityKind::Trigger, TRIGGER_LEAD_CONFIDENCE);
        }
        if KeywordTable::starts_with_any(&table.action_verbs, &words) {
            return Classification::new(EntityKind::Action, ACTION_LEAD_CONFIDENCE);
        }

        // Ties resolve in this order.
        let scores = [
            (EntityKind::Action, KeywordTable::count_hits(&table.action_verbs, &words)),
            (EntityKind::Trigger, KeywordTable::count_hits(&table.trigger_words, &words)),
            (EntityKind::Condition, KeywordTable::count_hits(&table.condition_words, &words)),
        ];
        let total: usize = scores.iter().map(|(_, hits)| hits).sum();
        if total == 0 {
            return Classification::new(EntityKind::Action, FALLBACK_CONFIDENCE);
        }

        let (kind, best) = scores
            .iter()
            .copied()
            .fold((EntityKind::Action, 0), |acc, cur| if cur.1 > acc.1 { cur } else { acc });
        let dominance = best as f32 / total as f32;
        Classification::new(kind, 0.35 + 0.4 * dominance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::types::Span;

    fn classify(text: &str) -> Classification {
        let clause = Clause::new(text, Span::new(0, text.len()));
        KeywordClassifier::default().classify(&clause)
    }

    #[test]
    fn leading_connectors_decide() {
        assert_eq!(classify("When a new email arrives").kind, EntityKind::Trigger);
        assert_eq!(classify("Every Monday at 9am").kind, EntityKind::Trigger);
        assert_eq!(classify("if the amount is over 100").kind, EntityKind::Condition);
        assert_eq!(classify("only when the build fails").kind, EntityKind::Condition);
        assert_eq!(classify("Send a Slack message").kind, EntityKind::Action);
    }

    #[test]
    fn lead_confidence_is_high() {
        let c = classify("unless it is a weekend");
        assert_eq!(c.kind, EntityKind::Condition);
        assert!(c.confidence > 0.9);
    }

    #[test]
    fn vocabulary_anywhere_is_less_confident() {
        let c = classify("new invoice arrives from Stripe");
        assert_eq!(c.kind, EntityKind::Trigger);
        assert!(c.confidence < TRIGGER_LEAD_CONFIDENCE);
        assert!(c.confidence >= 0.5);
    }

    #[test]
    fn unknown_clause_falls_back_to_low_confidence_action() {
        let c = classify("the quarterly thing");
        assert_eq!(c.kind, EntityKind::Action);
        assert_eq!(c.confidence, FALLBACK_CONFIDENCE);
    }

    #[test]
    fn custom_table_swaps_vocabulary() {
        let table = KeywordTable {
            action_verbs: vec!["frobnicate".into()],
            ..KeywordTable::default()
        };
        let clause = Clause::new("frobnicate the widget", Span::new(0, 21));
        let c = KeywordClassifier::new(table).classify(&clause);
        assert_eq!(c.kind, EntityKind::Action);
        assert_eq!(c.confidence, ACTION_LEAD_CONFIDENCE);
    }

    #[test]
    fn table_deserializes_with_defaults() {
        let table: KeywordTable =
            serde_json::from_str(r#"{ "conditionLeads": ["provided that"] }"#).unwrap();
        assert_eq!(table.condition_leads, vec!["provided that"]);
        assert_eq!(table.action_verbs, KeywordTable::default().action_verbs);
    }
}
