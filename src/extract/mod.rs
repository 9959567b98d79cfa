//! Extraction phase: free-form text + attachment metadata → entities.

pub mod attributes;
pub mod classifier;
pub mod clause;
pub mod types;

pub use classifier::{Classification, Classifier, KeywordClassifier, KeywordTable};
pub use clause::{Clause, split_clauses};
pub use types::*;

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::DesignOptions;
use crate::error::ExtractionError;

/// Attribute naming the 1-based step an entity jumps back to.
pub const GOTO_STEP_ATTRIBUTE: &str = "gotoStep";
pub const REFERENCE_IMAGE_ATTRIBUTE: &str = "referenceImage";
pub const REFERENCE_FILE_ATTRIBUTE: &str = "referenceFile";

static GOTO_STEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:go back to|return to|loop back to|repeat|jump to)\s+step\s+(\d+)$")
        .expect("goto regex is valid")
});

static ATTACH_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:attach|include the attachment|include the file)\b")
        .expect("attach regex is valid")
});

static LEADING_CONNECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:only when|only if|whenever|when|unless|if)\s+")
        .expect("leading connector regex is valid")
});

static LEADING_ARTICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:a|an|the)\s+").expect("article regex is valid"));

const IMAGE_WORDS: &[&str] = &["screenshot", "image", "picture", "photo"];
const FILE_WORDS: &[&str] = &["file", "document", "attachment", "pdf"];

/// Extract entities with the default keyword classifier and limits.
pub fn extract(raw_text: &str, attachments: &[Attachment]) -> Result<Vec<Entity>, ExtractionError> {
    Extractor::default().extract(raw_text, attachments)
}

/// Clause splitter + pluggable classifier + attachment binding.
pub struct Extractor {
    classifier: Box<dyn Classifier>,
    max_attachment_bytes: u64,
}

impl Default for Extractor {
    fn default() -> Self {
        Extractor::from_options(&DesignOptions::default())
    }
}

/// What a clause turned into.
enum ClauseRole {
    /// Produced the entity at this index.
    Entity(usize),
    /// A directive bound to the nearest preceding entity, if any.
    Directive(Option<usize>),
}

impl Extractor {
    pub fn new(classifier: Box<dyn Classifier>) -> Self {
        Extractor {
            classifier,
            max_attachment_bytes: DesignOptions::default().max_attachment_bytes,
        }
    }

    pub fn from_options(options: &DesignOptions) -> Self {
        Extractor {
            classifier: Box::new(KeywordClassifier::new(options.keywords.clone())),
            max_attachment_bytes: options.max_attachment_bytes,
        }
    }

    pub fn with_max_attachment_bytes(mut self, limit: u64) -> Self {
        self.max_attachment_bytes = limit;
        self
    }

    pub fn extract(
        &self,
        raw_text: &str,
        attachments: &[Attachment],
    ) -> Result<Vec<Entity>, ExtractionError> {
        if raw_text.trim().is_empty() && attachments.is_empty() {
            return Err(ExtractionError::EmptyInput);
        }
        for attachment in attachments {
            if attachment.byte_size > self.max_attachment_bytes {
                return Err(ExtractionError::AttachmentTooLarge {
                    name: attachment.name.clone(),
                    byte_size: attachment.byte_size,
                    limit: self.max_attachment_bytes,
                });
            }
        }

        let clauses = split_clauses(raw_text);
        let mut entities: Vec<Entity> = Vec::new();
        let mut roles = Vec::with_capacity(clauses.len());

        for clause in &clauses {
            let preceding = entities.len().checked_sub(1);

            if let Some(caps) = GOTO_STEP.captures(&clause.text) {
                match preceding {
                    Some(idx) => {
                        entities[idx]
                            .attributes
                            .insert(GOTO_STEP_ATTRIBUTE.to_string(), caps[1].to_string());
                    }
                    None => debug!(clause = %clause.text, "step reference with no preceding entity ignored"),
                }
                roles.push(ClauseRole::Directive(preceding));
                continue;
            }

            if ATTACH_DIRECTIVE.is_match(&clause.text) {
                roles.push(ClauseRole::Directive(preceding));
                continue;
            }

            let classification = self.classifier.classify(clause);
            let label = entity_label(&clause.text);
            entities.push(Entity {
                kind: classification.kind,
                attributes: attributes::heuristic_attributes(classification.kind, &label),
                label,
                source_span: Some(clause.span),
                confidence: classification.confidence,
            });
            roles.push(ClauseRole::Entity(entities.len() - 1));
        }

        for attachment in attachments {
            let owner = clauses
                .iter()
                .zip(&roles)
                .filter(|(clause, _)| mentions(clause, attachment))
                .find_map(|(_, role)| match role {
                    ClauseRole::Entity(idx) => Some(*idx),
                    ClauseRole::Directive(idx) => *idx,
                })
                .or_else(|| entities.len().checked_sub(1));

            match owner {
                Some(idx) => bind_attachment(&mut entities[idx], attachment),
                None => debug!(attachment = %attachment.name, "attachment has no clause to bind to"),
            }
        }

        debug!(
            clauses = clauses.len(),
            entities = entities.len(),
            attachments = attachments.len(),
            "extraction finished"
        );

        Ok(entities)
    }
}

/// Clause text without its leading connector and one leading article.
fn entity_label(text: &str) -> String {
    let without_connector = LEADING_CONNECTOR.replace(text, "");
    let without_article = LEADING_ARTICLE.replace(&without_connector, "");
    let label = without_article.trim();
    if label.is_empty() {
        text.trim().to_string()
    } else {
        label.to_string()
    }
}

fn mentions(clause: &Clause, attachment: &Attachment) -> bool {
    let text = clause.text.to_lowercase();
    let name = attachment.name.to_lowercase();
    let stem = attachment.stem().to_lowercase();
    if text.contains(&name) || (stem.len() >= 3 && text.contains(&stem)) {
        return true;
    }
    let media_words = if attachment.is_image() {
        IMAGE_WORDS
    } else {
        FILE_WORDS
    };
    clause
        .words()
        .iter()
        .any(|word| media_words.iter().any(|m| word.trim_end_matches('s') == *m))
}

fn bind_attachment(entity: &mut Entity, attachment: &Attachment) {
    let key = if attachment.is_image() {
        REFERENCE_IMAGE_ATTRIBUTE
    } else {
        REFERENCE_FILE_ATTRIBUTE
    };
    entity
        .attributes
        .entry(key.to_string())
        .and_modify(|names| {
            names.push_str(", ");
            names.push_str(&attachment.name);
        })
        .or_insert_with(|| attachment.name.clone());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_drops_connector_and_article() {
        assert_eq!(entity_label("When a new email arrives"), "new email arrives");
        assert_eq!(entity_label("If the amount is over 100"), "amount is over 100");
        assert_eq!(entity_label("send a Slack message"), "send a Slack message");
        assert_eq!(entity_label("when"), "when");
    }

    #[test]
    fn empty_input_without_attachments_fails() {
        assert_eq!(extract("   \n", &[]), Err(ExtractionError::EmptyInput));
    }

    #[test]
    fn empty_input_with_attachments_yields_no_entities() {
        let files = [Attachment::new("flow.png", 10, "image/png")];
        assert_eq!(extract("", &files), Ok(vec![]));
    }

    #[test]
    fn oversized_attachment_is_rejected() {
        let files = [Attachment::new("huge.bin", 100, "application/octet-stream")];
        let err = Extractor::default()
            .with_max_attachment_bytes(10)
            .extract("send it", &files)
            .unwrap_err();
        assert_eq!(err.code(), "AttachmentTooLarge");
    }

    #[test]
    fn attach_directive_binds_to_preceding_action() {
        let files = [Attachment::new("error.png", 2048, "image/png")];
        let entities = extract(
            "When a build fails, post to #ops, attach screenshot",
            &files,
        )
        .unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[1].attribute(REFERENCE_IMAGE_ATTRIBUTE), Some("error.png"));
    }

    #[test]
    fn attachment_binds_to_clause_naming_it() {
        let files = [Attachment::new("report.pdf", 4096, "application/pdf")];
        let entities = extract(
            "Every Friday, email report.pdf to boss@example.com, then post to Slack",
            &files,
        )
        .unwrap();
        assert_eq!(entities[1].attribute(REFERENCE_FILE_ATTRIBUTE), Some("report.pdf"));
        assert_eq!(entities[2].attribute(REFERENCE_FILE_ATTRIBUTE), None);
    }

    #[test]
    fn unmentioned_attachments_go_to_last_entity() {
        let files = [
            Attachment::new("a.csv", 1, "text/csv"),
            Attachment::new("b.csv", 1, "text/csv"),
        ];
        let entities = extract("When a row is added, update the CRM", &files).unwrap();
        assert_eq!(entities[1].attribute(REFERENCE_FILE_ATTRIBUTE), Some("a.csv, b.csv"));
    }

    #[test]
    fn step_reference_becomes_attribute() {
        let entities = extract(
            "Send a Slack message, then create a ticket, then go back to step 1",
            &[],
        )
        .unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[1].attribute(GOTO_STEP_ATTRIBUTE), Some("1"));
    }

    struct EverythingIsATrigger;

    impl Classifier for EverythingIsATrigger {
        fn classify(&self, _clause: &Clause) -> Classification {
            Classification::new(EntityKind::Trigger, 0.5)
        }
    }

    #[test]
    fn classifier_is_swappable() {
        let extractor = Extractor::new(Box::new(EverythingIsATrigger));
        let entities = extractor.extract("send a message, create a doc", &[]).unwrap();
        assert!(entities.iter().all(|e| e.kind == EntityKind::Trigger));
    }
}
