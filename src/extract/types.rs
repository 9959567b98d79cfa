//! Types produced by the extraction phase.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Role an entity plays in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Trigger,
    Action,
    Condition,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Trigger => "Trigger",
            EntityKind::Action => "Action",
            EntityKind::Condition => "Condition",
        }
    }

    /// Ordering used when several nodes are ready at once: triggers lead,
    /// guards come before what they guard.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            EntityKind::Trigger => 0,
            EntityKind::Condition => 1,
            EntityKind::Action => 2,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte range into the raw input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }
}

/// A classified clause. Immutable once extraction finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub kind: EntityKind,
    pub label: String,
    pub attributes: BTreeMap<String, String>,
    pub source_span: Option<Span>,
    /// Classifier confidence in `[0, 1]`.
    pub confidence: f32,
}

impl Entity {
    /// Entity with full confidence and no source span. Mostly useful for
    /// callers that assemble entity lists by hand.
    pub fn new(kind: EntityKind, label: impl Into<String>) -> Self {
        Entity {
            kind,
            label: label.into(),
            attributes: BTreeMap::new(),
            source_span: None,
            confidence: 1.0,
        }
    }

    pub fn trigger(label: impl Into<String>) -> Self {
        Entity::new(EntityKind::Trigger, label)
    }

    pub fn action(label: impl Into<String>) -> Self {
        Entity::new(EntityKind::Action, label)
    }

    pub fn condition(label: impl Into<String>) -> Self {
        Entity::new(EntityKind::Condition, label)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Metadata for an uploaded file. Content never enters the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    #[serde(alias = "size")]
    pub byte_size: u64,
    #[serde(alias = "type")]
    pub mime_type: String,
}

impl Attachment {
    pub fn new(name: impl Into<String>, byte_size: u64, mime_type: impl Into<String>) -> Self {
        Attachment {
            name: name.into(),
            byte_size,
            mime_type: mime_type.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }
}
