//! Heuristic attribute extraction over entity labels.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::types::EntityKind;

/// Platform names recognised in labels, with the canonical value stored.
const SERVICES: &[(&str, &str)] = &[
    ("slack", "slack"),
    ("gmail", "gmail"),
    ("email", "email"),
    ("e-mail", "email"),
    ("mail", "email"),
    ("sheets", "sheets"),
    ("spreadsheet", "sheets"),
    ("trello", "trello"),
    ("jira", "jira"),
    ("github", "github"),
    ("discord", "discord"),
    ("teams", "teams"),
    ("notion", "notion"),
    ("airtable", "airtable"),
    ("stripe", "stripe"),
    ("webhook", "webhook"),
    ("sms", "sms"),
];

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+").expect("email regex is valid")
});

static CHANNEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)(#[\w-]+)").expect("channel regex is valid"));

static SCHEDULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(every\s+\w+(?:\s+at\s+[\w:]+)?|daily|hourly|weekly|monthly)\b")
        .expect("schedule regex is valid")
});

static COMPARISON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:the\s+)?(?P<subject>.+?)\s+(?:is\s+)?(?P<op>greater than or equal to|less than or equal to|more than|greater than|less than|at least|at most|over|above|exceeds|under|below|equals|equal to|is)\s+(?P<value>.+)$",
    )
    .expect("comparison regex is valid")
});

/// Attributes derived from the label alone.
pub(crate) fn heuristic_attributes(kind: EntityKind, label: &str) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();

    if let Some(service) = detect_service(label) {
        attributes.insert("service".to_string(), service.to_string());
    }

    if let Some(m) = EMAIL.find(label) {
        attributes.insert("recipient".to_string(), m.as_str().to_string());
    } else if let Some(caps) = CHANNEL.captures(label) {
        attributes.insert("recipient".to_string(), caps[1].to_string());
    }

    match kind {
        EntityKind::Trigger => {
            if let Some(m) = SCHEDULE.find(label) {
                attributes.insert("schedule".to_string(), m.as_str().to_lowercase());
            }
        }
        EntityKind::Condition => {
            if let Some(comparison) = parse_comparison(label) {
                attributes.insert("subject".to_string(), comparison.subject);
                attributes.insert("operator".to_string(), comparison.operator.to_string());
                attributes.insert("value".to_string(), comparison.value);
            }
        }
        EntityKind::Action => {}
    }

    attributes
}

fn detect_service(label: &str) -> Option<&'static str> {
    let lower = label.to_lowercase();
    lower
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .find_map(|word| {
            SERVICES
                .iter()
                .find(|(name, _)| *name == word)
                .map(|(_, canonical)| *canonical)
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Comparison {
    pub subject: String,
    pub operator: &'static str,
    pub value: String,
}

pub(crate) fn parse_comparison(label: &str) -> Option<Comparison> {
    let caps = COMPARISON.captures(label)?;
    let operator = match caps["op"].to_lowercase().as_str() {
        "more than" | "greater than" | "over" | "above" | "exceeds" => ">",
        "less than" | "under" | "below" => "<",
        "at least" | "greater than or equal to" => ">=",
        "at most" | "less than or equal to" => "<=",
        _ => "==",
    };
    Some(Comparison {
        subject: caps["subject"].trim().to_string(),
        operator,
        value: caps["value"].trim().to_string(),
    })
}
