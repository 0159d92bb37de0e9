//! Agent-card document checks.
//!
//! A card must carry `name`, `version`, `description` and `skills`; it
//! should carry `spiffe_id`, `protocol_version` and `capabilities`. Every
//! skill needs a `name` and should declare an `input_schema`. SPIFFE ids
//! must be `spiffe://` URIs with a trust domain and a path.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static SPIFFE_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^spiffe://[A-Za-z0-9.\-]+(/[A-Za-z0-9._\-]+)+$").unwrap());

const REQUIRED_FIELDS: &[&str] = &["name", "version", "description", "skills"];
const RECOMMENDED_FIELDS: &[&str] = &["spiffe_id", "protocol_version", "capabilities"];

/// Findings for one card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl CardReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn is_valid_spiffe_id(id: &str) -> bool {
    SPIFFE_ID_PATTERN.is_match(id)
}

/// Check a card document. `label` names the card in messages.
pub fn check_card(label: &str, card: &Value) -> CardReport {
    let mut report = CardReport::default();

    let Some(object) = card.as_object() else {
        report.errors.push(format!("Agent '{}' card is not a JSON object", label));
        return report;
    };

    for field in REQUIRED_FIELDS {
        if !object.contains_key(*field) {
            report
                .errors
                .push(format!("Agent '{}' missing required field: {}", label, field));
        }
    }
    for field in RECOMMENDED_FIELDS {
        if object.get(*field).map_or(true, Value::is_null) {
            report
                .warnings
                .push(format!("Agent '{}' missing recommended field: {}", label, field));
        }
    }

    if let Some(spiffe_id) = object.get("spiffe_id").and_then(Value::as_str) {
        if !is_valid_spiffe_id(spiffe_id) {
            report
                .errors
                .push(format!("Agent '{}' has malformed spiffe_id: {}", label, spiffe_id));
        }
    }

    match object.get("skills") {
        Some(Value::Array(skills)) => {
            for (i, skill) in skills.iter().enumerate() {
                let name = skill.get("name").and_then(Value::as_str);
                if name.is_none() {
                    report
                        .errors
                        .push(format!("Agent '{}' skill {} missing 'name'", label, i));
                }
                if skill.get("input_schema").is_none() {
                    let skill_label = name.map(str::to_string).unwrap_or_else(|| i.to_string());
                    report.warnings.push(format!(
                        "Agent '{}' skill '{}' missing input_schema",
                        label, skill_label
                    ));
                }
            }
        }
        Some(_) => report
            .errors
            .push(format!("Agent '{}' skills must be a list", label)),
        None => {}
    }

    report
}
