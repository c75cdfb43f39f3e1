// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! PII redaction for audit payloads.
//!
//! Produces a deep copy of a JSON structure with email-like fields masked
//! according to [`EmailMode`] and other sensitive fields replaced by
//! [`REDACTED_MARKER`]. The input is borrowed and never mutated.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

/// Replacement for fully redacted values.
pub const REDACTED_MARKER: &str = "[REDACTED]";

/// Fields that are always fully redacted, regardless of [`EmailMode`].
pub const DEFAULT_SENSITIVE_FIELDS: &[&str] = &["password", "phone", "ssn", "token", "secret"];

/// How email-like fields are redacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmailMode {
    /// Replace the whole address with [`REDACTED_MARKER`].
    Full,
    /// Keep the first character of the local part and the domain:
    /// `alice@example.com` → `a***@example.com`.
    #[default]
    Partial,
}

impl EmailMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailMode::Full => "full",
            EmailMode::Partial => "partial",
        }
    }
}

impl fmt::Display for EmailMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid email redaction mode {0:?} (expected \"full\" or \"partial\")")]
pub struct InvalidEmailMode(pub String);

impl FromStr for EmailMode {
    type Err = InvalidEmailMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(EmailMode::Full),
            "partial" => Ok(EmailMode::Partial),
            other => Err(InvalidEmailMode(other.to_string())),
        }
    }
}

/// Redaction configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionPolicy {
    pub email_mode: EmailMode,
    /// Key fragments (case-insensitive); any key containing one is always
    /// fully redacted.
    pub sensitive_fields: Vec<String>,
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        Self::new(EmailMode::default())
    }
}

impl RedactionPolicy {
    pub fn new(email_mode: EmailMode) -> Self {
        Self {
            email_mode,
            sensitive_fields: DEFAULT_SENSITIVE_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}

/// Applies a [`RedactionPolicy`] to JSON payloads.
#[derive(Debug, Clone)]
pub struct Redactor {
    email_mode: EmailMode,
    sensitive_fields: HashSet<String>,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(RedactionPolicy::default())
    }
}

impl Redactor {
    pub fn new(policy: RedactionPolicy) -> Self {
        Self {
            email_mode: policy.email_mode,
            sensitive_fields: policy
                .sensitive_fields
                .into_iter()
                .map(|f| f.to_lowercase())
                .collect(),
        }
    }

    pub fn email_mode(&self) -> EmailMode {
        self.email_mode
    }

    /// Redacted deep copy of `data`; `None` stays `None`.
    pub fn redact(&self, data: Option<&Value>) -> Option<Value> {
        data.map(|value| self.redact_value(value))
    }

    fn redact_value(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(self.redact_object(map)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.redact_value(v)).collect()),
            scalar => scalar.clone(),
        }
    }

    fn redact_object(&self, map: &Map<String, Value>) -> Map<String, Value> {
        map.iter()
            .map(|(key, value)| {
                let lowered = key.to_lowercase();
                let redacted = if lowered.contains("email") {
                    self.redact_email_value(value)
                } else if self.is_sensitive(&lowered) {
                    redact_full(value)
                } else {
                    self.redact_value(value)
                };
                (key.clone(), redacted)
            })
            .collect()
    }

    fn redact_email_value(&self, value: &Value) -> Value {
        match value {
            Value::String(address) => Value::String(self.mask_email(address)),
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.redact_email_value(v)).collect())
            }
            // Every string leaf under an email-like key is an address
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| {
                        let redacted = if self.is_sensitive(&key.to_lowercase()) {
                            redact_full(value)
                        } else {
                            self.redact_email_value(value)
                        };
                        (key.clone(), redacted)
                    })
                    .collect(),
            ),
            Value::Null => Value::Null,
            _ => Value::String(REDACTED_MARKER.to_string()),
        }
    }

    /// Substring match, like the email rule: `access_token` and
    /// `phoneNumber` are sensitive too.
    fn is_sensitive(&self, lowered_key: &str) -> bool {
        self.sensitive_fields
            .iter()
            .any(|field| lowered_key.contains(field.as_str()))
    }

    fn mask_email(&self, address: &str) -> String {
        match self.email_mode {
            EmailMode::Full => REDACTED_MARKER.to_string(),
            EmailMode::Partial => mask_email_partial(address),
        }
    }
}

fn redact_full(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        _ => Value::String(REDACTED_MARKER.to_string()),
    }
}

/// `alice@example.com` → `a***@example.com`. Values that do not look like an
/// address are fully redacted.
fn mask_email_partial(address: &str) -> String {
    match address.rsplit_once('@') {
        Some((local, domain)) if !domain.is_empty() => match local.chars().next() {
            Some(first) => format!("{first}***@{domain}"),
            None => REDACTED_MARKER.to_string(),
        },
        _ => REDACTED_MARKER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn redactor(mode: EmailMode) -> Redactor {
        Redactor::new(RedactionPolicy::new(mode))
    }

    #[test]
    fn none_maps_to_none() {
        assert_eq!(redactor(EmailMode::Full).redact(None), None);
    }

    #[test]
    fn partial_keeps_prefix_and_domain() {
        let out = redactor(EmailMode::Partial)
            .redact(Some(&json!({"email": "alice@b.com"})))
            .unwrap();
        assert_eq!(out["email"], "a***@b.com");
    }

    #[test]
    fn full_replaces_with_marker() {
        let out = redactor(EmailMode::Full)
            .redact(Some(&json!({"email": "alice@b.com", "name": "Alice"})))
            .unwrap();
        assert_eq!(out["email"], REDACTED_MARKER);
        assert_eq!(out["name"], "Alice");
    }

    #[test]
    fn nested_structures_are_redacted() {
        let input = json!({
            "user": {
                "contactEmail": "bob@corp.io",
                "profile": {"backup_email": ["c@d.org", "e@f.net"]},
                "password": "hunter2"
            },
            "items": [{"email": "g@h.com"}, 42, null],
            "phone": null
        });
        let out = redactor(EmailMode::Partial).redact(Some(&input)).unwrap();
        assert_eq!(out["user"]["contactEmail"], "b***@corp.io");
        assert_eq!(out["user"]["profile"]["backup_email"], json!(["c***@d.org", "e***@f.net"]));
        assert_eq!(out["user"]["password"], REDACTED_MARKER);
        assert_eq!(out["items"], json!([{"email": "g***@h.com"}, 42, null]));
        assert_eq!(out["phone"], Value::Null);
    }

    #[test]
    fn output_is_independent_of_input() {
        let input = json!({"outer": {"inner": ["x", {"email": "a@b.com"}]}});
        let snapshot = input.clone();
        let mut out = redactor(EmailMode::Partial).redact(Some(&input)).unwrap();

        out["outer"]["inner"][1]["email"] = json!("mutated");
        out["outer"]["inner"][0] = json!("mutated");

        assert_eq!(input, snapshot);
    }

    #[test]
    fn strings_inside_objects_under_email_keys_are_masked() {
        let input = json!({
            "email": {"primary": "alice@example.com", "verified": true},
            "contact": {"emails": [{"value": "bob@x.io", "token": "abc"}]}
        });

        let partial = redactor(EmailMode::Partial).redact(Some(&input)).unwrap();
        assert_eq!(partial["email"]["primary"], "a***@example.com");
        assert_eq!(partial["email"]["verified"], REDACTED_MARKER);
        assert_eq!(partial["contact"]["emails"][0]["value"], "b***@x.io");
        assert_eq!(partial["contact"]["emails"][0]["token"], REDACTED_MARKER);

        let full = redactor(EmailMode::Full).redact(Some(&input)).unwrap();
        assert_eq!(full["email"]["primary"], REDACTED_MARKER);
        let rendered = full.to_string();
        assert!(!rendered.contains("alice@example.com"));
        assert!(!rendered.contains("bob@x.io"));
    }

    #[test]
    fn sensitive_fields_match_on_substring() {
        let out = redactor(EmailMode::Partial)
            .redact(Some(&json!({
                "phoneNumber": "+1 555 0100",
                "access_token": "eyJ...",
                "password_hash": "$argon2id$...",
                "username": "ada"
            })))
            .unwrap();
        assert_eq!(out["phoneNumber"], REDACTED_MARKER);
        assert_eq!(out["access_token"], REDACTED_MARKER);
        assert_eq!(out["password_hash"], REDACTED_MARKER);
        assert_eq!(out["username"], "ada");
    }

    #[test]
    fn malformed_addresses_are_fully_redacted() {
        let r = redactor(EmailMode::Partial);
        let out = r
            .redact(Some(&json!({"email": "not-an-address", "other_email": "@b.com", "email_count": 3})))
            .unwrap();
        assert_eq!(out["email"], REDACTED_MARKER);
        assert_eq!(out["other_email"], REDACTED_MARKER);
        assert_eq!(out["email_count"], REDACTED_MARKER);
    }

    #[test]
    fn redaction_is_idempotent() {
        let r = redactor(EmailMode::Partial);
        let once = r.redact(Some(&json!({"email": "alice@b.com"}))).unwrap();
        let twice = r.redact(Some(&once)).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn email_mode_parsing_is_closed() {
        assert_eq!("full".parse::<EmailMode>().unwrap(), EmailMode::Full);
        assert_eq!("partial".parse::<EmailMode>().unwrap(), EmailMode::Partial);
        assert!("FULL".parse::<EmailMode>().is_err());
        assert!("none".parse::<EmailMode>().is_err());
        assert!("".parse::<EmailMode>().is_err());
    }
}
