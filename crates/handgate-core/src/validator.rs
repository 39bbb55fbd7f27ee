//! Two-phase message validation
//!
//! Phase A checks the message format (address, arity, argument type and
//! whether the argument looks like JSON). Phase B runs only when phase A
//! passes, decodes the argument and checks the fields the schema cares
//! about. Each phase collects every problem it finds.

use serde_json::{Map, Value as JsonValue};
use std::sync::OnceLock;

use crate::error::{SchemaViolation, ValidationError};
use crate::message::IncomingMessage;
use crate::schema::{EntryKind, SchemaEntry, SchemaRegistry, Side};

/// A positional tracking sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub i: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    /// Read `i`, `x`, `y` and `z` from a JSON object
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        let obj = value.as_object()?;
        let field = |name: &str| obj.get(name).and_then(JsonValue::as_f64);
        Some(Self {
            i: field("i")?,
            x: field("x")?,
            y: field("y")?,
            z: field("z")?,
        })
    }
}

/// Data carried by a tracked-entity message
#[derive(Debug, Clone, PartialEq)]
pub enum HandSample {
    Visibility(bool),
    /// Tracking value, decoded into a [`Position`] only once the gate is open
    Positional(JsonValue),
}

/// A message that passed both validation phases
#[derive(Debug, Clone, PartialEq)]
pub enum Validated {
    Connect {
        connected: bool,
    },
    Tracked {
        side: Side,
        /// First key of the decoded payload
        key: String,
        sample: HandSample,
    },
}

/// Outcome of validating one message
pub type ValidationResult = std::result::Result<Validated, Vec<ValidationError>>;

fn json_object_pattern() -> &'static regex_lite::Regex {
    static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex_lite::Regex::new(r"\{([^}]+)\}").expect("JSON object pattern is valid")
    })
}

/// Whether `s` contains a non-empty `{...}` span
pub fn looks_like_json(s: &str) -> bool {
    json_object_pattern().is_match(s)
}

/// Validates inbound messages against a [`SchemaRegistry`]
#[derive(Debug, Clone)]
pub struct Validator {
    registry: SchemaRegistry,
}

impl Validator {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Run both phases
    pub fn validate(&self, msg: &IncomingMessage) -> ValidationResult {
        let (entry, payload) = self.check_format(msg)?;
        check_values(entry, payload)
    }

    /// Phase A: format checks
    ///
    /// On success returns the schema entry and the decoded payload object.
    pub fn check_format(
        &self,
        msg: &IncomingMessage,
    ) -> std::result::Result<(&SchemaEntry, Map<String, JsonValue>), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let entry = msg.pattern_name().and_then(|name| self.registry.lookup(name));
        if entry.is_none() {
            errors.push(ValidationError::UnrecognizedAddress);
        }

        match msg.args.len() {
            0 => errors.push(ValidationError::EmptyArguments),
            n if n > SchemaEntry::ARG_COUNT => errors.push(ValidationError::TooManyArguments),
            _ => {}
        }

        let text = msg.args.first().and_then(|arg| arg.as_str());
        let payload = match text {
            None => {
                errors.push(ValidationError::NotAString);
                errors.push(ValidationError::MalformedJson);
                None
            }
            Some(text) => {
                let decoded = looks_like_json(text)
                    .then(|| serde_json::from_str::<JsonValue>(text).ok())
                    .flatten();
                match decoded {
                    Some(JsonValue::Object(obj)) => Some(obj),
                    _ => {
                        errors.push(ValidationError::MalformedJson);
                        None
                    }
                }
            }
        };

        match (entry, payload) {
            (Some(entry), Some(payload)) if errors.is_empty() => Ok((entry, payload)),
            _ => Err(errors),
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(SchemaRegistry::default())
    }
}

/// Phase B: value checks against the entry's rule
pub fn check_values(entry: &SchemaEntry, payload: Map<String, JsonValue>) -> ValidationResult {
    let violation = |v: SchemaViolation| vec![ValidationError::SchemaViolation(v)];

    match entry.kind {
        EntryKind::Connect => match payload.get("connected") {
            Some(JsonValue::Bool(connected)) => Ok(Validated::Connect {
                connected: *connected,
            }),
            _ => Err(violation(SchemaViolation::ExpectedBoolean)),
        },
        EntryKind::Tracked { side } => {
            let Some((key, value)) = payload.into_iter().next() else {
                return Err(violation(SchemaViolation::EmptyPayload));
            };

            let sample = if SchemaEntry::is_visibility_key(&key) {
                match value {
                    JsonValue::Bool(visible) => HandSample::Visibility(visible),
                    _ => return Err(violation(SchemaViolation::ExpectedBoolean)),
                }
            } else {
                HandSample::Positional(value)
            };

            Ok(Validated::Tracked { side, key, sample })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_json() {
        assert!(looks_like_json(r#"{"connected": true}"#));
        assert!(looks_like_json(r#"prefix {"a": 1} suffix"#));
        assert!(!looks_like_json("notjson"));
        assert!(!looks_like_json("{}"));
    }

    #[test]
    fn test_position_requires_all_fields() {
        let full = serde_json::json!({"i": 1, "x": 0.1, "y": 0.2, "z": 0.3});
        assert!(Position::from_json(&full).is_some());

        let partial = serde_json::json!({"i": 1, "x": 0.1, "y": 0.2});
        assert!(Position::from_json(&partial).is_none());

        let strings = serde_json::json!({"i": "1", "x": 0.1, "y": 0.2, "z": 0.3});
        assert!(Position::from_json(&strings).is_none());
    }

    #[test]
    fn test_first_key_follows_declaration_order() {
        let validator = Validator::default();
        let msg = IncomingMessage::with_json(
            "/left_hand",
            r#"{"zz_visible": true, "aa": {"i": 0, "x": 0, "y": 0, "z": 0}}"#,
        );
        match validator.validate(&msg) {
            Ok(Validated::Tracked { key, .. }) => assert_eq!(key, "zz_visible"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
