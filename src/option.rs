//! Option and form-field value types
//!
//! `SuggestOption` is what the search endpoint returns; `FieldValue` is the
//! `{label, value}` pair the widget writes into the host form. Both keep the
//! option value in the JSON type it arrived in.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{Result, SuggestError};

/// Identifier of an option: a string or a number, as sent by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Number(Number),
    Text(String),
}

impl OptionValue {
    /// Textual form used to compare values and to match hidden fields
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Two values are the same entry when their textual forms match (`"1"` == `1`)
    pub fn same_as(&self, other: &OptionValue) -> bool {
        self.key() == other.key()
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(OptionValue::Text(s.clone())),
            Value::Number(n) => Some(OptionValue::Number(n.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Number(n) => write!(f, "{}", n),
            OptionValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Text(s)
    }
}

impl From<i64> for OptionValue {
    fn from(n: i64) -> Self {
        OptionValue::Number(Number::from(n))
    }
}

/// A selectable entry returned by the search endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestOption {
    pub value: OptionValue,
    pub label: String,
}

impl SuggestOption {
    pub fn new(value: impl Into<OptionValue>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// The `{label, value}` pair mirrored into a hidden form field.
///
/// Field order matters: the server side parses `{"label":…,"value":…}`.
/// A `None` value is the tombstone written when a single selection is cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: Option<OptionValue>,
}

impl FieldValue {
    /// `{label: '', value: null}`: an intentionally emptied selection
    pub fn tombstone() -> Self {
        Self {
            label: String::new(),
            value: None,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    /// JSON encoding written to the hidden input
    pub fn to_field_json(&self) -> String {
        // A struct of a String and an untagged scalar enum always serializes.
        serde_json::to_string(self).unwrap_or_else(|_| String::from(r#"{"label":"","value":null}"#))
    }

    pub fn parse_field_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl From<&SuggestOption> for FieldValue {
    fn from(option: &SuggestOption) -> Self {
        Self {
            label: option.label.clone(),
            value: Some(option.value.clone()),
        }
    }
}

/// Normalize a search endpoint body into options.
///
/// Accepts the canonical `[{value, label}]` array plus the shapes the server
/// side can emit: legacy `{id, name}` objects, bare scalars (value = position)
/// and an object map keyed by value. Entries that cannot be coerced are
/// skipped; a body that is neither an array nor an object is an error.
pub fn normalize_options(body: &Value) -> Result<Vec<SuggestOption>> {
    match body {
        Value::Array(items) => Ok(items
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| coerce_entry(item, OptionValue::from(idx as i64)))
            .collect()),
        Value::Object(map) => Ok(map
            .iter()
            .filter_map(|(key, item)| coerce_entry(item, OptionValue::from(key.as_str())))
            .collect()),
        other => Err(SuggestError::MalformedPayload(format!(
            "expected an array of options, got {}",
            json_kind(other)
        ))),
    }
}

fn coerce_entry(item: &Value, fallback: OptionValue) -> Option<SuggestOption> {
    match item {
        Value::Object(fields) => coerce_object(fields),
        Value::String(s) => Some(SuggestOption {
            value: fallback,
            label: s.clone(),
        }),
        Value::Number(n) => Some(SuggestOption {
            value: fallback,
            label: n.to_string(),
        }),
        _ => {
            tracing::debug!("skipping uncoercible option entry: {item}");
            None
        }
    }
}

fn coerce_object(fields: &Map<String, Value>) -> Option<SuggestOption> {
    let pair = [("value", "label"), ("id", "name")]
        .into_iter()
        .find(|(v, l)| fields.contains_key(*v) && fields.contains_key(*l));

    let Some((value_key, label_key)) = pair else {
        tracing::debug!("skipping option without value/label keys");
        return None;
    };

    let value = OptionValue::from_json(&fields[value_key])?;
    let label = match &fields[label_key] {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        _ => return None,
    };
    Some(SuggestOption { value, label })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
