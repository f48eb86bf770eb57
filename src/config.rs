//! Widget configuration.
//!
//! The host page hands the widget a schema bundle, the JSON the server side
//! renders into the field's `data-schema` attribute:
//! - `name`, `optionUrl`, `multi`, `placeholder`, `disabled`
//! - `value`: the initial `{label, value}` pair, a list of them, or null
//!
//! Everything the widget would otherwise read from ambient page state (the
//! security token, the base URL for relative endpoints) is set here too.

use std::fs;
use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::error::{Result, SuggestError};
use crate::option::FieldValue;

/// Delay between blur and the list closing, so a pointer press on an
/// option is handled before the list disappears.
pub const DEFAULT_BLUR_CLOSE_DELAY: Duration = Duration::from_millis(200);

/// Header carrying the host's security token on search requests
pub const SECURITY_HEADER: &str = "X-SecurityID";

/// Initial selection supplied by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum InitialValue {
    #[default]
    Empty,
    One(FieldValue),
    Many(Vec<FieldValue>),
}

impl InitialValue {
    /// Flatten to the entries worth seeding; tombstones are dropped
    pub fn entries(&self) -> Vec<FieldValue> {
        match self {
            InitialValue::Empty => vec![],
            InitialValue::One(v) => vec![v.clone()],
            InitialValue::Many(vs) => vs.clone(),
        }
        .into_iter()
        .filter(|v| !v.is_tombstone())
        .collect()
    }
}

fn deserialize_initial<'de, D>(deserializer: D) -> std::result::Result<InitialValue, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<InitialValue>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_token<'de, D>(deserializer: D) -> std::result::Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|t| !t.is_empty()).map(SecretString::from))
}

fn deserialize_delay<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let millis: Option<u64> = Option::deserialize(deserializer)?;
    Ok(millis
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_BLUR_CLOSE_DELAY))
}

fn default_delay() -> Duration {
    DEFAULT_BLUR_CLOSE_DELAY
}

/// Configuration bundle a widget is mounted with
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Name of the hidden form field(s) the selection is written to
    #[serde(rename = "name")]
    pub field_name: String,

    /// Search endpoint, absolute or relative to `base_url`
    #[serde(default)]
    pub option_url: String,

    /// Base URL used to resolve a relative `option_url`
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub multi: bool,

    #[serde(default)]
    pub placeholder: String,

    /// DOM id of the option list; generated per mount when absent
    #[serde(default, rename = "id")]
    pub listbox_id: Option<String>,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default, rename = "value", deserialize_with = "deserialize_initial")]
    pub initial_value: InitialValue,

    /// Sent as `X-SecurityID` on every search request
    #[serde(default, deserialize_with = "deserialize_token")]
    pub security_token: Option<SecretString>,

    /// Blur-to-close delay in milliseconds
    #[serde(
        default = "default_delay",
        rename = "blurCloseDelayMs",
        deserialize_with = "deserialize_delay"
    )]
    pub blur_close_delay: Duration,
}

impl WidgetConfig {
    /// Minimal single-mode configuration
    pub fn new(field_name: impl Into<String>, option_url: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            option_url: option_url.into(),
            base_url: None,
            multi: false,
            placeholder: String::new(),
            listbox_id: None,
            disabled: false,
            initial_value: InitialValue::Empty,
            security_token: None,
            blur_close_delay: DEFAULT_BLUR_CLOSE_DELAY,
        }
    }

    pub fn multi(mut self, multi: bool) -> Self {
        self.multi = multi;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_listbox_id(mut self, id: impl Into<String>) -> Self {
        self.listbox_id = Some(id.into());
        self
    }

    pub fn with_initial_value(mut self, value: InitialValue) -> Self {
        self.initial_value = value;
        self
    }

    pub fn with_security_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.security_token = (!token.is_empty()).then(|| SecretString::from(token));
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_blur_close_delay(mut self, delay: Duration) -> Self {
        self.blur_close_delay = delay;
        self
    }

    /// Parse the host's `data-schema` JSON bundle
    pub fn from_schema_json(raw: &str) -> Result<Self> {
        let config: WidgetConfig = serde_json::from_str(raw)?;
        config.validate()
    }

    /// Load a configuration file (YAML, or JSON since YAML is a superset)
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: WidgetConfig = serde_yaml_ng::from_str(&content)?;
        config.validate()
    }

    // Only the field name is required up front; a bad endpoint fails per request.
    fn validate(self) -> Result<Self> {
        if self.field_name.trim().is_empty() {
            return Err(SuggestError::Config(
                "widget configuration requires a field name".to_string(),
            ));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::OptionValue;
    use secrecy::ExposeSecret;
    use std::io::Write;

    #[test]
    fn test_schema_single_with_value() {
        let raw = r#"{
            "name": "MemberID",
            "multi": false,
            "disabled": false,
            "optionUrl": "admin/field/MemberID/search",
            "value": {"value": "12", "label": "Alice", "selected": true}
        }"#;
        let config = WidgetConfig::from_schema_json(raw).unwrap();
        assert_eq!(config.field_name, "MemberID");
        assert!(!config.multi);
        assert_eq!(
            config.initial_value,
            InitialValue::One(FieldValue {
                label: "Alice".to_string(),
                value: Some(OptionValue::from("12")),
            })
        );
        assert_eq!(config.blur_close_delay, DEFAULT_BLUR_CLOSE_DELAY);
    }

    #[test]
    fn test_schema_multi_with_list() {
        let raw = r#"{
            "name": "Tags[]",
            "multi": true,
            "optionUrl": "/search",
            "value": [{"value": 1, "label": "One"}, {"value": 2, "label": "Two"}]
        }"#;
        let config = WidgetConfig::from_schema_json(raw).unwrap();
        assert!(config.multi);
        assert_eq!(config.initial_value.entries().len(), 2);
    }

    #[test]
    fn test_schema_null_value_is_empty() {
        let raw = r#"{"name": "MemberID", "optionUrl": "/search", "value": null}"#;
        let config = WidgetConfig::from_schema_json(raw).unwrap();
        assert_eq!(config.initial_value, InitialValue::Empty);
        assert!(config.initial_value.entries().is_empty());
    }

    #[test]
    fn test_schema_requires_name() {
        let raw = r#"{"name": "  ", "optionUrl": "/search"}"#;
        assert!(matches!(
            WidgetConfig::from_schema_json(raw),
            Err(SuggestError::Config(_))
        ));
    }

    #[test]
    fn test_empty_token_is_none() {
        let raw = r#"{"name": "F", "securityToken": ""}"#;
        let config = WidgetConfig::from_schema_json(raw).unwrap();
        assert!(config.security_token.is_none());

        let config = WidgetConfig::new("F", "/s").with_security_token("abc123");
        assert_eq!(
            config.security_token.as_ref().unwrap().expose_secret(),
            "abc123"
        );
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "name: OwnerID\noptionUrl: /owners/search\nbaseUrl: http://localhost:8080\nblurCloseDelayMs: 50\nplaceholder: Pick an owner"
        )
        .unwrap();

        let config = WidgetConfig::load(file.path()).unwrap();
        assert_eq!(config.field_name, "OwnerID");
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.blur_close_delay, Duration::from_millis(50));
        assert_eq!(config.placeholder, "Pick an owner");
    }
}
