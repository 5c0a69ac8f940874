//! Plugin settings schema.
//!
//! Settings arrive as an untyped JSON object inside the webhook payload.
//! Decoding happens in two steps: schema-declared defaults are filled in for
//! absent fields, then the declared fields are validated into
//! [`PluginSettings`]. Fields the schema does not declare are carried along
//! untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Validated plugin settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSettings {
    /// Allow any user to run `/query` against other users, not only admins
    pub allow_public_query: bool,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            allow_public_query: true,
        }
    }
}

/// Result of decoding settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSettings {
    /// Typed view of the declared fields
    pub settings: PluginSettings,
    /// The defaulted settings object, undeclared fields included
    pub value: Value,
}

/// Errors raised while decoding settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings are missing")]
    Missing,

    #[error("settings must be an object, got {0}")]
    NotAnObject(&'static str),

    #[error("invalid settings: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Fill in schema defaults for every field absent from `raw`.
///
/// Non-object values are returned untouched so that [`decode`] can reject
/// them with a meaningful error.
pub fn apply_defaults(raw: Value) -> Value {
    let Value::Object(mut fields) = raw else {
        return raw;
    };

    if let Ok(Value::Object(defaults)) = serde_json::to_value(PluginSettings::default()) {
        for (key, value) in defaults {
            fields.entry(key).or_insert(value);
        }
    }

    Value::Object(fields)
}

/// Validate an already-defaulted settings value.
pub fn decode(value: Value) -> Result<DecodedSettings, SettingsError> {
    match value {
        Value::Object(_) => {
            let settings = PluginSettings::deserialize(&value)?;
            Ok(DecodedSettings { settings, value })
        }
        Value::Null => Err(SettingsError::Missing),
        other => Err(SettingsError::NotAnObject(json_type_name(&other))),
    }
}

/// Decode raw settings, applying defaults first.
pub fn decode_settings(raw: Option<Value>) -> Result<DecodedSettings, SettingsError> {
    let raw = raw.ok_or(SettingsError::Missing)?;
    decode(apply_defaults(raw))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
