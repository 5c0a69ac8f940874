//! Verified plugin input handed to the downstream runner.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::settings::{DecodedSettings, PluginSettings};

/// A webhook payload that passed signature verification.
///
/// The wrapped object never carries the `signature` field, and its
/// `settings` entry is always the defaulted settings object that
/// [`PluginInput::settings`] was decoded from.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginInput {
    payload: Map<String, Value>,
    settings: PluginSettings,
}

impl PluginInput {
    /// Build an input from a payload whose signature was already stripped.
    ///
    /// The `settings` entry is overwritten with the decoded settings object,
    /// keeping its position in the payload.
    pub fn new(mut payload: Map<String, Value>, decoded: DecodedSettings) -> Self {
        payload.shift_remove("signature");
        payload.insert("settings".to_string(), decoded.value);
        Self {
            payload,
            settings: decoded.settings,
        }
    }

    /// Decoded settings.
    pub fn settings(&self) -> &PluginSettings {
        &self.settings
    }

    /// The full payload object, as forwarded downstream.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    pub fn into_payload(self) -> Map<String, Value> {
        self.payload
    }

    pub fn state_id(&self) -> Option<&str> {
        self.str_field("stateId")
    }

    pub fn event_name(&self) -> Option<&str> {
        self.str_field("eventName")
    }

    pub fn git_ref(&self) -> Option<&str> {
        self.str_field("ref")
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

impl Serialize for PluginInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.payload.serialize(serializer)
    }
}
