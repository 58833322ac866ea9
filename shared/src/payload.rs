//! Opaque JSON payloads
//!
//! Customer preferences and order instructions are free-form JSON that the
//! backend never interprets. They are stored and returned byte-for-byte.

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use std::fmt;

/// Raw JSON text, validated on construction and round-tripped verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(transparent))]
pub struct OpaquePayload(String);

impl OpaquePayload {
    /// Parse JSON text, keeping the exact input on success
    pub fn parse(text: impl Into<String>) -> Result<Self, serde_json::Error> {
        let text = text.into();
        serde_json::from_str::<&RawValue>(&text)?;
        Ok(Self(text))
    }

    /// Default order instructions when a request carries none
    pub fn default_instructions() -> Self {
        Self(r#"{"special_request":"no"}"#.to_string())
    }

    /// Default customer preferences
    pub fn default_preferences() -> Self {
        Self(r#"{"preferences": true}"#.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for OpaquePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for OpaquePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = RawValue::from_string(self.0.clone()).map_err(S::Error::custom)?;
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OpaquePayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        let text = raw.get();
        if text.is_empty() {
            return Err(D::Error::custom("empty JSON payload"));
        }
        Ok(Self(text.to_string()))
    }
}
