//! Structural validation of inbound payloads.
//!
//! Payloads reach the client either already decoded or as serialized JSON
//! text. Validation only checks presence of the named fields; nested objects
//! are re-validated by the caller with [`ValidPayload::nested`].

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Raw payload as delivered by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Serialized JSON text still to be parsed.
    Text(String),
    /// Already decoded JSON.
    Json(Value),
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Payload::Text(text),
            other => Payload::Json(other),
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

/// Reasons an inbound payload is dropped.
#[derive(Debug, Error)]
pub enum MalformedPayload {
    #[error("payload is absent")]
    Absent,

    #[error("payload is not valid JSON: {0}")]
    Undecodable(#[from] serde_json::Error),

    #[error("payload is not an object")]
    NotAnObject,

    #[error("payload is missing required field `{0}`")]
    MissingField(String),

    #[error("field `{field}` is malformed: {reason}")]
    BadField { field: String, reason: String },

    #[error("unknown event `{0}`")]
    UnknownEvent(String),
}

/// A payload that passed [`validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPayload(Value);

impl ValidPayload {
    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.as_object().and_then(|map| map.get(name))
    }

    /// Validate the object stored under `field` with the same rules.
    pub fn nested(&self, field: &str, required: &[&str]) -> Result<ValidPayload, MalformedPayload> {
        let inner = self
            .field(field)
            .ok_or_else(|| MalformedPayload::MissingField(field.to_string()))?;
        validate(Some(Payload::Json(inner.clone())), required)
    }

    /// Decode into a strongly typed structure.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, MalformedPayload> {
        Ok(serde_json::from_value(self.0.clone())?)
    }
}

/// Check that `payload` is present, decodable and carries every field in
/// `required`. Only presence is checked, never truthiness.
///
/// With an empty `required` list any non-null JSON value is accepted; as soon
/// as one field is required the payload must be an object.
pub fn validate(payload: Option<Payload>, required: &[&str]) -> Result<ValidPayload, MalformedPayload> {
    let value = match payload {
        None => return Err(MalformedPayload::Absent),
        Some(Payload::Text(text)) => serde_json::from_str::<Value>(&text)?,
        Some(Payload::Json(value)) => value,
    };

    if value.is_null() {
        return Err(MalformedPayload::Absent);
    }

    if required.is_empty() {
        return Ok(ValidPayload(value));
    }

    let map = value.as_object().ok_or(MalformedPayload::NotAnObject)?;
    if let Some(missing) = required.iter().find(|name| !map.contains_key(**name)) {
        return Err(MalformedPayload::MissingField((*missing).to_string()));
    }

    Ok(ValidPayload(value))
}
