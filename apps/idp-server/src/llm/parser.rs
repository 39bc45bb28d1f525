//! Structured parser trait and output policy

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::types::LlmError;
use crate::schema::{TargetSchema, NOT_FOUND_SENTINEL};

/// Maps recognized text onto a target schema
#[async_trait]
pub trait StructuredParser: Send + Sync {
    /// Check if the backend can currently serve requests
    async fn is_available(&self) -> bool;

    /// Parse `text` into a JSON object shaped by `schema`
    async fn parse_document(&self, text: &str, schema: &TargetSchema) -> Result<Value, LlmError>;
}

/// Decode raw model output.
///
/// The output must be exactly one JSON object. Prose, markdown fences and
/// non-object JSON are rejected rather than repaired.
pub fn decode_object(content: &str) -> Result<Map<String, Value>, LlmError> {
    let value: Value = serde_json::from_str(content.trim())
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse LLM response: {}", e)))?;

    match value {
        Value::Object(object) => Ok(object),
        other => Err(LlmError::InvalidResponse(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

/// Insert keys the model left out: the sentinel for required fields, null
/// for optional ones. Values the model produced are never touched.
pub fn conform_to_schema(mut object: Map<String, Value>, schema: &TargetSchema) -> Map<String, Value> {
    for (name, descriptor) in schema.iter() {
        if !object.contains_key(name) {
            let filler = if descriptor.required {
                Value::String(NOT_FOUND_SENTINEL.to_string())
            } else {
                Value::Null
            };
            object.insert(name.to_string(), filler);
        }
    }
    object
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

/// Mock parser for testing
#[cfg(test)]
pub struct MockParser {
    pub response: Result<Value, String>,
    pub calls: std::sync::atomic::AtomicUsize,
    pub last_schema: parking_lot::Mutex<Option<TargetSchema>>,
}

#[cfg(test)]
impl MockParser {
    pub fn returning(value: Value) -> Self {
        Self {
            response: Ok(value),
            calls: Default::default(),
            last_schema: Default::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: Default::default(),
            last_schema: Default::default(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl StructuredParser for MockParser {
    async fn is_available(&self) -> bool {
        true
    }

    async fn parse_document(&self, _text: &str, schema: &TargetSchema) -> Result<Value, LlmError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        *self.last_schema.lock() = Some(schema.clone());
        self.response.clone().map_err(LlmError::Api)
    }
}
