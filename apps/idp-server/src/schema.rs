//! Target schema model
//!
//! Describes the fields a caller wants extracted from a document. A schema is
//! either supplied per request as JSON (`schema_config`) or falls back to the
//! built-in invoice schema.
//!
//! Any well-formed JSON is accepted as a caller schema. Two layouts yield
//! typed fields:
//!
//! - an object mapping field name to descriptor
//!   (`{"total": {"type": "number", "required": true}}`)
//! - an array of descriptors carrying a `key`
//!   (`[{"key": "total", "type": "NUMBER", "required": true}]`)
//!
//! The caller's JSON is kept verbatim and is what the prompt embeds and the
//! response echoes.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::InvalidInput;

/// Placeholder the parser emits when a required field cannot be located.
pub const NOT_FOUND_SENTINEL: &str = "NOT_FOUND";

/// Value kind of a target field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
    /// Missing or unrecognized `type`
    Any,
}

impl FieldKind {
    /// Map a caller's type label, ignoring case
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "string" | "str" | "text" | "date" => Self::String,
            "number" | "integer" | "int" | "float" | "decimal" => Self::Number,
            "boolean" | "bool" => Self::Boolean,
            "array" | "list" => Self::Array,
            "object" => Self::Object,
            _ => Self::Any,
        }
    }
}

/// Description of a single target field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub description: String,
    pub required: bool,
    /// Shape of array elements: element key -> description
    #[serde(
        rename = "items_structure",
        skip_serializing_if = "Option::is_none",
        serialize_with = "ordered_map::serialize_option"
    )]
    pub item_structure: Option<Vec<(String, String)>>,
}

impl FieldDescriptor {
    pub fn new(kind: FieldKind, description: &str, required: bool) -> Self {
        Self {
            kind,
            description: description.to_string(),
            required,
            item_structure: None,
        }
    }

    pub fn with_item_structure(mut self, items: &[(&str, &str)]) -> Self {
        self.item_structure = Some(
            items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    /// Read a descriptor from caller JSON, defaulting whatever is absent.
    ///
    /// A bare string is taken as the description.
    fn from_value(value: &Value) -> Self {
        let descriptor = match value {
            Value::Object(map) => map,
            Value::String(description) => return Self::new(FieldKind::Any, description, false),
            _ => return Self::new(FieldKind::Any, "", false),
        };

        Self {
            kind: descriptor
                .get("type")
                .and_then(Value::as_str)
                .map_or(FieldKind::Any, FieldKind::from_label),
            description: descriptor
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            required: descriptor
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            item_structure: descriptor
                .get("items_structure")
                .or_else(|| descriptor.get("item_structure"))
                .and_then(Value::as_object)
                .map(item_entries),
        }
    }
}

fn item_entries(items: &Map<String, Value>) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(key, value)| {
            let description = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            (key.clone(), description)
        })
        .collect()
}

/// Ordered mapping of field name to descriptor.
///
/// Order follows the caller's JSON so prompts render deterministically.
/// A repeated field name keeps its first position and its last descriptor.
/// A schema resolved from caller JSON serializes as that JSON.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TargetSchema {
    fields: Vec<(String, FieldDescriptor)>,
    definition: Option<Value>,
}

impl Serialize for TargetSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.definition {
            Some(definition) => definition.serialize(serializer),
            None => ordered_map::serialize(&self.fields, serializer),
        }
    }
}

impl TargetSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a field.
    ///
    /// The schema then serializes from its fields rather than the caller's JSON.
    pub fn insert(&mut self, name: impl Into<String>, descriptor: FieldDescriptor) {
        let name = name.into();
        self.definition = None;
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = descriptor,
            None => self.fields.push((name, descriptor)),
        }
    }

    pub fn with_field(mut self, name: &str, descriptor: FieldDescriptor) -> Self {
        self.insert(name, descriptor);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, descriptor)| descriptor)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields.iter().map(|(name, d)| (name.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Caller JSON this schema was resolved from, if any
    pub fn definition(&self) -> Option<&Value> {
        self.definition.as_ref()
    }

    /// Built-in invoice schema used when the caller supplies none
    pub fn default_invoice() -> Self {
        Self::new()
            .with_field(
                "vendor_name",
                FieldDescriptor::new(
                    FieldKind::String,
                    "Name of the company/store issuing the invoice",
                    true,
                ),
            )
            .with_field(
                "invoice_date",
                FieldDescriptor::new(
                    FieldKind::String,
                    "Transaction date in format YYYY-MM-DD",
                    true,
                ),
            )
            .with_field(
                "items",
                FieldDescriptor::new(FieldKind::Array, "List of purchased items", true)
                    .with_item_structure(&[
                        ("name", "Item name"),
                        ("qty", "Item quantity (number)"),
                        ("price", "Unit Price"),
                    ]),
            )
            .with_field(
                "po_number",
                FieldDescriptor::new(
                    FieldKind::String,
                    "Purchase Order number associated with the invoice if available",
                    false,
                ),
            )
            .with_field(
                "total_amount",
                FieldDescriptor::new(
                    FieldKind::Number,
                    "Final total amount to be paid as per the invoice (including taxes, fees)",
                    true,
                ),
            )
    }

    /// Build a schema from caller JSON, keeping the JSON for echo.
    ///
    /// Objects map names to descriptors. Arrays contribute each element with a
    /// non-blank string `key`. Other values carry no typed fields.
    pub fn from_definition(definition: Value) -> Self {
        let mut schema = Self::new();
        match &definition {
            Value::Object(fields) => {
                for (name, descriptor) in fields {
                    schema.insert(name.as_str(), FieldDescriptor::from_value(descriptor));
                }
            }
            Value::Array(elements) => {
                for element in elements {
                    let key = element.get("key").and_then(Value::as_str).map(str::trim);
                    if let Some(key) = key.filter(|key| !key.is_empty()) {
                        schema.insert(key, FieldDescriptor::from_value(element));
                    }
                }
            }
            _ => {}
        }
        schema.definition = Some(definition);
        schema
    }

    /// Resolve the schema for a request.
    ///
    /// `None` or blank input yields the default invoice schema. Only JSON
    /// syntax errors are rejected.
    pub fn resolve(schema_config: Option<&str>) -> Result<Self, InvalidInput> {
        let raw = match schema_config.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(Self::default_invoice()),
        };

        let definition: Value =
            serde_json::from_str(raw).map_err(|_| InvalidInput::MalformedSchema)?;
        Ok(Self::from_definition(definition))
    }
}

/// Serializes `Vec<(String, T)>` as an ordered JSON object
mod ordered_map {
    use serde::ser::{Serialize, SerializeMap, Serializer};

    pub fn serialize<S, T>(entries: &[(String, T)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn serialize_option<S, T>(
        entries: &Option<Vec<(String, T)>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match entries {
            Some(entries) => serialize(entries, serializer),
            None => serializer.serialize_none(),
        }
    }
}
