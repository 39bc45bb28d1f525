//! Prompt rendering for schema-driven extraction

use crate::schema::{TargetSchema, NOT_FOUND_SENTINEL};

/// Render the system prompt for a target schema.
///
/// The schema is embedded as pretty JSON in field order, so identical schemas
/// always produce identical prompts.
pub fn render_system_prompt(schema: &TargetSchema) -> String {
    let schema_json =
        serde_json::to_string_pretty(schema).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"You are an intelligent document extraction AI.

Your task is to extract information from the document text based on the USER DEFINED SCHEMA below.

USER SCHEMA DEFINITION:
{schema_json}

INSTRUCTIONS:
1. Look at the 'description' for each field to understand what to look for.
2. Check 'required':
   - If 'required' is true and the data is missing, try your best to infer it, otherwise return "{NOT_FOUND_SENTINEL}".
   - If 'required' is false and the data is missing, return null.
3. Every field of the schema must appear as a key in the output. Fields of type 'array' with an 'items_structure' are lists of objects with exactly those keys.
4. Output format: return ONLY a clean JSON object containing the extracted data (key-value).
   Do not include the descriptions in the output, just the values.
5. No markdown formatting and no text outside the JSON object."#
    )
}

/// Render the user prompt carrying the recognized text
pub fn render_user_prompt(text: &str) -> String {
    format!("DOCUMENT TEXT:\n{}", text)
}
