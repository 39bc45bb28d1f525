//! LLM Module
//!
//! Maps recognized document text onto a [`TargetSchema`](crate::schema::TargetSchema)
//! using a generative model with deterministic decoding.

mod client;
mod parser;
mod prompt;
mod types;

pub use client::ChatCompletionsParser;
pub use parser::{conform_to_schema, decode_object, StructuredParser};
pub use prompt::{render_system_prompt, render_user_prompt};
pub use types::LlmError;

#[cfg(test)]
pub(crate) use parser::MockParser;
