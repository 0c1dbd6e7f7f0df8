//! Structured problem extraction from screenshots.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::problem::{ProblemExample, ProblemStatement};
use super::strip_json_fences;
use crate::image::ImageData;
use crate::llm::{LlmError, ModelCaller, ModelRequest, ResponseShape};
use crate::prompts;

/// Extraction failure.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("extraction call failed: {0}")]
    Model(#[from] LlmError),
    #[error("extraction response is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("extraction is missing required field: {0}")]
    MissingField(&'static str),
}

/// Lenient wire shape for the extraction response.
///
/// `examples` and `constraints` are taken as raw values and normalized
/// afterwards: a malformed or absent field becomes an empty sequence rather
/// than a failed extraction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExtraction {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    examples: Value,
    #[serde(default)]
    constraints: Value,
    #[serde(default)]
    follow_up: Option<String>,
}

/// Single-shot extractor turning screenshots into a [`ProblemStatement`].
pub struct Extractor {
    caller: Arc<dyn ModelCaller>,
    model: String,
}

impl Extractor {
    pub fn new(caller: Arc<dyn ModelCaller>, model: impl Into<String>) -> Self {
        Self {
            caller,
            model: model.into(),
        }
    }

    /// Extract a structured problem description from the screenshots.
    pub async fn extract(&self, images: &[ImageData]) -> Result<ProblemStatement, ExtractError> {
        let request = ModelRequest::new(
            images,
            prompts::EXTRACT_SYSTEM,
            prompts::EXTRACT_USER,
            self.model.as_str(),
            ResponseShape::Json,
        );

        let response = self.caller.ask(&request).await?;
        Self::parse(&response)
    }

    fn parse(response: &str) -> Result<ProblemStatement, ExtractError> {
        let raw: RawExtraction = serde_json::from_str(strip_json_fences(response))
            .map_err(|e| ExtractError::InvalidJson(e.to_string()))?;

        if raw.title.trim().is_empty() {
            return Err(ExtractError::MissingField("title"));
        }
        if raw.description.trim().is_empty() {
            return Err(ExtractError::MissingField("description"));
        }

        Ok(ProblemStatement {
            title: raw.title,
            description: raw.description,
            examples: normalize_examples(raw.examples),
            constraints: normalize_constraints(raw.constraints),
            follow_up: raw.follow_up.filter(|s| !s.trim().is_empty()),
        })
    }
}

/// Normalize the `examples` field: keep well-formed entries, drop the rest.
fn normalize_examples(value: Value) -> Vec<ProblemExample> {
    let Value::Array(items) = value else {
        if !value.is_null() {
            tracing::warn!("Extraction examples field is not an array, treating as empty");
        }
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<ProblemExample>(item) {
            Ok(example) => Some(example),
            Err(e) => {
                tracing::warn!("Dropping malformed example: {}", e);
                None
            }
        })
        .collect()
}

/// Normalize the `constraints` field to a list of strings.
fn normalize_constraints(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_extraction() {
        let statement = Extractor::parse(
            r#"{
                "title": "Factorial",
                "description": "Compute n!",
                "examples": [{"input": "5", "output": "120"}],
                "constraints": ["0 <= n <= 20"],
                "followUp": "Avoid overflow?"
            }"#,
        )
        .unwrap();
        assert_eq!(statement.title, "Factorial");
        assert_eq!(statement.examples.len(), 1);
        assert_eq!(statement.examples[0].output, "120");
        assert_eq!(statement.constraints, vec!["0 <= n <= 20"]);
        assert_eq!(statement.follow_up.as_deref(), Some("Avoid overflow?"));
    }

    #[test]
    fn test_parse_strips_markdown_fences() {
        let statement = Extractor::parse(
            "```json\n{\"title\": \"T\", \"description\": \"D\"}\n```",
        )
        .unwrap();
        assert_eq!(statement.title, "T");
    }

    #[test]
    fn test_parse_rejects_missing_title() {
        let err = Extractor::parse(r#"{"description": "D"}"#).unwrap_err();
        assert!(matches!(err, ExtractError::MissingField("title")));
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let err = Extractor::parse("I could not read the screenshots.").unwrap_err();
        assert!(matches!(err, ExtractError::InvalidJson(_)));
    }

    #[test]
    fn test_malformed_examples_normalize_to_empty() {
        let statement = Extractor::parse(
            r#"{"title": "T", "description": "D", "examples": "none"}"#,
        )
        .unwrap();
        assert!(statement.examples.is_empty());
    }

    #[test]
    fn test_partially_malformed_examples_keep_good_entries() {
        let statement = Extractor::parse(
            r#"{"title": "T", "description": "D",
                "examples": [{"input": "1", "output": "1"}, {"wrong": true}]}"#,
        )
        .unwrap();
        assert_eq!(statement.examples.len(), 1);
    }
}
