//! Structured problem description extracted from screenshots.

use serde::{Deserialize, Serialize};

/// One worked example from the problem statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemExample {
    pub input: String,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// The structured extraction result.
///
/// Created by the extractor, read-only afterward. `title` and `description`
/// are guaranteed non-empty after a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemStatement {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub examples: Vec<ProblemExample>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_uses_camel_case() {
        let statement = ProblemStatement {
            title: "Two Sum".to_string(),
            description: "Find two numbers".to_string(),
            examples: vec![],
            constraints: vec![],
            follow_up: Some("Can you do it in one pass?".to_string()),
        };
        let json = serde_json::to_string(&statement).unwrap();
        assert!(json.contains("\"followUp\""));
    }

    #[test]
    fn test_optional_fields_default() {
        let statement: ProblemStatement =
            serde_json::from_str(r#"{"title":"T","description":"D"}"#).unwrap();
        assert!(statement.examples.is_empty());
        assert!(statement.constraints.is_empty());
        assert!(statement.follow_up.is_none());
    }
}
