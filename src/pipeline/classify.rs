//! Coding-vs-general content classification.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::image::ImageData;
use crate::llm::{ModelCaller, ModelRequest, ResponseShape};
use crate::prompts;

/// What kind of content the screenshots show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Coding,
    General,
}

/// Single-shot classifier labeling the input as coding or general.
pub struct Classifier {
    caller: Arc<dyn ModelCaller>,
    model: String,
}

impl Classifier {
    pub fn new(caller: Arc<dyn ModelCaller>, model: impl Into<String>) -> Self {
        Self {
            caller,
            model: model.into(),
        }
    }

    /// Classify the screenshots.
    ///
    /// Anything other than the two exact accepted tokens, including transport
    /// failure, maps to `Coding`: the coding path is the more defensive one,
    /// so misrouting there is the safer failure. The anomaly is logged, never
    /// propagated.
    pub async fn classify(&self, images: &[ImageData]) -> ContentKind {
        let request = ModelRequest::new(
            images,
            prompts::CLASSIFY_SYSTEM,
            prompts::CLASSIFY_USER,
            self.model.as_str(),
            ResponseShape::Text,
        );

        match self.caller.ask(&request).await {
            Ok(response) => Self::parse(&response),
            Err(e) => {
                tracing::warn!("Classification call failed, defaulting to coding: {}", e);
                ContentKind::Coding
            }
        }
    }

    fn parse(response: &str) -> ContentKind {
        match response.trim().to_lowercase().as_str() {
            "coding" => ContentKind::Coding,
            "general" => ContentKind::General,
            other => {
                tracing::warn!(
                    "Unexpected classification token {:?}, defaulting to coding",
                    other
                );
                ContentKind::Coding
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepted_tokens() {
        assert_eq!(Classifier::parse("coding"), ContentKind::Coding);
        assert_eq!(Classifier::parse("general"), ContentKind::General);
        assert_eq!(Classifier::parse("  General \n"), ContentKind::General);
    }

    #[test]
    fn test_parse_ambiguous_defaults_to_coding() {
        assert_eq!(Classifier::parse("maybe"), ContentKind::Coding);
        assert_eq!(Classifier::parse(""), ContentKind::Coding);
        assert_eq!(
            Classifier::parse("This looks like a coding question."),
            ContentKind::Coding
        );
    }
}
