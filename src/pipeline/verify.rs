//! Extraction verification gate.

use std::sync::Arc;

use super::problem::ProblemStatement;
use crate::image::ImageData;
use crate::llm::{ModelCaller, ModelRequest, ResponseShape};
use crate::prompts;

/// Single-shot verifier checking an extraction against the source screenshots.
pub struct Verifier {
    caller: Arc<dyn ModelCaller>,
    model: String,
}

impl Verifier {
    pub fn new(caller: Arc<dyn ModelCaller>, model: impl Into<String>) -> Self {
        Self {
            caller,
            model: model.into(),
        }
    }

    /// Check the statement against the screenshots.
    ///
    /// Never fails: internal errors and any answer other than the exact
    /// `true` token degrade to `false`, which re-triggers extraction rather
    /// than risking an unverified statement flowing downstream.
    pub async fn verify(&self, images: &[ImageData], statement: &ProblemStatement) -> bool {
        let request = ModelRequest::new(
            images,
            prompts::VERIFY_SYSTEM,
            prompts::verify_user(statement),
            self.model.as_str(),
            ResponseShape::Text,
        );

        match self.caller.ask(&request).await {
            Ok(response) => Self::parse(&response),
            Err(e) => {
                tracing::warn!("Verification call failed, treating as not verified: {}", e);
                false
            }
        }
    }

    fn parse(response: &str) -> bool {
        let verified = response.trim().eq_ignore_ascii_case("true");
        if !verified {
            tracing::debug!("Verification answered {:?}", response.trim());
        }
        verified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_only_true_token_passes() {
        assert!(Verifier::parse("true"));
        assert!(Verifier::parse(" True \n"));
        assert!(!Verifier::parse("false"));
        assert!(!Verifier::parse("yes"));
        assert!(!Verifier::parse("true, the extraction matches"));
        assert!(!Verifier::parse(""));
    }
}
