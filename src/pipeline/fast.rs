//! Fast-mode solving and the direct-answer primitive.
//!
//! Fast mode skips the entire pro pipeline: one model call over the raw
//! screenshots, answer back. The pro-mode general branch reuses the same
//! primitive, fanned out across the roster.

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::generate::CandidateStatus;
use crate::image::ImageData;
use crate::llm::{LlmError, ModelCaller, ModelRequest, ResponseShape};
use crate::prompts;

/// One direct-answer attempt in the general-branch fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerCandidate {
    pub slot: usize,
    pub status: CandidateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnswerCandidate {
    pub(crate) fn from_outcome(slot: usize, outcome: Result<String, LlmError>) -> Self {
        match outcome {
            Ok(answer) => Self {
                slot,
                status: CandidateStatus::Succeeded,
                answer: Some(answer),
                error: None,
            },
            Err(e) => Self {
                slot,
                status: CandidateStatus::Failed,
                answer: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Issue one direct "answer the screenshots" request.
pub async fn answer_direct(
    caller: &dyn ModelCaller,
    model: &str,
    images: &[ImageData],
) -> Result<String, LlmError> {
    let request = ModelRequest::new(
        images,
        prompts::ANSWER_SYSTEM,
        prompts::ANSWER_USER,
        model,
        ResponseShape::Text,
    );
    caller.ask(&request).await
}

/// Fast mode: a single-model direct solve, no pipeline.
pub async fn solve_fast(
    caller: &dyn ModelCaller,
    model: &str,
    images: &[ImageData],
) -> anyhow::Result<String> {
    answer_direct(caller, model, images)
        .await
        .context("Fast-mode solve failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_outcome_success() {
        let candidate = AnswerCandidate::from_outcome(1, Ok("42".to_string()));
        assert_eq!(candidate.slot, 1);
        assert_eq!(candidate.status, CandidateStatus::Succeeded);
        assert_eq!(candidate.answer.as_deref(), Some("42"));
        assert!(candidate.error.is_none());
    }

    #[test]
    fn test_from_outcome_failure() {
        let candidate =
            AnswerCandidate::from_outcome(0, Err(LlmError::network_error("down".into())));
        assert_eq!(candidate.status, CandidateStatus::Failed);
        assert!(candidate.answer.is_none());
        assert!(candidate.error.as_deref().unwrap().contains("down"));
    }
}
