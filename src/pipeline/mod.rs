//! The pro-mode solving pipeline.
//!
//! Stages, leaf-first: classification, extraction, verification, generation
//! fan-out, selection. The orchestrator sequences them and streams progress
//! snapshots to an observer.

mod classify;
mod extract;
mod fast;
mod generate;
mod orchestrator;
mod problem;
#[cfg(test)]
pub(crate) mod testutil;
mod verify;

pub use classify::{Classifier, ContentKind};
pub use extract::{ExtractError, Extractor};
pub use fast::{answer_direct, solve_fast, AnswerCandidate};
pub use generate::{CandidateStatus, CandidateUpdateFn, SolutionCandidate, SolutionGenerator};
pub use orchestrator::{
    select_best, CodeSolution, Orchestrator, RunResult, Selection, SolveData,
};
pub use problem::{ProblemExample, ProblemStatement};
pub use verify::Verifier;

/// Strip a markdown code fence around a JSON payload, if present.
///
/// Models asked for strict JSON still frequently wrap the object in
/// ```` ```json ```` fences.
pub(crate) fn strip_json_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the optional language tag, whether or not the opening fence line
    // has a newline after it.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences() {
        assert_eq!(strip_json_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_json_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_json_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_json_fences("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_json_fences("```json {\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_json_fences("```{\"a\":1}```"), "{\"a\":1}");
    }
}
