//! Solver configuration.
//!
//! An explicit configuration object handed to the orchestrator at
//! construction; there is no process-wide mutable client or model state.
//! Environment variables provide initial defaults for the CLI.

use serde::{Deserialize, Serialize};

/// Default roster for the pro-mode generation fan-out. Entries may repeat
/// the same model.
const DEFAULT_ROSTER: &[&str] = &[
    "anthropic/claude-sonnet-4",
    "openai/gpt-4o",
    "google/gemini-2.5-pro",
];

/// Configuration for one solve pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Model used for the coding/general classification call.
    pub classifier_model: String,
    /// Model used for structured problem extraction.
    pub extractor_model: String,
    /// Model used for the extraction verification gate.
    pub verifier_model: String,
    /// Model used for direct answers (fast mode and the general branch).
    pub answer_model: String,
    /// Fixed roster for the generation fan-out; its length is N.
    pub generation_roster: Vec<String>,
    /// Maximum extraction/verification attempts before a fatal abort.
    pub max_extraction_attempts: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            classifier_model: "google/gemini-2.5-flash".to_string(),
            extractor_model: "google/gemini-2.5-pro".to_string(),
            verifier_model: "google/gemini-2.5-flash".to_string(),
            answer_model: "anthropic/claude-sonnet-4".to_string(),
            generation_roster: DEFAULT_ROSTER.iter().map(|s| s.to_string()).collect(),
            max_extraction_attempts: 3,
        }
    }
}

impl SolverConfig {
    /// Build a config from environment variables, falling back to defaults:
    /// - `SNAPSOLVE_CLASSIFIER_MODEL`
    /// - `SNAPSOLVE_EXTRACTOR_MODEL`
    /// - `SNAPSOLVE_VERIFIER_MODEL`
    /// - `SNAPSOLVE_ANSWER_MODEL`
    /// - `SNAPSOLVE_ROSTER` (comma-separated model ids)
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(v) = std::env::var("SNAPSOLVE_CLASSIFIER_MODEL") {
            config.classifier_model = v;
        }
        if let Ok(v) = std::env::var("SNAPSOLVE_EXTRACTOR_MODEL") {
            config.extractor_model = v;
        }
        if let Ok(v) = std::env::var("SNAPSOLVE_VERIFIER_MODEL") {
            config.verifier_model = v;
        }
        if let Ok(v) = std::env::var("SNAPSOLVE_ANSWER_MODEL") {
            config.answer_model = v;
        }
        if let Ok(v) = std::env::var("SNAPSOLVE_ROSTER") {
            let roster: Vec<String> = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !roster.is_empty() {
                config.generation_roster = roster;
            }
        }
        config
    }

    /// Number of concurrent candidates in the fan-out stages.
    pub fn fanout_width(&self) -> usize {
        self.generation_roster.len()
    }
}
