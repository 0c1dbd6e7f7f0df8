//! Run orchestration: state machine, retry/selection policies, progress.
//!
//! One orchestrator instance owns one run. States:
//! Idle -> Classifying -> { ExtractingVerifying | AnsweringGeneral } ->
//! Selecting (coding only) -> Done. Any unrecovered error transitions
//! directly to Done with `success = false`; every path reaches a terminal
//! progress emission, so observers are never left waiting.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::classify::{Classifier, ContentKind};
use super::extract::Extractor;
use super::fast::{answer_direct, AnswerCandidate};
use super::generate::{CandidateStatus, SolutionCandidate, SolutionGenerator};
use super::problem::ProblemStatement;
use super::verify::Verifier;
use crate::config::SolverConfig;
use crate::image::ImageData;
use crate::llm::ModelCaller;
use crate::progress::{ProgressReporter, ProgressSink};
use crate::sandbox::SandboxSpawner;

/// Which candidate won and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub slot: usize,
    pub reason: String,
}

/// The code payload handed back on the coding branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSolution {
    pub approach: String,
    pub code: String,
    pub time_complexity: String,
    pub space_complexity: String,
    pub tests_passed: u32,
    pub tests_total: u32,
}

/// Branch-dependent result payload, discriminated once at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SolveData {
    /// Coding branch: the verified problem plus the selected solution.
    Code {
        problem: ProblemStatement,
        solution: CodeSolution,
    },
    /// General branch: the full per-candidate answer array, verbatim.
    Answers { results: Vec<AnswerCandidate> },
}

/// Terminal output of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub run_id: Uuid,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SolveData>,
    /// Present only on the coding branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<Selection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub finished_at: DateTime<Utc>,
}

/// Typed exit of the extraction/verification loop.
enum LoopExit {
    Verified(ProblemStatement),
    ExtractionExhausted(String),
    VerificationExhausted,
}

/// Progress milestone for extraction attempt k (1-based): 30, 42, 54.
fn extraction_progress(attempt: u32) -> u8 {
    (30 + attempt.saturating_sub(1) * 12).min(64) as u8
}

/// Progress milestone for verification of attempt k: 36, 48, 60.
fn verification_progress(attempt: u32) -> u8 {
    (36 + attempt.saturating_sub(1) * 12).min(64) as u8
}

/// The pro-mode pipeline for a single run.
pub struct Orchestrator {
    config: SolverConfig,
    caller: Arc<dyn ModelCaller>,
    spawner: Arc<dyn SandboxSpawner>,
    reporter: ProgressReporter,
    run_id: Uuid,
}

impl Orchestrator {
    /// Create an orchestrator for one run. The run id is minted here and
    /// tags every progress emission and the final result.
    pub fn new(
        config: SolverConfig,
        caller: Arc<dyn ModelCaller>,
        spawner: Arc<dyn SandboxSpawner>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        let run_id = Uuid::new_v4();
        Self {
            config,
            caller,
            spawner,
            reporter: ProgressReporter::new(sink, run_id),
            run_id,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Run the full pipeline over the captured screenshots.
    ///
    /// Never panics across this boundary: unrecovered errors become a
    /// `success = false` result, and the progress stream always terminates
    /// with either `completed = true` or `error` set.
    pub async fn solve(&self, images: &[ImageData]) -> RunResult {
        match self.solve_inner(images).await {
            Ok(result) => {
                self.reporter.complete("Solve complete");
                result
            }
            Err(e) => {
                let message = format!("{:#}", e);
                tracing::error!("Run {} aborted: {}", self.run_id, message);
                self.reporter.fail(message.clone());
                RunResult {
                    run_id: self.run_id,
                    success: false,
                    data: None,
                    selected: None,
                    error: Some(message),
                    finished_at: Utc::now(),
                }
            }
        }
    }

    async fn solve_inner(&self, images: &[ImageData]) -> anyhow::Result<RunResult> {
        anyhow::ensure!(!images.is_empty(), "No screenshots provided");

        self.reporter
            .step("classifying", 10, "Classifying captured content");
        let classifier =
            Classifier::new(Arc::clone(&self.caller), self.config.classifier_model.as_str());
        let kind = classifier.classify(images).await;
        tracing::info!("Run {} classified as {:?}", self.run_id, kind);

        match kind {
            ContentKind::General => self.answer_general(images).await,
            ContentKind::Coding => self.solve_coding(images).await,
        }
    }

    /// Coding branch: bounded extraction/verification loop, then the
    /// generation fan-out and selection.
    async fn solve_coding(&self, images: &[ImageData]) -> anyhow::Result<RunResult> {
        let max = self.config.max_extraction_attempts.max(1);
        let statement = match self.extract_verified(images, max).await {
            LoopExit::Verified(statement) => statement,
            LoopExit::ExtractionExhausted(message) => {
                anyhow::bail!("Extraction failed after {} attempts: {}", max, message)
            }
            LoopExit::VerificationExhausted => {
                anyhow::bail!(
                    "Verification exhausted: extraction could not be verified in {} attempts",
                    max
                )
            }
        };

        self.reporter.step(
            "verified",
            65,
            format!("Verified extraction of \"{}\"", statement.title),
        );

        let roster = self.config.generation_roster.clone();
        let width = self.config.fanout_width().max(1);
        self.reporter.step(
            "generating",
            70,
            format!("Generating {} candidate solutions", roster.len()),
        );

        let generator = SolutionGenerator::new(
            Arc::clone(&self.caller),
            Arc::clone(&self.spawner),
            roster,
        );
        let candidates = generator
            .generate(&statement, &|snapshot| {
                let terminal = snapshot.iter().filter(|c| c.status.is_terminal()).count();
                let progress = 70 + (20 * terminal / width) as u8;
                self.reporter.candidates(
                    "generating",
                    progress,
                    "Generating candidate solutions",
                    snapshot.to_vec(),
                );
            })
            .await;

        self.reporter
            .step("selecting", 90, "Selecting best candidate");
        let (selection, solution) = select_best(&candidates);
        tracing::info!(
            "Run {} selected slot {} ({})",
            self.run_id,
            selection.slot,
            selection.reason
        );

        // The run completed even if every candidate failed; the payload
        // itself encodes the failure so the caller can render a diagnostic.
        Ok(RunResult {
            run_id: self.run_id,
            success: true,
            data: Some(SolveData::Code {
                problem: statement,
                solution,
            }),
            selected: Some(selection),
            error: None,
            finished_at: Utc::now(),
        })
    }

    /// The extraction/verification loop: at most `max` extraction attempts
    /// and `max` verification checks. Never proceeds with an unverified
    /// statement.
    async fn extract_verified(&self, images: &[ImageData], max: u32) -> LoopExit {
        let extractor =
            Extractor::new(Arc::clone(&self.caller), self.config.extractor_model.as_str());
        let verifier = Verifier::new(Arc::clone(&self.caller), self.config.verifier_model.as_str());

        for attempt in 1..=max {
            self.reporter.step(
                "extracting",
                extraction_progress(attempt),
                format!("Extracting problem (attempt {}/{})", attempt, max),
            );
            let statement = match extractor.extract(images).await {
                Ok(statement) => statement,
                Err(e) => {
                    tracing::warn!("Extraction attempt {}/{} failed: {}", attempt, max, e);
                    if attempt == max {
                        return LoopExit::ExtractionExhausted(e.to_string());
                    }
                    continue;
                }
            };

            self.reporter.step(
                "verifying",
                verification_progress(attempt),
                format!("Verifying extraction (attempt {}/{})", attempt, max),
            );
            if verifier.verify(images, &statement).await {
                return LoopExit::Verified(statement);
            }
            tracing::warn!("Verification rejected extraction attempt {}/{}", attempt, max);
        }

        LoopExit::VerificationExhausted
    }

    /// General branch: fan the raw images out to N concurrent direct-answer
    /// calls. No extraction, verification, or selection.
    async fn answer_general(&self, images: &[ImageData]) -> anyhow::Result<RunResult> {
        let roster = &self.config.generation_roster;
        self.reporter.step(
            "answering",
            40,
            format!("Answering with {} parallel attempts", roster.len()),
        );

        let tasks = roster.iter().enumerate().map(|(slot, model)| async move {
            AnswerCandidate::from_outcome(
                slot,
                answer_direct(self.caller.as_ref(), model, images).await,
            )
        });
        let results = join_all(tasks).await;

        self.reporter.step("answered", 90, "Collected answers");
        Ok(RunResult {
            run_id: self.run_id,
            success: true,
            data: Some(SolveData::Answers { results }),
            selected: None,
            error: None,
            finished_at: Utc::now(),
        })
    }
}

/// Deterministic best-of-N selection.
///
/// Picks the lowest-indexed succeeded candidate. If none succeeded, returns
/// a synthesized failure payload tagged slot 0 so the caller still gets a
/// renderable result.
pub fn select_best(candidates: &[SolutionCandidate]) -> (Selection, CodeSolution) {
    if let Some(winner) = candidates
        .iter()
        .find(|c| c.status == CandidateStatus::Succeeded)
    {
        let selection = Selection {
            slot: winner.slot,
            reason: "lowest-index success".to_string(),
        };
        let solution = CodeSolution {
            approach: winner.approach.clone().unwrap_or_default(),
            code: winner.code.clone().unwrap_or_default(),
            time_complexity: winner
                .time_complexity
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
            space_complexity: winner
                .space_complexity
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
            tests_passed: winner.tests_passed,
            tests_total: winner.tests_total,
        };
        return (selection, solution);
    }

    let summary: Vec<&str> = candidates
        .iter()
        .filter_map(|c| c.error.as_deref())
        .collect();
    let detail = if summary.is_empty() {
        "no candidates produced a solution".to_string()
    } else {
        summary.join("; ")
    };

    (
        Selection {
            slot: 0,
            reason: "all candidates failed".to_string(),
        },
        CodeSolution {
            approach: "All solution attempts failed".to_string(),
            code: format!("// No solution generated: {}", detail),
            time_complexity: "N/A".to_string(),
            space_complexity: "N/A".to_string(),
            tests_passed: 0,
            tests_total: candidates.first().map(|c| c.tests_total).unwrap_or(0),
        },
    )
}
