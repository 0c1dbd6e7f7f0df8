//! # Snapsolve
//!
//! Analyzes screenshots of a technical problem statement and produces a
//! solution, in either a single-model "fast" mode or a multi-stage "pro"
//! mode.
//!
//! ## Pro-mode pipeline
//!
//! ```text
//!   screenshots
//!        │
//!        ▼
//!   ┌──────────┐     general     ┌───────────────────┐
//!   │ Classify ├────────────────▶│ N direct answers  │
//!   └────┬─────┘                 └───────────────────┘
//!        │ coding
//!        ▼
//!   ┌─────────────────────┐  ≤3 attempts
//!   │ Extract ⇄ Verify    │
//!   └────┬────────────────┘
//!        ▼
//!   ┌─────────────────────┐
//!   │ N-way generation    │──▶ per-example testing
//!   └────┬────────────────┘
//!        ▼
//!   lowest-index selection ──▶ RunResult
//! ```
//!
//! Progress snapshots stream to a [`progress::ProgressSink`] throughout,
//! tagged with the originating run id.
//!
//! ## Modules
//! - `pipeline`: the orchestrator and its stages
//! - `llm`: the model-call abstraction and the OpenRouter client
//! - `sandbox`: local code execution for example testing
//! - `progress`: run-state snapshots and observer plumbing

pub mod config;
pub mod image;
pub mod llm;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod sandbox;

pub use config::SolverConfig;
pub use image::ImageData;
pub use pipeline::{Orchestrator, RunResult};
pub use progress::{ProgressSink, RunState};
