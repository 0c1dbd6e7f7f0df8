//! Progress reporting for solve runs.
//!
//! The orchestrator pushes [`RunState`] snapshots to a [`ProgressSink`] at
//! every state transition. Every snapshot is tagged with the originating run
//! id so an observer that has moved on to a newer run can drop stale events
//! from an abandoned one.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pipeline::SolutionCandidate;

/// Snapshot of a run's progress, pushed to the observer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    /// Id of the run this snapshot belongs to.
    pub run_id: Uuid,
    pub current_step: String,
    /// Percentage in [0, 100], non-decreasing within a run.
    pub progress: u8,
    pub step_details: String,
    /// Full candidate-slot snapshot, present during generation fan-out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<SolutionCandidate>>,
    /// Set only on fatal abort.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub completed: bool,
}

/// Observer for run progress. Fire-and-forget; no return value is consumed.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, state: &RunState);
}

/// Sink that discards all updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_progress(&self, _state: &RunState) {}
}

/// Unbounded channels work as sinks directly; a dropped receiver is ignored,
/// matching the fire-and-forget contract.
impl ProgressSink for tokio::sync::mpsc::UnboundedSender<RunState> {
    fn on_progress(&self, state: &RunState) {
        let _ = self.send(state.clone());
    }
}

/// Internal emitter enforcing the monotonic-progress invariant.
///
/// Concurrent candidate callbacks may race on the percentage; the atomic
/// clamp guarantees no observer ever sees progress go backwards.
pub(crate) struct ProgressReporter {
    sink: Arc<dyn ProgressSink>,
    run_id: Uuid,
    last: AtomicU8,
}

impl ProgressReporter {
    pub fn new(sink: Arc<dyn ProgressSink>, run_id: Uuid) -> Self {
        Self {
            sink,
            run_id,
            last: AtomicU8::new(0),
        }
    }

    fn clamp(&self, progress: u8) -> u8 {
        let progress = progress.min(100);
        self.last.fetch_max(progress, Ordering::SeqCst);
        self.last.load(Ordering::SeqCst)
    }

    /// Emit a non-terminal step update.
    pub fn step(&self, current_step: &str, progress: u8, step_details: impl Into<String>) {
        self.emit(current_step, progress, step_details.into(), None, None, false);
    }

    /// Emit a candidate-array snapshot during the generation fan-out.
    pub fn candidates(
        &self,
        current_step: &str,
        progress: u8,
        step_details: impl Into<String>,
        candidates: Vec<SolutionCandidate>,
    ) {
        self.emit(
            current_step,
            progress,
            step_details.into(),
            Some(candidates),
            None,
            false,
        );
    }

    /// Emit the successful terminal state (always 100%).
    pub fn complete(&self, step_details: impl Into<String>) {
        self.emit("complete", 100, step_details.into(), None, None, true);
    }

    /// Emit the fatal terminal state.
    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        let progress = self.last.load(Ordering::SeqCst);
        self.emit(
            "error",
            progress,
            message.clone(),
            None,
            Some(message),
            false,
        );
    }

    fn emit(
        &self,
        current_step: &str,
        progress: u8,
        step_details: String,
        candidates: Option<Vec<SolutionCandidate>>,
        error: Option<String>,
        completed: bool,
    ) {
        let state = RunState {
            run_id: self.run_id,
            current_step: current_step.to_string(),
            progress: self.clamp(progress),
            step_details,
            candidates,
            error,
            completed,
        };
        self.sink.on_progress(&state);
    }
}
