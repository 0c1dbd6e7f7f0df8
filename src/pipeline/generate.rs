//! Concurrent solution-generation fan-out.
//!
//! One candidate per roster entry, all generated concurrently. Candidate
//! failures are captured as values inside their own slot and never cross the
//! fan-out boundary. After every slot state transition the full candidate
//! array is re-emitted to the observer, so it always sees a complete
//! snapshot, never a partial diff.

use std::sync::{Arc, Mutex};

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use super::problem::{ProblemExample, ProblemStatement};
use super::strip_json_fences;
use crate::llm::{ModelCaller, ModelRequest, ResponseShape};
use crate::prompts;
use crate::sandbox::SandboxSpawner;

/// Candidate lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl CandidateStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CandidateStatus::Succeeded | CandidateStatus::Failed)
    }
}

/// One generation attempt's outcome.
///
/// `slot` is a fixed identity for the lifetime of the run; `tests_total` is
/// set to the example count at creation and never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionCandidate {
    pub slot: usize,
    pub status: CandidateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approach: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_complexity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_complexity: Option<String>,
    pub tests_passed: u32,
    pub tests_total: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SolutionCandidate {
    fn pending(slot: usize, tests_total: u32) -> Self {
        Self {
            slot,
            status: CandidateStatus::Pending,
            approach: None,
            code: None,
            time_complexity: None,
            space_complexity: None,
            tests_passed: 0,
            tests_total,
            error: None,
        }
    }
}

/// Wire shape of one generation response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedSolution {
    approach: String,
    code: String,
    #[serde(default = "not_available")]
    time_complexity: String,
    #[serde(default = "not_available")]
    space_complexity: String,
}

fn not_available() -> String {
    "N/A".to_string()
}

/// Observer callback receiving the full candidate array after each transition.
pub type CandidateUpdateFn<'a> = &'a (dyn Fn(&[SolutionCandidate]) + Send + Sync);

/// Fans out N concurrent generation attempts against a fixed model roster.
pub struct SolutionGenerator {
    caller: Arc<dyn ModelCaller>,
    spawner: Arc<dyn SandboxSpawner>,
    roster: Vec<String>,
}

impl SolutionGenerator {
    pub fn new(
        caller: Arc<dyn ModelCaller>,
        spawner: Arc<dyn SandboxSpawner>,
        roster: Vec<String>,
    ) -> Self {
        Self {
            caller,
            spawner,
            roster,
        }
    }

    /// Generate one candidate per roster entry, all concurrently.
    ///
    /// The returned array always has exactly roster-length entries, each with
    /// a terminal status, regardless of how many underlying calls errored.
    pub async fn generate(
        &self,
        statement: &ProblemStatement,
        on_update: CandidateUpdateFn<'_>,
    ) -> Vec<SolutionCandidate> {
        let tests_total = statement.examples.len() as u32;
        let slots: Arc<Mutex<Vec<SolutionCandidate>>> = Arc::new(Mutex::new(
            (0..self.roster.len())
                .map(|slot| SolutionCandidate::pending(slot, tests_total))
                .collect(),
        ));

        let tasks = self.roster.iter().enumerate().map(|(slot, model)| {
            let slots = Arc::clone(&slots);
            async move {
                update_slot(&slots, slot, |c| c.status = CandidateStatus::Running);
                emit(&slots, on_update);

                match self.attempt(model, statement).await {
                    Ok(solution) => {
                        update_slot(&slots, slot, |c| {
                            c.status = CandidateStatus::Succeeded;
                            c.approach = Some(solution.approach.clone());
                            c.code = Some(solution.code.clone());
                            c.time_complexity = Some(solution.time_complexity.clone());
                            c.space_complexity = Some(solution.space_complexity.clone());
                        });
                        emit(&slots, on_update);

                        if !statement.examples.is_empty() {
                            self.run_examples(
                                slot,
                                &solution.code,
                                &statement.examples,
                                &slots,
                                on_update,
                            )
                            .await;
                        }
                    }
                    Err(message) => {
                        tracing::warn!("Candidate {} ({}) failed: {}", slot, model, message);
                        update_slot(&slots, slot, |c| {
                            c.status = CandidateStatus::Failed;
                            c.error = Some(message);
                        });
                        emit(&slots, on_update);
                    }
                }
            }
        });

        join_all(tasks).await;

        let result = lock(&slots).clone();
        result
    }

    /// One generation attempt: a single model call plus response parsing.
    /// All failure modes collapse into a message string for the slot.
    async fn attempt(
        &self,
        model: &str,
        statement: &ProblemStatement,
    ) -> Result<GeneratedSolution, String> {
        let request = ModelRequest::new(
            &[],
            prompts::GENERATE_SYSTEM,
            prompts::generate_user(statement),
            model,
            ResponseShape::Json,
        );

        let response = self
            .caller
            .ask(&request)
            .await
            .map_err(|e| format!("generation call failed: {}", e))?;

        let solution: GeneratedSolution = serde_json::from_str(strip_json_fences(&response))
            .map_err(|e| format!("malformed generation response: {}", e))?;

        if solution.code.trim().is_empty() {
            return Err("generation response has empty code".to_string());
        }
        Ok(solution)
    }

    /// Run the candidate's code once per example in a fresh sandbox.
    ///
    /// A sandbox load failure leaves `tests_passed` at zero but does not fail
    /// the candidate; the generated code may still be a valid answer even if
    /// it cannot be executed locally.
    async fn run_examples(
        &self,
        slot: usize,
        code: &str,
        examples: &[ProblemExample],
        slots: &Mutex<Vec<SolutionCandidate>>,
        on_update: CandidateUpdateFn<'_>,
    ) {
        let mut sandbox = self.spawner.spawn();
        if let Err(e) = sandbox.load(code).await {
            tracing::warn!("Candidate {} sandbox load failed: {}", slot, e);
            return;
        }

        for (index, example) in examples.iter().enumerate() {
            let passed = match sandbox.run(&example.input).await {
                Ok(output) => {
                    let passed = output.stdout.trim() == example.output.trim();
                    if !passed && !output.stderr.is_empty() {
                        tracing::debug!(
                            "Candidate {} example {} stderr: {}",
                            slot,
                            index,
                            output.stderr.trim()
                        );
                    }
                    passed
                }
                Err(e) => {
                    tracing::debug!("Candidate {} example {} errored: {}", slot, index, e);
                    false
                }
            };
            if passed {
                update_slot(slots, slot, |c| c.tests_passed += 1);
            }
            emit(slots, on_update);
        }
    }
}

/// Lock the candidate array, tolerating poisoning from a panicked peer task.
fn lock(slots: &Mutex<Vec<SolutionCandidate>>) -> std::sync::MutexGuard<'_, Vec<SolutionCandidate>> {
    slots.lock().unwrap_or_else(|e| e.into_inner())
}

/// Mutate exactly one slot. Each task only ever touches its own index.
fn update_slot(
    slots: &Mutex<Vec<SolutionCandidate>>,
    slot: usize,
    f: impl FnOnce(&mut SolutionCandidate),
) {
    let mut guard = lock(slots);
    if let Some(candidate) = guard.get_mut(slot) {
        f(candidate);
    }
}

/// Snapshot the full array under the lock, then emit outside it.
fn emit(slots: &Mutex<Vec<SolutionCandidate>>, on_update: CandidateUpdateFn<'_>) {
    let snapshot = lock(slots).clone();
    on_update(&snapshot);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testutil::{BrokenLoadSpawner, FactorialSpawner, ScriptedCaller};
    use crate::pipeline::ProblemExample;

    fn statement_with_examples(examples: Vec<ProblemExample>) -> ProblemStatement {
        ProblemStatement {
            title: "Factorial".to_string(),
            description: "Compute n!".to_string(),
            examples,
            constraints: vec![],
            follow_up: None,
        }
    }

    fn generation_json(code: &str) -> String {
        serde_json::to_string(&serde_json::json!({
            "approach": "iterate",
            "code": code,
            "timeComplexity": "O(n)",
            "spaceComplexity": "O(1)"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_fanout_yields_n_terminal_candidates() {
        let caller = Arc::new(ScriptedCaller::new());
        caller.script("generate:m0", Ok(generation_json("factorial-correct")));
        caller.script(
            "generate:m1",
            Err(crate::llm::LlmError::network_error("boom".into())),
        );
        caller.script("generate:m2", Ok("not json at all".to_string()));

        let generator = SolutionGenerator::new(
            caller,
            Arc::new(FactorialSpawner),
            vec!["m0".into(), "m1".into(), "m2".into()],
        );

        let statement = statement_with_examples(vec![]);
        let candidates = generator.generate(&statement, &|_| {}).await;

        assert_eq!(candidates.len(), 3);
        for (i, c) in candidates.iter().enumerate() {
            assert_eq!(c.slot, i);
            assert!(c.status.is_terminal());
        }
        assert_eq!(candidates[0].status, CandidateStatus::Succeeded);
        assert_eq!(candidates[1].status, CandidateStatus::Failed);
        assert!(candidates[1].error.as_deref().unwrap().contains("boom"));
        assert_eq!(candidates[2].status, CandidateStatus::Failed);
    }

    #[tokio::test]
    async fn test_correct_factorial_passes_example() {
        let caller = Arc::new(ScriptedCaller::new());
        caller.script("generate:m0", Ok(generation_json("factorial-correct")));

        let generator =
            SolutionGenerator::new(caller, Arc::new(FactorialSpawner), vec!["m0".into()]);

        let statement = statement_with_examples(vec![ProblemExample {
            input: "5".to_string(),
            output: "120".to_string(),
            explanation: None,
        }]);
        let candidates = generator.generate(&statement, &|_| {}).await;

        assert_eq!(candidates[0].status, CandidateStatus::Succeeded);
        assert_eq!(candidates[0].tests_passed, 1);
        assert_eq!(candidates[0].tests_total, 1);
    }

    #[tokio::test]
    async fn test_buggy_factorial_fails_example() {
        let caller = Arc::new(ScriptedCaller::new());
        caller.script("generate:m0", Ok(generation_json("factorial-off-by-one")));

        let generator =
            SolutionGenerator::new(caller, Arc::new(FactorialSpawner), vec!["m0".into()]);

        let statement = statement_with_examples(vec![ProblemExample {
            input: "5".to_string(),
            output: "120".to_string(),
            explanation: None,
        }]);
        let candidates = generator.generate(&statement, &|_| {}).await;

        assert_eq!(candidates[0].status, CandidateStatus::Succeeded);
        assert_eq!(candidates[0].tests_passed, 0);
        assert_eq!(candidates[0].tests_total, 1);
    }

    #[tokio::test]
    async fn test_every_update_is_a_full_snapshot() {
        let caller = Arc::new(ScriptedCaller::new());
        caller.script("generate:m0", Ok(generation_json("factorial-correct")));
        caller.script("generate:m1", Ok(generation_json("factorial-correct")));

        let generator = SolutionGenerator::new(
            caller,
            Arc::new(FactorialSpawner),
            vec!["m0".into(), "m1".into()],
        );

        let statement = statement_with_examples(vec![ProblemExample {
            input: "3".to_string(),
            output: "6".to_string(),
            explanation: None,
        }]);

        let snapshots: Mutex<Vec<Vec<SolutionCandidate>>> = Mutex::new(Vec::new());
        let candidates = generator
            .generate(&statement, &|snapshot| {
                snapshots.lock().unwrap().push(snapshot.to_vec());
            })
            .await;

        let snapshots = snapshots.into_inner().unwrap();
        // 2 slots x (running + succeeded + one test result) = 6 emissions.
        assert_eq!(snapshots.len(), 6);
        for snapshot in &snapshots {
            assert_eq!(snapshot.len(), 2);
            assert_eq!(snapshot[0].slot, 0);
            assert_eq!(snapshot[1].slot, 1);
        }
        assert_eq!(candidates[0].tests_passed, 1);
        assert_eq!(candidates[1].tests_passed, 1);
    }

    #[tokio::test]
    async fn test_sandbox_load_failure_keeps_candidate_succeeded() {
        let caller = Arc::new(ScriptedCaller::new());
        caller.script("generate:m0", Ok(generation_json("factorial-correct")));

        let generator =
            SolutionGenerator::new(caller, Arc::new(BrokenLoadSpawner), vec!["m0".into()]);

        let statement = statement_with_examples(vec![ProblemExample {
            input: "5".to_string(),
            output: "120".to_string(),
            explanation: None,
        }]);
        let candidates = generator.generate(&statement, &|_| {}).await;

        // The code may still be a valid answer even when it cannot be run
        // locally: no tests pass, but the candidate does not fail.
        assert_eq!(candidates[0].status, CandidateStatus::Succeeded);
        assert_eq!(candidates[0].tests_passed, 0);
        assert_eq!(candidates[0].tests_total, 1);
        assert!(candidates[0].error.is_none());
    }

    #[tokio::test]
    async fn test_missing_required_field_fails_candidate() {
        let caller = Arc::new(ScriptedCaller::new());
        caller.script("generate:m0", Ok(r#"{"approach": "no code here"}"#.to_string()));

        let generator =
            SolutionGenerator::new(caller, Arc::new(FactorialSpawner), vec!["m0".into()]);

        let statement = statement_with_examples(vec![]);
        let candidates = generator.generate(&statement, &|_| {}).await;

        assert_eq!(candidates[0].status, CandidateStatus::Failed);
        assert!(candidates[0]
            .error
            .as_deref()
            .unwrap()
            .contains("malformed generation response"));
    }
}
