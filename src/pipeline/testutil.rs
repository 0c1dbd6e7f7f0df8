//! Scripted collaborator doubles for pipeline tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{LlmError, ModelCaller, ModelRequest};
use crate::progress::{ProgressSink, RunState};
use crate::prompts;
use crate::sandbox::{ExecutionSandbox, RunOutput, SandboxSpawner};

/// Model caller answering from scripted per-stage queues.
///
/// Responses are keyed by `"stage:model"` first, then by the bare stage name
/// (`classify`, `extract`, `verify`, `generate`, `answer`). Each matching
/// response is consumed in order. An unmatched request fails with a network
/// error.
pub(crate) struct ScriptedCaller {
    scripts: Mutex<HashMap<String, VecDeque<Result<String, LlmError>>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedCaller {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn script(&self, key: &str, response: Result<String, LlmError>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(response);
    }

    /// Stage names of every request seen so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn stage_of(request: &ModelRequest) -> &'static str {
        match request.system_prompt.as_str() {
            s if s == prompts::CLASSIFY_SYSTEM => "classify",
            s if s == prompts::EXTRACT_SYSTEM => "extract",
            s if s == prompts::VERIFY_SYSTEM => "verify",
            s if s == prompts::GENERATE_SYSTEM => "generate",
            s if s == prompts::ANSWER_SYSTEM => "answer",
            _ => "unknown",
        }
    }
}

#[async_trait]
impl ModelCaller for ScriptedCaller {
    async fn ask(&self, request: &ModelRequest) -> Result<String, LlmError> {
        let stage = Self::stage_of(request);
        self.calls.lock().unwrap().push(stage.to_string());

        let keyed = format!("{}:{}", stage, request.model);
        let mut scripts = self.scripts.lock().unwrap();
        if let Some(queue) = scripts.get_mut(&keyed) {
            if let Some(response) = queue.pop_front() {
                return response;
            }
        }
        if let Some(queue) = scripts.get_mut(stage) {
            if let Some(response) = queue.pop_front() {
                return response;
            }
        }
        Err(LlmError::network_error(format!(
            "no scripted response for {}",
            keyed
        )))
    }
}

/// Sandbox double evaluating two known factorial programs.
///
/// `load("factorial-correct")` computes n!; `load("factorial-off-by-one")`
/// computes n! - 1. Anything else fails at run time.
pub(crate) struct FactorialSpawner;

struct FactorialSandbox {
    code: String,
}

#[async_trait]
impl ExecutionSandbox for FactorialSandbox {
    async fn load(&mut self, code: &str) -> anyhow::Result<()> {
        self.code = code.to_string();
        Ok(())
    }

    async fn run(&mut self, input: &str) -> anyhow::Result<RunOutput> {
        let n: u64 = input
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("bad input: {}", e))?;
        let factorial: u64 = (1..=n).product();
        let answer = match self.code.as_str() {
            "factorial-correct" => factorial,
            "factorial-off-by-one" => factorial.saturating_sub(1),
            other => anyhow::bail!("unknown program {:?}", other),
        };
        Ok(RunOutput {
            stdout: format!("{}\n", answer),
            stderr: String::new(),
        })
    }
}

impl SandboxSpawner for FactorialSpawner {
    fn spawn(&self) -> Box<dyn ExecutionSandbox> {
        Box::new(FactorialSandbox {
            code: String::new(),
        })
    }
}

/// Sandbox double whose `load` always fails, e.g. a missing runtime.
pub(crate) struct BrokenLoadSpawner;

struct BrokenLoadSandbox;

#[async_trait]
impl ExecutionSandbox for BrokenLoadSandbox {
    async fn load(&mut self, _code: &str) -> anyhow::Result<()> {
        anyhow::bail!("runtime not installed")
    }

    async fn run(&mut self, _input: &str) -> anyhow::Result<RunOutput> {
        anyhow::bail!("no program loaded")
    }
}

impl SandboxSpawner for BrokenLoadSpawner {
    fn spawn(&self) -> Box<dyn ExecutionSandbox> {
        Box::new(BrokenLoadSandbox)
    }
}

/// Sink recording every emitted state.
#[derive(Default)]
pub(crate) struct RecordingSink {
    states: Mutex<Vec<RunState>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn states(&self) -> Vec<RunState> {
        self.states.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn on_progress(&self, state: &RunState) {
        self.states.lock().unwrap().push(state.clone());
    }
}
