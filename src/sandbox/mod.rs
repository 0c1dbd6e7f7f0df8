//! Local code-execution sandbox.
//!
//! Generated candidate code is run against the extracted examples to count
//! passing tests. One `load` establishes the program for all subsequent `run`
//! calls until the next `load`. Because loading is stateful, concurrent
//! candidates each get a fresh sandbox from a [`SandboxSpawner`].

mod node;

pub use node::{NodeSandbox, NodeSpawner};

use async_trait::async_trait;

/// Captured output of one program run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
}

/// A loaded program that can be run repeatedly with different inputs.
#[async_trait]
pub trait ExecutionSandbox: Send {
    /// Load a program, replacing any previously loaded one.
    async fn load(&mut self, code: &str) -> anyhow::Result<()>;

    /// Run the loaded program with the given stdin input.
    ///
    /// Implementations must enforce their own timeout and resolve to an
    /// error rather than hang.
    async fn run(&mut self, input: &str) -> anyhow::Result<RunOutput>;
}

/// Factory producing a fresh sandbox per candidate.
pub trait SandboxSpawner: Send + Sync {
    fn spawn(&self) -> Box<dyn ExecutionSandbox>;
}
