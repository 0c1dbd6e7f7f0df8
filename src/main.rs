//! Snapsolve CLI.
//!
//! Reads screenshot files, runs the solving pipeline, and prints the result
//! as JSON on stdout. Progress updates go to stderr via tracing.
//!
//! Usage: snapsolve [--fast] <image.png> [image.png ...]

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use snapsolve::llm::OpenRouterClient;
use snapsolve::pipeline::{solve_fast, Orchestrator};
use snapsolve::progress::RunState;
use snapsolve::sandbox::NodeSpawner;
use snapsolve::{ImageData, SolverConfig};

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "image/png",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut fast = false;
    let mut paths: Vec<String> = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--fast" => fast = true,
            "--help" | "-h" => {
                eprintln!("Usage: snapsolve [--fast] <image.png> [image.png ...]");
                return Ok(());
            }
            _ => paths.push(arg),
        }
    }
    anyhow::ensure!(
        !paths.is_empty(),
        "No screenshots given. Usage: snapsolve [--fast] <image.png> [image.png ...]"
    );

    let mut images = Vec::new();
    for path in &paths {
        let path = Path::new(path);
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        images.push(ImageData::from_bytes(&bytes, mime_for(path)));
    }

    let api_key = std::env::var("OPENROUTER_API_KEY")
        .context("OPENROUTER_API_KEY environment variable is not set")?;
    let caller = Arc::new(OpenRouterClient::new(api_key));
    let config = SolverConfig::from_env();

    if fast {
        let answer = solve_fast(caller.as_ref(), &config.answer_model, &images).await?;
        println!("{}", answer);
        return Ok(());
    }

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<RunState>();
    let progress_task = tokio::spawn(async move {
        while let Some(state) = rx.recv().await {
            tracing::info!(
                "[{:>3}%] {}: {}",
                state.progress,
                state.current_step,
                state.step_details
            );
        }
    });

    let orchestrator = Orchestrator::new(
        config,
        caller,
        Arc::new(NodeSpawner::new()),
        Arc::new(tx),
    );
    let result = orchestrator.solve(&images).await;

    // Drop the orchestrator (and with it the channel sender) so the
    // progress task sees the stream close.
    drop(orchestrator);
    let _ = progress_task.await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if result.success {
        Ok(())
    } else {
        std::process::exit(1)
    }
}
