//! Run command implementation.

use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::{EventRenderer, Formatter};
use litminer_domain::{event_channel, EventReceiver, LlmClient};
use litminer_llm::build_client;
use litminer_pipeline::{Orchestrator, RunReport, RunRequest, StopFlag, CONTENT_PLACEHOLDER};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const RENDER_INTERVAL: Duration = Duration::from_millis(100);

/// Execute a mining run and print its events as they arrive.
pub async fn execute_run(args: RunArgs, config: &Config, formatter: Formatter, verbose: bool) -> Result<RunReport> {
    let prompt_template = load_template(&args.prompt)?;

    let pipeline = config.pipeline_for(&args)?;
    let resolved = config.resolve_provider(&args, &pipeline)?;
    debug!(provider = resolved.spec.name, settings = ?resolved.settings, "Resolved provider");

    let (events, rx) = event_channel();
    let client: Arc<dyn LlmClient> = Arc::new(build_client(resolved.spec.name, resolved.settings, events.clone())?);
    info!(client = %client.describe(), workers = pipeline.max_workers, "Starting run");

    let orchestrator = Orchestrator::new(client, pipeline, events);
    let request = RunRequest {
        input: args.input,
        output: args.output,
        prompt_template,
        process_limit: args.limit,
        resume: args.resume,
    };

    let stop = StopFlag::new();
    let interrupt = tokio::spawn(stop_on_ctrl_c(stop.clone()));

    let mut renderer = EventRenderer::new(formatter, verbose);
    let run = orchestrator.run(request, stop);
    tokio::pin!(run);

    let report = render_until_done(&mut run, rx, &mut renderer).await;
    interrupt.abort();

    println!("{}", renderer.formatter().report(&report));
    Ok(report)
}

/// Read a prompt template and reject it up front if it lacks the placeholder.
///
/// `render_template` still fails each record with `InvalidPromptTemplate`
/// for library callers that skip this check.
pub fn load_template(path: &Path) -> Result<String> {
    let template = std::fs::read_to_string(path)
        .map_err(|e| CliError::InvalidInput(format!("Cannot read prompt template {}: {}", path.display(), e)))?;
    if !template.contains(CONTENT_PLACEHOLDER) {
        return Err(CliError::InvalidInput(format!(
            "Prompt template {} does not contain {}",
            path.display(),
            CONTENT_PLACEHOLDER
        )));
    }
    Ok(template)
}

async fn render_until_done<F>(run: &mut std::pin::Pin<&mut F>, mut rx: EventReceiver, renderer: &mut EventRenderer) -> RunReport
where
    F: std::future::Future<Output = RunReport>,
{
    let mut ticker = tokio::time::interval(RENDER_INTERVAL);
    let report = loop {
        tokio::select! {
            report = run.as_mut() => break report,
            _ = ticker.tick() => print_pending(&mut rx, renderer),
        }
    };
    print_pending(&mut rx, renderer);
    report
}

fn print_pending(rx: &mut EventReceiver, renderer: &mut EventRenderer) {
    for event in rx.drain() {
        if let Some(line) = renderer.render(&event) {
            eprintln!("{}", line);
        }
    }
}

async fn stop_on_ctrl_c(stop: StopFlag) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Interrupt received, stopping run");
        stop.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_template() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        std::fs::write(&good, "Extract materials.\n{content_to_analyze}").unwrap();
        assert!(load_template(&good).unwrap().ends_with(CONTENT_PLACEHOLDER));

        let bad = dir.path().join("bad.txt");
        std::fs::write(&bad, "Extract materials.").unwrap();
        assert!(matches!(load_template(&bad), Err(CliError::InvalidInput(msg)) if msg.contains("does not contain")));

        assert!(matches!(load_template(&dir.path().join("absent.txt")), Err(CliError::InvalidInput(_))));
    }
}
