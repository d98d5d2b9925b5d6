use std::sync::Arc;
use std::time::Instant;

use console::style;
use futures::future::join_all;
use serde_json::json;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{info, warn};

use crate::cli::commands::ScanArgs;
use crate::cli::effective_config;
use vulnagent::agent::{AgentEngine, AgentResult};
use vulnagent::config::credentials::redact_credentials;
use vulnagent::errors::VulnAgentError;
use vulnagent::http::{HttpRequest, HttpTransport, ReqwestTransport};
use vulnagent::llm::{create_provider, LLMProvider};
use vulnagent::scheduler::{
    ChannelObserver, MessageCategory, Observer, ScanTask, ScanType, TaskEvent, TaskScheduler, TracingObserver,
};
use vulnagent::utils::formatting::format_duration;

pub async fn handle_scan(args: ScanArgs, quiet: bool) -> Result<(), VulnAgentError> {
    let mut config = effective_config(&args.llm).await?;
    if let Some(concurrency) = args.concurrency {
        config.scheduler.concurrency = concurrency;
    }
    if let Some(max) = args.max_iterations {
        config.policy.max_iterations = max;
    }
    config.validate_ready()?;
    let scan_type: ScanType = args.scan_type.parse()?;

    let mut tasks = Vec::with_capacity(args.requests.len());
    for (index, path) in args.requests.iter().enumerate() {
        let raw = tokio::fs::read(path).await?;
        let request = HttpRequest::parse_raw(&raw, &args.scheme)?;
        let target = request.parsed_url()?;
        let host = request.host().unwrap_or_default();
        if !config.scope.allows(&host, target.path()) {
            return Err(VulnAgentError::Config(format!(
                "{} is out of scope: {}",
                path.display(),
                request.url()
            )));
        }
        tasks.push(ScanTask::new(index as u64 + 1, request, scan_type, args.prompt.clone()));
    }

    let llm: Arc<dyn LLMProvider> = Arc::from(create_provider(&config.llm)?);
    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(&config.http)?);
    let provider = llm.provider_name().to_string();
    let model = llm.model_name().to_string();
    let engine = Arc::new(AgentEngine::new(llm, transport, config.policy.clone()));
    info!(
        provider = %provider,
        model = %model,
        tasks = tasks.len(),
        scan_type = %scan_type,
        max_iterations = engine.policy().max_iterations,
        "Starting scan"
    );

    // JSON output keeps stdout for the results; progress goes to the log.
    let (tx, rx) = mpsc::unbounded_channel();
    let observer: Arc<dyn Observer> = if args.json {
        drop(tx);
        Arc::new(TracingObserver)
    } else {
        Arc::new(ChannelObserver::new(tx))
    };
    let scheduler = TaskScheduler::new(engine, observer, config.scheduler.concurrency);
    let secrets = vec![config.llm.resolved_api_key()];
    let renderer = tokio::spawn(render_events(rx, secrets, quiet));

    let started = Instant::now();
    let mut handles = Vec::with_capacity(tasks.len());
    for task in tasks {
        handles.push(scheduler.submit(task)?);
    }

    let interrupted = tokio::select! {
        _ = scheduler.shutdown(true) => false,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling running tasks");
            scheduler.shutdown(false).await;
            true
        }
    };

    let results = join_all(handles.into_iter().map(|handle| async move {
        let id = handle.id();
        (id, handle.result().await)
    }))
    .await;
    drop(scheduler);
    let _ = renderer.await;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    if args.json {
        print_json(&results)?;
    } else {
        print_summary(&results, elapsed_ms);
    }

    if interrupted {
        return Err(VulnAgentError::Cancelled("scan interrupted".into()));
    }
    let failed = results.iter().filter(|(_, r)| r.is_error()).count();
    if failed > 0 {
        return Err(VulnAgentError::Internal(format!("{} of {} tasks ended in error", failed, results.len())));
    }
    Ok(())
}

async fn render_events(mut rx: UnboundedReceiver<TaskEvent>, secrets: Vec<String>, results_only: bool) {
    let secrets: Vec<&str> = secrets.iter().map(String::as_str).collect();
    while let Some(event) = rx.recv().await {
        if results_only {
            continue;
        }
        match event {
            TaskEvent::Created { task_id, method, url, scan_type } => {
                println!("{} {} {} {}", tag(task_id), style(method).bold(), url, style(scan_type).dim());
            }
            TaskEvent::Status { task_id, status } => {
                println!("{} {}", tag(task_id), style(status).dim());
            }
            TaskEvent::Message { task_id, category, text } => {
                let text = redact_credentials(&text, &secrets);
                let label = match category {
                    MessageCategory::Thought => style("thought").cyan(),
                    MessageCategory::Action => style("action").yellow(),
                    MessageCategory::Observation => style("observation").blue(),
                    MessageCategory::Result => style("result").green().bold(),
                    MessageCategory::Error => style("error").red().bold(),
                    MessageCategory::Info => style("info").dim(),
                };
                println!("{} {} {}", tag(task_id), label, text);
            }
        }
    }
}

fn tag(task_id: u64) -> console::StyledObject<String> {
    style(format!("[#{}]", task_id)).magenta()
}

fn print_json(results: &[(u64, AgentResult)]) -> Result<(), VulnAgentError> {
    let rows: Vec<_> = results
        .iter()
        .map(|(id, result)| json!({ "task_id": id, "summary": result.summary(), "result": result }))
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn print_summary(results: &[(u64, AgentResult)], elapsed_ms: u64) {
    println!();
    for (id, result) in results {
        let headline = result.summary();
        let styled = match result {
            AgentResult::Vulnerable { .. } => style(headline).red().bold(),
            AgentResult::NotVulnerable { .. } => style(headline).green(),
            AgentResult::Error { .. } => style(headline).yellow(),
        };
        println!("{} {}", tag(*id), styled);
        if let AgentResult::Vulnerable { remediation, .. } = result {
            if !remediation.is_empty() {
                println!("     {} {}", style("remediation:").dim(), remediation);
            }
        }
    }
    let found = results.iter().filter(|(_, r)| r.is_vulnerable()).count();
    println!(
        "\n{} task(s), {} vulnerable, finished in {}",
        results.len(),
        style(found).bold(),
        format_duration(elapsed_ms)
    );
}
