//! xs - autonomous Exercism exercise solver
//!
//! CLI entry point: solve one exercise (or a whole track), list
//! exercises, and check remote grading status.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::Result;
use tracing::{debug, info, warn};

use exsolver::cli::{Cli, Command};
use exsolver::config::Config;
use exsolver::delivery::{DeliveryChannel, DirectChannel, InteractiveChannel};
use exsolver::domain::{Exercise, RemoteIterationStatus, SolveOutcome, SubmissionAck};
use exsolver::generator::default_generator;
use exsolver::harness::TestHarness;
use exsolver::monitor::GradingMonitor;
use exsolver::platform::{ApiClient, FileSessionStore, SubmissionTool, WebSession};
use exsolver::solve::{EngineConfig, SolveEngine};
use exsolver::workspace::WorkspaceStore;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) {
    // Priority: CLI --log-level > config file > default (INFO)
    let level_str = cli_log_level.or(config_log_level);
    let level = if let Some(s) = level_str {
        match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        }
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

fn resolve_token(cli_token: Option<&str>, config: &Config) -> Result<String> {
    if let Some(token) = cli_token {
        return Ok(token.to_string());
    }
    config.validate()?;
    Ok(std::env::var(&config.platform.token_env).unwrap_or_default())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_ref())?;
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref());
    debug!("main: config loaded and logging initialized");

    if let Some(workspace) = &cli.workspace {
        config.workspace.root = workspace.clone();
    }

    let token = match resolve_token(cli.token.as_deref(), &config) {
        Ok(token) => token,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Command::Solve {
            slug,
            track,
            all,
            max_attempts,
            channel,
            headless,
        } => cmd_solve(&config, &token, slug, &track, all, max_attempts, channel, headless).await,
        Command::List { track } => cmd_list(&config, &token, &track).await,
        Command::Status { slug, track } => cmd_status(&config, &token, &slug, &track).await,
    }
}

fn build_api(config: &Config, token: &str) -> Result<ApiClient> {
    let api = ApiClient::new(
        &config.platform.api_base_url,
        token,
        Duration::from_millis(config.platform.request_timeout_ms),
    )?;
    Ok(api)
}

fn build_channel(config: &Config, token: &str, tool: Arc<SubmissionTool>, kind: &str, headless: bool) -> Result<Arc<dyn DeliveryChannel>> {
    debug!(%kind, headless, "build_channel: called");
    match kind {
        "interactive" => {
            let session_path = config
                .session
                .path
                .clone()
                .unwrap_or_else(FileSessionStore::default_path);
            let store = Box::new(FileSessionStore::new(session_path));
            let session = Arc::new(WebSession::new(
                &config.platform.base_url,
                &config.platform.api_base_url,
                store,
                Duration::from_millis(config.platform.request_timeout_ms),
            )?);
            Ok(Arc::new(InteractiveChannel::new(
                session,
                Duration::from_millis(config.delivery.poll_interval_ms),
                config.delivery.max_polls,
                Duration::from_millis(config.delivery.auth_grace_ms),
                headless,
            )))
        }
        "direct" => {
            let api = build_api(config, token)?;
            Ok(Arc::new(DirectChannel::new(
                tool,
                api,
                Duration::from_millis(config.delivery.rate_limit_backoff_ms),
            )))
        }
        other => Err(eyre::eyre!("Unknown delivery channel '{}'. Use: direct or interactive", other)),
    }
}

#[allow(clippy::too_many_arguments)]
async fn cmd_solve(
    config: &Config,
    token: &str,
    slug: Option<String>,
    track: &str,
    all: bool,
    max_attempts: Option<u32>,
    channel_kind: Option<String>,
    headless: bool,
) -> Result<()> {
    debug!(?slug, %track, all, "cmd_solve: called");

    let tool = Arc::new(SubmissionTool::new(
        &config.workspace.cli_bin,
        token,
        &config.workspace.root,
        Duration::from_millis(config.workspace.tool_timeout_ms),
    ));
    tool.configure().await?;

    let kind = channel_kind.unwrap_or_else(|| config.delivery.channel.clone());
    let channel = build_channel(config, token, tool.clone(), &kind, headless)?;

    let mut engine_config = EngineConfig::from_config(&config.solve);
    if let Some(n) = max_attempts {
        engine_config.max_attempts = n;
    }

    let engine = SolveEngine::new(
        WorkspaceStore::new(config.workspace.root.clone(), tool),
        default_generator(track),
        TestHarness::for_track(track, Duration::from_millis(config.solve.harness_timeout_ms)),
        channel,
        GradingMonitor::from_config(&config.monitor),
        engine_config,
    );

    if all {
        return cmd_solve_all(config, token, track, &engine).await;
    }

    let Some(slug) = slug else {
        return Err(eyre::eyre!("Provide an exercise slug or use --all"));
    };
    let exercise = Exercise::new(track, slug);

    match engine.solve(&exercise).await {
        Ok(outcome) => {
            print_outcome(&exercise, &outcome);
            if !outcome.success {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}: {}", "✗".red(), exercise, e);
            std::process::exit(1);
        }
    }
}

async fn cmd_solve_all(config: &Config, token: &str, track: &str, engine: &SolveEngine) -> Result<()> {
    let api = build_api(config, token)?;
    let listings = api.exercises(track).await?;
    let available: Vec<_> = listings.iter().filter(|l| l.available()).collect();

    info!(track, total = listings.len(), available = available.len(), "cmd_solve_all: starting batch");
    println!(
        "Solving {} available exercises on the {} track",
        available.len().to_string().cyan(),
        track.cyan()
    );

    let delay = Duration::from_millis(config.solve.batch_delay_ms);
    let mut solved = 0usize;
    let mut failed = 0usize;

    for (index, listing) in available.iter().enumerate() {
        let exercise = Exercise::new(track, listing.slug.clone());

        // One failed exercise must not end the batch
        match engine.solve(&exercise).await {
            Ok(outcome) => {
                print_outcome(&exercise, &outcome);
                if outcome.success {
                    solved += 1;
                } else {
                    failed += 1;
                }
            }
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), exercise, e);
                failed += 1;
            }
        }

        // Mandatory pacing between exercises, whatever the outcome
        if index + 1 < available.len() {
            debug!(delay_ms = delay.as_millis() as u64, "cmd_solve_all: pacing before next exercise");
            tokio::time::sleep(delay).await;
        }
    }

    let attempted = solved + failed;
    let rate = if attempted > 0 {
        (solved as f64 / attempted as f64) * 100.0
    } else {
        0.0
    };
    println!();
    println!("Batch complete: {} solved, {} failed ({:.0}% success)", solved.to_string().green(), failed.to_string().red(), rate);

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_list(config: &Config, token: &str, track: &str) -> Result<()> {
    debug!(%track, "cmd_list: called");
    let api = build_api(config, token)?;
    let listings = api.exercises(track).await?;

    println!("Exercises on the {} track:", track.cyan());
    for listing in &listings {
        let marker = if listing.completed {
            "✓".green()
        } else if listing.locked {
            "🔒".normal()
        } else {
            "·".normal()
        };
        let difficulty = listing.difficulty.as_deref().unwrap_or("-");
        println!("  {} {:<24} {}", marker, listing.slug, difficulty);
    }

    let available = listings.iter().filter(|l| l.available()).count();
    println!("\n{} of {} available", available, listings.len());
    Ok(())
}

async fn cmd_status(config: &Config, token: &str, slug: &str, track: &str) -> Result<()> {
    debug!(%slug, %track, "cmd_status: called");
    let api = build_api(config, token)?;
    let exercise = Exercise::new(track, slug);

    let status = api.latest_iteration_status(&exercise).await?;
    let line = match status {
        RemoteIterationStatus::Passed => format!("{} {}: passed", "✓".green(), exercise),
        RemoteIterationStatus::Failed => format!("{} {}: failed", "✗".red(), exercise),
        other => format!("· {}: {}", exercise, other),
    };
    println!("{}", line);
    Ok(())
}

fn print_outcome(exercise: &Exercise, outcome: &SolveOutcome) {
    if !outcome.success {
        println!(
            "{} {} not solved after {} attempts ({})",
            "✗".red(),
            exercise,
            outcome.attempts,
            outcome.last_report.summary()
        );
        return;
    }

    let submission = match &outcome.submission {
        Some(SubmissionAck::Accepted { .. }) => "submitted",
        Some(SubmissionAck::AlreadySubmitted) => "already submitted",
        None => "not submitted",
    };

    // Remote grading is reported distinctly from the local verdict
    match outcome.remote_status {
        Some(RemoteIterationStatus::Passed) => {
            println!(
                "{} {} solved in {} attempts, {} ({}), remote grading passed",
                "✓".green(),
                exercise,
                outcome.attempts,
                submission,
                outcome.last_report.summary()
            );
        }
        Some(status) => {
            println!(
                "{} {} solved locally in {} attempts, {} ({}), remote grading {}",
                "⚠".yellow(),
                exercise,
                outcome.attempts,
                submission,
                outcome.last_report.summary(),
                status
            );
        }
        None => {
            warn!(%exercise, "print_outcome: success without a remote status");
            println!("{} {} solved in {} attempts, {}", "✓".green(), exercise, outcome.attempts, submission);
        }
    }
}
