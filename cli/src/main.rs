//! CLI entrypoint for benchfleet
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Result, anyhow, bail};
use benchfleet_application::{
    LocalQuorum, QuorumFactory, QuorumProgressNotifier, RunEventLogger, RunScenarioUseCase,
};
use benchfleet_domain::{
    Agent, AgentMode, Executor, IterationRecord, ScenarioOutcome, ToolExecutor,
};
use benchfleet_infrastructure::{
    AgentClient, ConfigLoader, FileConfig, FileOutputFormat, JsonlRunLogger, LocalCommandRunner,
    StaticDeployment, TcpMessageChannel,
};
use benchfleet_presentation::{Cli, Command, ConsoleFormatter, OutputFormat, ProgressReporter};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Agent id used for `local` runs
const LOCAL_AGENT_ID: &str = "local";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Command::ShowConfig = cli.command {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    config.validate()?;

    if !config.output.color {
        colored::control::set_override(false);
    }

    match cli.command {
        Command::Serve {
            bind,
            output,
            event_log,
        } => {
            let format = output.unwrap_or_else(|| output_format(&config));
            let event_log = event_log.or_else(|| config.output.event_log.clone());
            serve(&config, bind, format, event_log, cli.quiet).await
        }
        Command::Local { output } => {
            let format = output.unwrap_or_else(|| output_format(&config));
            local(&config, format).await
        }
        Command::Agent { server, agent_id } => agent(&server, &agent_id).await,
        Command::ShowConfig => Ok(()),
    }
}

fn output_format(config: &FileConfig) -> OutputFormat {
    match config.output.format {
        FileOutputFormat::Table => OutputFormat::Table,
        FileOutputFormat::Json => OutputFormat::Json,
    }
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping");
            token.cancel();
        }
    });
}

async fn serve(
    config: &FileConfig,
    bind: Option<String>,
    format: OutputFormat,
    event_log: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    if config.tests.is_empty() {
        bail!("No tests configured. Add [[tests]] entries to the configuration file.");
    }

    let cancellation = CancellationToken::new();
    cancel_on_ctrl_c(cancellation.clone());

    // === Dependency Injection ===
    let mut factory =
        QuorumFactory::new(config.quorum.to_params()).with_cancellation(cancellation.clone());

    if !quiet {
        let progress: Arc<dyn QuorumProgressNotifier> = Arc::new(ProgressReporter::new());
        factory = factory.with_progress(progress);
    }

    if let Some(path) = &event_log {
        let logger = JsonlRunLogger::open(path)
            .map_err(|e| anyhow!("Could not open event log {}: {}", path.display(), e))?;
        info!("Logging run events to {}", logger.path().display());
        let logger: Arc<dyn RunEventLogger> = Arc::new(logger);
        factory = factory.with_logger(logger);
    }

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let channel = TcpMessageChannel::bind(bind.as_str(), config.server.heartbeat_interval()).await?;
    let deployment = StaticDeployment::new(config.agents.clone());

    let use_case = RunScenarioUseCase::new(deployment, factory);
    let outcome = use_case.execute(channel, &config.tests).await?;

    println!("{}", ConsoleFormatter::render(&outcome, format));

    if cancellation.is_cancelled() {
        bail!("Run interrupted");
    }
    Ok(())
}

async fn local(config: &FileConfig, format: OutputFormat) -> Result<()> {
    if config.tests.is_empty() {
        bail!("No tests configured. Add [[tests]] entries to the configuration file.");
    }

    let agent = Agent::new(LOCAL_AGENT_ID, AgentMode::Alone);
    let fleet = BTreeMap::new();
    let mut outcome = ScenarioOutcome::default();

    for test in &config.tests {
        let executor: Box<dyn Executor> = Box::new(ToolExecutor::for_agent(test, &agent, &fleet)?);
        let executors = BTreeMap::from([(LOCAL_AGENT_ID.to_string(), executor)]);

        info!("Running {} locally", test.display_name());
        let result = tokio::task::spawn_blocking(move || {
            LocalQuorum::new(LocalCommandRunner::new()).execute(executors)
        })
        .await?;

        outcome.push(IterationRecord::new(test.display_name(), 1, result));
    }

    println!("{}", ConsoleFormatter::render(&outcome, format));
    Ok(())
}

async fn agent(server: &str, agent_id: &str) -> Result<()> {
    let cancellation = CancellationToken::new();
    cancel_on_ctrl_c(cancellation.clone());

    let mut client = AgentClient::connect(server, agent_id).await?;
    client
        .run(Arc::new(LocalCommandRunner::new()), cancellation)
        .await?;
    Ok(())
}
