//! Attest daemon: entry point for running an attest node or a scripted
//! simulation of the gossiper and verifier paths.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use attest_gossipers::Ed25519ProofVerifier;
use attest_node::{
    AttestNode, LogFormat, NodeConfig, Simulation, TrainingScenario, VerificationScenario,
};
use attest_nullables::MemoryLedger;
use attest_types::SystemClock;
use attest_utils::format_duration;
use clap::Parser;

#[derive(Parser)]
#[command(name = "attest-daemon", about = "Stake-weighted commit-reveal verification node")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base; CLI
    /// flags and env vars override them.
    #[arg(long, global = true, env = "ATTEST_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, global = true, env = "ATTEST_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, global = true, env = "ATTEST_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Feed audit events into Prometheus metrics.
    #[arg(long, global = true, env = "ATTEST_ENABLE_METRICS")]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the node until SIGINT/SIGTERM.
    Run,
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Drive one channel or challenge end to end on an in-memory ledger and
    /// print the report as JSON.
    Simulate {
        #[command(subcommand)]
        scenario: SimulateScenario,
    },
}

#[derive(clap::Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
}

#[derive(clap::Subcommand)]
enum SimulateScenario {
    /// Gossiper pool: proof-of-training channel.
    Training {
        #[arg(long, default_value_t = 3)]
        gossipers: u8,
        #[arg(long, default_value_t = 3)]
        k: usize,
        #[arg(long, default_value_t = 3)]
        m: usize,
        /// Reserved gossipers that sign a different result.
        #[arg(long, default_value_t = 0)]
        dissenters: usize,
        /// Reserved gossipers that never submit.
        #[arg(long, default_value_t = 0)]
        silent: usize,
        #[arg(long, default_value_t = 100)]
        stake_per_slot: u128,
    },
    /// Verifier pool: commit-reveal challenge.
    Verification {
        #[arg(long, default_value_t = 3)]
        verifiers: u8,
        #[arg(long, default_value_t = 3)]
        k: usize,
        /// Reserved verifiers that never commit.
        #[arg(long, default_value_t = 0)]
        abstainers: usize,
        /// Reserved verifiers that vote against the model.
        #[arg(long, default_value_t = 0)]
        dissenters: usize,
        #[arg(long, default_value_t = 100)]
        stake_per_slot: u128,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    config.enable_metrics |= cli.metrics;
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    attest_node::init_logging(config.log_format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!(path = %path.display(), "loaded config");
    }

    match cli.command {
        Command::Run => run(config).await?,
        Command::Config {
            action: ConfigAction::Show,
        } => print!("{}", config.to_toml_string()?),
        Command::Simulate { scenario } => {
            let report = tokio::task::spawn_blocking(move || simulate(config, scenario))
                .await
                .context("simulation task failed")??;
            println!("{report}");
        }
    }
    Ok(())
}

async fn run(config: NodeConfig) -> anyhow::Result<()> {
    let metrics_enabled = config.enable_metrics;
    tracing::info!(
        sweep_every = %format_duration(Duration::from_secs(config.sweep_interval_secs)),
        commit_window = %format_duration(Duration::from_secs(config.verifiers.commit_timeout_secs)),
        reveal_window = %format_duration(Duration::from_secs(config.verifiers.reveal_timeout_secs)),
        audit_log_capacity = config.audit_log_capacity,
        "starting attest node"
    );
    // The token ledger is an external collaborator; standalone runs keep
    // balances in memory.
    let mut node = AttestNode::new(
        config,
        Arc::new(MemoryLedger::new()),
        Arc::new(SystemClock),
        Arc::new(Ed25519ProofVerifier),
    )?;
    node.start();

    let signals = attest_node::ShutdownController::new();
    signals.wait_for_signal().await?;
    node.stop().await;

    if metrics_enabled {
        tracing::info!(metrics = %node.metrics().encode()?, "final metrics");
    }
    tracing::info!("attest daemon exited cleanly");
    Ok(())
}

fn simulate(config: NodeConfig, scenario: SimulateScenario) -> anyhow::Result<String> {
    let mut simulation = Simulation::new(config)?;
    let report = match scenario {
        SimulateScenario::Training {
            gossipers,
            k,
            m,
            dissenters,
            silent,
            stake_per_slot,
        } => {
            let report = simulation.run_training(&TrainingScenario {
                gossipers,
                required_k: k,
                threshold_m: m,
                dissenters,
                silent,
                stake_per_slot,
            })?;
            serde_json::to_string_pretty(&report)?
        }
        SimulateScenario::Verification {
            verifiers,
            k,
            abstainers,
            dissenters,
            stake_per_slot,
        } => {
            let report = simulation.run_verification(&VerificationScenario {
                verifiers,
                k_verifiers: k,
                abstainers,
                dissenters,
                stake_per_slot,
                ..VerificationScenario::default()
            })?;
            serde_json::to_string_pretty(&report)?
        }
    };
    Ok(report)
}
