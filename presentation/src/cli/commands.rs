//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for run results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One row per agent and iteration
    Table,
    /// The full outcome as pretty-printed JSON
    Json,
}

/// CLI arguments for benchfleet
#[derive(Parser, Debug)]
#[command(name = "benchfleet")]
#[command(author, version, about = "Distributed benchmark coordinator")]
#[command(long_about = r#"
benchfleet runs network and system benchmarks on a fleet of agents and
collects one result record per agent.

Agents poll the coordinator over TCP. The coordinator waits for the whole
fleet to join, then runs each configured test with a synchronized start time,
ramping concurrency up as the test's progression asks.

Configuration files are loaded from (in priority order):
1. --config <path>          Explicit config file
2. ./benchfleet.toml        Project-level config
3. ~/.config/benchfleet/config.toml   Global config

Example:
  benchfleet serve --config lab.toml
  benchfleet agent --server 10.0.0.1:5999 --agent-id m1
  benchfleet local -o json
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Coordinate the configured fleet and run every test
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,

        /// Output format (overrides output.format)
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,

        /// Append run events to this JSONL file (overrides output.event_log)
        #[arg(long, value_name = "PATH")]
        event_log: Option<PathBuf>,
    },

    /// Run every configured test on this machine only
    Local {
        /// Output format (overrides output.format)
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },

    /// Run as a fleet agent
    Agent {
        /// Coordinator address
        #[arg(long, value_name = "ADDR")]
        server: String,

        /// Id of this agent, as listed in the coordinator's [[agents]]
        #[arg(long, value_name = "ID")]
        agent_id: String,
    },

    /// Show configuration file locations and exit
    ShowConfig,
}
