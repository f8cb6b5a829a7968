// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cutover")]
#[command(about = "Blue-green deployments with stepwise traffic shifting")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output (only final result)
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// JSON lines output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new cutover.yml configuration file
    Init {
        /// Service name to pre-fill
        #[arg(short, long)]
        service: Option<String>,

        /// Container image to pre-fill
        #[arg(short, long)]
        image: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the traffic-shift schedule without deploying
    Plan,

    /// Run a deployment rehearsal against a simulated control plane
    Deploy {
        /// Image to deploy (overrides the configured one)
        #[arg(short, long)]
        image: Option<String>,

        /// Approve the final shift without waiting
        #[arg(short = 'y', long)]
        approve: bool,
    },

    /// Show the configured service and its rollout policy
    Status,

    /// Show past deployments from the history file
    History {
        /// Show at most this many records, newest last
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },

    /// Probe an HTTP health endpoint once and report the verdict
    Probe {
        /// Host to connect to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to connect to
        #[arg(short, long)]
        port: u16,

        /// Path to request
        #[arg(long, default_value = "/health")]
        path: String,
    },
}
