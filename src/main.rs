// ABOUTME: Entry point for the cutover CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use cutover::config::{self, Config};
use cutover::deploy::{ActiveDeployments, Gates, History, approval_gate, execute};
use cutover::error::{Error, Result};
use cutover::output::{Output, OutputMode};
use cutover::platform::{EndpointAddr, HttpProbe, SimPlatform};
use cutover::types::ImageRef;
use std::env;
use std::io::{BufRead, Write as _};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let output = Output::new(mode);

    if let Err(e) = run(cli, output).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mut output: Output) -> Result<()> {
    match cli.command {
        Commands::Init {
            service,
            image,
            force,
        } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, service.as_deref(), image.as_deref(), force)?;
            output.success(&format!("wrote {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Plan => {
            let cwd = env::current_dir()?;
            let config = Config::discover(&cwd)?;
            print_plan(&config, &output);
            Ok(())
        }
        Commands::Deploy { image, approve } => {
            let cwd = env::current_dir()?;
            let mut config = Config::discover(&cwd)?;
            if let Some(i) = image {
                config.image =
                    ImageRef::parse(&i).map_err(|e| Error::InvalidConfig(e.to_string()))?;
            }
            deploy(config, approve, &mut output).await
        }
        Commands::Status => {
            let cwd = env::current_dir()?;
            let config = Config::discover(&cwd)?;
            status(&config, &output)
        }
        Commands::History { limit } => {
            let cwd = env::current_dir()?;
            let config = Config::discover(&cwd)?;
            let Some(path) = &config.history else {
                output.progress("no history file configured");
                return Ok(());
            };
            let records = History::new(path).read_all()?;
            let skip = records.len().saturating_sub(limit);
            for record in &records[skip..] {
                output.record(record);
            }
            Ok(())
        }
        Commands::Probe { host, port, path } => {
            let probe = HttpProbe::new(Duration::from_secs(5));
            let endpoint = EndpointAddr::new(host, port);
            let healthy = probe.check(&endpoint, &path).await?;
            if healthy {
                output.success(&format!("{endpoint}{path} healthy"));
                Ok(())
            } else {
                output.error(&format!("{endpoint}{path} unhealthy"));
                std::process::exit(1);
            }
        }
    }
}

fn print_plan(config: &Config, output: &Output) {
    let plan = cutover::deploy::ShiftPlan::build(&config.rollout);
    output.progress(&format!(
        "{} ({:?}): {} step(s)",
        config.service, config.rollout.mode, plan.len()
    ));
    for step in plan.steps() {
        output.progress(&format!(
            "  -> {:>3}%  hold {}",
            step.percent,
            humantime::format_duration(step.hold)
        ));
    }
    if let Some(wait) = config.rollout.approval_wait {
        output.progress(&format!(
            "  approval required before 100% (window {})",
            humantime::format_duration(wait)
        ));
    }
}

fn status(config: &Config, output: &Output) -> Result<()> {
    output.progress(&format!("Service: {}", config.service));
    output.progress(&format!("Image: {}", config.image));
    output.progress(&format!(
        "Rollout: {:?} ({}% per step, interval {})",
        config.rollout.mode,
        config.rollout.percentage,
        humantime::format_duration(config.rollout.interval)
    ));

    let group = cutover::platform::DeploymentGroupInfo::for_service(&config.service);
    output.progress(&format!("Deployment group: {}", group.deployment_group));
    output.progress(&format!("Application: {}", group.application));
    output.progress(&format!("Task definition: {}", group.task_definition));

    if let Some(path) = &config.history {
        if let Some(last) = History::new(path).latest_for(config.service.as_str())? {
            output.progress("Last deployment:");
            output.record(&last);
        }
    }
    Ok(())
}

/// Run a full deployment rehearsal against the simulated control plane:
/// provision the topology, then drive the real state machine over it.
async fn deploy(config: Config, approve: bool, output: &mut Output) -> Result<()> {
    let platform = SimPlatform::default();
    let topology = platform.provision(&config)?;

    output.start_timer();
    output.progress(&format!(
        "Deploying {} ({}) via {:?}",
        config.service, config.image, config.rollout.mode
    ));
    output.progress(&format!(
        "Listeners on {}: production :{}, test :{}",
        topology.load_balancer,
        topology.slots.production_port(),
        topology.slots.test_port()
    ));
    if !config.image.is_pinned() {
        output.progress("Note: image has no digest; the tag may move between runs");
    }

    let gates = if approve || config.rollout.approval_wait.is_none() {
        Gates::default()
    } else {
        let (handle, gate) = approval_gate();
        spawn_approval_prompt(handle);
        Gates {
            approval: gate,
            ..Gates::default()
        }
    };

    let history = config.history.clone().map(History::new);
    let registry = ActiveDeployments::new();
    let record = execute(
        config,
        &platform,
        topology.slots,
        &registry,
        gates,
        history.as_ref(),
    )
    .await?;

    output.record(&record);
    output.success("Deployment finished");
    Ok(())
}

/// Ask for sign-off on stdin without blocking the shift loop.
fn spawn_approval_prompt(handle: cutover::deploy::ApprovalHandle) {
    tokio::task::spawn_blocking(move || {
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "Shift remaining traffic to the new revision? [y/N] ");
        let _ = stderr.flush();

        let mut line = String::new();
        let answer = std::io::stdin().lock().read_line(&mut line);
        match answer {
            Ok(_) if line.trim().eq_ignore_ascii_case("y") => handle.approve(),
            _ => handle.reject(),
        }
    });
}
