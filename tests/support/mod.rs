// ABOUTME: Shared helpers for integration tests.
// ABOUTME: Config builders and a spawner for concurrent deployments.

#![allow(dead_code)]

use cutover::config::{Config, ShiftMode};
use cutover::deploy::{
    ActiveDeployments, DeployError, DeploymentRecord, Gates, TrafficSlots, execute,
};
use cutover::platform::SimPlatform;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A config with the canonical canary profile and no history file.
pub fn test_config(mode: ShiftMode) -> Config {
    let mut config = Config::template();
    config.rollout.mode = mode;
    config.rollout.approval_wait = None;
    config.history = None;
    config
}

pub fn with_approval(mut config: Config, window: Duration) -> Config {
    config.rollout.approval_wait = Some(window);
    config
}

/// Run `execute` on its own task so the test can watch traffic move and
/// poke the gates while the deployment is mid-flight.
pub fn spawn_execute(
    config: Config,
    platform: &SimPlatform,
    slots: TrafficSlots,
    registry: &ActiveDeployments,
    gates: Gates,
) -> JoinHandle<Result<DeploymentRecord, DeployError>> {
    let platform = platform.clone();
    let registry = registry.clone();
    tokio::spawn(async move { execute(config, &platform, slots, &registry, gates, None).await })
}
