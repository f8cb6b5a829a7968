// ABOUTME: Health check contract shared by both target groups.
// ABOUTME: Identical parameters on blue and green keep the swap transparent.

use serde::Deserialize;
use std::time::Duration;

/// HTTP health check parameters.
///
/// Both target groups are checked with the same contract so that which one
/// is "blue" can change without clients noticing.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthCheckConfig {
    #[serde(default = "default_path")]
    pub path: String,

    /// Port probed on each registered endpoint. Defaults to the container
    /// port when absent.
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Consecutive failed polls tolerated before a step is declared failed.
    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            port: None,
            interval: default_interval(),
            timeout: default_timeout(),
            retries: default_retries(),
        }
    }
}

fn default_path() -> String {
    "/health".to_string()
}

fn default_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_retries() -> u32 {
    3
}
