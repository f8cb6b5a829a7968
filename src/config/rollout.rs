// ABOUTME: Traffic-shift policy configuration (canary, linear, all_at_once).
// ABOUTME: Carries the timing parameters the orchestrator's loop runs on.

use serde::Deserialize;
use std::time::Duration;

/// How the production listener's forwarding weight moves to the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftMode {
    /// Shift `percentage` once, hold for `interval`, then jump to 100%.
    Canary,
    /// Shift `percentage` more every `interval` until 100% is reached.
    Linear,
    /// Flip straight to 100% in a single step.
    AllAtOnce,
}

/// An immutable named traffic-shift policy.
///
/// Created once, referenced by every deployment of the service. Defaults
/// mirror the canonical canary profile: 50% held for five minutes, one hour
/// of approval wait, five minutes of termination wait.
#[derive(Debug, Clone, Deserialize)]
pub struct RolloutConfig {
    #[serde(default = "default_mode")]
    pub mode: ShiftMode,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_percentage")]
    pub percentage: u8,

    /// Manual sign-off window before the final cutover step.
    /// Absent means no approval gate.
    #[serde(default, with = "humantime_serde::option")]
    pub approval_wait: Option<Duration>,

    /// How long the superseded (or failed) task set is kept before teardown.
    #[serde(default = "default_termination_wait", with = "humantime_serde")]
    pub termination_wait: Duration,

    /// Hard ceiling for the whole deployment. Derived from the policy when
    /// absent.
    #[serde(default, with = "humantime_serde::option")]
    pub deadline: Option<Duration>,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            interval: default_interval(),
            percentage: default_percentage(),
            approval_wait: None,
            termination_wait: default_termination_wait(),
            deadline: None,
        }
    }
}

fn default_mode() -> ShiftMode {
    ShiftMode::Canary
}

fn default_interval() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_percentage() -> u8 {
    50
}

fn default_termination_wait() -> Duration {
    Duration::from_secs(5 * 60)
}
