// ABOUTME: Shift plan computation: turns a rollout policy into weight steps.
// ABOUTME: Pure data; the transition loop executes it against the balancer.

use nonempty::NonEmpty;
use std::time::Duration;

use crate::config::{RolloutConfig, ShiftMode};

/// One step of the traffic shift: set the candidate's weight to `percent`,
/// then hold for `hold` while health stays green.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftStep {
    pub percent: u8,
    pub hold: Duration,
}

/// The full schedule of weight steps for one deployment.
///
/// Always ends at exactly 100%; building the plan cannot produce a schedule
/// that leaves traffic split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftPlan {
    steps: NonEmpty<ShiftStep>,
}

impl ShiftPlan {
    /// Build the schedule for a rollout policy.
    ///
    /// The caller validates the policy first (percentage in 1..=100,
    /// non-zero interval for canary/linear).
    pub fn build(rollout: &RolloutConfig) -> Self {
        let raw = match rollout.mode {
            ShiftMode::AllAtOnce => vec![ShiftStep {
                percent: 100,
                hold: Duration::ZERO,
            }],
            ShiftMode::Canary => vec![
                ShiftStep {
                    percent: rollout.percentage.min(100),
                    hold: rollout.interval,
                },
                ShiftStep {
                    percent: 100,
                    hold: Duration::ZERO,
                },
            ],
            ShiftMode::Linear => {
                let step = u16::from(rollout.percentage.clamp(1, 100));
                let mut percent = 0u16;
                let mut steps = Vec::new();
                while percent < 100 {
                    percent = (percent + step).min(100);
                    steps.push(ShiftStep {
                        percent: percent as u8,
                        hold: if percent < 100 {
                            rollout.interval
                        } else {
                            Duration::ZERO
                        },
                    });
                }
                steps
            }
        };

        Self {
            steps: normalize(raw),
        }
    }

    pub fn steps(&self) -> impl Iterator<Item = &ShiftStep> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// The final step, always at 100%.
    pub fn final_step(&self) -> &ShiftStep {
        self.steps.last()
    }

    /// Sum of all hold windows; one input to the overall hard deadline.
    pub fn total_hold(&self) -> Duration {
        self.steps.iter().map(|s| s.hold).sum()
    }
}

/// Collapse the raw schedule into a strictly increasing one.
///
/// Two steps that would land on the same interval tick (zero hold between
/// them) collapse into the later step, and duplicate percentages drop out.
fn normalize(raw: Vec<ShiftStep>) -> NonEmpty<ShiftStep> {
    let mut steps: Vec<ShiftStep> = Vec::with_capacity(raw.len());
    for step in raw {
        match steps.last_mut() {
            Some(prev) if prev.hold.is_zero() || prev.percent >= step.percent => {
                // Same tick or non-increasing: the later step wins, keeping
                // whatever hold it carries.
                prev.percent = prev.percent.max(step.percent);
                prev.hold = step.hold;
            }
            _ => steps.push(step),
        }
    }

    debug_assert_eq!(steps.last().map(|s| s.percent), Some(100));
    NonEmpty::from_vec(steps).expect("a shift plan always has at least the final 100% step")
}
