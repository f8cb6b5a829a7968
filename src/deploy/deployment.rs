// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: Carries config, the shift plan, the slot pair, and the record.

use std::marker::PhantomData;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::Config;
use crate::platform::TaskSet;
use crate::types::{ImageRef, ServiceName};

use super::error::DeployError;
use super::plan::ShiftPlan;
use super::record::DeploymentRecord;
use super::slots::TrafficSlots;
use super::state::{Finished, Planned, Registered, Shifted};

/// A deployment in progress, parameterized by its current state.
///
/// Transitions consume `self` and return the next state, so the compiler
/// rejects out-of-order operations (finalizing before shifting, shifting
/// before a candidate exists).
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) config: Config,
    pub(crate) plan: ShiftPlan,
    pub(crate) slots: TrafficSlots,
    pub(crate) current: TaskSet,
    pub(crate) candidate: Option<TaskSet>,
    pub(crate) record: DeploymentRecord,
    pub(crate) ceiling: Duration,
    pub(crate) deadline: Instant,
    pub(crate) _state: PhantomData<S>,
}

impl Deployment<Planned> {
    /// Validate the config, compute the shift plan, and open the record.
    ///
    /// `current` is the task set serving production right now; it stays
    /// untouched until the deployment completes.
    pub fn prepare(
        config: Config,
        slots: TrafficSlots,
        current: TaskSet,
    ) -> Result<Self, DeployError> {
        config
            .validate()
            .map_err(|e| DeployError::Configuration(e.to_string()))?;

        let plan = ShiftPlan::build(&config.rollout);

        // Hard ceiling for the whole run: approval + shifting + termination
        // wait, plus one interval of slack for the final flip.
        let ceiling = config.rollout.deadline.unwrap_or_else(|| {
            config.startup_window
                + config.rollout.approval_wait.unwrap_or_default()
                + plan.total_hold()
                + config.rollout.termination_wait
                + config.rollout.interval
        });

        let record = DeploymentRecord::begin(
            config.service.as_str(),
            &format!("{}-deployment-config", config.service),
            current.revision.to_string(),
            config.image.to_string(),
        );

        Ok(Deployment {
            config,
            plan,
            slots,
            current,
            candidate: None,
            record,
            ceiling,
            deadline: Instant::now() + ceiling,
            _state: PhantomData,
        })
    }
}

impl<S> Deployment<S> {
    pub fn service_name(&self) -> &ServiceName {
        &self.config.service
    }

    /// The image the candidate revision is built from.
    pub fn image(&self) -> &ImageRef {
        &self.config.image
    }

    pub fn plan(&self) -> &ShiftPlan {
        &self.plan
    }

    pub fn slots(&self) -> &TrafficSlots {
        &self.slots
    }

    pub fn record(&self) -> &DeploymentRecord {
        &self.record
    }

    /// Candidate's current share of production traffic.
    pub fn traffic_percent(&self) -> u8 {
        self.record.traffic_percent
    }
}

impl Deployment<Registered> {
    pub fn candidate(&self) -> &TaskSet {
        self.candidate
            .as_ref()
            .expect("registered deployment has a candidate task set")
    }
}

impl Deployment<Shifted> {
    pub fn candidate(&self) -> &TaskSet {
        self.candidate
            .as_ref()
            .expect("shifted deployment has a candidate task set")
    }
}

impl Deployment<Finished> {
    /// Consume the terminal deployment, yielding its record.
    pub fn into_record(self) -> DeploymentRecord {
        self.record
    }
}
