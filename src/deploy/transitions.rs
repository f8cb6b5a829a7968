// ABOUTME: State transitions for Deployment: register, shift, finalize, rollback.
// ABOUTME: Each transition consumes the deployment and returns the next state or the failed one.

use std::marker::PhantomData;
use std::time::Duration;

use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, info, warn};

use crate::platform::{BalancerOps, ComputeOps, WeightedTarget};

use super::deployment::Deployment;
use super::error::DeployError;
use super::gates::Gates;
use super::record::DeploymentStatus;
use super::state::{Finished, Planned, Registered, Shifted};

/// Outcome of a transition: the next state on success, or the deployment in
/// its prior state alongside the error so the caller can roll back.
pub type TransitionResult<T, S> = Result<Deployment<T>, (Deployment<S>, DeployError)>;

impl<S> Deployment<S> {
    fn transition<T>(self) -> Deployment<T> {
        Deployment {
            config: self.config,
            plan: self.plan,
            slots: self.slots,
            current: self.current,
            candidate: self.candidate,
            record: self.record,
            ceiling: self.ceiling,
            deadline: self.deadline,
            _state: PhantomData,
        }
    }

    fn ensure_deadline(&self) -> Result<(), DeployError> {
        if Instant::now() >= self.deadline {
            return Err(DeployError::DeadlineExceeded(self.ceiling));
        }
        Ok(())
    }

    /// Set the candidate's share of production traffic. Weights are applied
    /// atomically on the production listener; the test listener always points
    /// wholly at the candidate and is not touched here.
    async fn apply_percent<P>(&mut self, platform: &P, percent: u8) -> Result<(), DeployError>
    where
        P: BalancerOps,
    {
        let weights = [
            WeightedTarget::new(self.slots.current().clone(), 100 - percent),
            WeightedTarget::new(self.slots.candidate().clone(), percent),
        ];
        platform
            .set_forward_weights(self.slots.production_listener(), &weights)
            .await?;
        self.record.traffic_percent = percent;
        info!(
            service = %self.config.service,
            percent,
            "traffic shifted"
        );
        Ok(())
    }

    /// Sleep for `hold`, waking early if the abort handle fires or the hard
    /// deadline passes. A hold never outlives the deadline: traffic must not
    /// stay split past the ceiling.
    async fn sleep_or_abort(&self, gates: &mut Gates, hold: Duration) -> Result<(), DeployError> {
        tokio::select! {
            () = sleep(hold) => Ok(()),
            () = sleep_until(self.deadline) => Err(DeployError::DeadlineExceeded(self.ceiling)),
            () = gates.abort.triggered() => Err(DeployError::Aborted),
        }
    }

    /// Poll candidate health until `hold` elapses. Consecutive unhealthy
    /// verdicts beyond the configured retry count fail the deployment.
    async fn monitor<P>(&self, platform: &P, gates: &mut Gates, hold: Duration) -> Result<(), DeployError>
    where
        P: BalancerOps,
    {
        let end = Instant::now() + hold;
        let mut failures = 0u32;
        loop {
            let remaining = end.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(());
            }
            let slice = remaining.min(self.config.healthcheck.interval);
            self.sleep_or_abort(gates, slice).await?;

            if self.candidate_healthy(platform).await? {
                failures = 0;
            } else {
                failures += 1;
                warn!(
                    service = %self.config.service,
                    failures,
                    retries = self.config.healthcheck.retries,
                    "candidate unhealthy"
                );
                if failures > self.config.healthcheck.retries {
                    return Err(DeployError::HealthCheck(format!(
                        "candidate unhealthy after {failures} consecutive checks"
                    )));
                }
            }
        }
    }

    /// A candidate with zero registered targets is unhealthy: it cannot
    /// serve the traffic the plan is about to hand it.
    async fn candidate_healthy<P>(&self, platform: &P) -> Result<bool, DeployError>
    where
        P: BalancerOps,
    {
        let health = platform.target_health(self.slots.candidate()).await?;
        if health.is_empty() {
            return Ok(false);
        }
        Ok(health.iter().all(|h| h.is_healthy()))
    }
}

impl Deployment<Planned> {
    /// Register the candidate revision: start tasks from the new image, attach
    /// them to the candidate target group, and route the test listener at them.
    /// Production traffic is pinned to the current target group until the
    /// first shift step.
    pub async fn register_candidate<P>(mut self, platform: &P) -> TransitionResult<Registered, Planned>
    where
        P: ComputeOps + BalancerOps,
    {
        if let Err(e) = self.ensure_deadline() {
            return Err((self, e));
        }

        let task_set = match platform
            .register_revision(
                &self.config.service,
                &self.config.image,
                self.config.desired_count,
                self.config.startup_window,
            )
            .await
        {
            Ok(ts) => ts,
            Err(e) => return Err((self, e.into())),
        };
        debug!(
            service = %self.config.service,
            revision = %task_set.revision,
            tasks = task_set.endpoints.len(),
            "candidate revision registered"
        );

        if let Err(e) = self.wire_candidate(platform, &task_set).await {
            // Partial failure: tear the candidate back down before reporting.
            if let Err(cleanup) = platform
                .terminate_task_set(&self.config.service, &task_set.id)
                .await
            {
                warn!(error = %cleanup, "candidate cleanup failed after wiring error");
            }
            return Err((self, e));
        }

        self.record.new_revision = task_set.revision.to_string();
        self.record.status = DeploymentStatus::InProgress;
        self.candidate = Some(task_set);
        Ok(self.transition())
    }

    async fn wire_candidate<P>(
        &self,
        platform: &P,
        task_set: &crate::platform::TaskSet,
    ) -> Result<(), DeployError>
    where
        P: BalancerOps,
    {
        platform
            .register_targets(self.slots.candidate(), &task_set.endpoints)
            .await?;

        // Test listener: candidate only, reachable for pre-shift validation.
        platform
            .set_forward_weights(
                self.slots.test_listener(),
                &[WeightedTarget::new(self.slots.candidate().clone(), 100)],
            )
            .await?;

        // Production listener: explicit 100/0 so the weight pair exists
        // before the first shift step mutates it.
        platform
            .set_forward_weights(
                self.slots.production_listener(),
                &[
                    WeightedTarget::new(self.slots.current().clone(), 100),
                    WeightedTarget::new(self.slots.candidate().clone(), 0),
                ],
            )
            .await?;
        Ok(())
    }
}

impl Deployment<Registered> {
    /// Walk the shift plan: for each step, move traffic, then hold while
    /// monitoring candidate health. If an approval gate is configured, it is
    /// consulted once, before the step that takes the candidate to 100%.
    pub async fn shift_traffic<P>(
        mut self,
        platform: &P,
        gates: &mut Gates,
    ) -> TransitionResult<Shifted, Registered>
    where
        P: BalancerOps,
    {
        match self.run_shift(platform, gates).await {
            Ok(()) => Ok(self.transition()),
            Err(e) => Err((self, e)),
        }
    }

    async fn run_shift<P>(&mut self, platform: &P, gates: &mut Gates) -> Result<(), DeployError>
    where
        P: BalancerOps,
    {
        let steps: Vec<_> = self.plan.steps().cloned().collect();
        let last = steps.len() - 1;

        for (idx, step) in steps.into_iter().enumerate() {
            self.ensure_deadline()?;
            if gates.abort.is_aborted() {
                return Err(DeployError::Aborted);
            }

            if idx == last {
                self.await_approval(gates).await?;
            }

            self.apply_percent(platform, step.percent).await?;
            self.monitor(platform, gates, step.hold).await?;
        }
        Ok(())
    }

    /// Block on the approval gate before handing the candidate full traffic.
    /// With no gate configured the wait resolves immediately. The window is
    /// capped at whatever remains of the hard deadline.
    async fn await_approval(&self, gates: &mut Gates) -> Result<(), DeployError> {
        let window = self
            .config
            .rollout
            .approval_wait
            .unwrap_or(Duration::ZERO)
            .min(self.deadline.saturating_duration_since(Instant::now()));
        let Gates { approval, abort } = gates;
        tokio::select! {
            res = approval.wait(window) => res,
            () = abort.triggered() => Err(DeployError::Aborted),
        }
    }
}

impl Deployment<Shifted> {
    /// Candidate owns production. Wait out the termination window while still
    /// watching health, then retire the old revision and swap slot roles so
    /// the next deployment targets the now-idle group.
    pub async fn finalize<P>(mut self, platform: &P, gates: &mut Gates) -> TransitionResult<Finished, Shifted>
    where
        P: ComputeOps + BalancerOps,
    {
        match self.run_finalize(platform, gates).await {
            Ok(()) => Ok(self.transition()),
            Err(e) => Err((self, e)),
        }
    }

    async fn run_finalize<P>(&mut self, platform: &P, gates: &mut Gates) -> Result<(), DeployError>
    where
        P: ComputeOps + BalancerOps,
    {
        self.monitor(platform, gates, self.config.rollout.termination_wait)
            .await?;

        let candidate = self
            .candidate
            .take()
            .expect("shifted deployment has a candidate task set");

        let old = std::mem::replace(&mut self.current, candidate);
        info!(
            service = %self.config.service,
            old = %old.revision,
            new = %self.current.revision,
            "retiring previous revision"
        );

        platform.drain_task_set(&self.config.service, &old.id).await?;
        platform
            .deregister_targets(self.slots.current(), &old.endpoints)
            .await?;
        platform.promote_revision(&self.config.service, &self.current.id).await?;
        platform
            .terminate_task_set(&self.config.service, &old.id)
            .await?;

        // Swap slot roles: the group that just served the candidate is now
        // current, and the drained group becomes the next candidate slot.
        self.slots = self.slots.clone().promote();
        platform
            .set_forward_weights(
                self.slots.production_listener(),
                &[
                    WeightedTarget::new(self.slots.current().clone(), 100),
                    WeightedTarget::new(self.slots.candidate().clone(), 0),
                ],
            )
            .await?;
        platform
            .set_forward_weights(
                self.slots.test_listener(),
                &[WeightedTarget::new(self.slots.candidate().clone(), 100)],
            )
            .await?;

        self.record.traffic_percent = 100;
        self.record.terminate(DeploymentStatus::Completed, None);
        Ok(())
    }
}

impl Deployment<Registered> {
    /// Undo a failed deployment: pin all production traffic back to the
    /// current revision, then tear down the candidate.
    pub async fn rollback<P>(self, platform: &P, cause: &DeployError) -> Result<Deployment<Finished>, DeployError>
    where
        P: ComputeOps + BalancerOps,
    {
        roll_back(self, platform, cause).await
    }
}

impl Deployment<Shifted> {
    pub async fn rollback<P>(self, platform: &P, cause: &DeployError) -> Result<Deployment<Finished>, DeployError>
    where
        P: ComputeOps + BalancerOps,
    {
        roll_back(self, platform, cause).await
    }
}

pub(crate) async fn roll_back<S, P>(
    mut deployment: Deployment<S>,
    platform: &P,
    cause: &DeployError,
) -> Result<Deployment<Finished>, DeployError>
where
    P: ComputeOps + BalancerOps,
{
    warn!(
        service = %deployment.config.service,
        cause = %cause,
        "rolling back"
    );

    // Restoring production traffic is the one step that must succeed.
    let restore = platform
        .set_forward_weights(
            deployment.slots.production_listener(),
            &[
                WeightedTarget::new(deployment.slots.current().clone(), 100),
                WeightedTarget::new(deployment.slots.candidate().clone(), 0),
            ],
        )
        .await;
    if let Err(e) = restore {
        return Err(DeployError::RollbackFailed(format!(
            "could not restore production traffic: {e}"
        )));
    }
    deployment.record.traffic_percent = 0;
    info!(service = %deployment.config.service, "production traffic restored");

    // The failed tasks carry the state an operator may want to inspect, so
    // they stay up for the termination wait before teardown. Teardown itself
    // is best effort; failures here only log.
    if let Some(candidate) = deployment.candidate.take() {
        sleep(deployment.config.rollout.termination_wait).await;
        if let Err(e) = platform
            .deregister_targets(deployment.slots.candidate(), &candidate.endpoints)
            .await
        {
            warn!(error = %e, "failed to deregister candidate targets");
        }
        let service = &deployment.config.service;
        if let Err(e) = platform.drain_task_set(service, &candidate.id).await {
            warn!(error = %e, "failed to drain candidate task set");
        }
        if let Err(e) = platform.terminate_task_set(service, &candidate.id).await {
            warn!(error = %e, "failed to terminate candidate task set");
        }
    }

    deployment
        .record
        .terminate(DeploymentStatus::RolledBack, Some(cause.to_string()));
    Ok(deployment.transition())
}
