// ABOUTME: End-to-end deployment driver: ticket, state machine, rollback, history.
// ABOUTME: The one entry point callers use; owns the failure-handling policy.

use tracing::{info, warn};

use crate::config::Config;
use crate::platform::{BalancerOps, ComputeOps};

use super::deployment::Deployment;
use super::error::DeployError;
use super::gates::Gates;
use super::guard::ActiveDeployments;
use super::record::{DeploymentRecord, DeploymentStatus, History};
use super::slots::TrafficSlots;

/// Run one deployment from registration through finalize, rolling back on
/// in-flight failures.
///
/// The returned record is terminal. A rollback that succeeds is reported as
/// `Ok` with a `RolledBack` record: the system ended in a known-good state
/// and the record carries the cause. Errors are reserved for attempts that
/// never started (config, conflict) or left work behind (rollback failure,
/// infrastructure faults).
pub async fn execute<P>(
    config: Config,
    platform: &P,
    slots: TrafficSlots,
    registry: &ActiveDeployments,
    mut gates: Gates,
    history: Option<&History>,
) -> Result<DeploymentRecord, DeployError>
where
    P: ComputeOps + BalancerOps,
{
    let _ticket = registry.acquire(&config.service)?;

    let current = platform.active_task_set(&config.service).await?;

    // Re-deploying the already-active image is a no-op, not an error.
    if current.revision.image() == &config.image {
        info!(
            service = %config.service,
            image = %config.image,
            "active revision already runs this image"
        );
        let mut record = DeploymentRecord::begin(
            config.service.as_str(),
            &format!("{}-deployment-config", config.service),
            current.revision.to_string(),
            config.image.to_string(),
        );
        record.traffic_percent = 100;
        record.terminate(
            DeploymentStatus::Completed,
            Some("revision unchanged; no traffic shifted".to_string()),
        );
        append(history, &record);
        return Ok(record);
    }

    let planned = Deployment::prepare(config, slots, current)?;
    info!(
        service = %planned.service_name(),
        image = %planned.image(),
        steps = planned.plan().len(),
        "deployment starting"
    );

    // Registration failures never touched production traffic; there is
    // nothing to roll back.
    let registered = match planned.register_candidate(platform).await {
        Ok(d) => d,
        Err((failed, err)) => {
            let mut record = failed.record().clone();
            record.terminate(DeploymentStatus::Failed, Some(err.to_string()));
            append(history, &record);
            return Err(err);
        }
    };

    let shifted = match registered.shift_traffic(platform, &mut gates).await {
        Ok(d) => d,
        Err((failed, err)) => return recover(failed, platform, err, history).await,
    };

    let finished = match shifted.finalize(platform, &mut gates).await {
        Ok(d) => d,
        Err((failed, err)) => return recover(failed, platform, err, history).await,
    };

    info!(
        service = %finished.service_name(),
        revision = %finished.record().new_revision,
        "deployment completed"
    );
    let record = finished.into_record();
    append(history, &record);
    Ok(record)
}

/// Failure policy for in-flight errors: auto-rollback the triggers, surface
/// everything else untouched.
async fn recover<S, P>(
    deployment: Deployment<S>,
    platform: &P,
    err: DeployError,
    history: Option<&History>,
) -> Result<DeploymentRecord, DeployError>
where
    P: ComputeOps + BalancerOps,
{
    if !err.triggers_rollback() {
        let mut record = deployment.record().clone();
        record.terminate(DeploymentStatus::Failed, Some(err.to_string()));
        append(history, &record);
        return Err(err);
    }

    match super::transitions::roll_back(deployment, platform, &err).await {
        Ok(finished) => {
            let record = finished.into_record();
            append(history, &record);
            Ok(record)
        }
        Err(rollback_err) => {
            warn!(cause = %err, error = %rollback_err, "rollback failed");
            Err(rollback_err)
        }
    }
}

fn append(history: Option<&History>, record: &DeploymentRecord) {
    if let Some(h) = history {
        if let Err(e) = h.append(record) {
            warn!(error = %e, "failed to append deployment history");
        }
    }
}
