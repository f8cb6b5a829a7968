// ABOUTME: External signals the shift loop suspends on: approval and abort.
// ABOUTME: Watch-channel based so triggering is idempotent and observable.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::error::DeployError;

/// Decision state of the manual sign-off gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalState {
    Pending,
    Approved,
    Rejected,
}

/// Operator side of the approval gate.
#[derive(Clone)]
pub struct ApprovalHandle {
    tx: Arc<watch::Sender<ApprovalState>>,
}

impl ApprovalHandle {
    pub fn approve(&self) {
        self.tx.send_replace(ApprovalState::Approved);
    }

    pub fn reject(&self) {
        self.tx.send_replace(ApprovalState::Rejected);
    }
}

/// Orchestrator side of the approval gate.
#[derive(Clone)]
pub struct ApprovalGate {
    rx: watch::Receiver<ApprovalState>,
}

impl ApprovalGate {
    /// A gate that is already approved; the final cutover proceeds
    /// immediately.
    pub fn auto() -> Self {
        let (_tx, rx) = watch::channel(ApprovalState::Approved);
        Self { rx }
    }

    /// Block until the gate is decided, up to `window`.
    ///
    /// The window bounds only this gate, not the whole deployment; the hard
    /// deadline is enforced separately by the shift loop.
    pub async fn wait(&mut self, window: Duration) -> Result<(), DeployError> {
        let decided = async {
            loop {
                match *self.rx.borrow_and_update() {
                    ApprovalState::Approved => return Ok(()),
                    ApprovalState::Rejected => return Err(DeployError::ApprovalRejected),
                    ApprovalState::Pending => {}
                }
                if self.rx.changed().await.is_err() {
                    // Handle dropped while pending: nobody can ever approve.
                    return Err(DeployError::ApprovalRejected);
                }
            }
        };

        match tokio::time::timeout(window, decided).await {
            Ok(result) => result,
            Err(_) => Err(DeployError::DeadlineExceeded(window)),
        }
    }
}

/// Create a linked approval gate pair.
pub fn approval_gate() -> (ApprovalHandle, ApprovalGate) {
    let (tx, rx) = watch::channel(ApprovalState::Pending);
    (
        ApprovalHandle { tx: Arc::new(tx) },
        ApprovalGate { rx },
    )
}

/// Operator side of the abort signal. Triggering twice is a no-op.
#[derive(Clone)]
pub struct AbortHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl AbortHandle {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Orchestrator side of the abort signal.
#[derive(Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve when (or as soon as) the abort is triggered.
    pub async fn triggered(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Handle gone without aborting: wait forever.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a linked abort signal pair.
pub fn abort_signal() -> (AbortHandle, AbortSignal) {
    let (tx, rx) = watch::channel(false);
    (AbortHandle { tx: Arc::new(tx) }, AbortSignal { rx })
}

/// The external gates one deployment listens to.
#[derive(Clone)]
pub struct Gates {
    pub approval: ApprovalGate,
    pub abort: AbortSignal,
}

impl Default for Gates {
    fn default() -> Self {
        Self {
            approval: ApprovalGate::auto(),
            abort: AbortSignal::never(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn auto_gate_is_pre_approved() {
        let mut gate = ApprovalGate::auto();
        gate.wait(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn rejection_reports_as_rejected() {
        let (handle, mut gate) = approval_gate();
        handle.reject();
        let err = gate.wait(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, DeployError::ApprovalRejected));
    }

    #[tokio::test(start_paused = true)]
    async fn undecided_gate_expires_with_the_window() {
        let (_handle, mut gate) = approval_gate();
        let err = gate.wait(Duration::from_secs(30)).await.unwrap_err();
        assert!(matches!(err, DeployError::DeadlineExceeded(_)));
    }

    #[tokio::test]
    async fn abort_trigger_is_idempotent() {
        let (handle, mut signal) = abort_signal();
        assert!(!signal.is_aborted());
        handle.trigger();
        handle.trigger();
        assert!(signal.is_aborted());
        signal.triggered().await;
    }
}
