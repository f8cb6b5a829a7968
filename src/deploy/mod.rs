// ABOUTME: Deployment orchestration: typestate machine, shift plan, gates, history.
// ABOUTME: Traffic moves between two fixed slots; rollback restores the old one.

mod deployment;
mod error;
mod gates;
mod guard;
mod plan;
mod record;
mod runner;
mod slots;
mod state;
mod transitions;

pub use deployment::Deployment;
pub use error::{DeployError, DeployErrorKind};
pub use gates::{
    AbortHandle, AbortSignal, ApprovalGate, ApprovalHandle, ApprovalState, Gates, abort_signal,
    approval_gate,
};
pub use guard::{ActiveDeployments, DeploymentTicket, TicketInfo};
pub use plan::{ShiftPlan, ShiftStep};
pub use record::{DeploymentRecord, DeploymentStatus, History, HistoryError};
pub use runner::execute;
pub use slots::{ListenerBinding, TrafficSlots};
pub use state::{Finished, Planned, Registered, Shifted};
pub use transitions::TransitionResult;
