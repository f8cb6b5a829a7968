// ABOUTME: Deployment state marker types for the type state pattern.
// ABOUTME: Zero-sized types enforce valid state transitions at compile time.

/// Validated, shift plan computed, nothing touched yet.
/// Available actions: `register_candidate()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Planned;

/// Candidate task set registered against the idle target group and healthy;
/// production traffic still 100% on the current slot.
/// Available actions: `shift_traffic()`, `rollback()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Registered;

/// Forwarding weight reached 100% on the candidate.
/// Available actions: `finalize()`, `rollback()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Shifted;

/// Terminal: candidate promoted to the new current slot, old task set gone.
/// Available actions: `into_record()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Finished;
