// ABOUTME: Sealed trait pattern for platform traits.
// ABOUTME: Prevents external implementations, allowing non-breaking evolution.

/// Sealed trait to prevent external implementations.
///
/// Only in-crate platform backends implement the compute and balancer
/// traits, so new methods can be added without a semver break.
pub trait Sealed {}
