//! Error taxonomy for the hybrid vector algebra and dispatch cache.
//!
//! Three kinds, matching the contracts each operator documents: a
//! [`PreconditionViolation`] is the caller's fault and leaves state
//! untouched, an [`HvaError::InvariantBreach`] means this crate's own
//! bookkeeping is wrong, and [`TkdcError::ResolverFailure`] means a
//! caller-supplied resolver misbehaved.

use thiserror::Error;

/// A caller-surfaced precondition failure. The operator that raised it is a
/// no-op with respect to state — nothing was mutated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PreconditionViolation {
    #[error("length mismatch: {a} vs {b}")]
    LengthMismatch { a: usize, b: usize },
    #[error("slot {slot} out of bounds for length {length}")]
    SlotOutOfBounds { slot: usize, length: usize },
    #[error("sparsity threshold {threshold} outside (0, 1)")]
    InvalidThreshold { threshold: String },
    #[error("invalid length/count: length={length}, count={count}")]
    InvalidShape { length: usize, count: usize },
}

/// Errors surfaced by hybrid vector algebra operators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HvaError {
    #[error(transparent)]
    PreconditionViolation(PreconditionViolation),

    /// An internal assertion failed: monotone indices violated, `count >
    /// length`, or a backing array smaller than `count`. Should never occur
    /// with correct inputs; treated as fatal rather than recoverable.
    #[error("invariant breach: {0}")]
    InvariantBreach(String),
}

// Written by hand rather than thiserror's `#[from]` so a precondition
// violation can be logged at the point it's raised, not just displayed.
impl From<PreconditionViolation> for HvaError {
    fn from(e: PreconditionViolation) -> Self {
        #[cfg(feature = "logging")]
        tracing::warn!(%e, "precondition violation");
        HvaError::PreconditionViolation(e)
    }
}

/// Errors surfaced by the typed kernel dispatch cache.
#[derive(Debug, Error)]
pub enum TkdcError {
    #[error("type tuple arity mismatch: expected {expected}, got {got}")]
    InvalidArity { expected: usize, got: usize },

    /// The resolver returned no callable or failed outright. Propagated
    /// unchanged; no cache entry is installed, so the next call retries.
    #[error("resolver failed: {0}")]
    ResolverFailure(String),
}
