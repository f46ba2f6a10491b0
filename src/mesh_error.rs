//! MeshError: unified error type for the interval-mesh public APIs.
//!
//! Every fallible operation in this crate reports through this enum so
//! callers can match on one type. Absent neighbors and already-existing
//! upper vertices are *not* errors; they are signaled with `Option` and
//! consumed as ordinary control flow inside the refinement pass.

use thiserror::Error;

/// Unified error type for interval-mesh operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// Iteration or marking was requested on a level outside `[0, max_level]`.
    #[error("level {level} out of range (maximum level is {max_level})")]
    InvalidLevel { level: usize, max_level: usize },
    /// Reference-geometry request for a dimension this crate does not implement.
    #[error("reference geometry is not implemented for dimension {0}")]
    UnsupportedDimension(usize),
    /// A seed mesh could not be built from the given input.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// An element key did not resolve on its level, e.g. after coarsening.
    #[error("no element with the given key on level {level}")]
    UnknownElement { level: usize },
    /// A vertex key did not resolve on its level.
    #[error("no vertex with the given key on level {level}")]
    UnknownVertex { level: usize },
    /// A sequence mutation was anchored on a vacant or out-of-bounds slot.
    #[error("anchor slot {0} is vacant or out of bounds")]
    InvalidAnchor(usize),
    /// A structural invariant check failed. Returned by explicit validation only.
    #[error("grid invariant violated: {0}")]
    InvariantViolation(String),
}
