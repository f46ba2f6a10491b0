//! # interval-mesh
//!
//! interval-mesh is a hierarchical one-dimensional mesh library for finite-element and
//! PDE discretization codes. It maintains a topologically consistent, multi-level,
//! adaptively refined hierarchy of interval elements: geometrically adjacent elements
//! share vertex objects instead of duplicating them, and the full traversal interface
//! (per-level, hierarchical, leaf) stays correct while the hierarchy is mutated in place.
//!
//! ## Features
//! - Per-level ordered entity storage with O(1) anchored insertion and removal
//! - Bisection refinement driven by per-element marks, with neighbor-resolved vertex
//!   sharing across element boundaries
//! - Optional copy closure so every level tessellates the whole domain
//! - Invariant-derived coarsening of marked sibling groups
//! - Contiguous per-level renumbering after every structural change
//! - Reference-element and local↔global geometry queries for assembly code
//!
//! ## Usage
//! ```rust
//! use interval_mesh::prelude::*;
//!
//! let mut grid = IntervalGrid::uniform(4, 0.0, 1.0)?;
//! let target = grid
//!     .level_elements(0)?
//!     .find(|e| e.geometry().contains(0.3))
//!     .map(|e| e.id())
//!     .unwrap();
//! grid.mark(target, Mark::Refine)?;
//! grid.pre_adapt();
//! assert!(grid.adapt()?);
//! grid.post_adapt();
//! assert_eq!(grid.max_level(), 1);
//! # Ok::<(), interval_mesh::MeshError>(())
//! ```
//!
//! Indices and leaf views are reassigned wholesale by every `adapt()` call; re-fetch
//! them instead of caching across passes.

// Re-export our major subsystems:
pub mod debug_invariants;
pub mod geometry;
pub mod mesh_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;
pub use mesh_error::MeshError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::geometry::interval::IntervalGeometry;
    pub use crate::geometry::reference::ReferenceElement;
    pub use crate::mesh_error::MeshError;
    pub use crate::topology::cache::InvalidateCache;
    pub use crate::topology::entity::Mark;
    pub use crate::topology::grid::{GridInfo, IntervalGrid, RefinementMode};
    pub use crate::topology::handle::{ElemId, VertexId};
    pub use crate::topology::traversal::{ElemRef, VertexRef};
    pub use crate::topology::validation::validate_grid;
}
