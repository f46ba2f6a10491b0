//! Top-level module for the mesh hierarchy.
//!
//! This module provides the core types for representing and mutating the
//! multi-level interval mesh:
//! - Typed entity handles and the arena-backed ordered sequences they index into
//! - Vertex/element records and the per-level containers that own them
//! - The grid itself with its adaptation driver, neighbor resolution, and renumbering
//! - Iterator-based traversal and structural validation
//!
//! Most users will interact with [`grid::IntervalGrid`] and the borrowing accessors in [`traversal`].

pub mod cache;
pub mod entity;
pub mod grid;
pub mod handle;
pub mod level;
pub(crate) mod neighbor;
pub mod sequence;
pub mod traversal;
pub mod validation;

pub use cache::InvalidateCache;
pub use entity::{Element, Mark, Vertex};
pub use grid::{GridInfo, IntervalGrid, LevelCount, RefinementMode};
pub use handle::{ElemId, ElemKey, VertexId, VertexKey};
pub use level::Level;
pub use traversal::{
    ElemRef, HierarchicElements, LeafElements, LevelElements, LevelVertices, VertexRef,
};
pub use validation::validate_grid;
