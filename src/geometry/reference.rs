//! Reference elements for the supported dimensions.
//!
//! Only the point (dimension 0) and the unit interval (dimension 1) are
//! implemented; requesting a higher dimension yields
//! [`MeshError::UnsupportedDimension`] so callers porting this toolkit to
//! 2D/3D fail loudly instead of integrating over a missing table.

use crate::mesh_error::MeshError;

/// The reference simplex of a supported dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReferenceElement {
    dimension: usize,
}

impl ReferenceElement {
    /// Reference simplex for `dimension`; only 0 and 1 are implemented.
    pub fn simplex(dimension: usize) -> Result<Self, MeshError> {
        if dimension > 1 {
            return Err(MeshError::UnsupportedDimension(dimension));
        }
        Ok(Self { dimension })
    }

    /// The unit interval `[0, 1]`.
    pub fn interval() -> Self {
        Self { dimension: 1 }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of corners: `dimension + 1`.
    pub fn corner_count(&self) -> usize {
        self.dimension + 1
    }

    /// Corner coordinate by local number.
    pub fn corner(&self, i: usize) -> Option<f64> {
        match (self.dimension, i) {
            (_, 0) => Some(0.0),
            (1, 1) => Some(1.0),
            _ => None,
        }
    }

    /// Barycenter of the reference domain.
    pub fn center(&self) -> f64 {
        match self.dimension {
            0 => 0.0,
            _ => 0.5,
        }
    }

    /// Volume of the reference domain.
    pub fn volume(&self) -> f64 {
        1.0
    }

    /// Number of sub-entities of the given codimension: the interval has
    /// one element (codim 0) and two vertices (codim 1).
    pub fn sub_entity_count(&self, codim: usize) -> Result<usize, MeshError> {
        if codim > self.dimension {
            return Err(MeshError::UnsupportedDimension(codim));
        }
        match codim {
            0 => Ok(1),
            _ => Ok(2),
        }
    }
}
