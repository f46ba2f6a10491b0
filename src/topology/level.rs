//! One refinement generation: the vertex and element sequences of a level.

use crate::topology::entity::{Element, Vertex};
use crate::topology::handle::{ElemKey, VertexKey};
use crate::topology::sequence::EntitySeq;

/// A single generation of the hierarchy. Sequence order and geometric
/// left-to-right order are identical at all times.
#[derive(Debug, Clone, Default)]
pub struct Level {
    pub(crate) vertices: EntitySeq<VertexKey, Vertex>,
    pub(crate) elements: EntitySeq<ElemKey, Element>,
}

impl Level {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Coordinate lookup tolerating vacant keys.
    pub(crate) fn coord(&self, key: VertexKey) -> Option<f64> {
        self.vertices.get(key).map(|v| v.coord)
    }

    /// Assign contiguous zero-based indices to both sequences, in
    /// sequence order. Runs after every structural change; callers must
    /// not hold indices across adaptation passes.
    pub(crate) fn renumber(&mut self) {
        let mut index = 0;
        let mut cursor = self.vertices.head();
        while let Some(key) = cursor {
            cursor = self.vertices.next_key(key);
            if let Some(vertex) = self.vertices.get_mut(key) {
                vertex.index = index;
                index += 1;
            }
        }

        index = 0;
        let mut cursor = self.elements.head();
        while let Some(key) = cursor {
            cursor = self.elements.next_key(key);
            if let Some(element) = self.elements.get_mut(key) {
                element.index = index;
                index += 1;
            }
        }
    }
}
