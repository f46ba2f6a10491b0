//! Iterator-based access to the hierarchy.
//!
//! Assembly code reads the grid exclusively through the borrowing
//! accessors here: [`ElemRef`]/[`VertexRef`] wrap one entity together
//! with its grid, per-level iterators walk a generation in sequence
//! (= geometric) order, [`HierarchicElements`] descends the father/son
//! tree, and [`LeafElements`] walks the cached leaf view. All of them
//! borrow the grid immutably, so no entity can disappear mid-iteration.

use crate::geometry::interval::IntervalGeometry;
use crate::mesh_error::MeshError;
use crate::topology::entity::{Element, Mark, Vertex};
use crate::topology::grid::IntervalGrid;
use crate::topology::handle::{ElemId, ElemKey, VertexId, VertexKey};
use crate::topology::neighbor;
use std::fmt;

impl IntervalGrid {
    /// Resolve an element address into a borrowing accessor.
    pub fn element(&self, id: ElemId) -> Result<ElemRef<'_>, MeshError> {
        let level = self.level(id.level)?;
        let element = level
            .elements
            .get(id.key)
            .ok_or(MeshError::UnknownElement { level: id.level })?;
        Ok(ElemRef {
            grid: self,
            id,
            element,
        })
    }

    /// Resolve a vertex address into a borrowing accessor.
    pub fn vertex(&self, id: VertexId) -> Result<VertexRef<'_>, MeshError> {
        let level = self.level(id.level)?;
        let vertex = level
            .vertices
            .get(id.key)
            .ok_or(MeshError::UnknownVertex { level: id.level })?;
        Ok(VertexRef {
            grid: self,
            id,
            vertex,
        })
    }

    /// Elements of one level in sequence order.
    pub fn level_elements(&self, level: usize) -> Result<LevelElements<'_>, MeshError> {
        let cursor = self.level(level)?.elements.head();
        Ok(LevelElements {
            grid: self,
            level,
            cursor,
        })
    }

    /// Vertices of one level in sequence order.
    pub fn level_vertices(&self, level: usize) -> Result<LevelVertices<'_>, MeshError> {
        let cursor = self.level(level)?.vertices.head();
        Ok(LevelVertices {
            grid: self,
            level,
            cursor,
        })
    }

    /// All current leaves, level-major in sequence order.
    pub fn leaf_elements(&self) -> LeafElements<'_> {
        LeafElements {
            grid: self,
            ids: self.leaf_ids().iter(),
        }
    }
}

/// Borrowing accessor for one element.
#[derive(Clone, Copy)]
pub struct ElemRef<'g> {
    grid: &'g IntervalGrid,
    id: ElemId,
    element: &'g Element,
}

impl<'g> ElemRef<'g> {
    pub fn id(&self) -> ElemId {
        self.id
    }

    pub fn level(&self) -> usize {
        self.id.level
    }

    /// Per-level index; reassigned by every adaptation pass.
    pub fn index(&self) -> usize {
        self.element.index
    }

    pub fn mark(&self) -> Mark {
        self.element.mark
    }

    pub fn is_leaf(&self) -> bool {
        self.element.is_leaf()
    }

    pub fn is_copy(&self) -> bool {
        self.element.is_copy()
    }

    /// Endpoint coordinates as an affine geometry.
    pub fn geometry(&self) -> IntervalGeometry {
        let level = &self.grid.levels[self.id.level];
        let left = level.coord(self.element.vertices[0]).expect("resident endpoint");
        let right = level.coord(self.element.vertices[1]).expect("resident endpoint");
        IntervalGeometry::new(left, right)
    }

    pub fn left_vertex(&self) -> VertexRef<'g> {
        self.vertex_ref(self.element.vertices[0])
    }

    pub fn right_vertex(&self) -> VertexRef<'g> {
        self.vertex_ref(self.element.vertices[1])
    }

    /// Father element, absent on level 0.
    pub fn father(&self) -> Option<ElemRef<'g>> {
        let key = self.element.father?;
        let level = self.id.level.checked_sub(1)?;
        self.grid.element(ElemId { level, key }).ok()
    }

    /// Son by slot (0 = left half, 1 = right half; both resolve to the
    /// same child for a copy element). Absent on leaves.
    pub fn son(&self, slot: usize) -> Option<ElemRef<'g>> {
        let key = (*self.element.sons.get(slot)?)?;
        self.grid
            .element(ElemId {
                level: self.id.level + 1,
                key,
            })
            .ok()
    }

    /// Sequence predecessor within this level.
    pub fn pred(&self) -> Option<ElemRef<'g>> {
        let key = self.grid.levels[self.id.level]
            .elements
            .prev_key(self.id.key)?;
        self.grid
            .element(ElemId {
                level: self.id.level,
                key,
            })
            .ok()
    }

    /// Sequence successor within this level.
    pub fn succ(&self) -> Option<ElemRef<'g>> {
        let key = self.grid.levels[self.id.level]
            .elements
            .next_key(self.id.key)?;
        self.grid
            .element(ElemId {
                level: self.id.level,
                key,
            })
            .ok()
    }

    /// The next-level vertex shared across this element's left boundary,
    /// present when the left neighbor is refined.
    pub fn left_upper_vertex(&self) -> Option<VertexRef<'g>> {
        let child_level = self.grid.levels.get(self.id.level + 1)?;
        let level = &self.grid.levels[self.id.level];
        let key = neighbor::left_upper_vertex(level, child_level, self.id.key)?;
        self.grid
            .vertex(VertexId {
                level: self.id.level + 1,
                key,
            })
            .ok()
    }

    /// Mirror image of [`left_upper_vertex`](Self::left_upper_vertex).
    pub fn right_upper_vertex(&self) -> Option<VertexRef<'g>> {
        let child_level = self.grid.levels.get(self.id.level + 1)?;
        let level = &self.grid.levels[self.id.level];
        let key = neighbor::right_upper_vertex(level, child_level, self.id.key)?;
        self.grid
            .vertex(VertexId {
                level: self.id.level + 1,
                key,
            })
            .ok()
    }

    /// Local coordinates of this element inside its father's reference
    /// interval: `[0, 1/2]` for a left son, `[1/2, 1]` for a right son,
    /// `[0, 1]` for a copy child. Absent on level 0.
    pub fn geometry_in_father(&self) -> Option<IntervalGeometry> {
        let father = self.father()?;
        match father.element.sons {
            [Some(a), Some(b)] if a == b && a == self.id.key => {
                Some(IntervalGeometry::new(0.0, 1.0))
            }
            [Some(a), _] if a == self.id.key => Some(IntervalGeometry::new(0.0, 0.5)),
            [_, Some(b)] if b == self.id.key => Some(IntervalGeometry::new(0.5, 1.0)),
            _ => None,
        }
    }

    /// Strict descendants of this element, depth-first and left-first,
    /// down to `max_level` inclusive.
    pub fn hierarchic(&self, max_level: usize) -> HierarchicElements<'g> {
        let mut stack = Vec::new();
        if self.id.level < max_level {
            push_sons(&mut stack, self.element, self.id.level);
        }
        HierarchicElements {
            grid: self.grid,
            stack,
            max_level,
        }
    }

    fn vertex_ref(&self, key: VertexKey) -> VertexRef<'g> {
        self.grid
            .vertex(VertexId {
                level: self.id.level,
                key,
            })
            .expect("resident endpoint")
    }
}

impl fmt::Debug for ElemRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let geo = self.geometry();
        write!(f, "ElemRef({:?}, [{}, {}])", self.id, geo.left(), geo.right())
    }
}

/// Borrowing accessor for one vertex.
#[derive(Clone, Copy)]
pub struct VertexRef<'g> {
    grid: &'g IntervalGrid,
    id: VertexId,
    vertex: &'g Vertex,
}

impl<'g> VertexRef<'g> {
    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn level(&self) -> usize {
        self.id.level
    }

    /// Per-level index; reassigned by every adaptation pass.
    pub fn index(&self) -> usize {
        self.vertex.index()
    }

    pub fn coord(&self) -> f64 {
        self.vertex.coord()
    }

    /// Sequence predecessor within this level.
    pub fn pred(&self) -> Option<VertexRef<'g>> {
        let key = self.grid.levels[self.id.level]
            .vertices
            .prev_key(self.id.key)?;
        self.grid
            .vertex(VertexId {
                level: self.id.level,
                key,
            })
            .ok()
    }

    /// Sequence successor within this level.
    pub fn succ(&self) -> Option<VertexRef<'g>> {
        let key = self.grid.levels[self.id.level]
            .vertices
            .next_key(self.id.key)?;
        self.grid
            .vertex(VertexId {
                level: self.id.level,
                key,
            })
            .ok()
    }
}

impl fmt::Debug for VertexRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VertexRef({:?}, {})", self.id, self.coord())
    }
}

/// In-order iterator over the elements of one level.
pub struct LevelElements<'g> {
    grid: &'g IntervalGrid,
    level: usize,
    cursor: Option<ElemKey>,
}

impl<'g> Iterator for LevelElements<'g> {
    type Item = ElemRef<'g>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.cursor?;
        self.cursor = self.grid.levels[self.level].elements.next_key(key);
        self.grid
            .element(ElemId {
                level: self.level,
                key,
            })
            .ok()
    }
}

/// In-order iterator over the vertices of one level.
pub struct LevelVertices<'g> {
    grid: &'g IntervalGrid,
    level: usize,
    cursor: Option<VertexKey>,
}

impl<'g> Iterator for LevelVertices<'g> {
    type Item = VertexRef<'g>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.cursor?;
        self.cursor = self.grid.levels[self.level].vertices.next_key(key);
        self.grid
            .vertex(VertexId {
                level: self.level,
                key,
            })
            .ok()
    }
}

/// Depth-first iterator over the strict descendants of one element.
pub struct HierarchicElements<'g> {
    grid: &'g IntervalGrid,
    stack: Vec<ElemId>,
    max_level: usize,
}

impl<'g> Iterator for HierarchicElements<'g> {
    type Item = ElemRef<'g>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = self.stack.pop()?;
            let Ok(elem) = self.grid.element(id) else {
                continue;
            };
            if id.level < self.max_level {
                push_sons(&mut self.stack, elem.element, id.level);
            }
            return Some(elem);
        }
    }
}

/// Iterator over the cached leaf view.
pub struct LeafElements<'g> {
    grid: &'g IntervalGrid,
    ids: std::slice::Iter<'g, ElemId>,
}

impl<'g> Iterator for LeafElements<'g> {
    type Item = ElemRef<'g>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = *self.ids.next()?;
        self.grid.element(id).ok()
    }
}

fn push_sons(stack: &mut Vec<ElemId>, element: &Element, level: usize) {
    match element.sons {
        [Some(a), Some(b)] if a == b => stack.push(ElemId {
            level: level + 1,
            key: a,
        }),
        [Some(a), Some(b)] => {
            // Left son on top so depth-first order is left-first.
            stack.push(ElemId {
                level: level + 1,
                key: b,
            });
            stack.push(ElemId {
                level: level + 1,
                key: a,
            });
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn midpoints(grid: &IntervalGrid, level: usize) -> Vec<f64> {
        grid.level_elements(level)
            .unwrap()
            .map(|e| e.geometry().midpoint())
            .collect()
    }

    #[test]
    fn level_iteration_is_in_geometric_order() {
        let mut grid = IntervalGrid::uniform(4, 0.0, 1.0).unwrap();
        grid.global_refine(1).unwrap();
        assert_eq!(midpoints(&grid, 0), vec![0.125, 0.375, 0.625, 0.875]);
        let level1 = midpoints(&grid, 1);
        assert_eq!(level1.len(), 8);
        assert!(level1.windows(2).all(|w| w[0] < w[1]));
        let coords: Vec<f64> = grid
            .level_vertices(1)
            .unwrap()
            .map(|v| v.coord())
            .collect();
        assert!(coords.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn iteration_outside_the_hierarchy_fails() {
        let grid = IntervalGrid::uniform(2, 0.0, 1.0).unwrap();
        assert!(matches!(
            grid.level_elements(1),
            Err(MeshError::InvalidLevel {
                level: 1,
                max_level: 0
            })
        ));
        assert!(grid.level_vertices(0).is_ok());
    }

    #[test]
    fn hierarchic_visits_strict_descendants_depth_first() {
        let mut grid = IntervalGrid::uniform(1, 0.0, 1.0).unwrap();
        grid.global_refine(2).unwrap();
        let root = grid.level_elements(0).unwrap().next().unwrap();

        let visited: Vec<(usize, f64)> = root
            .hierarchic(2)
            .map(|e| (e.level(), e.geometry().midpoint()))
            .collect();
        assert_eq!(
            visited,
            vec![
                (1, 0.25),
                (2, 0.125),
                (2, 0.375),
                (1, 0.75),
                (2, 0.625),
                (2, 0.875),
            ]
        );

        // Bounded depth stops above the finest generation.
        let shallow: Vec<usize> = root.hierarchic(1).map(|e| e.level()).collect();
        assert_eq!(shallow, vec![1, 1]);
        // A leaf has no strict descendants.
        let leaf = grid.level_elements(2).unwrap().next().unwrap();
        assert_eq!(leaf.hierarchic(5).count(), 0);
    }

    #[test]
    fn father_and_sons_are_mutually_linked() {
        let mut grid = IntervalGrid::uniform(2, 0.0, 1.0).unwrap();
        grid.global_refine(1).unwrap();
        for element in grid.level_elements(1).unwrap() {
            let father = element.father().unwrap();
            assert_eq!(father.level(), 0);
            let back = [father.son(0).unwrap().id(), father.son(1).unwrap().id()];
            assert!(back.contains(&element.id()));
            assert!(father.geometry().contains(element.geometry().midpoint()));
        }
        for element in grid.level_elements(0).unwrap() {
            assert!(element.father().is_none());
        }
    }

    #[test]
    fn leaf_view_covers_the_domain() {
        let mut grid = IntervalGrid::uniform(4, 0.0, 1.0).unwrap();
        let first = grid.level_elements(0).unwrap().next().unwrap().id();
        grid.mark(first, Mark::Refine).unwrap();
        grid.adapt().unwrap();
        grid.post_adapt();

        let total: f64 = grid.leaf_elements().map(|e| e.geometry().volume()).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert_eq!(grid.leaf_elements().count(), 5);
    }

    #[test]
    fn geometry_in_father_identifies_the_son_half() {
        let mut grid = IntervalGrid::uniform(1, 2.0, 4.0).unwrap();
        grid.global_refine(1).unwrap();
        let root = grid.level_elements(0).unwrap().next().unwrap();
        assert!(root.geometry_in_father().is_none());

        let sons: Vec<ElemRef> = grid.level_elements(1).unwrap().collect();
        let left = sons[0].geometry_in_father().unwrap();
        let right = sons[1].geometry_in_father().unwrap();
        assert_eq!((left.left(), left.right()), (0.0, 0.5));
        assert_eq!((right.left(), right.right()), (0.5, 1.0));

        // The father's map composed with the local geometry reproduces
        // the son's endpoints.
        let father = sons[0].father().unwrap().geometry();
        assert_eq!(father.global(left.left()), sons[0].geometry().left());
        assert_eq!(father.global(left.right()), sons[0].geometry().right());
    }

    #[test]
    fn copy_children_span_the_father() {
        let mut grid = IntervalGrid::uniform(2, 0.0, 1.0)
            .unwrap()
            .with_refinement_mode(crate::topology::grid::RefinementMode::CopyClosure);
        let first = grid.level_elements(0).unwrap().next().unwrap().id();
        grid.mark(first, Mark::Refine).unwrap();
        grid.adapt().unwrap();
        grid.post_adapt();

        let copies: Vec<ElemRef> = grid
            .level_elements(1)
            .unwrap()
            .filter(|e| e.geometry_in_father().is_some_and(|g| g.volume() == 1.0))
            .collect();
        assert_eq!(copies.len(), 1);
        let copy = copies[0];
        let father = copy.father().unwrap();
        assert!(father.is_copy());
        assert_eq!(copy.geometry(), father.geometry());
        assert_eq!(father.son(0).unwrap().id(), father.son(1).unwrap().id());
    }
}
