//! The hierarchical interval grid and its adaptation driver.
//!
//! # Pass structure
//! One [`IntervalGrid::adapt`] call runs, in order: coarsening of marked
//! sibling groups, detection of top-level refinement (allocating a new
//! level when needed), bisection of marked leaf elements from the
//! coarsest level upwards, an optional copy-closure fill, and a full
//! renumbering. Marks are set beforehand with [`IntervalGrid::mark`] and
//! cleared afterwards with [`IntervalGrid::post_adapt`].
//!
//! # Expected invariants
//! - Sequence order equals geometric left-to-right order on every level.
//! - Geometrically adjacent elements of a level share one vertex key;
//!   refinement reuses boundary vertices through the neighbor resolver
//!   instead of duplicating them.
//! - New entities are always inserted anchored on the nearest refined
//!   left neighbor's last son, or at the sequence head when there is
//!   none, so construction order never depends on traversal direction.

use std::fmt;

use itertools::Itertools;
use once_cell::sync::OnceCell;

use crate::mesh_error::MeshError;
use crate::topology::cache::InvalidateCache;
use crate::topology::entity::{Element, Mark, Vertex};
use crate::topology::handle::{ElemId, ElemKey, VertexKey};
use crate::topology::level::Level;
use crate::topology::neighbor;
use crate::topology::validation::validate_grid;

/// How `adapt()` treats leaf elements below the refined region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefinementMode {
    /// Only marked elements are bisected; coarser levels keep holes.
    #[default]
    Bisection,
    /// Unrefined leaves receive a pass-through child on the next level so
    /// every level tessellates the whole domain.
    CopyClosure,
}

/// A multi-level, adaptively refined mesh of intervals.
///
/// Level 0 is the seed mesh; each further level holds the children
/// created by bisection (and, under copy closure, pass-through copies).
/// The grid owns its levels, each level owns its entity sequences, and
/// all cross-level references are presence-checked keys.
#[derive(Debug, Clone)]
pub struct IntervalGrid {
    pub(crate) levels: Vec<Level>,
    mode: RefinementMode,
    leaf_cache: OnceCell<Vec<ElemId>>,
}

impl IntervalGrid {
    /// Build a uniform seed mesh of `num_elements` equal intervals over
    /// `[left, right]`.
    pub fn uniform(num_elements: usize, left: f64, right: f64) -> Result<Self, MeshError> {
        if num_elements == 0 {
            return Err(MeshError::InvalidGeometry(
                "a uniform seed mesh needs at least one element".into(),
            ));
        }
        if !(left < right) {
            return Err(MeshError::InvalidGeometry(format!(
                "domain [{left}, {right}] is empty or inverted"
            )));
        }
        let width = (right - left) / num_elements as f64;
        let coords: Vec<f64> = (0..=num_elements).map(|i| left + i as f64 * width).collect();
        Self::from_coordinates(&coords)
    }

    /// Build a seed mesh from a strictly increasing coordinate sequence.
    pub fn from_coordinates(coords: &[f64]) -> Result<Self, MeshError> {
        if coords.len() < 2 {
            return Err(MeshError::InvalidGeometry(format!(
                "a seed mesh needs at least two coordinates, got {}",
                coords.len()
            )));
        }
        if let Some((a, b)) = coords.iter().tuple_windows().find(|(a, b)| !(a < b)) {
            return Err(MeshError::InvalidGeometry(format!(
                "coordinates must be strictly increasing, found {a} before {b}"
            )));
        }

        let mut level = Level::default();
        let vertex_keys: Vec<VertexKey> = coords
            .iter()
            .map(|&c| level.vertices.push_back(Vertex::new(0, c)))
            .collect();
        for (&a, &b) in vertex_keys.iter().tuple_windows() {
            level.elements.push_back(Element::new(0, [a, b], None));
        }
        level.renumber();

        Ok(Self {
            levels: vec![level],
            mode: RefinementMode::default(),
            leaf_cache: OnceCell::new(),
        })
    }

    /// Switch the refinement mode, builder style.
    pub fn with_refinement_mode(mut self, mode: RefinementMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn set_refinement_mode(&mut self, mode: RefinementMode) {
        self.mode = mode;
    }

    pub fn refinement_mode(&self) -> RefinementMode {
        self.mode
    }

    /// The current finest level; level 0 is the seed mesh.
    pub fn max_level(&self) -> usize {
        self.levels.len() - 1
    }

    /// Borrow one generation of the hierarchy.
    pub fn level(&self, level: usize) -> Result<&Level, MeshError> {
        self.levels.get(level).ok_or(MeshError::InvalidLevel {
            level,
            max_level: self.max_level(),
        })
    }

    pub fn vertex_count(&self, level: usize) -> Result<usize, MeshError> {
        Ok(self.level(level)?.vertex_count())
    }

    pub fn element_count(&self, level: usize) -> Result<usize, MeshError> {
        Ok(self.level(level)?.element_count())
    }

    /// Request refinement, coarsening, or nothing for one element.
    ///
    /// Marks take effect on the next [`adapt`](Self::adapt) pass; marking
    /// a non-leaf element is accepted and ignored by the pass.
    pub fn mark(&mut self, elem: ElemId, mark: Mark) -> Result<(), MeshError> {
        let max_level = self.max_level();
        let level = self
            .levels
            .get_mut(elem.level)
            .ok_or(MeshError::InvalidLevel {
                level: elem.level,
                max_level,
            })?;
        let element = level
            .elements
            .get_mut(elem.key)
            .ok_or(MeshError::UnknownElement { level: elem.level })?;
        element.mark = mark;
        Ok(())
    }

    /// [`mark`](Self::mark) with the conventional integer scheme:
    /// positive refines, negative coarsens, zero keeps.
    pub fn mark_count(&mut self, ref_count: i32, elem: ElemId) -> Result<(), MeshError> {
        self.mark(elem, Mark::from_ref_count(ref_count))
    }

    /// Whether the next [`adapt`](Self::adapt) pass may remove entities.
    pub fn pre_adapt(&self) -> bool {
        self.levels.iter().skip(1).any(|level| {
            level
                .elements
                .iter()
                .any(|(_, e)| e.mark == Mark::Coarsen && e.is_leaf())
        })
    }

    /// Clear every adaptation mark. Call after [`adapt`](Self::adapt).
    pub fn post_adapt(&mut self) {
        for level in &mut self.levels {
            for element in level.elements.values_mut() {
                element.mark = Mark::Keep;
            }
        }
    }

    /// Run one adaptation pass over the current marks.
    ///
    /// Returns whether the grid topology changed. Indices and cached leaf
    /// views are invalid afterwards and must be re-fetched.
    pub fn adapt(&mut self) -> Result<bool, MeshError> {
        let coarsened = self.coarsen_marked();
        let mut changed = coarsened > 0;

        // A refine mark on the finest level forces a new generation.
        let top = self.max_level();
        let needs_new_level = self.levels[top]
            .elements
            .iter()
            .any(|(_, e)| e.mark == Mark::Refine && e.is_leaf());
        if needs_new_level {
            self.levels.push(Level::default());
        }
        let old_top = if needs_new_level {
            self.max_level() - 1
        } else {
            self.max_level()
        };

        let mut refined = 0usize;
        for level in 0..=old_top {
            let mut cursor = self.levels[level].elements.head();
            while let Some(key) = cursor {
                cursor = self.levels[level].elements.next_key(key);
                let wants_refine = self.levels[level]
                    .elements
                    .get(key)
                    .is_some_and(|e| e.mark == Mark::Refine && e.is_leaf());
                if wants_refine {
                    self.bisect(level, key)?;
                    refined += 1;
                }
            }
        }
        changed |= refined > 0;

        // The fresh top level stays only if something landed on it.
        if self.levels.len() > 1 && self.levels[self.max_level()].elements.is_empty() {
            self.levels.pop();
        }

        if self.mode == RefinementMode::CopyClosure {
            for level in 0..self.max_level() {
                let mut cursor = self.levels[level].elements.head();
                while let Some(key) = cursor {
                    cursor = self.levels[level].elements.next_key(key);
                    let is_leaf = self.levels[level]
                        .elements
                        .get(key)
                        .is_some_and(|e| e.is_leaf());
                    if is_leaf {
                        self.copy_through(level, key)?;
                        changed = true;
                    }
                }
            }
        }

        for level in &mut self.levels {
            level.renumber();
        }
        self.leaf_cache.take();

        log::debug!(
            "adapt: {refined} elements bisected, {coarsened} groups coarsened, max level {}",
            self.max_level()
        );
        crate::debug_invariants!(validate_grid(self), "grid after adapt");
        Ok(changed)
    }

    /// Mark every leaf for refinement and run a full
    /// `pre_adapt`/`adapt`/`post_adapt` cycle, `refinements` times.
    pub fn global_refine(&mut self, refinements: usize) -> Result<(), MeshError> {
        for _ in 0..refinements {
            let leaves: Vec<ElemId> = self.leaf_ids().to_vec();
            for id in leaves {
                self.mark(id, Mark::Refine)?;
            }
            self.pre_adapt();
            self.adapt()?;
            self.post_adapt();
        }
        Ok(())
    }

    /// Per-level entity counts for diagnostics.
    pub fn info(&self) -> GridInfo {
        GridInfo {
            levels: self
                .levels
                .iter()
                .map(|level| LevelCount {
                    vertices: level.vertex_count(),
                    elements: level.element_count(),
                    leaves: level.elements.iter().filter(|(_, e)| e.is_leaf()).count(),
                })
                .collect(),
        }
    }

    /// All current leaf elements, level-major in sequence order. Lazily
    /// computed and cached until the next structural change.
    pub(crate) fn leaf_ids(&self) -> &[ElemId] {
        self.leaf_cache.get_or_init(|| {
            let mut leaves = Vec::new();
            for (level, data) in self.levels.iter().enumerate() {
                for (key, element) in data.elements.iter() {
                    if element.is_leaf() {
                        leaves.push(ElemId { level, key });
                    }
                }
            }
            leaves
        })
    }

    /// Bisect one leaf element into its two children on the next level.
    fn bisect(&mut self, level: usize, key: ElemKey) -> Result<(), MeshError> {
        if level + 1 >= self.levels.len() {
            return Err(MeshError::InvalidLevel {
                level: level + 1,
                max_level: self.max_level(),
            });
        }
        let (lower, upper) = self.levels.split_at_mut(level + 1);
        let parent_level = &mut lower[level];
        let child_level = &mut upper[0];

        let element = parent_level
            .elements
            .get(key)
            .ok_or(MeshError::UnknownElement { level })?;
        let [left_key, right_key] = element.vertices;
        let left_coord = parent_level
            .coord(left_key)
            .ok_or(MeshError::UnknownVertex { level })?;
        let right_coord = parent_level
            .coord(right_key)
            .ok_or(MeshError::UnknownVertex { level })?;

        let reused_left = neighbor::left_upper_vertex(parent_level, child_level, key);
        let reused_right = neighbor::right_upper_vertex(parent_level, child_level, key);
        let anchor = left_anchor(parent_level, child_level, key);

        // Left boundary vertex: reuse the refined left neighbor's, else
        // create one and splice it in behind the anchor.
        let left_upper = match reused_left {
            Some(v) => v,
            None => {
                let vertex = Vertex::new(level + 1, left_coord);
                match &anchor {
                    Some(a) => child_level.vertices.insert_after(a.vertex, vertex)?,
                    None => child_level.vertices.push_front(vertex),
                }
            }
        };

        // Midpoint: exact linear interpolation, no snapping.
        let center = child_level.vertices.insert_after(
            left_upper,
            Vertex::new(level + 1, 0.5 * (left_coord + right_coord)),
        )?;

        // Right boundary vertex: a reused one already follows the midpoint.
        let right_upper = match reused_right {
            Some(v) => v,
            None => child_level
                .vertices
                .insert_after(center, Vertex::new(level + 1, right_coord))?,
        };

        let left_half = Element::new(level + 1, [left_upper, center], Some(key));
        let first_son = match &anchor {
            Some(a) => child_level.elements.insert_after(a.elem, left_half)?,
            None => child_level.elements.push_front(left_half),
        };
        let right_half = Element::new(level + 1, [center, right_upper], Some(key));
        let second_son = child_level.elements.insert_after(first_son, right_half)?;

        if let Some(parent) = parent_level.elements.get_mut(key) {
            parent.sons = [Some(first_son), Some(second_son)];
        }
        Ok(())
    }

    /// Give one unrefined leaf a pass-through child on the next level.
    fn copy_through(&mut self, level: usize, key: ElemKey) -> Result<(), MeshError> {
        if level + 1 >= self.levels.len() {
            return Err(MeshError::InvalidLevel {
                level: level + 1,
                max_level: self.max_level(),
            });
        }
        let (lower, upper) = self.levels.split_at_mut(level + 1);
        let parent_level = &mut lower[level];
        let child_level = &mut upper[0];

        let element = parent_level
            .elements
            .get(key)
            .ok_or(MeshError::UnknownElement { level })?;
        let [left_key, right_key] = element.vertices;
        let left_coord = parent_level
            .coord(left_key)
            .ok_or(MeshError::UnknownVertex { level })?;
        let right_coord = parent_level
            .coord(right_key)
            .ok_or(MeshError::UnknownVertex { level })?;

        let reused_left = neighbor::left_upper_vertex(parent_level, child_level, key);
        let reused_right = neighbor::right_upper_vertex(parent_level, child_level, key);
        let anchor = left_anchor(parent_level, child_level, key);

        let left_upper = match reused_left {
            Some(v) => v,
            None => {
                let vertex = Vertex::new(level + 1, left_coord);
                match &anchor {
                    Some(a) => child_level.vertices.insert_after(a.vertex, vertex)?,
                    None => child_level.vertices.push_front(vertex),
                }
            }
        };
        let right_upper = match reused_right {
            Some(v) => v,
            None => child_level
                .vertices
                .insert_after(left_upper, Vertex::new(level + 1, right_coord))?,
        };

        let copy = Element::new(level + 1, [left_upper, right_upper], Some(key));
        let son = match &anchor {
            Some(a) => child_level.elements.insert_after(a.elem, copy)?,
            None => child_level.elements.push_front(copy),
        };

        if let Some(parent) = parent_level.elements.get_mut(key) {
            parent.sons = [Some(son), Some(son)];
        }
        Ok(())
    }

    /// Remove every complete group of leaf sons marked for coarsening.
    ///
    /// Groups are visited coarsest level first, so leaves exposed by a
    /// removal cannot qualify a second generation within the same pass.
    /// Returns the number of removed groups.
    fn coarsen_marked(&mut self) -> usize {
        let mut removed_groups = 0usize;
        for sons_level in 1..=self.max_level() {
            let (lower, upper) = self.levels.split_at_mut(sons_level);
            let parent_level = &mut lower[sons_level - 1];
            let fine_level = &mut upper[0];

            let mut cursor = parent_level.elements.head();
            while let Some(parent_key) = cursor {
                cursor = parent_level.elements.next_key(parent_key);
                let Some(parent) = parent_level.elements.get(parent_key) else {
                    continue;
                };
                let (Some(first_son), Some(last_son)) = (parent.sons[0], parent.sons[1]) else {
                    continue;
                };
                let removable = |k: ElemKey| {
                    fine_level
                        .elements
                        .get(k)
                        .is_some_and(|e| e.is_leaf() && e.mark == Mark::Coarsen)
                };
                if !removable(first_son) || (last_son != first_son && !removable(last_son)) {
                    continue;
                }
                let (Some(first), Some(last)) = (
                    fine_level.elements.get(first_son),
                    fine_level.elements.get(last_son),
                ) else {
                    continue;
                };

                // Boundary vertices survive iff the sequence-adjacent
                // element still shares them; the midpoint never does.
                let left_vertex = first.vertices[0];
                let right_vertex = last.vertices[1];
                let midpoint = (first_son != last_son).then(|| first.vertices[1]);
                let left_shared = fine_level
                    .elements
                    .prev_key(first_son)
                    .and_then(|k| fine_level.elements.get(k))
                    .is_some_and(|e| e.vertices[1] == left_vertex);
                let right_shared = fine_level
                    .elements
                    .next_key(last_son)
                    .and_then(|k| fine_level.elements.get(k))
                    .is_some_and(|e| e.vertices[0] == right_vertex);

                if let Some(parent) = parent_level.elements.get_mut(parent_key) {
                    parent.sons = [None, None];
                }
                fine_level.elements.remove(first_son);
                if last_son != first_son {
                    fine_level.elements.remove(last_son);
                }
                if let Some(mid) = midpoint {
                    fine_level.vertices.remove(mid);
                }
                if !left_shared {
                    fine_level.vertices.remove(left_vertex);
                }
                if !right_shared {
                    fine_level.vertices.remove(right_vertex);
                }
                removed_groups += 1;
            }
        }

        // Trailing levels may have emptied out.
        while self.levels.len() > 1
            && self.levels[self.levels.len() - 1].elements.is_empty()
        {
            let popped = self.levels.pop();
            debug_assert!(popped.is_some_and(|l| l.vertices.is_empty()));
        }
        removed_groups
    }
}

impl InvalidateCache for IntervalGrid {
    fn invalidate_cache(&mut self) {
        self.leaf_cache.take();
    }
}

impl crate::debug_invariants::DebugInvariants for IntervalGrid {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(validate_grid(self), "interval grid");
    }

    fn validate_invariants(&self) -> Result<(), MeshError> {
        validate_grid(self)
    }
}

/// Insertion anchor derived from the nearest refined left neighbor: its
/// last son and that son's right endpoint on the child level.
struct LeftAnchor {
    elem: ElemKey,
    vertex: VertexKey,
}

fn left_anchor(level: &Level, child_level: &Level, elem: ElemKey) -> Option<LeftAnchor> {
    let nbr = neighbor::left_neighbor_with_son(level, elem)?;
    let son = level.elements.get(nbr)?.sons[1]?;
    let vertex = child_level.elements.get(son)?.vertices[1];
    Some(LeftAnchor { elem: son, vertex })
}

/// Entity counts of one level, as reported by [`IntervalGrid::info`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelCount {
    pub vertices: usize,
    pub elements: usize,
    pub leaves: usize,
}

/// Per-level summary of a grid, with a log-friendly `Display`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridInfo {
    pub levels: Vec<LevelCount>,
}

impl GridInfo {
    pub fn max_level(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    pub fn total_elements(&self) -> usize {
        self.levels.iter().map(|l| l.elements).sum()
    }

    pub fn total_leaves(&self) -> usize {
        self.levels.iter().map(|l| l.leaves).sum()
    }
}

impl fmt::Display for GridInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (level, count) in self.levels.iter().enumerate() {
            writeln!(
                f,
                "level {level}: {} vertices, {} elements ({} leaves)",
                count.vertices, count.elements, count.leaves
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_coords(grid: &IntervalGrid, level: usize) -> Vec<f64> {
        grid.level(level)
            .unwrap()
            .vertices
            .iter()
            .map(|(_, v)| v.coord)
            .collect()
    }

    #[test]
    fn uniform_seed_mesh() {
        let grid = IntervalGrid::uniform(4, 0.0, 1.0).unwrap();
        assert_eq!(grid.max_level(), 0);
        assert_eq!(grid.vertex_count(0).unwrap(), 5);
        assert_eq!(grid.element_count(0).unwrap(), 4);
        assert_eq!(level_coords(&grid, 0), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn seed_mesh_from_coordinates() {
        let grid = IntervalGrid::from_coordinates(&[0.0, 0.1, 0.4, 1.0]).unwrap();
        assert_eq!(grid.element_count(0).unwrap(), 3);
        let indices: Vec<_> = grid
            .level(0)
            .unwrap()
            .elements
            .iter()
            .map(|(_, e)| e.index)
            .collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn degenerate_seed_input_is_rejected() {
        assert!(matches!(
            IntervalGrid::uniform(0, 0.0, 1.0),
            Err(MeshError::InvalidGeometry(_))
        ));
        assert!(matches!(
            IntervalGrid::uniform(4, 1.0, 0.0),
            Err(MeshError::InvalidGeometry(_))
        ));
        assert!(matches!(
            IntervalGrid::from_coordinates(&[0.0]),
            Err(MeshError::InvalidGeometry(_))
        ));
        assert!(matches!(
            IntervalGrid::from_coordinates(&[0.0, 1.0, 1.0]),
            Err(MeshError::InvalidGeometry(_))
        ));
        assert!(matches!(
            IntervalGrid::from_coordinates(&[0.0, f64::NAN, 1.0]),
            Err(MeshError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn invalid_level_is_an_error() {
        let grid = IntervalGrid::uniform(2, 0.0, 1.0).unwrap();
        assert_eq!(
            grid.level(1).err(),
            Some(MeshError::InvalidLevel {
                level: 1,
                max_level: 0
            })
        );
    }

    #[test]
    fn info_reports_per_level_counts() {
        let mut grid = IntervalGrid::uniform(2, 0.0, 1.0).unwrap();
        grid.global_refine(1).unwrap();
        let info = grid.info();
        assert_eq!(info.max_level(), 1);
        assert_eq!(info.levels[0].elements, 2);
        assert_eq!(info.levels[0].leaves, 0);
        assert_eq!(info.levels[1].elements, 4);
        assert_eq!(info.levels[1].leaves, 4);
        assert_eq!(info.total_leaves(), 4);
        let text = info.to_string();
        assert!(text.contains("level 1: 5 vertices, 4 elements (4 leaves)"));
    }

    #[test]
    fn adapt_without_marks_changes_nothing() {
        let mut grid = IntervalGrid::uniform(3, 0.0, 3.0).unwrap();
        assert!(!grid.adapt().unwrap());
        assert_eq!(grid.max_level(), 0);
        assert_eq!(grid.element_count(0).unwrap(), 3);
    }
}
