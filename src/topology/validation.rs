//! Structural validation of a grid hierarchy.
//!
//! [`validate_grid`] checks everything the adaptation pass promises:
//! identity vertex sharing between sequence neighbors, geometric order,
//! son-count rules, father/son back-links, and contiguous per-level
//! indices. It returns the first violation as
//! [`MeshError::InvariantViolation`]; zero-length elements are legal but
//! logged as a warning.

use itertools::Itertools;

use crate::mesh_error::MeshError;
use crate::topology::grid::IntervalGrid;

fn violation(message: String) -> MeshError {
    MeshError::InvariantViolation(message)
}

/// Check the full grid hierarchy, returning the first violation found.
pub fn validate_grid(grid: &IntervalGrid) -> Result<(), MeshError> {
    for (level_index, level) in grid.levels.iter().enumerate() {
        // Vertex sequence: contiguous indices, correct level stamps,
        // strictly increasing coordinates.
        for (position, (key, vertex)) in level.vertices.iter().enumerate() {
            if vertex.level != level_index {
                return Err(violation(format!(
                    "vertex {key} on level {level_index} is stamped level {}",
                    vertex.level
                )));
            }
            if vertex.index != position {
                return Err(violation(format!(
                    "vertex {key} on level {level_index} has index {} at position {position}",
                    vertex.index
                )));
            }
        }
        for ((ka, a), (kb, b)) in level.vertices.iter().tuple_windows() {
            if !(a.coord < b.coord) {
                return Err(violation(format!(
                    "vertices {ka} and {kb} on level {level_index} are out of order \
                     ({} before {})",
                    a.coord, b.coord
                )));
            }
        }

        // Element sequence: endpoint sanity, son-count rules, father/son
        // back-links, contiguous indices.
        for (position, (key, element)) in level.elements.iter().enumerate() {
            if element.level != level_index {
                return Err(violation(format!(
                    "element {key} on level {level_index} is stamped level {}",
                    element.level
                )));
            }
            if element.index != position {
                return Err(violation(format!(
                    "element {key} on level {level_index} has index {} at position {position}",
                    element.index
                )));
            }

            let [left, right] = element.vertices;
            let (Some(left_coord), Some(right_coord)) = (level.coord(left), level.coord(right))
            else {
                return Err(violation(format!(
                    "element {key} on level {level_index} references a vacant vertex"
                )));
            };
            if left_coord > right_coord {
                return Err(violation(format!(
                    "element {key} on level {level_index} is inverted \
                     ([{left_coord}, {right_coord}])"
                )));
            }
            if left_coord == right_coord {
                log::warn!("element {key} on level {level_index} has zero length at {left_coord}");
            }

            match element.sons {
                [None, None] => {}
                [Some(_), None] | [None, Some(_)] => {
                    return Err(violation(format!(
                        "element {key} on level {level_index} has exactly one son slot set"
                    )));
                }
                [Some(first), Some(second)] => {
                    let Some(child_level) = grid.levels.get(level_index + 1) else {
                        return Err(violation(format!(
                            "element {key} on level {level_index} has sons but no finer level"
                        )));
                    };
                    let sons = if first == second {
                        vec![first]
                    } else {
                        vec![first, second]
                    };
                    for son in sons {
                        let Some(child) = child_level.elements.get(son) else {
                            return Err(violation(format!(
                                "element {key} on level {level_index} references vacant son {son}"
                            )));
                        };
                        if child.father != Some(key) {
                            return Err(violation(format!(
                                "son {son} on level {} does not link back to father {key}",
                                level_index + 1
                            )));
                        }
                    }
                }
            }

            if level_index == 0 {
                if element.father.is_some() {
                    return Err(violation(format!("element {key} on level 0 has a father")));
                }
            } else {
                let Some(father_key) = element.father else {
                    return Err(violation(format!(
                        "element {key} on level {level_index} has no father"
                    )));
                };
                let father = grid.levels[level_index - 1].elements.get(father_key);
                let linked_back = father.is_some_and(|f| f.sons.iter().any(|s| *s == Some(key)));
                if !linked_back {
                    return Err(violation(format!(
                        "father {father_key} on level {} does not list element {key} as a son",
                        level_index - 1
                    )));
                }
            }
        }
        for ((ka, a), (kb, b)) in level.elements.iter().tuple_windows() {
            // Identity sharing, not coordinate equality.
            if a.vertices[1] != b.vertices[0] {
                return Err(violation(format!(
                    "elements {ka} and {kb} on level {level_index} do not share their \
                     boundary vertex"
                )));
            }
        }
    }
    Ok(())
}
