//! Neighbor resolution for vertex sharing and insertion anchoring.
//!
//! Geometric adjacency is decided by key identity: two elements of a
//! level are neighbors exactly when they share a boundary vertex *key*.
//! Every function here returns `None` for "no such neighbor" — that is
//! expected control flow during refinement, never an error.

use crate::topology::handle::{ElemKey, VertexKey};
use crate::topology::level::Level;

/// The vertex on the next level to reuse for `elem`'s left boundary.
///
/// `Some` exactly when the sequence predecessor exists, shares the left
/// boundary vertex, and is already refined; the result is the right
/// endpoint of the predecessor's right son.
pub(crate) fn left_upper_vertex(
    level: &Level,
    child_level: &Level,
    elem: ElemKey,
) -> Option<VertexKey> {
    let e = level.elements.get(elem)?;
    let pred = level.elements.prev_key(elem)?;
    let pred = level.elements.get(pred)?;
    if pred.vertices[1] != e.vertices[0] {
        return None;
    }
    let son = pred.sons[1]?;
    Some(child_level.elements.get(son)?.vertices[1])
}

/// The vertex on the next level to reuse for `elem`'s right boundary.
///
/// Mirror image of [`left_upper_vertex`]: the left endpoint of the
/// refined successor's left son.
pub(crate) fn right_upper_vertex(
    level: &Level,
    child_level: &Level,
    elem: ElemKey,
) -> Option<VertexKey> {
    let e = level.elements.get(elem)?;
    let succ = level.elements.next_key(elem)?;
    let succ = level.elements.get(succ)?;
    if succ.vertices[0] != e.vertices[1] {
        return None;
    }
    let son = succ.sons[0]?;
    Some(child_level.elements.get(son)?.vertices[0])
}

/// Nearest predecessor of `elem` that already has sons, walking the
/// sequence towards the head. Used purely as an insertion anchor.
pub(crate) fn left_neighbor_with_son(level: &Level, elem: ElemKey) -> Option<ElemKey> {
    let mut cursor = level.elements.prev_key(elem);
    while let Some(key) = cursor {
        if level.elements.get(key).is_some_and(|e| !e.is_leaf()) {
            return Some(key);
        }
        cursor = level.elements.prev_key(key);
    }
    None
}
