//! Typed handles for mesh entities.
//!
//! Vertices and elements live in per-level arena sequences
//! ([`EntitySeq`](crate::topology::sequence::EntitySeq)); a handle is the
//! slot index in that arena, wrapped in a `repr(transparent)` newtype so a
//! vertex key can never be confused with an element key. Handles are
//! non-owning: a key whose entity was removed simply resolves to `None`,
//! it never aliases a different entity of another kind.
//!
//! [`VertexId`] and [`ElemId`] pair a key with its level and are the
//! public addressing scheme for marking and traversal entry points.

use std::fmt;

/// Slot key into an [`EntitySeq`](crate::topology::sequence::EntitySeq).
///
/// Implemented by [`VertexKey`] and [`ElemKey`]; not meant to be
/// implemented outside this crate.
pub trait SeqKey: Copy + Eq + fmt::Debug {
    /// Wrap an arena slot index.
    fn from_index(index: usize) -> Self;
    /// The arena slot index this key addresses.
    fn index(self) -> usize;
}

macro_rules! entity_key {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Copy,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[repr(transparent)]
        pub struct $name(u32);

        impl SeqKey for $name {
            #[inline]
            fn from_index(index: usize) -> Self {
                $name(index as u32)
            }

            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_key! {
    /// Key of a vertex within its level's vertex sequence.
    VertexKey
}

entity_key! {
    /// Key of an element within its level's element sequence.
    ElemKey
}

/// Level-qualified address of a vertex.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct VertexId {
    /// Refinement level the vertex lives on.
    pub level: usize,
    pub(crate) key: VertexKey,
}

/// Level-qualified address of an element.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct ElemId {
    /// Refinement level the element lives on.
    pub level: usize,
    pub(crate) key: ElemKey,
}

impl fmt::Debug for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VertexId({}/{})", self.level, self.key)
    }
}

impl fmt::Debug for ElemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElemId({}/{})", self.level, self.key)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_roundtrip() {
        let k = ElemKey::from_index(42);
        assert_eq!(k.index(), 42);
    }

    #[test]
    fn debug_and_display() {
        let k = VertexKey::from_index(7);
        assert_eq!(format!("{:?}", k), "VertexKey(7)");
        assert_eq!(format!("{}", k), "7");
        let id = ElemId {
            level: 2,
            key: ElemKey::from_index(3),
        };
        assert_eq!(format!("{:?}", id), "ElemId(2/3)");
    }

    #[test]
    fn ordering_and_hash() {
        use std::collections::HashSet;
        let a = ElemKey::from_index(1);
        let b = ElemKey::from_index(2);
        assert!(a < b);
        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 2);
    }
}
