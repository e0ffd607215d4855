//! Type-safe handles into the [`Arena`][crate::arena::Arena] and the clause pool.
//!
//! Every logical object is stored once and referred to by a small copyable index.
//! The newtypes keep terms, predicates, literals and pooled clauses apart, so a literal
//! index can never be used to look up a term by accident.
use std::fmt;

/// Handle of an interned term (variable or constant).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TermId(u32);

/// Handle of an interned predicate symbol (name together with its arity).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PredId(u32);

/// Handle of an interned literal.
///
/// # Invariants
///
/// - Two literals with the same predicate, arguments and sign share one handle.
/// - The negation, mirror and flip partners of a literal are interned together with it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct LitId(u32);

/// Position of a clause in a [`ClausePool`][crate::pool::ClausePool].
///
/// Pool ids are dense, starting at zero, and ordered by the canonical string of the
/// clause they denote.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ClauseId(u32);

macro_rules! index_type {
    ($name:ident, $prefix:literal) => {
        impl $name {
            /// Creates a handle from a raw index.
            ///
            /// # Panics
            ///
            /// Panics if `index` does not fit into `u32`.
            pub fn new(index: usize) -> Self {
                assert!(index <= u32::MAX as usize, "Index {} is out of range", index);
                $name(index as u32)
            }

            /// Returns the raw index as a `usize`.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl From<$name> for usize {
            fn from(id: $name) -> Self {
                id.0 as usize
            }
        }
    };
}

index_type!(TermId, "t");
index_type!(PredId, "p");
index_type!(LitId, "l");
index_type!(ClauseId, "c");

impl ClauseId {
    /// Returns the raw id widened for bit-packing.
    pub fn packed(self) -> u64 {
        self.0 as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        let id = LitId::new(42);
        assert_eq!(id.index(), 42);
        assert_eq!(usize::from(id), 42);
    }

    #[test]
    fn test_display() {
        assert_eq!(TermId::new(0).to_string(), "t0");
        assert_eq!(PredId::new(3).to_string(), "p3");
        assert_eq!(LitId::new(7).to_string(), "l7");
        assert_eq!(ClauseId::new(12).to_string(), "c12");
    }

    #[test]
    fn test_ordering() {
        assert!(ClauseId::new(1) < ClauseId::new(2));
        assert_eq!(ClauseId::new(5).packed(), 5);
    }
}
