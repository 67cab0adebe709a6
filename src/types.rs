//! # Common Types for Conflict Graphs and Constraint Networks
//!
//! Common types used throughout the library to guarantee type safety.

use std::{fmt, ops};

use serde::{Serialize, Serializer};

/// The hash map to use throughout the library
pub type RsHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// The hash set to use throughout the library
pub type RsHashSet<V> = rustc_hash::FxHashSet<V>;

/// Type representing a vertex of a conflict graph. The vertex identity
/// doubles as the variable identity in the constraint network derived from
/// the graph. The memory representation is `u32`.
#[derive(Hash, Eq, PartialEq, PartialOrd, Ord, Clone, Copy, Debug)]
#[repr(transparent)]
pub struct VertexId {
    idx: u32,
}

impl VertexId {
    /// Creates a new vertex identity with a given index
    #[must_use]
    pub fn new(idx: u32) -> VertexId {
        VertexId { idx }
    }

    /// Gets the raw index of the vertex
    #[inline]
    #[must_use]
    pub fn idx(self) -> u32 {
        self.idx
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.idx)
    }
}

/// Type representing a conflict edge identity, assigned in order of
/// appearance in the input
#[derive(Hash, Eq, PartialEq, PartialOrd, Ord, Clone, Copy, Debug)]
#[repr(transparent)]
pub struct EdgeId {
    idx: usize,
}

impl EdgeId {
    /// Creates a new edge identity with a given index
    #[must_use]
    pub fn new(idx: usize) -> EdgeId {
        EdgeId { idx }
    }

    /// Gets the raw index of the edge
    #[inline]
    #[must_use]
    pub fn idx(self) -> usize {
        self.idx
    }
}

/// Finite stand-in for [`Cost::Infeasible`] in the raw intermediate dump.
/// Downstream tuple expansion treats any negative cost as infeasible.
pub const INFEASIBLE_SENTINEL: f64 = -9999.0;

/// A constraint cost: either a finite value or the infeasible marker that
/// rules a value tuple out entirely
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Cost {
    /// A finite cost
    Finite(f64),
    /// The tuple is forbidden
    Infeasible,
}

impl Cost {
    /// The zero cost
    pub const ZERO: Cost = Cost::Finite(0.);

    /// Checks whether the cost marks an infeasible tuple
    #[must_use]
    pub fn is_infeasible(self) -> bool {
        matches!(self, Cost::Infeasible)
    }

    /// Gets the finite cost value, if there is one
    #[must_use]
    pub fn finite(self) -> Option<f64> {
        match self {
            Cost::Finite(val) => Some(val),
            Cost::Infeasible => None,
        }
    }
}

impl From<f64> for Cost {
    fn from(val: f64) -> Self {
        Cost::Finite(val)
    }
}

impl ops::Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        match (self, rhs) {
            (Cost::Finite(lhs), Cost::Finite(rhs)) => Cost::Finite(lhs + rhs),
            _ => Cost::Infeasible,
        }
    }
}

impl ops::AddAssign for Cost {
    fn add_assign(&mut self, rhs: Cost) {
        *self = *self + rhs;
    }
}

impl Serialize for Cost {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cost::Finite(val) => serializer.serialize_f64(*val),
            Cost::Infeasible => serializer.serialize_f64(INFEASIBLE_SENTINEL),
        }
    }
}

/// Scope of a constraint: the ordered variables it ranges over
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// A unary constraint on a single variable
    Unary(VertexId),
    /// A binary constraint over an ordered pair of variables
    Binary(VertexId, VertexId),
}

impl Scope {
    /// Gets the arity of the scope
    #[must_use]
    pub fn arity(self) -> usize {
        match self {
            Scope::Unary(_) => 1,
            Scope::Binary(..) => 2,
        }
    }

    /// Gets the variables in scope order
    #[must_use]
    pub fn vars(self) -> Vec<VertexId> {
        match self {
            Scope::Unary(v) => vec![v],
            Scope::Binary(u, v) => vec![u, v],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cost, Scope, VertexId, INFEASIBLE_SENTINEL};

    #[test]
    fn cost_addition() {
        assert_eq!(Cost::Finite(1.5) + Cost::Finite(2.5), Cost::Finite(4.));
        assert_eq!(Cost::ZERO + Cost::Finite(3.), Cost::Finite(3.));
    }

    #[test]
    fn infeasible_absorbs() {
        assert_eq!(Cost::Infeasible + Cost::Finite(2.), Cost::Infeasible);
        assert_eq!(Cost::Finite(2.) + Cost::Infeasible, Cost::Infeasible);
        assert_eq!(Cost::Infeasible + Cost::Infeasible, Cost::Infeasible);
        let mut acc = Cost::ZERO;
        acc += Cost::Infeasible;
        acc += Cost::Finite(1.);
        assert!(acc.is_infeasible());
    }

    #[test]
    fn serialize_sentinel() {
        assert_eq!(
            serde_json::to_string(&Cost::Infeasible).unwrap(),
            format!("{INFEASIBLE_SENTINEL:?}")
        );
        assert_eq!(serde_json::to_string(&Cost::Finite(5.)).unwrap(), "5.0");
    }

    #[test]
    fn vertex_display() {
        assert_eq!(format!("{}", VertexId::new(42)), "v42");
    }

    #[test]
    fn scope_vars() {
        let (u, v) = (VertexId::new(1), VertexId::new(2));
        assert_eq!(Scope::Unary(u).arity(), 1);
        assert_eq!(Scope::Binary(u, v).arity(), 2);
        assert_eq!(Scope::Binary(u, v).vars(), vec![u, v]);
    }
}
