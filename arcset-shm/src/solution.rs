//! Wire types shared between producer and consumer processes.
//!
//! Both types are `#[repr(C)]` plain data so that they can live verbatim in
//! a shared-memory segment mapped by independently compiled processes.
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The largest arc set a [`Solution`] can carry.
pub const MAX_EDGES: usize = 8;

/// A directed edge between two vertices.
///
/// Parses from and renders to the `<from>-<to>` token syntax used on the
/// generator command line.
///
/// # Examples
///
/// ```
/// use arcset_shm::Edge;
///
/// let edge: Edge = "3-14".parse().unwrap();
/// assert_eq!(edge, Edge { from: 3, to: 14 });
/// assert_eq!(edge.to_string(), "3-14");
///
/// assert!("3-".parse::<Edge>().is_err());
/// assert!("a-b".parse::<Edge>().is_err());
/// ```
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: u16,
    pub to: u16,
}

/// The token did not match `<from>-<to>` with numeric endpoints.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid edge `{token}`: expected `<from>-<to>` with non-negative numeric endpoints")]
pub struct ParseEdgeError {
    token: String,
}

impl FromStr for Edge {
    type Err = ParseEdgeError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseEdgeError {
            token: token.to_string(),
        };
        let (from, to) = token.split_once('-').ok_or_else(invalid)?;
        Ok(Edge {
            from: from.parse().map_err(|_| invalid())?,
            to: to.parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

/// A candidate feedback arc set of at most [`MAX_EDGES`] edges.
///
/// Only the first `len` slots are meaningful. The empty solution is the
/// sentinel for "the graph is already acyclic".
///
/// # Examples
///
/// ```
/// use arcset_shm::{Edge, Solution};
///
/// let solution = Solution::from_edges([Edge { from: 1, to: 2 }]).unwrap();
/// assert_eq!(solution.len(), 1);
/// assert_eq!(solution.to_string(), "1-2");
///
/// // More edges than the fixed capacity cannot be represented.
/// let too_many = (0..9).map(|i| Edge { from: i, to: i + 1 });
/// assert!(Solution::from_edges(too_many).is_none());
/// ```
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Solution {
    edges: [Edge; MAX_EDGES],
    len: u32,
}

impl Solution {
    /// The acyclic sentinel: a solution containing no edges.
    pub const fn empty() -> Self {
        Self {
            edges: [Edge { from: 0, to: 0 }; MAX_EDGES],
            len: 0,
        }
    }

    /// Collects edges into a solution, or `None` if they exceed the fixed
    /// capacity.
    pub fn from_edges<I>(edges: I) -> Option<Self>
    where
        I: IntoIterator<Item = Edge>,
    {
        let mut solution = Self::empty();
        for edge in edges {
            solution.push(edge).ok()?;
        }
        Some(solution)
    }

    /// Appends an edge, returning it back if the solution is full.
    pub fn push(&mut self, edge: Edge) -> Result<(), Edge> {
        if self.len as usize == MAX_EDGES {
            return Err(edge);
        }
        self.edges[self.len as usize] = edge;
        self.len += 1;
        Ok(())
    }

    /// The populated edges, in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, edge) in self.edges().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{edge}")?;
        }
        Ok(())
    }
}
