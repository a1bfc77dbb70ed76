//! Paged R-tree index.
//!
//! A tree lives in a [`Workspace`](crate::storage::Workspace) next to other
//! structures and is found through the descriptor page registered under its
//! class id. Every node level is a circular doubly linked ring of siblings.

mod split;
mod tree;

pub use tree::RTree;

/// Which sibling link to follow around a level ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}
