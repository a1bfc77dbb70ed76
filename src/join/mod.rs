//! Spatial joins between two R-trees of equal height.
//!
//! Every strategy co-descends both trees with an explicit stack of page
//! pairs seeded with the two roots. Popping a pair of index nodes pushes
//! the child pairs whose bounds overlap; popping a pair of leaves emits the
//! overlapping entity id pairs. The strategies differ in how the
//! overlapping entries of one node pair are found and in which order the
//! child pairs are pushed:
//!
//! ```text
//! basic                 all entries of node 2 against all entries of node 1
//! restricted-space      only entries overlapping the parents' intersection
//! plane-sweep           restricted entries swept along axis 0
//! plane-sweep-pinning   sweep matches batched by their most shared entry
//! z-order               sweep matches sorted by Z-order, then pinned
//! ```
//!
//! Pages are read through a per-call LRU cache keyed by page id and tree
//! side; its misses are the join's disk accesses.

mod engine;
mod sweep;

pub use engine::{SpatialJoin, TreeSide};
pub use sweep::z_order;

/// Default capacity of the per-call page cache
pub const DEFAULT_JOIN_CACHE_PAGES: usize = 8;
