//! Buffer layer: session page caches and the LRU cache used by joins.
//!
//! A [`Session`] holds every page it touches until it is closed. The
//! [`LruCache`] bounds the working set of a single spatial join.

mod lru;
mod session;

pub use lru::LruCache;
pub use session::{PageRef, Session};
