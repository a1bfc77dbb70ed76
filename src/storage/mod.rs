//! Storage layer: page stores and the workspace on top of them.
//!
//! A [`PageStore`] reads and writes raw pages by id. Two stores are
//! provided: [`MemoryStore`] keeps pages in a map, [`FileStore`] keeps them
//! in a random-access file. A [`Workspace`] layers page allocation, session
//! numbering and per-structure descriptors over any store.

mod file;
mod memory;
mod store;
mod workspace;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::PageStore;
pub use workspace::Workspace;
