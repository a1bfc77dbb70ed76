//! Common types used throughout the storage engine.

mod page_id;

pub use page_id::PageId;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default page size in bytes (4KB)
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Smallest page size a workspace accepts. The header node needs room for
/// its features plus at least one descriptor entry.
pub const MIN_PAGE_SIZE: usize = 128;

pub const SIZE_OF_BOOLEAN: usize = 1;
pub const SIZE_OF_BYTE: usize = 1;
pub const SIZE_OF_CHAR: usize = 2;
pub const SIZE_OF_SHORT: usize = 2;
pub const SIZE_OF_INT: usize = 4;
pub const SIZE_OF_FLOAT: usize = 4;
pub const SIZE_OF_LONG: usize = 8;
pub const SIZE_OF_DOUBLE: usize = 8;
pub const SIZE_OF_UUID: usize = 16;

/// Node type tags as stored in the node header.
///
/// A stored tag of 0 marks a page that no node view has claimed yet.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// R-tree leaf, entries are entity ids
    RTreeLeaf = 8,
    /// R-tree index node, entries are child page ids
    RTreeIndex = 9,
    /// Global store header (page 0)
    Header = 1000,
    /// Per-tree root descriptor
    RTreeDescriptor = 1005,
}

impl NodeType {
    /// Stored tag value
    pub const fn tag(self) -> i32 {
        self as i32
    }

    /// Convert from a stored tag
    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            8 => Some(Self::RTreeLeaf),
            9 => Some(Self::RTreeIndex),
            1000 => Some(Self::Header),
            1005 => Some(Self::RTreeDescriptor),
            _ => None,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RTreeLeaf => "rtree-leaf",
            Self::RTreeIndex => "rtree-index",
            Self::Header => "header",
            Self::RTreeDescriptor => "rtree-descriptor",
        };
        write!(f, "{}({})", name, self.tag())
    }
}
