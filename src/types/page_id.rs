//! Page identifier type.

use std::fmt;

/// Identifier of a page inside a store.
///
/// Page ids are 0-indexed and persisted as big-endian int64. Page 0 is
/// reserved for the global header node, which is why an id of 0 stored in a
/// root pointer or sibling link means "unset".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PageId(pub u64);

impl PageId {
    /// Page id of the global header node (page 0)
    pub const HEADER: PageId = PageId(0);

    /// Unset root pointer or link. Shares its value with [`PageId::HEADER`].
    pub const NONE: PageId = PageId(0);

    /// Create a new page ID
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw page ID value
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Whether this id is the unset marker
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// The id that follows this one
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Calculate the byte offset of this page in a store file
    pub const fn file_offset(self, page_size: usize) -> u64 {
        self.0 * page_size as u64
    }

    /// Decode from the on-disk int64 representation
    pub const fn from_disk(raw: i64) -> Self {
        Self(raw as u64)
    }

    /// Encode to the on-disk int64 representation
    pub const fn to_disk(self) -> i64 {
        self.0 as i64
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PageId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<PageId> for u64 {
    fn from(id: PageId) -> Self {
        id.0
    }
}
