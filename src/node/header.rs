//! Global store header, always page 0.
//!
//! Layout after the node header:
//! ```text
//! Offset  Size  Description
//! 21      4     Page size of the store
//! 25      8     Last allocated page id
//! 33      8     Last session id
//! 41      4     Number of descriptor entries
//! 45      24*n  Entries: class id (16) + descriptor page id (8)
//! ```

use super::{initialize, verify, Node, NodeMut, NODE_HEADER_SIZE};
use crate::page::Page;
use crate::types::*;
use std::ops::{Deref, DerefMut};
use uuid::Uuid;

const SIZE_OF_ARRAY_OFFSET: usize = NODE_HEADER_SIZE;
const LAST_PAGE_ID_OFFSET: usize = SIZE_OF_ARRAY_OFFSET + SIZE_OF_INT;
const LAST_SESSION_ID_OFFSET: usize = LAST_PAGE_ID_OFFSET + SIZE_OF_LONG;
const NUMBER_OF_ENTRIES_OFFSET: usize = LAST_SESSION_ID_OFFSET + SIZE_OF_LONG;

/// First byte after the header features, where entries begin
pub const HEADER_FEATURES_END: usize = NUMBER_OF_ENTRIES_OFFSET + SIZE_OF_INT;
/// Size of one `(class id, descriptor page id)` entry
pub const HEADER_ENTRY_SIZE: usize = SIZE_OF_UUID + SIZE_OF_LONG;

/// View of the global header node
pub struct HeaderNode<P> {
    page: P,
}

impl<P: Deref<Target = Page>> HeaderNode<P> {
    /// Open an existing header read-only
    pub fn open(page: P) -> crate::Result<Self> {
        verify(&page, NodeType::Header)?;
        Ok(Self { page })
    }

    pub fn size_of_array(&self) -> usize {
        self.page.read_int(SIZE_OF_ARRAY_OFFSET).max(0) as usize
    }

    pub fn last_page_id(&self) -> PageId {
        self.page.read_page_id(LAST_PAGE_ID_OFFSET)
    }

    pub fn last_session_id(&self) -> u64 {
        self.page.read_long(LAST_SESSION_ID_OFFSET) as u64
    }

    pub fn number_of_entries(&self) -> usize {
        self.page.read_int(NUMBER_OF_ENTRIES_OFFSET).max(0) as usize
    }

    /// Bytes left for further entries
    pub fn free_space(&self) -> usize {
        self.page
            .size()
            .saturating_sub(HEADER_FEATURES_END + self.number_of_entries() * HEADER_ENTRY_SIZE)
    }

    fn entry_offset(idx: usize) -> usize {
        HEADER_FEATURES_END + idx * HEADER_ENTRY_SIZE
    }

    pub fn entry_class_id(&self, idx: usize) -> Uuid {
        self.page.read_uuid(Self::entry_offset(idx))
    }

    pub fn entry_page_id(&self, idx: usize) -> PageId {
        self.page.read_page_id(Self::entry_offset(idx) + SIZE_OF_UUID)
    }

    /// Slot of the entry registered for `class_id`
    pub fn index_of_class(&self, class_id: Uuid) -> Option<usize> {
        (0..self.number_of_entries()).find(|&i| self.entry_class_id(i) == class_id)
    }

    /// Descriptor page registered for `class_id`
    pub fn descriptor_page_id(&self, class_id: Uuid) -> Option<PageId> {
        self.index_of_class(class_id).map(|i| self.entry_page_id(i))
    }
}

impl<P: DerefMut<Target = Page>> HeaderNode<P> {
    /// Open a header for writing, claiming the page if it is blank
    pub fn new(mut page: P) -> crate::Result<Self> {
        initialize(&mut page, NodeType::Header)?;
        Ok(Self { page })
    }

    pub fn set_size_of_array(&mut self, size: usize) {
        self.page.write_int(SIZE_OF_ARRAY_OFFSET, size as i32);
    }

    pub fn set_last_page_id(&mut self, page_id: PageId) {
        self.page.write_page_id(LAST_PAGE_ID_OFFSET, page_id);
    }

    pub fn set_last_session_id(&mut self, session_id: u64) {
        self.page.write_long(LAST_SESSION_ID_OFFSET, session_id as i64);
    }

    fn set_number_of_entries(&mut self, n: usize) {
        self.page.write_int(NUMBER_OF_ENTRIES_OFFSET, n as i32);
    }

    /// Append a descriptor entry. Returns `false` when the page is full.
    pub fn add_entry(&mut self, class_id: Uuid, page_id: PageId) -> bool {
        if HEADER_ENTRY_SIZE > self.free_space() {
            return false;
        }
        let n = self.number_of_entries();
        let offset = Self::entry_offset(n);
        self.page.write_uuid(offset, class_id);
        self.page.write_page_id(offset + SIZE_OF_UUID, page_id);
        self.set_number_of_entries(n + 1);
        true
    }

    /// Reset counters, links and entries. The page size is kept.
    pub fn clear(&mut self) {
        self.set_previous_page_id(PageId::NONE);
        self.set_next_page_id(PageId::NONE);
        self.set_last_page_id(PageId::HEADER);
        self.set_last_session_id(0);
        self.set_number_of_entries(0);
    }
}

impl<P: Deref<Target = Page>> Node for HeaderNode<P> {
    fn page(&self) -> &Page {
        &self.page
    }
}

impl<P: DerefMut<Target = Page>> NodeMut for HeaderNode<P> {
    fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }
}
