//! In-memory page store.

use super::PageStore;
use crate::error::{Result, StorageError};
use crate::page::PageBuf;
use crate::types::PageId;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Page store backed by a map. Nothing survives the process, and a memory
/// store never reports existing data.
#[derive(Default)]
pub struct MemoryStore {
    pages: RwLock<HashMap<PageId, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages currently held
    pub fn page_count(&self) -> usize {
        self.pages.read().len()
    }
}

impl PageStore for MemoryStore {
    fn exists(&self) -> bool {
        false
    }

    fn load(&self) -> Result<()> {
        Ok(())
    }

    fn create(&self) -> Result<()> {
        self.pages.write().clear();
        Ok(())
    }

    fn read_page(&self, page_id: PageId, page_size: usize) -> Result<PageBuf> {
        let pages = self.pages.read();
        let bytes = pages.get(&page_id).ok_or(StorageError::PageNotFound(page_id))?;
        Ok(PageBuf::from_bytes(bytes, page_size))
    }

    fn write_page(&self, page_id: PageId, data: &[u8]) -> Result<()> {
        self.pages.write().insert(page_id, data.to_vec());
        Ok(())
    }

    fn delete_page(&self, page_id: PageId) -> Result<bool> {
        Ok(self.pages.write().remove(&page_id).is_some())
    }
}
