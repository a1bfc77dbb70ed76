//! Page store abstraction.

use crate::error::Result;
use crate::page::PageBuf;
use crate::types::PageId;

/// Raw page persistence keyed by page id.
///
/// A store knows nothing about node layouts; the [`Workspace`] on top of it
/// owns page identity and the header page.
///
/// [`Workspace`]: crate::storage::Workspace
pub trait PageStore: Send + Sync {
    /// Whether the store already holds data to be loaded
    fn exists(&self) -> bool;

    /// Attach to existing data
    fn load(&self) -> Result<()>;

    /// Start a fresh, empty store
    fn create(&self) -> Result<()>;

    /// Read one page of `page_size` bytes
    fn read_page(&self, page_id: PageId, page_size: usize) -> Result<PageBuf>;

    /// Persist one page
    fn write_page(&self, page_id: PageId, data: &[u8]) -> Result<()>;

    /// Forget a page. Returns `false` when the store cannot reclaim pages.
    fn delete_page(&self, page_id: PageId) -> Result<bool>;

    /// Acknowledge an unmodified page that will not be written
    fn discard_page(&self, _page_id: PageId) -> bool {
        true
    }

    /// Push buffered writes to durable storage
    fn sync(&self) -> Result<()> {
        Ok(())
    }
}
