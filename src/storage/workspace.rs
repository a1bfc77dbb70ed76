//! Workspace: page identity, counters and descriptors on top of a store.
//!
//! Page 0 of every workspace is the [`HeaderNode`]. It records the page
//! size, the last allocated page id, the last session id and one
//! `(class id, descriptor page)` entry per structure living in the store.
//! Counter updates are written through to the store immediately.

use super::{FileStore, MemoryStore, PageStore};
use crate::buffer::Session;
use crate::error::{Result, StorageError};
use crate::node::{HeaderNode, NodeMut};
use crate::page::Page;
use crate::types::{PageId, MIN_PAGE_SIZE};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// A page store plus the bookkeeping kept in its header page
pub struct Workspace {
    store: Box<dyn PageStore>,
    page_size: usize,
    /// Serializes read-modify-write cycles on the header page
    header_lock: Mutex<()>,
}

impl Workspace {
    /// Open `store`, loading it when it holds data and creating it
    /// otherwise. A loaded store keeps the page size recorded in its header.
    pub fn open(store: Box<dyn PageStore>, page_size: usize) -> Result<Arc<Self>> {
        check_page_size(page_size)?;

        let workspace = if store.exists() {
            store.load()?;
            let probe = Page::from_buf(PageId::HEADER, store.read_page(PageId::HEADER, MIN_PAGE_SIZE)?);
            let stored = HeaderNode::open(&probe)?.size_of_array();
            check_page_size(stored)?;
            if stored != page_size {
                log::warn!(
                    "store page size is {} bytes, ignoring configured {}",
                    stored,
                    page_size
                );
            }
            let workspace = Self {
                store,
                page_size: stored,
                header_lock: Mutex::new(()),
            };
            log::info!(
                "reopened workspace: page size {}, last page {}",
                stored,
                workspace.last_page_id()?
            );
            workspace
        } else {
            store.create()?;
            let workspace = Self {
                store,
                page_size,
                header_lock: Mutex::new(()),
            };
            workspace.create_header_node()?;
            log::info!("created workspace with page size {}", page_size);
            workspace
        };

        Ok(Arc::new(workspace))
    }

    /// Open a fresh in-memory workspace
    pub fn memory(page_size: usize) -> Result<Arc<Self>> {
        Self::open(Box::new(MemoryStore::new()), page_size)
    }

    /// Open or create a file-backed workspace
    pub fn file<P: Into<PathBuf>>(path: P, page_size: usize, sync_on_write: bool) -> Result<Arc<Self>> {
        Self::open(Box::new(FileStore::new(path, sync_on_write)), page_size)
    }

    fn create_header_node(&self) -> Result<()> {
        let mut page = Page::new(PageId::HEADER, self.page_size);
        {
            let mut header = HeaderNode::new(&mut page)?;
            header.set_size_of_array(self.page_size);
            header.set_last_page_id(PageId::HEADER);
            header.set_last_session_id(0);
            header.set_previous_page_id(PageId::NONE);
            header.set_next_page_id(PageId::NONE);
        }
        self.flush_page(&mut page)?;
        Ok(())
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Open a new session over this workspace
    pub fn open_session(self: &Arc<Self>) -> Result<Session> {
        Session::open(Arc::clone(self))
    }

    pub fn load_page(&self, page_id: PageId) -> Result<Page> {
        log::trace!("load page {}", page_id);
        let buf = self.store.read_page(page_id, self.page_size)?;
        Ok(Page::from_buf(page_id, buf))
    }

    pub fn write_page(&self, page: &Page) -> Result<()> {
        if page.size() != self.page_size {
            return Err(StorageError::invalid_page(format!(
                "page {} is {} bytes, workspace pages are {}",
                page.id(),
                page.size(),
                self.page_size
            )));
        }
        log::trace!("write page {}", page.id());
        self.store.write_page(page.id(), page.as_bytes())
    }

    pub fn delete_page(&self, page_id: PageId) -> Result<bool> {
        self.store.delete_page(page_id)
    }

    pub fn discard_page(&self, page: &Page) -> bool {
        self.store.discard_page(page.id())
    }

    /// Persist `page` if it was modified. The flag is cleared in the written
    /// bytes and stays set on the page when the write fails.
    /// Returns `true` when the page was written and `false` when it was clean
    /// and only discarded.
    pub fn flush_page(&self, page: &mut Page) -> Result<bool> {
        if page.is_modified() {
            page.reset_modified();
            if let Err(e) = self.write_page(page) {
                page.set_modified();
                return Err(e);
            }
            Ok(true)
        } else {
            self.discard_page(page);
            Ok(false)
        }
    }

    pub fn sync(&self) -> Result<()> {
        self.store.sync()
    }

    /// Run `f` against the header page and write it back on success
    fn with_header<R>(&self, f: impl FnOnce(&mut HeaderNode<&mut Page>) -> Result<R>) -> Result<R> {
        let _guard = self.header_lock.lock();
        let mut page = self.load_page(PageId::HEADER)?;
        let result = {
            let mut header = HeaderNode::new(&mut page)?;
            f(&mut header)?
        };
        self.flush_page(&mut page)?;
        Ok(result)
    }

    fn allocate(&self, header: &mut HeaderNode<&mut Page>) -> Result<PageId> {
        let page_id = header.last_page_id().next();
        self.store.write_page(page_id, &vec![0u8; self.page_size])?;
        header.set_last_page_id(page_id);
        Ok(page_id)
    }

    /// Allocate the next page id and materialize a zeroed page for it
    pub fn increment_page_id(&self) -> Result<PageId> {
        self.with_header(|header| self.allocate(header))
    }

    /// Advance and return the session counter
    pub fn increment_session_id(&self) -> Result<u64> {
        self.with_header(|header| {
            let id = header.last_session_id() + 1;
            header.set_last_session_id(id);
            Ok(id)
        })
    }

    /// Descriptor page of the structure identified by `class_id`,
    /// allocated and registered on first use
    pub fn find_unique_descriptor(&self, class_id: Uuid) -> Result<PageId> {
        self.with_header(|header| {
            if let Some(page_id) = header.descriptor_page_id(class_id) {
                return Ok(page_id);
            }
            let page_id = self.allocate(header)?;
            if !header.add_entry(class_id, page_id) {
                return Err(StorageError::HeaderFull);
            }
            log::debug!("registered descriptor page {} for class {}", page_id, class_id);
            Ok(page_id)
        })
    }

    pub fn last_page_id(&self) -> Result<PageId> {
        let page = self.load_page(PageId::HEADER)?;
        Ok(HeaderNode::open(&page)?.last_page_id())
    }

    pub fn last_session_id(&self) -> Result<u64> {
        let page = self.load_page(PageId::HEADER)?;
        Ok(HeaderNode::open(&page)?.last_session_id())
    }
}

fn check_page_size(page_size: usize) -> Result<()> {
    if page_size < MIN_PAGE_SIZE || page_size > i32::MAX as usize {
        return Err(StorageError::invalid_config(format!(
            "page size {} outside {}..={}",
            page_size,
            MIN_PAGE_SIZE,
            i32::MAX
        )));
    }
    Ok(())
}
