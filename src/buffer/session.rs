//! Sessions: per-operation page caches.
//!
//! A session caches every page it loads until it is closed, at which point
//! modified pages are written back through the workspace exactly once.
//! Dropping an unclosed session closes it. Pages are shared as
//! `Arc<RwLock<Page>>` so several node views can be held at once during a
//! split; a session is still meant for one thread and one logical
//! operation.

use crate::error::Result;
use crate::page::Page;
use crate::storage::Workspace;
use crate::types::PageId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// A page cached by a session
pub type PageRef = Arc<RwLock<Page>>;

/// Unit of work over a workspace
pub struct Session {
    id: u64,
    workspace: Arc<Workspace>,
    cache: HashMap<PageId, PageRef>,
    /// Every `load` call, served from cache or not
    block_access: u64,
    closed: bool,
}

impl Session {
    /// Open a session, taking the next session id
    pub fn open(workspace: Arc<Workspace>) -> Result<Self> {
        let id = workspace.increment_session_id()?;
        log::trace!("open session {}", id);
        Ok(Self {
            id,
            workspace,
            cache: HashMap::new(),
            block_access: 0,
            closed: false,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn workspace(&self) -> &Arc<Workspace> {
        &self.workspace
    }

    /// Number of `load` calls so far
    pub fn block_access(&self) -> u64 {
        self.block_access
    }

    /// Number of distinct pages held
    pub fn cached_pages(&self) -> usize {
        self.cache.len()
    }

    /// Fetch a page, from the cache when possible
    pub fn load(&mut self, page_id: PageId) -> Result<PageRef> {
        self.block_access += 1;
        if let Some(page) = self.cache.get(&page_id) {
            return Ok(Arc::clone(page));
        }
        let page = Arc::new(RwLock::new(self.workspace.load_page(page_id)?));
        self.cache.insert(page_id, Arc::clone(&page));
        Ok(page)
    }

    /// Allocate a fresh zeroed page and load it
    pub fn create(&mut self) -> Result<PageRef> {
        let page_id = self.workspace.increment_page_id()?;
        self.load(page_id)
    }

    pub fn find_page_id_descriptor(&self, class_id: Uuid) -> Result<PageId> {
        self.workspace.find_unique_descriptor(class_id)
    }

    /// Flush every cached page and end the session
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.flush_all()
    }

    /// End the session without writing anything back
    pub fn abandon(mut self) {
        self.closed = true;
        let dirty = self
            .cache
            .values()
            .filter(|page| page.read().is_modified())
            .count();
        if dirty > 0 {
            log::warn!("session {} abandoned with {} modified pages", self.id, dirty);
        }
        self.cache.clear();
    }

    fn flush_all(&mut self) -> Result<()> {
        let mut written = 0;
        for (_, page) in self.cache.drain() {
            if self.workspace.flush_page(&mut page.write())? {
                written += 1;
            }
        }
        log::trace!(
            "close session {}: {} accesses, {} pages written",
            self.id,
            self.block_access,
            written
        );
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.flush_all() {
                log::error!("session {} failed to flush on drop: {}", self.id, e);
            }
        }
    }
}
