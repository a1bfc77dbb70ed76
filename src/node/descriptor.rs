//! Per-tree descriptor: root page id (offset 21, 8 bytes) and tree height
//! (offset 29, 4 bytes).

use super::{initialize, verify, Node, NodeMut, NODE_HEADER_SIZE};
use crate::page::Page;
use crate::types::*;
use std::ops::{Deref, DerefMut};

const ROOT_PAGE_ID_OFFSET: usize = NODE_HEADER_SIZE;
const TREE_HEIGHT_OFFSET: usize = ROOT_PAGE_ID_OFFSET + SIZE_OF_LONG;

/// View of an R-tree descriptor page
pub struct RTreeDescriptor<P> {
    page: P,
}

impl<P: Deref<Target = Page>> RTreeDescriptor<P> {
    pub fn open(page: P) -> crate::Result<Self> {
        verify(&page, NodeType::RTreeDescriptor)?;
        Ok(Self { page })
    }

    /// Root page, [`PageId::NONE`] while the tree is empty
    pub fn root_page_id(&self) -> PageId {
        self.page.read_page_id(ROOT_PAGE_ID_OFFSET)
    }

    pub fn tree_height(&self) -> u32 {
        self.page.read_int(TREE_HEIGHT_OFFSET).max(0) as u32
    }
}

impl<P: DerefMut<Target = Page>> RTreeDescriptor<P> {
    pub fn new(mut page: P) -> crate::Result<Self> {
        initialize(&mut page, NodeType::RTreeDescriptor)?;
        Ok(Self { page })
    }

    pub fn set_root_page_id(&mut self, page_id: PageId) {
        self.page.write_page_id(ROOT_PAGE_ID_OFFSET, page_id);
    }

    pub fn set_tree_height(&mut self, height: u32) {
        self.page.write_int(TREE_HEIGHT_OFFSET, height as i32);
    }

    pub fn increment_tree_height(&mut self) {
        let height = self.tree_height();
        self.set_tree_height(height + 1);
    }

    pub fn clear(&mut self) {
        self.set_previous_page_id(PageId::NONE);
        self.set_next_page_id(PageId::NONE);
        self.set_root_page_id(PageId::NONE);
        self.set_tree_height(0);
    }
}

impl<P: Deref<Target = Page>> Node for RTreeDescriptor<P> {
    fn page(&self) -> &Page {
        &self.page
    }
}

impl<P: DerefMut<Target = Page>> NodeMut for RTreeDescriptor<P> {
    fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_fields() -> crate::Result<()> {
        let mut page = Page::new(PageId::new(1), 64);
        {
            let mut d = RTreeDescriptor::new(&mut page)?;
            assert!(d.root_page_id().is_none());
            assert_eq!(d.tree_height(), 0);

            d.set_root_page_id(PageId::new(5));
            d.increment_tree_height();
            d.increment_tree_height();
        }
        assert_eq!(page.read_long(21), 5);
        assert_eq!(page.read_int(29), 2);

        let d = RTreeDescriptor::open(&page)?;
        assert_eq!(d.root_page_id(), PageId::new(5));
        assert_eq!(d.tree_height(), 2);
        Ok(())
    }

    #[test]
    fn test_clear() -> crate::Result<()> {
        let mut page = Page::new(PageId::new(1), 64);
        let mut d = RTreeDescriptor::new(&mut page)?;
        d.set_root_page_id(PageId::new(5));
        d.set_tree_height(3);
        d.link_to_self();
        d.clear();
        assert!(d.root_page_id().is_none());
        assert_eq!(d.tree_height(), 0);
        assert!(d.next_page_id().is_none());
        Ok(())
    }
}
