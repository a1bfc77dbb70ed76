//! Typed node views over pages.
//!
//! Every node starts with the same header, right after the modified flag:
//!
//! ```text
//! Offset  Size  Description
//! 0       1     Modified flag (page level)
//! 1       4     Node type tag (0 = unclaimed)
//! 5       8     Previous sibling page id
//! 13      8     Next sibling page id
//! 21      ...   Type-specific features and entries
//! ```
//!
//! Views are generic over the page borrow: `View<&Page>` offers the read
//! side, `View<&mut Page>` (or a write guard) adds mutation. Constructing a
//! mutable view over an unclaimed page stamps the view's type; any other
//! stored type is rejected with [`StorageError::TypeMismatch`].

mod descriptor;
mod header;
mod rtree;

pub use descriptor::RTreeDescriptor;
pub use header::{HeaderNode, HEADER_ENTRY_SIZE, HEADER_FEATURES_END};
pub use rtree::{Payload, RTreeIndex, RTreeLeaf, RTreeNode, RTreeNodeMut, RTreeNodeRef};

use crate::error::{Result, StorageError};
use crate::page::{Page, MODIFIED_OFFSET};
use crate::types::*;

pub const NODE_TYPE_OFFSET: usize = MODIFIED_OFFSET + SIZE_OF_BOOLEAN;
pub const PREVIOUS_PAGE_OFFSET: usize = NODE_TYPE_OFFSET + SIZE_OF_INT;
pub const NEXT_PAGE_OFFSET: usize = PREVIOUS_PAGE_OFFSET + SIZE_OF_LONG;
/// Bytes taken by the modified flag and the node header
pub const NODE_HEADER_SIZE: usize = NEXT_PAGE_OFFSET + SIZE_OF_LONG;

/// Read access to the node header
pub trait Node {
    fn page(&self) -> &Page;

    fn page_id(&self) -> PageId {
        self.page().id()
    }

    /// Raw stored type tag
    fn stored_node_type(&self) -> i32 {
        self.page().read_int(NODE_TYPE_OFFSET)
    }

    fn previous_page_id(&self) -> PageId {
        self.page().read_page_id(PREVIOUS_PAGE_OFFSET)
    }

    fn next_page_id(&self) -> PageId {
        self.page().read_page_id(NEXT_PAGE_OFFSET)
    }
}

/// Write access to the node header
pub trait NodeMut: Node {
    fn page_mut(&mut self) -> &mut Page;

    fn set_previous_page_id(&mut self, page_id: PageId) {
        self.page_mut().write_page_id(PREVIOUS_PAGE_OFFSET, page_id);
    }

    fn set_next_page_id(&mut self, page_id: PageId) {
        self.page_mut().write_page_id(NEXT_PAGE_OFFSET, page_id);
    }

    /// Make this node a ring of one
    fn link_to_self(&mut self) {
        let id = self.page_id();
        self.set_previous_page_id(id);
        self.set_next_page_id(id);
    }
}

impl Node for Page {
    fn page(&self) -> &Page {
        self
    }
}

impl NodeMut for Page {
    fn page_mut(&mut self) -> &mut Page {
        self
    }
}

/// Claim an unclaimed page for `expected`, or confirm it already is one
pub(crate) fn initialize(page: &mut Page, expected: NodeType) -> Result<()> {
    match page.stored_node_type() {
        0 => {
            page.write_int(NODE_TYPE_OFFSET, expected.tag());
            Ok(())
        }
        found => check_type(page.id(), expected, found),
    }
}

/// Confirm a page holds `expected` without claiming it
pub(crate) fn verify(page: &Page, expected: NodeType) -> Result<()> {
    check_type(page.id(), expected, page.stored_node_type())
}

fn check_type(page_id: PageId, expected: NodeType, found: i32) -> Result<()> {
    if found == expected.tag() {
        Ok(())
    } else {
        Err(StorageError::TypeMismatch {
            page_id,
            expected,
            found,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_offsets() {
        assert_eq!(NODE_TYPE_OFFSET, 1);
        assert_eq!(PREVIOUS_PAGE_OFFSET, 5);
        assert_eq!(NEXT_PAGE_OFFSET, 13);
        assert_eq!(NODE_HEADER_SIZE, 21);
    }

    #[test]
    fn test_initialize_claims_once() {
        let mut page = Page::new(PageId::new(3), 128);
        initialize(&mut page, NodeType::RTreeLeaf).unwrap();
        assert_eq!(page.stored_node_type(), 8);
        assert!(page.is_modified());

        initialize(&mut page, NodeType::RTreeLeaf).unwrap();
        verify(&page, NodeType::RTreeLeaf).unwrap();

        let err = initialize(&mut page, NodeType::RTreeIndex).unwrap_err();
        assert!(matches!(
            err,
            StorageError::TypeMismatch { expected: NodeType::RTreeIndex, found: 8, .. }
        ));
    }

    #[test]
    fn test_verify_rejects_unclaimed() {
        let page = Page::new(PageId::new(3), 128);
        assert!(matches!(
            verify(&page, NodeType::RTreeLeaf),
            Err(StorageError::TypeMismatch { found: 0, .. })
        ));
    }

    #[test]
    fn test_link_to_self() {
        let mut page = Page::new(PageId::new(9), 128);
        page.link_to_self();
        assert_eq!(page.previous_page_id(), PageId::new(9));
        assert_eq!(page.next_page_id(), PageId::new(9));
    }
}
