//! R-tree index and leaf nodes.
//!
//! ```text
//! Offset            Size        Description
//! 21                4           Number of keys (n)
//! 25                E*n         Entries, growing forward
//!                               (index: child page id, 8 bytes;
//!                                leaf: entity id, 16 bytes)
//! ...               free
//! size-(i+1)*K      K           Key slot i, packed backward from the end
//! ```
//!
//! Free space is `size - 25 - n*E - n*K`; an insert is refused when the new
//! entry plus its key does not fit, and an exact fit is accepted.

use super::{verify, initialize, Node, NodeMut, NODE_HEADER_SIZE};
use crate::error::{Result, StorageError};
use crate::geometry::{Geometry, KeyCodec, SpatialKey};
use crate::page::{Page, PullCursor, PushCursor};
use crate::types::*;
use std::ops::{Deref, DerefMut};
use uuid::Uuid;

const NUMBER_OF_KEYS_OFFSET: usize = NODE_HEADER_SIZE;
const ENTRIES_OFFSET: usize = NUMBER_OF_KEYS_OFFSET + SIZE_OF_INT;

/// What an entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Payload {
    Child(PageId),
    Entity(Uuid),
}

/// Read side shared by index and leaf nodes
pub trait RTreeNode: Node {
    const NODE_TYPE: NodeType;
    const ENTRY_SIZE: usize;

    /// Entry stored next to each key
    type Entry: Copy;

    fn entry(&self, idx: usize) -> Self::Entry;

    fn payload(&self, idx: usize) -> Payload;

    /// Entity id used to tag the key in slot `idx`
    fn key_tag(&self, _idx: usize) -> Uuid {
        Uuid::nil()
    }

    fn number_of_keys(&self) -> usize {
        self.page().read_int(NUMBER_OF_KEYS_OFFSET).max(0) as usize
    }

    fn entry_offset(&self, idx: usize) -> usize {
        ENTRIES_OFFSET + idx * Self::ENTRY_SIZE
    }

    fn key_offset(&self, idx: usize, key_size: usize) -> usize {
        self.page().size() - (idx + 1) * key_size
    }

    fn free_space(&self, key_size: usize) -> usize {
        let used = ENTRIES_OFFSET + self.number_of_keys() * (Self::ENTRY_SIZE + key_size);
        self.page().size().saturating_sub(used)
    }

    /// Most entries a node of this type can hold with keys of `key_size`
    fn capacity(&self, key_size: usize) -> usize {
        self.page().size().saturating_sub(ENTRIES_OFFSET) / (Self::ENTRY_SIZE + key_size)
    }

    fn build_key<K, C: KeyCodec<K>>(&self, idx: usize, codec: &C) -> K {
        let offset = self.key_offset(idx, codec.key_size());
        codec.decode(&mut PullCursor::new(self.page(), offset), self.key_tag(idx))
    }

    /// Slot of a stored key at distance exactly 0 from `key`
    fn index_of_key<K: SpatialKey, C: KeyCodec<K>>(&self, key: &K, codec: &C) -> Option<usize> {
        (0..self.number_of_keys()).find(|&i| self.build_key(i, codec).distance_to(key) == 0.0)
    }
}

/// Write side shared by index and leaf nodes
pub trait RTreeNodeMut: RTreeNode + NodeMut {
    fn write_entry(&mut self, idx: usize, entry: Self::Entry);

    fn set_number_of_keys(&mut self, n: usize) {
        self.page_mut().write_int(NUMBER_OF_KEYS_OFFSET, n as i32);
    }

    fn write_key<K, C: KeyCodec<K>>(&mut self, idx: usize, key: &K, codec: &C) {
        let offset = self.key_offset(idx, codec.size_of(key));
        codec.encode(key, &mut PushCursor::new(self.page_mut(), offset));
    }

    /// Append a key with its entry. Returns `false`, leaving the node
    /// untouched, when they do not fit.
    fn add_key<K, C: KeyCodec<K>>(&mut self, key: &K, entry: Self::Entry, codec: &C) -> bool {
        let key_size = codec.size_of(key);
        if key_size + Self::ENTRY_SIZE > self.free_space(key_size) {
            return false;
        }
        let n = self.number_of_keys();
        self.write_entry(n, entry);
        self.write_key(n, key, codec);
        self.set_number_of_keys(n + 1);
        true
    }

    /// Drop every entry
    fn clear(&mut self) {
        self.set_number_of_keys(0);
    }
}

/// Internal node whose entries are child page ids
pub struct RTreeIndex<P> {
    page: P,
}

impl<P: Deref<Target = Page>> RTreeIndex<P> {
    pub fn open(page: P) -> Result<Self> {
        verify(&page, NodeType::RTreeIndex)?;
        Ok(Self { page })
    }

    pub fn sub_page_id(&self, idx: usize) -> PageId {
        self.page.read_page_id(self.entry_offset(idx))
    }

    pub fn index_of_sub_page_id(&self, page_id: PageId) -> Option<usize> {
        (0..self.number_of_keys()).find(|&i| self.sub_page_id(i) == page_id)
    }
}

impl<P: DerefMut<Target = Page>> RTreeIndex<P> {
    pub fn new(mut page: P) -> Result<Self> {
        initialize(&mut page, NodeType::RTreeIndex)?;
        Ok(Self { page })
    }

    /// Overwrite the key in slot `idx`
    pub fn replace<K, C: KeyCodec<K>>(&mut self, idx: usize, key: &K, codec: &C) {
        self.write_key(idx, key, codec);
    }

    /// Append two entries at once, or neither
    pub fn add_key_pair<K, C: KeyCodec<K>>(
        &mut self,
        first: (&K, PageId),
        second: (&K, PageId),
        codec: &C,
    ) -> bool {
        let key_size = codec.size_of(first.0);
        if 2 * (key_size + Self::ENTRY_SIZE) > self.free_space(key_size) {
            return false;
        }
        self.add_key(first.0, first.1, codec) && self.add_key(second.0, second.1, codec)
    }

    /// Choose the child whose bound grows least when `key` is added, ties
    /// going to the smaller bound. The chosen bound is rewritten to cover
    /// `key` when it had to grow.
    pub fn index_of_insertion<K: SpatialKey, C: KeyCodec<K>>(
        &mut self,
        key: &K,
        geometry: &Geometry<K, C>,
    ) -> Option<usize> {
        let mut min_enlargement = f64::MAX;
        let mut min_occupancy = f64::MAX;
        let mut chosen: Option<(usize, K)> = None;

        for i in 0..self.number_of_keys() {
            let stored = self.build_key(i, geometry.codec());
            let before = geometry.occupancy(&stored);
            let union = geometry.union(key, &stored);
            let enlargement = geometry.occupancy(&union) - before;

            if enlargement < min_enlargement {
                min_enlargement = enlargement;
                min_occupancy = before;
                chosen = Some((i, union));
            } else if enlargement == min_enlargement && before < min_occupancy {
                min_occupancy = before;
                chosen = Some((i, union));
            }
        }

        let (idx, union) = chosen?;
        let stored = self.build_key(idx, geometry.codec());
        if !geometry.contains(&stored, key) {
            self.replace(idx, &union, geometry.codec());
        }
        Some(idx)
    }
}

impl<P: Deref<Target = Page>> Node for RTreeIndex<P> {
    fn page(&self) -> &Page {
        &self.page
    }
}

impl<P: DerefMut<Target = Page>> NodeMut for RTreeIndex<P> {
    fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }
}

impl<P: Deref<Target = Page>> RTreeNode for RTreeIndex<P> {
    const NODE_TYPE: NodeType = NodeType::RTreeIndex;
    const ENTRY_SIZE: usize = SIZE_OF_LONG;
    type Entry = PageId;

    fn entry(&self, idx: usize) -> PageId {
        self.sub_page_id(idx)
    }

    fn payload(&self, idx: usize) -> Payload {
        Payload::Child(self.sub_page_id(idx))
    }
}

impl<P: DerefMut<Target = Page>> RTreeNodeMut for RTreeIndex<P> {
    fn write_entry(&mut self, idx: usize, entry: PageId) {
        let offset = self.entry_offset(idx);
        self.page.write_page_id(offset, entry);
    }
}

/// Leaf node whose entries are entity ids
pub struct RTreeLeaf<P> {
    page: P,
}

impl<P: Deref<Target = Page>> RTreeLeaf<P> {
    pub fn open(page: P) -> Result<Self> {
        verify(&page, NodeType::RTreeLeaf)?;
        Ok(Self { page })
    }

    pub fn entity_uuid(&self, idx: usize) -> Uuid {
        self.page.read_uuid(self.entry_offset(idx))
    }
}

impl<P: DerefMut<Target = Page>> RTreeLeaf<P> {
    pub fn new(mut page: P) -> Result<Self> {
        initialize(&mut page, NodeType::RTreeLeaf)?;
        Ok(Self { page })
    }
}

impl<P: Deref<Target = Page>> Node for RTreeLeaf<P> {
    fn page(&self) -> &Page {
        &self.page
    }
}

impl<P: DerefMut<Target = Page>> NodeMut for RTreeLeaf<P> {
    fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }
}

impl<P: Deref<Target = Page>> RTreeNode for RTreeLeaf<P> {
    const NODE_TYPE: NodeType = NodeType::RTreeLeaf;
    const ENTRY_SIZE: usize = SIZE_OF_UUID;
    type Entry = Uuid;

    fn entry(&self, idx: usize) -> Uuid {
        self.entity_uuid(idx)
    }

    fn payload(&self, idx: usize) -> Payload {
        Payload::Entity(self.entity_uuid(idx))
    }

    fn key_tag(&self, idx: usize) -> Uuid {
        self.entity_uuid(idx)
    }
}

impl<P: DerefMut<Target = Page>> RTreeNodeMut for RTreeLeaf<P> {
    fn write_entry(&mut self, idx: usize, entry: Uuid) {
        let offset = self.entry_offset(idx);
        self.page.write_uuid(offset, entry);
    }
}

/// An R-tree node decoded from its stored type tag
pub enum RTreeNodeRef<P> {
    Index(RTreeIndex<P>),
    Leaf(RTreeLeaf<P>),
}

impl<P: Deref<Target = Page>> RTreeNodeRef<P> {
    pub fn open(page: P) -> Result<Self> {
        match NodeType::from_tag(page.stored_node_type()) {
            Some(NodeType::RTreeIndex) => Ok(Self::Index(RTreeIndex { page })),
            Some(NodeType::RTreeLeaf) => Ok(Self::Leaf(RTreeLeaf { page })),
            _ => Err(StorageError::invalid_page(format!(
                "page {} holds node type {}, not an R-tree node",
                page.id(),
                page.stored_node_type()
            ))),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    pub fn page_id(&self) -> PageId {
        match self {
            Self::Index(n) => n.page_id(),
            Self::Leaf(n) => n.page_id(),
        }
    }

    pub fn number_of_keys(&self) -> usize {
        match self {
            Self::Index(n) => n.number_of_keys(),
            Self::Leaf(n) => n.number_of_keys(),
        }
    }

    pub fn build_key<K, C: KeyCodec<K>>(&self, idx: usize, codec: &C) -> K {
        match self {
            Self::Index(n) => n.build_key(idx, codec),
            Self::Leaf(n) => n.build_key(idx, codec),
        }
    }

    pub fn payload(&self, idx: usize) -> Payload {
        match self {
            Self::Index(n) => n.payload(idx),
            Self::Leaf(n) => n.payload(idx),
        }
    }

    pub fn previous_page_id(&self) -> PageId {
        match self {
            Self::Index(n) => n.previous_page_id(),
            Self::Leaf(n) => n.previous_page_id(),
        }
    }

    pub fn next_page_id(&self) -> PageId {
        match self {
            Self::Index(n) => n.next_page_id(),
            Self::Leaf(n) => n.next_page_id(),
        }
    }
}
