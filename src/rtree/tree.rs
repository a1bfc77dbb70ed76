//! R-tree core implementation.
//!
//! This module provides the main RTree struct with operations for:
//! - add: Insertion with quadratic split and promotion
//! - find: Exact-key lookup over an overlap descent
//! - leaf_keys / levels / sibling_ring / export_tree: Structural walks

use super::split::{split_node, splice_after, Promotion};
use super::Direction;
use crate::buffer::{PageRef, Session};
use crate::error::{Result, StorageError};
use crate::geometry::{Geometry, KeyCodec, SpatialKey};
use crate::metrics::PerformanceStats;
use crate::node::{
    Node, NodeMut, RTreeDescriptor, RTreeIndex, RTreeLeaf, RTreeNode, RTreeNodeMut, RTreeNodeRef,
};
use crate::page::Page;
use crate::storage::Workspace;
use crate::types::{NodeType, PageId};
use crate::{KeyBounds, TreeNode};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// A paged R-tree registered in a workspace under a class id
pub struct RTree<K, C> {
    workspace: Arc<Workspace>,
    /// Identifies this tree's descriptor in the workspace header
    class_id: Uuid,
    geometry: Geometry<K, C>,
    add_stats: PerformanceStats,
    find_stats: PerformanceStats,
}

impl<K: SpatialKey, C: KeyCodec<K>> RTree<K, C> {
    /// Open the tree stored under `class_id`, registering an empty one on
    /// first use
    pub fn new(workspace: Arc<Workspace>, class_id: Uuid, codec: C) -> Result<Self> {
        let key_size = codec.key_size();
        let page_size = workspace.page_size();
        let mut probe = Page::new(PageId::NONE, page_size);
        let leaf_capacity = RTreeLeaf::new(&mut probe)?.capacity(key_size);
        let mut probe = Page::new(PageId::NONE, page_size);
        let index_capacity = RTreeIndex::new(&mut probe)?.capacity(key_size);
        if leaf_capacity.min(index_capacity) < 2 {
            return Err(StorageError::invalid_config(format!(
                "{} byte pages hold {} leaf and {} index entries of {} byte keys, need 2",
                page_size, leaf_capacity, index_capacity, key_size
            )));
        }

        let mut se = workspace.open_session()?;
        let descriptor_id = se.find_page_id_descriptor(class_id)?;
        let height = {
            let page = se.load(descriptor_id)?;
            let mut guard = page.write();
            RTreeDescriptor::new(&mut *guard)?.tree_height()
        };
        se.close()?;
        log::debug!(
            "opened rtree {} (descriptor page {}, height {})",
            class_id,
            descriptor_id,
            height
        );

        Ok(Self {
            workspace,
            class_id,
            geometry: Geometry::new(codec),
            add_stats: PerformanceStats::default(),
            find_stats: PerformanceStats::default(),
        })
    }

    pub fn class_id(&self) -> Uuid {
        self.class_id
    }

    pub fn workspace(&self) -> &Arc<Workspace> {
        &self.workspace
    }

    pub fn geometry(&self) -> &Geometry<K, C> {
        &self.geometry
    }

    /// Totals over every `add` call
    pub fn add_stats(&self) -> &PerformanceStats {
        &self.add_stats
    }

    /// Totals over every `find` call
    pub fn find_stats(&self) -> &PerformanceStats {
        &self.find_stats
    }

    pub fn reset_stats(&mut self) {
        self.add_stats.reset();
        self.find_stats.reset();
    }

    /// Get the root page ID (`PageId::NONE` for an empty tree)
    pub fn root_page_id(&self) -> Result<PageId> {
        Ok(self.root_and_height()?.0)
    }

    /// Get the height of the tree (0 for an empty tree)
    pub fn height(&self) -> Result<u32> {
        Ok(self.root_and_height()?.1)
    }

    pub fn root_and_height(&self) -> Result<(PageId, u32)> {
        self.with_session(|se| self.read_descriptor(se))
    }

    /// Insert a key, bound to the entity id it carries
    pub fn add(&mut self, key: &K) -> Result<bool> {
        let start = Instant::now();
        let comparisons = self.geometry.comparisons();
        let mut se = self.workspace.open_session()?;
        if let Err(e) = self.insert(&mut se, key) {
            se.abandon();
            return Err(e);
        }
        let accesses = se.block_access();
        se.close()?;
        self.add_stats.record(
            accesses,
            self.geometry.comparisons() - comparisons,
            start.elapsed(),
        );
        Ok(true)
    }

    /// Entity id of a stored key with exactly the coordinates of `key`
    pub fn find(&mut self, key: &K) -> Result<Option<Uuid>> {
        let start = Instant::now();
        let comparisons = self.geometry.comparisons();
        let mut se = self.workspace.open_session()?;
        let found = self.search(&mut se, key)?;
        let accesses = se.block_access();
        se.close()?;
        self.find_stats.record(
            accesses,
            self.geometry.comparisons() - comparisons,
            start.elapsed(),
        );
        Ok(found)
    }

    /// Run `f` in a session that is closed afterwards
    fn with_session<R>(&self, f: impl FnOnce(&mut Session) -> Result<R>) -> Result<R> {
        let mut se = self.workspace.open_session()?;
        let result = f(&mut se)?;
        se.close()?;
        Ok(result)
    }

    fn descriptor(&self, se: &mut Session) -> Result<PageRef> {
        let page_id = se.find_page_id_descriptor(self.class_id)?;
        se.load(page_id)
    }

    fn read_descriptor(&self, se: &mut Session) -> Result<(PageId, u32)> {
        let page = self.descriptor(se)?;
        let guard = page.read();
        let descriptor = RTreeDescriptor::open(&*guard)?;
        Ok((descriptor.root_page_id(), descriptor.tree_height()))
    }

    fn insert(&self, se: &mut Session, key: &K) -> Result<()> {
        let codec = self.geometry.codec();
        let descriptor = self.descriptor(se)?;
        let root = RTreeDescriptor::open(&*descriptor.read())?.root_page_id();

        if root.is_none() {
            let leaf_page = se.create()?;
            let leaf_id = {
                let mut guard = leaf_page.write();
                let mut leaf = RTreeLeaf::new(&mut *guard)?;
                if !leaf.add_key(key, key.uuid(), codec) {
                    return Err(StorageError::invariant("key does not fit an empty leaf"));
                }
                leaf.link_to_self();
                leaf.page_id()
            };
            let mut guard = descriptor.write();
            let mut descriptor = RTreeDescriptor::new(&mut *guard)?;
            descriptor.set_root_page_id(leaf_id);
            descriptor.set_tree_height(1);
            log::debug!("rtree {} rooted at leaf {}", self.class_id, leaf_id);
            return Ok(());
        }

        // Descend, widening the chosen bound at every level
        let mut path = Vec::new();
        let mut node_id = root;
        let leaf_page = loop {
            let page = se.load(node_id)?;
            let child = {
                let mut guard = page.write();
                match RTreeNodeRef::open(&mut *guard)? {
                    RTreeNodeRef::Index(mut index) => {
                        let idx = index
                            .index_of_insertion(key, &self.geometry)
                            .ok_or_else(|| {
                                StorageError::invariant(format!("index page {} is empty", node_id))
                            })?;
                        Some((idx, index.sub_page_id(idx)))
                    }
                    RTreeNodeRef::Leaf(_) => None,
                }
            };
            match child {
                Some((slot, child)) => {
                    path.push((node_id, slot));
                    node_id = child;
                }
                None => break page,
            }
        };

        let inserted = {
            let mut guard = leaf_page.write();
            RTreeLeaf::new(&mut *guard)?.add_key(key, key.uuid(), codec)
        };
        if inserted {
            return Ok(());
        }

        let mut promotion = Some(self.split_leaf(se, &leaf_page, key)?);
        while let Some((parent_id, _)) = path.pop() {
            let Some(p) = promotion.take() else { break };
            let parent_page = se.load(parent_id)?;
            let fits = {
                let mut guard = parent_page.write();
                let mut parent = RTreeIndex::new(&mut *guard)?;
                let slot = parent.index_of_sub_page_id(p.first_page).ok_or_else(|| {
                    StorageError::invariant(format!(
                        "page {} is not a child of {}",
                        p.first_page, parent_id
                    ))
                })?;
                parent.replace(slot, &p.first_key, codec);
                parent.add_key(&p.second_key, p.second_page, codec)
            };
            if fits {
                self.cover_ancestors(se, &path, [p.first_key, p.second_key])?;
                break;
            }
            promotion = Some(self.split_index(se, &parent_page, &p.second_key, p.second_page)?);
        }

        if let Some(p) = promotion {
            self.grow_root(se, &descriptor, p)?;
        }
        Ok(())
    }

    /// Widen the bounds along `path`, deepest first, until they cover the
    /// bounds just installed one level below the last path entry.
    fn cover_ancestors(
        &self,
        se: &mut Session,
        path: &[(PageId, usize)],
        installed: [K; 2],
    ) -> Result<()> {
        let codec = self.geometry.codec();
        let mut installed = installed.to_vec();
        for &(page_id, slot) in path.iter().rev() {
            let page = se.load(page_id)?;
            let mut guard = page.write();
            let mut index = RTreeIndex::new(&mut *guard)?;
            let stored = index.build_key(slot, codec);
            if installed.iter().all(|key| self.geometry.contains(&stored, key)) {
                break;
            }
            let widened = installed
                .iter()
                .fold(stored, |bound, key| self.geometry.enlarge(&bound, key));
            index.replace(slot, &widened, codec);
            installed = vec![widened];
        }
        Ok(())
    }

    fn split_leaf(&self, se: &mut Session, full_page: &PageRef, key: &K) -> Result<Promotion<K>> {
        let fresh_page = se.create()?;
        let (promotion, successor) = {
            let mut full_guard = full_page.write();
            let mut fresh_guard = fresh_page.write();
            let mut full = RTreeLeaf::new(&mut *full_guard)?;
            let mut fresh = RTreeLeaf::new(&mut *fresh_guard)?;
            let promotion = split_node(&self.geometry, &mut full, &mut fresh, key, key.uuid())?;
            (promotion, splice_after(&mut full, &mut fresh))
        };
        if let Some(next) = successor {
            relink_successor(se, next, promotion.second_page, NodeType::RTreeLeaf)?;
        }
        log::debug!(
            "split leaf {} into {}",
            promotion.first_page,
            promotion.second_page
        );
        Ok(promotion)
    }

    fn split_index(
        &self,
        se: &mut Session,
        full_page: &PageRef,
        key: &K,
        child: PageId,
    ) -> Result<Promotion<K>> {
        let fresh_page = se.create()?;
        let (promotion, successor) = {
            let mut full_guard = full_page.write();
            let mut fresh_guard = fresh_page.write();
            let mut full = RTreeIndex::new(&mut *full_guard)?;
            let mut fresh = RTreeIndex::new(&mut *fresh_guard)?;
            let promotion = split_node(&self.geometry, &mut full, &mut fresh, key, child)?;
            (promotion, splice_after(&mut full, &mut fresh))
        };
        if let Some(next) = successor {
            relink_successor(se, next, promotion.second_page, NodeType::RTreeIndex)?;
        }
        log::debug!(
            "split index {} into {}",
            promotion.first_page,
            promotion.second_page
        );
        Ok(promotion)
    }

    /// Put a new index root above the two halves of a split root
    fn grow_root(&self, se: &mut Session, descriptor: &PageRef, p: Promotion<K>) -> Result<()> {
        let root_page = se.create()?;
        let root_id = {
            let mut guard = root_page.write();
            let mut root = RTreeIndex::new(&mut *guard)?;
            if !root.add_key_pair(
                (&p.first_key, p.first_page),
                (&p.second_key, p.second_page),
                self.geometry.codec(),
            ) {
                return Err(StorageError::invariant("promoted pair does not fit a new root"));
            }
            root.link_to_self();
            root.page_id()
        };
        let mut guard = descriptor.write();
        let mut descriptor = RTreeDescriptor::new(&mut *guard)?;
        descriptor.set_root_page_id(root_id);
        descriptor.increment_tree_height();
        log::debug!(
            "rtree {} new root {} at height {}",
            self.class_id,
            root_id,
            descriptor.tree_height()
        );
        Ok(())
    }

    fn search(&self, se: &mut Session, key: &K) -> Result<Option<Uuid>> {
        let codec = self.geometry.codec();
        let (root, _) = self.read_descriptor(se)?;
        if root.is_none() {
            return Ok(None);
        }

        let mut stack = vec![root];
        while let Some(page_id) = stack.pop() {
            let page = se.load(page_id)?;
            let guard = page.read();
            match RTreeNodeRef::open(&*guard)? {
                RTreeNodeRef::Index(index) => {
                    let children: Vec<PageId> = (0..index.number_of_keys())
                        .filter(|&i| self.geometry.is_overlap(&index.build_key(i, codec), key))
                        .map(|i| index.sub_page_id(i))
                        .collect();
                    // first overlapping child is visited first
                    stack.extend(children.into_iter().rev());
                }
                RTreeNodeRef::Leaf(leaf) => {
                    if let Some(i) = leaf.index_of_key(key, codec) {
                        return Ok(Some(leaf.entity_uuid(i)));
                    }
                }
            }
        }
        Ok(None)
    }

    /// Every stored key, tagged with its entity id, walking the leaf ring
    /// from the leftmost leaf
    pub fn leaf_keys(&self) -> Result<Vec<K>> {
        let codec = self.geometry.codec();
        self.with_session(|se| {
            let (root, _) = self.read_descriptor(se)?;
            if root.is_none() {
                return Ok(Vec::new());
            }

            let mut leftmost = root;
            loop {
                let page = se.load(leftmost)?;
                let guard = page.read();
                match RTreeNodeRef::open(&*guard)? {
                    RTreeNodeRef::Index(index) if index.number_of_keys() > 0 => {
                        leftmost = index.sub_page_id(0);
                    }
                    RTreeNodeRef::Index(_) => {
                        return Err(StorageError::invariant(format!(
                            "index page {} is empty",
                            leftmost
                        )))
                    }
                    RTreeNodeRef::Leaf(_) => break,
                }
            }

            let mut keys = Vec::new();
            for page_id in self.ring(se, leftmost, Direction::Next)? {
                let page = se.load(page_id)?;
                let guard = page.read();
                let leaf = RTreeLeaf::open(&*guard)?;
                keys.extend((0..leaf.number_of_keys()).map(|i| leaf.build_key(i, codec)));
            }
            Ok(keys)
        })
    }

    /// Page ids of every level, root first, children in entry order
    pub fn levels(&self) -> Result<Vec<Vec<PageId>>> {
        self.with_session(|se| {
            let (root, _) = self.read_descriptor(se)?;
            let mut levels = Vec::new();
            if root.is_none() {
                return Ok(levels);
            }

            let mut current = vec![root];
            loop {
                let mut below = Vec::new();
                for &page_id in &current {
                    let page = se.load(page_id)?;
                    let guard = page.read();
                    if let RTreeNodeRef::Index(index) = RTreeNodeRef::open(&*guard)? {
                        below.extend((0..index.number_of_keys()).map(|i| index.sub_page_id(i)));
                    }
                }
                levels.push(current);
                if below.is_empty() {
                    return Ok(levels);
                }
                current = below;
            }
        })
    }

    /// Sibling ring through `start`, following `direction` until it closes
    pub fn sibling_ring(&self, start: PageId, direction: Direction) -> Result<Vec<PageId>> {
        self.with_session(|se| self.ring(se, start, direction))
    }

    fn ring(&self, se: &mut Session, start: PageId, direction: Direction) -> Result<Vec<PageId>> {
        let limit = self.workspace.last_page_id()?.value();
        let mut ring = vec![start];
        let mut page_id = start;
        loop {
            let page = se.load(page_id)?;
            let guard = page.read();
            let node = RTreeNodeRef::open(&*guard)?;
            page_id = match direction {
                Direction::Next => node.next_page_id(),
                Direction::Previous => node.previous_page_id(),
            };
            if page_id == start {
                return Ok(ring);
            }
            if page_id.is_none() || ring.len() as u64 > limit {
                return Err(StorageError::corruption(format!(
                    "sibling ring through page {} does not close",
                    start
                )));
            }
            ring.push(page_id);
        }
    }

    /// Snapshot of the whole tree for inspection
    pub fn export_tree(&self) -> Result<Option<TreeNode>> {
        self.with_session(|se| {
            let (root, _) = self.read_descriptor(se)?;
            if root.is_none() {
                return Ok(None);
            }
            Ok(Some(self.export_node(se, root)?))
        })
    }

    fn export_node(&self, se: &mut Session, page_id: PageId) -> Result<TreeNode> {
        let codec = self.geometry.codec();
        let page = se.load(page_id)?;
        let (mut node, children) = {
            let guard = page.read();
            let view = RTreeNodeRef::open(&*guard)?;
            let keys: Vec<K> = (0..view.number_of_keys())
                .map(|i| view.build_key(i, codec))
                .collect();
            let mut node = TreeNode {
                page_id: page_id.value(),
                is_leaf: view.is_leaf(),
                previous_page_id: view.previous_page_id().value(),
                next_page_id: view.next_page_id().value(),
                keys: keys.iter().map(KeyBounds::of).collect(),
                entities: Vec::new(),
                children: Vec::new(),
            };
            let children = match &view {
                RTreeNodeRef::Index(index) => {
                    (0..index.number_of_keys()).map(|i| index.sub_page_id(i)).collect()
                }
                RTreeNodeRef::Leaf(_) => Vec::new(),
            };
            if let RTreeNodeRef::Leaf(leaf) = &view {
                node.entities = (0..leaf.number_of_keys())
                    .map(|i| leaf.entity_uuid(i).to_string())
                    .collect();
            }
            (node, children)
        };

        for child in children {
            node.children.push(self.export_node(se, child)?);
        }
        Ok(node)
    }
}

/// Point the back link of `next` at `fresh` after a split
fn relink_successor(
    se: &mut Session,
    next: PageId,
    fresh: PageId,
    expected: NodeType,
) -> Result<()> {
    let page = se.load(next)?;
    let mut guard = page.write();
    crate::node::verify(&guard, expected)?;
    guard.set_previous_page_id(fresh);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect2, RectCodec};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tempfile::tempdir;

    // 256 byte pages hold 4 leaf and 5 index entries of 2D keys
    const SMALL_PAGE: usize = 256;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn small_tree() -> Result<RTree<Rect2, RectCodec<2>>> {
        let ws = Workspace::memory(SMALL_PAGE)?;
        RTree::new(ws, Uuid::new_v4(), RectCodec::new())
    }

    fn random_rects(rng: &mut StdRng, n: usize) -> Vec<Rect2> {
        (0..n)
            .map(|_| {
                Rect2::from_xywh(
                    rng.gen_range(0.0..100.0),
                    rng.gen_range(0.0..100.0),
                    rng.gen_range(0.1..5.0),
                    rng.gen_range(0.1..5.0),
                )
            })
            .collect()
    }

    fn assert_rings_close(tree: &RTree<Rect2, RectCodec<2>>) -> Result<()> {
        for level in tree.levels()? {
            for &start in &level {
                let forward = tree.sibling_ring(start, Direction::Next)?;
                assert_eq!(forward.len(), level.len());
                let mut backward = tree.sibling_ring(start, Direction::Previous)?;
                assert_eq!(backward.len(), level.len());
                // same ring, opposite order, both starting at `start`
                backward[1..].reverse();
                assert_eq!(forward, backward);
            }
        }
        Ok(())
    }

    #[test]
    fn test_empty_tree() -> Result<()> {
        let mut tree = small_tree()?;
        assert_eq!(tree.height()?, 0);
        assert_eq!(tree.root_page_id()?, PageId::NONE);
        assert_eq!(tree.find(&Rect2::from_xywh(1.0, 1.0, 1.0, 1.0))?, None);
        // only the descriptor was read
        assert_eq!(tree.find_stats().disk_accesses, 1);
        assert!(tree.leaf_keys()?.is_empty());
        assert!(tree.levels()?.is_empty());
        assert!(tree.export_tree()?.is_none());
        Ok(())
    }

    #[test]
    fn test_first_insert_creates_self_linked_root() -> Result<()> {
        let mut tree = small_tree()?;
        let r = Rect2::from_xywh(1.0, 2.0, 3.0, 4.0);
        assert!(tree.add(&r)?);
        assert_eq!(tree.height()?, 1);
        let root = tree.root_page_id()?;
        assert_eq!(tree.sibling_ring(root, Direction::Next)?, vec![root]);
        assert_eq!(tree.sibling_ring(root, Direction::Previous)?, vec![root]);
        assert_eq!(tree.find(&r)?, Some(r.uuid()));
        // lookups match on origin; the extension does not take part
        assert_eq!(tree.find(&Rect2::from_xywh(1.0, 2.0, 3.0, 4.5))?, Some(r.uuid()));
        assert_eq!(tree.find(&Rect2::from_xywh(1.5, 2.0, 3.0, 4.0))?, None);
        Ok(())
    }

    #[test]
    fn test_leaf_split_grows_height() -> Result<()> {
        init_logger();
        let mut tree = small_tree()?;
        let rects: Vec<_> = (0..5)
            .map(|i| Rect2::from_xywh(i as f64 * 10.0, 0.0, 1.0, 1.0))
            .collect();
        for r in &rects[..4] {
            tree.add(r)?;
        }
        assert_eq!(tree.height()?, 1);

        tree.add(&rects[4])?;
        assert_eq!(tree.height()?, 2);
        let levels = tree.levels()?;
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].len(), 1);
        assert_eq!(levels[1].len(), 2);
        assert_rings_close(&tree)?;

        let export = tree.export_tree()?.expect("non-empty tree");
        assert!(!export.is_leaf);
        assert_eq!(export.children.len(), 2);
        let counts: Vec<_> = export.children.iter().map(|c| c.entities.len()).collect();
        assert!(counts.iter().all(|&n| n >= 1));
        assert_eq!(counts.iter().sum::<usize>(), 5);

        for r in &rects {
            assert_eq!(tree.find(r)?, Some(r.uuid()));
        }
        Ok(())
    }

    #[test]
    fn test_random_inserts_are_found() -> Result<()> {
        init_logger();
        let mut rng = StdRng::seed_from_u64(7);
        let mut tree = small_tree()?;
        let rects = random_rects(&mut rng, 400);

        let mut last_height = 0;
        for r in &rects {
            assert!(tree.add(r)?);
            let height = tree.height()?;
            assert!(height == last_height || height == last_height + 1);
            last_height = height;
        }
        assert!(last_height >= 3);
        assert_eq!(tree.add_stats().measurements, 400);

        for r in &rects {
            assert_eq!(tree.find(r)?, Some(r.uuid()), "lost {:?}", r);
        }

        let mut stored: Vec<Uuid> = tree.leaf_keys()?.iter().map(|k| k.uuid()).collect();
        let mut expected: Vec<Uuid> = rects.iter().map(|r| r.uuid()).collect();
        stored.sort();
        expected.sort();
        assert_eq!(stored, expected);

        let levels = tree.levels()?;
        assert_eq!(levels.len() as u32, tree.height()?);
        assert_rings_close(&tree)?;
        Ok(())
    }

    #[test]
    fn test_parent_bounds_cover_children() -> Result<()> {
        for seed in [11, 5, 23] {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut tree = small_tree()?;
            for r in random_rects(&mut rng, 300) {
                tree.add(&r)?;
            }
            check(&tree.export_tree()?.expect("non-empty tree"));
        }

        fn check(node: &TreeNode) {
            for (bound, child) in node.keys.iter().zip(&node.children) {
                for key in &child.keys {
                    for axis in 0..2 {
                        assert!(bound.origin[axis] <= key.origin[axis]);
                        assert!(
                            bound.origin[axis] + bound.extension[axis]
                                >= key.origin[axis] + key.extension[axis]
                        );
                    }
                }
                check(child);
            }
        }
        Ok(())
    }

    #[test]
    fn test_trees_share_a_workspace() -> Result<()> {
        let ws = Workspace::memory(SMALL_PAGE)?;
        let mut a = RTree::new(Arc::clone(&ws), Uuid::new_v4(), RectCodec::<2>::new())?;
        let mut b = RTree::new(Arc::clone(&ws), Uuid::new_v4(), RectCodec::<2>::new())?;
        let ra = Rect2::from_xywh(0.0, 0.0, 1.0, 1.0);
        let rb = Rect2::from_xywh(0.0, 0.0, 1.0, 1.0);
        a.add(&ra)?;
        b.add(&rb)?;
        assert_ne!(a.root_page_id()?, b.root_page_id()?);
        assert_eq!(a.find(&ra)?, Some(ra.uuid()));
        assert_eq!(b.find(&rb)?, Some(rb.uuid()));
        Ok(())
    }

    #[test]
    fn test_reopen_file_tree() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rtree.db");
        let class = Uuid::new_v4();
        let mut rng = StdRng::seed_from_u64(3);
        let rects = random_rects(&mut rng, 60);

        let height = {
            let ws = Workspace::file(&path, SMALL_PAGE, false)?;
            let mut tree = RTree::new(ws, class, RectCodec::<2>::new())?;
            for r in &rects {
                tree.add(r)?;
            }
            tree.height()?
        };

        let ws = Workspace::file(&path, SMALL_PAGE, false)?;
        let mut tree = RTree::new(ws, class, RectCodec::<2>::new())?;
        assert_eq!(tree.height()?, height);
        for r in &rects {
            assert_eq!(tree.find(r)?, Some(r.uuid()));
        }
        Ok(())
    }

    #[test]
    fn test_rejects_pages_too_small_for_two_entries() -> Result<()> {
        let ws = Workspace::memory(128)?;
        // 2 * (16 + 48) + 25 > 128 for 3D keys
        let result = RTree::new(ws, Uuid::new_v4(), RectCodec::<3>::new());
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));
        Ok(())
    }
}
