//! Stack-driven co-descent over two trees.

use super::sweep::{pinning_order, plane_sweep, sort_by_lower_bound, z_order, Candidate};
use super::DEFAULT_JOIN_CACHE_PAGES;
use crate::buffer::{LruCache, PageRef, Session};
use crate::error::{Result, StorageError};
use crate::geometry::{Geometry, KeyCodec, SpatialKey};
use crate::metrics::{JoinMetrics, JoinStrategy};
use crate::node::{Payload, RTreeNodeRef};
use crate::page::Page;
use crate::rtree::RTree;
use crate::types::PageId;
use std::collections::VecDeque;
use std::time::Instant;
use uuid::Uuid;

/// Which input tree a page belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeSide {
    First,
    Second,
}

/// A node pair waiting to be examined
struct Frame<K> {
    first: PageId,
    second: PageId,
    /// Intersection of the bounds that led to this pair
    restriction: Option<K>,
}

/// Matched entry slots of one node pair, with their common region
type SlotPair<K> = (usize, usize, Option<K>);

/// Page access for one join call
struct PageReader<'s> {
    first: &'s mut Session,
    second: &'s mut Session,
    cache: LruCache<(PageId, TreeSide), PageRef>,
    misses: u64,
}

impl PageReader<'_> {
    fn fetch(&mut self, side: TreeSide, page_id: PageId) -> Result<PageRef> {
        if let Some(page) = self.cache.get(&(page_id, side)) {
            return Ok(PageRef::clone(page));
        }
        self.misses += 1;
        let session = match side {
            TreeSide::First => &mut *self.first,
            TreeSide::Second => &mut *self.second,
        };
        let page = session.load(page_id)?;
        self.cache.put((page_id, side), PageRef::clone(&page));
        Ok(page)
    }
}

/// Join engine over two R-trees of equal height
pub struct SpatialJoin<'a, K, C> {
    first: &'a RTree<K, C>,
    second: &'a RTree<K, C>,
    first_root: PageId,
    second_root: PageId,
    height: u32,
    cache_capacity: usize,
    last_metrics: Option<JoinMetrics>,
}

impl<'a, K: SpatialKey, C: KeyCodec<K>> SpatialJoin<'a, K, C> {
    pub fn new(first: &'a RTree<K, C>, second: &'a RTree<K, C>) -> Result<Self> {
        Self::with_cache_capacity(first, second, DEFAULT_JOIN_CACHE_PAGES)
    }

    /// Fails with [`StorageError::HeightMismatch`] unless both trees have
    /// the same height.
    ///
    /// Roots are fixed here. Every join call opens one session per tree and
    /// closes both before returning, so `cache_capacity` bounds the misses
    /// counted per call while the sessions hold the pages of that call only.
    pub fn with_cache_capacity(
        first: &'a RTree<K, C>,
        second: &'a RTree<K, C>,
        cache_capacity: usize,
    ) -> Result<Self> {
        let (first_root, first_height) = first.root_and_height()?;
        let (second_root, second_height) = second.root_and_height()?;
        if first_height != second_height {
            return Err(StorageError::HeightMismatch {
                first: first_height,
                second: second_height,
            });
        }

        Ok(Self {
            first,
            second,
            first_root,
            second_root,
            height: first_height,
            cache_capacity,
            last_metrics: None,
        })
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    /// Counters of the most recent join call
    pub fn last_metrics(&self) -> Option<&JoinMetrics> {
        self.last_metrics.as_ref()
    }

    pub fn basic_join(&mut self) -> Result<Vec<(Uuid, Uuid)>> {
        self.join(JoinStrategy::Basic)
    }

    pub fn restricted_space_join(&mut self) -> Result<Vec<(Uuid, Uuid)>> {
        self.join(JoinStrategy::RestrictedSpace)
    }

    pub fn plane_sweep_join(&mut self) -> Result<Vec<(Uuid, Uuid)>> {
        self.join(JoinStrategy::PlaneSweep)
    }

    pub fn pinned_plane_sweep_join(&mut self) -> Result<Vec<(Uuid, Uuid)>> {
        self.join(JoinStrategy::PlaneSweepPinning)
    }

    pub fn z_order_join(&mut self) -> Result<Vec<(Uuid, Uuid)>> {
        self.join(JoinStrategy::ZOrder)
    }

    /// All `(first entity, second entity)` pairs whose keys overlap
    pub fn join(&mut self, strategy: JoinStrategy) -> Result<Vec<(Uuid, Uuid)>> {
        let first_tree = self.first;
        let geometry = first_tree.geometry();
        let start = Instant::now();
        let comparisons = geometry.comparisons();

        let mut first_session = self.first.workspace().open_session()?;
        let mut second_session = self.second.workspace().open_session()?;
        let mut reader = PageReader {
            first: &mut first_session,
            second: &mut second_session,
            cache: LruCache::new(self.cache_capacity),
            misses: 0,
        };
        let results = self.co_descend(strategy, &mut reader)?;
        let misses = reader.misses;
        first_session.close()?;
        second_session.close()?;

        let metrics = JoinMetrics {
            strategy,
            comparisons: geometry.comparisons() - comparisons,
            disk_accesses: misses,
            elapsed: start.elapsed(),
            results: results.len(),
        };
        log::debug!(
            "{} join: {} pairs, {} comparisons, {} disk accesses in {:?}",
            strategy,
            metrics.results,
            metrics.comparisons,
            metrics.disk_accesses,
            metrics.elapsed
        );
        self.last_metrics = Some(metrics);
        Ok(results)
    }

    fn co_descend(
        &self,
        strategy: JoinStrategy,
        reader: &mut PageReader<'_>,
    ) -> Result<Vec<(Uuid, Uuid)>> {
        let geometry = self.first.geometry();
        let mut results = Vec::new();
        let mut stack = VecDeque::new();
        if !self.first_root.is_none() {
            stack.push_back(Frame {
                first: self.first_root,
                second: self.second_root,
                restriction: None,
            });
        }

        while let Some(frame) = stack.pop_back() {
            let first_page = reader.fetch(TreeSide::First, frame.first)?;
            let second_page = reader.fetch(TreeSide::Second, frame.second)?;
            let first_guard = first_page.read();
            let second_guard = second_page.read();
            let first_node = RTreeNodeRef::open(&*first_guard)?;
            let second_node = RTreeNodeRef::open(&*second_guard)?;
            if first_node.is_leaf() != second_node.is_leaf() {
                return Err(StorageError::invariant(format!(
                    "trees of equal height diverge at pages {} and {}",
                    frame.first, frame.second
                )));
            }

            let pairs = match_entries(
                geometry,
                strategy,
                &first_node,
                &second_node,
                frame.restriction.as_ref(),
            );

            if first_node.is_leaf() {
                for (j, i, _) in pairs {
                    results.push((entity(&first_node, j)?, entity(&second_node, i)?));
                }
            } else if matches!(strategy, JoinStrategy::PlaneSweepPinning | JoinStrategy::ZOrder) {
                // pinned batches go underneath what is already pending
                for (j, i, restriction) in pairs {
                    stack.push_front(Frame {
                        first: child(&first_node, j)?,
                        second: child(&second_node, i)?,
                        restriction,
                    });
                }
            } else {
                // first match ends up on top
                for (j, i, restriction) in pairs.into_iter().rev() {
                    stack.push_back(Frame {
                        first: child(&first_node, j)?,
                        second: child(&second_node, i)?,
                        restriction,
                    });
                }
            }
        }
        Ok(results)
    }
}

/// Overlapping entries of a node pair as `(first slot, second slot,
/// intersection)`, in the order the strategy processes them
fn match_entries<K: SpatialKey, C: KeyCodec<K>>(
    geometry: &Geometry<K, C>,
    strategy: JoinStrategy,
    first: &RTreeNodeRef<&Page>,
    second: &RTreeNodeRef<&Page>,
    restriction: Option<&K>,
) -> Vec<SlotPair<K>> {
    let codec = geometry.codec();
    let first_keys: Vec<K> = (0..first.number_of_keys())
        .map(|j| first.build_key(j, codec))
        .collect();
    let second_keys: Vec<K> = (0..second.number_of_keys())
        .map(|i| second.build_key(i, codec))
        .collect();

    let mut pairs = Vec::new();
    match strategy {
        JoinStrategy::Basic => {
            for (i, b) in second_keys.iter().enumerate() {
                for (j, a) in first_keys.iter().enumerate() {
                    if geometry.is_overlap(b, a) {
                        pairs.push((j, i, None));
                    }
                }
            }
        }
        JoinStrategy::RestrictedSpace => {
            let first_slots = restrict(geometry, &first_keys, restriction);
            let second_slots = restrict(geometry, &second_keys, restriction);
            for &i in &second_slots {
                for &j in &first_slots {
                    if geometry.is_overlap(&second_keys[i], &first_keys[j]) {
                        let common = geometry.intersection(&first_keys[j], &second_keys[i]);
                        pairs.push((j, i, Some(common)));
                    }
                }
            }
        }
        JoinStrategy::PlaneSweep | JoinStrategy::PlaneSweepPinning | JoinStrategy::ZOrder => {
            let first_candidates = candidates(geometry, &first_keys, restriction);
            let second_candidates = candidates(geometry, &second_keys, restriction);
            let mut matches = plane_sweep(geometry, &first_candidates, &second_candidates);
            let order: Vec<usize> = match strategy {
                JoinStrategy::PlaneSweep => (0..matches.len()).collect(),
                JoinStrategy::ZOrder => {
                    matches.sort_by_key(|m| z_order(&m.intersection));
                    pinning_order(&matches)
                }
                _ => pinning_order(&matches),
            };
            for idx in order {
                let m = &matches[idx];
                pairs.push((
                    first_candidates[m.first].slot,
                    second_candidates[m.second].slot,
                    Some(m.intersection.clone()),
                ));
            }
        }
    }
    pairs
}

/// Slots of the keys overlapping `restriction` (all slots without one)
fn restrict<K: SpatialKey, C: KeyCodec<K>>(
    geometry: &Geometry<K, C>,
    keys: &[K],
    restriction: Option<&K>,
) -> Vec<usize> {
    match restriction {
        None => (0..keys.len()).collect(),
        Some(region) => (0..keys.len())
            .filter(|&i| geometry.is_overlap(&keys[i], region))
            .collect(),
    }
}

fn candidates<K: SpatialKey, C: KeyCodec<K>>(
    geometry: &Geometry<K, C>,
    keys: &[K],
    restriction: Option<&K>,
) -> Vec<Candidate<K>> {
    let mut list: Vec<Candidate<K>> = restrict(geometry, keys, restriction)
        .into_iter()
        .map(|slot| Candidate {
            key: keys[slot].clone(),
            slot,
        })
        .collect();
    sort_by_lower_bound(&mut list);
    list
}

fn entity(node: &RTreeNodeRef<&Page>, slot: usize) -> Result<Uuid> {
    match node.payload(slot) {
        Payload::Entity(uuid) => Ok(uuid),
        Payload::Child(_) => Err(StorageError::invariant(format!(
            "expected an entity in slot {} of page {}",
            slot,
            node.page_id()
        ))),
    }
}

fn child(node: &RTreeNodeRef<&Page>, slot: usize) -> Result<PageId> {
    match node.payload(slot) {
        Payload::Child(page_id) => Ok(page_id),
        Payload::Entity(_) => Err(StorageError::invariant(format!(
            "expected a child page in slot {} of page {}",
            slot,
            node.page_id()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect2, RectCodec};
    use crate::storage::Workspace;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeSet;
    use std::sync::Arc;

    type Tree = RTree<Rect2, RectCodec<2>>;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn tree(ws: &Arc<Workspace>) -> Result<Tree> {
        RTree::new(Arc::clone(ws), Uuid::new_v4(), RectCodec::new())
    }

    fn random_rect(rng: &mut StdRng) -> Rect2 {
        Rect2::from_xywh(
            rng.gen_range(0.0..100.0),
            rng.gen_range(0.0..100.0),
            rng.gen_range(0.5..6.0),
            rng.gen_range(0.5..6.0),
        )
    }

    fn brute_force(a: &[Rect2], b: &[Rect2]) -> BTreeSet<(Uuid, Uuid)> {
        let geometry = Geometry::new(RectCodec::<2>::new());
        let mut pairs = BTreeSet::new();
        for x in a {
            for y in b {
                if geometry.is_overlap(x, y) {
                    pairs.insert((x.uuid(), y.uuid()));
                }
            }
        }
        pairs
    }

    /// Two random trees grown until their heights agree
    fn equal_height_trees(
        seed: u64,
        page_size: usize,
        n: usize,
    ) -> Result<(Tree, Vec<Rect2>, Tree, Vec<Rect2>)> {
        let mut rng = StdRng::seed_from_u64(seed);
        let ws = Workspace::memory(page_size)?;
        let (mut a, mut b) = (tree(&ws)?, tree(&ws)?);
        let (mut ra, mut rb) = (Vec::new(), Vec::new());
        for _ in 0..n {
            let r = random_rect(&mut rng);
            a.add(&r)?;
            ra.push(r);
            let r = random_rect(&mut rng);
            b.add(&r)?;
            rb.push(r);
        }
        loop {
            let (ha, hb) = (a.height()?, b.height()?);
            if ha == hb {
                break;
            }
            let r = random_rect(&mut rng);
            if ha < hb {
                a.add(&r)?;
                ra.push(r);
            } else {
                b.add(&r)?;
                rb.push(r);
            }
        }
        Ok((a, ra, b, rb))
    }

    #[test]
    fn test_all_strategies_match_brute_force() -> Result<()> {
        init_logger();
        for (seed, page_size, n) in [(1, 256, 150), (2, 512, 300), (3, 4096, 40)] {
            let (a, ra, b, rb) = equal_height_trees(seed, page_size, n)?;
            let expected = brute_force(&ra, &rb);
            assert!(!expected.is_empty());

            let mut join = SpatialJoin::new(&a, &b)?;
            for strategy in JoinStrategy::ALL {
                let pairs = join.join(strategy)?;
                let found: BTreeSet<_> = pairs.iter().copied().collect();
                assert_eq!(found.len(), pairs.len(), "{} emitted duplicates", strategy);
                assert_eq!(found, expected, "{} on seed {}", strategy, seed);

                let metrics = join.last_metrics().expect("metrics recorded");
                assert_eq!(metrics.strategy, strategy);
                assert_eq!(metrics.results, expected.len());
                assert!(metrics.disk_accesses >= 2);
                assert!(metrics.comparisons > 0);
            }
        }
        Ok(())
    }

    #[test]
    fn test_small_scenario() -> Result<()> {
        let ws = Workspace::memory(4096)?;
        let (mut a, mut b) = (tree(&ws)?, tree(&ws)?);
        let ra = [
            Rect2::from_xywh(0.0, 0.0, 1.0, 1.0),
            Rect2::from_xywh(5.0, 5.0, 1.0, 1.0),
            Rect2::from_xywh(0.5, 0.5, 1.0, 1.0),
        ];
        let rb = [
            Rect2::from_xywh(0.4, 0.4, 0.3, 0.3),
            Rect2::from_xywh(10.0, 10.0, 1.0, 1.0),
        ];
        for r in &ra {
            a.add(r)?;
        }
        for r in &rb {
            b.add(r)?;
        }

        // (0.4, 0.4)-(0.7, 0.7) lies inside the first rectangle of A and
        // also reaches into the third one, which starts at (0.5, 0.5)
        let expected: BTreeSet<_> = [(ra[0].uuid(), rb[0].uuid()), (ra[2].uuid(), rb[0].uuid())]
            .into_iter()
            .collect();
        assert_eq!(expected, brute_force(&ra, &rb));

        let mut join = SpatialJoin::new(&a, &b)?;
        assert_eq!(join.height(), 1);
        for strategy in JoinStrategy::ALL {
            let found: BTreeSet<_> = join.join(strategy)?.into_iter().collect();
            assert_eq!(found, expected, "{}", strategy);
        }
        Ok(())
    }

    #[test]
    fn test_height_mismatch() -> Result<()> {
        let ws = Workspace::memory(256)?;
        let (mut a, mut b) = (tree(&ws)?, tree(&ws)?);
        for i in 0..10 {
            a.add(&Rect2::from_xywh(i as f64, 0.0, 1.0, 1.0))?;
        }
        b.add(&Rect2::from_xywh(0.0, 0.0, 1.0, 1.0))?;
        assert!(a.height()? > 1);

        match SpatialJoin::new(&a, &b) {
            Err(StorageError::HeightMismatch { first, second }) => {
                assert_eq!(first, a.height()?);
                assert_eq!(second, 1);
            }
            other => panic!("expected a height mismatch, got {:?}", other.err()),
        }
        Ok(())
    }

    #[test]
    fn test_empty_trees_join_to_nothing() -> Result<()> {
        let ws = Workspace::memory(256)?;
        let (a, b) = (tree(&ws)?, tree(&ws)?);
        let mut join = SpatialJoin::new(&a, &b)?;
        for strategy in JoinStrategy::ALL {
            assert!(join.join(strategy)?.is_empty());
            assert_eq!(join.last_metrics().map(|m| m.disk_accesses), Some(0));
        }
        Ok(())
    }

    #[test]
    fn test_self_join_finds_every_entry() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(5);
        let ws = Workspace::memory(256)?;
        let mut a = tree(&ws)?;
        let rects: Vec<_> = (0..80).map(|_| random_rect(&mut rng)).collect();
        for r in &rects {
            a.add(r)?;
        }
        let mut join = SpatialJoin::new(&a, &a)?;
        let pairs: BTreeSet<_> = join.z_order_join()?.into_iter().collect();
        for r in &rects {
            assert!(pairs.contains(&(r.uuid(), r.uuid())));
        }
        assert_eq!(pairs, brute_force(&rects, &rects));
        Ok(())
    }

    #[test]
    fn test_sessions_live_for_one_call() -> Result<()> {
        let (a, _, b, _) = equal_height_trees(4, 256, 60)?;
        let ws = Arc::clone(a.workspace());
        let mut join = SpatialJoin::new(&a, &b)?;
        let before = ws.last_session_id()?;

        let first = join.plane_sweep_join()?;
        assert_eq!(ws.last_session_id()?, before + 2);
        let second = join.plane_sweep_join()?;
        assert_eq!(ws.last_session_id()?, before + 4);
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_larger_cache_never_misses_more() -> Result<()> {
        let (a, _, b, _) = equal_height_trees(9, 256, 200)?;
        for strategy in JoinStrategy::ALL {
            let mut tiny = SpatialJoin::with_cache_capacity(&a, &b, 1)?;
            let mut roomy = SpatialJoin::with_cache_capacity(&a, &b, 4096)?;
            let small = tiny.join(strategy)?.len();
            let large = roomy.join(strategy)?.len();
            assert_eq!(small, large);
            let misses = |j: &SpatialJoin<'_, Rect2, RectCodec<2>>| {
                j.last_metrics().map(|m| m.disk_accesses).unwrap_or_default()
            };
            assert!(misses(&roomy) <= misses(&tiny), "{}", strategy);
        }
        Ok(())
    }
}
