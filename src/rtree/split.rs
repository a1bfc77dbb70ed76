//! Quadratic node split.
//!
//! Splitting works on the `n + 1` keys of a full node plus the key that did
//! not fit. The two seeds are the pair wasting the most space when bounded
//! together; every other key joins the group whose bound grows least, ties
//! going to the smaller group bound, then the nearer group bound, then the
//! group with fewer members. Leaves and index nodes share this code and only
//! differ in the entry carried next to each key.

use crate::error::{Result, StorageError};
use crate::geometry::{Geometry, KeyCodec, SpatialKey};
use crate::node::{NodeMut, RTreeNodeMut};
use crate::types::PageId;

/// Bounds and pages to install in the parent after a split
#[derive(Debug, Clone)]
pub(crate) struct Promotion<K> {
    pub first_key: K,
    pub first_page: PageId,
    pub second_key: K,
    pub second_page: PageId,
}

/// How the keys of a split are divided between the two nodes
#[derive(Debug, Clone)]
pub(crate) struct SplitPlan<K> {
    pub first: Vec<usize>,
    pub second: Vec<usize>,
    pub first_bound: K,
    pub second_bound: K,
}

/// Divide `keys` (at least two) into two groups
pub(crate) fn plan_split<K: SpatialKey, C: KeyCodec<K>>(
    geometry: &Geometry<K, C>,
    keys: &[K],
) -> SplitPlan<K> {
    debug_assert!(keys.len() >= 2);
    let (mut seed1, mut seed2) = (0, 1);
    let mut worst = -1.0;
    for i in 0..keys.len() {
        for j in i + 1..keys.len() {
            let union = geometry.union(&keys[i], &keys[j]);
            let dead = geometry.occupancy(&union)
                - geometry.occupancy(&keys[i])
                - geometry.occupancy(&keys[j]);
            if dead > worst {
                worst = dead;
                seed1 = i;
                seed2 = j;
            }
        }
    }

    let mut plan = SplitPlan {
        first: vec![seed1],
        second: vec![seed2],
        first_bound: keys[seed1].clone(),
        second_bound: keys[seed2].clone(),
    };

    for (i, key) in keys.iter().enumerate() {
        if i == seed1 || i == seed2 {
            continue;
        }
        let union1 = geometry.enlarge(&plan.first_bound, key);
        let union2 = geometry.enlarge(&plan.second_bound, key);
        let occupancy1 = geometry.occupancy(&plan.first_bound);
        let occupancy2 = geometry.occupancy(&plan.second_bound);
        let enlargement1 = geometry.occupancy(&union1) - occupancy1;
        let enlargement2 = geometry.occupancy(&union2) - occupancy2;

        let to_first = if enlargement1 != enlargement2 {
            enlargement1 < enlargement2
        } else if occupancy1 != occupancy2 {
            occupancy1 < occupancy2
        } else {
            let distance1 = plan.first_bound.distance_to(key);
            let distance2 = plan.second_bound.distance_to(key);
            if distance1 != distance2 {
                distance1 < distance2
            } else {
                plan.first.len() <= plan.second.len()
            }
        };

        if to_first {
            plan.first.push(i);
            plan.first_bound = union1;
        } else {
            plan.second.push(i);
            plan.second_bound = union2;
        }
    }

    plan
}

/// Split `full` into itself and the blank node `fresh`, adding `key` with
/// `entry` along the way
pub(crate) fn split_node<N, K, C>(
    geometry: &Geometry<K, C>,
    full: &mut N,
    fresh: &mut N,
    key: &K,
    entry: N::Entry,
) -> Result<Promotion<K>>
where
    N: RTreeNodeMut,
    K: SpatialKey,
    C: KeyCodec<K>,
{
    let codec = geometry.codec();
    let n = full.number_of_keys();
    let mut keys = Vec::with_capacity(n + 1);
    let mut entries = Vec::with_capacity(n + 1);
    for i in 0..n {
        keys.push(full.build_key(i, codec));
        entries.push(full.entry(i));
    }
    keys.push(key.clone());
    entries.push(entry);

    if keys.len() < 2 {
        return Err(StorageError::invariant(format!(
            "page {} overflowed while empty",
            full.page_id()
        )));
    }

    let plan = plan_split(geometry, &keys);
    full.clear();
    fresh.clear();
    for (node, group) in [(&mut *full, &plan.first), (&mut *fresh, &plan.second)] {
        for &i in group {
            if !node.add_key(&keys[i], entries[i], codec) {
                return Err(StorageError::invariant(format!(
                    "split of {} entries does not fit page {}",
                    keys.len(),
                    node.page_id()
                )));
            }
        }
    }

    Ok(Promotion {
        first_key: plan.first_bound,
        first_page: full.page_id(),
        second_key: plan.second_bound,
        second_page: fresh.page_id(),
    })
}

/// Insert `fresh` after `full` in their sibling ring. Returns the old
/// successor of `full` when its back link still has to point at `fresh`.
pub(crate) fn splice_after<N: NodeMut>(full: &mut N, fresh: &mut N) -> Option<PageId> {
    let next = full.next_page_id();
    fresh.set_next_page_id(next);
    full.set_next_page_id(fresh.page_id());
    fresh.set_previous_page_id(full.page_id());
    if next == full.page_id() {
        full.set_previous_page_id(fresh.page_id());
        None
    } else {
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect2, RectCodec};
    use crate::node::{Node, RTreeLeaf, RTreeNode};
    use crate::page::Page;
    use std::collections::HashSet;

    fn geometry() -> Geometry<Rect2, RectCodec<2>> {
        Geometry::new(RectCodec::new())
    }

    #[test]
    fn test_seeds_are_the_farthest_pair() {
        let g = geometry();
        let keys = vec![
            Rect2::from_xywh(0.0, 0.0, 1.0, 1.0),
            Rect2::from_xywh(0.5, 0.5, 1.0, 1.0),
            Rect2::from_xywh(20.0, 20.0, 1.0, 1.0),
            Rect2::from_xywh(1.0, 0.0, 1.0, 1.0),
        ];
        let plan = plan_split(&g, &keys);
        let first: HashSet<_> = plan.first.iter().copied().collect();
        let second: HashSet<_> = plan.second.iter().copied().collect();
        assert_eq!(first, HashSet::from([0, 1, 3]));
        assert_eq!(second, HashSet::from([2]));
        assert!(plan.first_bound.end(0) >= 2.0);
    }

    #[test]
    fn test_identical_keys_balance() {
        let g = geometry();
        let keys: Vec<_> = (0..6).map(|_| Rect2::from_xywh(1.0, 1.0, 1.0, 1.0)).collect();
        let plan = plan_split(&g, &keys);
        assert!(!plan.first.is_empty());
        assert!(!plan.second.is_empty());
        assert_eq!(plan.first.len() + plan.second.len(), 6);
        assert!((plan.first.len() as i64 - plan.second.len() as i64).abs() <= 1);
    }

    #[test]
    fn test_split_node_keeps_every_entry() -> Result<()> {
        let g = geometry();
        let codec = g.codec();
        let size = 25 + 4 * (16 + 32);
        let mut full_page = Page::new(PageId::new(1), size);
        let mut fresh_page = Page::new(PageId::new(2), size);
        let mut full = RTreeLeaf::new(&mut full_page)?;
        let mut fresh = RTreeLeaf::new(&mut fresh_page)?;
        full.link_to_self();

        let mut ids = HashSet::new();
        for i in 0..4 {
            let r = Rect2::from_xywh(i as f64 * 3.0, 0.0, 1.0, 1.0);
            ids.insert(r.uuid());
            assert!(full.add_key(&r, r.uuid(), codec));
        }
        let extra = Rect2::from_xywh(1.0, 1.0, 1.0, 1.0);
        assert!(!full.add_key(&extra, extra.uuid(), codec));
        ids.insert(extra.uuid());

        let promotion = split_node(&g, &mut full, &mut fresh, &extra, extra.uuid())?;
        assert_eq!(promotion.first_page, PageId::new(1));
        assert_eq!(promotion.second_page, PageId::new(2));
        assert!(full.number_of_keys() >= 1);
        assert!(fresh.number_of_keys() >= 1);
        assert_eq!(full.number_of_keys() + fresh.number_of_keys(), 5);

        let mut seen = HashSet::new();
        for i in 0..full.number_of_keys() {
            assert!(seen.insert(full.entity_uuid(i)));
        }
        for i in 0..fresh.number_of_keys() {
            assert!(seen.insert(fresh.entity_uuid(i)));
        }
        assert_eq!(seen, ids);

        assert_eq!(splice_after(&mut full, &mut fresh), None);
        assert_eq!(full.next_page_id(), PageId::new(2));
        assert_eq!(full.previous_page_id(), PageId::new(2));
        assert_eq!(fresh.next_page_id(), PageId::new(1));
        assert_eq!(fresh.previous_page_id(), PageId::new(1));
        Ok(())
    }
}
