//! Plane sweep, pinning order and Z-order values.
//!
//! Candidates from both nodes are sorted by their lower bound on axis 0.
//! The sweep repeatedly takes the candidate with the smaller lower bound and
//! scans the other list forward from its cursor while the scanned lower
//! bound does not pass the taken candidate's upper bound, checking the
//! remaining axes for each one scanned.

use crate::geometry::{Geometry, KeyCodec, SpatialKey};

/// A node entry taking part in a sweep
#[derive(Debug, Clone)]
pub(crate) struct Candidate<K> {
    pub key: K,
    /// Slot of the entry in its node
    pub slot: usize,
}

/// Two overlapping candidates, by position in the sorted lists
#[derive(Debug, Clone)]
pub(crate) struct SweepMatch<K> {
    pub first: usize,
    pub second: usize,
    pub intersection: K,
}

pub(crate) fn sort_by_lower_bound<K: SpatialKey>(candidates: &mut [Candidate<K>]) {
    candidates.sort_by(|a, b| a.key.origin(0).total_cmp(&b.key.origin(0)));
}

/// Every overlapping pair between two sorted candidate lists
pub(crate) fn plane_sweep<K: SpatialKey, C: KeyCodec<K>>(
    geometry: &Geometry<K, C>,
    first: &[Candidate<K>],
    second: &[Candidate<K>],
) -> Vec<SweepMatch<K>> {
    let mut matches = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < first.len() && j < second.len() {
        if first[i].key.origin(0) <= second[j].key.origin(0) {
            for k in scan(geometry, &first[i].key, second, j) {
                matches.push(SweepMatch {
                    first: i,
                    second: k,
                    intersection: geometry.intersection(&first[i].key, &second[k].key),
                });
            }
            i += 1;
        } else {
            for k in scan(geometry, &second[j].key, first, i) {
                matches.push(SweepMatch {
                    first: k,
                    second: j,
                    intersection: geometry.intersection(&first[k].key, &second[j].key),
                });
            }
            j += 1;
        }
    }
    matches
}

/// Positions from `start` in `others` overlapping `pivot`
fn scan<K: SpatialKey, C: KeyCodec<K>>(
    geometry: &Geometry<K, C>,
    pivot: &K,
    others: &[Candidate<K>],
    start: usize,
) -> Vec<usize> {
    let end = pivot.end(0);
    let mut hits = Vec::new();
    for (k, other) in others.iter().enumerate().skip(start) {
        if other.key.origin(0) > end {
            break;
        }
        geometry.count();
        let overlaps = (1..pivot.dimensions()).all(|axis| {
            pivot.origin(axis) <= other.key.end(axis) && pivot.end(axis) >= other.key.origin(axis)
        });
        if overlaps {
            hits.push(k);
        }
    }
    hits
}

/// Processing order that batches matches sharing an entry.
///
/// Each unvisited match pins the side whose entry appears more often among
/// the later matches (the first side on a tie) and pulls every unvisited
/// later match sharing that entry in right behind it.
pub(crate) fn pinning_order<K>(matches: &[SweepMatch<K>]) -> Vec<usize> {
    let n = matches.len();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    for i in 0..n {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        order.push(i);

        let later = &matches[i + 1..];
        let first_degree = later.iter().filter(|m| m.first == matches[i].first).count();
        let second_degree = later.iter().filter(|m| m.second == matches[i].second).count();
        let pin_first = first_degree >= second_degree;

        for j in i + 1..n {
            let shared = if pin_first {
                matches[j].first == matches[i].first
            } else {
                matches[j].second == matches[i].second
            };
            if !visited[j] && shared {
                visited[j] = true;
                order.push(j);
            }
        }
    }
    order
}

/// Z-order value of a key's center: bits of the truncated absolute center
/// coordinates interleaved across axes, axis 0 in the lowest bit.
pub fn z_order<K: SpatialKey>(key: &K) -> u64 {
    let dims = key.dimensions().max(1);
    let mut z = 0u64;
    let mut source_bit = 0u32;
    for bit in 0..64u32 {
        let axis = bit as usize % dims;
        let coordinate = (((key.origin(axis) * 2.0).abs() + key.extension(axis)) / 2.0) as i64 as u64;
        z |= (coordinate & (1u64 << source_bit)) << (bit - source_bit);
        if (bit as usize + 1) % dims == 0 {
            source_bit += 1;
        }
    }
    z
}
