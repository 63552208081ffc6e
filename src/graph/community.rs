//! Greedy modularity community detection
//!
//! Clauset-Newman-Moore agglomeration: every node starts in its own
//! community and the pair of connected communities with the largest modularity
//! gain is merged until no merge increases modularity.

use std::collections::{BTreeMap, BTreeSet};

/// Partitions an undirected graph into communities
///
/// `edges` may contain both directions and duplicates; they are merged, and
/// self-loops are ignored. Communities are returned largest first (ties broken
/// by their smallest member), each with ascending member indices. Nodes
/// without edges form singleton communities.
pub fn greedy_modularity_communities(
    node_count: usize,
    edges: &[(usize, usize)],
) -> Vec<Vec<usize>> {
    let undirected: BTreeSet<(usize, usize)> = edges
        .iter()
        .filter(|(a, b)| a != b && *a < node_count && *b < node_count)
        .map(|&(a, b)| (a.min(b), a.max(b)))
        .collect();

    let mut members: Vec<Option<Vec<usize>>> = (0..node_count).map(|n| Some(vec![n])).collect();

    if !undirected.is_empty() {
        merge_greedily(node_count, &undirected, &mut members);
    }

    let mut communities: Vec<Vec<usize>> = members.into_iter().flatten().collect();
    for community in &mut communities {
        community.sort_unstable();
    }
    communities.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));
    communities
}

/// Community label per node, labels numbered from 0 in community order
pub fn community_labels(node_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut labels = vec![0; node_count];
    for (label, community) in greedy_modularity_communities(node_count, edges)
        .into_iter()
        .enumerate()
    {
        for node in community {
            labels[node] = label;
        }
    }
    labels
}

fn merge_greedily(
    node_count: usize,
    edges: &BTreeSet<(usize, usize)>,
    members: &mut [Option<Vec<usize>>],
) {
    let m = edges.len() as f64;

    let mut degree = vec![0usize; node_count];
    for &(a, b) in edges {
        degree[a] += 1;
        degree[b] += 1;
    }

    // a[i]: fraction of edge ends attached to community i
    let mut a: Vec<f64> = degree.iter().map(|&k| k as f64 / (2.0 * m)).collect();

    // dq[i][j]: modularity change from merging communities i and j
    let mut dq: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); node_count];
    for &(i, j) in edges {
        let gain = 1.0 / m - 2.0 * a[i] * a[j];
        dq[i].insert(j, gain);
        dq[j].insert(i, gain);
    }

    loop {
        let mut best: Option<(f64, usize, usize)> = None;
        for (i, row) in dq.iter().enumerate() {
            for (&j, &gain) in row.range(i + 1..) {
                if best.map_or(true, |(top, _, _)| gain > top) {
                    best = Some((gain, i, j));
                }
            }
        }

        let Some((gain, keep, absorbed)) = best else {
            break;
        };
        if gain <= 0.0 {
            break;
        }

        let row_keep = std::mem::take(&mut dq[keep]);
        let row_absorbed = std::mem::take(&mut dq[absorbed]);
        let neighbours: BTreeSet<usize> = row_keep
            .keys()
            .chain(row_absorbed.keys())
            .copied()
            .filter(|&k| k != keep && k != absorbed)
            .collect();

        let mut merged_row = BTreeMap::new();
        for k in neighbours {
            let updated = match (row_keep.get(&k), row_absorbed.get(&k)) {
                (Some(x), Some(y)) => x + y,
                (Some(x), None) => x - 2.0 * a[absorbed] * a[k],
                (None, Some(y)) => y - 2.0 * a[keep] * a[k],
                (None, None) => continue,
            };
            merged_row.insert(k, updated);
            dq[k].remove(&absorbed);
            dq[k].insert(keep, updated);
        }
        dq[keep] = merged_row;

        a[keep] += a[absorbed];
        a[absorbed] = 0.0;

        if let Some(moved) = members[absorbed].take() {
            if let Some(target) = members[keep].as_mut() {
                target.extend(moved);
            }
        }
    }
}
