//! RobustPrune and FilteredRobustPrune (§4.6): the alpha-pruning rule that
//! keeps out-degree bounded by `R` while preserving long-range edges.

use crate::distance::DistanceCache;
use crate::error::Result;
use crate::graph::Graph;
use crate::point::PointStore;
use std::collections::HashSet;

/// Unfiltered RobustPrune.
///
/// Rewrites `p`'s out-neighbor list in place from the union of its current
/// neighbors and `candidates`, keeping at most `r` edges and preferring the
/// closest unpruned candidate at each step. A candidate `p'` is pruned once
/// some already-kept point `p*` makes it redundant: `alpha * d(p*, p') <=
/// d(p, p')`.
///
/// # Errors
///
/// Propagates graph/distance lookup failures (out-of-range indices).
pub fn robust_prune(
    graph: &mut Graph,
    cache: &DistanceCache,
    points: &PointStore,
    p: usize,
    candidates: &HashSet<usize>,
    alpha: f32,
    r: usize,
) -> Result<()> {
    prune_with(graph, cache, points, p, candidates, alpha, r, |_, _, _| Ok(true))
}

/// Filtered RobustPrune.
///
/// Same elimination loop as [`robust_prune`], but the gate on step 2c is
/// label-aware: a candidate `q` sharing `p`'s label is only eliminated by a
/// kept point `p*` that also carries that label; a `q` with a different
/// label from `p` is eliminated unconditionally on the distance test. This
/// keeps a label's internal connectivity from being pruned away by an
/// unrelated direction while still letting cross-label edges compete freely.
///
/// # Errors
///
/// Propagates graph/distance lookup failures (out-of-range indices).
pub fn filtered_robust_prune(
    graph: &mut Graph,
    cache: &DistanceCache,
    points: &PointStore,
    p: usize,
    candidates: &HashSet<usize>,
    alpha: f32,
    r: usize,
) -> Result<()> {
    prune_with(graph, cache, points, p, candidates, alpha, r, |points, pivot, candidate| {
        let p_label = points.get(p)?.label;
        let q_label = points.get(candidate)?.label;
        if q_label == p_label {
            Ok(points.get(pivot)?.label == p_label)
        } else {
            Ok(true)
        }
    })
}

fn prune_with(
    graph: &mut Graph,
    cache: &DistanceCache,
    points: &PointStore,
    p: usize,
    candidates: &HashSet<usize>,
    alpha: f32,
    r: usize,
    label_gate: impl Fn(&PointStore, usize, usize) -> Result<bool>,
) -> Result<()> {
    let mut pool: Vec<usize> = candidates
        .iter()
        .copied()
        .chain(graph.node(p)?.neighbors().iter().copied())
        .filter(|&c| c != p)
        .collect();
    pool.sort_unstable();
    pool.dedup();

    let mut kept = Vec::with_capacity(r);

    while !pool.is_empty() {
        let pivot = closest_to(cache, points, p, &pool)?;
        kept.push(pivot);
        if kept.len() == r {
            break;
        }

        let mut survivors = Vec::with_capacity(pool.len());
        for candidate in pool {
            if candidate == pivot {
                continue;
            }
            let d_pivot = cache.distance(points, pivot, candidate)?;
            let d_p = cache.distance(points, p, candidate)?;
            let eliminated = alpha * d_pivot <= d_p && label_gate(points, pivot, candidate)?;
            if !eliminated {
                survivors.push(candidate);
            }
        }
        pool = survivors;
    }

    graph.replace_neighbors(p, kept)
}

/// Finds the point in `pool` closest to `p`, ties broken by lowest index.
fn closest_to(cache: &DistanceCache, points: &PointStore, p: usize, pool: &[usize]) -> Result<usize> {
    let mut best: Option<(usize, f32)> = None;
    for &candidate in pool {
        let d = cache.distance(points, p, candidate)?;
        best = Some(match best {
            None => (candidate, d),
            Some((bi, bd)) => {
                if d < bd || (d == bd && candidate < bi) {
                    (candidate, d)
                } else {
                    (bi, bd)
                }
            }
        });
    }
    // Callers only invoke this with a non-empty pool.
    Ok(best.expect("closest_to called with an empty pool").0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::CachePolicy;
    use crate::point::Point;

    fn store(coords: &[f32]) -> PointStore {
        PointStore::new(coords.iter().enumerate().map(|(i, &c)| Point::new(i, vec![c])).collect()).unwrap()
    }

    #[test]
    fn degree_bound_is_respected() {
        let points = store(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let cache = DistanceCache::build(&points, CachePolicy::Matrix);
        let mut graph = Graph::new(5);
        let candidates: HashSet<usize> = (1..5).collect();
        robust_prune(&mut graph, &cache, &points, 0, &candidates, 1.2, 2).unwrap();
        assert_eq!(graph.node(0).unwrap().neighbors().len(), 2);
    }

    #[test]
    fn e3_robust_prune_is_idempotent() {
        // p=[0,0], V = {[1,0],[2,0],[1.5,0],[0,1]}, alpha=1.2, R=2
        let points = PointStore::new(vec![
            Point::new(0, vec![0.0, 0.0]),
            Point::new(1, vec![1.0, 0.0]),
            Point::new(2, vec![2.0, 0.0]),
            Point::new(3, vec![1.5, 0.0]),
            Point::new(4, vec![0.0, 1.0]),
        ])
        .unwrap();
        let cache = DistanceCache::build(&points, CachePolicy::Matrix);
        let mut graph = Graph::new(5);
        let candidates: HashSet<usize> = [1, 2, 3, 4].into_iter().collect();

        robust_prune(&mut graph, &cache, &points, 0, &candidates, 1.2, 2).unwrap();
        let first_pass = graph.node(0).unwrap().neighbors().to_vec();
        assert_eq!(first_pass, vec![1, 4]);

        robust_prune(&mut graph, &cache, &points, 0, &candidates, 1.2, 2).unwrap();
        let second_pass = graph.node(0).unwrap().neighbors().to_vec();
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn filtered_prune_unconditionally_eliminates_cross_label_q() {
        // p (label 1) vs candidates 1 (label 1) and 2 (label 2), coincident.
        // Candidate 2 has a different label from p, so it is eliminated
        // unconditionally once the distance test fires, regardless of the
        // pivot's label.
        let points = PointStore::new(vec![
            Point::with_label(0, vec![0.0], 1, 0.0),
            Point::with_label(1, vec![1.0], 1, 0.0),
            Point::with_label(2, vec![1.0], 2, 0.0),
        ])
        .unwrap();
        let cache = DistanceCache::build(&points, CachePolicy::Matrix);
        let mut graph = Graph::new(3);
        let candidates: HashSet<usize> = [1, 2].into_iter().collect();
        filtered_robust_prune(&mut graph, &cache, &points, 0, &candidates, 1.0, 2).unwrap();
        let neighbors = graph.node(0).unwrap().neighbors();
        assert_eq!(neighbors, &[1]);
    }

    #[test]
    fn filtered_prune_preserves_same_label_edge_when_pivot_differs() {
        // p (label 1), candidate q=2 shares p's label; pivot kept first is
        // point 1 with label 2, so the same-label gate blocks elimination
        // and q survives even though it's dominated on distance alone.
        let points = PointStore::new(vec![
            Point::with_label(0, vec![0.0], 1, 0.0),
            Point::with_label(1, vec![1.0], 2, 0.0),
            Point::with_label(2, vec![1.0], 1, 0.0),
        ])
        .unwrap();
        let cache = DistanceCache::build(&points, CachePolicy::Matrix);
        let mut graph = Graph::new(3);
        let candidates: HashSet<usize> = [1, 2].into_iter().collect();
        filtered_robust_prune(&mut graph, &cache, &points, 0, &candidates, 1.0, 2).unwrap();
        let neighbors = graph.node(0).unwrap().neighbors();
        assert!(neighbors.contains(&2));
    }
}
