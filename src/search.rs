//! GreedySearch and FilteredGreedySearch (§4.4, §4.5): best-first traversal
//! bounded by a candidate-pool size `L`.

use crate::distance::DistanceCache;
use crate::error::{Result, VamanaError};
use crate::filter::FilterRegistry;
use crate::graph::Graph;
use crate::point::PointStore;
use std::collections::HashSet;

/// Unfiltered greedy search (§4.4).
///
/// Returns `(top_k, visited)`: the `k` closest points in the final
/// candidate pool (ties broken by lowest index), and the full set of points
/// visited along the way.
///
/// `k` may be zero, meaning "return only the visited set" (used by the
/// unfiltered Vamana builder, which only needs `V`).
///
/// # Errors
///
/// Returns [`VamanaError::EmptyGraph`] if the graph has zero nodes. Never
/// fails on unreachable components; it simply returns whatever was
/// reachable from `start`.
pub fn greedy_search(
    graph: &Graph,
    cache: &DistanceCache,
    points: &PointStore,
    start: usize,
    query: &[f32],
    k: usize,
    l: usize,
) -> Result<(Vec<usize>, HashSet<usize>)> {
    filtered_greedy_search(graph, cache, points, &[start], query, k, l, None)
}

/// Filtered greedy search (§4.5).
///
/// `starts` holds one start node per label present in the query filter (or
/// the single global medoid when `filter` is `None`); all starts seed the
/// candidate pool simultaneously. `filter` of `None` means "no filter"
/// (every point eligible); `Some(label)` restricts eligibility to points
/// whose label equals `label`.
///
/// Eligibility gates entry into the candidate pool `C`: an incompatible
/// point is never added to `C`, so it is never selected as the pivot and
/// never recorded in the visited set `V`. This keeps `V` uniformly
/// label-pure, which is what [`crate::prune::filtered_robust_prune`]
/// expects of its provenance set (see `DESIGN.md` for the Open Question
/// this resolves).
///
/// # Errors
///
/// Returns [`VamanaError::EmptyGraph`] if the graph has zero nodes.
pub fn filtered_greedy_search(
    graph: &Graph,
    cache: &DistanceCache,
    points: &PointStore,
    starts: &[usize],
    query: &[f32],
    k: usize,
    l: usize,
    filter: Option<u32>,
) -> Result<(Vec<usize>, HashSet<usize>)> {
    if graph.size() == 0 {
        return Err(VamanaError::EmptyGraph);
    }

    let mut candidates: HashSet<usize> = starts.iter().copied().collect();
    let mut visited: HashSet<usize> = HashSet::new();

    loop {
        let Some(pivot) = closest_unvisited(&candidates, &visited, cache, points, query)? else {
            break;
        };
        visited.insert(pivot);

        for &neighbor in graph.node(pivot)?.neighbors() {
            let eligible = FilterRegistry::is_eligible(points.get(neighbor)?.label, filter);
            if eligible {
                candidates.insert(neighbor);
            }
        }

        if candidates.len() > l {
            candidates = truncate_closest(&candidates, cache, points, query, l)?;
        }
    }

    let top_k = closest_n(&candidates, cache, points, query, k)?;
    Ok((top_k, visited))
}

/// Picks the point in `candidates \ visited` minimizing distance to `query`,
/// ties broken by lowest index.
fn closest_unvisited(
    candidates: &HashSet<usize>,
    visited: &HashSet<usize>,
    cache: &DistanceCache,
    points: &PointStore,
    query: &[f32],
) -> Result<Option<usize>> {
    let mut best: Option<(usize, f32)> = None;
    for &c in candidates.iter().filter(|c| !visited.contains(c)) {
        let d = cache.distance_to_query(points, c, query)?;
        best = Some(match best {
            None => (c, d),
            Some((bi, bd)) => {
                if d < bd || (d == bd && c < bi) {
                    (c, d)
                } else {
                    (bi, bd)
                }
            }
        });
    }
    Ok(best.map(|(i, _)| i))
}

fn ranked(
    set: &HashSet<usize>,
    cache: &DistanceCache,
    points: &PointStore,
    query: &[f32],
) -> Result<Vec<(usize, f32)>> {
    let mut ranked = Vec::with_capacity(set.len());
    for &idx in set {
        ranked.push((idx, cache.distance_to_query(points, idx, query)?));
    }
    ranked.sort_by(|(ia, da), (ib, db)| da.total_cmp(db).then(ia.cmp(ib)));
    Ok(ranked)
}

fn truncate_closest(
    set: &HashSet<usize>,
    cache: &DistanceCache,
    points: &PointStore,
    query: &[f32],
    l: usize,
) -> Result<HashSet<usize>> {
    Ok(ranked(set, cache, points, query)?.into_iter().take(l).map(|(i, _)| i).collect())
}

fn closest_n(
    set: &HashSet<usize>,
    cache: &DistanceCache,
    points: &PointStore,
    query: &[f32],
    n: usize,
) -> Result<Vec<usize>> {
    Ok(ranked(set, cache, points, query)?.into_iter().take(n).map(|(i, _)| i).collect())
}
