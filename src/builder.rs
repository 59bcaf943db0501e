//! The three Vamana construction algorithms (§4.7–§4.9): unfiltered,
//! filtered, and stitched.

use crate::distance::{CachePolicy, DistanceCache};
use crate::error::Result;
use crate::filter::FilterRegistry;
use crate::graph::Graph;
use crate::medoid::{approximate_medoid, filtered_medoid};
use crate::point::PointStore;
use crate::prune::{filtered_robust_prune, robust_prune};
use crate::search::{filtered_greedy_search, greedy_search};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, info};

/// Whether a builder pre-seeds the graph with random edges before the main
/// construction loop (§6, `-connection-mode`). `Filled` is the unfiltered
/// builder's only mode; the filtered builder defaults to `Empty` but accepts
/// either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionMode {
    /// Start every node with an empty adjacency list.
    #[default]
    Empty,
    /// Pre-seed every node with `R` random out-neighbors (§4.7 step 2).
    Filled,
}

/// Shared tuning parameters for a single-pass Vamana build.
#[derive(Debug, Clone, Copy)]
pub struct VamanaParams {
    /// Pruning aggressiveness; `alpha >= 1.0`.
    pub alpha: f32,
    /// Candidate pool size during GreedySearch.
    pub l: usize,
    /// Maximum out-degree.
    pub r: usize,
}

/// No-op progress reporter used where the caller doesn't hand one in; see
/// [`crate::progress::ProgressReporter`] for the CLI-facing implementation.
pub trait BuildObserver {
    /// Called once per point processed by the main construction loop.
    fn on_point_built(&mut self, _done: usize, _total: usize) {}
}

/// An observer that does nothing.
pub struct NullObserver;
impl BuildObserver for NullObserver {}

/// Builds an unfiltered Vamana graph (§4.7) over `points`.
///
/// # Errors
///
/// Propagates any distance, graph, or medoid-selection failure.
pub fn build_unfiltered<R: Rng + ?Sized>(
    points: &PointStore,
    params: VamanaParams,
    connection_mode: ConnectionMode,
    rng: &mut R,
    observer: &mut impl BuildObserver,
) -> Result<(Graph, DistanceCache)> {
    let n = points.len();
    let cache = DistanceCache::build(points, cache_policy_for(n));
    let mut graph = Graph::new(n);

    if connection_mode == ConnectionMode::Filled {
        graph.seed_random_regular(params.r, rng);
    }

    let s = approximate_medoid(points, &cache, 1000, rng)?;
    info!(medoid = s, n, "unfiltered Vamana: medoid selected");

    let mut sigma: Vec<usize> = (0..n).collect();
    sigma.shuffle(rng);

    for (t, &i) in sigma.iter().enumerate() {
        let (_, visited) =
            greedy_search(&graph, &cache, points, s, &points.get(i)?.vector, 1, params.l)?;
        robust_prune(&mut graph, &cache, points, i, &visited, params.alpha, params.r)?;

        let new_neighbors: Vec<usize> = graph.node(i)?.neighbors().to_vec();
        for j in new_neighbors {
            let mut e: HashSet<usize> = graph.node(j)?.neighbors().iter().copied().collect();
            e.insert(i);
            if e.len() > params.r {
                robust_prune(&mut graph, &cache, points, j, &e, params.alpha, params.r)?;
            } else {
                graph.connect(j, i)?;
            }
        }

        observer.on_point_built(t + 1, n);
        if t % 1000 == 0 {
            debug!(processed = t, n, "unfiltered Vamana progress");
        }
    }

    Ok((graph, cache))
}

/// Builds a filtered Vamana graph (§4.8) over `points`, each of which must
/// carry a label.
///
/// # Errors
///
/// Propagates any distance, graph, or medoid-selection failure.
pub fn build_filtered<R: Rng + ?Sized>(
    points: &PointStore,
    params: VamanaParams,
    connection_mode: ConnectionMode,
    rng: &mut R,
    observer: &mut impl BuildObserver,
) -> Result<(Graph, DistanceCache, FilterRegistry)> {
    let n = points.len();
    let cache = DistanceCache::build(points, cache_policy_for(n));
    let registry = FilterRegistry::from_points(points);
    let mut graph = Graph::new(n);

    if connection_mode == ConnectionMode::Filled {
        graph.seed_random_regular(params.r, rng);
    }

    let starts = filtered_medoid(points, &registry, 1000, rng)?;
    info!(labels = registry.label_count(), n, "filtered Vamana: per-label medoids selected");

    let mut sigma: Vec<usize> = (0..n).collect();
    sigma.shuffle(rng);

    for (t, &i) in sigma.iter().enumerate() {
        let point = points.get(i)?;
        let Some(f) = point.label else {
            continue;
        };
        let Some(&start) = starts.get(&f) else {
            continue;
        };

        let (_, visited) = filtered_greedy_search(
            &graph,
            &cache,
            points,
            &[start],
            &point.vector,
            0,
            params.l,
            Some(f),
        )?;
        filtered_robust_prune(&mut graph, &cache, points, i, &visited, params.alpha, params.r)?;

        let new_neighbors: Vec<usize> = graph.node(i)?.neighbors().to_vec();
        for j in new_neighbors {
            graph.connect(j, i)?;
            let adj: HashSet<usize> = graph.node(j)?.neighbors().iter().copied().collect();
            if adj.len() > params.r {
                filtered_robust_prune(&mut graph, &cache, points, j, &adj, params.alpha, params.r)?;
            }
        }

        observer.on_point_built(t + 1, n);
    }

    Ok((graph, cache, registry))
}

/// Builds a stitched Vamana graph (§4.9): one independent unfiltered
/// subgraph per label, merged into a shared top-level graph, then globally
/// pruned with [`filtered_robust_prune`].
///
/// # Errors
///
/// Propagates any distance, graph, or medoid-selection failure.
pub fn build_stitched<R: Rng + ?Sized>(
    points: &PointStore,
    small: VamanaParams,
    r_stitched: usize,
    rng: &mut R,
    observer: &mut impl BuildObserver,
) -> Result<(Graph, DistanceCache, FilterRegistry)> {
    let n = points.len();
    let cache = DistanceCache::build(points, cache_policy_for(n));
    let registry = FilterRegistry::from_points(points);
    let mut graph = Graph::new(n);

    for label in registry.labels() {
        let members = registry.members(label).to_vec();
        if members.is_empty() {
            continue;
        }
        let sub_points = PointStore::new(
            members
                .iter()
                .enumerate()
                .map(|(local_idx, &orig)| {
                    let p = points.get(orig).expect("label registry indices are in range");
                    crate::point::Point { index: local_idx, ..p.clone() }
                })
                .collect(),
        )?;

        // §4.7 step 2 treats the random R-regular seed as an unconditional
        // part of unfiltered construction; each per-label sub-graph here is
        // itself an unfiltered Vamana build, so it gets the same seed rather
        // than starting GreedySearch from the medoid over empty adjacency.
        let (sub_graph, _sub_cache) =
            build_unfiltered(&sub_points, small, ConnectionMode::Filled, rng, &mut NullObserver)?;

        for local_u in 0..sub_graph.size() {
            let orig_u = members[local_u];
            for &local_v in sub_graph.node(local_u)?.neighbors() {
                let orig_v = members[local_v];
                graph.connect(orig_u, orig_v)?;
            }
        }

        debug!(label, members = members.len(), "stitched Vamana: sub-graph merged");
    }

    for i in 0..n {
        let adj: HashSet<usize> = graph.node(i)?.neighbors().iter().copied().collect();
        filtered_robust_prune(&mut graph, &cache, points, i, &adj, small.alpha, r_stitched)?;
        observer.on_point_built(i + 1, n);
    }

    Ok((graph, cache, registry))
}

/// Same memory-budget rule used throughout: a dense cache only below a few
/// tens of thousands of points (§9, "Distance-cache decision").
fn cache_policy_for(n: usize) -> CachePolicy {
    const DENSE_CACHE_LIMIT: usize = 20_000;
    if n <= DENSE_CACHE_LIMIT {
        CachePolicy::Matrix
    } else {
        CachePolicy::None
    }
}
