//! Medoid finding (§4.3): the unfiltered approximate medoid, and the
//! per-label filtered medoid map used to seed GreedySearch.

use crate::distance::DistanceCache;
use crate::error::Result;
use crate::filter::FilterRegistry;
use crate::point::PointStore;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// Draws a uniform sample of `min(sample_size, points.len())` indices
/// without replacement, and returns the sample member that minimizes the
/// sum of distances to the rest of the sample. Ties broken by lowest index.
///
/// # Errors
///
/// Propagates any distance computation failure.
pub fn approximate_medoid<R: Rng + ?Sized>(
    points: &PointStore,
    cache: &DistanceCache,
    sample_size: usize,
    rng: &mut R,
) -> Result<usize> {
    let all: Vec<usize> = (0..points.len()).collect();
    let sample = sample_without_replacement(&all, sample_size, rng);

    let mut best: Option<(usize, f64)> = None;
    for &candidate in &sample {
        let mut total = 0.0_f64;
        for &other in &sample {
            if other != candidate {
                total += f64::from(cache.distance(points, candidate, other)?);
            }
        }
        best = Some(match best {
            None => (candidate, total),
            Some((best_idx, best_total)) => {
                if total < best_total || (total == best_total && candidate < best_idx) {
                    (candidate, total)
                } else {
                    (best_idx, best_total)
                }
            }
        });
    }
    // PointStore::new guarantees at least one point, so `all` is never empty.
    Ok(best.expect("sample is non-empty for a non-empty point store").0)
}

/// Per-label filtered medoid selection (§4.3).
///
/// For each label `f`, draws a `tau`-sized sample `R_f` (without
/// replacement, truncated when the label has fewer than `tau` members) and
/// picks the sample member minimizing a running load counter `T`, biasing
/// the choice across labels so the same physical point isn't reused as the
/// medoid for every label.
///
/// # Errors
///
/// Propagates any distance computation failure (unused today since the
/// selection rule is purely load-count based, but kept `Result` for
/// symmetry with [`approximate_medoid`] and to leave room for a
/// distance-aware tie-break without changing the signature).
pub fn filtered_medoid<R: Rng + ?Sized>(
    points: &PointStore,
    registry: &FilterRegistry,
    tau: usize,
    rng: &mut R,
) -> Result<HashMap<u32, usize>> {
    let mut load: HashMap<usize, u32> = HashMap::new();
    let mut result = HashMap::new();

    for label in registry.labels() {
        let members = registry.members(label);
        let sample = sample_without_replacement(members, tau, rng);

        let mut best: Option<(usize, u32)> = None;
        for &candidate in &sample {
            let count = *load.get(&candidate).unwrap_or(&0);
            best = Some(match best {
                None => (candidate, count),
                Some((best_idx, best_count)) => {
                    if count < best_count || (count == best_count && candidate < best_idx) {
                        (candidate, count)
                    } else {
                        (best_idx, best_count)
                    }
                }
            });
        }

        if let Some((chosen, count)) = best {
            *load.entry(chosen).or_insert(0) = count + 1;
            result.insert(label, chosen);
        }
    }

    let _ = points; // distance cache reserved for a future distance-aware tie-break
    Ok(result)
}

fn sample_without_replacement<R: Rng + ?Sized>(pool: &[usize], size: usize, rng: &mut R) -> Vec<usize> {
    let n = size.min(pool.len());
    let mut copy = pool.to_vec();
    copy.shuffle(rng);
    copy.truncate(n);
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::CachePolicy;
    use crate::point::Point;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn medoid_of_tight_cluster_is_central() {
        // Point 0 sits at the centroid of the other three.
        let points = PointStore::new(vec![
            Point::new(0, vec![0.0, 0.0]),
            Point::new(1, vec![10.0, 0.0]),
            Point::new(2, vec![-10.0, 0.0]),
            Point::new(3, vec![0.0, 10.0]),
        ])
        .unwrap();
        let cache = DistanceCache::build(&points, CachePolicy::Matrix);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let medoid = approximate_medoid(&points, &cache, 1000, &mut rng).unwrap();
        assert_eq!(medoid, 0);
    }

    #[test]
    fn filtered_medoid_covers_every_label() {
        let points = PointStore::new(vec![
            Point::with_label(0, vec![0.0], 1, 0.0),
            Point::with_label(1, vec![0.0], 1, 0.0),
            Point::with_label(2, vec![0.0], 2, 0.0),
        ])
        .unwrap();
        let registry = FilterRegistry::from_points(&points);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let medoids = filtered_medoid(&points, &registry, 1000, &mut rng).unwrap();
        assert_eq!(medoids.len(), 2);
        assert!(medoids.contains_key(&1));
        assert!(medoids.contains_key(&2));
    }
}
