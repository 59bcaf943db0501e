//! Distance kernel (§4.1) and the optional dense distance cache.
//!
//! Distance is the Euclidean L2 norm of the coordinate-wise difference,
//! accumulated in `f64` and narrowed to `f32` for storage — this only
//! matters for the stability of tie-breaking, not for the public API.

use crate::error::{Result, VamanaError};
use crate::point::PointStore;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Computes the Euclidean distance between two equal-length vectors.
///
/// # Errors
///
/// Returns [`VamanaError::DimensionMismatch`] if `a.len() != b.len()`.
pub fn euclidean(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(VamanaError::DimensionMismatch { expected: a.len(), actual: b.len() });
    }
    Ok(euclidean_unchecked(a, b))
}

/// Same as [`euclidean`] without the length check, for hot loops that have
/// already validated dimension elsewhere (e.g. every distance read inside a
/// build, where the point store guarantees uniform dimension).
#[inline]
#[must_use]
pub fn euclidean_unchecked(a: &[f32], b: &[f32]) -> f32 {
    let mut acc = 0.0_f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let diff = f64::from(*x) - f64::from(*y);
        acc += diff * diff;
    }
    acc.sqrt() as f32
}

/// Policy for whether to precompute pairwise distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Compute every distance on demand.
    None,
    /// Precompute a dense, symmetric, zero-diagonal N×N matrix up front.
    Matrix,
}

/// Optional dense pairwise distance cache over a [`PointStore`] (§4.1).
///
/// Memory budget is `N² * size_of::<f32>()`; callers choose the policy and
/// are responsible for sizing it appropriately (§4.1, §9 "Distance-cache
/// decision" — use only up to a few tens of thousands of points).
pub struct DistanceCache {
    n: usize,
    matrix: Option<Vec<f32>>,
}

impl DistanceCache {
    /// Builds a cache under the given policy for the given point store.
    ///
    /// With [`CachePolicy::Matrix`] and the `parallel` feature enabled, rows
    /// are precomputed across a small worker pool, each worker owning a
    /// contiguous, disjoint range of rows so there is no shared mutable
    /// state to lock (§5, "Shared-resource policy").
    pub fn build(points: &PointStore, policy: CachePolicy) -> Self {
        let n = points.len();
        let matrix = match policy {
            CachePolicy::None => None,
            CachePolicy::Matrix => Some(Self::precompute(points, n)),
        };
        Self { n, matrix }
    }

    #[cfg(not(feature = "parallel"))]
    fn precompute(points: &PointStore, n: usize) -> Vec<f32> {
        let slice = points.as_slice();
        let mut matrix = vec![0.0_f32; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = euclidean_unchecked(&slice[i].vector, &slice[j].vector);
                matrix[i * n + j] = d;
                matrix[j * n + i] = d;
            }
        }
        matrix
    }

    #[cfg(feature = "parallel")]
    fn precompute(points: &PointStore, n: usize) -> Vec<f32> {
        let slice = points.as_slice();
        let mut matrix = vec![0.0_f32; n * n];
        matrix.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
            for j in 0..n {
                row[j] = euclidean_unchecked(&slice[i].vector, &slice[j].vector);
            }
        });
        matrix
    }

    /// Looks up (or computes) the distance between points `i` and `j`.
    ///
    /// # Errors
    ///
    /// Returns [`VamanaError::OutOfRange`] if either index is `>= N`.
    pub fn distance(&self, points: &PointStore, i: usize, j: usize) -> Result<f32> {
        if i >= self.n || j >= self.n {
            return Err(VamanaError::OutOfRange { index: i.max(j), len: self.n });
        }
        if i == j {
            return Ok(0.0);
        }
        if let Some(matrix) = &self.matrix {
            return Ok(matrix[i * self.n + j]);
        }
        euclidean(&points.get(i)?.vector, &points.get(j)?.vector)
    }

    /// Distance between a stored point and a transient query vector.
    ///
    /// Never served from the cache, since query vectors aren't part of the
    /// base set.
    pub fn distance_to_query(&self, points: &PointStore, i: usize, query: &[f32]) -> Result<f32> {
        euclidean(&points.get(i)?.vector, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point;

    #[test]
    fn exact_distance() {
        // E1: A=[1,2,3], B=[4,5,6] -> sqrt(27)
        let d = euclidean(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
        assert!((d - 27.0_f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn dimension_mismatch_is_fatal() {
        let err = euclidean(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0, 4.0]).unwrap_err();
        assert!(matches!(err, VamanaError::DimensionMismatch { expected: 3, actual: 4 }));
    }

    #[test]
    fn cache_matches_on_demand() {
        let points = PointStore::new(vec![
            Point::new(0, vec![0.0, 0.0]),
            Point::new(1, vec![3.0, 4.0]),
            Point::new(2, vec![1.0, 1.0]),
        ])
        .unwrap();
        let none = DistanceCache::build(&points, CachePolicy::None);
        let matrix = DistanceCache::build(&points, CachePolicy::Matrix);
        for i in 0..3 {
            for j in 0..3 {
                let a = none.distance(&points, i, j).unwrap();
                let b = matrix.distance(&points, i, j).unwrap();
                assert!((a - b).abs() < 1e-6);
            }
        }
        assert!((none.distance(&points, 0, 1).unwrap() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn cache_is_symmetric_and_zero_diagonal() {
        let points = PointStore::new(vec![Point::new(0, vec![1.0]), Point::new(1, vec![5.0])]).unwrap();
        let cache = DistanceCache::build(&points, CachePolicy::Matrix);
        assert_eq!(cache.distance(&points, 0, 0).unwrap(), 0.0);
        assert_eq!(cache.distance(&points, 0, 1).unwrap(), cache.distance(&points, 1, 0).unwrap());
    }
}
