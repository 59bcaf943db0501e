//! The base point store (§4.1 — "Point store and distance").
//!
//! Points are immutable once ingested: a stable index, a dense coordinate
//! vector, and (for the filtered variants) an optional categorical label and
//! timestamp. The store owns its points outright; nodes in the graph hold
//! only indices into it, never references, so the graph stays
//! self-contained and trivially serializable (§9, "Ownership of nodes").

use crate::error::{Result, VamanaError};

/// A single base point.
///
/// `label` and `timestamp` are `None` for the unfiltered Vamana variant and
/// `Some` for the filtered/stitched variants — the tagged-variant approach
/// flagged as acceptable in §9 ("Polymorphism over point kinds"), chosen
/// over a generic capability trait because the two call sites that care
/// (the filter registry and the persistence codec) are both small.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Stable index into the owning [`PointStore`]; set once, never mutated.
    pub index: usize,
    /// Dense coordinate vector, uniform dimension across the store.
    pub vector: Vec<f32>,
    /// Categorical label, present for filtered/stitched variants.
    pub label: Option<u32>,
    /// Ingest timestamp, present for filtered/stitched variants.
    pub timestamp: Option<f64>,
}

impl Point {
    /// Builds an unlabeled point (unfiltered Vamana).
    pub fn new(index: usize, vector: Vec<f32>) -> Self {
        Self { index, vector, label: None, timestamp: None }
    }

    /// Builds a labeled, timestamped point (filtered/stitched Vamana).
    pub fn with_label(index: usize, vector: Vec<f32>, label: u32, timestamp: f64) -> Self {
        Self { index, vector, label: Some(label), timestamp: Some(timestamp) }
    }
}

/// Immutable, index-addressable array of base points.
#[derive(Debug, Clone, Default)]
pub struct PointStore {
    points: Vec<Point>,
    dimension: usize,
}

impl PointStore {
    /// Builds a store from points that all share the same dimension.
    ///
    /// # Errors
    ///
    /// Returns [`VamanaError::EmptyInput`] for an empty slice, or
    /// [`VamanaError::DimensionMismatch`] if the points don't all agree on
    /// dimension.
    pub fn new(points: Vec<Point>) -> Result<Self> {
        let first = points
            .first()
            .ok_or_else(|| VamanaError::EmptyInput("point store requires at least one point".into()))?;
        let dimension = first.vector.len();
        for p in &points {
            if p.vector.len() != dimension {
                return Err(VamanaError::DimensionMismatch { expected: dimension, actual: p.vector.len() });
            }
        }
        Ok(Self { points, dimension })
    }

    /// Number of points in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the store holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Dimension shared by every point in the store.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Read-only access to the i-th point.
    ///
    /// # Errors
    ///
    /// Returns [`VamanaError::OutOfRange`] if `i >= self.len()`.
    pub fn get(&self, i: usize) -> Result<&Point> {
        self.points
            .get(i)
            .ok_or(VamanaError::OutOfRange { index: i, len: self.points.len() })
    }

    /// Iterates over all points in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    /// Direct slice access, used by the distance cache and groundtruth engine.
    #[must_use]
    pub fn as_slice(&self) -> &[Point] {
        &self.points
    }
}

/// The kind of query the graph is searched with (§3, Query).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// No filter: every point is eligible.
    Unfiltered,
    /// Single categorical filter: only points whose label equals `v` are eligible.
    SingleLabel(u32),
}

/// A transient query against the index.
#[derive(Debug, Clone)]
pub struct Query {
    /// Dense coordinate vector; must equal the store's dimension.
    pub vector: Vec<f32>,
    /// The query's kind.
    pub kind: QueryKind,
}

impl Query {
    /// Builds an unfiltered query.
    pub fn unfiltered(vector: Vec<f32>) -> Self {
        Self { vector, kind: QueryKind::Unfiltered }
    }

    /// Builds a single-label query.
    pub fn single_label(vector: Vec<f32>, label: u32) -> Self {
        Self { vector, kind: QueryKind::SingleLabel(label) }
    }
}
