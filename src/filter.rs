//! Filter registry (§4.3, §3 FilterLabel): the set of categorical labels
//! present in a point store, plus a per-label membership view used by
//! medoid selection and the filtered builders.

use crate::point::PointStore;
use std::collections::BTreeMap;

/// The set of known filter labels, with per-label point membership.
#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
    members: BTreeMap<u32, Vec<usize>>,
}

impl FilterRegistry {
    /// Derives the registry from the labels present in `points` (§3,
    /// "Derived from point labels at build start"). Points with no label
    /// are ignored — they belong to the unfiltered variant.
    #[must_use]
    pub fn from_points(points: &PointStore) -> Self {
        let mut members: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for p in points.iter() {
            if let Some(label) = p.label {
                members.entry(label).or_default().push(p.index);
            }
        }
        Self { members }
    }

    /// The labels known to this registry, in ascending order.
    pub fn labels(&self) -> impl Iterator<Item = u32> + '_ {
        self.members.keys().copied()
    }

    /// Number of distinct labels.
    #[must_use]
    pub fn label_count(&self) -> usize {
        self.members.len()
    }

    /// The point indices carrying a given label, or an empty slice if the
    /// label is unknown.
    #[must_use]
    pub fn members(&self, label: u32) -> &[usize] {
        self.members.get(&label).map_or(&[], Vec::as_slice)
    }

    /// Whether a point is eligible under a query filter: always true for no
    /// filter, label-equality for a single-label filter (§4.5).
    #[must_use]
    pub fn is_eligible(point_label: Option<u32>, query_label: Option<u32>) -> bool {
        match query_label {
            None => true,
            Some(f) => point_label == Some(f),
        }
    }
}
