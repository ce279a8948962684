//! Spatial hash of grids keyed by their coarsened lower corner.
//!
//! Every grid is stored in exactly one bucket, `coarsen(lo, max_extent)`.
//! Since no grid is longer than `max_extent` on any axis, a grid whose lower
//! corner sits in bucket `b` can only reach into buckets `b` and `b + 1`. A
//! query therefore scans its own coarsened range extended by one bucket
//! below on every axis, and the cost depends on the size of the query rather
//! than on the number of grids.

use std::collections::HashMap;

use crate::catalog::{DomainBounds, GridCatalog};
use crate::types::{GridBox, IntVect};

/// Bucketed lookup from index space to catalog entries.
#[derive(Debug, Clone, Default)]
pub struct SpatialHashIndex {
    ratio: IntVect,
    buckets: HashMap<IntVect, Vec<usize>>,
}

impl SpatialHashIndex {
    /// Build the index for a catalog, bucketing by its max extent.
    pub fn build(catalog: &GridCatalog) -> Self {
        let ratio = catalog.max_extent();
        let mut buckets: HashMap<IntVect, Vec<usize>> = HashMap::new();
        for (i, entry) in catalog.entries().iter().enumerate() {
            buckets.entry(entry.bx.lo.coarsen(ratio)).or_default().push(i);
        }

        tracing::debug!(
            grids = catalog.len(),
            buckets = buckets.len(),
            ratio = %ratio,
            "Built spatial hash index"
        );

        Self { ratio, buckets }
    }

    /// Coarsening ratio (the catalog's max extent).
    pub fn ratio(&self) -> IntVect {
        self.ratio
    }

    /// Bucket key of a lower corner.
    pub fn bucket_of(&self, lo: IntVect) -> IntVect {
        lo.coarsen(self.ratio)
    }

    /// Entries stored in one bucket, in insertion order.
    pub fn bucket(&self, key: &IntVect) -> &[usize] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Catalog indices of every grid that may overlap `query`.
    ///
    /// `query` is in absolute index space. Its corners are clamped into
    /// `bounds` before coarsening. Buckets are visited with axis 2 outermost
    /// and axis 0 innermost; entries within a bucket keep insertion order.
    /// The result can include grids that do not actually overlap; callers
    /// intersect each one.
    pub fn candidates(&self, query: &GridBox, bounds: &DomainBounds) -> Vec<usize> {
        let clo = query.lo.clamp(bounds.lo, bounds.hi).coarsen(self.ratio);
        let chi = query.hi.clamp(bounds.lo, bounds.hi).coarsen(self.ratio);

        let mut out = Vec::new();
        // -1: buckets hold lower corners, so look one bucket further down
        for kk in clo[2].saturating_sub(1)..=chi[2] {
            for jj in clo[1].saturating_sub(1)..=chi[1] {
                for ii in clo[0].saturating_sub(1)..=chi[0] {
                    if let Some(list) = self.buckets.get(&IntVect::new(ii, jj, kk)) {
                        out.extend_from_slice(list);
                    }
                }
            }
        }
        out
    }
}
