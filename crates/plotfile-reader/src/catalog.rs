//! The grid catalog: every level-0 grid with the location of its record.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PlotfileError, Result};
use crate::types::{GridBox, IntVect, SPACEDIM};

/// One grid and where its FAB record lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridEntry {
    /// Cell box of the grid in domain-index space.
    pub bx: GridBox,
    /// Data file holding the record.
    pub file: PathBuf,
    /// Byte offset of the record's `FAB` magic in `file`.
    pub offset: u64,
}

/// Tight bounding box of all grids in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainBounds {
    pub lo: IntVect,
    pub hi: IntVect,
}

impl DomainBounds {
    /// The bounds as a box.
    pub fn as_box(&self) -> GridBox {
        GridBox::new(self.lo, self.hi)
    }

    /// Number of cells per axis.
    ///
    /// Saturates at `i32::MAX`; [`GridCatalog::new`] rejects wider bounds.
    pub fn dims(&self) -> [i32; SPACEDIM] {
        self.as_box()
            .size()
            .map(|n| i32::try_from(n).unwrap_or(i32::MAX))
    }

    /// Shift a 0-based local box to absolute index space.
    pub fn to_absolute(&self, local: &GridBox) -> Result<GridBox> {
        let shift = |v: IntVect| -> Result<IntVect> {
            let mut out = IntVect::default();
            for d in 0..SPACEDIM {
                out[d] = v[d].checked_add(self.lo[d]).ok_or_else(|| {
                    PlotfileError::InvalidQuery(format!("query {local} overflows index space"))
                })?;
            }
            Ok(out)
        };
        Ok(GridBox {
            lo: shift(local.lo)?,
            hi: shift(local.hi)?,
        })
    }

    /// The bounds expressed in local coordinates, `(0,0,0)..=(dims-1)`.
    pub fn local_box(&self) -> GridBox {
        let dims = self.dims();
        GridBox::new(IntVect::splat(0), dims.map(|n| n - 1))
    }
}

/// Authoritative list of grids plus derived bounds and max extent.
///
/// Immutable once built; a new load builds a new catalog.
#[derive(Debug, Clone)]
pub struct GridCatalog {
    entries: Vec<GridEntry>,
    bounds: DomainBounds,
    max_extent: IntVect,
}

impl GridCatalog {
    /// Build a catalog, deriving domain bounds and per-axis max extent.
    pub fn new(entries: Vec<GridEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(PlotfileError::EmptyCatalog);
        }

        let mut lo = IntVect::splat(i32::MAX);
        let mut hi = IntVect::splat(i32::MIN);
        let mut max_extent = IntVect::splat(1);

        for entry in &entries {
            if entry.bx.is_empty() {
                return Err(PlotfileError::unsupported(format!(
                    "grid box {} is inverted",
                    entry.bx
                )));
            }
            let extent = entry.bx.extent().ok_or_else(|| {
                PlotfileError::unsupported(format!("grid box {} is too wide", entry.bx))
            })?;
            lo = lo.min(entry.bx.lo);
            hi = hi.max(entry.bx.hi);
            max_extent = max_extent.max(extent);
        }

        let bounds = DomainBounds { lo, hi };
        if bounds.as_box().extent().is_none() {
            return Err(PlotfileError::unsupported(format!(
                "grids span {}, wider than the index space",
                bounds.as_box()
            )));
        }

        Ok(Self {
            entries,
            bounds,
            max_extent,
        })
    }

    pub fn entries(&self) -> &[GridEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&GridEntry> {
        self.entries.get(index)
    }

    pub fn bounds(&self) -> &DomainBounds {
        &self.bounds
    }

    /// Largest grid size along each axis, at least 1.
    pub fn max_extent(&self) -> IntVect {
        self.max_extent
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
