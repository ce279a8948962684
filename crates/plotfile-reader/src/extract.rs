//! Subdomain extraction.
//!
//! ```text
//! extract_into(local query, output)
//!      │
//!      ├─► shift to absolute index space, check containment (severe if not)
//!      │
//!      ├─► SpatialHashIndex::candidates
//!      │
//!      └─► for each candidate that intersects the query
//!               │
//!               ├─► FileHandleCache::get(file), seek, FabRecord::read
//!               │
//!               └─► copy intersecting cells into the output view
//! ```

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cache::{FileHandleCache, HandleCacheStats};
use crate::dataset::Dataset;
use crate::error::{PlotfileError, Result};
use crate::fab::FabRecord;
use crate::status::Severity;
use crate::types::{GridBox, IntVect, OutputView, NCOMP};

/// Outcome of a successful (possibly partial) extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractReport {
    /// `NoError`, or `Severe` when the query reached outside the dataset.
    pub severity: Severity,
    /// Human-readable detail for a severe outcome.
    pub message: Option<String>,
    /// The query in absolute index space.
    pub query: GridBox,
    /// Grids returned by the spatial index.
    pub candidates: usize,
    /// Records read and copied from.
    pub grids_read: usize,
    /// Output cells written.
    pub cells_written: usize,
    /// File handle usage.
    pub handles: HandleCacheStats,
}

impl Dataset {
    /// Copy the cells of the local box `query` into `out`.
    ///
    /// `query` is 0-based relative to the lower corner of the dataset
    /// bounds. `out` must hold at least `ncells(query) * 3` values laid out
    /// component fastest, then axis 0, axis 1, axis 2. Cells not covered by
    /// any grid keep their previous value.
    ///
    /// A query reaching outside the bounds still fills the overlapping part
    /// and reports [`Severity::Severe`]. Any record failure aborts with an
    /// error; cells written before the failure stay written.
    #[instrument(skip_all, fields(lo = %query.lo, hi = %query.hi))]
    pub fn extract_into(&self, query: &GridBox, out: &mut [f64]) -> Result<ExtractReport> {
        let result = self.extract_inner(query, out);
        match &result {
            Ok(report) => {
                if report.severity == Severity::Severe {
                    metrics::counter!("plotfile_extract_severe_total").increment(1);
                }
                tracing::debug!(
                    severity = %report.severity,
                    grids_read = report.grids_read,
                    cells_written = report.cells_written,
                    "Extracted subdomain"
                );
            }
            Err(e) => {
                metrics::counter!("plotfile_extract_fatal_total").increment(1);
                tracing::error!(error = %e, "Subdomain extraction failed");
            }
        }
        result
    }

    fn extract_inner(&self, query: &GridBox, out: &mut [f64]) -> Result<ExtractReport> {
        let bounds = self.catalog.bounds();
        let abs = bounds.to_absolute(query)?;

        let mut report = ExtractReport {
            severity: Severity::NoError,
            message: None,
            query: abs,
            candidates: 0,
            grids_read: 0,
            cells_written: 0,
            handles: HandleCacheStats::default(),
        };

        if query.is_empty() {
            return Ok(report);
        }

        let required = query
            .num_cells()
            .and_then(|n| n.checked_mul(NCOMP))
            .ok_or_else(|| PlotfileError::InvalidQuery(format!("query {query} is too large")))?;
        let actual = out.len();
        let mut view = OutputView::new(out, abs)
            .ok_or(PlotfileError::OutputTooSmall { required, actual })?;

        if !bounds.as_box().contains_box(&abs) {
            let avail = bounds.local_box().hi;
            let message = format!(
                "Available data domain: (0:{},0:{},0:{}), ask for data on domain: ({}:{},{}:{},{}:{})",
                avail[0], avail[1], avail[2],
                query.lo[0], query.hi[0], query.lo[1], query.hi[1], query.lo[2], query.hi[2],
            );
            tracing::warn!(%message, "Query not contained in dataset");
            report.severity = Severity::Severe;
            report.message = Some(message);
        }

        let candidates = self.index.candidates(&abs, bounds);
        report.candidates = candidates.len();
        metrics::histogram!("plotfile_extract_candidates").record(candidates.len() as f64);

        let mut handles = FileHandleCache::new(self.config.read_buffer_bytes());
        for i in candidates {
            let entry = self.catalog.get(i).ok_or_else(|| {
                PlotfileError::InvalidQuery(format!("index refers to missing grid {i}"))
            })?;
            let Some(overlap) = entry.bx.intersection(&abs) else {
                continue;
            };

            let reader = handles.get(&entry.file)?;
            let fab = FabRecord::read(reader, entry, self.config.max_fab_header_len)?;
            metrics::counter!("plotfile_records_read_total").increment(1);
            metrics::counter!("plotfile_bytes_read_total").increment(fab.payload_bytes() as u64);
            tracing::debug!(
                grid = i,
                file = %entry.file.display(),
                offset = entry.offset,
                overlap = %overlap,
                "Copying record"
            );

            report.cells_written += copy_overlap(&fab, &overlap, &mut view)?;
            report.grids_read += 1;
        }
        report.handles = handles.stats();

        Ok(report)
    }
}

/// Copy every cell of `overlap` from `fab` into `view`.
fn copy_overlap(fab: &FabRecord, overlap: &GridBox, view: &mut OutputView<'_>) -> Result<usize> {
    let mut copied = 0;
    for k in overlap.lo[2]..=overlap.hi[2] {
        for j in overlap.lo[1]..=overlap.hi[1] {
            for i in overlap.lo[0]..=overlap.hi[0] {
                let cell = IntVect::new(i, j, k);
                let values = fab.cell(cell).ok_or_else(|| {
                    PlotfileError::InvalidQuery(format!("cell {cell} outside record {}", fab.bx()))
                })?;
                if !view.set(cell, values) {
                    return Err(PlotfileError::InvalidQuery(format!(
                        "cell {cell} outside output {}",
                        view.bx()
                    )));
                }
                copied += 1;
            }
        }
    }
    Ok(copied)
}
