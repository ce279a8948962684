//! Random-access reader for single-level AMReX plotfiles.
//!
//! Loads the two text headers of a plotfile, indexes every grid with a
//! coarse spatial hash, and copies arbitrary box-shaped subdomains of the
//! three-component cell data into a caller buffer. Only the grids that
//! intersect a query are read from disk.
//!
//! # Architecture
//!
//! ```text
//! ReaderContext::load(plotfile dir)
//!      │
//!      ├─► PlotfileHeader (Header) + CellHeader (Level_0/Cell_H)
//!      │
//!      ├─► GridCatalog: boxes, data files, offsets, bounds
//!      │
//!      └─► SpatialHashIndex: bucket = lo coarsened by max grid extent
//!
//! ReaderContext::extract(lo, hi, out)
//!      │
//!      ├─► Candidate grids from the index
//!      │
//!      ├─► FileHandleCache: one open handle per data file
//!      │
//!      ├─► FabRecord::read: seek, validate header, read payload
//!      │
//!      └─► Copy intersection into out (component fastest, then i, j, k)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use plotfile_reader::{IntVect, ReaderContext, Severity};
//!
//! let mut ctx = ReaderContext::new();
//! ctx.configure_status_codes(0, 1, -1);
//! let dims = ctx.load("plt00100")?.dims;
//!
//! let hi = IntVect::new(dims[0] - 1, dims[1] - 1, 0);
//! let mut slab = vec![0.0; (dims[0] * dims[1]) as usize * 3];
//! let report = ctx.extract(IntVect::splat(0), hi, &mut slab)?;
//! assert_eq!(report.severity, Severity::NoError);
//! ```
//!
//! C callers use the same operations through the `amrex_*` functions in
//! [`ffi`].

pub mod cache;
pub mod catalog;
pub mod config;
pub mod context;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod fab;
pub mod ffi;
pub mod header;
pub mod index;
pub mod status;
pub mod types;

// Re-export commonly used types at crate root
pub use cache::{FileHandleCache, HandleCacheStats};
pub use catalog::{DomainBounds, GridCatalog, GridEntry};
pub use config::ReaderConfig;
pub use context::{ReaderContext, ReaderState};
pub use dataset::{Dataset, DatasetMetadata};
pub use error::{PlotfileError, Result};
pub use extract::ExtractReport;
pub use fab::FabRecord;
pub use header::{CellHeader, FabOnDisk, PlotfileHeader};
pub use index::SpatialHashIndex;
pub use status::{Severity, StatusCodes, UNCONFIGURED_STATUS};
pub use types::{GridBox, IntVect, OutputView, NCOMP, SPACEDIM};
