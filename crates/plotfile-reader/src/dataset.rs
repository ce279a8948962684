//! A loaded plotfile: metadata, grid catalog and spatial index.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::catalog::{DomainBounds, GridCatalog, GridEntry};
use crate::config::ReaderConfig;
use crate::error::{PlotfileError, Result};
use crate::header::{header_paths, CellHeader, PlotfileHeader};
use crate::index::SpatialHashIndex;
use crate::types::{GridBox, SPACEDIM};

/// Description of a loaded dataset, as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Plotfile directory.
    pub path: PathBuf,
    /// Header format version.
    pub version: String,
    /// Variable names of the three components.
    pub variables: Vec<String>,
    /// Physical time.
    pub time: f64,
    /// Physical problem domain corners.
    pub prob_lo: [f64; SPACEDIM],
    pub prob_hi: [f64; SPACEDIM],
    /// Cell spacing.
    pub cell_size: [f64; SPACEDIM],
    /// Problem domain box from the header.
    pub problem_domain: GridBox,
    /// Level step count.
    pub level_steps: i64,
    /// Tight bounding box of all grids.
    pub bounds: DomainBounds,
    /// Cells per axis of `bounds`.
    pub dims: [i32; SPACEDIM],
    /// Physical coordinate of the lower face of `bounds`.
    pub origin: [f64; SPACEDIM],
    /// Number of grids.
    pub num_grids: usize,
}

/// Everything one load produces. Immutable; replaced wholesale by the next
/// load.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub(crate) metadata: DatasetMetadata,
    pub(crate) catalog: GridCatalog,
    pub(crate) index: SpatialHashIndex,
    pub(crate) config: ReaderConfig,
}

impl Dataset {
    /// Read the headers of the plotfile at `dir` and build the catalog and
    /// index.
    ///
    /// Nothing is returned unless every step succeeds.
    #[instrument(skip_all, fields(path = %dir.display()))]
    pub fn open(dir: &Path, config: &ReaderConfig) -> Result<Self> {
        config.validate().map_err(PlotfileError::Config)?;

        let (header_path, cell_header_path) = header_paths(dir, config);
        let header = PlotfileHeader::read(&header_path)?;
        let cells = CellHeader::read(&cell_header_path)?;

        let level_dir = dir.join(&config.level_dir);
        let entries = cells
            .boxes
            .iter()
            .zip(&cells.fabs)
            .map(|(bx, fod)| GridEntry {
                bx: *bx,
                file: level_dir.join(&fod.file),
                offset: fod.offset,
            })
            .collect();

        let catalog = GridCatalog::new(entries)?;
        let index = SpatialHashIndex::build(&catalog);
        let bounds = *catalog.bounds();

        let origin = std::array::from_fn(|d| {
            header.prob_lo[d] + f64::from(bounds.lo[d]) * header.cell_size[d]
        });

        let metadata = DatasetMetadata {
            path: dir.to_path_buf(),
            version: header.version,
            variables: header.variables,
            time: header.time,
            prob_lo: header.prob_lo,
            prob_hi: header.prob_hi,
            cell_size: header.cell_size,
            problem_domain: header.problem_domain,
            level_steps: header.level_steps,
            bounds,
            dims: bounds.dims(),
            origin,
            num_grids: catalog.len(),
        };

        tracing::info!(
            grids = metadata.num_grids,
            dims = ?metadata.dims,
            buckets = index.num_buckets(),
            "Loaded plotfile"
        );

        Ok(Self {
            metadata,
            catalog,
            index,
            config: config.clone(),
        })
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    pub fn catalog(&self) -> &GridCatalog {
        &self.catalog
    }

    pub fn index(&self) -> &SpatialHashIndex {
        &self.index
    }
}
