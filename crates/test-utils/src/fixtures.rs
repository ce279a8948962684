//! Synthetic AMReX plotfiles written into temporary directories.
//!
//! A [`PlotfileBuilder`] lays out the same files AMReX produces for a
//! single-level, 3-component plotfile:
//!
//! ```text
//! plt00000/
//!   Header
//!   Level_0/
//!     Cell_H
//!     Cell_D_00000
//!     Cell_D_00001
//! ```
//!
//! Record payloads come from [`fab_payload`](crate::fab_payload), so every
//! extracted value can be checked with [`sentinel`](crate::sentinel).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::generators::fab_payload;

/// Real-number descriptor AMReX writes for native little-endian doubles.
pub const REAL_DESCRIPTOR: &str = "((8, (64 11 52 0 1 12 0 1023)),(8, (8 7 6 5 4 3 2 1)))";

/// Damage applied to one grid's record on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corruption {
    /// Record starts with `XAB` instead of `FAB`.
    BadMagic,
    /// Record header names a box one cell wider on axis 0 than the catalog.
    WrongBox,
    /// Record header says 1 component.
    WrongComponents,
    /// Only half of the payload is written. Place the grid last in its file.
    Truncated,
}

#[derive(Debug, Clone)]
struct FixtureGrid {
    lo: [i32; 3],
    hi: [i32; 3],
    file: usize,
    corruption: Option<Corruption>,
}

/// Builder for a synthetic plotfile.
///
/// # Example
///
/// ```
/// use test_utils::PlotfileBuilder;
///
/// let plot = PlotfileBuilder::new()
///     .grid([0, 0, 0], [7, 7, 7])
///     .grid([8, 0, 0], [15, 7, 7])
///     .build()
///     .unwrap();
/// assert!(plot.path().join("Level_0/Cell_H").exists());
/// ```
#[derive(Debug, Clone)]
pub struct PlotfileBuilder {
    grids: Vec<FixtureGrid>,
    variables: Vec<String>,
    time: f64,
    prob_lo: [f64; 3],
    cell_size: [f64; 3],
    level_steps: i64,
    header_components: usize,
    finest_level: i32,
    missing_fab_entries: usize,
}

impl Default for PlotfileBuilder {
    fn default() -> Self {
        Self {
            grids: Vec::new(),
            variables: vec!["Ex".into(), "Ey".into(), "Ez".into()],
            time: 0.5,
            prob_lo: [0.0; 3],
            cell_size: [1.0; 3],
            level_steps: 10,
            header_components: 3,
            finest_level: 0,
            missing_fab_entries: 0,
        }
    }
}

impl PlotfileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a grid stored in `Cell_D_00000`.
    pub fn grid(self, lo: [i32; 3], hi: [i32; 3]) -> Self {
        self.grid_in_file(lo, hi, 0)
    }

    /// Add a grid stored in `Cell_D_<file>`.
    pub fn grid_in_file(mut self, lo: [i32; 3], hi: [i32; 3], file: usize) -> Self {
        self.grids.push(FixtureGrid {
            lo,
            hi,
            file,
            corruption: None,
        });
        self
    }

    /// Damage the record of the grid added `index`-th.
    pub fn corrupt(mut self, index: usize, corruption: Corruption) -> Self {
        if let Some(g) = self.grids.get_mut(index) {
            g.corruption = Some(corruption);
        }
        self
    }

    pub fn time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    pub fn prob_lo(mut self, prob_lo: [f64; 3]) -> Self {
        self.prob_lo = prob_lo;
        self
    }

    pub fn cell_size(mut self, cell_size: [f64; 3]) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Component count written to `Header` (variable names are padded or cut).
    pub fn header_components(mut self, n: usize) -> Self {
        self.header_components = n;
        self
    }

    pub fn finest_level(mut self, level: i32) -> Self {
        self.finest_level = level;
        self
    }

    /// Leave the last `n` FabOnDisk lines out of `Cell_H`.
    pub fn missing_fab_entries(mut self, n: usize) -> Self {
        self.missing_fab_entries = n;
        self
    }

    /// Write the plotfile into a fresh temporary directory.
    pub fn build(&self) -> io::Result<Plotfile> {
        let tmp = tempfile::Builder::new().prefix("plotfile_test_").tempdir()?;
        let path = tmp.path().join("plt00000");
        self.write_to(&path)?;
        Ok(Plotfile { _tmp: tmp, path })
    }

    /// Write the plotfile into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> io::Result<()> {
        let level_dir = dir.join("Level_0");
        fs::create_dir_all(&level_dir)?;

        let mut files: Vec<Vec<u8>> = Vec::new();
        let mut locations = Vec::with_capacity(self.grids.len());
        for g in &self.grids {
            if files.len() <= g.file {
                files.resize(g.file + 1, Vec::new());
            }
            let buf = &mut files[g.file];
            locations.push((data_file_name(g.file), buf.len()));
            write_record(buf, g);
        }
        for (i, bytes) in files.iter().enumerate() {
            fs::write(level_dir.join(data_file_name(i)), bytes)?;
        }

        fs::write(dir.join("Header"), self.header_text())?;
        fs::write(level_dir.join("Cell_H"), self.cell_header_text(&locations))?;
        Ok(())
    }

    fn domain(&self) -> ([i32; 3], [i32; 3]) {
        let mut lo = [i32::MAX; 3];
        let mut hi = [i32::MIN; 3];
        for g in &self.grids {
            for d in 0..3 {
                lo[d] = lo[d].min(g.lo[d]);
                hi[d] = hi[d].max(g.hi[d]);
            }
        }
        if self.grids.is_empty() {
            ([0; 3], [0; 3])
        } else {
            (lo, hi)
        }
    }

    fn header_text(&self) -> String {
        let (lo, hi) = self.domain();
        let prob_hi: Vec<f64> = (0..3)
            .map(|d| self.prob_lo[d] + f64::from(hi[d] + 1) * self.cell_size[d])
            .collect();
        let [plo_x, plo_y, plo_z] = self.prob_lo;
        let [dx, dy, dz] = self.cell_size;

        let mut lines = vec![
            "HyperCLaw-V1.1".to_string(),
            self.header_components.to_string(),
        ];
        lines.extend((0..self.header_components).map(|i| {
            self.variables
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("var{i}"))
        }));
        lines.extend([
            "3".to_string(),
            self.time.to_string(),
            self.finest_level.to_string(),
            format!("{plo_x} {plo_y} {plo_z}"),
            format!("{} {} {}", prob_hi[0], prob_hi[1], prob_hi[2]),
            String::new(),
            box_text(lo, hi),
            self.level_steps.to_string(),
            format!("{dx} {dy} {dz}"),
            "0".to_string(),
            "0".to_string(),
            format!("0 {} {}", self.grids.len(), self.time),
            self.level_steps.to_string(),
        ]);
        for g in &self.grids {
            for d in 0..3 {
                let plo = self.prob_lo[d] + f64::from(g.lo[d]) * self.cell_size[d];
                let phi = self.prob_lo[d] + f64::from(g.hi[d] + 1) * self.cell_size[d];
                lines.push(format!("{plo} {phi}"));
            }
        }
        lines.push("Level_0/Cell".to_string());
        lines.join("\n") + "\n"
    }

    fn cell_header_text(&self, locations: &[(String, usize)]) -> String {
        let listed = locations.len().saturating_sub(self.missing_fab_entries);

        let mut lines = vec![
            "1\n0\n3\n0".to_string(),
            format!("({} 0", self.grids.len()),
        ];
        lines.extend(self.grids.iter().map(|g| box_text(g.lo, g.hi)));
        lines.push(")".to_string());
        lines.push(listed.to_string());
        lines.extend(
            locations[..listed]
                .iter()
                .map(|(file, offset)| format!("FabOnDisk: {file} {offset}")),
        );
        lines.push(String::new());
        lines.join("\n") + "\n"
    }
}

/// A plotfile on disk. The directory is removed when this is dropped.
#[derive(Debug)]
pub struct Plotfile {
    _tmp: TempDir,
    path: PathBuf,
}

impl Plotfile {
    /// Plotfile directory, as passed to the reader.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of `Level_0/Cell_D_<file>`.
    pub fn data_file(&self, file: usize) -> PathBuf {
        self.path.join("Level_0").join(data_file_name(file))
    }
}

fn data_file_name(file: usize) -> String {
    format!("Cell_D_{file:05}")
}

fn box_text(lo: [i32; 3], hi: [i32; 3]) -> String {
    format!(
        "(({},{},{}) ({},{},{}) (0,0,0))",
        lo[0], lo[1], lo[2], hi[0], hi[1], hi[2]
    )
}

fn write_record(buf: &mut Vec<u8>, g: &FixtureGrid) {
    let magic = match g.corruption {
        Some(Corruption::BadMagic) => "XAB",
        _ => "FAB",
    };
    let mut header_hi = g.hi;
    if g.corruption == Some(Corruption::WrongBox) {
        header_hi[0] += 1;
    }
    let ncomp = match g.corruption {
        Some(Corruption::WrongComponents) => 1,
        _ => 3,
    };
    buf.extend_from_slice(
        format!(
            "{magic} {REAL_DESCRIPTOR}{} {ncomp}\n",
            box_text(g.lo, header_hi)
        )
        .as_bytes(),
    );

    let payload = fab_payload(g.lo, g.hi);
    let keep = match g.corruption {
        Some(Corruption::Truncated) => payload.len() / 2,
        Some(Corruption::WrongComponents) => payload.len() / 3,
        _ => payload.len(),
    };
    for v in &payload[..keep] {
        buf.extend_from_slice(&v.to_ne_bytes());
    }
}
