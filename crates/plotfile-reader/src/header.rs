//! Parsing of the plotfile `Header` and the level's VisMF `Cell_H`.
//!
//! Both are plain text written by AMReX. Only the fields needed to locate
//! and describe the level-0 grids are decoded; trailing sections (coordinate
//! system, per-grid physical boxes, min/max tables) are ignored.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PlotfileError, Result};
use crate::types::{GridBox, NCOMP, SPACEDIM};

/// Scalar metadata from the plotfile-level `Header`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotfileHeader {
    /// Format version string, e.g. `HyperCLaw-V1.1`.
    pub version: String,
    /// Variable names, one per component.
    pub variables: Vec<String>,
    /// Physical time of the snapshot.
    pub time: f64,
    /// Physical lower corner of the problem domain.
    pub prob_lo: [f64; SPACEDIM],
    /// Physical upper corner of the problem domain.
    pub prob_hi: [f64; SPACEDIM],
    /// Index-space problem domain of level 0.
    pub problem_domain: GridBox,
    /// Step count of level 0.
    pub level_steps: i64,
    /// Cell spacing of level 0.
    pub cell_size: [f64; SPACEDIM],
}

/// One `FabOnDisk` line of a VisMF header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabOnDisk {
    /// Data file name relative to the level directory.
    pub file: String,
    /// Byte offset of the record inside `file`.
    pub offset: u64,
}

/// The level's VisMF header: box list plus record locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellHeader {
    pub version: i32,
    pub how: i32,
    pub ncomp: usize,
    pub ngrow: usize,
    pub boxes: Vec<GridBox>,
    pub fabs: Vec<FabOnDisk>,
}

/// Read a whole header file into memory.
pub(crate) fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| PlotfileError::HeaderRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Sequential line reader that names the field being read in its errors.
struct HeaderLines<'a> {
    path: &'a Path,
    lines: std::str::Lines<'a>,
    line_no: usize,
}

impl<'a> HeaderLines<'a> {
    fn new(path: &'a Path, text: &'a str) -> Self {
        Self {
            path,
            lines: text.lines(),
            line_no: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> PlotfileError {
        PlotfileError::invalid_header(self.path, format!("line {}: {}", self.line_no, reason.into()))
    }

    fn next(&mut self, what: &str) -> Result<&'a str> {
        self.line_no += 1;
        self.lines
            .next()
            .ok_or_else(|| self.error(format!("unexpected end of file reading {what}")))
    }

    fn value<T: FromStr>(&mut self, what: &str) -> Result<T>
    where
        T::Err: std::fmt::Display,
    {
        let line = self.next(what)?;
        let token = line
            .split_whitespace()
            .next()
            .ok_or_else(|| self.error(format!("missing {what}")))?;
        token
            .parse()
            .map_err(|e| self.error(format!("bad {what} {token:?}: {e}")))
    }

    fn reals(&mut self, what: &str) -> Result<[f64; SPACEDIM]> {
        let line = self.next(what)?;
        let values: Vec<f64> = line
            .split_whitespace()
            .map(str::parse)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| self.error(format!("bad {what}: {e}")))?;
        values
            .get(..SPACEDIM)
            .and_then(|v| <[f64; SPACEDIM]>::try_from(v).ok())
            .ok_or_else(|| self.error(format!("{what} needs {SPACEDIM} values")))
    }
}

impl PlotfileHeader {
    /// Read and parse `<dir>/<name>`.
    pub fn read(path: &Path) -> Result<Self> {
        let text = read_text(path)?;
        Self::parse(path, &text)
    }

    /// Parse header text. `path` is only used in error messages.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let mut lines = HeaderLines::new(path, text);

        let version = lines.next("version")?.trim().to_string();

        let ncomp: usize = lines.value("variable count")?;
        if ncomp != NCOMP {
            return Err(PlotfileError::unsupported(format!(
                "Number of components is {ncomp}, not {NCOMP}"
            )));
        }
        let variables = (0..ncomp)
            .map(|_| lines.next("variable name").map(|s| s.trim().to_string()))
            .collect::<Result<Vec<_>>>()?;

        let spacedim: usize = lines.value("spatial dimension")?;
        let time: f64 = lines.value("time")?;
        let finest_level: i32 = lines.value("finest level")?;
        if spacedim != SPACEDIM || finest_level != 0 {
            return Err(PlotfileError::unsupported(format!(
                "Incorrect spacedim {spacedim} or finest_level {finest_level}"
            )));
        }

        let prob_lo = lines.reals("prob_lo")?;
        let prob_hi = lines.reals("prob_hi")?;

        // refinement ratios, empty with a single level
        lines.next("refinement ratios")?;

        let domain_line = lines.next("problem domain")?;
        let (problem_domain, _) =
            GridBox::parse_prefix(domain_line).map_err(|e| lines.error(e.to_string()))?;

        let level_steps: i64 = lines.value("level steps")?;
        let cell_size = lines.reals("cell size")?;

        Ok(Self {
            version,
            variables,
            time,
            prob_lo,
            prob_hi,
            problem_domain,
            level_steps,
            cell_size,
        })
    }
}

/// Whitespace tokenizer over the VisMF header.
struct Tokens<'a> {
    path: &'a Path,
    rest: &'a str,
}

impl<'a> Tokens<'a> {
    fn error(&self, reason: impl Into<String>) -> PlotfileError {
        PlotfileError::invalid_header(self.path, reason)
    }

    fn next(&mut self, what: &str) -> Result<&'a str> {
        let s = self.rest.trim_start();
        let end = s
            .find(|c: char| c.is_whitespace() || c == '(' || c == ')')
            .unwrap_or(s.len());
        if end == 0 {
            return Err(self.error(format!("missing {what}")));
        }
        self.rest = &s[end..];
        Ok(&s[..end])
    }

    fn value<T: FromStr>(&mut self, what: &str) -> Result<T>
    where
        T::Err: std::fmt::Display,
    {
        let token = self.next(what)?;
        token
            .parse()
            .map_err(|e| self.error(format!("bad {what} {token:?}: {e}")))
    }

    fn expect(&mut self, c: char, what: &str) -> Result<()> {
        let s = self.rest.trim_start();
        match s.strip_prefix(c) {
            Some(after) => {
                self.rest = after;
                Ok(())
            }
            None => Err(self.error(format!("expected '{c}' {what}"))),
        }
    }

    fn grid_box(&mut self) -> Result<GridBox> {
        let (b, rest) = GridBox::parse_prefix(self.rest).map_err(|e| self.error(e.to_string()))?;
        self.rest = rest;
        Ok(b)
    }
}

impl CellHeader {
    /// Read and parse a `Cell_H` file.
    pub fn read(path: &Path) -> Result<Self> {
        let text = read_text(path)?;
        Self::parse(path, &text)
    }

    /// Parse VisMF header text. `path` is only used in error messages.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let mut tokens = Tokens { path, rest: text };

        let version: i32 = tokens.value("version")?;
        let how: i32 = tokens.value("how")?;
        let ncomp: usize = tokens.value("component count")?;
        let ngrow: usize = tokens.value("ghost cell count")?;
        if ncomp != NCOMP || ngrow != 0 {
            return Err(PlotfileError::unsupported(format!(
                "level data has {ncomp} components and {ngrow} ghost cells, expected {NCOMP} and 0"
            )));
        }

        tokens.expect('(', "before box array")?;
        let nboxes: usize = tokens.value("box count")?;
        let _tag: i64 = tokens.value("box array tag")?;
        let boxes = (0..nboxes)
            .map(|_| tokens.grid_box())
            .collect::<Result<Vec<_>>>()?;
        tokens.expect(')', "after box array")?;

        // checked before reserving: the count comes straight from the file
        let nfabs: usize = tokens.value("FAB count")?;
        if nfabs != nboxes {
            return Err(PlotfileError::CountMismatch {
                boxes: nboxes,
                fabs: nfabs,
            });
        }

        let mut fabs = Vec::with_capacity(nfabs);
        for _ in 0..nfabs {
            let _label = tokens.next("FabOnDisk label")?;
            let file = tokens.next("FAB file name")?.to_string();
            let offset: u64 = tokens.value("FAB offset")?;
            fabs.push(FabOnDisk { file, offset });
        }

        Ok(Self {
            version,
            how,
            ncomp,
            ngrow,
            boxes,
            fabs,
        })
    }
}

/// Paths of the two header files for a plotfile directory.
pub(crate) fn header_paths(dir: &Path, config: &crate::ReaderConfig) -> (PathBuf, PathBuf) {
    (
        dir.join(&config.header_file),
        dir.join(&config.level_dir).join(&config.cell_header_file),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "HyperCLaw-V1.1
3
x_velocity
y_velocity
z_velocity
3
1.25
0
-1 -1 -1
1 1 1

((0,0,0) (15,15,15) (0,0,0))
42
0.125 0.125 0.125
0
0
0 2 1.25
42
-1 0
-1 0
-1 0
Level_0/Cell
";

    const CELL_H: &str = "1
0
3
0
(2 0
((0,0,0) (7,15,15) (0,0,0))
((8,0,0) (15,15,15) (0,0,0))
)
2
FabOnDisk: Cell_D_00000 0
FabOnDisk: Cell_D_00000 24712

2,3
0,0,0,
1,1,1,
";

    fn path() -> &'static Path {
        Path::new("plt00042/Header")
    }

    #[test]
    fn test_parse_plotfile_header() {
        let h = PlotfileHeader::parse(path(), HEADER).unwrap();
        assert_eq!(h.version, "HyperCLaw-V1.1");
        assert_eq!(h.variables, vec!["x_velocity", "y_velocity", "z_velocity"]);
        assert!((h.time - 1.25).abs() < f64::EPSILON);
        assert_eq!(h.prob_lo, [-1.0, -1.0, -1.0]);
        assert_eq!(h.prob_hi, [1.0, 1.0, 1.0]);
        assert_eq!(h.problem_domain, GridBox::new([0, 0, 0], [15, 15, 15]));
        assert_eq!(h.level_steps, 42);
        assert_eq!(h.cell_size, [0.125, 0.125, 0.125]);
    }

    #[test]
    fn test_header_rejects_wrong_component_count() {
        let text = HEADER.replacen("\n3\nx_velocity", "\n2\nx_velocity", 1);
        let err = PlotfileHeader::parse(path(), &text).unwrap_err();
        assert!(matches!(err, PlotfileError::UnsupportedLayout(_)));
        assert!(err.to_string().contains("Number of components is 2"));
    }

    #[test]
    fn test_header_rejects_multilevel() {
        let text = HEADER.replacen("1.25\n0\n", "1.25\n1\n", 1);
        let err = PlotfileHeader::parse(path(), &text).unwrap_err();
        assert!(err.to_string().contains("finest_level 1"));
    }

    #[test]
    fn test_header_truncated() {
        let text: String = HEADER.lines().take(9).collect::<Vec<_>>().join("\n");
        let err = PlotfileHeader::parse(path(), &text).unwrap_err();
        assert!(matches!(err, PlotfileError::InvalidHeader { .. }));
    }

    #[test]
    fn test_parse_cell_header() {
        let h = CellHeader::parse(Path::new("Cell_H"), CELL_H).unwrap();
        assert_eq!(h.ncomp, 3);
        assert_eq!(h.ngrow, 0);
        assert_eq!(h.boxes.len(), 2);
        assert_eq!(h.boxes[1], GridBox::new([8, 0, 0], [15, 15, 15]));
        assert_eq!(
            h.fabs[1],
            FabOnDisk {
                file: "Cell_D_00000".to_string(),
                offset: 24712
            }
        );
    }

    #[test]
    fn test_cell_header_count_mismatch() {
        let text = CELL_H.replacen(")\n2\n", ")\n1\n", 1);
        let err = CellHeader::parse(Path::new("Cell_H"), &text).unwrap_err();
        assert!(matches!(
            err,
            PlotfileError::CountMismatch { boxes: 2, fabs: 1 }
        ));
    }

    #[test]
    fn test_cell_header_huge_fab_count() {
        let text = "1\n0\n3\n0\n(1 0\n((0,0,0) (1,1,1) (0,0,0))\n)\n99999999999999\nFabOnDisk: Cell_D_00000 0\n";
        let err = CellHeader::parse(Path::new("Cell_H"), text).unwrap_err();
        assert!(matches!(
            err,
            PlotfileError::CountMismatch {
                boxes: 1,
                fabs: 99999999999999
            }
        ));
    }

    #[test]
    fn test_cell_header_rejects_ghost_cells() {
        let text = CELL_H.replacen("3\n0\n(", "3\n1\n(", 1);
        let err = CellHeader::parse(Path::new("Cell_H"), &text).unwrap_err();
        assert!(matches!(err, PlotfileError::UnsupportedLayout(_)));
    }
}
