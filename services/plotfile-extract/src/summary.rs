//! JSON summary of an extraction.

use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::Serialize;

use plotfile_reader::{ExtractReport, NCOMP};

/// Value range of one component over the extracted buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentRange {
    pub name: String,
    /// `None` when the buffer holds no non-NaN value.
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ExtractSummary {
    pub plotfile: PathBuf,
    pub output: Option<PathBuf>,
    #[serde(flatten)]
    pub report: ExtractReport,
    pub components: Vec<ComponentRange>,
}

impl ExtractSummary {
    pub fn new(
        plotfile: PathBuf,
        output: Option<PathBuf>,
        variables: &[String],
        report: ExtractReport,
        data: &[f64],
    ) -> Self {
        Self {
            plotfile,
            output,
            report,
            components: component_ranges(variables, data),
        }
    }
}

/// Per-component min/max of an interleaved buffer, skipping NaN.
pub fn component_ranges(variables: &[String], data: &[f64]) -> Vec<ComponentRange> {
    (0..NCOMP)
        .map(|c| {
            let values = data.iter().skip(c).step_by(NCOMP).copied().filter(|v| !v.is_nan());
            let (min, max) = values.fold((None, None), |(lo, hi): (Option<f64>, Option<f64>), v| {
                (
                    Some(lo.map_or(v, |m| m.min(v))),
                    Some(hi.map_or(v, |m| m.max(v))),
                )
            });
            ComponentRange {
                name: variables.get(c).cloned().unwrap_or_else(|| format!("comp{c}")),
                min,
                max,
            }
        })
        .collect()
}

/// Cells in the inclusive box `lo..=hi`; zero when it is empty.
pub fn cell_count(lo: [i32; 3], hi: [i32; 3]) -> Result<usize> {
    let mut n: usize = 1;
    for d in 0..3 {
        let len = i64::from(hi[d]) - i64::from(lo[d]) + 1;
        if len <= 0 {
            return Ok(0);
        }
        n = match n.checked_mul(len as usize) {
            Some(n) => n,
            None => bail!("query box {lo:?}..{hi:?} is too large"),
        };
    }
    Ok(n)
}
