//! Core index-space types: integer vectors, boxes and the output view.

use std::fmt;
use std::ops::{Add, Index, IndexMut, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of spatial dimensions handled by the reader.
pub const SPACEDIM: usize = 3;

/// Number of field components stored per cell.
pub const NCOMP: usize = 3;

/// Floor division of `i` by a positive `ratio`.
///
/// Rounds toward negative infinity, so `coarsen(-1, 4) == -1` where C-style
/// truncation would give 0.
pub fn coarsen(i: i32, ratio: i32) -> i32 {
    debug_assert!(ratio > 0, "coarsening ratio must be positive");
    i.div_euclid(ratio)
}

/// A point in 3D integer index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IntVect(pub [i32; SPACEDIM]);

impl IntVect {
    /// Create a new vector.
    pub const fn new(i: i32, j: i32, k: i32) -> Self {
        Self([i, j, k])
    }

    /// Vector with the same value on every axis.
    pub const fn splat(v: i32) -> Self {
        Self([v; SPACEDIM])
    }

    /// Componentwise minimum.
    pub fn min(self, other: Self) -> Self {
        Self(std::array::from_fn(|d| self.0[d].min(other.0[d])))
    }

    /// Componentwise maximum.
    pub fn max(self, other: Self) -> Self {
        Self(std::array::from_fn(|d| self.0[d].max(other.0[d])))
    }

    /// Componentwise [`coarsen`] by a per-axis ratio.
    pub fn coarsen(self, ratio: Self) -> Self {
        Self(std::array::from_fn(|d| coarsen(self.0[d], ratio.0[d])))
    }

    /// Componentwise clamp into `[lo, hi]`.
    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        self.max(lo).min(hi)
    }

    /// Whether every component is `<=` the matching component of `other`.
    pub fn all_le(&self, other: &Self) -> bool {
        (0..SPACEDIM).all(|d| self.0[d] <= other.0[d])
    }
}

impl From<[i32; SPACEDIM]> for IntVect {
    fn from(a: [i32; SPACEDIM]) -> Self {
        Self(a)
    }
}

impl Index<usize> for IntVect {
    type Output = i32;

    fn index(&self, d: usize) -> &i32 {
        &self.0[d]
    }
}

impl IndexMut<usize> for IntVect {
    fn index_mut(&mut self, d: usize) -> &mut i32 {
        &mut self.0[d]
    }
}

impl Add for IntVect {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(std::array::from_fn(|d| self.0[d] + rhs.0[d]))
    }
}

impl Sub for IntVect {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(std::array::from_fn(|d| self.0[d] - rhs.0[d]))
    }
}

impl fmt::Display for IntVect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.0[0], self.0[1], self.0[2])
    }
}

/// Error decoding a box from its text form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot parse box from {input:?}: {reason}")]
pub struct ParseBoxError {
    pub input: String,
    pub reason: String,
}

impl ParseBoxError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        let mut input = input.to_string();
        input.truncate(80);
        Self {
            input,
            reason: reason.into(),
        }
    }
}

/// An axis-aligned box of cells with inclusive corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridBox {
    pub lo: IntVect,
    pub hi: IntVect,
}

impl GridBox {
    /// Create a new box.
    pub fn new(lo: impl Into<IntVect>, hi: impl Into<IntVect>) -> Self {
        Self {
            lo: lo.into(),
            hi: hi.into(),
        }
    }

    /// Whether the box has no cells (`hi < lo` on some axis).
    pub fn is_empty(&self) -> bool {
        (0..SPACEDIM).any(|d| self.hi[d] < self.lo[d])
    }

    /// Per-axis number of cells, zero on inverted axes.
    pub fn size(&self) -> [usize; SPACEDIM] {
        std::array::from_fn(|d| {
            let n = i64::from(self.hi[d]) - i64::from(self.lo[d]) + 1;
            n.max(0) as usize
        })
    }

    /// Per-axis cell count as an [`IntVect`], `None` when the box is
    /// inverted or an axis holds more than `i32::MAX` cells.
    pub fn extent(&self) -> Option<IntVect> {
        let mut out = IntVect::default();
        for d in 0..SPACEDIM {
            let n = i64::from(self.hi[d]) - i64::from(self.lo[d]) + 1;
            if n < 1 {
                return None;
            }
            out[d] = i32::try_from(n).ok()?;
        }
        Some(out)
    }

    /// Total number of cells, or `None` on overflow.
    pub fn num_cells(&self) -> Option<usize> {
        let [nx, ny, nz] = self.size();
        nx.checked_mul(ny)?.checked_mul(nz)
    }

    /// Intersection with another box, `None` when empty on any axis.
    pub fn intersection(&self, other: &GridBox) -> Option<GridBox> {
        let b = GridBox {
            lo: self.lo.max(other.lo),
            hi: self.hi.min(other.hi),
        };
        (!b.is_empty()).then_some(b)
    }

    /// Whether `other` lies entirely inside this box.
    pub fn contains_box(&self, other: &GridBox) -> bool {
        self.lo.all_le(&other.lo) && other.hi.all_le(&self.hi)
    }

    /// Whether the cell lies inside this box.
    pub fn contains(&self, cell: IntVect) -> bool {
        self.lo.all_le(&cell) && cell.all_le(&self.hi)
    }

    /// Translate both corners by `delta`.
    pub fn shift(&self, delta: IntVect) -> GridBox {
        GridBox {
            lo: self.lo + delta,
            hi: self.hi + delta,
        }
    }

    /// Decode a box from the front of `s`, returning the unparsed rest.
    ///
    /// Accepts `((lo) (hi))` or `((lo) (hi) (type))`; the index-type tuple is
    /// read and discarded.
    pub fn parse_prefix(s: &str) -> Result<(GridBox, &str), ParseBoxError> {
        let start = s
            .find('(')
            .ok_or_else(|| ParseBoxError::new(s, "missing '('"))?;
        let mut rest = &s[start + 1..];
        let mut tuples: Vec<IntVect> = Vec::with_capacity(3);
        loop {
            rest = rest.trim_start();
            if let Some(after) = rest.strip_prefix(')') {
                rest = after;
                break;
            }
            let inner = rest
                .strip_prefix('(')
                .ok_or_else(|| ParseBoxError::new(s, "expected '(' or ')'"))?;
            let close = inner
                .find(')')
                .ok_or_else(|| ParseBoxError::new(s, "unterminated tuple"))?;
            tuples.push(parse_tuple(&inner[..close]).map_err(|r| ParseBoxError::new(s, r))?);
            rest = &inner[close + 1..];
        }
        match tuples.as_slice() {
            [lo, hi] | [lo, hi, _] => Ok((GridBox::new(*lo, *hi), rest)),
            _ => Err(ParseBoxError::new(
                s,
                format!("expected 2 or 3 tuples, found {}", tuples.len()),
            )),
        }
    }
}

fn parse_tuple(s: &str) -> Result<IntVect, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != SPACEDIM {
        return Err(format!("tuple ({s}) does not have {SPACEDIM} components"));
    }
    let mut v = IntVect::default();
    for (d, p) in parts.iter().enumerate() {
        v[d] = p.parse().map_err(|e| format!("bad integer {p:?}: {e}"))?;
    }
    Ok(v)
}

impl fmt::Display for GridBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} (0,0,0))", self.lo, self.hi)
    }
}

impl FromStr for GridBox {
    type Err = ParseBoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (b, rest) = GridBox::parse_prefix(s)?;
        if !rest.trim().is_empty() {
            return Err(ParseBoxError::new(s, "trailing characters"));
        }
        Ok(b)
    }
}

/// Mutable view of a caller's output buffer laid out over a query box.
///
/// Layout: component fastest, then axis 0, axis 1, axis 2 slowest.
pub struct OutputView<'a> {
    data: &'a mut [f64],
    bx: GridBox,
    size: [usize; SPACEDIM],
}

impl<'a> OutputView<'a> {
    /// Wrap `data` as the output for `bx`. Returns `None` if the buffer is
    /// too small or the cell count overflows.
    pub fn new(data: &'a mut [f64], bx: GridBox) -> Option<Self> {
        let required = bx.num_cells()?.checked_mul(NCOMP)?;
        if data.len() < required {
            return None;
        }
        Some(Self {
            data,
            bx,
            size: bx.size(),
        })
    }

    /// The box this view covers.
    pub fn bx(&self) -> &GridBox {
        &self.bx
    }

    /// Offset of component 0 of `cell`, `None` if outside the box.
    pub fn offset(&self, cell: IntVect) -> Option<usize> {
        if !self.bx.contains(cell) {
            return None;
        }
        let i = (cell[0] - self.bx.lo[0]) as usize;
        let j = (cell[1] - self.bx.lo[1]) as usize;
        let k = (cell[2] - self.bx.lo[2]) as usize;
        Some(NCOMP * (i + self.size[0] * (j + self.size[1] * k)))
    }

    /// Write all components of one cell. Returns `false` if the cell is
    /// outside the view.
    pub fn set(&mut self, cell: IntVect, values: [f64; NCOMP]) -> bool {
        match self.offset(cell) {
            Some(off) => match self.data.get_mut(off..off + NCOMP) {
                Some(dst) => {
                    dst.copy_from_slice(&values);
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    /// Read all components of one cell.
    pub fn get(&self, cell: IntVect) -> Option<[f64; NCOMP]> {
        let off = self.offset(cell)?;
        let src = self.data.get(off..off + NCOMP)?;
        Some([src[0], src[1], src[2]])
    }
}
