//! Binary FAB record reading and validation.
//!
//! A record is a one-line text prefix followed by raw doubles:
//!
//! ```text
//! FAB ((8, (64 11 52 0 1 12 0 1023)),(8, (8 7 6 5 4 3 2 1)))((0,0,0) (7,7,7) (0,0,0)) 3\n
//! <ncomp * ncells native-endian f64, component-major, axis 0 fastest>
//! ```
//!
//! The real-number descriptor (everything up to the fifth `)`) is skipped,
//! not interpreted.

use std::io::{BufRead, Read, Seek, SeekFrom};
use std::path::Path;

use crate::catalog::GridEntry;
use crate::error::{PlotfileError, Result};
use crate::types::{GridBox, IntVect, NCOMP};

const MAGIC: &[u8] = b"FAB";
const DESCRIPTOR_CLOSING_PARENS: usize = 5;

/// A decoded record: its box and the full component-major payload.
#[derive(Debug, Clone)]
pub struct FabRecord {
    bx: GridBox,
    size: [usize; 3],
    ncells: usize,
    data: Vec<f64>,
}

impl FabRecord {
    /// Read the record for `entry` from `reader`, validating it against the
    /// catalog.
    ///
    /// Seeks to `entry.offset` first. `max_header_len` bounds the text
    /// prefix so a bad offset cannot make the reader scan a whole file.
    pub fn read<R: BufRead + Seek>(
        reader: &mut R,
        entry: &GridEntry,
        max_header_len: usize,
    ) -> Result<Self> {
        let path = entry.file.as_path();
        let offset = entry.offset;
        let io_err = |source| PlotfileError::Io {
            path: path.to_path_buf(),
            source,
        };

        reader.seek(SeekFrom::Start(offset)).map_err(io_err)?;

        let mut line = Vec::with_capacity(128);
        reader
            .by_ref()
            .take(max_header_len as u64)
            .read_until(b'\n', &mut line)
            .map_err(io_err)?;

        if !line.starts_with(MAGIC) {
            return Err(PlotfileError::BadMagic {
                path: path.to_path_buf(),
                offset,
            });
        }
        if line.last() != Some(&b'\n') {
            return Err(PlotfileError::malformed_record(
                path,
                offset,
                format!("no newline within {max_header_len} bytes"),
            ));
        }

        let (bx, ncomp) = parse_record_header(path, offset, &line[MAGIC.len()..])?;

        if bx != entry.bx {
            return Err(PlotfileError::BoxMismatch {
                path: path.to_path_buf(),
                offset,
                expected: entry.bx,
                found: bx,
            });
        }
        if ncomp != NCOMP {
            return Err(PlotfileError::ComponentMismatch {
                path: path.to_path_buf(),
                offset,
                found: ncomp,
            });
        }

        let ncells = bx
            .num_cells()
            .ok_or_else(|| PlotfileError::malformed_record(path, offset, "cell count overflow"))?;
        let mut data = vec![0.0f64; ncells * NCOMP];
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut data);
        let expected_bytes = bytes.len() as u64;
        reader.read_exact(bytes).map_err(|source| {
            if source.kind() == std::io::ErrorKind::UnexpectedEof {
                PlotfileError::TruncatedRecord {
                    path: path.to_path_buf(),
                    offset,
                    expected_bytes,
                }
            } else {
                io_err(source)
            }
        })?;

        Ok(Self {
            bx,
            size: bx.size(),
            ncells,
            data,
        })
    }

    /// Box stored in the record.
    pub fn bx(&self) -> &GridBox {
        &self.bx
    }

    /// Payload size in bytes.
    pub fn payload_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f64>()
    }

    /// Value of component `comp` at absolute `cell`.
    pub fn value(&self, cell: IntVect, comp: usize) -> Option<f64> {
        if comp >= NCOMP || !self.bx.contains(cell) {
            return None;
        }
        let i = (cell[0] - self.bx.lo[0]) as usize;
        let j = (cell[1] - self.bx.lo[1]) as usize;
        let k = (cell[2] - self.bx.lo[2]) as usize;
        let idx = i + self.size[0] * (j + self.size[1] * k) + comp * self.ncells;
        self.data.get(idx).copied()
    }

    /// All components at absolute `cell`.
    pub fn cell(&self, cell: IntVect) -> Option<[f64; NCOMP]> {
        Some([
            self.value(cell, 0)?,
            self.value(cell, 1)?,
            self.value(cell, 2)?,
        ])
    }
}

/// Decode `<descriptor><box> <ncomp>\n` following the magic.
fn parse_record_header(path: &Path, offset: u64, rest: &[u8]) -> Result<(GridBox, usize)> {
    let text = std::str::from_utf8(rest)
        .map_err(|_| PlotfileError::malformed_record(path, offset, "header is not text"))?;

    let after_descriptor = text
        .match_indices(')')
        .nth(DESCRIPTOR_CLOSING_PARENS - 1)
        .map(|(i, _)| &text[i + 1..])
        .ok_or_else(|| {
            PlotfileError::malformed_record(path, offset, "real descriptor is incomplete")
        })?;

    let (bx, tail) = GridBox::parse_prefix(after_descriptor)
        .map_err(|e| PlotfileError::malformed_record(path, offset, e.to_string()))?;

    let ncomp_token = tail
        .split_whitespace()
        .next()
        .ok_or_else(|| PlotfileError::malformed_record(path, offset, "missing component count"))?;
    let ncomp = ncomp_token.parse().map_err(|_| {
        PlotfileError::malformed_record(path, offset, format!("bad component count {ncomp_token:?}"))
    })?;

    Ok((bx, ncomp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    const DESCRIPTOR: &str = "((8, (64 11 52 0 1 12 0 1023)),(8, (8 7 6 5 4 3 2 1)))";

    fn record(bx: &GridBox, ncomp: usize, values: &[f64]) -> Vec<u8> {
        let mut out = format!("FAB {DESCRIPTOR}{bx} {ncomp}\n").into_bytes();
        for v in values {
            out.extend_from_slice(&v.to_ne_bytes());
        }
        out
    }

    fn entry(bx: GridBox, offset: u64) -> GridEntry {
        GridEntry {
            bx,
            file: PathBuf::from("Level_0/Cell_D_00000"),
            offset,
        }
    }

    fn pattern(bx: &GridBox) -> Vec<f64> {
        let n = bx.num_cells().unwrap();
        (0..n * NCOMP).map(|i| i as f64).collect()
    }

    #[test]
    fn test_read_valid_record_at_offset() {
        let bx = GridBox::new([2, 0, 0], [3, 1, 0]);
        let mut bytes = b"padding!".to_vec();
        bytes.extend(record(&bx, 3, &pattern(&bx)));
        let mut cursor = Cursor::new(bytes);

        let fab = FabRecord::read(&mut cursor, &entry(bx, 8), 4096).unwrap();
        assert_eq!(fab.bx(), &bx);
        assert_eq!(fab.payload_bytes(), 4 * 3 * 8);
        // component-major, axis 0 fastest
        assert_eq!(fab.value(IntVect::new(2, 0, 0), 0), Some(0.0));
        assert_eq!(fab.value(IntVect::new(3, 0, 0), 0), Some(1.0));
        assert_eq!(fab.value(IntVect::new(2, 1, 0), 0), Some(2.0));
        assert_eq!(fab.value(IntVect::new(2, 0, 0), 1), Some(4.0));
        assert_eq!(fab.cell(IntVect::new(3, 1, 0)), Some([3.0, 7.0, 11.0]));
        assert_eq!(fab.value(IntVect::new(4, 0, 0), 0), None);
        assert_eq!(fab.value(IntVect::new(2, 0, 0), 3), None);
    }

    #[test]
    fn test_bad_magic() {
        let bx = GridBox::new([0, 0, 0], [0, 0, 0]);
        let mut bytes = record(&bx, 3, &[1.0, 2.0, 3.0]);
        bytes[1] = b'X';
        let err = FabRecord::read(&mut Cursor::new(bytes), &entry(bx, 0), 4096).unwrap_err();
        assert!(matches!(err, PlotfileError::BadMagic { offset: 0, .. }));
    }

    #[test]
    fn test_box_mismatch() {
        let on_disk = GridBox::new([0, 0, 0], [0, 0, 1]);
        let expected = GridBox::new([0, 0, 0], [0, 0, 0]);
        let bytes = record(&on_disk, 3, &[0.0; 6]);
        let err = FabRecord::read(&mut Cursor::new(bytes), &entry(expected, 0), 4096).unwrap_err();
        match err {
            PlotfileError::BoxMismatch {
                expected: e,
                found: f,
                ..
            } => {
                assert_eq!(e, expected);
                assert_eq!(f, on_disk);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_component_mismatch() {
        let bx = GridBox::new([0, 0, 0], [0, 0, 0]);
        let bytes = record(&bx, 1, &[5.0]);
        let err = FabRecord::read(&mut Cursor::new(bytes), &entry(bx, 0), 4096).unwrap_err();
        assert!(matches!(err, PlotfileError::ComponentMismatch { found: 1, .. }));
    }

    #[test]
    fn test_truncated_payload() {
        let bx = GridBox::new([0, 0, 0], [1, 0, 0]);
        let bytes = record(&bx, 3, &[0.0; 5]);
        let err = FabRecord::read(&mut Cursor::new(bytes), &entry(bx, 0), 4096).unwrap_err();
        assert!(matches!(
            err,
            PlotfileError::TruncatedRecord {
                expected_bytes: 48,
                ..
            }
        ));
    }

    #[test]
    fn test_header_without_newline() {
        let bx = GridBox::new([0, 0, 0], [0, 0, 0]);
        let bytes = record(&bx, 3, &[0.0; 3]);
        let err = FabRecord::read(&mut Cursor::new(bytes), &entry(bx, 0), 20).unwrap_err();
        assert!(matches!(err, PlotfileError::MalformedRecord { .. }));
    }

    #[test]
    fn test_incomplete_descriptor() {
        let bytes = b"FAB ((8, (64 11 52)) 3\n".to_vec();
        let bx = GridBox::new([0, 0, 0], [0, 0, 0]);
        let err = FabRecord::read(&mut Cursor::new(bytes), &entry(bx, 0), 4096).unwrap_err();
        assert!(matches!(err, PlotfileError::MalformedRecord { .. }));
    }
}
