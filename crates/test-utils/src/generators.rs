//! Deterministic cell values for synthetic plotfiles.
//!
//! Every value encodes its component and absolute cell index, so a test can
//! tell exactly which cell of which grid ended up where in an output buffer.

/// Value stored for component `comp` at absolute `cell`.
///
/// Computed as `(comp + 1) * 1e6 + k * 1e4 + j * 100 + i`, which is unique
/// for indices in `-50..50`.
///
/// # Example
///
/// ```
/// use test_utils::sentinel;
///
/// assert_eq!(sentinel(0, [1, 2, 3]), 1_030_201.0);
/// assert_eq!(sentinel(2, [0, 0, 0]), 3_000_000.0);
/// ```
pub fn sentinel(comp: usize, cell: [i32; 3]) -> f64 {
    (comp as f64 + 1.0) * 1.0e6
        + f64::from(cell[2]) * 1.0e4
        + f64::from(cell[1]) * 100.0
        + f64::from(cell[0])
}

/// Number of cells in the inclusive box `lo..=hi`, zero if it is empty.
pub fn box_cells(lo: [i32; 3], hi: [i32; 3]) -> usize {
    (0..3)
        .map(|d| (i64::from(hi[d]) - i64::from(lo[d]) + 1).max(0) as usize)
        .product()
}

/// Payload of a 3-component record for box `lo..=hi` in on-disk order:
/// component-major, axis 0 fastest.
pub fn fab_payload(lo: [i32; 3], hi: [i32; 3]) -> Vec<f64> {
    let mut data = Vec::with_capacity(box_cells(lo, hi) * 3);
    for comp in 0..3 {
        for k in lo[2]..=hi[2] {
            for j in lo[1]..=hi[1] {
                for i in lo[0]..=hi[0] {
                    data.push(sentinel(comp, [i, j, k]));
                }
            }
        }
    }
    data
}

/// Expected extraction output for the absolute box `lo..=hi` when every
/// cell is covered: component fastest, then axis 0, axis 1, axis 2.
pub fn expected_output(lo: [i32; 3], hi: [i32; 3]) -> Vec<f64> {
    let mut data = Vec::with_capacity(box_cells(lo, hi) * 3);
    for k in lo[2]..=hi[2] {
        for j in lo[1]..=hi[1] {
            for i in lo[0]..=hi[0] {
                for comp in 0..3 {
                    data.push(sentinel(comp, [i, j, k]));
                }
            }
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_distinguishes_axes() {
        let base = sentinel(0, [0, 0, 0]);
        assert_ne!(sentinel(0, [1, 0, 0]), base);
        assert_ne!(sentinel(0, [0, 1, 0]), base);
        assert_ne!(sentinel(0, [0, 0, 1]), base);
        assert_ne!(sentinel(1, [0, 0, 0]), base);
        assert_eq!(sentinel(0, [-3, 0, 0]), 999_997.0);
    }

    #[test]
    fn test_box_cells() {
        assert_eq!(box_cells([0, 0, 0], [3, 1, 0]), 8);
        assert_eq!(box_cells([-2, -2, -2], [-1, -1, -1]), 8);
        assert_eq!(box_cells([0, 0, 0], [-1, 4, 4]), 0);
    }

    #[test]
    fn test_fab_payload_order() {
        let data = fab_payload([0, 0, 0], [1, 1, 0]);
        assert_eq!(data.len(), 12);
        assert_eq!(data[0], sentinel(0, [0, 0, 0]));
        assert_eq!(data[1], sentinel(0, [1, 0, 0]));
        assert_eq!(data[2], sentinel(0, [0, 1, 0]));
        assert_eq!(data[4], sentinel(1, [0, 0, 0]));
    }

    #[test]
    fn test_expected_output_order() {
        let data = expected_output([0, 0, 0], [1, 0, 0]);
        assert_eq!(
            data,
            vec![
                sentinel(0, [0, 0, 0]),
                sentinel(1, [0, 0, 0]),
                sentinel(2, [0, 0, 0]),
                sentinel(0, [1, 0, 0]),
                sentinel(1, [1, 0, 0]),
                sentinel(2, [1, 0, 0]),
            ]
        );
    }
}
