//! Fixtures for testing the plotfile reader without real simulation output.
//!
//! [`PlotfileBuilder`] writes small single-level plotfiles into temporary
//! directories, optionally with damaged records. Their cell values come from
//! [`sentinel`], which encodes component and cell index, so
//! [`expected_output`] can predict any extraction exactly. Tests that need
//! a real plotfile find it through `PLOTFILE_TEST_DATA` with
//! [`require_test_plotfile!`].
//!
//! ```ignore
//! use test_utils::{expected_output, PlotfileBuilder};
//!
//! let plot = PlotfileBuilder::new().grid([0, 0, 0], [3, 3, 3]).build()?;
//! let want = expected_output([0, 0, 0], [3, 3, 3]);
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Macro to skip a test if the named plotfile is not available.
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_test_plotfile;
///
/// #[test]
/// fn test_real_run() {
///     let dir = require_test_plotfile!("plt00000");
///     // Test code using dir...
/// }
/// ```
///
/// If the plotfile is not found, the test prints a skip message and returns early.
#[macro_export]
macro_rules! require_test_plotfile {
    ($name:expr) => {{
        match $crate::find_test_plotfile($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: Plotfile '{}' not found. Set PLOTFILE_TEST_DATA to run this test.",
                    $name
                );
                return;
            }
        }
    }};
}

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }
}
