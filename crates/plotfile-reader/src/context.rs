//! Caller-owned reader state: status-code mapping plus the loaded dataset.

use std::path::Path;

use crate::config::ReaderConfig;
use crate::dataset::{Dataset, DatasetMetadata};
use crate::error::{PlotfileError, Result};
use crate::extract::ExtractReport;
use crate::status::{Severity, StatusCodes, UNCONFIGURED_STATUS};
use crate::types::{GridBox, IntVect};

/// Lifecycle of a [`ReaderContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// No dataset has been loaded successfully.
    Unloaded,
    /// A dataset is installed and extraction is allowed.
    Loaded,
}

/// One independent reader: what the caller's status codes are and which
/// dataset is loaded.
///
/// Whether status codes are configured and whether a dataset is loaded are
/// tracked separately. Only the latter gates extraction.
#[derive(Debug, Default)]
pub struct ReaderContext {
    config: ReaderConfig,
    codes: Option<StatusCodes>,
    dataset: Option<Dataset>,
}

impl ReaderContext {
    /// Create an unloaded context with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unloaded context with the given configuration.
    pub fn with_config(config: ReaderConfig) -> Self {
        Self {
            config,
            codes: None,
            dataset: None,
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Register the caller's no-error / severe / fatal integers.
    pub fn configure_status_codes(&mut self, no_error: i32, severe: i32, fatal: i32) {
        self.codes = Some(StatusCodes::new(no_error, severe, fatal));
    }

    pub fn codes_configured(&self) -> bool {
        self.codes.is_some()
    }

    /// Caller code for `severity`, or [`UNCONFIGURED_STATUS`] before
    /// [`configure_status_codes`](Self::configure_status_codes).
    pub fn status_code(&self, severity: Severity) -> i32 {
        self.codes
            .map(|c| c.code(severity))
            .unwrap_or(UNCONFIGURED_STATUS)
    }

    pub fn state(&self) -> ReaderState {
        if self.dataset.is_some() {
            ReaderState::Loaded
        } else {
            ReaderState::Unloaded
        }
    }

    pub fn dataset_loaded(&self) -> bool {
        self.dataset.is_some()
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Load the plotfile at `path`, replacing any previous dataset.
    ///
    /// The new dataset is installed only if loading succeeds completely. On
    /// failure the previous dataset, if any, stays in place.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&DatasetMetadata> {
        let dataset = Dataset::open(path.as_ref(), &self.config)?;
        Ok(&self.dataset.insert(dataset).metadata)
    }

    /// Extract the local box `lo..=hi` into `out`.
    ///
    /// Fails with [`PlotfileError::NotLoaded`] and touches nothing when no
    /// dataset is loaded.
    pub fn extract(&self, lo: IntVect, hi: IntVect, out: &mut [f64]) -> Result<ExtractReport> {
        let dataset = self.dataset.as_ref().ok_or(PlotfileError::NotLoaded)?;
        dataset.extract_into(&GridBox { lo, hi }, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let ctx = ReaderContext::new();
        assert_eq!(ctx.state(), ReaderState::Unloaded);
        assert!(!ctx.codes_configured());
        assert!(!ctx.dataset_loaded());
        assert_eq!(ctx.status_code(Severity::NoError), UNCONFIGURED_STATUS);
        assert_eq!(ctx.status_code(Severity::Fatal), UNCONFIGURED_STATUS);
    }

    #[test]
    fn test_configured_codes_do_not_imply_loaded() {
        let mut ctx = ReaderContext::new();
        ctx.configure_status_codes(0, 1, -1);
        assert!(ctx.codes_configured());
        assert_eq!(ctx.state(), ReaderState::Unloaded);
        assert_eq!(ctx.status_code(Severity::Severe), 1);

        let mut out = vec![7.0; 3];
        let err = ctx
            .extract(IntVect::splat(0), IntVect::splat(0), &mut out)
            .unwrap_err();
        assert!(matches!(err, PlotfileError::NotLoaded));
        assert_eq!(out, vec![7.0; 3]);
    }

    #[test]
    fn test_extract_before_load_for_any_query_shape() {
        let ctx = ReaderContext::new();
        let shapes = [
            (IntVect::splat(0), IntVect::splat(0)),
            (IntVect::splat(0), IntVect::splat(-1)),
            (IntVect::new(-5, -5, -5), IntVect::new(100, 100, 100)),
        ];
        for (lo, hi) in shapes {
            let err = ctx.extract(lo, hi, &mut []).unwrap_err();
            assert!(matches!(err, PlotfileError::NotLoaded));
            assert_eq!(err.severity(), Severity::Fatal);
            assert!(err.to_string().contains("not loaded"));
        }
    }

    #[test]
    fn test_failed_load_stays_unloaded() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = ReaderContext::new();
        assert!(ctx.load(dir.path()).is_err());
        assert_eq!(ctx.state(), ReaderState::Unloaded);
    }
}
