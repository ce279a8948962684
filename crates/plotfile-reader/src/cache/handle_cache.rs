//! Per-extraction cache of open data file handles.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PlotfileError, Result};

/// Counters describing how a [`FileHandleCache`] was used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleCacheStats {
    /// Files opened.
    pub opens: u64,
    /// Lookups served by an already open handle.
    pub reuses: u64,
}

/// Lazily opened read handles keyed by path.
///
/// Lives for a single extraction call. Handles close when the cache is
/// dropped, which happens on every return path of the call.
pub struct FileHandleCache {
    handles: HashMap<PathBuf, BufReader<File>>,
    buffer_size: usize,
    stats: HandleCacheStats,
}

impl FileHandleCache {
    /// Create an empty cache whose readers use `buffer_size` bytes.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            handles: HashMap::new(),
            buffer_size: buffer_size.max(1),
            stats: HandleCacheStats::default(),
        }
    }

    /// Handle for `path`, opening it on first use.
    pub fn get(&mut self, path: &Path) -> Result<&mut BufReader<File>> {
        match self.handles.entry(path.to_path_buf()) {
            Entry::Occupied(slot) => {
                self.stats.reuses += 1;
                Ok(slot.into_mut())
            }
            Entry::Vacant(slot) => {
                let file = File::open(path).map_err(|source| PlotfileError::OpenFailed {
                    path: path.to_path_buf(),
                    source,
                })?;
                tracing::trace!(path = %path.display(), "Opened data file");
                self.stats.opens += 1;
                Ok(slot.insert(BufReader::with_capacity(self.buffer_size, file)))
            }
        }
    }

    /// Usage counters.
    pub fn stats(&self) -> HandleCacheStats {
        self.stats
    }

    /// Number of open handles.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_open_once_and_reuse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Cell_D_00000");
        std::fs::write(&path, b"FAB").unwrap();

        let mut cache = FileHandleCache::new(4096);
        assert!(cache.is_empty());

        let mut buf = [0u8; 3];
        cache.get(&path).unwrap().read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"FAB");
        cache.get(&path).unwrap();
        cache.get(&path).unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.stats(),
            HandleCacheStats {
                opens: 1,
                reuses: 2
            }
        );
    }

    #[test]
    fn test_separate_handles_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("Cell_D_00000");
        let b = dir.path().join("Cell_D_00001");
        std::fs::write(&a, b"AAA").unwrap();
        std::fs::write(&b, b"BBB").unwrap();

        let mut cache = FileHandleCache::new(16);
        let mut buf = [0u8; 3];
        cache.get(&a).unwrap().read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"AAA");
        cache.get(&b).unwrap().read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"BBB");
        cache.get(&a).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().opens, 2);
        assert_eq!(cache.stats().reuses, 1);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = FileHandleCache::new(4096);
        let err = cache.get(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, PlotfileError::OpenFailed { .. }));
        assert!(err.to_string().starts_with("Failed to open"));
        assert!(cache.is_empty());
    }
}
