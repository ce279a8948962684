//! Configuration for the plotfile reader.

use serde::{Deserialize, Serialize};

/// Configuration for locating and reading plotfile components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Directory of the (only) level inside the plotfile.
    pub level_dir: String,

    /// Name of the plotfile-level text header.
    pub header_file: String,

    /// Name of the level's VisMF header inside `level_dir`.
    pub cell_header_file: String,

    /// Upper bound on the text prefix of a FAB record, in bytes.
    pub max_fab_header_len: usize,

    /// Read buffer size for data file handles in kilobytes.
    pub read_buffer_kb: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            level_dir: "Level_0".to_string(),
            header_file: "Header".to_string(),
            cell_header_file: "Cell_H".to_string(),
            max_fab_header_len: 4096,
            read_buffer_kb: 64,
        }
    }
}

impl ReaderConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("PLOTFILE_LEVEL_DIR") {
            config.level_dir = val;
        }

        if let Ok(val) = std::env::var("PLOTFILE_HEADER_FILE") {
            config.header_file = val;
        }

        if let Ok(val) = std::env::var("PLOTFILE_CELL_HEADER_FILE") {
            config.cell_header_file = val;
        }

        if let Ok(val) = std::env::var("PLOTFILE_FAB_HEADER_LIMIT") {
            if let Ok(limit) = val.parse() {
                config.max_fab_header_len = limit;
            }
        }

        if let Ok(val) = std::env::var("PLOTFILE_READ_BUFFER_KB") {
            if let Ok(size) = val.parse() {
                config.read_buffer_kb = size;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.level_dir.is_empty() {
            return Err("level_dir must not be empty".to_string());
        }

        if self.header_file.is_empty() || self.cell_header_file.is_empty() {
            return Err("header file names must not be empty".to_string());
        }

        if self.max_fab_header_len < 16 {
            return Err("max_fab_header_len must be >= 16".to_string());
        }

        if self.read_buffer_kb == 0 {
            return Err("read_buffer_kb must be > 0".to_string());
        }

        Ok(())
    }

    /// Read buffer size in bytes.
    pub fn read_buffer_bytes(&self) -> usize {
        self.read_buffer_kb * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReaderConfig::default();
        assert_eq!(config.level_dir, "Level_0");
        assert_eq!(config.header_file, "Header");
        assert_eq!(config.cell_header_file, "Cell_H");
        assert_eq!(config.max_fab_header_len, 4096);
        assert_eq!(config.read_buffer_bytes(), 64 * 1024);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ReaderConfig::default();
        assert!(config.validate().is_ok());

        config.level_dir.clear();
        assert!(config.validate().is_err());

        config = ReaderConfig::default();
        config.max_fab_header_len = 8;
        assert!(config.validate().is_err());

        config = ReaderConfig::default();
        config.read_buffer_kb = 0;
        assert!(config.validate().is_err());

        config = ReaderConfig::default();
        config.cell_header_file.clear();
        assert!(config.validate().is_err());
    }
}
