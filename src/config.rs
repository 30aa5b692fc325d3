//! Configuration for traceblock
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{BlockError, Result};

/// Main configuration for the block layer
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding one file per block.
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── {block_id}+{tenant_id}
    ///     └── ...
    pub data_dir: PathBuf,

    /// fsync the block file before it is sealed
    pub fsync_on_seal: bool,

    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// Objects per index record. 1 gives a dense index; larger values trade
    /// a longer span scan for a smaller index.
    pub records_per_span: usize,

    // -------------------------------------------------------------------------
    // Filter Configuration
    // -------------------------------------------------------------------------
    /// Target false positive rate of the per-block bloom filter
    pub bloom_fp_rate: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./traceblock_data"),
            fsync_on_seal: true,
            records_per_span: 100,
            bloom_fp_rate: 0.01,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the values can actually be used to build blocks
    pub fn validate(&self) -> Result<()> {
        if self.records_per_span == 0 {
            return Err(BlockError::Config(
                "records_per_span must be at least 1".to_string(),
            ));
        }
        if !(self.bloom_fp_rate > 0.0 && self.bloom_fp_rate < 1.0) {
            return Err(BlockError::Config(format!(
                "bloom_fp_rate must be in (0, 1), got {}",
                self.bloom_fp_rate
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the block directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set whether seal fsyncs the block file
    pub fn fsync_on_seal(mut self, enabled: bool) -> Self {
        self.config.fsync_on_seal = enabled;
        self
    }

    /// Set the number of objects covered by each index record
    pub fn records_per_span(mut self, count: usize) -> Self {
        self.config.records_per_span = count;
        self
    }

    /// Set the bloom filter false positive rate
    pub fn bloom_fp_rate(mut self, rate: f64) -> Self {
        self.config.bloom_fp_rate = rate;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
