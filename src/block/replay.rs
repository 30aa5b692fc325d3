//! Block directory and crash replay
//!
//! On startup every block file left in the directory is an unsealed block
//! whose index and filter were lost with the process. They can be replayed
//! object by object, or resealed by rebuilding the index from the bytes
//! already on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use uuid::Uuid;

use super::backing::BackingFile;
use super::index::IndexBuilder;
use super::naming::parse_block_file_name;
use super::{BlockFile, BlockWriter, ReplayBlock};
use crate::config::Config;
use crate::encoding::encoded_len;
use crate::error::{BlockError, Result};

/// The directory holding one file per block
pub struct BlockDir {
    config: Config,
}

impl BlockDir {
    /// Open or create the block directory
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    /// Open a block directory that must already exist; nothing is created
    pub fn open_existing(config: Config) -> Result<Self> {
        config.validate()?;
        if !fs::metadata(&config.data_dir)?.is_dir() {
            return Err(BlockError::Config(format!(
                "{} is not a directory",
                config.data_dir.display()
            )));
        }
        Ok(Self { config })
    }

    pub fn path(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start writing a new block with a fresh identifier
    pub fn new_block(&self, tenant_id: &str) -> Result<BlockWriter> {
        BlockWriter::create(&self.config, Uuid::new_v4(), tenant_id)
    }

    /// Every block file in the directory, sorted by file name.
    ///
    /// Files whose names do not parse are skipped.
    pub fn replay_blocks(&self) -> Result<Vec<UnsealedBlock>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.config.data_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();

        let mut blocks = Vec::with_capacity(paths.len());
        for path in paths {
            match UnsealedBlock::open(&path) {
                Ok(block) => blocks.push(block),
                Err(BlockError::InvalidFileName(name)) => {
                    tracing::warn!(file = %name, "skipping unrecognized file in block directory");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(dir = %self.config.data_dir.display(), blocks = blocks.len(), "found blocks to replay");
        Ok(blocks)
    }
}

/// A block file without an index: replay-only
pub struct UnsealedBlock {
    block_id: Uuid,
    tenant_id: String,
    backing: BackingFile,
}

impl UnsealedBlock {
    /// Wrap an existing block file, recovering its identity from the file name
    pub fn open(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| BlockError::InvalidFileName(path.display().to_string()))?;
        let (block_id, tenant_id) = parse_block_file_name(name)?;

        Ok(Self {
            block_id,
            tenant_id,
            backing: BackingFile::new(block_id, PathBuf::from(path)),
        })
    }

    pub fn path(&self) -> &Path {
        self.backing.path()
    }

    /// Rebuild index, filter and metadata from the stored objects and
    /// return the block sealed. The data itself is not rewritten.
    pub fn reseal(self, config: &Config) -> Result<BlockFile> {
        config.validate()?;

        let mut index = IndexBuilder::new(self.block_id, &self.tenant_id, config.records_per_span);
        let now = SystemTime::now();
        self.backing.open()?.scan(&mut |id: &[u8], payload: &[u8]| {
            index.push(id, encoded_len(id, payload), now)?;
            Ok(true)
        })?;

        let (meta, records, filter) = index.finish(config.bloom_fp_rate)?;

        tracing::info!(
            block_id = %self.block_id,
            tenant_id = %self.tenant_id,
            objects = meta.object_count,
            records = records.len(),
            "block resealed from replay"
        );

        Ok(BlockFile::from_parts(meta, records, filter, self.backing))
    }
}

impl ReplayBlock for UnsealedBlock {
    fn iterate(&self, visit: &mut dyn FnMut(&[u8], &[u8]) -> Result<bool>) -> Result<()> {
        self.backing.open()?.scan(visit)
    }

    fn block_id(&self) -> Uuid {
        self.block_id
    }

    fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    fn clear(&self) -> Result<()> {
        self.backing.clear()
    }
}
