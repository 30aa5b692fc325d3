//! Backing file of a block
//!
//! Owns the path, the open/cleared state and the lazily opened read handle.
//!
//! ## Concurrency:
//! - `state`: RwLock. Reads hold the shared side for their whole duration;
//!   `clear` takes the exclusive side, so it waits for in-flight reads and
//!   no read can start once the block is cleared. Shared acquisitions are
//!   recursive: a lookup issued from inside a scan must not queue behind a
//!   pending `clear` that is itself waiting on the scan.
//! - `reader`: Mutex around the single assignment of the lazy handle. Span
//!   reads use positional I/O, so one handle serves concurrent lookups.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::{MappedRwLockReadGuard, Mutex, RwLock, RwLockReadGuard};
use uuid::Uuid;

use crate::encoding::ObjectReader;
use crate::error::{BlockError, Result};

enum FileState {
    Open { reader: Mutex<Option<Arc<File>>> },
    Cleared,
}

pub(crate) struct BackingFile {
    block_id: Uuid,
    path: PathBuf,
    state: RwLock<FileState>,
}

/// Shared access to an open backing file; holding it keeps `clear` out
pub(crate) struct OpenFile<'a> {
    path: &'a Path,
    reader: MappedRwLockReadGuard<'a, Mutex<Option<Arc<File>>>>,
}

impl BackingFile {
    pub(crate) fn new(block_id: Uuid, path: PathBuf) -> Self {
        Self {
            block_id,
            path,
            state: RwLock::new(FileState::Open {
                reader: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn is_cleared(&self) -> bool {
        matches!(*self.state.read_recursive(), FileState::Cleared)
    }

    /// Begin a read, failing if the block was cleared
    pub(crate) fn open(&self) -> Result<OpenFile<'_>> {
        let reader = RwLockReadGuard::try_map(self.state.read_recursive(), |state| match state {
            FileState::Open { reader } => Some(reader),
            FileState::Cleared => None,
        })
        .map_err(|_| BlockError::Cleared {
            block_id: self.block_id,
        })?;

        Ok(OpenFile {
            path: &self.path,
            reader,
        })
    }

    /// Close the lazy handle and remove the file.
    ///
    /// If removal fails the block stays usable and `clear` may be called
    /// again.
    pub(crate) fn clear(&self) -> Result<()> {
        let mut state = self.state.write();
        match &mut *state {
            FileState::Cleared => Err(BlockError::Cleared {
                block_id: self.block_id,
            }),
            FileState::Open { reader } => {
                // Readers only clone the handle under the shared lock, so
                // this is the last reference and dropping it closes the file.
                drop(reader.get_mut().take());
                fs::remove_file(&self.path)?;
                *state = FileState::Cleared;
                tracing::info!(block_id = %self.block_id, path = %self.path.display(), "block cleared");
                Ok(())
            }
        }
    }
}

impl OpenFile<'_> {
    /// Read `length` bytes at `start` through the shared lazy handle
    pub(crate) fn read_span(&self, start: u64, length: u32) -> Result<Bytes> {
        let file = self.handle()?;

        let mut buf = vec![0u8; length as usize];
        read_exact_at(&file, &mut buf, start).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                BlockError::Corruption(format!(
                    "span [{}, {}) extends past end of {}",
                    start,
                    start + u64::from(length),
                    self.path.display()
                ))
            } else {
                BlockError::Io(e)
            }
        })?;

        Ok(Bytes::from(buf))
    }

    /// Decode the whole file from the start through a fresh handle.
    /// The handle is closed before returning.
    pub(crate) fn scan(&self, visit: &mut dyn FnMut(&[u8], &[u8]) -> Result<bool>) -> Result<()> {
        let file = File::open(self.path)?;
        ObjectReader::new(BufReader::new(file)).visit_each(visit)
    }

    fn handle(&self) -> Result<Arc<File>> {
        let mut slot = self.reader.lock();
        if let Some(file) = slot.as_ref() {
            return Ok(Arc::clone(file));
        }

        let file = Arc::new(File::open(self.path)?);
        tracing::debug!(path = %self.path.display(), "opened block read handle");
        *slot = Some(Arc::clone(&file));
        Ok(file)
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "failed to fill whole buffer",
                ))
            }
            Ok(n) => {
                buf = &mut buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
