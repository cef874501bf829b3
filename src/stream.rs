//! Bounded-memory streaming shared by the splitter and the combiner
//!
//! Reads happen in fixed-size chunks of a known total length, and every file
//! the library produces is staged in a temporary file next to its target and
//! only renamed into place once it is complete. Dropping a [`StagedFile`]
//! without committing it removes the temporary file, so an aborted operation
//! never leaves partial output behind.

use std::fs;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::warn;
use zeroize::Zeroizing;

use crate::error::{HorcruxError, Result};

/// Default chunk size: 64 KiB per stream
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Tuning knobs for the streaming loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    chunk_size: usize,
}

impl StreamOptions {
    /// # Errors
    /// Returns `InvalidInput` if `chunk_size` is zero
    pub fn new(chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(HorcruxError::InvalidInput(
                "Chunk size must be at least 1 byte".to_string(),
            ));
        }
        Ok(Self { chunk_size })
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Reads exactly `len` bytes from a reader, one chunk at a time
///
/// The chunk buffer is zeroized on drop since it may hold plaintext.
pub struct ChunkReader<R> {
    inner: R,
    remaining: u64,
    buf: Zeroizing<Vec<u8>>,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(inner: R, len: u64, options: StreamOptions) -> Self {
        let capacity = usize::try_from(len)
            .unwrap_or(usize::MAX)
            .min(options.chunk_size());
        Self {
            inner,
            remaining: len,
            buf: Zeroizing::new(vec![0u8; capacity]),
        }
    }

    /// Bytes not yet returned
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Returns the next chunk, or an empty slice once `len` bytes were read
    ///
    /// Every chunk except the last is exactly the configured chunk size, so
    /// readers over streams of equal length stay in lockstep.
    ///
    /// # Errors
    /// Fails with `UnexpectedEof` if the underlying reader ends early
    pub fn next_chunk(&mut self) -> io::Result<&[u8]> {
        let want = usize::try_from(self.remaining)
            .unwrap_or(usize::MAX)
            .min(self.buf.len());
        let chunk = &mut self.buf[..want];
        self.inner.read_exact(chunk)?;
        self.remaining -= want as u64;
        Ok(chunk)
    }
}

/// An output file that only appears at its target path once committed
pub struct StagedFile {
    target: PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl StagedFile {
    /// Creates the temporary file in the target's directory, so the final
    /// rename never crosses filesystems
    ///
    /// # Errors
    /// Any error creating the temporary file
    pub fn new(target: impl Into<PathBuf>) -> io::Result<Self> {
        let target = target.into();
        let dir = parent_dir(&target);
        let temp = tempfile::Builder::new()
            .prefix(".horcrux-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        Ok(Self {
            target,
            writer: BufWriter::new(temp),
        })
    }

    /// # Errors
    /// Any write error
    pub fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)
    }

    /// Overwrites the first `bytes.len()` bytes, leaving the write position at the end
    ///
    /// # Errors
    /// Any flush, seek or write error
    pub fn rewrite_prefix(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.flush()?;
        let file = self.writer.get_mut();
        file.seek(SeekFrom::Start(0))?;
        file.write_all(bytes)?;
        file.seek(SeekFrom::End(0))?;
        Ok(())
    }

    /// Flushes, syncs and renames the file to its target
    ///
    /// With `overwrite == false` an existing target is left alone and the
    /// error has kind `AlreadyExists`.
    ///
    /// # Errors
    /// Any flush, sync or rename error
    pub fn commit(self, overwrite: bool) -> io::Result<PathBuf> {
        let Self { target, writer } = self;
        let temp = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
        temp.as_file().sync_all()?;
        let persisted = if overwrite {
            temp.persist(&target)
        } else {
            temp.persist_noclobber(&target)
        };
        persisted.map_err(|e| e.error)?;
        Ok(target)
    }
}

/// Directories created to hold an operation's output
///
/// Kept so that a failed operation can take them away again instead of
/// leaving empty directories behind.
#[derive(Debug, Default)]
#[must_use]
pub struct CreatedDirs(Vec<PathBuf>);

impl CreatedDirs {
    /// Creates `dir` and any missing parents, remembering which ones are new
    ///
    /// # Errors
    /// Any error from creating the directories
    pub fn create(dir: &Path) -> io::Result<Self> {
        let missing = dir
            .ancestors()
            .take_while(|p| !p.as_os_str().is_empty() && !p.exists())
            .map(Path::to_path_buf)
            .collect();
        fs::create_dir_all(dir)?;
        Ok(Self(missing))
    }

    /// Removes the new directories, deepest first, stopping at the first one
    /// that cannot be removed (for example because something else wrote to it)
    pub fn remove(self) {
        for dir in &self.0 {
            if let Err(e) = fs::remove_dir(dir) {
                warn!(path = %dir.display(), error = %e, "failed to remove directory");
                return;
            }
        }
    }
}

/// Directory a path lives in, `.` for bare file names
#[must_use]
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
