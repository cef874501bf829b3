//! A share file on disk

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::codec::Header;
use crate::error::{HorcruxError, Result};

/// One horcrux: where it lives, what its header says, and where its payload starts
///
/// Loading a horcrux only reads its header; the payload is streamed later by
/// the combiner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Horcrux {
    path: PathBuf,
    header: Header,
    payload_offset: u64,
}

impl Horcrux {
    /// Reads the header of the share at `path` and checks the payload length
    ///
    /// # Errors
    /// - `Open` if the file cannot be opened or read
    /// - `InvalidInput` if the path is not a regular file
    /// - `Header` if it does not start with a valid header
    /// - `PayloadLength` if the payload is not exactly `file_size` bytes
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        // Opening a FIFO for reading blocks until a writer shows up
        let metadata = fs::metadata(&path).map_err(|source| HorcruxError::Open {
            path: path.clone(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(HorcruxError::InvalidInput(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let file = File::open(&path).map_err(|source| HorcruxError::Open {
            path: path.clone(),
            source,
        })?;
        let len = file
            .metadata()
            .map_err(|source| HorcruxError::Open {
                path: path.clone(),
                source,
            })?
            .len();

        let (header, header_len) = Header::read_from(&file, &path)?;
        let payload_offset = header_len as u64;
        let actual = len.saturating_sub(payload_offset);
        if actual != header.file_size {
            return Err(HorcruxError::PayloadLength {
                path,
                expected: header.file_size,
                actual,
            });
        }

        Ok(Self {
            path,
            header,
            payload_offset,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Byte offset of the first payload byte
    #[must_use]
    pub fn payload_offset(&self) -> u64 {
        self.payload_offset
    }
}
