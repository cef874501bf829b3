//! Share header format
//!
//! Every horcrux file starts with a self-describing header followed by the
//! payload. The header is length-delimited on its own, so it can be decoded
//! without touching a single payload byte; inspecting a group of shares is
//! cheap no matter how large the original file was.
//!
//! # Layout
//!
//! All integers are big-endian.
//!
//! | Field             | Size                         |
//! |-------------------|------------------------------|
//! | magic `HRCX`      | 4                            |
//! | format version    | 1                            |
//! | filename length   | 2                            |
//! | filename (UTF-8)  | filename length (1..=1024)   |
//! | created at (Unix) | 8                            |
//! | split id          | 16                           |
//! | file size         | 8                            |
//! | total             | 1                            |
//! | threshold         | 1                            |
//! | share index       | 1                            |
//! | SHA-256 checksum  | 32                           |
//! | header CRC-32     | 4                            |
//!
//! The trailing CRC covers every header byte before it, so a damaged header
//! is reported as such instead of surfacing later as a confusing mismatch.
//!
//! # Examples
//!
//! ```rust
//! use horcrux::codec::Header;
//! use horcrux::domain::{Checksum, ShareCount, ShareIndex, SplitId, Threshold};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let header = Header {
//!     original_filename: "report.pdf".to_string(),
//!     created_at: 1_700_000_000,
//!     split_id: SplitId([7; 16]),
//!     file_size: 1024,
//!     total: ShareCount::new(5)?,
//!     threshold: Threshold::new(3)?,
//!     index: ShareIndex::new(2)?,
//!     checksum: Checksum::of(b"pretend this is the file"),
//! };
//!
//! let bytes = header.encode();
//! assert!(bytes.starts_with(b"HRCX"));
//!
//! let (decoded, consumed) = Header::decode(&bytes)?;
//! assert_eq!(decoded, header);
//! assert_eq!(consumed, bytes.len());
//! # Ok(())
//! # }
//! ```

use std::io::Read;
use std::path::Path;

use crc::{CRC_32_ISO_HDLC, Crc};

use crate::domain::{
    CHECKSUM_LEN, Checksum, SPLIT_ID_LEN, ShareCount, ShareIndex, SplitId, Threshold,
};
use crate::error::{HeaderError, HorcruxError, Result};

/// CRC32 algorithm for header integrity checking
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

pub const MAGIC: [u8; 4] = *b"HRCX";

pub const FORMAT_VERSION: u8 = 1;

pub const MAX_FILENAME_LEN: usize = 1024;

/// Everything except the filename
const FIXED_LEN: usize = MAGIC.len() + 1 + 2 + 8 + SPLIT_ID_LEN + 8 + 3 + CHECKSUM_LEN + 4;

/// Upper bound on the size of any valid header
pub const MAX_HEADER_LEN: usize = FIXED_LEN + MAX_FILENAME_LEN;

/// Metadata block prefixed to every share
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// File name (no directories) of the split file
    pub original_filename: String,
    /// Unix seconds at which the split happened
    pub created_at: u64,
    pub split_id: SplitId,
    /// Length of the original file, and of this share's payload
    pub file_size: u64,
    pub total: ShareCount,
    pub threshold: Threshold,
    pub index: ShareIndex,
    pub checksum: Checksum,
}

impl Header {
    /// Number of bytes `encode` produces
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        FIXED_LEN + self.original_filename.len()
    }

    /// Serializes the header, CRC included
    ///
    /// The filename is expected to satisfy [`validate_filename`]; the splitter
    /// checks it before any header is built.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let name = self.original_filename.as_bytes();
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&MAGIC);
        out.push(FORMAT_VERSION);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "filename length is validated to be <= MAX_FILENAME_LEN"
        )]
        let name_len = name.len() as u16;
        out.extend_from_slice(&name_len.to_be_bytes());
        out.extend_from_slice(name);
        out.extend_from_slice(&self.created_at.to_be_bytes());
        out.extend_from_slice(&self.split_id.0);
        out.extend_from_slice(&self.file_size.to_be_bytes());
        out.push(*self.total);
        out.push(*self.threshold);
        out.push(*self.index);
        out.extend_from_slice(&self.checksum.0);
        let crc = CRC32.checksum(&out);
        out.extend_from_slice(&crc.to_be_bytes());
        out
    }

    /// Decodes a header from the front of `bytes`
    ///
    /// Returns the header and the number of bytes it occupied; anything after
    /// that is payload and is never looked at.
    ///
    /// # Errors
    /// `Truncated` when `bytes` ends before the header does, otherwise a
    /// format error (`BadMagic`, `UnsupportedVersion`, `CrcMismatch`, `Malformed`)
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), HeaderError> {
        let mut cursor = Cursor { bytes, pos: 0 };

        let magic = cursor.take(MAGIC.len())?;
        if magic != MAGIC {
            return Err(HeaderError::BadMagic);
        }
        let version = cursor.u8()?;
        if version != FORMAT_VERSION {
            return Err(HeaderError::UnsupportedVersion(version));
        }

        let name_len = usize::from(u16::from_be_bytes(cursor.array()?));
        if name_len == 0 || name_len > MAX_FILENAME_LEN {
            return Err(HeaderError::Malformed(format!(
                "filename length {name_len} outside 1..={MAX_FILENAME_LEN}"
            )));
        }
        let name = cursor.take(name_len)?;
        let created_at = u64::from_be_bytes(cursor.array()?);
        let split_id = SplitId(cursor.array()?);
        let file_size = u64::from_be_bytes(cursor.array()?);
        let total = cursor.u8()?;
        let threshold = cursor.u8()?;
        let index = cursor.u8()?;
        let checksum = Checksum(cursor.array()?);

        let covered = cursor.pos;
        let stored_crc = u32::from_be_bytes(cursor.array()?);
        let actual_crc = CRC32.checksum(&bytes[..covered]);
        if stored_crc != actual_crc {
            return Err(HeaderError::CrcMismatch {
                expected: stored_crc,
                actual: actual_crc,
            });
        }

        let original_filename = std::str::from_utf8(name)
            .map_err(|_| HeaderError::Malformed("filename is not valid UTF-8".to_string()))?
            .to_string();
        validate_filename(&original_filename).map_err(HeaderError::Malformed)?;

        let total = ShareCount::new(total)
            .map_err(|_| HeaderError::Malformed("total is zero".to_string()))?;
        let threshold = Threshold::new(threshold)
            .map_err(|_| HeaderError::Malformed("threshold is zero".to_string()))?;
        if *threshold > *total {
            return Err(HeaderError::Malformed(format!(
                "threshold {} exceeds total {}",
                *threshold, *total
            )));
        }
        let index = ShareIndex::new(index)
            .map_err(|_| HeaderError::Malformed("share index is zero".to_string()))?;
        if *index > *total {
            return Err(HeaderError::Malformed(format!(
                "share index {} exceeds total {}",
                *index, *total
            )));
        }

        let header = Self {
            original_filename,
            created_at,
            split_id,
            file_size,
            total,
            threshold,
            index,
            checksum,
        };
        Ok((header, cursor.pos))
    }

    /// Reads and decodes the header at the start of `reader`
    ///
    /// Reads at most [`MAX_HEADER_LEN`] bytes. `path` is only used to give
    /// errors context.
    ///
    /// # Errors
    /// `Open` if reading fails, `Header` if the bytes are not a valid header
    pub fn read_from<R: Read>(reader: R, path: &Path) -> Result<(Self, usize)> {
        let mut prefix = Vec::with_capacity(MAX_HEADER_LEN);
        reader
            .take(MAX_HEADER_LEN as u64)
            .read_to_end(&mut prefix)
            .map_err(|source| HorcruxError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        Self::decode(&prefix).map_err(|source| HorcruxError::Header {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Checks that `name` can be stored as an original filename
///
/// Only a bare file name is allowed. A share must never be able to steer
/// reconstruction into another directory.
///
/// # Errors
/// Returns a description of the problem
pub fn validate_filename(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("filename is empty".to_string());
    }
    if name.len() > MAX_FILENAME_LEN {
        return Err(format!(
            "filename is {} bytes, maximum is {MAX_FILENAME_LEN}",
            name.len()
        ));
    }
    if name == "." || name == ".." {
        return Err(format!("'{name}' is not a file name"));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(format!("filename '{name}' contains a path separator"));
    }
    Ok(())
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], HeaderError> {
        let end = self.pos + n;
        let slice = self.bytes.get(self.pos..end).ok_or(HeaderError::Truncated {
            needed: end,
            available: self.bytes.len(),
        })?;
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], HeaderError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, HeaderError> {
        Ok(self.take(1)?[0])
    }
}
