//! Error types shared by every horcrux operation

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::Checksum;

/// Result alias used throughout the library
pub type Result<T, E = HorcruxError> = std::result::Result<T, E>;

/// Reasons a share header could not be decoded
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// The magic prefix does not match, so this is not a horcrux at all
    #[error("not a horcrux file (bad magic bytes)")]
    BadMagic,

    #[error("unsupported horcrux format version {0}")]
    UnsupportedVersion(u8),

    /// A field decoded but holds a value that can never appear in a valid share
    #[error("malformed header: {0}")]
    Malformed(String),

    #[error("header checksum mismatch: expected 0x{expected:08x}, got 0x{actual:08x}")]
    CrcMismatch { expected: u32, actual: u32 },

    #[error("header truncated: need {needed} bytes, only {available} available")]
    Truncated { needed: usize, available: usize },
}

impl HeaderError {
    /// True when the bytes simply ran out, as opposed to being the wrong format
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}

/// Header field that two shares of one group disagreed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderField {
    OriginalFilename,
    FileSize,
    Checksum,
    Total,
    Threshold,
    SplitId,
    ShareIndex,
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OriginalFilename => "original filename",
            Self::FileSize => "file size",
            Self::Checksum => "checksum",
            Self::Total => "total",
            Self::Threshold => "threshold",
            Self::SplitId => "split id",
            Self::ShareIndex => "share index",
        };
        f.write_str(name)
    }
}

/// Reconstruction produced bytes that cannot be trusted
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("reconstructed file checksum {actual} does not match recorded checksum {expected}")]
    ChecksumMismatch { expected: Checksum, actual: Checksum },

    /// An extra share does not lie on the polynomial defined by the others
    #[error("share {index} disagrees with the other shares at byte offset {offset}")]
    ShareDisagreement { index: u8, offset: u64 },
}

/// The step of a split or bind that hit an I/O fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoStep {
    ReadSource(PathBuf),
    WriteShare { index: u8, path: PathBuf },
    ReadShare(PathBuf),
    WriteDestination(PathBuf),
    CreateDirectory(PathBuf),
    Entropy,
}

impl fmt::Display for IoStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadSource(path) => write!(f, "reading source {}", path.display()),
            Self::WriteShare { index, path } => {
                write!(f, "writing share {index} to {}", path.display())
            }
            Self::ReadShare(path) => write!(f, "reading share {}", path.display()),
            Self::WriteDestination(path) => write!(f, "writing {}", path.display()),
            Self::CreateDirectory(path) => write!(f, "creating directory {}", path.display()),
            Self::Entropy => f.write_str("gathering randomness"),
        }
    }
}

/// Every failure a horcrux operation can report
#[derive(Debug, Error)]
pub enum HorcruxError {
    /// Bad share counts, wrong path type, empty input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Header {
        path: PathBuf,
        #[source]
        source: HeaderError,
    },

    #[error("{}: payload is {actual} bytes, header promises {expected}", .path.display())]
    PayloadLength {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("horcruxes do not belong together: {} has a different {field}", .path.display())]
    InconsistentSet { field: HeaderField, path: PathBuf },

    #[error("duplicate horcrux {index}: {} and {}", .first.display(), .second.display())]
    DuplicateShare {
        index: u8,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("insufficient horcruxes: need at least {need}, but only {have} provided")]
    InsufficientShares { have: usize, need: u8 },

    /// The destination exists and overwriting was not requested
    #[error("{} already exists", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error("I/O failure while {step}: {source}")]
    Io {
        step: IoStep,
        #[source]
        source: io::Error,
    },
}

impl HorcruxError {
    pub(crate) fn io(step: IoStep) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Io { step, source }
    }

    /// `AlreadyExists` is the only error a caller is expected to recover from
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}
