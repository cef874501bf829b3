//! Content checksum and split identity

use std::fmt;

use rand::{CryptoRng, RngCore};
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

pub const CHECKSUM_LEN: usize = 32;

pub const SPLIT_ID_LEN: usize = 16;

/// SHA-256 digest of the original file
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checksum(pub [u8; CHECKSUM_LEN]);

impl Checksum {
    /// Digest of an in-memory buffer
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = ChecksumHasher::new();
        hasher.update(bytes);
        hasher.finalize()
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({self})")
    }
}

impl Serialize for Checksum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Incremental checksum over a stream of chunks
#[derive(Clone, Default)]
pub struct ChecksumHasher(Sha256);

impl ChecksumHasher {
    #[must_use]
    pub fn new() -> Self {
        Self(Sha256::new())
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.0.update(chunk);
    }

    #[must_use]
    pub fn finalize(self) -> Checksum {
        Checksum(self.0.finalize().into())
    }
}

/// Random identifier drawn once per split
///
/// Two splits of byte-identical files share a checksum, so this is what keeps
/// their shares from being mixed.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SplitId(pub [u8; SPLIT_ID_LEN]);

impl SplitId {
    /// # Errors
    /// Returns the RNG's error if it could not produce bytes
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, rand::Error> {
        let mut id = [0u8; SPLIT_ID_LEN];
        rng.try_fill_bytes(&mut id)?;
        Ok(Self(id))
    }
}

impl fmt::Display for SplitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for SplitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SplitId({self})")
    }
}

impl Serialize for SplitId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
