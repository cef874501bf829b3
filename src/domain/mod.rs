//! Domain types for threshold file splitting
//!
//! This module contains validated newtypes used by every other layer:
//! - [`Threshold`] - Minimum shares required for reconstruction (1..=255)
//! - [`ShareCount`] - Total number of shares to create (1..=255)
//! - [`ShareIndex`] - Share identifier and its field x-coordinate (1..=255)
//! - [`SplitConfig`] - Validated threshold and share count pair
//! - [`Checksum`] / [`SplitId`] - Digest of the original file and the identity of one split

mod config;
mod digest;
mod share_count;
mod share_index;
mod threshold;

pub use config::SplitConfig;
pub use digest::{CHECKSUM_LEN, Checksum, ChecksumHasher, SPLIT_ID_LEN, SplitId};
pub use share_count::ShareCount;
pub use share_index::ShareIndex;
pub use threshold::Threshold;
