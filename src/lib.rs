//! Split a file into horcruxes so that any `threshold` of them bring it back
//!
//! Each horcrux holds a self-describing header followed by one Shamir share
//! of every byte of the original, computed over GF(256). No password is
//! involved: fewer than `threshold` horcruxes reveal nothing about the
//! content beyond its length.
//!
//! ```no_run
//! use std::path::Path;
//! use horcrux::domain::SplitConfig;
//!
//! let config = SplitConfig::from_counts(5, 3)?;
//! let shares = horcrux::split(Path::new("diary.txt"), Path::new("diary_horcruxes"), config)?;
//! horcrux::bind(&shares[..3], Path::new("diary_restored.txt"), false)?;
//! # Ok::<(), horcrux::HorcruxError>(())
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod codec;
pub mod combiner;
pub mod commands;
pub mod domain;
pub mod error;
pub mod gf256;
pub mod group;
pub mod share;
pub mod splitter;
pub mod stream;
pub mod validator;

pub use commands::{bind, bind_with, get_horcruxes, split, split_with, validate_horcruxes};
pub use error::{HorcruxError, Result};
pub use group::{GroupState, SplitForm, SplitReadiness};
pub use share::Horcrux;
pub use validator::GroupSummary;
