use std::path::{Path, PathBuf};

use tracing::debug;

use crate::combiner;
use crate::domain::SplitConfig;
use crate::error::{HorcruxError, Result};
use crate::share::Horcrux;
use crate::splitter;
use crate::stream::StreamOptions;
use crate::validator::{self, GroupSummary, ValidationError};

/// Load the headers of every share in `paths`
///
/// Only headers are read; payloads are left for [`bind`].
///
/// # Errors
/// Returns the first path that cannot be opened or is not a valid horcrux
pub fn get_horcruxes<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Horcrux>> {
    paths
        .iter()
        .map(|path| Horcrux::open(path.as_ref()))
        .collect()
}

/// Check that `horcruxes` all come from the same split
///
/// Succeeds with the agreed metadata even when there are not enough shares
/// yet; use [`GroupSummary::is_sufficient`] to tell.
///
/// # Errors
/// `InvalidInput` for an empty list, `InconsistentSet` naming the first
/// differing field and the share that differs, or `DuplicateShare`
pub fn validate_horcruxes(horcruxes: &[Horcrux]) -> Result<GroupSummary> {
    validator::validate_headers(horcruxes.iter().map(Horcrux::header)).map_err(|e| match e {
        ValidationError::Empty => HorcruxError::InvalidInput("No horcruxes provided".to_string()),
        ValidationError::Inconsistent { field, position } => HorcruxError::InconsistentSet {
            field,
            path: horcruxes[position].path().to_path_buf(),
        },
        ValidationError::Duplicate {
            index,
            first,
            second,
        } => HorcruxError::DuplicateShare {
            index,
            first: horcruxes[first].path().to_path_buf(),
            second: horcruxes[second].path().to_path_buf(),
        },
    })
}

/// Split the file at `source` into horcruxes inside `destination_dir`
///
/// Returns the paths of the created shares in index order.
///
/// # Errors
/// See [`splitter::split_with_rng`]
pub fn split(source: &Path, destination_dir: &Path, config: SplitConfig) -> Result<Vec<PathBuf>> {
    splitter::split(source, destination_dir, config)
}

/// [`split`] with explicit streaming options
///
/// # Errors
/// See [`splitter::split_with_rng`]
pub fn split_with(
    source: &Path,
    destination_dir: &Path,
    config: SplitConfig,
    options: StreamOptions,
) -> Result<Vec<PathBuf>> {
    splitter::split_with(source, destination_dir, config, options)
}

/// Recombine the horcruxes at `share_paths` into `destination`
///
/// When `destination` exists and `overwrite` is false this fails with
/// `AlreadyExists` without touching it; a front end asks the user and calls
/// again with `overwrite` set.
///
/// # Errors
/// - `InvalidInput` for an empty list
/// - any error from [`get_horcruxes`] or [`validate_horcruxes`]
/// - `InsufficientShares` before any reconstruction work
/// - `AlreadyExists`, `Integrity`, `Io` from reconstruction
pub fn bind<P: AsRef<Path>>(share_paths: &[P], destination: &Path, overwrite: bool) -> Result<()> {
    bind_with(share_paths, destination, overwrite, StreamOptions::default())
}

/// [`bind`] with explicit streaming options
///
/// # Errors
/// See [`bind`]
pub fn bind_with<P: AsRef<Path>>(
    share_paths: &[P],
    destination: &Path,
    overwrite: bool,
    options: StreamOptions,
) -> Result<()> {
    if share_paths.is_empty() {
        return Err(HorcruxError::InvalidInput(
            "No horcruxes provided".to_string(),
        ));
    }

    let horcruxes = get_horcruxes(share_paths)?;
    let summary = validate_horcruxes(&horcruxes)?;
    if !summary.is_sufficient() {
        return Err(HorcruxError::InsufficientShares {
            have: summary.present(),
            need: summary.threshold,
        });
    }

    debug!(
        original = %summary.original_filename,
        present = summary.present(),
        threshold = summary.threshold,
        total = summary.total,
        "horcruxes validated"
    );
    combiner::reconstruct(&horcruxes, &summary, destination, overwrite, options)
}
