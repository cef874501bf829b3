//! Reconstructing the original file from horcruxes
//!
//! The first `threshold` shares are interpolated at `x = 0`, one byte
//! position at a time. Any further shares are used as witnesses: the same
//! polynomial is evaluated at their coordinate and must match what they hold.
//! The output is checked against the recorded SHA-256 before it is allowed to
//! appear at the destination.

use std::fs::{self, File};
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::domain::ChecksumHasher;
use crate::error::{HorcruxError, IntegrityError, IoStep, Result};
use crate::gf256::LagrangeWeights;
use crate::share::Horcrux;
use crate::stream::{ChunkReader, CreatedDirs, StagedFile, StreamOptions, parent_dir};
use crate::validator::GroupSummary;

/// Where a front end should put the reconstructed file unless told otherwise:
/// next to the first share, under the original file name
#[must_use]
pub fn default_destination(horcruxes: &[Horcrux]) -> Option<PathBuf> {
    let first = horcruxes.first()?;
    Some(parent_dir(first.path()).join(&first.header().original_filename))
}

/// Reconstructs the file described by `summary` from `horcruxes`
///
/// `horcruxes` must already have passed validation and produced `summary`.
///
/// # Errors
/// - `InsufficientShares` if fewer than `threshold` shares are supplied
/// - `InvalidInput` if `destination` is a directory or one of the shares
/// - `AlreadyExists` if `destination` exists and `overwrite` is false
/// - `Integrity` if a witness share disagrees or the checksum does not match
/// - `Open` / `Io` for filesystem failures
pub fn reconstruct(
    horcruxes: &[Horcrux],
    summary: &GroupSummary,
    destination: &Path,
    overwrite: bool,
    options: StreamOptions,
) -> Result<()> {
    let need = usize::from(summary.threshold);
    if horcruxes.len() < need {
        return Err(HorcruxError::InsufficientShares {
            have: horcruxes.len(),
            need: summary.threshold,
        });
    }

    check_destination(horcruxes, destination, overwrite)?;

    let (basis, witnesses) = horcruxes.split_at(need);
    let xs: Vec<u8> = basis.iter().map(|h| *h.header().index).collect();
    let at_zero = LagrangeWeights::new(&xs, 0).ok_or_else(|| {
        HorcruxError::InvalidInput("horcruxes must have distinct indices".to_string())
    })?;
    let mut witness_weights = Vec::with_capacity(witnesses.len());
    for witness in witnesses {
        let x = *witness.header().index;
        let weights = LagrangeWeights::new(&xs, x).ok_or_else(|| {
            HorcruxError::InvalidInput("horcruxes must have distinct indices".to_string())
        })?;
        witness_weights.push((x, weights));
    }
    let interpolation = Interpolation {
        need,
        at_zero,
        witnesses: witness_weights,
    };

    debug!(
        destination = %destination.display(),
        file_size = summary.file_size,
        basis = ?xs,
        witnesses = witnesses.len(),
        chunk_size = options.chunk_size(),
        "binding"
    );

    let mut readers = horcruxes
        .iter()
        .map(|horcrux| open_payload(horcrux, summary.file_size, options))
        .collect::<Result<Vec<_>>>()?;

    let dir = parent_dir(destination);
    let created_dirs = CreatedDirs::create(dir)
        .map_err(HorcruxError::io(IoStep::CreateDirectory(dir.to_path_buf())))?;
    let written = match interpolation.write(&mut readers, summary, destination, overwrite, options)
    {
        Ok(written) => written,
        Err(e) => {
            created_dirs.remove();
            return Err(e);
        }
    };

    info!(
        destination = %destination.display(),
        bytes = written,
        shares = horcruxes.len(),
        "reconstructed original file"
    );
    Ok(())
}

/// Lagrange weights for the basis shares at zero and at every witness
struct Interpolation {
    need: usize,
    at_zero: LagrangeWeights,
    witnesses: Vec<(u8, LagrangeWeights)>,
}

impl Interpolation {
    /// Streams the payloads into a staged destination, verifies the result
    /// and commits it; returns the number of bytes written
    fn write(
        &self,
        readers: &mut [(ChunkReader<File>, &Path)],
        summary: &GroupSummary,
        destination: &Path,
        overwrite: bool,
        options: StreamOptions,
    ) -> Result<u64> {
        let write_step = || IoStep::WriteDestination(destination.to_path_buf());
        let mut output = StagedFile::new(destination).map_err(HorcruxError::io(write_step()))?;

        let mut plain = Zeroizing::new(Vec::with_capacity(options.chunk_size()));
        let mut hasher = ChecksumHasher::new();
        let mut offset = 0u64;

        loop {
            let chunks = readers
                .iter_mut()
                .map(|(reader, path)| {
                    reader
                        .next_chunk()
                        .map_err(HorcruxError::io(IoStep::ReadShare(path.to_path_buf())))
                })
                .collect::<Result<Vec<&[u8]>>>()?;
            let len = chunks[0].len();
            if len == 0 {
                break;
            }
            let (basis_chunks, witness_chunks) = chunks.split_at(self.need);

            plain.clear();
            for i in 0..len {
                plain.push(self.at_zero.interpolate(basis_chunks.iter().map(|c| c[i])));

                for ((x, weights), chunk) in self.witnesses.iter().zip(witness_chunks) {
                    let predicted = weights.interpolate(basis_chunks.iter().map(|c| c[i]));
                    if predicted != chunk[i] {
                        return Err(IntegrityError::ShareDisagreement {
                            index: *x,
                            offset: offset + i as u64,
                        }
                        .into());
                    }
                }
            }

            hasher.update(&plain);
            output
                .write_all(&plain)
                .map_err(HorcruxError::io(write_step()))?;
            offset += len as u64;
        }

        let actual = hasher.finalize();
        if actual != summary.checksum {
            return Err(IntegrityError::ChecksumMismatch {
                expected: summary.checksum,
                actual,
            }
            .into());
        }

        output.commit(overwrite).map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                HorcruxError::AlreadyExists {
                    path: destination.to_path_buf(),
                }
            } else {
                HorcruxError::Io {
                    step: write_step(),
                    source: e,
                }
            }
        })?;
        Ok(offset)
    }
}

fn check_destination(horcruxes: &[Horcrux], destination: &Path, overwrite: bool) -> Result<()> {
    if destination.is_dir() {
        return Err(HorcruxError::InvalidInput(format!(
            "{} is a directory",
            destination.display()
        )));
    }
    if !destination.exists() {
        return Ok(());
    }
    if !overwrite {
        return Err(HorcruxError::AlreadyExists {
            path: destination.to_path_buf(),
        });
    }
    let target = fs::canonicalize(destination).ok();
    let clobbers_share = horcruxes
        .iter()
        .any(|h| target.is_some() && fs::canonicalize(h.path()).ok() == target);
    if clobbers_share {
        return Err(HorcruxError::InvalidInput(format!(
            "{} is one of the horcruxes being combined",
            destination.display()
        )));
    }
    Ok(())
}

fn open_payload(
    horcrux: &Horcrux,
    file_size: u64,
    options: StreamOptions,
) -> Result<(ChunkReader<File>, &Path)> {
    let path = horcrux.path();
    let mut file = File::open(path).map_err(|source| HorcruxError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    file.seek(SeekFrom::Start(horcrux.payload_offset()))
        .map_err(HorcruxError::io(IoStep::ReadShare(path.to_path_buf())))?;
    Ok((ChunkReader::new(file, file_size, options), path))
}
