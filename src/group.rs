//! Front-end state for assembling and splitting
//!
//! A front end keeps a list of share paths and a couple of numbers. Everything
//! it displays or enables is derived from those inputs by the pure functions
//! here, recomputed from scratch whenever the inputs change, so the screen
//! can never drift from the files on disk.

use std::path::{Path, PathBuf};

use crate::combiner;
use crate::commands::{get_horcruxes, validate_horcruxes};
use crate::domain::{ShareCount, SplitConfig};
use crate::error::{HorcruxError, Result};
use crate::splitter;
use crate::validator::GroupSummary;

/// Where a user-assembled group of shares stands
#[derive(Debug)]
pub enum GroupState {
    /// No shares selected
    Empty,
    /// Consistent, but fewer than `threshold` shares
    InsufficientShares { summary: GroupSummary },
    /// The shares cannot belong to one split
    Inconsistent { error: HorcruxError },
    /// Consistent and sufficient
    ReadyToCombine {
        summary: GroupSummary,
        destination: PathBuf,
    },
}

impl GroupState {
    /// Derives the state of the group made of `paths`
    ///
    /// Repeated paths count once. Only headers are read.
    ///
    /// # Errors
    /// Fails when a path cannot be opened or is not a horcrux at all; the
    /// front end reports that and keeps its previous list
    pub fn assess<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let paths = dedup_paths(paths);
        if paths.is_empty() {
            return Ok(Self::Empty);
        }

        let horcruxes = get_horcruxes(&paths)?;
        let summary = match validate_horcruxes(&horcruxes) {
            Ok(summary) => summary,
            Err(error) => return Ok(Self::Inconsistent { error }),
        };

        if !summary.is_sufficient() {
            return Ok(Self::InsufficientShares { summary });
        }
        let destination = combiner::default_destination(&horcruxes).ok_or_else(|| {
            HorcruxError::InvalidInput("No horcruxes provided".to_string())
        })?;
        Ok(Self::ReadyToCombine {
            summary,
            destination,
        })
    }

    /// Whether the combine action should be enabled
    #[must_use]
    pub fn can_combine(&self) -> bool {
        matches!(self, Self::ReadyToCombine { .. })
    }

    /// Agreed metadata, when the group is consistent
    #[must_use]
    pub fn summary(&self) -> Option<&GroupSummary> {
        match self {
            Self::InsufficientShares { summary } | Self::ReadyToCombine { summary, .. } => {
                Some(summary)
            }
            Self::Empty | Self::Inconsistent { .. } => None,
        }
    }

    /// Suggested destination for the reconstructed file
    #[must_use]
    pub fn destination(&self) -> Option<&Path> {
        match self {
            Self::ReadyToCombine { destination, .. } => Some(destination),
            _ => None,
        }
    }

    /// One line describing the state, for a status bar
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Empty => "No horcruxes selected".to_string(),
            Self::InsufficientShares { summary } => format!(
                "You have {} of the {} horcruxes required to resurrect {}",
                summary.present(),
                summary.threshold,
                summary.original_filename
            ),
            Self::Inconsistent { error } => error.to_string(),
            Self::ReadyToCombine {
                summary,
                destination,
            } => format!(
                "Ready to resurrect {} into {}",
                summary.original_filename,
                destination.display()
            ),
        }
    }
}

/// Keeps the first occurrence of every path, in order
#[must_use]
pub fn dedup_paths<P: AsRef<Path>>(paths: &[P]) -> Vec<PathBuf> {
    let mut unique: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        if !unique.iter().any(|seen| seen == path) {
            unique.push(path.to_path_buf());
        }
    }
    unique
}

/// Inputs of a split form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitForm {
    pub source: Option<PathBuf>,
    pub destination: Option<PathBuf>,
    pub shares: u8,
    pub threshold: u8,
}

/// What a split form should show and allow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReadiness {
    /// Threshold after clamping to the share count
    pub threshold: u8,
    /// Largest threshold the user may pick
    pub max_threshold: u8,
    /// Explicit destination, or the default next to the source
    pub destination: Option<PathBuf>,
    /// Present when the form can be submitted
    pub config: Option<SplitConfig>,
    pub problem: Option<String>,
}

impl SplitReadiness {
    #[must_use]
    pub fn can_split(&self) -> bool {
        self.config.is_some()
    }
}

impl SplitForm {
    /// Derives what the form should show; lowering the share count drags the
    /// threshold down with it
    #[must_use]
    pub fn assess(&self) -> SplitReadiness {
        let shares = self.shares.max(ShareCount::MIN);
        let threshold = self.threshold.clamp(1, shares);
        let destination = self.destination.clone().or_else(|| {
            self.source
                .as_deref()
                .map(splitter::default_output_dir)
        });

        let (config, problem) = match (&self.source, SplitConfig::from_counts(shares, threshold)) {
            (None, _) => (None, Some("Select a file to split".to_string())),
            (Some(_), Ok(config)) => (Some(config), None),
            (Some(_), Err(e)) => (None, Some(e.to_string())),
        };

        SplitReadiness {
            threshold,
            max_threshold: shares,
            destination,
            config,
            problem,
        }
    }
}
