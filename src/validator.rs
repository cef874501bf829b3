//! Cross-share validation
//!
//! A group of headers is acceptable when every header describes the same
//! split and no share index appears twice. Having too few shares is not a
//! validation failure: the summary says how many are present and how many
//! are needed, and callers decide what to do about it.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::codec::Header;
use crate::domain::{Checksum, SplitId};
use crate::error::HeaderField;

/// What a consistent group of shares agrees on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub original_filename: String,
    pub file_size: u64,
    pub total: u8,
    pub threshold: u8,
    pub checksum: Checksum,
    pub split_id: SplitId,
    /// Distinct share indices present, in the order supplied
    pub indices: Vec<u8>,
}

impl GroupSummary {
    /// Number of shares in the group
    #[must_use]
    pub fn present(&self) -> usize {
        self.indices.len()
    }

    /// Whether the group can be combined
    #[must_use]
    pub fn is_sufficient(&self) -> bool {
        self.present() >= usize::from(self.threshold)
    }

    /// Shares still needed before the group can be combined
    #[must_use]
    pub fn missing(&self) -> usize {
        usize::from(self.threshold).saturating_sub(self.present())
    }
}

/// Why a group of headers cannot belong to one split
///
/// Positions are 0-based indices into the supplied headers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no horcruxes supplied")]
    Empty,

    #[error("horcrux #{} has a different {field}", .position + 1)]
    Inconsistent { field: HeaderField, position: usize },

    #[error("horcrux #{} and #{} are both share {index}", .first + 1, .second + 1)]
    Duplicate {
        index: u8,
        first: usize,
        second: usize,
    },
}

/// Checks that `headers` are mutually consistent
///
/// Fields are compared against the first header in the order filename, file
/// size, checksum, total, threshold, split id; the first disagreement wins.
///
/// # Errors
/// `Empty`, `Inconsistent` naming the field, or `Duplicate` naming both positions
pub fn validate_headers<'a, I>(headers: I) -> Result<GroupSummary, ValidationError>
where
    I: IntoIterator<Item = &'a Header>,
{
    let mut headers = headers.into_iter().enumerate();
    let Some((_, first)) = headers.next() else {
        return Err(ValidationError::Empty);
    };
    check_index(first, first, 0)?;

    let mut seen = HashMap::from([(*first.index, 0usize)]);
    let mut indices = vec![*first.index];

    for (position, header) in headers {
        if let Some(field) = first_mismatch(first, header) {
            return Err(ValidationError::Inconsistent { field, position });
        }
        check_index(first, header, position)?;
        if let Some(&earlier) = seen.get(&*header.index) {
            return Err(ValidationError::Duplicate {
                index: *header.index,
                first: earlier,
                second: position,
            });
        }
        seen.insert(*header.index, position);
        indices.push(*header.index);
    }

    Ok(GroupSummary {
        original_filename: first.original_filename.clone(),
        file_size: first.file_size,
        total: *first.total,
        threshold: *first.threshold,
        checksum: first.checksum,
        split_id: first.split_id,
        indices,
    })
}

fn first_mismatch(reference: &Header, other: &Header) -> Option<HeaderField> {
    if reference.original_filename != other.original_filename {
        Some(HeaderField::OriginalFilename)
    } else if reference.file_size != other.file_size {
        Some(HeaderField::FileSize)
    } else if reference.checksum != other.checksum {
        Some(HeaderField::Checksum)
    } else if reference.total != other.total {
        Some(HeaderField::Total)
    } else if reference.threshold != other.threshold {
        Some(HeaderField::Threshold)
    } else if reference.split_id != other.split_id {
        Some(HeaderField::SplitId)
    } else {
        None
    }
}

fn check_index(
    reference: &Header,
    header: &Header,
    position: usize,
) -> Result<(), ValidationError> {
    if *header.index == 0 || *header.index > *reference.total {
        return Err(ValidationError::Inconsistent {
            field: HeaderField::ShareIndex,
            position,
        });
    }
    Ok(())
}
