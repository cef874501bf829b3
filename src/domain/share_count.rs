//! `ShareCount` newtype

use crate::error::{HorcruxError, Result};

/// Number of shares to create (1..=255)
///
/// Each share is evaluated at its own non-zero x-coordinate, and a share
/// index is stored in one byte, so at most 255 shares can exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShareCount(u8);

impl ShareCount {
    pub const MIN: u8 = 1;

    pub const MAX: u8 = 255;

    /// Creates a new share count
    ///
    /// # Errors
    /// Returns `InvalidInput` if count is 0
    ///
    /// # Examples
    ///
    /// ```rust
    /// use horcrux::domain::ShareCount;
    ///
    /// let count = ShareCount::new(5).unwrap();
    /// assert_eq!(*count, 5);
    ///
    /// assert!(ShareCount::new(ShareCount::MAX).is_ok());
    /// assert!(ShareCount::new(0).is_err());
    /// ```
    pub fn new(value: u8) -> Result<Self> {
        if value < Self::MIN {
            return Err(HorcruxError::InvalidInput(
                "Share count must be at least 1".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// Every share index of a split with this many shares, in order
    pub fn indices(self) -> impl Iterator<Item = super::ShareIndex> {
        (1..=self.0).map(super::ShareIndex::from_nonzero)
    }
}

impl std::ops::Deref for ShareCount {
    type Target = u8;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
