//! Threshold newtype

use crate::error::{HorcruxError, Result};

/// Minimum number of shares needed to reconstruct a file (1..=255)
///
/// Invariant: threshold >= 1 (enforced at construction).
/// A threshold of 1 is accepted but gives no secrecy: every share on its own
/// is the original file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Threshold(u8);

impl Threshold {
    /// Creates a new threshold
    ///
    /// # Errors
    /// Returns `InvalidInput` if the threshold is zero
    ///
    /// # Examples
    ///
    /// ```rust
    /// use horcrux::domain::Threshold;
    ///
    /// let threshold = Threshold::new(3).unwrap();
    /// assert_eq!(*threshold, 3);
    ///
    /// assert!(Threshold::new(0).is_err());
    /// ```
    pub fn new(value: u8) -> Result<Self> {
        if value == 0 {
            return Err(HorcruxError::InvalidInput(
                "Threshold must be at least 1".to_string(),
            ));
        }
        Ok(Self(value))
    }
}

impl std::ops::Deref for Threshold {
    type Target = u8;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
