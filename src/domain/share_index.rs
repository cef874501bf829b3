//! `ShareIndex` newtype

use crate::error::{HorcruxError, Result};

/// Share index (1..=255)
///
/// The index doubles as the share's x-coordinate in GF(256). Zero is the
/// coordinate of the secret itself and can never be handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShareIndex(u8);

impl ShareIndex {
    /// Creates a new share index
    ///
    /// # Errors
    /// Returns `InvalidInput` if index is 0
    ///
    /// # Examples
    ///
    /// ```rust
    /// use horcrux::domain::ShareIndex;
    ///
    /// let index = ShareIndex::new(1).unwrap();
    /// assert_eq!(*index, 1);
    ///
    /// // 0 is where the secret lives
    /// assert!(ShareIndex::new(0).is_err());
    /// ```
    pub fn new(value: u8) -> Result<Self> {
        if value == 0 {
            return Err(HorcruxError::InvalidInput(
                "Share index 0 is reserved for the secret".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// Caller guarantees `value` is non-zero
    pub(crate) fn from_nonzero(value: u8) -> Self {
        debug_assert_ne!(value, 0);
        Self(value)
    }
}

impl std::ops::Deref for ShareIndex {
    type Target = u8;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ShareIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
