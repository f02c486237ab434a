// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

/// How long a remembered value stays in the store.
///
/// # Examples
///
/// ```
/// use querycache_store::Expiry;
/// use std::time::Duration;
///
/// assert_eq!(Expiry::from_minutes(5), Expiry::Ttl(Duration::from_secs(300)));
/// assert_eq!(Expiry::from_minutes(-1), Expiry::Forever);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Expiry {
    /// The entry expires after the given duration. A zero duration is never stored.
    Ttl(Duration),
    /// The entry never expires.
    Forever,
}

impl Expiry {
    /// Maps a minute count to an expiry: negative minutes mean forever.
    #[must_use]
    pub fn from_minutes(minutes: i64) -> Self {
        if minutes < 0 {
            Self::Forever
        } else {
            Self::Ttl(Duration::from_secs(minutes.unsigned_abs().saturating_mul(60)))
        }
    }

    /// Returns `true` if nothing should be written for this expiry.
    #[must_use]
    pub fn is_immediate(self) -> bool {
        matches!(self, Self::Ttl(ttl) if ttl.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_minutes_is_immediate() {
        assert!(Expiry::from_minutes(0).is_immediate());
        assert!(!Expiry::from_minutes(1).is_immediate());
        assert!(!Expiry::Forever.is_immediate());
    }

    #[test]
    fn large_minute_counts_saturate() {
        assert_eq!(Expiry::from_minutes(i64::MAX), Expiry::Ttl(Duration::from_secs(u64::MAX)));
    }
}
