//! Locally Unique Identifier (LUID)
//!
//! LUIDs are 64-bit identifiers unique within one service instance. The
//! privilege catalog uses the well-known values 2-36; the policy store
//! draws object identities from a [`LuidSource`].
//!
//! # Design
//!
//! - Values 0-1000 are reserved for predefined LUIDs
//! - A source starts at 1001 and increments atomically
//! - Allocation is monotonic, so identities sort in creation order

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Locally Unique Identifier
#[repr(C)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Luid {
    /// High 32 bits (first so that ordering follows the 64-bit value)
    pub high_part: u32,
    /// Low 32 bits
    pub low_part: u32,
}

impl Luid {
    /// Create a new LUID from parts
    pub const fn new(low: u32, high: u32) -> Self {
        Self {
            high_part: high,
            low_part: low,
        }
    }

    /// Create a new LUID from a 64-bit value
    pub const fn from_u64(value: u64) -> Self {
        Self {
            high_part: (value >> 32) as u32,
            low_part: value as u32,
        }
    }

    /// Convert to a 64-bit value
    pub const fn to_u64(self) -> u64 {
        ((self.high_part as u64) << 32) | (self.low_part as u64)
    }

    /// Check if this is a null LUID
    pub const fn is_null(self) -> bool {
        self.low_part == 0 && self.high_part == 0
    }
}

impl fmt::Debug for Luid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Luid({:#x}:{:#x})", self.high_part, self.low_part)
    }
}

/// The first 1000 values are reserved for static definitions
pub const LUID_RESERVED_COUNT: u64 = 1001;

/// Monotonic LUID allocator
///
/// Thread-safe and lock-free.
#[derive(Debug)]
pub struct LuidSource {
    next: AtomicU64,
}

impl LuidSource {
    /// Create a source whose first LUID is `LUID_RESERVED_COUNT`
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(LUID_RESERVED_COUNT),
        }
    }

    /// Allocate a new locally unique identifier
    #[inline]
    pub fn allocate(&self) -> Luid {
        Luid::from_u64(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Next LUID that will be allocated
    pub fn peek(&self) -> Luid {
        Luid::from_u64(self.next.load(Ordering::Relaxed))
    }
}

impl Default for LuidSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_and_join() {
        let luid = Luid::from_u64(0x1234_5678_9ABC_DEF0);
        assert_eq!(luid.high_part, 0x1234_5678);
        assert_eq!(luid.low_part, 0x9ABC_DEF0);
        assert_eq!(luid.to_u64(), 0x1234_5678_9ABC_DEF0);
        assert!(Luid::default().is_null());
    }

    #[test]
    fn test_ordering_follows_value() {
        assert!(Luid::new(5, 0) < Luid::new(6, 0));
        assert!(Luid::new(u32::MAX, 0) < Luid::new(0, 1));
    }

    #[test]
    fn test_source_is_monotonic() {
        let source = LuidSource::new();
        let first = source.allocate();
        let second = source.allocate();
        assert_eq!(first.to_u64(), LUID_RESERVED_COUNT);
        assert!(second > first);
        assert_eq!(source.peek().to_u64(), LUID_RESERVED_COUNT + 2);
    }
}
