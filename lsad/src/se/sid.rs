//! Security Identifier (SID) Implementation
//!
//! A SID uniquely identifies a security principal (user, group, domain).
//! SIDs have the format: S-R-I-S-S-S...
//! - S: Literal 'S' identifying a SID string
//! - R: Revision level (always 1)
//! - I: Identifier authority (48-bit)
//! - S: Sub-authorities (32-bit each, variable count)
//!
//! # Well-Known SIDs
//! - S-1-0-0: Null SID
//! - S-1-1-0: World (Everyone)
//! - S-1-5-7: Anonymous Logon
//! - S-1-5-11: Authenticated Users
//! - S-1-5-18: Local System
//! - S-1-5-32-544: Administrators

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::str::FromStr;

use thiserror::Error;

/// Maximum number of sub-authorities in a SID
pub const SID_MAX_SUB_AUTHORITIES: usize = 15;

/// SID revision
pub const SID_REVISION: u8 = 1;

/// Identifier Authority values
pub mod identifier_authority {
    /// Null authority
    pub const SECURITY_NULL_SID_AUTHORITY: [u8; 6] = [0, 0, 0, 0, 0, 0];
    /// World authority (Everyone)
    pub const SECURITY_WORLD_SID_AUTHORITY: [u8; 6] = [0, 0, 0, 0, 0, 1];
    /// Local authority
    pub const SECURITY_LOCAL_SID_AUTHORITY: [u8; 6] = [0, 0, 0, 0, 0, 2];
    /// Creator authority
    pub const SECURITY_CREATOR_SID_AUTHORITY: [u8; 6] = [0, 0, 0, 0, 0, 3];
    /// NT authority (most common)
    pub const SECURITY_NT_AUTHORITY: [u8; 6] = [0, 0, 0, 0, 0, 5];
}

/// Well-known relative identifiers (RIDs)
pub mod well_known_rids {
    pub const SECURITY_NULL_RID: u32 = 0;
    pub const SECURITY_WORLD_RID: u32 = 0;
    pub const SECURITY_ANONYMOUS_LOGON_RID: u32 = 7;
    pub const SECURITY_AUTHENTICATED_USER_RID: u32 = 11;
    pub const SECURITY_LOCAL_SYSTEM_RID: u32 = 18;
    pub const SECURITY_NT_NON_UNIQUE: u32 = 21;
    pub const SECURITY_BUILTIN_DOMAIN_RID: u32 = 32;

    pub const DOMAIN_USER_RID_ADMIN: u32 = 500;
    pub const DOMAIN_ALIAS_RID_ADMINS: u32 = 544;
    pub const DOMAIN_ALIAS_RID_USERS: u32 = 545;
}

/// Security Identifier (SID)
///
/// Sub-authorities are stored inline; only the first
/// `sub_authority_count` entries are meaningful and only those take part
/// in equality, hashing and ordering.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Sid {
    /// Revision (1 for every well-formed SID)
    pub revision: u8,
    /// Number of sub-authorities
    sub_authority_count: u8,
    /// Identifier authority (6 bytes, big-endian)
    pub identifier_authority: [u8; 6],
    /// Sub-authorities
    sub_authority: [u32; SID_MAX_SUB_AUTHORITIES],
}

impl Sid {
    /// Create a SID with the given authority and sub-authorities
    ///
    /// Returns `None` if more than `SID_MAX_SUB_AUTHORITIES` are supplied.
    pub fn create(authority: [u8; 6], sub_authorities: &[u32]) -> Option<Self> {
        Self::from_parts(SID_REVISION, authority, sub_authorities)
    }

    /// Build a SID exactly as decoded from the wire, revision included
    pub fn from_parts(revision: u8, authority: [u8; 6], sub_authorities: &[u32]) -> Option<Self> {
        if sub_authorities.len() > SID_MAX_SUB_AUTHORITIES {
            return None;
        }

        let mut sub_authority = [0u32; SID_MAX_SUB_AUTHORITIES];
        sub_authority[..sub_authorities.len()].copy_from_slice(sub_authorities);

        Some(Self {
            revision,
            sub_authority_count: sub_authorities.len() as u8,
            identifier_authority: authority,
            sub_authority,
        })
    }

    /// Build a SID at compile time
    ///
    /// Panics (at compile time, in const context) with more than
    /// `SID_MAX_SUB_AUTHORITIES` entries.
    pub const fn from_array<const N: usize>(authority: [u8; 6], subs: [u32; N]) -> Self {
        assert!(N <= SID_MAX_SUB_AUTHORITIES);
        let mut sub_authority = [0u32; SID_MAX_SUB_AUTHORITIES];
        let mut i = 0;
        while i < N {
            sub_authority[i] = subs[i];
            i += 1;
        }
        Self {
            revision: SID_REVISION,
            sub_authority_count: N as u8,
            identifier_authority: authority,
            sub_authority,
        }
    }

    /// Active sub-authorities
    #[inline]
    pub fn sub_authorities(&self) -> &[u32] {
        &self.sub_authority[..self.sub_authority_count as usize]
    }

    /// Number of sub-authorities
    #[inline]
    pub fn sub_authority_count(&self) -> u8 {
        self.sub_authority_count
    }

    /// Get the size of this SID in bytes when marshalled
    pub fn length(&self) -> usize {
        8 + (self.sub_authority_count as usize * 4)
    }

    /// Check if this is a well-formed SID
    pub fn is_valid(&self) -> bool {
        self.revision == SID_REVISION
            && self.sub_authority_count as usize <= SID_MAX_SUB_AUTHORITIES
    }

    /// Well-formed and carrying at least one sub-authority, as a domain SID must
    pub fn is_valid_domain_sid(&self) -> bool {
        self.is_valid() && self.sub_authority_count > 0
    }

    /// Get the last sub-authority (RID)
    pub fn rid(&self) -> Option<u32> {
        self.sub_authorities().last().copied()
    }

    /// Identifier authority as a 48-bit value
    pub fn authority_value(&self) -> u64 {
        self.identifier_authority
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
    }

    /// Append a RID, yielding an account SID within this domain
    pub fn with_rid(&self, rid: u32) -> Option<Sid> {
        let mut subs = self.sub_authorities().to_vec();
        subs.push(rid);
        Sid::from_parts(self.revision, self.identifier_authority, &subs)
    }

    /// Check if this SID is a prefix of another SID
    pub fn is_prefix_of(&self, other: &Sid) -> bool {
        self.revision == other.revision
            && self.identifier_authority == other.identifier_authority
            && other.sub_authorities().starts_with(self.sub_authorities())
    }

    fn key(&self) -> (u8, [u8; 6], &[u32]) {
        (self.revision, self.identifier_authority, self.sub_authorities())
    }
}

impl PartialEq for Sid {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Sid {}

impl Hash for Sid {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Sid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Sid {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let authority = self.authority_value();
        if authority >> 32 == 0 {
            write!(f, "S-{}-{}", self.revision, authority)?;
        } else {
            write!(f, "S-{}-0x{:012X}", self.revision, authority)?;
        }
        for sub in self.sub_authorities() {
            write!(f, "-{}", sub)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sid({})", self)
    }
}

/// Error returned when a SID string cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid format for SID string")]
pub struct InvalidSidFormat;

impl FromStr for Sid {
    type Err = InvalidSidFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('-');
        if !parts
            .next()
            .map(|head| head.eq_ignore_ascii_case("s"))
            .unwrap_or(false)
        {
            return Err(InvalidSidFormat);
        }

        let revision = parts
            .next()
            .ok_or(InvalidSidFormat)?
            .parse::<u8>()
            .map_err(|_| InvalidSidFormat)?;

        let authority_str = parts.next().ok_or(InvalidSidFormat)?;
        let authority = match authority_str
            .strip_prefix("0x")
            .or_else(|| authority_str.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => authority_str.parse::<u64>(),
        }
        .map_err(|_| InvalidSidFormat)?;
        if authority >> 48 != 0 {
            return Err(InvalidSidFormat);
        }
        let mut identifier_authority = [0u8; 6];
        identifier_authority.copy_from_slice(&authority.to_be_bytes()[2..]);

        let mut subs = Vec::with_capacity(SID_MAX_SUB_AUTHORITIES);
        for item in parts {
            subs.push(item.parse::<u32>().map_err(|_| InvalidSidFormat)?);
        }

        Sid::from_parts(revision, identifier_authority, &subs).ok_or(InvalidSidFormat)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Sid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Sid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Well-Known SIDs
// ============================================================================

/// Null SID (S-1-0-0)
pub const SID_NULL: Sid = Sid::from_array(
    identifier_authority::SECURITY_NULL_SID_AUTHORITY,
    [well_known_rids::SECURITY_NULL_RID],
);

/// Everyone SID (S-1-1-0)
pub const SID_WORLD: Sid = Sid::from_array(
    identifier_authority::SECURITY_WORLD_SID_AUTHORITY,
    [well_known_rids::SECURITY_WORLD_RID],
);

/// Anonymous Logon SID (S-1-5-7)
pub const SID_ANONYMOUS_LOGON: Sid = Sid::from_array(
    identifier_authority::SECURITY_NT_AUTHORITY,
    [well_known_rids::SECURITY_ANONYMOUS_LOGON_RID],
);

/// Authenticated Users SID (S-1-5-11)
pub const SID_AUTHENTICATED_USERS: Sid = Sid::from_array(
    identifier_authority::SECURITY_NT_AUTHORITY,
    [well_known_rids::SECURITY_AUTHENTICATED_USER_RID],
);

/// Local System SID (S-1-5-18)
pub const SID_LOCAL_SYSTEM: Sid = Sid::from_array(
    identifier_authority::SECURITY_NT_AUTHORITY,
    [well_known_rids::SECURITY_LOCAL_SYSTEM_RID],
);

/// Administrators group SID (S-1-5-32-544)
pub const SID_BUILTIN_ADMINISTRATORS: Sid = Sid::from_array(
    identifier_authority::SECURITY_NT_AUTHORITY,
    [well_known_rids::SECURITY_BUILTIN_DOMAIN_RID, well_known_rids::DOMAIN_ALIAS_RID_ADMINS],
);

/// Users group SID (S-1-5-32-545)
pub const SID_BUILTIN_USERS: Sid = Sid::from_array(
    identifier_authority::SECURITY_NT_AUTHORITY,
    [well_known_rids::SECURITY_BUILTIN_DOMAIN_RID, well_known_rids::DOMAIN_ALIAS_RID_USERS],
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let sid: Sid = "S-1-5-21-1004336348-1177238915-682003330-500".parse().unwrap();
        assert_eq!(sid.sub_authority_count(), 5);
        assert_eq!(sid.rid(), Some(500));
        assert_eq!(sid.to_string(), "S-1-5-21-1004336348-1177238915-682003330-500");
        assert!(sid.is_valid_domain_sid());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!("X-1-5-18".parse::<Sid>(), Err(InvalidSidFormat));
        assert_eq!("S-1".parse::<Sid>(), Err(InvalidSidFormat));
        assert_eq!("S-1-5-abc".parse::<Sid>(), Err(InvalidSidFormat));
        assert_eq!("S-1-5-1-2-3-4-5-6-7-8-9-10-11-12-13-14-15-16".parse::<Sid>(), Err(InvalidSidFormat));
    }

    #[test]
    fn test_well_known_equality() {
        assert_eq!("S-1-5-18".parse::<Sid>().unwrap(), SID_LOCAL_SYSTEM);
        assert_eq!("S-1-5-32-544".parse::<Sid>().unwrap(), SID_BUILTIN_ADMINISTRATORS);
        assert_eq!(SID_WORLD.to_string(), "S-1-1-0");
        assert_ne!(SID_BUILTIN_ADMINISTRATORS, SID_BUILTIN_USERS);
    }

    #[test]
    fn test_validity() {
        let bad_revision = Sid::from_parts(2, identifier_authority::SECURITY_NT_AUTHORITY, &[18]).unwrap();
        assert!(!bad_revision.is_valid());
        let no_subs = Sid::create(identifier_authority::SECURITY_NT_AUTHORITY, &[]).unwrap();
        assert!(no_subs.is_valid());
        assert!(!no_subs.is_valid_domain_sid());
    }

    #[test]
    fn test_prefix_and_rid() {
        let domain: Sid = "S-1-5-21-1-2-3".parse().unwrap();
        let admin = domain.with_rid(500).unwrap();
        assert!(domain.is_prefix_of(&admin));
        assert!(!admin.is_prefix_of(&domain));
        assert_eq!(admin.rid(), Some(500));
    }
}
