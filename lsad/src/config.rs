//! Service Configuration
//!
//! Identity of the local domain and the limits the policy service
//! enforces. Every field has a default, so a deployment only names what
//! differs.

use core::time::Duration;

use crate::se::sid::identifier_authority::SECURITY_NT_AUTHORITY;
use crate::se::sid::well_known_rids::SECURITY_NT_NON_UNIQUE;
use crate::se::Sid;

// ============================================================================
// Constants
// ============================================================================

/// Maximum secret name length (characters)
pub const MAX_SECRET_NAME: usize = 128;

/// Maximum secret data length (bytes)
pub const MAX_SECRET_DATA: usize = 512;

/// Maximum trusted domain name length (characters)
pub const MAX_DOMAIN_NAME: usize = 255;

/// Live trusted domains one user may have created
pub const PER_USER_TRUST_QUOTA: usize = 32;

/// Live trusted domains in the whole database
pub const ALL_USER_TRUST_QUOTA: usize = 1000;

/// Trusted domain deletions one user may perform
pub const PER_USER_DELETE_TRUST_QUOTA: usize = 10;

/// Maximum outstanding enumeration contexts
pub const MAX_ENUMERATION_CONTEXTS: usize = 256;

/// Idle time after which an enumeration context is reclaimed
pub const ENUMERATION_CONTEXT_TTL: Duration = Duration::from_secs(300);

/// Largest batch one enumeration call returns
pub const MAX_ENUMERATION_BATCH: u32 = 1024;

/// Default account domain SID (S-1-5-21-1004336348-1177238915-682003330)
pub const DEFAULT_ACCOUNT_DOMAIN_SID: Sid =
    Sid::from_array(SECURITY_NT_AUTHORITY, [SECURITY_NT_NON_UNIQUE, 1004336348, 1177238915, 682003330]);

/// Default primary domain SID (S-1-5-21-2000478354-688789844-1708537768)
pub const DEFAULT_PRIMARY_DOMAIN_SID: Sid =
    Sid::from_array(SECURITY_NT_AUTHORITY, [SECURITY_NT_NON_UNIQUE, 2000478354, 688789844, 1708537768]);

/// LSA server role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum ServerRole {
    /// Backup domain controller
    Backup = 2,
    /// Primary domain controller
    #[default]
    Primary = 3,
}

impl ServerRole {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            2 => Some(ServerRole::Backup),
            3 => Some(ServerRole::Primary),
            _ => None,
        }
    }
}

/// Policy service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LsaConfig {
    /// Local account domain (NetBIOS name)
    pub account_domain_name: String,
    /// Local account domain SID
    pub account_domain_sid: Sid,
    /// Primary domain (NetBIOS name)
    pub primary_domain_name: String,
    /// Primary domain DNS name
    pub dns_domain_name: String,
    /// Forest DNS name
    pub dns_forest_name: String,
    /// Primary domain SID
    pub primary_domain_sid: Sid,
    /// Role of this server
    pub server_role: ServerRole,
    /// Whether a directory service backs the database
    pub directory_service: bool,
    /// Maximum live handles
    pub max_handles: usize,
    /// Maximum secret name length
    pub max_secret_name_len: usize,
    /// Maximum secret value length
    pub max_secret_value_len: usize,
    /// Maximum trusted domain name length
    pub max_name_len: usize,
    /// Live trusted domains one user may have created
    pub per_user_trust_quota: usize,
    /// Live trusted domains in the database
    pub all_user_trust_quota: usize,
    /// Trusted domain deletions per user
    pub per_user_delete_trust_quota: usize,
    /// Maximum outstanding enumeration contexts
    pub max_enumeration_contexts: usize,
    /// Idle time before an enumeration context is reclaimed
    pub enumeration_context_ttl: Duration,
    /// Largest batch returned by one enumeration call
    pub max_enumeration_batch: u32,
}

impl Default for LsaConfig {
    fn default() -> Self {
        Self {
            account_domain_name: String::from("LOCAL"),
            account_domain_sid: DEFAULT_ACCOUNT_DOMAIN_SID,
            primary_domain_name: String::from("WORKGROUP"),
            dns_domain_name: String::from("workgroup.local"),
            dns_forest_name: String::from("workgroup.local"),
            primary_domain_sid: DEFAULT_PRIMARY_DOMAIN_SID,
            server_role: ServerRole::Primary,
            directory_service: true,
            max_handles: crate::ob::MAX_HANDLES,
            max_secret_name_len: MAX_SECRET_NAME,
            max_secret_value_len: MAX_SECRET_DATA,
            max_name_len: MAX_DOMAIN_NAME,
            per_user_trust_quota: PER_USER_TRUST_QUOTA,
            all_user_trust_quota: ALL_USER_TRUST_QUOTA,
            per_user_delete_trust_quota: PER_USER_DELETE_TRUST_QUOTA,
            max_enumeration_contexts: MAX_ENUMERATION_CONTEXTS,
            enumeration_context_ttl: ENUMERATION_CONTEXT_TTL,
            max_enumeration_batch: MAX_ENUMERATION_BATCH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LsaConfig::default();
        assert!(config.account_domain_sid.is_valid_domain_sid());
        assert_ne!(config.account_domain_sid, config.primary_domain_sid);
        assert_eq!(config.server_role, ServerRole::Primary);
        assert_eq!(config.max_secret_name_len, MAX_SECRET_NAME);
        assert_eq!(ServerRole::from_u32(2), Some(ServerRole::Backup));
        assert_eq!(ServerRole::from_u32(1), None);
    }
}
