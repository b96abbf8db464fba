//! Status Codes
//!
//! Every operation of the policy service reports its outcome as an
//! NTSTATUS value. Errors travel in `Err(NtStatus)`; the informational
//! enumeration codes (`MoreEntries`, `NoMoreEntries`) travel alongside the
//! data in an [`Enumerated`](crate::lsa::enumeration::Enumerated) batch.
//!
//! # Severity
//! - `0x0000_0000..0x4000_0000`: success / informational
//! - `0x8000_0000..0xC000_0000`: warning
//! - `0xC000_0000..`: error

use thiserror::Error;

/// Result type used throughout the service
pub type LsaResult<T> = Result<T, NtStatus>;

// ============================================================================
// Status Taxonomy
// ============================================================================

/// NTSTATUS codes reported by the policy service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[repr(u32)]
pub enum NtStatus {
    /// The request completed
    #[error("the request was successfully completed")]
    Success = 0x0000_0000,
    /// More information is available to successive calls
    #[error("more entries are available from the enumeration")]
    MoreEntries = 0x0000_0105,
    /// No more entries are available from the enumeration
    #[error("no more entries are available from the enumeration")]
    NoMoreEntries = 0x8000_001A,
    /// Class exists but cannot be set
    #[error("the requested operation is not implemented")]
    NotImplemented = 0xC000_0002,
    /// Information class out of range
    #[error("the information class is not valid")]
    InvalidInfoClass = 0xC000_0003,
    /// Stale, unknown or wrong-kind handle
    #[error("the handle is not valid")]
    InvalidHandle = 0xC000_0008,
    /// Malformed or missing argument
    #[error("one of the supplied parameters is invalid")]
    InvalidParameter = 0xC000_000D,
    /// Caller lacks the required access
    #[error("access denied")]
    AccessDenied = 0xC000_0022,
    /// Unique key absent
    #[error("the object name was not found")]
    ObjectNameNotFound = 0xC000_0034,
    /// Unique key already present
    #[error("the object name already exists")]
    ObjectNameCollision = 0xC000_0035,
    /// Privilege name or LUID unknown
    #[error("the privilege is not recognized")]
    NoSuchPrivilege = 0xC000_0060,
    /// Malformed security identifier
    #[error("the security identifier is not valid")]
    InvalidSid = 0xC000_0078,
    /// Malformed security descriptor
    #[error("the security descriptor is not valid")]
    InvalidSecurityDescriptor = 0xC000_0079,
    /// Table capacity or memory exhausted
    #[error("insufficient resources to complete the request")]
    InsufficientResources = 0xC000_009A,
    /// Operation not supported by this server
    #[error("the request is not supported")]
    NotSupported = 0xC000_00BB,
    /// Domain object in the wrong state for the change
    #[error("the domain is in the wrong state for the operation")]
    InvalidDomainState = 0xC000_00DD,
    /// Server role does not allow the change
    #[error("the server role does not allow the operation")]
    InvalidDomainRole = 0xC000_00DE,
    /// Trusted domain object absent
    #[error("the specified domain does not exist")]
    NoSuchDomain = 0xC000_00DF,
    /// Name exceeds the configured length
    #[error("the name is too long")]
    NameTooLong = 0xC000_0106,
    /// Requested data does not exist
    #[error("the object was not found")]
    NotFound = 0xC000_0225,
    /// Operation needs directory-service backing
    #[error("the directory service is required for this operation")]
    DirectoryServiceRequired = 0xC000_02B1,
    /// Trust with the local domain requested
    #[error("trust cannot be established with the current domain")]
    CurrentDomainNotAllowed = 0xC000_02E9,
    /// Per-caller trusted domain creation quota exhausted
    #[error("the caller's trusted domain quota is exceeded")]
    PerUserTrustQuotaExceeded = 0xC000_0401,
    /// Server-wide trusted domain creation quota exhausted
    #[error("the server-wide trusted domain quota is exceeded")]
    AllUserTrustQuotaExceeded = 0xC000_0402,
    /// Per-caller trusted domain deletion quota exhausted
    #[error("the caller's trusted domain deletion quota is exceeded")]
    UserDeleteTrustQuotaExceeded = 0xC000_0403,
}

/// Every status value, in code order
const ALL_STATUSES: [NtStatus; 25] = [
    NtStatus::Success,
    NtStatus::MoreEntries,
    NtStatus::NoMoreEntries,
    NtStatus::NotImplemented,
    NtStatus::InvalidInfoClass,
    NtStatus::InvalidHandle,
    NtStatus::InvalidParameter,
    NtStatus::AccessDenied,
    NtStatus::ObjectNameNotFound,
    NtStatus::ObjectNameCollision,
    NtStatus::NoSuchPrivilege,
    NtStatus::InvalidSid,
    NtStatus::InvalidSecurityDescriptor,
    NtStatus::InsufficientResources,
    NtStatus::NotSupported,
    NtStatus::InvalidDomainState,
    NtStatus::InvalidDomainRole,
    NtStatus::NoSuchDomain,
    NtStatus::NameTooLong,
    NtStatus::NotFound,
    NtStatus::DirectoryServiceRequired,
    NtStatus::CurrentDomainNotAllowed,
    NtStatus::PerUserTrustQuotaExceeded,
    NtStatus::AllUserTrustQuotaExceeded,
    NtStatus::UserDeleteTrustQuotaExceeded,
];

impl NtStatus {
    /// Raw NTSTATUS value for the transport to encode
    #[inline]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Look up a status by its raw value
    pub fn from_code(code: u32) -> Option<Self> {
        ALL_STATUSES.iter().copied().find(|s| s.code() == code)
    }

    /// Error severity (top two bits set)
    #[inline]
    pub const fn is_error(self) -> bool {
        (self.code() >> 30) == 0b11
    }

    /// Success or informational severity
    #[inline]
    pub const fn is_success(self) -> bool {
        (self.code() >> 30) == 0
    }

    /// Short name as used in protocol traces
    pub fn name(self) -> &'static str {
        match self {
            NtStatus::Success => "STATUS_SUCCESS",
            NtStatus::MoreEntries => "STATUS_MORE_ENTRIES",
            NtStatus::NoMoreEntries => "STATUS_NO_MORE_ENTRIES",
            NtStatus::NotImplemented => "STATUS_NOT_IMPLEMENTED",
            NtStatus::InvalidInfoClass => "STATUS_INVALID_INFO_CLASS",
            NtStatus::InvalidHandle => "STATUS_INVALID_HANDLE",
            NtStatus::InvalidParameter => "STATUS_INVALID_PARAMETER",
            NtStatus::AccessDenied => "STATUS_ACCESS_DENIED",
            NtStatus::ObjectNameNotFound => "STATUS_OBJECT_NAME_NOT_FOUND",
            NtStatus::ObjectNameCollision => "STATUS_OBJECT_NAME_COLLISION",
            NtStatus::NoSuchPrivilege => "STATUS_NO_SUCH_PRIVILEGE",
            NtStatus::InvalidSid => "STATUS_INVALID_SID",
            NtStatus::InvalidSecurityDescriptor => "STATUS_INVALID_SECURITY_DESCR",
            NtStatus::InsufficientResources => "STATUS_INSUFFICIENT_RESOURCES",
            NtStatus::NotSupported => "STATUS_NOT_SUPPORTED",
            NtStatus::InvalidDomainState => "STATUS_INVALID_DOMAIN_STATE",
            NtStatus::InvalidDomainRole => "STATUS_INVALID_DOMAIN_ROLE",
            NtStatus::NoSuchDomain => "STATUS_NO_SUCH_DOMAIN",
            NtStatus::NameTooLong => "STATUS_NAME_TOO_LONG",
            NtStatus::NotFound => "STATUS_NOT_FOUND",
            NtStatus::DirectoryServiceRequired => "STATUS_DIRECTORY_SERVICE_REQUIRED",
            NtStatus::CurrentDomainNotAllowed => "STATUS_CURRENT_DOMAIN_NOT_ALLOWED",
            NtStatus::PerUserTrustQuotaExceeded => "STATUS_PER_USER_TRUST_QUOTA_EXCEEDED",
            NtStatus::AllUserTrustQuotaExceeded => "STATUS_ALL_USER_TRUST_QUOTA_EXCEEDED",
            NtStatus::UserDeleteTrustQuotaExceeded => {
                "STATUS_USER_DELETE_TRUST_QUOTA_EXCEEDED"
            }
        }
    }
}

impl From<NtStatus> for u32 {
    fn from(status: NtStatus) -> Self {
        status.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for status in ALL_STATUSES {
            assert_eq!(NtStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(NtStatus::from_code(0xDEAD_BEEF), None);
    }

    #[test]
    fn test_severity() {
        assert!(NtStatus::Success.is_success());
        assert!(NtStatus::MoreEntries.is_success());
        assert!(!NtStatus::NoMoreEntries.is_success());
        assert!(!NtStatus::NoMoreEntries.is_error());
        assert!(NtStatus::InvalidHandle.is_error());
        assert!(NtStatus::UserDeleteTrustQuotaExceeded.is_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(NtStatus::AccessDenied.to_string(), "access denied");
        assert_eq!(NtStatus::InvalidSecurityDescriptor.name(), "STATUS_INVALID_SECURITY_DESCR");
    }
}
