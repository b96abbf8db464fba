//! Privilege Catalog
//!
//! Privileges are special rights that allow holders to perform
//! system-level operations that would otherwise be denied. The catalog is
//! static: callers can look privileges up by name or LUID and read their
//! display names, but never change it.
//!
//! # Names and values
//! - Privilege names are matched case-insensitively
//! - LUID values 2-36 are the well-known NT privileges
//! - Logon rights (SeInteractiveLogonRight, ...) are account rights that
//!   are not privileges; they live in an account's system access flags

use crate::ex::Luid;
use crate::status::{LsaResult, NtStatus};

/// Number of privileges in the catalog
pub const SE_MAX_PRIVILEGES: usize = 35;

/// Language the display names are written in (en-US)
pub const DISPLAY_NAME_LANGUAGE: u16 = 0x0409;

/// Well-known privilege values
pub mod privilege_values {
    pub const SE_CREATE_TOKEN_PRIVILEGE: u32 = 2;
    pub const SE_ASSIGNPRIMARYTOKEN_PRIVILEGE: u32 = 3;
    pub const SE_LOCK_MEMORY_PRIVILEGE: u32 = 4;
    pub const SE_INCREASE_QUOTA_PRIVILEGE: u32 = 5;
    pub const SE_MACHINE_ACCOUNT_PRIVILEGE: u32 = 6;
    pub const SE_TCB_PRIVILEGE: u32 = 7;
    pub const SE_SECURITY_PRIVILEGE: u32 = 8;
    pub const SE_TAKE_OWNERSHIP_PRIVILEGE: u32 = 9;
    pub const SE_LOAD_DRIVER_PRIVILEGE: u32 = 10;
    pub const SE_SYSTEM_PROFILE_PRIVILEGE: u32 = 11;
    pub const SE_SYSTEMTIME_PRIVILEGE: u32 = 12;
    pub const SE_PROF_SINGLE_PROCESS_PRIVILEGE: u32 = 13;
    pub const SE_INC_BASE_PRIORITY_PRIVILEGE: u32 = 14;
    pub const SE_CREATE_PAGEFILE_PRIVILEGE: u32 = 15;
    pub const SE_CREATE_PERMANENT_PRIVILEGE: u32 = 16;
    pub const SE_BACKUP_PRIVILEGE: u32 = 17;
    pub const SE_RESTORE_PRIVILEGE: u32 = 18;
    pub const SE_SHUTDOWN_PRIVILEGE: u32 = 19;
    pub const SE_DEBUG_PRIVILEGE: u32 = 20;
    pub const SE_AUDIT_PRIVILEGE: u32 = 21;
    pub const SE_SYSTEM_ENVIRONMENT_PRIVILEGE: u32 = 22;
    pub const SE_CHANGE_NOTIFY_PRIVILEGE: u32 = 23;
    pub const SE_REMOTE_SHUTDOWN_PRIVILEGE: u32 = 24;
    pub const SE_UNDOCK_PRIVILEGE: u32 = 25;
    pub const SE_SYNC_AGENT_PRIVILEGE: u32 = 26;
    pub const SE_ENABLE_DELEGATION_PRIVILEGE: u32 = 27;
    pub const SE_MANAGE_VOLUME_PRIVILEGE: u32 = 28;
    pub const SE_IMPERSONATE_PRIVILEGE: u32 = 29;
    pub const SE_CREATE_GLOBAL_PRIVILEGE: u32 = 30;
    pub const SE_TRUSTED_CREDMAN_ACCESS_PRIVILEGE: u32 = 31;
    pub const SE_RELABEL_PRIVILEGE: u32 = 32;
    pub const SE_INC_WORKING_SET_PRIVILEGE: u32 = 33;
    pub const SE_TIME_ZONE_PRIVILEGE: u32 = 34;
    pub const SE_CREATE_SYMBOLIC_LINK_PRIVILEGE: u32 = 35;
    pub const SE_DELEGATE_SESSION_USER_IMPERSONATE_PRIVILEGE: u32 = 36;
}

/// LUIDs of the privileges the service itself checks
pub mod privilege_luids {
    use super::privilege_values::*;
    use crate::ex::Luid;

    pub const SE_SECURITY_LUID: Luid = Luid::new(SE_SECURITY_PRIVILEGE, 0);
    pub const SE_TAKE_OWNERSHIP_LUID: Luid = Luid::new(SE_TAKE_OWNERSHIP_PRIVILEGE, 0);
    pub const SE_BACKUP_LUID: Luid = Luid::new(SE_BACKUP_PRIVILEGE, 0);
    pub const SE_RESTORE_LUID: Luid = Luid::new(SE_RESTORE_PRIVILEGE, 0);
    pub const SE_TCB_LUID: Luid = Luid::new(SE_TCB_PRIVILEGE, 0);
}

/// One catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivilegeDefinition {
    /// Programmatic name (e.g. "SeDebugPrivilege")
    pub name: &'static str,
    /// Privilege value
    pub luid: Luid,
    /// Human-readable description
    pub display_name: &'static str,
}

const fn definition(name: &'static str, value: u32, display_name: &'static str) -> PrivilegeDefinition {
    PrivilegeDefinition {
        name,
        luid: Luid::new(value, 0),
        display_name,
    }
}

use privilege_values::*;

/// The catalog, ordered by LUID
pub static PRIVILEGE_CATALOG: [PrivilegeDefinition; SE_MAX_PRIVILEGES] = [
    definition("SeCreateTokenPrivilege", SE_CREATE_TOKEN_PRIVILEGE, "Create a token object"),
    definition("SeAssignPrimaryTokenPrivilege", SE_ASSIGNPRIMARYTOKEN_PRIVILEGE, "Replace a process level token"),
    definition("SeLockMemoryPrivilege", SE_LOCK_MEMORY_PRIVILEGE, "Lock pages in memory"),
    definition("SeIncreaseQuotaPrivilege", SE_INCREASE_QUOTA_PRIVILEGE, "Adjust memory quotas for a process"),
    definition("SeMachineAccountPrivilege", SE_MACHINE_ACCOUNT_PRIVILEGE, "Add workstations to domain"),
    definition("SeTcbPrivilege", SE_TCB_PRIVILEGE, "Act as part of the operating system"),
    definition("SeSecurityPrivilege", SE_SECURITY_PRIVILEGE, "Manage auditing and security log"),
    definition("SeTakeOwnershipPrivilege", SE_TAKE_OWNERSHIP_PRIVILEGE, "Take ownership of files or other objects"),
    definition("SeLoadDriverPrivilege", SE_LOAD_DRIVER_PRIVILEGE, "Load and unload device drivers"),
    definition("SeSystemProfilePrivilege", SE_SYSTEM_PROFILE_PRIVILEGE, "Profile system performance"),
    definition("SeSystemtimePrivilege", SE_SYSTEMTIME_PRIVILEGE, "Change the system time"),
    definition("SeProfileSingleProcessPrivilege", SE_PROF_SINGLE_PROCESS_PRIVILEGE, "Profile single process"),
    definition("SeIncreaseBasePriorityPrivilege", SE_INC_BASE_PRIORITY_PRIVILEGE, "Increase scheduling priority"),
    definition("SeCreatePagefilePrivilege", SE_CREATE_PAGEFILE_PRIVILEGE, "Create a pagefile"),
    definition("SeCreatePermanentPrivilege", SE_CREATE_PERMANENT_PRIVILEGE, "Create permanent shared objects"),
    definition("SeBackupPrivilege", SE_BACKUP_PRIVILEGE, "Back up files and directories"),
    definition("SeRestorePrivilege", SE_RESTORE_PRIVILEGE, "Restore files and directories"),
    definition("SeShutdownPrivilege", SE_SHUTDOWN_PRIVILEGE, "Shut down the system"),
    definition("SeDebugPrivilege", SE_DEBUG_PRIVILEGE, "Debug programs"),
    definition("SeAuditPrivilege", SE_AUDIT_PRIVILEGE, "Generate security audits"),
    definition("SeSystemEnvironmentPrivilege", SE_SYSTEM_ENVIRONMENT_PRIVILEGE, "Modify firmware environment values"),
    definition("SeChangeNotifyPrivilege", SE_CHANGE_NOTIFY_PRIVILEGE, "Bypass traverse checking"),
    definition("SeRemoteShutdownPrivilege", SE_REMOTE_SHUTDOWN_PRIVILEGE, "Force shutdown from a remote system"),
    definition("SeUndockPrivilege", SE_UNDOCK_PRIVILEGE, "Remove computer from docking station"),
    definition("SeSyncAgentPrivilege", SE_SYNC_AGENT_PRIVILEGE, "Synchronize directory service data"),
    definition(
        "SeEnableDelegationPrivilege",
        SE_ENABLE_DELEGATION_PRIVILEGE,
        "Enable computer and user accounts to be trusted for delegation",
    ),
    definition("SeManageVolumePrivilege", SE_MANAGE_VOLUME_PRIVILEGE, "Perform volume maintenance tasks"),
    definition("SeImpersonatePrivilege", SE_IMPERSONATE_PRIVILEGE, "Impersonate a client after authentication"),
    definition("SeCreateGlobalPrivilege", SE_CREATE_GLOBAL_PRIVILEGE, "Create global objects"),
    definition(
        "SeTrustedCredManAccessPrivilege",
        SE_TRUSTED_CREDMAN_ACCESS_PRIVILEGE,
        "Access Credential Manager as a trusted caller",
    ),
    definition("SeRelabelPrivilege", SE_RELABEL_PRIVILEGE, "Modify an object label"),
    definition("SeIncreaseWorkingSetPrivilege", SE_INC_WORKING_SET_PRIVILEGE, "Increase a process working set"),
    definition("SeTimeZonePrivilege", SE_TIME_ZONE_PRIVILEGE, "Change the time zone"),
    definition("SeCreateSymbolicLinkPrivilege", SE_CREATE_SYMBOLIC_LINK_PRIVILEGE, "Create symbolic links"),
    definition(
        "SeDelegateSessionUserImpersonatePrivilege",
        SE_DELEGATE_SESSION_USER_IMPERSONATE_PRIVILEGE,
        "Obtain an impersonation token for another user in the same session",
    ),
];

// ============================================================================
// Logon Rights
// ============================================================================

/// System access bits granted by each logon right
pub mod logon_rights {
    pub const POLICY_MODE_INTERACTIVE: u32 = 0x0000_0001;
    pub const POLICY_MODE_NETWORK: u32 = 0x0000_0002;
    pub const POLICY_MODE_BATCH: u32 = 0x0000_0004;
    pub const POLICY_MODE_SERVICE: u32 = 0x0000_0010;
    pub const POLICY_MODE_DENY_INTERACTIVE: u32 = 0x0000_0040;
    pub const POLICY_MODE_DENY_NETWORK: u32 = 0x0000_0080;
    pub const POLICY_MODE_DENY_BATCH: u32 = 0x0000_0100;
    pub const POLICY_MODE_DENY_SERVICE: u32 = 0x0000_0200;
    pub const POLICY_MODE_REMOTE_INTERACTIVE: u32 = 0x0000_0400;
    pub const POLICY_MODE_DENY_REMOTE_INTERACTIVE: u32 = 0x0000_0800;

    /// Every defined bit
    pub const POLICY_MODE_ALL: u32 = 0x0000_0FD7;
}

/// Account right names that map onto system access bits
pub static LOGON_RIGHTS: [(&str, u32); 10] = [
    ("SeInteractiveLogonRight", logon_rights::POLICY_MODE_INTERACTIVE),
    ("SeNetworkLogonRight", logon_rights::POLICY_MODE_NETWORK),
    ("SeBatchLogonRight", logon_rights::POLICY_MODE_BATCH),
    ("SeServiceLogonRight", logon_rights::POLICY_MODE_SERVICE),
    ("SeDenyInteractiveLogonRight", logon_rights::POLICY_MODE_DENY_INTERACTIVE),
    ("SeDenyNetworkLogonRight", logon_rights::POLICY_MODE_DENY_NETWORK),
    ("SeDenyBatchLogonRight", logon_rights::POLICY_MODE_DENY_BATCH),
    ("SeDenyServiceLogonRight", logon_rights::POLICY_MODE_DENY_SERVICE),
    ("SeRemoteInteractiveLogonRight", logon_rights::POLICY_MODE_REMOTE_INTERACTIVE),
    ("SeDenyRemoteInteractiveLogonRight", logon_rights::POLICY_MODE_DENY_REMOTE_INTERACTIVE),
];

/// A resolved account right name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRight {
    /// A privilege from the catalog
    Privilege(Luid),
    /// A logon right (system access bit)
    Logon(u32),
}

// ============================================================================
// Lookups
// ============================================================================

/// Find a privilege definition by name
pub fn find_by_name(name: &str) -> Option<&'static PrivilegeDefinition> {
    PRIVILEGE_CATALOG
        .iter()
        .find(|def| def.name.eq_ignore_ascii_case(name))
}

/// Find a privilege definition by LUID
pub fn find_by_luid(luid: Luid) -> Option<&'static PrivilegeDefinition> {
    PRIVILEGE_CATALOG.iter().find(|def| def.luid == luid)
}

/// Check if a LUID names a catalog privilege
pub fn is_known(luid: Luid) -> bool {
    find_by_luid(luid).is_some()
}

/// Resolve a privilege name to its LUID
pub fn lookup_privilege_value(name: &str) -> LsaResult<Luid> {
    find_by_name(name)
        .map(|def| def.luid)
        .ok_or(NtStatus::NoSuchPrivilege)
}

/// Resolve a LUID to its privilege name
pub fn lookup_privilege_name(luid: Luid) -> LsaResult<&'static str> {
    find_by_luid(luid)
        .map(|def| def.name)
        .ok_or(NtStatus::NoSuchPrivilege)
}

/// Resolve a privilege name to its display name and the language used
///
/// Only one language is carried, so the requested languages only affect
/// the language id reported when they happen to match it.
pub fn lookup_privilege_display_name(
    name: &str,
    _client_language: u16,
    _client_system_default_language: u16,
) -> LsaResult<(&'static str, u16)> {
    find_by_name(name)
        .map(|def| (def.display_name, DISPLAY_NAME_LANGUAGE))
        .ok_or(NtStatus::NoSuchPrivilege)
}

/// Find the system access bit for a logon right name
pub fn lookup_logon_right(name: &str) -> Option<u32> {
    LOGON_RIGHTS
        .iter()
        .find(|(right, _)| right.eq_ignore_ascii_case(name))
        .map(|(_, bit)| *bit)
}

/// Resolve an account right name (privilege or logon right)
pub fn lookup_account_right(name: &str) -> LsaResult<AccountRight> {
    if let Some(def) = find_by_name(name) {
        return Ok(AccountRight::Privilege(def.luid));
    }
    lookup_logon_right(name)
        .map(AccountRight::Logon)
        .ok_or(NtStatus::NoSuchPrivilege)
}

/// Names of the logon rights set in a system access mask
pub fn logon_right_names(system_access: u32) -> impl Iterator<Item = &'static str> {
    LOGON_RIGHTS
        .iter()
        .filter(move |(_, bit)| system_access & bit != 0)
        .map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_ordered_and_dense() {
        for (index, def) in PRIVILEGE_CATALOG.iter().enumerate() {
            assert_eq!(def.luid, Luid::new(index as u32 + 2, 0));
        }
    }

    #[test]
    fn test_lookups() {
        let luid = lookup_privilege_value("sedebugprivilege").unwrap();
        assert_eq!(luid, Luid::new(SE_DEBUG_PRIVILEGE, 0));
        assert_eq!(lookup_privilege_name(luid), Ok("SeDebugPrivilege"));
        assert_eq!(lookup_privilege_value("SeMadeUpPrivilege"), Err(NtStatus::NoSuchPrivilege));
        assert_eq!(lookup_privilege_name(Luid::new(99, 0)), Err(NtStatus::NoSuchPrivilege));
        assert_eq!(lookup_privilege_name(Luid::new(1, 0)), Err(NtStatus::NoSuchPrivilege));
    }

    #[test]
    fn test_display_name() {
        let (text, language) = lookup_privilege_display_name("SeShutdownPrivilege", 0, 0).unwrap();
        assert_eq!(text, "Shut down the system");
        assert_eq!(language, DISPLAY_NAME_LANGUAGE);
    }

    #[test]
    fn test_account_rights() {
        assert_eq!(
            lookup_account_right("SeNetworkLogonRight"),
            Ok(AccountRight::Logon(logon_rights::POLICY_MODE_NETWORK))
        );
        assert!(matches!(
            lookup_account_right("SeBackupPrivilege"),
            Ok(AccountRight::Privilege(_))
        ));
        assert_eq!(lookup_account_right("Nonsense"), Err(NtStatus::NoSuchPrivilege));

        let names: Vec<_> = logon_right_names(
            logon_rights::POLICY_MODE_INTERACTIVE | logon_rights::POLICY_MODE_SERVICE,
        )
        .collect();
        assert_eq!(names, ["SeInteractiveLogonRight", "SeServiceLogonRight"]);
    }

    #[test]
    fn test_logon_mask_covers_table() {
        let all = LOGON_RIGHTS.iter().fold(0, |acc, (_, bit)| acc | bit);
        assert_eq!(all, logon_rights::POLICY_MODE_ALL);
    }
}
