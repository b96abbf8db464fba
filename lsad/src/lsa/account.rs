//! Account Objects
//!
//! An account records the privileges and logon rights held by one SID.
//! Account rights are the union of privilege names and logon right names;
//! privileges live in the privilege set and logon rights in the system
//! access flags.

use std::collections::BTreeSet;

use crate::ex::Luid;
use crate::se::acl::standard_rights::READ_CONTROL;
use crate::se::descriptor::create_object_security_descriptor;
use crate::se::privilege::{self, logon_rights, AccountRight};
use crate::se::sid::SID_WORLD;
use crate::se::{GenericMapping, SecurityDescriptor, Sid};
use crate::status::{LsaResult, NtStatus};

/// Account access rights
pub mod account_access {
    pub const ACCOUNT_VIEW: u32 = 0x00000001;
    pub const ACCOUNT_ADJUST_PRIVILEGES: u32 = 0x00000002;
    pub const ACCOUNT_ADJUST_QUOTAS: u32 = 0x00000004;
    pub const ACCOUNT_ADJUST_SYSTEM_ACCESS: u32 = 0x00000008;
    pub const ACCOUNT_ALL_ACCESS: u32 = 0x000F000F;
}

use account_access::*;

/// Generic mapping for account objects
pub const ACCOUNT_GENERIC_MAPPING: GenericMapping = GenericMapping {
    generic_read: 0x00020001,
    generic_write: 0x0002000E,
    generic_execute: 0x00020000,
    generic_all: ACCOUNT_ALL_ACCESS,
};

bitflags::bitflags! {
    /// Logon rights held by an account
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SystemAccess: u32 {
        const INTERACTIVE = logon_rights::POLICY_MODE_INTERACTIVE;
        const NETWORK = logon_rights::POLICY_MODE_NETWORK;
        const BATCH = logon_rights::POLICY_MODE_BATCH;
        const SERVICE = logon_rights::POLICY_MODE_SERVICE;
        const DENY_INTERACTIVE = logon_rights::POLICY_MODE_DENY_INTERACTIVE;
        const DENY_NETWORK = logon_rights::POLICY_MODE_DENY_NETWORK;
        const DENY_BATCH = logon_rights::POLICY_MODE_DENY_BATCH;
        const DENY_SERVICE = logon_rights::POLICY_MODE_DENY_SERVICE;
        const REMOTE_INTERACTIVE = logon_rights::POLICY_MODE_REMOTE_INTERACTIVE;
        const DENY_REMOTE_INTERACTIVE = logon_rights::POLICY_MODE_DENY_REMOTE_INTERACTIVE;
    }
}

impl SystemAccess {
    /// Parse a wire mask; unknown bits are rejected
    pub fn from_wire(mask: u32) -> LsaResult<Self> {
        Self::from_bits(mask).ok_or(NtStatus::InvalidParameter)
    }
}

/// Descriptor given to a newly created account
pub fn default_account_descriptor() -> SecurityDescriptor {
    create_object_security_descriptor(ACCOUNT_ALL_ACCESS, &[(SID_WORLD, READ_CONTROL | ACCOUNT_VIEW)])
}

/// One account object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// SID the account describes (unique key)
    pub sid: Sid,
    /// Held privileges
    pub privileges: BTreeSet<Luid>,
    /// Held logon rights
    pub system_access: SystemAccess,
    /// Security descriptor
    pub descriptor: SecurityDescriptor,
}

impl Account {
    pub fn new(sid: Sid) -> Self {
        Self {
            sid,
            privileges: BTreeSet::new(),
            system_access: SystemAccess::empty(),
            descriptor: default_account_descriptor(),
        }
    }

    /// Add privileges
    ///
    /// Every LUID must name a catalog privilege; on error nothing is added.
    pub fn add_privileges(&mut self, luids: &[Luid]) -> LsaResult<()> {
        if luids.iter().any(|luid| !privilege::is_known(*luid)) {
            return Err(NtStatus::InvalidParameter);
        }
        self.privileges.extend(luids.iter().copied());
        Ok(())
    }

    /// Remove privileges, or all of them when `all` is set
    ///
    /// Exactly one of `all` and a non-empty list must be given.
    pub fn remove_privileges(&mut self, all: bool, luids: &[Luid]) -> LsaResult<()> {
        match (all, luids.is_empty()) {
            (true, true) => {
                self.privileges.clear();
                Ok(())
            }
            (false, false) => {
                for luid in luids {
                    self.privileges.remove(luid);
                }
                Ok(())
            }
            _ => Err(NtStatus::InvalidParameter),
        }
    }

    /// Names of every right held: privileges by LUID, then logon rights
    pub fn rights(&self) -> Vec<&'static str> {
        self.privileges
            .iter()
            .filter_map(|luid| privilege::lookup_privilege_name(*luid).ok())
            .chain(privilege::logon_right_names(self.system_access.bits()))
            .collect()
    }

    /// Check whether a right is held
    pub fn has_right(&self, right: AccountRight) -> bool {
        match right {
            AccountRight::Privilege(luid) => self.privileges.contains(&luid),
            AccountRight::Logon(bit) => self.system_access.bits() & bit != 0,
        }
    }

    /// Grant rights by name
    ///
    /// All names are resolved before anything changes.
    pub fn add_rights(&mut self, names: &[String]) -> LsaResult<()> {
        let rights = resolve_rights(names)?;
        for right in rights {
            match right {
                AccountRight::Privilege(luid) => {
                    self.privileges.insert(luid);
                }
                AccountRight::Logon(bit) => {
                    self.system_access |= SystemAccess::from_bits_truncate(bit);
                }
            }
        }
        Ok(())
    }

    /// Revoke rights by name, or every right when `all` is set
    pub fn remove_rights(&mut self, all: bool, names: &[String]) -> LsaResult<()> {
        if all {
            self.privileges.clear();
            self.system_access = SystemAccess::empty();
            return Ok(());
        }
        let rights = resolve_rights(names)?;
        for right in rights {
            match right {
                AccountRight::Privilege(luid) => {
                    self.privileges.remove(&luid);
                }
                AccountRight::Logon(bit) => {
                    self.system_access &= !SystemAccess::from_bits_truncate(bit);
                }
            }
        }
        Ok(())
    }

    /// Check if the account holds no rights at all
    pub fn is_empty(&self) -> bool {
        self.privileges.is_empty() && self.system_access.is_empty()
    }
}

/// Resolve right names, failing with `NoSuchPrivilege` on the first unknown
pub fn resolve_rights(names: &[String]) -> LsaResult<Vec<AccountRight>> {
    names
        .iter()
        .map(|name| privilege::lookup_account_right(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::se::privilege::privilege_luids::{SE_BACKUP_LUID, SE_SECURITY_LUID};
    use crate::se::sid::SID_BUILTIN_USERS;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_privileges() {
        let mut account = Account::new(SID_BUILTIN_USERS);
        account.add_privileges(&[SE_BACKUP_LUID, SE_SECURITY_LUID]).unwrap();
        assert_eq!(account.privileges.len(), 2);

        assert_eq!(
            account.add_privileges(&[Luid::from_u64(9999)]),
            Err(NtStatus::InvalidParameter)
        );
        assert_eq!(account.privileges.len(), 2);

        account.remove_privileges(false, &[SE_BACKUP_LUID]).unwrap();
        assert!(!account.privileges.contains(&SE_BACKUP_LUID));
        assert_eq!(account.remove_privileges(true, &[SE_SECURITY_LUID]), Err(NtStatus::InvalidParameter));
        assert_eq!(account.remove_privileges(false, &[]), Err(NtStatus::InvalidParameter));
        account.remove_privileges(true, &[]).unwrap();
        assert!(account.is_empty());
    }

    #[test]
    fn test_rights_union() {
        let mut account = Account::new(SID_BUILTIN_USERS);
        account
            .add_rights(&names(&["SeNetworkLogonRight", "SeBackupPrivilege"]))
            .unwrap();
        assert_eq!(account.rights(), vec!["SeBackupPrivilege", "SeNetworkLogonRight"]);
        assert!(account.has_right(AccountRight::Logon(logon_rights::POLICY_MODE_NETWORK)));
        assert_eq!(account.system_access, SystemAccess::NETWORK);
    }

    #[test]
    fn test_unknown_right_changes_nothing() {
        let mut account = Account::new(SID_BUILTIN_USERS);
        assert_eq!(
            account.add_rights(&names(&["SeBackupPrivilege", "SeBogusRight"])),
            Err(NtStatus::NoSuchPrivilege)
        );
        assert!(account.is_empty());
    }

    #[test]
    fn test_remove_rights() {
        let mut account = Account::new(SID_BUILTIN_USERS);
        account
            .add_rights(&names(&["SeBatchLogonRight", "SeDebugPrivilege"]))
            .unwrap();
        account.remove_rights(false, &names(&["SeBatchLogonRight"])).unwrap();
        assert_eq!(account.rights(), vec!["SeDebugPrivilege"]);
        account.remove_rights(true, &[]).unwrap();
        assert!(account.is_empty());
    }

    #[test]
    fn test_system_access_wire() {
        assert_eq!(SystemAccess::from_wire(0x3), Ok(SystemAccess::INTERACTIVE | SystemAccess::NETWORK));
        assert_eq!(SystemAccess::from_wire(0x8), Err(NtStatus::InvalidParameter));
        assert_eq!(SystemAccess::all().bits(), logon_rights::POLICY_MODE_ALL);
    }
}
