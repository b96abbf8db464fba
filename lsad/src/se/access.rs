//! Access Check Implementation
//!
//! Decides whether a caller may obtain a requested access mask on an
//! object, and which rights the resulting handle carries.
//!
//! # Access Check Algorithm
//! 1. Map generic rights through the object kind's generic mapping
//! 2. ACCESS_SYSTEM_SECURITY requires SeSecurityPrivilege
//! 3. The owner always receives READ_CONTROL and WRITE_DAC
//! 4. If no DACL, grant all access
//! 5. If empty DACL, deny all access
//! 6. Process ACEs in order:
//!    - For each ACE matching the caller's user or groups:
//!      - If ACCESS_DENIED: deny those rights not yet granted
//!      - If ACCESS_ALLOWED: grant those rights not yet denied
//! 7. Every requested right must be granted
//!
//! MAXIMUM_ALLOWED asks for everything the descriptor allows; it fails
//! only if nothing at all is allowed.

use log::debug;

use super::acl::{generic_rights, special_rights, standard_rights, Ace, AceType};
use super::descriptor::SecurityDescriptor;
use super::privilege::privilege_luids;
use super::token::CallerIdentity;
use crate::status::{LsaResult, NtStatus};

/// Generic mapping - maps generic rights to specific rights
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericMapping {
    pub generic_read: u32,
    pub generic_write: u32,
    pub generic_execute: u32,
    pub generic_all: u32,
}

impl GenericMapping {
    /// Map generic rights to specific rights
    pub fn map_generic(&self, access_mask: u32) -> u32 {
        let mut result = access_mask;

        if (result & generic_rights::GENERIC_READ) != 0 {
            result &= !generic_rights::GENERIC_READ;
            result |= self.generic_read;
        }
        if (result & generic_rights::GENERIC_WRITE) != 0 {
            result &= !generic_rights::GENERIC_WRITE;
            result |= self.generic_write;
        }
        if (result & generic_rights::GENERIC_EXECUTE) != 0 {
            result &= !generic_rights::GENERIC_EXECUTE;
            result |= self.generic_execute;
        }
        if (result & generic_rights::GENERIC_ALL) != 0 {
            result &= !generic_rights::GENERIC_ALL;
            result |= self.generic_all;
        }

        result
    }
}

/// Perform an access check
///
/// # Arguments
/// * `sd` - The security descriptor of the object
/// * `identity` - The caller's security context
/// * `desired_access` - The requested access rights
/// * `generic_mapping` - Mapping from generic to specific rights
///
/// # Returns
/// * `Ok(granted_access)` - The specific rights granted
/// * `Err(NtStatus::AccessDenied)` - Some requested right was not granted
pub fn access_check(
    sd: &SecurityDescriptor,
    identity: &CallerIdentity,
    desired_access: u32,
    generic_mapping: &GenericMapping,
) -> LsaResult<u32> {
    let mut desired = generic_mapping.map_generic(desired_access);
    let maximum_allowed = (desired & special_rights::MAXIMUM_ALLOWED) != 0;
    desired &= !special_rights::MAXIMUM_ALLOWED;

    let mut granted: u32 = 0;
    let mut denied: u32 = 0;

    if (desired & special_rights::ACCESS_SYSTEM_SECURITY) != 0 {
        if !identity.is_privilege_enabled(privilege_luids::SE_SECURITY_LUID) {
            debug!("[SE] ACCESS_SYSTEM_SECURITY without SeSecurityPrivilege");
            return Err(NtStatus::AccessDenied);
        }
        granted |= special_rights::ACCESS_SYSTEM_SECURITY;
    }

    let mut remaining = desired & !special_rights::ACCESS_SYSTEM_SECURITY;
    if maximum_allowed {
        remaining |= generic_mapping.generic_all;
    }

    // Owner gets READ_CONTROL and WRITE_DAC
    if let Some(owner) = sd.owner.as_ref() {
        if identity.is_member(owner) {
            let implicit = standard_rights::READ_CONTROL | standard_rights::WRITE_DAC;
            granted |= remaining & implicit;
            remaining &= !implicit;
        }
    }

    if (remaining & standard_rights::WRITE_OWNER) != 0
        && identity.is_privilege_enabled(privilege_luids::SE_TAKE_OWNERSHIP_LUID)
    {
        granted |= standard_rights::WRITE_OWNER;
        remaining &= !standard_rights::WRITE_OWNER;
    }

    match sd.dacl.as_ref() {
        None => {
            granted |= remaining;
            remaining = 0;
        }
        Some(dacl) => {
            for ace in dacl.aces.iter() {
                if remaining == 0 {
                    break;
                }
                if ace.is_inherit_only() || !ace_applies_to_identity(ace, identity) {
                    continue;
                }

                let ace_mask = generic_mapping.map_generic(ace.mask);

                match ace.ace_type {
                    AceType::AccessDenied => {
                        denied |= ace_mask & remaining;
                    }
                    AceType::AccessAllowed => {
                        let can_grant = ace_mask & remaining & !denied;
                        granted |= can_grant;
                        remaining &= !can_grant;
                    }
                    // Audit and alarm entries never affect access
                    _ => {}
                }
            }
        }
    }

    if (desired & !granted) != 0 || (maximum_allowed && granted == 0) {
        debug!(
            "[SE] access denied: desired={:#x} granted={:#x} remaining={:#x}",
            desired_access, granted, remaining
        );
        return Err(NtStatus::AccessDenied);
    }

    Ok(granted)
}

/// Check if an ACE applies to a caller
fn ace_applies_to_identity(ace: &Ace, identity: &CallerIdentity) -> bool {
    identity.is_member(&ace.sid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::se::acl::Acl;
    use crate::se::descriptor::create_object_security_descriptor;
    use crate::se::sid::{Sid, SID_BUILTIN_ADMINISTRATORS, SID_WORLD};
    use crate::se::token::SessionId;

    const MAPPING: GenericMapping = GenericMapping {
        generic_read: standard_rights::READ_CONTROL | 0x1,
        generic_write: 0x2,
        generic_execute: 0x4,
        generic_all: standard_rights::STANDARD_RIGHTS_REQUIRED | 0x7,
    };

    fn user() -> CallerIdentity {
        CallerIdentity::new(SessionId(1), "S-1-5-21-7-8-9-1105".parse::<Sid>().unwrap())
    }

    fn admin() -> CallerIdentity {
        CallerIdentity::administrator(SessionId(1), "S-1-5-21-7-8-9-500".parse::<Sid>().unwrap())
    }

    #[test]
    fn test_allow_and_deny_order() {
        let mut sd = create_object_security_descriptor(MAPPING.generic_all, &[(SID_WORLD, 0x1)]);
        assert_eq!(access_check(&sd, &user(), 0x1, &MAPPING), Ok(0x1));
        assert_eq!(access_check(&sd, &user(), 0x2, &MAPPING), Err(NtStatus::AccessDenied));

        let mut acl = Acl::new();
        acl.add_access_denied(SID_WORLD, 0x1);
        acl.add_access_allowed(SID_WORLD, 0x3);
        sd.set_dacl(Some(acl));
        assert_eq!(access_check(&sd, &user(), 0x1, &MAPPING), Err(NtStatus::AccessDenied));
        assert_eq!(access_check(&sd, &user(), 0x2, &MAPPING), Ok(0x2));
    }

    #[test]
    fn test_generic_mapping_applied() {
        let sd = create_object_security_descriptor(MAPPING.generic_all, &[]);
        let granted = access_check(&sd, &admin(), generic_rights::GENERIC_ALL, &MAPPING).unwrap();
        assert_eq!(granted, MAPPING.generic_all);
        assert_eq!(
            access_check(&sd, &user(), generic_rights::GENERIC_READ, &MAPPING),
            Err(NtStatus::AccessDenied)
        );
    }

    #[test]
    fn test_null_and_empty_dacl() {
        let mut sd = SecurityDescriptor::new();
        sd.set_owner(SID_BUILTIN_ADMINISTRATORS);
        assert_eq!(access_check(&sd, &user(), 0x7, &MAPPING), Ok(0x7));

        sd.set_dacl(Some(Acl::new()));
        assert_eq!(access_check(&sd, &user(), 0x1, &MAPPING), Err(NtStatus::AccessDenied));
        assert_eq!(access_check(&sd, &user(), 0, &MAPPING), Ok(0));
    }

    #[test]
    fn test_owner_implicit_rights() {
        let mut sd = SecurityDescriptor::new();
        sd.set_owner(SID_WORLD);
        sd.set_dacl(Some(Acl::new()));
        let granted = access_check(&sd, &user(), standard_rights::WRITE_DAC, &MAPPING).unwrap();
        assert_eq!(granted, standard_rights::WRITE_DAC);
    }

    #[test]
    fn test_maximum_allowed() {
        let sd = create_object_security_descriptor(MAPPING.generic_all, &[(SID_WORLD, 0x1)]);
        assert_eq!(
            access_check(&sd, &user(), special_rights::MAXIMUM_ALLOWED, &MAPPING),
            Ok(0x1)
        );
        assert_eq!(
            access_check(&sd, &admin(), special_rights::MAXIMUM_ALLOWED, &MAPPING),
            Ok(MAPPING.generic_all)
        );

        let locked = create_object_security_descriptor(MAPPING.generic_all, &[]);
        assert_eq!(
            access_check(&locked, &user(), special_rights::MAXIMUM_ALLOWED, &MAPPING),
            Err(NtStatus::AccessDenied)
        );
    }

    #[test]
    fn test_system_security_needs_privilege() {
        let sd = create_object_security_descriptor(MAPPING.generic_all, &[]);
        assert_eq!(
            access_check(&sd, &admin(), special_rights::ACCESS_SYSTEM_SECURITY, &MAPPING),
            Err(NtStatus::AccessDenied)
        );
        let privileged = admin().with_privilege(privilege_luids::SE_SECURITY_LUID);
        assert_eq!(
            access_check(&sd, &privileged, special_rights::ACCESS_SYSTEM_SECURITY, &MAPPING),
            Ok(special_rights::ACCESS_SYSTEM_SECURITY)
        );
    }
}
