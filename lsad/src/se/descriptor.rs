//! Security Descriptor Implementation
//!
//! A security descriptor contains the security information for an object:
//! - Owner SID: Who owns the object
//! - Group SID: Primary group of the object
//! - DACL: Discretionary ACL - who can access the object
//! - SACL: System ACL - auditing information
//!
//! Every policy object owns exactly one descriptor. `SetSecurityObject`
//! replaces it wholesale; it is never merged piecewise.

use super::acl::{special_rights, standard_rights, Acl};
use super::sid::{Sid, SID_BUILTIN_ADMINISTRATORS, SID_LOCAL_SYSTEM};
use crate::status::{LsaResult, NtStatus};

/// Security descriptor revision
pub const SECURITY_DESCRIPTOR_REVISION: u8 = 1;

/// Security descriptor control flags
pub mod sd_control {
    /// Owner defaulted (set by RM, not creator)
    pub const SE_OWNER_DEFAULTED: u16 = 0x0001;
    /// Group defaulted
    pub const SE_GROUP_DEFAULTED: u16 = 0x0002;
    /// DACL present
    pub const SE_DACL_PRESENT: u16 = 0x0004;
    /// DACL defaulted
    pub const SE_DACL_DEFAULTED: u16 = 0x0008;
    /// SACL present
    pub const SE_SACL_PRESENT: u16 = 0x0010;
    /// SACL defaulted
    pub const SE_SACL_DEFAULTED: u16 = 0x0020;
    /// DACL protected from inheritance
    pub const SE_DACL_PROTECTED: u16 = 0x1000;
    /// SACL protected from inheritance
    pub const SE_SACL_PROTECTED: u16 = 0x2000;
    /// Self-relative format
    pub const SE_SELF_RELATIVE: u16 = 0x8000;
}

bitflags::bitflags! {
    /// Parts of a descriptor named by a query or set request
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SecurityInformation: u32 {
        /// Owner SID
        const OWNER = 0x0000_0001;
        /// Primary group SID
        const GROUP = 0x0000_0002;
        /// Discretionary ACL
        const DACL = 0x0000_0004;
        /// System ACL
        const SACL = 0x0000_0008;
    }
}

impl SecurityInformation {
    /// Rights needed to read the selected parts
    pub fn read_access(self) -> u32 {
        let mut mask = 0;
        if self.intersects(Self::OWNER | Self::GROUP | Self::DACL) {
            mask |= standard_rights::READ_CONTROL;
        }
        if self.contains(Self::SACL) {
            mask |= special_rights::ACCESS_SYSTEM_SECURITY;
        }
        mask
    }

    /// Rights needed to replace the selected parts
    pub fn write_access(self) -> u32 {
        let mut mask = 0;
        if self.intersects(Self::OWNER | Self::GROUP) {
            mask |= standard_rights::WRITE_OWNER;
        }
        if self.contains(Self::DACL) {
            mask |= standard_rights::WRITE_DAC;
        }
        if self.contains(Self::SACL) {
            mask |= special_rights::ACCESS_SYSTEM_SECURITY;
        }
        mask
    }
}

/// Security descriptor (absolute form, owned parts)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityDescriptor {
    /// Revision (always 1)
    pub revision: u8,
    /// Control flags
    pub control: u16,
    /// Owner SID
    pub owner: Option<Sid>,
    /// Primary group SID
    pub group: Option<Sid>,
    /// Discretionary ACL; `None` grants everything
    pub dacl: Option<Acl>,
    /// System ACL
    pub sacl: Option<Acl>,
}

impl SecurityDescriptor {
    /// Create a new empty security descriptor
    pub fn new() -> Self {
        Self {
            revision: SECURITY_DESCRIPTOR_REVISION,
            control: 0,
            owner: None,
            group: None,
            dacl: None,
            sacl: None,
        }
    }

    /// Set the owner
    pub fn set_owner(&mut self, owner: Sid) {
        self.owner = Some(owner);
        self.control &= !sd_control::SE_OWNER_DEFAULTED;
    }

    /// Set the group
    pub fn set_group(&mut self, group: Sid) {
        self.group = Some(group);
        self.control &= !sd_control::SE_GROUP_DEFAULTED;
    }

    /// Attach (or remove) the DACL
    pub fn set_dacl(&mut self, dacl: Option<Acl>) {
        if dacl.is_some() {
            self.control |= sd_control::SE_DACL_PRESENT;
        } else {
            self.control &= !sd_control::SE_DACL_PRESENT;
        }
        self.dacl = dacl;
    }

    /// Attach (or remove) the SACL
    pub fn set_sacl(&mut self, sacl: Option<Acl>) {
        if sacl.is_some() {
            self.control |= sd_control::SE_SACL_PRESENT;
        } else {
            self.control &= !sd_control::SE_SACL_PRESENT;
        }
        self.sacl = sacl;
    }

    /// Add an access allowed entry to the DACL, creating it if needed
    pub fn add_access_allowed(&mut self, sid: Sid, mask: u32) -> bool {
        self.control |= sd_control::SE_DACL_PRESENT;
        self.dacl.get_or_insert_with(Acl::new).add_access_allowed(sid, mask)
    }

    /// Add an access denied entry to the DACL, creating it if needed
    pub fn add_access_denied(&mut self, sid: Sid, mask: u32) -> bool {
        self.control |= sd_control::SE_DACL_PRESENT;
        self.dacl.get_or_insert_with(Acl::new).add_access_denied(sid, mask)
    }

    /// Check if DACL is present
    pub fn has_dacl(&self) -> bool {
        self.dacl.is_some()
    }

    /// Check structural validity
    pub fn is_valid(&self) -> bool {
        self.revision == SECURITY_DESCRIPTOR_REVISION
            && self.owner.map_or(true, |sid| sid.is_valid())
            && self.group.map_or(true, |sid| sid.is_valid())
            && self.dacl.as_ref().map_or(true, Acl::is_valid)
            && self.sacl.as_ref().map_or(true, Acl::is_valid)
            && ((self.control & sd_control::SE_DACL_PRESENT) != 0) == self.dacl.is_some()
            && ((self.control & sd_control::SE_SACL_PRESENT) != 0) == self.sacl.is_some()
    }

    /// Validate a descriptor supplied by a caller
    ///
    /// A stored descriptor must name its owner.
    pub fn validate(&self) -> LsaResult<()> {
        if !self.is_valid() || self.owner.is_none() {
            return Err(NtStatus::InvalidSecurityDescriptor);
        }
        Ok(())
    }

    /// Parts of `other` that differ from this descriptor
    ///
    /// Presence and inheritance flags count as part of the ACL they
    /// describe.
    pub fn changed_parts(&self, other: &SecurityDescriptor) -> SecurityInformation {
        const DACL_CONTROL: u16 =
            sd_control::SE_DACL_PRESENT | sd_control::SE_DACL_DEFAULTED | sd_control::SE_DACL_PROTECTED;
        const SACL_CONTROL: u16 =
            sd_control::SE_SACL_PRESENT | sd_control::SE_SACL_DEFAULTED | sd_control::SE_SACL_PROTECTED;

        let mut changed = SecurityInformation::empty();
        if self.owner != other.owner {
            changed |= SecurityInformation::OWNER;
        }
        if self.group != other.group {
            changed |= SecurityInformation::GROUP;
        }
        if self.dacl != other.dacl || (self.control ^ other.control) & DACL_CONTROL != 0 {
            changed |= SecurityInformation::DACL;
        }
        if self.sacl != other.sacl || (self.control ^ other.control) & SACL_CONTROL != 0 {
            changed |= SecurityInformation::SACL;
        }
        changed
    }

    /// Copy of this descriptor holding only the requested parts
    pub fn select(&self, info: SecurityInformation) -> SecurityDescriptor {
        let mut sd = SecurityDescriptor::new();
        if info.contains(SecurityInformation::OWNER) {
            sd.owner = self.owner;
        }
        if info.contains(SecurityInformation::GROUP) {
            sd.group = self.group;
        }
        if info.contains(SecurityInformation::DACL) {
            sd.set_dacl(self.dacl.clone());
        }
        if info.contains(SecurityInformation::SACL) {
            sd.set_sacl(self.sacl.clone());
        }
        sd
    }
}

impl Default for SecurityDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a descriptor owned by Administrators with the given DACL grants
///
/// System and Administrators always receive `full_access`; `extra` entries
/// follow in order.
pub fn create_object_security_descriptor(full_access: u32, extra: &[(Sid, u32)]) -> SecurityDescriptor {
    let mut sd = SecurityDescriptor::new();

    sd.set_owner(SID_BUILTIN_ADMINISTRATORS);
    sd.set_group(SID_LOCAL_SYSTEM);

    sd.add_access_allowed(SID_LOCAL_SYSTEM, full_access);
    sd.add_access_allowed(SID_BUILTIN_ADMINISTRATORS, full_access);
    for (sid, mask) in extra {
        sd.add_access_allowed(*sid, *mask);
    }

    sd
}
