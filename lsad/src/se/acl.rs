//! Access Control List (ACL) Implementation
//!
//! ACLs contain Access Control Entries (ACEs) that specify access rights
//! for security principals (users, groups).
//!
//! # ACL Types
//! - DACL (Discretionary ACL): Controls access to an object
//! - SACL (System ACL): Controls auditing
//!
//! # ACE Ordering
//! ACEs are processed in order. Denied ACEs should come before allowed.

use super::sid::Sid;

/// ACL revision
pub const ACL_REVISION: u8 = 2;
pub const ACL_REVISION_DS: u8 = 4;

/// Maximum number of ACEs in an ACL
pub const MAX_ACE_COUNT: usize = 64;

/// ACE types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AceType {
    /// Access allowed
    AccessAllowed = 0,
    /// Access denied
    AccessDenied = 1,
    /// System audit
    SystemAudit = 2,
    /// System alarm (not used)
    SystemAlarm = 3,
}

impl AceType {
    /// Decode a wire ACE type
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(AceType::AccessAllowed),
            1 => Some(AceType::AccessDenied),
            2 => Some(AceType::SystemAudit),
            3 => Some(AceType::SystemAlarm),
            _ => None,
        }
    }
}

/// ACE flags
pub mod ace_flags {
    /// ACE inherited by child objects
    pub const OBJECT_INHERIT_ACE: u8 = 0x01;
    /// ACE inherited by sub-containers
    pub const CONTAINER_INHERIT_ACE: u8 = 0x02;
    /// Don't propagate inherit flags
    pub const NO_PROPAGATE_INHERIT_ACE: u8 = 0x04;
    /// ACE applies only to inherited objects
    pub const INHERIT_ONLY_ACE: u8 = 0x08;
    /// ACE was inherited
    pub const INHERITED_ACE: u8 = 0x10;
    /// Audit on successful access
    pub const SUCCESSFUL_ACCESS_ACE_FLAG: u8 = 0x40;
    /// Audit on failed access
    pub const FAILED_ACCESS_ACE_FLAG: u8 = 0x80;
}

// ============================================================================
// Generic Access Rights
// ============================================================================

/// Generic access rights (mapped to specific rights per object type)
pub mod generic_rights {
    pub const GENERIC_READ: u32 = 0x80000000;
    pub const GENERIC_WRITE: u32 = 0x40000000;
    pub const GENERIC_EXECUTE: u32 = 0x20000000;
    pub const GENERIC_ALL: u32 = 0x10000000;
}

/// Standard access rights (apply to all object types)
pub mod standard_rights {
    pub const DELETE: u32 = 0x00010000;
    pub const READ_CONTROL: u32 = 0x00020000;
    pub const WRITE_DAC: u32 = 0x00040000;
    pub const WRITE_OWNER: u32 = 0x00080000;

    pub const STANDARD_RIGHTS_REQUIRED: u32 = 0x000F0000;
    pub const STANDARD_RIGHTS_READ: u32 = READ_CONTROL;
    pub const STANDARD_RIGHTS_WRITE: u32 = READ_CONTROL;
    pub const STANDARD_RIGHTS_EXECUTE: u32 = READ_CONTROL;
}

/// Special access rights
pub mod special_rights {
    pub const ACCESS_SYSTEM_SECURITY: u32 = 0x01000000;
    pub const MAXIMUM_ALLOWED: u32 = 0x02000000;
}

// ============================================================================
// Access Control Entries
// ============================================================================

/// Access control entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ace {
    /// ACE type (allow/deny/audit)
    pub ace_type: AceType,
    /// ACE flags
    pub flags: u8,
    /// Access mask
    pub mask: u32,
    /// Trustee
    pub sid: Sid,
}

impl Ace {
    /// Create an access allowed ACE
    pub fn access_allowed(sid: Sid, mask: u32) -> Self {
        Self {
            ace_type: AceType::AccessAllowed,
            flags: 0,
            mask,
            sid,
        }
    }

    /// Create an access denied ACE
    pub fn access_denied(sid: Sid, mask: u32) -> Self {
        Self {
            ace_type: AceType::AccessDenied,
            flags: 0,
            mask,
            sid,
        }
    }

    /// Create an audit ACE
    pub fn system_audit(sid: Sid, mask: u32, flags: u8) -> Self {
        Self {
            ace_type: AceType::SystemAudit,
            flags,
            mask,
            sid,
        }
    }

    /// Check if this is an allow ACE
    pub fn is_allow(&self) -> bool {
        matches!(self.ace_type, AceType::AccessAllowed)
    }

    /// Check if this is a deny ACE
    pub fn is_deny(&self) -> bool {
        matches!(self.ace_type, AceType::AccessDenied)
    }

    /// Check if this ACE is inherit-only
    pub fn is_inherit_only(&self) -> bool {
        (self.flags & ace_flags::INHERIT_ONLY_ACE) != 0
    }
}

/// Access control list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acl {
    /// Revision
    pub revision: u8,
    /// ACEs in evaluation order
    pub aces: Vec<Ace>,
}

impl Acl {
    /// Create an empty ACL
    pub fn new() -> Self {
        Self {
            revision: ACL_REVISION,
            aces: Vec::new(),
        }
    }

    /// Add an ACE to the ACL
    pub fn add_ace(&mut self, ace: Ace) -> bool {
        if self.aces.len() >= MAX_ACE_COUNT {
            return false;
        }
        self.aces.push(ace);
        true
    }

    /// Add an access allowed ACE
    pub fn add_access_allowed(&mut self, sid: Sid, mask: u32) -> bool {
        self.add_ace(Ace::access_allowed(sid, mask))
    }

    /// Add an access denied ACE
    pub fn add_access_denied(&mut self, sid: Sid, mask: u32) -> bool {
        self.add_ace(Ace::access_denied(sid, mask))
    }

    /// Check if the ACL is empty
    pub fn is_empty(&self) -> bool {
        self.aces.is_empty()
    }

    /// Check if this ACL is valid
    pub fn is_valid(&self) -> bool {
        (self.revision == ACL_REVISION || self.revision == ACL_REVISION_DS)
            && self.aces.len() <= MAX_ACE_COUNT
            && self.aces.iter().all(|ace| ace.sid.is_valid())
    }
}

impl Default for Acl {
    fn default() -> Self {
        Self::new()
    }
}
