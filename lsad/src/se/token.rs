//! Caller Identity
//!
//! The transport hands every call an opaque identity established during
//! session setup. It plays the role an access token plays for a local
//! thread:
//! - User SID: Identity of the caller
//! - Group SIDs: Group memberships
//! - Privileges: Enabled privileges (SeSecurityPrivilege, etc.)
//! - Session: The transport session the call arrived on
//!
//! Handles are bound to the session that opened them.

use core::fmt;

use crate::ex::Luid;
use super::sid::{Sid, SID_AUTHENTICATED_USERS, SID_BUILTIN_ADMINISTRATORS, SID_LOCAL_SYSTEM, SID_WORLD};

/// Maximum number of groups carried by an identity
pub const IDENTITY_MAX_GROUPS: usize = 64;

/// Transport session identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SessionId(pub u64);

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session({})", self.0)
    }
}

/// Security context of one caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Session the call arrived on
    pub session: SessionId,
    /// User SID
    pub user: Sid,
    /// Group memberships
    pub groups: Vec<Sid>,
    /// Enabled privileges
    pub privileges: Vec<Luid>,
}

impl CallerIdentity {
    /// Identity for a user with only the implicit World membership
    pub fn new(session: SessionId, user: Sid) -> Self {
        Self {
            session,
            user,
            groups: vec![SID_WORLD],
            privileges: Vec::new(),
        }
    }

    /// Authenticated member of the local Administrators alias
    pub fn administrator(session: SessionId, user: Sid) -> Self {
        let mut identity = Self::new(session, user);
        identity.add_group(SID_AUTHENTICATED_USERS);
        identity.add_group(SID_BUILTIN_ADMINISTRATORS);
        identity
    }

    /// The service's own identity
    pub fn system(session: SessionId) -> Self {
        let mut identity = Self::administrator(session, SID_LOCAL_SYSTEM);
        identity.add_privilege(crate::se::privilege::privilege_luids::SE_SECURITY_LUID);
        identity
    }

    /// Add a group membership
    pub fn add_group(&mut self, sid: Sid) -> bool {
        if self.groups.len() >= IDENTITY_MAX_GROUPS {
            return false;
        }
        if !self.groups.contains(&sid) {
            self.groups.push(sid);
        }
        true
    }

    /// Enable a privilege
    pub fn add_privilege(&mut self, luid: Luid) {
        if !self.privileges.contains(&luid) {
            self.privileges.push(luid);
        }
    }

    /// Builder form of [`add_privilege`](Self::add_privilege)
    pub fn with_privilege(mut self, luid: Luid) -> Self {
        self.add_privilege(luid);
        self
    }

    /// Check if a privilege is enabled
    pub fn is_privilege_enabled(&self, luid: Luid) -> bool {
        self.privileges.contains(&luid)
    }

    /// Check if SID is the user SID
    pub fn is_user(&self, sid: &Sid) -> bool {
        self.user == *sid
    }

    /// Check if SID is one of the groups
    pub fn has_group(&self, sid: &Sid) -> bool {
        self.groups.contains(sid)
    }

    /// Check if SID is the user or any group
    pub fn is_member(&self, sid: &Sid) -> bool {
        self.is_user(sid) || self.has_group(sid)
    }
}
