//! Privilege catalog operations

use super::LsaServer;
use crate::ex::Luid;
use crate::lsa::enumeration::{take_page, CollectionKind, Enumerated};
use crate::lsa::rights::Operation;
use crate::ob::Handle;
use crate::se::privilege::{self, PrivilegeDefinition, PRIVILEGE_CATALOG};
use crate::se::CallerIdentity;
use crate::status::LsaResult;

impl LsaServer {
    /// LsarEnumeratePrivileges
    ///
    /// Privileges are listed in LUID order.
    pub fn enumerate_privileges(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        resume_handle: u32,
        max_count: u32,
    ) -> LsaResult<Enumerated<PrivilegeDefinition>> {
        self.reference(Operation::EnumeratePrivileges, identity, policy)?;
        self.enumerations.enumerate(
            CollectionKind::Privileges,
            resume_handle,
            identity.session,
            max_count,
            |cursor, max| {
                let remaining = PRIVILEGE_CATALOG
                    .iter()
                    .filter(move |def| def.luid.to_u64() > cursor)
                    .map(|def| (def.luid.to_u64(), *def));
                take_page(remaining, max)
            },
        )
    }

    /// LsarLookupPrivilegeValue
    pub fn lookup_privilege_value(&self, identity: &CallerIdentity, policy: Handle, name: &str) -> LsaResult<Luid> {
        self.reference(Operation::LookupPrivilegeValue, identity, policy)?;
        privilege::lookup_privilege_value(name)
    }

    /// LsarLookupPrivilegeName
    pub fn lookup_privilege_name(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        luid: Luid,
    ) -> LsaResult<&'static str> {
        self.reference(Operation::LookupPrivilegeName, identity, policy)?;
        privilege::lookup_privilege_name(luid)
    }

    /// LsarLookupPrivilegeDisplayName
    ///
    /// # Returns
    /// The display name and the language it is written in
    pub fn lookup_privilege_display_name(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        name: &str,
        client_language: u16,
        client_system_default_language: u16,
    ) -> LsaResult<(&'static str, u16)> {
        self.reference(Operation::LookupPrivilegeDisplayName, identity, policy)?;
        privilege::lookup_privilege_display_name(name, client_language, client_system_default_language)
    }
}
