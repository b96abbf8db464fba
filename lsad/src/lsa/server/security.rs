//! Operations generic across object kinds: security descriptors and delete

use log::info;

use super::LsaServer;
use crate::lsa::rights::Operation;
use crate::ob::{Handle, ObjectKind};
use crate::se::{CallerIdentity, SecurityDescriptor, SecurityInformation};
use crate::status::{LsaResult, NtStatus};

/// Resolve the parts of a descriptor a request names
fn parse_security_information(bits: u32) -> LsaResult<SecurityInformation> {
    let info = SecurityInformation::from_bits(bits).ok_or(NtStatus::NotSupported)?;
    if info.is_empty() {
        return Err(NtStatus::InvalidParameter);
    }
    Ok(info)
}

impl LsaServer {
    /// LsarQuerySecurityObject
    ///
    /// # Returns
    /// A descriptor holding only the parts `security_information` names
    pub fn query_security_object(
        &self,
        identity: &CallerIdentity,
        object: Handle,
        security_information: u32,
    ) -> LsaResult<SecurityDescriptor> {
        let op = Operation::QuerySecurityObject;
        let entry = self.reference(op, identity, object)?;
        let info = parse_security_information(security_information)?;
        self.authorize(op, &entry, info.read_access())?;
        let store = self.store.read();
        Ok(store.descriptor(entry.object)?.select(info))
    }

    /// LsarSetSecurityObject
    ///
    /// The stored descriptor is replaced by `descriptor` as a whole. The
    /// handle needs the write rights of every part `security_information`
    /// names and of every part the replacement changes.
    pub fn set_security_object(
        &self,
        identity: &CallerIdentity,
        object: Handle,
        security_information: u32,
        descriptor: Option<SecurityDescriptor>,
    ) -> LsaResult<()> {
        let op = Operation::SetSecurityObject;
        let entry = self.reference(op, identity, object)?;
        let info = parse_security_information(security_information)?;
        let descriptor = descriptor.ok_or(NtStatus::InvalidParameter)?;
        descriptor.validate()?;
        self.authorize(op, &entry, info.write_access())?;

        self.store.modify(|store| {
            let changed = store.descriptor(entry.object)?.changed_parts(&descriptor);
            self.authorize(op, &entry, (info | changed).write_access())?;
            store.set_descriptor(entry.object, descriptor)
        })?;
        info!(
            "[LSA] descriptor of {} {:?} replaced by {}",
            entry.object.kind().name(),
            entry.object.id(),
            identity.user
        );
        Ok(())
    }

    /// LsarDeleteObject
    ///
    /// Deletes the object behind any handle but a policy handle, which
    /// fails with `InvalidParameter` whatever rights it holds. Every handle
    /// to the object, `object` included, becomes invalid.
    pub fn delete_object(&self, identity: &CallerIdentity, object: Handle) -> LsaResult<()> {
        let op = Operation::DeleteObject;
        let rule = self.begin(op, identity)?;
        let entry = self.handles.lookup(object, identity.session)?;
        if entry.object.kind() == ObjectKind::Policy {
            return Err(NtStatus::InvalidParameter);
        }
        self.authorize(op, &entry, rule.handle_access)?;
        self.store.modify(|store| {
            if entry.object.kind() == ObjectKind::TrustedDomain {
                store.check_trust_delete_quota(&identity.user, &self.config)?;
            }
            self.delete_in(store, entry.object, identity)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::LsaConfig;
    use crate::lsa::account::account_access::*;
    use crate::lsa::policy::policy_access::*;
    use crate::lsa::server::LsaServer;
    use crate::lsa::trust::trusted_domain_access::TRUSTED_ALL_ACCESS;
    use crate::lsa::trust::{AuthInformation, TrustAttributes, TrustDirection, TrustType, TrustedDomainInformationEx};
    use crate::ob::Handle;
    use crate::se::acl::standard_rights::{READ_CONTROL, WRITE_OWNER};
    use crate::se::descriptor::create_object_security_descriptor;
    use crate::se::sid::identifier_authority::SECURITY_NT_AUTHORITY;
    use crate::se::sid::{SID_BUILTIN_ADMINISTRATORS, SID_BUILTIN_USERS, SID_LOCAL_SYSTEM};
    use crate::se::{CallerIdentity, SecurityDescriptor, SessionId, Sid};
    use crate::status::NtStatus;

    const OWNER: u32 = 0x1;
    const GROUP: u32 = 0x2;
    const DACL: u32 = 0x4;
    const SACL: u32 = 0x8;

    fn setup() -> (LsaServer, CallerIdentity, Handle) {
        let server = LsaServer::new(LsaConfig::default());
        let identity = CallerIdentity::administrator(SessionId(1), SID_BUILTIN_USERS);
        let policy = server.open_policy2(&identity, None, POLICY_ALL_ACCESS).unwrap();
        (server, identity, policy)
    }

    fn account_sid(rid: u32) -> Sid {
        Sid::from_array(SECURITY_NT_AUTHORITY, [21, 1, 2, 3, rid])
    }

    #[test]
    fn test_query_selects_parts() {
        let (server, identity, policy) = setup();
        let sd = server.query_security_object(&identity, policy, OWNER).unwrap();
        assert_eq!(sd.owner, Some(SID_BUILTIN_ADMINISTRATORS));
        assert!(sd.dacl.is_none());

        let sd = server.query_security_object(&identity, policy, OWNER | DACL).unwrap();
        assert!(sd.dacl.is_some());
    }

    #[test]
    fn test_query_argument_errors() {
        let (server, identity, policy) = setup();
        assert_eq!(
            server.query_security_object(&identity, policy, 0),
            Err(NtStatus::InvalidParameter)
        );
        assert_eq!(
            server.query_security_object(&identity, policy, 0x100),
            Err(NtStatus::NotSupported)
        );
        // SACL needs ACCESS_SYSTEM_SECURITY, which POLICY_ALL_ACCESS lacks
        assert_eq!(
            server.query_security_object(&identity, policy, SACL),
            Err(NtStatus::AccessDenied)
        );
    }

    #[test]
    fn test_set_replaces_descriptor() {
        let (server, identity, policy) = setup();
        let account = server
            .create_account(&identity, policy, account_sid(1001), ACCOUNT_ALL_ACCESS)
            .unwrap();

        let user = CallerIdentity::new(SessionId(2), account_sid(1001));
        let user_policy = server.open_policy2(&user, None, POLICY_LOOKUP_NAMES).unwrap();
        assert!(server
            .open_account(&user, user_policy, account_sid(1001), ACCOUNT_VIEW)
            .is_ok());

        let mut sd = create_object_security_descriptor(ACCOUNT_ALL_ACCESS, &[]);
        sd.set_owner(SID_LOCAL_SYSTEM);
        server
            .set_security_object(&identity, account, OWNER | DACL, Some(sd))
            .unwrap();

        let stored = server.query_security_object(&identity, account, OWNER).unwrap();
        assert_eq!(stored.owner, Some(SID_LOCAL_SYSTEM));
        assert_eq!(
            server.open_account(&user, user_policy, account_sid(1001), ACCOUNT_VIEW),
            Err(NtStatus::AccessDenied)
        );
    }

    #[test]
    fn test_set_charges_every_changed_part() {
        let (server, identity, policy) = setup();
        let sid = account_sid(1004);
        server
            .create_account(&identity, policy, sid, ACCOUNT_ALL_ACCESS)
            .unwrap();
        let owner_only = server.open_account(&identity, policy, sid, WRITE_OWNER).unwrap();
        let reader = server.open_account(&identity, policy, sid, READ_CONTROL).unwrap();

        let outsider = CallerIdentity::new(SessionId(3), account_sid(4321));
        let outsider_policy = server.open_policy2(&outsider, None, POLICY_LOOKUP_NAMES).unwrap();
        assert_eq!(
            server.open_account(&outsider, outsider_policy, sid, ACCOUNT_ALL_ACCESS),
            Err(NtStatus::AccessDenied)
        );

        // Naming only the owner does not let the DACL be dropped with it
        let mut open_door = SecurityDescriptor::new();
        open_door.set_owner(SID_BUILTIN_ADMINISTRATORS);
        assert_eq!(
            server.set_security_object(&identity, owner_only, OWNER, Some(open_door)),
            Err(NtStatus::AccessDenied)
        );
        assert_eq!(
            server.open_account(&outsider, outsider_policy, sid, ACCOUNT_ALL_ACCESS),
            Err(NtStatus::AccessDenied)
        );
        let stored = server.query_security_object(&identity, reader, DACL).unwrap();
        assert!(stored.has_dacl());

        // A replacement that changes only the owner needs only WRITE_OWNER
        let mut current = server
            .query_security_object(&identity, reader, OWNER | GROUP | DACL)
            .unwrap();
        current.set_owner(SID_LOCAL_SYSTEM);
        server
            .set_security_object(&identity, owner_only, OWNER, Some(current))
            .unwrap();
        let stored = server.query_security_object(&identity, reader, OWNER).unwrap();
        assert_eq!(stored.owner, Some(SID_LOCAL_SYSTEM));
    }

    #[test]
    fn test_set_argument_errors() {
        let (server, identity, policy) = setup();
        assert_eq!(
            server.set_security_object(&identity, policy, DACL, None),
            Err(NtStatus::InvalidParameter)
        );
        assert_eq!(
            server.set_security_object(&identity, policy, DACL, Some(SecurityDescriptor::new())),
            Err(NtStatus::InvalidSecurityDescriptor)
        );

        let read_only = server
            .open_policy2(&identity, None, POLICY_VIEW_LOCAL_INFORMATION | READ_CONTROL)
            .unwrap();
        let current = server.query_security_object(&identity, read_only, OWNER | DACL).unwrap();
        assert_eq!(
            server.set_security_object(&identity, read_only, DACL, Some(current)),
            Err(NtStatus::AccessDenied)
        );
    }

    #[test]
    fn test_delete_object() {
        let (server, identity, policy) = setup();
        let account = server
            .create_account(&identity, policy, account_sid(1002), ACCOUNT_ALL_ACCESS)
            .unwrap();
        let second = server
            .open_account(&identity, policy, account_sid(1002), ACCOUNT_VIEW)
            .unwrap();

        server.delete_object(&identity, account).unwrap();
        assert_eq!(
            server.enumerate_privileges_account(&identity, second),
            Err(NtStatus::InvalidHandle)
        );
        assert_eq!(server.close(&identity, account), Err(NtStatus::InvalidHandle));
        assert_eq!(server.stats().accounts, 0);
    }

    #[test]
    fn test_delete_needs_right() {
        let (server, identity, policy) = setup();
        server
            .create_account(&identity, policy, account_sid(1003), ACCOUNT_ALL_ACCESS)
            .unwrap();
        let view = server
            .open_account(&identity, policy, account_sid(1003), ACCOUNT_VIEW)
            .unwrap();
        assert_eq!(server.delete_object(&identity, view), Err(NtStatus::AccessDenied));
        assert_eq!(server.stats().accounts, 1);
    }

    #[test]
    fn test_policy_cannot_be_deleted() {
        let (server, identity, policy) = setup();
        assert_eq!(server.delete_object(&identity, policy), Err(NtStatus::InvalidParameter));
        assert!(server.query_information_policy(&identity, policy, 6).is_ok());

        let viewer = server
            .open_policy2(&identity, None, POLICY_VIEW_LOCAL_INFORMATION)
            .unwrap();
        assert_eq!(server.delete_object(&identity, viewer), Err(NtStatus::InvalidParameter));
    }

    #[test]
    fn test_delete_trusted_domain_object() {
        let (server, identity, policy) = setup();
        let info = TrustedDomainInformationEx {
            name: String::from("gone.example"),
            flat_name: String::from("GONE"),
            sid: Some(Sid::from_array(SECURITY_NT_AUTHORITY, [21, 7, 7, 7])),
            trust_direction: TrustDirection::Inbound,
            trust_type: TrustType::Uplevel,
            trust_attributes: TrustAttributes::empty(),
        };
        let trust = server
            .create_trusted_domain_ex(&identity, policy, info, AuthInformation::default(), TRUSTED_ALL_ACCESS)
            .unwrap();
        server.delete_object(&identity, trust).unwrap();
        assert_eq!(server.stats().trusted_domains, 0);
        assert_eq!(
            server.open_trusted_domain_by_name(&identity, policy, "GONE", TRUSTED_ALL_ACCESS),
            Err(NtStatus::ObjectNameNotFound)
        );
    }
}
