//! Trusted domain operations
//!
//! Trusted domain objects are reachable through their own handles, or by
//! SID or name through a policy handle. Lookups by SID report an absent
//! trust as `NoSuchDomain`; lookups by name as `ObjectNameNotFound`.
//!
//! # Forest Trust Information
//! Setting forest trust information needs a directory service, the
//! primary domain controller role and a forest-transitive trust. Incoming
//! records are checked for collisions with the local forest and with every
//! other trust's records; colliding records are disabled and reported.
//! With `check_only` the collisions are reported and nothing is stored.

use log::info;

use super::LsaServer;
use crate::config::ServerRole;
use crate::lsa::enumeration::{take_page, CollectionKind, Enumerated};
use crate::lsa::policy::PolicyRoot;
use crate::lsa::rights::{trusted_domain_class_rights, Operation};
use crate::lsa::store::StoreInner;
use crate::lsa::trust::{
    default_trust_descriptor, detect_collisions, AuthInformation, CollisionRecord, ForestTrustInformation,
    ForestTrustRecordType, LocalForest, TrustAttributes, TrustDirection, TrustType, TrustedDomainInformation,
    TrustedDomainInformationClass, TrustedDomainInformationEx,
};
use crate::ob::{Handle, HandleEntry, ObjectId, ObjectKind, ObjectRef};
use crate::se::{CallerIdentity, Sid};
use crate::status::{LsaResult, NtStatus};

/// Entry of a basic trusted domain listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustInformation {
    /// NetBIOS name
    pub name: String,
    pub sid: Option<Sid>,
}

fn trust_id(entry: &HandleEntry) -> LsaResult<ObjectId> {
    match entry.object {
        ObjectRef::TrustedDomain(id) => Ok(id),
        _ => Err(NtStatus::InvalidHandle),
    }
}

fn local_forest(policy: &PolicyRoot) -> LocalForest {
    let primary = policy.primary_domain();
    let (dns_domain_name, dns_forest_name) = policy.dns_names();
    LocalForest {
        dns_domain_name,
        dns_forest_name,
        netbios_name: primary.name,
        domain_sid: primary.sid,
    }
}

/// How a policy-handle operation names its trusted domain
#[derive(Clone, Copy)]
enum TrustKey<'a> {
    Sid(&'a Sid),
    Name(&'a str),
}

impl TrustKey<'_> {
    fn resolve(self, store: &StoreInner) -> LsaResult<ObjectId> {
        match self {
            TrustKey::Sid(sid) => store.trust_id_by_sid(sid),
            TrustKey::Name(name) => store.trust_id_by_name(name),
        }
    }
}

impl LsaServer {
    // ------------------------------------------------------------------------
    // Create / Open
    // ------------------------------------------------------------------------

    /// LsarCreateTrustedDomain
    ///
    /// The legacy form: an outbound downlevel trust named by its NetBIOS
    /// name alone.
    pub fn create_trusted_domain(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        name: &str,
        sid: Option<Sid>,
        desired_access: u32,
    ) -> LsaResult<Handle> {
        let info = TrustedDomainInformationEx {
            name: String::from(name),
            flat_name: String::from(name),
            sid,
            trust_direction: TrustDirection::Outbound,
            trust_type: TrustType::Downlevel,
            trust_attributes: TrustAttributes::empty(),
        };
        self.create_trust_as(
            Operation::CreateTrustedDomain,
            identity,
            policy,
            info,
            AuthInformation::default(),
            desired_access,
        )
    }

    /// LsarCreateTrustedDomainEx
    pub fn create_trusted_domain_ex(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        info: TrustedDomainInformationEx,
        auth: AuthInformation,
        desired_access: u32,
    ) -> LsaResult<Handle> {
        self.create_trust_as(Operation::CreateTrustedDomainEx, identity, policy, info, auth, desired_access)
    }

    /// LsarCreateTrustedDomainEx2
    pub fn create_trusted_domain_ex2(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        info: TrustedDomainInformationEx,
        auth: AuthInformation,
        desired_access: u32,
    ) -> LsaResult<Handle> {
        self.create_trust_as(Operation::CreateTrustedDomainEx2, identity, policy, info, auth, desired_access)
    }

    fn create_trust_as(
        &self,
        op: Operation,
        identity: &CallerIdentity,
        policy: Handle,
        info: TrustedDomainInformationEx,
        auth: AuthInformation,
        desired_access: u32,
    ) -> LsaResult<Handle> {
        self.reference(op, identity, policy)?;
        let granted = self.check_target(
            op,
            identity,
            &default_trust_descriptor(),
            desired_access,
            ObjectKind::TrustedDomain,
        )?;

        let name = info.name.clone();
        let handle = self.store.modify(|store| {
            let id = store.allocate_id();
            store.create_trust(id, info, auth, identity.user, &self.config)?;
            self.register_created(store, ObjectRef::TrustedDomain(id), granted, identity)
        })?;
        info!("[LSA] trusted domain {} created by {}", name, identity.user);
        Ok(handle)
    }

    /// LsarOpenTrustedDomain
    pub fn open_trusted_domain(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        sid: Sid,
        desired_access: u32,
    ) -> LsaResult<Handle> {
        if !sid.is_valid() {
            self.reference(Operation::OpenTrustedDomain, identity, policy)?;
            return Err(NtStatus::InvalidSid);
        }
        self.open_trust_as(Operation::OpenTrustedDomain, identity, policy, TrustKey::Sid(&sid), desired_access)
    }

    /// LsarOpenTrustedDomainByName
    pub fn open_trusted_domain_by_name(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        name: &str,
        desired_access: u32,
    ) -> LsaResult<Handle> {
        self.open_trust_as(
            Operation::OpenTrustedDomainByName,
            identity,
            policy,
            TrustKey::Name(name),
            desired_access,
        )
    }

    fn open_trust_as(
        &self,
        op: Operation,
        identity: &CallerIdentity,
        policy: Handle,
        key: TrustKey<'_>,
        desired_access: u32,
    ) -> LsaResult<Handle> {
        self.reference(op, identity, policy)?;
        let store = self.store.read();
        let id = key.resolve(&store)?;
        let trust = store.trust(id)?;
        let granted = self.check_target(op, identity, &trust.descriptor, desired_access, ObjectKind::TrustedDomain)?;
        self.register(ObjectRef::TrustedDomain(id), granted, identity)
    }

    // ------------------------------------------------------------------------
    // Enumeration
    // ------------------------------------------------------------------------

    /// LsarEnumerateTrustedDomains
    ///
    /// Trusts are listed in creation order.
    pub fn enumerate_trusted_domains(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        resume_handle: u32,
        max_count: u32,
    ) -> LsaResult<Enumerated<TrustInformation>> {
        self.reference(Operation::EnumerateTrustedDomains, identity, policy)?;
        self.enumerations.enumerate(
            CollectionKind::TrustedDomains,
            resume_handle,
            identity.session,
            max_count,
            |cursor, max| {
                let store = self.store.read();
                let remaining = store.trusts_after(cursor).map(|(id, trust)| {
                    let entry = TrustInformation {
                        name: trust.info.flat_name.clone(),
                        sid: trust.info.sid,
                    };
                    (id.0.to_u64(), entry)
                });
                take_page(remaining, max)
            },
        )
    }

    /// LsarEnumerateTrustedDomainsEx
    pub fn enumerate_trusted_domains_ex(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        resume_handle: u32,
        max_count: u32,
    ) -> LsaResult<Enumerated<TrustedDomainInformationEx>> {
        self.reference(Operation::EnumerateTrustedDomainsEx, identity, policy)?;
        self.enumerations.enumerate(
            CollectionKind::TrustedDomainsEx,
            resume_handle,
            identity.session,
            max_count,
            |cursor, max| {
                let store = self.store.read();
                let remaining = store
                    .trusts_after(cursor)
                    .map(|(id, trust)| (id.0.to_u64(), trust.info.clone()));
                take_page(remaining, max)
            },
        )
    }

    // ------------------------------------------------------------------------
    // Information
    // ------------------------------------------------------------------------

    /// LsarQueryInfoTrustedDomain
    pub fn query_info_trusted_domain(
        &self,
        identity: &CallerIdentity,
        trusted_domain: Handle,
        info_class: u32,
    ) -> LsaResult<TrustedDomainInformation> {
        let op = Operation::QueryInfoTrustedDomain;
        let entry = self.reference(op, identity, trusted_domain)?;
        let id = trust_id(&entry)?;
        let class = TrustedDomainInformationClass::from_u32(info_class)?;
        let access = self.query_right(trusted_domain_class_rights(class))?;
        self.authorize(op, &entry, access)?;
        Ok(self.store.read().trust(id)?.query(class))
    }

    /// LsarSetInformationTrustedDomain
    pub fn set_information_trusted_domain(
        &self,
        identity: &CallerIdentity,
        trusted_domain: Handle,
        info_class: u32,
        info: TrustedDomainInformation,
    ) -> LsaResult<()> {
        let op = Operation::SetInformationTrustedDomain;
        let entry = self.reference(op, identity, trusted_domain)?;
        let id = trust_id(&entry)?;
        let class = TrustedDomainInformationClass::from_u32(info_class)?;
        let access = self.set_right(trusted_domain_class_rights(class))?;
        if info.class() != class {
            return Err(NtStatus::InvalidParameter);
        }
        self.authorize(op, &entry, access)?;
        self.store.modify(|store| store.trust_mut(id)?.set(info))
    }

    /// LsarQueryTrustedDomainInfo
    pub fn query_trusted_domain_info(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        sid: Sid,
        info_class: u32,
    ) -> LsaResult<TrustedDomainInformation> {
        self.query_trust_as(Operation::QueryTrustedDomainInfo, identity, policy, TrustKey::Sid(&sid), info_class)
    }

    /// LsarQueryTrustedDomainInfoByName
    pub fn query_trusted_domain_info_by_name(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        name: &str,
        info_class: u32,
    ) -> LsaResult<TrustedDomainInformation> {
        self.query_trust_as(
            Operation::QueryTrustedDomainInfoByName,
            identity,
            policy,
            TrustKey::Name(name),
            info_class,
        )
    }

    fn query_trust_as(
        &self,
        op: Operation,
        identity: &CallerIdentity,
        policy: Handle,
        key: TrustKey<'_>,
        info_class: u32,
    ) -> LsaResult<TrustedDomainInformation> {
        self.reference(op, identity, policy)?;
        let class = TrustedDomainInformationClass::from_u32(info_class)?;
        let access = self.query_right(trusted_domain_class_rights(class))?;

        let store = self.store.read();
        let trust = store.trust(key.resolve(&store)?)?;
        self.check_target(op, identity, &trust.descriptor, access, ObjectKind::TrustedDomain)?;
        Ok(trust.query(class))
    }

    /// LsarSetTrustedDomainInfo
    pub fn set_trusted_domain_info(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        sid: Sid,
        info_class: u32,
        info: TrustedDomainInformation,
    ) -> LsaResult<()> {
        self.set_trust_as(
            Operation::SetTrustedDomainInfo,
            identity,
            policy,
            TrustKey::Sid(&sid),
            info_class,
            info,
        )
    }

    /// LsarSetTrustedDomainInfoByName
    pub fn set_trusted_domain_info_by_name(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        name: &str,
        info_class: u32,
        info: TrustedDomainInformation,
    ) -> LsaResult<()> {
        self.set_trust_as(
            Operation::SetTrustedDomainInfoByName,
            identity,
            policy,
            TrustKey::Name(name),
            info_class,
            info,
        )
    }

    fn set_trust_as(
        &self,
        op: Operation,
        identity: &CallerIdentity,
        policy: Handle,
        key: TrustKey<'_>,
        info_class: u32,
        info: TrustedDomainInformation,
    ) -> LsaResult<()> {
        self.reference(op, identity, policy)?;
        let class = TrustedDomainInformationClass::from_u32(info_class)?;
        let access = self.set_right(trusted_domain_class_rights(class))?;
        if info.class() != class {
            return Err(NtStatus::InvalidParameter);
        }

        self.store.modify(|store| {
            let id = key.resolve(store)?;
            let trust = store.trust(id)?;
            self.check_target(op, identity, &trust.descriptor, access, ObjectKind::TrustedDomain)?;
            store.trust_mut(id)?.set(info)
        })
    }

    // ------------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------------

    /// LsarDeleteTrustedDomain
    pub fn delete_trusted_domain(&self, identity: &CallerIdentity, policy: Handle, sid: Sid) -> LsaResult<()> {
        let op = Operation::DeleteTrustedDomain;
        self.reference(op, identity, policy)?;
        if !sid.is_valid() {
            return Err(NtStatus::InvalidSid);
        }
        let target = Self::target_access(op)?;

        self.store.modify(|store| {
            let id = store.trust_id_by_sid(&sid)?;
            let trust = store.trust(id)?;
            self.check_target(op, identity, &trust.descriptor, target, ObjectKind::TrustedDomain)?;
            store.check_trust_delete_quota(&identity.user, &self.config)?;
            self.delete_in(store, ObjectRef::TrustedDomain(id), identity)
        })
    }

    // ------------------------------------------------------------------------
    // Forest Trust Information
    // ------------------------------------------------------------------------

    /// LsarQueryForestTrustInformation
    ///
    /// Returns the stored records of types up to `highest_record_type`.
    pub fn query_forest_trust_information(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        trusted_domain_name: &str,
        highest_record_type: u32,
    ) -> LsaResult<ForestTrustInformation> {
        let op = Operation::QueryForestTrustInformation;
        self.reference(op, identity, policy)?;
        let highest = ForestTrustRecordType::from_u32(highest_record_type)?;

        let store = self.store.read();
        let id = store
            .trust_id_by_name(trusted_domain_name)
            .map_err(|_| NtStatus::NoSuchDomain)?;
        let trust = store.trust(id)?;
        if !trust.is_forest_transitive() {
            return Err(NtStatus::InvalidDomainState);
        }
        self.check_target(op, identity, &trust.descriptor, Self::target_access(op)?, ObjectKind::TrustedDomain)?;
        trust
            .forest_trust
            .as_ref()
            .map(|info| info.filtered(highest))
            .ok_or(NtStatus::NotFound)
    }

    /// LsarSetForestTrustInformation
    ///
    /// # Returns
    /// The records that collided with existing names
    pub fn set_forest_trust_information(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        trusted_domain_name: &str,
        highest_record_type: u32,
        info: ForestTrustInformation,
        check_only: bool,
    ) -> LsaResult<Vec<CollisionRecord>> {
        let op = Operation::SetForestTrustInformation;
        self.reference(op, identity, policy)?;
        if !self.config.directory_service {
            return Err(NtStatus::DirectoryServiceRequired);
        }
        let highest = ForestTrustRecordType::from_u32(highest_record_type)?;
        info.check_record_types(highest)?;
        let mut info = info;

        if check_only {
            let store = self.store.read();
            let (_, collisions) = self.forest_collisions(op, identity, &store, trusted_domain_name, &mut info)?;
            return Ok(collisions);
        }

        let collisions = self.store.modify(|store| {
            let (id, collisions) = self.forest_collisions(op, identity, store, trusted_domain_name, &mut info)?;
            store.trust_mut(id)?.forest_trust = Some(info);
            Ok(collisions)
        })?;
        info!(
            "[LSA] forest trust information for {} stored ({} collisions)",
            trusted_domain_name,
            collisions.len()
        );
        Ok(collisions)
    }

    /// Locate the trust and mark the records of `info` that collide
    fn forest_collisions(
        &self,
        op: Operation,
        identity: &CallerIdentity,
        store: &StoreInner,
        trusted_domain_name: &str,
        info: &mut ForestTrustInformation,
    ) -> LsaResult<(ObjectId, Vec<CollisionRecord>)> {
        if store.policy.server_role() != ServerRole::Primary {
            return Err(NtStatus::InvalidDomainRole);
        }
        let id = store
            .trust_id_by_name(trusted_domain_name)
            .map_err(|_| NtStatus::NoSuchDomain)?;
        let trust = store.trust(id)?;
        if !trust.is_forest_transitive() {
            return Err(NtStatus::InvalidDomainState);
        }
        self.check_target(op, identity, &trust.descriptor, Self::target_access(op)?, ObjectKind::TrustedDomain)?;

        let local = local_forest(&store.policy);
        let others = store.other_trusts(id).filter_map(|other| {
            other
                .forest_trust
                .as_ref()
                .map(|records| (other.info.name.as_str(), records))
        });
        Ok((id, detect_collisions(info, &local, others)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LsaConfig;
    use crate::lsa::policy::policy_access::*;
    use crate::lsa::policy::PolicyInformation;
    use crate::lsa::trust::forest_trust_flags::LSA_TLN_DISABLED_CONFLICT;
    use crate::lsa::trust::trusted_domain_access::*;
    use crate::lsa::trust::{ForestTrustData, ForestTrustRecord};
    use crate::se::sid::identifier_authority::SECURITY_NT_AUTHORITY;
    use crate::se::sid::SID_BUILTIN_USERS;
    use crate::se::SessionId;

    fn setup_with(config: LsaConfig) -> (LsaServer, CallerIdentity, Handle) {
        let server = LsaServer::new(config);
        let identity = CallerIdentity::administrator(SessionId(1), SID_BUILTIN_USERS);
        let policy = server.open_policy2(&identity, None, POLICY_ALL_ACCESS).unwrap();
        (server, identity, policy)
    }

    fn setup() -> (LsaServer, CallerIdentity, Handle) {
        setup_with(LsaConfig::default())
    }

    fn domain_sid(n: u32) -> Sid {
        Sid::from_array(SECURITY_NT_AUTHORITY, [21, 11, 22, n])
    }

    fn forest_trust(name: &str, flat: &str, n: u32) -> TrustedDomainInformationEx {
        TrustedDomainInformationEx {
            name: String::from(name),
            flat_name: String::from(flat),
            sid: Some(domain_sid(n)),
            trust_direction: TrustDirection::Bidirectional,
            trust_type: TrustType::Uplevel,
            trust_attributes: TrustAttributes::FOREST_TRANSITIVE,
        }
    }

    fn top_level_names(names: &[&str]) -> ForestTrustInformation {
        ForestTrustInformation {
            records: names
                .iter()
                .map(|name| ForestTrustRecord {
                    flags: 0,
                    time: 0,
                    data: ForestTrustData::TopLevelName(String::from(*name)),
                })
                .collect(),
        }
    }

    #[test]
    fn test_create_open_query() {
        let (server, identity, policy) = setup();
        let info = forest_trust("fabrikam.com", "FABRIKAM", 1);
        let handle = server
            .create_trusted_domain_ex2(&identity, policy, info.clone(), AuthInformation::default(), TRUSTED_ALL_ACCESS)
            .unwrap();

        assert_eq!(
            server.query_info_trusted_domain(&identity, handle, 6),
            Ok(TrustedDomainInformation::InformationEx(info.clone()))
        );
        assert!(server
            .open_trusted_domain(&identity, policy, domain_sid(1), TRUSTED_QUERY_DOMAIN_NAME)
            .is_ok());
        assert!(server
            .open_trusted_domain_by_name(&identity, policy, "FABRIKAM", TRUSTED_QUERY_DOMAIN_NAME)
            .is_ok());
        assert_eq!(
            server.query_trusted_domain_info_by_name(&identity, policy, "fabrikam.com", 1),
            Ok(TrustedDomainInformation::Name {
                name: String::from("fabrikam.com")
            })
        );
    }

    #[test]
    fn test_lookup_misses() {
        let (server, identity, policy) = setup();
        assert_eq!(
            server.open_trusted_domain(&identity, policy, domain_sid(9), TRUSTED_QUERY_DOMAIN_NAME),
            Err(NtStatus::NoSuchDomain)
        );
        assert_eq!(
            server.open_trusted_domain_by_name(&identity, policy, "nowhere", TRUSTED_QUERY_DOMAIN_NAME),
            Err(NtStatus::ObjectNameNotFound)
        );
        assert_eq!(
            server.query_trusted_domain_info(&identity, policy, domain_sid(9), 1),
            Err(NtStatus::NoSuchDomain)
        );
    }

    #[test]
    fn test_collisions_on_either_key() {
        let (server, identity, policy) = setup();
        server
            .create_trusted_domain_ex(
                &identity,
                policy,
                forest_trust("a.example", "A", 1),
                AuthInformation::default(),
                TRUSTED_ALL_ACCESS,
            )
            .unwrap();
        assert_eq!(
            server.create_trusted_domain_ex(
                &identity,
                policy,
                forest_trust("b.example", "B", 1),
                AuthInformation::default(),
                TRUSTED_ALL_ACCESS,
            ),
            Err(NtStatus::ObjectNameCollision)
        );
        assert_eq!(
            server.create_trusted_domain_ex(
                &identity,
                policy,
                forest_trust("a.example", "C", 3),
                AuthInformation::default(),
                TRUSTED_ALL_ACCESS,
            ),
            Err(NtStatus::ObjectNameCollision)
        );
    }

    #[test]
    fn test_current_domain_refused() {
        let (server, identity, policy) = setup();
        let primary = match server.query_information_policy(&identity, policy, 3).unwrap() {
            PolicyInformation::PrimaryDomain(domain) => domain,
            other => panic!("unexpected {:?}", other),
        };
        let mut info = forest_trust("elsewhere.example", "ELSEWHERE", 4);
        info.sid = primary.sid;
        assert_eq!(
            server.create_trusted_domain_ex(&identity, policy, info, AuthInformation::default(), TRUSTED_ALL_ACCESS),
            Err(NtStatus::CurrentDomainNotAllowed)
        );
    }

    #[test]
    fn test_legacy_create() {
        let (server, identity, policy) = setup();
        server
            .create_trusted_domain(&identity, policy, "OLDDOM", Some(domain_sid(5)), TRUSTED_ALL_ACCESS)
            .unwrap();
        let info = server
            .query_trusted_domain_info(&identity, policy, domain_sid(5), 6)
            .unwrap();
        match info {
            TrustedDomainInformation::InformationEx(ex) => {
                assert_eq!(ex.trust_direction, TrustDirection::Outbound);
                assert_eq!(ex.trust_type, TrustType::Downlevel);
                assert_eq!(ex.name, "OLDDOM");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_information_classes() {
        let (server, identity, policy) = setup();
        let handle = server
            .create_trusted_domain_ex(
                &identity,
                policy,
                forest_trust("c.example", "C", 6),
                AuthInformation::default(),
                TRUSTED_ALL_ACCESS,
            )
            .unwrap();

        server
            .set_information_trusted_domain(&identity, handle, 3, TrustedDomainInformation::PosixOffset { offset: 0x4000 })
            .unwrap();
        assert_eq!(
            server.query_info_trusted_domain(&identity, handle, 3),
            Ok(TrustedDomainInformation::PosixOffset { offset: 0x4000 })
        );
        assert_eq!(
            server.query_info_trusted_domain(&identity, handle, 2),
            Err(NtStatus::InvalidInfoClass)
        );
        assert_eq!(
            server.set_information_trusted_domain(
                &identity,
                handle,
                1,
                TrustedDomainInformation::Name {
                    name: String::from("x")
                }
            ),
            Err(NtStatus::NotImplemented)
        );
        assert_eq!(
            server.set_information_trusted_domain(&identity, handle, 3, TrustedDomainInformation::SupportedEncryptionTypes(4)),
            Err(NtStatus::InvalidParameter)
        );
    }

    #[test]
    fn test_auth_needs_directory_service() {
        let config = LsaConfig {
            directory_service: false,
            ..LsaConfig::default()
        };
        let (server, identity, policy) = setup_with(config);
        let handle = server
            .create_trusted_domain_ex(
                &identity,
                policy,
                forest_trust("d.example", "D", 7),
                AuthInformation::default(),
                TRUSTED_ALL_ACCESS,
            )
            .unwrap();
        assert_eq!(
            server.query_info_trusted_domain(&identity, handle, 7),
            Err(NtStatus::DirectoryServiceRequired)
        );
        assert_eq!(
            server.set_forest_trust_information(&identity, policy, "d.example", 2, top_level_names(&["d.example"]), false),
            Err(NtStatus::DirectoryServiceRequired)
        );
    }

    #[test]
    fn test_delete_quota() {
        let config = LsaConfig {
            per_user_delete_trust_quota: 1,
            ..LsaConfig::default()
        };
        let (server, identity, policy) = setup_with(config);
        for n in [10, 11] {
            server
                .create_trusted_domain_ex(
                    &identity,
                    policy,
                    forest_trust(&format!("t{}.example", n), &format!("T{}", n), n),
                    AuthInformation::default(),
                    TRUSTED_ALL_ACCESS,
                )
                .unwrap();
        }
        server.delete_trusted_domain(&identity, policy, domain_sid(10)).unwrap();
        assert_eq!(
            server.delete_trusted_domain(&identity, policy, domain_sid(11)),
            Err(NtStatus::UserDeleteTrustQuotaExceeded)
        );
        assert_eq!(
            server.delete_trusted_domain(&identity, policy, domain_sid(10)),
            Err(NtStatus::NoSuchDomain)
        );
        assert_eq!(server.stats().trusted_domains, 1);
    }

    #[test]
    fn test_forest_trust_round_trip() {
        let (server, identity, policy) = setup();
        server
            .create_trusted_domain_ex(
                &identity,
                policy,
                forest_trust("contoso.example", "CONTOSO", 8),
                AuthInformation::default(),
                TRUSTED_ALL_ACCESS,
            )
            .unwrap();

        assert_eq!(
            server.query_forest_trust_information(&identity, policy, "contoso.example", 2),
            Err(NtStatus::NotFound)
        );

        let records = top_level_names(&["contoso.example"]);
        let collisions = server
            .set_forest_trust_information(&identity, policy, "contoso.example", 2, records.clone(), true)
            .unwrap();
        assert!(collisions.is_empty());
        assert_eq!(
            server.query_forest_trust_information(&identity, policy, "contoso.example", 2),
            Err(NtStatus::NotFound)
        );

        server
            .set_forest_trust_information(&identity, policy, "contoso.example", 2, records.clone(), false)
            .unwrap();
        assert_eq!(
            server.query_forest_trust_information(&identity, policy, "contoso.example", 2),
            Ok(records)
        );
        assert_eq!(
            server.query_forest_trust_information(&identity, policy, "nowhere.example", 2),
            Err(NtStatus::NoSuchDomain)
        );
        assert_eq!(
            server.query_forest_trust_information(&identity, policy, "contoso.example", 7),
            Err(NtStatus::InvalidParameter)
        );
    }

    #[test]
    fn test_forest_trust_collisions() {
        let (server, identity, policy) = setup();
        for (name, flat, n) in [("one.example", "ONE", 20), ("two.example", "TWO", 21)] {
            server
                .create_trusted_domain_ex(
                    &identity,
                    policy,
                    forest_trust(name, flat, n),
                    AuthInformation::default(),
                    TRUSTED_ALL_ACCESS,
                )
                .unwrap();
        }
        server
            .set_forest_trust_information(&identity, policy, "one.example", 2, top_level_names(&["one.example"]), false)
            .unwrap();

        let collisions = server
            .set_forest_trust_information(
                &identity,
                policy,
                "two.example",
                2,
                top_level_names(&["two.example", "sub.one.example"]),
                false,
            )
            .unwrap();
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].index, 1);
        assert_eq!(collisions[0].name, "one.example");

        let stored = server
            .query_forest_trust_information(&identity, policy, "two.example", 2)
            .unwrap();
        assert_eq!(stored.records[1].flags & LSA_TLN_DISABLED_CONFLICT, LSA_TLN_DISABLED_CONFLICT);
    }

    #[test]
    fn test_forest_trust_needs_transitive_trust() {
        let (server, identity, policy) = setup();
        let mut info = forest_trust("plain.example", "PLAIN", 30);
        info.trust_attributes = TrustAttributes::empty();
        server
            .create_trusted_domain_ex(&identity, policy, info, AuthInformation::default(), TRUSTED_ALL_ACCESS)
            .unwrap();
        assert_eq!(
            server.set_forest_trust_information(&identity, policy, "plain.example", 2, top_level_names(&["plain.example"]), false),
            Err(NtStatus::InvalidDomainState)
        );
        assert_eq!(
            server.set_forest_trust_information(&identity, policy, "absent.example", 2, top_level_names(&["x.example"]), false),
            Err(NtStatus::NoSuchDomain)
        );
    }
}
