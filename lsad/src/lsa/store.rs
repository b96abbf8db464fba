//! Policy Store
//!
//! The authoritative collection of policy objects: the policy root,
//! accounts, secrets and trusted domains. Objects are keyed by an
//! [`ObjectId`] drawn from a monotonic source and indexed by their unique
//! keys:
//! - Accounts by SID
//! - Secrets by name (case-insensitive)
//! - Trusted domains by SID, DNS name and flat name (case-insensitive)
//!
//! # Locking
//! One store-wide reader/writer lock. Every mutation runs under the write
//! lock through [`PolicyStore::modify`], so concurrent writers never
//! interleave and readers never observe a half-written object. A
//! successful mutation bumps the policy modification counter.

use core::ops::Bound;
use std::collections::{BTreeMap, HashMap};

use log::{debug, info};
use spin::{RwLock, RwLockReadGuard};

use super::account::{Account, ACCOUNT_GENERIC_MAPPING};
use super::policy::{PolicyRoot, POLICY_GENERIC_MAPPING};
use super::secret::{secret_key, validate_secret_name, Secret, SECRET_GENERIC_MAPPING};
use super::trust::{
    domain_name_key, same_domain_name, AuthInformation, TrustedDomain, TrustedDomainInformationEx,
    TRUSTED_DOMAIN_GENERIC_MAPPING,
};
use crate::config::LsaConfig;
use crate::ex::LuidSource;
use crate::ob::{ObjectId, ObjectKind, ObjectRef};
use crate::se::{GenericMapping, SecurityDescriptor, Sid};
use crate::status::{LsaResult, NtStatus};

// ============================================================================
// Object Capabilities
// ============================================================================

/// Object carrying a security descriptor
pub trait SecurableObject {
    fn security_descriptor(&self) -> &SecurityDescriptor;
    fn set_security_descriptor(&mut self, sd: SecurityDescriptor);
}

/// Object that can be deleted from the store
pub trait Deletable {
    /// Remove every index entry naming this object
    fn unindex(&self, index: &mut Indexes);
}

macro_rules! securable {
    ($($ty:ty),*) => {
        $(
            impl SecurableObject for $ty {
                fn security_descriptor(&self) -> &SecurityDescriptor {
                    &self.descriptor
                }

                fn set_security_descriptor(&mut self, sd: SecurityDescriptor) {
                    self.descriptor = sd;
                }
            }
        )*
    };
}

securable!(PolicyRoot, Account, Secret, TrustedDomain);

impl Deletable for Account {
    fn unindex(&self, index: &mut Indexes) {
        index.account_sids.remove(&self.sid);
    }
}

impl Deletable for Secret {
    fn unindex(&self, index: &mut Indexes) {
        index.secret_names.remove(&secret_key(&self.name));
    }
}

impl Deletable for TrustedDomain {
    fn unindex(&self, index: &mut Indexes) {
        if let Some(sid) = self.info.sid {
            index.trust_sids.remove(&sid);
        }
        index.trust_names.remove(&domain_name_key(&self.info.name));
        index.trust_names.remove(&domain_name_key(&self.info.flat_name));
    }
}

/// Generic mapping of an object kind
pub fn generic_mapping(kind: ObjectKind) -> &'static GenericMapping {
    match kind {
        ObjectKind::Policy => &POLICY_GENERIC_MAPPING,
        ObjectKind::Account => &ACCOUNT_GENERIC_MAPPING,
        ObjectKind::Secret => &SECRET_GENERIC_MAPPING,
        ObjectKind::TrustedDomain => &TRUSTED_DOMAIN_GENERIC_MAPPING,
    }
}

// ============================================================================
// Store State
// ============================================================================

/// Unique-key indexes
#[derive(Debug, Default)]
pub struct Indexes {
    account_sids: HashMap<Sid, ObjectId>,
    secret_names: HashMap<String, ObjectId>,
    trust_sids: HashMap<Sid, ObjectId>,
    /// DNS and flat names share one namespace
    trust_names: HashMap<String, ObjectId>,
}

/// Store contents, reachable only through the store lock
#[derive(Debug)]
pub struct StoreInner {
    /// The policy singleton
    pub policy: PolicyRoot,
    accounts: BTreeMap<ObjectId, Account>,
    secrets: BTreeMap<ObjectId, Secret>,
    trusts: BTreeMap<ObjectId, TrustedDomain>,
    index: Indexes,
    /// Trusted domain deletions per user since start
    trust_deletions: HashMap<Sid, usize>,
    /// Object identities; drawn under the write lock so ids enter the
    /// store in allocation order
    ids: LuidSource,
}

/// Range of ids strictly after a cursor
fn after(cursor: u64) -> (Bound<ObjectId>, Bound<ObjectId>) {
    (
        Bound::Excluded(ObjectId(crate::ex::Luid::from_u64(cursor))),
        Bound::Unbounded,
    )
}

impl StoreInner {
    fn new(config: &LsaConfig) -> Self {
        Self {
            policy: PolicyRoot::new(config),
            accounts: BTreeMap::new(),
            secrets: BTreeMap::new(),
            trusts: BTreeMap::new(),
            index: Indexes::default(),
            trust_deletions: HashMap::new(),
            ids: LuidSource::new(),
        }
    }

    /// Allocate an identity for a new object
    pub fn allocate_id(&mut self) -> ObjectId {
        ObjectId(self.ids.allocate())
    }

    // ------------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------------

    /// Insert a new account
    pub fn create_account(&mut self, id: ObjectId, sid: Sid) -> LsaResult<()> {
        if !sid.is_valid() {
            return Err(NtStatus::InvalidSid);
        }
        if self.index.account_sids.contains_key(&sid) {
            return Err(NtStatus::ObjectNameCollision);
        }
        self.index.account_sids.insert(sid, id);
        self.accounts.insert(id, Account::new(sid));
        Ok(())
    }

    /// Find an account by SID
    pub fn account_id(&self, sid: &Sid) -> LsaResult<ObjectId> {
        self.index
            .account_sids
            .get(sid)
            .copied()
            .ok_or(NtStatus::ObjectNameNotFound)
    }

    /// Account behind a handle
    pub fn account(&self, id: ObjectId) -> LsaResult<&Account> {
        self.accounts.get(&id).ok_or(NtStatus::InvalidHandle)
    }

    pub fn account_mut(&mut self, id: ObjectId) -> LsaResult<&mut Account> {
        self.accounts.get_mut(&id).ok_or(NtStatus::InvalidHandle)
    }

    /// Accounts created after `cursor`, in creation order
    pub fn accounts_after(&self, cursor: u64) -> impl Iterator<Item = (ObjectId, &Account)> {
        self.accounts.range(after(cursor)).map(|(id, account)| (*id, account))
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    // ------------------------------------------------------------------------
    // Secrets
    // ------------------------------------------------------------------------

    /// Insert a new secret
    pub fn create_secret(&mut self, id: ObjectId, name: &str, max_name_len: usize) -> LsaResult<()> {
        validate_secret_name(name, max_name_len)?;
        let key = secret_key(name);
        if self.index.secret_names.contains_key(&key) {
            return Err(NtStatus::ObjectNameCollision);
        }
        self.index.secret_names.insert(key, id);
        self.secrets.insert(id, Secret::new(name));
        Ok(())
    }

    /// Find a secret by name
    pub fn secret_id(&self, name: &str) -> LsaResult<ObjectId> {
        self.index
            .secret_names
            .get(&secret_key(name))
            .copied()
            .ok_or(NtStatus::ObjectNameNotFound)
    }

    pub fn secret(&self, id: ObjectId) -> LsaResult<&Secret> {
        self.secrets.get(&id).ok_or(NtStatus::InvalidHandle)
    }

    pub fn secret_mut(&mut self, id: ObjectId) -> LsaResult<&mut Secret> {
        self.secrets.get_mut(&id).ok_or(NtStatus::InvalidHandle)
    }

    pub fn secret_count(&self) -> usize {
        self.secrets.len()
    }

    // ------------------------------------------------------------------------
    // Trusted Domains
    // ------------------------------------------------------------------------

    /// Insert a new trusted domain
    ///
    /// # Checks, in order
    /// 1. Field validation (name, length, SID, attributes)
    /// 2. The trust must not name the local domain
    /// 3. SID, DNS name and flat name must all be unused
    /// 4. Creator and database quotas
    pub fn create_trust(
        &mut self,
        id: ObjectId,
        info: TrustedDomainInformationEx,
        auth: AuthInformation,
        creator: Sid,
        config: &LsaConfig,
    ) -> LsaResult<()> {
        info.validate(config.max_name_len)?;

        let primary = self.policy.primary_domain();
        let account = self.policy.account_domain();
        let (dns_domain, _) = self.policy.dns_names();
        let local_sid = info
            .sid
            .map_or(false, |sid| primary.sid == Some(sid) || account.sid == Some(sid));
        let local_name = [&primary.name, &dns_domain, &account.name]
            .iter()
            .any(|local| same_domain_name(local, &info.name) || same_domain_name(local, &info.flat_name));
        if local_sid || local_name {
            return Err(NtStatus::CurrentDomainNotAllowed);
        }

        let name = domain_name_key(&info.name);
        let flat = domain_name_key(&info.flat_name);
        if info.sid.map_or(false, |sid| self.index.trust_sids.contains_key(&sid))
            || self.index.trust_names.contains_key(&name)
            || self.index.trust_names.contains_key(&flat)
        {
            return Err(NtStatus::ObjectNameCollision);
        }

        let created_by_caller = self.trusts.values().filter(|t| t.creator == creator).count();
        if created_by_caller >= config.per_user_trust_quota {
            return Err(NtStatus::PerUserTrustQuotaExceeded);
        }
        if self.trusts.len() >= config.all_user_trust_quota {
            return Err(NtStatus::AllUserTrustQuotaExceeded);
        }

        if let Some(sid) = info.sid {
            self.index.trust_sids.insert(sid, id);
        }
        self.index.trust_names.insert(name, id);
        self.index.trust_names.insert(flat, id);
        self.trusts.insert(id, TrustedDomain::new(info, auth, creator));
        Ok(())
    }

    /// Find a trusted domain by SID
    pub fn trust_id_by_sid(&self, sid: &Sid) -> LsaResult<ObjectId> {
        self.index
            .trust_sids
            .get(sid)
            .copied()
            .ok_or(NtStatus::NoSuchDomain)
    }

    /// Find a trusted domain by DNS or flat name
    pub fn trust_id_by_name(&self, name: &str) -> LsaResult<ObjectId> {
        self.index
            .trust_names
            .get(&domain_name_key(name))
            .copied()
            .ok_or(NtStatus::ObjectNameNotFound)
    }

    pub fn trust(&self, id: ObjectId) -> LsaResult<&TrustedDomain> {
        self.trusts.get(&id).ok_or(NtStatus::InvalidHandle)
    }

    pub fn trust_mut(&mut self, id: ObjectId) -> LsaResult<&mut TrustedDomain> {
        self.trusts.get_mut(&id).ok_or(NtStatus::InvalidHandle)
    }

    /// Trusted domains created after `cursor`, in creation order
    pub fn trusts_after(&self, cursor: u64) -> impl Iterator<Item = (ObjectId, &TrustedDomain)> {
        self.trusts.range(after(cursor)).map(|(id, trust)| (*id, trust))
    }

    /// Every trusted domain except `id`
    pub fn other_trusts(&self, id: ObjectId) -> impl Iterator<Item = &TrustedDomain> + Clone {
        self.trusts
            .iter()
            .filter(move |(other, _)| **other != id)
            .map(|(_, trust)| trust)
    }

    pub fn trust_count(&self) -> usize {
        self.trusts.len()
    }

    /// Fail if `caller` has used up its trusted domain deletions
    pub fn check_trust_delete_quota(&self, caller: &Sid, config: &LsaConfig) -> LsaResult<()> {
        let used = self.trust_deletions.get(caller).copied().unwrap_or(0);
        if used >= config.per_user_delete_trust_quota {
            return Err(NtStatus::UserDeleteTrustQuotaExceeded);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Generic Object Operations
    // ------------------------------------------------------------------------

    fn securable(&self, object: ObjectRef) -> LsaResult<&dyn SecurableObject> {
        let missing = NtStatus::InvalidHandle;
        let securable: &dyn SecurableObject = match object {
            ObjectRef::Policy => &self.policy,
            ObjectRef::Account(id) => self.accounts.get(&id).ok_or(missing)?,
            ObjectRef::Secret(id) => self.secrets.get(&id).ok_or(missing)?,
            ObjectRef::TrustedDomain(id) => self.trusts.get(&id).ok_or(missing)?,
        };
        Ok(securable)
    }

    fn securable_mut(&mut self, object: ObjectRef) -> LsaResult<&mut dyn SecurableObject> {
        let missing = NtStatus::InvalidHandle;
        let securable: &mut dyn SecurableObject = match object {
            ObjectRef::Policy => &mut self.policy,
            ObjectRef::Account(id) => self.accounts.get_mut(&id).ok_or(missing)?,
            ObjectRef::Secret(id) => self.secrets.get_mut(&id).ok_or(missing)?,
            ObjectRef::TrustedDomain(id) => self.trusts.get_mut(&id).ok_or(missing)?,
        };
        Ok(securable)
    }

    /// Security descriptor of an object
    pub fn descriptor(&self, object: ObjectRef) -> LsaResult<&SecurityDescriptor> {
        Ok(self.securable(object)?.security_descriptor())
    }

    /// Replace the security descriptor of an object
    pub fn set_descriptor(&mut self, object: ObjectRef, sd: SecurityDescriptor) -> LsaResult<()> {
        self.securable_mut(object)?.set_security_descriptor(sd);
        Ok(())
    }

    fn remove(&mut self, object: ObjectRef) -> LsaResult<()> {
        fn remove_from<T: Deletable>(map: &mut BTreeMap<ObjectId, T>, id: ObjectId, index: &mut Indexes) -> LsaResult<()> {
            let object = map.remove(&id).ok_or(NtStatus::InvalidHandle)?;
            object.unindex(index);
            Ok(())
        }

        match object {
            ObjectRef::Policy => Err(NtStatus::InvalidParameter),
            ObjectRef::Account(id) => remove_from(&mut self.accounts, id, &mut self.index),
            ObjectRef::Secret(id) => remove_from(&mut self.secrets, id, &mut self.index),
            ObjectRef::TrustedDomain(id) => remove_from(&mut self.trusts, id, &mut self.index),
        }
    }

    /// Delete an object and its index entries
    ///
    /// `caller` is charged for trusted domain deletions. The policy root
    /// cannot be deleted.
    pub fn delete(&mut self, object: ObjectRef, caller: &Sid) -> LsaResult<()> {
        self.remove(object)?;
        if object.kind() == ObjectKind::TrustedDomain {
            *self.trust_deletions.entry(*caller).or_insert(0) += 1;
        }
        info!("[LSA] deleted {} {:?}", object.kind().name(), object.id());
        Ok(())
    }

    /// Take back an object whose creation could not complete
    pub fn discard(&mut self, object: ObjectRef) {
        if self.remove(object).is_ok() {
            debug!("[LSA] discarded {} {:?}", object.kind().name(), object.id());
        }
    }

    /// Check that a handle's object still exists
    pub fn exists(&self, object: ObjectRef) -> bool {
        self.securable(object).is_ok()
    }
}

// ============================================================================
// Store
// ============================================================================

/// The policy store
#[derive(Debug)]
pub struct PolicyStore {
    inner: RwLock<StoreInner>,
}

impl PolicyStore {
    pub fn new(config: &LsaConfig) -> Self {
        Self {
            inner: RwLock::new(StoreInner::new(config)),
        }
    }

    /// Shared access for queries and enumeration
    pub fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read()
    }

    /// Run a mutation under the write lock
    ///
    /// The modification counter is bumped only when `f` succeeds. `f` must
    /// leave the store unchanged when it fails.
    pub fn modify<R>(&self, f: impl FnOnce(&mut StoreInner) -> LsaResult<R>) -> LsaResult<R> {
        let mut inner = self.inner.write();
        let result = f(&mut inner)?;
        inner.policy.bump_modified();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PRIMARY_DOMAIN_SID;
    use crate::lsa::trust::{TrustAttributes, TrustDirection, TrustType};
    use crate::se::sid::identifier_authority::SECURITY_NT_AUTHORITY;
    use crate::se::sid::{SID_BUILTIN_USERS, SID_LOCAL_SYSTEM};

    fn store() -> (PolicyStore, LsaConfig) {
        let config = LsaConfig::default();
        (PolicyStore::new(&config), config)
    }

    fn next_id(store: &PolicyStore) -> ObjectId {
        store.modify(|s| Ok(s.allocate_id())).unwrap()
    }

    fn domain_sid(n: u32) -> Sid {
        Sid::from_array(SECURITY_NT_AUTHORITY, [21, 7, 8, n])
    }

    fn trust_info(name: &str, flat: &str, sid: Sid) -> TrustedDomainInformationEx {
        TrustedDomainInformationEx {
            name: String::from(name),
            flat_name: String::from(flat),
            sid: Some(sid),
            trust_direction: TrustDirection::Bidirectional,
            trust_type: TrustType::Uplevel,
            trust_attributes: TrustAttributes::empty(),
        }
    }

    #[test]
    fn test_account_uniqueness() {
        let (store, _) = store();
        let a = next_id(&store);
        let b = next_id(&store);
        store.modify(|s| s.create_account(a, SID_BUILTIN_USERS)).unwrap();
        assert_eq!(
            store.modify(|s| s.create_account(b, SID_BUILTIN_USERS)),
            Err(NtStatus::ObjectNameCollision)
        );
        assert_eq!(store.read().account_id(&SID_BUILTIN_USERS), Ok(a));
        assert_eq!(store.read().account_count(), 1);
    }

    #[test]
    fn test_modification_counter() {
        let (store, _) = store();
        let before = store.read().policy.modification().modified_id;
        let id = store
            .modify(|s| {
                let id = s.allocate_id();
                s.create_account(id, SID_BUILTIN_USERS)?;
                Ok(id)
            })
            .unwrap();
        let _ = store.modify(|s| s.create_account(id, SID_BUILTIN_USERS));
        assert_eq!(store.read().policy.modification().modified_id, before + 1);
    }

    #[test]
    fn test_secret_names_case_insensitive() {
        let (store, config) = store();
        let a = next_id(&store);
        store
            .modify(|s| s.create_secret(a, "MySecret", config.max_secret_name_len))
            .unwrap();
        let b = next_id(&store);
        assert_eq!(
            store.modify(|s| s.create_secret(b, "MYSECRET", config.max_secret_name_len)),
            Err(NtStatus::ObjectNameCollision)
        );
        assert_eq!(store.read().secret_id("mysecret"), Ok(a));
    }

    #[test]
    fn test_trust_keys_are_independent() {
        let (store, config) = store();
        let first = next_id(&store);
        store
            .modify(|s| {
                s.create_trust(first, trust_info("a.com", "A", domain_sid(1)), Default::default(), SID_LOCAL_SYSTEM, &config)
            })
            .unwrap();

        for info in [
            trust_info("b.com", "B", domain_sid(1)),
            trust_info("A.COM", "B", domain_sid(2)),
            trust_info("b.com", "a", domain_sid(2)),
        ] {
            let id = next_id(&store);
            assert_eq!(
                store.modify(|s| s.create_trust(id, info, Default::default(), SID_LOCAL_SYSTEM, &config)),
                Err(NtStatus::ObjectNameCollision)
            );
        }
        assert_eq!(store.read().trust_count(), 1);
        assert_eq!(store.read().trust_id_by_name("a"), Ok(first));
        assert_eq!(store.read().trust_id_by_sid(&domain_sid(3)), Err(NtStatus::NoSuchDomain));
    }

    #[test]
    fn test_trust_current_domain() {
        let (store, config) = store();
        let id = next_id(&store);
        assert_eq!(
            store.modify(|s| {
                s.create_trust(id, trust_info("x.com", "X", DEFAULT_PRIMARY_DOMAIN_SID), Default::default(), SID_LOCAL_SYSTEM, &config)
            }),
            Err(NtStatus::CurrentDomainNotAllowed)
        );
    }

    #[test]
    fn test_trust_quotas() {
        let config = LsaConfig {
            per_user_trust_quota: 1,
            all_user_trust_quota: 2,
            ..LsaConfig::default()
        };
        let store = PolicyStore::new(&config);
        let create = |n: u32, creator: Sid| {
            let id = next_id(&store);
            let name = format!("d{}.com", n);
            let flat = format!("D{}", n);
            store.modify(|s| s.create_trust(id, trust_info(&name, &flat, domain_sid(n)), Default::default(), creator, &config))
        };
        create(1, SID_LOCAL_SYSTEM).unwrap();
        assert_eq!(create(2, SID_LOCAL_SYSTEM), Err(NtStatus::PerUserTrustQuotaExceeded));
        create(3, SID_BUILTIN_USERS).unwrap();
        assert_eq!(create(4, domain_sid(99)), Err(NtStatus::AllUserTrustQuotaExceeded));
    }

    #[test]
    fn test_delete_unindexes() {
        let (store, config) = store();
        let id = next_id(&store);
        store
            .modify(|s| s.create_trust(id, trust_info("a.com", "A", domain_sid(1)), Default::default(), SID_LOCAL_SYSTEM, &config))
            .unwrap();
        store
            .modify(|s| s.delete(ObjectRef::TrustedDomain(id), &SID_LOCAL_SYSTEM))
            .unwrap();
        let inner = store.read();
        assert_eq!(inner.trust_id_by_name("A.com"), Err(NtStatus::ObjectNameNotFound));
        assert!(!inner.exists(ObjectRef::TrustedDomain(id)));
        assert_eq!(inner.trust_deletions.get(&SID_LOCAL_SYSTEM), Some(&1));
    }

    #[test]
    fn test_delete_policy_refused() {
        let (store, _) = store();
        assert_eq!(
            store.modify(|s| s.delete(ObjectRef::Policy, &SID_LOCAL_SYSTEM)),
            Err(NtStatus::InvalidParameter)
        );
    }

    #[test]
    fn test_cursor_iteration() {
        let (store, _) = store();
        let ids: Vec<ObjectId> = (0..3).map(|_| next_id(&store)).collect();
        for (n, id) in ids.iter().enumerate() {
            let sid = domain_sid(n as u32 + 1);
            store.modify(|s| s.create_account(*id, sid)).unwrap();
        }
        let inner = store.read();
        let after_first: Vec<ObjectId> = inner.accounts_after(ids[0].0.to_u64()).map(|(id, _)| id).collect();
        assert_eq!(after_first, ids[1..].to_vec());
        assert_eq!(inner.accounts_after(0).count(), 3);
    }
}
