//! Policy Server
//!
//! The per-operation contract of the policy service. Every call follows the
//! same steps:
//!
//! 1. Resolve the presented handle (`InvalidHandle`)
//! 2. Check the rights recorded for the operation (`AccessDenied`)
//! 3. Validate the operation's own parameters
//! 4. Run against the store or the enumeration engine
//! 5. Register any new handle as the last step of a create or open
//!
//! # Locking
//! Store lock first, then the handle table. Handles for new objects are
//! registered while the store write lock is still held, and the object is
//! taken back if registration fails, so a failed create leaves nothing
//! behind. Deletes revoke every handle on the object under the same lock.
//!
//! # Operation Families
//! - `policy`: bootstrap open, policy and domain information
//! - `privilege`: the privilege catalog
//! - `account`: accounts, privileges and account rights
//! - `secret`: secrets and private data
//! - `trust`: trusted domains and forest trust information
//! - `security`: security descriptors and generic delete

mod account;
mod policy;
mod privilege;
mod secret;
mod security;
mod trust;

pub use trust::TrustInformation;

use core::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, trace, warn};

use super::enumeration::EnumerationContexts;
use super::rights::{access_rule, AccessRule, ClassRights, HandleRequirement, Operation, OpnumSlot};
use super::store::{generic_mapping, PolicyStore, StoreInner};
use crate::config::LsaConfig;
use crate::ob::{Handle, HandleEntry, HandleTable, ObjectKind, ObjectRef};
use crate::se::{access_check, CallerIdentity, SecurityDescriptor, SessionId};
use crate::status::{LsaResult, NtStatus};

// ============================================================================
// Statistics
// ============================================================================

struct LsaStats {
    calls: AtomicU64,
    reserved_calls: AtomicU64,
    access_denied: AtomicU64,
    handles_opened: AtomicU64,
    handles_closed: AtomicU64,
    objects_created: AtomicU64,
    objects_deleted: AtomicU64,
}

impl LsaStats {
    const fn new() -> Self {
        Self {
            calls: AtomicU64::new(0),
            reserved_calls: AtomicU64::new(0),
            access_denied: AtomicU64::new(0),
            handles_opened: AtomicU64::new(0),
            handles_closed: AtomicU64::new(0),
            objects_created: AtomicU64::new(0),
            objects_deleted: AtomicU64::new(0),
        }
    }
}

/// Policy server statistics snapshot
#[derive(Debug, Clone, Default)]
pub struct LsaStatsSnapshot {
    pub calls: u64,
    pub reserved_calls: u64,
    pub access_denied: u64,
    pub handles_opened: u64,
    pub handles_closed: u64,
    pub objects_created: u64,
    pub objects_deleted: u64,
    pub open_handles: usize,
    pub enumeration_contexts: usize,
    pub accounts: usize,
    pub secrets: usize,
    pub trusted_domains: usize,
}

/// Response to a reserved operation number: nothing to encode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoOpResponse;

// ============================================================================
// Server
// ============================================================================

/// The policy service
pub struct LsaServer {
    config: LsaConfig,
    store: PolicyStore,
    handles: HandleTable,
    enumerations: EnumerationContexts,
    stats: LsaStats,
}

impl LsaServer {
    pub fn new(config: LsaConfig) -> Self {
        let server = Self {
            store: PolicyStore::new(&config),
            handles: HandleTable::new(config.max_handles),
            enumerations: EnumerationContexts::new(&config),
            stats: LsaStats::new(),
            config,
        };
        info!(
            "[LSA] policy server started: domain {} ({}), role {:?}, directory service {}",
            server.config.primary_domain_name,
            server.config.dns_domain_name,
            server.config.server_role,
            if server.config.directory_service { "on" } else { "off" }
        );
        server
    }

    /// Configuration the server was started with
    pub fn config(&self) -> &LsaConfig {
        &self.config
    }

    /// The policy store
    pub fn store(&self) -> &PolicyStore {
        &self.store
    }

    /// Get server statistics
    pub fn stats(&self) -> LsaStatsSnapshot {
        let (accounts, secrets, trusted_domains) = {
            let store = self.store.read();
            (store.account_count(), store.secret_count(), store.trust_count())
        };
        LsaStatsSnapshot {
            calls: self.stats.calls.load(Ordering::Relaxed),
            reserved_calls: self.stats.reserved_calls.load(Ordering::Relaxed),
            access_denied: self.stats.access_denied.load(Ordering::Relaxed),
            handles_opened: self.stats.handles_opened.load(Ordering::Relaxed),
            handles_closed: self.stats.handles_closed.load(Ordering::Relaxed),
            objects_created: self.stats.objects_created.load(Ordering::Relaxed),
            objects_deleted: self.stats.objects_deleted.load(Ordering::Relaxed),
            open_handles: self.handles.count(),
            enumeration_contexts: self.enumerations.count(),
            accounts,
            secrets,
            trusted_domains,
        }
    }

    // ------------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------------

    /// LsarClose
    ///
    /// Releases the handle. The object it referenced is left untouched.
    pub fn close(&self, identity: &CallerIdentity, handle: Handle) -> LsaResult<()> {
        self.begin(Operation::Close, identity)?;
        let entry = self.handles.close(handle, identity.session)?;
        self.stats.handles_closed.fetch_add(1, Ordering::Relaxed);
        trace!("[LSA] closed {:?} ({:?})", handle, entry.object);
        Ok(())
    }

    /// Release everything a transport session holds
    ///
    /// # Returns
    /// The number of handles closed
    pub fn close_session(&self, session: SessionId) -> usize {
        let handles = self.handles.close_session(session);
        let contexts = self.enumerations.close_session(session);
        self.stats
            .handles_closed
            .fetch_add(handles as u64, Ordering::Relaxed);
        if handles > 0 || contexts > 0 {
            info!(
                "[LSA] {:?} closed: {} handles, {} enumeration contexts",
                session, handles, contexts
            );
        }
        handles
    }

    /// Accept a reserved operation number
    ///
    /// Returns `None` when `opnum` is not a reserved slot: either it names
    /// a served operation or it is past the end of the interface.
    pub fn dispatch_reserved(&self, opnum: u16) -> Option<NoOpResponse> {
        match OpnumSlot::from_u16(opnum)? {
            OpnumSlot::Reserved(slot) => {
                self.stats.reserved_calls.fetch_add(1, Ordering::Relaxed);
                debug!("[LSA] reserved opnum {}", slot);
                Some(NoOpResponse)
            }
            OpnumSlot::Operation(_) => None,
        }
    }

    // ------------------------------------------------------------------------
    // Call Plumbing
    // ------------------------------------------------------------------------

    fn begin(&self, op: Operation, identity: &CallerIdentity) -> LsaResult<&'static AccessRule> {
        self.stats.calls.fetch_add(1, Ordering::Relaxed);
        trace!("[LSA] {} from {:?}", op.name(), identity.session);
        access_rule(op).ok_or(NtStatus::NotImplemented)
    }

    /// Resolve the handle an operation presents and check its rights
    fn reference(&self, op: Operation, identity: &CallerIdentity, handle: Handle) -> LsaResult<HandleEntry> {
        let rule = self.begin(op, identity)?;
        let entry = match rule.handle {
            HandleRequirement::Kind(kind) => self.handles.validate(handle, kind, identity.session)?,
            HandleRequirement::Any => self.handles.lookup(handle, identity.session)?,
            HandleRequirement::None => return Err(NtStatus::InvalidParameter),
        };
        self.authorize(op, &entry, rule.handle_access)?;
        Ok(entry)
    }

    /// Rights needed on a second object the operation reaches
    fn target_access(op: Operation) -> LsaResult<u32> {
        access_rule(op)
            .map(|rule| rule.target_access)
            .ok_or(NtStatus::NotImplemented)
    }

    /// Check rights granted on a handle
    fn authorize(&self, op: Operation, entry: &HandleEntry, access: u32) -> LsaResult<()> {
        entry.require(access).map_err(|status| {
            self.stats.access_denied.fetch_add(1, Ordering::Relaxed);
            warn!(
                "[LSA] {} denied: handle grants {:#x}, needs {:#x}",
                op.name(),
                entry.granted_access,
                access
            );
            status
        })
    }

    /// Check `desired` against an object's descriptor
    ///
    /// # Returns
    /// The rights granted
    fn check_target(
        &self,
        op: Operation,
        identity: &CallerIdentity,
        sd: &SecurityDescriptor,
        desired: u32,
        kind: ObjectKind,
    ) -> LsaResult<u32> {
        access_check(sd, identity, desired, generic_mapping(kind)).map_err(|status| {
            self.stats.access_denied.fetch_add(1, Ordering::Relaxed);
            warn!(
                "[LSA] {} denied: {} wants {:#x} on a {}",
                op.name(),
                identity.user,
                desired,
                kind.name()
            );
            status
        })
    }

    /// Rights for querying an information class
    fn query_right(&self, rights: ClassRights) -> LsaResult<u32> {
        let access = rights.query.ok_or(NtStatus::InvalidParameter)?;
        if rights.query_requires_ds && !self.config.directory_service {
            return Err(NtStatus::DirectoryServiceRequired);
        }
        Ok(access)
    }

    /// Rights for setting an information class
    fn set_right(&self, rights: ClassRights) -> LsaResult<u32> {
        let access = rights.set.ok_or(NtStatus::NotImplemented)?;
        if rights.set_requires_ds && !self.config.directory_service {
            return Err(NtStatus::DirectoryServiceRequired);
        }
        Ok(access)
    }

    /// Register a handle to an existing object
    fn register(&self, object: ObjectRef, granted: u32, identity: &CallerIdentity) -> LsaResult<Handle> {
        let handle = self
            .handles
            .insert(object, granted, identity.session, identity.user)?;
        self.stats.handles_opened.fetch_add(1, Ordering::Relaxed);
        debug!(
            "[LSA] {:?} opened {:?} access={:#x}",
            identity.session, object, granted
        );
        Ok(handle)
    }

    /// Register a handle to an object created under the current write lock
    ///
    /// The object is discarded when no handle can be issued for it.
    fn register_created(
        &self,
        store: &mut StoreInner,
        object: ObjectRef,
        granted: u32,
        identity: &CallerIdentity,
    ) -> LsaResult<Handle> {
        match self.register(object, granted, identity) {
            Ok(handle) => {
                self.stats.objects_created.fetch_add(1, Ordering::Relaxed);
                Ok(handle)
            }
            Err(status) => {
                store.discard(object);
                Err(status)
            }
        }
    }

    /// Delete an object and revoke its handles under the current write lock
    fn delete_in(&self, store: &mut StoreInner, object: ObjectRef, identity: &CallerIdentity) -> LsaResult<()> {
        store.delete(object, &identity.user)?;
        let revoked = self.handles.invalidate_object(object);
        self.stats.objects_deleted.fetch_add(1, Ordering::Relaxed);
        self.stats
            .handles_closed
            .fetch_add(revoked as u64, Ordering::Relaxed);
        debug!("[LSA] revoked {} handles to {:?}", revoked, object);
        Ok(())
    }
}
