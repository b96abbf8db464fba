//! Account operations
//!
//! Accounts are reached two ways: through an account handle (privileges
//! and system access), or by SID through a policy handle (account
//! rights). Adding rights to a SID with no account creates one; removing
//! every right deletes it.

use log::info;

use super::LsaServer;
use crate::ex::Luid;
use crate::lsa::account::{default_account_descriptor, resolve_rights, SystemAccess};
use crate::lsa::enumeration::{take_page, CollectionKind, Enumerated};
use crate::lsa::policy::policy_access::POLICY_CREATE_ACCOUNT;
use crate::lsa::rights::Operation;
use crate::ob::{Handle, HandleEntry, ObjectId, ObjectKind, ObjectRef};
use crate::se::privilege;
use crate::se::{CallerIdentity, Sid};
use crate::status::{LsaResult, NtStatus};

fn account_id(entry: &HandleEntry) -> LsaResult<ObjectId> {
    match entry.object {
        ObjectRef::Account(id) => Ok(id),
        _ => Err(NtStatus::InvalidHandle),
    }
}

impl LsaServer {
    // ------------------------------------------------------------------------
    // Account Handles
    // ------------------------------------------------------------------------

    /// LsarCreateAccount
    pub fn create_account(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        sid: Sid,
        desired_access: u32,
    ) -> LsaResult<Handle> {
        let op = Operation::CreateAccount;
        self.reference(op, identity, policy)?;
        if !sid.is_valid() {
            return Err(NtStatus::InvalidSid);
        }
        let granted = self.check_target(
            op,
            identity,
            &default_account_descriptor(),
            desired_access,
            ObjectKind::Account,
        )?;

        let handle = self.store.modify(|store| {
            let id = store.allocate_id();
            store.create_account(id, sid)?;
            self.register_created(store, ObjectRef::Account(id), granted, identity)
        })?;
        info!("[LSA] account {} created by {}", sid, identity.user);
        Ok(handle)
    }

    /// LsarOpenAccount
    pub fn open_account(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        sid: Sid,
        desired_access: u32,
    ) -> LsaResult<Handle> {
        let op = Operation::OpenAccount;
        self.reference(op, identity, policy)?;
        if !sid.is_valid() {
            return Err(NtStatus::InvalidSid);
        }
        let store = self.store.read();
        let id = store.account_id(&sid)?;
        let account = store.account(id)?;
        let granted = self.check_target(op, identity, &account.descriptor, desired_access, ObjectKind::Account)?;
        self.register(ObjectRef::Account(id), granted, identity)
    }

    /// LsarEnumerateAccounts
    ///
    /// Accounts are listed in creation order.
    pub fn enumerate_accounts(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        resume_handle: u32,
        max_count: u32,
    ) -> LsaResult<Enumerated<Sid>> {
        self.reference(Operation::EnumerateAccounts, identity, policy)?;
        self.enumerations.enumerate(
            CollectionKind::Accounts,
            resume_handle,
            identity.session,
            max_count,
            |cursor, max| {
                let store = self.store.read();
                let remaining = store
                    .accounts_after(cursor)
                    .map(|(id, account)| (id.0.to_u64(), account.sid));
                take_page(remaining, max)
            },
        )
    }

    /// LsarEnumeratePrivilegesAccount
    pub fn enumerate_privileges_account(&self, identity: &CallerIdentity, account: Handle) -> LsaResult<Vec<Luid>> {
        let entry = self.reference(Operation::EnumeratePrivilegesAccount, identity, account)?;
        let id = account_id(&entry)?;
        let store = self.store.read();
        Ok(store.account(id)?.privileges.iter().copied().collect())
    }

    /// LsarAddPrivilegesToAccount
    pub fn add_privileges_to_account(
        &self,
        identity: &CallerIdentity,
        account: Handle,
        privileges: &[Luid],
    ) -> LsaResult<()> {
        let entry = self.reference(Operation::AddPrivilegesToAccount, identity, account)?;
        let id = account_id(&entry)?;
        if privileges.is_empty() {
            return Err(NtStatus::InvalidParameter);
        }
        self.store
            .modify(|store| store.account_mut(id)?.add_privileges(privileges))
    }

    /// LsarRemovePrivilegesFromAccount
    ///
    /// Either `all` is set or `privileges` names what to remove, not both.
    pub fn remove_privileges_from_account(
        &self,
        identity: &CallerIdentity,
        account: Handle,
        all: bool,
        privileges: &[Luid],
    ) -> LsaResult<()> {
        let entry = self.reference(Operation::RemovePrivilegesFromAccount, identity, account)?;
        let id = account_id(&entry)?;
        self.store
            .modify(|store| store.account_mut(id)?.remove_privileges(all, privileges))
    }

    /// LsarGetSystemAccessAccount
    pub fn get_system_access_account(&self, identity: &CallerIdentity, account: Handle) -> LsaResult<u32> {
        let entry = self.reference(Operation::GetSystemAccessAccount, identity, account)?;
        let id = account_id(&entry)?;
        Ok(self.store.read().account(id)?.system_access.bits())
    }

    /// LsarSetSystemAccessAccount
    pub fn set_system_access_account(
        &self,
        identity: &CallerIdentity,
        account: Handle,
        system_access: u32,
    ) -> LsaResult<()> {
        let entry = self.reference(Operation::SetSystemAccessAccount, identity, account)?;
        let id = account_id(&entry)?;
        let system_access = SystemAccess::from_wire(system_access)?;
        self.store.modify(|store| {
            store.account_mut(id)?.system_access = system_access;
            Ok(())
        })
    }

    // ------------------------------------------------------------------------
    // Account Rights
    // ------------------------------------------------------------------------

    /// LsarEnumerateAccountsWithUserRight
    ///
    /// Returns every account holding `right`, or every account when no
    /// right is named, in one batch.
    pub fn enumerate_accounts_with_user_right(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        right: Option<&str>,
    ) -> LsaResult<Enumerated<Sid>> {
        self.reference(Operation::EnumerateAccountsWithUserRight, identity, policy)?;
        let right = right.map(privilege::lookup_account_right).transpose()?;

        let store = self.store.read();
        let sids: Vec<Sid> = store
            .accounts_after(0)
            .filter(|(_, account)| right.map_or(true, |right| account.has_right(right)))
            .map(|(_, account)| account.sid)
            .collect();
        Ok(Enumerated::complete(sids))
    }

    /// LsarEnumerateAccountRights
    pub fn enumerate_account_rights(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        sid: Sid,
    ) -> LsaResult<Vec<&'static str>> {
        let op = Operation::EnumerateAccountRights;
        self.reference(op, identity, policy)?;
        let store = self.store.read();
        let account = store.account(store.account_id(&sid)?)?;
        self.check_target(op, identity, &account.descriptor, Self::target_access(op)?, ObjectKind::Account)?;
        Ok(account.rights())
    }

    /// LsarAddAccountRights
    ///
    /// Creates the account when the SID has none, which also takes
    /// `POLICY_CREATE_ACCOUNT` on the policy handle.
    pub fn add_account_rights(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        sid: Sid,
        rights: &[String],
    ) -> LsaResult<()> {
        let op = Operation::AddAccountRights;
        let entry = self.reference(op, identity, policy)?;
        if rights.is_empty() {
            return Err(NtStatus::InvalidParameter);
        }
        if !sid.is_valid() {
            return Err(NtStatus::InvalidSid);
        }
        resolve_rights(rights)?;
        let target = Self::target_access(op)?;

        let created = self.store.modify(|store| {
            let (id, created) = match store.account_id(&sid) {
                Ok(id) => {
                    let account = store.account(id)?;
                    self.check_target(op, identity, &account.descriptor, target, ObjectKind::Account)?;
                    (id, false)
                }
                Err(_) => {
                    self.authorize(op, &entry, POLICY_CREATE_ACCOUNT)?;
                    self.check_target(op, identity, &default_account_descriptor(), target, ObjectKind::Account)?;
                    let id = store.allocate_id();
                    store.create_account(id, sid)?;
                    (id, true)
                }
            };
            if let Err(status) = store.account_mut(id).and_then(|account| account.add_rights(rights)) {
                if created {
                    store.discard(ObjectRef::Account(id));
                }
                return Err(status);
            }
            Ok(created)
        })?;

        if created {
            info!("[LSA] account {} created to hold rights", sid);
        }
        Ok(())
    }

    /// LsarRemoveAccountRights
    ///
    /// Removing all rights deletes the account.
    pub fn remove_account_rights(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        sid: Sid,
        all: bool,
        rights: &[String],
    ) -> LsaResult<()> {
        let op = Operation::RemoveAccountRights;
        self.reference(op, identity, policy)?;
        if !all {
            if rights.is_empty() {
                return Err(NtStatus::InvalidParameter);
            }
            resolve_rights(rights)?;
        }
        let target = Self::target_access(op)?;

        self.store.modify(|store| {
            let id = store.account_id(&sid)?;
            let account = store.account(id)?;
            self.check_target(op, identity, &account.descriptor, target, ObjectKind::Account)?;
            if all {
                self.delete_in(store, ObjectRef::Account(id), identity)
            } else {
                store.account_mut(id)?.remove_rights(false, rights)
            }
        })
    }
}
