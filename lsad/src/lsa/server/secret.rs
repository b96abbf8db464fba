//! Secret and private data operations

use log::info;

use super::LsaServer;
use crate::lsa::rights::Operation;
use crate::lsa::secret::{default_secret_descriptor, validate_secret_name, SecretValues};
use crate::ob::{Handle, HandleEntry, ObjectId, ObjectKind, ObjectRef};
use crate::se::acl::standard_rights::DELETE;
use crate::se::CallerIdentity;
use crate::status::{LsaResult, NtStatus};

fn secret_id(entry: &HandleEntry) -> LsaResult<ObjectId> {
    match entry.object {
        ObjectRef::Secret(id) => Ok(id),
        _ => Err(NtStatus::InvalidHandle),
    }
}

impl LsaServer {
    /// LsarCreateSecret
    pub fn create_secret(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        name: &str,
        desired_access: u32,
    ) -> LsaResult<Handle> {
        let op = Operation::CreateSecret;
        self.reference(op, identity, policy)?;
        validate_secret_name(name, self.config.max_secret_name_len)?;
        let granted = self.check_target(
            op,
            identity,
            &default_secret_descriptor(),
            desired_access,
            ObjectKind::Secret,
        )?;

        let handle = self.store.modify(|store| {
            let id = store.allocate_id();
            store.create_secret(id, name, self.config.max_secret_name_len)?;
            self.register_created(store, ObjectRef::Secret(id), granted, identity)
        })?;
        info!("[LSA] secret {} created by {}", name, identity.user);
        Ok(handle)
    }

    /// LsarOpenSecret
    pub fn open_secret(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        name: &str,
        desired_access: u32,
    ) -> LsaResult<Handle> {
        let op = Operation::OpenSecret;
        self.reference(op, identity, policy)?;
        validate_secret_name(name, self.config.max_secret_name_len)?;
        let store = self.store.read();
        let id = store.secret_id(name)?;
        let secret = store.secret(id)?;
        let granted = self.check_target(op, identity, &secret.descriptor, desired_access, ObjectKind::Secret)?;
        self.register(ObjectRef::Secret(id), granted, identity)
    }

    /// LsarSetSecret
    ///
    /// A new current value alone demotes the previous current value to old.
    /// Giving both replaces both; giving only an old value replaces only
    /// that.
    pub fn set_secret(
        &self,
        identity: &CallerIdentity,
        secret: Handle,
        current: Option<Vec<u8>>,
        old: Option<Vec<u8>>,
    ) -> LsaResult<()> {
        let entry = self.reference(Operation::SetSecret, identity, secret)?;
        let id = secret_id(&entry)?;
        let max = self.config.max_secret_value_len;
        self.store
            .modify(|store| store.secret_mut(id)?.set(current, old, max))
    }

    /// LsarQuerySecret
    pub fn query_secret(&self, identity: &CallerIdentity, secret: Handle) -> LsaResult<SecretValues> {
        let entry = self.reference(Operation::QuerySecret, identity, secret)?;
        let id = secret_id(&entry)?;
        Ok(self.store.read().secret(id)?.query())
    }

    /// LsarStorePrivateData
    ///
    /// Stores `data` as the current value of the named secret, creating the
    /// secret if needed. `None` deletes the secret.
    pub fn store_private_data(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        name: &str,
        data: Option<Vec<u8>>,
    ) -> LsaResult<()> {
        let op = Operation::StorePrivateData;
        self.reference(op, identity, policy)?;
        validate_secret_name(name, self.config.max_secret_name_len)?;
        let max_value = self.config.max_secret_value_len;
        if data.as_ref().map_or(false, |data| data.len() > max_value) {
            return Err(NtStatus::InvalidParameter);
        }
        let target = Self::target_access(op)?;

        self.store.modify(|store| match (store.secret_id(name), data) {
            (Ok(id), Some(data)) => {
                let secret = store.secret(id)?;
                self.check_target(op, identity, &secret.descriptor, target, ObjectKind::Secret)?;
                store.secret_mut(id)?.set(Some(data), None, max_value)
            }
            (Ok(id), None) => {
                let secret = store.secret(id)?;
                self.check_target(op, identity, &secret.descriptor, DELETE, ObjectKind::Secret)?;
                self.delete_in(store, ObjectRef::Secret(id), identity)
            }
            (Err(_), Some(data)) => {
                self.check_target(op, identity, &default_secret_descriptor(), target, ObjectKind::Secret)?;
                let id = store.allocate_id();
                store.create_secret(id, name, self.config.max_secret_name_len)?;
                if let Err(status) = store.secret_mut(id).and_then(|secret| secret.set(Some(data), None, max_value)) {
                    store.discard(ObjectRef::Secret(id));
                    return Err(status);
                }
                info!("[LSA] private data {} stored by {}", name, identity.user);
                Ok(())
            }
            (Err(status), None) => Err(status),
        })
    }

    /// LsarRetrievePrivateData
    ///
    /// # Returns
    /// The current value of the named secret
    pub fn retrieve_private_data(&self, identity: &CallerIdentity, policy: Handle, name: &str) -> LsaResult<Vec<u8>> {
        let op = Operation::RetrievePrivateData;
        self.reference(op, identity, policy)?;
        validate_secret_name(name, self.config.max_secret_name_len)?;

        let store = self.store.read();
        let secret = store.secret(store.secret_id(name)?)?;
        self.check_target(op, identity, &secret.descriptor, Self::target_access(op)?, ObjectKind::Secret)?;
        secret
            .current
            .as_ref()
            .map(|value| value.data.clone())
            .ok_or(NtStatus::ObjectNameNotFound)
    }
}
