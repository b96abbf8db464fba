//! Policy handle operations: bootstrap open and policy information

use log::info;

use super::LsaServer;
use crate::lsa::policy::{DomainInformation, DomainInformationClass, PolicyInformation, PolicyInformationClass};
use crate::lsa::rights::{domain_class_rights, policy_class_rights, Operation};
use crate::ob::{Handle, ObjectKind, ObjectRef};
use crate::se::CallerIdentity;
use crate::status::LsaResult;

impl LsaServer {
    /// LsarOpenPolicy
    ///
    /// `system_name` is accepted for compatibility and ignored.
    pub fn open_policy(
        &self,
        identity: &CallerIdentity,
        system_name: Option<&str>,
        desired_access: u32,
    ) -> LsaResult<Handle> {
        self.open_policy_as(Operation::OpenPolicy, identity, system_name, desired_access)
    }

    /// LsarOpenPolicy2
    pub fn open_policy2(
        &self,
        identity: &CallerIdentity,
        system_name: Option<&str>,
        desired_access: u32,
    ) -> LsaResult<Handle> {
        self.open_policy_as(Operation::OpenPolicy2, identity, system_name, desired_access)
    }

    fn open_policy_as(
        &self,
        op: Operation,
        identity: &CallerIdentity,
        _system_name: Option<&str>,
        desired_access: u32,
    ) -> LsaResult<Handle> {
        self.begin(op, identity)?;
        let store = self.store.read();
        let granted = self.check_target(
            op,
            identity,
            &store.policy.descriptor,
            desired_access,
            ObjectKind::Policy,
        )?;
        self.register(ObjectRef::Policy, granted, identity)
    }

    /// LsarQueryInformationPolicy
    pub fn query_information_policy(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        info_class: u32,
    ) -> LsaResult<PolicyInformation> {
        self.query_policy_as(Operation::QueryInformationPolicy, identity, policy, info_class)
    }

    /// LsarQueryInformationPolicy2
    pub fn query_information_policy2(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        info_class: u32,
    ) -> LsaResult<PolicyInformation> {
        self.query_policy_as(Operation::QueryInformationPolicy2, identity, policy, info_class)
    }

    fn query_policy_as(
        &self,
        op: Operation,
        identity: &CallerIdentity,
        policy: Handle,
        info_class: u32,
    ) -> LsaResult<PolicyInformation> {
        let entry = self.reference(op, identity, policy)?;
        let class = PolicyInformationClass::from_u32(info_class)?;
        let access = self.query_right(policy_class_rights(class))?;
        self.authorize(op, &entry, access)?;
        self.store.read().policy.query(class)
    }

    /// LsarSetInformationPolicy
    pub fn set_information_policy(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        info_class: u32,
        info: PolicyInformation,
    ) -> LsaResult<()> {
        self.set_policy_as(Operation::SetInformationPolicy, identity, policy, info_class, info)
    }

    /// LsarSetInformationPolicy2
    pub fn set_information_policy2(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        info_class: u32,
        info: PolicyInformation,
    ) -> LsaResult<()> {
        self.set_policy_as(Operation::SetInformationPolicy2, identity, policy, info_class, info)
    }

    fn set_policy_as(
        &self,
        op: Operation,
        identity: &CallerIdentity,
        policy: Handle,
        info_class: u32,
        info: PolicyInformation,
    ) -> LsaResult<()> {
        let entry = self.reference(op, identity, policy)?;
        let class = PolicyInformationClass::from_u32(info_class)?;
        let access = self.set_right(policy_class_rights(class))?;
        self.authorize(op, &entry, access)?;
        self.store.modify(|store| store.policy.set(class, info))?;
        info!("[LSA] policy {:?} set by {}", class, identity.user);
        Ok(())
    }

    /// LsarQueryDomainInformationPolicy
    pub fn query_domain_information_policy(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        info_class: u32,
    ) -> LsaResult<DomainInformation> {
        let op = Operation::QueryDomainInformationPolicy;
        let entry = self.reference(op, identity, policy)?;
        let class = DomainInformationClass::from_u32(info_class)?;
        let access = self.query_right(domain_class_rights(class))?;
        self.authorize(op, &entry, access)?;
        self.store.read().policy.query_domain(class)
    }

    /// LsarSetDomainInformationPolicy
    ///
    /// `None` clears the class.
    pub fn set_domain_information_policy(
        &self,
        identity: &CallerIdentity,
        policy: Handle,
        info_class: u32,
        info: Option<DomainInformation>,
    ) -> LsaResult<()> {
        let op = Operation::SetDomainInformationPolicy;
        let entry = self.reference(op, identity, policy)?;
        let class = DomainInformationClass::from_u32(info_class)?;
        let access = self.set_right(domain_class_rights(class))?;
        self.authorize(op, &entry, access)?;
        self.store.modify(|store| store.policy.set_domain(class, info))
    }
}
