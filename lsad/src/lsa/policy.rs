//! Policy Object
//!
//! The policy root is the singleton holding server-wide policy: audit
//! settings, the primary and account domain identities, the server role,
//! default quotas and the domain-wide Kerberos/EFS policy.
//!
//! Attributes are kept as a mapping from information class to value.
//! Classes that expose the same underlying data share one stored entry:
//! - PrimaryDomain, DnsDomain and DnsDomainInt
//! - AccountDomain and LocalAccountDomain
//! - AuditFullSet and AuditFullQuery
//!
//! Modification information is derived from a counter the store bumps on
//! every successful mutation.

use std::collections::BTreeMap;

use crate::config::{LsaConfig, ServerRole};
use crate::ex::query_system_time;
use crate::se::acl::standard_rights::READ_CONTROL;
use crate::se::descriptor::create_object_security_descriptor;
use crate::se::sid::{SID_ANONYMOUS_LOGON, SID_WORLD};
use crate::se::{GenericMapping, SecurityDescriptor, Sid};
use crate::status::{LsaResult, NtStatus};

// ============================================================================
// Access Rights
// ============================================================================

/// Policy access rights
pub mod policy_access {
    pub const POLICY_VIEW_LOCAL_INFORMATION: u32 = 0x00000001;
    pub const POLICY_VIEW_AUDIT_INFORMATION: u32 = 0x00000002;
    pub const POLICY_GET_PRIVATE_INFORMATION: u32 = 0x00000004;
    pub const POLICY_TRUST_ADMIN: u32 = 0x00000008;
    pub const POLICY_CREATE_ACCOUNT: u32 = 0x00000010;
    pub const POLICY_CREATE_SECRET: u32 = 0x00000020;
    pub const POLICY_CREATE_PRIVILEGE: u32 = 0x00000040;
    pub const POLICY_SET_DEFAULT_QUOTA_LIMITS: u32 = 0x00000080;
    pub const POLICY_SET_AUDIT_REQUIREMENTS: u32 = 0x00000100;
    pub const POLICY_AUDIT_LOG_ADMIN: u32 = 0x00000200;
    pub const POLICY_SERVER_ADMIN: u32 = 0x00000400;
    pub const POLICY_LOOKUP_NAMES: u32 = 0x00000800;
    pub const POLICY_NOTIFICATION: u32 = 0x00001000;
    pub const POLICY_ALL_ACCESS: u32 = 0x000F1FFF;
}

use policy_access::*;

/// Generic mapping for the policy object
pub const POLICY_GENERIC_MAPPING: GenericMapping = GenericMapping {
    generic_read: 0x00020006,
    generic_write: 0x000207F8,
    generic_execute: 0x00020801,
    generic_all: POLICY_ALL_ACCESS,
};

/// Descriptor installed on the policy object at service start
///
/// System and Administrators hold full control; everyone may read local
/// information and look up names.
pub fn default_policy_descriptor() -> SecurityDescriptor {
    create_object_security_descriptor(
        POLICY_ALL_ACCESS,
        &[
            (
                SID_WORLD,
                POLICY_VIEW_LOCAL_INFORMATION | POLICY_LOOKUP_NAMES | READ_CONTROL,
            ),
            (SID_ANONYMOUS_LOGON, POLICY_VIEW_LOCAL_INFORMATION | POLICY_LOOKUP_NAMES),
        ],
    )
}

// ============================================================================
// Information Classes
// ============================================================================

/// Policy information classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum PolicyInformationClass {
    /// Audit log info
    AuditLog = 1,
    /// Audit events info
    AuditEvents = 2,
    /// Primary domain info
    PrimaryDomain = 3,
    /// PD account info
    PdAccount = 4,
    /// Account domain info
    AccountDomain = 5,
    /// LSA server role info
    ServerRole = 6,
    /// Replica source info
    ReplicaSource = 7,
    /// Default quota info
    DefaultQuota = 8,
    /// Modification info
    Modification = 9,
    /// Audit full set info
    AuditFullSet = 10,
    /// Audit full query info
    AuditFullQuery = 11,
    /// DNS domain info
    DnsDomain = 12,
    /// DNS domain info (internal)
    DnsDomainInt = 13,
    /// Local account domain info
    LocalAccountDomain = 14,
    /// Machine account info
    MachineAccount = 15,
}

impl PolicyInformationClass {
    /// All classes in wire order
    pub const ALL: [PolicyInformationClass; 15] = [
        Self::AuditLog,
        Self::AuditEvents,
        Self::PrimaryDomain,
        Self::PdAccount,
        Self::AccountDomain,
        Self::ServerRole,
        Self::ReplicaSource,
        Self::DefaultQuota,
        Self::Modification,
        Self::AuditFullSet,
        Self::AuditFullQuery,
        Self::DnsDomain,
        Self::DnsDomainInt,
        Self::LocalAccountDomain,
        Self::MachineAccount,
    ];

    /// Resolve a wire class number
    pub fn from_u32(value: u32) -> LsaResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|class| *class as u32 == value)
            .ok_or(NtStatus::InvalidInfoClass)
    }

    /// Class whose stored entry backs this class
    fn storage(self) -> Self {
        match self {
            Self::PrimaryDomain | Self::DnsDomainInt => Self::DnsDomain,
            Self::LocalAccountDomain => Self::AccountDomain,
            Self::AuditFullSet => Self::AuditFullQuery,
            other => other,
        }
    }
}

/// Number of audit event categories
pub const POLICY_AUDIT_EVENT_TYPE_COUNT: usize = 9;

/// Audit event option bits
pub mod audit_options {
    pub const POLICY_AUDIT_EVENT_UNCHANGED: u32 = 0x0;
    pub const POLICY_AUDIT_EVENT_SUCCESS: u32 = 0x1;
    pub const POLICY_AUDIT_EVENT_FAILURE: u32 = 0x2;
    pub const POLICY_AUDIT_EVENT_NONE: u32 = 0x4;
    pub const POLICY_AUDIT_EVENT_MASK: u32 = 0x7;
}

/// Audit log information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuditLogInfo {
    pub audit_log_percent_full: u32,
    pub maximum_log_size: u32,
    pub audit_retention_period: i64,
    pub audit_log_full_shutdown_in_progress: bool,
    pub time_to_shutdown: i64,
    pub next_audit_record_id: u32,
}

/// Audit events information
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuditEventsInfo {
    pub auditing_mode: bool,
    /// One option mask per audit category
    pub event_auditing_options: Vec<u32>,
}

/// Name and SID of a domain
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DomainInfo {
    pub name: String,
    pub sid: Option<Sid>,
}

/// DNS identity of the primary domain
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DnsDomainInfo {
    pub name: String,
    pub dns_domain_name: String,
    pub dns_forest_name: String,
    pub domain_guid: [u8; 16],
    pub sid: Option<Sid>,
}

/// Replica source information
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplicaSourceInfo {
    pub replica_source: String,
    pub replica_account_name: String,
}

/// Default quota limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuotaLimits {
    pub paged_pool_limit: u64,
    pub non_paged_pool_limit: u64,
    pub minimum_working_set_size: u64,
    pub maximum_working_set_size: u64,
    pub pagefile_limit: u64,
    pub time_limit: i64,
}

/// Database modification information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModificationInfo {
    pub modified_id: i64,
    pub database_creation_time: i64,
}

/// Audit-full state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuditFullInfo {
    pub shut_down_on_full: bool,
    pub log_is_full: bool,
}

/// Machine account information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MachineAccountInfo {
    pub rid: u32,
    pub sid: Option<Sid>,
}

/// Policy information payload, one variant per class
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyInformation {
    AuditLog(AuditLogInfo),
    AuditEvents(AuditEventsInfo),
    PrimaryDomain(DomainInfo),
    PdAccount { name: String },
    AccountDomain(DomainInfo),
    ServerRole(ServerRole),
    ReplicaSource(ReplicaSourceInfo),
    DefaultQuota(QuotaLimits),
    Modification(ModificationInfo),
    AuditFullSet { shut_down_on_full: bool },
    AuditFullQuery(AuditFullInfo),
    DnsDomain(DnsDomainInfo),
    DnsDomainInt(DnsDomainInfo),
    LocalAccountDomain(DomainInfo),
    MachineAccount(MachineAccountInfo),
}

impl PolicyInformation {
    /// Class this payload belongs to
    pub fn class(&self) -> PolicyInformationClass {
        use PolicyInformationClass as C;
        match self {
            Self::AuditLog(_) => C::AuditLog,
            Self::AuditEvents(_) => C::AuditEvents,
            Self::PrimaryDomain(_) => C::PrimaryDomain,
            Self::PdAccount { .. } => C::PdAccount,
            Self::AccountDomain(_) => C::AccountDomain,
            Self::ServerRole(_) => C::ServerRole,
            Self::ReplicaSource(_) => C::ReplicaSource,
            Self::DefaultQuota(_) => C::DefaultQuota,
            Self::Modification(_) => C::Modification,
            Self::AuditFullSet { .. } => C::AuditFullSet,
            Self::AuditFullQuery(_) => C::AuditFullQuery,
            Self::DnsDomain(_) => C::DnsDomain,
            Self::DnsDomainInt(_) => C::DnsDomainInt,
            Self::LocalAccountDomain(_) => C::LocalAccountDomain,
            Self::MachineAccount(_) => C::MachineAccount,
        }
    }
}

// ============================================================================
// Domain Policy
// ============================================================================

/// Domain information policy classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum DomainInformationClass {
    /// Quality of service (not supported)
    QualityOfService = 1,
    /// Encrypting file system policy
    Efs = 2,
    /// Kerberos ticket policy
    KerberosTicket = 3,
}

impl DomainInformationClass {
    /// Resolve a wire class number
    pub fn from_u32(value: u32) -> LsaResult<Self> {
        match value {
            1 => Ok(Self::QualityOfService),
            2 => Ok(Self::Efs),
            3 => Ok(Self::KerberosTicket),
            _ => Err(NtStatus::InvalidInfoClass),
        }
    }
}

/// Kerberos ticket policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KerberosTicketInfo {
    pub authentication_options: u32,
    pub max_service_ticket_age: i64,
    pub max_ticket_age: i64,
    pub max_renew_age: i64,
    pub max_clock_skew: i64,
    pub reserved: i64,
}

/// Domain information payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainInformation {
    /// Opaque EFS policy blob
    Efs(Vec<u8>),
    KerberosTicket(KerberosTicketInfo),
}

impl DomainInformation {
    pub fn class(&self) -> DomainInformationClass {
        match self {
            Self::Efs(_) => DomainInformationClass::Efs,
            Self::KerberosTicket(_) => DomainInformationClass::KerberosTicket,
        }
    }
}

// ============================================================================
// Policy Root
// ============================================================================

/// The policy singleton
#[derive(Debug, Clone)]
pub struct PolicyRoot {
    attributes: BTreeMap<PolicyInformationClass, PolicyInformation>,
    domain_policy: BTreeMap<DomainInformationClass, DomainInformation>,
    modified_id: i64,
    creation_time: i64,
    /// Security descriptor of the policy object
    pub descriptor: SecurityDescriptor,
}

impl PolicyRoot {
    /// Build the policy from the service configuration
    pub fn new(config: &LsaConfig) -> Self {
        use PolicyInformationClass as C;

        let mut attributes = BTreeMap::new();
        attributes.insert(
            C::AuditLog,
            PolicyInformation::AuditLog(AuditLogInfo {
                maximum_log_size: 0x100000,
                ..AuditLogInfo::default()
            }),
        );
        attributes.insert(
            C::AuditEvents,
            PolicyInformation::AuditEvents(AuditEventsInfo {
                auditing_mode: false,
                event_auditing_options: vec![
                    audit_options::POLICY_AUDIT_EVENT_NONE;
                    POLICY_AUDIT_EVENT_TYPE_COUNT
                ],
            }),
        );
        attributes.insert(
            C::DnsDomain,
            PolicyInformation::DnsDomain(DnsDomainInfo {
                name: config.primary_domain_name.clone(),
                dns_domain_name: config.dns_domain_name.clone(),
                dns_forest_name: config.dns_forest_name.clone(),
                domain_guid: [0; 16],
                sid: Some(config.primary_domain_sid),
            }),
        );
        attributes.insert(C::PdAccount, PolicyInformation::PdAccount { name: String::new() });
        attributes.insert(
            C::AccountDomain,
            PolicyInformation::AccountDomain(DomainInfo {
                name: config.account_domain_name.clone(),
                sid: Some(config.account_domain_sid),
            }),
        );
        attributes.insert(C::ServerRole, PolicyInformation::ServerRole(config.server_role));
        attributes.insert(
            C::ReplicaSource,
            PolicyInformation::ReplicaSource(ReplicaSourceInfo::default()),
        );
        attributes.insert(C::DefaultQuota, PolicyInformation::DefaultQuota(QuotaLimits::default()));
        attributes.insert(
            C::AuditFullQuery,
            PolicyInformation::AuditFullQuery(AuditFullInfo::default()),
        );
        attributes.insert(
            C::MachineAccount,
            PolicyInformation::MachineAccount(MachineAccountInfo::default()),
        );

        Self {
            attributes,
            domain_policy: BTreeMap::new(),
            modified_id: 1,
            creation_time: query_system_time(),
            descriptor: default_policy_descriptor(),
        }
    }

    /// Record one database modification
    pub fn bump_modified(&mut self) {
        self.modified_id += 1;
    }

    /// Current modification information
    pub fn modification(&self) -> ModificationInfo {
        ModificationInfo {
            modified_id: self.modified_id,
            database_creation_time: self.creation_time,
        }
    }

    fn dns_domain(&self) -> DnsDomainInfo {
        match self.attributes.get(&PolicyInformationClass::DnsDomain) {
            Some(PolicyInformation::DnsDomain(info)) => info.clone(),
            _ => DnsDomainInfo::default(),
        }
    }

    /// Local account domain name and SID
    pub fn account_domain(&self) -> DomainInfo {
        match self.attributes.get(&PolicyInformationClass::AccountDomain) {
            Some(PolicyInformation::AccountDomain(info)) => info.clone(),
            _ => DomainInfo::default(),
        }
    }

    fn audit_full(&self) -> AuditFullInfo {
        match self.attributes.get(&PolicyInformationClass::AuditFullQuery) {
            Some(PolicyInformation::AuditFullQuery(info)) => *info,
            _ => AuditFullInfo::default(),
        }
    }

    /// Current server role
    pub fn server_role(&self) -> ServerRole {
        match self.attributes.get(&PolicyInformationClass::ServerRole) {
            Some(PolicyInformation::ServerRole(role)) => *role,
            _ => ServerRole::Primary,
        }
    }

    /// Primary domain NetBIOS name and SID
    pub fn primary_domain(&self) -> DomainInfo {
        let dns = self.dns_domain();
        DomainInfo {
            name: dns.name,
            sid: dns.sid,
        }
    }

    /// Primary domain and forest DNS names
    pub fn dns_names(&self) -> (String, String) {
        let dns = self.dns_domain();
        (dns.dns_domain_name, dns.dns_forest_name)
    }

    /// Query one information class
    pub fn query(&self, class: PolicyInformationClass) -> LsaResult<PolicyInformation> {
        use PolicyInformationClass as C;

        let info = match class {
            C::AuditFullSet => return Err(NtStatus::InvalidParameter),
            C::Modification => PolicyInformation::Modification(self.modification()),
            C::PrimaryDomain => PolicyInformation::PrimaryDomain(self.primary_domain()),
            C::DnsDomain => PolicyInformation::DnsDomain(self.dns_domain()),
            C::DnsDomainInt => PolicyInformation::DnsDomainInt(self.dns_domain()),
            C::LocalAccountDomain => PolicyInformation::LocalAccountDomain(self.account_domain()),
            other => self
                .attributes
                .get(&other)
                .cloned()
                .ok_or(NtStatus::ObjectNameNotFound)?,
        };
        Ok(info)
    }

    /// Set one information class
    ///
    /// Linked classes are updated together. Nothing changes on error.
    pub fn set(&mut self, class: PolicyInformationClass, info: PolicyInformation) -> LsaResult<()> {
        use PolicyInformationClass as C;

        if info.class() != class {
            return Err(NtStatus::InvalidParameter);
        }

        let stored = match info {
            PolicyInformation::PdAccount { .. }
            | PolicyInformation::Modification(_)
            | PolicyInformation::AuditFullQuery(_)
            | PolicyInformation::MachineAccount(_) => return Err(NtStatus::NotImplemented),

            PolicyInformation::AuditEvents(events) => {
                if events.event_auditing_options.len() > POLICY_AUDIT_EVENT_TYPE_COUNT
                    || events
                        .event_auditing_options
                        .iter()
                        .any(|options| options & !audit_options::POLICY_AUDIT_EVENT_MASK != 0)
                {
                    return Err(NtStatus::InvalidParameter);
                }
                PolicyInformation::AuditEvents(events)
            }

            PolicyInformation::PrimaryDomain(domain) => {
                check_domain_sid(domain.sid.as_ref())?;
                let mut dns = self.dns_domain();
                dns.name = domain.name;
                dns.sid = domain.sid;
                PolicyInformation::DnsDomain(dns)
            }

            PolicyInformation::DnsDomain(dns) | PolicyInformation::DnsDomainInt(dns) => {
                check_domain_sid(dns.sid.as_ref())?;
                PolicyInformation::DnsDomain(dns)
            }

            PolicyInformation::AccountDomain(domain) | PolicyInformation::LocalAccountDomain(domain) => {
                check_domain_sid(domain.sid.as_ref())?;
                PolicyInformation::AccountDomain(domain)
            }

            PolicyInformation::AuditFullSet { shut_down_on_full } => {
                let mut full = self.audit_full();
                full.shut_down_on_full = shut_down_on_full;
                PolicyInformation::AuditFullQuery(full)
            }

            other @ (PolicyInformation::AuditLog(_)
            | PolicyInformation::ServerRole(_)
            | PolicyInformation::ReplicaSource(_)
            | PolicyInformation::DefaultQuota(_)) => other,
        };

        self.attributes.insert(class.storage(), stored);
        if class == C::ServerRole {
            log::info!("[LSA] server role is now {:?}", self.server_role());
        }
        Ok(())
    }

    /// Query domain-wide policy
    pub fn query_domain(&self, class: DomainInformationClass) -> LsaResult<DomainInformation> {
        if class == DomainInformationClass::QualityOfService {
            return Err(NtStatus::InvalidParameter);
        }
        self.domain_policy
            .get(&class)
            .cloned()
            .ok_or(NtStatus::ObjectNameNotFound)
    }

    /// Set or clear domain-wide policy
    pub fn set_domain(
        &mut self,
        class: DomainInformationClass,
        info: Option<DomainInformation>,
    ) -> LsaResult<()> {
        if class == DomainInformationClass::QualityOfService {
            return Err(NtStatus::InvalidParameter);
        }
        match info {
            Some(info) if info.class() != class => Err(NtStatus::InvalidParameter),
            Some(info) => {
                self.domain_policy.insert(class, info);
                Ok(())
            }
            None => {
                self.domain_policy.remove(&class);
                Ok(())
            }
        }
    }
}

fn check_domain_sid(sid: Option<&Sid>) -> LsaResult<()> {
    match sid {
        Some(sid) if !sid.is_valid() => Err(NtStatus::InvalidSid),
        _ => Ok(()),
    }
}
