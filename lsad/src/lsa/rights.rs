//! Access Rights Table
//!
//! Which handle each operation takes and which rights it needs, kept as
//! one declarative table rather than checks scattered through the
//! dispatcher.
//!
//! # Rules
//! - `handle`: the kind of handle the operation presents (or none)
//! - `handle_access`: rights that must have been granted on that handle
//! - `target_access`: rights needed on a second object the operation
//!   reaches through a policy handle (an account named by SID, a secret or
//!   trusted domain named by name)
//!
//! Information classes carry their own rights; see
//! [`policy_class_rights`], [`domain_class_rights`] and
//! [`trusted_domain_class_rights`].

use crate::ob::ObjectKind;
use crate::se::acl::standard_rights::DELETE;

use super::account::account_access::*;
use super::policy::policy_access::*;
use super::policy::{DomainInformationClass, PolicyInformationClass};
use super::secret::secret_access::*;
use super::trust::trusted_domain_access::*;
use super::trust::TrustedDomainInformationClass;

// ============================================================================
// Operations
// ============================================================================

/// Operations served by the policy service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Close,
    EnumeratePrivileges,
    QuerySecurityObject,
    SetSecurityObject,
    OpenPolicy,
    QueryInformationPolicy,
    SetInformationPolicy,
    CreateAccount,
    EnumerateAccounts,
    CreateTrustedDomain,
    EnumerateTrustedDomains,
    CreateSecret,
    OpenAccount,
    EnumeratePrivilegesAccount,
    AddPrivilegesToAccount,
    RemovePrivilegesFromAccount,
    GetSystemAccessAccount,
    SetSystemAccessAccount,
    OpenTrustedDomain,
    QueryInfoTrustedDomain,
    SetInformationTrustedDomain,
    OpenSecret,
    SetSecret,
    QuerySecret,
    LookupPrivilegeValue,
    LookupPrivilegeName,
    LookupPrivilegeDisplayName,
    DeleteObject,
    EnumerateAccountsWithUserRight,
    EnumerateAccountRights,
    AddAccountRights,
    RemoveAccountRights,
    QueryTrustedDomainInfo,
    SetTrustedDomainInfo,
    DeleteTrustedDomain,
    StorePrivateData,
    RetrievePrivateData,
    OpenPolicy2,
    QueryInformationPolicy2,
    SetInformationPolicy2,
    QueryTrustedDomainInfoByName,
    SetTrustedDomainInfoByName,
    EnumerateTrustedDomainsEx,
    CreateTrustedDomainEx,
    QueryDomainInformationPolicy,
    SetDomainInformationPolicy,
    OpenTrustedDomainByName,
    CreateTrustedDomainEx2,
    QueryForestTrustInformation,
    SetForestTrustInformation,
}

impl Operation {
    /// Every operation
    pub const ALL: [Operation; 50] = [
        Operation::Close,
        Operation::EnumeratePrivileges,
        Operation::QuerySecurityObject,
        Operation::SetSecurityObject,
        Operation::OpenPolicy,
        Operation::QueryInformationPolicy,
        Operation::SetInformationPolicy,
        Operation::CreateAccount,
        Operation::EnumerateAccounts,
        Operation::CreateTrustedDomain,
        Operation::EnumerateTrustedDomains,
        Operation::CreateSecret,
        Operation::OpenAccount,
        Operation::EnumeratePrivilegesAccount,
        Operation::AddPrivilegesToAccount,
        Operation::RemovePrivilegesFromAccount,
        Operation::GetSystemAccessAccount,
        Operation::SetSystemAccessAccount,
        Operation::OpenTrustedDomain,
        Operation::QueryInfoTrustedDomain,
        Operation::SetInformationTrustedDomain,
        Operation::OpenSecret,
        Operation::SetSecret,
        Operation::QuerySecret,
        Operation::LookupPrivilegeValue,
        Operation::LookupPrivilegeName,
        Operation::LookupPrivilegeDisplayName,
        Operation::DeleteObject,
        Operation::EnumerateAccountsWithUserRight,
        Operation::EnumerateAccountRights,
        Operation::AddAccountRights,
        Operation::RemoveAccountRights,
        Operation::QueryTrustedDomainInfo,
        Operation::SetTrustedDomainInfo,
        Operation::DeleteTrustedDomain,
        Operation::StorePrivateData,
        Operation::RetrievePrivateData,
        Operation::OpenPolicy2,
        Operation::QueryInformationPolicy2,
        Operation::SetInformationPolicy2,
        Operation::QueryTrustedDomainInfoByName,
        Operation::SetTrustedDomainInfoByName,
        Operation::EnumerateTrustedDomainsEx,
        Operation::CreateTrustedDomainEx,
        Operation::QueryDomainInformationPolicy,
        Operation::SetDomainInformationPolicy,
        Operation::OpenTrustedDomainByName,
        Operation::CreateTrustedDomainEx2,
        Operation::QueryForestTrustInformation,
        Operation::SetForestTrustInformation,
    ];

    /// Wire operation number
    pub fn opnum(self) -> u16 {
        match self {
            Operation::Close => 0,
            Operation::EnumeratePrivileges => 2,
            Operation::QuerySecurityObject => 3,
            Operation::SetSecurityObject => 4,
            Operation::OpenPolicy => 6,
            Operation::QueryInformationPolicy => 7,
            Operation::SetInformationPolicy => 8,
            Operation::CreateAccount => 10,
            Operation::EnumerateAccounts => 11,
            Operation::CreateTrustedDomain => 12,
            Operation::EnumerateTrustedDomains => 13,
            Operation::CreateSecret => 16,
            Operation::OpenAccount => 17,
            Operation::EnumeratePrivilegesAccount => 18,
            Operation::AddPrivilegesToAccount => 19,
            Operation::RemovePrivilegesFromAccount => 20,
            Operation::GetSystemAccessAccount => 23,
            Operation::SetSystemAccessAccount => 24,
            Operation::OpenTrustedDomain => 25,
            Operation::QueryInfoTrustedDomain => 26,
            Operation::SetInformationTrustedDomain => 27,
            Operation::OpenSecret => 28,
            Operation::SetSecret => 29,
            Operation::QuerySecret => 30,
            Operation::LookupPrivilegeValue => 31,
            Operation::LookupPrivilegeName => 32,
            Operation::LookupPrivilegeDisplayName => 33,
            Operation::DeleteObject => 34,
            Operation::EnumerateAccountsWithUserRight => 35,
            Operation::EnumerateAccountRights => 36,
            Operation::AddAccountRights => 37,
            Operation::RemoveAccountRights => 38,
            Operation::QueryTrustedDomainInfo => 39,
            Operation::SetTrustedDomainInfo => 40,
            Operation::DeleteTrustedDomain => 41,
            Operation::StorePrivateData => 42,
            Operation::RetrievePrivateData => 43,
            Operation::OpenPolicy2 => 44,
            Operation::QueryInformationPolicy2 => 46,
            Operation::SetInformationPolicy2 => 47,
            Operation::QueryTrustedDomainInfoByName => 48,
            Operation::SetTrustedDomainInfoByName => 49,
            Operation::EnumerateTrustedDomainsEx => 50,
            Operation::CreateTrustedDomainEx => 51,
            Operation::QueryDomainInformationPolicy => 53,
            Operation::SetDomainInformationPolicy => 54,
            Operation::OpenTrustedDomainByName => 55,
            Operation::CreateTrustedDomainEx2 => 59,
            Operation::QueryForestTrustInformation => 73,
            Operation::SetForestTrustInformation => 74,
        }
    }

    /// Name used in log messages
    pub fn name(self) -> &'static str {
        match self {
            Operation::Close => "LsarClose",
            Operation::EnumeratePrivileges => "LsarEnumeratePrivileges",
            Operation::QuerySecurityObject => "LsarQuerySecurityObject",
            Operation::SetSecurityObject => "LsarSetSecurityObject",
            Operation::OpenPolicy => "LsarOpenPolicy",
            Operation::QueryInformationPolicy => "LsarQueryInformationPolicy",
            Operation::SetInformationPolicy => "LsarSetInformationPolicy",
            Operation::CreateAccount => "LsarCreateAccount",
            Operation::EnumerateAccounts => "LsarEnumerateAccounts",
            Operation::CreateTrustedDomain => "LsarCreateTrustedDomain",
            Operation::EnumerateTrustedDomains => "LsarEnumerateTrustedDomains",
            Operation::CreateSecret => "LsarCreateSecret",
            Operation::OpenAccount => "LsarOpenAccount",
            Operation::EnumeratePrivilegesAccount => "LsarEnumeratePrivilegesAccount",
            Operation::AddPrivilegesToAccount => "LsarAddPrivilegesToAccount",
            Operation::RemovePrivilegesFromAccount => "LsarRemovePrivilegesFromAccount",
            Operation::GetSystemAccessAccount => "LsarGetSystemAccessAccount",
            Operation::SetSystemAccessAccount => "LsarSetSystemAccessAccount",
            Operation::OpenTrustedDomain => "LsarOpenTrustedDomain",
            Operation::QueryInfoTrustedDomain => "LsarQueryInfoTrustedDomain",
            Operation::SetInformationTrustedDomain => "LsarSetInformationTrustedDomain",
            Operation::OpenSecret => "LsarOpenSecret",
            Operation::SetSecret => "LsarSetSecret",
            Operation::QuerySecret => "LsarQuerySecret",
            Operation::LookupPrivilegeValue => "LsarLookupPrivilegeValue",
            Operation::LookupPrivilegeName => "LsarLookupPrivilegeName",
            Operation::LookupPrivilegeDisplayName => "LsarLookupPrivilegeDisplayName",
            Operation::DeleteObject => "LsarDeleteObject",
            Operation::EnumerateAccountsWithUserRight => "LsarEnumerateAccountsWithUserRight",
            Operation::EnumerateAccountRights => "LsarEnumerateAccountRights",
            Operation::AddAccountRights => "LsarAddAccountRights",
            Operation::RemoveAccountRights => "LsarRemoveAccountRights",
            Operation::QueryTrustedDomainInfo => "LsarQueryTrustedDomainInfo",
            Operation::SetTrustedDomainInfo => "LsarSetTrustedDomainInfo",
            Operation::DeleteTrustedDomain => "LsarDeleteTrustedDomain",
            Operation::StorePrivateData => "LsarStorePrivateData",
            Operation::RetrievePrivateData => "LsarRetrievePrivateData",
            Operation::OpenPolicy2 => "LsarOpenPolicy2",
            Operation::QueryInformationPolicy2 => "LsarQueryInformationPolicy2",
            Operation::SetInformationPolicy2 => "LsarSetInformationPolicy2",
            Operation::QueryTrustedDomainInfoByName => "LsarQueryTrustedDomainInfoByName",
            Operation::SetTrustedDomainInfoByName => "LsarSetTrustedDomainInfoByName",
            Operation::EnumerateTrustedDomainsEx => "LsarEnumerateTrustedDomainsEx",
            Operation::CreateTrustedDomainEx => "LsarCreateTrustedDomainEx",
            Operation::QueryDomainInformationPolicy => "LsarQueryDomainInformationPolicy",
            Operation::SetDomainInformationPolicy => "LsarSetDomainInformationPolicy",
            Operation::OpenTrustedDomainByName => "LsarOpenTrustedDomainByName",
            Operation::CreateTrustedDomainEx2 => "LsarCreateTrustedDomainEx2",
            Operation::QueryForestTrustInformation => "LsarQueryForestTrustInformation",
            Operation::SetForestTrustInformation => "LsarSetForestTrustInformation",
        }
    }
}

// ============================================================================
// Opnum Slots
// ============================================================================

/// Highest wire operation number
pub const MAX_OPNUM: u16 = 74;

/// What a wire operation number resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpnumSlot {
    /// A served operation
    Operation(Operation),
    /// A reserved slot: accepted, does nothing
    Reserved(u16),
}

impl OpnumSlot {
    /// Resolve a wire operation number
    ///
    /// Returns `None` past the end of the interface.
    pub fn from_u16(opnum: u16) -> Option<Self> {
        if opnum > MAX_OPNUM {
            return None;
        }
        Some(
            Operation::ALL
                .iter()
                .copied()
                .find(|op| op.opnum() == opnum)
                .map_or(OpnumSlot::Reserved(opnum), OpnumSlot::Operation),
        )
    }
}

// ============================================================================
// Access Rules
// ============================================================================

/// Handle an operation presents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleRequirement {
    /// No handle (bootstrap open)
    None,
    /// A handle of any kind
    Any,
    /// A handle of one kind
    Kind(ObjectKind),
}

/// Rights required by one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRule {
    pub operation: Operation,
    pub handle: HandleRequirement,
    pub handle_access: u32,
    pub target_access: u32,
}

const fn rule(operation: Operation, handle: HandleRequirement, handle_access: u32, target_access: u32) -> AccessRule {
    AccessRule {
        operation,
        handle,
        handle_access,
        target_access,
    }
}

const NONE: HandleRequirement = HandleRequirement::None;
const ANY: HandleRequirement = HandleRequirement::Any;
const POLICY: HandleRequirement = HandleRequirement::Kind(ObjectKind::Policy);
const ACCOUNT: HandleRequirement = HandleRequirement::Kind(ObjectKind::Account);
const SECRET: HandleRequirement = HandleRequirement::Kind(ObjectKind::Secret);
const TRUSTED_DOMAIN: HandleRequirement = HandleRequirement::Kind(ObjectKind::TrustedDomain);

/// Rights for adding or removing account rights by SID
const ACCOUNT_RIGHTS_ADJUST: u32 = ACCOUNT_ADJUST_PRIVILEGES | ACCOUNT_ADJUST_SYSTEM_ACCESS | ACCOUNT_VIEW;

/// The access table
///
/// Operations whose rights depend on an information class or on the
/// caller's desired access carry zero here; the class tables and the
/// object's descriptor decide.
pub static ACCESS_RULES: [AccessRule; 50] = [
    rule(Operation::Close, ANY, 0, 0),
    rule(Operation::EnumeratePrivileges, POLICY, POLICY_VIEW_LOCAL_INFORMATION, 0),
    rule(Operation::QuerySecurityObject, ANY, 0, 0),
    rule(Operation::SetSecurityObject, ANY, 0, 0),
    rule(Operation::OpenPolicy, NONE, 0, 0),
    rule(Operation::QueryInformationPolicy, POLICY, 0, 0),
    rule(Operation::SetInformationPolicy, POLICY, 0, 0),
    rule(Operation::CreateAccount, POLICY, POLICY_CREATE_ACCOUNT, 0),
    rule(Operation::EnumerateAccounts, POLICY, POLICY_VIEW_LOCAL_INFORMATION, 0),
    rule(Operation::CreateTrustedDomain, POLICY, POLICY_TRUST_ADMIN, 0),
    rule(Operation::EnumerateTrustedDomains, POLICY, POLICY_VIEW_LOCAL_INFORMATION, 0),
    rule(Operation::CreateSecret, POLICY, POLICY_CREATE_SECRET, 0),
    rule(Operation::OpenAccount, POLICY, 0, 0),
    rule(Operation::EnumeratePrivilegesAccount, ACCOUNT, ACCOUNT_VIEW, 0),
    rule(Operation::AddPrivilegesToAccount, ACCOUNT, ACCOUNT_ADJUST_PRIVILEGES, 0),
    rule(Operation::RemovePrivilegesFromAccount, ACCOUNT, ACCOUNT_ADJUST_PRIVILEGES, 0),
    rule(Operation::GetSystemAccessAccount, ACCOUNT, ACCOUNT_VIEW, 0),
    rule(Operation::SetSystemAccessAccount, ACCOUNT, ACCOUNT_ADJUST_SYSTEM_ACCESS, 0),
    rule(Operation::OpenTrustedDomain, POLICY, 0, 0),
    rule(Operation::QueryInfoTrustedDomain, TRUSTED_DOMAIN, 0, 0),
    rule(Operation::SetInformationTrustedDomain, TRUSTED_DOMAIN, 0, 0),
    rule(Operation::OpenSecret, POLICY, 0, 0),
    rule(Operation::SetSecret, SECRET, SECRET_SET_VALUE, 0),
    rule(Operation::QuerySecret, SECRET, SECRET_QUERY_VALUE, 0),
    rule(Operation::LookupPrivilegeValue, POLICY, POLICY_LOOKUP_NAMES, 0),
    rule(Operation::LookupPrivilegeName, POLICY, POLICY_LOOKUP_NAMES, 0),
    rule(Operation::LookupPrivilegeDisplayName, POLICY, POLICY_LOOKUP_NAMES, 0),
    rule(Operation::DeleteObject, ANY, DELETE, 0),
    rule(
        Operation::EnumerateAccountsWithUserRight,
        POLICY,
        POLICY_LOOKUP_NAMES | POLICY_VIEW_LOCAL_INFORMATION,
        0,
    ),
    rule(Operation::EnumerateAccountRights, POLICY, POLICY_LOOKUP_NAMES, ACCOUNT_VIEW),
    rule(Operation::AddAccountRights, POLICY, POLICY_LOOKUP_NAMES, ACCOUNT_RIGHTS_ADJUST),
    rule(Operation::RemoveAccountRights, POLICY, POLICY_LOOKUP_NAMES, ACCOUNT_RIGHTS_ADJUST),
    rule(Operation::QueryTrustedDomainInfo, POLICY, 0, 0),
    rule(Operation::SetTrustedDomainInfo, POLICY, 0, 0),
    rule(Operation::DeleteTrustedDomain, POLICY, 0, DELETE),
    rule(Operation::StorePrivateData, POLICY, POLICY_CREATE_SECRET, SECRET_SET_VALUE),
    rule(Operation::RetrievePrivateData, POLICY, POLICY_GET_PRIVATE_INFORMATION, SECRET_QUERY_VALUE),
    rule(Operation::OpenPolicy2, NONE, 0, 0),
    rule(Operation::QueryInformationPolicy2, POLICY, 0, 0),
    rule(Operation::SetInformationPolicy2, POLICY, 0, 0),
    rule(Operation::QueryTrustedDomainInfoByName, POLICY, 0, 0),
    rule(Operation::SetTrustedDomainInfoByName, POLICY, 0, 0),
    rule(Operation::EnumerateTrustedDomainsEx, POLICY, POLICY_VIEW_LOCAL_INFORMATION, 0),
    rule(Operation::CreateTrustedDomainEx, POLICY, POLICY_TRUST_ADMIN, 0),
    rule(Operation::QueryDomainInformationPolicy, POLICY, 0, 0),
    rule(Operation::SetDomainInformationPolicy, POLICY, 0, 0),
    rule(Operation::OpenTrustedDomainByName, POLICY, 0, 0),
    rule(Operation::CreateTrustedDomainEx2, POLICY, POLICY_TRUST_ADMIN, 0),
    rule(
        Operation::QueryForestTrustInformation,
        POLICY,
        POLICY_VIEW_LOCAL_INFORMATION,
        TRUSTED_QUERY_AUTH,
    ),
    rule(Operation::SetForestTrustInformation, POLICY, POLICY_TRUST_ADMIN, TRUSTED_SET_AUTH),
];

/// Rule for an operation
pub fn access_rule(operation: Operation) -> Option<&'static AccessRule> {
    ACCESS_RULES.iter().find(|rule| rule.operation == operation)
}

// ============================================================================
// Information Class Rights
// ============================================================================

/// Rights for one information class
///
/// `query: None` means the class cannot be queried (`InvalidParameter`);
/// `set: None` means it cannot be set (`NotImplemented`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassRights {
    pub query: Option<u32>,
    pub set: Option<u32>,
    /// Setting needs a directory service
    pub set_requires_ds: bool,
    /// Querying needs a directory service
    pub query_requires_ds: bool,
}

const fn class(query: Option<u32>, set: Option<u32>) -> ClassRights {
    ClassRights {
        query,
        set,
        set_requires_ds: false,
        query_requires_ds: false,
    }
}

const fn ds_class(query: Option<u32>, set: Option<u32>, query_requires_ds: bool) -> ClassRights {
    ClassRights {
        query,
        set,
        set_requires_ds: true,
        query_requires_ds,
    }
}

/// Rights for a policy information class
pub fn policy_class_rights(info_class: PolicyInformationClass) -> ClassRights {
    use PolicyInformationClass as C;
    match info_class {
        C::AuditLog => class(Some(POLICY_VIEW_AUDIT_INFORMATION), Some(POLICY_AUDIT_LOG_ADMIN)),
        C::AuditEvents => class(Some(POLICY_VIEW_AUDIT_INFORMATION), Some(POLICY_SET_AUDIT_REQUIREMENTS)),
        C::PrimaryDomain => class(Some(POLICY_VIEW_LOCAL_INFORMATION), Some(POLICY_TRUST_ADMIN)),
        C::PdAccount => class(Some(POLICY_GET_PRIVATE_INFORMATION), None),
        C::AccountDomain => class(Some(POLICY_VIEW_LOCAL_INFORMATION), Some(POLICY_TRUST_ADMIN)),
        C::ServerRole => class(Some(POLICY_VIEW_LOCAL_INFORMATION), Some(POLICY_SERVER_ADMIN)),
        C::ReplicaSource => class(Some(POLICY_VIEW_LOCAL_INFORMATION), Some(POLICY_SERVER_ADMIN)),
        C::DefaultQuota => class(Some(POLICY_VIEW_LOCAL_INFORMATION), Some(POLICY_SET_DEFAULT_QUOTA_LIMITS)),
        C::Modification => class(Some(POLICY_VIEW_LOCAL_INFORMATION), None),
        C::AuditFullSet => class(None, Some(POLICY_AUDIT_LOG_ADMIN)),
        C::AuditFullQuery => class(Some(POLICY_VIEW_AUDIT_INFORMATION), None),
        C::DnsDomain => class(Some(POLICY_VIEW_LOCAL_INFORMATION), Some(POLICY_TRUST_ADMIN)),
        C::DnsDomainInt => ds_class(Some(POLICY_VIEW_LOCAL_INFORMATION), Some(POLICY_TRUST_ADMIN), false),
        C::LocalAccountDomain => class(Some(POLICY_VIEW_LOCAL_INFORMATION), Some(POLICY_TRUST_ADMIN)),
        C::MachineAccount => class(Some(POLICY_VIEW_LOCAL_INFORMATION), None),
    }
}

/// Rights for a domain information policy class
pub fn domain_class_rights(info_class: DomainInformationClass) -> ClassRights {
    match info_class {
        DomainInformationClass::KerberosTicket => {
            ds_class(Some(POLICY_VIEW_LOCAL_INFORMATION), Some(POLICY_SERVER_ADMIN), true)
        }
        _ => class(Some(POLICY_VIEW_LOCAL_INFORMATION), Some(POLICY_SERVER_ADMIN)),
    }
}

/// Rights on the trusted domain for an information class
pub fn trusted_domain_class_rights(info_class: TrustedDomainInformationClass) -> ClassRights {
    use TrustedDomainInformationClass as C;
    match info_class {
        C::Name | C::Basic => class(Some(TRUSTED_QUERY_DOMAIN_NAME), None),
        C::PosixOffset => class(Some(TRUSTED_QUERY_POSIX), Some(TRUSTED_SET_POSIX)),
        C::InformationEx | C::SupportedEncryptionTypes => {
            class(Some(TRUSTED_QUERY_DOMAIN_NAME), Some(TRUSTED_SET_AUTH))
        }
        C::AuthInformation => ds_class(Some(TRUSTED_QUERY_AUTH), Some(TRUSTED_SET_AUTH), true),
        C::FullInformation => ds_class(
            Some(TRUSTED_QUERY_DOMAIN_NAME | TRUSTED_QUERY_POSIX | TRUSTED_QUERY_AUTH),
            Some(TRUSTED_SET_POSIX | TRUSTED_SET_AUTH),
            true,
        ),
    }
}
