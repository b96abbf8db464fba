//! Trusted Domain Objects
//!
//! A trusted domain object (TDO) describes a trust relationship with
//! another domain or forest. Each TDO is keyed independently by its SID,
//! its DNS name and its flat (NetBIOS) name.
//!
//! # Information Classes
//! - Name, Basic: read-only identity
//! - PosixOffset
//! - InformationEx: direction, type and attributes
//! - AuthInformation: trust passwords (directory service only)
//! - FullInformation: Ex + PosixOffset + AuthInformation
//! - SupportedEncryptionTypes
//!
//! # Forest Trust
//! A forest-transitive trust may carry forest trust information: the
//! top-level names and domains of the other forest. Storing it detects
//! collisions with the local forest and with every other trust, and
//! disables the colliding records.

use crate::ex::query_system_time;
use crate::se::descriptor::create_object_security_descriptor;
use crate::se::{GenericMapping, SecurityDescriptor, Sid};
use crate::status::{LsaResult, NtStatus};

// ============================================================================
// Access Rights
// ============================================================================

/// Trusted domain access rights
pub mod trusted_domain_access {
    pub const TRUSTED_QUERY_DOMAIN_NAME: u32 = 0x00000001;
    pub const TRUSTED_QUERY_CONTROLLERS: u32 = 0x00000002;
    pub const TRUSTED_SET_CONTROLLERS: u32 = 0x00000004;
    pub const TRUSTED_QUERY_POSIX: u32 = 0x00000008;
    pub const TRUSTED_SET_POSIX: u32 = 0x00000010;
    pub const TRUSTED_SET_AUTH: u32 = 0x00000020;
    pub const TRUSTED_QUERY_AUTH: u32 = 0x00000040;
    pub const TRUSTED_ALL_ACCESS: u32 = 0x000F007F;
}

use trusted_domain_access::*;

/// Generic mapping for trusted domain objects
pub const TRUSTED_DOMAIN_GENERIC_MAPPING: GenericMapping = GenericMapping {
    generic_read: 0x00020001,
    generic_write: 0x00020034,
    generic_execute: 0x00020009,
    generic_all: TRUSTED_ALL_ACCESS,
};

/// Descriptor given to a newly created trusted domain
pub fn default_trust_descriptor() -> SecurityDescriptor {
    create_object_security_descriptor(TRUSTED_ALL_ACCESS, &[])
}

// ============================================================================
// Trust Types
// ============================================================================

/// Trust direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TrustDirection {
    /// Disabled trust
    Disabled = 0,
    /// Inbound trust
    Inbound = 1,
    /// Outbound trust
    Outbound = 2,
    /// Bidirectional trust
    Bidirectional = 3,
}

impl TrustDirection {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Disabled),
            1 => Some(Self::Inbound),
            2 => Some(Self::Outbound),
            3 => Some(Self::Bidirectional),
            _ => None,
        }
    }
}

/// Trust type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TrustType {
    /// Downlevel (NT4) trust
    Downlevel = 1,
    /// Uplevel (AD) trust
    Uplevel = 2,
    /// MIT Kerberos trust
    Mit = 3,
    /// DCE trust
    Dce = 4,
}

impl TrustType {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Downlevel),
            2 => Some(Self::Uplevel),
            3 => Some(Self::Mit),
            4 => Some(Self::Dce),
            _ => None,
        }
    }
}

bitflags::bitflags! {
    /// Trust attributes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TrustAttributes: u32 {
        const NON_TRANSITIVE = 0x00000001;
        const UPLEVEL_ONLY = 0x00000002;
        const QUARANTINED_DOMAIN = 0x00000004;
        const FOREST_TRANSITIVE = 0x00000008;
        const CROSS_ORGANIZATION = 0x00000010;
        const WITHIN_FOREST = 0x00000020;
        const TREAT_AS_EXTERNAL = 0x00000040;
    }
}

// ============================================================================
// Information Classes
// ============================================================================

/// Trusted domain information classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum TrustedDomainInformationClass {
    Name = 1,
    PosixOffset = 3,
    Basic = 5,
    InformationEx = 6,
    AuthInformation = 7,
    FullInformation = 8,
    SupportedEncryptionTypes = 13,
}

impl TrustedDomainInformationClass {
    /// Resolve a wire class number
    ///
    /// The legacy controller/password classes and the internal classes
    /// 9-12 are not served.
    pub fn from_u32(value: u32) -> LsaResult<Self> {
        match value {
            1 => Ok(Self::Name),
            3 => Ok(Self::PosixOffset),
            5 => Ok(Self::Basic),
            6 => Ok(Self::InformationEx),
            7 => Ok(Self::AuthInformation),
            8 => Ok(Self::FullInformation),
            13 => Ok(Self::SupportedEncryptionTypes),
            _ => Err(NtStatus::InvalidInfoClass),
        }
    }
}

/// Identity and shape of a trust
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedDomainInformationEx {
    /// DNS name of the trusted domain
    pub name: String,
    /// NetBIOS name of the trusted domain
    pub flat_name: String,
    /// Domain SID (absent only for MIT trusts)
    pub sid: Option<Sid>,
    pub trust_direction: TrustDirection,
    pub trust_type: TrustType,
    pub trust_attributes: TrustAttributes,
}

impl TrustedDomainInformationEx {
    /// Validate the fields of a trust about to be created
    pub fn validate(&self, max_name_len: usize) -> LsaResult<()> {
        if self.name.is_empty() || self.flat_name.is_empty() {
            return Err(NtStatus::InvalidParameter);
        }
        if self.name.chars().count() > max_name_len || self.flat_name.chars().count() > max_name_len {
            return Err(NtStatus::NameTooLong);
        }
        match self.sid {
            Some(sid) if !sid.is_valid_domain_sid() => return Err(NtStatus::InvalidSid),
            None if self.trust_type != TrustType::Mit => return Err(NtStatus::InvalidSid),
            _ => {}
        }
        self.validate_attributes()
    }

    fn validate_attributes(&self) -> LsaResult<()> {
        if !TrustAttributes::all().contains(self.trust_attributes) {
            return Err(NtStatus::InvalidParameter);
        }
        if self.trust_attributes.contains(TrustAttributes::FOREST_TRANSITIVE)
            && self.trust_type != TrustType::Uplevel
        {
            return Err(NtStatus::InvalidDomainState);
        }
        Ok(())
    }

    /// Check whether `other` names the same domain
    fn same_identity(&self, other: &TrustedDomainInformationEx) -> bool {
        same_domain_name(&self.name, &other.name)
            && same_domain_name(&self.flat_name, &other.flat_name)
            && self.sid == other.sid
    }
}

/// Key under which a DNS or flat domain name is indexed
pub fn domain_name_key(name: &str) -> String {
    name.to_uppercase()
}

/// Compare two domain names the way the name index does
pub fn same_domain_name(a: &str, b: &str) -> bool {
    domain_name_key(a) == domain_name_key(b)
}

/// One authentication entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthInfo {
    /// NT system time of the last update
    pub last_update_time: i64,
    pub auth_type: u32,
    pub data: Vec<u8>,
}

/// Trust authentication material
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthInformation {
    pub incoming: Vec<AuthInfo>,
    pub incoming_previous: Vec<AuthInfo>,
    pub outgoing: Vec<AuthInfo>,
    pub outgoing_previous: Vec<AuthInfo>,
}

/// Trusted domain information payload, one variant per class
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustedDomainInformation {
    Name { name: String },
    PosixOffset { offset: u32 },
    Basic { name: String, sid: Option<Sid> },
    InformationEx(TrustedDomainInformationEx),
    AuthInformation(AuthInformation),
    FullInformation {
        information: TrustedDomainInformationEx,
        posix_offset: u32,
        auth: AuthInformation,
    },
    SupportedEncryptionTypes(u32),
}

impl TrustedDomainInformation {
    pub fn class(&self) -> TrustedDomainInformationClass {
        use TrustedDomainInformationClass as C;
        match self {
            Self::Name { .. } => C::Name,
            Self::PosixOffset { .. } => C::PosixOffset,
            Self::Basic { .. } => C::Basic,
            Self::InformationEx(_) => C::InformationEx,
            Self::AuthInformation(_) => C::AuthInformation,
            Self::FullInformation { .. } => C::FullInformation,
            Self::SupportedEncryptionTypes(_) => C::SupportedEncryptionTypes,
        }
    }
}

// ============================================================================
// Forest Trust Information
// ============================================================================

/// Forest trust record types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ForestTrustRecordType {
    TopLevelName = 0,
    TopLevelNameEx = 1,
    DomainInfo = 2,
}

impl ForestTrustRecordType {
    /// Highest record type understood
    pub const LAST: ForestTrustRecordType = ForestTrustRecordType::DomainInfo;

    pub fn from_u32(value: u32) -> LsaResult<Self> {
        match value {
            0 => Ok(Self::TopLevelName),
            1 => Ok(Self::TopLevelNameEx),
            2 => Ok(Self::DomainInfo),
            _ => Err(NtStatus::InvalidParameter),
        }
    }
}

/// Forest trust record flags
pub mod forest_trust_flags {
    pub const LSA_TLN_DISABLED_NEW: u32 = 0x00000001;
    pub const LSA_TLN_DISABLED_ADMIN: u32 = 0x00000002;
    pub const LSA_TLN_DISABLED_CONFLICT: u32 = 0x00000004;

    pub const LSA_SID_DISABLED_ADMIN: u32 = 0x00000001;
    pub const LSA_SID_DISABLED_CONFLICT: u32 = 0x00000002;
    pub const LSA_NB_DISABLED_ADMIN: u32 = 0x00000004;
    pub const LSA_NB_DISABLED_CONFLICT: u32 = 0x00000008;

    pub const LSA_TLN_DISABLED_MASK: u32 = 0x00000007;
    pub const LSA_SID_DISABLED_MASK: u32 = 0x00000003;
    pub const LSA_NB_DISABLED_MASK: u32 = 0x0000000C;
}

use forest_trust_flags::*;

/// Payload of a forest trust record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForestTrustData {
    /// A DNS name claimed by the other forest
    TopLevelName(String),
    /// A DNS name excluded from the other forest's claims
    TopLevelNameEx(String),
    /// A domain of the other forest
    DomainInfo {
        sid: Sid,
        dns_name: String,
        netbios_name: String,
    },
}

/// One forest trust record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForestTrustRecord {
    pub flags: u32,
    /// NT system time of the last change
    pub time: i64,
    pub data: ForestTrustData,
}

impl ForestTrustRecord {
    pub fn record_type(&self) -> ForestTrustRecordType {
        match self.data {
            ForestTrustData::TopLevelName(_) => ForestTrustRecordType::TopLevelName,
            ForestTrustData::TopLevelNameEx(_) => ForestTrustRecordType::TopLevelNameEx,
            ForestTrustData::DomainInfo { .. } => ForestTrustRecordType::DomainInfo,
        }
    }

    /// An enabled top-level name claim
    fn enabled_top_level_name(&self) -> Option<&str> {
        match &self.data {
            ForestTrustData::TopLevelName(name) if self.flags & LSA_TLN_DISABLED_MASK == 0 => Some(name),
            _ => None,
        }
    }
}

/// Forest trust information of one trust
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ForestTrustInformation {
    pub records: Vec<ForestTrustRecord>,
}

impl ForestTrustInformation {
    /// Check every record is of a type at most `highest`
    pub fn check_record_types(&self, highest: ForestTrustRecordType) -> LsaResult<()> {
        if self.records.iter().any(|record| record.record_type() > highest) {
            return Err(NtStatus::InvalidParameter);
        }
        Ok(())
    }

    /// Copy holding only records of a type at most `highest`
    pub fn filtered(&self, highest: ForestTrustRecordType) -> ForestTrustInformation {
        ForestTrustInformation {
            records: self
                .records
                .iter()
                .filter(|record| record.record_type() <= highest)
                .cloned()
                .collect(),
        }
    }
}

/// Kind of a forest trust collision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CollisionRecordType {
    TopLevelName = 0,
    Domain = 1,
    Other = 2,
}

/// One detected collision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionRecord {
    /// Index of the colliding record
    pub index: u32,
    pub collision_type: CollisionRecordType,
    /// Record flags after the collision was applied
    pub flags: u32,
    /// Name of the domain or trust collided with
    pub name: String,
}

/// What the local forest claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalForest {
    pub dns_domain_name: String,
    pub dns_forest_name: String,
    pub netbios_name: String,
    pub domain_sid: Option<Sid>,
}

/// Check whether two DNS names are equal or one is beneath the other
pub fn dns_names_overlap(a: &str, b: &str) -> bool {
    let a = a.trim_end_matches('.').to_ascii_lowercase();
    let b = b.trim_end_matches('.').to_ascii_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.ends_with(&format!(".{}", b)) || b.ends_with(&format!(".{}", a))
}

/// Detect collisions and disable the colliding records
///
/// `others` holds the name and forest trust information of every other
/// trust. Records already disabled are left alone.
pub fn detect_collisions<'a>(
    info: &mut ForestTrustInformation,
    local: &LocalForest,
    others: impl Iterator<Item = (&'a str, &'a ForestTrustInformation)> + Clone,
) -> Vec<CollisionRecord> {
    let mut collisions = Vec::new();

    for (index, record) in info.records.iter_mut().enumerate() {
        match &record.data {
            ForestTrustData::TopLevelName(name) => {
                if record.flags & LSA_TLN_DISABLED_MASK != 0 {
                    continue;
                }
                let collided = if dns_names_overlap(name, &local.dns_forest_name)
                    || dns_names_overlap(name, &local.dns_domain_name)
                {
                    Some(local.dns_domain_name.clone())
                } else {
                    others.clone().find_map(|(other_name, other)| {
                        other
                            .records
                            .iter()
                            .filter_map(ForestTrustRecord::enabled_top_level_name)
                            .any(|tln| dns_names_overlap(name, tln))
                            .then(|| String::from(other_name))
                    })
                };
                if let Some(collided) = collided {
                    record.flags |= LSA_TLN_DISABLED_CONFLICT;
                    collisions.push(CollisionRecord {
                        index: index as u32,
                        collision_type: CollisionRecordType::TopLevelName,
                        flags: record.flags,
                        name: collided,
                    });
                }
            }
            ForestTrustData::DomainInfo { sid, netbios_name, .. } => {
                let mut flags = record.flags;
                let mut collided = None;

                if flags & LSA_SID_DISABLED_MASK == 0 {
                    if local.domain_sid.as_ref() == Some(sid) {
                        flags |= LSA_SID_DISABLED_CONFLICT;
                        collided = Some(local.dns_domain_name.clone());
                    } else if let Some(other_name) = others.clone().find_map(|(other_name, other)| {
                        other
                            .records
                            .iter()
                            .any(|r| matches!(&r.data, ForestTrustData::DomainInfo { sid: s, .. } if s == sid))
                            .then_some(other_name)
                    }) {
                        flags |= LSA_SID_DISABLED_CONFLICT;
                        collided = Some(String::from(other_name));
                    }
                }

                if flags & LSA_NB_DISABLED_MASK == 0 {
                    if local.netbios_name.eq_ignore_ascii_case(netbios_name) {
                        flags |= LSA_NB_DISABLED_CONFLICT;
                        collided.get_or_insert_with(|| local.dns_domain_name.clone());
                    } else if let Some(other_name) = others.clone().find_map(|(other_name, other)| {
                        other
                            .records
                            .iter()
                            .any(|r| {
                                matches!(&r.data, ForestTrustData::DomainInfo { netbios_name: n, .. }
                                    if n.eq_ignore_ascii_case(netbios_name))
                            })
                            .then_some(other_name)
                    }) {
                        flags |= LSA_NB_DISABLED_CONFLICT;
                        collided.get_or_insert_with(|| String::from(other_name));
                    }
                }

                if let Some(collided) = collided {
                    record.flags = flags;
                    collisions.push(CollisionRecord {
                        index: index as u32,
                        collision_type: CollisionRecordType::Domain,
                        flags,
                        name: collided,
                    });
                }
            }
            ForestTrustData::TopLevelNameEx(_) => {}
        }
    }

    collisions
}

// ============================================================================
// Trusted Domain Object
// ============================================================================

/// One trusted domain object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedDomain {
    pub info: TrustedDomainInformationEx,
    pub posix_offset: u32,
    pub auth: AuthInformation,
    pub supported_encryption_types: u32,
    pub forest_trust: Option<ForestTrustInformation>,
    /// User that created the trust (creation quota owner)
    pub creator: Sid,
    /// Security descriptor
    pub descriptor: SecurityDescriptor,
}

impl TrustedDomain {
    pub fn new(info: TrustedDomainInformationEx, auth: AuthInformation, creator: Sid) -> Self {
        Self {
            info,
            posix_offset: 0,
            auth,
            supported_encryption_types: 0,
            forest_trust: None,
            creator,
            descriptor: default_trust_descriptor(),
        }
    }

    /// Query one information class
    pub fn query(&self, class: TrustedDomainInformationClass) -> TrustedDomainInformation {
        use TrustedDomainInformationClass as C;
        match class {
            C::Name => TrustedDomainInformation::Name {
                name: self.info.name.clone(),
            },
            C::PosixOffset => TrustedDomainInformation::PosixOffset {
                offset: self.posix_offset,
            },
            C::Basic => TrustedDomainInformation::Basic {
                name: self.info.flat_name.clone(),
                sid: self.info.sid,
            },
            C::InformationEx => TrustedDomainInformation::InformationEx(self.info.clone()),
            C::AuthInformation => TrustedDomainInformation::AuthInformation(self.auth.clone()),
            C::FullInformation => TrustedDomainInformation::FullInformation {
                information: self.info.clone(),
                posix_offset: self.posix_offset,
                auth: self.auth.clone(),
            },
            C::SupportedEncryptionTypes => {
                TrustedDomainInformation::SupportedEncryptionTypes(self.supported_encryption_types)
            }
        }
    }

    /// Set one information class
    ///
    /// The identity of a trust (names and SID) cannot change. Nothing
    /// changes on error.
    pub fn set(&mut self, info: TrustedDomainInformation) -> LsaResult<()> {
        match info {
            TrustedDomainInformation::Name { .. } | TrustedDomainInformation::Basic { .. } => {
                Err(NtStatus::NotImplemented)
            }
            TrustedDomainInformation::PosixOffset { offset } => {
                self.posix_offset = offset;
                Ok(())
            }
            TrustedDomainInformation::InformationEx(ex) => {
                self.check_update(&ex)?;
                self.info = ex;
                Ok(())
            }
            TrustedDomainInformation::AuthInformation(auth) => {
                self.auth = stamp(auth);
                Ok(())
            }
            TrustedDomainInformation::FullInformation {
                information,
                posix_offset,
                auth,
            } => {
                self.check_update(&information)?;
                self.info = information;
                self.posix_offset = posix_offset;
                self.auth = stamp(auth);
                Ok(())
            }
            TrustedDomainInformation::SupportedEncryptionTypes(types) => {
                self.supported_encryption_types = types;
                Ok(())
            }
        }
    }

    fn check_update(&self, ex: &TrustedDomainInformationEx) -> LsaResult<()> {
        if !self.info.same_identity(ex) {
            return Err(NtStatus::InvalidParameter);
        }
        ex.validate_attributes()
    }

    /// Check whether the trust may carry forest trust information
    pub fn is_forest_transitive(&self) -> bool {
        self.info
            .trust_attributes
            .contains(TrustAttributes::FOREST_TRANSITIVE)
    }
}

/// Fill in missing update times
fn stamp(mut auth: AuthInformation) -> AuthInformation {
    let now = query_system_time();
    for entry in auth
        .incoming
        .iter_mut()
        .chain(auth.incoming_previous.iter_mut())
        .chain(auth.outgoing.iter_mut())
        .chain(auth.outgoing_previous.iter_mut())
    {
        if entry.last_update_time == 0 {
            entry.last_update_time = now;
        }
    }
    auth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::se::sid::identifier_authority::SECURITY_NT_AUTHORITY;

    fn domain_sid(n: u32) -> Sid {
        Sid::from_array(SECURITY_NT_AUTHORITY, [21, 100, 200, n])
    }

    fn ex(name: &str, flat: &str, sid: Option<Sid>) -> TrustedDomainInformationEx {
        TrustedDomainInformationEx {
            name: String::from(name),
            flat_name: String::from(flat),
            sid,
            trust_direction: TrustDirection::Bidirectional,
            trust_type: TrustType::Uplevel,
            trust_attributes: TrustAttributes::FOREST_TRANSITIVE,
        }
    }

    fn tln(name: &str) -> ForestTrustRecord {
        ForestTrustRecord {
            flags: 0,
            time: 0,
            data: ForestTrustData::TopLevelName(String::from(name)),
        }
    }

    fn local() -> LocalForest {
        LocalForest {
            dns_domain_name: String::from("corp.example.com"),
            dns_forest_name: String::from("example.com"),
            netbios_name: String::from("CORP"),
            domain_sid: Some(domain_sid(1)),
        }
    }

    #[test]
    fn test_class_numbers() {
        assert_eq!(TrustedDomainInformationClass::from_u32(6), Ok(TrustedDomainInformationClass::InformationEx));
        for class in [0, 2, 4, 9, 10, 11, 12, 14] {
            assert_eq!(TrustedDomainInformationClass::from_u32(class), Err(NtStatus::InvalidInfoClass));
        }
    }

    #[test]
    fn test_validate() {
        assert_eq!(ex("a.com", "A", Some(domain_sid(2))).validate(255), Ok(()));
        assert_eq!(ex("", "A", Some(domain_sid(2))).validate(255), Err(NtStatus::InvalidParameter));
        assert_eq!(ex("abcdef.com", "A", Some(domain_sid(2))).validate(4), Err(NtStatus::NameTooLong));
        assert_eq!(ex("a.com", "A", None).validate(255), Err(NtStatus::InvalidSid));

        let mut mit = ex("realm", "REALM", None);
        mit.trust_type = TrustType::Mit;
        mit.trust_attributes = TrustAttributes::empty();
        assert_eq!(mit.validate(255), Ok(()));

        let mut downlevel = ex("a.com", "A", Some(domain_sid(2)));
        downlevel.trust_type = TrustType::Downlevel;
        assert_eq!(downlevel.validate(255), Err(NtStatus::InvalidDomainState));

        let mut unknown = ex("a.com", "A", Some(domain_sid(2)));
        unknown.trust_attributes = TrustAttributes::from_bits_retain(0x8000_0000);
        assert_eq!(unknown.validate(255), Err(NtStatus::InvalidParameter));
    }

    #[test]
    fn test_set_info_keeps_identity() {
        let mut tdo = TrustedDomain::new(ex("a.com", "A", Some(domain_sid(2))), AuthInformation::default(), domain_sid(9));

        let mut renamed = tdo.info.clone();
        renamed.name = String::from("b.com");
        assert_eq!(
            tdo.set(TrustedDomainInformation::InformationEx(renamed)),
            Err(NtStatus::InvalidParameter)
        );

        let mut outbound = tdo.info.clone();
        outbound.trust_direction = TrustDirection::Outbound;
        tdo.set(TrustedDomainInformation::InformationEx(outbound)).unwrap();
        assert_eq!(tdo.info.trust_direction, TrustDirection::Outbound);

        assert_eq!(
            tdo.set(TrustedDomainInformation::Name { name: String::from("x") }),
            Err(NtStatus::NotImplemented)
        );
    }

    #[test]
    fn test_set_info_recases_non_ascii_name() {
        let mut tdo = TrustedDomain::new(
            ex("müller.example", "MÜLLER", Some(domain_sid(2))),
            AuthInformation::default(),
            domain_sid(9),
        );
        let mut recased = tdo.info.clone();
        recased.name = String::from("MÜLLER.EXAMPLE");
        recased.flat_name = String::from("müller");
        tdo.set(TrustedDomainInformation::InformationEx(recased)).unwrap();
        assert_eq!(tdo.info.flat_name, "müller");
        assert_eq!(domain_name_key("müller"), domain_name_key("MÜLLER"));
    }

    #[test]
    fn test_full_information_is_all_or_nothing() {
        let mut tdo = TrustedDomain::new(ex("a.com", "A", Some(domain_sid(2))), AuthInformation::default(), domain_sid(9));
        let mut bad = tdo.info.clone();
        bad.trust_type = TrustType::Downlevel;
        let result = tdo.set(TrustedDomainInformation::FullInformation {
            information: bad,
            posix_offset: 7,
            auth: AuthInformation::default(),
        });
        assert_eq!(result, Err(NtStatus::InvalidDomainState));
        assert_eq!(tdo.posix_offset, 0);
    }

    #[test]
    fn test_dns_overlap() {
        assert!(dns_names_overlap("example.com", "EXAMPLE.COM."));
        assert!(dns_names_overlap("sub.example.com", "example.com"));
        assert!(dns_names_overlap("example.com", "sub.example.com"));
        assert!(!dns_names_overlap("badexample.com", "example.com"));
        assert!(!dns_names_overlap("", "example.com"));
    }

    #[test]
    fn test_collisions_with_local_forest() {
        let mut info = ForestTrustInformation {
            records: vec![
                tln("fabrikam.com"),
                tln("example.com"),
                ForestTrustRecord {
                    flags: 0,
                    time: 0,
                    data: ForestTrustData::DomainInfo {
                        sid: domain_sid(1),
                        dns_name: String::from("x.fabrikam.com"),
                        netbios_name: String::from("X"),
                    },
                },
            ],
        };
        let collisions = detect_collisions(&mut info, &local(), core::iter::empty());

        assert_eq!(collisions.len(), 2);
        assert_eq!(collisions[0].index, 1);
        assert_eq!(collisions[0].collision_type, CollisionRecordType::TopLevelName);
        assert_eq!(info.records[1].flags, LSA_TLN_DISABLED_CONFLICT);
        assert_eq!(collisions[1].collision_type, CollisionRecordType::Domain);
        assert_eq!(info.records[2].flags, LSA_SID_DISABLED_CONFLICT);
        assert_eq!(info.records[0].flags, 0);
    }

    #[test]
    fn test_collisions_with_other_trusts() {
        let other = ForestTrustInformation {
            records: vec![tln("fabrikam.com")],
        };
        let mut info = ForestTrustInformation {
            records: vec![tln("eu.fabrikam.com"), tln("tailspin.com")],
        };
        let others = [("fabrikam.com", &other)];
        let collisions = detect_collisions(&mut info, &local(), others.iter().copied());
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].name, "fabrikam.com");
        assert_eq!(info.records[1].flags, 0);
    }

    #[test]
    fn test_record_type_filter() {
        let info = ForestTrustInformation {
            records: vec![
                tln("a.com"),
                ForestTrustRecord {
                    flags: 0,
                    time: 0,
                    data: ForestTrustData::TopLevelNameEx(String::from("b.a.com")),
                },
            ],
        };
        assert_eq!(info.filtered(ForestTrustRecordType::TopLevelName).records.len(), 1);
        assert_eq!(
            info.check_record_types(ForestTrustRecordType::TopLevelName),
            Err(NtStatus::InvalidParameter)
        );
        assert_eq!(info.check_record_types(ForestTrustRecordType::LAST), Ok(()));
        assert_eq!(ForestTrustRecordType::from_u32(3), Err(NtStatus::InvalidParameter));
    }
}
