//! Object Types
//!
//! Every handle names exactly one policy object through an [`ObjectRef`],
//! a tagged reference carrying the object's kind and identity. The policy
//! root is a singleton and needs no identity.
//!
//! # Object Kinds
//! - Policy
//! - Account
//! - Secret
//! - TrustedDomain

use core::fmt;

use crate::ex::Luid;

/// Identity of a stored object
///
/// Drawn from a monotonic LUID source, so identities sort in creation
/// order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub Luid);

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0.to_u64())
    }
}

/// Kind of a policy object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ObjectKind {
    Policy = 1,
    Account = 2,
    Secret = 3,
    TrustedDomain = 4,
}

impl ObjectKind {
    /// Name used in log messages
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Policy => "Policy",
            ObjectKind::Account => "Account",
            ObjectKind::Secret => "Secret",
            ObjectKind::TrustedDomain => "TrustedDomain",
        }
    }
}

/// Reference to one policy object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    Policy,
    Account(ObjectId),
    Secret(ObjectId),
    TrustedDomain(ObjectId),
}

impl ObjectRef {
    /// Kind of the referenced object
    pub fn kind(self) -> ObjectKind {
        match self {
            ObjectRef::Policy => ObjectKind::Policy,
            ObjectRef::Account(_) => ObjectKind::Account,
            ObjectRef::Secret(_) => ObjectKind::Secret,
            ObjectRef::TrustedDomain(_) => ObjectKind::TrustedDomain,
        }
    }

    /// Identity of the referenced object (`None` for the policy root)
    pub fn id(self) -> Option<ObjectId> {
        match self {
            ObjectRef::Policy => None,
            ObjectRef::Account(id) | ObjectRef::Secret(id) | ObjectRef::TrustedDomain(id) => Some(id),
        }
    }
}
