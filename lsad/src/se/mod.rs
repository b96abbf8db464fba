//! Security Reference Monitor
//!
//! The pieces of the NT security model the policy service needs:
//! - SIDs (`sid`)
//! - ACLs and access rights (`acl`)
//! - Security descriptors (`descriptor`)
//! - Caller identities (`token`)
//! - Access checks (`access`)
//! - The privilege catalog (`privilege`)

pub mod access;
pub mod acl;
pub mod descriptor;
pub mod privilege;
pub mod sid;
pub mod token;

pub use access::{access_check, GenericMapping};
pub use acl::{Ace, AceType, Acl};
pub use descriptor::{SecurityDescriptor, SecurityInformation};
pub use sid::Sid;
pub use token::{CallerIdentity, SessionId};
