//! Object Manager
//!
//! Capability handles and the typed object references they carry.

pub mod handle;
pub mod object_type;

pub use handle::{Handle, HandleEntry, HandleTable, MAX_HANDLES};
pub use object_type::{ObjectId, ObjectKind, ObjectRef};
