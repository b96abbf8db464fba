//! Local Security Authority policy service (lsa)
//!
//! The policy database and the operations served on it:
//!
//! - **Policy**: the singleton root holding the local security policy
//! - **Accounts**: privileges, system access and rights granted to a SID
//! - **Secrets**: named current/old value pairs, also reachable as private data
//! - **Trusted Domains**: trust relationships and forest trust information
//!
//! # Layout
//!
//! - `store`: the object store and its indexes behind one `RwLock`
//! - `rights`: operation table with the rights each operation needs
//! - `enumeration`: resumable enumeration contexts
//! - `server`: `LsaServer`, one file per operation family
//!
//! # Locking
//!
//! The store lock is taken before the handle table lock. Objects are
//! created and deleted with the store write lock held, so a handle never
//! names an object that is not in the store.

pub mod account;
pub mod enumeration;
pub mod policy;
pub mod rights;
pub mod secret;
pub mod server;
pub mod store;
pub mod trust;

pub use enumeration::{CollectionKind, Enumerated};
pub use policy::{
    DomainInformation, DomainInformationClass, PolicyInformation, PolicyInformationClass,
};
pub use rights::{Operation, OpnumSlot, MAX_OPNUM};
pub use secret::{SecretValue, SecretValues};
pub use server::{LsaServer, LsaStatsSnapshot, NoOpResponse, TrustInformation};
pub use store::PolicyStore;
pub use trust::{
    AuthInformation, CollisionRecord, ForestTrustInformation, TrustedDomainInformation,
    TrustedDomainInformationEx,
};
