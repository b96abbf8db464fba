//! lsad
//!
//! A Local Security Authority policy service after the NT model: the
//! security policy database together with the capability handles, access
//! checks and resumable enumerations through which callers reach it.
//!
//! # Subsystems
//!
//! - **ex** - Executive: LUIDs and system time
//! - **se** - Security: SIDs, ACLs, descriptors, caller identities, access checks, privileges
//! - **ob** - Object Manager: the capability handle table
//! - **lsa** - The policy store and the operations served on it
//!
//! # Usage
//!
//! Callers present a [`CallerIdentity`] with every operation. A session
//! starts with `open_policy2`, which needs no handle, and ends with
//! `close_session`, which drops every handle and enumeration context the
//! session still holds.
//!
//! The transport that decodes opnums and marshals parameters is not part
//! of this crate; [`lsa::OpnumSlot`] maps wire opnums to operations.

pub mod config;
pub mod ex;
pub mod lsa;
pub mod ob;
pub mod se;
pub mod status;

pub use config::LsaConfig;
pub use lsa::LsaServer;
pub use ob::Handle;
pub use se::{CallerIdentity, SessionId, Sid};
pub use status::{LsaResult, NtStatus};
