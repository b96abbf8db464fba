//! Executive support
//!
//! Identifier allocation and system time shared by the security and
//! policy subsystems.

pub mod luid;
pub mod time;

pub use luid::{Luid, LuidSource, LUID_RESERVED_COUNT};
pub use time::query_system_time;
