//! System Time
//!
//! Timestamps are reported as NT system time: 100ns intervals since
//! January 1, 1601 (the FILETIME epoch). Values handed out by
//! [`query_system_time`] are strictly increasing, so two updates made in
//! sequence never share a timestamp.

use core::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// System time epoch
/// NT epoch: January 1, 1601
/// Unix epoch: January 1, 1970
/// Difference: 11644473600 seconds = 116444736000000000 100ns units
pub const NT_UNIX_EPOCH_DIFF: u64 = 116_444_736_000_000_000;

/// Last value handed out
static LAST_SYSTEM_TIME: AtomicU64 = AtomicU64::new(0);

fn wall_clock() -> u64 {
    let since_unix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| (d.as_nanos() / 100) as u64)
        .unwrap_or(0);
    NT_UNIX_EPOCH_DIFF + since_unix
}

/// Query system time in 100ns units since NT epoch (January 1, 1601)
pub fn query_system_time() -> i64 {
    let now = wall_clock();
    let mut last = LAST_SYSTEM_TIME.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_SYSTEM_TIME.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next as i64,
            Err(observed) => last = observed,
        }
    }
}
