//! Time utilities for KYC review.
//!
//! All timestamps are Unix epoch microseconds (u64).

use std::sync::atomic::{AtomicU64, Ordering};

static LAST_MICROS: AtomicU64 = AtomicU64::new(0);

/// Return the current time as microseconds since Unix epoch.
///
/// Values are strictly increasing within a process, so records created in
/// the same microsecond still order deterministically.
pub fn now_micros() -> u64 {
    let wall = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0);

    let mut last = LAST_MICROS.load(Ordering::Relaxed);
    loop {
        let next = wall.max(last + 1);
        match LAST_MICROS.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(observed) => last = observed,
        }
    }
}

/// Convert microseconds to an RFC 3339 string.
pub fn micros_to_rfc3339(micros: u64) -> String {
    let secs = (micros / 1_000_000) as i64;
    let nsecs = ((micros % 1_000_000) * 1000) as u32;
    let dt = chrono::DateTime::from_timestamp(secs, nsecs).unwrap_or(chrono::DateTime::UNIX_EPOCH);
    dt.to_rfc3339()
}
