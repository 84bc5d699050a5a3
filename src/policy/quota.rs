use thiserror::Error;

use crate::models::AdStatus;

/// Cap on simultaneously open advertisements per acting user.
pub const MAX_OPEN_ADVERTISEMENTS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Open advertisements limit exceeded ({limit})")]
pub struct QuotaExceeded {
    pub limit: u64,
}

/// Status a write is validated against: the one being written, or
/// [`AdStatus::default`] when the write leaves it out.
pub fn target(written: Option<AdStatus>) -> AdStatus {
    written.unwrap_or_default()
}

/// Whether a write validated against `target` needs an open-count check.
pub fn applies(target: AdStatus) -> bool {
    target == AdStatus::Open
}

/// Checks the acting user's current open count against the cap.
///
/// Callers must take `open_count` inside the same critical section as the
/// write that follows.
pub fn check(open_count: u64) -> Result<(), QuotaExceeded> {
    if open_count >= MAX_OPEN_ADVERTISEMENTS {
        return Err(QuotaExceeded {
            limit: MAX_OPEN_ADVERTISEMENTS,
        });
    }
    Ok(())
}
