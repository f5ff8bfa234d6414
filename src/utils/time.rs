//! Time utilities used by the run engine and dispatcher.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::constants::HOST_SOFT_DEADLINE_FLOOR;

/// Current UTC time, used to stamp `Submission.created_time` (ms since
/// epoch) and for logging.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Format a millisecond time limit as the decimal-seconds string the
/// `$TIME_LIMIT` placeholder expects (spec §4.3 step 6): three decimal
/// places, `s` suffix. `0 ms` formats as `"0.000s"` (spec §8 boundary
/// case), which the sandbox-side timeout wrapper turns into an
/// immediate kill.
pub fn format_timeout(time_limit_ms: u64) -> String {
    format!("{:.3}s", time_limit_ms as f64 / 1000.0)
}

/// Host-side soft deadline (spec §5): `max(5s, 2 * time_limit)`, guarding
/// against a hanging container daemon independent of the in-container
/// timeout wrapper.
pub fn host_soft_deadline(time_limit_ms: u64) -> Duration {
    let doubled = Duration::from_millis(time_limit_ms.saturating_mul(2));
    doubled.max(HOST_SOFT_DEADLINE_FLOOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_timeout_three_decimals() {
        assert_eq!(format_timeout(1500), "1.500s");
        assert_eq!(format_timeout(0), "0.000s");
        assert_eq!(format_timeout(250), "0.250s");
    }

    #[test]
    fn host_soft_deadline_floor_is_five_seconds() {
        assert_eq!(host_soft_deadline(0), Duration::from_secs(5));
        assert_eq!(host_soft_deadline(1000), Duration::from_secs(5));
        assert_eq!(host_soft_deadline(3000), Duration::from_secs(6));
        assert_eq!(host_soft_deadline(10_000), Duration::from_secs(20));
    }
}
