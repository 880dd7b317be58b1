//! Reconnect and backoff utilities for the detection channel.

use std::io::ErrorKind;
use std::time::Duration;

/// Default number of reconnect attempts after the first failure.
pub const DEFAULT_CONNECT_RETRIES: u32 = 3;

/// Base delay for exponential backoff (500 milliseconds).
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Maximum delay cap for exponential backoff (10 seconds).
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(10);

/// Determine if a connect error is transient and worth retrying.
///
/// Refused, reset and timed-out connections usually mean the service is
/// still starting. Anything else (bad address, permission) will not improve.
pub fn is_transient_io_error(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::TimedOut
            | ErrorKind::Interrupted
    )
}

/// Calculate exponential backoff delay with jitter.
///
/// Uses the formula: min(base * 2^attempt + jitter, max_delay)
/// where jitter is half the base, capped at 500ms.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exponential = base.saturating_mul(2u32.saturating_pow(attempt));
    let jitter_ms = (base.as_millis() as u64).min(1000);
    let jitter = Duration::from_millis(jitter_ms / 2);
    exponential.saturating_add(jitter).min(max)
}
