use std::time::Duration;

const DEFAULT_BACKOFF_MS: &[u64] = &[5_000, 15_000, 60_000, 5 * 60_000];

/// Bounded retry with an escalating backoff ladder.
///
/// Pure data so backoff behavior is testable without sleeping; the driver
/// owns the actual waits.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    backoff_ms: Vec<u64>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_ms: Vec<u64>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_ms,
        }
    }

    /// Delay before the attempt following `consecutive_failures` failures.
    /// Clamps to the last rung past the end of the ladder.
    pub fn delay_for(&self, consecutive_failures: u32) -> Duration {
        if self.backoff_ms.is_empty() {
            return Duration::ZERO;
        }
        let idx =
            (consecutive_failures.saturating_sub(1) as usize).min(self.backoff_ms.len() - 1);
        Duration::from_millis(self.backoff_ms[idx])
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: DEFAULT_BACKOFF_MS.to_vec(),
        }
    }
}
