//! Retry and fetch configuration.
//!
//! Durations serialize as whole milliseconds so configs read naturally as
//! JSON (`"initial_backoff_ms": 200`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bounded retry with exponential backoff.
///
/// Used both for ledger calls that fail transiently and for polling a root
/// until a message shows up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts including the first one. Zero behaves as one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    #[serde(rename = "initial_backoff_ms", with = "duration_ms")]
    pub initial_backoff: Duration,
    /// Upper bound on any single delay.
    #[serde(rename = "max_backoff_ms", with = "duration_ms")]
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
    /// Budget for the whole operation, retries included.
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
            timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// `max_attempts` attempts with a fixed short delay. Handy in tests.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff: delay,
            max_backoff: delay,
            multiplier: 1.0,
            ..Self::default()
        }
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Fresh backoff schedule for one operation.
    pub(crate) fn backoff(&self) -> backoff::ExponentialBackoff {
        backoff::ExponentialBackoff {
            initial_interval: self.initial_backoff,
            current_interval: self.initial_backoff,
            randomization_factor: 0.0,
            multiplier: self.multiplier,
            max_interval: self.max_backoff,
            start_time: std::time::Instant::now(),
            // The attempt count and `timeout` bound the schedule instead.
            max_elapsed_time: None,
            clock: backoff::SystemClock::default(),
        }
    }
}

/// Chain walking limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Most links a single `fetch` follows before handing back a root to
    /// continue from.
    pub max_chain_length: usize,
    /// How long `poll` waits for a message to appear.
    pub poll: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_chain_length: 1_000,
            poll: RetryPolicy {
                max_attempts: 20,
                initial_backoff: Duration::from_millis(500),
                max_backoff: Duration::from_secs(10),
                multiplier: 1.5,
                timeout: Duration::from_secs(120),
            },
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoff::backoff::Backoff;

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy {
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
            multiplier: 2.0,
            ..RetryPolicy::default()
        };
        let mut backoff = policy.backoff();
        let delays: Vec<Duration> = (0..5).filter_map(|_| backoff.next_backoff()).collect();
        assert_eq!(delays.len(), 5);

        let ms: Vec<u128> = delays.iter().map(Duration::as_millis).collect();
        assert_eq!(ms[0], 100);
        assert_eq!(ms[1], 200);
        assert!(ms.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(ms[4], 350);
    }

    #[test]
    fn test_zero_attempts_means_one() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.attempts(), 1);
    }

    #[test]
    fn test_json_uses_milliseconds() {
        let json = serde_json::to_value(RetryPolicy::default()).unwrap();
        assert_eq!(json["initial_backoff_ms"], 200);
        assert_eq!(json["timeout_ms"], 60_000);

        let parsed: RetryPolicy =
            serde_json::from_str(r#"{"max_attempts": 3, "timeout_ms": 1500}"#).unwrap();
        assert_eq!(parsed.max_attempts, 3);
        assert_eq!(parsed.timeout, Duration::from_millis(1500));
        assert_eq!(parsed.initial_backoff, RetryPolicy::default().initial_backoff);
    }
}
