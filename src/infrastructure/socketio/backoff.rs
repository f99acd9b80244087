use rand::Rng;
use std::time::Duration;

/// Reconnection settings, with the Socket.IO client's defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    pub delay_max: Duration,
    /// 0.0 disables jitter
    pub randomization_factor: f64,
    /// `None` retries forever
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1000),
            delay_max: Duration::from_millis(5000),
            randomization_factor: 0.5,
            max_attempts: None,
        }
    }
}

/// Exponential backoff with jitter
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: ReconnectPolicy,
    attempts: u32,
}

impl Backoff {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Delay before the next attempt, or `None` once attempts are exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if let Some(max) = self.policy.max_attempts
            && self.attempts >= max
        {
            return None;
        }

        let base = self.policy.delay.as_millis() as f64;
        let mut ms = base * 2f64.powi(self.attempts.min(31) as i32);
        self.attempts += 1;

        let factor = self.policy.randomization_factor;
        if factor > 0.0 {
            let roll: f64 = rand::rng().random();
            let deviation = (roll * factor * ms).floor();
            ms = if ((roll * 10.0).floor() as u64) & 1 == 0 {
                ms - deviation
            } else {
                ms + deviation
            };
        }

        let capped = ms.min(self.policy.delay_max.as_millis() as f64).max(0.0);
        Some(Duration::from_millis(capped as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: Option<u32>) -> ReconnectPolicy {
        ReconnectPolicy {
            randomization_factor: 0.0,
            max_attempts,
            ..ReconnectPolicy::default()
        }
    }

    #[test]
    fn test_delay_doubles_until_cap() {
        let mut backoff = Backoff::new(policy(None));
        let delays: Vec<u64> = (0..5)
            .map(|_| backoff.next_delay().unwrap().as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 5000, 5000]);
    }

    #[test]
    fn test_reset_restarts_sequence() {
        let mut backoff = Backoff::new(policy(None));
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.attempts(), 0);
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(1000)));
    }

    #[test]
    fn test_attempts_are_bounded() {
        let mut backoff = Backoff::new(policy(Some(2)));
        assert!(backoff.next_delay().is_some());
        assert!(backoff.next_delay().is_some());
        assert_eq!(backoff.next_delay(), None);
    }

    #[test]
    fn test_jitter_stays_within_factor() {
        let mut backoff = Backoff::new(ReconnectPolicy::default());
        for _ in 0..50 {
            backoff.reset();
            let delay = backoff.next_delay().unwrap().as_millis() as u64;
            assert!((500..=1500).contains(&delay), "delay {} out of range", delay);
        }
    }
}
