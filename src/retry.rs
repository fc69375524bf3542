use std::time::Duration;

use log::info;

use crate::error::ClockError;

/// How long a blocking wait keeps polling before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    /// `None` polls forever.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub const fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    pub const fn bounded(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: Some(max_attempts),
        }
    }

    /// Zero means unbounded, matching how the config file spells it.
    pub const fn from_limit(interval: Duration, limit: u32) -> Self {
        if limit == 0 {
            Self::unbounded(interval)
        } else {
            Self::bounded(interval, limit)
        }
    }
}

/// Call `attempt` until it reports success, sleeping `policy.interval`
/// between failures. Returns the number of attempts it took.
pub fn retry_until<F, S>(
    policy: &RetryPolicy,
    what: &str,
    mut sleep: S,
    mut attempt: F,
) -> Result<u32, ClockError>
where
    F: FnMut(u32) -> bool,
    S: FnMut(Duration),
{
    let mut n: u32 = 0;
    loop {
        n = n.saturating_add(1);
        if attempt(n) {
            return Ok(n);
        }
        if let Some(max) = policy.max_attempts {
            if n >= max {
                return Err(ClockError::connectivity(format!(
                    "{} did not succeed after {} attempts",
                    what, n
                )));
            }
        }
        if n == 1 || n.is_multiple_of(30) {
            info!("{}: waiting (attempt {})", what, n);
        }
        sleep(policy.interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_success_does_not_sleep() {
        let mut slept = 0;
        let n = retry_until(
            &RetryPolicy::unbounded(Duration::from_secs(1)),
            "probe",
            |_| slept += 1,
            |_| true,
        )
        .unwrap();
        assert_eq!(n, 1);
        assert_eq!(slept, 0);
    }

    #[test]
    fn unbounded_keeps_polling_until_success() {
        let mut slept = Vec::new();
        let n = retry_until(
            &RetryPolicy::unbounded(Duration::from_millis(100)),
            "probe",
            |d| slept.push(d),
            |n| n == 500,
        )
        .unwrap();
        assert_eq!(n, 500);
        assert_eq!(slept.len(), 499);
        assert!(slept.iter().all(|d| *d == Duration::from_millis(100)));
    }

    #[test]
    fn bounded_gives_up_with_connectivity_error() {
        let mut calls = 0;
        let err = retry_until(
            &RetryPolicy::bounded(Duration::from_secs(1), 3),
            "ntp sync",
            |_| {},
            |_| {
                calls += 1;
                false
            },
        )
        .unwrap_err();
        assert_eq!(calls, 3);
        assert!(matches!(err, ClockError::Connectivity(ref m) if m.contains("ntp sync")));
    }

    #[test]
    fn bounded_succeeds_on_last_attempt() {
        let n = retry_until(
            &RetryPolicy::bounded(Duration::from_secs(1), 4),
            "wifi",
            |_| {},
            |n| n == 4,
        )
        .unwrap();
        assert_eq!(n, 4);
    }

    #[test]
    fn zero_limit_is_unbounded() {
        let p = RetryPolicy::from_limit(Duration::from_secs(1), 0);
        assert_eq!(p.max_attempts, None);
        let p = RetryPolicy::from_limit(Duration::from_secs(1), 7);
        assert_eq!(p.max_attempts, Some(7));
    }
}
