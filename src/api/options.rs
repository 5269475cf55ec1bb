use rand::Rng;
use std::convert::TryFrom;
use tokio::time::Duration;

/// Tuning knobs of a replicated log. Unset fields fall back to defaults.
#[derive(Clone, Debug, Default)]
pub struct ReplicationOptions {
    /// Deadline of a single AppendEntries call. Expiry counts as a transport failure.
    pub append_entries_timeout: Option<Duration>,
    /// Backoff after the first transport failure. Doubles with every consecutive failure.
    pub initial_retry_delay: Option<Duration>,
    /// Upper bound of the backoff.
    pub max_retry_delay: Option<Duration>,
    /// Upper bound of entries sent in one AppendEntries request. Unbounded if unset.
    pub max_entries_per_request: Option<usize>,
}

#[derive(Clone, Debug)]
pub(crate) struct ReplicationOptionsValidated {
    pub append_entries_timeout: Duration,
    pub retry_policy: RetryPolicy,
    pub max_entries_per_request: usize,
}

impl ReplicationOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.append_entries_timeout == Duration::from_millis(0) {
            return Err("AppendEntries timeout must be non-zero");
        }
        if self.retry_policy.initial_delay == Duration::from_millis(0) {
            return Err("Initial retry delay must be non-zero");
        }
        if self.retry_policy.initial_delay > self.retry_policy.max_delay {
            return Err("Initial retry delay must not exceed maximum retry delay");
        }
        if self.max_entries_per_request == 0 {
            return Err("Maximum entries per request must be non-zero");
        }

        Ok(())
    }
}

impl TryFrom<ReplicationOptions> for ReplicationOptionsValidated {
    type Error = &'static str;

    fn try_from(options: ReplicationOptions) -> Result<Self, Self::Error> {
        let values = ReplicationOptionsValidated {
            append_entries_timeout: options.append_entries_timeout.unwrap_or(Duration::from_millis(300)),
            retry_policy: RetryPolicy {
                initial_delay: options.initial_retry_delay.unwrap_or(Duration::from_millis(100)),
                max_delay: options.max_retry_delay.unwrap_or(Duration::from_millis(3200)),
            },
            max_entries_per_request: options.max_entries_per_request.unwrap_or(usize::MAX),
        };

        values.validate()?;
        Ok(values)
    }
}

impl Default for ReplicationOptionsValidated {
    fn default() -> Self {
        ReplicationOptionsValidated {
            append_entries_timeout: Duration::from_millis(300),
            retry_policy: RetryPolicy {
                initial_delay: Duration::from_millis(100),
                max_delay: Duration::from_millis(3200),
            },
            max_entries_per_request: usize::MAX,
        }
    }
}

/// Capped exponential backoff between retries to an unresponsive follower.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// `initial_delay * 2^(num_errors - 1)`, capped at `max_delay`.
    pub(crate) fn delay_for(&self, num_errors: u32) -> Duration {
        let exponent = num_errors.saturating_sub(1);
        let delay = 2u32
            .checked_pow(exponent)
            .and_then(|factor| self.initial_delay.checked_mul(factor))
            .unwrap_or(self.max_delay);

        std::cmp::min(delay, self.max_delay)
    }

    /// `delay_for()` shortened by up to 10%, so followers that failed together don't retry in
    /// lockstep.
    pub(crate) fn jittered_delay_for(&self, num_errors: u32) -> Duration {
        let delay = self.delay_for(num_errors);
        let max_jitter_micros = delay.as_micros() as u64 / 10;
        if max_jitter_micros == 0 {
            return delay;
        }

        let jitter = rand::thread_rng().gen_range(0..=max_jitter_micros);
        delay - Duration::from_micros(jitter)
    }
}
