use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

/// A user asked for another GIF before their window elapsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RateLimited {
    pub(crate) remaining: TimeDelta,
    pub(crate) retry_after: DateTime<Utc>,
}

impl RateLimited {
    pub(crate) fn message(&self) -> String {
        let days = self.remaining.num_days();
        let hours = (self.remaining - TimeDelta::days(days)).num_hours();
        format!(
            "Rate limit exceeded. Please wait {days} days and {hours} hours before generating \
             another GIF."
        )
    }

    pub(crate) fn retry_after_rfc3339(&self) -> String {
        self.retry_after.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// In-memory "one generation per window" limiter keyed by user id.
///
/// A zero window disables limiting.
#[derive(Debug)]
pub(crate) struct RateLimiter {
    window: TimeDelta,
    last_generation: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl RateLimiter {
    pub(crate) fn new(window: TimeDelta) -> Self {
        Self {
            window,
            last_generation: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn check(&self, user: &str, now: DateTime<Utc>) -> Result<(), RateLimited> {
        if self.window <= TimeDelta::zero() {
            return Ok(());
        }
        let table = self
            .last_generation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(&last) = table.get(user) else {
            return Ok(());
        };
        let elapsed = now - last;
        if elapsed >= self.window {
            return Ok(());
        }
        Err(RateLimited {
            remaining: self.window - elapsed,
            retry_after: last + self.window,
        })
    }

    /// Record a successful generation at `now`.
    pub(crate) fn record(&self, user: &str, now: DateTime<Utc>) {
        if self.window <= TimeDelta::zero() {
            return;
        }
        let mut table = self
            .last_generation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        table.insert(user.to_string(), now);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/server/rate_limit.rs"]
mod tests;
