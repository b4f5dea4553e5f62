//! Per-entry expiry with an optional early-expiry window
//!
//! An entry may carry a hard deadline and, before it, an early point from
//! which it becomes increasingly likely to be treated as expired. Spreading
//! recomputation over that window keeps many entries created together from
//! all expiring on the same instant.

use std::time::{Duration, Instant};

/// When an entry stops being served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Expiry {
    /// Hard deadline; at or after this the entry is always expired
    pub expires_at: Option<Instant>,
    /// Start of the probabilistic window (never later than `expires_at`)
    pub early_expires_at: Option<Instant>,
}

impl Expiry {
    /// An entry that never expires
    pub const fn never() -> Self {
        Self { expires_at: None, early_expires_at: None }
    }

    /// Hard deadline at `deadline`
    pub const fn at(deadline: Instant) -> Self {
        Self { expires_at: Some(deadline), early_expires_at: None }
    }

    /// Hard deadline `ttl` after `now`
    ///
    /// A deadline too far out for the platform's `Instant` never expires.
    pub fn after(now: Instant, ttl: Duration) -> Self {
        now.checked_add(ttl).map_or(Self::never(), Self::at)
    }

    /// Open an early-expiry window covering the last `variance` fraction of
    /// the lifetime between `created_at` and the deadline
    ///
    /// `variance` is clamped to `[0, 1]`; zero leaves the expiry unchanged.
    ///
    /// ```
    /// use std::time::{Duration, Instant};
    ///
    /// use memora_common::cache::Expiry;
    ///
    /// let created = Instant::now();
    /// let expiry = Expiry::after(created, Duration::from_secs(100)).with_variance(created, 0.2);
    /// assert_eq!(expiry.early_expires_at, Some(created + Duration::from_secs(80)));
    /// ```
    #[must_use]
    pub fn with_variance(self, created_at: Instant, variance: f64) -> Self {
        let Some(deadline) = self.expires_at else {
            return self;
        };
        let variance = variance.clamp(0.0, 1.0);
        if variance == 0.0 {
            return self;
        }

        let lifetime = deadline.saturating_duration_since(created_at);
        let window = lifetime.mul_f64(variance);
        let early = deadline.checked_sub(window).unwrap_or(created_at).max(created_at);
        Self { expires_at: Some(deadline), early_expires_at: Some(early) }
    }

    /// Whether the entry is expired at `now`
    ///
    /// `roll` is a uniform sample in `[0, 1)`. Inside the early window the
    /// chance of expiry grows linearly from 0 at `early_expires_at` to 1 at
    /// `expires_at`.
    pub fn is_expired(&self, now: Instant, roll: f64) -> bool {
        let Some(deadline) = self.expires_at else {
            return false;
        };
        if now >= deadline {
            return true;
        }
        match self.early_expires_at {
            Some(early) if now >= early => {
                let window = deadline.duration_since(early).as_secs_f64();
                if window <= 0.0 {
                    return true;
                }
                let progressed = now.duration_since(early).as_secs_f64() / window;
                roll < progressed
            }
            _ => false,
        }
    }

    /// Time left before the hard deadline, `None` if it never expires
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at.map(|deadline| deadline.saturating_duration_since(now))
    }
}
