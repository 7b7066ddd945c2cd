use std::ops::Range;
use std::time::Duration;

use rand::Rng;

use crate::{Error, Result};

/// Exponential backoff with a capped exponent and random jitter:
/// `base^min(attempt, max_exponent) + U[jitter)` seconds.
#[derive(Debug, Clone)]
pub struct Backoff {
    pub base_secs: f64,
    pub max_exponent: u32,
    /// Extra seconds drawn uniformly so concurrently failing pages don't retry in lockstep.
    pub jitter_secs: Range<f64>,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_secs: 2.0,
            max_exponent: 5,
            jitter_secs: 0.5..1.5,
        }
    }
}

impl Backoff {
    /// Delay before the retry that follows failed attempt number `attempt` (starting at 1).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.delay_with(attempt, &mut rand::thread_rng())
    }

    pub fn delay_with<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let (start, end) = (self.jitter_secs.start, self.jitter_secs.end);
        let jitter = if self.jitter_secs.is_empty() || !(end - start).is_finite() {
            start
        } else {
            rng.gen_range(start..end)
        };
        self.base_delay(attempt).saturating_add(secs_to_delay(jitter))
    }

    /// The delay without jitter. Stops growing once `attempt` reaches `max_exponent`
    /// and never exceeds [`MAX_DELAY`].
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.min(self.max_exponent)).unwrap_or(i32::MAX);
        secs_to_delay(self.base_secs.powi(exponent))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.base_secs.is_finite() || self.base_secs <= 0.0 {
            return Err(Error::InvalidConfig("backoff base_secs must be a positive number"));
        }
        let (start, end) = (self.jitter_secs.start, self.jitter_secs.end);
        if !start.is_finite() || !end.is_finite() || start < 0.0 || start > end {
            return Err(Error::InvalidConfig("backoff jitter_secs must be a finite, non-negative range"));
        }
        Ok(())
    }
}

/// Longest single wait between two attempts.
pub const MAX_DELAY: Duration = Duration::from_secs(60 * 60);

fn secs_to_delay(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs)
        .unwrap_or(MAX_DELAY)
        .min(MAX_DELAY)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn delays_stay_within_the_jitter_window() {
        let backoff = Backoff::default();
        let mut rng = StdRng::seed_from_u64(7);
        for attempt in 1..=12 {
            let floor = 2f64.powi(attempt.min(5) as i32);
            for _ in 0..50 {
                let secs = backoff.delay_with(attempt, &mut rng).as_secs_f64();
                assert!(secs >= floor + 0.5 - 1e-9, "attempt {attempt}: {secs}");
                assert!(secs < floor + 1.5, "attempt {attempt}: {secs}");
            }
        }
    }

    #[test]
    fn base_delay_grows_then_saturates() {
        let backoff = Backoff::default();
        let delays: Vec<_> = (1..=8).map(|a| backoff.base_delay(a)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(delays[0], Duration::from_secs(2));
        assert_eq!(delays[3], Duration::from_secs(16));
        assert_eq!(delays[4], Duration::from_secs(32));
        assert_eq!(delays[7], Duration::from_secs(32));
    }

    #[test]
    fn jittered_delays_never_overlap_between_growing_attempts() {
        let backoff = Backoff::default();
        let mut rng = StdRng::seed_from_u64(1);
        for attempt in 1..5 {
            let worst_now = (0..100)
                .map(|_| backoff.delay_with(attempt, &mut rng))
                .max()
                .unwrap();
            let best_next = (0..100)
                .map(|_| backoff.delay_with(attempt + 1, &mut rng))
                .min()
                .unwrap();
            assert!(worst_now <= best_next);
        }
    }

    #[test]
    fn empty_jitter_range_is_deterministic() {
        let backoff = Backoff {
            jitter_secs: 0.0..0.0,
            ..Backoff::default()
        };
        assert_eq!(backoff.delay(3), Duration::from_secs(8));
    }

    #[test]
    fn huge_exponents_saturate_instead_of_panicking() {
        let backoff = Backoff {
            max_exponent: 64,
            ..Backoff::default()
        };
        assert!(backoff.validate().is_ok());
        assert_eq!(backoff.base_delay(64), MAX_DELAY);
        assert!(backoff.delay(64) >= MAX_DELAY);

        let backoff = Backoff {
            max_exponent: u32::MAX,
            ..Backoff::default()
        };
        assert_eq!(backoff.base_delay(u32::MAX), MAX_DELAY);
    }

    #[test]
    fn unusable_parameters_are_rejected() {
        for base_secs in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            let backoff = Backoff {
                base_secs,
                ..Backoff::default()
            };
            assert!(matches!(backoff.validate(), Err(Error::InvalidConfig(_))));
            // Still no panic if someone skips validation.
            let _ = backoff.delay(3);
        }
        for jitter_secs in [-1.0..0.5, 0.5..f64::INFINITY, f64::NAN..1.0, 1.5..0.5] {
            let backoff = Backoff {
                jitter_secs,
                ..Backoff::default()
            };
            assert!(matches!(backoff.validate(), Err(Error::InvalidConfig(_))));
            let _ = backoff.delay(1);
        }
    }
}
