use std::time::Duration;

use rand::{
    Rng,
    distributions::{Distribution, Uniform},
};

use crate::error::LoadError;

/// Randomized pause a simulated user takes before picking its next task.
#[derive(Debug, Clone, Copy)]
pub struct ThinkTime {
    min: Duration,
    max: Duration,
    range: Uniform<f64>,
}

impl ThinkTime {
    /// Pause uniformly between `min_secs` and `max_secs` (inclusive).
    pub fn between(min_secs: f64, max_secs: f64) -> Result<Self, LoadError> {
        if !min_secs.is_finite() || !max_secs.is_finite() {
            return Err(LoadError::InvalidThinkTime(format!(
                "bounds must be finite, got [{min_secs}, {max_secs}]"
            )));
        }
        if min_secs < 0.0 {
            return Err(LoadError::InvalidThinkTime(format!(
                "lower bound {min_secs} is negative"
            )));
        }
        if min_secs > max_secs {
            return Err(LoadError::InvalidThinkTime(format!(
                "lower bound {min_secs} exceeds upper bound {max_secs}"
            )));
        }
        let bound = |secs: f64| {
            Duration::try_from_secs_f64(secs).map_err(|err| {
                LoadError::InvalidThinkTime(format!("bound {secs}s is out of range: {err}"))
            })
        };
        let (min, max) = (bound(min_secs)?, bound(max_secs)?);
        if !(max_secs - min_secs).is_finite() {
            return Err(LoadError::InvalidThinkTime(format!(
                "range [{min_secs}, {max_secs}] is too wide"
            )));
        }
        Ok(Self {
            min,
            max,
            range: Uniform::new_inclusive(min_secs, max_secs),
        })
    }

    /// No pause at all.
    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
            range: Uniform::new_inclusive(0.0, 0.0),
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn contains(&self, pause: Duration) -> bool {
        (self.min..=self.max).contains(&pause)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let secs = self.range.sample(rng);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max)
            .clamp(self.min, self.max)
    }
}
