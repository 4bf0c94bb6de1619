//! Gyro heading integration.

/// Integrates an angular-rate reading over host time into an absolute,
/// unwrapped heading.
///
/// The heading is never normalized: a robot that spins twice reads `4π`.
/// Callers compare headings by plain subtraction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadingIntegrator {
    angle: f64,
    last_timestamp: Option<f64>,
}

impl HeadingIntegrator {
    /// Starts at heading zero with no time baseline.
    pub const fn new() -> Self {
        HeadingIntegrator {
            angle: 0.0,
            last_timestamp: None,
        }
    }

    /// Starts at the given heading with no time baseline.
    pub const fn with_heading(angle: f64) -> Self {
        HeadingIntegrator {
            angle,
            last_timestamp: None,
        }
    }

    /// Advances the heading by `rate * (now - last)`.
    ///
    /// The first call only records `now`. A timestamp earlier than the
    /// previous one re-baselines without integrating.
    pub fn update(&mut self, rate: f64, now: f64) {
        if let Some(last) = self.last_timestamp {
            let dt = now - last;
            if dt > 0.0 {
                self.angle += rate * dt;
            }
        }
        self.last_timestamp = Some(now);
    }

    /// Current unwrapped heading (rad).
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Timestamp of the most recent update, if any.
    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_first_update_sets_baseline_only() {
        let mut heading = HeadingIntegrator::new();
        heading.update(5.0, 100.0);
        assert_eq!(heading.angle(), 0.0);
        assert_eq!(heading.last_timestamp(), Some(100.0));
    }

    #[test]
    fn test_integrates_rate_over_elapsed_time() {
        let mut heading = HeadingIntegrator::new();
        heading.update(0.0, 0.0);
        heading.update(1.0, 0.5);
        heading.update(-2.0, 0.75);
        assert!((heading.angle() - 0.0).abs() < EPSILON);
    }

    #[test]
    fn test_heading_is_unwrapped() {
        let mut heading = HeadingIntegrator::with_heading(PI);
        heading.update(0.0, 0.0);
        for i in 1..=10 {
            heading.update(PI, i as f64 * 0.1);
        }
        assert!((heading.angle() - 2.0 * PI).abs() < EPSILON);
    }

    #[test]
    fn test_time_rewind_does_not_integrate() {
        let mut heading = HeadingIntegrator::new();
        heading.update(1.0, 2.0);
        heading.update(1.0, 1.0);
        assert_eq!(heading.angle(), 0.0);
        heading.update(1.0, 1.5);
        assert!((heading.angle() - 0.5).abs() < EPSILON);
    }
}
