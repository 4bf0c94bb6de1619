//! Wheel-encoder odometry.
//!
//! The tracker keeps two views of the distance travelled:
//!
//! * a *local* view measured against a reference snapshot taken by
//!   [`OdometryTracker::reset`], used to bound a single navigation phase;
//! * a *cumulative* view summed tick by tick, never reset during a run.

use libm::fabs;

use crate::DifferentialDrive;

/// Tracks distance travelled from raw wheel encoder positions (radians).
#[derive(Debug, Clone, PartialEq)]
pub struct OdometryTracker {
    drive: DifferentialDrive,
    /// Latest raw encoder positions.
    left: f64,
    right: f64,
    /// Encoder positions captured by the last reset.
    reference_left: f64,
    reference_right: f64,
    /// Signed sum of per-tick mean wheel displacement (m).
    cumulative: f64,
    /// Sum of the magnitude of per-tick mean wheel displacement (m).
    path_length: f64,
}

impl OdometryTracker {
    /// Creates a tracker whose reference and previous readings are the given
    /// raw encoder positions.
    pub fn new(drive: DifferentialDrive, left: f64, right: f64) -> Self {
        OdometryTracker {
            drive,
            left,
            right,
            reference_left: left,
            reference_right: right,
            cumulative: 0.0,
            path_length: 0.0,
        }
    }

    /// Feeds the current raw encoder positions.
    ///
    /// Cumulative distance grows by the mean wheel displacement since the
    /// previous call, so reversing decreases it.
    pub fn update(&mut self, raw_left: f64, raw_right: f64) {
        let radius = self.drive.wheel_radius();
        let delta_left = (raw_left - self.left) * radius;
        let delta_right = (raw_right - self.right) * radius;
        let step = (delta_left + delta_right) / 2.0;

        self.cumulative += step;
        self.path_length += fabs(step);
        self.left = raw_left;
        self.right = raw_right;
    }

    /// Snapshots the latest encoder positions as the local reference.
    pub fn reset(&mut self) {
        self.reference_left = self.left;
        self.reference_right = self.right;
    }

    /// Mean of both wheels' travel magnitude since the last reset (m), always `>= 0`.
    pub fn local_distance(&self) -> f64 {
        let (dl, dr) = self.local_wheel_angles();
        self.drive.arc_length((fabs(dl) + fabs(dr)) / 2.0)
    }

    /// Signed mean wheel travel since the last reset (m); negative when reversing.
    pub fn signed_local_distance(&self) -> f64 {
        let (dl, dr) = self.local_wheel_angles();
        self.drive.wheel_radius() * (dl + dr) / 2.0
    }

    /// Heading change since the last reset estimated from the wheel
    /// differential (rad), counter-clockwise positive.
    pub fn local_rotation(&self) -> f64 {
        let (dl, dr) = self.local_wheel_angles();
        (self.drive.wheel_radius() / self.drive.track_width()) * (dr - dl)
    }

    /// Signed distance travelled since construction (m).
    pub fn cumulative_distance(&self) -> f64 {
        self.cumulative
    }

    /// Unsigned distance travelled since construction (m).
    pub fn path_length(&self) -> f64 {
        self.path_length
    }

    /// The drive description used for conversions.
    pub fn drive(&self) -> &DifferentialDrive {
        &self.drive
    }

    fn local_wheel_angles(&self) -> (f64, f64) {
        (self.left - self.reference_left, self.right - self.reference_right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f64 = 1e-9;

    fn tracker() -> OdometryTracker {
        // r = 0.05 m so one radian of wheel rotation is 5 cm.
        OdometryTracker::new(DifferentialDrive::new(0.05, 0.2).unwrap(), 10.0, -3.0)
    }

    #[test]
    fn test_starts_at_zero() {
        let odometry = tracker();
        assert_eq!(odometry.local_distance(), 0.0);
        assert_eq!(odometry.cumulative_distance(), 0.0);
    }

    #[test]
    fn test_local_distance_since_reset() {
        let mut odometry = tracker();
        odometry.update(12.0, -1.0);
        assert!((odometry.local_distance() - 0.1).abs() < EPSILON);

        odometry.reset();
        assert_eq!(odometry.local_distance(), 0.0);

        odometry.update(14.0, 1.0);
        assert!((odometry.local_distance() - 0.1).abs() < EPSILON);
        assert!((odometry.cumulative_distance() - 0.2).abs() < EPSILON);
    }

    #[test]
    fn test_local_distance_is_magnitude_while_reversing() {
        let mut odometry = tracker();
        odometry.update(8.0, -5.0);
        assert!((odometry.local_distance() - 0.1).abs() < EPSILON);
        assert!((odometry.signed_local_distance() + 0.1).abs() < EPSILON);
        assert!((odometry.cumulative_distance() + 0.1).abs() < EPSILON);
        assert!((odometry.path_length() - 0.1).abs() < EPSILON);
    }

    #[test]
    fn test_cumulative_uses_previous_tick_not_reset() {
        let mut odometry = tracker();
        odometry.update(11.0, -2.0);
        odometry.reset();
        odometry.update(12.0, -1.0);
        odometry.reset();
        odometry.update(11.0, -2.0);
        // +0.05, +0.05, -0.05
        assert!((odometry.cumulative_distance() - 0.05).abs() < EPSILON);
        assert!((odometry.path_length() - 0.15).abs() < EPSILON);
    }

    #[test]
    fn test_pivot_counts_as_local_distance_but_not_cumulative() {
        let mut odometry = tracker();
        odometry.update(9.0, -2.0);
        assert!((odometry.local_distance() - 0.05).abs() < EPSILON);
        assert!(odometry.cumulative_distance().abs() < EPSILON);
        // (0.05 / 0.2) * (1 - (-1)) = 0.5 rad counter-clockwise
        assert!((odometry.local_rotation() - 0.5).abs() < EPSILON);
    }

    proptest! {
        #[test]
        fn local_distance_is_never_negative(
            steps in prop::collection::vec((-3.0..3.0f64, -3.0..3.0f64), 1..40),
            reset_at in 0usize..40,
        ) {
            let mut odometry = tracker();
            let (mut left, mut right) = (10.0, -3.0);
            for (i, (dl, dr)) in steps.iter().enumerate() {
                left += dl;
                right += dr;
                odometry.update(left, right);
                if i == reset_at {
                    odometry.reset();
                }
                prop_assert!(odometry.local_distance() >= 0.0);
                prop_assert!(odometry.path_length() + EPSILON >= odometry.cumulative_distance().abs());
            }
        }
    }
}
