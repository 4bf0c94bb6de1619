//! Range-sensor normalization and the per-tick sensor snapshot.

/// Range reported for a sensor that saw nothing (m).
pub const DEFAULT_CLEAR_RANGE: f64 = 5.0;

/// Returns `raw` when it is a positive range, otherwise `default`.
///
/// Disabled or saturated ultrasonic sensors read zero (or garbage); those
/// readings are treated as "nothing there" rather than as an obstacle at
/// zero distance.
pub fn clamp_range(raw: f64, default: f64) -> f64 {
    if raw > 0.0 { raw } else { default }
}

/// Which flank of the robot faces the obstacle being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Obstacle on the right; turns toward it are counter-clockwise.
    Right,
    /// Obstacle on the left; turns toward it are clockwise.
    Left,
}

impl Side {
    /// `+1.0` for [`Side::Right`], `-1.0` for [`Side::Left`].
    pub fn sign(self) -> f64 {
        match self {
            Side::Right => 1.0,
            Side::Left => -1.0,
        }
    }

    /// The opposite flank.
    pub fn flipped(self) -> Side {
        match self {
            Side::Right => Side::Left,
            Side::Left => Side::Right,
        }
    }
}

/// Ultrasonic distances around the robot (m).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UltrasonicRanges {
    /// Straight ahead.
    pub front: f64,
    /// Ahead, angled to the left.
    pub front_left: f64,
    /// Ahead, angled to the right.
    pub front_right: f64,
    /// Facing left.
    pub left: f64,
    /// Facing right.
    pub right: f64,
}

impl UltrasonicRanges {
    /// Applies [`clamp_range`] to every reading.
    pub fn clamped(self, default: f64) -> Self {
        UltrasonicRanges {
            front: clamp_range(self.front, default),
            front_left: clamp_range(self.front_left, default),
            front_right: clamp_range(self.front_right, default),
            left: clamp_range(self.left, default),
            right: clamp_range(self.right, default),
        }
    }

    /// The side-facing reading for `side`.
    pub fn side(&self, side: Side) -> f64 {
        match side {
            Side::Right => self.right,
            Side::Left => self.left,
        }
    }

    /// Smallest of the three front-facing readings.
    pub fn nearest_ahead(&self) -> f64 {
        self.front.min(self.front_left).min(self.front_right)
    }
}

/// Everything the host reports for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorSnapshot {
    /// Host time (s), monotonically increasing.
    pub time: f64,
    /// Left wheel encoder position (rad, cumulative, signed).
    pub left_encoder: f64,
    /// Right wheel encoder position (rad, cumulative, signed).
    pub right_encoder: f64,
    /// Angular rate about the vertical axis (rad/s).
    pub gyro_z: f64,
    /// Front obstacle reading; smaller means closer.
    pub front_infrared: f64,
    /// Raw ultrasonic readings, possibly non-positive.
    pub ultrasonic: UltrasonicRanges,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clamp_range_substitutes_default() {
        assert_eq!(clamp_range(0.0, DEFAULT_CLEAR_RANGE), DEFAULT_CLEAR_RANGE);
        assert_eq!(clamp_range(-1.0, DEFAULT_CLEAR_RANGE), DEFAULT_CLEAR_RANGE);
        assert_eq!(clamp_range(f64::NAN, 2.5), 2.5);
        assert_eq!(clamp_range(0.37, DEFAULT_CLEAR_RANGE), 0.37);
    }

    #[test]
    fn test_clamped_ranges_and_side_lookup() {
        let raw = UltrasonicRanges {
            front: 0.0,
            front_left: 0.3,
            front_right: -2.0,
            left: 0.8,
            right: 0.0,
        };
        let ranges = raw.clamped(5.0);
        assert_eq!(ranges.front, 5.0);
        assert_eq!(ranges.front_right, 5.0);
        assert_eq!(ranges.side(Side::Left), 0.8);
        assert_eq!(ranges.side(Side::Right), 5.0);
        assert_eq!(ranges.nearest_ahead(), 0.3);
    }

    #[test]
    fn test_side_flip_and_sign() {
        assert_eq!(Side::Right.sign(), 1.0);
        assert_eq!(Side::Right.flipped(), Side::Left);
        assert_eq!(Side::Left.flipped().flipped(), Side::Left);
    }

    proptest! {
        #[test]
        fn positive_readings_pass_through(raw in 1e-9..100.0f64, default in 0.1..10.0f64) {
            prop_assert_eq!(clamp_range(raw, default), raw);
        }

        #[test]
        fn non_positive_readings_become_default(raw in -100.0..=0.0f64, default in 0.1..10.0f64) {
            prop_assert_eq!(clamp_range(raw, default), default);
        }
    }
}
