//! Range sensor mounts.

use core::f64::consts::FRAC_PI_2;

use tern_kinematics::Pose;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::world::World;

/// A single-beam range sensor fixed to the chassis.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSensor {
    /// Mount offset ahead of the wheel axle center (m).
    pub forward: f64,
    /// Mount offset to the left of the center line (m).
    pub left: f64,
    /// Beam direction relative to the chassis heading (rad, CCW positive).
    pub angle: f64,
    /// Farthest distance the sensor reports (m).
    pub max_range: f64,
}

impl RangeSensor {
    /// A sensor mount.
    pub const fn new(forward: f64, left: f64, angle: f64, max_range: f64) -> Self {
        RangeSensor {
            forward,
            left,
            angle,
            max_range,
        }
    }

    /// Distance to the first obstacle along the beam, if any is in range.
    pub fn measure(&self, world: &World, pose: &Pose) -> Option<f64> {
        let (x, y) = pose.offset(self.forward, self.left);
        world.raycast(x, y, pose.theta + self.angle, self.max_range)
    }
}

/// Where every sensor sits on the chassis.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorLayout {
    /// Front infrared distance sensor; reports its max range when clear.
    pub front_infrared: RangeSensor,
    /// Forward ultrasonic.
    pub front: RangeSensor,
    /// Forward-left ultrasonic.
    pub front_left: RangeSensor,
    /// Forward-right ultrasonic.
    pub front_right: RangeSensor,
    /// Left-facing ultrasonic.
    pub left: RangeSensor,
    /// Right-facing ultrasonic.
    pub right: RangeSensor,
}

impl Default for SensorLayout {
    fn default() -> Self {
        SensorLayout {
            front_infrared: RangeSensor::new(0.04, 0.0, 0.0, 1.0),
            front: RangeSensor::new(0.04, 0.0, 0.0, 2.0),
            front_left: RangeSensor::new(0.035, 0.02, 0.5, 2.0),
            front_right: RangeSensor::new(0.035, -0.02, -0.5, 2.0),
            left: RangeSensor::new(0.03, 0.03, FRAC_PI_2, 2.0),
            right: RangeSensor::new(0.03, -0.03, -FRAC_PI_2, 2.0),
        }
    }
}
