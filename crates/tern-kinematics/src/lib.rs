#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` library for differential-drive kinematics and dead reckoning."]
#![doc = ""]
#![doc = "This crate provides the robot's physical constants, forward and inverse kinematics,"]
#![doc = "pose integration, wheel-encoder odometry and gyro heading integration."]

use core::f64::consts::PI;
use core::fmt;
use libm::{cos, sin};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod error;
pub mod heading;
pub mod odometry;

pub use error::KinematicsError;
pub use heading::HeadingIntegrator;
pub use odometry::OdometryTracker;

/// A 2‑D pose `(x, y, θ)` in meters and radians (θ measured counter‑clockwise
/// from the x‑axis in the world frame).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// World‑frame x position (m).
    pub x: f64,
    /// World‑frame y position (m).
    pub y: f64,
    /// Heading (rad), normalized to `[-PI, PI)`.
    pub theta: f64,
}

impl Pose {
    /// Construct a new pose.
    pub const fn new(x: f64, y: f64, theta: f64) -> Self {
        Pose { x, y, theta }
    }

    /// Normalize an angle to be within `[-PI, PI)`.
    ///
    /// Angles at `PI` will be normalized to `-PI`.
    pub fn normalize_angle(angle: f64) -> f64 {
        let a = angle % (2.0 * PI);
        if a >= PI {
            a - 2.0 * PI
        } else if a < -PI {
            a + 2.0 * PI
        } else {
            a
        }
    }

    /// Returns the point `forward` meters ahead and `left` meters to the left of this pose.
    pub fn offset(&self, forward: f64, left: f64) -> (f64, f64) {
        let (s, c) = (sin(self.theta), cos(self.theta));
        (
            self.x + forward * c - left * s,
            self.y + forward * s + left * c,
        )
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x: {:.2}, y: {:.2}, θ: {:.2} rad)", self.x, self.y, self.theta)
    }
}

/// A twist expressed in the robot base frame: the linear and angular
/// velocity of the chassis.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Twist {
    /// Linear speed of the chassis center along its heading (m/s).
    pub linear: f64,
    /// Angular speed around the vertical axis (rad/s), counter-clockwise positive.
    pub angular: f64,
}

impl Twist {
    /// Construct a new twist.
    pub const fn new(linear: f64, angular: f64) -> Self {
        Twist { linear, angular }
    }
}

impl fmt::Display for Twist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(v: {:.2} m/s, ω: {:.2} rad/s)", self.linear, self.angular)
    }
}

/// Left and right wheel angular velocities.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelSpeeds {
    /// Left wheel angular velocity (rad/s).
    pub left: f64,
    /// Right wheel angular velocity (rad/s).
    pub right: f64,
}

impl WheelSpeeds {
    /// Both wheels at rest.
    pub const ZERO: WheelSpeeds = WheelSpeeds::new(0.0, 0.0);

    /// Construct wheel speeds.
    pub const fn new(left: f64, right: f64) -> Self {
        WheelSpeeds { left, right }
    }

    /// Both wheels turning at the same speed.
    pub const fn uniform(speed: f64) -> Self {
        WheelSpeeds::new(speed, speed)
    }

    /// Wheels turning in opposite directions. A positive `speed` spins the
    /// robot counter-clockwise (left wheel backwards, right wheel forwards).
    pub const fn spin(speed: f64) -> Self {
        WheelSpeeds::new(-speed, speed)
    }

    /// Limits each wheel to `[-max, max]`.
    pub fn clamped(self, max: f64) -> Self {
        WheelSpeeds::new(self.left.clamp(-max, max), self.right.clamp(-max, max))
    }

    /// True when both wheels are commanded to rest.
    pub fn is_stopped(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }
}

impl fmt::Display for WheelSpeeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(ωL: {:.2} rad/s, ωR: {:.2} rad/s)", self.left, self.right)
    }
}

/// Physical constants of a differential-drive base.
///
/// Holds the wheel radius and the track width (distance between the two
/// wheel contact points) and converts between wheel and chassis velocities.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferentialDrive {
    /// Wheel radius (m).
    wheel_radius: f64,
    /// Track width (m).
    track_width: f64,
}

impl DifferentialDrive {
    /// Construct a new differential‑drive description.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidWheelRadius)` if `wheel_radius` is not positive.
    /// Returns `Err(KinematicsError::InvalidTrackWidth)` if `track_width` is not positive.
    pub const fn new(wheel_radius: f64, track_width: f64) -> Result<Self, KinematicsError> {
        if !(wheel_radius > 0.0) {
            return Err(KinematicsError::InvalidWheelRadius("must be positive"));
        }
        if !(track_width > 0.0) {
            return Err(KinematicsError::InvalidTrackWidth("must be positive"));
        }
        Ok(DifferentialDrive {
            wheel_radius,
            track_width,
        })
    }

    /// Returns the wheel radius.
    pub fn wheel_radius(&self) -> f64 {
        self.wheel_radius
    }

    /// Returns the track width.
    pub fn track_width(&self) -> f64 {
        self.track_width
    }

    /// Returns the wheel circumference, `2πr`.
    pub fn wheel_circumference(&self) -> f64 {
        2.0 * PI * self.wheel_radius
    }

    /// Linear distance covered by a wheel rotating through `radians`.
    pub fn arc_length(&self, radians: f64) -> f64 {
        radians / (2.0 * PI) * self.wheel_circumference()
    }

    /// Calculates the chassis twist produced by the given wheel speeds
    /// (forward kinematics).
    pub fn forward_kinematics(&self, wheel_speeds: WheelSpeeds) -> Twist {
        let v_l = wheel_speeds.left * self.wheel_radius;
        let v_r = wheel_speeds.right * self.wheel_radius;

        Twist::new((v_r + v_l) / 2.0, (v_r - v_l) / self.track_width)
    }

    /// Calculates the wheel speeds required to achieve the given twist
    /// (inverse kinematics).
    ///
    /// `v_r = v + (L/2)·ω`, `v_l = v - (L/2)·ω`, each divided by the wheel radius.
    pub fn inverse_kinematics(&self, twist: Twist) -> WheelSpeeds {
        let half_track = self.track_width / 2.0;
        let v_r = twist.linear + half_track * twist.angular;
        let v_l = twist.linear - half_track * twist.angular;

        WheelSpeeds::new(v_l / self.wheel_radius, v_r / self.wheel_radius)
    }

    /// Integrates a constant twist over `dt` seconds starting from `current_pose`.
    /// The resulting heading is normalized to `[-PI, PI)`.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::NegativeTimeDelta)` if `dt` is negative.
    pub fn update_pose(
        &self,
        current_pose: Pose,
        twist: Twist,
        dt: f64,
    ) -> Result<Pose, KinematicsError> {
        if dt < 0.0 {
            return Err(KinematicsError::NegativeTimeDelta("must be non-negative"));
        }

        // Midpoint heading keeps arcs on the circle for coarse time steps.
        let delta_theta = twist.angular * dt;
        let mid_theta = current_pose.theta + delta_theta / 2.0;

        Ok(Pose {
            x: current_pose.x + twist.linear * cos(mid_theta) * dt,
            y: current_pose.y + twist.linear * sin(mid_theta) * dt,
            theta: Pose::normalize_angle(current_pose.theta + delta_theta),
        })
    }

    /// Convenience wrapper: [`forward_kinematics`](Self::forward_kinematics)
    /// followed by [`update_pose`](Self::update_pose).
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::NegativeTimeDelta)` if `dt` is negative.
    pub fn update_pose_from_wheel_speeds(
        &self,
        current_pose: Pose,
        wheel_speeds: WheelSpeeds,
        dt: f64,
    ) -> Result<Pose, KinematicsError> {
        self.update_pose(current_pose, self.forward_kinematics(wheel_speeds), dt)
    }
}

impl fmt::Display for DifferentialDrive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DifferentialDrive (r: {:.3} m, L: {:.4} m)",
            self.wheel_radius, self.track_width
        )
    }
}
