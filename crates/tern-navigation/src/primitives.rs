//! Dead-reckoning motion primitives.
//!
//! Each primitive is a [`Behavior`] that starts on its first tick (resetting
//! local odometry and commanding the wheels), polls its progress predicate on
//! every later tick, and once the target is met stops the wheels and spends
//! one more tick settling before reporting [`Progress::Done`].

use core::fmt;

use tracing::debug;

use crate::actuator::DriveActuator;
use crate::driver::{Behavior, Frame, Progress};
use crate::params::Rotation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    Active,
    Settling,
    Finished,
}

impl Phase {
    /// Shared tail of every primitive once it is running.
    fn finish_when(&mut self, reached: bool, actuator: &mut DriveActuator) -> Progress {
        match *self {
            Phase::Pending => Progress::InProgress,
            Phase::Active if reached => {
                actuator.stop();
                *self = Phase::Settling;
                Progress::InProgress
            }
            Phase::Active => Progress::InProgress,
            Phase::Settling => {
                *self = Phase::Finished;
                Progress::Done
            }
            Phase::Finished => Progress::Done,
        }
    }
}

fn direction(value: f64) -> f64 {
    if value < 0.0 { -1.0 } else { 1.0 }
}

/// Drive straight until the wheels have covered `|distance|`; negative
/// distances reverse.
#[derive(Debug, Clone, PartialEq)]
pub struct GoStraight {
    distance: f64,
    speed: f64,
    phase: Phase,
}

impl GoStraight {
    /// `speed` is the wheel angular speed (rad/s).
    pub fn new(distance: f64, speed: f64) -> Self {
        GoStraight {
            distance,
            speed: speed.abs(),
            phase: Phase::Pending,
        }
    }
}

impl Behavior for GoStraight {
    fn name(&self) -> &str {
        "go-straight"
    }

    fn tick(&mut self, frame: &mut Frame<'_>) -> Progress {
        if self.phase == Phase::Pending {
            frame.odometry.reset();
            let speed = direction(self.distance) * self.speed;
            frame.actuator.set_wheel_speeds(speed, speed);
            self.phase = Phase::Active;
            debug!(distance = self.distance, "Driving straight");
            return Progress::InProgress;
        }
        let reached = frame.odometry.local_distance() >= self.distance.abs();
        self.phase.finish_when(reached, frame.actuator)
    }
}

/// Spin in place by `angle` radians, counter-clockwise positive.
///
/// Progress is measured from the wheel differential, not the gyro.
#[derive(Debug, Clone, PartialEq)]
pub struct RotateInPlace {
    angle: f64,
    speed: f64,
    phase: Phase,
}

impl RotateInPlace {
    /// `speed` is the wheel angular speed (rad/s).
    pub fn new(angle: f64, speed: f64) -> Self {
        RotateInPlace {
            angle,
            speed: speed.abs(),
            phase: Phase::Pending,
        }
    }
}

impl Behavior for RotateInPlace {
    fn name(&self) -> &str {
        "rotate-in-place"
    }

    fn tick(&mut self, frame: &mut Frame<'_>) -> Progress {
        if self.phase == Phase::Pending {
            frame.odometry.reset();
            let speed = direction(self.angle) * self.speed;
            frame.actuator.set_wheel_speeds(-speed, speed);
            self.phase = Phase::Active;
            debug!(angle = self.angle, "Rotating in place");
            return Progress::InProgress;
        }
        let reached = frame.odometry.local_rotation().abs() >= self.angle.abs();
        self.phase.finish_when(reached, frame.actuator)
    }
}

/// Follow a circular arc of `radius` through `angle` radians at a constant
/// chassis speed.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowArc {
    radius: f64,
    angle: f64,
    direction: Rotation,
    linear_speed: f64,
    phase: Phase,
}

impl FollowArc {
    /// `linear_speed` is the chassis speed along the arc (m/s).
    pub fn new(radius: f64, angle: f64, direction: Rotation, linear_speed: f64) -> Self {
        FollowArc {
            radius,
            angle,
            direction,
            linear_speed,
            phase: Phase::Pending,
        }
    }

    /// Arc length the chassis center must cover (m).
    pub fn arc_length(&self) -> f64 {
        self.angle.abs() * self.radius
    }
}

impl Behavior for FollowArc {
    fn name(&self) -> &str {
        "follow-arc"
    }

    fn tick(&mut self, frame: &mut Frame<'_>) -> Progress {
        if self.phase == Phase::Pending {
            frame.odometry.reset();
            let omega = self.direction.sign() * self.linear_speed / self.radius;
            frame.actuator.set_velocity_twist(self.linear_speed, omega);
            self.phase = Phase::Active;
            debug!(radius = self.radius, angle = self.angle, "Following arc");
            return Progress::InProgress;
        }
        let reached = frame.odometry.signed_local_distance().abs() >= self.arc_length();
        self.phase.finish_when(reached, frame.actuator)
    }
}

/// Hold still for a number of seconds of host time.
#[derive(Debug, Clone, PartialEq)]
pub struct Pause {
    duration: f64,
    started_at: f64,
    phase: Phase,
}

impl Pause {
    /// Pause for `duration` seconds.
    pub fn new(duration: f64) -> Self {
        Pause {
            duration,
            started_at: 0.0,
            phase: Phase::Pending,
        }
    }
}

impl Behavior for Pause {
    fn name(&self) -> &str {
        "pause"
    }

    fn tick(&mut self, frame: &mut Frame<'_>) -> Progress {
        if self.phase == Phase::Pending {
            frame.actuator.stop();
            self.started_at = frame.time;
            self.phase = Phase::Active;
            return Progress::InProgress;
        }
        let reached = frame.time - self.started_at >= self.duration;
        self.phase.finish_when(reached, frame.actuator)
    }
}

/// Any one primitive, so scripts can queue them by value.
#[derive(Debug, Clone, PartialEq)]
pub enum Motion {
    /// See [`GoStraight`].
    Straight(GoStraight),
    /// See [`RotateInPlace`].
    Rotate(RotateInPlace),
    /// See [`FollowArc`].
    Arc(FollowArc),
    /// See [`Pause`].
    Pause(Pause),
}

impl Motion {
    /// Drive `distance` meters at wheel speed `speed`.
    pub fn straight(distance: f64, speed: f64) -> Self {
        Motion::Straight(GoStraight::new(distance, speed))
    }

    /// Spin by `angle` radians at wheel speed `speed`.
    pub fn rotate(angle: f64, speed: f64) -> Self {
        Motion::Rotate(RotateInPlace::new(angle, speed))
    }

    /// Follow an arc.
    pub fn arc(radius: f64, angle: f64, direction: Rotation, linear_speed: f64) -> Self {
        Motion::Arc(FollowArc::new(radius, angle, direction, linear_speed))
    }

    /// Hold still for `duration` seconds.
    pub fn pause(duration: f64) -> Self {
        Motion::Pause(Pause::new(duration))
    }

    fn inner(&mut self) -> &mut dyn Behavior {
        match self {
            Motion::Straight(m) => m,
            Motion::Rotate(m) => m,
            Motion::Arc(m) => m,
            Motion::Pause(m) => m,
        }
    }
}

impl Behavior for Motion {
    fn name(&self) -> &str {
        match self {
            Motion::Straight(m) => m.name(),
            Motion::Rotate(m) => m.name(),
            Motion::Arc(m) => m.name(),
            Motion::Pause(m) => m.name(),
        }
    }

    fn tick(&mut self, frame: &mut Frame<'_>) -> Progress {
        self.inner().tick(frame)
    }
}

impl fmt::Display for Motion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Motion::Straight(m) => write!(f, "straight {:.2} m", m.distance),
            Motion::Rotate(m) => write!(f, "rotate {:.3} rad", m.angle),
            Motion::Arc(m) => write!(f, "arc r={:.2} m through {:.3} rad", m.radius, m.angle),
            Motion::Pause(m) => write!(f, "pause {:.2} s", m.duration),
        }
    }
}
