//! Differential drive actuation.

use tern_kinematics::{DifferentialDrive, Twist, WheelSpeeds};

/// Sink for wheel velocity commands, implemented by the robot host.
pub trait MotorInterface {
    /// Sets both wheel angular velocities (rad/s).
    fn set_wheel_velocities(&mut self, speeds: WheelSpeeds);
}

/// Latches the wheel command chosen during a tick and hands it to the
/// motors when flushed.
///
/// Behaviors may set a command several times in one tick; only the last
/// one is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct DriveActuator {
    drive: DifferentialDrive,
    command: WheelSpeeds,
}

impl DriveActuator {
    /// New actuator with both wheels stopped.
    pub fn new(drive: DifferentialDrive) -> Self {
        DriveActuator {
            drive,
            command: WheelSpeeds::ZERO,
        }
    }

    /// Commands wheel angular speeds directly (rad/s).
    pub fn set_wheel_speeds(&mut self, left: f64, right: f64) {
        self.command = WheelSpeeds::new(left, right);
    }

    /// Commands a prepared wheel speed pair.
    pub fn apply(&mut self, speeds: WheelSpeeds) {
        self.command = speeds;
    }

    /// Commands a chassis twist, converted through inverse kinematics.
    pub fn set_velocity_twist(&mut self, linear: f64, angular: f64) {
        self.command = self.drive.inverse_kinematics(Twist::new(linear, angular));
    }

    /// Stops both wheels. Safe to call any number of times.
    pub fn stop(&mut self) {
        self.command = WheelSpeeds::ZERO;
    }

    /// The command that will be sent on the next flush.
    pub fn command(&self) -> WheelSpeeds {
        self.command
    }

    /// Sends the latched command to the motors.
    pub fn flush<M: MotorInterface + ?Sized>(&self, motors: &mut M) {
        motors.set_wheel_velocities(self.command);
    }
}
