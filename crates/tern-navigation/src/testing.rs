//! Test doubles shared by the unit tests of this crate.

use tern_kinematics::{DifferentialDrive, Pose, WheelSpeeds};

use crate::actuator::MotorInterface;
use crate::driver::RobotHost;
use crate::perception::{SensorSnapshot, UltrasonicRanges};

/// Wheel radius 0.021 m, track width 0.1054 m.
pub(crate) fn drive() -> DifferentialDrive {
    DifferentialDrive::new(0.021, 0.1054).unwrap()
}

type SensorModel = Box<dyn Fn(&Pose) -> (f64, UltrasonicRanges)>;

/// A host whose wheels follow the command exactly, with no slip or noise.
pub(crate) struct IdealPlant {
    drive: DifferentialDrive,
    dt: f64,
    time: f64,
    left: f64,
    right: f64,
    gyro: f64,
    command: WheelSpeeds,
    pose: Pose,
    steps: u64,
    step_limit: Option<u64>,
    sensors: Option<SensorModel>,
}

impl IdealPlant {
    pub(crate) fn new(dt: f64) -> Self {
        IdealPlant {
            drive: drive(),
            dt,
            time: 0.0,
            left: 0.0,
            right: 0.0,
            gyro: 0.0,
            command: WheelSpeeds::ZERO,
            pose: Pose::default(),
            steps: 0,
            step_limit: None,
            sensors: None,
        }
    }

    /// `step` returns false after `limit` successful steps.
    pub(crate) fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    /// Front reading and ultrasonic ranges as a function of the true pose.
    pub(crate) fn with_sensors(mut self, model: impl Fn(&Pose) -> (f64, UltrasonicRanges) + 'static) -> Self {
        self.sensors = Some(Box::new(model));
        self
    }

    pub(crate) fn pose(&self) -> Pose {
        self.pose
    }

    pub(crate) fn steps(&self) -> u64 {
        self.steps
    }

    pub(crate) fn last_command(&self) -> WheelSpeeds {
        self.command
    }
}

impl MotorInterface for IdealPlant {
    fn set_wheel_velocities(&mut self, speeds: WheelSpeeds) {
        self.command = speeds;
    }
}

impl RobotHost for IdealPlant {
    fn step(&mut self) -> bool {
        if self.step_limit.is_some_and(|limit| self.steps >= limit) {
            return false;
        }
        self.steps += 1;
        self.time += self.dt;
        self.left += self.command.left * self.dt;
        self.right += self.command.right * self.dt;
        self.gyro = self.drive.forward_kinematics(self.command).angular;
        self.pose = self
            .drive
            .update_pose_from_wheel_speeds(self.pose, self.command, self.dt)
            .unwrap();
        true
    }

    fn read(&self) -> SensorSnapshot {
        let (front_infrared, ultrasonic) = match &self.sensors {
            Some(model) => model(&self.pose),
            None => (f64::INFINITY, UltrasonicRanges::default()),
        };
        SensorSnapshot {
            time: self.time,
            left_encoder: self.left,
            right_encoder: self.right,
            gyro_z: self.gyro,
            front_infrared,
            ultrasonic,
        }
    }
}
