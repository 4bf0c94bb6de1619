//! The simulated robot body.

use tern_kinematics::{DifferentialDrive, Pose, WheelSpeeds};
use tern_navigation::{MotorInterface, RobotHost, SensorSnapshot, UltrasonicRanges};
use tracing::{trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::noise::NoiseGenerator;
use crate::sensors::{RangeSensor, SensorLayout};
use crate::world::World;

/// Simulator tunables.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    /// Seconds advanced per step.
    pub time_step: f64,
    /// `step` refuses to advance past this time (s).
    pub max_time: f64,
    /// Wheel commands are clamped to this magnitude (rad/s).
    pub max_wheel_speed: f64,
    /// Radius used for collision detection (m).
    pub body_radius: f64,
    /// Half-width of the uniform noise added to range readings (m).
    pub range_noise: f64,
    /// Half-width of the uniform noise added to the gyro (rad/s).
    pub gyro_noise: f64,
    /// Noise seed.
    pub seed: u64,
    /// Sensor mounts.
    pub sensors: SensorLayout,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            time_step: 0.032,
            max_time: 300.0,
            max_wheel_speed: 30.0,
            body_radius: 0.037,
            range_noise: 0.0,
            gyro_noise: 0.0,
            seed: 7,
            sensors: SensorLayout::default(),
        }
    }
}

impl SimConfig {
    /// Rejects settings the simulator cannot step with.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.time_step > 0.0) {
            return Err(SimError::InvalidTimeStep("must be positive"));
        }
        if !(self.max_time >= 0.0) {
            return Err(SimError::InvalidTimeStep("max time must not be negative"));
        }
        if !(self.max_wheel_speed > 0.0) {
            return Err(SimError::InvalidLimit("max wheel speed must be positive"));
        }
        if !(self.range_noise >= 0.0 && self.gyro_noise >= 0.0) {
            return Err(SimError::InvalidLimit("noise amplitudes must not be negative"));
        }
        Ok(())
    }
}

/// A differential-drive robot moving through a [`World`].
///
/// Wheels track the last command exactly (after clamping); noise only
/// affects what the sensors report.
#[derive(Debug, Clone)]
pub struct SimulatedRobot {
    drive: DifferentialDrive,
    world: World,
    config: SimConfig,
    noise: NoiseGenerator,
    pose: Pose,
    time: f64,
    steps: u64,
    left_encoder: f64,
    right_encoder: f64,
    angular_rate: f64,
    command: WheelSpeeds,
    collisions: u64,
    snapshot: SensorSnapshot,
}

impl SimulatedRobot {
    /// Places the robot at the origin facing +x.
    pub fn new(drive: DifferentialDrive, world: World, config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let mut robot = SimulatedRobot {
            drive,
            world,
            noise: NoiseGenerator::new(config.seed),
            config,
            pose: Pose::default(),
            time: 0.0,
            steps: 0,
            left_encoder: 0.0,
            right_encoder: 0.0,
            angular_rate: 0.0,
            command: WheelSpeeds::ZERO,
            collisions: 0,
            snapshot: SensorSnapshot::default(),
        };
        robot.snapshot = robot.sense();
        Ok(robot)
    }

    /// Starts from `pose` instead of the origin.
    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self.snapshot = self.sense();
        self
    }

    /// Ground-truth pose.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Simulation time (s).
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Steps taken.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Steps that ended with the body overlapping an obstacle.
    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    /// The last wheel command received, after clamping.
    pub fn command(&self) -> WheelSpeeds {
        self.command
    }

    /// The world being driven through.
    pub fn world(&self) -> &World {
        &self.world
    }

    fn range(&mut self, sensor: RangeSensor, miss: f64) -> f64 {
        match sensor.measure(&self.world, &self.pose) {
            Some(distance) => (distance + self.noise.uniform(self.config.range_noise)).max(0.0),
            None => miss,
        }
    }

    /// Samples every sensor at the current pose.
    fn sense(&mut self) -> SensorSnapshot {
        let layout = self.config.sensors;
        let front_infrared = self.range(layout.front_infrared, layout.front_infrared.max_range);
        let ultrasonic = UltrasonicRanges {
            front: self.range(layout.front, 0.0),
            front_left: self.range(layout.front_left, 0.0),
            front_right: self.range(layout.front_right, 0.0),
            left: self.range(layout.left, 0.0),
            right: self.range(layout.right, 0.0),
        };
        SensorSnapshot {
            time: self.time,
            left_encoder: self.left_encoder,
            right_encoder: self.right_encoder,
            gyro_z: self.angular_rate + self.noise.uniform(self.config.gyro_noise),
            front_infrared,
            ultrasonic,
        }
    }
}

impl MotorInterface for SimulatedRobot {
    fn set_wheel_velocities(&mut self, speeds: WheelSpeeds) {
        self.command = speeds.clamped(self.config.max_wheel_speed);
    }
}

impl RobotHost for SimulatedRobot {
    fn step(&mut self) -> bool {
        let dt = self.config.time_step;
        if self.time + dt > self.config.max_time + 1e-9 {
            return false;
        }

        let twist = self.drive.forward_kinematics(self.command);
        self.pose = match self.drive.update_pose(self.pose, twist, dt) {
            Ok(pose) => pose,
            Err(e) => {
                warn!(error = %e, "Pose integration failed");
                return false;
            }
        };
        self.left_encoder += self.command.left * dt;
        self.right_encoder += self.command.right * dt;
        self.angular_rate = twist.angular;
        self.time += dt;
        self.steps += 1;

        if self.world.collides(self.pose.x, self.pose.y, self.config.body_radius) {
            self.collisions += 1;
            trace!(pose = %self.pose, "Body overlaps an obstacle");
        }
        self.snapshot = self.sense();
        true
    }

    fn read(&self) -> SensorSnapshot {
        self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Obstacle;

    const EPSILON: f64 = 1e-9;

    fn drive() -> DifferentialDrive {
        DifferentialDrive::new(0.021, 0.1054).unwrap()
    }

    fn robot(world: World) -> SimulatedRobot {
        SimulatedRobot::new(drive(), world, SimConfig::default()).unwrap()
    }

    #[test]
    fn test_rejects_bad_time_step() {
        let config = SimConfig {
            time_step: 0.0,
            ..Default::default()
        };
        let result = SimulatedRobot::new(drive(), World::empty(), config);
        assert!(matches!(result, Err(SimError::InvalidTimeStep(_))));
    }

    #[test]
    fn test_encoders_and_pose_follow_command() {
        let mut robot = robot(World::empty());
        robot.set_wheel_velocities(WheelSpeeds::uniform(5.0));
        assert!(robot.step());

        let snapshot = robot.read();
        assert!((snapshot.left_encoder - 5.0 * 0.032).abs() < EPSILON);
        assert!((snapshot.time - 0.032).abs() < EPSILON);
        assert!((robot.pose().x - 5.0 * 0.021 * 0.032).abs() < EPSILON);
        assert_eq!(snapshot.gyro_z, 0.0);
    }

    #[test]
    fn test_wheel_speed_is_clamped() {
        let mut robot = robot(World::empty());
        robot.set_wheel_velocities(WheelSpeeds::new(-40.0, 40.0));
        assert_eq!(robot.command(), WheelSpeeds::new(-30.0, 30.0));
    }

    #[test]
    fn test_step_stops_at_max_time() {
        let config = SimConfig {
            max_time: 0.1,
            ..Default::default()
        };
        let mut robot = SimulatedRobot::new(drive(), World::empty(), config).unwrap();
        let mut steps = 0;
        while robot.step() {
            steps += 1;
        }
        assert_eq!(steps, 3);
        assert!(!robot.step());
    }

    #[test]
    fn test_out_of_range_readings() {
        let robot = robot(World::empty());
        let snapshot = robot.read();
        assert_eq!(snapshot.front_infrared, 1.0);
        assert_eq!(snapshot.ultrasonic, UltrasonicRanges::default());
    }

    #[test]
    fn test_sensors_see_box_ahead() {
        let world = World::new(vec![Obstacle::new(0.5, -0.2, 0.7, 0.2)]);
        let snapshot = robot(world).read();
        assert!((snapshot.front_infrared - 0.46).abs() < EPSILON);
        assert!((snapshot.ultrasonic.front - 0.46).abs() < EPSILON);
        assert_eq!(snapshot.ultrasonic.left, 0.0);
    }

    #[test]
    fn test_collisions_are_counted() {
        let world = World::new(vec![Obstacle::new(0.01, -0.2, 0.3, 0.2)]);
        let mut robot = robot(world);
        assert!(robot.step());
        assert_eq!(robot.collisions(), 1);
    }

    #[test]
    fn test_noise_is_reproducible() {
        let config = SimConfig {
            range_noise: 0.01,
            gyro_noise: 0.05,
            ..Default::default()
        };
        let world = World::new(vec![Obstacle::new(0.5, -0.2, 0.7, 0.2)]);
        let mut a = SimulatedRobot::new(drive(), world.clone(), config).unwrap();
        let mut b = SimulatedRobot::new(drive(), world, config).unwrap();
        for _ in 0..20 {
            a.step();
            b.step();
            assert_eq!(a.read(), b.read());
            assert!((a.read().ultrasonic.front - 0.46).abs() <= 0.01 + EPSILON);
        }
    }
}
