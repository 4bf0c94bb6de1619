#![warn(missing_docs)]
#![doc = "A simulated host for `tern-navigation`."]
#![doc = ""]
#![doc = "[`SimulatedRobot`] integrates commanded wheel speeds into a ground-truth pose,"]
#![doc = "synthesizes encoder and gyro readings, and ray-casts its range sensors against"]
#![doc = "a [`World`] of axis-aligned boxes."]

pub mod error;
pub mod noise;
pub mod robot;
pub mod scenario;
pub mod sensors;
pub mod world;

pub use error::SimError;
pub use robot::{SimConfig, SimulatedRobot};
pub use scenario::Scenario;
pub use sensors::{RangeSensor, SensorLayout};
pub use world::{CourseLayout, Obstacle, World};
