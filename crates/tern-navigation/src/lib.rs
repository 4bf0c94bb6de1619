#![warn(missing_docs)]
#![doc = "Tick-driven navigation for a two-wheeled differential-drive robot."]
#![doc = ""]
#![doc = "A [`Driver`] steps a [`RobotHost`] once per tick, updates wheel odometry and"]
#![doc = "gyro heading, and runs one [`Behavior`]: a scripted sequence of motion"]
#![doc = "primitives, a figure eight with obstacle avoidance, or the obstacle"]
#![doc = "perimeter-measurement run in [`exploration`]."]

pub mod actuator;
pub mod driver;
pub mod error;
pub mod exploration;
pub mod figure_eight;
pub mod params;
pub mod perception;
pub mod primitives;
pub mod script;

#[cfg(test)]
mod testing;

pub use actuator::{DriveActuator, MotorInterface};
pub use driver::{Behavior, Driver, Frame, Progress, RobotHost, RunOutcome, RunSummary, TickOutcome};
pub use error::NavigationError;
pub use exploration::{Exploration, ExplorationContext, ExplorationInput, ExplorationState};
pub use figure_eight::FigureEight;
pub use params::{
    ArcParams, ArcSegment, ExplorationParams, FigureEightParams, FinalApproachReference,
    PerceptionParams, Rotation, ShapeParams,
};
pub use perception::{SensorSnapshot, Side, UltrasonicRanges, clamp_range};
pub use primitives::Motion;
pub use script::Script;
