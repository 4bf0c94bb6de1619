//! Tunables for every behavior in this crate.
//!
//! Defaults carry the reference values for a small two-wheeled robot with
//! 21 mm wheels. Every struct can be deserialized (behind the `serde`
//! feature) with missing fields falling back to those defaults.

use core::f64::consts::{PI, TAU};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::NavigationError;
use crate::perception::DEFAULT_CLEAR_RANGE;

/// Direction of a rotation or arc, seen from above.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    /// Positive heading change.
    #[default]
    CounterClockwise,
    /// Negative heading change.
    Clockwise,
}

impl Rotation {
    /// `+1.0` for counter-clockwise, `-1.0` for clockwise.
    pub fn sign(self) -> f64 {
        match self {
            Rotation::CounterClockwise => 1.0,
            Rotation::Clockwise => -1.0,
        }
    }
}

/// Which quantity the final straight segment of an exploration run is measured with.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinalApproachReference {
    /// Cumulative odometry since the run began.
    #[default]
    Cumulative,
    /// Local odometry since the last obstacle was cleared.
    Segment,
}

/// Perception tunables shared by every behavior.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerceptionParams {
    /// Range substituted for non-positive ultrasonic readings (m).
    pub clear_range: f64,
}

impl Default for PerceptionParams {
    fn default() -> Self {
        PerceptionParams {
            clear_range: DEFAULT_CLEAR_RANGE,
        }
    }
}

impl PerceptionParams {
    /// Checks that the clear range is usable.
    pub fn validate(&self) -> Result<(), NavigationError> {
        positive(self.clear_range, NavigationError::InvalidThreshold("clear range must be positive"))
    }
}

/// Tunables for the obstacle perimeter-measurement run.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplorationParams {
    /// Wheel speed while driving straight (rad/s).
    pub cruise_speed: f64,
    /// Wheel speed while turning in place (rad/s).
    pub turn_speed: f64,
    /// A front reading below this value means an obstacle is ahead.
    pub obstacle_stop_threshold: f64,
    /// A side range below this value (m) means the obstacle flank is alongside.
    pub side_detection_threshold: f64,
    /// Extra travel past a detected edge before it counts as cleared (m).
    pub clearance_offset: f64,
    /// Heading error accepted as "turn complete" (rad).
    pub heading_tolerance: f64,
    /// Obstacles to measure before the final approach.
    pub obstacle_count: u32,
    /// Length of the final straight segment (m).
    pub final_distance: f64,
    /// What `final_distance` is compared against.
    pub final_approach_reference: FinalApproachReference,
}

impl Default for ExplorationParams {
    fn default() -> Self {
        ExplorationParams {
            cruise_speed: 4.0,
            turn_speed: 2.0,
            obstacle_stop_threshold: 0.05,
            side_detection_threshold: 0.4,
            clearance_offset: 0.10,
            heading_tolerance: 0.04,
            obstacle_count: 4,
            final_distance: 1.0,
            final_approach_reference: FinalApproachReference::Cumulative,
        }
    }
}

impl ExplorationParams {
    /// Rejects tunables the state machine cannot make progress with.
    pub fn validate(&self) -> Result<(), NavigationError> {
        positive(self.cruise_speed, NavigationError::InvalidSpeed("cruise speed must be positive"))?;
        positive(self.turn_speed, NavigationError::InvalidSpeed("turn speed must be positive"))?;
        positive(
            self.obstacle_stop_threshold,
            NavigationError::InvalidThreshold("obstacle stop threshold must be positive"),
        )?;
        positive(
            self.side_detection_threshold,
            NavigationError::InvalidThreshold("side detection threshold must be positive"),
        )?;
        positive(
            self.clearance_offset,
            NavigationError::InvalidThreshold("clearance offset must be positive"),
        )?;
        positive(
            self.heading_tolerance,
            NavigationError::InvalidTolerance("heading tolerance must be positive"),
        )?;
        if self.heading_tolerance >= PI {
            return Err(NavigationError::InvalidTolerance("heading tolerance must be below π"));
        }
        if self.obstacle_count == 0 {
            return Err(NavigationError::InvalidObstacleCount("must be at least one"));
        }
        if !(self.final_distance >= 0.0) {
            return Err(NavigationError::InvalidThreshold("final distance must not be negative"));
        }
        Ok(())
    }
}

/// Tunables for the polygon drawing mission.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeParams {
    /// Wheel speed on straight edges (rad/s).
    pub straight_speed: f64,
    /// Wheel speed on corners (rad/s).
    pub turn_speed: f64,
    /// Edge length of regular polygons (m).
    pub side_length: f64,
    /// Rectangle edge along the initial heading (m).
    pub rectangle_width: f64,
    /// Rectangle edge across the initial heading (m).
    pub rectangle_height: f64,
    /// Rest between shapes (s).
    pub pause: f64,
    /// Corner direction.
    pub direction: Rotation,
}

impl Default for ShapeParams {
    fn default() -> Self {
        ShapeParams {
            straight_speed: 5.0,
            turn_speed: 3.0,
            side_length: 0.5,
            rectangle_width: 0.6,
            rectangle_height: 0.4,
            pause: 0.5,
            direction: Rotation::CounterClockwise,
        }
    }
}

impl ShapeParams {
    /// Rejects shapes that cannot be drawn.
    pub fn validate(&self) -> Result<(), NavigationError> {
        positive(self.straight_speed, NavigationError::InvalidSpeed("straight speed must be positive"))?;
        positive(self.turn_speed, NavigationError::InvalidSpeed("turn speed must be positive"))?;
        positive(self.side_length, NavigationError::InvalidGeometry("side length must be positive"))?;
        positive(
            self.rectangle_width,
            NavigationError::InvalidGeometry("rectangle width must be positive"),
        )?;
        positive(
            self.rectangle_height,
            NavigationError::InvalidGeometry("rectangle height must be positive"),
        )?;
        if !(self.pause >= 0.0) {
            return Err(NavigationError::InvalidGeometry("pause must not be negative"));
        }
        Ok(())
    }
}

/// One arc of a circle-following mission.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSegment {
    /// Which way the arc bends.
    pub direction: Rotation,
    /// Angle swept around the circle center (rad).
    pub angle: f64,
}

impl ArcSegment {
    /// Construct an arc segment.
    pub const fn new(direction: Rotation, angle: f64) -> Self {
        ArcSegment { direction, angle }
    }
}

/// Tunables for the half-circle figure-eight mission.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct ArcParams {
    /// Chassis speed along the arc (m/s).
    pub linear_speed: f64,
    /// Circle radius (m).
    pub radius: f64,
    /// Arcs driven in order.
    pub segments: Vec<ArcSegment>,
}

impl Default for ArcParams {
    fn default() -> Self {
        ArcParams {
            linear_speed: 0.5,
            radius: 0.3,
            segments: vec![
                ArcSegment::new(Rotation::CounterClockwise, PI),
                ArcSegment::new(Rotation::Clockwise, PI),
                ArcSegment::new(Rotation::Clockwise, PI),
                ArcSegment::new(Rotation::CounterClockwise, PI),
            ],
        }
    }
}

impl ArcParams {
    /// Rejects arcs that cannot be followed.
    pub fn validate(&self) -> Result<(), NavigationError> {
        positive(self.linear_speed, NavigationError::InvalidSpeed("arc speed must be positive"))?;
        positive(self.radius, NavigationError::InvalidGeometry("arc radius must be positive"))?;
        validate_segments(&self.segments)
    }
}

/// Tunables for the full-circle figure eight with obstacle avoidance.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct FigureEightParams {
    /// Chassis speed along the circles (m/s).
    pub linear_speed: f64,
    /// Circle radius (m).
    pub radius: f64,
    /// Arcs driven in order.
    pub segments: Vec<ArcSegment>,
    /// A front-facing range below this value (m) starts an avoidance.
    pub obstacle_stop: f64,
    /// All front-facing ranges above this value (m) end the avoidance turn.
    pub obstacle_clear: f64,
    /// Wheel speed while turning away (rad/s).
    pub avoid_turn_speed: f64,
    /// Chassis speed while stepping past (m/s).
    pub avoid_forward_speed: f64,
    /// Distance stepped past the obstacle (m).
    pub avoid_step: f64,
}

impl Default for FigureEightParams {
    fn default() -> Self {
        FigureEightParams {
            linear_speed: 0.55,
            radius: 1.0,
            segments: vec![
                ArcSegment::new(Rotation::CounterClockwise, TAU),
                ArcSegment::new(Rotation::CounterClockwise, TAU),
            ],
            obstacle_stop: 0.25,
            obstacle_clear: 0.35,
            avoid_turn_speed: 2.5,
            avoid_forward_speed: 0.25,
            avoid_step: 0.25,
        }
    }
}

impl FigureEightParams {
    /// Rejects tunables the avoidance loop cannot settle with.
    pub fn validate(&self) -> Result<(), NavigationError> {
        positive(self.linear_speed, NavigationError::InvalidSpeed("circle speed must be positive"))?;
        positive(self.radius, NavigationError::InvalidGeometry("circle radius must be positive"))?;
        validate_segments(&self.segments)?;
        positive(
            self.obstacle_stop,
            NavigationError::InvalidThreshold("obstacle stop range must be positive"),
        )?;
        if !(self.obstacle_clear >= self.obstacle_stop) {
            return Err(NavigationError::InvalidThreshold(
                "obstacle clear range must not be below the stop range",
            ));
        }
        positive(
            self.avoid_turn_speed,
            NavigationError::InvalidSpeed("avoidance turn speed must be positive"),
        )?;
        positive(
            self.avoid_forward_speed,
            NavigationError::InvalidSpeed("avoidance forward speed must be positive"),
        )?;
        positive(self.avoid_step, NavigationError::InvalidGeometry("avoidance step must be positive"))
    }
}

fn validate_segments(segments: &[ArcSegment]) -> Result<(), NavigationError> {
    if segments.is_empty() {
        return Err(NavigationError::InvalidGeometry("at least one arc segment is required"));
    }
    if segments.iter().any(|s| !s.angle.is_finite()) {
        return Err(NavigationError::InvalidGeometry("arc angles must be finite"));
    }
    Ok(())
}

/// `value > 0.0`, rejecting NaN as well.
fn positive(value: f64, error: NavigationError) -> Result<(), NavigationError> {
    if value > 0.0 { Ok(()) } else { Err(error) }
}
