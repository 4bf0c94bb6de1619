//! Obstacle perimeter measurement.
//!
//! The robot drives along its course until something blocks the front
//! sensor, then walks around the obstacle: it turns toward one flank, drives
//! along the near face while the side sensor sees it (depth), turns back
//! parallel to the course and drives along the far face (width), turns again
//! and retreats by the measured depth, and finally turns back onto the
//! original heading. After the configured number of obstacles it drives a
//! final straight segment and stops.
//!
//! [`Exploration::step`] is a pure transition function over
//! [`ExplorationInput`]; the [`Behavior`] impl feeds it from the driver frame
//! and applies the returned [`Directive`].

use core::f64::consts::FRAC_PI_2;
use core::fmt;

use tern_kinematics::WheelSpeeds;
use tracing::{debug, info};

use crate::driver::{Behavior, Frame, Progress};
use crate::params::{ExplorationParams, FinalApproachReference};
use crate::perception::{Side, UltrasonicRanges};

/// Phases of the measurement run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorationState {
    /// Cruise until the front sensor trips.
    AwaitObstacle,
    /// Turn so the obstacle is on the measuring flank.
    TurnToSide,
    /// Drive along the near face, tracking its far edge.
    MeasureDepth,
    /// Turn parallel to the course again.
    TurnAroundFront,
    /// Drive along the side face, tracking its far edge.
    MeasureWidth,
    /// Turn to face back toward the course line.
    TurnAroundBack,
    /// Drive back by the measured depth.
    Retreat,
    /// Turn onto the original heading.
    TurnBackOnCourse,
    /// Drive the closing straight segment.
    FinalApproach,
    /// Stopped for good.
    Complete,
}

impl fmt::Display for ExplorationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExplorationState::AwaitObstacle => "await-obstacle",
            ExplorationState::TurnToSide => "turn-to-side",
            ExplorationState::MeasureDepth => "measure-depth",
            ExplorationState::TurnAroundFront => "turn-around-front",
            ExplorationState::MeasureWidth => "measure-width",
            ExplorationState::TurnAroundBack => "turn-around-back",
            ExplorationState::Retreat => "retreat",
            ExplorationState::TurnBackOnCourse => "turn-back-on-course",
            ExplorationState::FinalApproach => "final-approach",
            ExplorationState::Complete => "complete",
        };
        f.write_str(label)
    }
}

/// Readings the state machine decides on, all taken after this tick's
/// odometry and heading updates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExplorationInput {
    /// Unsigned distance since the last odometry reset (m).
    pub local_distance: f64,
    /// Signed distance since the run began (m).
    pub total_distance: f64,
    /// Unwrapped gyro heading (rad).
    pub heading: f64,
    /// Front obstacle reading.
    pub front: f64,
    /// Clamped ultrasonic ranges; only the side-facing pair is used.
    pub ranges: UltrasonicRanges,
}

/// What to do with the hardware after a step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Directive {
    /// New wheel command, or `None` to keep the previous one.
    pub command: Option<WheelSpeeds>,
    /// Re-baseline local odometry.
    pub reset_odometry: bool,
}

impl Directive {
    fn hold() -> Self {
        Directive::default()
    }

    fn drive(command: WheelSpeeds) -> Self {
        Directive {
            command: Some(command),
            reset_odometry: false,
        }
    }

    fn stop_and_reset() -> Self {
        Directive {
            command: Some(WheelSpeeds::ZERO),
            reset_odometry: true,
        }
    }
}

/// Result of one [`turn_to_target`] evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnStep {
    /// Wheel command for this tick.
    pub command: WheelSpeeds,
    /// Heading is within tolerance; the command is a stop.
    pub reached: bool,
}

/// Spin toward an absolute heading.
///
/// Positive error turns counter-clockwise. Within `tolerance` the wheels
/// stop and the turn reports reached.
pub fn turn_to_target(target: f64, heading: f64, tolerance: f64, turn_speed: f64) -> TurnStep {
    let error = target - heading;
    if error.abs() > tolerance {
        let speed = if error > 0.0 { turn_speed } else { -turn_speed };
        TurnStep {
            command: WheelSpeeds::spin(speed),
            reached: false,
        }
    } else {
        TurnStep {
            command: WheelSpeeds::ZERO,
            reached: true,
        }
    }
}

/// Mutable state of a measurement run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplorationContext {
    state: ExplorationState,
    side: Side,
    target_angle: f64,
    box_depth: f64,
    temporary_width: f64,
    boxes_completed: u32,
    total_distance: f64,
}

impl Default for ExplorationContext {
    fn default() -> Self {
        ExplorationContext {
            state: ExplorationState::AwaitObstacle,
            side: Side::Right,
            target_angle: 0.0,
            box_depth: 0.0,
            temporary_width: 0.0,
            boxes_completed: 0,
            total_distance: 0.0,
        }
    }
}

impl ExplorationContext {
    /// Current phase.
    pub fn state(&self) -> ExplorationState {
        self.state
    }

    /// Flank that faces the next obstacle.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Absolute heading goal of the current or last turn (rad).
    pub fn target_angle(&self) -> f64 {
        self.target_angle
    }

    /// Depth recorded for the current or last obstacle (m).
    pub fn box_depth(&self) -> f64 {
        self.box_depth
    }

    /// Width recorded for the current or last obstacle (m).
    pub fn temporary_width(&self) -> f64 {
        self.temporary_width
    }

    /// Obstacles walked around so far.
    pub fn boxes_completed(&self) -> u32 {
        self.boxes_completed
    }

    /// Cumulative odometry as of the last step (m).
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }
}

/// The measurement run as a behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct Exploration {
    params: ExplorationParams,
    context: ExplorationContext,
}

impl Exploration {
    /// Starts in [`ExplorationState::AwaitObstacle`] with the obstacle
    /// expected on the right flank.
    pub fn new(params: ExplorationParams) -> Self {
        Exploration {
            params,
            context: ExplorationContext::default(),
        }
    }

    /// Tunables in use.
    pub fn params(&self) -> &ExplorationParams {
        &self.params
    }

    /// Run state.
    pub fn context(&self) -> &ExplorationContext {
        &self.context
    }

    /// Advances the machine by one tick.
    pub fn step(&mut self, input: &ExplorationInput) -> Directive {
        let p = &self.params;
        let ctx = &mut self.context;
        ctx.total_distance = input.total_distance;
        let side = ctx.side.sign();
        let cruise = WheelSpeeds::uniform(p.cruise_speed);

        let (next, directive) = match ctx.state {
            ExplorationState::AwaitObstacle => {
                if input.front < p.obstacle_stop_threshold {
                    info!(
                        box_number = ctx.boxes_completed + 1,
                        side = ?ctx.side,
                        front = input.front,
                        "Box detected"
                    );
                    ctx.target_angle = input.heading + side * FRAC_PI_2;
                    let directive = Directive {
                        command: None,
                        reset_odometry: true,
                    };
                    (ExplorationState::TurnToSide, directive)
                } else {
                    (ExplorationState::AwaitObstacle, Directive::drive(cruise))
                }
            }
            ExplorationState::TurnToSide => self.turn(input, ExplorationState::MeasureDepth),
            ExplorationState::MeasureDepth => {
                if input.ranges.side(ctx.side) < p.side_detection_threshold {
                    ctx.box_depth = input.local_distance;
                }
                if input.local_distance > ctx.box_depth + p.clearance_offset {
                    info!(depth = ctx.box_depth, "Depth measured");
                    ctx.target_angle = input.heading - side * FRAC_PI_2;
                    (ExplorationState::TurnAroundFront, Directive::hold())
                } else {
                    (ExplorationState::MeasureDepth, Directive::drive(cruise))
                }
            }
            ExplorationState::TurnAroundFront => {
                let (next, directive) = self.turn(input, ExplorationState::MeasureWidth);
                if next == ExplorationState::MeasureWidth {
                    self.context.temporary_width = 0.0;
                }
                (next, directive)
            }
            ExplorationState::MeasureWidth => {
                if input.ranges.side(ctx.side) < p.side_detection_threshold {
                    ctx.temporary_width = input.local_distance;
                }
                if input.local_distance > ctx.temporary_width + p.clearance_offset {
                    info!(width = ctx.temporary_width, "Width cleared");
                    ctx.target_angle = input.heading - side * FRAC_PI_2;
                    (ExplorationState::TurnAroundBack, Directive::hold())
                } else {
                    (ExplorationState::MeasureWidth, Directive::drive(cruise))
                }
            }
            ExplorationState::TurnAroundBack => self.turn(input, ExplorationState::Retreat),
            ExplorationState::Retreat => {
                if input.local_distance < ctx.box_depth + p.clearance_offset {
                    (ExplorationState::Retreat, Directive::drive(cruise))
                } else {
                    ctx.target_angle = input.heading + side * FRAC_PI_2;
                    (ExplorationState::TurnBackOnCourse, Directive::hold())
                }
            }
            ExplorationState::TurnBackOnCourse => {
                let (next, directive) = self.turn(input, ExplorationState::AwaitObstacle);
                if next == ExplorationState::AwaitObstacle {
                    self.complete_box()
                } else {
                    (next, directive)
                }
            }
            ExplorationState::FinalApproach => {
                let travelled = match p.final_approach_reference {
                    FinalApproachReference::Cumulative => input.total_distance,
                    FinalApproachReference::Segment => input.local_distance,
                };
                if travelled >= p.final_distance {
                    info!(
                        boxes = ctx.boxes_completed,
                        total_distance = input.total_distance,
                        "Mission complete"
                    );
                    (ExplorationState::Complete, Directive::drive(WheelSpeeds::ZERO))
                } else {
                    (ExplorationState::FinalApproach, Directive::drive(cruise))
                }
            }
            ExplorationState::Complete => {
                (ExplorationState::Complete, Directive::drive(WheelSpeeds::ZERO))
            }
        };

        if next != self.context.state {
            debug!(from = %self.context.state, to = %next, "Exploration transition");
            self.context.state = next;
        }
        directive
    }

    /// Shared handling of the four turn states.
    fn turn(&self, input: &ExplorationInput, next: ExplorationState) -> (ExplorationState, Directive) {
        let turn = turn_to_target(
            self.context.target_angle,
            input.heading,
            self.params.heading_tolerance,
            self.params.turn_speed,
        );
        if turn.reached {
            (next, Directive::stop_and_reset())
        } else {
            (self.context.state, Directive::drive(turn.command))
        }
    }

    fn complete_box(&mut self) -> (ExplorationState, Directive) {
        let ctx = &mut self.context;
        ctx.boxes_completed += 1;
        info!(
            box_number = ctx.boxes_completed,
            depth = ctx.box_depth,
            width = ctx.temporary_width,
            "Box completed"
        );
        ctx.side = ctx.side.flipped();
        let next = if ctx.boxes_completed >= self.params.obstacle_count {
            ExplorationState::FinalApproach
        } else {
            ExplorationState::AwaitObstacle
        };
        (next, Directive::stop_and_reset())
    }
}

impl Behavior for Exploration {
    fn name(&self) -> &str {
        "exploration"
    }

    fn tick(&mut self, frame: &mut Frame<'_>) -> Progress {
        if self.context.state == ExplorationState::Complete {
            frame.actuator.stop();
            return Progress::Done;
        }
        let input = ExplorationInput {
            local_distance: frame.odometry.local_distance(),
            total_distance: frame.odometry.cumulative_distance(),
            heading: frame.heading,
            front: frame.front,
            ranges: frame.ranges,
        };
        let directive = self.step(&input);
        if let Some(command) = directive.command {
            frame.actuator.apply(command);
        }
        if directive.reset_odometry {
            frame.odometry.reset();
        }
        // Complete is reported one tick later so the stop is applied first.
        Progress::InProgress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;
    use proptest::prelude::*;

    const FAR: f64 = 5.0;

    fn input(local_distance: f64, heading: f64, front: f64, right_range: f64) -> ExplorationInput {
        ExplorationInput {
            local_distance,
            total_distance: local_distance,
            heading,
            front,
            ranges: UltrasonicRanges {
                left: FAR,
                right: right_range,
                ..Default::default()
            },
        }
    }

    fn in_state(state: ExplorationState) -> Exploration {
        let mut machine = Exploration::new(ExplorationParams::default());
        machine.context.state = state;
        machine
    }

    #[test]
    fn test_cruises_until_front_trips() {
        let mut machine = Exploration::new(ExplorationParams::default());
        let directive = machine.step(&input(0.5, 0.0, 1.0, FAR));
        assert_eq!(directive.command, Some(WheelSpeeds::uniform(4.0)));
        assert_eq!(machine.context().state(), ExplorationState::AwaitObstacle);

        let directive = machine.step(&input(0.6, 0.1, 0.02, FAR));
        assert!(directive.reset_odometry);
        assert_eq!(machine.context().state(), ExplorationState::TurnToSide);
        assert!((machine.context().target_angle() - (0.1 + FRAC_PI_2)).abs() < 1e-12);
    }

    #[test]
    fn test_front_at_threshold_is_not_an_obstacle() {
        let mut machine = Exploration::new(ExplorationParams::default());
        machine.step(&input(0.0, 0.0, 0.05, FAR));
        assert_eq!(machine.context().state(), ExplorationState::AwaitObstacle);
    }

    #[test]
    fn test_depth_trace_exits_after_clearance() {
        let mut machine = in_state(ExplorationState::MeasureDepth);
        let ranges = [0.5, 0.3, 0.3, 0.5, 0.5];
        let distances = [0.1, 0.2, 0.3, 0.4, 0.5];
        let mut exited_at = None;

        for (&d, &r) in distances.iter().zip(&ranges) {
            let directive = machine.step(&input(d, 0.0, 1.0, r));
            if machine.context().state() == ExplorationState::TurnAroundFront {
                assert_eq!(directive.command, None);
                exited_at = Some(d);
                break;
            }
            assert_eq!(directive.command, Some(WheelSpeeds::uniform(4.0)));
        }

        assert_eq!(machine.context().box_depth(), 0.3);
        assert_eq!(exited_at, Some(0.5));
        assert!((machine.context().target_angle() + FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_measures_with_the_active_side_only() {
        let mut machine = in_state(ExplorationState::MeasureDepth);
        machine.context.side = Side::Left;
        let ranges = UltrasonicRanges {
            left: 0.2,
            right: 0.1,
            ..Default::default()
        };
        machine.step(&ExplorationInput {
            local_distance: 0.25,
            ranges,
            ..Default::default()
        });
        assert_eq!(machine.context().box_depth(), 0.25);

        machine.step(&ExplorationInput {
            local_distance: 0.3,
            ranges: UltrasonicRanges { left: FAR, ..ranges },
            ..Default::default()
        });
        assert_eq!(machine.context().box_depth(), 0.25);
        assert_eq!(machine.context().state(), ExplorationState::MeasureDepth);
    }

    #[test]
    fn test_blind_side_sensor_gives_degenerate_depth() {
        let mut machine = in_state(ExplorationState::MeasureDepth);
        machine.step(&input(0.05, 0.0, 1.0, FAR));
        assert_eq!(machine.context().state(), ExplorationState::MeasureDepth);
        machine.step(&input(0.11, 0.0, 1.0, FAR));
        assert_eq!(machine.context().state(), ExplorationState::TurnAroundFront);
        assert_eq!(machine.context().box_depth(), 0.0);
    }

    #[test]
    fn test_turn_completion_stops_and_resets() {
        let mut machine = in_state(ExplorationState::TurnAroundFront);
        machine.context.target_angle = FRAC_PI_2;
        machine.context.temporary_width = 0.7;

        let directive = machine.step(&input(0.0, 1.0, 1.0, FAR));
        assert_eq!(directive.command, Some(WheelSpeeds::spin(2.0)));
        assert_eq!(machine.context().state(), ExplorationState::TurnAroundFront);

        let directive = machine.step(&input(0.0, FRAC_PI_2 - 0.01, 1.0, FAR));
        assert_eq!(directive, Directive::stop_and_reset());
        assert_eq!(machine.context().state(), ExplorationState::MeasureWidth);
        assert_eq!(machine.context().temporary_width(), 0.0);
    }

    #[test]
    fn test_retreat_uses_depth_plus_clearance() {
        let mut machine = in_state(ExplorationState::Retreat);
        machine.context.box_depth = 0.3;
        machine.step(&input(0.39, 0.0, 1.0, FAR));
        assert_eq!(machine.context().state(), ExplorationState::Retreat);
        machine.step(&input(0.41, -PI, 1.0, FAR));
        assert_eq!(machine.context().state(), ExplorationState::TurnBackOnCourse);
        assert!((machine.context().target_angle() - (-PI + FRAC_PI_2)).abs() < 1e-12);
    }

    #[test]
    fn test_final_approach_by_segment() {
        let params = ExplorationParams {
            final_distance: 1.0,
            final_approach_reference: FinalApproachReference::Segment,
            ..Default::default()
        };
        let mut machine = Exploration::new(params);
        machine.context.state = ExplorationState::FinalApproach;

        let mut far_along = input(0.5, 0.0, 1.0, FAR);
        far_along.total_distance = 10.0;
        machine.step(&far_along);
        assert_eq!(machine.context().state(), ExplorationState::FinalApproach);

        let directive = machine.step(&input(1.0, 0.0, 1.0, FAR));
        assert_eq!(directive.command, Some(WheelSpeeds::ZERO));
        assert_eq!(machine.context().state(), ExplorationState::Complete);
    }

    /// Drives the pure machine through a synthetic course where every
    /// obstacle has the same depth and width.
    struct SyntheticCourse {
        machine: Exploration,
        heading: f64,
        local: f64,
        total: f64,
        command: WheelSpeeds,
    }

    impl SyntheticCourse {
        const STEP: f64 = 0.02;
        const TURN_RATE: f64 = 0.01;
        const DEPTH: f64 = 0.3;
        const WIDTH: f64 = 0.5;

        fn new(params: ExplorationParams) -> Self {
            SyntheticCourse {
                machine: Exploration::new(params),
                heading: 0.0,
                local: 0.0,
                total: 0.0,
                command: WheelSpeeds::ZERO,
            }
        }

        fn tick(&mut self) {
            // Plant response to the previous command.
            let forward = (self.command.left + self.command.right) / 2.0;
            let spin = (self.command.right - self.command.left) / 2.0;
            if forward != 0.0 {
                self.local += Self::STEP;
                self.total += Self::STEP;
            }
            if spin != 0.0 {
                self.heading += spin.signum() * Self::TURN_RATE;
            }

            let state = self.machine.context().state();
            let front = if state == ExplorationState::AwaitObstacle && self.local >= 0.5 { 0.01 } else { 1.0 };
            let extent = match state {
                ExplorationState::MeasureDepth => Some(Self::DEPTH),
                ExplorationState::MeasureWidth => Some(Self::WIDTH),
                _ => None,
            };
            let beside = extent.is_some_and(|e| self.local <= e + 1e-9);
            let (left_range, right_range) = match (beside, self.machine.context().side()) {
                (true, Side::Right) => (FAR, 0.2),
                (true, Side::Left) => (0.2, FAR),
                (false, _) => (FAR, FAR),
            };

            let directive = self.machine.step(&ExplorationInput {
                local_distance: self.local,
                total_distance: self.total,
                heading: self.heading,
                front,
                ranges: UltrasonicRanges {
                    left: left_range,
                    right: right_range,
                    ..Default::default()
                },
            });
            if let Some(command) = directive.command {
                self.command = command;
            }
            if directive.reset_odometry {
                self.local = 0.0;
            }
        }
    }

    #[test]
    fn test_synthetic_course_completes_every_box() {
        let params = ExplorationParams {
            final_distance: 40.0,
            ..Default::default()
        };
        let mut course = SyntheticCourse::new(params);
        let mut completions = Vec::new();
        let mut last_count = 0;

        for _ in 0..200_000 {
            course.tick();
            let ctx = *course.machine.context();
            if ctx.boxes_completed() != last_count {
                assert_eq!(ctx.boxes_completed(), last_count + 1);
                last_count = ctx.boxes_completed();
                completions.push((ctx.side(), ctx.box_depth(), ctx.temporary_width()));
                if last_count == 4 {
                    assert_eq!(ctx.state(), ExplorationState::FinalApproach);
                }
            }
            if ctx.state() == ExplorationState::Complete {
                break;
            }
        }

        let ctx = course.machine.context();
        assert_eq!(ctx.state(), ExplorationState::Complete);
        assert!(ctx.total_distance() >= 40.0);
        assert_eq!(completions.len(), 4);
        let sides: Vec<Side> = completions.iter().map(|c| c.0).collect();
        assert_eq!(sides, vec![Side::Left, Side::Right, Side::Left, Side::Right]);
        for (_, depth, width) in completions {
            assert!((depth - SyntheticCourse::DEPTH).abs() <= SyntheticCourse::STEP);
            assert!((width - SyntheticCourse::WIDTH).abs() <= SyntheticCourse::STEP);
        }
        // Heading errors cancel over each obstacle's four turns.
        assert!(course.heading.abs() < 0.1);
    }

    #[test]
    fn test_synthetic_course_heading_holds_on_straights() {
        let mut course = SyntheticCourse::new(ExplorationParams::default());
        for _ in 0..10 {
            course.tick();
        }
        assert_eq!(course.machine.context().state(), ExplorationState::AwaitObstacle);
        assert!(course.local > 0.0);
        assert_eq!(course.heading, 0.0);
    }

    #[test]
    fn test_complete_is_absorbing() {
        let mut machine = in_state(ExplorationState::Complete);
        let directive = machine.step(&input(0.0, 0.0, 0.0, 0.0));
        assert_eq!(directive.command, Some(WheelSpeeds::ZERO));
        assert_eq!(machine.context().state(), ExplorationState::Complete);
    }

    proptest! {
        #[test]
        fn turn_never_done_outside_tolerance(
            target in -10.0..10.0f64,
            error in prop_oneof![-3.0..-0.041f64, 0.041..3.0f64],
        ) {
            let heading = target - error;
            let step = turn_to_target(target, heading, 0.04, 2.0);
            prop_assert!(!step.reached);
            let expected = if error > 0.0 { WheelSpeeds::spin(2.0) } else { WheelSpeeds::spin(-2.0) };
            prop_assert_eq!(step.command, expected);
        }

        #[test]
        fn turn_done_inside_tolerance(target in -10.0..10.0f64, error in -0.039..0.039f64) {
            let step = turn_to_target(target, target - error, 0.04, 2.0);
            prop_assert!(step.reached);
            prop_assert!(step.command.is_stopped());
        }
    }
}
