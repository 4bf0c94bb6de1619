//! Circle following with a single scripted avoidance maneuver.
//!
//! The robot drives the configured arcs back to back. Whenever one of the
//! three front-facing ultrasonic ranges drops below the stop range it turns
//! in place toward the nearer diagonal until everything ahead reads clear,
//! steps forward a fixed distance and resumes the current arc. Forward travel
//! during an avoidance counts toward the arc's length.

use tern_kinematics::WheelSpeeds;
use tracing::{debug, info};

use crate::driver::{Behavior, Frame, Progress};
use crate::params::{FigureEightParams, Rotation};
use crate::perception::UltrasonicRanges;

/// Spin direction for an avoidance: counter-clockwise when the front-left
/// reading is the nearer one, clockwise otherwise (ties included).
pub fn avoidance_direction(ranges: &UltrasonicRanges) -> Rotation {
    if ranges.front_left < ranges.front_right {
        Rotation::CounterClockwise
    } else {
        Rotation::Clockwise
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    AvoidAdvance,
    Follow,
    NextSegment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Start,
    Follow,
    AvoidTurn(Rotation),
    AvoidAdvance,
    Settle(Resume),
    Finished,
}

/// Figure-eight (or any arc list) with obstacle avoidance.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureEight {
    params: FigureEightParams,
    mode: Mode,
    segment: usize,
    segment_start: f64,
    avoidances: u32,
}

impl FigureEight {
    /// Starts on the first configured segment.
    pub fn new(params: FigureEightParams) -> Self {
        FigureEight {
            params,
            mode: Mode::Start,
            segment: 0,
            segment_start: 0.0,
            avoidances: 0,
        }
    }

    /// Index of the arc being driven.
    pub fn segment(&self) -> usize {
        self.segment
    }

    /// Number of avoidance maneuvers started so far.
    pub fn avoidances(&self) -> u32 {
        self.avoidances
    }

    fn begin_segment(&mut self, frame: &Frame<'_>) {
        self.segment_start = frame.odometry.cumulative_distance();
        self.mode = Mode::Follow;
        debug!(segment = self.segment, "Starting arc");
    }

    fn follow(&mut self, frame: &mut Frame<'_>) {
        if frame.ranges.nearest_ahead() < self.params.obstacle_stop {
            let direction = avoidance_direction(&frame.ranges);
            self.avoidances += 1;
            info!(
                segment = self.segment,
                direction = ?direction,
                nearest = frame.ranges.nearest_ahead(),
                "Obstacle ahead, avoiding"
            );
            self.mode = Mode::AvoidTurn(direction);
            self.avoid_turn(direction, frame);
            return;
        }

        let Some(arc) = self.params.segments.get(self.segment) else {
            self.mode = Mode::Finished;
            return;
        };
        let omega = arc.direction.sign() * self.params.linear_speed / self.params.radius;
        frame.actuator.set_velocity_twist(self.params.linear_speed, omega);

        let progress = frame.odometry.cumulative_distance() - self.segment_start;
        if progress.abs() >= arc.angle.abs() * self.params.radius {
            frame.actuator.stop();
            self.mode = Mode::Settle(Resume::NextSegment);
        }
    }

    fn avoid_turn(&mut self, direction: Rotation, frame: &mut Frame<'_>) {
        frame
            .actuator
            .apply(WheelSpeeds::spin(direction.sign() * self.params.avoid_turn_speed));
        let clear = self.params.obstacle_clear;
        let r = frame.ranges;
        if r.front > clear && r.front_left > clear && r.front_right > clear {
            frame.actuator.stop();
            self.mode = Mode::Settle(Resume::AvoidAdvance);
        }
    }

    fn avoid_advance(&mut self, frame: &mut Frame<'_>) {
        frame.actuator.set_velocity_twist(self.params.avoid_forward_speed, 0.0);
        if frame.odometry.signed_local_distance().abs() >= self.params.avoid_step {
            frame.actuator.stop();
            self.mode = Mode::Settle(Resume::Follow);
        }
    }
}

impl Behavior for FigureEight {
    fn name(&self) -> &str {
        "figure-eight"
    }

    fn tick(&mut self, frame: &mut Frame<'_>) -> Progress {
        match self.mode {
            Mode::Start => {
                self.begin_segment(frame);
                self.follow(frame);
            }
            Mode::Follow => self.follow(frame),
            Mode::AvoidTurn(direction) => self.avoid_turn(direction, frame),
            Mode::AvoidAdvance => self.avoid_advance(frame),
            Mode::Settle(Resume::AvoidAdvance) => {
                frame.odometry.reset();
                self.mode = Mode::AvoidAdvance;
                self.avoid_advance(frame);
            }
            Mode::Settle(Resume::Follow) => {
                debug!(segment = self.segment, "Avoidance done, resuming arc");
                self.mode = Mode::Follow;
                self.follow(frame);
            }
            Mode::Settle(Resume::NextSegment) => {
                self.segment += 1;
                if self.segment >= self.params.segments.len() {
                    info!(
                        path_length = frame.odometry.path_length(),
                        avoidances = self.avoidances,
                        "Figure eight complete"
                    );
                    self.mode = Mode::Finished;
                } else {
                    self.begin_segment(frame);
                    self.follow(frame);
                }
            }
            Mode::Finished => {}
        }

        if self.mode == Mode::Finished {
            frame.actuator.stop();
            Progress::Done
        } else {
            Progress::InProgress
        }
    }
}
