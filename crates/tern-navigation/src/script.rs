//! Sequenced motion scripts and the shape/arc missions built from them.

use std::collections::VecDeque;

use core::f64::consts::{FRAC_PI_2, TAU};
use tracing::info;

use crate::driver::{Behavior, Frame, Progress};
use crate::params::{ArcParams, Rotation, ShapeParams};
use crate::primitives::Motion;

/// A FIFO queue of primitives run back to back.
#[derive(Debug, Clone)]
pub struct Script {
    name: String,
    queue: VecDeque<Motion>,
    completed: usize,
}

impl Script {
    /// Creates a script that runs `motions` in order.
    pub fn new(name: impl Into<String>, motions: impl IntoIterator<Item = Motion>) -> Self {
        Script {
            name: name.into(),
            queue: motions.into_iter().collect(),
            completed: 0,
        }
    }

    /// Appends a motion to the back of the queue.
    pub fn push(&mut self, motion: Motion) {
        self.queue.push_back(motion);
    }

    /// Appends several motions.
    pub fn extend(&mut self, motions: impl IntoIterator<Item = Motion>) {
        self.queue.extend(motions);
    }

    /// Motions still queued, including the one running.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Motions finished so far.
    pub fn completed(&self) -> usize {
        self.completed
    }
}

impl Behavior for Script {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&mut self, frame: &mut Frame<'_>) -> Progress {
        while let Some(current) = self.queue.front_mut() {
            if current.tick(frame) == Progress::InProgress {
                return Progress::InProgress;
            }
            if let Some(done) = self.queue.pop_front() {
                self.completed += 1;
                info!(script = %self.name, step = self.completed, motion = %done, "Motion complete");
            }
        }
        Progress::Done
    }
}

/// Edges and corners of a regular polygon with `sides` sides.
pub fn polygon(sides: u32, side_length: f64, direction: Rotation, params: &ShapeParams) -> Vec<Motion> {
    let corner = direction.sign() * TAU / f64::from(sides.max(1));
    (0..sides)
        .flat_map(|_| {
            [
                Motion::straight(side_length, params.straight_speed),
                Motion::rotate(corner, params.turn_speed),
            ]
        })
        .collect()
}

/// Edges and corners of a `width` × `height` rectangle.
pub fn rectangle(width: f64, height: f64, direction: Rotation, params: &ShapeParams) -> Vec<Motion> {
    let corner = direction.sign() * FRAC_PI_2;
    (0..2)
        .flat_map(|_| {
            [
                Motion::straight(width, params.straight_speed),
                Motion::rotate(corner, params.turn_speed),
                Motion::straight(height, params.straight_speed),
                Motion::rotate(corner, params.turn_speed),
            ]
        })
        .collect()
}

/// Triangle, rectangle, pentagon, then every polygon from three to nine
/// sides, each followed by a pause.
pub fn shapes_demo(params: &ShapeParams) -> Script {
    let mut script = Script::new("shapes", []);
    let mut shape = |motions: Vec<Motion>| {
        script.extend(motions);
        script.push(Motion::pause(params.pause));
    };

    shape(polygon(3, params.side_length, params.direction, params));
    shape(rectangle(
        params.rectangle_width,
        params.rectangle_height,
        params.direction,
        params,
    ));
    shape(polygon(5, params.side_length, params.direction, params));
    for sides in 3..=9 {
        shape(polygon(sides, params.side_length, params.direction, params));
    }
    script
}

/// One arc per configured segment on a circle of the configured radius.
pub fn arcs(params: &ArcParams) -> Script {
    Script::new(
        "circles",
        params
            .segments
            .iter()
            .map(|s| Motion::arc(params.radius, s.angle, s.direction, params.linear_speed)),
    )
}
