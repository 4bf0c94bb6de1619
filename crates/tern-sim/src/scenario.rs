//! What the simulated world contains.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::world::{CourseLayout, Obstacle, World};

/// Obstacles to place in the world: an explicit list, or a generated course
/// when the list is empty.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scenario {
    /// Layout of the generated course.
    pub course: CourseLayout,
    /// Hand-placed obstacles; overrides the course when non-empty.
    pub obstacles: Vec<Obstacle>,
}

impl Scenario {
    /// Builds the world, generating `course_boxes` boxes if no obstacles
    /// were listed explicitly.
    pub fn build(&self, course_boxes: u32) -> World {
        if self.obstacles.is_empty() {
            World::new(self.course.obstacles(course_boxes))
        } else {
            World::new(self.obstacles.clone())
        }
    }
}
