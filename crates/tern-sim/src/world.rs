//! Box obstacles and ray casting.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis-aligned box on the floor, in world meters.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    /// Smallest x (m).
    pub min_x: f64,
    /// Smallest y (m).
    pub min_y: f64,
    /// Largest x (m).
    pub max_x: f64,
    /// Largest y (m).
    pub max_y: f64,
}

impl Obstacle {
    /// Builds a box from any two opposite corners.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Obstacle {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    /// Size along x (m).
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Size along y (m).
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// True when the disk of `radius` around `(x, y)` overlaps the box.
    pub fn overlaps_disk(&self, x: f64, y: f64, radius: f64) -> bool {
        let dx = (self.min_x - x).max(0.0).max(x - self.max_x);
        let dy = (self.min_y - y).max(0.0).max(y - self.max_y);
        dx * dx + dy * dy < radius * radius
    }

    /// Distance along the unit ray `(dx, dy)` from `(ox, oy)` to the box
    /// surface, if the box is hit within `max_range`. A ray starting inside
    /// the box reports zero.
    pub fn ray_distance(&self, ox: f64, oy: f64, dx: f64, dy: f64, max_range: f64) -> Option<f64> {
        let mut t_min = 0.0_f64;
        let mut t_max = max_range;

        for (origin, dir, lo, hi) in [(ox, dx, self.min_x, self.max_x), (oy, dy, self.min_y, self.max_y)] {
            if dir.abs() < 1e-12 {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }
            let (mut t0, mut t1) = ((lo - origin) / dir, (hi - origin) / dir);
            if t0 > t1 {
                core::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

/// Placement of a generated obstacle course along the +x axis.
///
/// Boxes alternate which side of the course line they extend to, so that an
/// explorer that flips its measuring flank after each box always turns
/// toward the open side.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourseLayout {
    /// x of the first box's near face (m).
    pub first_at: f64,
    /// Free space between consecutive boxes (m).
    pub gap: f64,
    /// Extent across the course line on the open side (m).
    pub depth: f64,
    /// Extent along the course line (m).
    pub width: f64,
    /// Extent across the course line on the other side (m).
    pub overhang: f64,
}

impl Default for CourseLayout {
    fn default() -> Self {
        CourseLayout {
            first_at: 1.0,
            gap: 0.8,
            depth: 0.3,
            width: 0.4,
            overhang: 0.1,
        }
    }
}

impl CourseLayout {
    /// The first `count` boxes of the course.
    pub fn obstacles(&self, count: u32) -> Vec<Obstacle> {
        (0..count)
            .map(|k| {
                let x0 = self.first_at + f64::from(k) * (self.width + self.gap);
                let x1 = x0 + self.width;
                if k % 2 == 0 {
                    Obstacle::new(x0, -self.overhang, x1, self.depth)
                } else {
                    Obstacle::new(x0, -self.depth, x1, self.overhang)
                }
            })
            .collect()
    }
}

/// Static obstacles.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct World {
    obstacles: Vec<Obstacle>,
}

impl World {
    /// A world containing `obstacles`.
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        World { obstacles }
    }

    /// A world with nothing in it.
    pub fn empty() -> Self {
        World::default()
    }

    /// The obstacles.
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Distance to the nearest obstacle along `angle` from `(x, y)`, or
    /// `None` if nothing is hit within `max_range`.
    pub fn raycast(&self, x: f64, y: f64, angle: f64, max_range: f64) -> Option<f64> {
        let (dy, dx) = angle.sin_cos();
        self.obstacles
            .iter()
            .filter_map(|o| o.ray_distance(x, y, dx, dy, max_range))
            .reduce(f64::min)
    }

    /// True when a body of `radius` at `(x, y)` touches any obstacle.
    pub fn collides(&self, x: f64, y: f64, radius: f64) -> bool {
        self.obstacles.iter().any(|o| o.overlaps_disk(x, y, radius))
    }
}
