//! Arena geometry, world constants, and trial specifications
//!
//! World-level parameters are carried as an immutable [`WorldConfig`] value,
//! one copy per world, so sweep runs with different settings never share
//! state. Trials deserialize from the line-oriented JSON records the
//! experiment tooling emits; field aliases keep the original record format
//! readable.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::WorldError;

/// A static rectangular wall: center position plus full extents.
///
/// `color` is a display tag for observers; the physics ignores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallSpec {
    pub name: String,
    pub position: Vec2,
    pub length: f32,
    pub height: f32,
    #[serde(default = "default_wall_color")]
    pub color: String,
}

fn default_wall_color() -> String {
    "black".to_string()
}

impl WallSpec {
    pub fn new(name: &str, position: Vec2, length: f32, height: f32) -> Self {
        Self {
            name: name.to_string(),
            position,
            length,
            height,
            color: default_wall_color(),
        }
    }
}

/// The gap in the left wall.
///
/// Geometry only: the exit is never inserted as a collidable body. It is the
/// reference point for closest-approach tracking and outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitRegion {
    pub position: Vec2,
    pub length: f32,
    pub height: f32,
}

/// Per-marble trial parameters.
///
/// `velocity` is the launch vector applied as an impulse at `launch_step`,
/// not an initial velocity; marbles start at rest. Schedule steps trigger on
/// exact equality, so each fires at most once per run. A negative step (or
/// one past the horizon) disables the action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarbleSpec {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Step at which the launch impulse fires. Original records call this `delay`.
    #[serde(default, alias = "delay")]
    pub launch_step: i64,
    /// Step at which velocity noise fires. Original records call this `noisy`.
    #[serde(default = "disabled_step", alias = "noisy")]
    pub noise_step: i64,
}

fn disabled_step() -> i64 {
    DISABLED_STEP
}

/// One simulated trial: marbles plus optional extra geometry, and the lists
/// of bodies whose paths and outcomes get recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    /// Marbles by name. BTreeMap keeps registration order deterministic.
    pub marbles: BTreeMap<String, MarbleSpec>,
    /// Walls added on top of the default arena frame.
    #[serde(default)]
    pub extra_walls: Vec<WallSpec>,
    /// Bodies whose per-step position/velocity paths are recorded.
    #[serde(default)]
    pub record_paths: Vec<String>,
    /// Bodies whose exit outcome and closest approach are recorded.
    #[serde(default)]
    pub record_outcomes: Vec<String>,
}

impl Trial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a trial from one JSON record. Unknown fields are ignored.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn marble(mut self, name: &str, spec: MarbleSpec) -> Self {
        self.marbles.insert(name.to_string(), spec);
        self
    }

    pub fn extra_wall(mut self, wall: WallSpec) -> Self {
        self.extra_walls.push(wall);
        self
    }

    pub fn record_path(mut self, name: &str) -> Self {
        self.record_paths.push(name.to_string());
        self
    }

    pub fn record_outcome(mut self, name: &str) -> Self {
        self.record_outcomes.push(name.to_string());
        self
    }
}

/// Immutable world-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Arena extent along X.
    pub length: f32,
    /// Arena extent along Y.
    pub height: f32,
    /// Thickness of the default walls.
    pub wall_thickness: f32,
    /// Diameter of every dynamic marble.
    pub marble_diameter: f32,
    /// Global scale applied to launch vectors at the launch step.
    pub speed: f32,
    /// Fixed simulated timestep.
    pub step_size: f32,
    /// Simulated horizon; the run covers steps `0..=step_max()`.
    pub time_max: f32,
    /// Standard deviation of the multiplicative Gaussian velocity noise.
    pub noise_std: f32,
    /// Seed for the world's random source.
    pub seed: u64,
    /// Solid walls framing the arena.
    pub walls: Vec<WallSpec>,
    /// The gap in the left wall.
    pub exit: ExitRegion,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            length: ARENA_LENGTH,
            height: ARENA_HEIGHT,
            wall_thickness: WALL_THICKNESS,
            marble_diameter: MARBLE_DIAMETER,
            speed: LAUNCH_SPEED,
            step_size: STEP_SIZE,
            time_max: TIME_MAX,
            noise_std: VELOCITY_NOISE_STD,
            seed: 0,
            walls: Self::default_walls(ARENA_LENGTH, ARENA_HEIGHT, WALL_THICKNESS),
            exit: Self::default_exit(ARENA_HEIGHT, WALL_THICKNESS),
        }
    }
}

impl WorldConfig {
    /// The default arena frame: top and bottom walls spanning the full
    /// length, and a left wall split into two segments around the exit gap.
    /// The right side is open.
    pub fn default_walls(length: f32, height: f32, thickness: f32) -> Vec<WallSpec> {
        // Segments derive from the gap height, the same quantity
        // default_exit uses, so segment edges meet the gap edges.
        let exit_height = height * EXIT_PORTION;
        let side_height = (height - exit_height) / 2.0;
        vec![
            WallSpec::new(
                "top_wall",
                Vec2::new(length / 2.0, height - thickness / 2.0),
                length,
                thickness,
            ),
            WallSpec::new(
                "bottom_wall",
                Vec2::new(length / 2.0, thickness / 2.0),
                length,
                thickness,
            ),
            WallSpec::new(
                "top_left_wall",
                Vec2::new(thickness / 2.0, height - side_height / 2.0),
                thickness,
                side_height,
            ),
            WallSpec::new(
                "bottom_left_wall",
                Vec2::new(thickness / 2.0, side_height / 2.0),
                thickness,
                side_height,
            ),
        ]
    }

    /// The exit gap centered on the left side, covering the middle third.
    pub fn default_exit(height: f32, thickness: f32) -> ExitRegion {
        ExitRegion {
            position: Vec2::new(thickness / 2.0, height / 2.0),
            length: thickness,
            height: height * EXIT_PORTION,
        }
    }

    /// Squared Euclidean distance from `position` to the exit center.
    ///
    /// Everything downstream works in the squared domain; callers comparing
    /// against a linear threshold must square it first.
    #[inline]
    pub fn exit_distance_sq(&self, position: Vec2) -> f32 {
        self.exit.position.distance_squared(position)
    }

    /// Index of the last simulated step.
    #[inline]
    pub fn step_max(&self) -> u64 {
        (self.time_max / self.step_size).floor() as u64
    }

    /// Squared arena diagonal, an upper bound on any in-arena exit distance.
    #[inline]
    pub fn diagonal_sq(&self) -> f32 {
        self.length * self.length + self.height * self.height
    }

    /// Fail fast on out-of-range world parameters.
    pub fn validate(&self) -> Result<(), WorldError> {
        positive_finite(self.length, "arena length")?;
        positive_finite(self.height, "arena height")?;
        positive_finite(self.wall_thickness, "wall thickness")?;
        positive_finite(self.marble_diameter, "marble diameter")?;
        positive_finite(self.step_size, "step size")?;
        positive_finite(self.time_max, "time horizon")?;
        positive_finite(self.exit.length, "exit length")?;
        positive_finite(self.exit.height, "exit height")?;
        if !self.speed.is_finite() {
            return Err(WorldError::InvalidConfig {
                reason: format!("speed must be finite, got {}", self.speed),
            });
        }
        if !(self.noise_std >= 0.0 && self.noise_std.is_finite()) {
            return Err(WorldError::InvalidConfig {
                reason: format!(
                    "noise standard deviation must be non-negative and finite, got {}",
                    self.noise_std
                ),
            });
        }
        if !self.exit.position.is_finite() {
            return Err(WorldError::InvalidConfig {
                reason: "exit position must be finite".to_string(),
            });
        }
        Ok(())
    }
}

fn positive_finite(value: f32, what: &str) -> Result<(), WorldError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(WorldError::InvalidConfig {
            reason: format!("{what} must be positive and finite, got {value}"),
        })
    }
}
