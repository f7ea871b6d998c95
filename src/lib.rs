//! Marble World - a deterministic 2D marble arena
//!
//! Circular marbles sit at rest inside a walled arena with an exit gap in
//! the left side, get launched by scheduled impulses, optionally have their
//! velocities perturbed by seeded Gaussian noise, and bounce perfectly
//! elastically off each other and the walls. Every run produces an ordered
//! record of labeled contact events plus exit outcomes for analysis.
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bodies, collisions, events, stepper)
//! - `config`: Arena geometry, world constants, and trial specs
//! - `error`: Configuration and simulation failure types

pub mod config;
pub mod error;
pub mod sim;

pub use config::{ExitRegion, MarbleSpec, Trial, WallSpec, WorldConfig};
pub use error::WorldError;
pub use sim::{
    Body, BodyKind, ContactEvent, EventLog, MarbleWorld, RunRecord, Schedule, Shape, StepObserver,
    Trajectory,
};

use glam::Vec2;

/// World default constants
pub mod consts {
    /// Fixed simulation timestep (50 Hz physics)
    pub const STEP_SIZE: f32 = 1.0 / 50.0;
    /// Simulated horizon in time units
    pub const TIME_MAX: f32 = 15.0;
    /// Contact resolution iterations per step
    pub const CONTACT_ITERATIONS: usize = 4;

    /// Arena dimensions
    pub const ARENA_LENGTH: f32 = 800.0;
    pub const ARENA_HEIGHT: f32 = 600.0;
    pub const WALL_THICKNESS: f32 = 20.0;
    /// Portion of the left side taken by the exit gap
    pub const EXIT_PORTION: f32 = 1.0 / 3.0;

    /// Marble defaults
    pub const MARBLE_DIAMETER: f32 = 60.0;
    /// Global scale applied to launch vectors (pixels/s per velocity unit)
    pub const LAUNCH_SPEED: f32 = 200.0;
    /// Standard deviation of the scheduled velocity noise
    pub const VELOCITY_NOISE_STD: f32 = 0.05;

    /// Schedule sentinel that disables an action
    pub const DISABLED_STEP: i64 = -1;
    /// Name reserved for the exit gap; never a collidable body
    pub const EXIT_NAME: &str = "exit";
}

/// Launch vector for a polar sweep cell: direction `angle_degrees`,
/// magnitude `magnitude / 10` velocity units.
#[inline]
pub fn launch_velocity(angle_degrees: f32, magnitude: f32) -> Vec2 {
    let theta = angle_degrees.to_radians();
    Vec2::new(theta.cos(), theta.sin()) * (magnitude / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_velocity_scales_magnitude_by_ten() {
        let v = launch_velocity(180.0, 20.0);
        assert!((v.x + 2.0).abs() < 1e-6);
        assert!(v.y.abs() < 1e-5);

        let v = launch_velocity(90.0, 10.0);
        assert!(v.x.abs() < 1e-6);
        assert!((v.y - 1.0).abs() < 1e-6);
    }
}
