//! Rigid bodies and per-marble schedules

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::WallSpec;

/// Collision shape of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    /// Axis-aligned rectangle given by full extents.
    Rect { length: f32, height: f32 },
}

impl Shape {
    /// Half extents of the bounding box.
    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            Shape::Circle { radius } => Vec2::splat(radius),
            Shape::Rect { length, height } => Vec2::new(length / 2.0, height / 2.0),
        }
    }
}

/// Kinematic class of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Never moves; infinite mass.
    Static,
    /// Integrated each step and affected by impulses.
    Dynamic,
}

/// Scheduled velocity modifications for one marble.
///
/// The stepper consults the schedule against its own step counter once per
/// step, before integration. Both actions trigger on exact step equality, so
/// each fires at most once per run. A negative step is the disabling
/// sentinel; a step past the horizon simply never comes up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub launch_step: i64,
    pub launch_velocity: Vec2,
    pub noise_step: i64,
}

impl Schedule {
    #[inline]
    pub fn launches_at(&self, step: u64) -> bool {
        self.launch_step >= 0 && self.launch_step as u64 == step
    }

    #[inline]
    pub fn perturbs_at(&self, step: u64) -> bool {
        self.noise_step >= 0 && self.noise_step as u64 == step
    }
}

/// A named rigid body. Dynamic bodies are circles, static bodies are
/// axis-aligned rectangles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub name: String,
    pub shape: Shape,
    pub kind: BodyKind,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Orientation; stays 0 for frictionless circles, carried for observers.
    pub angle: f32,
    /// Mass; 0 marks infinite (static) mass.
    pub mass: f32,
    pub elasticity: f32,
    pub friction: f32,
    /// Scheduled velocity modifications; only dynamic bodies carry one.
    #[serde(default)]
    pub schedule: Option<Schedule>,
}

impl Body {
    /// Static rectangular wall, elasticity 1.
    pub fn wall(spec: &WallSpec) -> Self {
        Self {
            name: spec.name.clone(),
            shape: Shape::Rect {
                length: spec.length,
                height: spec.height,
            },
            kind: BodyKind::Static,
            position: spec.position,
            velocity: Vec2::ZERO,
            angle: 0.0,
            mass: 0.0,
            elasticity: 1.0,
            friction: 0.0,
            schedule: None,
        }
    }

    /// Dynamic circular marble: unit mass, elasticity 1, friction 0.
    ///
    /// Marbles start at rest; a schedule's launch vector is applied later as
    /// an impulse, never as an initial velocity.
    pub fn marble(name: &str, position: Vec2, diameter: f32) -> Self {
        Self {
            name: name.to_string(),
            shape: Shape::Circle {
                radius: diameter / 2.0,
            },
            kind: BodyKind::Dynamic,
            position,
            velocity: Vec2::ZERO,
            angle: 0.0,
            mass: 1.0,
            elasticity: 1.0,
            friction: 0.0,
            schedule: None,
        }
    }

    /// Attach scheduled launch/noise actions to this body.
    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.kind == BodyKind::Static
    }

    /// Inverse mass; 0 for static bodies.
    #[inline]
    pub fn inv_mass(&self) -> f32 {
        if self.kind == BodyKind::Dynamic && self.mass > 0.0 {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Apply an instantaneous impulse at the center of mass.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        if self.is_dynamic() {
            self.velocity += impulse * self.inv_mass();
        }
    }

    /// True when position and velocity are both finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marble_starts_at_rest_with_unit_mass() {
        let marble = Body::marble("m", Vec2::new(100.0, 200.0), 60.0);
        assert_eq!(marble.velocity, Vec2::ZERO);
        assert_eq!(marble.mass, 1.0);
        assert_eq!(marble.elasticity, 1.0);
        assert_eq!(marble.friction, 0.0);
        assert_eq!(marble.shape, Shape::Circle { radius: 30.0 });
        assert!(marble.is_dynamic());
        assert!(marble.schedule.is_none());

        let scheduled = marble.with_schedule(Schedule {
            launch_step: 3,
            launch_velocity: Vec2::new(-2.0, 0.0),
            noise_step: -1,
        });
        assert!(scheduled.schedule.is_some());
    }

    #[test]
    fn test_wall_has_infinite_mass() {
        let spec = WallSpec::new("w", Vec2::new(400.0, 10.0), 800.0, 20.0);
        let mut wall = Body::wall(&spec);
        assert!(wall.is_static());
        assert_eq!(wall.inv_mass(), 0.0);

        wall.apply_impulse(Vec2::new(100.0, 100.0));
        assert_eq!(wall.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_impulse_scales_by_inverse_mass() {
        let mut marble = Body::marble("m", Vec2::ZERO, 60.0);
        marble.apply_impulse(Vec2::new(-400.0, 0.0));
        assert_eq!(marble.velocity, Vec2::new(-400.0, 0.0));

        let mut heavy = Body::marble("h", Vec2::ZERO, 60.0);
        heavy.mass = 2.0;
        heavy.apply_impulse(Vec2::new(-400.0, 0.0));
        assert_eq!(heavy.velocity, Vec2::new(-200.0, 0.0));
    }

    #[test]
    fn test_schedule_fires_on_exact_step_only() {
        let schedule = Schedule {
            launch_step: 5,
            launch_velocity: Vec2::new(1.0, 0.0),
            noise_step: 12,
        };
        assert!(!schedule.launches_at(4));
        assert!(schedule.launches_at(5));
        assert!(!schedule.launches_at(6));
        assert!(schedule.perturbs_at(12));
        assert!(!schedule.perturbs_at(11));
    }

    #[test]
    fn test_negative_schedule_steps_never_fire() {
        let schedule = Schedule {
            launch_step: -1,
            launch_velocity: Vec2::new(1.0, 0.0),
            noise_step: -7,
        };
        for step in 0..1000 {
            assert!(!schedule.launches_at(step));
            assert!(!schedule.perturbs_at(step));
        }
    }

    #[test]
    fn test_half_extents() {
        assert_eq!(
            Shape::Circle { radius: 30.0 }.half_extents(),
            Vec2::splat(30.0)
        );
        assert_eq!(
            Shape::Rect {
                length: 800.0,
                height: 20.0
            }
            .half_extents(),
            Vec2::new(400.0, 10.0)
        );
    }
}
