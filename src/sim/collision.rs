//! Contact detection, elastic response, and event classification
//!
//! Detection and classification are pure passes over the body slice so they
//! can be tested without a running world; the stepper owns all log mutation.
//! Response applies an impulse along the contact normal split by inverse
//! mass, then a positional correction that removes the full penetration.

use glam::Vec2;

use super::body::{Body, BodyKind, Shape};
use super::events::ContactEvent;

/// A detected overlap between two bodies.
///
/// `a` is always dynamic; `normal` is the unit contact normal pointing from
/// `a` toward `b`.
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    pub a: usize,
    pub b: usize,
    pub normal: Vec2,
    pub penetration: f32,
}

/// How a contact is reported in the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    /// Dynamic body against dynamic body.
    Collision,
    /// Dynamic body against static geometry.
    WallBounce,
}

/// Circle overlap test. Returns the unit normal from `a` toward `b` and the
/// penetration depth; exact touching does not count as overlap.
pub fn circle_circle(
    pos_a: Vec2,
    radius_a: f32,
    pos_b: Vec2,
    radius_b: f32,
) -> Option<(Vec2, f32)> {
    let delta = pos_b - pos_a;
    let dist_sq = delta.length_squared();
    let radius_sum = radius_a + radius_b;
    if dist_sq >= radius_sum * radius_sum {
        return None;
    }
    let dist = dist_sq.sqrt();
    if dist > f32::EPSILON {
        Some((delta / dist, radius_sum - dist))
    } else {
        // Coincident centers; separate along X.
        Some((Vec2::X, radius_sum))
    }
}

/// Circle against axis-aligned rectangle. Returns the unit normal from the
/// circle toward the rectangle and the penetration depth.
pub fn circle_rect(pos: Vec2, radius: f32, rect_pos: Vec2, half: Vec2) -> Option<(Vec2, f32)> {
    let rel = pos - rect_pos;
    let closest = rel.clamp(-half, half);

    if closest != rel {
        // Center outside: the closest boundary point decides the normal.
        let to_center = rel - closest;
        let dist_sq = to_center.length_squared();
        if dist_sq >= radius * radius {
            return None;
        }
        let dist = dist_sq.sqrt();
        Some((-(to_center / dist), radius - dist))
    } else {
        // Center inside the rectangle: exit along the shallowest axis.
        let depth_x = half.x - rel.x.abs();
        let depth_y = half.y - rel.y.abs();
        if depth_x < depth_y {
            let sign = if rel.x >= 0.0 { -1.0 } else { 1.0 };
            Some((Vec2::new(sign, 0.0), radius + depth_x))
        } else {
            let sign = if rel.y >= 0.0 { -1.0 } else { 1.0 };
            Some((Vec2::new(0.0, sign), radius + depth_y))
        }
    }
}

/// Detect every dynamic-dynamic and dynamic-static overlap.
///
/// Pairs come out in stable body-index order, so the same registry always
/// yields the same contact sequence.
pub fn detect_contacts(bodies: &[Body]) -> Vec<Contact> {
    let mut contacts = Vec::new();
    for a in 0..bodies.len() {
        if !bodies[a].is_dynamic() {
            continue;
        }
        let Shape::Circle { radius } = bodies[a].shape else {
            continue;
        };
        for b in 0..bodies.len() {
            // Dynamic pairs once each; statics are only ever `b`.
            if a == b || (bodies[b].is_dynamic() && b < a) {
                continue;
            }
            let hit = match bodies[b].shape {
                Shape::Circle { radius: radius_b } => {
                    circle_circle(bodies[a].position, radius, bodies[b].position, radius_b)
                }
                Shape::Rect { .. } => circle_rect(
                    bodies[a].position,
                    radius,
                    bodies[b].position,
                    bodies[b].shape.half_extents(),
                ),
            };
            if let Some((normal, penetration)) = hit {
                contacts.push(Contact {
                    a,
                    b,
                    normal,
                    penetration,
                });
            }
        }
    }
    contacts
}

/// Apply the elastic impulse and positional correction for one contact.
///
/// The impulse fires only while the bodies approach along the normal; the
/// correction always removes the full penetration, split by inverse mass.
pub fn resolve_contact(bodies: &mut [Body], contact: &Contact) {
    let inv_a = bodies[contact.a].inv_mass();
    let inv_b = bodies[contact.b].inv_mass();
    let inv_sum = inv_a + inv_b;
    if inv_sum == 0.0 {
        return;
    }

    let normal = contact.normal;
    let relative = bodies[contact.b].velocity - bodies[contact.a].velocity;
    let along_normal = relative.dot(normal);
    if along_normal < 0.0 {
        let elasticity = bodies[contact.a].elasticity * bodies[contact.b].elasticity;
        let magnitude = -(1.0 + elasticity) * along_normal / inv_sum;
        let impulse = normal * magnitude;
        bodies[contact.a].velocity -= impulse * inv_a;
        bodies[contact.b].velocity += impulse * inv_b;
    }

    let correction = normal * (contact.penetration / inv_sum);
    bodies[contact.a].position -= correction * inv_a;
    bodies[contact.b].position += correction * inv_b;
}

/// Classify a contact into a loggable event. Pure helper: the stepper alone
/// appends to the log.
pub fn classify_contact(
    bodies: &[Body],
    contact: &Contact,
    step: u64,
) -> (ContactKind, ContactEvent) {
    let kind = match bodies[contact.b].kind {
        BodyKind::Dynamic => ContactKind::Collision,
        BodyKind::Static => ContactKind::WallBounce,
    };
    let event = ContactEvent {
        objects: (
            bodies[contact.a].name.clone(),
            bodies[contact.b].name.clone(),
        ),
        step,
    };
    (kind, event)
}

/// Mirror reflection of a velocity off a surface normal.
#[inline]
pub fn reflect(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}
