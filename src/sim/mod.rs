//! Deterministic marble simulation
//!
//! All physics lives here. This module must be pure and deterministic:
//! - Fixed timestep only; observers never affect the step count
//! - Seeded RNG only, consulted solely at scheduled noise steps
//! - Stable iteration order (walls first, then marbles sorted by name)
//! - No rendering, persistence, or platform dependencies

pub mod body;
pub mod collision;
pub mod events;
pub mod world;

pub use body::{Body, BodyKind, Schedule, Shape};
pub use collision::{
    Contact, ContactKind, circle_circle, circle_rect, classify_contact, detect_contacts, reflect,
    resolve_contact,
};
pub use events::{ContactEvent, EventLog, OutcomeTracker, RunRecord, Trajectory};
pub use world::{MarbleWorld, StepObserver};
