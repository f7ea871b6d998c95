//! World assembly and the fixed-timestep control loop
//!
//! A [`MarbleWorld`] is built once from an immutable [`WorldConfig`] plus one
//! [`Trial`] and consumed into a [`RunRecord`] after stepping the whole
//! horizon. Worlds are never reset or reused between trials.

use std::collections::{BTreeMap, HashSet};

use glam::Vec2;
use log::{debug, info};
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg32;

use super::body::{Body, Schedule};
use super::collision::{Contact, ContactKind, classify_contact, detect_contacts, resolve_contact};
use super::events::{EventLog, OutcomeTracker, RunRecord, Trajectory};
use crate::config::{ExitRegion, MarbleSpec, Trial, WallSpec, WorldConfig};
use crate::consts::{CONTACT_ITERATIONS, EXIT_NAME};
use crate::error::WorldError;

/// Read-only hook invoked after every completed step.
///
/// Observers may pace wall-clock time (a renderer capping its frame rate)
/// but cannot feed back into the simulation: the fixed timestep and the step
/// count are never affected by how long an observer takes.
pub trait StepObserver {
    fn on_step(&mut self, world: &MarbleWorld);
}

/// No-op observer for headless runs.
impl StepObserver for () {
    fn on_step(&mut self, _world: &MarbleWorld) {}
}

/// One simulated trial: a body registry, event log, and outcome tracker,
/// driven by a fixed-timestep stepper.
#[derive(Debug, Clone)]
pub struct MarbleWorld {
    config: WorldConfig,
    step: u64,
    step_max: u64,
    bodies: Vec<Body>,
    walls: Vec<WallSpec>,
    /// Pairs in contact at the end of the previous step, by body index.
    touching: HashSet<(usize, usize)>,
    events: EventLog,
    tracker: OutcomeTracker,
    paths: BTreeMap<String, Trajectory>,
    path_bodies: Vec<usize>,
    outcome_bodies: Vec<usize>,
    rng: Pcg32,
    noise: Normal<f32>,
}

impl MarbleWorld {
    /// Build a world from a configuration and one trial.
    ///
    /// Walls are registered first (defaults, then extras), marbles after, in
    /// the trial map's name order, so body indices, contact ordering, and
    /// noise draws are reproducible for a given seed. Fails fast on the
    /// first structural problem; schedule steps outside the horizon are not
    /// errors, they are the documented way to disable an action.
    pub fn new(config: WorldConfig, trial: &Trial) -> Result<Self, WorldError> {
        config.validate()?;
        let noise = Normal::new(1.0, config.noise_std).map_err(|e| WorldError::InvalidConfig {
            reason: e.to_string(),
        })?;

        let mut bodies = Vec::new();
        let mut walls = Vec::new();
        for spec in config.walls.iter().chain(&trial.extra_walls) {
            add_wall(&mut bodies, &mut walls, spec)?;
        }
        for (name, spec) in &trial.marbles {
            add_marble(&mut bodies, name, spec, config.marble_diameter)?;
        }

        let mut paths = BTreeMap::new();
        let mut path_bodies = Vec::new();
        for name in &trial.record_paths {
            let idx = dynamic_index(&bodies, name)?;
            if !path_bodies.contains(&idx) {
                path_bodies.push(idx);
                paths.insert(name.clone(), Trajectory::default());
            }
        }

        let mut tracker = OutcomeTracker::default();
        let mut outcome_bodies = Vec::new();
        let diagonal_sq = config.diagonal_sq();
        for name in &trial.record_outcomes {
            let idx = dynamic_index(&bodies, name)?;
            if !outcome_bodies.contains(&idx) {
                outcome_bodies.push(idx);
                tracker.track(name, diagonal_sq);
            }
        }

        let step_max = config.step_max();
        info!(
            "world ready: {} walls, {} marbles, {} steps of {}s, seed {}",
            walls.len(),
            trial.marbles.len(),
            step_max.saturating_add(1),
            config.step_size,
            config.seed
        );

        Ok(Self {
            rng: Pcg32::seed_from_u64(config.seed),
            noise,
            step: 0,
            step_max,
            bodies,
            walls,
            touching: HashSet::new(),
            events: EventLog::default(),
            tracker,
            paths,
            path_bodies,
            outcome_bodies,
            config,
        })
    }

    /// Advance one fixed timestep.
    ///
    /// Phase order per step: record paths, sample exit distances, apply
    /// scheduled launches and noise, integrate, resolve and log contacts,
    /// then check finiteness and count the step.
    pub fn step_once(&mut self) -> Result<(), WorldError> {
        self.record_paths();
        self.sample_outcomes();
        self.apply_schedules();
        self.integrate();
        self.resolve_and_log();
        self.check_finite()?;
        self.step += 1;
        Ok(())
    }

    /// Run every remaining step and classify outcomes.
    pub fn run(self) -> Result<RunRecord, WorldError> {
        self.run_with_observer(&mut ())
    }

    /// Run every remaining step, handing `observer` read access to the world
    /// after each one.
    pub fn run_with_observer<O: StepObserver>(
        mut self,
        observer: &mut O,
    ) -> Result<RunRecord, WorldError> {
        while self.step <= self.step_max {
            self.step_once()?;
            observer.on_step(&self);
        }
        Ok(self.finish())
    }

    /// Classify outcomes and extract the run record.
    ///
    /// The run always covers the full horizon; a marble passed when its
    /// final position is at least one radius past the arena's left edge.
    pub fn finish(mut self) -> RunRecord {
        for &idx in &self.outcome_bodies {
            let body = &self.bodies[idx];
            // Dynamic bodies are circles, so the half extent is the radius.
            let radius = body.shape.half_extents().x;
            let passed = body.position.x <= -radius;
            self.events.outcome.insert(body.name.clone(), passed);
        }
        info!(
            "run complete after {} steps: {} collisions, {} wall bounces",
            self.step,
            self.events.collisions.len(),
            self.events.wall_bounces.len()
        );

        let mut events = self.events;
        events.outcome_dists = self.tracker.into_dists();
        RunRecord {
            events,
            paths: self.paths,
        }
    }

    /// Steps completed so far.
    #[inline]
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Index of the last simulated step.
    #[inline]
    pub fn step_max(&self) -> u64 {
        self.step_max
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn body(&self, name: &str) -> Option<&Body> {
        self.bodies.iter().find(|b| b.name == name)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Wall specs in registration order (defaults, then extras). The exit is
    /// not a wall; see [`MarbleWorld::exit`].
    pub fn walls(&self) -> &[WallSpec] {
        &self.walls
    }

    pub fn exit(&self) -> &ExitRegion {
        &self.config.exit
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Running minimum squared exit distance for an outcome-tracked body.
    pub fn min_exit_dist_sq(&self, name: &str) -> Option<f32> {
        self.tracker.min_dist_sq(name)
    }

    fn record_paths(&mut self) {
        for &idx in &self.path_bodies {
            let body = &self.bodies[idx];
            if let Some(path) = self.paths.get_mut(&body.name) {
                path.position.push(body.position);
                path.velocity.push(body.velocity);
            }
        }
    }

    fn sample_outcomes(&mut self) {
        for &idx in &self.outcome_bodies {
            let body = &self.bodies[idx];
            let dist_sq = self.config.exit_distance_sq(body.position);
            self.tracker.observe(&body.name, dist_sq);
        }
    }

    /// Launch impulses fire before noise when both land on the same step;
    /// noise draws X before Y. Bodies are visited in registry order, so the
    /// RNG stream is identical across same-seed runs.
    fn apply_schedules(&mut self) {
        let step = self.step;
        let speed = self.config.speed;
        for body in &mut self.bodies {
            let Some(schedule) = body.schedule else {
                continue;
            };
            if schedule.launches_at(step) {
                let impulse = schedule.launch_velocity * speed;
                body.apply_impulse(impulse);
                debug!("step {step}: '{}' launched with impulse {impulse:?}", body.name);
            }
            if schedule.perturbs_at(step) {
                let fx = self.noise.sample(&mut self.rng);
                let fy = self.noise.sample(&mut self.rng);
                body.velocity = Vec2::new(body.velocity.x * fx, body.velocity.y * fy);
                debug!("step {step}: '{}' velocity scaled by ({fx}, {fy})", body.name);
            }
        }
    }

    fn integrate(&mut self) {
        let dt = self.config.step_size;
        for body in &mut self.bodies {
            if body.is_dynamic() {
                body.position += body.velocity * dt;
            }
        }
    }

    /// Resolve overlaps and log each pair that newly came into contact this
    /// step. Extra solver iterations separate pile-ups without producing
    /// duplicate events.
    fn resolve_and_log(&mut self) {
        let mut step_contacts: Vec<Contact> = Vec::new();
        for _ in 0..CONTACT_ITERATIONS {
            let contacts = detect_contacts(&self.bodies);
            if contacts.is_empty() {
                break;
            }
            for contact in contacts {
                resolve_contact(&mut self.bodies, &contact);
                if !step_contacts
                    .iter()
                    .any(|c| (c.a, c.b) == (contact.a, contact.b))
                {
                    step_contacts.push(contact);
                }
            }
        }

        let mut touching = HashSet::with_capacity(step_contacts.len());
        for contact in &step_contacts {
            touching.insert((contact.a, contact.b));
            if self.touching.contains(&(contact.a, contact.b)) {
                // Persisting contact, already reported at its first step.
                continue;
            }
            let (kind, event) = classify_contact(&self.bodies, contact, self.step);
            debug!("step {}: {:?} {:?}", self.step, kind, event.objects);
            match kind {
                ContactKind::Collision => self.events.collisions.push(event),
                ContactKind::WallBounce => self.events.wall_bounces.push(event),
            }
        }
        self.touching = touching;
    }

    fn check_finite(&self) -> Result<(), WorldError> {
        for body in &self.bodies {
            if body.is_dynamic() && !body.is_finite() {
                return Err(WorldError::NonFinite {
                    step: self.step,
                    name: body.name.clone(),
                });
            }
        }
        Ok(())
    }
}

fn ensure_unique(bodies: &[Body], name: &str) -> Result<(), WorldError> {
    if bodies.iter().any(|b| b.name == name) {
        return Err(WorldError::DuplicateBody {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn dynamic_index(bodies: &[Body], name: &str) -> Result<usize, WorldError> {
    bodies
        .iter()
        .position(|b| b.name == name && b.is_dynamic())
        .ok_or_else(|| WorldError::UnknownBody {
            name: name.to_string(),
        })
}

fn add_wall(
    bodies: &mut Vec<Body>,
    walls: &mut Vec<WallSpec>,
    spec: &WallSpec,
) -> Result<(), WorldError> {
    if spec.name == EXIT_NAME {
        return Err(WorldError::InvalidWall {
            name: spec.name.clone(),
            reason: "'exit' names the gap, not a solid body".to_string(),
        });
    }
    if !(spec.length > 0.0 && spec.length.is_finite() && spec.height > 0.0 && spec.height.is_finite())
    {
        return Err(WorldError::InvalidWall {
            name: spec.name.clone(),
            reason: format!(
                "extents {}x{} must be positive and finite",
                spec.length, spec.height
            ),
        });
    }
    if !spec.position.is_finite() {
        return Err(WorldError::InvalidWall {
            name: spec.name.clone(),
            reason: "position must be finite".to_string(),
        });
    }
    ensure_unique(bodies, &spec.name)?;
    bodies.push(Body::wall(spec));
    walls.push(spec.clone());
    Ok(())
}

fn add_marble(
    bodies: &mut Vec<Body>,
    name: &str,
    spec: &MarbleSpec,
    diameter: f32,
) -> Result<(), WorldError> {
    if name == EXIT_NAME {
        return Err(WorldError::InvalidMarble {
            name: name.to_string(),
            reason: "'exit' is reserved for the gap".to_string(),
        });
    }
    if !spec.position.is_finite() {
        return Err(WorldError::InvalidMarble {
            name: name.to_string(),
            reason: "position must be finite".to_string(),
        });
    }
    if !spec.velocity.is_finite() {
        return Err(WorldError::InvalidMarble {
            name: name.to_string(),
            reason: "launch velocity must be finite".to_string(),
        });
    }
    ensure_unique(bodies, name)?;
    let schedule = Schedule {
        launch_step: spec.launch_step,
        launch_velocity: spec.velocity,
        noise_step: spec.noise_step,
    };
    bodies.push(Body::marble(name, spec.position, diameter).with_schedule(schedule));
    Ok(())
}
