//! The particle pool and simulation engine.
//!
//! A [`ParticleSystem`] owns a fixed-capacity array of [`Particle`]s. The
//! first [`active`](ParticleSystem::active) slots are live; everything past
//! that is scratch. Each [`step`](ParticleSystem::step) runs two full passes
//! over the live range:
//!
//! 1. **Forces**: age, drag, attractors and (grid mode) Hooke springs update
//!    velocities. Positions are left alone so every spring reads the same
//!    frame's neighbor positions.
//! 2. **Collisions**: a swept test of this frame's displacement against
//!    every collider, then position integration.
//!
//! In free mode a lifecycle pass follows: expired particles are removed by
//! swapping in the last live particle (so indices are not stable across
//! steps), then the fractional spawn budget emits new particles.
//!
//! Grid mode is a cloth-like lattice of immortal particles joined by springs
//! to their four axis neighbors. Nothing spawns or expires.
//!
//! # Example
//!
//! ```
//! use particle_playground::{CollisionKind, Emitter, ParticleSystem, PlaneCollider, SystemConfig, Vec3};
//!
//! let mut system = ParticleSystem::with_seed(7);
//! system.configure(
//!     SystemConfig::free(
//!         500.0,
//!         2.0,
//!         Emitter::Fountain {
//!             origin: Vec3::ZERO,
//!             direction: Vec3::Y,
//!             speed: 2.0,
//!             spread: 0.3,
//!         },
//!     )
//!     .with_gravity(Vec3::new(0.0, -9.8, 0.0))
//!     .with_plane(PlaneCollider::new(CollisionKind::Bounce, Vec3::new(0.0, -1.0, 0.0), Vec3::Y)),
//! );
//!
//! for _ in 0..60 {
//!     system.step(1.0 / 60.0);
//! }
//! assert!(system.active() > 0);
//! ```

use glam::{Vec2, Vec3, Vec4};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::collider::{
    Attractor, AxisBoxCollider, Collider, CollisionKind, Hit, PlaneCollider, SphereCollider,
};
use crate::emitter::Emitter;
use crate::mesh::Mesh;

/// Hard upper bound on pool capacity.
pub const MAX_PARTICLES: usize = 100_000;
pub const MAX_ATTRACTORS: usize = 8;
pub const MAX_PLANE_COLLIDERS: usize = 8;
pub const MAX_BOX_COLLIDERS: usize = 8;
pub const MAX_SPHERE_COLLIDERS: usize = 8;
/// Most particles a single step may spawn.
pub const MAX_SPAWN_PER_FRAME: usize = 2_000;
/// Distance a bounced particle is pushed off the surface it hit.
pub const BOUNCE_MARGIN: f32 = 1e-3;
/// How far past `max_life` a sunk particle's life is set.
pub const SINK_EPSILON: f32 = 1e-3;

/// A single simulated particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Seconds since spawn.
    pub life: f32,
    pub position: Vec3,
    pub velocity: Vec3,
    /// RGBA; alpha fades with age in free mode.
    pub color: Vec4,
    /// Billboard half-extents.
    pub size: Vec2,
    /// Restitution applied to the normal velocity on a bounce.
    pub bounce_mult: f32,
    /// Scale applied to the tangential velocity on a bounce.
    pub friction_mult: f32,
    /// Clip-space z before the perspective divide, refreshed by the render
    /// feed. Larger is farther from the camera.
    pub depth: f32,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            life: 0.0,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            color: Vec4::ONE,
            size: Vec2::splat(0.02),
            bounce_mult: 0.5,
            friction_mult: 1.0,
            depth: 0.0,
        }
    }
}

/// Layout and springs of a grid-mode lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
    /// Position of cell (0, 0).
    pub origin: Vec3,
    /// Offset between neighboring columns.
    pub stride_x: Vec3,
    /// Offset between neighboring rows.
    pub stride_y: Vec3,
    pub hooke_strength: f32,
    /// Spring rest length.
    pub hooke_eq_dist: f32,
}

impl GridConfig {
    /// Number of lattice cells.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Free-stream or lattice behavior.
#[derive(Debug, Clone)]
pub enum Mode {
    /// Particles spawn at a steady rate and die after `max_life` seconds.
    Free {
        particles_per_sec: f32,
        max_life: f32,
        emitter: Emitter,
    },
    /// Permanent spring-connected lattice.
    Grid(GridConfig),
}

/// Everything [`ParticleSystem::configure`] needs.
///
/// Built with [`SystemConfig::free`] or [`SystemConfig::grid`] and the
/// `with_*` methods.
#[derive(Debug, Clone)]
pub struct SystemConfig {
    pub mode: Mode,
    /// Pool size; at most [`MAX_PARTICLES`].
    pub capacity: usize,
    pub gravity: Vec3,
    pub linear_damp: f32,
    pub quadratic_damp: f32,
    pub attractors: Vec<Attractor>,
    pub planes: Vec<PlaneCollider>,
    pub boxes: Vec<AxisBoxCollider>,
    pub spheres: Vec<SphereCollider>,
    /// Logical path of the billboard texture.
    pub texture: Option<String>,
}

impl SystemConfig {
    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            capacity: MAX_PARTICLES,
            gravity: Vec3::ZERO,
            linear_damp: 0.0,
            quadratic_damp: 0.0,
            attractors: Vec::new(),
            planes: Vec::new(),
            boxes: Vec::new(),
            spheres: Vec::new(),
            texture: None,
        }
    }

    /// A spawning/expiring particle stream.
    pub fn free(particles_per_sec: f32, max_life: f32, emitter: Emitter) -> Self {
        Self::with_mode(Mode::Free {
            particles_per_sec,
            max_life,
            emitter,
        })
    }

    /// A spring lattice; capacity is sized to fit it.
    pub fn grid(grid: GridConfig) -> Self {
        let capacity = grid.len();
        Self {
            capacity,
            ..Self::with_mode(Mode::Grid(grid))
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Drag is `(linear + quadratic * |v|) * v`.
    pub fn with_damping(mut self, linear: f32, quadratic: f32) -> Self {
        self.linear_damp = linear;
        self.quadratic_damp = quadratic;
        self
    }

    pub fn with_attractor(mut self, attractor: Attractor) -> Self {
        self.attractors.push(attractor);
        self
    }

    pub fn with_plane(mut self, plane: PlaneCollider) -> Self {
        self.planes.push(plane);
        self
    }

    pub fn with_box(mut self, aabb: AxisBoxCollider) -> Self {
        self.boxes.push(aabb);
        self
    }

    pub fn with_sphere(mut self, sphere: SphereCollider) -> Self {
        self.spheres.push(sphere);
        self
    }

    pub fn with_texture(mut self, path: impl Into<String>) -> Self {
        self.texture = Some(path.into());
        self
    }

    pub fn is_grid(&self) -> bool {
        matches!(self.mode, Mode::Grid(_))
    }

    /// The mesh a mesh-surface emitter samples, if any.
    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.mode {
            Mode::Free {
                emitter: Emitter::MeshSurface { mesh, .. },
                ..
            } => Some(mesh),
            _ => None,
        }
    }
}

impl Default for SystemConfig {
    /// An empty free-mode system that never spawns.
    fn default() -> Self {
        Self::free(
            0.0,
            1.0,
            Emitter::Random {
                center: Vec3::ZERO,
                half_extent: Vec3::ONE,
                speed: 0.0,
            },
        )
        .with_capacity(0)
    }
}

/// Fixed-capacity particle pool.
pub struct ParticleSystem {
    pub(crate) particles: Vec<Particle>,
    pub(crate) active: usize,
    spawn_counter: f32,
    pub(crate) config: SystemConfig,
    rng: SmallRng,
}

impl ParticleSystem {
    /// An unconfigured system with a time-based seed.
    pub fn new() -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::with_seed(seed)
    }

    /// An unconfigured system with a fixed seed; spawning is reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            particles: Vec::new(),
            active: 0,
            spawn_counter: 0.0,
            config: SystemConfig::default(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Replace the whole configuration and reset all particles.
    ///
    /// # Panics
    ///
    /// If the capacity exceeds [`MAX_PARTICLES`], a collider or attractor
    /// list exceeds its maximum, or a grid does not fit in the capacity.
    pub fn configure(&mut self, config: SystemConfig) {
        assert!(
            config.capacity <= MAX_PARTICLES,
            "capacity {} exceeds MAX_PARTICLES ({})",
            config.capacity,
            MAX_PARTICLES
        );
        assert!(config.attractors.len() <= MAX_ATTRACTORS, "too many attractors");
        assert!(config.planes.len() <= MAX_PLANE_COLLIDERS, "too many plane colliders");
        assert!(config.boxes.len() <= MAX_BOX_COLLIDERS, "too many box colliders");
        assert!(config.spheres.len() <= MAX_SPHERE_COLLIDERS, "too many sphere colliders");

        self.particles.clear();
        self.particles.resize(config.capacity, Particle::default());
        self.active = 0;
        self.spawn_counter = 0.0;

        if let Mode::Grid(grid) = &config.mode {
            assert!(
                grid.len() <= config.capacity,
                "{}x{} grid does not fit in capacity {}",
                grid.width,
                grid.height,
                config.capacity
            );

            for y in 0..grid.height {
                for x in 0..grid.width {
                    self.particles[y * grid.width + x] = Particle {
                        position: grid.origin
                            + grid.stride_x * x as f32
                            + grid.stride_y * y as f32,
                        color: Vec4::new(0.9, 0.9, 1.0, 1.0),
                        size: Vec2::splat(0.01),
                        bounce_mult: 0.0,
                        friction_mult: 0.25,
                        ..Particle::default()
                    };
                }
            }
            self.active = grid.len();
        }

        log::debug!(
            "Configured particle system: {} mode, capacity {}, {} planes, {} boxes, {} spheres, {} attractors",
            if config.is_grid() { "grid" } else { "free" },
            config.capacity,
            config.planes.len(),
            config.boxes.len(),
            config.spheres.len(),
            config.attractors.len()
        );

        self.config = config;
    }

    /// Number of live particles.
    pub fn active(&self) -> usize {
        self.active
    }

    /// The live particles, in no particular order.
    pub fn particles(&self) -> &[Particle] {
        &self.particles[..self.active]
    }

    /// Pool capacity of the current configuration.
    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    /// Unspent fractional spawn budget.
    pub fn spawn_counter(&self) -> f32 {
        self.spawn_counter
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn is_grid(&self) -> bool {
        self.config.is_grid()
    }

    /// Lifetime in free mode; grid particles never expire.
    pub fn max_life(&self) -> f32 {
        match &self.config.mode {
            Mode::Free { max_life, .. } => *max_life,
            Mode::Grid(_) => f32::INFINITY,
        }
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.apply_forces(dt);
        self.resolve_and_integrate(dt);
        if !self.is_grid() {
            self.compact();
            self.spawn(dt);
        }
    }

    /// Pass 1: velocities only.
    fn apply_forces(&mut self, dt: f32) {
        let config = &self.config;
        let max_life = match &config.mode {
            Mode::Free { max_life, .. } => Some(*max_life),
            Mode::Grid(_) => None,
        };

        for i in 0..self.active {
            let p = &self.particles[i];
            let speed = p.velocity.length();
            let damp = (config.linear_damp + config.quadratic_damp * speed) * p.velocity;

            let attraction: Vec3 = config
                .attractors
                .iter()
                .map(|a| a.force_on(p.position))
                .sum();

            let spring = match &config.mode {
                Mode::Grid(grid) => spring_force(&self.particles, grid, i),
                Mode::Free { .. } => Vec3::ZERO,
            };

            let p = &mut self.particles[i];
            p.life += dt;
            p.velocity += (config.gravity + attraction + spring - damp) * dt;

            if let Some(max_life) = max_life {
                p.color.w = (1.0 - p.life / max_life).max(0.0).sqrt();
            }
        }
    }

    /// Pass 2: collisions, then positions.
    fn resolve_and_integrate(&mut self, dt: f32) {
        let config = &self.config;
        let sunk_life = self.max_life() + SINK_EPSILON;

        for p in self.particles[..self.active].iter_mut() {
            let mut outcome = Outcome::Free;

            // Planes apply the first valid hit in list order.
            let plane_hit = config
                .planes
                .iter()
                .find_map(|c| c.sweep(p.position, p.velocity * dt).map(|h| (c.kind(), h)));
            outcome = outcome.merge(resolve(p, plane_hit, sunk_life));

            if outcome != Outcome::Sunk {
                let hit = nearest_hit(&config.boxes, p.position, p.velocity * dt);
                outcome = outcome.merge(resolve(p, hit, sunk_life));
            }

            if outcome != Outcome::Sunk {
                let hit = nearest_hit(&config.spheres, p.position, p.velocity * dt);
                outcome = outcome.merge(resolve(p, hit, sunk_life));
            }

            if outcome == Outcome::Free {
                p.position += p.velocity * dt;
            }
        }
    }

    /// Swap-remove every expired particle.
    fn compact(&mut self) {
        let max_life = self.max_life();
        let mut i = 0;
        while i < self.active {
            if self.particles[i].life > max_life {
                self.active -= 1;
                self.particles[i] = self.particles[self.active];
            } else {
                i += 1;
            }
        }
    }

    fn spawn(&mut self, dt: f32) {
        let Mode::Free {
            particles_per_sec,
            emitter,
            ..
        } = &self.config.mode
        else {
            return;
        };

        self.spawn_counter += particles_per_sec * dt;
        let room = self.particles.len().saturating_sub(self.active + 1);
        let count = (self.spawn_counter.max(0.0).floor() as usize)
            .min(MAX_SPAWN_PER_FRAME)
            .min(room);
        // Unspent budget carries over, at most one frame's worth
        self.spawn_counter = (self.spawn_counter - count as f32).min(MAX_SPAWN_PER_FRAME as f32 + 1.0);

        for _ in 0..count {
            if let Some(particle) = emitter.spawn(&mut self.rng) {
                self.particles[self.active] = particle;
                self.active += 1;
            }
        }
    }
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ParticleSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleSystem")
            .field("active", &self.active)
            .field("capacity", &self.particles.len())
            .field("spawn_counter", &self.spawn_counter)
            .field("mode", &self.config.mode)
            .finish()
    }
}

/// What collision handling did to a particle this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Free,
    Bounced,
    Sunk,
}

impl Outcome {
    fn merge(self, other: Outcome) -> Outcome {
        match (self, other) {
            (Outcome::Sunk, _) | (_, Outcome::Sunk) => Outcome::Sunk,
            (Outcome::Bounced, _) | (_, Outcome::Bounced) => Outcome::Bounced,
            _ => Outcome::Free,
        }
    }
}

/// Minimum-t hit among `colliders`.
fn nearest_hit<C: Collider>(colliders: &[C], pos: Vec3, dir: Vec3) -> Option<(CollisionKind, Hit)> {
    colliders
        .iter()
        .filter_map(|c| c.sweep(pos, dir).map(|h| (c.kind(), h)))
        .fold(None, |best: Option<(CollisionKind, Hit)>, cand| match best {
            Some(b) if b.1.t <= cand.1.t => Some(b),
            _ => Some(cand),
        })
}

fn resolve(p: &mut Particle, hit: Option<(CollisionKind, Hit)>, sunk_life: f32) -> Outcome {
    let Some((kind, hit)) = hit else {
        return Outcome::Free;
    };

    match kind {
        CollisionKind::Sink => {
            p.life = sunk_life;
            Outcome::Sunk
        }
        CollisionKind::Bounce => {
            let normal_vel = hit.normal * p.velocity.dot(hit.normal);
            let tangent_vel = p.velocity - normal_vel;
            p.velocity = tangent_vel * p.friction_mult - normal_vel * p.bounce_mult;
            p.position = hit.point + hit.normal * BOUNCE_MARGIN;
            Outcome::Bounced
        }
    }
}

/// Hooke force on lattice cell `i` from its four axis neighbors.
fn spring_force(particles: &[Particle], grid: &GridConfig, i: usize) -> Vec3 {
    let x = i % grid.width;
    let y = i / grid.width;
    let pos = particles[i].position;

    let neighbors = [
        (x > 0).then(|| i - 1),
        (x + 1 < grid.width).then(|| i + 1),
        (y > 0).then(|| i - grid.width),
        (y + 1 < grid.height).then(|| i + grid.width),
    ];

    neighbors
        .into_iter()
        .flatten()
        .map(|n| {
            let to = particles[n].position - pos;
            let dist = to.length();
            if dist <= crate::collider::COLLISION_EPSILON {
                return Vec3::ZERO;
            }
            to / dist * (grid.hooke_strength * (dist - grid.hooke_eq_dist))
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn still_emitter(at: Vec3) -> Emitter {
        Emitter::Random {
            center: at,
            half_extent: Vec3::ZERO,
            speed: 0.0,
        }
    }

    fn single(system: &mut ParticleSystem, particle: Particle) {
        system.particles[0] = particle;
        system.active = 1;
    }

    #[test]
    fn test_plane_bounce_scenario() {
        let mut system = ParticleSystem::with_seed(1);
        system.configure(
            SystemConfig::free(0.0, 10.0, still_emitter(Vec3::ZERO))
                .with_capacity(16)
                .with_plane(PlaneCollider::new(CollisionKind::Bounce, Vec3::ZERO, Vec3::Y)),
        );
        single(
            &mut system,
            Particle {
                position: Vec3::new(0.0, 0.05, 0.0),
                velocity: Vec3::new(0.0, -10.0, 0.0),
                bounce_mult: 1.0,
                ..Particle::default()
            },
        );

        system.step(0.1);

        let p = system.particles()[0];
        assert!((p.velocity - Vec3::new(0.0, 10.0, 0.0)).length() < 1e-4);
        assert!(p.position.y > 0.0);
        assert!((p.position.y - BOUNCE_MARGIN).abs() < 1e-5);
    }

    #[test]
    fn test_bounce_scales_tangent_by_friction() {
        let mut system = ParticleSystem::with_seed(1);
        system.configure(
            SystemConfig::free(0.0, 10.0, still_emitter(Vec3::ZERO))
                .with_capacity(4)
                .with_plane(PlaneCollider::new(CollisionKind::Bounce, Vec3::ZERO, Vec3::Y)),
        );
        single(
            &mut system,
            Particle {
                position: Vec3::new(0.0, 0.1, 0.0),
                velocity: Vec3::new(2.0, -2.0, 0.0),
                bounce_mult: 0.5,
                friction_mult: 0.25,
                ..Particle::default()
            },
        );

        system.step(0.1);
        let p = system.particles()[0];
        assert!((p.velocity - Vec3::new(0.5, 1.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_sink_removes_within_one_step() {
        let mut system = ParticleSystem::with_seed(1);
        system.configure(
            SystemConfig::free(0.0, 10.0, still_emitter(Vec3::ZERO))
                .with_capacity(16)
                .with_plane(PlaneCollider::new(CollisionKind::Sink, Vec3::ZERO, Vec3::Y)),
        );
        single(
            &mut system,
            Particle {
                position: Vec3::new(0.0, 0.05, 0.0),
                velocity: Vec3::new(0.0, -1.0, 0.0),
                ..Particle::default()
            },
        );

        system.step(0.1);
        assert_eq!(system.active(), 0);
    }

    #[test]
    fn test_box_sink_near_edge() {
        let mut system = ParticleSystem::with_seed(1);
        system.configure(
            SystemConfig::free(0.0, 10.0, still_emitter(Vec3::ZERO))
                .with_capacity(16)
                .with_box(AxisBoxCollider::new(
                    CollisionKind::Sink,
                    Vec3::new(0.0, -1.0, -1.0),
                    Vec3::new(1.0, 1.0, 1.0),
                )),
        );
        single(
            &mut system,
            Particle {
                position: Vec3::new(-0.01, 0.99, 0.0),
                velocity: Vec3::new(1.0, 0.0, 0.0),
                ..Particle::default()
            },
        );

        system.apply_forces(0.1);
        system.resolve_and_integrate(0.1);
        assert!(system.particles[0].life > system.max_life());
    }

    #[test]
    fn test_saturated_pool_backlog_is_bounded() {
        let mut system = ParticleSystem::with_seed(1);
        system.configure(SystemConfig::free(1_000_000.0, 100.0, still_emitter(Vec3::ZERO)).with_capacity(8));

        for _ in 0..100 {
            system.step(0.1);
        }
        assert_eq!(system.active(), 7);
        assert!(system.spawn_counter() <= MAX_SPAWN_PER_FRAME as f32 + 1.0);
    }

    fn box_sink_system() -> ParticleSystem {
        let mut system = ParticleSystem::with_seed(1);
        system.configure(
            SystemConfig::free(0.0, 10.0, still_emitter(Vec3::new(5.0, 5.0, 5.0)))
                .with_capacity(16)
                .with_box(AxisBoxCollider::new(
                    CollisionKind::Sink,
                    Vec3::new(0.0, -1.0, -1.0),
                    Vec3::new(1.0, 1.0, 1.0),
                )),
        );
        system
    }

    #[test]
    fn test_box_sink_tiny_entry_t() {
        let mut system = box_sink_system();
        single(
            &mut system,
            Particle {
                position: Vec3::new(-5e-5, 0.0, 0.0),
                velocity: Vec3::new(10.0, 0.0, 0.0),
                ..Particle::default()
            },
        );

        // Entry at t = 5e-5
        system.apply_forces(0.1);
        system.resolve_and_integrate(0.1);
        assert!(system.particles[0].life > system.max_life());
    }

    #[test]
    fn test_box_sink_catches_particle_leaving_it() {
        let mut system = box_sink_system();
        single(
            &mut system,
            Particle {
                position: Vec3::new(0.5, 0.0, 0.0),
                velocity: Vec3::new(10.0, 0.0, 0.0),
                ..Particle::default()
            },
        );

        system.apply_forces(0.1);
        system.resolve_and_integrate(0.1);
        assert!(system.particles[0].life > system.max_life());
    }

    #[test]
    fn test_sphere_bounce_reflects_radially() {
        let mut system = ParticleSystem::with_seed(1);
        system.configure(
            SystemConfig::free(0.0, 10.0, still_emitter(Vec3::ZERO))
                .with_capacity(4)
                .with_sphere(SphereCollider::new(CollisionKind::Bounce, Vec3::ZERO, 0.5)),
        );
        single(
            &mut system,
            Particle {
                position: Vec3::new(1.0, 0.0, 0.0),
                velocity: Vec3::new(-10.0, 0.0, 0.0),
                bounce_mult: 1.0,
                ..Particle::default()
            },
        );

        system.step(0.1);
        let p = system.particles()[0];
        assert!(p.velocity.x > 9.99);
        assert!((p.position.x - (0.5 + BOUNCE_MARGIN)).abs() < 1e-4);
    }

    #[test]
    fn test_first_plane_wins_even_if_farther() {
        // Planes do not pick the nearest hit: the first listed plane that
        // reports a valid hit is applied, which can leave the nearer one unresolved.
        let far = PlaneCollider::new(CollisionKind::Bounce, Vec3::new(0.0, -0.5, 0.0), Vec3::Y);
        let near = PlaneCollider::new(CollisionKind::Sink, Vec3::new(0.0, -0.1, 0.0), Vec3::Y);

        let mut system = ParticleSystem::with_seed(1);
        system.configure(
            SystemConfig::free(0.0, 10.0, still_emitter(Vec3::ZERO))
                .with_capacity(4)
                .with_plane(far)
                .with_plane(near),
        );
        single(
            &mut system,
            Particle {
                velocity: Vec3::new(0.0, -10.0, 0.0),
                ..Particle::default()
            },
        );

        system.step(0.1);
        assert_eq!(system.active(), 1);
        assert!(system.particles()[0].velocity.y > 0.0);
    }

    #[test]
    fn test_nearest_box_wins() {
        let far = AxisBoxCollider::new(CollisionKind::Bounce, Vec3::new(0.5, -1.0, -1.0), Vec3::new(2.0, 1.0, 1.0));
        let near = AxisBoxCollider::new(CollisionKind::Sink, Vec3::new(0.2, -1.0, -1.0), Vec3::new(0.3, 1.0, 1.0));

        let mut system = ParticleSystem::with_seed(1);
        system.configure(
            SystemConfig::free(0.0, 10.0, still_emitter(Vec3::ZERO))
                .with_capacity(4)
                .with_box(far)
                .with_box(near),
        );
        single(
            &mut system,
            Particle {
                velocity: Vec3::new(10.0, 0.0, 0.0),
                ..Particle::default()
            },
        );

        system.step(0.1);
        assert_eq!(system.active(), 0);
    }

    #[test]
    fn test_active_leaves_one_free_slot() {
        let mut system = ParticleSystem::with_seed(2);
        system.configure(SystemConfig::free(1.0e6, 100.0, still_emitter(Vec3::ZERO)).with_capacity(50));

        for _ in 0..10 {
            system.step(0.1);
            assert!(system.active() <= system.capacity() - 1);
        }
        assert_eq!(system.active(), 49);
    }

    #[test]
    fn test_burst_is_capped_per_frame() {
        let mut system = ParticleSystem::with_seed(2);
        system.configure(SystemConfig::free(1.0e6, 100.0, still_emitter(Vec3::ZERO)));

        system.step(0.1);
        assert_eq!(system.active(), MAX_SPAWN_PER_FRAME);
    }

    #[test]
    fn test_spawn_counter_carries_fraction() {
        let mut system = ParticleSystem::with_seed(2);
        system.configure(SystemConfig::free(10.0, 100.0, still_emitter(Vec3::ZERO)).with_capacity(100));

        let mut counts = Vec::new();
        for _ in 0..20 {
            system.step(0.05);
            counts.push(system.active());
        }

        assert_eq!(system.active(), 10);
        // One particle every other frame
        for pair in counts.windows(2) {
            assert!(pair[1] - pair[0] <= 1);
        }
        assert!(system.spawn_counter() < 1.0);
    }

    #[test]
    fn test_particles_expire() {
        let mut system = ParticleSystem::with_seed(2);
        system.configure(SystemConfig::free(100.0, 0.5, still_emitter(Vec3::ZERO)).with_capacity(1000));

        for _ in 0..100 {
            system.step(0.02);
            assert!(system.particles().iter().all(|p| p.life <= 0.5));
        }
        // Steady state is about rate * lifetime
        assert!(system.active() >= 45 && system.active() <= 52, "{}", system.active());
    }

    #[test]
    fn test_alpha_fades_with_life() {
        let mut system = ParticleSystem::with_seed(2);
        system.configure(SystemConfig::free(0.0, 4.0, still_emitter(Vec3::ZERO)).with_capacity(4));
        single(&mut system, Particle::default());

        system.step(1.0);
        assert!((system.particles()[0].color.w - 0.75f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_drag_opposes_velocity() {
        let mut system = ParticleSystem::with_seed(2);
        system.configure(
            SystemConfig::free(0.0, 10.0, still_emitter(Vec3::ZERO))
                .with_capacity(4)
                .with_damping(0.5, 0.1),
        );
        single(
            &mut system,
            Particle {
                velocity: Vec3::new(2.0, 0.0, 0.0),
                ..Particle::default()
            },
        );

        system.step(0.1);
        // (0.5 + 0.1 * 2) * 2 = 1.4, times dt
        assert!((system.particles()[0].velocity.x - (2.0 - 0.14)).abs() < 1e-5);
    }

    #[test]
    fn test_attractor_pulls() {
        let mut system = ParticleSystem::with_seed(2);
        system.configure(
            SystemConfig::free(0.0, 10.0, still_emitter(Vec3::ZERO))
                .with_capacity(4)
                .with_attractor(Attractor::new(Vec3::ZERO, 1.0)),
        );
        single(
            &mut system,
            Particle {
                position: Vec3::new(2.0, 0.0, 0.0),
                ..Particle::default()
            },
        );

        system.step(0.1);
        assert!((system.particles()[0].velocity.x + 0.05).abs() < 1e-5);
    }

    fn cloth(width: usize, height: usize) -> SystemConfig {
        SystemConfig::grid(GridConfig {
            width,
            height,
            origin: Vec3::new(-0.5, 0.5, -0.5),
            stride_x: Vec3::new(0.1, 0.0, 0.0),
            stride_y: Vec3::new(0.0, 0.0, 0.1),
            hooke_strength: 50.0,
            hooke_eq_dist: 0.1,
        })
        .with_gravity(Vec3::new(0.0, -9.8, 0.0))
        .with_plane(PlaneCollider::new(CollisionKind::Bounce, Vec3::new(0.0, -1.0, 0.0), Vec3::Y))
    }

    #[test]
    fn test_grid_populates_lattice() {
        let mut system = ParticleSystem::with_seed(3);
        system.configure(cloth(4, 3));

        assert_eq!(system.active(), 12);
        let p = system.particles()[2 * 4 + 3];
        assert!((p.position - Vec3::new(-0.2, 0.5, -0.3)).length() < 1e-5);
        assert_eq!(p.velocity, Vec3::ZERO);
        assert_eq!(p.bounce_mult, 0.0);
        assert_eq!(p.friction_mult, 0.25);
    }

    #[test]
    fn test_grid_active_is_constant() {
        let mut system = ParticleSystem::with_seed(3);
        system.configure(cloth(8, 8));

        for _ in 0..300 {
            system.step(1.0 / 60.0);
            assert_eq!(system.active(), 64);
        }
        assert!(system.particles().iter().all(|p| p.position.y >= -1.0));
    }

    #[test]
    fn test_stretched_spring_pulls_neighbors_together() {
        let mut system = ParticleSystem::with_seed(3);
        system.configure(
            SystemConfig::grid(GridConfig {
                width: 2,
                height: 1,
                origin: Vec3::ZERO,
                stride_x: Vec3::new(1.0, 0.0, 0.0),
                stride_y: Vec3::Z,
                hooke_strength: 2.0,
                hooke_eq_dist: 0.5,
            }),
        );

        system.step(0.1);
        let [a, b] = [system.particles()[0], system.particles()[1]];
        assert!((a.velocity.x - 0.1).abs() < 1e-5);
        assert!((b.velocity.x + 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_zero_step_is_idempotent() {
        let mut system = ParticleSystem::with_seed(3);
        system.configure(cloth(6, 6));
        let before = system.particles().to_vec();

        system.step(0.0);
        assert_eq!(system.particles(), &before[..]);

        let mut free = ParticleSystem::with_seed(3);
        free.configure(SystemConfig::free(100.0, 1.0, still_emitter(Vec3::ZERO)).with_capacity(64));
        free.step(0.0);
        assert_eq!(free.active(), 0);
        assert_eq!(free.spawn_counter(), 0.0);
    }

    #[test]
    fn test_reconfigure_resets() {
        let mut system = ParticleSystem::with_seed(3);
        system.configure(SystemConfig::free(100.0, 1.0, still_emitter(Vec3::ZERO)).with_capacity(64));
        system.step(0.125);
        assert!(system.active() > 0);

        system.configure(SystemConfig::free(100.0, 1.0, still_emitter(Vec3::ZERO)).with_capacity(32));
        assert_eq!(system.active(), 0);
        assert_eq!(system.spawn_counter(), 0.0);
        assert_eq!(system.capacity(), 32);
    }

    #[test]
    fn test_empty_mesh_consumes_budget() {
        let mut system = ParticleSystem::with_seed(3);
        system.configure(
            SystemConfig::free(
                100.0,
                1.0,
                Emitter::MeshSurface {
                    mesh: Arc::new(Mesh::empty()),
                    normal_speed: 0.1,
                },
            )
            .with_capacity(64),
        );

        system.step(0.1);
        assert_eq!(system.active(), 0);
        assert!(system.spawn_counter() < 1.0);
    }

    #[test]
    #[should_panic(expected = "too many plane colliders")]
    fn test_too_many_planes_panics() {
        let mut config = SystemConfig::free(1.0, 1.0, still_emitter(Vec3::ZERO)).with_capacity(4);
        for _ in 0..=MAX_PLANE_COLLIDERS {
            config = config.with_plane(PlaneCollider::new(CollisionKind::Sink, Vec3::ZERO, Vec3::Y));
        }
        ParticleSystem::with_seed(0).configure(config);
    }

    #[test]
    #[should_panic(expected = "exceeds MAX_PARTICLES")]
    fn test_capacity_over_max_panics() {
        ParticleSystem::with_seed(0)
            .configure(SystemConfig::free(1.0, 1.0, still_emitter(Vec3::ZERO)).with_capacity(MAX_PARTICLES + 1));
    }
}
