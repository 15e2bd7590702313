//! Particle emitters.
//!
//! An emitter fills in the full starting state of a freshly spawned particle.
//! It is chosen once when a [`ParticleSystem`](crate::ParticleSystem) is
//! configured and invoked once per spawn.
//!
//! # Emitter Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Emitter::Random`] | Random point in a box, random slow drift |
//! | [`Emitter::Fountain`] | Upward cone from a point |
//! | [`Emitter::SphereSurface`] | Point on a sphere, moving outward |
//! | [`Emitter::MeshSurface`] | Point on a triangle mesh, pushed along the face normal |
//! | [`Emitter::SphereJet`] | Narrow fast cone from a small sphere |
//!
//! # Example
//!
//! ```
//! use particle_playground::{Emitter, Vec3};
//!
//! // Fountain shooting upward
//! let fountain = Emitter::Fountain {
//!     origin: Vec3::new(0.0, -0.5, 0.0),
//!     direction: Vec3::Y,
//!     speed: 2.0,
//!     spread: 0.3,
//! };
//! # let _ = fountain;
//! ```

use std::f32::consts::TAU;
use std::sync::Arc;

use glam::{Quat, Vec2, Vec3, Vec4};
use rand::Rng;

use crate::mesh::Mesh;
use crate::particles::Particle;

/// Initial-state strategy for spawned particles.
#[derive(Clone, Debug)]
pub enum Emitter {
    /// Spawn anywhere inside a box, drifting slowly in a random direction.
    Random {
        /// Box center.
        center: Vec3,
        /// Half-size of the box on each axis.
        half_extent: Vec3,
        /// Maximum initial speed; negative counts as zero.
        speed: f32,
    },

    /// Spray from a point inside a cone.
    Fountain {
        /// Spawn position.
        origin: Vec3,
        /// Cone axis (normalized on use).
        direction: Vec3,
        /// Initial speed, jittered by ±20%.
        speed: f32,
        /// Cone half-angle in radians.
        spread: f32,
    },

    /// Spawn on a sphere surface moving radially.
    SphereSurface {
        center: Vec3,
        radius: f32,
        /// Outward speed (negative = inward).
        speed: f32,
    },

    /// Spawn on the surface of a triangle mesh.
    ///
    /// An empty mesh spawns nothing.
    MeshSurface {
        mesh: Arc<Mesh>,
        /// Speed along the face normal.
        normal_speed: f32,
    },

    /// Fast, tight jet leaving a small sphere.
    SphereJet {
        /// Center of the nozzle sphere.
        origin: Vec3,
        /// Nozzle radius.
        radius: f32,
        /// Jet axis (normalized on use).
        direction: Vec3,
        speed: f32,
        /// Cone half-angle in radians.
        spread: f32,
    },
}

impl Emitter {
    /// Short name for logs and UI.
    pub fn name(&self) -> &'static str {
        match self {
            Emitter::Random { .. } => "random",
            Emitter::Fountain { .. } => "fountain",
            Emitter::SphereSurface { .. } => "sphere surface",
            Emitter::MeshSurface { .. } => "mesh surface",
            Emitter::SphereJet { .. } => "sphere jet",
        }
    }

    /// Produce a new particle with `life = 0`.
    ///
    /// Returns `None` when the emitter has nowhere to spawn, which only
    /// happens for a mesh emitter bound to an empty mesh.
    pub fn spawn<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Particle> {
        let particle = match self {
            Emitter::Random {
                center,
                half_extent,
                speed,
            } => {
                let offset = Vec3::new(
                    rng.gen_range(-1.0..=1.0),
                    rng.gen_range(-1.0..=1.0),
                    rng.gen_range(-1.0..=1.0),
                );
                let hue = rng.gen::<f32>();
                Particle {
                    position: *center + offset * *half_extent,
                    velocity: random_unit(rng) * rng.gen_range(0.0..=speed.max(0.0)),
                    color: Vec4::new(0.4 + 0.6 * hue, 0.3, 1.0 - 0.6 * hue, 1.0),
                    size: Vec2::splat(rng.gen_range(0.01..0.02)),
                    bounce_mult: rng.gen_range(0.5..0.9),
                    ..Particle::default()
                }
            }

            Emitter::Fountain {
                origin,
                direction,
                speed,
                spread,
            } => {
                let dir = random_in_cone(rng, *direction, *spread);
                let warm = rng.gen::<f32>();
                Particle {
                    position: *origin,
                    velocity: dir * *speed * rng.gen_range(0.8..1.2),
                    color: Vec4::new(0.2 + 0.3 * warm, 0.5 + 0.3 * warm, 1.0, 1.0),
                    size: Vec2::splat(rng.gen_range(0.015..0.03)),
                    bounce_mult: rng.gen_range(0.4..0.8),
                    ..Particle::default()
                }
            }

            Emitter::SphereSurface {
                center,
                radius,
                speed,
            } => {
                let normal = random_unit(rng);
                Particle {
                    position: *center + normal * *radius,
                    velocity: normal * *speed,
                    color: Vec4::new(1.0, rng.gen_range(0.3..0.7), 0.1, 1.0),
                    size: Vec2::splat(0.02),
                    bounce_mult: 0.6,
                    ..Particle::default()
                }
            }

            Emitter::MeshSurface { mesh, normal_speed } => {
                let sample = mesh.sample_surface(rng)?;
                let shade = 0.5 + 0.5 * sample.normal.y.abs();
                Particle {
                    position: sample.point,
                    velocity: sample.normal * *normal_speed,
                    color: Vec4::new(0.3 * shade, shade, 0.6 * shade, 1.0),
                    size: Vec2::splat(0.01),
                    bounce_mult: 0.5,
                    ..Particle::default()
                }
            }

            Emitter::SphereJet {
                origin,
                radius,
                direction,
                speed,
                spread,
            } => {
                let dir = random_in_cone(rng, *direction, *spread);
                Particle {
                    position: *origin + random_unit(rng) * *radius,
                    velocity: dir * *speed,
                    color: Vec4::new(1.0, 1.0, rng.gen_range(0.6..1.0), 1.0),
                    size: Vec2::splat(0.012),
                    bounce_mult: rng.gen_range(0.7..0.95),
                    ..Particle::default()
                }
            }
        };

        Some(particle)
    }
}

/// Uniform direction on the unit sphere.
fn random_unit<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let z: f32 = rng.gen_range(-1.0..=1.0);
    let phi = rng.gen::<f32>() * TAU;
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Direction within `spread` radians of `axis`.
fn random_in_cone<R: Rng + ?Sized>(rng: &mut R, axis: Vec3, spread: f32) -> Vec3 {
    let axis = axis.normalize_or(Vec3::Y);
    let cos_max = spread.clamp(0.0, std::f32::consts::PI).cos();
    let cos_theta = rng.gen_range(cos_max..=1.0);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = rng.gen::<f32>() * TAU;

    let local = Vec3::new(sin_theta * phi.cos(), cos_theta, sin_theta * phi.sin());
    Quat::from_rotation_arc(Vec3::Y, axis) * local
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Triangle;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_negative_speed_is_still() {
        let mut rng = SmallRng::seed_from_u64(9);
        let emitter = Emitter::Random {
            center: Vec3::ZERO,
            half_extent: Vec3::ONE,
            speed: -1.0,
        };
        for _ in 0..100 {
            let p = emitter.spawn(&mut rng).unwrap();
            assert_eq!(p.velocity, Vec3::ZERO);
        }
    }

    #[test]
    fn test_fountain_stays_in_cone() {
        let mut rng = SmallRng::seed_from_u64(3);
        let emitter = Emitter::Fountain {
            origin: Vec3::ZERO,
            direction: Vec3::Y,
            speed: 2.0,
            spread: 0.3,
        };

        for _ in 0..500 {
            let p = emitter.spawn(&mut rng).unwrap();
            assert_eq!(p.life, 0.0);
            assert_eq!(p.position, Vec3::ZERO);
            let angle = p.velocity.normalize().angle_between(Vec3::Y);
            assert!(angle <= 0.3 + 1e-3, "angle {}", angle);
        }
    }

    #[test]
    fn test_sphere_surface_on_radius() {
        let mut rng = SmallRng::seed_from_u64(4);
        let emitter = Emitter::SphereSurface {
            center: Vec3::new(1.0, 0.0, 0.0),
            radius: 0.5,
            speed: 1.0,
        };

        for _ in 0..200 {
            let p = emitter.spawn(&mut rng).unwrap();
            let r = (p.position - Vec3::new(1.0, 0.0, 0.0)).length();
            assert!((r - 0.5).abs() < 1e-4);
            // Moving outward
            assert!(p.velocity.dot(p.position - Vec3::new(1.0, 0.0, 0.0)) > 0.0);
        }
    }

    #[test]
    fn test_jet_cone_follows_axis() {
        let mut rng = SmallRng::seed_from_u64(5);
        let emitter = Emitter::SphereJet {
            origin: Vec3::ZERO,
            radius: 0.05,
            direction: Vec3::new(1.0, 0.0, 0.0),
            speed: 5.0,
            spread: 0.1,
        };

        for _ in 0..200 {
            let p = emitter.spawn(&mut rng).unwrap();
            assert!(p.velocity.normalize().angle_between(Vec3::X) <= 0.1 + 1e-3);
            assert!((p.velocity.length() - 5.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_random_stays_in_box() {
        let mut rng = SmallRng::seed_from_u64(6);
        let emitter = Emitter::Random {
            center: Vec3::ZERO,
            half_extent: Vec3::new(1.0, 0.5, 0.25),
            speed: 0.1,
        };

        for _ in 0..200 {
            let p = emitter.spawn(&mut rng).unwrap();
            assert!(p.position.abs().cmple(Vec3::new(1.0, 0.5, 0.25)).all());
            assert!(p.velocity.length() <= 0.1 + 1e-5);
        }
    }

    #[test]
    fn test_mesh_surface_uses_face_normal() {
        let mesh = Mesh::from_triangles(vec![Triangle::flat(Vec3::ZERO, Vec3::Z, Vec3::X)]);
        let emitter = Emitter::MeshSurface {
            mesh: Arc::new(mesh),
            normal_speed: 0.2,
        };
        let mut rng = SmallRng::seed_from_u64(8);

        let p = emitter.spawn(&mut rng).unwrap();
        assert!((p.velocity - Vec3::Y * 0.2).length() < 1e-5);
    }

    #[test]
    fn test_empty_mesh_spawns_nothing() {
        let emitter = Emitter::MeshSurface {
            mesh: Arc::new(Mesh::empty()),
            normal_speed: 0.2,
        };
        let mut rng = SmallRng::seed_from_u64(9);
        assert!(emitter.spawn(&mut rng).is_none());
    }
}
