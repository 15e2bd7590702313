//! Collider primitives and attractors.
//!
//! Every collider answers one question: where along this frame's displacement
//! does a moving point first touch me? The tests are swept, so a fast particle
//! cannot tunnel through a thin wall between two frames.
//!
//! | Shape | Valid parametric range |
//! |-------|------------------------|
//! | [`PlaneCollider`] | `t ∈ [-ε, 1)` |
//! | [`AxisBoxCollider`] | `t ∈ (ε, 1]`, or `(0, 1]` for a sink |
//! | [`SphereCollider`] | `t ∈ (ε, 1]` |

use glam::Vec3;

/// Tolerance used by all swept tests.
pub const COLLISION_EPSILON: f32 = 1e-4;

/// Attractors closer than this to a particle are ignored.
pub const ATTRACTOR_EPSILON: f32 = 1e-3;

/// What happens to a particle that touches a collider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionKind {
    /// Kill the particle on contact.
    Sink,
    /// Reflect the particle's velocity.
    Bounce,
}

/// Result of a swept test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Fraction of the displacement travelled before contact.
    pub t: f32,
    /// Contact point.
    pub point: Vec3,
    /// Unit contact normal, facing against the displacement.
    pub normal: Vec3,
}

/// Shared interface of the three collider shapes.
pub trait Collider {
    /// Sink or bounce.
    fn kind(&self) -> CollisionKind;

    /// Intersect the segment `pos .. pos + dir` with this shape.
    fn sweep(&self, pos: Vec3, dir: Vec3) -> Option<Hit>;
}

/// Flip `normal` so it faces against the motion.
fn facing(normal: Vec3, dir: Vec3) -> Vec3 {
    if normal.dot(dir) > 0.0 {
        -normal
    } else {
        normal
    }
}

/// Infinite plane through `point` with unit `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneCollider {
    pub kind: CollisionKind,
    pub point: Vec3,
    pub normal: Vec3,
}

impl PlaneCollider {
    /// Create a plane; `normal` is normalized.
    pub fn new(kind: CollisionKind, point: Vec3, normal: Vec3) -> Self {
        Self {
            kind,
            point,
            normal: normal.normalize(),
        }
    }
}

impl Collider for PlaneCollider {
    fn kind(&self) -> CollisionKind {
        self.kind
    }

    fn sweep(&self, pos: Vec3, dir: Vec3) -> Option<Hit> {
        let denom = self.normal.dot(dir);
        // Moving parallel to the plane
        if denom.abs() < COLLISION_EPSILON {
            return None;
        }

        let t = (self.point - pos).dot(self.normal) / denom;
        if t < -COLLISION_EPSILON || t >= 1.0 {
            return None;
        }

        Some(Hit {
            t,
            point: pos + dir * t,
            normal: facing(self.normal, dir),
        })
    }
}

/// Axis-aligned box between `min` and `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBoxCollider {
    pub kind: CollisionKind,
    pub min: Vec3,
    pub max: Vec3,
}

impl AxisBoxCollider {
    /// Create a box from any two opposite corners.
    pub fn new(kind: CollisionKind, a: Vec3, b: Vec3) -> Self {
        Self {
            kind,
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Whether `point` lies inside the box on every axis except `skip`.
    fn spans(&self, point: Vec3, skip: usize) -> bool {
        (0..3).filter(|&axis| axis != skip).all(|axis| {
            point[axis] >= self.min[axis] - COLLISION_EPSILON
                && point[axis] <= self.max[axis] + COLLISION_EPSILON
        })
    }
}

impl Collider for AxisBoxCollider {
    fn kind(&self) -> CollisionKind {
        self.kind
    }

    fn sweep(&self, pos: Vec3, dir: Vec3) -> Option<Hit> {
        // A sink takes any contact; a bounce skips the face it was just pushed off
        let t_min = match self.kind {
            CollisionKind::Sink => 0.0,
            CollisionKind::Bounce => COLLISION_EPSILON,
        };
        let mut best: Option<Hit> = None;

        for axis in 0..3 {
            let d = dir[axis];
            if d.abs() < COLLISION_EPSILON {
                continue;
            }

            for (face, sign) in [(self.min[axis], -1.0), (self.max[axis], 1.0)] {
                let t = (face - pos[axis]) / d;
                if t <= t_min || t > 1.0 {
                    continue;
                }

                let point = pos + dir * t;
                if !self.spans(point, axis) {
                    continue;
                }

                if best.map_or(true, |b| t < b.t) {
                    let mut normal = Vec3::ZERO;
                    normal[axis] = sign;
                    best = Some(Hit {
                        t,
                        point,
                        normal: facing(normal, dir),
                    });
                }
            }
        }

        best
    }
}

/// Solid sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereCollider {
    pub kind: CollisionKind,
    pub center: Vec3,
    pub radius: f32,
}

impl SphereCollider {
    pub fn new(kind: CollisionKind, center: Vec3, radius: f32) -> Self {
        Self {
            kind,
            center,
            radius,
        }
    }
}

impl Collider for SphereCollider {
    fn kind(&self) -> CollisionKind {
        self.kind
    }

    fn sweep(&self, pos: Vec3, dir: Vec3) -> Option<Hit> {
        let len = dir.length();
        if len < COLLISION_EPSILON {
            return None;
        }
        let ray = dir / len;

        // Closest approach of the ray to the center
        let to_center = self.center - pos;
        let t_closest = to_center.dot(ray);
        let dist_sq = to_center.length_squared() - t_closest * t_closest;
        let radius_sq = self.radius * self.radius;
        if dist_sq > radius_sq {
            return None;
        }

        let half_chord = (radius_sq - dist_sq).sqrt();
        let mut t = (t_closest - half_chord) / len;
        if t < COLLISION_EPSILON {
            t = (t_closest + half_chord) / len;
        }
        if t <= COLLISION_EPSILON || t > 1.0 {
            return None;
        }

        let point = pos + dir * t;
        let normal = (point - self.center).normalize_or_zero();
        Some(Hit {
            t,
            point,
            normal: facing(normal, dir),
        })
    }
}

/// Point that pulls particles with an inverse-distance force.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attractor {
    pub point: Vec3,
    pub strength: f32,
}

impl Attractor {
    pub fn new(point: Vec3, strength: f32) -> Self {
        Self { point, strength }
    }

    /// Force exerted on a particle at `pos`: `strength / distance` toward the point.
    pub fn force_on(&self, pos: Vec3) -> Vec3 {
        let to = self.point - pos;
        let dist = to.length();
        if dist <= ATTRACTOR_EPSILON {
            return Vec3::ZERO;
        }
        to * (self.strength / (dist * dist))
    }
}
