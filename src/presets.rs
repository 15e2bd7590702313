//! The preset table and the controller that applies it.
//!
//! Each [`Preset`] is a canned particle-system setup: emitter, forces,
//! colliders and texture. The [`ScenarioController`] is the only code that
//! builds a [`SystemConfig`] for the running app, so collider and attractor
//! data never change in the middle of a step.

use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::assets::AssetSource;
use crate::collider::{Attractor, AxisBoxCollider, CollisionKind, PlaneCollider, SphereCollider};
use crate::emitter::Emitter;
use crate::mesh::Mesh;
use crate::particles::{GridConfig, ParticleSystem, SystemConfig, MAX_PARTICLES};

/// Texture used by most presets.
pub const DEFAULT_TEXTURE: &str = "textures/base.png";

const GROUND_Y: f32 = -1.0;
const GRAVITY: Vec3 = Vec3::new(0.0, -4.9, 0.0);
const CLOTH_SIZE: usize = 64;
const CLOTH_EXTENT: f32 = 1.6;

/// Selectable demo scenarios, in UI order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preset {
    SphereBurst,
    FountainSink,
    FountainBounce,
    BoxColliders,
    SphereJet,
    AttractorSwirl,
    MeshSurface,
    Cloth,
}

impl Preset {
    /// Every preset, indexed by its UI position.
    pub const ALL: [Preset; 8] = [
        Preset::SphereBurst,
        Preset::FountainSink,
        Preset::FountainBounce,
        Preset::BoxColliders,
        Preset::SphereJet,
        Preset::AttractorSwirl,
        Preset::MeshSurface,
        Preset::Cloth,
    ];

    pub fn from_index(index: usize) -> Option<Preset> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Button text.
    pub fn label(self) -> &'static str {
        match self {
            Preset::SphereBurst => "Sphere burst",
            Preset::FountainSink => "Fountain (sink)",
            Preset::FountainBounce => "Fountain (bounce)",
            Preset::BoxColliders => "Box colliders",
            Preset::SphereJet => "Sphere jet",
            Preset::AttractorSwirl => "Attractors",
            Preset::MeshSurface => "Mesh surface",
            Preset::Cloth => "Cloth",
        }
    }

    /// Logical path of the billboard texture.
    pub fn texture(self) -> &'static str {
        match self {
            Preset::Cloth => "textures/cloth.png",
            _ => DEFAULT_TEXTURE,
        }
    }
}

/// Passed to the app when the active preset changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetChange {
    /// `None` for the first preset applied at startup.
    pub from: Option<Preset>,
    pub to: Preset,
}

/// Request to re-read the emission mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshReload {
    pub path: String,
}

/// A mesh the renderer should draw this frame.
#[derive(Debug, Clone)]
pub struct VisualMesh {
    pub mesh: Arc<Mesh>,
    pub transform: Mat4,
    pub color: Vec4,
}

/// Owns the per-preset data and reconfigures the particle pool.
#[derive(Debug)]
pub struct ScenarioController {
    current: Option<Preset>,
    capacity: usize,
    emission_mesh: Arc<Mesh>,
    sphere_mesh: Arc<Mesh>,
    texture_override: Option<String>,
}

impl ScenarioController {
    /// `capacity` bounds free-mode presets and is clamped to [`MAX_PARTICLES`].
    pub fn new(capacity: usize, emission_mesh: Mesh, sphere_mesh: Mesh) -> Self {
        Self {
            current: None,
            capacity: capacity.min(MAX_PARTICLES),
            emission_mesh: Arc::new(emission_mesh),
            sphere_mesh: Arc::new(sphere_mesh),
            texture_override: None,
        }
    }

    /// Use `path` for every preset instead of the preset's own texture.
    pub fn with_texture_override(mut self, path: impl Into<String>) -> Self {
        self.texture_override = Some(path.into());
        self
    }

    pub fn current(&self) -> Option<Preset> {
        self.current
    }

    pub fn emission_mesh(&self) -> &Arc<Mesh> {
        &self.emission_mesh
    }

    /// Reconfigure `system` for `preset`.
    pub fn apply(&mut self, preset: Preset, system: &mut ParticleSystem) -> PresetChange {
        let change = PresetChange {
            from: self.current,
            to: preset,
        };
        log::debug!("Applying preset {:?} (was {:?})", preset, change.from);

        system.configure(self.config_for(preset));
        self.current = Some(preset);
        change
    }

    /// Re-read the emission mesh and re-apply the mesh preset if it is active.
    ///
    /// Returns whether the pool was reconfigured.
    pub fn reload_mesh(
        &mut self,
        assets: &dyn AssetSource,
        reload: &MeshReload,
        system: &mut ParticleSystem,
    ) -> bool {
        self.emission_mesh = Arc::new(Mesh::load(assets, &reload.path));

        match self.current {
            Some(Preset::MeshSurface) => {
                self.apply(Preset::MeshSurface, system);
                true
            }
            _ => false,
        }
    }

    /// Meshes to draw for the current configuration: one per sphere
    /// collider, plus the emission mesh while it is in use.
    pub fn visual_meshes(&self, system: &ParticleSystem) -> Vec<VisualMesh> {
        let mut visuals: Vec<VisualMesh> = system
            .config()
            .spheres
            .iter()
            .map(|s| VisualMesh {
                mesh: Arc::clone(&self.sphere_mesh),
                transform: Mat4::from_translation(s.center) * Mat4::from_scale(Vec3::splat(s.radius)),
                color: collider_color(s.kind),
            })
            .collect();

        if system.config().mesh().is_some() {
            visuals.push(VisualMesh {
                mesh: Arc::clone(&self.emission_mesh),
                transform: Mat4::IDENTITY,
                color: Vec4::new(0.35, 0.35, 0.4, 1.0),
            });
        }

        visuals
    }

    /// The full configuration of `preset`.
    pub fn config_for(&self, preset: Preset) -> SystemConfig {
        let ground = |kind| PlaneCollider::new(kind, Vec3::new(0.0, GROUND_Y, 0.0), Vec3::Y);
        let fountain = Emitter::Fountain {
            origin: Vec3::new(0.0, -0.9, 0.0),
            direction: Vec3::Y,
            speed: 3.0,
            spread: 0.35,
        };

        let config = match preset {
            Preset::SphereBurst => SystemConfig::free(
                4000.0,
                2.0,
                Emitter::SphereSurface {
                    center: Vec3::ZERO,
                    radius: 0.25,
                    speed: 0.6,
                },
            )
            .with_damping(0.5, 0.0),

            Preset::FountainSink => SystemConfig::free(3000.0, 3.0, fountain)
                .with_gravity(GRAVITY)
                .with_plane(ground(CollisionKind::Sink)),

            Preset::FountainBounce => SystemConfig::free(3000.0, 4.0, fountain)
                .with_gravity(GRAVITY)
                .with_damping(0.05, 0.0)
                .with_plane(ground(CollisionKind::Bounce))
                .with_plane(PlaneCollider::new(CollisionKind::Bounce, Vec3::new(-1.0, 0.0, 0.0), Vec3::X))
                .with_plane(PlaneCollider::new(CollisionKind::Bounce, Vec3::new(1.0, 0.0, 0.0), Vec3::NEG_X)),

            Preset::BoxColliders => SystemConfig::free(3000.0, 4.0, fountain)
                .with_gravity(GRAVITY)
                .with_plane(ground(CollisionKind::Bounce))
                .with_box(AxisBoxCollider::new(
                    CollisionKind::Bounce,
                    Vec3::new(-0.7, -0.3, -0.4),
                    Vec3::new(-0.1, -0.1, 0.4),
                ))
                .with_box(AxisBoxCollider::new(
                    CollisionKind::Sink,
                    Vec3::new(0.2, -1.0, -0.4),
                    Vec3::new(0.7, -0.5, 0.4),
                )),

            Preset::SphereJet => SystemConfig::free(
                2500.0,
                3.0,
                Emitter::SphereJet {
                    origin: Vec3::new(-1.2, 0.6, 0.0),
                    radius: 0.05,
                    direction: Vec3::new(1.0, -0.5, 0.0),
                    speed: 4.0,
                    spread: 0.08,
                },
            )
            .with_gravity(GRAVITY)
            .with_sphere(SphereCollider::new(CollisionKind::Bounce, Vec3::new(0.0, -0.2, 0.0), 0.4))
            .with_plane(ground(CollisionKind::Sink)),

            Preset::AttractorSwirl => SystemConfig::free(
                2000.0,
                6.0,
                Emitter::Random {
                    center: Vec3::ZERO,
                    half_extent: Vec3::ONE,
                    speed: 0.3,
                },
            )
            .with_damping(0.2, 0.0)
            .with_attractor(Attractor::new(Vec3::new(-0.5, 0.0, 0.0), 1.5))
            .with_attractor(Attractor::new(Vec3::new(0.5, 0.2, 0.0), 1.5)),

            Preset::MeshSurface => SystemConfig::free(
                3000.0,
                1.5,
                Emitter::MeshSurface {
                    mesh: Arc::clone(&self.emission_mesh),
                    normal_speed: 0.15,
                },
            )
            .with_gravity(Vec3::new(0.0, 0.3, 0.0))
            .with_damping(0.3, 0.0),

            Preset::Cloth => {
                let spacing = CLOTH_EXTENT / (CLOTH_SIZE - 1) as f32;
                SystemConfig::grid(GridConfig {
                    width: CLOTH_SIZE,
                    height: CLOTH_SIZE,
                    origin: Vec3::new(-CLOTH_EXTENT / 2.0, 0.6, -CLOTH_EXTENT / 2.0),
                    stride_x: Vec3::new(spacing, 0.0, 0.0),
                    stride_y: Vec3::new(0.0, 0.0, spacing),
                    hooke_strength: 200.0,
                    hooke_eq_dist: spacing,
                })
                .with_gravity(GRAVITY)
                .with_damping(0.8, 0.0)
                .with_sphere(SphereCollider::new(CollisionKind::Bounce, Vec3::new(0.0, -0.1, 0.0), 0.4))
                .with_plane(ground(CollisionKind::Bounce))
            }
        };

        let config = if config.is_grid() {
            config
        } else {
            config.with_capacity(self.capacity)
        };

        match &self.texture_override {
            Some(path) => config.with_texture(path.clone()),
            None => config.with_texture(preset.texture()),
        }
    }
}

fn collider_color(kind: CollisionKind) -> Vec4 {
    match kind {
        CollisionKind::Sink => Vec4::new(0.8, 0.2, 0.2, 1.0),
        CollisionKind::Bounce => Vec4::new(0.3, 0.6, 0.9, 1.0),
    }
}
