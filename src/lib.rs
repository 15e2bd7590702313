//! # Particle Playground
//!
//! A CPU particle simulation with swept colliders, a live-switchable preset
//! table and a draw-ready render feed.
//!
//! The simulation core has no graphics or windowing dependency. Everything it
//! needs from the outside world comes in through three narrow doors:
//!
//! - an [`InputSnapshot`] per frame,
//! - an [`AssetSource`] for whole-file reads,
//! - and the [`RenderFeed`] it hands back for drawing.
//!
//! The `viewer` feature adds a winit + wgpu front end.
//!
//! ## Quick Start
//!
//! ```
//! use particle_playground::prelude::*;
//!
//! let mut system = ParticleSystem::with_seed(1);
//! system.configure(
//!     SystemConfig::free(
//!         1000.0,
//!         2.0,
//!         Emitter::SphereSurface { center: Vec3::ZERO, radius: 0.25, speed: 0.5 },
//!     )
//!     .with_capacity(10_000)
//!     .with_sphere(SphereCollider::new(CollisionKind::Sink, Vec3::ZERO, 2.0)),
//! );
//!
//! let camera = Camera::new();
//! for _ in 0..30 {
//!     system.step(1.0 / 60.0);
//! }
//! let feed = system.render_feed(camera.view_proj(16.0 / 9.0));
//! assert_eq!(feed.len(), system.active());
//! ```
//!
//! ## Core Concepts
//!
//! ### Free and grid mode
//!
//! A free-mode system spawns particles from an [`Emitter`] at a steady rate
//! and removes them once they outlive `max_life`. A grid-mode system is a
//! fixed lattice of immortal particles tied to their neighbors by springs.
//!
//! ### Colliders
//!
//! | Shape | Hit selection |
//! |-------|---------------|
//! | [`PlaneCollider`] | first plane in list order with a valid hit |
//! | [`AxisBoxCollider`] | nearest hit among boxes |
//! | [`SphereCollider`] | nearest hit among spheres |
//!
//! Each collider either sinks ([`CollisionKind::Sink`]) or bounces
//! ([`CollisionKind::Bounce`]) what touches it.
//!
//! ### Presets
//!
//! [`ScenarioController`] maps each [`Preset`] to a full [`SystemConfig`];
//! [`App`] ties presets, GUI, camera and simulation together.

pub mod app;
pub mod assets;
pub mod collider;
pub mod config;
pub mod emitter;
pub mod error;
pub mod gui;
pub mod input;
pub mod math;
pub mod mesh;
pub mod particles;
pub mod presets;
pub mod render_feed;
pub mod replay;
pub mod textures;
pub mod time;

#[cfg(feature = "viewer")]
mod gpu;
#[cfg(feature = "viewer")]
pub mod window;

pub use bytemuck;
pub use app::App;
pub use assets::{AssetSource, DirAssets, MemoryAssets};
pub use collider::{Attractor, AxisBoxCollider, Collider, CollisionKind, Hit, PlaneCollider, SphereCollider};
pub use config::AppConfig;
pub use emitter::Emitter;
pub use error::{ConfigError, MeshError, ReplayError, TextureError};
#[cfg(feature = "viewer")]
pub use error::ViewerError;
pub use gui::{Button, Gui, UiEvent};
pub use input::{ButtonState, InputSnapshot, Key, MouseButton};
pub use math::{Camera, Mat4, Quat, Vec2, Vec3, Vec4};
pub use mesh::{Mesh, SurfaceSample, Triangle};
pub use particles::{GridConfig, Mode, Particle, ParticleSystem, SystemConfig};
pub use presets::{MeshReload, Preset, PresetChange, ScenarioController, VisualMesh};
pub use render_feed::RenderFeed;
pub use replay::{Playback, Recorder, Recording};
pub use textures::{FilterMode, TextureData, TextureId, TextureRegistry};
pub use time::Time;

/// Convenient re-exports for common usage.
///
/// ```
/// use particle_playground::prelude::*;
/// ```
pub mod prelude {
    pub use crate::collider::{Attractor, AxisBoxCollider, CollisionKind, PlaneCollider, SphereCollider};
    pub use crate::emitter::Emitter;
    pub use crate::math::Camera;
    pub use crate::mesh::Mesh;
    pub use crate::particles::{GridConfig, ParticleSystem, SystemConfig};
    pub use crate::presets::{Preset, ScenarioController};
    pub use crate::render_feed::RenderFeed;
    pub use crate::{App, AppConfig, InputSnapshot, Key, MouseButton};
    pub use crate::{Vec2, Vec3, Vec4};
}
