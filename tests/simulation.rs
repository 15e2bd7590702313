//! Integration tests for the simulation core.
//!
//! These drive `ParticleSystem` through its public API only, using the
//! built-in presets as realistic configurations.

use std::sync::Arc;

use particle_playground::prelude::*;
use particle_playground::Triangle;

const DT: f32 = 1.0 / 60.0;

fn system_for(preset: Preset, capacity: usize) -> ParticleSystem {
    let scenarios = ScenarioController::new(capacity, two_triangle_mesh(), Mesh::empty());
    let mut system = ParticleSystem::with_seed(42);
    system.configure(scenarios.config_for(preset));
    system
}

/// Two disjoint triangles with a 9:1 area ratio.
fn two_triangle_mesh() -> Mesh {
    Mesh::from_triangles(vec![
        Triangle::flat(Vec3::ZERO, Vec3::new(0.0, 0.0, 3.0), Vec3::new(3.0, 0.0, 0.0)),
        Triangle::flat(
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 1.0),
            Vec3::new(11.0, 0.0, 0.0),
        ),
    ])
}

// ============================================================================
// Pool bookkeeping
// ============================================================================

#[test]
fn test_free_presets_keep_one_slot_free() {
    for preset in Preset::ALL.into_iter().filter(|p| *p != Preset::Cloth) {
        let mut system = system_for(preset, 300);
        for _ in 0..240 {
            system.step(DT);
            assert!(
                system.active() < system.capacity(),
                "{} filled its pool",
                preset.label()
            );
        }
        assert_eq!(system.active(), system.capacity() - 1, "{}", preset.label());
    }
}

#[test]
fn test_cloth_population_never_changes() {
    let mut system = system_for(Preset::Cloth, 0);
    let count = system.active();
    assert!(count > 0);

    for _ in 0..300 {
        system.step(DT);
        assert_eq!(system.active(), count);
    }
}

#[test]
fn test_sink_plane_removes_what_touches_it() {
    let mut system = system_for(Preset::FountainSink, 5000);
    for _ in 0..600 {
        system.step(DT);
        let max_life = system.max_life();
        assert!(system.particles().iter().all(|p| p.position.y > -1.0 - 1e-4));
        assert!(system.particles().iter().all(|p| p.life <= max_life));
    }
}

#[test]
fn test_zero_step_after_configure_changes_nothing() {
    for preset in Preset::ALL {
        let mut system = system_for(preset, 1000);
        let before = system.particles().to_vec();

        system.step(0.0);

        assert_eq!(system.particles(), &before[..], "{}", preset.label());
    }
}

#[test]
fn test_same_seed_same_simulation() {
    let mut a = system_for(Preset::BoxColliders, 2000);
    let mut b = system_for(Preset::BoxColliders, 2000);
    for _ in 0..100 {
        a.step(DT);
        b.step(DT);
    }
    assert_eq!(a.particles(), b.particles());
}

// ============================================================================
// Emission
// ============================================================================

#[test]
fn test_mesh_emission_is_area_weighted() {
    let emitter = Emitter::MeshSurface {
        mesh: Arc::new(two_triangle_mesh()),
        normal_speed: 0.1,
    };
    let mut rng = <rand::rngs::SmallRng as rand::SeedableRng>::seed_from_u64(2024);

    let samples = 10_000;
    let mut on_large = 0;
    for _ in 0..samples {
        let p = emitter.spawn(&mut rng).unwrap();
        if p.position.x < 5.0 {
            on_large += 1;
        }
    }

    // Binomial(10_000, 0.9) has a standard deviation of 30
    let expected = samples * 9 / 10;
    assert!(
        (on_large as i32 - expected as i32).abs() < 150,
        "{} of {} samples landed on the large triangle",
        on_large,
        samples
    );
}

#[test]
fn test_slow_emitter_spawns_every_other_step() {
    let mut system = ParticleSystem::with_seed(3);
    system.configure(
        SystemConfig::free(
            10.0,
            100.0,
            Emitter::Random {
                center: Vec3::ZERO,
                half_extent: Vec3::splat(0.1),
                speed: 0.0,
            },
        )
        .with_capacity(64),
    );

    let mut counts = Vec::new();
    for _ in 0..20 {
        system.step(0.05);
        counts.push(system.active());
    }

    assert_eq!(*counts.last().unwrap(), 10);
    for pair in counts.windows(2) {
        assert!(pair[1] - pair[0] <= 1);
    }
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_render_feed_is_back_to_front() {
    let mut system = system_for(Preset::SphereBurst, 3000);
    for _ in 0..30 {
        system.step(DT);
    }

    let view_proj = Camera::new().view_proj(16.0 / 9.0);
    let feed = system.render_feed(view_proj);
    assert_eq!(feed.len(), system.active());

    let depths: Vec<f32> = feed
        .positions
        .iter()
        .map(|p| (view_proj * Vec3::from_array(*p).extend(1.0)).z)
        .collect();
    assert!(depths.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_render_feed_keeps_grid_order() {
    let mut system = system_for(Preset::Cloth, 0);
    system.step(DT);
    let lattice: Vec<[f32; 3]> = system
        .particles()
        .iter()
        .map(|p| p.position.to_array())
        .collect();

    let feed = system.render_feed(Camera::new().view_proj(1.0));
    assert_eq!(feed.positions, lattice);
    assert_eq!(feed.texture.as_deref(), Some("textures/cloth.png"));
}
