//! Top-level application state.
//!
//! [`App`] owns every subsystem and runs one frame at a time:
//!
//! 1. GUI buttons, host widget clicks and keyboard shortcuts turn the
//!    [`InputSnapshot`] into [`UiEvent`]s; mouse drag, scroll and arrows
//!    move the camera.
//! 2. Preset changes and mesh reloads reconfigure the pool between steps.
//! 3. The pool steps by the frame delta.
//! 4. The render feed is prepared for the renderer.
//!
//! The frame delta is passed in rather than read from a clock, so a recorded
//! session replays identically.

use glam::{Mat4, Vec2};

use crate::assets::AssetSource;
use crate::config::AppConfig;
use crate::gui::{Gui, UiEvent};
use crate::input::{InputSnapshot, Key, MouseButton};
use crate::math::Camera;
use crate::mesh::Mesh;
use crate::particles::ParticleSystem;
use crate::presets::{MeshReload, Preset, PresetChange, ScenarioController, VisualMesh};
use crate::render_feed::RenderFeed;
use crate::replay::{Recorder, Recording};
use crate::textures::{TextureId, TextureRegistry};
use crate::time::Time;

/// The running playground.
pub struct App {
    config: AppConfig,
    assets: Box<dyn AssetSource>,
    camera: Camera,
    system: ParticleSystem,
    scenarios: ScenarioController,
    gui: Gui,
    textures: TextureRegistry,
    texture: TextureId,
    time: Time,
    feed: RenderFeed,
    viewport: Vec2,
    recorder: Option<Recorder>,
    quit_requested: bool,
}

impl App {
    /// Build the app and apply the startup preset.
    pub fn new(config: AppConfig, assets: Box<dyn AssetSource>) -> Self {
        let (seed, preset) = (config.seed, config.startup_preset);
        Self::with_session(config, assets, seed, preset)
    }

    /// Build an app that replays `recording` from its own seed and preset.
    pub fn for_playback(config: AppConfig, assets: Box<dyn AssetSource>, recording: &Recording) -> Self {
        let config = AppConfig {
            record_path: None,
            ..config
        };
        Self::with_session(config, assets, recording.seed, recording.start_preset)
    }

    fn with_session(config: AppConfig, assets: Box<dyn AssetSource>, seed: u64, preset: Preset) -> Self {
        let emission_mesh = Mesh::load(assets.as_ref(), &config.mesh_path);
        let sphere_mesh = Mesh::load(assets.as_ref(), &config.sphere_mesh_path);

        let mut scenarios = ScenarioController::new(config.capacity, emission_mesh, sphere_mesh);
        if let Some(path) = &config.particle_texture {
            scenarios = scenarios.with_texture_override(path.clone());
        }

        let mut time = Time::new();
        time.set_fixed_delta(config.fixed_delta);

        let recorder = config.record_path.as_ref().map(|_| Recorder::new(seed, preset));
        let viewport = Vec2::new(config.window_width as f32, config.window_height as f32);
        let textures = TextureRegistry::new();
        let texture = textures.blank();

        let mut app = Self {
            config,
            assets,
            camera: Camera::new(),
            system: ParticleSystem::with_seed(seed),
            scenarios,
            gui: Gui::preset_panel(),
            textures,
            texture,
            time,
            feed: RenderFeed::default(),
            viewport,
            recorder,
            quit_requested: false,
        };
        app.select_preset(preset);
        app
    }

    /// Read the frame timer; pass the result to [`frame`](Self::frame).
    pub fn tick(&mut self) -> f32 {
        self.time.update()
    }

    /// Run one frame with `dt` seconds of simulation.
    pub fn frame(&mut self, dt: f32, input: &InputSnapshot) {
        if let Some(recorder) = &mut self.recorder {
            recorder.record(dt, input);
        }

        let mut events = self.gui.update(input);
        events.extend_from_slice(&input.ui_events);
        events.extend(self.shortcuts(input));
        self.move_camera(input);

        for event in events {
            match event {
                UiEvent::SelectPreset(preset) => self.select_preset(preset),
                UiEvent::ReloadMesh => self.reload_mesh(MeshReload {
                    path: self.config.mesh_path.clone(),
                }),
            }
        }

        self.system.step(dt);
        let view_proj = self.view_proj();
        self.system.prepare_render_feed(view_proj, &mut self.feed);
    }

    fn shortcuts(&mut self, input: &InputSnapshot) -> Vec<UiEvent> {
        let mut events: Vec<UiEvent> = Key::DIGITS
            .iter()
            .zip(Preset::ALL)
            .filter(|(key, _)| input.key_pressed(**key))
            .map(|(_, preset)| UiEvent::SelectPreset(preset))
            .collect();

        if input.key_pressed(Key::R) {
            events.push(UiEvent::ReloadMesh);
        }
        if input.key_pressed(Key::P) {
            self.time.toggle_pause();
            log::info!("{}", if self.time.is_paused() { "Paused" } else { "Resumed" });
        }
        if input.key_pressed(Key::Space) {
            self.time.request_step();
        }
        if input.key_pressed(Key::Escape) {
            self.quit_requested = true;
        }

        events
    }

    fn move_camera(&mut self, input: &InputSnapshot) {
        if input.mouse(MouseButton::Left).is_down && !self.gui.wants_mouse(input) {
            self.camera.rotate_by_drag(input.mouse_delta);
        }
        if input.scroll != 0.0 {
            self.camera.zoom(input.scroll);
        }

        let steps = |neg: Key, pos: Key| input.key_pressed(pos) as i32 - input.key_pressed(neg) as i32;
        let (dx, dy) = (steps(Key::Left, Key::Right), steps(Key::Down, Key::Up));
        if dx != 0 || dy != 0 {
            self.camera.nudge(dx, dy);
        }
    }

    /// Switch presets now.
    pub fn select_preset(&mut self, preset: Preset) {
        let change = self.scenarios.apply(preset, &mut self.system);
        self.on_preset_change(change);
    }

    fn on_preset_change(&mut self, change: PresetChange) {
        log::info!("Preset: {}", change.to.label());
        self.gui.mark_active(change.to);

        self.texture = match &self.system.config().texture {
            Some(path) => self.textures.load(self.assets.as_ref(), path),
            None => self.textures.blank(),
        };
    }

    /// Re-read the emission mesh.
    pub fn reload_mesh(&mut self, reload: MeshReload) {
        log::info!("Reloading mesh {}", reload.path);
        if self
            .scenarios
            .reload_mesh(self.assets.as_ref(), &reload, &mut self.system)
        {
            if let Some(preset) = self.scenarios.current() {
                self.on_preset_change(PresetChange {
                    from: Some(preset),
                    to: preset,
                });
            }
        }
    }

    /// Window size in pixels, for the projection aspect ratio.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Vec2::new(width.max(1) as f32, height.max(1) as f32);
    }

    pub fn view_proj(&self) -> Mat4 {
        self.camera.view_proj(self.viewport.x / self.viewport.y)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn system(&self) -> &ParticleSystem {
        &self.system
    }

    pub fn feed(&self) -> &RenderFeed {
        &self.feed
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn preset(&self) -> Option<Preset> {
        self.scenarios.current()
    }

    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    /// Texture bound for the particle billboards.
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    pub fn visual_meshes(&self) -> Vec<VisualMesh> {
        self.scenarios.visual_meshes(&self.system)
    }

    pub fn gui(&self) -> &Gui {
        &self.gui
    }

    /// Window title with the preset name and frame rate.
    pub fn title(&self) -> String {
        let label = self.preset().map_or("none", Preset::label);
        let paused = if self.time.is_paused() { " (paused)" } else { "" };
        format!(
            "Particles - {}{} - {} particles - {:.0} FPS",
            label,
            paused,
            self.system.active(),
            self.time.fps()
        )
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Stop recording and hand back what was captured.
    pub fn take_recording(&mut self) -> Option<Recording> {
        self.recorder.take().map(Recorder::finish)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;
    use std::path::PathBuf;

    fn app() -> App {
        let config = AppConfig {
            capacity: 5000,
            ..AppConfig::default()
        };
        App::new(config, Box::new(MemoryAssets::new()))
    }

    fn press(key: Key) -> InputSnapshot {
        let mut input = InputSnapshot::new();
        input.set_key(key, true);
        input
    }

    #[test]
    fn test_starts_on_configured_preset() {
        let app = app();
        assert_eq!(app.preset(), Some(Preset::SphereBurst));
        assert!(app.title().contains("Sphere burst"));
    }

    #[test]
    fn test_host_widget_click_selects_preset() {
        let mut app = app();
        let mut input = InputSnapshot::new();
        input.push_ui_event(UiEvent::SelectPreset(Preset::AttractorSwirl));

        app.frame(1.0 / 60.0, &input);
        assert_eq!(app.preset(), Some(Preset::AttractorSwirl));
    }

    #[test]
    fn test_digit_selects_preset() {
        let mut app = app();
        app.frame(1.0 / 60.0, &press(Key::Digit8));
        assert_eq!(app.preset(), Some(Preset::Cloth));
        assert_eq!(app.feed().len(), 64 * 64);
    }

    #[test]
    fn test_pause_toggle() {
        let mut app = app();
        app.frame(0.0, &press(Key::P));
        assert!(app.time().is_paused());
        assert!(app.title().contains("paused"));
    }

    #[test]
    fn test_arrows_move_camera() {
        let mut app = app();
        let before = app.camera().position;
        app.frame(0.0, &press(Key::Right));
        assert!(app.camera().position.x > before.x);
    }

    #[test]
    fn test_drag_over_gui_does_not_rotate() {
        let mut app = app();
        let rotation = app.camera().rotation;

        let mut input = InputSnapshot::new();
        input.move_mouse(Vec2::splat(30.0));
        input.set_mouse(MouseButton::Left, true);
        input.begin_frame();
        input.move_mouse(Vec2::new(60.0, 30.0));
        app.frame(0.0, &input);
        assert_eq!(app.camera().rotation, rotation);

        input.begin_frame();
        input.move_mouse(Vec2::new(600.0, 400.0));
        app.frame(0.0, &input);
        input.begin_frame();
        input.move_mouse(Vec2::new(650.0, 400.0));
        app.frame(0.0, &input);
        assert_ne!(app.camera().rotation, rotation);
    }

    #[test]
    fn test_feed_follows_step() {
        let mut app = app();
        for _ in 0..10 {
            app.frame(1.0 / 60.0, &InputSnapshot::new());
        }
        assert_eq!(app.feed().len(), app.system().active());
        assert!(app.feed().len() > 0);
    }

    #[test]
    fn test_reload_mesh_from_assets() {
        let mut assets = MemoryAssets::new();
        let config = AppConfig::default();
        assets.insert(config.mesh_path.clone(), "v 0 0 0\nv 1 0 0\nv 0 0 1\nf 1 3 2\n");

        let mut app = App::new(config, Box::new(assets));
        app.select_preset(Preset::MeshSurface);
        app.frame(0.1, &press(Key::R));
        assert!(app.system().active() > 0);
    }

    #[test]
    fn test_recording_replays_identically() {
        let config = AppConfig {
            capacity: 4000,
            record_path: Some(PathBuf::from("unused.json")),
            ..AppConfig::default()
        };

        let mut live = App::new(config.clone(), Box::new(MemoryAssets::new()));
        let script = [Key::Digit2, Key::Digit4, Key::Left, Key::Digit6];
        for i in 0..40 {
            let mut input = InputSnapshot::new();
            if i % 10 == 5 {
                input.set_key(script[i / 10], true);
            }
            live.frame(1.0 / 60.0, &input);
        }
        let recording = live.take_recording().unwrap();
        assert_eq!(recording.frames.len(), 40);

        let mut replay = App::for_playback(config, Box::new(MemoryAssets::new()), &recording);
        for frame in crate::replay::Playback::new(recording) {
            replay.frame(frame.delta_time, &frame.input);
        }

        assert_eq!(replay.preset(), live.preset());
        assert_eq!(replay.system().particles(), live.system().particles());
        assert_eq!(replay.camera().position, live.camera().position);
    }
}
