//! Interactive viewer: a winit window driving an [`App`] and its renderer.
//!
//! Input events go to egui first; whatever it does not consume is collected
//! into an [`InputSnapshot`] between redraws. Each redraw lays out the egui
//! panel, adds its clicks to the snapshot, runs one app frame, presents it
//! and starts a new snapshot.
//! With `playback_path` set, recorded frames replace live input and the
//! recording loops when it runs out.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::app::App;
use crate::assets::DirAssets;
use crate::config::AppConfig;
use crate::error::ViewerError;
use crate::gpu::Renderer;
use crate::input::InputSnapshot;
use crate::replay::{Playback, Recording};

/// Open the window and run until it closes.
pub fn run(config: AppConfig) -> Result<(), ViewerError> {
    let playback = match &config.playback_path {
        Some(path) => {
            let recording = Recording::load(path)?;
            log::info!(
                "Playing back {} frames from {}",
                recording.frames.len(),
                path.display()
            );
            Some(Playback::new(recording))
        }
        None => None,
    };

    let app = match &playback {
        Some(playback) => App::for_playback(config.clone(), assets(&config), playback.recording()),
        None => App::new(config.clone(), assets(&config)),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut viewer = Viewer {
        config,
        app,
        input: InputSnapshot::new(),
        playback,
        window: None,
        renderer: None,
        error: None,
        title: String::new(),
    };
    event_loop.run_app(&mut viewer)?;

    if let Some(error) = viewer.error.take() {
        return Err(error);
    }

    if let (Some(path), Some(recording)) = (viewer.config.record_path.clone(), viewer.app.take_recording()) {
        recording.save(path)?;
    }
    Ok(())
}

fn assets(config: &AppConfig) -> Box<DirAssets> {
    Box::new(DirAssets::new(&config.asset_root))
}

struct Viewer {
    config: AppConfig,
    app: App,
    input: InputSnapshot,
    playback: Option<Playback>,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    /// Start-up failure to report once the loop exits.
    error: Option<ViewerError>,
    title: String,
}

impl Viewer {
    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.app.title())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let renderer = pollster::block_on(Renderer::new(window.clone()))?;

        let size = window.inner_size();
        self.app.set_viewport(size.width, size.height);
        self.window = Some(window);
        self.renderer = Some(renderer);
        Ok(())
    }

    /// Live input, or the next recorded frame.
    fn next_frame(&mut self) -> (f32, InputSnapshot) {
        let live_dt = self.app.tick();
        let Some(playback) = &mut self.playback else {
            return (live_dt, self.input.clone());
        };

        if playback.is_finished() {
            log::info!("Playback finished, restarting");
            playback.rewind();
            self.app = App::for_playback(self.config.clone(), assets(&self.config), playback.recording());
            if let Some(window) = &self.window {
                let size = window.inner_size();
                self.app.set_viewport(size.width, size.height);
            }
        }

        match playback.next() {
            Some(frame) => (frame.delta_time, frame.input),
            None => (0.0, InputSnapshot::new()),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let ui_events = match (&mut self.renderer, &self.window) {
            (Some(renderer), Some(window)) => renderer.run_ui(window, self.app.gui()),
            _ => Vec::new(),
        };

        let (dt, mut input) = self.next_frame();
        // Recorded frames already carry the clicks made while recording
        if self.playback.is_none() {
            for event in ui_events {
                input.push_ui_event(event);
            }
        }
        self.app.frame(dt, &input);
        self.input.begin_frame();

        if self.app.quit_requested() {
            event_loop.exit();
            return;
        }

        if let Some(window) = &self.window {
            let title = self.app.title();
            if title != self.title {
                window.set_title(&title);
                self.title = title;
            }
        }

        if let Some(renderer) = &mut self.renderer {
            match renderer.render(&self.app) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => renderer.reconfigure(),
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("GPU out of memory");
                    event_loop.exit();
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(physical_size);
                }
                self.app.set_viewport(physical_size.width, physical_size.height);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            other => {
                let consumed = match (&mut self.renderer, &self.window) {
                    (Some(renderer), Some(window)) => renderer.on_window_event(window, &other),
                    _ => false,
                };
                // Releases always pass through so a drag never sticks
                let release = matches!(
                    other,
                    WindowEvent::MouseInput {
                        state: ElementState::Released,
                        ..
                    }
                );
                if !consumed || release {
                    self.input.handle_event(&other);
                }
            }
        }
    }
}
