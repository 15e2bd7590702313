//! wgpu renderer for the viewer.
//!
//! Draws, in order: collider and emission meshes (opaque, depth-writing),
//! particle billboards (alpha-blended, depth-tested) and then, in a second
//! pass without depth, the egui preset panel.

mod billboards;
mod egui_integration;
mod meshes;

use std::sync::Arc;

use winit::window::Window;

use crate::app::App;
use crate::error::ViewerError;
use crate::gui::{Gui, UiEvent};
use crate::render_feed::BillboardUniforms;

use billboards::BillboardPass;
use egui_integration::{EguiFrameOutput, EguiIntegration};
use meshes::MeshPass;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.1,
    a: 1.0,
};

pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    depth_texture: wgpu::TextureView,
    meshes: MeshPass,
    billboards: BillboardPass,
    egui: EguiIntegration,
    /// Panel output waiting for the next [`render`](Self::render).
    ui: Option<EguiFrameOutput>,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> Result<Self, ViewerError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(ViewerError::NoAdapter)?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = create_depth_texture(&device, &config);
        let meshes = MeshPass::new(&device, surface_format);
        let billboards = BillboardPass::new(&device, surface_format);
        let egui = EguiIntegration::new(&device, surface_format, &window);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            meshes,
            billboards,
            egui,
            ui: None,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = create_depth_texture(&self.device, &self.config);
        }
    }

    /// Reconfigure the surface at its current size.
    pub fn reconfigure(&mut self) {
        self.resize(winit::dpi::PhysicalSize {
            width: self.config.width,
            height: self.config.height,
        });
    }

    /// Let egui see a window event first; true if it consumed it.
    pub fn on_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.egui.on_window_event(window, event)
    }

    /// Lay out the preset panel and return the buttons clicked since the last call.
    pub fn run_ui(&mut self, window: &Window, gui: &Gui) -> Vec<UiEvent> {
        let (output, events) = self.egui.run(window, gui);
        self.ui = Some(output);
        events
    }

    /// Upload the app's current frame and present it.
    pub fn render(&mut self, app: &App) -> Result<(), wgpu::SurfaceError> {
        let view_proj = app.view_proj();
        let camera = app.camera();
        let uniforms = BillboardUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            right: camera.right().extend(0.0).to_array(),
            up: camera.up().extend(0.0).to_array(),
        };

        self.meshes
            .prepare(&self.device, &self.queue, view_proj, &app.visual_meshes());
        self.billboards.prepare(
            &self.device,
            &self.queue,
            &uniforms,
            app.feed(),
            app.textures(),
            app.texture(),
        );

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.meshes.draw(&mut render_pass);
            self.billboards.draw(&mut render_pass);
        }

        let mut command_buffers = Vec::new();
        if let Some(ui) = self.ui.take() {
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.config.width, self.config.height],
                pixels_per_point: ui.pixels_per_point,
            };
            command_buffers = self.egui.prepare(
                &self.device,
                &self.queue,
                &mut encoder,
                &ui,
                &screen_descriptor,
            );

            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Egui Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();
            self.egui.draw(&mut render_pass, &ui, &screen_descriptor);
            drop(render_pass);

            self.egui.cleanup(&ui);
        }

        command_buffers.push(encoder.finish());
        self.queue.submit(command_buffers);
        output.present();

        Ok(())
    }
}

fn create_depth_texture(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
