//! Egui overlay for the viewer.
//!
//! Paints the preset panel: one egui button per [`Button`], placed at the
//! button's pixel rect so the headless hit-test and the drawn widget agree.
//! Clicks come back as [`UiEvent`]s for the input snapshot.

use std::sync::Arc;

use glam::Vec4;
use winit::window::Window;

use crate::gui::{Button, Gui, UiEvent};

/// Egui context, winit state and wgpu renderer.
pub struct EguiIntegration {
    pub ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

/// Tessellated output of one egui pass.
pub struct EguiFrameOutput {
    pub paint_jobs: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

impl EguiIntegration {
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat, window: &Arc<Window>) -> Self {
        let ctx = egui::Context::default();

        let mut style = egui::Style::default();
        style.visuals = egui::Visuals::dark();
        style.visuals.window_shadow = egui::Shadow::NONE;
        style.visuals.popup_shadow = egui::Shadow::NONE;
        ctx.set_style(style);

        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window.as_ref(),
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let renderer = egui_wgpu::Renderer::new(
            device,
            output_format,
            None,  // depth format
            1,     // msaa samples
            false, // dithering
        );

        Self { ctx, state, renderer }
    }

    /// Returns true if egui consumed the event.
    pub fn on_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Run one egui pass over the panel and collect its clicks.
    pub fn run(&mut self, window: &Window, gui: &Gui) -> (EguiFrameOutput, Vec<UiEvent>) {
        let raw_input = self.state.take_egui_input(window);
        self.ctx.begin_pass(raw_input);

        let ctx = self.ctx.clone();
        let events = preset_panel(&ctx, gui);

        let full_output = self.ctx.end_pass();
        self.state
            .handle_platform_output(window, full_output.platform_output);
        let paint_jobs = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let output = EguiFrameOutput {
            paint_jobs,
            textures_delta: full_output.textures_delta,
            pixels_per_point: full_output.pixels_per_point,
        };
        (output, events)
    }

    /// Upload textures and buffers. Call before the egui render pass.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        output: &EguiFrameOutput,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) -> Vec<wgpu::CommandBuffer> {
        for (id, image_delta) in &output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, image_delta);
        }

        self.renderer.update_buffers(
            device,
            queue,
            encoder,
            &output.paint_jobs,
            screen_descriptor,
        )
    }

    pub fn draw(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        output: &EguiFrameOutput,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.renderer
            .render(render_pass, &output.paint_jobs, screen_descriptor);
    }

    /// Free textures after the frame is submitted.
    pub fn cleanup(&mut self, output: &EguiFrameOutput) {
        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

fn preset_panel(ctx: &egui::Context, gui: &Gui) -> Vec<UiEvent> {
    // Button rects are in physical pixels, egui lays out in points
    let scale = 1.0 / ctx.pixels_per_point();
    let mut events = Vec::new();

    egui::Area::new(egui::Id::new("preset_panel"))
        .fixed_pos(egui::Pos2::ZERO)
        .show(ctx, |ui| {
            for button in &gui.buttons {
                let rect = egui::Rect::from_min_max(
                    egui::pos2(button.rect.min.x * scale, button.rect.min.y * scale),
                    egui::pos2(button.rect.max.x * scale, button.rect.max.y * scale),
                );
                if ui.put(rect, widget(button)).clicked() {
                    events.push(button.event);
                }
            }
        });

    events
}

fn widget(button: &Button) -> egui::Button<'_> {
    let label = egui::RichText::new(&button.label).color(color32(button.style.text));
    egui::Button::new(label).fill(color32(button.color()))
}

fn color32(c: Vec4) -> egui::Color32 {
    let [r, g, b, a] = (c.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round().to_array();
    egui::Color32::from_rgba_unmultiplied(r as u8, g as u8, b as u8, a as u8)
}
