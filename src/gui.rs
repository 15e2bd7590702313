//! Minimal immediate-style GUI.
//!
//! Buttons are screen rectangles that turn input into typed [`UiEvent`]s.
//! A click is a left-button release over a button that was also pressed over
//! it. Nothing is drawn here: the viewer paints each button with egui at its
//! rect and feeds egui clicks back as [`UiEvent`]s on the input snapshot.

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

use crate::input::{InputSnapshot, MouseButton};
use crate::presets::Preset;

/// Distance between the window edge and the first widget, in pixels.
pub const UI_MARGIN: f32 = 20.0;
/// Gap between stacked widgets, in pixels.
pub const UI_ITEM_SPACING: f32 = 6.0;
pub const BUTTON_SIZE: Vec2 = Vec2::new(180.0, 28.0);

/// What a widget asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiEvent {
    SelectPreset(Preset),
    ReloadMesh,
}

/// Colors for the three visual states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButtonStyle {
    pub idle: Vec4,
    pub hover: Vec4,
    pub press: Vec4,
    pub text: Vec4,
}

impl ButtonStyle {
    pub const DEFAULT: ButtonStyle = ButtonStyle {
        idle: Vec4::new(0.2, 0.2, 0.2, 1.0),
        hover: Vec4::new(0.55, 0.55, 0.45, 1.0),
        press: Vec4::new(0.8, 0.8, 0.65, 1.0),
        text: Vec4::new(0.9, 0.9, 0.9, 1.0),
    };

    /// Highlight for the active choice.
    pub const INTEREST: ButtonStyle = ButtonStyle {
        idle: Vec4::new(0.2, 0.4, 0.4, 1.0),
        hover: Vec4::new(0.4, 0.6, 0.6, 1.0),
        press: Vec4::new(0.6, 0.8, 0.8, 1.0),
        text: Vec4::new(0.7, 0.9, 0.9, 1.0),
    };
}

/// Axis-aligned screen rectangle, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self {
            min: origin,
            max: origin + size,
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.cmpge(self.min).all() && p.cmplt(self.max).all()
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

#[derive(Debug, Clone)]
pub struct Button {
    pub rect: Rect,
    pub label: String,
    pub style: ButtonStyle,
    pub event: UiEvent,
    hovered: bool,
    /// The left button went down over this button and is still held.
    armed: bool,
}

impl Button {
    pub fn new(rect: Rect, label: impl Into<String>, event: UiEvent) -> Self {
        Self {
            rect,
            label: label.into(),
            style: ButtonStyle::DEFAULT,
            event,
            hovered: false,
            armed: false,
        }
    }

    /// Feed one frame of input; returns the event on click.
    pub fn update(&mut self, input: &InputSnapshot) -> Option<UiEvent> {
        let left = input.mouse(MouseButton::Left);
        self.hovered = self.rect.contains(input.mouse_pos);

        let mut clicked = false;
        if left.released() {
            // Still down means the release came before this frame's press
            let armed_at_release = if left.is_down {
                self.armed
            } else {
                self.armed || (left.pressed() && self.hovered)
            };
            clicked = armed_at_release && self.hovered;
            self.armed = false;
        }
        if left.is_down && left.pressed() && self.hovered {
            self.armed = true;
        }

        clicked.then_some(self.event)
    }

    pub fn color(&self) -> Vec4 {
        if self.armed {
            self.style.press
        } else if self.hovered {
            self.style.hover
        } else {
            self.style.idle
        }
    }
}

/// All widgets on screen.
#[derive(Debug, Clone, Default)]
pub struct Gui {
    pub buttons: Vec<Button>,
}

impl Gui {
    /// One button per preset in a column, then "Reload mesh".
    pub fn preset_panel() -> Self {
        let mut buttons = Vec::new();
        let mut origin = Vec2::splat(UI_MARGIN);

        for preset in Preset::ALL {
            let label = format!("{}. {}", preset.index() + 1, preset.label());
            buttons.push(Button::new(
                Rect::from_origin_size(origin, BUTTON_SIZE),
                label,
                UiEvent::SelectPreset(preset),
            ));
            origin.y += BUTTON_SIZE.y + UI_ITEM_SPACING;
        }

        origin.y += UI_ITEM_SPACING;
        buttons.push(Button::new(
            Rect::from_origin_size(origin, BUTTON_SIZE),
            "R. Reload mesh",
            UiEvent::ReloadMesh,
        ));

        Self { buttons }
    }

    /// Update every button; events come back in button order.
    pub fn update(&mut self, input: &InputSnapshot) -> Vec<UiEvent> {
        self.buttons
            .iter_mut()
            .filter_map(|b| b.update(input))
            .collect()
    }

    /// Whether the cursor is over a widget, so drags should not reach the camera.
    pub fn wants_mouse(&self, input: &InputSnapshot) -> bool {
        self.buttons.iter().any(|b| b.armed || b.rect.contains(input.mouse_pos))
    }

    /// Highlight the button of the active preset.
    pub fn mark_active(&mut self, active: Preset) {
        for button in &mut self.buttons {
            button.style = match button.event {
                UiEvent::SelectPreset(p) if p == active => ButtonStyle::INTEREST,
                _ => ButtonStyle::DEFAULT,
            };
        }
    }
}
