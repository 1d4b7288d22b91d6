//! Window input to camera commands.

use std::collections::HashMap;

use horizon_host::host::SurfaceId;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Camera command the sky engine understands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraInput {
    /// Drag delta in pixels.
    Orbit { delta_pitch: f32, delta_yaw: f32 },
    /// Positive zooms in.
    Zoom(f32),
    /// Field-of-view change in degrees.
    AdjustFov(f32),
    ToggleGrid,
    Reset,
}

/// Zoom units per wheel line.
const LINE_ZOOM: f32 = 50.0;
/// Degrees per `[` / `]` press.
const FOV_STEP: f32 = 5.0;

#[derive(Debug, Default)]
struct Drag {
    pressed: bool,
    last: Option<PhysicalPosition<f64>>,
}

/// Tracks left-button drags per surface and maps window events to
/// [`CameraInput`].
#[derive(Debug, Default)]
pub struct InputMapper {
    drags: HashMap<SurfaceId, Drag>,
}

impl InputMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&mut self, surface: &SurfaceId, event: &WindowEvent) -> Option<CameraInput> {
        match event {
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                let drag = self.drags.entry(surface.clone()).or_default();
                drag.pressed = *state == ElementState::Pressed;
                None
            }

            WindowEvent::CursorMoved { position, .. } => {
                let drag = self.drags.entry(surface.clone()).or_default();
                let last = drag.last.replace(*position)?;
                drag.pressed.then(|| CameraInput::Orbit {
                    delta_pitch: (position.y - last.y) as f32,
                    delta_yaw: (position.x - last.x) as f32,
                })
            }

            WindowEvent::CursorLeft { .. } | WindowEvent::Focused(false) => {
                self.drags.remove(surface);
                None
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y * LINE_ZOOM,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32,
                };
                (amount != 0.0).then_some(CameraInput::Zoom(amount))
            }

            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed && !event.repeat => {
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::KeyG) => Some(CameraInput::ToggleGrid),
                    PhysicalKey::Code(KeyCode::KeyR) => Some(CameraInput::Reset),
                    PhysicalKey::Code(KeyCode::BracketLeft) => Some(CameraInput::AdjustFov(-FOV_STEP)),
                    PhysicalKey::Code(KeyCode::BracketRight) => Some(CameraInput::AdjustFov(FOV_STEP)),
                    _ => None,
                }
            }

            _ => None,
        }
    }

    /// Forgets drag state for a closed surface.
    pub fn forget(&mut self, surface: &SurfaceId) {
        self.drags.remove(surface);
    }
}
