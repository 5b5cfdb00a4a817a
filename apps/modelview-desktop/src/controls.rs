use modelview_render::ArcRotateCamera;
use winit::event::{MouseButton, MouseScrollDelta};

/// Pixel deltas reported by touchpads, per wheel line.
const PIXELS_PER_LINE: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drag {
    Rotate,
    Pan,
}

/// Pointer controls attached to the canvas: left drag orbits, right drag
/// pans, the wheel zooms.
#[derive(Debug, Default)]
pub struct PointerControls {
    drag: Option<Drag>,
    last: Option<(f32, f32)>,
}

impl PointerControls {
    pub fn button(&mut self, button: MouseButton, pressed: bool) {
        let drag = match button {
            MouseButton::Left => Drag::Rotate,
            MouseButton::Right => Drag::Pan,
            _ => return,
        };
        if pressed {
            self.drag = Some(drag);
        } else if self.drag == Some(drag) {
            self.drag = None;
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn moved(&mut self, x: f32, y: f32, camera: &mut ArcRotateCamera) {
        let previous = self.last.replace((x, y));
        let (Some(drag), Some((px, py))) = (self.drag, previous) else {
            return;
        };
        let (dx, dy) = (x - px, y - py);
        match drag {
            Drag::Rotate => camera.rotate(dx, dy),
            Drag::Pan => camera.pan(dx, dy),
        }
    }

    pub fn wheel(&mut self, delta: MouseScrollDelta, camera: &mut ArcRotateCamera) {
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
        };
        camera.zoom(lines);
    }
}
