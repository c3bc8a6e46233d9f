// Mouse wheel / trackpad: ctrl (or cmd) + wheel zooms about the pointer,
// a plain wheel pans.
use crate::model::Point;

use super::camera::Viewport;

const WHEEL_ZOOM_RATE: f64 = 0.006;
const LINE_HEIGHT_PX: f64 = 40.0;
const PAGE_HEIGHT_PX: f64 = 800.0;

/// `DOM_DELTA_LINE` / `DOM_DELTA_PAGE` from the wheel event.
const DELTA_LINE: u32 = 1;
const DELTA_PAGE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelInput {
    pub delta_x: f64,
    pub delta_y: f64,
    pub delta_mode: u32,
    /// Ctrl or Meta held; trackpad pinches arrive this way too.
    pub zoom_modifier: bool,
    /// Pointer is over a `data-ui` overlay, which scrolls natively.
    pub over_overlay: bool,
    /// Container-local pointer position.
    pub pointer: Point,
}

/// `None` when the canvas should leave the event to the browser.
pub fn wheel_viewport(viewport: Viewport, input: WheelInput, sensitivity: f64) -> Option<Viewport> {
    if input.over_overlay {
        return None;
    }
    if !input.zoom_modifier {
        return Some(viewport.panned(-input.delta_x, -input.delta_y));
    }
    let delta = match input.delta_mode {
        DELTA_LINE => input.delta_y * LINE_HEIGHT_PX,
        DELTA_PAGE => input.delta_y * PAGE_HEIGHT_PX,
        _ => input.delta_y,
    };
    let factor = (-delta * WHEEL_ZOOM_RATE * sensitivity).exp();
    if !factor.is_finite() {
        return Some(viewport);
    }
    Some(viewport.zoomed_at(input.pointer, viewport.zoom * factor))
}
