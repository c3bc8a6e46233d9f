// Viewport (pan + zoom) and the math every input path shares.
use serde::{Deserialize, Serialize};

use crate::model::{Point, Rect};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;
/// Zoom buttons multiply or divide by this.
pub const ZOOM_STEP: f64 = 1.6;
pub const FIT_PADDING: f64 = 100.0;

/// `screen = world * zoom + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, zoom: 1.0 }
    }
}

pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return MIN_ZOOM;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Sensitivity scales the rate of change, not the absolute zoom.
pub fn apply_sensitivity(factor: f64, sensitivity: f64) -> f64 {
    if !factor.is_finite() {
        return 1.0;
    }
    if sensitivity != 1.0 {
        1.0 + (factor - 1.0) * sensitivity
    } else {
        factor
    }
}

impl Viewport {
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        Point::new((p.x - self.x) / self.zoom, (p.y - self.y) / self.zoom)
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.zoom + self.x, p.y * self.zoom + self.y)
    }

    /// Direct screen-space translation; pan is not zoom-scaled.
    pub fn panned(&self, dx: f64, dy: f64) -> Viewport {
        Viewport { x: self.x + dx, y: self.y + dy, zoom: self.zoom }
    }

    /// Zoom to `target` keeping the screen point `anchor` fixed.
    pub fn zoomed_at(&self, anchor: Point, target: f64) -> Viewport {
        let zoom = clamp_zoom(target);
        let scale = zoom / self.zoom;
        Viewport {
            x: anchor.x - (anchor.x - self.x) * scale,
            y: anchor.y - (anchor.y - self.y) * scale,
            zoom,
        }
    }

    pub fn stepped(&self, center: Point, zoom_in: bool) -> Viewport {
        let target = if zoom_in { self.zoom * ZOOM_STEP } else { self.zoom / ZOOM_STEP };
        self.zoomed_at(center, target)
    }

    /// One step of the pinch recurrence: scale about the previous pinch
    /// centre, then translate by the centre's own drift.
    pub fn pinch_step(&self, last_center: Point, center: Point, factor: f64) -> Viewport {
        let zoom = clamp_zoom(self.zoom * factor);
        let scale = zoom / self.zoom;
        let v = last_center.offset_from(self.origin());
        Viewport {
            x: last_center.x - v.x * scale + (center.x - last_center.x),
            y: last_center.y - v.y * scale + (center.y - last_center.y),
            zoom,
        }
    }

    /// Frame `bounds` (world) inside a `width`×`height` screen area.
    /// Returns `None` for degenerate bounds.
    pub fn fit_bounds(bounds: &Rect, width: f64, height: f64, padding: f64) -> Option<Viewport> {
        if bounds.width <= 0.0 || bounds.height <= 0.0 {
            return None;
        }
        let sx = (width - padding * 2.0) / bounds.width;
        let sy = (height - padding * 2.0) / bounds.height;
        let zoom = sx.min(sy).clamp(FIT_MIN_ZOOM, FIT_MAX_ZOOM);
        let c = bounds.center();
        Some(Viewport { x: width / 2.0 - c.x * zoom, y: height / 2.0 - c.y * zoom, zoom })
    }
}

const FIT_MIN_ZOOM: f64 = 0.2;
const FIT_MAX_ZOOM: f64 = 2.0;
