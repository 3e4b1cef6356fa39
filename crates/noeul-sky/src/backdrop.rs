//! Twilight gradient backdrop.

use glam::Vec2;
use noeul_core::{Rgb, Viewport};

use crate::scene::BackdropQuad;

/// The backdrop plane is larger than the viewport so its edges never show.
const OVERSCAN: f32 = 1.5;

/// Depth of the backdrop, behind every sprite.
const BACKDROP_Z: f32 = -50.0;

/// Gradient stops from the zenith (0.0) to the horizon (1.0).
const STOPS: [(f32, Rgb); 8] = [
    (0.0, Rgb::new(0.039, 0.086, 0.157)),
    (0.25, Rgb::new(0.071, 0.145, 0.29)),
    (0.45, Rgb::new(0.118, 0.227, 0.373)),
    (0.6, Rgb::new(0.239, 0.165, 0.361)),
    (0.75, Rgb::new(0.361, 0.239, 0.361)),
    (0.85, Rgb::new(0.545, 0.353, 0.42)),
    (0.92, Rgb::new(0.769, 0.471, 0.353)),
    (1.0, Rgb::new(0.831, 0.647, 0.455)),
];

/// Sky color at normalized depth `t` (0 = top, 1 = bottom of the plane).
pub fn gradient_color(t: f32) -> Rgb {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    for pair in STOPS.windows(2) {
        let (a_at, a) = pair[0];
        let (b_at, b) = pair[1];
        if t < b_at {
            return a.lerp(b, (t - a_at) / (b_at - a_at));
        }
    }
    STOPS[STOPS.len() - 1].1
}

/// Full-viewport gradient surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyBackdrop {
    size: Vec2,
}

impl SkyBackdrop {
    pub fn new(viewport: &Viewport) -> Self {
        let mut backdrop = Self { size: Vec2::ZERO };
        backdrop.resize(viewport);
        backdrop
    }

    /// Recompute the plane geometry for a new viewport.
    pub fn resize(&mut self, viewport: &Viewport) {
        self.size = Vec2::new(viewport.width, viewport.height) * OVERSCAN;
    }

    pub fn quad(&self) -> BackdropQuad {
        BackdropQuad {
            center: Vec2::ZERO,
            size: self.size,
            z: BACKDROP_Z,
        }
    }
}
