//! Glow sprite textures.
//!
//! Two small RGBA images are painted once at startup: a four-pointed flare
//! used by every star and a soft radial glow used by every meteor segment.
//! They are shared through [`Arc`] and never modified afterwards.

use std::f32::consts::FRAC_PI_4;
use std::sync::Arc;

use glam::Vec2;
use image::{Rgba, RgbaImage};

/// Edge length of both sprite textures in pixels.
pub const TEXTURE_SIZE: u32 = 128;

/// Straight (non-premultiplied) RGBA in `0.0..=1.0`.
type Rgbaf = [f32; 4];

/// Offsets inside a pixel used to estimate shape coverage.
const COVERAGE_SAMPLES: [(f32, f32); 4] = [(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)];

/// A read-only sprite image.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteTexture {
    image: RgbaImage,
}

impl SpriteTexture {
    pub fn size(&self) -> u32 {
        self.image.width()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Bilinear sample at texture coordinates `u`, `v` (`0.0..=1.0`, `v` down).
    ///
    /// Coordinates outside the unit square are fully transparent.
    pub fn sample(&self, u: f32, v: f32) -> Rgbaf {
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return [0.0; 4];
        }
        let size = self.size();
        if size == 0 {
            return [0.0; 4];
        }
        let max = (size - 1) as f32;
        let x = (u * size as f32 - 0.5).clamp(0.0, max);
        let y = (v * size as f32 - 0.5).clamp(0.0, max);
        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(size - 1);
        let y1 = (y0 + 1).min(size - 1);
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let p00 = to_float(self.image.get_pixel(x0, y0));
        let p10 = to_float(self.image.get_pixel(x1, y0));
        let p01 = to_float(self.image.get_pixel(x0, y1));
        let p11 = to_float(self.image.get_pixel(x1, y1));

        let mut out = [0.0; 4];
        for (i, slot) in out.iter_mut().enumerate() {
            let top = p00[i] + (p10[i] - p00[i]) * fx;
            let bottom = p01[i] + (p11[i] - p01[i]) * fx;
            *slot = top + (bottom - top) * fy;
        }
        out
    }
}

/// The two shared textures.
#[derive(Debug, Clone)]
pub struct SpriteTextures {
    pub flare: Arc<SpriteTexture>,
    pub glow: Arc<SpriteTexture>,
}

impl SpriteTextures {
    /// Paint both textures.
    pub fn generate() -> Self {
        Self {
            flare: Arc::new(star_flare(TEXTURE_SIZE)),
            glow: Arc::new(meteor_glow(TEXTURE_SIZE)),
        }
    }

    pub fn get(&self, kind: crate::TextureKind) -> &SpriteTexture {
        match kind {
            crate::TextureKind::Flare => &self.flare,
            crate::TextureKind::Glow => &self.glow,
        }
    }
}

fn to_float(p: &Rgba<u8>) -> Rgbaf {
    [
        p[0] as f32 / 255.0,
        p[1] as f32 / 255.0,
        p[2] as f32 / 255.0,
        p[3] as f32 / 255.0,
    ]
}

/// Color stops along a gradient.
type Stops = [(f32, Rgbaf)];

fn rgba(r: u8, g: u8, b: u8, a: f32) -> Rgbaf {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a]
}

fn gradient_at(stops: &Stops, t: f32) -> Rgbaf {
    let Some(&(first_at, first)) = stops.first() else {
        return [0.0; 4];
    };
    if t <= first_at {
        return first;
    }
    for pair in stops.windows(2) {
        let (a_at, a) = pair[0];
        let (b_at, b) = pair[1];
        if t <= b_at {
            let span = (b_at - a_at).max(f32::EPSILON);
            let k = (t - a_at) / span;
            let mut out = [0.0; 4];
            for i in 0..4 {
                out[i] = a[i] + (b[i] - a[i]) * k;
            }
            return out;
        }
    }
    stops[stops.len() - 1].1
}

/// Parameter of `p` projected onto the segment `from`..`to`.
fn linear_t(p: Vec2, from: Vec2, to: Vec2) -> f32 {
    let axis = to - from;
    let len_sq = axis.length_squared();
    if len_sq <= f32::EPSILON {
        return 0.0;
    }
    (p - from).dot(axis) / len_sq
}

/// Point in a convex polygon given in either winding order.
fn inside_convex(p: Vec2, poly: &[Vec2]) -> bool {
    let mut sign = 0.0f32;
    for (i, a) in poly.iter().enumerate() {
        let b = poly[(i + 1) % poly.len()];
        let cross = (b - *a).perp_dot(p - *a);
        if cross.abs() <= f32::EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

/// Floating point paint surface with source-over compositing.
struct Canvas {
    size: u32,
    pixels: Vec<Rgbaf>,
}

impl Canvas {
    fn new(size: u32) -> Self {
        Self {
            size,
            pixels: vec![[0.0; 4]; (size * size) as usize],
        }
    }

    /// Fill every pixel covered by `covers` with the color returned by `paint`.
    fn fill(&mut self, covers: impl Fn(Vec2) -> bool, paint: impl Fn(Vec2) -> Rgbaf) {
        for y in 0..self.size {
            for x in 0..self.size {
                let hits = COVERAGE_SAMPLES
                    .iter()
                    .filter(|(dx, dy)| covers(Vec2::new(x as f32 + dx, y as f32 + dy)))
                    .count();
                if hits == 0 {
                    continue;
                }
                let coverage = hits as f32 / COVERAGE_SAMPLES.len() as f32;
                let mut src = paint(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
                src[3] *= coverage;
                let idx = (y * self.size + x) as usize;
                self.pixels[idx] = source_over(src, self.pixels[idx]);
            }
        }
    }

    fn into_texture(self) -> SpriteTexture {
        let size = self.size;
        let image = RgbaImage::from_fn(size, size, |x, y| {
            let p = self.pixels[(y * size + x) as usize];
            let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            Rgba([q(p[0]), q(p[1]), q(p[2]), q(p[3])])
        });
        SpriteTexture { image }
    }
}

fn source_over(src: Rgbaf, dst: Rgbaf) -> Rgbaf {
    let sa = src[3].clamp(0.0, 1.0);
    let da = dst[3];
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0.0; 4];
    }
    let mut out = [0.0, 0.0, 0.0, out_a];
    for i in 0..3 {
        out[i] = (src[i] * sa + dst[i] * da * (1.0 - sa)) / out_a;
    }
    out
}

/// Rotate `p` around `center` by `angle` radians.
fn rotate_about(p: Vec2, center: Vec2, angle: f32) -> Vec2 {
    center + Vec2::from_angle(angle).rotate(p - center)
}

/// Four-pointed star flare: long vertical and horizontal spikes, shorter
/// diagonal spikes and a bright round core.
pub(crate) fn star_flare(size: u32) -> SpriteTexture {
    let s = size as f32;
    let c = Vec2::splat(s / 2.0);
    let mut canvas = Canvas::new(size);

    let spike: [(f32, Rgbaf); 5] = [
        (0.0, rgba(255, 255, 255, 0.0)),
        (0.35, rgba(220, 240, 255, 0.15)),
        (0.5, rgba(255, 255, 255, 1.0)),
        (0.65, rgba(220, 240, 255, 0.15)),
        (1.0, rgba(255, 255, 255, 0.0)),
    ];

    let vertical = [
        Vec2::new(c.x, 0.0),
        Vec2::new(c.x + 3.0, c.y),
        Vec2::new(c.x, s),
        Vec2::new(c.x - 3.0, c.y),
    ];
    canvas.fill(
        |p| inside_convex(p, &vertical),
        |p| gradient_at(&spike, linear_t(p, Vec2::new(c.x, 0.0), Vec2::new(c.x, s))),
    );

    let horizontal = [
        Vec2::new(0.0, c.y),
        Vec2::new(c.x, c.y + 3.0),
        Vec2::new(s, c.y),
        Vec2::new(c.x, c.y - 3.0),
    ];
    canvas.fill(
        |p| inside_convex(p, &horizontal),
        |p| gradient_at(&spike, linear_t(p, Vec2::new(0.0, c.y), Vec2::new(s, c.y))),
    );

    // Diagonals are drawn unrotated and the lookup point is rotated back.
    let diagonal: [(f32, Rgbaf); 3] = [
        (0.0, rgba(255, 255, 255, 0.0)),
        (0.5, rgba(255, 255, 255, 0.5)),
        (1.0, rgba(255, 255, 255, 0.0)),
    ];
    let (lo, hi) = (s * 0.2, s * 0.8);
    let diag_v = [
        Vec2::new(c.x, lo),
        Vec2::new(c.x + 2.0, c.y),
        Vec2::new(c.x, hi),
        Vec2::new(c.x - 2.0, c.y),
    ];
    let diag_h = [
        Vec2::new(lo, c.y),
        Vec2::new(c.x, c.y + 2.0),
        Vec2::new(hi, c.y),
        Vec2::new(c.x, c.y - 2.0),
    ];
    let unrotate = |p: Vec2| rotate_about(p, c, -FRAC_PI_4);
    canvas.fill(
        |p| inside_convex(unrotate(p), &diag_v),
        |p| {
            gradient_at(
                &diagonal,
                linear_t(unrotate(p), Vec2::new(c.x, lo), Vec2::new(c.x, hi)),
            )
        },
    );
    canvas.fill(
        |p| inside_convex(unrotate(p), &diag_h),
        |p| {
            gradient_at(
                &diagonal,
                linear_t(unrotate(p), Vec2::new(lo, c.y), Vec2::new(hi, c.y)),
            )
        },
    );

    let core_radius = 8.0;
    let core: [(f32, Rgbaf); 3] = [
        (0.0, rgba(255, 255, 255, 1.0)),
        (0.5, rgba(255, 255, 255, 0.8)),
        (1.0, rgba(255, 255, 255, 0.0)),
    ];
    canvas.fill(
        |p| p.distance(c) <= core_radius,
        |p| gradient_at(&core, p.distance(c) / core_radius),
    );

    canvas.into_texture()
}

/// Soft radial falloff used for meteor segments.
pub(crate) fn meteor_glow(size: u32) -> SpriteTexture {
    let s = size as f32;
    let c = Vec2::splat(s / 2.0);
    let radius = s / 2.0;
    let stops: [(f32, Rgbaf); 6] = [
        (0.0, rgba(255, 255, 255, 0.9)),
        (0.1, rgba(230, 245, 255, 0.7)),
        (0.25, rgba(200, 230, 250, 0.4)),
        (0.45, rgba(170, 210, 240, 0.2)),
        (0.7, rgba(150, 195, 230, 0.08)),
        (1.0, rgba(140, 185, 220, 0.0)),
    ];

    let mut canvas = Canvas::new(size);
    canvas.fill(|_| true, |p| gradient_at(&stops, p.distance(c) / radius));
    canvas.into_texture()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha(tex: &SpriteTexture, x: u32, y: u32) -> u8 {
        tex.image().get_pixel(x, y)[3]
    }

    #[test]
    fn test_flare_bright_center_clear_corners() {
        let flare = star_flare(TEXTURE_SIZE);
        assert_eq!(flare.size(), TEXTURE_SIZE);
        assert!(alpha(&flare, 63, 63) > 230);
        assert!(alpha(&flare, 64, 64) > 230);
        assert_eq!(alpha(&flare, 0, 0), 0);
        assert_eq!(alpha(&flare, 127, 127), 0);
        // Between the spikes there is nothing
        assert_eq!(alpha(&flare, 40, 20), 0);
    }

    #[test]
    fn test_flare_is_mirror_symmetric() {
        let flare = star_flare(TEXTURE_SIZE);
        let last = TEXTURE_SIZE - 1;
        for y in (0..TEXTURE_SIZE).step_by(7) {
            for x in (0..TEXTURE_SIZE).step_by(5) {
                let a = alpha(&flare, x, y) as i32;
                let mirrored_x = alpha(&flare, last - x, y) as i32;
                let mirrored_y = alpha(&flare, x, last - y) as i32;
                assert!((a - mirrored_x).abs() <= 2, "x mirror at {x},{y}");
                assert!((a - mirrored_y).abs() <= 2, "y mirror at {x},{y}");
            }
        }
    }

    #[test]
    fn test_flare_has_diagonal_spikes() {
        let flare = star_flare(TEXTURE_SIZE);
        // A point on the 45 degree diagonal, inside the 20%..80% span
        assert!(alpha(&flare, 50, 50) > 0);
        // Beyond the diagonal span it fades to nothing
        assert_eq!(alpha(&flare, 12, 12), 0);
    }

    #[test]
    fn test_glow_falls_off_radially() {
        let glow = meteor_glow(TEXTURE_SIZE);
        let center = alpha(&glow, 64, 64);
        assert!(center > 200 && center <= 230);
        let mut last = center;
        for x in 65..TEXTURE_SIZE {
            let a = alpha(&glow, x, 64);
            assert!(a <= last, "alpha increased at x={x}");
            last = a;
        }
        assert_eq!(alpha(&glow, 0, 0), 0);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = SpriteTextures::generate();
        let b = SpriteTextures::generate();
        assert_eq!(*a.flare, *b.flare);
        assert_eq!(*a.glow, *b.glow);
    }

    #[test]
    fn test_sample_outside_is_transparent() {
        let glow = meteor_glow(16);
        assert_eq!(glow.sample(-0.1, 0.5), [0.0; 4]);
        assert_eq!(glow.sample(0.5, 1.5), [0.0; 4]);
        let mid = glow.sample(0.5, 0.5);
        assert!(mid[3] > 0.5);
    }
}
