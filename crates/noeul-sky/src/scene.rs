//! Per-frame draw list and camera.

use glam::Vec2;
use noeul_core::{Rgb, Viewport};

/// Which shared texture a sprite samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Flare,
    Glow,
}

/// A camera-facing textured quad, additively blended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub texture: TextureKind,
    /// Center in world units (origin at the viewport center, y up).
    pub center: Vec2,
    /// Width and height in world units.
    pub size: Vec2,
    /// Rotation of the texture in radians.
    pub rotation: f32,
    pub color: Rgb,
    pub opacity: f32,
    pub z: f32,
}

/// The gradient backdrop plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackdropQuad {
    pub center: Vec2,
    pub size: Vec2,
    pub z: f32,
}

impl BackdropQuad {
    /// Gradient parameter for a world-space height: 0 at the top edge of the
    /// quad, 1 at the bottom.
    pub fn gradient_t(&self, world_y: f32) -> f32 {
        if self.size.y <= 0.0 {
            return 0.0;
        }
        let top = self.center.y + self.size.y / 2.0;
        ((top - world_y) / self.size.y).clamp(0.0, 1.0)
    }
}

/// Everything drawn in one frame.
#[derive(Debug, Default)]
pub struct Scene {
    backdrop: Option<BackdropQuad>,
    sprites: Vec<Sprite>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the previous frame's content while keeping the allocation.
    pub fn clear(&mut self) {
        self.backdrop = None;
        self.sprites.clear();
    }

    pub fn set_backdrop(&mut self, quad: BackdropQuad) {
        self.backdrop = Some(quad);
    }

    pub fn push(&mut self, sprite: Sprite) {
        self.sprites.push(sprite);
    }

    pub fn backdrop(&self) -> Option<&BackdropQuad> {
        self.backdrop.as_ref()
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty() && self.backdrop.is_none()
    }
}

/// Orthographic camera spanning the viewport, one world unit per pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoCamera {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
    pub z: f32,
}

impl OrthoCamera {
    pub fn for_viewport(viewport: &Viewport) -> Self {
        let mut camera = Self {
            left: 0.0,
            right: 0.0,
            top: 0.0,
            bottom: 0.0,
            near: 0.1,
            far: 1000.0,
            z: 100.0,
        };
        camera.update(viewport);
        camera
    }

    /// Re-fit the frustum to a new viewport.
    pub fn update(&mut self, viewport: &Viewport) {
        self.left = -viewport.width / 2.0;
        self.right = viewport.width / 2.0;
        self.top = viewport.height / 2.0;
        self.bottom = -viewport.height / 2.0;
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// Map a world point to screen coordinates (origin top-left, y down) on
    /// a surface of `screen_w` by `screen_h`.
    pub fn world_to_screen(&self, p: Vec2, screen_w: f32, screen_h: f32) -> Vec2 {
        let w = self.width().max(f32::EPSILON);
        let h = self.height().max(f32::EPSILON);
        Vec2::new(
            (p.x - self.left) / w * screen_w,
            (self.top - p.y) / h * screen_h,
        )
    }

    /// Inverse of [`OrthoCamera::world_to_screen`].
    pub fn screen_to_world(&self, s: Vec2, screen_w: f32, screen_h: f32) -> Vec2 {
        let sw = screen_w.max(f32::EPSILON);
        let sh = screen_h.max(f32::EPSILON);
        Vec2::new(
            self.left + s.x / sw * self.width(),
            self.top - s.y / sh * self.height(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_maps_corners() {
        let camera = OrthoCamera::for_viewport(&Viewport::new(800.0, 600.0));
        let tl = camera.world_to_screen(Vec2::new(-400.0, 300.0), 100.0, 50.0);
        assert_eq!(tl, Vec2::new(0.0, 0.0));
        let br = camera.world_to_screen(Vec2::new(400.0, -300.0), 100.0, 50.0);
        assert_eq!(br, Vec2::new(100.0, 50.0));
        let back = camera.screen_to_world(Vec2::new(50.0, 25.0), 100.0, 50.0);
        assert_eq!(back, Vec2::ZERO);
    }

    #[test]
    fn test_backdrop_gradient_parameter() {
        let quad = BackdropQuad {
            center: Vec2::ZERO,
            size: Vec2::new(300.0, 300.0),
            z: -50.0,
        };
        assert_eq!(quad.gradient_t(150.0), 0.0);
        assert_eq!(quad.gradient_t(-150.0), 1.0);
        assert_eq!(quad.gradient_t(0.0), 0.5);
        assert_eq!(quad.gradient_t(1000.0), 0.0);
    }

    #[test]
    fn test_scene_clear_keeps_nothing() {
        let mut scene = Scene::new();
        scene.set_backdrop(BackdropQuad {
            center: Vec2::ZERO,
            size: Vec2::ONE,
            z: 0.0,
        });
        scene.push(Sprite {
            texture: TextureKind::Glow,
            center: Vec2::ZERO,
            size: Vec2::ONE,
            rotation: 0.0,
            color: Rgb::WHITE,
            opacity: 1.0,
            z: 0.0,
        });
        assert_eq!(scene.len(), 1);
        scene.clear();
        assert!(scene.is_empty());
    }
}
