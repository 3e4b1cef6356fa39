//! Seams between the engine and whatever displays it.

use noeul_core::{DeviceInfo, Viewport};

use crate::error::SkyError;
use crate::scene::{OrthoCamera, Scene};
use crate::texture::SpriteTextures;

/// What the engine asks for when creating a backend.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub viewport: Viewport,
    /// Device pixel ratio after the profile cap.
    pub pixel_ratio: f32,
    pub antialias: bool,
    /// Sprite textures, generated once per context and shared by handle.
    pub textures: SpriteTextures,
}

/// Draws a [`Scene`] somewhere.
pub trait RenderBackend {
    /// Match the drawing surface to a new viewport.
    fn resize(&mut self, viewport: &Viewport, pixel_ratio: f32);

    /// Draw one frame.
    fn render(&mut self, scene: &Scene, camera: &OrthoCamera) -> Result<(), SkyError>;
}

/// The environment a sky is embedded in.
pub trait Host {
    type Backend: RenderBackend;

    /// Size of the mount point, or `None` when there is nowhere to draw.
    fn mount(&self) -> Option<Viewport>;

    /// Facts used to pick the device tier.
    fn device_info(&self) -> DeviceInfo;

    fn create_backend(&mut self, settings: &BackendSettings) -> Result<Self::Backend, SkyError>;
}
