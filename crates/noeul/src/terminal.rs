//! Terminal host for the sky engine.
//!
//! Each terminal cell is treated as an 8x16 block of logical pixels and is
//! drawn as an upper half block, so every cell carries two vertically
//! stacked color samples: the foreground paints the top half and the
//! background paints the bottom half.

use glam::Vec2;
use noeul_config::Config;
use noeul_core::{DeviceInfo, Rgb, Viewport};
use noeul_sky::{
    BackendSettings, Host, OrthoCamera, RenderBackend, Scene, SkyError, SpriteTextures, Sprite,
    gradient_color,
};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

/// Logical pixels per terminal column.
pub const CELL_WIDTH: f32 = 8.0;
/// Logical pixels per terminal row.
pub const CELL_HEIGHT: f32 = 16.0;

const HALF_BLOCK: &str = "▀";

/// Sub-sample offsets within a framebuffer pixel when smoothing is on.
const SMOOTH_SAMPLES: [(f32, f32); 4] = [(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)];
const SHARP_SAMPLES: [(f32, f32); 1] = [(0.5, 0.5)];

/// Logical viewport covering `cols` by `rows` cells.
pub fn viewport_for(cols: u16, rows: u16) -> Viewport {
    Viewport::new(cols as f32 * CELL_WIDTH, rows as f32 * CELL_HEIGHT)
}

/// Logical pixel at the center of a cell.
pub fn cell_center(col: u16, row: u16) -> Vec2 {
    Vec2::new(
        (col as f32 + 0.5) * CELL_WIDTH,
        (row as f32 + 0.5) * CELL_HEIGHT,
    )
}

/// The terminal as seen by the engine.
#[derive(Debug, Clone)]
pub struct TerminalHost {
    cols: u16,
    rows: u16,
    config: Config,
}

impl TerminalHost {
    pub fn new(cols: u16, rows: u16, config: Config) -> Self {
        Self { cols, rows, config }
    }
}

impl Host for TerminalHost {
    type Backend = TerminalBackend;

    fn mount(&self) -> Option<Viewport> {
        (self.cols > 0 && self.rows > 0).then(|| viewport_for(self.cols, self.rows))
    }

    fn device_info(&self) -> DeviceInfo {
        self.config.device_info(viewport_for(self.cols, self.rows).width)
    }

    fn create_backend(&mut self, settings: &BackendSettings) -> Result<TerminalBackend, SkyError> {
        TerminalBackend::new(settings)
    }
}

/// Software rasterizer into a grid of half-cell pixels.
#[derive(Debug)]
pub struct TerminalBackend {
    textures: SpriteTextures,
    antialias: bool,
    /// Framebuffer width in pixels, one per column.
    width: usize,
    /// Framebuffer height in pixels, two per row.
    height: usize,
    pixels: Vec<Rgb>,
}

impl TerminalBackend {
    pub fn new(settings: &BackendSettings) -> Result<Self, SkyError> {
        let mut backend = Self {
            textures: settings.textures.clone(),
            antialias: settings.antialias,
            width: 0,
            height: 0,
            pixels: Vec::new(),
        };
        backend.resize(&settings.viewport, settings.pixel_ratio);
        if backend.pixels.is_empty() {
            return Err(SkyError::BackendUnavailable(format!(
                "terminal area {}x{} has no cells",
                settings.viewport.width, settings.viewport.height
            )));
        }
        Ok(backend)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Framebuffer pixel, `y` counted in half rows from the top.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    fn samples(&self) -> &'static [(f32, f32)] {
        if self.antialias {
            &SMOOTH_SAMPLES
        } else {
            &SHARP_SAMPLES
        }
    }

    fn fill_backdrop(&mut self, scene: &Scene, camera: &OrthoCamera) {
        let (w, h) = (self.width as f32, self.height as f32);
        for y in 0..self.height {
            let color = match scene.backdrop() {
                Some(quad) => {
                    let world = camera.screen_to_world(Vec2::new(0.0, y as f32 + 0.5), w, h);
                    gradient_color(quad.gradient_t(world.y))
                }
                None => Rgb::BLACK,
            };
            let row = y * self.width;
            self.pixels[row..row + self.width].fill(color);
        }
    }

    fn draw_sprite(&mut self, sprite: &Sprite, camera: &OrthoCamera) {
        if sprite.opacity <= 0.0 || sprite.size.x <= 0.0 || sprite.size.y <= 0.0 {
            return;
        }
        let (w, h) = (self.width as f32, self.height as f32);
        let center = camera.world_to_screen(sprite.center, w, h);
        // Pixels per world unit on each axis.
        let kx = w / camera.width().max(f32::EPSILON);
        let ky = h / camera.height().max(f32::EPSILON);
        // A rotated quad always fits inside the circle around its diagonal.
        let reach = sprite.size.length() / 2.0;
        let x0 = (center.x - reach * kx).floor().max(0.0) as usize;
        let x1 = ((center.x + reach * kx).ceil().max(0.0) as usize).min(self.width);
        let y0 = (center.y - reach * ky).floor().max(0.0) as usize;
        let y1 = ((center.y + reach * ky).ceil().max(0.0) as usize).min(self.height);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let texture = self.textures.get(sprite.texture);
        let (sin, cos) = (-sprite.rotation).sin_cos();
        let samples = self.samples();
        let weight = sprite.opacity / samples.len() as f32;

        for y in y0..y1 {
            for x in x0..x1 {
                let mut light = Rgb::BLACK;
                for &(sx, sy) in samples {
                    let screen = Vec2::new(x as f32 + sx, y as f32 + sy);
                    let d = camera.screen_to_world(screen, w, h) - sprite.center;
                    let local = Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos);
                    let u = local.x / sprite.size.x + 0.5;
                    let v = 0.5 - local.y / sprite.size.y;
                    let [r, g, b, a] = texture.sample(u, v);
                    light = light.add(Rgb::new(r, g, b).scale(a));
                }
                let idx = y * self.width + x;
                self.pixels[idx] = self.pixels[idx].add(light.tint(sprite.color).scale(weight));
            }
        }
    }
}

impl RenderBackend for TerminalBackend {
    fn resize(&mut self, viewport: &Viewport, _pixel_ratio: f32) {
        let viewport = viewport.sanitized();
        self.width = (viewport.width / CELL_WIDTH).round() as usize;
        self.height = (viewport.height / CELL_HEIGHT).round() as usize * 2;
        self.pixels.clear();
        self.pixels.resize(self.width * self.height, Rgb::BLACK);
    }

    fn render(&mut self, scene: &Scene, camera: &OrthoCamera) -> Result<(), SkyError> {
        if self.pixels.is_empty() {
            return Err(SkyError::Render("framebuffer has no pixels".into()));
        }
        self.fill_backdrop(scene, camera);
        for sprite in scene.sprites() {
            self.draw_sprite(sprite, camera);
        }
        for pixel in &mut self.pixels {
            *pixel = pixel.clamped();
        }
        Ok(())
    }
}

/// Paints a rendered framebuffer into a ratatui buffer.
pub struct SkyView<'a> {
    backend: &'a TerminalBackend,
}

impl<'a> SkyView<'a> {
    pub fn new(backend: &'a TerminalBackend) -> Self {
        Self { backend }
    }
}

impl Widget for SkyView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        for row in 0..area.height {
            for col in 0..area.width {
                let (x, y) = (col as usize, row as usize * 2);
                let pixels = (self.backend.pixel(x, y), self.backend.pixel(x, y + 1));
                let (Some(top), Some(bottom)) = pixels else {
                    continue;
                };
                buf[(area.x + col, area.y + row)]
                    .set_symbol(HALF_BLOCK)
                    .set_fg(top.to_color())
                    .set_bg(bottom.to_color());
            }
        }
    }
}
