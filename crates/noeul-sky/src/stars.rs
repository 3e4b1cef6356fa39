//! Twinkling star field.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use noeul_core::{DeviceProfile, Rgb, Viewport};
use rand::Rng;

use crate::scene::{Scene, Sprite, TextureKind};

/// Fraction of the viewport height, measured up from the bottom, that
/// stays free of stars.
const HORIZON_BAND: f32 = 0.18;
/// Fraction of the viewport height stars are spread over.
const SKY_SPAN: f32 = 0.82;
/// Below this normalized height the horizon fade kicks in.
const FADE_START: f32 = 0.25;
const FADE_EXPONENT: f32 = 0.6;
const STAR_Z: f32 = -5.0;
/// Radians per second every flare spins.
const SPIN_RATE: f64 = 0.15;

/// Oscillating brightness term for one star.
///
/// Three incommensurate sines keep the pattern from visibly repeating.
/// The result stays within `-0.9..=0.9` and is smooth in `t`.
pub fn twinkle(t: f64, phase: f64, speed: f64) -> f64 {
    (t * speed * 1.5 + phase).sin() * 0.4
        + (t * speed * 3.2 + phase * 1.7).sin() * 0.3
        + (t * speed * 1.1 + phase * 3.1).sin() * 0.2
}

/// Horizon attenuation for a star at normalized height `n` (0 = lowest).
fn horizon_fade(n: f32) -> f32 {
    if n > FADE_START {
        1.0
    } else {
        (n.max(0.0) / FADE_START).powf(FADE_EXPONENT)
    }
}

/// One star. Immutable after generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarParticle {
    pub position: Vec3,
    pub size: f32,
    pub phase: f32,
    pub speed: f32,
    pub rotation: f32,
    pub base_alpha: f32,
}

/// How a star looks at a given moment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarAppearance {
    pub alpha: f32,
    pub size: f32,
    pub rotation: f32,
}

impl StarParticle {
    fn random<R: Rng + ?Sized>(rng: &mut R, width: f32, height: f32, size_scale: f32) -> Self {
        let x = (rng.r#gen::<f32>() - 0.5) * width;
        let y = rng.r#gen::<f32>() * SKY_SPAN * height - height * HORIZON_BAND;

        let size = match rng.r#gen::<f32>() {
            f if f < 0.65 => 8.0 + rng.r#gen::<f32>() * 10.0,
            f if f < 0.88 => 18.0 + rng.r#gen::<f32>() * 14.0,
            _ => 32.0 + rng.r#gen::<f32>() * 20.0,
        } * size_scale;

        let phase = rng.r#gen::<f32>() * TAU;
        let speed = 1.2 + rng.r#gen::<f32>() * 2.0;
        let rotation = rng.r#gen::<f32>() * PI * 0.25;

        let normalized = if height > 0.0 {
            (y + height * HORIZON_BAND) / height
        } else {
            1.0
        };
        let base_alpha = (0.5 + rng.r#gen::<f32>() * 0.5) * horizon_fade(normalized);

        Self {
            position: Vec3::new(x, y, STAR_Z),
            size,
            phase,
            speed,
            rotation,
            base_alpha,
        }
    }

    /// Alpha, size and rotation at global time `t` seconds.
    pub fn appearance(&self, t: f64) -> StarAppearance {
        let tw = twinkle(t, self.phase as f64, self.speed as f64);
        let alpha = self.base_alpha as f64 * (0.2 + (tw + 0.8).max(0.0));
        let size = self.size as f64 * (0.65 + tw * 0.5 + 0.35).max(0.0);
        let rotation = (self.rotation as f64 + t * SPIN_RATE).rem_euclid(std::f64::consts::TAU);
        StarAppearance {
            alpha: alpha.clamp(0.0, 1.0) as f32,
            size: size as f32,
            rotation: rotation as f32,
        }
    }
}

/// Fixed-size batch of stars plus the shared time input.
#[derive(Debug, Clone, Default)]
pub struct StarField {
    stars: Vec<StarParticle>,
    time: f64,
    generation: u64,
}

impl StarField {
    /// Scatter stars over the viewport.
    pub fn generate<R: Rng + ?Sized>(
        rng: &mut R,
        viewport: &Viewport,
        profile: &DeviceProfile,
    ) -> Self {
        let mut field = Self::default();
        field.populate(rng, viewport, profile);
        field
    }

    /// Throw the current stars away and scatter a new set.
    pub fn rebuild<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        viewport: &Viewport,
        profile: &DeviceProfile,
    ) {
        self.populate(rng, viewport, profile);
        self.generation += 1;
    }

    fn populate<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        viewport: &Viewport,
        profile: &DeviceProfile,
    ) {
        let count = profile.star_count(viewport.width, viewport.height);
        self.stars.clear();
        self.stars.extend((0..count).map(|_| {
            StarParticle::random(rng, viewport.width, viewport.height, profile.star_size_scale)
        }));
    }

    /// Feed the global clock into the twinkle animation.
    pub fn set_time(&mut self, seconds: f64) {
        if seconds.is_finite() {
            self.time = seconds;
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of rebuilds since creation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stars(&self) -> &[StarParticle] {
        &self.stars
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn clear(&mut self) {
        self.stars.clear();
    }

    /// Add one flare sprite per visible star.
    pub fn emit(&self, scene: &mut Scene) {
        for star in &self.stars {
            let look = star.appearance(self.time);
            if look.alpha <= 0.0 || look.size <= 0.0 {
                continue;
            }
            scene.push(Sprite {
                texture: TextureKind::Flare,
                center: star.position.truncate(),
                size: Vec2::splat(look.size),
                rotation: look.rotation,
                color: Rgb::WHITE,
                opacity: look.alpha,
                z: star.position.z,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn field(seed: u64, viewport: Viewport, profile: DeviceProfile) -> StarField {
        let mut rng = StdRng::seed_from_u64(seed);
        StarField::generate(&mut rng, &viewport, &profile)
    }

    #[test]
    fn test_count_follows_profile() {
        let big = field(1, Viewport::new(1920.0, 1080.0), DeviceProfile::DESKTOP);
        assert_eq!(big.len(), 200);
        let mobile = field(1, Viewport::new(390.0, 844.0), DeviceProfile::MOBILE);
        assert_eq!(mobile.len(), 41);
        let empty = field(1, Viewport::new(0.0, 0.0), DeviceProfile::DESKTOP);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_placement_and_sizes() {
        let (w, h) = (1600.0, 900.0);
        let stars = field(7, Viewport::new(w, h), DeviceProfile::DESKTOP);
        for star in stars.stars() {
            assert!(star.position.x >= -w / 2.0 && star.position.x <= w / 2.0);
            assert!(star.position.y >= -h * HORIZON_BAND);
            assert!(star.position.y <= h * (SKY_SPAN - HORIZON_BAND));
            assert!(star.size >= 8.0 && star.size <= 52.0);
            assert!(star.base_alpha >= 0.0 && star.base_alpha <= 1.0);
            assert!(star.speed >= 1.2 && star.speed <= 3.2);
        }
    }

    #[test]
    fn test_mobile_stars_are_smaller() {
        let stars = field(3, Viewport::new(1600.0, 900.0), DeviceProfile::MOBILE);
        assert!(stars.stars().iter().all(|s| s.size <= 52.0 * 0.7 + 1e-3));
    }

    #[test]
    fn test_horizon_fade() {
        assert_eq!(horizon_fade(0.8), 1.0);
        assert_eq!(horizon_fade(0.26), 1.0);
        assert_eq!(horizon_fade(0.0), 0.0);
        assert!((horizon_fade(0.25) - 1.0).abs() < 1e-6);
        assert!(horizon_fade(0.1) < horizon_fade(0.2));
        assert_eq!(horizon_fade(-0.5), 0.0);
    }

    #[test]
    fn test_twinkle_is_bounded_and_continuous() {
        for phase_step in 0..16 {
            let phase = phase_step as f64 * std::f64::consts::TAU / 16.0;
            for speed in [1.2, 2.0, 3.2] {
                let mut prev = twinkle(0.0, phase, speed);
                for i in 1..4000 {
                    let t = i as f64 * 0.001;
                    let v = twinkle(t, phase, speed);
                    assert!(v.abs() <= 0.9 + 1e-9);
                    // Slope is bounded by 0.4*1.5 + 0.3*3.2 + 0.2*1.1 = 1.78 per unit speed
                    assert!((v - prev).abs() <= 1.78 * speed * 0.001 + 1e-9);
                    prev = v;
                }
            }
        }
    }

    #[test]
    fn test_appearance_is_continuous_and_clamped() {
        let star = StarParticle {
            position: Vec3::new(0.0, 0.0, STAR_Z),
            size: 20.0,
            phase: 5.9,
            speed: 3.2,
            rotation: 0.3,
            base_alpha: 1.0,
        };
        let mut prev = star.appearance(0.0);
        for i in 1..5000 {
            let look = star.appearance(i as f64 * 0.001);
            assert!((0.0..=1.0).contains(&look.alpha));
            assert!(look.size >= 0.0 && look.size <= 20.0 * 1.45 + 1e-3);
            assert!((look.alpha - prev.alpha).abs() < 0.02);
            assert!((look.size - prev.size).abs() < 0.2);
            prev = look;
        }
    }

    #[test]
    fn test_rotation_advances_slowly() {
        let star = StarParticle {
            position: Vec3::ZERO,
            size: 10.0,
            phase: 0.0,
            speed: 1.0,
            rotation: 0.5,
            base_alpha: 1.0,
        };
        let a = star.appearance(0.0).rotation;
        let b = star.appearance(2.0).rotation;
        assert!((b - a - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_rebuild_bumps_generation() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut stars =
            StarField::generate(&mut rng, &Viewport::new(800.0, 600.0), &DeviceProfile::DESKTOP);
        assert_eq!(stars.generation(), 0);
        let before = stars.stars().to_vec();
        stars.rebuild(&mut rng, &Viewport::new(400.0, 300.0), &DeviceProfile::DESKTOP);
        assert_eq!(stars.generation(), 1);
        assert_eq!(stars.len(), DeviceProfile::DESKTOP.star_count(400.0, 300.0));
        assert_ne!(stars.stars(), &before[..]);
    }

    #[test]
    fn test_emit_one_sprite_per_visible_star() {
        let mut stars = field(5, Viewport::new(800.0, 600.0), DeviceProfile::DESKTOP);
        stars.set_time(1.5);
        let mut scene = Scene::new();
        stars.emit(&mut scene);
        assert!(scene.len() <= stars.len());
        assert!(scene.sprites().iter().all(|s| s.texture == TextureKind::Flare));
        assert!(scene.sprites().iter().all(|s| s.opacity > 0.0 && s.opacity <= 1.0));
    }
}
