//! A single meteor: lifecycle state machine, trail and sprite slots.
//!
//! Every meteor owns a [`TrailRing`] and two arenas of [`SpriteSlot`]s (an
//! outer glow and a sharper core), one slot of each per trail sample. The
//! arenas are filled in place each update and reused across
//! [`Meteor::reset`], so a recycled meteor never reallocates.

use std::f32::consts::PI;

use glam::Vec2;
use noeul_core::{DeviceProfile, Rgb, Viewport};
use rand::Rng;

use crate::scene::{Scene, Sprite, TextureKind};
use crate::trail::{TrailRing, TrailSample};

const FADE_IN_STEP: f32 = 0.05;
const FADE_OUT_STEP: f32 = 0.015;
/// Updates allowed in [`MeteorPhase::FadingOut`] before forced disposal.
pub(crate) const FADE_OUT_LIMIT: u32 = 180;
const MIN_SCALE: f32 = 0.2;
const SHRINK: f32 = 0.65;
/// How strongly the wobble pushes the path sideways.
const WOBBLE_GAIN: f32 = 0.08;

const GLOW_SIZE: f32 = 40.0;
const CORE_SIZE: f32 = 10.0;
const HEAD_GLOW_SIZE: f32 = 18.0;
const HEAD_CORE_SIZE: f32 = 6.0;
const GLOW_MIN_ALPHA: f32 = 0.008;
const CORE_MIN_ALPHA: f32 = 0.02;

/// Lifecycle of a meteor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeteorPhase {
    FadingIn,
    Traveling,
    FadingOut,
    Disposed,
}

/// Randomized flight parameters chosen at spawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeteorParams {
    pub start: Vec2,
    /// Unit fall direction.
    pub direction: Vec2,
    pub curvature: f32,
    pub wobble_freq: f32,
    pub wobble_amp: f32,
    /// World units per update.
    pub speed: f32,
    pub total_distance: f32,
    /// Side the trail billows towards, `1.0` or `-1.0`.
    pub asymmetry_dir: f32,
    pub asymmetry_amount: f32,
}

impl MeteorParams {
    /// Draw parameters for a meteor entering from the top of `viewport`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, viewport: &Viewport) -> Self {
        let (w, h) = (viewport.width, viewport.height);
        let asymmetry_dir = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let asymmetry_amount = 0.3 + rng.r#gen::<f32>() * 0.4;
        let start = Vec2::new((rng.r#gen::<f32>() - 0.5) * w * 0.85, h / 2.0 + 50.0);
        let bias = (rng.r#gen::<f32>() - 0.5) * 0.6;

        Self {
            start,
            direction: Vec2::new(bias, -1.0).normalize(),
            curvature: (rng.r#gen::<f32>() - 0.5) * 0.0006,
            wobble_freq: 0.012 + rng.r#gen::<f32>() * 0.008,
            wobble_amp: 0.06 + rng.r#gen::<f32>() * 0.04,
            speed: 2.2 + rng.r#gen::<f32>() * 1.2,
            total_distance: h * (0.5 + rng.r#gen::<f32>() * 0.35),
            asymmetry_dir,
            asymmetry_amount,
        }
    }

    /// Straight vertical fall with no wobble or drift.
    pub fn straight(start: Vec2, speed: f32, total_distance: f32) -> Self {
        Self {
            start,
            direction: Vec2::NEG_Y,
            curvature: 0.0,
            wobble_freq: 0.0,
            wobble_amp: 0.0,
            speed,
            total_distance,
            asymmetry_dir: 1.0,
            asymmetry_amount: 0.5,
        }
    }

    fn sanitized(mut self) -> Self {
        self.direction = self.direction.try_normalize().unwrap_or(Vec2::NEG_Y);
        self.speed = if self.speed.is_finite() { self.speed.max(0.0) } else { 0.0 };
        // A meteor that cannot move goes straight to fading out.
        if !self.total_distance.is_finite() || self.speed == 0.0 {
            self.total_distance = 0.0;
        }
        self.asymmetry_dir = if self.asymmetry_dir < 0.0 { -1.0 } else { 1.0 };
        self
    }
}

/// Size multiplier and lateral offset for a trail segment at `progress`
/// (0 = head, 1 = tail).
///
/// The head emerges small, the body swells into a half-sine billow pushed
/// to one side by the asymmetry bias, and the tail decays back down.
pub fn segment_shape(progress: f32, asymmetry_dir: f32, asymmetry_amount: f32) -> (f32, f32) {
    let p = progress.clamp(0.0, 1.0);
    if p < 0.08 {
        (0.3 + p * 8.0, 0.0)
    } else if p < 0.25 {
        let t = (p - 0.08) / 0.17;
        (0.94 + t * 0.6, t * 3.0 * asymmetry_dir)
    } else if p < 0.55 {
        let t = (p - 0.25) / 0.3;
        let bulge = (t * PI).sin();
        (
            1.54 + bulge * 0.8,
            (3.0 + bulge * 8.0) * asymmetry_dir * asymmetry_amount,
        )
    } else {
        let t = (p - 0.55) / 0.45;
        (
            (1.54 + 0.8) * (1.0 - t * 0.5) * (1.0 + t * 0.3),
            (11.0 * asymmetry_amount) * (1.0 - t * 0.7) * asymmetry_dir,
        )
    }
}

/// A reusable renderable element owned by one meteor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteSlot {
    pub visible: bool,
    pub center: Vec2,
    pub size: Vec2,
    pub color: Rgb,
    pub opacity: f32,
    pub z: f32,
}

impl Default for SpriteSlot {
    fn default() -> Self {
        Self {
            visible: false,
            center: Vec2::ZERO,
            size: Vec2::ZERO,
            color: Rgb::WHITE,
            opacity: 0.0,
            z: 0.0,
        }
    }
}

impl SpriteSlot {
    fn hide(&mut self) {
        *self = Self::default();
    }

    fn to_sprite(self) -> Sprite {
        Sprite {
            texture: TextureKind::Glow,
            center: self.center,
            size: self.size,
            rotation: 0.0,
            color: self.color,
            opacity: self.opacity.clamp(0.0, 1.0),
            z: self.z,
        }
    }
}

/// One falling meteor.
#[derive(Debug, Clone)]
pub struct Meteor {
    params: MeteorParams,
    perpendicular: Vec2,
    position: Vec2,
    tick: u32,
    traveled: f32,
    opacity: f32,
    phase: MeteorPhase,
    current_scale: f32,
    fade_ticks: u32,
    size_scale: f32,
    trail: TrailRing,
    glow: Vec<SpriteSlot>,
    core: Vec<SpriteSlot>,
}

impl Meteor {
    /// Build a meteor with `slots` trail samples and sprite slots.
    pub fn new(params: MeteorParams, slots: usize, size_scale: f32) -> Self {
        let mut meteor = Self {
            params,
            perpendicular: Vec2::X,
            position: params.start,
            tick: 0,
            traveled: 0.0,
            opacity: 0.0,
            phase: MeteorPhase::FadingIn,
            current_scale: 1.0,
            fade_ticks: 0,
            size_scale,
            trail: TrailRing::with_capacity(slots),
            glow: vec![SpriteSlot::default(); slots],
            core: vec![SpriteSlot::default(); slots],
        };
        meteor.reset(params);
        meteor
    }

    /// Build a meteor with random parameters sized for `profile`.
    pub fn spawn<R: Rng + ?Sized>(
        rng: &mut R,
        viewport: &Viewport,
        profile: &DeviceProfile,
    ) -> Self {
        Self::new(
            MeteorParams::random(rng, viewport),
            profile.max_trail_length,
            profile.meteor_size_scale,
        )
    }

    /// Restart the lifecycle with new parameters, reusing trail and slots.
    pub fn reset(&mut self, params: MeteorParams) {
        let params = params.sanitized();
        self.params = params;
        self.perpendicular = Vec2::new(-params.direction.y, params.direction.x);
        self.position = params.start;
        self.tick = 0;
        self.traveled = 0.0;
        self.opacity = 0.0;
        self.phase = MeteorPhase::FadingIn;
        self.current_scale = 1.0;
        self.fade_ticks = 0;
        self.trail.clear();
        self.glow.iter_mut().for_each(SpriteSlot::hide);
        self.core.iter_mut().for_each(SpriteSlot::hide);
    }

    /// Advance the state machine by one step and refresh the sprite slots.
    pub fn update(&mut self) {
        match self.phase {
            MeteorPhase::Disposed => return,
            MeteorPhase::FadingIn => {
                self.opacity = (self.opacity + FADE_IN_STEP).min(1.0);
                if self.opacity >= 1.0 {
                    self.phase = MeteorPhase::Traveling;
                }
                self.travel();
            }
            MeteorPhase::Traveling => self.travel(),
            MeteorPhase::FadingOut => {
                self.fade_ticks += 1;
                self.opacity = (self.opacity - FADE_OUT_STEP).max(0.0);
                if self.fade_ticks % 2 == 0 {
                    self.trail.pop_back();
                }
                if (self.opacity <= 0.0 && self.trail.is_empty())
                    || self.fade_ticks >= FADE_OUT_LIMIT
                {
                    self.dispose();
                    return;
                }
            }
        }
        self.update_sprites();
    }

    fn travel(&mut self) {
        self.tick += 1;
        let t = self.tick as f32;
        let p = &self.params;

        let wobble = (t * p.wobble_freq).sin() * p.wobble_amp;
        let drift = p.curvature * t;

        self.position.x += (p.direction.x + wobble * WOBBLE_GAIN + drift) * p.speed;
        self.position.y += p.direction.y * p.speed;
        self.traveled += p.speed;

        let progress = if p.total_distance > 0.0 {
            self.traveled / p.total_distance
        } else {
            1.0
        };
        self.current_scale = (1.0 - progress * SHRINK).max(MIN_SCALE);

        self.trail.push_front(TrailSample {
            position: self.position,
            scale: self.current_scale,
        });

        if self.traveled >= p.total_distance {
            self.phase = MeteorPhase::FadingOut;
        }
    }

    fn update_sprites(&mut self) {
        let len = self.trail.len();
        if len < 2 {
            self.glow.iter_mut().for_each(SpriteSlot::hide);
            self.core.iter_mut().for_each(SpriteSlot::hide);
            return;
        }

        let MeteorParams {
            asymmetry_dir,
            asymmetry_amount,
            ..
        } = self.params;

        for (i, (glow, core)) in self.glow.iter_mut().zip(self.core.iter_mut()).enumerate() {
            let Some(point) = self.trail.get(i) else {
                glow.hide();
                core.hide();
                continue;
            };
            let progress = i as f32 / len as f32;
            let remaining = 1.0 - progress;
            let (size_mult, offset) = segment_shape(progress, asymmetry_dir, asymmetry_amount);

            let size = GLOW_SIZE * point.scale * size_mult * self.size_scale;
            let alpha = remaining.powf(1.4) * self.opacity * point.scale * 0.7;
            *glow = SpriteSlot {
                visible: alpha > GLOW_MIN_ALPHA,
                center: point.position + self.perpendicular * offset * point.scale,
                size: Vec2::new(size, size * 0.85),
                color: Rgb::from_hsl(0.57, 0.35, 0.55 + remaining * 0.25),
                opacity: alpha * 0.6,
                z: i as f32 * 0.01,
            };

            let core_size = CORE_SIZE * point.scale * (1.0 - progress * 0.7);
            let core_alpha = remaining.powf(2.2) * self.opacity * point.scale * 0.8;
            let core_offset = -offset * 0.15;
            *core = SpriteSlot {
                visible: core_alpha > CORE_MIN_ALPHA,
                center: point.position + self.perpendicular * core_offset * point.scale,
                size: Vec2::splat(core_size),
                color: Rgb::from_hsl(0.58, 0.15, 0.9),
                opacity: core_alpha,
                z: i as f32 * 0.01 + 0.5,
            };
        }

        if self.phase != MeteorPhase::FadingOut
            && let Some(head) = self.trail.front()
        {
            let scale = self.current_scale * self.size_scale;
            let visible = self.opacity > 0.0;
            self.glow[0] = SpriteSlot {
                visible,
                center: head.position,
                size: Vec2::splat(HEAD_GLOW_SIZE * scale),
                color: Rgb::from_hsl(0.57, 0.25, 0.8),
                opacity: self.opacity * 0.7,
                z: 0.6,
            };
            self.core[0] = SpriteSlot {
                visible,
                center: head.position,
                size: Vec2::splat(HEAD_CORE_SIZE * scale),
                color: Rgb::from_hsl(0.58, 0.1, 0.95),
                opacity: self.opacity * 0.9,
                z: 0.7,
            };
        }
    }

    /// Release the trail and hide every slot. The meteor emits nothing
    /// afterwards until it is [`reset`](Meteor::reset).
    pub fn dispose(&mut self) {
        self.phase = MeteorPhase::Disposed;
        self.opacity = 0.0;
        self.trail.clear();
        self.glow.iter_mut().for_each(SpriteSlot::hide);
        self.core.iter_mut().for_each(SpriteSlot::hide);
    }

    /// Push every visible slot into the scene.
    pub fn emit(&self, scene: &mut Scene) {
        if self.phase == MeteorPhase::Disposed {
            return;
        }
        self.glow
            .iter()
            .chain(self.core.iter())
            .filter(|slot| slot.visible)
            .for_each(|slot| scene.push(slot.to_sprite()));
    }

    pub fn phase(&self) -> MeteorPhase {
        self.phase
    }

    pub fn is_disposed(&self) -> bool {
        self.phase == MeteorPhase::Disposed
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn traveled(&self) -> f32 {
        self.traveled
    }

    pub fn params(&self) -> &MeteorParams {
        &self.params
    }

    pub fn trail(&self) -> &TrailRing {
        &self.trail
    }

    /// Number of trail samples and sprite slots this meteor owns.
    pub fn slot_capacity(&self) -> usize {
        self.glow.len()
    }

    pub fn glow_slots(&self) -> &[SpriteSlot] {
        &self.glow
    }

    pub fn core_slots(&self) -> &[SpriteSlot] {
        &self.core
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn straight(speed: f32, distance: f32, slots: usize) -> Meteor {
        Meteor::new(
            MeteorParams::straight(Vec2::new(0.0, 500.0), speed, distance),
            slots,
            1.0,
        )
    }

    #[test]
    fn test_fade_in_then_traveling() {
        let mut meteor = straight(3.0, 900.0, 60);
        assert_eq!(meteor.phase(), MeteorPhase::FadingIn);
        assert_eq!(meteor.opacity(), 0.0);
        for _ in 0..19 {
            meteor.update();
        }
        assert_eq!(meteor.phase(), MeteorPhase::FadingIn);
        meteor.update();
        meteor.update();
        assert_eq!(meteor.phase(), MeteorPhase::Traveling);
        assert_eq!(meteor.opacity(), 1.0);
    }

    #[test]
    fn test_enters_fading_out_after_distance() {
        let mut meteor = straight(3.0, 900.0, 60);
        let mut updates = 0;
        while meteor.phase() != MeteorPhase::FadingOut {
            meteor.update();
            updates += 1;
            assert!(updates <= 1000, "never left travel");
        }
        assert_eq!(updates, 300);
        assert_eq!(meteor.traveled(), 900.0);
        assert_eq!(meteor.position(), Vec2::new(0.0, -400.0));
    }

    #[test]
    fn test_trail_and_opacity_stay_bounded() {
        let mut rng = StdRng::seed_from_u64(11);
        let viewport = Viewport::new(1280.0, 720.0);
        for profile in [DeviceProfile::MOBILE, DeviceProfile::DESKTOP] {
            let mut meteor = Meteor::spawn(&mut rng, &viewport, &profile);
            let mut steps = 0;
            while !meteor.is_disposed() {
                meteor.update();
                steps += 1;
                assert!(meteor.trail().len() <= profile.max_trail_length);
                assert!((0.0..=1.0).contains(&meteor.opacity()));
                assert!(steps < 2000, "meteor never disposed");
            }
        }
    }

    #[test]
    fn test_natural_disposal_when_trail_drains() {
        let mut meteor = straight(3.0, 300.0, 60);
        while meteor.phase() != MeteorPhase::FadingOut {
            meteor.update();
        }
        let mut fade_updates = 0;
        while !meteor.is_disposed() {
            meteor.update();
            fade_updates += 1;
        }
        // 60 samples drain at one per two updates
        assert_eq!(fade_updates, 120);
        assert!(meteor.trail().is_empty());
    }

    #[test]
    fn test_fade_out_cap_forces_disposal() {
        // A trail of 400 samples drains far slower than the cap allows.
        let mut meteor = straight(3.0, 1200.0, 400);
        while meteor.phase() != MeteorPhase::FadingOut {
            meteor.update();
        }
        assert_eq!(meteor.trail().len(), 400);
        let mut fade_updates = 0;
        while !meteor.is_disposed() {
            meteor.update();
            fade_updates += 1;
            assert!(fade_updates <= FADE_OUT_LIMIT);
        }
        assert_eq!(fade_updates, FADE_OUT_LIMIT);
    }

    #[test]
    fn test_disposed_meteor_is_inert() {
        let mut meteor = straight(3.0, 90.0, 10);
        for _ in 0..5 {
            meteor.update();
        }
        meteor.dispose();
        meteor.update();
        assert!(meteor.is_disposed());
        assert!(meteor.trail().is_empty());
        let mut scene = Scene::new();
        meteor.emit(&mut scene);
        assert!(scene.is_empty());
    }

    #[test]
    fn test_reset_reuses_slots() {
        let mut meteor = straight(3.0, 300.0, 30);
        for _ in 0..50 {
            meteor.update();
        }
        let glow_ptr = meteor.glow_slots().as_ptr();
        meteor.reset(MeteorParams::straight(Vec2::new(10.0, 400.0), 2.5, 500.0));
        assert_eq!(meteor.glow_slots().as_ptr(), glow_ptr);
        assert_eq!(meteor.slot_capacity(), 30);
        assert_eq!(meteor.phase(), MeteorPhase::FadingIn);
        assert_eq!(meteor.opacity(), 0.0);
        assert!(meteor.trail().is_empty());
        assert!(meteor.glow_slots().iter().all(|s| !s.visible));
    }

    #[test]
    fn test_slots_beyond_trail_are_hidden() {
        let mut meteor = straight(3.0, 900.0, 60);
        for _ in 0..10 {
            meteor.update();
        }
        assert_eq!(meteor.trail().len(), 10);
        assert!(meteor.glow_slots()[10..].iter().all(|s| !s.visible));
        assert!(meteor.core_slots()[10..].iter().all(|s| !s.visible));
        // The head is drawn while the meteor is live
        assert!(meteor.glow_slots()[0].visible);
        assert_eq!(meteor.glow_slots()[0].z, 0.6);
    }

    #[test]
    fn test_single_sample_draws_nothing() {
        let mut meteor = straight(3.0, 900.0, 60);
        meteor.update();
        let mut scene = Scene::new();
        meteor.emit(&mut scene);
        assert!(scene.is_empty());
    }

    #[test]
    fn test_segment_shape_regions() {
        let (size, offset) = segment_shape(0.0, 1.0, 0.5);
        assert!((size - 0.3).abs() < 1e-6);
        assert_eq!(offset, 0.0);

        let (_, offset) = segment_shape(0.2, -1.0, 0.5);
        assert!(offset < 0.0);

        // Widest point of the billow sits in the middle of the third region
        let (peak, peak_offset) = segment_shape(0.4, 1.0, 0.5);
        assert!((peak - 2.34).abs() < 1e-4);
        assert!((peak_offset - 5.5).abs() < 1e-4);

        let (tail, _) = segment_shape(1.0, 1.0, 0.5);
        assert!(tail < peak);
    }

    #[test]
    fn test_segment_offsets_follow_asymmetry_side() {
        for i in 9..100 {
            let p = i as f32 / 100.0;
            let (size_left, left) = segment_shape(p, -1.0, 0.6);
            let (size_right, right) = segment_shape(p, 1.0, 0.6);
            assert_eq!(size_left, size_right);
            assert!(left < 0.0 && right > 0.0, "offset side at {p}");
            assert!((left + right).abs() < 1e-6);
        }
    }

    #[test]
    fn test_random_params_ranges() {
        let mut rng = StdRng::seed_from_u64(3);
        let viewport = Viewport::new(1000.0, 800.0);
        for _ in 0..200 {
            let p = MeteorParams::random(&mut rng, &viewport);
            assert!(p.start.x.abs() <= 425.0);
            assert_eq!(p.start.y, 450.0);
            assert!((p.direction.length() - 1.0).abs() < 1e-5);
            assert!(p.direction.y < 0.0);
            assert!((0.012..=0.020).contains(&p.wobble_freq));
            assert!((0.06..=0.10).contains(&p.wobble_amp));
            assert!((2.2..=3.4).contains(&p.speed));
            assert!((400.0..=680.0).contains(&p.total_distance));
            assert!(p.asymmetry_dir == 1.0 || p.asymmetry_dir == -1.0);
            assert!((0.3..=0.7).contains(&p.asymmetry_amount));
            assert!(p.curvature.abs() <= 0.0003);
        }
    }
}
