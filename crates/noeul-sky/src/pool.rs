//! Bounded set of active meteors plus the spawn timer.

use std::ops::Range;

use noeul_core::{DeviceProfile, Viewport};
use rand::Rng;
use tracing::debug;

use crate::meteor::{Meteor, MeteorParams};
use crate::scene::Scene;

/// Delay between automatic spawns, in milliseconds.
pub const SPAWN_DELAY_MS: Range<f64> = 4000.0..8000.0;
/// Delay before the first automatic spawn after the page becomes visible
/// again, in milliseconds.
pub const RESUME_DELAY_MS: Range<f64> = 2000.0..5000.0;
/// How long after start the first meteor shows up.
const FIRST_SPAWN_LEAD_MS: f64 = 500.0;

fn draw_delay<R: Rng + ?Sized>(rng: &mut R, range: Range<f64>) -> f64 {
    range.start + rng.r#gen::<f64>() * (range.end - range.start)
}

#[derive(Debug)]
pub struct MeteorPool {
    profile: DeviceProfile,
    active: Vec<Meteor>,
    /// Disposed meteors kept for reuse, never more than `max_meteors`.
    recycled: Vec<Meteor>,
    timer_ms: f64,
    next_delay_ms: f64,
}

impl MeteorPool {
    pub fn new<R: Rng + ?Sized>(rng: &mut R, profile: DeviceProfile) -> Self {
        Self {
            profile,
            active: Vec::with_capacity(profile.max_meteors),
            recycled: Vec::new(),
            timer_ms: 0.0,
            next_delay_ms: draw_delay(rng, SPAWN_DELAY_MS),
        }
    }

    /// Set the timer so the first spawn fires shortly after start.
    pub fn prime_first_spawn(&mut self) {
        self.timer_ms = (self.next_delay_ms - FIRST_SPAWN_LEAD_MS).max(0.0);
    }

    /// Launch a meteor with random parameters if there is room.
    ///
    /// Returns `false` and leaves the pool untouched when it is full.
    pub fn try_spawn<R: Rng + ?Sized>(&mut self, rng: &mut R, viewport: &Viewport) -> bool {
        self.purge();
        if !self.has_room() {
            return false;
        }
        let params = MeteorParams::random(rng, viewport);
        self.launch(params)
    }

    /// Launch a meteor with the given parameters if there is room.
    pub fn try_spawn_with(&mut self, params: MeteorParams) -> bool {
        self.purge();
        if !self.has_room() {
            return false;
        }
        self.launch(params)
    }

    fn has_room(&self) -> bool {
        self.active.len() < self.profile.max_meteors
    }

    fn launch(&mut self, params: MeteorParams) -> bool {
        let meteor = match self.recycled.pop() {
            Some(mut meteor) => {
                meteor.reset(params);
                meteor
            }
            None => Meteor::new(
                params,
                self.profile.max_trail_length,
                self.profile.meteor_size_scale,
            ),
        };
        self.active.push(meteor);
        debug!(active = self.active.len(), "meteor spawned");
        true
    }

    /// Move disposed meteors out of the active set.
    pub fn purge(&mut self) {
        let mut i = 0;
        while i < self.active.len() {
            if self.active[i].is_disposed() {
                let meteor = self.active.swap_remove(i);
                debug!(active = self.active.len(), "meteor disposed");
                if self.recycled.len() < self.profile.max_meteors {
                    self.recycled.push(meteor);
                }
            } else {
                i += 1;
            }
        }
    }

    /// Accumulate `delta_ms` on the spawn timer. Returns `true` when a spawn
    /// is due, after drawing the next delay.
    pub fn advance<R: Rng + ?Sized>(&mut self, delta_ms: f64, rng: &mut R) -> bool {
        if delta_ms.is_finite() && delta_ms > 0.0 {
            self.timer_ms += delta_ms;
        }
        if self.timer_ms < self.next_delay_ms {
            return false;
        }
        self.timer_ms = 0.0;
        self.next_delay_ms = draw_delay(rng, SPAWN_DELAY_MS);
        true
    }

    /// Restart the timer after the page comes back into view.
    pub fn resume<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.timer_ms = 0.0;
        self.next_delay_ms = draw_delay(rng, RESUME_DELAY_MS);
    }

    /// Step every live meteor once and retire the ones that finished.
    pub fn update_all(&mut self) {
        for meteor in &mut self.active {
            meteor.update();
        }
        self.purge();
    }

    pub fn emit(&self, scene: &mut Scene) {
        for meteor in &self.active {
            meteor.emit(scene);
        }
    }

    /// Dispose every meteor and drop the recycle bin.
    pub fn clear(&mut self) {
        for meteor in &mut self.active {
            meteor.dispose();
        }
        self.active.clear();
        self.recycled.clear();
    }

    pub fn active(&self) -> &[Meteor] {
        &self.active
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn recycled_len(&self) -> usize {
        self.recycled.len()
    }

    pub fn capacity(&self) -> usize {
        self.profile.max_meteors
    }

    pub fn timer_ms(&self) -> f64 {
        self.timer_ms
    }

    pub fn next_delay_ms(&self) -> f64 {
        self.next_delay_ms
    }
}
