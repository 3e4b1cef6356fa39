//! The running sky: owns every layer and drives them from host events.

use std::fmt;

use glam::Vec2;
use noeul_core::{DetectionPolicy, DeviceProfile, DeviceTier, TierOverride, Viewport};
use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info, trace, warn};

use crate::backdrop::SkyBackdrop;
use crate::backend::{BackendSettings, Host, RenderBackend};
use crate::clock::{AnimationClock, Debounce, RESIZE_DEBOUNCE_MS};
use crate::error::SkyError;
use crate::pool::MeteorPool;
use crate::scene::{OrthoCamera, Scene};
use crate::stars::StarField;
use crate::texture::SpriteTextures;

/// Longest frame delta fed into the simulation, in milliseconds.
pub const MAX_FRAME_DELTA_MS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// A press on the host surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Host surface coordinates.
    pub position: Vec2,
    pub kind: PointerKind,
}

/// Decides whether a pointer press landed on something interactive that
/// must not spawn meteors.
pub type ExclusionTest = Box<dyn Fn(&PointerEvent) -> bool>;

/// Startup options for [`SkyContext::init`].
#[derive(Default)]
pub struct SkyOptions {
    pub tier: TierOverride,
    pub policy: DetectionPolicy,
    /// Fixed RNG seed, for reproducible skies.
    pub seed: Option<u64>,
    pub is_excluded_target: Option<ExclusionTest>,
}

impl SkyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tier(mut self, tier: TierOverride) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_policy(mut self, policy: DetectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_exclusion(mut self, test: impl Fn(&PointerEvent) -> bool + 'static) -> Self {
        self.is_excluded_target = Some(Box::new(test));
        self
    }
}

impl fmt::Debug for SkyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkyOptions")
            .field("tier", &self.tier)
            .field("policy", &self.policy)
            .field("seed", &self.seed)
            .field("is_excluded_target", &self.is_excluded_target.is_some())
            .finish()
    }
}

/// Summary of one [`SkyContext::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    /// Simulation delta actually applied, in milliseconds.
    pub delta_ms: f64,
    /// Animation clock in seconds.
    pub elapsed: f64,
    pub stars: usize,
    pub meteors: usize,
    pub sprites: usize,
    /// A timed spawn happened this frame.
    pub spawned: bool,
    /// The frame reached the backend successfully.
    pub rendered: bool,
}

/// The sky engine for one mount point.
///
/// Handlers all take `&mut self`, so none of them can run while a tick is in
/// progress.
pub struct SkyContext<B: RenderBackend> {
    backend: B,
    profile: DeviceProfile,
    viewport: Viewport,
    pixel_ratio: f32,
    camera: OrthoCamera,
    backdrop: SkyBackdrop,
    stars: StarField,
    pool: MeteorPool,
    textures: SpriteTextures,
    scene: Scene,
    clock: AnimationClock,
    resize_debounce: Debounce,
    rng: StdRng,
    is_excluded_target: Option<ExclusionTest>,
    visible: bool,
    last_frame_ms: Option<f64>,
    disposed: bool,
}

impl<B: RenderBackend> SkyContext<B> {
    /// Set up the sky on `host`.
    ///
    /// Returns `Ok(None)` when the host has no mount point, and an error when
    /// the host cannot provide a render backend.
    pub fn init<H>(host: &mut H, options: SkyOptions) -> Result<Option<Self>, SkyError>
    where
        H: Host<Backend = B>,
    {
        let Some(viewport) = host.mount() else {
            debug!("no mount point, sky disabled");
            return Ok(None);
        };
        let viewport = viewport.sanitized();

        let device = host.device_info();
        let tier = options.tier.resolve(&device, &options.policy);
        let profile = DeviceProfile::for_tier(tier);
        let pixel_ratio = profile.pixel_ratio(viewport.pixel_ratio);

        let textures = SpriteTextures::generate();
        let backend = host.create_backend(&BackendSettings {
            viewport,
            pixel_ratio,
            antialias: profile.antialias,
            textures: textures.clone(),
        })?;

        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let stars = StarField::generate(&mut rng, &viewport, &profile);
        let mut pool = MeteorPool::new(&mut rng, profile);
        pool.prime_first_spawn();

        info!(
            %tier,
            width = viewport.width,
            height = viewport.height,
            stars = stars.len(),
            "sky initialized"
        );

        Ok(Some(Self {
            backend,
            profile,
            viewport,
            pixel_ratio,
            camera: OrthoCamera::for_viewport(&viewport),
            backdrop: SkyBackdrop::new(&viewport),
            stars,
            pool,
            textures,
            scene: Scene::new(),
            clock: AnimationClock::new(),
            resize_debounce: Debounce::new(RESIZE_DEBOUNCE_MS),
            rng,
            is_excluded_target: options.is_excluded_target,
            visible: true,
            last_frame_ms: None,
            disposed: false,
        }))
    }

    /// Advance the animation to `now_ms` and draw one frame.
    pub fn tick(&mut self, now_ms: f64) -> FrameStats {
        if self.disposed {
            return FrameStats::default();
        }

        if self.resize_debounce.poll(now_ms) {
            self.stars.rebuild(&mut self.rng, &self.viewport, &self.profile);
            debug!(
                stars = self.stars.len(),
                generation = self.stars.generation(),
                "star field rebuilt"
            );
        }

        if !self.visible {
            self.last_frame_ms = Some(now_ms);
            return FrameStats::default();
        }

        let delta_ms = match self.last_frame_ms {
            Some(last) if now_ms.is_finite() => (now_ms - last).clamp(0.0, MAX_FRAME_DELTA_MS),
            _ => 0.0,
        };
        if now_ms.is_finite() {
            self.last_frame_ms = Some(now_ms);
        }

        self.clock.advance(delta_ms);
        self.stars.set_time(self.clock.elapsed());

        let spawned = self.pool.advance(delta_ms, &mut self.rng)
            && self.pool.try_spawn(&mut self.rng, &self.viewport);
        self.pool.update_all();

        self.scene.clear();
        self.scene.set_backdrop(self.backdrop.quad());
        self.stars.emit(&mut self.scene);
        self.pool.emit(&mut self.scene);

        let rendered = match self.backend.render(&self.scene, &self.camera) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "frame dropped");
                false
            }
        };

        let stats = FrameStats {
            delta_ms,
            elapsed: self.clock.elapsed(),
            stars: self.stars.len(),
            meteors: self.pool.len(),
            sprites: self.scene.len(),
            spawned,
            rendered,
        };
        trace!(?stats, "frame");
        stats
    }

    /// Follow a host resize.
    ///
    /// Camera, backend and backdrop update immediately; the star field is
    /// rebuilt once resizing has been quiet for [`RESIZE_DEBOUNCE_MS`].
    pub fn on_resize(&mut self, viewport: Viewport, now_ms: f64) {
        if self.disposed {
            return;
        }
        let viewport = viewport.sanitized();
        self.viewport = viewport;
        self.pixel_ratio = self.profile.pixel_ratio(viewport.pixel_ratio);
        self.camera.update(&viewport);
        self.backend.resize(&viewport, self.pixel_ratio);
        self.backdrop.resize(&viewport);
        self.resize_debounce.arm(now_ms);
    }

    /// Pause while the host is hidden and resume when it shows again.
    ///
    /// Repeated notifications of the same state are ignored.
    pub fn on_visibility(&mut self, visible: bool, now_ms: f64) {
        if self.disposed || visible == self.visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.clock.start();
            self.pool.resume(&mut self.rng);
            self.last_frame_ms = None;
            debug!(next_spawn_ms = self.pool.next_delay_ms(), "sky resumed");
        } else {
            self.clock.stop();
            self.last_frame_ms = Some(now_ms);
            debug!("sky paused");
        }
    }

    /// Spawn a meteor for a press, unless it landed on an excluded target.
    pub fn on_pointer_down(&mut self, event: &PointerEvent) -> bool {
        if self.disposed {
            return false;
        }
        if let Some(excluded) = &self.is_excluded_target
            && excluded(event)
        {
            trace!(?event, "pointer on excluded target");
            return false;
        }
        self.spawn_meteor()
    }

    /// Spawn a meteor now if the pool has room.
    pub fn spawn_meteor(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.pool.try_spawn(&mut self.rng, &self.viewport)
    }

    /// Release every meteor and star. Later calls do nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.pool.clear();
        self.stars.clear();
        self.scene.clear();
        self.resize_debounce.cancel();
        self.disposed = true;
        info!("sky disposed");
    }

    pub fn tier(&self) -> DeviceTier {
        self.profile.tier
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Pixel ratio after the profile cap.
    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn camera(&self) -> &OrthoCamera {
        &self.camera
    }

    pub fn stars(&self) -> &StarField {
        &self.stars
    }

    pub fn pool(&self) -> &MeteorPool {
        &self.pool
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn textures(&self) -> &SpriteTextures {
        &self.textures
    }

    /// The most recently built frame.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
