//! Procedural twilight sky for noeul.
//!
//! The engine owns a gradient backdrop, a twinkling star field and a pool of
//! meteors with curved, fading trails. It is host agnostic: a [`Host`]
//! supplies the mount point and a [`RenderBackend`], and drives
//! [`SkyContext::tick`] once per display refresh while forwarding resize,
//! visibility and pointer events.

mod backdrop;
mod backend;
mod clock;
mod context;
mod error;
mod meteor;
mod pool;
mod scene;
mod stars;
mod texture;
mod trail;

pub use backdrop::{SkyBackdrop, gradient_color};
pub use backend::{BackendSettings, Host, RenderBackend};
pub use clock::{AnimationClock, Debounce, RESIZE_DEBOUNCE_MS};
pub use context::{
    ExclusionTest, FrameStats, MAX_FRAME_DELTA_MS, PointerEvent, PointerKind, SkyContext,
    SkyOptions,
};
pub use error::SkyError;
pub use meteor::{Meteor, MeteorParams, MeteorPhase, SpriteSlot, segment_shape};
pub use pool::{MeteorPool, RESUME_DELAY_MS, SPAWN_DELAY_MS};
pub use scene::{BackdropQuad, OrthoCamera, Scene, Sprite, TextureKind};
pub use stars::{StarAppearance, StarField, StarParticle, twinkle};
pub use texture::{SpriteTexture, SpriteTextures, TEXTURE_SIZE};
pub use trail::{TrailRing, TrailSample};
