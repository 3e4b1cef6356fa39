//! Core types shared by the noeul crates.
//!
//! Holds the color type used by every layer of the sky, the device tier
//! detection policy and the per-tier quality profiles, and the viewport
//! description handed from the host to the engine.

mod color;
mod profile;
mod tier;
mod viewport;

pub use color::Rgb;
pub use profile::DeviceProfile;
pub use tier::{DetectionPolicy, DeviceInfo, DeviceTier, TierOverride, detect_tier};
pub use viewport::Viewport;
