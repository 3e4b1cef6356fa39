//! Per-tier quality profiles.

use crate::DeviceTier;

/// Quality and particle budget for one device tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceProfile {
    /// Tier this profile was built for.
    pub tier: DeviceTier,
    /// Upper bound on the number of stars.
    pub max_stars: usize,
    /// Viewport area (px²) per star.
    pub star_density: f32,
    /// Upper bound on concurrently active meteors.
    pub max_meteors: usize,
    /// Trail samples (and sprite slots) per meteor.
    pub max_trail_length: usize,
    /// Multiplier applied to star sizes.
    pub star_size_scale: f32,
    /// Multiplier applied to meteor sprite sizes.
    pub meteor_size_scale: f32,
    /// Cap on the device pixel ratio.
    pub max_pixel_ratio: f32,
    /// Whether the backend should smooth edges.
    pub antialias: bool,
}

impl DeviceProfile {
    pub const MOBILE: DeviceProfile = DeviceProfile {
        tier: DeviceTier::Mobile,
        max_stars: 100,
        star_density: 8000.0,
        max_meteors: 4,
        max_trail_length: 30,
        star_size_scale: 0.7,
        meteor_size_scale: 0.65,
        max_pixel_ratio: 1.5,
        antialias: false,
    };

    pub const DESKTOP: DeviceProfile = DeviceProfile {
        tier: DeviceTier::Desktop,
        max_stars: 200,
        star_density: 5500.0,
        max_meteors: 10,
        max_trail_length: 60,
        star_size_scale: 1.0,
        meteor_size_scale: 1.0,
        max_pixel_ratio: 2.0,
        antialias: true,
    };

    /// Profile for a tier.
    pub fn for_tier(tier: DeviceTier) -> Self {
        match tier {
            DeviceTier::Mobile => Self::MOBILE,
            DeviceTier::Desktop => Self::DESKTOP,
        }
    }

    /// Number of stars for a viewport of the given size.
    pub fn star_count(&self, width: f32, height: f32) -> usize {
        let area = (width.max(0.0) * height.max(0.0)) as f64;
        let by_density = (area / self.star_density.max(1.0) as f64).floor() as usize;
        by_density.min(self.max_stars)
    }

    /// Device pixel ratio after applying the cap.
    pub fn pixel_ratio(&self, device_pixel_ratio: f32) -> f32 {
        if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio.min(self.max_pixel_ratio)
        } else {
            1.0
        }
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::DESKTOP
    }
}
