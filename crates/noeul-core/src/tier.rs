//! Device tier detection.
//!
//! The tier is decided once at startup from a [`DeviceInfo`] snapshot. The
//! rule set lives in [`DetectionPolicy`] so hosts and configuration can
//! adjust it; anything the policy does not classify as mobile is desktop.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse device classification driving quality constants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceTier {
    Mobile,
    #[default]
    Desktop,
}

impl fmt::Display for DeviceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceTier::Mobile => write!(f, "mobile"),
            DeviceTier::Desktop => write!(f, "desktop"),
        }
    }
}

/// User preference for the device tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierOverride {
    /// Run detection.
    #[default]
    Auto,
    Mobile,
    Desktop,
}

impl TierOverride {
    /// Resolve the override, running detection only for [`TierOverride::Auto`].
    pub fn resolve(self, info: &DeviceInfo, policy: &DetectionPolicy) -> DeviceTier {
        match self {
            TierOverride::Auto => detect_tier(info, policy),
            TierOverride::Mobile => DeviceTier::Mobile,
            TierOverride::Desktop => DeviceTier::Desktop,
        }
    }
}

/// What the host knows about the device at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceInfo {
    /// User agent or equivalent platform identifier. May be empty.
    pub user_agent: String,
    /// Viewport width in logical pixels.
    pub viewport_width: f32,
    /// Whether the device accepts touch input.
    pub touch: bool,
}

/// Rules deciding when a device is treated as mobile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionPolicy {
    /// Case-insensitive substrings of the user agent that mark a mobile device.
    pub mobile_user_agent_tokens: Vec<String>,
    /// Viewports at or below this width count as narrow.
    pub narrow_viewport_width: f32,
    /// A narrow viewport is only mobile when the device also has touch.
    pub narrow_requires_touch: bool,
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        Self {
            mobile_user_agent_tokens: [
                "Android",
                "iPhone",
                "iPad",
                "iPod",
                "webOS",
                "BlackBerry",
                "IEMobile",
                "Opera Mini",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            narrow_viewport_width: 768.0,
            narrow_requires_touch: true,
        }
    }
}

/// Classify a device.
///
/// Mobile when the user agent contains any policy token, or when the
/// viewport is narrow (and, if the policy asks for it, touch capable).
/// Every other device is [`DeviceTier::Desktop`].
pub fn detect_tier(info: &DeviceInfo, policy: &DetectionPolicy) -> DeviceTier {
    let agent = info.user_agent.to_lowercase();
    let agent_match = policy
        .mobile_user_agent_tokens
        .iter()
        .filter(|token| !token.is_empty())
        .any(|token| agent.contains(&token.to_lowercase()));

    let narrow = info.viewport_width <= policy.narrow_viewport_width
        && (info.touch || !policy.narrow_requires_touch);

    if agent_match || narrow {
        DeviceTier::Mobile
    } else {
        DeviceTier::Desktop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(agent: &str, width: f32, touch: bool) -> DeviceInfo {
        DeviceInfo {
            user_agent: agent.to_string(),
            viewport_width: width,
            touch,
        }
    }

    #[test]
    fn test_user_agent_tokens_are_case_insensitive() {
        let policy = DetectionPolicy::default();
        let phone = info("Mozilla/5.0 (iphone; CPU iPhone OS 17_0)", 1200.0, false);
        assert_eq!(detect_tier(&phone, &policy), DeviceTier::Mobile);

        let opera = info("Opera Mini/8.0", 1920.0, false);
        assert_eq!(detect_tier(&opera, &policy), DeviceTier::Mobile);
    }

    #[test]
    fn test_narrow_viewport_needs_touch_by_default() {
        let policy = DetectionPolicy::default();
        assert_eq!(
            detect_tier(&info("", 700.0, true), &policy),
            DeviceTier::Mobile
        );
        assert_eq!(
            detect_tier(&info("", 700.0, false), &policy),
            DeviceTier::Desktop
        );
        assert_eq!(
            detect_tier(&info("", 768.0, true), &policy),
            DeviceTier::Mobile
        );
        assert_eq!(
            detect_tier(&info("", 769.0, true), &policy),
            DeviceTier::Desktop
        );
    }

    #[test]
    fn test_policy_without_touch_requirement() {
        let policy = DetectionPolicy {
            narrow_requires_touch: false,
            ..Default::default()
        };
        assert_eq!(
            detect_tier(&info("", 500.0, false), &policy),
            DeviceTier::Mobile
        );
    }

    #[test]
    fn test_unknown_device_defaults_to_desktop() {
        let policy = DetectionPolicy::default();
        let desktop = info("Mozilla/5.0 (X11; Linux x86_64)", 1600.0, false);
        assert_eq!(detect_tier(&desktop, &policy), DeviceTier::Desktop);
        assert_eq!(detect_tier(&DeviceInfo::default(), &policy), DeviceTier::Desktop);
    }

    #[test]
    fn test_empty_tokens_never_match() {
        let policy = DetectionPolicy {
            mobile_user_agent_tokens: vec![String::new()],
            ..Default::default()
        };
        assert_eq!(
            detect_tier(&info("anything", 1600.0, false), &policy),
            DeviceTier::Desktop
        );
    }

    #[test]
    fn test_override_skips_detection() {
        let policy = DetectionPolicy::default();
        let phone = info("Android", 400.0, true);
        assert_eq!(
            TierOverride::Desktop.resolve(&phone, &policy),
            DeviceTier::Desktop
        );
        assert_eq!(TierOverride::Auto.resolve(&phone, &policy), DeviceTier::Mobile);
    }
}
