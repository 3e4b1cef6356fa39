use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use noeul_config::Config;
use noeul_core::TierOverride;

#[derive(Parser, Debug)]
#[command(
    name = "noeul",
    author,
    version,
    about = "A twilight sky with twinkling stars and falling meteors"
)]
pub struct Cli {
    /// Force the quality tier instead of detecting it.
    #[arg(long, value_enum, value_name = "TIER")]
    pub tier: Option<TierArg>,

    /// Target frames per second (1-240).
    #[arg(long, value_name = "FPS", value_parser = clap::value_parser!(u32).range(1..=240))]
    pub fps: Option<u32>,

    /// Seed the sky for a reproducible run.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Read settings from this file instead of the default location.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the effective settings to the config file and exit.
    #[arg(long)]
    pub init_config: bool,

    /// Hide the footer line.
    #[arg(long)]
    pub no_help: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TierArg {
    Auto,
    Mobile,
    Desktop,
}

impl From<TierArg> for TierOverride {
    fn from(arg: TierArg) -> Self {
        match arg {
            TierArg::Auto => TierOverride::Auto,
            TierArg::Mobile => TierOverride::Mobile,
            TierArg::Desktop => TierOverride::Desktop,
        }
    }
}

impl Cli {
    /// Layer command line flags over the loaded settings.
    pub fn apply(&self, config: &mut Config) {
        if let Some(tier) = self.tier {
            config.tier = tier.into();
        }
        if let Some(fps) = self.fps {
            config.target_fps = fps;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.no_help {
            config.show_help = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from(["noeul", "--tier", "mobile", "--fps", "30", "--seed", "7"]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.tier, TierOverride::Mobile);
        assert_eq!(config.target_fps, 30);
        assert_eq!(config.seed, Some(7));
        assert!(config.show_help);
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let cli = Cli::parse_from(["noeul"]);
        let mut config = Config {
            target_fps: 24,
            seed: Some(3),
            ..Config::default()
        };
        cli.apply(&mut config);
        assert_eq!(config.target_fps, 24);
        assert_eq!(config.seed, Some(3));
    }

    #[test]
    fn test_fps_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["noeul", "--fps", "0"]).is_err());
        assert!(Cli::try_parse_from(["noeul", "--fps", "500"]).is_err());
    }

    #[test]
    fn test_no_help_hides_footer() {
        let cli = Cli::parse_from(["noeul", "--no-help", "--init-config"]);
        assert!(cli.init_config);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert!(!config.show_help);
    }
}
