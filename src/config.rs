use crate::audio::{AudioFormat, ReverbPreset};
use crate::services::ReverbSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Defaults to $XDG_DATA_HOME/pitchfx/recordings
    #[serde(default)]
    pub recordings_dir: Option<PathBuf>,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_channels")]
    pub channels: u16,

    #[serde(default = "default_slow_rate")]
    pub slow_rate: f32,

    #[serde(default = "default_fast_rate")]
    pub fast_rate: f32,

    #[serde(default = "default_chipmunk_cents")]
    pub chipmunk_cents: f32,

    #[serde(default = "default_darth_vader_cents")]
    pub darth_vader_cents: f32,

    #[serde(default = "default_reverb_preset")]
    pub reverb_preset: ReverbPreset,

    #[serde(default = "default_reverb_wet_dry_mix")]
    pub reverb_wet_dry_mix: f32,

    /// Remove the recording when leaving the playback screen
    #[serde(default = "default_delete_on_leave")]
    pub delete_on_leave: bool,
}

fn default_sample_rate() -> u32 {
    AudioFormat::default().sample_rate
}

fn default_channels() -> u16 {
    AudioFormat::default().channels
}

fn default_slow_rate() -> f32 {
    0.5
}

fn default_fast_rate() -> f32 {
    2.0
}

fn default_chipmunk_cents() -> f32 {
    1200.0
}

fn default_darth_vader_cents() -> f32 {
    -1000.0
}

fn default_reverb_preset() -> ReverbPreset {
    ReverbPreset::LargeRoom
}

fn default_reverb_wet_dry_mix() -> f32 {
    50.0
}

fn default_delete_on_leave() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recordings_dir: None,
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            slow_rate: default_slow_rate(),
            fast_rate: default_fast_rate(),
            chipmunk_cents: default_chipmunk_cents(),
            darth_vader_cents: default_darth_vader_cents(),
            reverb_preset: default_reverb_preset(),
            reverb_wet_dry_mix: default_reverb_wet_dry_mix(),
            delete_on_leave: default_delete_on_leave(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.config/pitchfx/config.json)
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!(
                "Config file not found at {:?}, creating default config",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        tracing::info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved config to {:?}", config_path);
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        Ok(xdg_dir("XDG_CONFIG_HOME", ".config")?
            .join("pitchfx")
            .join("config.json"))
    }

    pub fn recordings_dir(&self) -> Result<PathBuf> {
        match &self.recordings_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(xdg_dir("XDG_DATA_HOME", ".local/share")?
                .join("pitchfx")
                .join("recordings")),
        }
    }

    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat::new(self.sample_rate, self.channels)
    }

    pub fn reverb(&self) -> ReverbSettings {
        ReverbSettings {
            preset: self.reverb_preset,
            wet_dry_mix: self.reverb_wet_dry_mix,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(anyhow::anyhow!("sample_rate must be positive"));
        }

        if self.channels == 0 {
            return Err(anyhow::anyhow!("channels must be positive"));
        }

        for (name, rate) in [("slow_rate", self.slow_rate), ("fast_rate", self.fast_rate)] {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(anyhow::anyhow!("{} must be a positive number", name));
            }
        }

        for (name, cents) in [
            ("chipmunk_cents", self.chipmunk_cents),
            ("darth_vader_cents", self.darth_vader_cents),
        ] {
            if !cents.is_finite() {
                return Err(anyhow::anyhow!("{} must be a finite number", name));
            }
        }

        if !(0.0..=100.0).contains(&self.reverb_wet_dry_mix) {
            return Err(anyhow::anyhow!(
                "reverb_wet_dry_mix must be between 0 and 100"
            ));
        }

        Ok(())
    }
}

fn xdg_dir(var: &str, fallback: &str) -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(var) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(fallback))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_the_four_effects() {
        let config = Config::default();
        assert_eq!(config.slow_rate, 0.5);
        assert_eq!(config.fast_rate, 2.0);
        assert_eq!(config.chipmunk_cents, 1200.0);
        assert_eq!(config.darth_vader_cents, -1000.0);
        assert_eq!(config.reverb(), ReverbSettings::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"fast_rate": 1.5, "reverb_preset": "cathedral"}"#).unwrap();
        assert_eq!(config.fast_rate, 1.5);
        assert_eq!(config.reverb_preset, ReverbPreset::Cathedral);
        assert_eq!(config.slow_rate, 0.5);
        assert!(config.delete_on_leave);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            Config {
                slow_rate: 0.0,
                ..Config::default()
            },
            Config {
                fast_rate: -2.0,
                ..Config::default()
            },
            Config {
                reverb_wet_dry_mix: 150.0,
                ..Config::default()
            },
            Config {
                channels: 0,
                ..Config::default()
            },
            Config {
                chipmunk_cents: f32::NAN,
                ..Config::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{:?} should be rejected", config);
        }
    }

    #[test]
    fn test_explicit_recordings_dir_wins() {
        let config = Config {
            recordings_dir: Some(PathBuf::from("/tmp/takes")),
            ..Config::default()
        };
        assert_eq!(config.recordings_dir().unwrap(), PathBuf::from("/tmp/takes"));
    }
}
