//! Configuration Management
//!
//! Static configuration loaded once at startup: control-loop settings,
//! the semi-Markov transition model, and the gesture step tables. All of
//! it is immutable at runtime.

use crate::gesture::steps::{GestureTables, Step};
use crate::markov::model::TransitionModel;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Control loop settings
    #[serde(default)]
    pub control: ControlConfig,
    /// Semi-Markov transition model (per-state dwell rates and
    /// cumulative action probabilities)
    #[serde(default)]
    pub smm: TransitionModel,
    /// Gesture step tables
    #[serde(default)]
    pub gestures: GestureTables,
}

/// Control loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Loop cadence in milliseconds
    pub tick_interval_ms: u64,
    /// RNG seed for dwell sampling, action selection and random waits
    pub seed: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 15,
            seed: 42,
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err describing the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.control.tick_interval_ms == 0 {
            return Err(crate::Error::Config(
                "tick_interval_ms must be > 0".to_string(),
            ));
        }

        for (name, p) in [
            ("after_scroll", &self.smm.after_scroll),
            ("after_like", &self.smm.after_like),
            ("after_dubious", &self.smm.after_dubious),
        ] {
            if p.dwell_rate <= 0.0 {
                return Err(crate::Error::Config(format!(
                    "smm.{name}.dwell_rate must be > 0, got {}",
                    p.dwell_rate
                )));
            }
            if !(0.0..=1.0).contains(&p.cum_scroll) || !(0.0..=1.0).contains(&p.cum_like) {
                return Err(crate::Error::Config(format!(
                    "smm.{name} cumulative probabilities must be in [0, 1]"
                )));
            }
            // The table must be non-decreasing; the implicit final entry
            // for dubious_scroll is 1.0.
            if p.cum_like < p.cum_scroll {
                return Err(crate::Error::Config(format!(
                    "smm.{name}: cum_like ({}) < cum_scroll ({})",
                    p.cum_like, p.cum_scroll
                )));
            }
        }

        for (name, table) in [
            ("scroll", &self.gestures.scroll),
            ("like_double_tap", &self.gestures.like_double_tap),
            ("like_long_press", &self.gestures.like_long_press),
            ("dubious", &self.gestures.dubious),
        ] {
            if table.is_empty() {
                return Err(crate::Error::Config(format!(
                    "gestures.{name}: step table must not be empty"
                )));
            }
            if !matches!(table.steps.last(), Some(Step::Terminal)) {
                return Err(crate::Error::Config(format!(
                    "gestures.{name}: last step must be terminal"
                )));
            }
            for (i, step) in table.steps.iter().enumerate() {
                match *step {
                    Step::RandomWait { min_ms, max_ms } if min_ms > max_ms => {
                        return Err(crate::Error::Config(format!(
                            "gestures.{name} step {i}: random wait min {min_ms} > max {max_ms}"
                        )));
                    }
                    Step::Terminal if i + 1 != table.len() => {
                        return Err(crate::Error::Config(format!(
                            "gestures.{name} step {i}: terminal before end of table"
                        )));
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }

    /// Load config from file
    pub fn load(path: &PathBuf) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> Result<(), crate::Error> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save to default location
    pub fn save_default(&self) -> Result<(), crate::Error> {
        self.save(&Self::default_path())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".gesture_driver").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}
