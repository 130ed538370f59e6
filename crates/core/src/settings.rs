use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Knobs for one resolution run. Persisted as JSON so a show file can pin
/// the exact behavior it was rendered with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolveSettings {
    /// Seed for the selection RNG. Identical seed + inputs reproduce the run.
    #[serde(default)]
    pub seed: u64,
    /// Global strobe kill switch (venue policy, photosensitivity).
    #[serde(default = "default_strobe_allowed")]
    pub strobe_allowed: bool,
    /// A palette may not appear in more than this many consecutive scenes.
    #[serde(default = "default_palette_repeat")]
    pub max_consecutive_palette_repeat: usize,
    /// Effect fixtures stay disabled below this scene energy.
    #[serde(default = "default_special_min_energy")]
    pub special_min_energy: u8,
    /// Upper bound on a single completion-service call.
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,
}

fn default_strobe_allowed() -> bool {
    true
}

fn default_palette_repeat() -> usize {
    2
}

fn default_special_min_energy() -> u8 {
    4
}

fn default_generation_timeout_secs() -> u64 {
    10
}

impl Default for ResolveSettings {
    fn default() -> Self {
        ResolveSettings {
            seed: 0,
            strobe_allowed: true,
            max_consecutive_palette_repeat: 2,
            special_min_energy: 4,
            generation_timeout_secs: 10,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Read(String),
    #[error("failed to parse settings file: {0}")]
    Parse(String),
    #[error("failed to write settings file: {0}")]
    Write(String),
    #[error("invalid settings: {}", .0.join(", "))]
    Validation(Vec<String>),
}

impl ResolveSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let mut errors = Vec::new();

        if self.max_consecutive_palette_repeat < 1 {
            errors.push("max_consecutive_palette_repeat must be at least 1".to_string());
        }
        if self.special_min_energy < 1 || self.special_min_energy > 5 {
            errors.push("special_min_energy must be between 1 and 5".to_string());
        }
        if self.generation_timeout_secs == 0 {
            errors.push("generation_timeout_secs must be nonzero".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SettingsError::Validation(errors))
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| SettingsError::Read(e.to_string()))?;
        let settings: ResolveSettings =
            serde_json::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SettingsError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SettingsError::Write(e.to_string()))?;
        fs::write(path.as_ref(), content).map_err(|e| SettingsError::Write(e.to_string()))
    }
}
