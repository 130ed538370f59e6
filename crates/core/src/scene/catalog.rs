use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::scene::{Focus, Motion, Palette, SemanticScene, StrobeRate};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog contains no scenes")]
    Empty,
    #[error("catalog entry '{name}' is invalid: {reason}")]
    InvalidScene { name: String, reason: String },
    #[error("failed to read catalog file: {0}")]
    Read(String),
    #[error("failed to parse catalog file: {0}")]
    Parse(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    scenes: Vec<SemanticScene>,
}

/// The fixed, ordered collection of canonical scenes. Loaded once and
/// read-only for the run; entry order is the tie-break for selection.
#[derive(Clone, Debug)]
pub struct Catalog {
    scenes: Vec<SemanticScene>,
}

impl Catalog {
    /// The built-in scene set. Note in the future we'll load these from disk.
    pub fn standard() -> Self {
        let scenes = vec![
            SemanticScene::new(
                "wash_warm_soft",
                1,
                Palette::Warm,
                Motion::Static,
                StrobeRate::None,
                Focus::Wash,
            ),
            SemanticScene::new(
                "wash_cool_ambient",
                1,
                Palette::Cool,
                Motion::Slow,
                StrobeRate::None,
                Focus::Wash,
            ),
            SemanticScene::new(
                "wash_neutral_glow",
                2,
                Palette::Neutral,
                Motion::Slow,
                StrobeRate::None,
                Focus::Wash,
            ),
            SemanticScene::new(
                "wash_blue_drift",
                2,
                Palette::MonoBlue,
                Motion::Slow,
                StrobeRate::None,
                Focus::Wash,
            ),
            SemanticScene::new(
                "wash_warm_pulse",
                3,
                Palette::Warm,
                Motion::Medium,
                StrobeRate::None,
                Focus::Wash,
            ),
            SemanticScene::new(
                "wash_split_sway",
                3,
                Palette::Split,
                Motion::Medium,
                StrobeRate::None,
                Focus::Wash,
            ),
            SemanticScene::new(
                "accent_hit",
                3,
                Palette::Neutral,
                Motion::Medium,
                StrobeRate::None,
                Focus::Accents,
            ),
            SemanticScene::new(
                "accent_red_stabs",
                4,
                Palette::MonoRed,
                Motion::Fast,
                StrobeRate::Soft,
                Focus::Accents,
            ),
            SemanticScene::new(
                "accent_cool_chase",
                4,
                Palette::Cool,
                Motion::Fast,
                StrobeRate::None,
                Focus::Accents,
            ),
            SemanticScene::new(
                "drop_rainbow_burst",
                5,
                Palette::Rainbow,
                Motion::Fast,
                StrobeRate::Hard,
                Focus::Accents,
            ),
            SemanticScene::new(
                "superfly_auto_fast",
                4,
                Palette::Rainbow,
                Motion::Fast,
                StrobeRate::None,
                Focus::Special,
            ),
            SemanticScene::new(
                "superfly_hard_peak",
                5,
                Palette::MonoBlue,
                Motion::Fast,
                StrobeRate::Hard,
                Focus::Special,
            ),
            SemanticScene::new(
                "mixed_chorus_lift",
                4,
                Palette::Warm,
                Motion::Medium,
                StrobeRate::Soft,
                Focus::Mixed,
            ),
            SemanticScene::new(
                "mixed_finale",
                5,
                Palette::Neutral,
                Motion::Fast,
                StrobeRate::Soft,
                Focus::Mixed,
            ),
        ];
        Catalog { scenes }
    }

    /// Load a catalog from JSON (root key: `scenes`).
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| CatalogError::Read(e.to_string()))?;
        let catalog = Self::from_json_str(&content)?;
        debug!(
            "catalog loaded from {} with {} scenes",
            path.as_ref().display(),
            catalog.len()
        );
        Ok(catalog)
    }

    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            serde_json::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Ok(Catalog {
            scenes: file.scenes,
        })
    }

    /// Reject catalogs the resolver could never safely serve scenes from.
    pub fn validate(&self, special_min_energy: u8) -> Result<(), CatalogError> {
        if self.scenes.is_empty() {
            return Err(CatalogError::Empty);
        }
        for scene in &self.scenes {
            if scene.energy < 1 || scene.energy > 5 {
                return Err(CatalogError::InvalidScene {
                    name: scene.name.clone(),
                    reason: format!("energy {} out of range 1-5", scene.energy),
                });
            }
            if !scene.strobe_invariant_holds() {
                return Err(CatalogError::InvalidScene {
                    name: scene.name.clone(),
                    reason: format!("strobe {} requires energy >= 3", scene.strobe.as_str()),
                });
            }
            if scene.focus == Focus::Special && scene.energy < special_min_energy {
                return Err(CatalogError::InvalidScene {
                    name: scene.name.clone(),
                    reason: format!("special focus requires energy >= {}", special_min_energy),
                });
            }
            let duplicates = self
                .scenes
                .iter()
                .filter(|other| other.name == scene.name)
                .count();
            if duplicates > 1 {
                return Err(CatalogError::InvalidScene {
                    name: scene.name.clone(),
                    reason: "duplicate scene name".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn scenes(&self) -> &[SemanticScene] {
        &self.scenes
    }

    pub fn get(&self, name: &str) -> Option<&SemanticScene> {
        self.scenes.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_is_valid() {
        let catalog = Catalog::standard();
        catalog.validate(4).unwrap();
        assert!(catalog.len() >= 12);
    }

    #[test]
    fn standard_catalog_covers_all_energies() {
        let catalog = Catalog::standard();
        for energy in 1..=5 {
            assert!(
                catalog.scenes().iter().any(|s| s.energy == energy),
                "no scene at energy {}",
                energy
            );
        }
    }

    #[test]
    fn catalog_loads_from_json() {
        let json = r#"{
            "scenes": [
                {"name": "wash_test", "energy": 2, "palette": "warm",
                 "motion": "slow", "strobe": "none", "focus": "wash"}
            ]
        }"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        catalog.validate(4).unwrap();
        assert_eq!(catalog.get("wash_test").unwrap().palette, Palette::Warm);
    }

    #[test]
    fn validation_rejects_low_energy_strobe() {
        let json = r#"{
            "scenes": [
                {"name": "bad", "energy": 2, "palette": "warm",
                 "motion": "slow", "strobe": "hard", "focus": "wash"}
            ]
        }"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert!(matches!(
            catalog.validate(4),
            Err(CatalogError::InvalidScene { .. })
        ));
    }

    #[test]
    fn validation_rejects_weak_special() {
        let json = r#"{
            "scenes": [
                {"name": "weak_fx", "energy": 3, "palette": "rainbow",
                 "motion": "fast", "strobe": "none", "focus": "special"}
            ]
        }"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert!(catalog.validate(4).is_err());
    }

    #[test]
    fn validation_rejects_empty_catalog() {
        let catalog = Catalog::from_json_str(r#"{"scenes": []}"#).unwrap();
        assert!(matches!(catalog.validate(4), Err(CatalogError::Empty)));
    }
}
