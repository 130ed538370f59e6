use serde::{Deserialize, Serialize};

/// Color family a scene paints the rig with. Tokens are extensible; the
/// mapper resolves each one to concrete colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    Warm,
    Cool,
    Neutral,
    MonoBlue,
    MonoRed,
    Rainbow,
    Split,
}

impl Palette {
    pub const ALL: [Palette; 7] = [
        Palette::Warm,
        Palette::Cool,
        Palette::Neutral,
        Palette::MonoBlue,
        Palette::MonoRed,
        Palette::Rainbow,
        Palette::Split,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Palette::Warm => "warm",
            Palette::Cool => "cool",
            Palette::Neutral => "neutral",
            Palette::MonoBlue => "mono_blue",
            Palette::MonoRed => "mono_red",
            Palette::Rainbow => "rainbow",
            Palette::Split => "split",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Motion {
    Static,
    Slow,
    Medium,
    Fast,
}

impl Motion {
    pub const ALL: [Motion; 4] = [Motion::Static, Motion::Slow, Motion::Medium, Motion::Fast];

    pub fn as_str(&self) -> &'static str {
        match self {
            Motion::Static => "static",
            Motion::Slow => "slow",
            Motion::Medium => "medium",
            Motion::Fast => "fast",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrobeRate {
    None,
    Soft,
    Hard,
}

impl StrobeRate {
    pub const ALL: [StrobeRate; 3] = [StrobeRate::None, StrobeRate::Soft, StrobeRate::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrobeRate::None => "none",
            StrobeRate::Soft => "soft",
            StrobeRate::Hard => "hard",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Focus {
    Wash,
    Accents,
    Special,
    Mixed,
}

impl Focus {
    pub const ALL: [Focus; 4] = [Focus::Wash, Focus::Accents, Focus::Special, Focus::Mixed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Focus::Wash => "wash",
            Focus::Accents => "accents",
            Focus::Special => "special",
            Focus::Mixed => "mixed",
        }
    }
}

/// Musical-structure marker for a timeline step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Intro,
    #[default]
    Verse,
    Pre,
    Chorus,
    Drop,
    Outro,
}

/// A lighting look described by musical/perceptual parameters rather than
/// raw channel values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SemanticScene {
    pub name: String,
    pub energy: u8,
    pub palette: Palette,
    pub motion: Motion,
    pub strobe: StrobeRate,
    pub focus: Focus,
}

impl SemanticScene {
    pub fn new(
        name: &str,
        energy: u8,
        palette: Palette,
        motion: Motion,
        strobe: StrobeRate,
        focus: Focus,
    ) -> Self {
        SemanticScene {
            name: name.to_string(),
            energy,
            palette,
            motion,
            strobe,
            focus,
        }
    }

    /// Strobing below energy 3 is never a valid look.
    pub fn strobe_invariant_holds(&self) -> bool {
        self.strobe == StrobeRate::None || self.energy >= 3
    }

    /// Canonical single-line form, used for hashing and logging.
    pub fn canonical_string(&self) -> String {
        format!(
            "energy={} palette={} motion={} strobe={} focus={}",
            self.energy,
            self.palette.as_str(),
            self.motion.as_str(),
            self.strobe.as_str(),
            self.focus.as_str()
        )
    }
}

impl std::fmt::Display for SemanticScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.canonical_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strobe_invariant() {
        let mut scene = SemanticScene::new(
            "test",
            2,
            Palette::Warm,
            Motion::Slow,
            StrobeRate::None,
            Focus::Wash,
        );
        assert!(scene.strobe_invariant_holds());
        scene.strobe = StrobeRate::Soft;
        assert!(!scene.strobe_invariant_holds());
        scene.energy = 3;
        assert!(scene.strobe_invariant_holds());
    }

    #[test]
    fn serde_tokens_are_snake_case() {
        let json = serde_json::to_string(&Palette::MonoBlue).unwrap();
        assert_eq!(json, "\"mono_blue\"");
        let motion: Motion = serde_json::from_str("\"fast\"").unwrap();
        assert_eq!(motion, Motion::Fast);
    }
}
