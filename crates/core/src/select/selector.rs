use log::debug;
use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::scene::{Catalog, Focus, Palette, Section, SemanticScene, StrobeRate};

/// Musical context and recent state used to choose the next scene.
/// Constructed per timeline step by the caller; read-only during selection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneContext {
    #[serde(default = "default_energy")]
    pub energy: u8,
    /// Beats per minute.
    #[serde(default = "default_tempo")]
    pub tempo: f32,
    #[serde(default)]
    pub section: Section,
    #[serde(default)]
    pub is_drop: bool,
    #[serde(default = "default_strobe_allowed")]
    pub strobe_allowed: bool,
    #[serde(default)]
    pub last_scene: Option<SemanticScene>,
    #[serde(default)]
    pub last_palette: Option<Palette>,
}

fn default_energy() -> u8 {
    3
}

fn default_tempo() -> f32 {
    120.0
}

fn default_strobe_allowed() -> bool {
    true
}

impl SceneContext {
    pub fn new(energy: u8, tempo: f32, section: Section) -> Self {
        SceneContext {
            energy,
            tempo,
            section,
            is_drop: false,
            strobe_allowed: true,
            last_scene: None,
            last_palette: None,
        }
    }

    /// The context used when only a free-text description exists.
    pub fn neutral() -> Self {
        SceneContext::new(3, 120.0, Section::Verse)
    }
}

impl Default for SceneContext {
    fn default() -> Self {
        SceneContext::neutral()
    }
}

/// Outcome of one selection attempt. A miss is expected control flow, not
/// an error.
#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    Match(SemanticScene),
    NoMatch,
}

/// Extra exclusions applied on a re-filter pass when a candidate would
/// break the variety rules.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionConstraints {
    pub exclude_palettes: Vec<Palette>,
    pub forbid_hard_strobe: bool,
}

impl SelectionConstraints {
    pub fn none() -> Self {
        SelectionConstraints::default()
    }

    pub fn allows(&self, scene: &SemanticScene) -> bool {
        if self.exclude_palettes.contains(&scene.palette) {
            return false;
        }
        if self.forbid_hard_strobe && scene.strobe == StrobeRate::Hard {
            return false;
        }
        true
    }
}

/// Rule-based scene selector: a deterministic narrowing filter chain over
/// the catalog followed by a seeded weighted choice.
pub struct SceneSelector {
    rng: Pcg32,
}

impl SceneSelector {
    pub fn new(seed: u64) -> Self {
        SceneSelector {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Apply the filter chain and pick one candidate. Each filter narrows
    /// the set, never widens it; an empty result is a `NoMatch`.
    pub fn select(
        &mut self,
        catalog: &Catalog,
        context: &SceneContext,
        constraints: &SelectionConstraints,
    ) -> Selection {
        let mut candidates: Vec<&SemanticScene> = catalog.scenes().iter().collect();
        debug!("selection starts with {} catalog scenes", candidates.len());

        candidates.retain(|s| energy_distance(s.energy, context.energy) <= 1);
        debug!("after energy filter (+/-1): {}", candidates.len());

        if let Some(last_palette) = context.last_palette {
            candidates.retain(|s| s.palette != last_palette);
            debug!(
                "after palette filter (!= {}): {}",
                last_palette.as_str(),
                candidates.len()
            );
        }

        if let Some(last_scene) = &context.last_scene {
            candidates.retain(|s| s.name != last_scene.name);
            debug!(
                "after last-scene filter ({}): {}",
                last_scene.name,
                candidates.len()
            );
        }

        if context.energy < 3 {
            candidates.retain(|s| s.focus == Focus::Wash);
            debug!("after wash-only filter (energy < 3): {}", candidates.len());
        }

        if context.is_drop {
            candidates.retain(|s| matches!(s.focus, Focus::Accents | Focus::Special));
            debug!("after drop filter: {}", candidates.len());
        }

        if !context.strobe_allowed {
            candidates.retain(|s| s.strobe == StrobeRate::None);
            debug!("after strobe-disallowed filter: {}", candidates.len());
        }

        candidates.retain(|s| constraints.allows(s));
        if *constraints != SelectionConstraints::none() {
            debug!("after variety constraints: {}", candidates.len());
        }

        if candidates.is_empty() {
            return Selection::NoMatch;
        }

        self.weighted_choice(&candidates, context.energy)
    }

    /// Weight candidates by closeness to the target energy; an exact match
    /// weighs 3, one step away 2, the rest 1. Ties fall to catalog order
    /// under a fixed seed.
    fn weighted_choice(&mut self, candidates: &[&SemanticScene], target_energy: u8) -> Selection {
        let weights: Vec<u32> = candidates
            .iter()
            .map(|s| 3u32.saturating_sub(energy_distance(s.energy, target_energy) as u32).max(1))
            .collect();

        let dist = match WeightedIndex::new(&weights) {
            Ok(dist) => dist,
            Err(_) => return Selection::NoMatch,
        };
        let chosen = candidates[dist.sample(&mut self.rng)];
        debug!(
            "selected scene {} (energy {}) from {} candidates",
            chosen.name,
            chosen.energy,
            candidates.len()
        );
        Selection::Match(chosen.clone())
    }
}

fn energy_distance(a: u8, b: u8) -> u8 {
    a.abs_diff(b)
}
